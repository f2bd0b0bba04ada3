fn split_at_str<'a>(input: &'a str, needle: &str) -> Option<(&'a str, &'a str)> {
    let end = input.find(needle)?;
    let (head, tail) = input.split_at(end);
    Some((head, &tail[needle.len()..]))
}

fn strip_decl(input: &str) -> Option<&str> {
    if !input.trim_start().starts_with("<?xml") {
        return None;
    }
    split_at_str(input, "?>").map(|(_, tail)| tail.trim_start())
}

/// finds the `>` that closes the tag at the start of `input`. quoted attribute values may contain
/// `>` (registry comments do).
fn find_tag_end(input: &str) -> Option<usize> {
    let mut quote: Option<u8> = None;
    for (i, b) in input.bytes().enumerate() {
        match (quote, b) {
            (Some(q), b) if b == q => quote = None,
            (Some(_), _) => {}
            (None, b'"' | b'\'') => quote = Some(b),
            (None, b'>') => return Some(i),
            (None, _) => {}
        }
    }
    None
}

#[test]
fn test_strip_decl() {
    const WITH_DECL: &str = r#"
<?xml version="1.0" encoding="UTF-8"?>
<registry>
"#;
    assert!(strip_decl(WITH_DECL).unwrap().starts_with("<registry>"));

    const WITHOUT_DECL: &str = r#"
<registry>
"#;
    assert_eq!(strip_decl(WITHOUT_DECL), None);
}

#[test]
fn test_find_tag_end() {
    assert_eq!(find_tag_end(r#"<enum name="a"/>"#), Some(15));
    assert_eq!(find_tag_end(r#"<enums comment="a -> b">"#), Some(23));
    assert_eq!(find_tag_end(r#"<enums comment='x>'"#), None);
}

#[derive(Debug, PartialEq, Eq)]
pub struct Attribute<'a> {
    pub key: &'a str,
    pub value: &'a str,
}

pub struct AttributeIterator<'a> {
    attrs: &'a str,
}

impl<'a> AttributeIterator<'a> {
    pub fn new(attrs: &'a str) -> Self {
        Self { attrs }
    }
}

impl<'a> Iterator for AttributeIterator<'a> {
    type Item = Attribute<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let (key, rest) = split_at_str(self.attrs, "=")?;
        let rest = rest.trim_start();
        let quote = match rest.chars().next()? {
            q @ ('"' | '\'') => q,
            _ => return None,
        };
        let (value, rest) = split_at_str(&rest[1..], &quote.to_string())?;
        self.attrs = rest;
        Some(Attribute {
            key: key.trim(),
            value,
        })
    }
}

#[test]
fn test_attribute_iterator() {
    const ATTRS: &str = r#"name="GL_VERSION_1_0" number='1.0' comment="a = b""#;
    let mut iterator = AttributeIterator::new(ATTRS);
    assert_eq!(
        iterator.next(),
        Some(Attribute {
            key: "name",
            value: "GL_VERSION_1_0"
        })
    );
    assert_eq!(
        iterator.next(),
        Some(Attribute {
            key: "number",
            value: "1.0"
        })
    );
    assert_eq!(
        iterator.next(),
        Some(Attribute {
            key: "comment",
            value: "a = b"
        })
    );
    assert_eq!(iterator.next(), None);
}

#[derive(Debug, PartialEq, Eq)]
pub struct EmptyTag<'a> {
    pub name: &'a str,
    pub attrs: &'a str,
}

impl<'a> EmptyTag<'a> {
    pub fn iter_attrs(&self) -> AttributeIterator<'a> {
        AttributeIterator::new(self.attrs)
    }

    pub fn attr(&self, key: &str) -> Option<&'a str> {
        self.iter_attrs()
            .find(|attr| attr.key == key)
            .map(|attr| attr.value)
    }
}

#[derive(Debug, PartialEq, Eq)]
pub struct StartTag<'a> {
    pub name: &'a str,
    pub attrs: &'a str,
}

impl<'a> StartTag<'a> {
    pub fn iter_attrs(&self) -> AttributeIterator<'a> {
        AttributeIterator::new(self.attrs)
    }

    pub fn attr(&self, key: &str) -> Option<&'a str> {
        self.iter_attrs()
            .find(|attr| attr.key == key)
            .map(|attr| attr.value)
    }
}

#[derive(Debug, PartialEq, Eq)]
pub struct EndTag<'a> {
    pub name: &'a str,
}

#[derive(Debug, PartialEq, Eq)]
pub enum Element<'a> {
    EmptyTag(EmptyTag<'a>),
    StartTag(StartTag<'a>),
    EndTag(EndTag<'a>),
    Text(&'a str),
    Comment(&'a str),
}

fn split_name(content: &str) -> (&str, &str) {
    match content.find(char::is_whitespace) {
        Some(end) => (&content[..end], content[end..].trim()),
        None => (content, ""),
    }
}

pub struct ElementIterator<'a> {
    input: &'a str,
}

impl<'a> ElementIterator<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            input: strip_decl(input).unwrap_or(input),
        }
    }

    fn next_tag(&mut self) -> Option<Element<'a>> {
        debug_assert!(self.input.starts_with("<"));

        let end = find_tag_end(self.input)?;
        let content = &self.input[1..end];
        self.input = &self.input[end + 1..];

        if let Some(name) = content.strip_prefix("/") {
            return Some(Element::EndTag(EndTag { name: name.trim() }));
        }
        if let Some(content) = content.strip_suffix("/") {
            let (name, attrs) = split_name(content);
            return Some(Element::EmptyTag(EmptyTag { name, attrs }));
        }
        let (name, attrs) = split_name(content);
        Some(Element::StartTag(StartTag { name, attrs }))
    }

    fn next_text(&mut self) -> Option<Element<'a>> {
        debug_assert!(!self.input.starts_with("<"));
        debug_assert!(!self.input.is_empty());

        let end = self.input.find("<").unwrap_or(self.input.len());
        let content = &self.input[..end];
        self.input = &self.input[end..];
        Some(Element::Text(content))
    }

    fn next_comment(&mut self) -> Option<Element<'a>> {
        debug_assert!(self.input.starts_with("<!--"));

        let (content, rest) = split_at_str(&self.input[4..], "-->")?;
        self.input = rest;
        Some(Element::Comment(content))
    }
}

impl<'a> Iterator for ElementIterator<'a> {
    type Item = Element<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let element = if self.input.is_empty() {
            None
        } else if self.input.starts_with("<!--") {
            self.next_comment()
        } else if self.input.starts_with("<") {
            self.next_tag()
        } else {
            self.next_text()
        };
        if element.is_none() {
            // unterminated tag or comment, nothing sensible left to yield.
            self.input = "";
        }
        element
    }
}

#[test]
fn test_next_empty_tag() {
    const INPUT: &str = r#"<enum value="0x0004" name="GL_TRIANGLES"/>"#;
    assert_eq!(
        ElementIterator::new(INPUT).next(),
        Some(Element::EmptyTag(EmptyTag {
            name: "enum",
            attrs: r#"value="0x0004" name="GL_TRIANGLES""#
        }))
    );
}

#[test]
fn test_next_end_tag() {
    assert_eq!(
        ElementIterator::new("</registry>").next(),
        Some(Element::EndTag(EndTag { name: "registry" }))
    );
}

#[test]
fn test_next_start_tag() {
    const INPUT: &str = r#"<feature api="gl" name="GL_VERSION_1_0" number="1.0">"#;
    assert_eq!(
        ElementIterator::new(INPUT).next(),
        Some(Element::StartTag(StartTag {
            name: "feature",
            attrs: r#"api="gl" name="GL_VERSION_1_0" number="1.0""#
        }))
    );
}

#[test]
fn test_next_text() {
    assert_eq!(
        ElementIterator::new("const <ptype>").next(),
        Some(Element::Text("const "))
    );
}

#[test]
fn test_next_comment() {
    const INPUT: &str = "<!-- SECTION: GL type definitions. -->";
    assert_eq!(
        ElementIterator::new(INPUT).next(),
        Some(Element::Comment(" SECTION: GL type definitions. ")),
    );
}

#[test]
fn test_command_proto() {
    const INPUT: &str =
        "<proto group=\"String\">const <ptype>GLubyte</ptype> *<name>glGetString</name></proto>";
    let elements: Vec<Element> = ElementIterator::new(INPUT).collect();
    assert_eq!(
        elements,
        vec![
            Element::StartTag(StartTag {
                name: "proto",
                attrs: "group=\"String\""
            }),
            Element::Text("const "),
            Element::StartTag(StartTag {
                name: "ptype",
                attrs: ""
            }),
            Element::Text("GLubyte"),
            Element::EndTag(EndTag { name: "ptype" }),
            Element::Text(" *"),
            Element::StartTag(StartTag {
                name: "name",
                attrs: ""
            }),
            Element::Text("glGetString"),
            Element::EndTag(EndTag { name: "name" }),
            Element::EndTag(EndTag { name: "proto" }),
        ]
    );
}

#[test]
fn test_unterminated_tag() {
    let mut iterator = ElementIterator::new("text<enum name=\"x\"");
    assert_eq!(iterator.next(), Some(Element::Text("text")));
    assert_eq!(iterator.next(), None);
    assert_eq!(iterator.next(), None);
}

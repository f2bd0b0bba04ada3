use std::collections::{HashMap, HashSet};
use std::io;
use std::str::FromStr;

use anyhow::{Context as _, bail};
use xml_iterator::{Element, ElementIterator, StartTag};

#[derive(Debug, Clone, Copy)]
pub enum Api {
    Gl,
}

impl Api {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Gl => "gl",
        }
    }

    fn command_prefix(&self) -> &'static str {
        match self {
            Self::Gl => "gl",
        }
    }

    /// matches an `api` attribute or one token of an extension's `supported` list.
    fn matches(&self, token: &str) -> bool {
        match self {
            // glcore marks extensions usable from core contexts, they are still desktop gl.
            Self::Gl => token == "gl" || token == "glcore",
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Version(pub u32, pub u32);

impl FromStr for Version {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.split('.');
        let major: u32 = parts.next().context("missing major")?.parse()?;
        let minor: u32 = parts.next().context("missing minor")?.parse()?;
        if parts.next().is_some() {
            bail!("unexpected version suffix in {s:?}");
        }
        Ok(Version(major, minor))
    }
}

impl PartialEq for Version {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0 && self.1 == other.1
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.0.cmp(&other.0).then(self.1.cmp(&other.1)))
    }
}

#[test]
fn test_version() {
    let a = Version(3, 0);
    let b = Version(4, 6);
    assert!(a < b);
    assert_eq!(Version::from_str("4.6").unwrap(), b);
    assert!(Version::from_str("4").is_err());
    assert!(Version::from_str("4.6.1").is_err());
}

/// which registry extensions end up in the generated slot table.
#[derive(Debug, Clone, Copy)]
pub enum Extensions<'a> {
    None,
    All,
    Named(&'a [&'a str]),
}

// registry schema:
// https://github.com/KhronosGroup/OpenGL-Registry/blob/8e772a3b0c9e8a85ccb6f471b4cdbf94c8bcd71d/xml/readme.pdf

#[derive(Debug)]
pub struct Enum<'a> {
    pub value: &'a str,
    pub name: &'a str,
    pub api: Option<&'a str>,
    pub r#type: Option<&'a str>,
    pub group: Option<&'a str>,
    pub alias: Option<&'a str>,
    pub comment: Option<&'a str>,
}

#[derive(Debug)]
pub enum CommandTypePart<'a> {
    Defined(&'a str),
    Other(&'a str),
}

#[derive(Debug)]
pub struct CommandPart<'a> {
    pub type_parts: Vec<CommandTypePart<'a>>,
    pub name: &'a str,
}

#[derive(Debug)]
pub struct Command<'a> {
    pub proto: CommandPart<'a>,
    pub params: Vec<CommandPart<'a>>,
}

#[derive(Debug)]
pub struct Interface<'a> {
    pub api: Option<&'a str>,
    pub profile: Option<&'a str>,
    pub enums: Vec<&'a str>,
    pub commands: Vec<&'a str>,
}

#[derive(Debug)]
pub struct Feature<'a> {
    pub api: &'a str,
    pub name: &'a str,
    pub number: Version,
    pub requires: Vec<Interface<'a>>,
    pub removes: Vec<Interface<'a>>,
}

#[derive(Debug)]
pub struct Extension<'a> {
    pub name: &'a str,
    pub supported: &'a str,
    pub requires: Vec<Interface<'a>>,
}

#[derive(Debug)]
pub struct Registry<'a> {
    pub enums: Vec<Enum<'a>>,
    pub commands: Vec<Command<'a>>,
    pub features: Vec<Feature<'a>>,
    pub extensions: Vec<Extension<'a>>,
}

fn is_blank(text: &str) -> bool {
    text.chars().all(|c| c.is_whitespace())
}

fn expect_text<'a>(element_iterator: &mut ElementIterator<'a>) -> anyhow::Result<&'a str> {
    let Some(element) = element_iterator.next() else {
        bail!("unexpected eof");
    };
    let Element::Text(text) = element else {
        bail!("unexpected element (got {element:?}, want text)");
    };
    Ok(text.trim())
}

fn expect_end_tag(element_iterator: &mut ElementIterator<'_>, tag_name: &str) -> anyhow::Result<()> {
    let Some(element) = element_iterator.next() else {
        bail!("unexpected eof");
    };
    match element {
        Element::EndTag(end) if end.name == tag_name => Ok(()),
        other => bail!("unexpected element (got {other:?}, want end of {tag_name})"),
    }
}

/// consumes everything up to and including the end tag matching an already consumed start tag.
fn skip_element(element_iterator: &mut ElementIterator<'_>, tag_name: &str) -> anyhow::Result<()> {
    let mut depth = 0usize;
    for element in element_iterator.by_ref() {
        match element {
            Element::StartTag(start) if start.name == tag_name => depth += 1,
            Element::EndTag(end) if end.name == tag_name => {
                if depth == 0 {
                    return Ok(());
                }
                depth -= 1;
            }
            _ => {}
        }
    }
    bail!("unexpected eof while skipping {tag_name}")
}

fn parse_enum_token_attrs<'a>(
    attrs: xml_iterator::AttributeIterator<'a>,
    block_type: Option<&'a str>,
) -> anyhow::Result<Enum<'a>> {
    let mut value: Option<&'a str> = None;
    let mut name: Option<&'a str> = None;
    let mut api: Option<&'a str> = None;
    let mut r#type: Option<&'a str> = None;
    let mut group: Option<&'a str> = None;
    let mut alias: Option<&'a str> = None;
    let mut comment: Option<&'a str> = None;
    for attr in attrs {
        let prev = match attr.key {
            "value" => value.replace(attr.value),
            "name" => name.replace(attr.value),
            "api" => api.replace(attr.value),
            "type" => r#type.replace(attr.value),
            "group" => group.replace(attr.value),
            "alias" => alias.replace(attr.value),
            "comment" => comment.replace(attr.value),
            _ => None,
        };
        if prev.is_some() {
            bail!("duplicate attr {}: {prev:?}", attr.key);
        }
    }
    Ok(Enum {
        value: value.context("value is missing")?,
        name: name.context("name is missing")?,
        api,
        r#type: r#type.or(block_type),
        group,
        alias,
        comment,
    })
}

fn parse_enum_block_into<'a>(
    start_tag: StartTag<'a>,
    element_iterator: &mut ElementIterator<'a>,
    enums: &mut Vec<Enum<'a>>,
) -> anyhow::Result<()> {
    let block_type = start_tag.attr("type");
    while let Some(element) = element_iterator.next() {
        match element {
            Element::EmptyTag(empty) => match empty.name {
                "enum" => {
                    let token = parse_enum_token_attrs(empty.iter_attrs(), block_type)
                        .context("could not parse enum token attrs")?;
                    enums.push(token);
                }
                // unused ranges
                _ => {}
            },
            Element::StartTag(start) => skip_element(element_iterator, start.name)?,
            Element::Text(text) if is_blank(text) => {}
            Element::EndTag(end) if end.name == "enums" => break,
            Element::Comment(_) => {}
            other => bail!("unexpected element: {other:?}"),
        }
    }
    Ok(())
}

fn parse_command_part<'a>(
    tag_name: &str,
    element_iterator: &mut ElementIterator<'a>,
) -> anyhow::Result<CommandPart<'a>> {
    let mut type_parts: Vec<CommandTypePart<'a>> = Vec::new();
    let mut name: Option<&'a str> = None;
    while let Some(element) = element_iterator.next() {
        match element {
            Element::Text(text) => {
                if !is_blank(text) {
                    type_parts.push(CommandTypePart::Other(text.trim()));
                }
            }
            Element::StartTag(start) => match start.name {
                "name" => {
                    if name.is_some() {
                        bail!("duplicate {tag_name} name");
                    }
                    name = Some(expect_text(element_iterator)?);
                    expect_end_tag(element_iterator, "name")?;
                }
                "ptype" => {
                    type_parts.push(CommandTypePart::Defined(expect_text(element_iterator)?));
                    expect_end_tag(element_iterator, "ptype")?;
                }
                other => bail!("unexpected start: {other}"),
            },
            Element::EndTag(end) if end.name == tag_name => break,
            other => bail!("unexpected element: {other:?}"),
        }
    }
    Ok(CommandPart {
        type_parts,
        name: name.with_context(|| format!("{tag_name} name is missing"))?,
    })
}

fn parse_command<'a>(element_iterator: &mut ElementIterator<'a>) -> anyhow::Result<Command<'a>> {
    let mut proto: Option<CommandPart<'a>> = None;
    let mut params: Vec<CommandPart<'a>> = Vec::new();
    while let Some(element) = element_iterator.next() {
        match element {
            Element::StartTag(start) => match start.name {
                "proto" => {
                    if proto.is_some() {
                        bail!("duplicate proto");
                    }
                    proto = Some(
                        parse_command_part("proto", element_iterator)
                            .context("could not parse command proto")?,
                    );
                }
                "param" => {
                    params.push(
                        parse_command_part("param", element_iterator)
                            .context("could not parse command param")?,
                    );
                }
                other => skip_element(element_iterator, other)?,
            },
            Element::EndTag(end) => match end.name {
                "command" => break,
                other => bail!("unexpected end: {other}"),
            },
            Element::Text(text) if is_blank(text) => {}
            // glx, alias, vecequiv
            Element::EmptyTag(_) | Element::Comment(_) => {}
            other => bail!("unexpected element: {other:?}"),
        }
    }
    Ok(Command {
        proto: proto.context("proto is missing")?,
        params,
    })
}

fn parse_interface<'a>(
    start_tag: StartTag<'a>,
    element_iterator: &mut ElementIterator<'a>,
) -> anyhow::Result<Interface<'a>> {
    let mut interface = Interface {
        api: start_tag.attr("api"),
        profile: start_tag.attr("profile"),
        enums: Vec::new(),
        commands: Vec::new(),
    };
    while let Some(element) = element_iterator.next() {
        match element {
            Element::Text(text) if is_blank(text) => {}
            Element::EmptyTag(empty) => match empty.name {
                "enum" => interface
                    .enums
                    .push(empty.attr("name").context("enum name is missing")?),
                "command" => interface
                    .commands
                    .push(empty.attr("name").context("command name is missing")?),
                _ => {}
            },
            Element::EndTag(end) if end.name == start_tag.name => break,
            Element::Comment(_) => {}
            other => bail!("unexpected element: {other:?}"),
        }
    }
    Ok(interface)
}

fn empty_interface<'a>(attrs: xml_iterator::AttributeIterator<'a>) -> Interface<'a> {
    let mut interface = Interface {
        api: None,
        profile: None,
        enums: Vec::new(),
        commands: Vec::new(),
    };
    for attr in attrs {
        match attr.key {
            "api" => interface.api = Some(attr.value),
            "profile" => interface.profile = Some(attr.value),
            _ => {}
        }
    }
    interface
}

fn parse_feature<'a>(
    start_tag: StartTag<'a>,
    element_iterator: &mut ElementIterator<'a>,
) -> anyhow::Result<Feature<'a>> {
    let mut feature = Feature {
        api: start_tag.attr("api").context("api is missing")?,
        name: start_tag.attr("name").context("name is missing")?,
        number: Version::from_str(start_tag.attr("number").context("number is missing")?)
            .context("could not parse feature number")?,
        requires: Vec::new(),
        removes: Vec::new(),
    };
    while let Some(element) = element_iterator.next() {
        match element {
            Element::Text(text) if is_blank(text) => {}
            Element::StartTag(start) => match start.name {
                "require" => {
                    let require = parse_interface(start, element_iterator)
                        .context("could not parse feature require")?;
                    feature.requires.push(require);
                }
                "remove" => {
                    let remove = parse_interface(start, element_iterator)
                        .context("could not parse feature remove")?;
                    feature.removes.push(remove);
                }
                other => skip_element(element_iterator, other)?,
            },
            Element::EmptyTag(empty) => match empty.name {
                "require" => feature.requires.push(empty_interface(empty.iter_attrs())),
                "remove" => feature.removes.push(empty_interface(empty.iter_attrs())),
                _ => {}
            },
            Element::Comment(_) => {}
            Element::EndTag(end) if end.name == "feature" => break,
            other => bail!("unexpected element: {other:?}"),
        }
    }
    Ok(feature)
}

fn parse_extension<'a>(
    start_tag: StartTag<'a>,
    element_iterator: &mut ElementIterator<'a>,
) -> anyhow::Result<Extension<'a>> {
    let mut extension = Extension {
        name: start_tag.attr("name").context("name is missing")?,
        supported: start_tag.attr("supported").unwrap_or(""),
        requires: Vec::new(),
    };
    while let Some(element) = element_iterator.next() {
        match element {
            Element::Text(text) if is_blank(text) => {}
            Element::StartTag(start) => match start.name {
                "require" => {
                    let require = parse_interface(start, element_iterator)
                        .context("could not parse extension require")?;
                    extension.requires.push(require);
                }
                other => skip_element(element_iterator, other)?,
            },
            Element::EmptyTag(_) | Element::Comment(_) => {}
            Element::EndTag(end) if end.name == "extension" => break,
            other => bail!("unexpected element: {other:?}"),
        }
    }
    Ok(extension)
}

pub fn parse_registry<'a>(input: &'a str) -> anyhow::Result<Registry<'a>> {
    let mut enums: Vec<Enum> = Vec::new();
    let mut commands: Vec<Command> = Vec::new();
    let mut features: Vec<Feature> = Vec::new();
    let mut extensions: Vec<Extension> = Vec::new();

    let mut element_iterator = ElementIterator::new(input);
    while let Some(element) = element_iterator.next() {
        let Element::StartTag(start) = element else {
            continue;
        };
        match start.name {
            "enums" => {
                parse_enum_block_into(start, &mut element_iterator, &mut enums)
                    .context("could not parse enum block")?;
            }
            "command" => {
                let command =
                    parse_command(&mut element_iterator).context("could not parse command")?;
                commands.push(command);
            }
            "feature" => {
                let feature = parse_feature(start, &mut element_iterator)
                    .context("could not parse feature")?;
                features.push(feature);
            }
            "extension" => {
                let name = start.attr("name").unwrap_or("?");
                let extension = parse_extension(start, &mut element_iterator)
                    .with_context(|| format!("could not parse extension {name}"))?;
                extensions.push(extension);
            }
            _ => {}
        }
    }

    Ok(Registry {
        enums,
        commands,
        features,
        extensions,
    })
}

fn wants_interface(interface: &Interface, api: &Api) -> bool {
    interface.api.is_none_or(|it| api.matches(it))
}

pub fn filter_registry<'a>(
    mut registry: Registry<'a>,
    api: &Api,
    version: &Version,
    extensions: Extensions,
) -> anyhow::Result<Registry<'a>> {
    registry
        .features
        .retain(|feat| feat.api == api.as_str() && feat.number <= *version);
    if !registry.features.iter().any(|feat| feat.number == *version) {
        bail!("could not find {api:?} {version:?}");
    }

    match extensions {
        Extensions::None => registry.extensions.clear(),
        Extensions::All => registry
            .extensions
            .retain(|ext| ext.supported.split('|').any(|part| api.matches(part))),
        Extensions::Named(names) => {
            for name in names {
                let Some(ext) = registry.extensions.iter().find(|ext| ext.name == *name) else {
                    bail!("unknown extension {name}");
                };
                if !ext.supported.split('|').any(|part| api.matches(part)) {
                    bail!("{name} is not supported on {api:?} {version:?}");
                }
            }
            registry
                .extensions
                .retain(|ext| names.iter().any(|name| *name == ext.name));
        }
    }

    let mut wanted_enums: HashSet<&str> = HashSet::new();
    let mut wanted_commands: HashSet<&str> = HashSet::new();

    for feat in registry.features.iter_mut() {
        feat.requires.retain(|it| wants_interface(it, api));
        feat.removes.retain(|it| wants_interface(it, api));
        for interface in feat.requires.iter().chain(feat.removes.iter()) {
            wanted_enums.extend(interface.enums.iter());
            wanted_commands.extend(interface.commands.iter());
        }
    }
    for ext in registry.extensions.iter_mut() {
        ext.requires.retain(|it| wants_interface(it, api));
        for interface in ext.requires.iter() {
            wanted_enums.extend(interface.enums.iter());
            wanted_commands.extend(interface.commands.iter());
        }
    }

    // the same enum name may be defined once per api (with different values).
    let mut seen_enums: HashSet<&str> = HashSet::new();
    registry.enums.retain(|e| {
        wanted_enums.contains(e.name)
            && e.api.is_none_or(|it| api.matches(it))
            && seen_enums.insert(e.name)
    });

    registry
        .commands
        .retain(|c| wanted_commands.contains(c.proto.name));
    registry
        .commands
        .sort_unstable_by(|a, b| a.proto.name.cmp(b.proto.name));
    registry.extensions.sort_unstable_by(|a, b| a.name.cmp(b.name));

    Ok(registry)
}

// khronos_int8_t is signed char, GLbyte must not follow the platform's char signedness.
const GL_TYPES: &str = "use std::ffi::{c_char, c_double, c_float, c_int, c_short, c_uchar, c_uint, c_ushort, c_void};

pub type GLvoid = c_void;
pub type GLbitfield = c_uint;
pub type GLboolean = c_uchar;
pub type GLbyte = i8;
pub type GLchar = c_char;
pub type GLcharARB = c_char;
pub type GLclampd = c_double;
pub type GLclampf = c_float;
pub type GLclampx = i32;
pub type GLdouble = c_double;
pub type GLeglClientBufferEXT = *mut c_void;
pub type GLeglImageOES = *mut c_void;
pub type GLenum = c_uint;
pub type GLfixed = i32;
pub type GLfloat = c_float;
pub type GLhalf = c_ushort;
pub type GLhalfARB = c_ushort;
pub type GLhalfNV = c_ushort;
pub type GLint = c_int;
pub type GLint64 = i64;
pub type GLint64EXT = i64;
pub type GLintptr = isize;
pub type GLintptrARB = isize;
pub type GLshort = c_short;
pub type GLsizei = c_int;
pub type GLsizeiptr = isize;
pub type GLsizeiptrARB = isize;
pub type GLsync = *mut c_void;
pub type GLubyte = u8;
pub type GLuint = c_uint;
pub type GLuint64 = u64;
pub type GLuint64EXT = u64;
pub type GLushort = c_ushort;
pub type GLvdpauSurfaceNV = GLintptr;

#[cfg(target_vendor = \"apple\")]
pub type GLhandleARB = *mut c_void;
#[cfg(not(target_vendor = \"apple\"))]
pub type GLhandleARB = c_uint;

#[repr(C)]
pub struct _cl_context {
    _data: [u8; 0],
    _marker: std::marker::PhantomData<(*mut u8, std::marker::PhantomPinned)>,
}

#[repr(C)]
pub struct _cl_event {
    _data: [u8; 0],
    _marker: std::marker::PhantomData<(*mut u8, std::marker::PhantomPinned)>,
}

pub type GLDEBUGPROC = Option<unsafe extern \"system\" fn(
    source: GLenum,
    r#type: GLenum,
    id: GLuint,
    severity: GLenum,
    length: GLsizei,
    message: *const GLchar,
    userParam: *mut c_void,
)>;
pub type GLDEBUGPROCARB = GLDEBUGPROC;
pub type GLDEBUGPROCKHR = GLDEBUGPROC;
pub type GLDEBUGPROCAMD = Option<unsafe extern \"system\" fn(
    id: GLuint,
    category: GLenum,
    severity: GLenum,
    length: GLsizei,
    message: *const GLchar,
    userParam: *mut c_void,
)>;
pub type GLVULKANPROCNV = Option<unsafe extern \"system\" fn()>;
";

const KNOWN_TYPES: &[&str] = &[
    "GLvoid",
    "GLbitfield",
    "GLboolean",
    "GLbyte",
    "GLchar",
    "GLcharARB",
    "GLclampd",
    "GLclampf",
    "GLclampx",
    "GLdouble",
    "GLeglClientBufferEXT",
    "GLeglImageOES",
    "GLenum",
    "GLfixed",
    "GLfloat",
    "GLhalf",
    "GLhalfARB",
    "GLhalfNV",
    "GLint",
    "GLint64",
    "GLint64EXT",
    "GLintptr",
    "GLintptrARB",
    "GLshort",
    "GLsizei",
    "GLsizeiptr",
    "GLsizeiptrARB",
    "GLsync",
    "GLubyte",
    "GLuint",
    "GLuint64",
    "GLuint64EXT",
    "GLushort",
    "GLvdpauSurfaceNV",
    "GLhandleARB",
    "_cl_context",
    "_cl_event",
    "GLDEBUGPROC",
    "GLDEBUGPROCARB",
    "GLDEBUGPROCKHR",
    "GLDEBUGPROCAMD",
    "GLVULKANPROCNV",
];

#[derive(Debug, PartialEq, Eq)]
enum TypeToken<'a> {
    Const,
    Struct,
    Pointer,
    Name(&'a str),
}

fn tokenize_type_parts<'a>(parts: &[CommandTypePart<'a>]) -> anyhow::Result<Vec<TypeToken<'a>>> {
    let mut tokens = Vec::new();
    for part in parts {
        // ptype text is not always a bare name, e.g. `<ptype>struct _cl_context</ptype>`.
        let text = match part {
            CommandTypePart::Defined(text) | CommandTypePart::Other(text) => *text,
        };
        for word in text.split_whitespace() {
            let mut rest = word;
            while !rest.is_empty() {
                if let Some(tail) = rest.strip_prefix('*') {
                    tokens.push(TypeToken::Pointer);
                    rest = tail;
                } else if rest.starts_with('[') {
                    // array params decay to pointers.
                    let end = rest.find(']').context("unterminated array")?;
                    tokens.push(TypeToken::Pointer);
                    rest = &rest[end + 1..];
                } else {
                    let end = rest.find(['*', '[']).unwrap_or(rest.len());
                    let (word, tail) = rest.split_at(end);
                    tokens.push(match word {
                        "const" => TypeToken::Const,
                        "struct" => TypeToken::Struct,
                        other => TypeToken::Name(other),
                    });
                    rest = tail;
                }
            }
        }
    }
    Ok(tokens)
}

struct CType<'a> {
    base: &'a str,
    /// constness of each pointee, innermost first.
    pointers: Vec<bool>,
}

fn parse_c_type<'a>(parts: &[CommandTypePart<'a>]) -> anyhow::Result<CType<'a>> {
    let mut base: Option<&'a str> = None;
    let mut pointers: Vec<bool> = Vec::new();
    let mut pending_const = false;
    for token in tokenize_type_parts(parts)? {
        match token {
            TypeToken::Const => pending_const = true,
            TypeToken::Struct => {}
            TypeToken::Pointer => {
                pointers.push(pending_const);
                pending_const = false;
            }
            TypeToken::Name(name) => {
                if let Some(prev) = base.replace(name) {
                    bail!("unsupported type {parts:?} (both {prev} and {name})");
                }
            }
        }
    }
    Ok(CType {
        base: base.with_context(|| format!("type is missing in {parts:?}"))?,
        pointers,
    })
}

fn rust_base_type(base: &str) -> &str {
    match base {
        "void" | "GLvoid" => "c_void",
        "char" => "std::ffi::c_char",
        "int" => "std::ffi::c_int",
        "float" => "std::ffi::c_float",
        "double" => "std::ffi::c_double",
        other => other,
    }
}

/// translates a c declarator into a rust type. `None` means `void` (only valid for returns).
fn rust_type(parts: &[CommandTypePart]) -> anyhow::Result<Option<String>> {
    let ctype = parse_c_type(parts)?;
    if ctype.pointers.is_empty() && matches!(ctype.base, "void" | "GLvoid") {
        return Ok(None);
    }
    let mut ty = rust_base_type(ctype.base).to_string();
    for is_const in ctype.pointers {
        ty = format!("*{} {ty}", if is_const { "const" } else { "mut" });
    }
    Ok(Some(ty))
}

#[cfg(test)]
fn rust_type_of(parts: &[CommandTypePart]) -> String {
    rust_type(parts).unwrap().unwrap_or_default()
}

#[test]
fn test_rust_type() {
    use CommandTypePart::*;
    assert_eq!(rust_type(&[Other("void")]).unwrap(), None);
    assert_eq!(rust_type_of(&[Defined("GLenum")]), "GLenum");
    assert_eq!(rust_type_of(&[Other("void *")]), "*mut c_void");
    assert_eq!(rust_type_of(&[Other("const void *")]), "*const c_void");
    assert_eq!(rust_type_of(&[Other("const void **")]), "*mut *const c_void");
    assert_eq!(rust_type_of(&[Other("const void *const*")]), "*const *const c_void");
    assert_eq!(rust_type_of(&[Defined("GLuint"), Other("*")]), "*mut GLuint");
    assert_eq!(
        rust_type_of(&[Other("const"), Defined("GLubyte"), Other("*")]),
        "*const GLubyte"
    );
    assert_eq!(
        rust_type_of(&[Other("const"), Defined("GLchar"), Other("*const*")]),
        "*const *const GLchar"
    );
    assert_eq!(
        rust_type_of(&[Other("const"), Defined("GLcharARB"), Other("**")]),
        "*mut *const GLcharARB"
    );
    assert_eq!(
        rust_type_of(&[Other("struct"), Defined("_cl_context"), Other("*")]),
        "*mut _cl_context"
    );
    assert_eq!(
        rust_type_of(&[Defined("struct _cl_event"), Other("*")]),
        "*mut _cl_event"
    );
    assert_eq!(rust_type_of(&[Defined("GLuint"), Other("[2]")]), "*mut GLuint");
    assert!(rust_type(&[Defined("GLuint"), Defined("GLint")]).is_err());
}

/// collects defined types that the emitted commands use but that `GL_TYPES` does not know.
fn unknown_types<'a>(registry: &Registry<'a>) -> anyhow::Result<Vec<&'a str>> {
    let mut unknown: Vec<&'a str> = Vec::new();
    for cmd in registry.commands.iter() {
        for part in std::iter::once(&cmd.proto).chain(cmd.params.iter()) {
            let base = parse_c_type(&part.type_parts)
                .with_context(|| format!("could not parse type of {}", cmd.proto.name))?
                .base;
            let builtin = matches!(base, "void" | "char" | "int" | "float" | "double");
            let known = KNOWN_TYPES.iter().any(|known| *known == base);
            if !builtin && !known && !unknown.contains(&base) {
                unknown.push(base);
            }
        }
    }
    Ok(unknown)
}

/// emits type aliases. returns names of types that were not known and got an opaque pointer
/// stand-in, so that the caller can report them.
pub fn emit_types<'a, W: io::Write>(
    w: &mut W,
    registry: &Registry<'a>,
) -> anyhow::Result<Vec<&'a str>> {
    w.write_all(GL_TYPES.as_bytes())?;
    let unknown = unknown_types(registry)?;
    if !unknown.is_empty() {
        writeln!(w)?;
        for name in unknown.iter() {
            if !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
                bail!("unknown type {name:?} is not an identifier");
            }
            writeln!(w, "pub type {name} = *mut c_void;")?;
        }
    }
    Ok(unknown)
}

fn parse_enum_value(value: &str) -> anyhow::Result<i128> {
    let (negative, digits) = match value.strip_prefix('-') {
        Some(digits) => (true, digits),
        None => (false, value),
    };
    let magnitude = match digits
        .strip_prefix("0x")
        .or_else(|| digits.strip_prefix("0X"))
    {
        Some(hex) => i128::from_str_radix(hex, 16),
        None => digits.parse::<i128>(),
    }
    .with_context(|| format!("invalid enum value {value:?}"))?;
    Ok(if negative { -magnitude } else { magnitude })
}

fn gl_enum_type(e: &Enum) -> anyhow::Result<&'static str> {
    let value = parse_enum_value(e.value)?;
    Ok(match e.r#type {
        _ if e.name == "GL_TRUE" || e.name == "GL_FALSE" => "GLboolean",
        Some("ull") => "GLuint64",
        _ if value < 0 => "GLint",
        _ if value > u32::MAX as i128 => "GLuint64",
        Some("u") => "GLuint",
        Some("bitmask") => "GLbitfield",
        _ => "GLenum",
    })
}

#[test]
fn test_gl_enum_type() {
    let e = |name, value, r#type| Enum {
        value,
        name,
        api: None,
        r#type,
        group: None,
        alias: None,
        comment: None,
    };
    let ty = |e: Enum| gl_enum_type(&e).unwrap();
    assert_eq!(ty(e("GL_TRIANGLES", "0x0004", None)), "GLenum");
    assert_eq!(ty(e("GL_TRUE", "1", None)), "GLboolean");
    assert_eq!(ty(e("GL_INVALID_INDEX", "0xFFFFFFFF", Some("u"))), "GLuint");
    assert_eq!(
        ty(e("GL_TIMEOUT_IGNORED", "0xFFFFFFFFFFFFFFFF", Some("ull"))),
        "GLuint64"
    );
    assert_eq!(ty(e("GL_COLOR_BUFFER_BIT", "0x00004000", Some("bitmask"))), "GLbitfield");
    assert_eq!(ty(e("GL_SOMETHING", "-1", None)), "GLint");
    assert!(gl_enum_type(&e("GL_BROKEN", "0xZZ", None)).is_err());
}

pub fn emit_enums<W: io::Write>(w: &mut W, registry: &Registry) -> anyhow::Result<()> {
    for e in registry.enums.iter() {
        let r#type = gl_enum_type(e).with_context(|| format!("could not type {}", e.name))?;
        writeln!(w, "pub const {}: {type} = {};", e.name, e.value)?;
    }
    writeln!(w)?;
    Ok(())
}

#[inline]
fn normalize_command_name<'a>(name: &'a str, api: &Api) -> anyhow::Result<&'a str> {
    name.strip_prefix(api.command_prefix())
        .with_context(|| format!("{name} does not start with {}", api.command_prefix()))
}

const RUST_KEYWORDS: &[&str] = &[
    "abstract", "as", "async", "await", "become", "box", "break", "const", "continue", "do",
    "dyn", "else", "enum", "extern", "false", "final", "fn", "for", "gen", "if", "impl", "in",
    "let", "loop", "macro", "match", "mod", "move", "mut", "override", "priv", "pub", "ref",
    "return", "static", "struct", "trait", "true", "try", "type", "typeof", "unsafe", "unsized",
    "use", "virtual", "where", "while", "yield",
];

fn normalize_command_param_name(name: &str) -> String {
    match name {
        // can't be raw identifiers.
        "self" | "Self" | "super" | "crate" | "_" => format!("{name}_"),
        keyword if RUST_KEYWORDS.iter().any(|it| *it == keyword) => format!("r#{keyword}"),
        ok => ok.to_string(),
    }
}

#[test]
fn test_normalize_command_param_name() {
    assert_eq!(normalize_command_param_name("type"), "r#type");
    assert_eq!(normalize_command_param_name("ref"), "r#ref");
    assert_eq!(normalize_command_param_name("self"), "self_");
    assert_eq!(normalize_command_param_name("target"), "target");
}

fn emit_profile<W: io::Write>(w: &mut W, profile: Option<&str>) -> anyhow::Result<()> {
    match profile {
        Some("core") => write!(w, "Some(Profile::Core)")?,
        Some("compatibility") => write!(w, "Some(Profile::Compatibility)")?,
        _ => write!(w, "None")?,
    }
    Ok(())
}

fn emit_interfaces<W: io::Write>(
    w: &mut W,
    interfaces: &[Interface],
    command_indices: &HashMap<&str, usize>,
) -> anyhow::Result<()> {
    write!(w, "&[")?;
    for interface in interfaces.iter() {
        let mut indices: Vec<usize> = interface
            .commands
            .iter()
            .filter_map(|name| command_indices.get(name).copied())
            .collect();
        if indices.is_empty() {
            continue;
        }
        indices.sort_unstable();
        indices.dedup();
        write!(w, "Interface {{ profile: ")?;
        emit_profile(w, interface.profile)?;
        write!(w, ", commands: &[")?;
        for (i, index) in indices.iter().enumerate() {
            if i > 0 {
                write!(w, ", ")?;
            }
            write!(w, "{index}")?;
        }
        write!(w, "] }}, ")?;
    }
    write!(w, "]")?;
    Ok(())
}

fn emit_tables<W: io::Write>(w: &mut W, registry: &Registry) -> anyhow::Result<()> {
    let command_indices: HashMap<&str, usize> = registry
        .commands
        .iter()
        .enumerate()
        .map(|(i, cmd)| (cmd.proto.name, i))
        .collect();

    writeln!(w, "pub const COMMAND_COUNT: usize = {};\n", registry.commands.len())?;

    writeln!(w, "pub static COMMANDS: [&CStr; COMMAND_COUNT] = [")?;
    for cmd in registry.commands.iter() {
        writeln!(w, "    c\"{}\",", cmd.proto.name)?;
    }
    writeln!(w, "];\n")?;

    writeln!(w, "pub static FEATURES: &[Feature] = &[")?;
    for feat in registry.features.iter() {
        writeln!(w, "    Feature {{")?;
        writeln!(w, "        name: \"{}\",", feat.name)?;
        writeln!(
            w,
            "        version: Version::new({}, {}),",
            feat.number.0, feat.number.1
        )?;
        write!(w, "        requires: ")?;
        emit_interfaces(w, &feat.requires, &command_indices)?;
        write!(w, ",\n        removes: ")?;
        emit_interfaces(w, &feat.removes, &command_indices)?;
        writeln!(w, ",\n    }},")?;
    }
    writeln!(w, "];\n")?;

    writeln!(w, "pub static EXTENSIONS: &[Extension] = &[")?;
    for ext in registry.extensions.iter() {
        write!(w, "    Extension {{ name: \"{}\", requires: ", ext.name)?;
        emit_interfaces(w, &ext.requires, &command_indices)?;
        writeln!(w, " }},")?;
    }
    writeln!(w, "];\n")?;

    Ok(())
}

fn emit_command<W: io::Write>(
    w: &mut W,
    index: usize,
    cmd: &Command,
    api: &Api,
) -> anyhow::Result<()> {
    let name = normalize_command_name(cmd.proto.name, api)?;
    let ret = rust_type(&cmd.proto.type_parts)
        .with_context(|| format!("could not translate return type of {}", cmd.proto.name))?;
    let mut params: Vec<(String, String)> = Vec::with_capacity(cmd.params.len());
    for param in cmd.params.iter() {
        let ty = rust_type(&param.type_parts)
            .with_context(|| format!("could not translate {} of {}", param.name, cmd.proto.name))?
            .with_context(|| format!("{} of {} is void", param.name, cmd.proto.name))?;
        params.push((normalize_command_param_name(param.name), ty));
    }

    // signature

    write!(w, "\n    #[inline]\n    pub unsafe fn {name}(&self")?;
    for (param_name, ty) in params.iter() {
        write!(w, ", {param_name}: {ty}")?;
    }
    write!(w, ")")?;
    if let Some(ret) = ret.as_ref() {
        write!(w, " -> {ret}")?;
    }
    writeln!(w, " {{")?;

    // body

    write!(w, "        type Dst = unsafe extern \"system\" fn(")?;
    for (i, (_, ty)) in params.iter().enumerate() {
        if i > 0 {
            write!(w, ", ")?;
        }
        write!(w, "{ty}")?;
    }
    write!(w, ")")?;
    if let Some(ret) = ret.as_ref() {
        write!(w, " -> {ret}")?;
    }
    writeln!(w, ";")?;

    write!(
        w,
        "        #[cfg(all(debug_assertions, feature = \"debug\"))]\n        log::trace!(\"{}(",
        cmd.proto.name
    )?;
    for i in 0..params.len() {
        if i > 0 {
            write!(w, ", ")?;
        }
        write!(w, "{{:?}}")?;
    }
    write!(w, ")\"")?;
    for (param_name, _) in params.iter() {
        write!(w, ", {param_name}")?;
    }
    writeln!(w, ");")?;

    write!(
        w,
        "        unsafe {{ transmute::<*const c_void, Dst>(self.fn_ptr({index}))("
    )?;
    for (i, (param_name, _)) in params.iter().enumerate() {
        if i > 0 {
            write!(w, ", ")?;
        }
        write!(w, "{param_name}")?;
    }
    writeln!(w, ") }}")?;
    writeln!(w, "    }}")?;

    Ok(())
}

/// emits slot tables (`COMMANDS`, `FEATURES`, `EXTENSIONS`) and one method per command on `Api`.
/// the including module must provide `Api::fn_ptr`, `Feature`, `Extension`, `Interface`,
/// `Profile` and `Version`.
pub fn emit_api<W: io::Write>(w: &mut W, registry: &Registry, api: &Api) -> anyhow::Result<()> {
    writeln!(w, "use std::ffi::{{CStr, c_void}};")?;
    writeln!(w, "use std::mem::transmute;\n")?;

    emit_tables(w, registry)?;

    writeln!(w, "impl Api {{")?;
    for (index, cmd) in registry.commands.iter().enumerate() {
        emit_command(w, index, cmd, api)?;
    }
    writeln!(w, "}}")?;

    Ok(())
}

#[cfg(test)]
const TEST_REGISTRY: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<registry>
    <comment>
        test registry
    </comment>
    <types>
        <type>typedef unsigned int <name>GLenum</name>;</type>
        <type name="stddef">#include &lt;stddef.h&gt;</type>
    </types>
    <enums namespace="GL" start="0x0000" end="0x7FFF" vendor="ARB" comment="Mainly used by -> core">
        <enum value="0" name="GL_FALSE"/>
        <enum value="1" name="GL_TRUE"/>
        <enum value="0x0004" name="GL_TRIANGLES"/>
        <enum value="0x8259" name="GL_ACTIVE_PROGRAM_EXT" api="gl"/>
        <enum value="0x8B8D" name="GL_ACTIVE_PROGRAM_EXT" api="gles2"/>
        <enum value="0x1F02" name="GL_VERSION"/>
        <unused start="0x0005" end="0x0006"/>
    </enums>
    <enums namespace="GL" group="AttribMask" type="bitmask">
        <enum value="0x00004000" name="GL_COLOR_BUFFER_BIT"/>
    </enums>
    <commands namespace="GL">
        <command>
            <proto>void <name>glBegin</name></proto>
            <param group="PrimitiveType"><ptype>GLenum</ptype> <name>mode</name></param>
            <glx type="render" opcode="4"/>
        </command>
        <command>
            <proto>void <name>glDrawArrays</name></proto>
            <param group="PrimitiveType"><ptype>GLenum</ptype> <name>mode</name></param>
            <param><ptype>GLint</ptype> <name>first</name></param>
            <param><ptype>GLsizei</ptype> <name>count</name></param>
        </command>
        <command>
            <proto group="String">const <ptype>GLubyte</ptype> *<name>glGetString</name></proto>
            <param group="StringName"><ptype>GLenum</ptype> <name>name</name></param>
        </command>
        <command>
            <proto>void <name>glDispatchCompute</name></proto>
            <param><ptype>GLuint</ptype> <name>num_groups_x</name></param>
        </command>
        <command>
            <proto>void <name>glFrobnicateOES</name></proto>
            <param><ptype>GLenum</ptype> <name>type</name></param>
        </command>
    </commands>
    <feature api="gl" name="GL_VERSION_1_0" number="1.0">
        <require>
            <!-- comment -->
            <enum name="GL_FALSE"/>
            <enum name="GL_TRUE"/>
            <enum name="GL_TRIANGLES"/>
            <enum name="GL_VERSION"/>
            <enum name="GL_COLOR_BUFFER_BIT"/>
            <command name="glBegin"/>
            <command name="glDrawArrays"/>
            <command name="glGetString"/>
        </require>
    </feature>
    <feature api="gl" name="GL_VERSION_3_2" number="3.2">
        <require/>
        <remove profile="core" comment="legacy">
            <command name="glBegin"/>
        </remove>
    </feature>
    <feature api="gl" name="GL_VERSION_4_3" number="4.3">
        <require>
            <command name="glDispatchCompute"/>
        </require>
    </feature>
    <feature api="gles2" name="GL_ES_VERSION_2_0" number="2.0">
        <require>
            <command name="glFrobnicateOES"/>
        </require>
    </feature>
    <extensions>
        <extension name="GL_ARB_compute_shader" supported="gl|glcore">
            <require>
                <command name="glDispatchCompute"/>
            </require>
        </extension>
        <extension name="GL_EXT_separate_shader_objects" supported="gl|gles2">
            <require api="gl">
                <enum name="GL_ACTIVE_PROGRAM_EXT"/>
            </require>
            <require api="gles2">
                <command name="glFrobnicateOES"/>
            </require>
        </extension>
        <extension name="GL_OES_frobnicate" supported="gles2">
            <require>
                <command name="glFrobnicateOES"/>
            </require>
        </extension>
    </extensions>
</registry>
"#;

#[test]
fn test_parse_registry() {
    let registry = parse_registry(TEST_REGISTRY).unwrap();
    assert_eq!(registry.enums.len(), 7);
    assert_eq!(registry.commands.len(), 5);
    assert_eq!(registry.features.len(), 4);
    assert_eq!(registry.extensions.len(), 3);

    let get_string = &registry.commands[2];
    assert_eq!(get_string.proto.name, "glGetString");
    assert_eq!(
        rust_type(&get_string.proto.type_parts).unwrap().as_deref(),
        Some("*const GLubyte")
    );

    let gl32 = &registry.features[1];
    assert_eq!(gl32.number, Version(3, 2));
    assert_eq!(gl32.removes[0].profile, Some("core"));
    assert_eq!(gl32.removes[0].commands, vec!["glBegin"]);

    let color_buffer_bit = registry
        .enums
        .iter()
        .find(|e| e.name == "GL_COLOR_BUFFER_BIT")
        .unwrap();
    assert_eq!(color_buffer_bit.r#type, Some("bitmask"));
}

#[test]
fn test_filter_registry() {
    let registry = filter_registry(
        parse_registry(TEST_REGISTRY).unwrap(),
        &Api::Gl,
        &Version(3, 2),
        Extensions::All,
    )
    .unwrap();

    let commands: Vec<&str> = registry.commands.iter().map(|c| c.proto.name).collect();
    // sorted, gles-only commands dropped, core removals kept for the loader.
    assert_eq!(
        commands,
        vec!["glBegin", "glDispatchCompute", "glDrawArrays", "glGetString"]
    );
    assert_eq!(registry.features.len(), 2);

    let extensions: Vec<&str> = registry.extensions.iter().map(|e| e.name).collect();
    assert_eq!(
        extensions,
        vec!["GL_ARB_compute_shader", "GL_EXT_separate_shader_objects"]
    );

    let active_program: Vec<&str> = registry
        .enums
        .iter()
        .filter(|e| e.name == "GL_ACTIVE_PROGRAM_EXT")
        .map(|e| e.value)
        .collect();
    assert_eq!(active_program, vec!["0x8259"]);
}

#[test]
fn test_filter_registry_errors() {
    let missing_version = filter_registry(
        parse_registry(TEST_REGISTRY).unwrap(),
        &Api::Gl,
        &Version(9, 9),
        Extensions::None,
    );
    assert!(missing_version.is_err());

    let gles_only = filter_registry(
        parse_registry(TEST_REGISTRY).unwrap(),
        &Api::Gl,
        &Version(1, 0),
        Extensions::Named(&["GL_OES_frobnicate"]),
    );
    assert!(gles_only.is_err());

    let core_only = filter_registry(
        parse_registry(TEST_REGISTRY).unwrap(),
        &Api::Gl,
        &Version(1, 0),
        Extensions::None,
    )
    .unwrap();
    assert!(core_only.extensions.is_empty());
    assert_eq!(core_only.commands.len(), 3);
}

#[test]
fn test_emit() {
    let registry = filter_registry(
        parse_registry(TEST_REGISTRY).unwrap(),
        &Api::Gl,
        &Version(4, 3),
        Extensions::All,
    )
    .unwrap();

    let mut types: Vec<u8> = Vec::new();
    let unknown = emit_types(&mut types, &registry).unwrap();
    assert!(unknown.is_empty());

    let mut enums: Vec<u8> = Vec::new();
    emit_enums(&mut enums, &registry).unwrap();
    let enums = String::from_utf8(enums).unwrap();
    assert!(enums.contains("pub const GL_TRIANGLES: GLenum = 0x0004;\n"));
    assert!(enums.contains("pub const GL_TRUE: GLboolean = 1;\n"));
    assert!(enums.contains("pub const GL_COLOR_BUFFER_BIT: GLbitfield = 0x00004000;\n"));

    let mut api: Vec<u8> = Vec::new();
    emit_api(&mut api, &registry, &Api::Gl).unwrap();
    let api = String::from_utf8(api).unwrap();
    assert!(api.contains("pub const COMMAND_COUNT: usize = 4;"));
    assert!(api.contains("    c\"glDispatchCompute\",\n"));
    assert!(api.contains(
        "pub unsafe fn DrawArrays(&self, mode: GLenum, first: GLint, count: GLsizei) {"
    ));
    assert!(api.contains("pub unsafe fn GetString(&self, name: GLenum) -> *const GLubyte {"));
    assert!(api.contains("transmute::<*const c_void, Dst>(self.fn_ptr(2))(mode, first, count)"));
    assert!(api.contains(
        "removes: &[Interface { profile: Some(Profile::Core), commands: &[0] }, ]"
    ));
    assert!(api.contains(
        "Extension { name: \"GL_ARB_compute_shader\", requires: &[Interface { profile: None, commands: &[1] }, ] }"
    ));
}

#[test]
fn test_khronos_registry() {
    let xml = String::from_utf8_lossy(khronos_api::GL_XML);
    let registry = filter_registry(
        parse_registry(&xml).unwrap(),
        &Api::Gl,
        &Version(4, 6),
        Extensions::All,
    )
    .unwrap();
    assert_eq!(registry.features.len(), 19);
    assert!(registry.extensions.len() > 100);

    let mut types: Vec<u8> = Vec::new();
    let unknown = emit_types(&mut types, &registry).unwrap();
    assert!(unknown.is_empty(), "{unknown:?}");

    for cmd in registry.commands.iter() {
        rust_type(&cmd.proto.type_parts).unwrap();
        for param in cmd.params.iter() {
            assert!(rust_type(&param.type_parts).unwrap().is_some());
        }
    }

    let find = |name: &str| registry.enums.iter().find(|e| e.name == name).unwrap();
    let timeout_ignored = find("GL_TIMEOUT_IGNORED");
    assert_eq!(gl_enum_type(timeout_ignored).unwrap(), "GLuint64");
    assert_eq!(parse_enum_value(timeout_ignored.value).unwrap(), u64::MAX as i128);
    let invalid_index = find("GL_INVALID_INDEX");
    assert_eq!(gl_enum_type(invalid_index).unwrap(), "GLuint");
    assert_eq!(parse_enum_value(invalid_index.value).unwrap(), u32::MAX as i128);
    assert_eq!(parse_enum_value(find("GL_TEXTURE0").value).unwrap(), 0x84C0);
    assert_eq!(registry.enums.iter().filter(|e| e.name == "GL_TRIANGLES").count(), 1);

    let mut enums: Vec<u8> = Vec::new();
    emit_enums(&mut enums, &registry).unwrap();

    let mut api: Vec<u8> = Vec::new();
    emit_api(&mut api, &registry, &Api::Gl).unwrap();
    let api = String::from_utf8(api).unwrap();
    assert!(api.contains("pub unsafe fn CreateSyncFromCLeventARB(&self, context: *mut _cl_context"));
    assert!(!api.contains("struct "));
}

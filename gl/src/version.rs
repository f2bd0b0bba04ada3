use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Version {
    pub major: u32,
    pub minor: u32,
}

impl Version {
    pub const fn new(major: u32, minor: u32) -> Self {
        Self { major, minor }
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Profile {
    Core,
    Compatibility,
}

/// what `glGetString(GL_VERSION)` reports.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContextVersion {
    pub version: Version,
    pub es: bool,
    /// vendor specific remainder, for example `"NVIDIA 535.54"` or `"(Core Profile) Mesa 23.0"`.
    pub release: String,
}

impl ContextVersion {
    /// accepts `"<major>.<minor>[.<release>] [vendor info]"`, optionally prefixed with
    /// `"OpenGL ES "`, `"OpenGL ES-CM "` or `"OpenGL ES-CL "`.
    pub fn parse(input: &str) -> Option<Self> {
        let input = input.trim();
        let (es, rest) = match input.strip_prefix("OpenGL ES") {
            Some(rest) => {
                let rest = rest
                    .strip_prefix("-CM")
                    .or_else(|| rest.strip_prefix("-CL"))
                    .unwrap_or(rest);
                (true, rest.trim_start())
            }
            None => (false, input),
        };

        let number_end = rest
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .unwrap_or(rest.len());
        let (number, release) = rest.split_at(number_end);

        let mut parts = number.split('.');
        let major: u32 = parts.next()?.parse().ok()?;
        let minor: u32 = parts.next()?.parse().ok()?;

        Some(Self {
            version: Version::new(major, minor),
            es,
            release: release.trim().to_string(),
        })
    }
}

impl fmt::Display for ContextVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.es {
            write!(f, "OpenGL ES ")?;
        }
        write!(f, "{}", self.version)?;
        if !self.release.is_empty() {
            write!(f, " {}", self.release)?;
        }
        Ok(())
    }
}

#[test]
fn test_version_order() {
    assert!(Version::new(3, 3) < Version::new(4, 3));
    assert!(Version::new(4, 6) > Version::new(4, 3));
    assert!(Version::new(2, 1) < Version::new(3, 0));
    assert_eq!(Version::new(4, 6).to_string(), "4.6");
}

#[test]
fn test_parse_desktop() {
    let v = ContextVersion::parse("4.6.0 NVIDIA 535.54.03").unwrap();
    assert_eq!(v.version, Version::new(4, 6));
    assert!(!v.es);
    assert_eq!(v.release, "NVIDIA 535.54.03");

    let v = ContextVersion::parse("3.3 (Core Profile) Mesa 23.0.4").unwrap();
    assert_eq!(v.version, Version::new(3, 3));
    assert_eq!(v.release, "(Core Profile) Mesa 23.0.4");

    let v = ContextVersion::parse("2.1 Metal - 76.3").unwrap();
    assert_eq!(v.version, Version::new(2, 1));

    let v = ContextVersion::parse("4.5").unwrap();
    assert_eq!(v.version, Version::new(4, 5));
    assert_eq!(v.release, "");
}

#[test]
fn test_parse_es() {
    let v = ContextVersion::parse("OpenGL ES 3.2 Mesa 23.0.4").unwrap();
    assert_eq!(v.version, Version::new(3, 2));
    assert!(v.es);
    assert_eq!(v.to_string(), "OpenGL ES 3.2 Mesa 23.0.4");

    let v = ContextVersion::parse("OpenGL ES-CM 1.1").unwrap();
    assert_eq!(v.version, Version::new(1, 1));
    assert!(v.es);
}

#[test]
fn test_parse_invalid() {
    assert_eq!(ContextVersion::parse(""), None);
    assert_eq!(ContextVersion::parse("OpenGL"), None);
    assert_eq!(ContextVersion::parse("4"), None);
    assert_eq!(ContextVersion::parse("four.six"), None);
}

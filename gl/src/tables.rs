use crate::version::{Profile, Version};

/// one `<require>` or `<remove>` block. `commands` are indices into `COMMANDS`.
#[derive(Debug)]
pub struct Interface {
    pub profile: Option<Profile>,
    pub commands: &'static [usize],
}

impl Interface {
    #[inline]
    pub fn applies_to(&self, profile: Profile) -> bool {
        self.profile.is_none_or(|it| it == profile)
    }
}

/// a core gl version, `GL_VERSION_x_y`.
#[derive(Debug)]
pub struct Feature {
    pub name: &'static str,
    pub version: Version,
    pub requires: &'static [Interface],
    pub removes: &'static [Interface],
}

#[derive(Debug)]
pub struct Extension {
    pub name: &'static str,
    pub requires: &'static [Interface],
}

#[test]
fn test_interface_applies_to() {
    let any = Interface {
        profile: None,
        commands: &[],
    };
    assert!(any.applies_to(Profile::Core));
    assert!(any.applies_to(Profile::Compatibility));

    let core = Interface {
        profile: Some(Profile::Core),
        commands: &[],
    };
    assert!(core.applies_to(Profile::Core));
    assert!(!core.applies_to(Profile::Compatibility));
}

//! OpenGL entry points and enums generated from the khronos registry, loaded at runtime into a
//! per-context table.
//!
//! ```no_run
//! # unsafe fn with_current_context(get_proc_address: impl FnMut(&std::ffi::CStr) -> *const std::ffi::c_void) {
//! let api = unsafe { gl::Api::load_with(get_proc_address) };
//! if api.is_loaded("glDispatchCompute") {
//!     unsafe { api.DispatchCompute(8, 8, 1) };
//! }
//! unsafe { api.DrawArrays(gl::GL_TRIANGLES, 0, 3) };
//! # }
//! ```

mod loader;
mod tables;
mod version;

pub mod libgl;

#[allow(non_camel_case_types, non_snake_case, dead_code)]
pub mod types {
    include!(concat!(env!("OUT_DIR"), "/gl_types_generated.rs"));
}

#[allow(non_upper_case_globals)]
pub mod enums {
    use crate::types::*;

    include!(concat!(env!("OUT_DIR"), "/gl_enums_generated.rs"));
}

#[allow(
    non_snake_case,
    unused_imports,
    clippy::too_many_arguments,
    clippy::missing_safety_doc
)]
mod api {
    use crate::tables::{Extension, Feature, Interface};
    use crate::types::*;
    use crate::{Api, Profile, Version};

    include!(concat!(env!("OUT_DIR"), "/gl_api_generated.rs"));
}

pub use api::{COMMAND_COUNT, COMMANDS, EXTENSIONS, FEATURES};
pub use enums::*;
pub use loader::{Api, LoadState, command_index};
pub use tables::{Extension, Feature, Interface};
pub use types::*;
pub use version::{ContextVersion, Profile, Version};

#[test]
fn test_enum_values() {
    assert_eq!(GL_TRIANGLES, 0x0004);
    assert_eq!(GL_TEXTURE0, 0x84C0);
    assert_eq!(GL_COLOR_BUFFER_BIT as u32, 0x4000);
    assert_eq!(GL_TRUE, 1);
    assert_eq!(GL_FALSE, 0);
    assert_eq!(GL_INVALID_INDEX as u32, u32::MAX);
    assert_eq!(GL_TIMEOUT_IGNORED as u64, u64::MAX);
    assert_eq!(GL_VERSION, 0x1F02);
    assert_eq!(GL_NUM_EXTENSIONS, 0x821D);
}

#[test]
fn test_tables() {
    assert_eq!(COMMANDS.len(), COMMAND_COUNT);
    assert_eq!(FEATURES.first().map(|it| it.version), Some(Version::new(1, 0)));
    assert_eq!(FEATURES.last().map(|it| it.version), Some(Version::new(4, 6)));
    assert!(FEATURES.windows(2).all(|pair| pair[0].version < pair[1].version));
    for feature in FEATURES.iter() {
        for interface in feature.requires.iter().chain(feature.removes.iter()) {
            assert!(interface.commands.iter().all(|&index| index < COMMAND_COUNT));
        }
    }

    // removals only ever target core contexts.
    assert!(
        FEATURES
            .iter()
            .flat_map(|it| it.removes.iter())
            .all(|it| it.profile == Some(Profile::Core))
    );

    #[cfg(feature = "extensions")]
    {
        assert!(EXTENSIONS.windows(2).all(|pair| pair[0].name < pair[1].name));
        assert!(EXTENSIONS.iter().any(|it| it.name == "GL_ARB_compute_shader"));
    }
    #[cfg(not(feature = "extensions"))]
    assert!(EXTENSIONS.is_empty());
}

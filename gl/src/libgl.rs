use std::ffi::{CStr, c_void};
#[cfg(any(unix, windows))]
use std::ffi::c_char;

#[cfg(any(unix, windows))]
use dynlib::DynLib;

use crate::loader::normalize_proc_address;

/// asks `query` first, then `fallback`.
///
/// wglGetProcAddress only knows entry points past gl 1.1 (glGetString included), those have to
/// come from the exports of opengl32.dll.
pub fn query_then_fallback<Q, F>(name: &CStr, query: Q, fallback: F) -> *const c_void
where
    Q: FnOnce(&CStr) -> *const c_void,
    F: FnOnce(&CStr) -> *const c_void,
{
    let ptr = normalize_proc_address(query(name));
    if ptr.is_null() { fallback(name) } else { ptr }
}

#[cfg(windows)]
type GetProcAddress = unsafe extern "system" fn(*const c_char) -> *const c_void;
#[cfg(unix)]
type GetProcAddress = unsafe extern "C" fn(*const c_char) -> *const c_void;

/// libraries and proc address queries, tried in order.
#[cfg(windows)]
const CANDIDATES: &[(&[&CStr], &[&CStr])] = &[(&[c"opengl32.dll"], &[c"wglGetProcAddress"])];
#[cfg(target_vendor = "apple")]
const CANDIDATES: &[(&[&CStr], &[&CStr])] = &[(
    &[c"/System/Library/Frameworks/OpenGL.framework/OpenGL"],
    &[],
)];
#[cfg(all(unix, not(target_vendor = "apple")))]
const CANDIDATES: &[(&[&CStr], &[&CStr])] = &[
    (
        &[c"libGL.so.1", c"libGL.so"],
        &[c"glXGetProcAddressARB", c"glXGetProcAddress"],
    ),
    (&[c"libEGL.so.1", c"libEGL.so"], &[c"eglGetProcAddress"]),
];

/// the system's gl library, a proc address source for [`crate::Api::load_with`].
///
/// this does not create or make current any context. on windows the addresses that
/// wglGetProcAddress hands out depend on the current context.
#[cfg(any(unix, windows))]
pub struct LibGl {
    get_proc_address: Option<GetProcAddress>,
    dynlib: DynLib,
}

#[cfg(any(unix, windows))]
impl LibGl {
    pub fn load() -> anyhow::Result<Self> {
        let mut errors: Vec<String> = Vec::with_capacity(CANDIDATES.len());
        for (filenames, queries) in CANDIDATES.iter() {
            let dynlib = match DynLib::open_any(filenames) {
                Ok(dynlib) => dynlib,
                Err(err) => {
                    errors.push(err.to_string());
                    continue;
                }
            };
            let get_proc_address = queries
                .iter()
                .find_map(|query| dynlib.lookup::<GetProcAddress>(query).ok());
            match get_proc_address {
                Some(_) => log::info!("loading gl through {filenames:?}"),
                None if queries.is_empty() => {
                    log::info!("loading gl through {filenames:?} exports")
                }
                None => log::warn!("{filenames:?} has none of {queries:?}, using exports only"),
            }
            return Ok(Self {
                get_proc_address,
                dynlib,
            });
        }
        anyhow::bail!("could not load gl: {}", errors.join("; "))
    }

    /// asks the library's query first, then its exports. null if neither knows `name`.
    pub fn get_proc_address(&self, name: &CStr) -> *const c_void {
        query_then_fallback(
            name,
            |name| match self.get_proc_address {
                Some(get_proc_address) => unsafe { get_proc_address(name.as_ptr()) },
                None => std::ptr::null(),
            },
            |name| self.dynlib.lookup_ptr(name).cast_const(),
        )
    }
}

#[test]
fn test_query_then_fallback() {
    let query_hit = 0x1000 as *const c_void;
    let export_hit = 0x2000 as *const c_void;

    let ptr = query_then_fallback(c"glGenVertexArrays", |_| query_hit, |_| export_hit);
    assert_eq!(ptr, query_hit);

    let ptr = query_then_fallback(c"glGetString", |_| std::ptr::null(), |_| export_hit);
    assert_eq!(ptr, export_hit);

    let ptr = query_then_fallback(c"glNothing", |_| std::ptr::null(), |_| std::ptr::null());
    assert!(ptr.is_null());

    if cfg!(windows) {
        let ptr = query_then_fallback(c"glGetString", |_| 2 as *const c_void, |_| export_hit);
        assert_eq!(ptr, export_hit);
    }
}

// glx hands out stubs for any gl* name, so unknown names are not checked.
#[cfg(any(unix, windows))]
#[test]
fn test_load() {
    match LibGl::load() {
        Ok(libgl) => {
            assert!(!libgl.get_proc_address(c"glGetString").is_null());
        }
        Err(err) => assert!(err.to_string().contains("could not load gl")),
    }
}

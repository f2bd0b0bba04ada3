use std::collections::HashSet;
use std::ffi::{CStr, c_void};
use std::ptr::{NonNull, null};

use crate::api::{COMMAND_COUNT, COMMANDS, EXTENSIONS, FEATURES};
use crate::enums::*;
use crate::types::*;
use crate::version::{ContextVersion, Profile, Version};

#[cold]
#[inline(never)]
fn not_loaded_panic(index: usize) -> ! {
    panic!("{} was not loaded", COMMANDS[index].to_string_lossy())
}

/// wglGetProcAddress reports failure with a few small sentinel values besides null.
#[inline]
pub(crate) fn normalize_proc_address(ptr: *const c_void) -> *const c_void {
    if cfg!(windows) && matches!(ptr as isize, 1 | 2 | 3 | -1) {
        null()
    } else {
        ptr
    }
}

/// finds the slot of a command by its registry name, e.g. `"glDrawArrays"`.
pub fn command_index(name: &str) -> Option<usize> {
    COMMANDS
        .binary_search_by(|probe| probe.to_bytes().cmp(name.as_bytes()))
        .ok()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadState {
    Unloaded,
    Loaded,
}

#[derive(Debug, Clone)]
struct ContextInfo {
    version: ContextVersion,
    profile: Profile,
}

/// commands that are needed to find out what else to load.
const BOOTSTRAP_COMMANDS: &[&str] = &["glGetString", "glGetIntegerv", "glGetStringi"];

/// marks commands required by every core feature up to `version`, minus what `profile` removes.
fn core_commands(version: Version, profile: Profile) -> Box<[bool; COMMAND_COUNT]> {
    let mut wanted = Box::new([false; COMMAND_COUNT]);
    for feature in FEATURES.iter().filter(|feature| feature.version <= version) {
        for interface in feature.requires.iter() {
            if interface.applies_to(profile) {
                interface.commands.iter().for_each(|&index| wanted[index] = true);
            }
        }
        for interface in feature.removes.iter() {
            if interface.applies_to(profile) {
                interface.commands.iter().for_each(|&index| wanted[index] = false);
            }
        }
    }
    wanted
}

/// gl entry points of one context.
///
/// every slot starts out null. [`Api::load_functions`] and [`Api::load_extensions`] fill the
/// slots from whatever context is current on the calling thread; a slot that stays null means
/// that the entry point is not available. calling one panics.
///
/// resolved addresses are only valid for the context they were loaded from (and contexts sharing
/// with it), keep one `Api` per context and reload after switching drivers.
pub struct Api {
    slots: Box<[*const c_void; COMMAND_COUNT]>,
    /// slots filled by `load_functions`. `load_extensions` leaves those alone.
    core_slots: Box<[bool; COMMAND_COUNT]>,
    context: Option<ContextInfo>,
    extensions: HashSet<String>,
}

// the table is written only through `&mut self`. calling through it is unsafe and requires the
// owning context to be current on the calling thread, which is the caller's business.
unsafe impl Send for Api {}
unsafe impl Sync for Api {}

impl Default for Api {
    fn default() -> Self {
        Self::unloaded()
    }
}

impl Api {
    pub fn unloaded() -> Self {
        Self {
            slots: Box::new([null(); COMMAND_COUNT]),
            core_slots: Box::new([false; COMMAND_COUNT]),
            context: None,
            extensions: HashSet::new(),
        }
    }

    /// loads core functions and extensions.
    ///
    /// # Safety
    ///
    /// a gl context must be current on the calling thread and `get_proc_address` must return
    /// addresses of functions with the signatures the khronos registry declares (or null).
    pub unsafe fn load_with<F>(mut get_proc_address: F) -> Self
    where
        F: FnMut(&CStr) -> *const c_void,
    {
        let mut api = Self::unloaded();
        unsafe {
            api.load_functions(&mut get_proc_address);
            api.load_extensions(&mut get_proc_address);
        }
        api
    }

    /// resolves the core entry points of every gl version up to the one the current context
    /// reports. anything previously loaded (extensions included) is dropped first.
    ///
    /// # Safety
    ///
    /// see [`Api::load_with`].
    pub unsafe fn load_functions<F>(&mut self, mut get_proc_address: F)
    where
        F: FnMut(&CStr) -> *const c_void,
    {
        self.slots.fill(null());
        self.core_slots.fill(false);
        self.context = None;
        self.extensions.clear();

        let context = unsafe { self.query_context(&mut get_proc_address) };
        self.slots.fill(null());
        let Some(context) = context else {
            return;
        };

        let wanted = core_commands(context.version.version, context.profile);
        let mut num_wanted = 0;
        let mut num_loaded = 0;
        for index in (0..COMMAND_COUNT).filter(|&index| wanted[index]) {
            num_wanted += 1;
            if self.resolve(index, &mut get_proc_address) {
                self.core_slots[index] = true;
                num_loaded += 1;
            } else {
                log::trace!("{} is not available", COMMANDS[index].to_string_lossy());
            }
        }
        log::debug!(
            "loaded {num_loaded}/{num_wanted} entry points of gl {} ({:?} profile)",
            context.version,
            context.profile,
        );

        self.context = Some(context);
    }

    /// resolves the entry points of every extension that the current context advertises.
    /// entry points of extensions that are not advertised stay null, unless they were loaded as
    /// part of a core version by [`Api::load_functions`].
    ///
    /// # Safety
    ///
    /// see [`Api::load_with`].
    pub unsafe fn load_extensions<F>(&mut self, mut get_proc_address: F)
    where
        F: FnMut(&CStr) -> *const c_void,
    {
        self.extensions.clear();

        let context = match self.context.clone() {
            Some(context) => Some(context),
            None => unsafe { self.query_context(&mut get_proc_address) },
        };
        let advertised = match context.as_ref() {
            Some(context) => unsafe { self.query_extensions(context) },
            None => HashSet::new(),
        };
        self.clear_extension_slots();
        let Some(context) = context else {
            return;
        };

        let mut num_extensions = 0;
        let mut num_loaded = 0;
        for extension in EXTENSIONS.iter() {
            if !advertised.contains(extension.name) {
                continue;
            }
            num_extensions += 1;
            for interface in extension.requires.iter() {
                if !interface.applies_to(context.profile) {
                    continue;
                }
                for &index in interface.commands.iter() {
                    if !self.slots[index].is_null() {
                        continue;
                    }
                    if self.resolve(index, &mut get_proc_address) {
                        num_loaded += 1;
                    } else {
                        log::trace!(
                            "{} of {} is not available",
                            COMMANDS[index].to_string_lossy(),
                            extension.name,
                        );
                    }
                }
            }
        }
        log::debug!(
            "loaded {num_loaded} entry points of {num_extensions} known extensions ({} advertised)",
            advertised.len(),
        );

        self.extensions = advertised;
    }

    fn clear_extension_slots(&mut self) {
        for (slot, is_core) in self.slots.iter_mut().zip(self.core_slots.iter()) {
            if !is_core {
                *slot = null();
            }
        }
    }

    fn resolve<F>(&mut self, index: usize, get_proc_address: &mut F) -> bool
    where
        F: FnMut(&CStr) -> *const c_void,
    {
        let ptr = normalize_proc_address(get_proc_address(COMMANDS[index]));
        self.slots[index] = ptr;
        !ptr.is_null()
    }

    unsafe fn query_context<F>(&mut self, get_proc_address: &mut F) -> Option<ContextInfo>
    where
        F: FnMut(&CStr) -> *const c_void,
    {
        for name in BOOTSTRAP_COMMANDS {
            if let Some(index) = command_index(name) {
                self.resolve(index, get_proc_address);
            }
        }

        if !self.is_loaded("glGetString") {
            log::warn!("could not resolve glGetString, is a gl context current?");
            return None;
        }
        let Some(version_string) = (unsafe { self.get_string(GL_VERSION) }) else {
            log::warn!("glGetString(GL_VERSION) returned null, is a gl context current?");
            return None;
        };
        let Some(version) = ContextVersion::parse(&version_string) else {
            log::warn!("could not parse gl version {version_string:?}");
            return None;
        };
        if version.es {
            log::warn!("{version} is an opengl es context, only desktop gl can be loaded");
            return None;
        }

        let profile = if version.version >= Version::new(3, 2) && self.is_loaded("glGetIntegerv")
        {
            let mut mask: GLint = 0;
            unsafe { self.GetIntegerv(GL_CONTEXT_PROFILE_MASK, &mut mask) };
            if mask as u32 & GL_CONTEXT_CORE_PROFILE_BIT as u32 != 0 {
                Profile::Core
            } else {
                Profile::Compatibility
            }
        } else {
            Profile::Compatibility
        };

        Some(ContextInfo { version, profile })
    }

    unsafe fn query_extensions(&self, context: &ContextInfo) -> HashSet<String> {
        let indexed = context.version.version >= Version::new(3, 0)
            && self.is_loaded("glGetStringi")
            && self.is_loaded("glGetIntegerv");
        if indexed {
            let mut count: GLint = 0;
            unsafe { self.GetIntegerv(GL_NUM_EXTENSIONS, &mut count) };
            return (0..count.max(0) as GLuint)
                .filter_map(|index| {
                    let ptr = unsafe { self.GetStringi(GL_EXTENSIONS, index) };
                    unsafe { string_from_gl(ptr) }
                })
                .collect();
        }

        match unsafe { self.get_string(GL_EXTENSIONS) } {
            Some(extensions) => extensions.split_whitespace().map(str::to_owned).collect(),
            None => HashSet::new(),
        }
    }

    unsafe fn get_string(&self, name: GLenum) -> Option<String> {
        unsafe { string_from_gl(self.GetString(name)) }
    }

    /// address of a slot, null if not loaded. used by the generated entry points.
    #[inline(always)]
    pub(crate) fn fn_ptr(&self, index: usize) -> *const c_void {
        let ptr = self.slots[index];
        if ptr.is_null() {
            not_loaded_panic(index);
        }
        ptr
    }

    pub fn state(&self) -> LoadState {
        if self.context.is_some() {
            LoadState::Loaded
        } else {
            LoadState::Unloaded
        }
    }

    /// version of the context that [`Api::load_functions`] loaded from.
    pub fn context_version(&self) -> Option<&ContextVersion> {
        self.context.as_ref().map(|context| &context.version)
    }

    pub fn profile(&self) -> Option<Profile> {
        self.context.as_ref().map(|context| context.profile)
    }

    /// extensions advertised by the context, as of the last [`Api::load_extensions`].
    pub fn extensions(&self) -> &HashSet<String> {
        &self.extensions
    }

    pub fn has_extension(&self, name: &str) -> bool {
        self.extensions.contains(name)
    }

    /// whether the entry point with the given registry name (e.g. `"glDispatchCompute"`) can be
    /// called.
    pub fn is_loaded(&self, name: &str) -> bool {
        self.proc_address(name).is_some()
    }

    pub fn proc_address(&self, name: &str) -> Option<NonNull<c_void>> {
        let index = command_index(name)?;
        NonNull::new(self.slots[index].cast_mut())
    }

    pub fn loaded_count(&self) -> usize {
        self.slots.iter().filter(|slot| !slot.is_null()).count()
    }
}

unsafe fn string_from_gl(ptr: *const GLubyte) -> Option<String> {
    if ptr.is_null() {
        return None;
    }
    Some(
        unsafe { CStr::from_ptr(ptr.cast()) }
            .to_string_lossy()
            .into_owned(),
    )
}

// a fake driver. every test runs on its own thread, so thread locals keep tests apart.

#[cfg(test)]
struct FakeDriver {
    version: &'static CStr,
    profile_mask: GLint,
    /// for glGetStringi.
    extensions: &'static [&'static CStr],
    /// for glGetString(GL_EXTENSIONS), only answered on compatibility contexts.
    legacy_extensions: &'static CStr,
    missing: &'static [&'static str],
}

#[cfg(test)]
impl FakeDriver {
    const fn new(version: &'static CStr, profile_mask: GLint) -> Self {
        Self {
            version,
            profile_mask,
            extensions: &[],
            legacy_extensions: c"",
            missing: &[],
        }
    }
}

#[cfg(test)]
thread_local! {
    static FAKE_DRIVER: std::cell::RefCell<FakeDriver> =
        const { std::cell::RefCell::new(FakeDriver::new(c"4.6.0 Fake", 1)) };
}

#[cfg(test)]
fn set_fake_driver(driver: FakeDriver) {
    FAKE_DRIVER.with_borrow_mut(|it| *it = driver);
}

#[cfg(test)]
extern "system" fn fake_get_string(name: GLenum) -> *const GLubyte {
    FAKE_DRIVER.with_borrow(|driver| match name {
        GL_VERSION => driver.version.as_ptr().cast(),
        GL_EXTENSIONS if driver.profile_mask & GL_CONTEXT_CORE_PROFILE_BIT as GLint == 0 => {
            driver.legacy_extensions.as_ptr().cast()
        }
        _ => null(),
    })
}

#[cfg(test)]
extern "system" fn fake_get_integerv(pname: GLenum, data: *mut GLint) {
    let value = FAKE_DRIVER.with_borrow(|driver| match pname {
        GL_CONTEXT_PROFILE_MASK => driver.profile_mask,
        GL_NUM_EXTENSIONS => driver.extensions.len() as GLint,
        _ => 0,
    });
    unsafe { *data = value };
}

#[cfg(test)]
extern "system" fn fake_get_stringi(name: GLenum, index: GLuint) -> *const GLubyte {
    FAKE_DRIVER.with_borrow(|driver| match name {
        GL_EXTENSIONS => driver
            .extensions
            .get(index as usize)
            .map_or(null(), |it| it.as_ptr().cast()),
        _ => null(),
    })
}

#[cfg(test)]
extern "system" fn fake_get_error() -> GLenum {
    GL_INVALID_OPERATION
}

#[cfg(test)]
extern "system" fn fake_entry_point() {}

#[cfg(test)]
fn fake_get_proc_address(name: &CStr) -> *const c_void {
    let name = name.to_str().unwrap();
    if FAKE_DRIVER.with_borrow(|driver| driver.missing.iter().any(|it| *it == name)) {
        return null();
    }
    match name {
        "glGetString" => fake_get_string as *const c_void,
        "glGetIntegerv" => fake_get_integerv as *const c_void,
        "glGetStringi" => fake_get_stringi as *const c_void,
        "glGetError" => fake_get_error as *const c_void,
        _ => fake_entry_point as *const c_void,
    }
}

#[cfg(test)]
fn null_pattern(api: &Api) -> Vec<bool> {
    api.slots.iter().map(|slot| slot.is_null()).collect()
}

#[test]
fn test_unloaded() {
    let api = Api::unloaded();
    assert_eq!(api.state(), LoadState::Unloaded);
    assert_eq!(api.loaded_count(), 0);
    assert!(!api.is_loaded("glDrawArrays"));
    assert!(api.context_version().is_none());
}

#[test]
fn test_command_index() {
    assert!(COMMANDS.windows(2).all(|pair| pair[0] < pair[1]));
    let index = command_index("glDrawArrays").unwrap();
    assert_eq!(COMMANDS[index], c"glDrawArrays");
    assert_eq!(command_index("glNotAnEntryPoint"), None);
    assert_eq!(command_index("DrawArrays"), None);
}

#[test]
fn test_core_33_then_43() {
    set_fake_driver(FakeDriver::new(c"3.3.0 (Core Profile) Fake", 1));

    let mut api = Api::unloaded();
    unsafe { api.load_functions(fake_get_proc_address) };
    assert_eq!(api.state(), LoadState::Loaded);
    assert_eq!(api.profile(), Some(Profile::Core));
    assert_eq!(
        api.context_version().map(|it| it.version),
        Some(Version::new(3, 3))
    );
    assert!(api.is_loaded("glDrawArrays"));
    assert!(api.is_loaded("glGenVertexArrays"));
    assert!(api.is_loaded("glVertexAttribDivisor"));
    assert!(!api.is_loaded("glDispatchCompute"));
    assert!(!api.is_loaded("glSpecializeShader"));
    // removed from core profiles in 3.2
    assert!(!api.is_loaded("glBegin"));

    set_fake_driver(FakeDriver::new(c"4.3.0 (Core Profile) Fake", 1));
    unsafe { api.load_functions(fake_get_proc_address) };
    assert!(api.is_loaded("glDispatchCompute"));
    assert!(!api.is_loaded("glSpecializeShader"));
}

#[test]
fn test_compatibility_profile() {
    set_fake_driver(FakeDriver::new(c"4.6 (Compatibility Profile) Fake", 2));

    let mut api = Api::unloaded();
    unsafe { api.load_functions(fake_get_proc_address) };
    assert_eq!(api.profile(), Some(Profile::Compatibility));
    assert!(api.is_loaded("glBegin"));
    assert!(api.is_loaded("glSpecializeShader"));
}

#[test]
fn test_legacy_context() {
    set_fake_driver(FakeDriver::new(c"2.1 Fake", 0));

    let mut api = Api::unloaded();
    unsafe { api.load_functions(fake_get_proc_address) };
    assert_eq!(api.profile(), Some(Profile::Compatibility));
    assert!(api.is_loaded("glBegin"));
    assert!(api.is_loaded("glUseProgram"));
    assert!(!api.is_loaded("glGenVertexArrays"));
    // 3.0, resolved only to find out what to load.
    assert!(!api.is_loaded("glGetStringi"));
}

#[test]
fn test_idempotent() {
    set_fake_driver(FakeDriver {
        missing: &["glDrawElements"],
        ..FakeDriver::new(c"4.1 Fake", 1)
    });

    let mut api = Api::unloaded();
    unsafe { api.load_functions(fake_get_proc_address) };
    let first = null_pattern(&api);
    let first_count = api.loaded_count();
    unsafe { api.load_functions(fake_get_proc_address) };
    assert_eq!(null_pattern(&api), first);
    assert_eq!(api.loaded_count(), first_count);
    assert!(first_count > 0);
}

#[test]
fn test_missing_symbol_is_not_fatal() {
    set_fake_driver(FakeDriver {
        missing: &["glDrawArrays"],
        ..FakeDriver::new(c"4.6.0 Fake", 1)
    });

    let mut api = Api::unloaded();
    unsafe { api.load_functions(fake_get_proc_address) };
    assert_eq!(api.state(), LoadState::Loaded);
    assert!(!api.is_loaded("glDrawArrays"));
    assert!(api.is_loaded("glDrawElements"));
    assert_eq!(api.proc_address("glDrawArrays"), None);
}

#[test]
#[should_panic(expected = "glDrawArrays was not loaded")]
fn test_calling_unloaded_panics() {
    set_fake_driver(FakeDriver {
        missing: &["glDrawArrays"],
        ..FakeDriver::new(c"4.6.0 Fake", 1)
    });

    let mut api = Api::unloaded();
    unsafe {
        api.load_functions(fake_get_proc_address);
        api.DrawArrays(GL_TRIANGLES, 0, 3);
    }
}

#[test]
fn test_call_through_slot() {
    set_fake_driver(FakeDriver::new(c"3.3 Fake", 1));

    let api = unsafe { Api::load_with(fake_get_proc_address) };
    assert_eq!(unsafe { api.GetError() }, GL_INVALID_OPERATION);
}

#[test]
fn test_no_context() {
    set_fake_driver(FakeDriver::new(c"", 0));

    let mut api = Api::unloaded();
    unsafe { api.load_functions(fake_get_proc_address) };
    assert_eq!(api.state(), LoadState::Unloaded);
    assert_eq!(api.loaded_count(), 0);

    let api = unsafe { Api::load_with(|_| null()) };
    assert_eq!(api.state(), LoadState::Unloaded);
    assert_eq!(api.loaded_count(), 0);
}

#[test]
fn test_es_context_is_not_loaded() {
    set_fake_driver(FakeDriver::new(c"OpenGL ES 3.2 Fake", 0));

    let mut api = Api::unloaded();
    unsafe { api.load_functions(fake_get_proc_address) };
    assert_eq!(api.state(), LoadState::Unloaded);
    assert_eq!(api.loaded_count(), 0);
}

/// behaves like wglGetProcAddress: nothing from gl 1.0 and 1.1 resolves.
#[cfg(test)]
fn fake_wgl_get_proc_address(name: &CStr) -> *const c_void {
    let index = command_index(&name.to_string_lossy());
    let gl_1_1 = FEATURES
        .iter()
        .filter(|feature| feature.version <= Version::new(1, 1))
        .flat_map(|feature| feature.requires.iter())
        .any(|interface| index.is_some_and(|index| interface.commands.contains(&index)));
    if gl_1_1 { null() } else { fake_get_proc_address(name) }
}

#[test]
fn test_wgl_style_source_needs_exports() {
    set_fake_driver(FakeDriver::new(c"4.6.0 Fake", 1));

    let mut api = Api::unloaded();
    unsafe { api.load_functions(fake_wgl_get_proc_address) };
    assert_eq!(api.state(), LoadState::Unloaded);
    assert_eq!(api.loaded_count(), 0);

    let get_proc_address = |name: &CStr| {
        crate::libgl::query_then_fallback(name, fake_wgl_get_proc_address, fake_get_proc_address)
    };
    unsafe { api.load_functions(get_proc_address) };
    assert_eq!(api.state(), LoadState::Loaded);
    assert_eq!(api.profile(), Some(Profile::Core));
    assert!(api.is_loaded("glGetString"));
    assert!(api.is_loaded("glDrawArrays"));
    assert!(api.is_loaded("glGenVertexArrays"));
    assert!(api.is_loaded("glDispatchCompute"));
    assert_eq!(unsafe { api.GetError() }, GL_INVALID_OPERATION);
}

#[test]
fn test_normalize_proc_address() {
    assert!(normalize_proc_address(null()).is_null());
    let ptr = fake_entry_point as *const c_void;
    assert_eq!(normalize_proc_address(ptr), ptr);
    if cfg!(windows) {
        assert!(normalize_proc_address(3 as *const c_void).is_null());
        assert!(normalize_proc_address(-1isize as *const c_void).is_null());
    }
}

#[cfg(feature = "extensions")]
#[test]
fn test_extensions_indexed() {
    set_fake_driver(FakeDriver {
        extensions: &[c"GL_ARB_compute_shader", c"GL_KHR_debug", c"GL_FAKE_unknown"],
        ..FakeDriver::new(c"3.3.0 (Core Profile) Fake", 1)
    });

    let mut api = Api::unloaded();
    unsafe {
        api.load_functions(fake_get_proc_address);
        api.load_extensions(fake_get_proc_address);
    }
    assert!(api.has_extension("GL_ARB_compute_shader"));
    assert!(api.has_extension("GL_FAKE_unknown"));
    assert!(!api.has_extension("GL_NV_path_rendering"));
    assert_eq!(api.extensions().len(), 3);

    assert!(api.is_loaded("glDispatchCompute"));
    assert!(api.is_loaded("glDebugMessageCallback"));
    // not advertised
    assert!(!api.is_loaded("glMatrixLoadfEXT"));
    assert!(!api.is_loaded("glDebugMessageCallbackARB"));
}

#[cfg(feature = "extensions")]
#[test]
fn test_extensions_legacy_string() {
    set_fake_driver(FakeDriver {
        legacy_extensions: c"GL_ARB_vertex_array_object  GL_EXT_framebuffer_object ",
        ..FakeDriver::new(c"2.1 Fake", 0)
    });

    let mut api = Api::unloaded();
    unsafe {
        api.load_functions(fake_get_proc_address);
        api.load_extensions(fake_get_proc_address);
    }
    assert_eq!(api.extensions().len(), 2);
    assert!(api.is_loaded("glGenVertexArrays"));
    assert!(api.is_loaded("glGenFramebuffersEXT"));
    assert!(!api.is_loaded("glDispatchCompute"));
}

#[cfg(feature = "extensions")]
#[test]
fn test_extensions_keep_core_slots() {
    set_fake_driver(FakeDriver::new(c"4.3.0 (Core Profile) Fake", 1));

    let mut api = Api::unloaded();
    unsafe {
        api.load_functions(fake_get_proc_address);
        api.load_extensions(fake_get_proc_address);
    }
    assert!(api.extensions().is_empty());
    // core in 4.3, also part of the not advertised GL_ARB_compute_shader.
    assert!(api.is_loaded("glDispatchCompute"));
}

#[cfg(feature = "extensions")]
#[test]
fn test_extensions_reload() {
    set_fake_driver(FakeDriver {
        extensions: &[c"GL_ARB_compute_shader"],
        ..FakeDriver::new(c"3.3.0 (Core Profile) Fake", 1)
    });

    let mut api = unsafe { Api::load_with(fake_get_proc_address) };
    assert!(api.is_loaded("glDispatchCompute"));
    let first = null_pattern(&api);

    unsafe { api.load_extensions(fake_get_proc_address) };
    assert_eq!(null_pattern(&api), first);

    set_fake_driver(FakeDriver::new(c"3.3.0 (Core Profile) Fake", 1));
    unsafe { api.load_extensions(fake_get_proc_address) };
    assert!(!api.is_loaded("glDispatchCompute"));
    assert!(api.is_loaded("glGenVertexArrays"));
}

#[cfg(feature = "extensions")]
#[test]
fn test_extensions_without_functions() {
    set_fake_driver(FakeDriver {
        extensions: &[c"GL_ARB_compute_shader"],
        ..FakeDriver::new(c"3.3.0 (Core Profile) Fake", 1)
    });

    let mut api = Api::unloaded();
    unsafe { api.load_extensions(fake_get_proc_address) };
    assert_eq!(api.state(), LoadState::Unloaded);
    assert!(api.has_extension("GL_ARB_compute_shader"));
    assert!(api.is_loaded("glDispatchCompute"));
    assert!(!api.is_loaded("glGetString"));
}

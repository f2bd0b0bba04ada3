use std::ffi::{CStr, c_void};
use std::mem::transmute_copy;
use std::ptr::NonNull;

use anyhow::bail;

#[cfg(unix)]
mod sys {
    use std::ffi::{CStr, c_void};

    use libc::{dlclose, dlerror, dlopen, dlsym};

    /// copies the pending dlerror message. the string is owned by libc, it must not be freed here.
    pub fn take_error() -> Option<String> {
        let err = unsafe { dlerror() };
        if err.is_null() {
            None
        } else {
            Some(unsafe { CStr::from_ptr(err) }.to_string_lossy().into_owned())
        }
    }

    pub fn open(filename: &CStr) -> *mut c_void {
        unsafe { dlopen(filename.as_ptr(), libc::RTLD_LAZY) }
    }

    pub fn symbol(handle: *mut c_void, name: &CStr) -> *mut c_void {
        unsafe { dlsym(handle, name.as_ptr()) }
    }

    pub fn close(handle: *mut c_void) {
        unsafe { dlclose(handle) };
    }
}

#[cfg(windows)]
mod sys {
    use std::ffi::{CStr, c_void};

    use windows_sys::Win32::Foundation::{FreeLibrary, GetLastError, SetLastError};
    use windows_sys::Win32::System::LibraryLoader::{GetProcAddress, LoadLibraryA};

    pub fn take_error() -> Option<String> {
        let code = unsafe { GetLastError() };
        unsafe { SetLastError(0) };
        (code != 0).then(|| format!("win32 error {code}"))
    }

    pub fn open(filename: &CStr) -> *mut c_void {
        unsafe { LoadLibraryA(filename.as_ptr().cast()) }
    }

    pub fn symbol(handle: *mut c_void, name: &CStr) -> *mut c_void {
        match unsafe { GetProcAddress(handle, name.as_ptr().cast()) } {
            Some(function) => function as *mut c_void,
            None => std::ptr::null_mut(),
        }
    }

    pub fn close(handle: *mut c_void) {
        unsafe { FreeLibrary(handle) };
    }
}

pub struct DynLib(NonNull<c_void>);

impl DynLib {
    pub fn open(filename: &CStr) -> anyhow::Result<Self> {
        _ = sys::take_error();
        match NonNull::new(sys::open(filename)) {
            Some(handle) => Ok(Self(handle)),
            None => match sys::take_error() {
                Some(err) => bail!("could not open {filename:?}: {err}"),
                None => bail!("could not open {filename:?}"),
            },
        }
    }

    /// opens the first library that can be opened, in order.
    pub fn open_any(filenames: &[&CStr]) -> anyhow::Result<Self> {
        let mut errors: Vec<String> = Vec::with_capacity(filenames.len());
        for filename in filenames {
            match Self::open(filename) {
                Ok(lib) => return Ok(lib),
                Err(err) => errors.push(err.to_string()),
            }
        }
        bail!("could not open any of {filenames:?}: {}", errors.join("; "))
    }

    /// returns null if the symbol is missing.
    pub fn lookup_ptr(&self, name: &CStr) -> *mut c_void {
        sys::symbol(self.0.as_ptr(), name)
    }

    /// `F` must be a pointer sized type, usually an `extern fn`.
    pub fn lookup<F: Sized + Copy>(&self, name: &CStr) -> anyhow::Result<F> {
        const { assert!(size_of::<F>() == size_of::<*mut c_void>()) };

        _ = sys::take_error();
        let addr = self.lookup_ptr(name);
        if addr.is_null() {
            match sys::take_error() {
                Some(err) => bail!("could not find {name:?}: {err}"),
                None => bail!("{name:?} resolved to null"),
            }
        }
        Ok(unsafe { transmute_copy(&addr) })
    }
}

impl Drop for DynLib {
    fn drop(&mut self) {
        sys::close(self.0.as_ptr());
    }
}

#[test]
fn test_open_missing() {
    let err = DynLib::open(c"libdoes-not-exist.so.42").err().unwrap();
    assert!(err.to_string().contains("libdoes-not-exist.so.42"));

    let err = DynLib::open_any(&[c"libdoes-not-exist.so.1", c"libdoes-not-exist.so.2"])
        .err()
        .unwrap();
    assert!(err.to_string().contains("libdoes-not-exist.so.2"));
}

// lookup is checked at compile time to only accept pointer sized `F`, any fn pointer will do.
#[cfg(target_os = "linux")]
#[test]
fn test_lookup_libc() {
    let lib = DynLib::open_any(&[c"libc.so.6", c"libc.so"]).unwrap();
    let strlen = lib
        .lookup::<unsafe extern "C" fn(*const std::ffi::c_char) -> usize>(c"strlen")
        .unwrap();
    assert_eq!(unsafe { strlen(c"gl".as_ptr()) }, 2);
    assert!(lib.lookup_ptr(c"definitely_not_a_libc_symbol").is_null());
    assert!(
        lib.lookup::<unsafe extern "C" fn()>(c"definitely_not_a_libc_symbol")
            .is_err()
    );
}

#[cfg(windows)]
#[test]
fn test_lookup_kernel32() {
    let lib = DynLib::open(c"kernel32.dll").unwrap();
    let get_tick_count = lib
        .lookup::<unsafe extern "system" fn() -> u32>(c"GetTickCount")
        .unwrap();
    _ = unsafe { get_tick_count() };
    assert!(lib.lookup_ptr(c"DefinitelyNotAKernel32Symbol").is_null());
}

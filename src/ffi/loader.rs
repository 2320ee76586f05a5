//! Runtime loading of the BASS library and its add-ons.
//!
//! Nothing links against bass at build time. Each library is opened by file
//! name and its exports are resolved into typed function pointers, so a
//! missing add-on only disables the facades that need it.
//!
//! Search order for a library:
//! 1. The configured directory (if any)
//! 2. The current directory
//! 3. The executable's directory and its parent (target/release/examples case)
//! 4. The platform default search (PATH / LD_LIBRARY_PATH / DYLD paths)

use std::ffi::c_void;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Platform file name for a library stem ("bass" -> "bass.dll" / "libbass.so").
pub fn file_name(stem: &str) -> String {
    if cfg!(windows) {
        format!("{}.dll", stem)
    } else if cfg!(target_os = "macos") {
        format!("lib{}.dylib", stem)
    } else {
        format!("lib{}.so", stem)
    }
}

/// Directories searched before falling back to the platform search.
fn candidate_dirs(configured: Option<&Path>) -> Vec<PathBuf> {
    let mut dirs = Vec::new();
    if let Some(dir) = configured {
        dirs.push(dir.to_path_buf());
    }
    dirs.push(PathBuf::from("."));
    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(dir) = exe_path.parent() {
            dirs.push(dir.to_path_buf());
            if let Some(parent) = dir.parent() {
                dirs.push(parent.to_path_buf());
            }
        }
    }
    dirs
}

/// An opened shared library. Never unloaded: native code may still hold
/// pointers into it after the owning engine is gone.
pub struct Library {
    handle: *mut c_void,
    name: String,
}

// Safety: the handle is only used for symbol lookup, which is thread-safe on
// every supported platform.
unsafe impl Send for Library {}
unsafe impl Sync for Library {}

impl Library {
    /// Open `stem` (e.g. "bass", "bassasio") using the search order above.
    pub fn open(stem: &str, configured_dir: Option<&Path>) -> Result<Self> {
        let name = file_name(stem);

        for dir in candidate_dirs(configured_dir) {
            let path = dir.join(&name);
            if !path.exists() {
                continue;
            }
            if let Some(handle) = platform::open(&path.to_string_lossy()) {
                log::debug!("loaded {} from {}", name, path.display());
                return Ok(Self { handle, name });
            }
        }

        match platform::open(&name) {
            Some(handle) => {
                log::debug!("loaded {} from the system search path", name);
                Ok(Self { handle, name })
            }
            None => Err(Error::Load {
                library: name,
                reason: platform::last_error(),
            }),
        }
    }

    /// Library file name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Resolve an exported function.
    ///
    /// # Safety
    /// `T` must be the `extern "system"` function pointer type matching the
    /// export's real signature.
    pub unsafe fn symbol<T: Copy>(&self, symbol: &str) -> Result<T> {
        debug_assert_eq!(std::mem::size_of::<T>(), std::mem::size_of::<*mut c_void>());

        let ptr = platform::symbol(self.handle, symbol);
        if ptr.is_null() {
            return Err(Error::Load {
                library: self.name.clone(),
                reason: format!("missing export {}", symbol),
            });
        }
        Ok(std::mem::transmute_copy::<*mut c_void, T>(&ptr))
    }
}

// ============================================================================
// Windows-specific loading
// ============================================================================

#[cfg(windows)]
mod platform {
    use std::ffi::{c_void, CString};

    use windows_sys::Win32::Foundation::GetLastError;
    use windows_sys::Win32::System::LibraryLoader::{GetProcAddress, LoadLibraryW};

    fn to_wide(s: &str) -> Vec<u16> {
        s.encode_utf16().chain(std::iter::once(0)).collect()
    }

    pub fn open(path: &str) -> Option<*mut c_void> {
        let wide_path = to_wide(path);
        let handle = unsafe { LoadLibraryW(wide_path.as_ptr()) };
        if handle.is_null() {
            None
        } else {
            Some(handle as *mut c_void)
        }
    }

    pub fn symbol(handle: *mut c_void, name: &str) -> *mut c_void {
        let c_name = match CString::new(name) {
            Ok(s) => s,
            Err(_) => return std::ptr::null_mut(),
        };
        match unsafe { GetProcAddress(handle as _, c_name.as_ptr() as *const u8) } {
            Some(func) => func as *mut c_void,
            None => std::ptr::null_mut(),
        }
    }

    pub fn last_error() -> String {
        format!("LoadLibraryW failed (error {})", unsafe { GetLastError() })
    }
}

// ============================================================================
// Unix-specific loading (Linux/macOS)
// ============================================================================

#[cfg(unix)]
mod platform {
    use std::ffi::{c_void, CStr, CString};

    pub fn open(path: &str) -> Option<*mut c_void> {
        let c_path = CString::new(path).ok()?;
        let handle = unsafe { libc::dlopen(c_path.as_ptr(), libc::RTLD_NOW | libc::RTLD_LOCAL) };
        if handle.is_null() {
            None
        } else {
            Some(handle)
        }
    }

    pub fn symbol(handle: *mut c_void, name: &str) -> *mut c_void {
        match CString::new(name) {
            Ok(c_name) => unsafe { libc::dlsym(handle, c_name.as_ptr()) },
            Err(_) => std::ptr::null_mut(),
        }
    }

    pub fn last_error() -> String {
        let err = unsafe { libc::dlerror() };
        if err.is_null() {
            "dlopen failed".to_string()
        } else {
            unsafe { CStr::from_ptr(err) }.to_string_lossy().into_owned()
        }
    }
}

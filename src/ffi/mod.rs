//! FFI module for BASS audio library bindings.
//! Contains type definitions and function pointer types for BASS and the
//! add-ons, plus the runtime library loader.

// Allow unused code in FFI modules - types kept for API completeness
#![allow(dead_code)]

pub mod addons;
pub mod bass;
pub mod loader;

pub use addons::*;
pub use bass::*;

use std::ffi::{c_char, CStr};

/// Copy a nullable C string owned by BASS into an owned String.
///
/// # Safety
/// `ptr` must be null or point to a NUL-terminated string.
pub(crate) unsafe fn owned_string(ptr: *const c_char) -> String {
    if ptr.is_null() {
        String::new()
    } else {
        CStr::from_ptr(ptr).to_string_lossy().into_owned()
    }
}

//! FFI bindings for the BASS add-ons this crate manages devices for:
//! BASSASIO, BASSWASAPI and BASSCD.
//! Layouts match bassasio.h, basswasapi.h and basscd.h.

use std::ffi::{c_char, c_void};

use super::bass::{BOOL, DWORD};

// =============================================================================
// BASSASIO
// =============================================================================

// BASS_ASIO_Init flags
pub const BASS_ASIO_THREAD: DWORD = 1;
pub const BASS_ASIO_JOINORDER: DWORD = 2;

/// Device info structure filled by BASS_ASIO_GetDeviceInfo
#[repr(C)]
pub struct BassAsioDeviceInfo {
    pub name: *const c_char,
    pub driver: *const c_char,
}

impl Default for BassAsioDeviceInfo {
    fn default() -> Self {
        Self {
            name: std::ptr::null(),
            driver: std::ptr::null(),
        }
    }
}

pub type AsioGetDeviceInfoFn =
    unsafe extern "system" fn(device: DWORD, info: *mut BassAsioDeviceInfo) -> BOOL;
pub type AsioInitFn = unsafe extern "system" fn(device: i32, flags: DWORD) -> BOOL;

// =============================================================================
// BASSWASAPI
// =============================================================================

// BASS_WASAPI_DEVICEINFO flags
pub const BASS_DEVICE_UNPLUGGED: DWORD = 32;
pub const BASS_DEVICE_DISABLED: DWORD = 64;

// BASS_WASAPI_Init flags
pub const BASS_WASAPI_EXCLUSIVE: DWORD = 1;
pub const BASS_WASAPI_AUTOFORMAT: DWORD = 2;
pub const BASS_WASAPI_BUFFER: DWORD = 4;
pub const BASS_WASAPI_EVENT: DWORD = 16;
pub const BASS_WASAPI_SAMPLES: DWORD = 32;
pub const BASS_WASAPI_DITHER: DWORD = 64;
pub const BASS_WASAPI_RAW: DWORD = 128;
pub const BASS_WASAPI_ASYNC: DWORD = 0x100;

// Device notifications delivered to WASAPINOTIFYPROC
pub const BASS_WASAPI_NOTIFY_ENABLED: DWORD = 0;
pub const BASS_WASAPI_NOTIFY_DISABLED: DWORD = 1;
pub const BASS_WASAPI_NOTIFY_DEFOUTPUT: DWORD = 2;
pub const BASS_WASAPI_NOTIFY_DEFINPUT: DWORD = 3;
pub const BASS_WASAPI_NOTIFY_FAIL: DWORD = 0x100;

/// WASAPIPROC_PUSH - the application feeds data with BASS_WASAPI_PutData
pub const WASAPIPROC_PUSH: *const c_void = std::ptr::null();

/// Device info structure filled by BASS_WASAPI_GetDeviceInfo
#[repr(C)]
pub struct BassWasapiDeviceInfo {
    pub name: *const c_char,
    pub id: *const c_char,
    pub device_type: DWORD,
    pub flags: DWORD,
    pub minperiod: f32,
    pub defperiod: f32,
    pub mixfreq: DWORD,
    pub mixchans: DWORD,
}

impl Default for BassWasapiDeviceInfo {
    fn default() -> Self {
        Self {
            name: std::ptr::null(),
            id: std::ptr::null(),
            device_type: 0,
            flags: 0,
            minperiod: 0.0,
            defperiod: 0.0,
            mixfreq: 0,
            mixchans: 0,
        }
    }
}

/// Device notification callback
pub type WasapiNotifyProc = unsafe extern "system" fn(notify: DWORD, device: DWORD, user: *mut c_void);

pub type WasapiGetDeviceInfoFn =
    unsafe extern "system" fn(device: DWORD, info: *mut BassWasapiDeviceInfo) -> BOOL;
pub type WasapiInitFn = unsafe extern "system" fn(
    device: i32,
    freq: DWORD,
    chans: DWORD,
    flags: DWORD,
    buffer: f32,
    period: f32,
    proc: *const c_void,
    user: *mut c_void,
) -> BOOL;
pub type WasapiSetNotifyFn =
    unsafe extern "system" fn(proc: Option<WasapiNotifyProc>, user: *mut c_void) -> BOOL;

// =============================================================================
// BASSCD
// =============================================================================

// BASS_CD_Door actions
pub const BASS_CD_DOOR_CLOSE: DWORD = 0;
pub const BASS_CD_DOOR_OPEN: DWORD = 1;
pub const BASS_CD_DOOR_LOCK: DWORD = 2;
pub const BASS_CD_DOOR_UNLOCK: DWORD = 3;

/// Drive info structure filled by BASS_CD_GetInfo
#[repr(C)]
pub struct BassCdInfo {
    pub vendor: *const c_char,
    pub product: *const c_char,
    pub rev: *const c_char,
    pub letter: i32,
    pub rwflags: DWORD,
    pub canopen: BOOL,
    pub canlock: BOOL,
    pub maxspeed: DWORD,
    pub cache: DWORD,
    pub cdtext: BOOL,
}

impl Default for BassCdInfo {
    fn default() -> Self {
        Self {
            vendor: std::ptr::null(),
            product: std::ptr::null(),
            rev: std::ptr::null(),
            letter: -1,
            rwflags: 0,
            canopen: 0,
            canlock: 0,
            maxspeed: 0,
            cache: 0,
            cdtext: 0,
        }
    }
}

pub type CdGetInfoFn = unsafe extern "system" fn(drive: DWORD, info: *mut BassCdInfo) -> BOOL;
pub type CdIsReadyFn = unsafe extern "system" fn(drive: DWORD) -> BOOL;
pub type CdDoorFn = unsafe extern "system" fn(drive: DWORD, action: DWORD) -> BOOL;
pub type CdGetTracksFn = unsafe extern "system" fn(drive: DWORD) -> DWORD;

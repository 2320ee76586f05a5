//! BASS audio library FFI type bindings.
//! These types match the definitions in bass.h from the BASS SDK.

use std::ffi::{c_char, c_void};

// Basic types matching BASS definitions
pub type DWORD = u32;
pub type QWORD = u64;
pub type BOOL = i32;

// Handle types
pub type HSTREAM = DWORD;
pub type HSYNC = DWORD;
pub type HDSP = DWORD;
pub type HCHANNEL = DWORD;

// Boolean constants
pub const TRUE: BOOL = 1;
pub const FALSE: BOOL = 0;

// BASS version (high word of BASS_GetVersion)
pub const BASSVERSION: DWORD = 0x204;

// Error codes
pub const BASS_OK: i32 = 0;
pub const BASS_ERROR_MEM: i32 = 1;
pub const BASS_ERROR_FILEOPEN: i32 = 2;
pub const BASS_ERROR_DRIVER: i32 = 3;
pub const BASS_ERROR_BUFLOST: i32 = 4;
pub const BASS_ERROR_HANDLE: i32 = 5;
pub const BASS_ERROR_FORMAT: i32 = 6;
pub const BASS_ERROR_POSITION: i32 = 7;
pub const BASS_ERROR_INIT: i32 = 8;
pub const BASS_ERROR_START: i32 = 9;
pub const BASS_ERROR_ALREADY: i32 = 14;
pub const BASS_ERROR_NOCHAN: i32 = 18;
pub const BASS_ERROR_ILLTYPE: i32 = 19;
pub const BASS_ERROR_ILLPARAM: i32 = 20;
pub const BASS_ERROR_DEVICE: i32 = 23;
pub const BASS_ERROR_NOPLAY: i32 = 24;
pub const BASS_ERROR_FREQ: i32 = 25;
pub const BASS_ERROR_NOTAVAIL: i32 = 37;
pub const BASS_ERROR_DECODE: i32 = 38;
pub const BASS_ERROR_TIMEOUT: i32 = 40;
pub const BASS_ERROR_FILEFORM: i32 = 41;
pub const BASS_ERROR_SPEAKER: i32 = 42;
pub const BASS_ERROR_VERSION: i32 = 43;
pub const BASS_ERROR_BUSY: i32 = 46;
pub const BASS_ERROR_DENIED: i32 = 49;
pub const BASS_ERROR_UNKNOWN: i32 = -1;

// Stream flags
pub const BASS_SAMPLE_8BITS: DWORD = 1;
pub const BASS_SAMPLE_MONO: DWORD = 2;
pub const BASS_SAMPLE_FLOAT: DWORD = 0x100;
pub const BASS_STREAM_DECODE: DWORD = 0x200000;
pub const BASS_STREAM_AUTOFREE: DWORD = 0x40000;

// STREAMPROC return flags
pub const BASS_STREAMPROC_END: DWORD = 0x80000000;

// Sync types
pub const BASS_SYNC_POS: DWORD = 0;
pub const BASS_SYNC_END: DWORD = 2;
pub const BASS_SYNC_META: DWORD = 4;
pub const BASS_SYNC_SLIDE: DWORD = 5;
pub const BASS_SYNC_STALL: DWORD = 6;
pub const BASS_SYNC_DOWNLOAD: DWORD = 7;
pub const BASS_SYNC_FREE: DWORD = 8;
pub const BASS_SYNC_SETPOS: DWORD = 11;
pub const BASS_SYNC_DEV_FAIL: DWORD = 14;
pub const BASS_SYNC_DEV_FORMAT: DWORD = 15;

// Sync flags (ORed with the sync type)
pub const BASS_SYNC_THREAD: DWORD = 0x20000000;
pub const BASS_SYNC_MIXTIME: DWORD = 0x40000000;
pub const BASS_SYNC_ONETIME: DWORD = 0x80000000;

// BASS_DEVICEINFO flags
pub const BASS_DEVICE_ENABLED: DWORD = 1;
pub const BASS_DEVICE_DEFAULT: DWORD = 2;
pub const BASS_DEVICE_INIT: DWORD = 4;
pub const BASS_DEVICE_LOOPBACK: DWORD = 8;
pub const BASS_DEVICE_INPUT: DWORD = 16;

// BASS_Init flags
pub const BASS_DEVICE_8BITS: DWORD = 1;
pub const BASS_DEVICE_MONO: DWORD = 2;
pub const BASS_DEVICE_3D: DWORD = 4;
pub const BASS_DEVICE_16BITS: DWORD = 8;
pub const BASS_DEVICE_LATENCY: DWORD = 0x100;
pub const BASS_DEVICE_SPEAKERS: DWORD = 0x800;
pub const BASS_DEVICE_NOSPEAKER: DWORD = 0x1000;
pub const BASS_DEVICE_FREQ: DWORD = 0x4000;
pub const BASS_DEVICE_STEREO: DWORD = 0x8000;

/// Device info structure filled by BASS_GetDeviceInfo / BASS_RecordGetDeviceInfo
#[repr(C)]
pub struct BassDeviceInfo {
    pub name: *const c_char,
    pub driver: *const c_char,
    pub flags: DWORD,
}

impl Default for BassDeviceInfo {
    fn default() -> Self {
        Self {
            name: std::ptr::null(),
            driver: std::ptr::null(),
            flags: 0,
        }
    }
}

/// Stream callback function type
/// Returns number of bytes written, optionally ORed with BASS_STREAMPROC_END
pub type StreamProc = unsafe extern "system" fn(
    handle: HSTREAM,
    buffer: *mut c_void,
    length: DWORD,
    user: *mut c_void,
) -> DWORD;

/// Sync callback function type
pub type SyncProc = unsafe extern "system" fn(
    handle: HSYNC,
    channel: DWORD,
    data: DWORD,
    user: *mut c_void,
);

/// DSP callback function type
pub type DspProc = unsafe extern "system" fn(
    handle: HDSP,
    channel: DWORD,
    buffer: *mut c_void,
    length: DWORD,
    user: *mut c_void,
);

// Function pointer types resolved from the bass library at runtime
pub type GetVersionFn = unsafe extern "system" fn() -> DWORD;
pub type ErrorGetCodeFn = unsafe extern "system" fn() -> i32;
pub type GetDeviceInfoFn = unsafe extern "system" fn(device: DWORD, info: *mut BassDeviceInfo) -> BOOL;
pub type InitFn = unsafe extern "system" fn(
    device: i32,
    freq: DWORD,
    flags: DWORD,
    win: *mut c_void,
    dsguid: *const c_void,
) -> BOOL;
pub type RecordInitFn = unsafe extern "system" fn(device: i32) -> BOOL;
pub type FreeFn = unsafe extern "system" fn() -> BOOL;
pub type GetDeviceFn = unsafe extern "system" fn() -> DWORD;
pub type SetDeviceFn = unsafe extern "system" fn(device: DWORD) -> BOOL;
pub type StreamCreateFn = unsafe extern "system" fn(
    freq: DWORD,
    chans: DWORD,
    flags: DWORD,
    proc: Option<StreamProc>,
    user: *mut c_void,
) -> HSTREAM;
pub type StreamFreeFn = unsafe extern "system" fn(handle: HSTREAM) -> BOOL;
pub type ChannelSetSyncFn = unsafe extern "system" fn(
    handle: DWORD,
    sync_type: DWORD,
    param: QWORD,
    proc: Option<SyncProc>,
    user: *mut c_void,
) -> HSYNC;
pub type ChannelRemoveSyncFn = unsafe extern "system" fn(handle: DWORD, sync: HSYNC) -> BOOL;
pub type ChannelSetDspFn = unsafe extern "system" fn(
    handle: DWORD,
    proc: Option<DspProc>,
    user: *mut c_void,
    priority: i32,
) -> HDSP;
pub type ChannelRemoveDspFn = unsafe extern "system" fn(handle: DWORD, dsp: HDSP) -> BOOL;

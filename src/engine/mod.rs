//! The native boundary.
//!
//! `NativeEngine` is the only path from the registries and facades into
//! native code. `BassEngine` implements it over the dynamically loaded BASS
//! libraries; tests implement it in memory.

mod bass;

pub use self::bass::BassEngine;

use std::ffi::c_void;
use std::fmt;

use crate::error::Result;
use crate::ffi::*;

/// Enumerable device families with an init/free lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeviceKind {
    Playback,
    Recording,
    Asio,
    Wasapi,
}

impl DeviceKind {
    /// Human readable name used in error messages.
    pub const fn name(&self) -> &'static str {
        match self {
            DeviceKind::Playback => "playback device",
            DeviceKind::Recording => "recording device",
            DeviceKind::Asio => "ASIO device",
            DeviceKind::Wasapi => "WASAPI device",
        }
    }
}

impl fmt::Display for DeviceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Snapshot of a device's native info structure.
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceInfo {
    pub name: String,
    /// Driver file name (BASS/ASIO) or endpoint id (WASAPI)
    pub driver: String,
    /// BASS_DEVICE_* flags
    pub flags: DWORD,
    /// Shared-mode mix rate (WASAPI only, 0 otherwise)
    pub mix_freq: DWORD,
    /// Shared-mode channel count (WASAPI only, 0 otherwise)
    pub mix_chans: DWORD,
}

impl DeviceInfo {
    pub fn new(name: impl Into<String>, driver: impl Into<String>, flags: DWORD) -> Self {
        Self {
            name: name.into(),
            driver: driver.into(),
            flags,
            mix_freq: 0,
            mix_chans: 0,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.flags & BASS_DEVICE_ENABLED != 0
    }

    pub fn is_default(&self) -> bool {
        self.flags & BASS_DEVICE_DEFAULT != 0
    }

    pub fn is_initialized(&self) -> bool {
        self.flags & BASS_DEVICE_INIT != 0
    }

    pub fn is_loopback(&self) -> bool {
        self.flags & BASS_DEVICE_LOOPBACK != 0
    }

    pub fn is_input(&self) -> bool {
        self.flags & BASS_DEVICE_INPUT != 0
    }

    pub fn is_unplugged(&self) -> bool {
        self.flags & BASS_DEVICE_UNPLUGGED != 0
    }
}

/// Arguments for the family-specific init call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InitParams {
    /// BASS_Init
    Playback { freq: DWORD, flags: DWORD },
    /// BASS_RecordInit
    Recording,
    /// BASS_ASIO_Init
    Asio { flags: DWORD },
    /// BASS_WASAPI_Init in push mode
    Wasapi {
        freq: DWORD,
        chans: DWORD,
        flags: DWORD,
        buffer: f32,
        period: f32,
    },
}

impl InitParams {
    pub fn kind(&self) -> DeviceKind {
        match self {
            InitParams::Playback { .. } => DeviceKind::Playback,
            InitParams::Recording => DeviceKind::Recording,
            InitParams::Asio { .. } => DeviceKind::Asio,
            InitParams::Wasapi { .. } => DeviceKind::Wasapi,
        }
    }
}

/// Snapshot of BASS_CD_INFO.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DriveInfo {
    pub vendor: String,
    pub product: String,
    pub revision: String,
    /// Drive letter on Windows
    pub letter: Option<char>,
    pub can_open: bool,
    pub can_lock: bool,
    /// Maximum read speed in KB/s
    pub max_speed: DWORD,
    /// Cache size in KB
    pub cache: DWORD,
    pub cd_text: bool,
}

impl DriveInfo {
    pub fn new(vendor: impl Into<String>, product: impl Into<String>) -> Self {
        Self {
            vendor: vendor.into(),
            product: product.into(),
            revision: String::new(),
            letter: None,
            can_open: true,
            can_lock: true,
            max_speed: 0,
            cache: 0,
            cd_text: false,
        }
    }
}

/// BASS_CD_Door actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DoorAction {
    Close,
    Open,
    Lock,
    Unlock,
}

impl DoorAction {
    pub fn native(&self) -> DWORD {
        match self {
            DoorAction::Close => BASS_CD_DOOR_CLOSE,
            DoorAction::Open => BASS_CD_DOOR_OPEN,
            DoorAction::Lock => BASS_CD_DOOR_LOCK,
            DoorAction::Unlock => BASS_CD_DOOR_UNLOCK,
        }
    }
}

/// Calls the registries and facades make into the audio engine.
///
/// Failed calls return `Error::Native` with the engine's error code.
/// Implementations must be callable from any thread, including the engine's
/// own callback threads.
pub trait NativeEngine: Send + Sync {
    // ---- channel callbacks -------------------------------------------------

    /// BASS_ChannelSetSync.
    ///
    /// # Safety
    /// `user` is handed to `proc` on the engine's threads and must stay valid
    /// until the sync is removed or the channel is freed.
    unsafe fn channel_set_sync(
        &self,
        channel: DWORD,
        sync_type: DWORD,
        param: QWORD,
        proc: SyncProc,
        user: *mut c_void,
    ) -> Result<HSYNC>;

    /// BASS_ChannelRemoveSync.
    fn channel_remove_sync(&self, channel: DWORD, sync: HSYNC) -> Result<()>;

    /// BASS_ChannelSetDSP.
    ///
    /// # Safety
    /// Same contract as `channel_set_sync`.
    unsafe fn channel_set_dsp(
        &self,
        channel: DWORD,
        proc: DspProc,
        user: *mut c_void,
        priority: i32,
    ) -> Result<HDSP>;

    /// BASS_ChannelRemoveDSP.
    fn channel_remove_dsp(&self, channel: DWORD, dsp: HDSP) -> Result<()>;

    /// BASS_StreamCreate with a user STREAMPROC.
    ///
    /// # Safety
    /// `user` must stay valid until the stream is freed.
    unsafe fn stream_create(
        &self,
        freq: DWORD,
        chans: DWORD,
        flags: DWORD,
        proc: StreamProc,
        user: *mut c_void,
    ) -> Result<HSTREAM>;

    /// BASS_StreamFree.
    fn stream_free(&self, handle: HSTREAM) -> Result<()>;

    // ---- devices -----------------------------------------------------------

    /// Info for device `index`; `None` once `index` is past the last device.
    fn device_info(&self, kind: DeviceKind, index: u32) -> Result<Option<DeviceInfo>>;

    /// Initialize device `index` of `params.kind()`.
    fn device_init(&self, index: u32, params: &InitParams) -> Result<()>;

    /// Make `index` the calling thread's current device and free it.
    fn device_free(&self, kind: DeviceKind, index: u32) -> Result<()>;

    /// The calling thread's current device, `None` when nothing is initialized.
    fn current_device(&self, kind: DeviceKind) -> Result<Option<u32>>;

    /// BASS_WASAPI_SetNotify; `None` removes the notification callback.
    ///
    /// # Safety
    /// `user` must stay valid until the callback is replaced or removed.
    unsafe fn wasapi_set_notify(&self, notify: Option<(WasapiNotifyProc, *mut c_void)>) -> Result<()>;

    // ---- CD drives ---------------------------------------------------------

    /// Info for drive `drive`; `None` once `drive` is past the last drive.
    fn cd_info(&self, drive: u32) -> Result<Option<DriveInfo>>;

    fn cd_is_ready(&self, drive: u32) -> Result<bool>;

    fn cd_door(&self, drive: u32, action: DoorAction) -> Result<()>;

    fn cd_track_count(&self, drive: u32) -> Result<u32>;
}

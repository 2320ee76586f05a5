//! Output devices (BASS_Init / BASS_Free).

use crate::engine::{DeviceKind, InitParams};
use crate::error::Result;
use crate::ffi::DWORD;

use super::device::DeviceCore;

/// One BASS output device. Index 0 is the "no sound" device.
pub struct PlaybackDevice {
    core: DeviceCore,
}

impl PlaybackDevice {
    /// Initialize for output; `flags` are BASS_DEVICE_* init flags.
    pub fn init(&self, freq: DWORD, flags: DWORD) -> Result<()> {
        self.core.init(InitParams::Playback { freq, flags })
    }
}

device_facade!(PlaybackDevice, DeviceKind::Playback);

//! ASIO drivers (BASS_ASIO_Init / BASS_ASIO_Free).

use crate::engine::{DeviceKind, InitParams};
use crate::error::Result;
use crate::ffi::DWORD;

use super::device::DeviceCore;

pub struct AsioDevice {
    core: DeviceCore,
}

impl AsioDevice {
    /// `flags` are BASS_ASIO_THREAD / BASS_ASIO_JOINORDER.
    pub fn init(&self, flags: DWORD) -> Result<()> {
        self.core.init(InitParams::Asio { flags })
    }
}

device_facade!(AsioDevice, DeviceKind::Asio);

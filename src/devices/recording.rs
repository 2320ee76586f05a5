//! Input devices (BASS_RecordInit / BASS_RecordFree).

use crate::engine::{DeviceKind, InitParams};
use crate::error::Result;

use super::device::DeviceCore;

pub struct RecordingDevice {
    core: DeviceCore,
}

impl RecordingDevice {
    pub fn init(&self) -> Result<()> {
        self.core.init(InitParams::Recording)
    }
}

device_facade!(RecordingDevice, DeviceKind::Recording);

//! CD drives (BASSCD).

use std::fmt;
use std::sync::Arc;

use crate::engine::{DoorAction, DriveInfo, NativeEngine};
use crate::error::{Error, Result};

use super::Facade;

/// One optical drive. Drives need no init; every call goes to the engine.
pub struct CdDrive {
    index: u32,
    engine: Arc<dyn NativeEngine>,
}

impl CdDrive {
    pub fn index(&self) -> u32 {
        self.index
    }

    pub fn info(&self) -> Result<DriveInfo> {
        self.engine.cd_info(self.index)?.ok_or(Error::NotFound {
            kind: Self::KIND,
            index: self.index,
        })
    }

    /// Whether a disc is in the drive and readable.
    pub fn is_ready(&self) -> Result<bool> {
        self.engine.cd_is_ready(self.index)
    }

    pub fn track_count(&self) -> Result<u32> {
        self.engine.cd_track_count(self.index)
    }

    pub fn open_door(&self) -> Result<()> {
        self.door(DoorAction::Open)
    }

    pub fn close_door(&self) -> Result<()> {
        self.door(DoorAction::Close)
    }

    /// Lock or unlock the door.
    pub fn lock_door(&self, locked: bool) -> Result<()> {
        self.door(if locked { DoorAction::Lock } else { DoorAction::Unlock })
    }

    fn door(&self, action: DoorAction) -> Result<()> {
        self.engine.cd_door(self.index, action)
    }
}

impl Facade for CdDrive {
    type Info = DriveInfo;

    const KIND: &'static str = "CD drive";

    fn query(engine: &dyn NativeEngine, index: u32) -> Result<Option<DriveInfo>> {
        engine.cd_info(index)
    }

    fn create(engine: Arc<dyn NativeEngine>, index: u32) -> Self {
        Self { index, engine }
    }
}

impl fmt::Debug for CdDrive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CdDrive").field("index", &self.index).finish()
    }
}

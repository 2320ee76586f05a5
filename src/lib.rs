//! Lifetime and identity registries for BASS bindings.
//!
//! - `CallbackRegistry` keeps callbacks handed to native code alive until the
//!   engine reports that their handle was freed.
//! - `HandleRegistry` hands out one facade object per device or drive index.
//!
//! Both are plain service objects built over a `NativeEngine`. `Bass` bundles
//! one of each for a dynamically loaded BASS installation:
//!
//! ```no_run
//! use bass_handles::{Bass, EngineConfig, StreamData};
//!
//! let bass = Bass::load(&EngineConfig::from_env())?;
//! if let Some(speakers) = bass.playback_devices().default_device() {
//!     speakers.init(48000, 0)?;
//! }
//! let stream = bass.channels().create_stream(48000, 2, 0, |buf| {
//!     buf.fill(0);
//!     StreamData::Written(buf.len())
//! })?;
//! bass.channels().free_stream(stream)?;
//! # Ok::<(), bass_handles::Error>(())
//! ```

pub mod callbacks;
pub mod config;
pub mod devices;
pub mod engine;
pub mod error;
pub mod ffi;

#[cfg(test)]
mod mock;

pub use callbacks::{
    CallbackKey, CallbackKind, CallbackRegistry, ChannelCallback, ChannelCallbacks, FreeHandlerId, StreamData,
    SyncEvent, SyncType, WeakRegistry,
};
pub use config::EngineConfig;
pub use devices::{
    AsioDevice, CdDrive, DeviceEvent, DeviceState, Facade, HandleRegistry, PlaybackDevice, RecordingDevice,
    SubscriptionId, WasapiDevice, WasapiNotifier,
};
pub use engine::{BassEngine, DeviceInfo, DeviceKind, DriveInfo, NativeEngine};
pub use error::{BassError, Error, Result};

use std::sync::Arc;

/// One engine with its channel callbacks and a registry per device family.
pub struct Bass {
    channels: ChannelCallbacks,
    playback: Arc<HandleRegistry<PlaybackDevice>>,
    recording: Arc<HandleRegistry<RecordingDevice>>,
    asio: Arc<HandleRegistry<AsioDevice>>,
    wasapi: Arc<HandleRegistry<WasapiDevice>>,
    cd: Arc<HandleRegistry<CdDrive>>,
    engine: Arc<dyn NativeEngine>,
}

impl Bass {
    /// Load BASS and the configured add-ons.
    pub fn load(config: &EngineConfig) -> Result<Self> {
        let engine = BassEngine::load(config)?;
        Ok(Self::with_engine(Arc::new(engine)))
    }

    pub fn with_engine(engine: Arc<dyn NativeEngine>) -> Self {
        Self {
            channels: ChannelCallbacks::new(engine.clone()),
            playback: Arc::new(HandleRegistry::new(engine.clone())),
            recording: Arc::new(HandleRegistry::new(engine.clone())),
            asio: Arc::new(HandleRegistry::new(engine.clone())),
            wasapi: Arc::new(HandleRegistry::new(engine.clone())),
            cd: Arc::new(HandleRegistry::new(engine.clone())),
            engine,
        }
    }

    pub fn engine(&self) -> &Arc<dyn NativeEngine> {
        &self.engine
    }

    pub fn channels(&self) -> &ChannelCallbacks {
        &self.channels
    }

    pub fn playback_devices(&self) -> &Arc<HandleRegistry<PlaybackDevice>> {
        &self.playback
    }

    pub fn recording_devices(&self) -> &Arc<HandleRegistry<RecordingDevice>> {
        &self.recording
    }

    pub fn asio_devices(&self) -> &Arc<HandleRegistry<AsioDevice>> {
        &self.asio
    }

    pub fn wasapi_devices(&self) -> &Arc<HandleRegistry<WasapiDevice>> {
        &self.wasapi
    }

    pub fn cd_drives(&self) -> &Arc<HandleRegistry<CdDrive>> {
        &self.cd
    }

    /// Deliver WASAPI notifications to `wasapi_devices()` facades until the
    /// returned notifier is dropped.
    pub fn watch_wasapi(&self) -> Result<WasapiNotifier> {
        WasapiNotifier::install(&self.wasapi)
    }
}

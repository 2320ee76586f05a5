//! Identity-stable facades over enumerable native resources.
//!
//! `HandleRegistry<F>` hands out exactly one `Arc<F>` per native index, so two
//! lookups of device 1 give the same object and its event subscriptions and
//! lifecycle state are never split between copies.
//!
//! Indexes are the engine's: after a hot-plug the engine may renumber its
//! devices and a facade may then refer to a different physical device.

#[macro_use]
mod device;

pub mod asio;
pub mod cd;
pub mod events;
pub mod playback;
pub mod recording;
pub mod wasapi;

pub use asio::AsioDevice;
pub use cd::CdDrive;
pub use device::DeviceState;
pub use events::{DeviceEvent, EventHandlers, SubscriptionId};
pub use playback::PlaybackDevice;
pub use recording::RecordingDevice;
pub use wasapi::{WasapiDevice, WasapiNotifier};

use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::engine::NativeEngine;
use crate::error::{Error, Result};

/// A facade type managed by `HandleRegistry`.
pub trait Facade: Send + Sync + Sized + 'static {
    /// Queried info snapshot
    type Info: Clone + Send;

    /// Resource name used in `Error::NotFound`
    const KIND: &'static str;

    /// Info for `index`, `None` if the engine knows no such index.
    fn query(engine: &dyn NativeEngine, index: u32) -> Result<Option<Self::Info>>;

    fn create(engine: Arc<dyn NativeEngine>, index: u32) -> Self;

    fn is_default(_info: &Self::Info) -> bool {
        false
    }

    /// The calling thread's current index, if the family has one.
    fn current(_engine: &dyn NativeEngine) -> Result<Option<u32>> {
        Ok(None)
    }
}

/// One facade per native index, created on first lookup.
pub struct HandleRegistry<F> {
    engine: Arc<dyn NativeEngine>,
    facades: Mutex<HashMap<u32, Arc<F>>>,
    /// Values native code may still read; freed with the registry
    retained: Mutex<Vec<Box<dyn Any + Send + Sync>>>,
}

impl<F: Facade> HandleRegistry<F> {
    pub fn new(engine: Arc<dyn NativeEngine>) -> Self {
        Self {
            engine,
            facades: Mutex::new(HashMap::new()),
            retained: Mutex::new(Vec::new()),
        }
    }

    pub fn engine(&self) -> &Arc<dyn NativeEngine> {
        &self.engine
    }

    /// Cached facade for `index`; never queries the engine.
    pub fn get(&self, index: u32) -> Option<Arc<F>> {
        self.facades.lock().get(&index).cloned()
    }

    /// The facade for `index`, created after the engine confirms the index
    /// exists. Disabled resources exist.
    pub fn get_or_create(&self, index: u32) -> Result<Arc<F>> {
        if let Some(facade) = self.get(index) {
            return Ok(facade);
        }
        match F::query(self.engine.as_ref(), index)? {
            Some(_) => Ok(self.intern(index)),
            None => Err(Error::NotFound { kind: F::KIND, index }),
        }
    }

    fn intern(&self, index: u32) -> Arc<F> {
        let mut facades = self.facades.lock();
        facades
            .entry(index)
            .or_insert_with(|| Arc::new(F::create(self.engine.clone(), index)))
            .clone()
    }

    pub(crate) fn retain(&self, value: Box<dyn Any + Send + Sync>) {
        self.retained.lock().push(value);
    }

    #[cfg(test)]
    pub(crate) fn retained_len(&self) -> usize {
        self.retained.lock().len()
    }

    /// Walk indexes 0, 1, 2, ... until the engine reports no more entries.
    /// Each call starts over from 0.
    pub fn enumerate(&self) -> Entries<'_, F> {
        Entries {
            registry: self,
            next: Some(0),
        }
    }

    /// Facades of every index currently enumerated by the engine.
    pub fn iter(&self) -> impl Iterator<Item = Arc<F>> + '_ {
        self.enumerate().map(|(facade, _)| facade)
    }

    /// Number of resources the engine enumerates now.
    pub fn count(&self) -> usize {
        self.enumerate().count()
    }

    /// Number of facades created so far.
    pub fn len(&self) -> usize {
        self.facades.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The first enumerated resource flagged as default.
    pub fn default_device(&self) -> Option<Arc<F>> {
        self.enumerate()
            .find(|(_, info)| F::is_default(info))
            .map(|(facade, _)| facade)
    }

    /// The calling thread's current resource.
    pub fn current(&self) -> Result<Option<Arc<F>>> {
        match F::current(self.engine.as_ref())? {
            Some(index) => self.get_or_create(index).map(Some),
            None => Ok(None),
        }
    }
}

/// Lazy enumeration of a `HandleRegistry`, yielding each facade with the
/// info that was just queried for it.
pub struct Entries<'a, F> {
    registry: &'a HandleRegistry<F>,
    next: Option<u32>,
}

impl<F: Facade> Iterator for Entries<'_, F> {
    type Item = (Arc<F>, F::Info);

    fn next(&mut self) -> Option<Self::Item> {
        let index = self.next?;
        match F::query(self.registry.engine.as_ref(), index) {
            Ok(Some(info)) => {
                self.next = index.checked_add(1);
                Some((self.registry.intern(index), info))
            }
            Ok(None) => {
                self.next = None;
                None
            }
            Err(e) => {
                log::warn!("{} enumeration stopped at {}: {}", F::KIND, index, e);
                self.next = None;
                None
            }
        }
    }
}

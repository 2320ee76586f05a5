//! Lifecycle shared by the device facades.

use std::sync::Arc;

use parking_lot::Mutex;

use super::events::{DeviceEvent, EventHandlers, SubscriptionId};
use crate::engine::{DeviceInfo, DeviceKind, InitParams, NativeEngine};
use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceState {
    Uninitialized,
    Initialized,
}

/// Index, lifecycle lock and event list of one device.
pub(crate) struct DeviceCore {
    kind: DeviceKind,
    index: u32,
    engine: Arc<dyn NativeEngine>,
    state: Mutex<DeviceState>,
    events: EventHandlers<DeviceEvent>,
}

impl DeviceCore {
    pub fn new(kind: DeviceKind, index: u32, engine: Arc<dyn NativeEngine>) -> Self {
        Self {
            kind,
            index,
            engine,
            state: Mutex::new(DeviceState::Uninitialized),
            events: EventHandlers::new(),
        }
    }

    pub fn index(&self) -> u32 {
        self.index
    }

    /// Fresh info; `NotFound` if the index vanished since the facade was made.
    pub fn info(&self) -> Result<DeviceInfo> {
        self.engine
            .device_info(self.kind, self.index)?
            .ok_or(Error::NotFound {
                kind: self.kind.name(),
                index: self.index,
            })
    }

    pub fn state(&self) -> DeviceState {
        *self.state.lock()
    }

    pub fn init(&self, params: InitParams) -> Result<()> {
        debug_assert_eq!(params.kind(), self.kind);
        {
            // Held across the native call: init and free of one device are serialized
            let mut state = self.state.lock();
            self.engine.device_init(self.index, &params)?;
            *state = DeviceState::Initialized;
        }
        log::debug!("{} {} initialized", self.kind, self.index);
        self.events.emit(&DeviceEvent::Initialized);
        Ok(())
    }

    pub fn free(&self) -> Result<()> {
        {
            let mut state = self.state.lock();
            self.engine.device_free(self.kind, self.index)?;
            *state = DeviceState::Uninitialized;
        }
        log::debug!("{} {} freed", self.kind, self.index);
        self.events.emit(&DeviceEvent::Freed);
        Ok(())
    }

    pub fn subscribe<F>(&self, handler: F) -> SubscriptionId
    where
        F: Fn(&DeviceEvent) + Send + Sync + 'static,
    {
        self.events.subscribe(handler)
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.events.unsubscribe(id)
    }

    pub fn emit(&self, event: DeviceEvent) {
        self.events.emit(&event);
    }
}

/// Common methods and the `Facade` impl of a device facade holding a
/// `core: DeviceCore` field.
macro_rules! device_facade {
    ($facade:ident, $kind:expr) => {
        impl $facade {
            pub fn index(&self) -> u32 {
                self.core.index()
            }

            pub fn info(&self) -> $crate::error::Result<$crate::engine::DeviceInfo> {
                self.core.info()
            }

            pub fn state(&self) -> $crate::devices::DeviceState {
                self.core.state()
            }

            pub fn is_initialized(&self) -> bool {
                self.core.state() == $crate::devices::DeviceState::Initialized
            }

            pub fn free(&self) -> $crate::error::Result<()> {
                self.core.free()
            }

            pub fn subscribe<H>(&self, handler: H) -> $crate::devices::SubscriptionId
            where
                H: Fn(&$crate::devices::DeviceEvent) + Send + Sync + 'static,
            {
                self.core.subscribe(handler)
            }

            pub fn unsubscribe(&self, id: $crate::devices::SubscriptionId) -> bool {
                self.core.unsubscribe(id)
            }
        }

        impl $crate::devices::Facade for $facade {
            type Info = $crate::engine::DeviceInfo;

            const KIND: &'static str = $kind.name();

            fn query(
                engine: &dyn $crate::engine::NativeEngine,
                index: u32,
            ) -> $crate::error::Result<Option<Self::Info>> {
                engine.device_info($kind, index)
            }

            fn create(engine: ::std::sync::Arc<dyn $crate::engine::NativeEngine>, index: u32) -> Self {
                Self {
                    core: $crate::devices::device::DeviceCore::new($kind, index, engine),
                }
            }

            fn is_default(info: &Self::Info) -> bool {
                info.is_default()
            }

            fn current(engine: &dyn $crate::engine::NativeEngine) -> $crate::error::Result<Option<u32>> {
                engine.current_device($kind)
            }
        }

        impl ::std::fmt::Debug for $facade {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                f.debug_struct(stringify!($facade))
                    .field("index", &self.core.index())
                    .field("state", &self.core.state())
                    .finish()
            }
        }
    };
}

//! WASAPI endpoints and hot-plug notifications.

use std::ffi::c_void;
use std::sync::{Arc, Weak};

use crate::engine::{DeviceKind, InitParams, NativeEngine};
use crate::error::Result;
use crate::ffi::*;

use super::device::DeviceCore;
use super::events::DeviceEvent;
use super::HandleRegistry;

/// One WASAPI endpoint. Output endpoints are listed along with a loopback
/// input twin.
pub struct WasapiDevice {
    core: DeviceCore,
}

impl WasapiDevice {
    /// Initialize in push mode. `buffer` and `period` are in seconds, 0 for
    /// the endpoint defaults.
    pub fn init(&self, freq: DWORD, chans: DWORD, flags: DWORD, buffer: f32, period: f32) -> Result<()> {
        self.core.init(InitParams::Wasapi {
            freq,
            chans,
            flags,
            buffer,
            period,
        })
    }

    pub fn is_loopback(&self) -> Result<bool> {
        Ok(self.info()?.is_loopback())
    }

    pub fn is_input(&self) -> Result<bool> {
        Ok(self.info()?.is_input())
    }
}

device_facade!(WasapiDevice, DeviceKind::Wasapi);

fn event_of(notify: DWORD) -> Option<DeviceEvent> {
    match notify {
        BASS_WASAPI_NOTIFY_ENABLED => Some(DeviceEvent::Enabled),
        BASS_WASAPI_NOTIFY_DISABLED => Some(DeviceEvent::Disabled),
        BASS_WASAPI_NOTIFY_DEFOUTPUT | BASS_WASAPI_NOTIFY_DEFINPUT => Some(DeviceEvent::DefaultChanged),
        BASS_WASAPI_NOTIFY_FAIL => Some(DeviceEvent::Failed),
        _ => None,
    }
}

type NotifyTarget = Weak<HandleRegistry<WasapiDevice>>;

unsafe extern "system" fn notify_proc(notify: DWORD, device: DWORD, user: *mut c_void) {
    let target = &*(user as *const NotifyTarget);
    let (Some(registry), Some(event)) = (target.upgrade(), event_of(notify)) else {
        return;
    };
    // Only facades somebody already holds can have subscribers
    match registry.get(device) {
        Some(facade) => facade.core.emit(event),
        None => log::trace!("WASAPI notification {:#x} for untracked device {}", notify, device),
    }
}

/// Routes WASAPI device notifications to the facades of a registry while
/// alive, and keeps that registry alive. The engine has a single
/// notification slot, so only one notifier should exist at a time.
pub struct WasapiNotifier {
    registry: Arc<HandleRegistry<WasapiDevice>>,
    target: *mut NotifyTarget,
}

// The target is only read, and only through the Weak inside it
unsafe impl Send for WasapiNotifier {}
unsafe impl Sync for WasapiNotifier {}

impl WasapiNotifier {
    pub fn install(registry: &Arc<HandleRegistry<WasapiDevice>>) -> Result<Self> {
        let target = Box::into_raw(Box::new(Arc::downgrade(registry)));

        let installed = unsafe {
            registry
                .engine()
                .wasapi_set_notify(Some((notify_proc, target as *mut c_void)))
        };
        if let Err(e) = installed {
            drop(unsafe { Box::from_raw(target) });
            return Err(e);
        }
        log::debug!("WASAPI notifications installed");
        Ok(Self {
            registry: registry.clone(),
            target,
        })
    }
}

impl Drop for WasapiNotifier {
    fn drop(&mut self) {
        match unsafe { self.registry.engine().wasapi_set_notify(None) } {
            // A notification already in flight may still read the target,
            // so it lives on with the registry
            Ok(()) => self.registry.retain(unsafe { Box::from_raw(self.target) }),
            // Still reachable from native code, so it has to leak
            Err(e) => log::warn!("failed to remove WASAPI notifications: {}", e),
        }
    }
}

//! Closure-based channel callbacks on top of `CallbackRegistry`.
//!
//! Each closure is boxed into an `Arc<ChannelCallback>`; the `Arc`'s pointer
//! is the `user` value handed to the engine and the registry keeps the `Arc`
//! until the channel is freed or the callback is removed.

use std::ffi::c_void;
use std::slice;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use super::{CallbackKey, CallbackKind, CallbackRegistry, WeakRegistry};
use crate::engine::NativeEngine;
use crate::error::{BassError, Error, Result};
use crate::ffi::*;

const SYNC_FLAGS: DWORD = BASS_SYNC_MIXTIME | BASS_SYNC_ONETIME | BASS_SYNC_THREAD;

type SyncFn = Box<dyn FnMut(SyncEvent) + Send>;
type FreeFn = Box<dyn FnOnce(DWORD) + Send>;
type DspFn = Box<dyn FnMut(DWORD, &mut [u8]) + Send>;
type StreamFn = Box<dyn FnMut(&mut [u8]) -> StreamData + Send>;

/// A closure the engine may invoke. Closures must not trigger themselves
/// synchronously (e.g. a SETPOS sync that seeks its own channel).
pub enum ChannelCallback {
    Sync(Mutex<SyncFn>),
    /// A `BASS_SYNC_ONETIME` sync; it leaves the registry once it has fired
    OneTimeSync {
        f: Mutex<SyncFn>,
        registry: WeakRegistry<ChannelCallback>,
        fired: AtomicBool,
    },
    /// Run by the registry when the channel is freed
    Free(Mutex<Option<FreeFn>>),
    Dsp(Mutex<DspFn>),
    Stream(Mutex<StreamFn>),
}

/// Arguments of a SYNCPROC invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncEvent {
    pub sync: HSYNC,
    pub channel: DWORD,
    /// Type-specific data (e.g. the new position for SETPOS)
    pub data: DWORD,
}

/// Result of filling a user stream buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamData {
    /// This many bytes were written
    Written(usize),
    /// This many bytes were written and the stream has ended
    End(usize),
}

impl StreamData {
    fn native(self, capacity: usize) -> DWORD {
        match self {
            StreamData::Written(n) => n.min(capacity) as DWORD,
            StreamData::End(n) => n.min(capacity) as DWORD | BASS_STREAMPROC_END,
        }
    }
}

/// Sync event families accepted by `ChannelCallbacks::set_sync`. Free
/// notifications go through `ChannelCallbacks::on_free` instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncType {
    Pos,
    End,
    Meta,
    Slide,
    Stall,
    Download,
    SetPos,
    DeviceFail,
    DeviceFormat,
    /// Any other BASS_SYNC_* value (add-on syncs)
    Raw(DWORD),
}

impl SyncType {
    pub fn native(&self) -> DWORD {
        match self {
            SyncType::Pos => BASS_SYNC_POS,
            SyncType::End => BASS_SYNC_END,
            SyncType::Meta => BASS_SYNC_META,
            SyncType::Slide => BASS_SYNC_SLIDE,
            SyncType::Stall => BASS_SYNC_STALL,
            SyncType::Download => BASS_SYNC_DOWNLOAD,
            SyncType::SetPos => BASS_SYNC_SETPOS,
            SyncType::DeviceFail => BASS_SYNC_DEV_FAIL,
            SyncType::DeviceFormat => BASS_SYNC_DEV_FORMAT,
            SyncType::Raw(value) => *value,
        }
    }
}

/// Identifies a handler added with `ChannelCallbacks::on_free`. Unrelated to
/// native sync handles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FreeHandlerId(u32);

impl FreeHandlerId {
    fn key(self) -> CallbackKey {
        CallbackKey::new(CallbackKind::Free, self.0)
    }
}

/// Take a temporary strong reference to the callback behind `user`, so a
/// closure that removes itself is not freed while it runs.
unsafe fn retain(user: *mut c_void) -> Arc<ChannelCallback> {
    let ptr = user as *const ChannelCallback;
    Arc::increment_strong_count(ptr);
    Arc::from_raw(ptr)
}

unsafe extern "system" fn sync_thunk(sync: HSYNC, channel: DWORD, data: DWORD, user: *mut c_void) {
    let callback = retain(user);
    let event = SyncEvent { sync, channel, data };
    match &*callback {
        ChannelCallback::Sync(f) => {
            (f.lock())(event);
        }
        ChannelCallback::OneTimeSync { f, registry, fired } => {
            (f.lock())(event);
            // The engine has dropped the sync
            fired.store(true, Ordering::SeqCst);
            registry.unregister_if_same(channel, CallbackKey::sync(sync), &callback);
        }
        _ => {}
    }
}

unsafe extern "system" fn dsp_thunk(
    _dsp: HDSP,
    channel: DWORD,
    buffer: *mut c_void,
    length: DWORD,
    user: *mut c_void,
) {
    if buffer.is_null() || length == 0 {
        return;
    }
    let callback = retain(user);
    if let ChannelCallback::Dsp(f) = &*callback {
        let data = slice::from_raw_parts_mut(buffer as *mut u8, length as usize);
        (f.lock())(channel, data);
    }
}

unsafe extern "system" fn stream_thunk(
    _handle: HSTREAM,
    buffer: *mut c_void,
    length: DWORD,
    user: *mut c_void,
) -> DWORD {
    let callback = retain(user);
    let ChannelCallback::Stream(f) = &*callback else {
        return BASS_STREAMPROC_END;
    };
    if buffer.is_null() || length == 0 {
        return 0;
    }
    let data = slice::from_raw_parts_mut(buffer as *mut u8, length as usize);
    let written = (f.lock())(data).native(length as usize);
    written
}

fn user_of(callback: &Arc<ChannelCallback>) -> *mut c_void {
    Arc::as_ptr(callback) as *mut c_void
}

/// Runs the `Free` handlers of a channel that was just freed.
fn run_free_handlers(channel: DWORD, released: &[(CallbackKey, Arc<ChannelCallback>)]) {
    for (_, callback) in released {
        if let ChannelCallback::Free(slot) = &**callback {
            let handler = slot.lock().take();
            if let Some(handler) = handler {
                handler(channel);
            }
        }
    }
}

/// Installs closures as channel syncs, DSPs and stream procedures.
///
/// Dropping it detaches every callback it still holds from the engine and
/// removes its free syncs from channels that are still alive.
pub struct ChannelCallbacks {
    registry: CallbackRegistry<ChannelCallback>,
    next_free_id: AtomicU32,
}

impl ChannelCallbacks {
    pub fn new(engine: Arc<dyn NativeEngine>) -> Self {
        Self {
            registry: CallbackRegistry::with_listener(engine, run_free_handlers),
            next_free_id: AtomicU32::new(1),
        }
    }

    pub fn registry(&self) -> &CallbackRegistry<ChannelCallback> {
        &self.registry
    }

    fn engine(&self) -> &dyn NativeEngine {
        self.registry.engine().as_ref()
    }

    /// Create a user stream pulling its samples from `proc`.
    ///
    /// With `BASS_STREAM_AUTOFREE` the closure is released when the engine
    /// frees the stream on its own.
    pub fn create_stream<F>(&self, freq: DWORD, chans: DWORD, flags: DWORD, proc: F) -> Result<HSTREAM>
    where
        F: FnMut(&mut [u8]) -> StreamData + Send + 'static,
    {
        let callback = Arc::new(ChannelCallback::Stream(Mutex::new(Box::new(proc) as StreamFn)));
        let handle = unsafe {
            self.engine()
                .stream_create(freq, chans, flags, stream_thunk, user_of(&callback))?
        };

        if let Err(e) = self
            .registry
            .register(handle, CallbackKey::of(CallbackKind::Stream), callback.clone())
        {
            // Untracked, so the stream must go before the closure does
            if let Err(free_err) = self.engine().stream_free(handle) {
                log::warn!("failed to free untracked stream {:#x}: {}", handle, free_err);
            }
            return Err(e);
        }

        log::debug!("created user stream {:#x} ({} Hz, {} chans)", handle, freq, chans);
        Ok(handle)
    }

    /// Free a stream. Its callbacks are released by the free notification.
    pub fn free_stream(&self, handle: HSTREAM) -> Result<()> {
        self.engine().stream_free(handle)
    }

    /// Install `f` as a sync on `channel`.
    ///
    /// `flags` are BASS_SYNC_MIXTIME/ONETIME/THREAD. A ONETIME sync is
    /// released as soon as it has fired. `BASS_SYNC_FREE` is rejected with
    /// `BassError::IllType`; use `on_free`.
    pub fn set_sync<F>(&self, channel: DWORD, sync_type: SyncType, flags: DWORD, param: QWORD, f: F) -> Result<HSYNC>
    where
        F: FnMut(SyncEvent) + Send + 'static,
    {
        let native_type = sync_type.native() | flags;
        if native_type & !SYNC_FLAGS == BASS_SYNC_FREE {
            return Err(BassError::IllType.into());
        }

        let f = Mutex::new(Box::new(f) as SyncFn);
        let callback = Arc::new(if flags & BASS_SYNC_ONETIME != 0 {
            ChannelCallback::OneTimeSync {
                f,
                registry: self.registry.downgrade(),
                fired: AtomicBool::new(false),
            }
        } else {
            ChannelCallback::Sync(f)
        });

        let sync = unsafe {
            self.engine()
                .channel_set_sync(channel, native_type, param, sync_thunk, user_of(&callback))?
        };

        let key = CallbackKey::sync(sync);
        if let Err(e) = self.registry.register(channel, key, callback.clone()) {
            if let Err(remove_err) = self.engine().channel_remove_sync(channel, sync) {
                log::warn!("failed to remove untracked sync {:#x}: {}", sync, remove_err);
            }
            return Err(e);
        }

        // A mixtime one-shot can fire before it is registered
        if let ChannelCallback::OneTimeSync { registry, fired, .. } = &*callback {
            if fired.load(Ordering::SeqCst) {
                registry.unregister_if_same(channel, key, &callback);
            }
        }
        Ok(sync)
    }

    /// Remove a sync installed with `set_sync`.
    ///
    /// A sync the engine already dropped but that is still registered here is
    /// released and reported as removed.
    pub fn remove_sync(&self, channel: DWORD, sync: HSYNC) -> Result<()> {
        let native = self.engine().channel_remove_sync(channel, sync);
        let released = self.registry.unregister(channel, CallbackKey::sync(sync));
        match (native, released) {
            (Ok(()), _) | (Err(_), Some(_)) => Ok(()),
            (Err(e), None) => Err(e),
        }
    }

    /// Run `f` with the channel handle once `channel` is freed. Nothing is
    /// installed natively: the registry's own free sync drives it.
    pub fn on_free<F>(&self, channel: DWORD, f: F) -> Result<FreeHandlerId>
    where
        F: FnOnce(DWORD) + Send + 'static,
    {
        let id = FreeHandlerId(self.next_free_id.fetch_add(1, Ordering::Relaxed));
        let callback = ChannelCallback::Free(Mutex::new(Some(Box::new(f) as FreeFn)));
        self.registry.register(channel, id.key(), callback)?;
        Ok(id)
    }

    /// Returns false if the handler already ran or was removed.
    pub fn remove_free_handler(&self, channel: DWORD, id: FreeHandlerId) -> bool {
        self.registry.unregister(channel, id.key()).is_some()
    }

    /// Remove every sync and free handler on `channel`; returns how many
    /// were removed.
    pub fn clear_syncs(&self, channel: DWORD) -> usize {
        let mut removed = self.registry.unregister_kind(channel, CallbackKind::Free);
        for key in self.registry.keys(channel) {
            if key.kind == CallbackKind::Sync && self.remove_sync(channel, key.id).is_ok() {
                removed += 1;
            }
        }
        removed
    }

    /// Install `f` as a DSP on `channel`. Higher `priority` runs first.
    pub fn set_dsp<F>(&self, channel: DWORD, priority: i32, f: F) -> Result<HDSP>
    where
        F: FnMut(DWORD, &mut [u8]) + Send + 'static,
    {
        let callback = Arc::new(ChannelCallback::Dsp(Mutex::new(Box::new(f) as DspFn)));
        let dsp = unsafe {
            self.engine()
                .channel_set_dsp(channel, dsp_thunk, user_of(&callback), priority)?
        };

        if let Err(e) = self.registry.register(channel, CallbackKey::dsp(dsp), callback.clone()) {
            if let Err(remove_err) = self.engine().channel_remove_dsp(channel, dsp) {
                log::warn!("failed to remove untracked DSP {:#x}: {}", dsp, remove_err);
            }
            return Err(e);
        }
        Ok(dsp)
    }

    pub fn remove_dsp(&self, channel: DWORD, dsp: HDSP) -> Result<()> {
        let native = self.engine().channel_remove_dsp(channel, dsp);
        self.registry.unregister(channel, CallbackKey::dsp(dsp));
        native
    }
}

impl Drop for ChannelCallbacks {
    fn drop(&mut self) {
        let mut held = self.registry.drain();
        // Syncs and DSPs first; freeing a stream drops those with it
        held.sort_by_key(|(_, key, _)| key.kind == CallbackKind::Stream);

        for (handle, key, _) in &held {
            let detached = match key.kind {
                CallbackKind::Sync => self.engine().channel_remove_sync(*handle, key.id),
                CallbackKind::Dsp => self.engine().channel_remove_dsp(*handle, key.id),
                CallbackKind::Stream => self.engine().stream_free(*handle),
                _ => Ok(()),
            };
            match detached {
                Ok(()) | Err(Error::Native(BassError::Handle)) => {}
                Err(e) => log::warn!("failed to detach {:?} from {:#x}: {}", key.kind, handle, e),
            }
        }

        // Whatever is still tracked is a channel that outlives us
        let mut untracked = 0;
        for handle in self.registry.handles() {
            match self.registry.untrack(handle) {
                Ok(_) => untracked += 1,
                Err(Error::Native(BassError::Handle)) => {}
                Err(e) => log::warn!("failed to untrack {:#x}: {}", handle, e),
            }
        }
        if !held.is_empty() || untracked > 0 {
            log::debug!(
                "released {} channel callback(s), untracked {} channel(s)",
                held.len(),
                untracked
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockEngine;

    use std::sync::atomic::AtomicUsize;

    fn setup() -> (Arc<MockEngine>, ChannelCallbacks) {
        let mock = MockEngine::new();
        let callbacks = ChannelCallbacks::new(mock.clone());
        (mock, callbacks)
    }

    #[test]
    fn test_sync_fires_closure() {
        let (mock, callbacks) = setup();
        mock.open_channel(7);
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();

        let sync = callbacks
            .set_sync(7, SyncType::SetPos, 0, 0, move |event| sink.lock().push(event.data))
            .unwrap();
        assert!(mock.fire_sync(7, sync, 1234));
        assert!(mock.fire_sync(7, sync, 99));
        assert_eq!(*seen.lock(), vec![1234, 99]);
        assert_eq!(mock.free_subscriptions(7), 1);
    }

    #[test]
    fn test_remove_sync_detaches_and_releases() {
        let (mock, callbacks) = setup();
        mock.open_channel(7);
        let sync = callbacks.set_sync(7, SyncType::End, 0, 0, |_| {}).unwrap();

        callbacks.remove_sync(7, sync).unwrap();
        assert_eq!(mock.sync_count(7), 0);
        assert!(!callbacks.registry().contains(7, CallbackKey::sync(sync)));
        assert!(matches!(
            callbacks.remove_sync(7, sync),
            Err(Error::Native(BassError::Handle))
        ));
    }

    #[test]
    fn test_onetime_sync_is_released_after_firing() {
        let (mock, callbacks) = setup();
        mock.open_channel(7);
        let fired = Arc::new(AtomicUsize::new(0));

        let counter = fired.clone();
        let sync = callbacks
            .set_sync(7, SyncType::End, BASS_SYNC_ONETIME, 0, move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
            })
            .unwrap();
        assert!(callbacks.registry().contains(7, CallbackKey::sync(sync)));

        assert!(mock.fire_sync(7, sync, 0));
        assert!(!mock.fire_sync(7, sync, 0));
        assert_eq!(fired.load(Ordering::SeqCst), 1);
        assert_eq!(callbacks.registry().callback_count(7), 0);
        assert!(matches!(
            callbacks.remove_sync(7, sync),
            Err(Error::Native(BassError::Handle))
        ));
    }

    #[test]
    fn test_fired_onetime_syncs_do_not_accumulate() {
        let (mock, callbacks) = setup();
        mock.open_channel(7);

        for _ in 0..100 {
            let sync = callbacks
                .set_sync(7, SyncType::Pos, BASS_SYNC_ONETIME | BASS_SYNC_MIXTIME, 0, |_| {})
                .unwrap();
            assert!(mock.fire_sync(7, sync, 0));
        }
        assert_eq!(mock.sync_count(7), 0);
        assert_eq!(callbacks.registry().callback_count(7), 0);
        // The channel itself stays tracked
        assert_eq!(mock.free_subscriptions(7), 1);
    }

    #[test]
    fn test_onetime_sync_may_remove_itself() {
        let (mock, callbacks) = setup();
        mock.open_channel(7);
        let callbacks = Arc::new(callbacks);

        let cb = Arc::downgrade(&callbacks);
        let sync = callbacks
            .set_sync(7, SyncType::End, BASS_SYNC_ONETIME, 0, move |event| {
                if let Some(cb) = cb.upgrade() {
                    cb.remove_sync(event.channel, event.sync).unwrap();
                }
            })
            .unwrap();

        assert!(mock.fire_sync(7, sync, 0));
        assert_eq!(callbacks.registry().callback_count(7), 0);
    }

    #[test]
    fn test_sync_may_remove_itself() {
        let (mock, callbacks) = setup();
        mock.open_channel(7);
        let callbacks = Arc::new(callbacks);
        let slot = Arc::new(Mutex::new(None::<HSYNC>));

        let (cb, id) = (Arc::downgrade(&callbacks), slot.clone());
        let sync = callbacks
            .set_sync(7, SyncType::Pos, 0, 0, move |event| {
                if let Some(cb) = cb.upgrade() {
                    cb.remove_sync(event.channel, event.sync).unwrap();
                }
                *id.lock() = Some(event.sync);
            })
            .unwrap();

        assert!(mock.fire_sync(7, sync, 0));
        assert_eq!(*slot.lock(), Some(sync));
        assert_eq!(callbacks.registry().callback_count(7), 0);
    }

    #[test]
    fn test_set_sync_on_dead_channel_fails() {
        let (_mock, callbacks) = setup();
        let err = callbacks.set_sync(3, SyncType::End, 0, 0, |_| {}).unwrap_err();
        assert!(matches!(err, Error::Native(BassError::Handle)));
        assert!(callbacks.registry().handles().is_empty());
    }

    #[test]
    fn test_free_handlers_run_on_channel_free() {
        let (mock, callbacks) = setup();
        mock.open_channel(7);
        let fired = Arc::new(AtomicUsize::new(0));

        let counter = fired.clone();
        callbacks
            .on_free(7, move |channel| {
                assert_eq!(channel, 7);
                counter.fetch_add(1, Ordering::SeqCst);
            })
            .unwrap();
        let counter = fired.clone();
        let removed = callbacks
            .on_free(7, move |_| {
                counter.fetch_add(100, Ordering::SeqCst);
            })
            .unwrap();
        assert!(callbacks.remove_free_handler(7, removed));
        assert!(!callbacks.remove_free_handler(7, removed));

        // Only the registry's own free sync is installed natively
        assert_eq!(mock.sync_count(7), 0);
        mock.free_channel(7);
        assert_eq!(fired.load(Ordering::SeqCst), 1);
        assert!(!callbacks.registry().is_tracked(7));
    }

    #[test]
    fn test_remove_sync_leaves_free_handlers_alone() {
        let (mock, callbacks) = setup();
        mock.open_channel(7);
        let fired = Arc::new(AtomicUsize::new(0));

        let sync = callbacks.set_sync(7, SyncType::End, 0, 0, |_| {}).unwrap();
        // Enough handlers that one local id has the same value as `sync`
        for _ in 0..sync + 4 {
            let counter = fired.clone();
            callbacks
                .on_free(7, move |_| {
                    counter.fetch_add(1, Ordering::SeqCst);
                })
                .unwrap();
        }
        let handlers = callbacks.registry().callback_count(7) - 1;

        callbacks.remove_sync(7, sync).unwrap();
        assert_eq!(mock.sync_count(7), 0);
        assert!(!callbacks.registry().contains(7, CallbackKey::sync(sync)));
        assert_eq!(callbacks.registry().callback_count(7), handlers);

        mock.free_channel(7);
        assert_eq!(fired.load(Ordering::SeqCst), handlers);
    }

    #[test]
    fn test_set_sync_rejects_free_type() {
        let (mock, callbacks) = setup();
        mock.open_channel(7);
        let err = callbacks
            .set_sync(7, SyncType::Raw(BASS_SYNC_FREE), BASS_SYNC_MIXTIME, 0, |_| {})
            .unwrap_err();
        assert!(matches!(err, Error::Native(BassError::IllType)));
        assert!(!callbacks.registry().is_tracked(7));
        assert_eq!(mock.free_sync_count(7), 0);
    }

    #[test]
    fn test_clear_syncs() {
        let (mock, callbacks) = setup();
        mock.open_channel(7);
        callbacks.set_sync(7, SyncType::End, 0, 0, |_| {}).unwrap();
        callbacks.set_sync(7, SyncType::Stall, 0, 0, |_| {}).unwrap();
        callbacks.on_free(7, |_| {}).unwrap();
        callbacks.set_dsp(7, 0, |_, _| {}).unwrap();

        assert_eq!(callbacks.clear_syncs(7), 3);
        assert_eq!(mock.sync_count(7), 0);
        assert_eq!(mock.dsp_count(7), 1);
    }

    #[test]
    fn test_dsp_chain_runs_in_priority_order() {
        let (mock, callbacks) = setup();
        mock.open_channel(7);
        callbacks.set_dsp(7, 1, |_, buf| buf.iter_mut().for_each(|b| *b += 1)).unwrap();
        callbacks.set_dsp(7, 2, |_, buf| buf.iter_mut().for_each(|b| *b *= 2)).unwrap();

        let mut buffer = [1u8, 2, 3];
        mock.run_dsp(7, &mut buffer);
        assert_eq!(buffer, [3, 5, 7]);
    }

    #[test]
    fn test_remove_dsp() {
        let (mock, callbacks) = setup();
        mock.open_channel(7);
        let dsp = callbacks.set_dsp(7, 0, |_, buf| buf.fill(0)).unwrap();
        callbacks.remove_dsp(7, dsp).unwrap();

        let mut buffer = [9u8; 4];
        mock.run_dsp(7, &mut buffer);
        assert_eq!(buffer, [9; 4]);
        assert!(callbacks.remove_dsp(7, dsp).is_err());
    }

    #[test]
    fn test_user_stream_lifecycle() {
        let (mock, callbacks) = setup();
        let mut remaining = 6usize;
        let stream = callbacks
            .create_stream(44100, 2, 0, move |buf| {
                let n = remaining.min(buf.len());
                buf[..n].fill(0x7f);
                remaining -= n;
                if remaining == 0 {
                    StreamData::End(n)
                } else {
                    StreamData::Written(n)
                }
            })
            .unwrap();

        let mut buffer = [0u8; 4];
        assert_eq!(mock.pull_stream(stream, &mut buffer), Some(4));
        assert_eq!(mock.pull_stream(stream, &mut buffer), Some(2 | BASS_STREAMPROC_END));
        assert!(callbacks.registry().is_tracked(stream));

        callbacks.free_stream(stream).unwrap();
        assert!(!callbacks.registry().is_tracked(stream));
        assert!(mock.pull_stream(stream, &mut buffer).is_none());
    }

    #[test]
    fn test_stream_written_is_clamped() {
        let (mock, callbacks) = setup();
        let stream = callbacks.create_stream(8000, 1, 0, |_| StreamData::Written(1000)).unwrap();
        let mut buffer = [0u8; 16];
        assert_eq!(mock.pull_stream(stream, &mut buffer), Some(16));
    }

    #[test]
    fn test_create_stream_error_is_forwarded() {
        let (_mock, callbacks) = setup();
        let err = callbacks.create_stream(0, 2, 0, |_| StreamData::End(0)).unwrap_err();
        assert!(matches!(err, Error::Native(BassError::Freq)));
    }

    #[test]
    fn test_drop_detaches_everything() {
        let mock = MockEngine::new();
        mock.open_channel(7);
        let stream;
        {
            let callbacks = ChannelCallbacks::new(mock.clone());
            callbacks.set_sync(7, SyncType::End, 0, 0, |_| {}).unwrap();
            callbacks.set_dsp(7, 0, |_, _| {}).unwrap();
            stream = callbacks.create_stream(44100, 2, 0, |_| StreamData::End(0)).unwrap();
            callbacks.set_sync(stream, SyncType::Pos, 0, 0, |_| {}).unwrap();
        }
        assert_eq!(mock.sync_count(7), 0);
        assert_eq!(mock.dsp_count(7), 0);
        assert!(!mock.is_live(stream));
        // 7 itself is not ours to free, but it no longer refers to us
        assert!(mock.is_live(7));
        assert_eq!(mock.free_sync_count(7), 0);
        assert!(mock.free_channel(7));
    }

    #[test]
    fn test_drop_untracks_channels_without_callbacks() {
        let mock = MockEngine::new();
        mock.open_channel(7);
        {
            let callbacks = ChannelCallbacks::new(mock.clone());
            let sync = callbacks.set_sync(7, SyncType::End, 0, 0, |_| {}).unwrap();
            callbacks.remove_sync(7, sync).unwrap();
            assert!(callbacks.registry().is_tracked(7));
        }
        assert_eq!(mock.free_sync_count(7), 0);
    }
}

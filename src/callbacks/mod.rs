//! Callback lifetime registry.
//!
//! Native code keeps raw pointers to the callbacks it was given and may call
//! them until the channel they were attached to is freed. `CallbackRegistry`
//! owns those callbacks for exactly that long: the first registration on a
//! handle installs a `BASS_SYNC_FREE` sync, and when it fires every callback
//! stored under the handle is released.
//!
//! Rules the implementation keeps:
//! - At most one free sync per handle lifetime, however many callbacks are
//!   stored under it (an emptied handle stays tracked until it is freed).
//! - No native call is made while the map lock is held.
//! - Removed callbacks are dropped after the lock is released, so their
//!   `Drop` may call back into the registry.

pub mod channel;

pub use channel::{ChannelCallback, ChannelCallbacks, FreeHandlerId, StreamData, SyncEvent, SyncType};

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::ffi::c_void;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;

use crate::engine::NativeEngine;
use crate::error::Result;
use crate::ffi::{BASS_SYNC_FREE, DWORD, HDSP, HSYNC};

/// Role of a callback attached to a handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CallbackKind {
    /// STREAMPROC of a user stream
    Stream,
    /// File procedures of a custom file stream
    File,
    /// DOWNLOADPROC of an internet stream
    Download,
    /// SYNCPROC installed with BASS_ChannelSetSync
    Sync,
    /// Free-notification handler run by the registry itself
    Free,
    /// DSPPROC installed with BASS_ChannelSetDSP
    Dsp,
    /// RECORDPROC of a recording channel
    Record,
    /// Application-defined role
    Custom(u16),
}

/// Identifies one callback under a handle: its role plus a per-role id
/// (the HSYNC/HDSP for syncs and DSPs, 0 for single-instance roles).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CallbackKey {
    pub kind: CallbackKind,
    pub id: u32,
}

impl CallbackKey {
    pub const fn new(kind: CallbackKind, id: u32) -> Self {
        Self { kind, id }
    }

    /// Key of a single-instance role.
    pub const fn of(kind: CallbackKind) -> Self {
        Self { kind, id: 0 }
    }

    pub const fn sync(sync: HSYNC) -> Self {
        Self::new(CallbackKind::Sync, sync)
    }

    pub const fn dsp(dsp: HDSP) -> Self {
        Self::new(CallbackKind::Dsp, dsp)
    }
}

/// Observer run with the callbacks of a handle that was just freed, before
/// they are released.
pub type FreeListener<C> = Box<dyn Fn(DWORD, &[(CallbackKey, Arc<C>)]) + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Subscription {
    /// The free sync is being installed
    Pending,
    /// Installed; `hook` is the `FreeHook` box the sync owns
    Active { sync: HSYNC, hook: usize },
}

/// Everything tracked for one lifetime of one native handle.
struct HandleEntry<C> {
    generation: u64,
    subscription: Subscription,
    callbacks: HashMap<CallbackKey, Arc<C>>,
}

struct Shared<C> {
    engine: Arc<dyn NativeEngine>,
    handles: Mutex<HashMap<DWORD, HandleEntry<C>>>,
    next_generation: AtomicU64,
    listener: Option<FreeListener<C>>,
}

impl<C> Shared<C> {
    /// Remove a handle lifetime. With `generation` set only that lifetime is
    /// removed, so a late notification cannot purge a reused handle value.
    fn purge(&self, handle: DWORD, generation: Option<u64>) -> Option<HandleEntry<C>> {
        let mut handles = self.handles.lock();
        match handles.get(&handle) {
            Some(entry) if generation.map_or(true, |g| g == entry.generation) => handles.remove(&handle),
            _ => None,
        }
    }

    /// Purge and release a freed handle; returns the number of callbacks released.
    fn handle_freed(&self, handle: DWORD, generation: Option<u64>) -> usize {
        let Some(entry) = self.purge(handle, generation) else {
            return 0;
        };
        let released: Vec<(CallbackKey, Arc<C>)> = entry.callbacks.into_iter().collect();
        log::debug!("handle {:#x} freed, releasing {} callback(s)", handle, released.len());

        if let Some(listener) = &self.listener {
            listener(handle, &released);
        }
        released.len()
    }
}

/// Owned by the native free sync; reclaimed when the sync fires.
struct FreeHook<C> {
    shared: Weak<Shared<C>>,
    generation: u64,
}

unsafe extern "system" fn free_sync_proc<C: Send + Sync + 'static>(
    _sync: HSYNC,
    channel: DWORD,
    _data: DWORD,
    user: *mut c_void,
) {
    // BASS_SYNC_FREE fires exactly once per channel
    let hook = Box::from_raw(user as *mut FreeHook<C>);
    if let Some(shared) = hook.shared.upgrade() {
        shared.handle_freed(channel, Some(hook.generation));
    }
}

/// Keeps callbacks of type `C` alive until their native handle is freed.
pub struct CallbackRegistry<C> {
    shared: Arc<Shared<C>>,
}

impl<C: Send + Sync + 'static> CallbackRegistry<C> {
    pub fn new(engine: Arc<dyn NativeEngine>) -> Self {
        Self::build(engine, None)
    }

    /// Registry whose `listener` sees the callbacks of every freed handle.
    pub fn with_listener<L>(engine: Arc<dyn NativeEngine>, listener: L) -> Self
    where
        L: Fn(DWORD, &[(CallbackKey, Arc<C>)]) + Send + Sync + 'static,
    {
        Self::build(engine, Some(Box::new(listener)))
    }

    fn build(engine: Arc<dyn NativeEngine>, listener: Option<FreeListener<C>>) -> Self {
        Self {
            shared: Arc::new(Shared {
                engine,
                handles: Mutex::new(HashMap::new()),
                next_generation: AtomicU64::new(1),
                listener,
            }),
        }
    }

    pub fn engine(&self) -> &Arc<dyn NativeEngine> {
        &self.shared.engine
    }

    /// Store `callback` under `(handle, key)`, replacing any previous one.
    ///
    /// The first registration of a handle lifetime installs its free sync. If
    /// that fails (typically `BassError::Handle`) the lifetime is rolled back
    /// and the error returned.
    pub fn register(&self, handle: DWORD, key: CallbackKey, callback: impl Into<Arc<C>>) -> Result<()> {
        let callback = callback.into();

        let (previous, new_lifetime) = {
            let mut handles = self.shared.handles.lock();
            match handles.entry(handle) {
                Entry::Occupied(mut occupied) => (occupied.get_mut().callbacks.insert(key, callback), None),
                Entry::Vacant(vacant) => {
                    let generation = self.shared.next_generation.fetch_add(1, Ordering::Relaxed);
                    let mut callbacks = HashMap::new();
                    callbacks.insert(key, callback);
                    vacant.insert(HandleEntry {
                        generation,
                        subscription: Subscription::Pending,
                        callbacks,
                    });
                    (None, Some(generation))
                }
            }
        };
        drop(previous);

        match new_lifetime {
            Some(generation) => self.subscribe(handle, generation),
            None => Ok(()),
        }
    }

    /// `register` for `Some`, `unregister` for `None`.
    pub fn set(&self, handle: DWORD, key: CallbackKey, callback: Option<C>) -> Result<()> {
        match callback {
            Some(callback) => self.register(handle, key, callback),
            None => {
                self.unregister(handle, key);
                Ok(())
            }
        }
    }

    fn subscribe(&self, handle: DWORD, generation: u64) -> Result<()> {
        let hook = Box::into_raw(Box::new(FreeHook {
            shared: Arc::downgrade(&self.shared),
            generation,
        }));

        let installed = unsafe {
            self.shared
                .engine
                .channel_set_sync(handle, BASS_SYNC_FREE, 0, free_sync_proc::<C>, hook as *mut c_void)
        };

        match installed {
            Ok(sync) => {
                let mut handles = self.shared.handles.lock();
                if let Some(entry) = handles.get_mut(&handle) {
                    if entry.generation == generation {
                        entry.subscription = Subscription::Active {
                            sync,
                            hook: hook as usize,
                        };
                    }
                }
                log::debug!("tracking handle {:#x} (free sync {:#x})", handle, sync);
                Ok(())
            }
            Err(e) => {
                // Never installed, so the hook is still ours
                drop(unsafe { Box::from_raw(hook) });
                let rolled_back = self.shared.purge(handle, Some(generation));
                log::warn!("cannot track handle {:#x}: {}", handle, e);
                drop(rolled_back);
                Err(e)
            }
        }
    }

    /// Remove one callback. Unknown handles and keys are a no-op.
    pub fn unregister(&self, handle: DWORD, key: CallbackKey) -> Option<Arc<C>> {
        let mut handles = self.shared.handles.lock();
        handles.get_mut(&handle)?.callbacks.remove(&key)
    }

    /// Remove every callback of `kind` under `handle`; returns how many.
    pub fn unregister_kind(&self, handle: DWORD, kind: CallbackKind) -> usize {
        let removed: Vec<Arc<C>> = {
            let mut handles = self.shared.handles.lock();
            match handles.get_mut(&handle) {
                Some(entry) => {
                    let keys: Vec<CallbackKey> =
                        entry.callbacks.keys().filter(|k| k.kind == kind).copied().collect();
                    keys.iter().filter_map(|k| entry.callbacks.remove(k)).collect()
                }
                None => Vec::new(),
            }
        };
        removed.len()
    }

    pub fn get(&self, handle: DWORD, key: CallbackKey) -> Option<Arc<C>> {
        let handles = self.shared.handles.lock();
        handles.get(&handle)?.callbacks.get(&key).cloned()
    }

    pub fn contains(&self, handle: DWORD, key: CallbackKey) -> bool {
        let handles = self.shared.handles.lock();
        handles
            .get(&handle)
            .map_or(false, |entry| entry.callbacks.contains_key(&key))
    }

    /// Keys stored under `handle`, in no particular order.
    pub fn keys(&self, handle: DWORD) -> Vec<CallbackKey> {
        let handles = self.shared.handles.lock();
        handles
            .get(&handle)
            .map(|entry| entry.callbacks.keys().copied().collect())
            .unwrap_or_default()
    }

    pub fn callback_count(&self, handle: DWORD) -> usize {
        let handles = self.shared.handles.lock();
        handles.get(&handle).map_or(0, |entry| entry.callbacks.len())
    }

    /// Whether a lifetime (and its free sync) exists for `handle`.
    pub fn is_tracked(&self, handle: DWORD) -> bool {
        self.shared.handles.lock().contains_key(&handle)
    }

    /// Free sync installed for `handle`, once installation has completed.
    pub fn free_sync(&self, handle: DWORD) -> Option<HSYNC> {
        let handles = self.shared.handles.lock();
        match handles.get(&handle)?.subscription {
            Subscription::Active { sync, .. } => Some(sync),
            Subscription::Pending => None,
        }
    }

    /// Stop tracking a handle that stays alive: its free sync is removed and
    /// whatever is still stored under it is released. Returns how many
    /// callbacks were released.
    ///
    /// Unknown handles, and handles whose free sync is still being installed,
    /// are left alone. If the native removal fails nothing changes.
    pub fn untrack(&self, handle: DWORD) -> Result<usize> {
        let (generation, sync, hook) = {
            let handles = self.shared.handles.lock();
            match handles.get(&handle) {
                Some(HandleEntry {
                    generation,
                    subscription: Subscription::Active { sync, hook },
                    ..
                }) => (*generation, *sync, *hook),
                _ => return Ok(0),
            }
        };

        self.shared.engine.channel_remove_sync(handle, sync)?;
        // The sync is gone, so the hook is ours again
        drop(unsafe { Box::from_raw(hook as *mut FreeHook<C>) });

        let entry = self.shared.purge(handle, Some(generation));
        log::debug!("stopped tracking handle {:#x}", handle);
        Ok(entry.map_or(0, |entry| entry.callbacks.len()))
    }

    /// Tracked handles, in no particular order.
    pub fn handles(&self) -> Vec<DWORD> {
        self.shared.handles.lock().keys().copied().collect()
    }

    /// Release everything stored under `handle`. This is what the free sync
    /// runs; calling it again, or for an unknown handle, is a no-op.
    pub fn on_handle_freed(&self, handle: DWORD) -> usize {
        self.shared.handle_freed(handle, None)
    }

    /// A handle to this registry that does not keep it alive.
    pub fn downgrade(&self) -> WeakRegistry<C> {
        WeakRegistry {
            shared: Arc::downgrade(&self.shared),
        }
    }

    /// Take every callback out of the registry. Handle lifetimes stay
    /// tracked so their free syncs are not installed twice.
    pub fn drain(&self) -> Vec<(DWORD, CallbackKey, Arc<C>)> {
        let mut handles = self.shared.handles.lock();
        let mut drained = Vec::new();
        for (handle, entry) in handles.iter_mut() {
            drained.extend(entry.callbacks.drain().map(|(key, callback)| (*handle, key, callback)));
        }
        drained
    }
}

/// Non-owning handle to a `CallbackRegistry`, for callbacks that remove
/// themselves from the registry holding them.
pub struct WeakRegistry<C> {
    shared: Weak<Shared<C>>,
}

impl<C> Clone for WeakRegistry<C> {
    fn clone(&self) -> Self {
        Self {
            shared: self.shared.clone(),
        }
    }
}

impl<C> WeakRegistry<C> {
    /// Remove `(handle, key)` if it still holds `callback` itself. Returns
    /// false if it holds something else, or the registry is gone.
    pub fn unregister_if_same(&self, handle: DWORD, key: CallbackKey, callback: &Arc<C>) -> bool {
        let Some(shared) = self.shared.upgrade() else {
            return false;
        };
        let removed = {
            let mut handles = shared.handles.lock();
            match handles.get_mut(&handle) {
                Some(entry) if entry.callbacks.get(&key).map_or(false, |c| Arc::ptr_eq(c, callback)) => {
                    entry.callbacks.remove(&key)
                }
                _ => None,
            }
        };
        removed.is_some()
    }
}

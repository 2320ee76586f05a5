//! In-memory `NativeEngine` for tests.
//!
//! Channels, syncs, DSPs, devices and drives live in plain maps. Native
//! callbacks are invoked after the state lock is released so they may call
//! back into the engine.

use std::collections::{HashMap, HashSet};
use std::ffi::c_void;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::engine::{DeviceInfo, DeviceKind, DoorAction, DriveInfo, InitParams, NativeEngine};
use crate::error::{BassError, Result};
use crate::ffi::*;

const SYNC_FLAGS: DWORD = BASS_SYNC_MIXTIME | BASS_SYNC_ONETIME | BASS_SYNC_THREAD;

#[derive(Clone, Copy)]
struct MockSync {
    handle: HSYNC,
    sync_type: DWORD,
    proc: SyncProc,
    user: usize,
}

#[derive(Clone, Copy)]
struct MockDsp {
    handle: HDSP,
    proc: DspProc,
    user: usize,
    priority: i32,
}

#[derive(Default)]
struct MockChannel {
    syncs: Vec<MockSync>,
    dsps: Vec<MockDsp>,
    stream: Option<(StreamProc, usize)>,
}

pub(crate) struct MockDrive {
    pub info: DriveInfo,
    pub ready: bool,
    pub door_open: bool,
    pub locked: bool,
    pub tracks: u32,
}

#[derive(Default)]
struct MockState {
    next_handle: DWORD,
    channels: HashMap<DWORD, MockChannel>,
    free_installs: HashMap<DWORD, usize>,
    devices: HashMap<DeviceKind, Vec<DeviceInfo>>,
    initialized: HashSet<(DeviceKind, u32)>,
    current: HashMap<DeviceKind, u32>,
    info_queries: HashMap<DeviceKind, usize>,
    failing_info: HashMap<DeviceKind, u32>,
    drives: Vec<MockDrive>,
    notify: Option<(WasapiNotifyProc, usize)>,
    last_notify: Option<(WasapiNotifyProc, usize)>,
}

impl MockState {
    fn next_handle(&mut self) -> DWORD {
        self.next_handle += 1;
        0x1000 + self.next_handle
    }

    fn drive(&mut self, drive: u32) -> Result<&mut MockDrive> {
        self.drives
            .get_mut(drive as usize)
            .ok_or_else(|| BassError::Device.into())
    }
}

pub(crate) struct MockEngine {
    state: Mutex<MockState>,
}

impl MockEngine {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            state: Mutex::new(MockState::default()),
        })
    }

    // ---- channels ----------------------------------------------------------

    /// Make `handle` a live channel.
    pub fn open_channel(&self, handle: DWORD) {
        self.state.lock().channels.entry(handle).or_default();
    }

    pub fn is_live(&self, handle: DWORD) -> bool {
        self.state.lock().channels.contains_key(&handle)
    }

    /// Free `handle` the way the engine does: its FREE syncs fire, then it is gone.
    pub fn free_channel(&self, handle: DWORD) -> bool {
        let channel = self.state.lock().channels.remove(&handle);
        let Some(channel) = channel else {
            return false;
        };
        for sync in channel.syncs.iter().filter(|s| s.sync_type == BASS_SYNC_FREE) {
            unsafe { (sync.proc)(sync.handle, handle, 0, sync.user as *mut c_void) };
        }
        true
    }

    /// Fire and remove the oldest FREE sync of a channel that stays live.
    pub fn fire_first_free_sync(&self, handle: DWORD) {
        let sync = {
            let mut state = self.state.lock();
            let Some(channel) = state.channels.get_mut(&handle) else {
                return;
            };
            match channel.syncs.iter().position(|s| s.sync_type == BASS_SYNC_FREE) {
                Some(pos) => channel.syncs.remove(pos),
                None => return,
            }
        };
        unsafe { (sync.proc)(sync.handle, handle, 0, sync.user as *mut c_void) };
    }

    /// Total FREE syncs ever installed on `handle`.
    pub fn free_subscriptions(&self, handle: DWORD) -> usize {
        self.state.lock().free_installs.get(&handle).copied().unwrap_or(0)
    }

    /// FREE syncs installed on `handle` right now.
    pub fn free_sync_count(&self, handle: DWORD) -> usize {
        let state = self.state.lock();
        state.channels.get(&handle).map_or(0, |c| {
            c.syncs.iter().filter(|s| s.sync_type == BASS_SYNC_FREE).count()
        })
    }

    /// Installed syncs other than FREE.
    pub fn sync_count(&self, handle: DWORD) -> usize {
        let state = self.state.lock();
        state.channels.get(&handle).map_or(0, |c| {
            c.syncs.iter().filter(|s| s.sync_type != BASS_SYNC_FREE).count()
        })
    }

    pub fn dsp_count(&self, handle: DWORD) -> usize {
        let state = self.state.lock();
        state.channels.get(&handle).map_or(0, |c| c.dsps.len())
    }

    /// Fire sync `sync` of `channel` with `data`. ONETIME syncs are removed first.
    pub fn fire_sync(&self, channel: DWORD, sync: HSYNC, data: DWORD) -> bool {
        let found = {
            let mut state = self.state.lock();
            let Some(ch) = state.channels.get_mut(&channel) else {
                return false;
            };
            match ch.syncs.iter().position(|s| s.handle == sync) {
                Some(pos) if ch.syncs[pos].sync_type & BASS_SYNC_ONETIME != 0 => Some(ch.syncs.remove(pos)),
                Some(pos) => Some(ch.syncs[pos]),
                None => None,
            }
        };
        match found {
            Some(s) => {
                unsafe { (s.proc)(s.handle, channel, data, s.user as *mut c_void) };
                true
            }
            None => false,
        }
    }

    /// Run the DSP chain of `channel` over `buffer`, highest priority first.
    pub fn run_dsp(&self, channel: DWORD, buffer: &mut [u8]) {
        let mut chain = {
            let state = self.state.lock();
            state.channels.get(&channel).map(|c| c.dsps.clone()).unwrap_or_default()
        };
        chain.sort_by(|a, b| b.priority.cmp(&a.priority));
        for dsp in chain {
            unsafe {
                (dsp.proc)(
                    dsp.handle,
                    channel,
                    buffer.as_mut_ptr() as *mut c_void,
                    buffer.len() as DWORD,
                    dsp.user as *mut c_void,
                )
            };
        }
    }

    /// Ask the STREAMPROC of `handle` to fill `buffer`.
    pub fn pull_stream(&self, handle: HSTREAM, buffer: &mut [u8]) -> Option<DWORD> {
        let stream = {
            let state = self.state.lock();
            state.channels.get(&handle).and_then(|c| c.stream)
        }?;
        let (proc, user) = stream;
        Some(unsafe {
            proc(
                handle,
                buffer.as_mut_ptr() as *mut c_void,
                buffer.len() as DWORD,
                user as *mut c_void,
            )
        })
    }

    // ---- devices -----------------------------------------------------------

    pub fn set_devices(&self, kind: DeviceKind, devices: Vec<DeviceInfo>) {
        self.state.lock().devices.insert(kind, devices);
    }

    /// Make info queries for `kind` fail from `index` on.
    pub fn fail_info_from(&self, kind: DeviceKind, index: u32) {
        self.state.lock().failing_info.insert(kind, index);
    }

    pub fn info_queries(&self, kind: DeviceKind) -> usize {
        self.state.lock().info_queries.get(&kind).copied().unwrap_or(0)
    }

    pub fn set_current(&self, kind: DeviceKind, index: u32) {
        self.state.lock().current.insert(kind, index);
    }

    pub fn is_initialized(&self, kind: DeviceKind, index: u32) -> bool {
        self.state.lock().initialized.contains(&(kind, index))
    }

    pub fn has_notify(&self) -> bool {
        self.state.lock().notify.is_some()
    }

    /// Deliver a WASAPI notification to the installed callback.
    pub fn notify_wasapi(&self, notify: DWORD, device: DWORD) -> bool {
        let installed = self.state.lock().notify;
        match installed {
            Some((proc, user)) => {
                unsafe { proc(notify, device, user as *mut c_void) };
                true
            }
            None => false,
        }
    }

    /// Call the most recently installed notification callback even if it has
    /// been removed since, as a notification already in flight would.
    pub fn notify_wasapi_in_flight(&self, notify: DWORD, device: DWORD) -> bool {
        let last = self.state.lock().last_notify;
        match last {
            Some((proc, user)) => {
                unsafe { proc(notify, device, user as *mut c_void) };
                true
            }
            None => false,
        }
    }

    // ---- CD drives ---------------------------------------------------------

    pub fn add_drive(&self, info: DriveInfo, tracks: u32) {
        self.state.lock().drives.push(MockDrive {
            info,
            ready: tracks > 0,
            door_open: false,
            locked: false,
            tracks,
        });
    }

    pub fn with_drive<R>(&self, drive: u32, f: impl FnOnce(&mut MockDrive) -> R) -> Option<R> {
        self.state.lock().drives.get_mut(drive as usize).map(f)
    }
}

impl NativeEngine for MockEngine {
    unsafe fn channel_set_sync(
        &self,
        channel: DWORD,
        sync_type: DWORD,
        _param: QWORD,
        proc: SyncProc,
        user: *mut c_void,
    ) -> Result<HSYNC> {
        let mut state = self.state.lock();
        if !state.channels.contains_key(&channel) {
            return Err(BassError::Handle.into());
        }
        let handle = state.next_handle();
        let base = sync_type & !SYNC_FLAGS;
        if base == BASS_SYNC_FREE {
            *state.free_installs.entry(channel).or_insert(0) += 1;
        }
        let ch = state.channels.entry(channel).or_default();
        ch.syncs.push(MockSync {
            handle,
            sync_type: base | (sync_type & BASS_SYNC_ONETIME),
            proc,
            user: user as usize,
        });
        Ok(handle)
    }

    fn channel_remove_sync(&self, channel: DWORD, sync: HSYNC) -> Result<()> {
        let mut state = self.state.lock();
        let ch = state.channels.get_mut(&channel).ok_or(BassError::Handle)?;
        let pos = ch.syncs.iter().position(|s| s.handle == sync).ok_or(BassError::Handle)?;
        ch.syncs.remove(pos);
        Ok(())
    }

    unsafe fn channel_set_dsp(
        &self,
        channel: DWORD,
        proc: DspProc,
        user: *mut c_void,
        priority: i32,
    ) -> Result<HDSP> {
        let mut state = self.state.lock();
        if !state.channels.contains_key(&channel) {
            return Err(BassError::Handle.into());
        }
        let handle = state.next_handle();
        let ch = state.channels.entry(channel).or_default();
        ch.dsps.push(MockDsp {
            handle,
            proc,
            user: user as usize,
            priority,
        });
        Ok(handle)
    }

    fn channel_remove_dsp(&self, channel: DWORD, dsp: HDSP) -> Result<()> {
        let mut state = self.state.lock();
        let ch = state.channels.get_mut(&channel).ok_or(BassError::Handle)?;
        let pos = ch.dsps.iter().position(|d| d.handle == dsp).ok_or(BassError::Handle)?;
        ch.dsps.remove(pos);
        Ok(())
    }

    unsafe fn stream_create(
        &self,
        freq: DWORD,
        chans: DWORD,
        _flags: DWORD,
        proc: StreamProc,
        user: *mut c_void,
    ) -> Result<HSTREAM> {
        if freq == 0 {
            return Err(BassError::Freq.into());
        }
        if chans == 0 {
            return Err(BassError::Format.into());
        }
        let mut state = self.state.lock();
        let handle = state.next_handle();
        state.channels.insert(
            handle,
            MockChannel {
                stream: Some((proc, user as usize)),
                ..Default::default()
            },
        );
        Ok(handle)
    }

    fn stream_free(&self, handle: HSTREAM) -> Result<()> {
        if self.free_channel(handle) {
            Ok(())
        } else {
            Err(BassError::Handle.into())
        }
    }

    fn device_info(&self, kind: DeviceKind, index: u32) -> Result<Option<DeviceInfo>> {
        let mut state = self.state.lock();
        *state.info_queries.entry(kind).or_insert(0) += 1;
        if state.failing_info.get(&kind).map_or(false, |from| index >= *from) {
            return Err(BassError::Driver.into());
        }
        let mut info = match state.devices.get(&kind).and_then(|d| d.get(index as usize)) {
            Some(info) => info.clone(),
            None => return Ok(None),
        };
        if state.initialized.contains(&(kind, index)) {
            info.flags |= BASS_DEVICE_INIT;
        }
        Ok(Some(info))
    }

    fn device_init(&self, index: u32, params: &InitParams) -> Result<()> {
        let kind = params.kind();
        let mut state = self.state.lock();
        let count = state.devices.get(&kind).map_or(0, |d| d.len());
        if index as usize >= count {
            return Err(BassError::Device.into());
        }
        if !state.initialized.insert((kind, index)) {
            return Err(BassError::Already.into());
        }
        state.current.insert(kind, index);
        Ok(())
    }

    fn device_free(&self, kind: DeviceKind, index: u32) -> Result<()> {
        let mut state = self.state.lock();
        if !state.initialized.remove(&(kind, index)) {
            return Err(BassError::Init.into());
        }
        if state.current.get(&kind) == Some(&index) {
            state.current.remove(&kind);
        }
        Ok(())
    }

    fn current_device(&self, kind: DeviceKind) -> Result<Option<u32>> {
        Ok(self.state.lock().current.get(&kind).copied())
    }

    unsafe fn wasapi_set_notify(&self, notify: Option<(WasapiNotifyProc, *mut c_void)>) -> Result<()> {
        let mut state = self.state.lock();
        state.notify = notify.map(|(proc, user)| (proc, user as usize));
        if state.notify.is_some() {
            state.last_notify = state.notify;
        }
        Ok(())
    }

    fn cd_info(&self, drive: u32) -> Result<Option<DriveInfo>> {
        let state = self.state.lock();
        Ok(state.drives.get(drive as usize).map(|d| d.info.clone()))
    }

    fn cd_is_ready(&self, drive: u32) -> Result<bool> {
        let mut state = self.state.lock();
        let d = state.drive(drive)?;
        Ok(d.ready && !d.door_open)
    }

    fn cd_door(&self, drive: u32, action: DoorAction) -> Result<()> {
        let mut state = self.state.lock();
        let d = state.drive(drive)?;
        match action {
            DoorAction::Open if d.locked => return Err(BassError::NotAvail.into()),
            DoorAction::Open => d.door_open = true,
            DoorAction::Close => d.door_open = false,
            DoorAction::Lock => d.locked = true,
            DoorAction::Unlock => d.locked = false,
        }
        Ok(())
    }

    fn cd_track_count(&self, drive: u32) -> Result<u32> {
        let mut state = self.state.lock();
        let d = state.drive(drive)?;
        if !d.ready || d.door_open {
            return Err(BassError::NotAvail.into());
        }
        Ok(d.tracks)
    }
}

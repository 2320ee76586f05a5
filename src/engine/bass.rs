//! `NativeEngine` over the real BASS libraries, resolved at runtime.

use std::ffi::c_void;
use std::path::Path;

use super::{DeviceInfo, DeviceKind, DoorAction, DriveInfo, InitParams, NativeEngine};
use crate::config::EngineConfig;
use crate::error::{BassError, Error, Result};
use crate::ffi::loader::Library;
use crate::ffi::*;

// ============================================================================
// Function tables
// ============================================================================

struct CoreFunctions {
    get_version: GetVersionFn,
    error_get_code: ErrorGetCodeFn,
    get_device_info: GetDeviceInfoFn,
    init: InitFn,
    free: FreeFn,
    get_device: GetDeviceFn,
    set_device: SetDeviceFn,
    record_get_device_info: GetDeviceInfoFn,
    record_init: RecordInitFn,
    record_free: FreeFn,
    record_get_device: GetDeviceFn,
    record_set_device: SetDeviceFn,
    stream_create: StreamCreateFn,
    stream_free: StreamFreeFn,
    channel_set_sync: ChannelSetSyncFn,
    channel_remove_sync: ChannelRemoveSyncFn,
    channel_set_dsp: ChannelSetDspFn,
    channel_remove_dsp: ChannelRemoveDspFn,
}

struct AsioFunctions {
    error_get_code: ErrorGetCodeFn,
    get_device_info: AsioGetDeviceInfoFn,
    init: AsioInitFn,
    free: FreeFn,
    get_device: GetDeviceFn,
    set_device: SetDeviceFn,
}

struct WasapiFunctions {
    error_get_code: ErrorGetCodeFn,
    get_device_info: WasapiGetDeviceInfoFn,
    init: WasapiInitFn,
    free: FreeFn,
    get_device: GetDeviceFn,
    set_device: SetDeviceFn,
    set_notify: WasapiSetNotifyFn,
}

// BASSCD reports errors through BASS_ErrorGetCode
struct CdFunctions {
    get_info: CdGetInfoFn,
    is_ready: CdIsReadyFn,
    door: CdDoorFn,
    get_tracks: CdGetTracksFn,
}

macro_rules! load_fn {
    ($lib:expr, $name:expr) => {
        $lib.symbol($name)?
    };
}

impl CoreFunctions {
    unsafe fn resolve(lib: &Library) -> Result<Self> {
        Ok(Self {
            get_version: load_fn!(lib, "BASS_GetVersion"),
            error_get_code: load_fn!(lib, "BASS_ErrorGetCode"),
            get_device_info: load_fn!(lib, "BASS_GetDeviceInfo"),
            init: load_fn!(lib, "BASS_Init"),
            free: load_fn!(lib, "BASS_Free"),
            get_device: load_fn!(lib, "BASS_GetDevice"),
            set_device: load_fn!(lib, "BASS_SetDevice"),
            record_get_device_info: load_fn!(lib, "BASS_RecordGetDeviceInfo"),
            record_init: load_fn!(lib, "BASS_RecordInit"),
            record_free: load_fn!(lib, "BASS_RecordFree"),
            record_get_device: load_fn!(lib, "BASS_RecordGetDevice"),
            record_set_device: load_fn!(lib, "BASS_RecordSetDevice"),
            stream_create: load_fn!(lib, "BASS_StreamCreate"),
            stream_free: load_fn!(lib, "BASS_StreamFree"),
            channel_set_sync: load_fn!(lib, "BASS_ChannelSetSync"),
            channel_remove_sync: load_fn!(lib, "BASS_ChannelRemoveSync"),
            channel_set_dsp: load_fn!(lib, "BASS_ChannelSetDSP"),
            channel_remove_dsp: load_fn!(lib, "BASS_ChannelRemoveDSP"),
        })
    }
}

impl AsioFunctions {
    unsafe fn resolve(lib: &Library) -> Result<Self> {
        Ok(Self {
            error_get_code: load_fn!(lib, "BASS_ASIO_ErrorGetCode"),
            get_device_info: load_fn!(lib, "BASS_ASIO_GetDeviceInfo"),
            init: load_fn!(lib, "BASS_ASIO_Init"),
            free: load_fn!(lib, "BASS_ASIO_Free"),
            get_device: load_fn!(lib, "BASS_ASIO_GetDevice"),
            set_device: load_fn!(lib, "BASS_ASIO_SetDevice"),
        })
    }
}

impl WasapiFunctions {
    unsafe fn resolve(lib: &Library) -> Result<Self> {
        Ok(Self {
            error_get_code: load_fn!(lib, "BASS_WASAPI_ErrorGetCode"),
            get_device_info: load_fn!(lib, "BASS_WASAPI_GetDeviceInfo"),
            init: load_fn!(lib, "BASS_WASAPI_Init"),
            free: load_fn!(lib, "BASS_WASAPI_Free"),
            get_device: load_fn!(lib, "BASS_WASAPI_GetDevice"),
            set_device: load_fn!(lib, "BASS_WASAPI_SetDevice"),
            set_notify: load_fn!(lib, "BASS_WASAPI_SetNotify"),
        })
    }
}

impl CdFunctions {
    unsafe fn resolve(lib: &Library) -> Result<Self> {
        Ok(Self {
            get_info: load_fn!(lib, "BASS_CD_GetInfo"),
            is_ready: load_fn!(lib, "BASS_CD_IsReady"),
            door: load_fn!(lib, "BASS_CD_Door"),
            get_tracks: load_fn!(lib, "BASS_CD_GetTracks"),
        })
    }
}

/// A library kept open together with its resolved exports.
struct Loaded<F> {
    _library: Library,
    functions: F,
}

fn load_addon<F>(
    stem: &str,
    dir: Option<&Path>,
    resolve: unsafe fn(&Library) -> Result<F>,
) -> Option<Loaded<F>> {
    let library = match Library::open(stem, dir) {
        Ok(lib) => lib,
        Err(e) => {
            log::debug!("{} not loaded: {}", stem, e);
            return None;
        }
    };
    match unsafe { resolve(&library) } {
        Ok(functions) => Some(Loaded { _library: library, functions }),
        Err(e) => {
            log::debug!("{} not usable: {}", stem, e);
            None
        }
    }
}

// ============================================================================
// Engine
// ============================================================================

/// BASS plus whichever add-ons were found.
pub struct BassEngine {
    core: Loaded<CoreFunctions>,
    asio: Option<Loaded<AsioFunctions>>,
    wasapi: Option<Loaded<WasapiFunctions>>,
    cd: Option<Loaded<CdFunctions>>,
    version: DWORD,
}

impl BassEngine {
    /// Load bass (required) and the add-ons enabled in `config` (optional).
    pub fn load(config: &EngineConfig) -> Result<Self> {
        let dir = config.library_dir.as_deref();

        let library = Library::open("bass", dir)?;
        let functions = unsafe { CoreFunctions::resolve(&library)? };

        // Verify BASS version (high word must be 2.4)
        let version = unsafe { (functions.get_version)() };
        if (version >> 16) != BASSVERSION {
            return Err(Error::Version { found: version });
        }

        let asio = if config.load_asio {
            load_addon("bassasio", dir, AsioFunctions::resolve)
        } else {
            None
        };
        let wasapi = if config.load_wasapi {
            load_addon("basswasapi", dir, WasapiFunctions::resolve)
        } else {
            None
        };
        let cd = if config.load_cd {
            load_addon("basscd", dir, CdFunctions::resolve)
        } else {
            None
        };

        log::debug!(
            "{} version {:#010x} (asio: {}, wasapi: {}, cd: {})",
            library.name(),
            version,
            asio.is_some(),
            wasapi.is_some(),
            cd.is_some()
        );

        Ok(Self {
            core: Loaded { _library: library, functions },
            asio,
            wasapi,
            cd,
            version,
        })
    }

    /// Value of BASS_GetVersion.
    pub fn version(&self) -> DWORD {
        self.version
    }

    pub fn has_asio(&self) -> bool {
        self.asio.is_some()
    }

    pub fn has_wasapi(&self) -> bool {
        self.wasapi.is_some()
    }

    pub fn has_cd(&self) -> bool {
        self.cd.is_some()
    }

    fn core(&self) -> &CoreFunctions {
        &self.core.functions
    }

    fn asio(&self) -> Result<&AsioFunctions> {
        self.asio
            .as_ref()
            .map(|l| &l.functions)
            .ok_or(Error::Unavailable("bassasio"))
    }

    fn wasapi(&self) -> Result<&WasapiFunctions> {
        self.wasapi
            .as_ref()
            .map(|l| &l.functions)
            .ok_or(Error::Unavailable("basswasapi"))
    }

    fn cd(&self) -> Result<&CdFunctions> {
        self.cd
            .as_ref()
            .map(|l| &l.functions)
            .ok_or(Error::Unavailable("basscd"))
    }

    /// Error code of the last failed call of the library owning `error_get_code`.
    fn last_error(error_get_code: ErrorGetCodeFn) -> BassError {
        BassError::from_code(unsafe { error_get_code() })
    }

    fn check(ok: BOOL, error_get_code: ErrorGetCodeFn) -> Result<()> {
        if ok != FALSE {
            Ok(())
        } else {
            Err(Self::last_error(error_get_code).into())
        }
    }

    fn check_handle(handle: DWORD, error_get_code: ErrorGetCodeFn) -> Result<DWORD> {
        if handle != 0 {
            Ok(handle)
        } else {
            Err(Self::last_error(error_get_code).into())
        }
    }

    /// Map an info query result: past-the-end is `None`, anything else an error.
    fn info_result<T>(ok: BOOL, error_get_code: ErrorGetCodeFn, value: impl FnOnce() -> T) -> Result<Option<T>> {
        if ok != FALSE {
            return Ok(Some(value()));
        }
        match Self::last_error(error_get_code) {
            BassError::Device => Ok(None),
            other => Err(other.into()),
        }
    }

    /// Map a GetDevice result: -1 with BASS_ERROR_INIT means nothing is current.
    fn current_result(device: DWORD, error_get_code: ErrorGetCodeFn) -> Result<Option<u32>> {
        if device != DWORD::MAX {
            return Ok(Some(device));
        }
        match Self::last_error(error_get_code) {
            BassError::Init => Ok(None),
            other => Err(other.into()),
        }
    }
}

impl NativeEngine for BassEngine {
    unsafe fn channel_set_sync(
        &self,
        channel: DWORD,
        sync_type: DWORD,
        param: QWORD,
        proc: SyncProc,
        user: *mut c_void,
    ) -> Result<HSYNC> {
        let f = self.core();
        let sync = (f.channel_set_sync)(channel, sync_type, param, Some(proc), user);
        Self::check_handle(sync, f.error_get_code)
    }

    fn channel_remove_sync(&self, channel: DWORD, sync: HSYNC) -> Result<()> {
        let f = self.core();
        Self::check(unsafe { (f.channel_remove_sync)(channel, sync) }, f.error_get_code)
    }

    unsafe fn channel_set_dsp(
        &self,
        channel: DWORD,
        proc: DspProc,
        user: *mut c_void,
        priority: i32,
    ) -> Result<HDSP> {
        let f = self.core();
        let dsp = (f.channel_set_dsp)(channel, Some(proc), user, priority);
        Self::check_handle(dsp, f.error_get_code)
    }

    fn channel_remove_dsp(&self, channel: DWORD, dsp: HDSP) -> Result<()> {
        let f = self.core();
        Self::check(unsafe { (f.channel_remove_dsp)(channel, dsp) }, f.error_get_code)
    }

    unsafe fn stream_create(
        &self,
        freq: DWORD,
        chans: DWORD,
        flags: DWORD,
        proc: StreamProc,
        user: *mut c_void,
    ) -> Result<HSTREAM> {
        let f = self.core();
        let handle = (f.stream_create)(freq, chans, flags, Some(proc), user);
        Self::check_handle(handle, f.error_get_code)
    }

    fn stream_free(&self, handle: HSTREAM) -> Result<()> {
        let f = self.core();
        Self::check(unsafe { (f.stream_free)(handle) }, f.error_get_code)
    }

    fn device_info(&self, kind: DeviceKind, index: u32) -> Result<Option<DeviceInfo>> {
        unsafe {
            match kind {
                DeviceKind::Playback | DeviceKind::Recording => {
                    let f = self.core();
                    let get_info = if kind == DeviceKind::Playback {
                        f.get_device_info
                    } else {
                        f.record_get_device_info
                    };
                    let mut info = BassDeviceInfo::default();
                    let ok = get_info(index, &mut info);
                    Self::info_result(ok, f.error_get_code, || {
                        DeviceInfo::new(owned_string(info.name), owned_string(info.driver), info.flags)
                    })
                }
                DeviceKind::Asio => {
                    let f = self.asio()?;
                    let mut info = BassAsioDeviceInfo::default();
                    let ok = (f.get_device_info)(index, &mut info);
                    // ASIO drivers carry no flags; every listed driver is usable
                    Self::info_result(ok, f.error_get_code, || {
                        DeviceInfo::new(
                            owned_string(info.name),
                            owned_string(info.driver),
                            BASS_DEVICE_ENABLED,
                        )
                    })
                }
                DeviceKind::Wasapi => {
                    let f = self.wasapi()?;
                    let mut info = BassWasapiDeviceInfo::default();
                    let ok = (f.get_device_info)(index, &mut info);
                    Self::info_result(ok, f.error_get_code, || DeviceInfo {
                        name: owned_string(info.name),
                        driver: owned_string(info.id),
                        flags: info.flags,
                        mix_freq: info.mixfreq,
                        mix_chans: info.mixchans,
                    })
                }
            }
        }
    }

    fn device_init(&self, index: u32, params: &InitParams) -> Result<()> {
        unsafe {
            match *params {
                InitParams::Playback { freq, flags } => {
                    let f = self.core();
                    let ok = (f.init)(index as i32, freq, flags, std::ptr::null_mut(), std::ptr::null());
                    Self::check(ok, f.error_get_code)
                }
                InitParams::Recording => {
                    let f = self.core();
                    Self::check((f.record_init)(index as i32), f.error_get_code)
                }
                InitParams::Asio { flags } => {
                    let f = self.asio()?;
                    Self::check((f.init)(index as i32, flags), f.error_get_code)
                }
                InitParams::Wasapi { freq, chans, flags, buffer, period } => {
                    let f = self.wasapi()?;
                    let ok = (f.init)(
                        index as i32,
                        freq,
                        chans,
                        flags,
                        buffer,
                        period,
                        WASAPIPROC_PUSH,
                        std::ptr::null_mut(),
                    );
                    Self::check(ok, f.error_get_code)
                }
            }
        }
    }

    fn device_free(&self, kind: DeviceKind, index: u32) -> Result<()> {
        // The free calls act on the thread's current device, so select it first
        unsafe {
            match kind {
                DeviceKind::Playback => {
                    let f = self.core();
                    Self::check((f.set_device)(index), f.error_get_code)?;
                    Self::check((f.free)(), f.error_get_code)
                }
                DeviceKind::Recording => {
                    let f = self.core();
                    Self::check((f.record_set_device)(index), f.error_get_code)?;
                    Self::check((f.record_free)(), f.error_get_code)
                }
                DeviceKind::Asio => {
                    let f = self.asio()?;
                    Self::check((f.set_device)(index), f.error_get_code)?;
                    Self::check((f.free)(), f.error_get_code)
                }
                DeviceKind::Wasapi => {
                    let f = self.wasapi()?;
                    Self::check((f.set_device)(index), f.error_get_code)?;
                    Self::check((f.free)(), f.error_get_code)
                }
            }
        }
    }

    fn current_device(&self, kind: DeviceKind) -> Result<Option<u32>> {
        unsafe {
            match kind {
                DeviceKind::Playback => {
                    let f = self.core();
                    Self::current_result((f.get_device)(), f.error_get_code)
                }
                DeviceKind::Recording => {
                    let f = self.core();
                    Self::current_result((f.record_get_device)(), f.error_get_code)
                }
                DeviceKind::Asio => {
                    let f = self.asio()?;
                    Self::current_result((f.get_device)(), f.error_get_code)
                }
                DeviceKind::Wasapi => {
                    let f = self.wasapi()?;
                    Self::current_result((f.get_device)(), f.error_get_code)
                }
            }
        }
    }

    unsafe fn wasapi_set_notify(&self, notify: Option<(WasapiNotifyProc, *mut c_void)>) -> Result<()> {
        let f = self.wasapi()?;
        let ok = match notify {
            Some((proc, user)) => (f.set_notify)(Some(proc), user),
            None => (f.set_notify)(None, std::ptr::null_mut()),
        };
        Self::check(ok, f.error_get_code)
    }

    fn cd_info(&self, drive: u32) -> Result<Option<DriveInfo>> {
        let f = self.cd()?;
        let mut info = BassCdInfo::default();
        unsafe {
            let ok = (f.get_info)(drive, &mut info);
            Self::info_result(ok, self.core().error_get_code, || DriveInfo {
                vendor: owned_string(info.vendor),
                product: owned_string(info.product),
                revision: owned_string(info.rev),
                letter: u8::try_from(info.letter).ok().filter(|l| *l < 26).map(|l| (b'A' + l) as char),
                can_open: info.canopen != FALSE,
                can_lock: info.canlock != FALSE,
                max_speed: info.maxspeed,
                cache: info.cache,
                cd_text: info.cdtext != FALSE,
            })
        }
    }

    fn cd_is_ready(&self, drive: u32) -> Result<bool> {
        let f = self.cd()?;
        Ok(unsafe { (f.is_ready)(drive) } != FALSE)
    }

    fn cd_door(&self, drive: u32, action: DoorAction) -> Result<()> {
        let f = self.cd()?;
        Self::check(unsafe { (f.door)(drive, action.native()) }, self.core().error_get_code)
    }

    fn cd_track_count(&self, drive: u32) -> Result<u32> {
        let f = self.cd()?;
        let tracks = unsafe { (f.get_tracks)(drive) };
        if tracks == DWORD::MAX {
            Err(Self::last_error(self.core().error_get_code).into())
        } else {
            Ok(tracks)
        }
    }
}

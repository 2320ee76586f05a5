//! Error types.
//!
//! `BassError` mirrors the native `BASS_ERROR_*` codes one-to-one. `Error` is
//! what every fallible operation in this crate returns: either a native
//! failure forwarded unchanged, or a condition detected on the Rust side.

use thiserror::Error;

use crate::ffi::*;

/// Error code reported by BASS (or an add-on) after a failed call.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum BassError {
    #[error("memory error")]
    Mem,
    #[error("can't open the file")]
    FileOpen,
    #[error("can't find a free/valid driver")]
    Driver,
    #[error("the sample buffer was lost")]
    BufLost,
    #[error("invalid handle")]
    Handle,
    #[error("unsupported sample format")]
    Format,
    #[error("invalid position")]
    Position,
    #[error("init has not been successfully called")]
    Init,
    #[error("start has not been successfully called")]
    Start,
    #[error("already initialized/paused/whatever")]
    Already,
    #[error("can't get a free channel")]
    NoChan,
    #[error("an illegal type was specified")]
    IllType,
    #[error("an illegal parameter was specified")]
    IllParam,
    #[error("illegal device number")]
    Device,
    #[error("not playing")]
    NoPlay,
    #[error("illegal sample rate")]
    Freq,
    #[error("requested data/action is not available")]
    NotAvail,
    #[error("the channel is/isn't a decoding channel")]
    Decode,
    #[error("connection timed out")]
    Timeout,
    #[error("unsupported file format")]
    FileForm,
    #[error("unavailable speaker")]
    Speaker,
    #[error("invalid BASS version")]
    Version,
    #[error("the device is busy")]
    Busy,
    #[error("access denied")]
    Denied,
    #[error("unknown BASS error code {0}")]
    Unknown(i32),
}

impl BassError {
    /// Map a `BASS_ErrorGetCode` value to an error.
    /// `BASS_OK` is reported as `Unknown(0)`: a call failed without setting a code.
    pub fn from_code(code: i32) -> Self {
        match code {
            BASS_ERROR_MEM => BassError::Mem,
            BASS_ERROR_FILEOPEN => BassError::FileOpen,
            BASS_ERROR_DRIVER => BassError::Driver,
            BASS_ERROR_BUFLOST => BassError::BufLost,
            BASS_ERROR_HANDLE => BassError::Handle,
            BASS_ERROR_FORMAT => BassError::Format,
            BASS_ERROR_POSITION => BassError::Position,
            BASS_ERROR_INIT => BassError::Init,
            BASS_ERROR_START => BassError::Start,
            BASS_ERROR_ALREADY => BassError::Already,
            BASS_ERROR_NOCHAN => BassError::NoChan,
            BASS_ERROR_ILLTYPE => BassError::IllType,
            BASS_ERROR_ILLPARAM => BassError::IllParam,
            BASS_ERROR_DEVICE => BassError::Device,
            BASS_ERROR_NOPLAY => BassError::NoPlay,
            BASS_ERROR_FREQ => BassError::Freq,
            BASS_ERROR_NOTAVAIL => BassError::NotAvail,
            BASS_ERROR_DECODE => BassError::Decode,
            BASS_ERROR_TIMEOUT => BassError::Timeout,
            BASS_ERROR_FILEFORM => BassError::FileForm,
            BASS_ERROR_SPEAKER => BassError::Speaker,
            BASS_ERROR_VERSION => BassError::Version,
            BASS_ERROR_BUSY => BassError::Busy,
            BASS_ERROR_DENIED => BassError::Denied,
            other => BassError::Unknown(other),
        }
    }

    /// The native error code.
    pub fn code(&self) -> i32 {
        match self {
            BassError::Mem => BASS_ERROR_MEM,
            BassError::FileOpen => BASS_ERROR_FILEOPEN,
            BassError::Driver => BASS_ERROR_DRIVER,
            BassError::BufLost => BASS_ERROR_BUFLOST,
            BassError::Handle => BASS_ERROR_HANDLE,
            BassError::Format => BASS_ERROR_FORMAT,
            BassError::Position => BASS_ERROR_POSITION,
            BassError::Init => BASS_ERROR_INIT,
            BassError::Start => BASS_ERROR_START,
            BassError::Already => BASS_ERROR_ALREADY,
            BassError::NoChan => BASS_ERROR_NOCHAN,
            BassError::IllType => BASS_ERROR_ILLTYPE,
            BassError::IllParam => BASS_ERROR_ILLPARAM,
            BassError::Device => BASS_ERROR_DEVICE,
            BassError::NoPlay => BASS_ERROR_NOPLAY,
            BassError::Freq => BASS_ERROR_FREQ,
            BassError::NotAvail => BASS_ERROR_NOTAVAIL,
            BassError::Decode => BASS_ERROR_DECODE,
            BassError::Timeout => BASS_ERROR_TIMEOUT,
            BassError::FileForm => BASS_ERROR_FILEFORM,
            BassError::Speaker => BASS_ERROR_SPEAKER,
            BassError::Version => BASS_ERROR_VERSION,
            BassError::Busy => BASS_ERROR_BUSY,
            BassError::Denied => BASS_ERROR_DENIED,
            BassError::Unknown(code) => *code,
        }
    }
}

/// Errors returned by the registries, facades and engine.
#[derive(Error, Debug)]
pub enum Error {
    /// The native enumeration does not know this index.
    #[error("{kind} {index} does not exist")]
    NotFound { kind: &'static str, index: u32 },

    /// A native call failed; the code is forwarded as-is.
    #[error("native call failed: {0}")]
    Native(#[from] BassError),

    /// The add-on implementing this operation was not loaded.
    #[error("{0} is not available")]
    Unavailable(&'static str),

    #[error("failed to load {library}: {reason}")]
    Load { library: String, reason: String },

    #[error("unsupported BASS version {found:#010x}")]
    Version { found: u32 },
}

pub type Result<T> = std::result::Result<T, Error>;

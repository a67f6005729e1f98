//! Error handling utilities for native Windows calls and version-resource parsing.
//!
//! Provides a single error type covering failed native calls, malformed
//! version resources, out-of-bounds addresses and UTF-16 decoding failures,
//! and converts them into idiomatic Rust `Result` types.

use crate::ntstatus::NtStatus;
use thiserror::Error;

/// The error type reported by the Windows API bindings.
#[cfg(windows)]
pub type WinError = windows::core::Error;

/// Stand-in for the Windows API error type on platforms without the bindings.
#[cfg(not(windows))]
pub type WinError = std::io::Error;

/// The main error type for this crate.
#[derive(Error, Debug)]
pub enum Error {
    /// A Windows API error with its error code.
    #[error("Windows API error: {0}")]
    Windows(#[from] WinError),

    /// A non-zero NTSTATUS returned by the NT kernel interface.
    #[error(transparent)]
    NtStatus(#[from] NtStatus),

    /// A native call failed. `call` names the failing operation.
    #[error("{call} failed: {source}")]
    Native {
        /// Name of the native operation that failed.
        call: &'static str,
        /// The underlying failure.
        #[source]
        source: Box<Error>,
    },

    /// A version buffer was used before being filled by the OS.
    #[error("uninitialized buffer: use file_version_info to initialize VersionData")]
    UninitializedBuffer,

    /// The resource exposes no `\VarFileInfo\Translation` entries.
    #[error("failed to get list of languages")]
    NoLanguages(#[source] Option<Box<Error>>),

    /// A string-table sub-block could not be found.
    #[error("failed to query {sub_block}: {source}")]
    QueryFailed {
        /// The sub-block path that was queried.
        sub_block: String,
        /// The underlying failure.
        #[source]
        source: Box<Error>,
    },

    /// An address returned by a lookup does not lie inside the owned buffer.
    #[error("invalid address")]
    InvalidAddress,

    /// A fixed-size record had an unexpected size.
    #[error("size mismatch: expected {expected} bytes, got {actual}")]
    SizeMismatch {
        /// The size of the record.
        expected: usize,
        /// The size that was returned.
        actual: usize,
    },

    /// An output buffer is longer than a native call can describe.
    #[error("buffer of {0} bytes exceeds the native length limit")]
    BufferTooLarge(usize),

    /// A UTF-16 byte span had an odd number of bytes.
    #[error("slice must have an even length (length={0})")]
    OddLength(usize),

    /// A string conversion error occurred.
    #[error("String conversion error: {0}")]
    StringConversion(String),

    /// A version string could not be decoded.
    #[error("failed to decode UTF16 data: {0}")]
    Decode(#[source] Box<Error>),

    /// An invalid handle was provided or returned.
    #[error("Invalid handle: {context}")]
    InvalidHandle {
        /// Description of the invalid handle context.
        context: &'static str,
    },

    /// The requested resource was not found.
    #[error("Not found: {0}")]
    NotFound(String),
}

/// A specialized `Result` type for this crate.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Wraps `source` as the failure of the native call `call`.
    pub fn native(call: &'static str, source: impl Into<Error>) -> Self {
        Error::Native {
            call,
            source: Box::new(source.into()),
        }
    }

    /// Creates a new invalid handle error with the given context.
    pub fn invalid_handle(context: &'static str) -> Self {
        Error::InvalidHandle { context }
    }

    /// Creates a new string conversion error.
    pub fn string_conversion(msg: impl Into<String>) -> Self {
        Error::StringConversion(msg.into())
    }

    /// Creates a new size mismatch error.
    pub fn size_mismatch(expected: usize, actual: usize) -> Self {
        Error::SizeMismatch { expected, actual }
    }

    /// Creates a new not found error.
    pub fn not_found(msg: impl Into<String>) -> Self {
        Error::NotFound(msg.into())
    }

    /// Returns the NTSTATUS code if this error, or the error it wraps, came
    /// from the NT kernel interface.
    pub fn nt_status_code(&self) -> Option<u32> {
        match self {
            Error::NtStatus(status) => Some(status.code()),
            Error::Native { source, .. } => source.nt_status_code(),
            _ => None,
        }
    }

    /// Returns the Windows error code if this is a Windows error.
    #[cfg(windows)]
    pub fn win32_error_code(&self) -> Option<u32> {
        match self {
            Error::Windows(e) => Some(e.code().0 as u32),
            Error::Native { source, .. } => source.win32_error_code(),
            _ => None,
        }
    }
}

/// Extension trait for converting Windows `Result` types.
#[cfg(windows)]
pub trait ResultExt<T> {
    /// Converts a Windows result to our Result type.
    fn to_result(self) -> Result<T>;
}

#[cfg(windows)]
impl<T> ResultExt<T> for windows::core::Result<T> {
    fn to_result(self) -> Result<T> {
        self.map_err(Error::from)
    }
}

/// Gets the last Windows error as our Error type.
#[cfg(windows)]
pub fn last_error() -> Error {
    Error::Windows(WinError::from_win32())
}

//! String conversion utilities for Windows APIs.
//!
//! Windows APIs use UTF-16 encoded strings (wide strings), while Rust uses UTF-8.
//! Version resources additionally hand back UTF-16 text as raw little-endian
//! bytes inside an untyped buffer. This module converts between these formats.

use crate::error::{Error, Result};
#[cfg(windows)]
use std::os::windows::ffi::OsStrExt;
#[cfg(windows)]
use std::path::Path;

/// Converts a Rust string to a null-terminated UTF-16 vector.
///
/// # Example
///
/// ```
/// use ergonomic_winsys::string::to_wide;
///
/// let wide = to_wide("Hello");
/// assert_eq!(wide, vec![72, 101, 108, 108, 111, 0]);
/// ```
#[inline]
pub fn to_wide(s: &str) -> Vec<u16> {
    // UTF-16 length is at most the UTF-8 length, +1 for the terminator.
    let mut result = Vec::with_capacity(s.len() + 1);
    result.extend(s.encode_utf16());
    result.push(0);
    result
}

/// Converts a path to a null-terminated UTF-16 vector.
#[cfg(windows)]
#[inline]
pub fn path_to_wide(path: &Path) -> Vec<u16> {
    let os_str = path.as_os_str();
    let mut result = Vec::with_capacity(os_str.len() + 1);
    result.extend(os_str.encode_wide());
    result.push(0);
    result
}

/// Converts a UTF-16 slice to a Rust `String`, stopping at the first null.
///
/// The slice may or may not include the null terminator.
///
/// # Example
///
/// ```
/// use ergonomic_winsys::string::{to_wide, from_wide};
///
/// let wide = to_wide("Hello");
/// let s = from_wide(&wide).unwrap();
/// assert_eq!(s, "Hello");
/// ```
#[inline]
pub fn from_wide(wide: &[u16]) -> Result<String> {
    let len = wide.iter().position(|&c| c == 0).unwrap_or(wide.len());
    String::from_utf16(&wide[..len])
        .map_err(|_| Error::string_conversion("Invalid UTF-16 sequence"))
}

/// Decodes little-endian UTF-16 bytes into a Rust `String`.
///
/// Decoding stops at the first null code unit, so a trailing terminator is
/// stripped. Fails if `bytes` has an odd length or contains an unpaired
/// surrogate.
///
/// # Example
///
/// ```
/// use ergonomic_winsys::string::from_utf16_bytes;
///
/// let bytes = [b'1', 0, b'.', 0, b'2', 0, 0, 0];
/// assert_eq!(from_utf16_bytes(&bytes).unwrap(), "1.2");
/// assert!(from_utf16_bytes(&bytes[..3]).is_err());
/// ```
#[inline]
pub fn from_utf16_bytes(bytes: &[u8]) -> Result<String> {
    from_utf16_bytes_with_offset(bytes).map(|(s, _)| s)
}

/// Decodes little-endian UTF-16 bytes like [`from_utf16_bytes`], also
/// returning the byte offset just past the null terminator.
///
/// The offset is `Some` only when a terminator was found and more bytes
/// follow it, which allows walking a sequence of null-separated strings.
pub fn from_utf16_bytes_with_offset(bytes: &[u8]) -> Result<(String, Option<usize>)> {
    if bytes.len() % 2 != 0 {
        return Err(Error::OddLength(bytes.len()));
    }

    let units: Vec<u16> = bytes
        .chunks_exact(2)
        .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
        .collect();

    let next = units
        .iter()
        .position(|&c| c == 0)
        .map(|null| (null + 1) * 2)
        .filter(|&offset| offset < bytes.len());

    Ok((from_wide(&units)?, next))
}

/// PCWSTR helper - a wrapper for passing wide strings to Windows APIs.
///
/// This type holds ownership of the string buffer and provides a pointer
/// that can be passed to Windows APIs expecting `PCWSTR`.
#[derive(Clone)]
pub struct WideString {
    buffer: Vec<u16>,
}

impl WideString {
    /// Creates a new `WideString` from a Rust string.
    #[inline]
    pub fn new(s: &str) -> Self {
        Self {
            buffer: to_wide(s),
        }
    }

    /// Creates a new `WideString` from a path.
    #[cfg(windows)]
    #[inline]
    pub fn from_path(path: &Path) -> Self {
        Self {
            buffer: path_to_wide(path),
        }
    }

    /// Returns the string as a PCWSTR for use with Windows APIs.
    #[cfg(windows)]
    #[inline]
    pub fn as_pcwstr(&self) -> windows::core::PCWSTR {
        windows::core::PCWSTR::from_raw(self.buffer.as_ptr())
    }

    /// Returns the length in UTF-16 code units, not including the null terminator.
    #[inline]
    pub fn len(&self) -> usize {
        self.buffer.len().saturating_sub(1)
    }

    /// Returns true if the string is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the underlying buffer, including the terminator.
    #[inline]
    pub fn as_slice(&self) -> &[u16] {
        &self.buffer
    }
}

impl From<&str> for WideString {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

#[cfg(windows)]
impl From<&Path> for WideString {
    fn from(path: &Path) -> Self {
        Self::from_path(path)
    }
}

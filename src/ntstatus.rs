//! NTSTATUS wrapper.
//!
//! The NT kernel interface reports failures as 32-bit status codes. This
//! module turns them into a typed error without attempting to interpret them:
//! a non-zero code is only ever rendered as hexadecimal.

use thiserror::Error;

/// A non-zero NTSTATUS returned by the NT kernel interface.
///
/// # Example
///
/// ```
/// use ergonomic_winsys::ntstatus::NtStatus;
///
/// let status = NtStatus::from_raw(0xC000_0005);
/// assert_eq!(status.to_string(), "ntstatus=c0000005");
/// assert!(NtStatus::check(0).is_ok());
/// ```
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[error("ntstatus={0:x}")]
pub struct NtStatus(u32);

impl NtStatus {
    /// `STATUS_SUCCESS`.
    pub const SUCCESS: u32 = 0;

    /// Wraps a raw status code.
    #[inline]
    pub const fn from_raw(code: u32) -> Self {
        Self(code)
    }

    /// Returns the raw status code.
    #[inline]
    pub const fn code(self) -> u32 {
        self.0
    }

    /// Returns `Ok(())` for `STATUS_SUCCESS` and the wrapped code otherwise.
    #[inline]
    pub fn check(code: u32) -> Result<(), NtStatus> {
        if code == Self::SUCCESS {
            Ok(())
        } else {
            Err(Self(code))
        }
    }
}

impl From<NtStatus> for u32 {
    fn from(status: NtStatus) -> Self {
        status.0
    }
}

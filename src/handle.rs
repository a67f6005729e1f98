//! RAII wrapper for Windows handles.
//!
//! Handles returned by calls such as `OpenProcess` are owned by an
//! [`OwnedHandle`] and closed when it is dropped.

use crate::error::{Error, Result};
use windows::Win32::Foundation::{CloseHandle, HANDLE};

/// An owned Windows `HANDLE`, closed on drop.
///
/// # Example
///
/// ```no_run
/// use ergonomic_winsys::handle::OwnedHandle;
/// use windows::Win32::System::Threading::{OpenProcess, PROCESS_QUERY_LIMITED_INFORMATION};
///
/// # fn main() -> ergonomic_winsys::error::Result<()> {
/// let raw = unsafe { OpenProcess(PROCESS_QUERY_LIMITED_INFORMATION, false, 4)? };
/// let handle = OwnedHandle::new(raw)?;
/// // `handle` is closed here.
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct OwnedHandle {
    handle: HANDLE,
}

impl OwnedHandle {
    /// Takes ownership of `handle`.
    ///
    /// Returns an error if the handle is null or `INVALID_HANDLE_VALUE`.
    #[inline]
    pub fn new(handle: HANDLE) -> Result<Self> {
        if !handle.is_valid() {
            return Err(Error::invalid_handle(
                "Cannot create OwnedHandle from invalid handle",
            ));
        }
        Ok(Self { handle })
    }

    /// Returns the raw `HANDLE`.
    #[inline]
    pub fn as_raw(&self) -> HANDLE {
        self.handle
    }

    /// Consumes the `OwnedHandle` and returns the raw `HANDLE` without closing it.
    ///
    /// The caller is now responsible for closing the handle.
    #[inline]
    pub fn into_raw(self) -> HANDLE {
        let handle = self.handle;
        std::mem::forget(self);
        handle
    }
}

impl Drop for OwnedHandle {
    fn drop(&mut self) {
        if self.handle.is_valid() {
            // SAFETY: We own this handle exclusively and it was checked on
            // construction. It is closed exactly once.
            unsafe {
                let _ = CloseHandle(self.handle);
            }
        }
    }
}

impl AsRef<HANDLE> for OwnedHandle {
    fn as_ref(&self) -> &HANDLE {
        &self.handle
    }
}

/// Extension trait for working with Windows handles.
pub trait HandleExt {
    /// Returns true if this handle is neither null nor `INVALID_HANDLE_VALUE`.
    fn is_valid(&self) -> bool;
}

impl HandleExt for HANDLE {
    #[inline]
    fn is_valid(&self) -> bool {
        !self.is_invalid() && !self.0.is_null()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use windows::Win32::Foundation::INVALID_HANDLE_VALUE;
    use windows::Win32::System::Threading::{
        GetCurrentProcessId, OpenProcess, PROCESS_QUERY_LIMITED_INFORMATION,
    };

    fn open_self() -> HANDLE {
        unsafe {
            OpenProcess(
                PROCESS_QUERY_LIMITED_INFORMATION,
                false,
                GetCurrentProcessId(),
            )
            .unwrap()
        }
    }

    #[test]
    fn test_invalid_handle_rejected() {
        let err = OwnedHandle::new(INVALID_HANDLE_VALUE).unwrap_err();
        assert!(matches!(err, Error::InvalidHandle { .. }));
    }

    #[test]
    fn test_null_handle_rejected() {
        assert!(OwnedHandle::new(HANDLE::default()).is_err());
    }

    #[test]
    fn test_into_raw_keeps_handle_open() {
        let owned = OwnedHandle::new(open_self()).unwrap();
        assert_eq!(owned.as_ref(), &owned.as_raw());
        let raw = owned.into_raw();
        assert!(raw.is_valid());
        // Still open, so closing it here succeeds.
        assert!(unsafe { CloseHandle(raw) }.is_ok());
    }
}

//! System uptime.

#[cfg(windows)]
use std::time::Duration;
#[cfg(windows)]
use windows::Win32::System::SystemInformation::GetTickCount64;

/// Gets the number of milliseconds since the system started.
///
/// Requires Windows Vista or later.
#[cfg(windows)]
#[inline]
pub fn tick_count() -> u64 {
    // SAFETY: GetTickCount64 has no preconditions
    unsafe { GetTickCount64() }
}

/// Gets the time elapsed since the system started.
///
/// # Example
///
/// ```no_run
/// # #[cfg(windows)]
/// # {
/// let up = ergonomic_winsys::time::uptime();
/// println!("Up for {} minutes", up.as_secs() / 60);
/// # }
/// ```
#[cfg(windows)]
#[inline]
pub fn uptime() -> Duration {
    Duration::from_millis(tick_count())
}

//! # Ergonomic Windows System
//!
//! Safe, typed wrappers around low-level Windows facilities.
//!
//! This crate provides idiomatic Rust interfaces to:
//!
//! - **Error Handling**: A single error type for native calls and parsing
//! - **NTSTATUS**: Typed wrapper for native kernel status codes
//! - **String Utilities**: Wide strings and little-endian UTF-16 decoding
//! - **Version Resources**: Fixed file info and string-table lookups with
//!   every returned address validated against the owned buffer
//! - **Handles**: RAII ownership of process handles
//! - **Process Queries**: `NtQueryInformationProcess` and record decoding
//! - **Time**: System uptime
//!
//! The decoders and the version-resource parser are platform independent
//! and accept an injectable sub-block lookup; the functions that call into
//! the OS are only available on Windows.
//!
//! ## Quick Start
//!
//! ```no_run
//! # #[cfg(windows)]
//! # fn main() -> ergonomic_winsys::error::Result<()> {
//! use ergonomic_winsys::prelude::*;
//!
//! let data = file_version_info(r"C:\Windows\System32\kernel32.dll")?;
//! println!("Product version: {}", data.fixed_file_info()?.product_version());
//! println!("Description: {}", data.query_value("FileDescription")?);
//!
//! let info = basic_information(current_process())?;
//! println!("PEB at {:#x}", info.peb_base_address);
//!
//! println!("Uptime: {:?}", uptime());
//! # Ok(())
//! # }
//! # #[cfg(not(windows))]
//! # fn main() {}
//! ```
//!
//! ## Parsing Without the OS
//!
//! ```
//! use ergonomic_winsys::version::FixedFileInfo;
//!
//! let info = FixedFileInfo {
//!     product_version_ms: 0x0001_0002,
//!     product_version_ls: 0x0003_0004,
//!     ..Default::default()
//! };
//! assert_eq!(info.product_version(), "1.2.3.4");
//! ```

#![warn(missing_docs)]

// Core modules
pub mod error;
pub mod ntstatus;
pub mod string;

// System modules
#[cfg(windows)]
pub mod handle;
pub mod process;
pub mod time;
pub mod version;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::error::{Error, Result};
    pub use crate::ntstatus::NtStatus;
    pub use crate::process::{
        decode_pointer, PointerWidth, ProcessBasicInfo, ProcessInfoClass,
        RtlUserProcessParameters, UnicodeString,
    };
    pub use crate::string::{from_utf16_bytes, from_wide, to_wide, WideString};
    pub use crate::version::{
        FileFlags, FileVersion, FixedFileInfo, LanguageCodePage, SubBlock, SubBlockLookup,
        VersionData,
    };

    #[cfg(windows)]
    pub use crate::error::ResultExt;
    #[cfg(windows)]
    pub use crate::handle::{HandleExt, OwnedHandle};
    #[cfg(windows)]
    pub use crate::process::{
        basic_information, current_pid, current_process, debug_port, image_file_name,
        query_information, wow64_information, Process, ProcessAccess,
    };
    #[cfg(windows)]
    pub use crate::time::{tick_count, uptime};
    #[cfg(windows)]
    pub use crate::version::{file_version_info, NativeLookup};
}

//! Native process queries.
//!
//! Wraps `NtQueryInformationProcess` and decodes the fixed-size records it
//! returns, as well as the `RTL_USER_PROCESS_PARAMETERS` block reachable from
//! the PEB address in [`ProcessBasicInfo`]. Records are decoded field by field from little-endian bytes, so
//! the decoders are usable (and tested) on any platform; only the query
//! itself and process handles are Windows-specific.

use crate::error::{Error, Result};
use crate::string::from_utf16_bytes;
use byteorder::{ByteOrder, LittleEndian};

/// Selects which record a process query returns (`PROCESSINFOCLASS`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum ProcessInfoClass {
    /// `PROCESS_BASIC_INFORMATION`, decoded by [`ProcessBasicInfo`].
    Basic = 0,
    /// Debug port of the process, decoded by [`decode_pointer`].
    DebugPort = 7,
    /// WoW64 PEB address, zero for native processes. Decoded by
    /// [`decode_pointer`].
    Wow64Information = 26,
    /// Image file name in NT device form: a [`UnicodeString`] followed by
    /// the characters it points to.
    ImageFileName = 27,
}

impl ProcessInfoClass {
    /// Returns the raw class number.
    #[inline]
    pub fn code(self) -> u32 {
        self as u32
    }
}

/// Pointer width of the process that produced a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PointerWidth {
    /// 4-byte pointers.
    Bits32,
    /// 8-byte pointers.
    Bits64,
}

impl PointerWidth {
    /// Pointer width of the current process.
    pub const NATIVE: Self = if cfg!(target_pointer_width = "64") {
        PointerWidth::Bits64
    } else {
        PointerWidth::Bits32
    };

    /// Returns the width in bytes.
    #[inline]
    pub fn bytes(self) -> usize {
        match self {
            PointerWidth::Bits32 => 4,
            PointerWidth::Bits64 => 8,
        }
    }
}

/// Basic information about a process (`PROCESS_BASIC_INFORMATION`).
///
/// Pointer-sized fields are widened to `u64` regardless of the width they
/// were decoded from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ProcessBasicInfo {
    /// Reserved; holds the exit status.
    pub reserved1: u64,
    /// Address of the process environment block.
    pub peb_base_address: u64,
    /// Reserved; hold the affinity mask and base priority.
    pub reserved2: [u64; 2],
    /// Process identifier.
    pub unique_process_id: u64,
    /// Reserved; holds the parent process identifier.
    pub reserved3: u64,
}

impl ProcessBasicInfo {
    const FIELDS: usize = 6;

    /// Returns the record size in bytes for the given pointer width.
    #[inline]
    pub fn size(width: PointerWidth) -> usize {
        Self::FIELDS * width.bytes()
    }

    /// Decodes a record from little-endian bytes.
    ///
    /// Trailing bytes beyond the record size are ignored.
    pub fn from_bytes(bytes: &[u8], width: PointerWidth) -> Result<Self> {
        let record = fixed_record(bytes, Self::size(width))?;

        let mut fields = [0u64; Self::FIELDS];
        match width {
            PointerWidth::Bits64 => LittleEndian::read_u64_into(record, &mut fields),
            PointerWidth::Bits32 => {
                let mut narrow = [0u32; Self::FIELDS];
                LittleEndian::read_u32_into(record, &mut narrow);
                for (wide, narrow) in fields.iter_mut().zip(narrow) {
                    *wide = u64::from(narrow);
                }
            }
        }

        Ok(Self {
            reserved1: fields[0],
            peb_base_address: fields[1],
            reserved2: [fields[2], fields[3]],
            unique_process_id: fields[4],
            reserved3: fields[5],
        })
    }

    /// Returns the parent process identifier stored in the reserved tail.
    #[inline]
    pub fn inherited_from_process_id(&self) -> u64 {
        self.reserved3
    }
}

/// Returns the first `size` bytes of `bytes`, or a size mismatch.
fn fixed_record(bytes: &[u8], size: usize) -> Result<&[u8]> {
    bytes
        .get(..size)
        .ok_or_else(|| Error::size_mismatch(size, bytes.len()))
}

/// Converts an output buffer length to the `u32` a native query takes.
#[cfg_attr(not(windows), allow(dead_code))]
fn native_len(len: usize) -> Result<u32> {
    u32::try_from(len).map_err(|_| Error::BufferTooLarge(len))
}

/// Decodes one pointer-sized little-endian value, widened to `u64`.
///
/// This is the record returned for [`ProcessInfoClass::DebugPort`] and
/// [`ProcessInfoClass::Wow64Information`].
pub fn decode_pointer(bytes: &[u8], width: PointerWidth) -> Result<u64> {
    let record = fixed_record(bytes, width.bytes())?;
    Ok(match width {
        PointerWidth::Bits64 => LittleEndian::read_u64(record),
        PointerWidth::Bits32 => u64::from(LittleEndian::read_u32(record)),
    })
}

/// A counted UTF-16 string descriptor (`UNICODE_STRING`).
///
/// `buffer` is an address in the process the record came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct UnicodeString {
    /// Length of the string in bytes, without a terminator.
    pub length: u16,
    /// Size of the allocation behind `buffer` in bytes.
    pub maximum_length: u16,
    /// Address of the first character.
    pub buffer: u64,
}

impl UnicodeString {
    /// Returns the record size in bytes for the given pointer width.
    #[inline]
    pub fn size(width: PointerWidth) -> usize {
        // Two u16 lengths padded to pointer alignment, then the pointer.
        2 * width.bytes()
    }

    /// Decodes a record from little-endian bytes.
    pub fn from_bytes(bytes: &[u8], width: PointerWidth) -> Result<Self> {
        let record = fixed_record(bytes, Self::size(width))?;
        Ok(Self {
            length: LittleEndian::read_u16(&record[0..2]),
            maximum_length: LittleEndian::read_u16(&record[2..4]),
            buffer: decode_pointer(&record[width.bytes()..], width)?,
        })
    }

    /// Returns the characters of this string from `bytes`, a copy of the
    /// memory that starts at address `base`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidAddress`] if the characters do not lie
    /// entirely inside `bytes`.
    pub fn resolve<'a>(&self, bytes: &'a [u8], base: u64) -> Result<&'a [u8]> {
        if self.length == 0 {
            return Ok(&[]);
        }
        let offset = self
            .buffer
            .checked_sub(base)
            .and_then(|offset| usize::try_from(offset).ok())
            .ok_or(Error::InvalidAddress)?;
        let end = offset
            .checked_add(usize::from(self.length))
            .ok_or(Error::InvalidAddress)?;
        bytes.get(offset..end).ok_or(Error::InvalidAddress)
    }

    /// Resolves the characters like [`resolve`](Self::resolve) and decodes them.
    pub fn decode(&self, bytes: &[u8], base: u64) -> Result<String> {
        from_utf16_bytes(self.resolve(bytes, base)?)
    }
}

/// The process parameters block the PEB points to
/// (`RTL_USER_PROCESS_PARAMETERS`), including the undocumented current
/// directory and DLL path fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RtlUserProcessParameters {
    /// Reserved.
    pub reserved1: [u8; 16],
    /// Reserved pointer-sized fields.
    pub reserved2: [u64; 5],
    /// Current directory of the process.
    pub current_directory_path: UnicodeString,
    /// Handle to the current directory.
    pub current_directory_handle: u64,
    /// DLL search path.
    pub dll_path: UnicodeString,
    /// Path of the image file.
    pub image_path_name: UnicodeString,
    /// Command line passed to the process.
    pub command_line: UnicodeString,
}

impl RtlUserProcessParameters {
    /// Returns the record size in bytes for the given pointer width.
    #[inline]
    pub fn size(width: PointerWidth) -> usize {
        16 + 6 * width.bytes() + 4 * UnicodeString::size(width)
    }

    /// Decodes a record from little-endian bytes.
    ///
    /// Trailing bytes beyond the record size are ignored.
    pub fn from_bytes(bytes: &[u8], width: PointerWidth) -> Result<Self> {
        let record = fixed_record(bytes, Self::size(width))?;
        let ptr = width.bytes();
        let string = UnicodeString::size(width);

        let mut reserved1 = [0u8; 16];
        reserved1.copy_from_slice(&record[..16]);
        let mut reserved2 = [0u64; 5];
        for (i, field) in reserved2.iter_mut().enumerate() {
            *field = decode_pointer(&record[16 + i * ptr..], width)?;
        }

        let strings = 16 + 5 * ptr;
        Ok(Self {
            reserved1,
            reserved2,
            current_directory_path: UnicodeString::from_bytes(&record[strings..], width)?,
            current_directory_handle: decode_pointer(&record[strings + string..], width)?,
            dll_path: UnicodeString::from_bytes(&record[strings + string + ptr..], width)?,
            image_path_name: UnicodeString::from_bytes(
                &record[strings + 2 * string + ptr..],
                width,
            )?,
            command_line: UnicodeString::from_bytes(&record[strings + 3 * string + ptr..], width)?,
        })
    }
}

#[cfg(windows)]
pub use native::{
    basic_information, current_pid, current_process, debug_port, image_file_name,
    query_information, wow64_information, Process, ProcessAccess,
};

#[cfg(windows)]
mod native {
    use super::*;
    use crate::handle::OwnedHandle;
    use crate::ntstatus::NtStatus;
    use tracing::trace;
    use windows::Wdk::System::Threading::{NtQueryInformationProcess, PROCESSINFOCLASS};
    use windows::Win32::Foundation::HANDLE;
    use windows::Win32::System::Threading::{
        OpenProcess, PROCESS_ACCESS_RIGHTS, PROCESS_QUERY_INFORMATION,
        PROCESS_QUERY_LIMITED_INFORMATION,
    };

    /// Queries `class` for the process behind `handle` into `buffer`.
    ///
    /// The buffer is given as 8-byte words because the kernel rejects
    /// misaligned output buffers. Returns the number of bytes written.
    ///
    /// The handle must carry `PROCESS_QUERY_INFORMATION` or
    /// `PROCESS_QUERY_LIMITED_INFORMATION` access.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NtStatus`] with the unmodified status code if the
    /// query fails, or [`Error::BufferTooLarge`] if the buffer length does
    /// not fit in a `u32`.
    pub fn query_information(
        handle: HANDLE,
        class: ProcessInfoClass,
        buffer: &mut [u64],
    ) -> Result<usize> {
        let len = native_len(std::mem::size_of_val(buffer))?;
        let mut returned = 0u32;

        // SAFETY: `buffer` is valid for writes of `len` bytes and aligned for
        // any record type. `returned` is a valid output parameter. An invalid
        // handle is reported through the status code.
        let status = unsafe {
            NtQueryInformationProcess(
                handle,
                PROCESSINFOCLASS(class.code() as i32),
                buffer.as_mut_ptr().cast(),
                len,
                &mut returned,
            )
        };
        NtStatus::check(status.0 as u32)?;

        trace!(?class, returned, "NtQueryInformationProcess");
        Ok(returned as usize)
    }

    /// Runs a query and returns the bytes the kernel wrote.
    fn query_bytes(handle: HANDLE, class: ProcessInfoClass, words: &mut [u64]) -> Result<Vec<u8>> {
        let written = query_information(handle, class, words)?;
        let mut bytes: Vec<u8> = words.iter().flat_map(|w| w.to_le_bytes()).collect();
        bytes.truncate(written);
        Ok(bytes)
    }

    /// Returns the basic information record of the process behind `handle`.
    pub fn basic_information(handle: HANDLE) -> Result<ProcessBasicInfo> {
        let mut words = [0u64; ProcessBasicInfo::FIELDS];
        let bytes = query_bytes(handle, ProcessInfoClass::Basic, &mut words)?;
        ProcessBasicInfo::from_bytes(&bytes, PointerWidth::NATIVE)
    }

    /// Returns the debug port of the process behind `handle`, zero when no
    /// debugger is attached.
    pub fn debug_port(handle: HANDLE) -> Result<u64> {
        let mut word = [0u64; 1];
        let bytes = query_bytes(handle, ProcessInfoClass::DebugPort, &mut word)?;
        decode_pointer(&bytes, PointerWidth::NATIVE)
    }

    /// Returns the WoW64 PEB address of the process behind `handle`, zero
    /// when it runs natively.
    pub fn wow64_information(handle: HANDLE) -> Result<u64> {
        let mut word = [0u64; 1];
        let bytes = query_bytes(handle, ProcessInfoClass::Wow64Information, &mut word)?;
        decode_pointer(&bytes, PointerWidth::NATIVE)
    }

    // Header plus the longest string a UNICODE_STRING can count.
    const IMAGE_NAME_WORDS: usize = (u16::MAX as usize + 1) / 8 + 2;

    /// Returns the image file name of the process behind `handle` in NT
    /// device form, for example `\Device\HarddiskVolume3\Windows\notepad.exe`.
    pub fn image_file_name(handle: HANDLE) -> Result<String> {
        let mut words = vec![0u64; IMAGE_NAME_WORDS];
        let base = words.as_ptr() as usize as u64;
        let bytes = query_bytes(handle, ProcessInfoClass::ImageFileName, &mut words)?;

        // The descriptor points into the buffer the kernel filled.
        let name = UnicodeString::from_bytes(&bytes, PointerWidth::NATIVE)?;
        name.decode(&bytes, base)
    }

    /// An open handle to a process, closed on drop.
    #[derive(Debug)]
    pub struct Process {
        handle: OwnedHandle,
        pid: u32,
    }

    impl Process {
        /// Opens an existing process by its process ID.
        ///
        /// # Errors
        ///
        /// Returns an error if the process doesn't exist or access is denied.
        pub fn open(pid: u32, access: ProcessAccess) -> Result<Self> {
            // SAFETY: OpenProcess accepts any pid and access mask and reports
            // failure through its result. We take ownership of the handle.
            let handle = unsafe { OpenProcess(access.0, false, pid)? };
            Ok(Self {
                handle: OwnedHandle::new(handle)?,
                pid,
            })
        }

        /// Returns the process ID.
        pub fn pid(&self) -> u32 {
            self.pid
        }

        /// Returns the raw process handle.
        pub fn handle(&self) -> HANDLE {
            self.handle.as_raw()
        }

        /// Returns the basic information record of this process.
        pub fn basic_information(&self) -> Result<ProcessBasicInfo> {
            basic_information(self.handle())
        }

        /// Returns the image file name of this process.
        pub fn image_file_name(&self) -> Result<String> {
            image_file_name(self.handle())
        }
    }

    /// Process access rights for opening existing processes.
    #[derive(Clone, Copy, Debug)]
    pub struct ProcessAccess(pub PROCESS_ACCESS_RIGHTS);

    impl ProcessAccess {
        /// Access to query process information.
        pub const QUERY: Self = Self(PROCESS_QUERY_INFORMATION);

        /// Access to the subset of information available to less privileged callers.
        pub const QUERY_LIMITED: Self = Self(PROCESS_QUERY_LIMITED_INFORMATION);
    }

    /// Gets the current process ID.
    #[inline]
    pub fn current_pid() -> u32 {
        // SAFETY: GetCurrentProcessId has no preconditions and cannot fail.
        unsafe { windows::Win32::System::Threading::GetCurrentProcessId() }
    }

    /// Gets a pseudo-handle to the current process.
    ///
    /// The pseudo-handle does not need to be closed and carries full access,
    /// so it can be passed to [`query_information`] directly.
    #[inline]
    pub fn current_process() -> HANDLE {
        // SAFETY: GetCurrentProcess has no preconditions and cannot fail.
        unsafe { windows::Win32::System::Threading::GetCurrentProcess() }
    }
}

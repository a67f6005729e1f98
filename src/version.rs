//! File version resources.
//!
//! A version resource (`VS_VERSIONINFO`) is an opaque blob returned by
//! `GetFileVersionInfoW`. Its values are located by sub-block path, for
//! example `\StringFileInfo\040904b0\ProductVersion`, through a lookup that
//! returns a pointer into the blob together with a length.
//!
//! [`VersionData`] owns the blob and never hands a lookup result to the
//! caller unchecked: every returned pointer is converted back to an offset
//! into the owned buffer and rejected with [`Error::InvalidAddress`] if the
//! value it describes does not lie entirely inside that buffer.
//!
//! The lookup itself is behind the [`SubBlockLookup`] trait. On Windows
//! [`NativeLookup`] calls `VerQueryValueW`; the `*_with` methods accept any
//! implementation.
//!
//! # Example
//!
//! ```no_run
//! # #[cfg(windows)]
//! # fn main() -> ergonomic_winsys::error::Result<()> {
//! use ergonomic_winsys::version::file_version_info;
//!
//! let data = file_version_info(r"C:\Windows\System32\kernel32.dll")?;
//! let fixed = data.fixed_file_info()?;
//! println!("File version: {}", fixed.file_version());
//! println!("Product: {}", data.query_value("ProductName")?);
//! # Ok(())
//! # }
//! # #[cfg(not(windows))]
//! # fn main() {}
//! ```

use crate::error::{Error, Result};
use crate::string::from_utf16_bytes;
use bitflags::bitflags;
use byteorder::{ByteOrder, LittleEndian};
use std::fmt;
use tracing::trace;

/// Size in bytes of a `VS_FIXEDFILEINFO` record.
pub const FIXED_FILE_INFO_SIZE: usize = 52;

/// Value of [`FixedFileInfo::signature`] in a well-formed record.
pub const FIXED_FILE_INFO_SIGNATURE: u32 = 0xFEEF_04BD;

/// Sub-block path of the root `VS_FIXEDFILEINFO` value.
pub const ROOT_BLOCK: &str = "\\";

/// Sub-block path of the language and code page list.
pub const TRANSLATION_BLOCK: &str = "\\VarFileInfo\\Translation";

bitflags! {
    /// File flags of a [`FixedFileInfo`] record (`VS_FF_*`).
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct FileFlags: u32 {
        /// The file contains debugging information.
        const DEBUG = 0x0000_0001;
        /// The file is a development version.
        const PRERELEASE = 0x0000_0002;
        /// The file has been modified and differs from the original shipping file.
        const PATCHED = 0x0000_0004;
        /// The file was not built using standard release procedures.
        const PRIVATEBUILD = 0x0000_0008;
        /// The version structure was created dynamically.
        const INFOINFERRED = 0x0000_0010;
        /// The file is a variation of the normal file of the same version.
        const SPECIALBUILD = 0x0000_0020;
    }
}

/// A four-part version number unpacked from a most/least significant pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct FileVersion {
    /// High word of the most significant half.
    pub major: u16,
    /// Low word of the most significant half.
    pub minor: u16,
    /// High word of the least significant half.
    pub build: u16,
    /// Low word of the least significant half.
    pub revision: u16,
}

impl FileVersion {
    /// Unpacks a version from its packed `MS` and `LS` halves.
    pub const fn from_parts(ms: u32, ls: u32) -> Self {
        Self {
            major: (ms >> 16) as u16,
            minor: (ms & 0xFFFF) as u16,
            build: (ls >> 16) as u16,
            revision: (ls & 0xFFFF) as u16,
        }
    }
}

impl fmt::Display for FileVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{}.{}.{}",
            self.major, self.minor, self.build, self.revision
        )
    }
}

/// Language and code page independent version information.
///
/// Equivalent of `VS_FIXEDFILEINFO`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FixedFileInfo {
    /// Always [`FIXED_FILE_INFO_SIGNATURE`] for a valid record.
    pub signature: u32,
    /// Binary version of the record.
    pub struct_version: u32,
    /// Most significant half of the file version.
    pub file_version_ms: u32,
    /// Least significant half of the file version.
    pub file_version_ls: u32,
    /// Most significant half of the product version.
    pub product_version_ms: u32,
    /// Least significant half of the product version.
    pub product_version_ls: u32,
    /// Bits of `file_flags` that are valid.
    pub file_flags_mask: u32,
    /// Raw `VS_FF_*` flags.
    pub file_flags: u32,
    /// Operating system the file was designed for (`VOS_*`).
    pub file_os: u32,
    /// General type of the file (`VFT_*`).
    pub file_type: u32,
    /// Function of the file (`VFT2_*`), meaningful for drivers and fonts.
    pub file_subtype: u32,
    /// Most significant half of the file's creation timestamp.
    pub file_date_ms: u32,
    /// Least significant half of the file's creation timestamp.
    pub file_date_ls: u32,
}

impl FixedFileInfo {
    /// Decodes a record from exactly [`FIXED_FILE_INFO_SIZE`] little-endian bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != FIXED_FILE_INFO_SIZE {
            return Err(Error::size_mismatch(FIXED_FILE_INFO_SIZE, bytes.len()));
        }

        let mut fields = [0u32; FIXED_FILE_INFO_SIZE / 4];
        LittleEndian::read_u32_into(bytes, &mut fields);
        let [
            signature,
            struct_version,
            file_version_ms,
            file_version_ls,
            product_version_ms,
            product_version_ls,
            file_flags_mask,
            file_flags,
            file_os,
            file_type,
            file_subtype,
            file_date_ms,
            file_date_ls,
        ] = fields;

        Ok(Self {
            signature,
            struct_version,
            file_version_ms,
            file_version_ls,
            product_version_ms,
            product_version_ls,
            file_flags_mask,
            file_flags,
            file_os,
            file_type,
            file_subtype,
            file_date_ms,
            file_date_ls,
        })
    }

    /// Returns true if the record carries the expected signature.
    pub fn has_valid_signature(&self) -> bool {
        self.signature == FIXED_FILE_INFO_SIGNATURE
    }

    /// Returns the product version as `major.minor.build.revision`.
    pub fn product_version(&self) -> String {
        self.product_version_parts().to_string()
    }

    /// Returns the file version as `major.minor.build.revision`.
    pub fn file_version(&self) -> String {
        self.file_version_parts().to_string()
    }

    /// Returns the unpacked product version.
    pub fn product_version_parts(&self) -> FileVersion {
        FileVersion::from_parts(self.product_version_ms, self.product_version_ls)
    }

    /// Returns the unpacked file version.
    pub fn file_version_parts(&self) -> FileVersion {
        FileVersion::from_parts(self.file_version_ms, self.file_version_ls)
    }

    /// Returns the flags that are both set and marked valid by the mask.
    pub fn flags(&self) -> FileFlags {
        FileFlags::from_bits_retain(self.file_flags & self.file_flags_mask)
    }

    /// Returns the 64-bit file timestamp, zero when the file is undated.
    pub fn file_date(&self) -> u64 {
        (u64::from(self.file_date_ms) << 32) | u64::from(self.file_date_ls)
    }
}

/// A language and code page pair identifying a string table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LanguageCodePage {
    /// Language identifier, e.g. `0x0409` for U.S. English.
    pub language: u16,
    /// Code page identifier, e.g. `0x04B0` for Unicode.
    pub code_page: u16,
}

impl LanguageCodePage {
    /// Returns the path of `key` inside this pair's string table.
    pub fn sub_block(&self, key: &str) -> String {
        format!(
            "\\StringFileInfo\\{:04x}{:04x}\\{}",
            self.language, self.code_page, key
        )
    }
}

/// The result of a sub-block lookup: where a value starts and how long it is.
///
/// `len` is in bytes for binary values and in UTF-16 code units for string
/// values. `ptr` is untrusted until resolved by [`VersionData::span`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubBlock {
    /// Address of the first byte of the value.
    pub ptr: *const u8,
    /// Length of the value.
    pub len: u32,
}

/// Locates a sub-block inside a version resource.
pub trait SubBlockLookup {
    /// Looks up `sub_block` inside `block`.
    ///
    /// Implementations report a missing sub-block as an error. The returned
    /// pointer is expected, but not trusted, to point into `block`.
    fn lookup(&self, block: &[u8], sub_block: &str) -> Result<SubBlock>;
}

impl<L: SubBlockLookup + ?Sized> SubBlockLookup for &L {
    fn lookup(&self, block: &[u8], sub_block: &str) -> Result<SubBlock> {
        (**self).lookup(block, sub_block)
    }
}

/// A version resource buffer as returned by `GetFileVersionInfoW`.
///
/// The buffer is never modified after creation; all queries are read-only
/// projections over it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VersionData {
    data: Vec<u8>,
}

impl VersionData {
    /// Wraps an existing version resource buffer.
    pub fn from_bytes(data: Vec<u8>) -> Self {
        Self { data }
    }

    /// Returns the raw buffer.
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Returns the buffer length in bytes.
    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns true if the buffer is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Resolves a lookup pointer to the `len` bytes it describes.
    ///
    /// The offset of `ptr` from the start of the buffer must satisfy
    /// `0 < offset <= N - 1` and `offset + len` must not exceed `N`.
    /// Anything else is an [`Error::InvalidAddress`].
    pub fn span(&self, ptr: *const u8, len: usize) -> Result<&[u8]> {
        let base = self.data.as_ptr() as usize;
        let offset = (ptr as usize)
            .checked_sub(base)
            .ok_or(Error::InvalidAddress)?;

        // Offset zero is the VS_VERSIONINFO header itself, never a value.
        if offset == 0 || offset >= self.data.len() {
            return Err(Error::InvalidAddress);
        }

        let end = offset.checked_add(len).ok_or(Error::InvalidAddress)?;
        self.data.get(offset..end).ok_or(Error::InvalidAddress)
    }

    /// Returns the root `VS_FIXEDFILEINFO` record using `lookup`.
    ///
    /// Fails with [`Error::UninitializedBuffer`] on an empty buffer without
    /// calling `lookup`.
    pub fn fixed_file_info_with<L: SubBlockLookup>(&self, lookup: L) -> Result<FixedFileInfo> {
        if self.is_empty() {
            return Err(Error::UninitializedBuffer);
        }

        let block = lookup
            .lookup(&self.data, ROOT_BLOCK)
            .map_err(|e| Error::native("VerQueryValue", e))?;
        trace!(len = block.len, "root block");

        let len = block.len as usize;
        if len != FIXED_FILE_INFO_SIZE {
            return Err(Error::size_mismatch(FIXED_FILE_INFO_SIZE, len));
        }

        FixedFileInfo::from_bytes(self.span(block.ptr, len)?)
    }

    /// Returns every language and code page pair listed by the resource.
    ///
    /// Fails with [`Error::NoLanguages`] if the translation block is missing
    /// or empty.
    pub fn translations_with<L: SubBlockLookup>(
        &self,
        lookup: L,
    ) -> Result<Vec<LanguageCodePage>> {
        if self.is_empty() {
            return Err(Error::UninitializedBuffer);
        }

        let block = lookup
            .lookup(&self.data, TRANSLATION_BLOCK)
            .map_err(|e| Error::NoLanguages(Some(Box::new(e))))?;
        if block.len == 0 {
            return Err(Error::NoLanguages(None));
        }

        let bytes = self.span(block.ptr, block.len as usize)?;
        let translations: Vec<_> = bytes
            .chunks_exact(4)
            .map(|pair| LanguageCodePage {
                language: LittleEndian::read_u16(&pair[..2]),
                code_page: LittleEndian::read_u16(&pair[2..]),
            })
            .collect();
        trace!(count = translations.len(), "translations");

        if translations.is_empty() {
            return Err(Error::NoLanguages(None));
        }
        Ok(translations)
    }

    /// Queries a string value from the first string table listed by the resource.
    ///
    /// Accepted keys include `CompanyName`, `FileDescription`, `FileVersion`,
    /// `InternalName`, `LegalCopyright`, `OriginalFilename`, `ProductName` and
    /// `ProductVersion`.
    pub fn query_value_with<L: SubBlockLookup>(&self, lookup: L, key: &str) -> Result<String> {
        let translations = self.translations_with(&lookup)?;
        self.query_value_for_with(lookup, key, translations[0])
    }

    /// Queries a string value from the string table of `translation`.
    pub fn query_value_for_with<L: SubBlockLookup>(
        &self,
        lookup: L,
        key: &str,
        translation: LanguageCodePage,
    ) -> Result<String> {
        if self.is_empty() {
            return Err(Error::UninitializedBuffer);
        }

        let sub_block = translation.sub_block(key);
        let block = match lookup.lookup(&self.data, &sub_block) {
            Ok(block) => block,
            Err(e) => {
                return Err(Error::QueryFailed {
                    sub_block,
                    source: Box::new(e),
                })
            }
        };
        trace!(sub_block = %sub_block, len = block.len, "string value");

        let bytes = self.span(block.ptr, (block.len as usize).saturating_mul(2))?;
        from_utf16_bytes(bytes).map_err(|e| Error::Decode(Box::new(e)))
    }
}

impl From<Vec<u8>> for VersionData {
    fn from(data: Vec<u8>) -> Self {
        Self::from_bytes(data)
    }
}

impl AsRef<[u8]> for VersionData {
    fn as_ref(&self) -> &[u8] {
        &self.data
    }
}

#[cfg(windows)]
pub use native::{file_version_info, NativeLookup};

#[cfg(windows)]
mod native {
    use super::*;
    use crate::error::last_error;
    use crate::string::WideString;
    use std::ffi::c_void;
    use std::path::Path;
    use tracing::debug;
    use windows::Win32::Storage::FileSystem::{
        GetFileVersionInfoSizeW, GetFileVersionInfoW, VerQueryValueW,
    };

    /// Sub-block lookup backed by `VerQueryValueW`.
    ///
    /// Only use it on buffers filled by [`file_version_info`]; the OS walks
    /// the resource tree without knowing the buffer length.
    #[derive(Debug, Clone, Copy, Default)]
    pub struct NativeLookup;

    impl SubBlockLookup for NativeLookup {
        fn lookup(&self, block: &[u8], sub_block: &str) -> Result<SubBlock> {
            if block.is_empty() {
                return Err(Error::UninitializedBuffer);
            }

            let key = WideString::new(sub_block);
            let mut ptr: *mut c_void = std::ptr::null_mut();
            let mut len = 0u32;

            // SAFETY: `block` is a live version resource buffer and `key` is a
            // null-terminated string; both outlive the call. The output
            // parameters are valid for writes.
            let found =
                unsafe { VerQueryValueW(block.as_ptr().cast(), key.as_pcwstr(), &mut ptr, &mut len) };

            if !found.as_bool() || ptr.is_null() {
                return Err(Error::not_found(sub_block));
            }

            Ok(SubBlock {
                ptr: ptr.cast_const().cast(),
                len,
            })
        }
    }

    impl VersionData {
        /// Returns the root `VS_FIXEDFILEINFO` record.
        pub fn fixed_file_info(&self) -> Result<FixedFileInfo> {
            self.fixed_file_info_with(NativeLookup)
        }

        /// Returns every language and code page pair listed by the resource.
        pub fn translations(&self) -> Result<Vec<LanguageCodePage>> {
            self.translations_with(NativeLookup)
        }

        /// Queries a string value using the first language and code page in
        /// the resource.
        pub fn query_value(&self, key: &str) -> Result<String> {
            self.query_value_with(NativeLookup, key)
        }

        /// Queries a string value from the string table of `translation`.
        pub fn query_value_for(&self, key: &str, translation: LanguageCodePage) -> Result<String> {
            self.query_value_for_with(NativeLookup, key, translation)
        }
    }

    /// Retrieves the version resource of the file at `path`.
    ///
    /// # Errors
    ///
    /// Returns an error wrapping `GetFileVersionInfoSize` if the file does
    /// not exist or has no version resource.
    pub fn file_version_info(path: impl AsRef<Path>) -> Result<VersionData> {
        let path = path.as_ref();
        let wide = WideString::from_path(path);

        // SAFETY: `wide` is a null-terminated path that outlives the call.
        let size = unsafe { GetFileVersionInfoSizeW(wide.as_pcwstr(), None) };
        if size == 0 {
            return Err(Error::native("GetFileVersionInfoSize", last_error()));
        }

        let mut data = vec![0u8; size as usize];
        // SAFETY: `data` is a writable buffer of exactly `size` bytes.
        unsafe { GetFileVersionInfoW(wide.as_pcwstr(), 0, size, data.as_mut_ptr().cast()) }
            .map_err(|e| Error::native("GetFileVersionInfo", e))?;

        debug!(path = %path.display(), size, "loaded version resource");
        Ok(VersionData::from_bytes(data))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::collections::HashMap;

    const FIXED_OFFSET: usize = 40;
    const TRANSLATION_OFFSET: usize = FIXED_OFFSET + FIXED_FILE_INFO_SIZE;
    const STRING_OFFSET: usize = TRANSLATION_OFFSET + 4;

    /// Resolves sub-blocks from a table of (offset, len) pairs.
    #[derive(Default)]
    struct TableLookup {
        entries: HashMap<String, (usize, u32)>,
        calls: Cell<usize>,
    }

    impl TableLookup {
        fn with(mut self, sub_block: &str, offset: usize, len: u32) -> Self {
            self.entries.insert(sub_block.to_string(), (offset, len));
            self
        }
    }

    impl SubBlockLookup for TableLookup {
        fn lookup(&self, block: &[u8], sub_block: &str) -> Result<SubBlock> {
            self.calls.set(self.calls.get() + 1);
            let &(offset, len) = self
                .entries
                .get(sub_block)
                .ok_or_else(|| Error::not_found(sub_block))?;
            Ok(SubBlock {
                ptr: block.as_ptr().wrapping_add(offset),
                len,
            })
        }
    }

    /// Returns a pointer below the start of the block.
    struct BeforeBufferLookup;

    impl SubBlockLookup for BeforeBufferLookup {
        fn lookup(&self, block: &[u8], _sub_block: &str) -> Result<SubBlock> {
            Ok(SubBlock {
                ptr: block.as_ptr().wrapping_sub(8),
                len: 4,
            })
        }
    }

    fn utf16(s: &str) -> Vec<u8> {
        s.encode_utf16().flat_map(u16::to_le_bytes).collect()
    }

    fn fixed_bytes() -> Vec<u8> {
        let fields: [u32; 13] = [
            FIXED_FILE_INFO_SIGNATURE,
            0x0001_0000,
            0x000A_0000,
            0x4A61_0001,
            0x0001_0002,
            0x0003_0004,
            0x3F,
            0x0000_0003,
            0x0004_0004,
            1,
            0,
            0,
            0,
        ];
        fields.iter().flat_map(|f| f.to_le_bytes()).collect()
    }

    /// Builds a synthetic resource holding a fixed record, one translation
    /// (0409/04b0) and the string "1.2.3.4".
    fn sample() -> (VersionData, TableLookup) {
        let mut data = vec![0u8; FIXED_OFFSET];
        data.extend(fixed_bytes());
        data.extend([0x09, 0x04, 0xB0, 0x04]);
        data.extend(utf16("1.2.3.4\0"));
        data.resize(data.len() + 8, 0);

        let lookup = TableLookup::default()
            .with(ROOT_BLOCK, FIXED_OFFSET, FIXED_FILE_INFO_SIZE as u32)
            .with(TRANSLATION_BLOCK, TRANSLATION_OFFSET, 4)
            .with(
                "\\StringFileInfo\\040904b0\\ProductVersion",
                STRING_OFFSET,
                8,
            );
        (VersionData::from_bytes(data), lookup)
    }

    #[test]
    fn test_product_version_format() {
        let info = FixedFileInfo {
            product_version_ms: 0x0001_0002,
            product_version_ls: 0x0003_0004,
            ..Default::default()
        };
        assert_eq!(info.product_version(), "1.2.3.4");
    }

    #[test]
    fn test_file_version_format() {
        let info = FixedFileInfo {
            file_version_ms: 0x000A_0000,
            file_version_ls: 0x4A61_0001,
            ..Default::default()
        };
        assert_eq!(info.file_version(), "10.0.19041.1");
        assert_eq!(
            info.file_version_parts(),
            FileVersion {
                major: 10,
                minor: 0,
                build: 19041,
                revision: 1
            }
        );
    }

    #[test]
    fn test_fixed_file_info_decode() {
        let info = FixedFileInfo::from_bytes(&fixed_bytes()).unwrap();
        assert!(info.has_valid_signature());
        assert_eq!(info.struct_version, 0x0001_0000);
        assert_eq!(info.file_os, 0x0004_0004);
        assert_eq!(info.file_type, 1);
        assert_eq!(info.flags(), FileFlags::DEBUG | FileFlags::PRERELEASE);
        assert_eq!(info.file_date(), 0);
    }

    #[test]
    fn test_fixed_file_info_wrong_size() {
        let err = FixedFileInfo::from_bytes(&fixed_bytes()[..48]).unwrap_err();
        assert!(matches!(
            err,
            Error::SizeMismatch {
                expected: 52,
                actual: 48
            }
        ));
    }

    #[test]
    fn test_flags_respect_mask() {
        let info = FixedFileInfo {
            file_flags: 0x0000_0021,
            file_flags_mask: 0x0000_0001,
            ..Default::default()
        };
        assert_eq!(info.flags(), FileFlags::DEBUG);
    }

    #[test]
    fn test_flags_debug_names() {
        let flags = FileFlags::DEBUG | FileFlags::PRERELEASE;
        assert_eq!(format!("{flags:?}"), "FileFlags(DEBUG | PRERELEASE)");
        assert_eq!(format!("{:?}", FileFlags::empty()), "FileFlags(0x0)");
    }

    #[test]
    fn test_fixed_file_info_via_lookup() {
        let (data, lookup) = sample();
        let info = data.fixed_file_info_with(&lookup).unwrap();
        assert_eq!(info.product_version(), "1.2.3.4");
        assert_eq!(info.file_version(), "10.0.19041.1");
    }

    #[test]
    fn test_fixed_file_info_empty_buffer_skips_lookup() {
        let lookup = TableLookup::default();
        let err = VersionData::default()
            .fixed_file_info_with(&lookup)
            .unwrap_err();
        assert!(matches!(err, Error::UninitializedBuffer));
        assert_eq!(lookup.calls.get(), 0);
    }

    #[test]
    fn test_fixed_file_info_missing_root() {
        let data = VersionData::from_bytes(vec![0u8; 128]);
        let err = data.fixed_file_info_with(TableLookup::default()).unwrap_err();
        assert!(matches!(err, Error::Native { call: "VerQueryValue", .. }));
    }

    #[test]
    fn test_fixed_file_info_size_mismatch() {
        let (data, _) = sample();
        let lookup = TableLookup::default().with(ROOT_BLOCK, FIXED_OFFSET, 40);
        let err = data.fixed_file_info_with(&lookup).unwrap_err();
        assert!(matches!(err, Error::SizeMismatch { actual: 40, .. }));
    }

    #[test]
    fn test_fixed_file_info_past_end() {
        let (data, _) = sample();
        let lookup = TableLookup::default().with(
            ROOT_BLOCK,
            data.len() - 10,
            FIXED_FILE_INFO_SIZE as u32,
        );
        let err = data.fixed_file_info_with(&lookup).unwrap_err();
        assert!(matches!(err, Error::InvalidAddress));
    }

    #[test]
    fn test_query_value() {
        let (data, lookup) = sample();
        assert_eq!(
            data.query_value_with(&lookup, "ProductVersion").unwrap(),
            "1.2.3.4"
        );
    }

    #[test]
    fn test_translations() {
        let (data, lookup) = sample();
        let translations = data.translations_with(&lookup).unwrap();
        assert_eq!(
            translations,
            vec![LanguageCodePage {
                language: 0x0409,
                code_page: 0x04B0
            }]
        );
        assert_eq!(
            translations[0].sub_block("FileVersion"),
            "\\StringFileInfo\\040904b0\\FileVersion"
        );
    }

    #[test]
    fn test_query_value_without_translation() {
        let (data, _) = sample();
        let lookup = TableLookup::default().with(ROOT_BLOCK, FIXED_OFFSET, 52);
        let err = data.query_value_with(&lookup, "ProductVersion").unwrap_err();
        assert!(matches!(err, Error::NoLanguages(Some(_))));
        assert_eq!(err.to_string(), "failed to get list of languages");
    }

    #[test]
    fn test_query_value_empty_translation() {
        let (data, _) = sample();
        let lookup = TableLookup::default().with(TRANSLATION_BLOCK, TRANSLATION_OFFSET, 0);
        let err = data.query_value_with(&lookup, "ProductVersion").unwrap_err();
        assert!(matches!(err, Error::NoLanguages(None)));
    }

    #[test]
    fn test_query_value_missing_key() {
        let (data, lookup) = sample();
        let err = data.query_value_with(&lookup, "CompanyName").unwrap_err();
        match err {
            Error::QueryFailed { sub_block, .. } => {
                assert_eq!(sub_block, "\\StringFileInfo\\040904b0\\CompanyName");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_query_value_offset_at_end() {
        let (data, lookup) = sample();
        let n = data.len();
        let lookup = lookup.with("\\StringFileInfo\\040904b0\\ProductVersion", n, 1);
        let err = data.query_value_with(&lookup, "ProductVersion").unwrap_err();
        assert!(matches!(err, Error::InvalidAddress));
    }

    #[test]
    fn test_query_value_offset_far_beyond() {
        let (data, lookup) = sample();
        let lookup = lookup.with("\\StringFileInfo\\040904b0\\ProductVersion", 1 << 20, 8);
        let err = data.query_value_with(&lookup, "ProductVersion").unwrap_err();
        assert!(matches!(err, Error::InvalidAddress));
    }

    #[test]
    fn test_query_value_offset_zero_rejected() {
        let (data, lookup) = sample();
        let lookup = lookup.with("\\StringFileInfo\\040904b0\\ProductVersion", 0, 1);
        let err = data.query_value_with(&lookup, "ProductVersion").unwrap_err();
        assert!(matches!(err, Error::InvalidAddress));
    }

    #[test]
    fn test_query_value_span_overruns_buffer() {
        let (data, lookup) = sample();
        let n = data.len();
        // Starts inside the buffer, but 8 code units run past the end.
        let lookup = lookup.with("\\StringFileInfo\\040904b0\\ProductVersion", n - 2, 8);
        let err = data.query_value_with(&lookup, "ProductVersion").unwrap_err();
        assert!(matches!(err, Error::InvalidAddress));
    }

    #[test]
    fn test_query_value_before_buffer() {
        let (data, _) = sample();
        let err = data
            .query_value_with(BeforeBufferLookup, "ProductVersion")
            .unwrap_err();
        assert!(matches!(err, Error::InvalidAddress));
    }

    #[test]
    fn test_query_value_decode_error() {
        let mut bytes = vec![0u8; 64];
        bytes[4..8].copy_from_slice(&[0x09, 0x04, 0xB0, 0x04]);
        // Lone low surrogate.
        bytes[8..10].copy_from_slice(&[0x00, 0xDC]);
        let data = VersionData::from_bytes(bytes);
        let lookup = TableLookup::default()
            .with(TRANSLATION_BLOCK, 4, 4)
            .with("\\StringFileInfo\\040904b0\\Comments", 8, 1);

        let err = data.query_value_with(&lookup, "Comments").unwrap_err();
        assert!(matches!(err, Error::Decode(_)));
        assert!(err.to_string().starts_with("failed to decode UTF16 data"));
    }

    #[test]
    fn test_query_value_for_second_translation() {
        let mut bytes = vec![0u8; 8];
        bytes.extend([0x09, 0x04, 0xB0, 0x04, 0x07, 0x04, 0xE4, 0x04]);
        let string_offset = bytes.len();
        bytes.extend(utf16("Beispiel\0"));
        let data = VersionData::from_bytes(bytes);
        let lookup = TableLookup::default()
            .with(TRANSLATION_BLOCK, 8, 8)
            .with("\\StringFileInfo\\040704e4\\ProductName", string_offset, 9);

        let translations = data.translations_with(&lookup).unwrap();
        assert_eq!(translations.len(), 2);
        assert_eq!(
            data.query_value_for_with(&lookup, "ProductName", translations[1])
                .unwrap(),
            "Beispiel"
        );
    }

    #[test]
    fn test_span_bounds() {
        let data = VersionData::from_bytes(vec![7u8; 16]);
        let base = data.as_bytes().as_ptr();
        assert_eq!(data.span(base.wrapping_add(15), 1).unwrap(), &[7u8]);
        assert!(data.span(base.wrapping_add(15), 2).is_err());
        assert!(data.span(base, 1).is_err());
        assert!(data.span(base.wrapping_add(16), 0).is_err());
        assert!(data.span(std::ptr::null(), 1).is_err());
    }

    #[cfg(windows)]
    mod native {
        use super::super::*;

        fn kernel32() -> std::path::PathBuf {
            let root = std::env::var("SystemRoot").unwrap_or_else(|_| r"C:\Windows".into());
            std::path::Path::new(&root).join(r"System32\kernel32.dll")
        }

        #[test]
        fn test_kernel32_fixed_file_info() {
            let data = file_version_info(kernel32()).unwrap();
            let info = data.fixed_file_info().unwrap();
            assert!(info.has_valid_signature());
            assert!(info.file_version_parts().major >= 6);
        }

        #[test]
        fn test_kernel32_query_value() {
            let data = file_version_info(kernel32()).unwrap();
            let version = data.query_value("ProductVersion").unwrap();
            assert!(!version.is_empty());
            let name = data.query_value("OriginalFilename").unwrap();
            assert!(name.to_lowercase().contains("kernel32"));
        }

        #[test]
        fn test_file_without_version_resource() {
            let file = tempfile::NamedTempFile::new().unwrap();
            std::fs::write(file.path(), b"no resources here").unwrap();
            let err = file_version_info(file.path()).unwrap_err();
            assert!(matches!(
                err,
                Error::Native {
                    call: "GetFileVersionInfoSize",
                    ..
                }
            ));
            assert!(err.to_string().starts_with("GetFileVersionInfoSize failed"));
        }
    }
}

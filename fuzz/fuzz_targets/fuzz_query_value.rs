//! Fuzz target for version-resource queries with hostile lookups.
//!
//! The lookup returns attacker-chosen offsets and lengths, including ones
//! before, at, and past the end of the buffer. Queries must either succeed
//! with a value read from inside the buffer or fail; they must never panic
//! or read out of bounds.

#![no_main]

use arbitrary::Arbitrary;
use ergonomic_winsys::error::{Error, Result};
use ergonomic_winsys::version::{SubBlock, SubBlockLookup, VersionData, ROOT_BLOCK, TRANSLATION_BLOCK};
use libfuzzer_sys::fuzz_target;

#[derive(Arbitrary, Debug)]
struct Placement {
    offset: isize,
    len: u32,
}

#[derive(Arbitrary, Debug)]
struct Input {
    buffer: Vec<u8>,
    root: Option<Placement>,
    translation: Option<Placement>,
    value: Option<Placement>,
}

struct HostileLookup<'a>(&'a Input);

impl SubBlockLookup for HostileLookup<'_> {
    fn lookup(&self, block: &[u8], sub_block: &str) -> Result<SubBlock> {
        let placement = match sub_block {
            ROOT_BLOCK => &self.0.root,
            TRANSLATION_BLOCK => &self.0.translation,
            _ => &self.0.value,
        };
        let placement = placement
            .as_ref()
            .ok_or_else(|| Error::not_found(sub_block))?;
        Ok(SubBlock {
            ptr: block.as_ptr().wrapping_offset(placement.offset),
            len: placement.len,
        })
    }
}

fuzz_target!(|input: Input| {
    if input.buffer.len() > 65_536 {
        return;
    }

    let data = VersionData::from_bytes(input.buffer.clone());
    let lookup = HostileLookup(&input);

    if let Ok(info) = data.fixed_file_info_with(&lookup) {
        let _ = info.product_version();
    }

    if let Ok(value) = data.query_value_with(&lookup, "ProductVersion") {
        assert!(value.encode_utf16().count() * 2 <= data.len());
    }
});

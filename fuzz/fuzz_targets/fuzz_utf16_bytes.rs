//! Fuzz target for from_utf16_bytes with arbitrary byte spans.
//!
//! Decoding must never panic, must reject odd lengths, and must agree with
//! the UTF-16 slice decoder.

#![no_main]

use ergonomic_winsys::error::Error;
use ergonomic_winsys::string::{from_utf16_bytes, from_utf16_bytes_with_offset, from_wide};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if data.len() > 100_000 {
        return;
    }

    let result = from_utf16_bytes(data);

    if data.len() % 2 != 0 {
        assert!(matches!(result, Err(Error::OddLength(_))));
        return;
    }

    let units: Vec<u16> = data
        .chunks_exact(2)
        .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
        .collect();
    assert_eq!(result.is_ok(), from_wide(&units).is_ok());

    if let Ok((s, Some(next))) = from_utf16_bytes_with_offset(data) {
        // The offset is just past a terminator and inside the span.
        assert!(next >= 2 && next < data.len());
        assert_eq!(&data[next - 2..next], &[0, 0]);
        assert_eq!(s.encode_utf16().count() * 2, next - 2);
    }
});

//! Link addressing: fixed-width little-endian integers with an
//! all-ones `terminal` sentinel.
//!
//! A production build of this engine (see "Template specialization
//! over many tables" in the original design notes) would parametrize
//! record/key/link width at compile time. Rust has no zero-cost
//! generics over an arbitrary integer byte count here without const
//! generics gymnastics that would obscure the fixed table catalog, so
//! width is carried as a runtime value on the table descriptor
//! (`tables::schema::Descriptor`) and every link is widened to `u64`
//! in memory. The one-indirection cost is paid once per element
//! access, which is already mediated by a mapped-pointer computation.

/// In-memory representation of a Link. The meaningful bits are the
/// low `width * 8`; callers must not compare two `LinkValue`s encoded
/// with different widths.
pub type LinkValue = u64;

/// Maximum link width this engine supports (bytes). The catalog only
/// ever uses 4 and 5, but the primitive is not hard-coded to those.
pub const MAX_LINK_WIDTH: usize = 6;

/// The all-ones sentinel for a link of the given byte width.
#[must_use]
pub fn terminal(width: usize) -> LinkValue {
    debug_assert!(width >= 1 && width <= MAX_LINK_WIDTH);
    if width >= 8 {
        u64::MAX
    } else {
        (1u64 << (width * 8)) - 1
    }
}

/// True if `value` is the terminal sentinel for `width`.
#[must_use]
pub fn is_terminal(value: LinkValue, width: usize) -> bool {
    value == terminal(width)
}

/// Reads a little-endian link of `width` bytes from the front of `bytes`.
///
/// # Panics
///
/// Panics if `bytes` is shorter than `width`.
#[must_use]
pub fn read_le(bytes: &[u8], width: usize) -> LinkValue {
    assert!(bytes.len() >= width, "link read out of bounds");
    let mut buf = [0u8; 8];
    buf[..width].copy_from_slice(&bytes[..width]);
    u64::from_le_bytes(buf)
}

/// Writes `value` as a little-endian link of `width` bytes into the
/// front of `out`.
///
/// # Panics
///
/// Panics if `out` is shorter than `width`, or if `value` does not fit
/// in `width` bytes (and isn't the terminal sentinel).
pub fn write_le(value: LinkValue, width: usize, out: &mut [u8]) {
    assert!(out.len() >= width, "link write out of bounds");
    let bytes = value.to_le_bytes();
    out[..width].copy_from_slice(&bytes[..width]);
}

/// Returns `Err(Error::Eof)` if `value` cannot be represented in
/// `width` bytes without colliding with the terminal sentinel.
pub fn checked(value: LinkValue, width: usize) -> crate::error::Result<LinkValue> {
    if value >= terminal(width) {
        Err(crate::error::Error::Eof)
    } else {
        Ok(value)
    }
}

#[cfg(test)]
mod link_tests {
    use super::*;

    #[test]
    fn terminal_is_all_ones_for_width() {
        assert_eq!(terminal(4), 0xFFFF_FFFF);
        assert_eq!(terminal(5), 0xFF_FFFF_FFFF);
    }

    #[test]
    fn round_trips_le_bytes() {
        let mut buf = [0u8; 5];
        write_le(0x0102_0304, 5, &mut buf);
        assert_eq!(buf, [0x04, 0x03, 0x02, 0x01, 0x00]);
        assert_eq!(read_le(&buf, 5), 0x0102_0304);
    }

    #[test]
    fn checked_rejects_overflow() {
        assert!(checked(terminal(4) - 1, 4).is_ok());
        assert!(checked(terminal(4), 4).is_err());
    }
}

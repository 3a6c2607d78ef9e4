//! Property-based checks for link encoding (`chainstore::link`).
//!
//! Widths 4 and 5 are the only ones the table catalog actually uses
//! (`tables::schema::INDEX_LINK_WIDTH` / `ARCHIVE_LINK_WIDTH`), so those
//! are the two exercised here rather than the full `1..=MAX_LINK_WIDTH`
//! range.

use chainstore::link;
use proptest::prelude::{prop_assert, prop_assert_eq, proptest};

proptest! {
    #[test]
    fn round_trips_through_le_bytes_for_width_4(value in 0u64..link::terminal(4)) {
        let mut buf = [0u8; 4];
        link::write_le(value, 4, &mut buf);
        prop_assert_eq!(link::read_le(&buf, 4), value);
        prop_assert!(!link::is_terminal(value, 4));
    }

    #[test]
    fn round_trips_through_le_bytes_for_width_5(value in 0u64..link::terminal(5)) {
        let mut buf = [0u8; 5];
        link::write_le(value, 5, &mut buf);
        prop_assert_eq!(link::read_le(&buf, 5), value);
        prop_assert!(!link::is_terminal(value, 5));
    }

    #[test]
    fn checked_accepts_exactly_the_non_terminal_range(value in 0u64..=0xFFFF_FFFFu64) {
        let result = link::checked(value, 4);
        if value >= link::terminal(4) {
            prop_assert!(result.is_err());
        } else {
            prop_assert_eq!(result.unwrap(), value);
        }
    }
}

//! Scenario 1 (spec.md §8): hashmap round-trip with a slab-shaped
//! payload, mirroring an `input` table entry (parent tx link, output
//! index, sequence, empty script/witness lengths).

use chainstore::primitives::{Arraymap, Hashmap};
use chainstore::storage::{Body, Head};

/// Layout: `[parent: u32][index: u32][seq: u32][script_len: u32][witness_len: u32]`
/// — 20 bytes, encoding an input whose script and witness are both
/// empty (their bytes, if present, would live in a sibling slab table
/// addressed by a link elsewhere; the hashmap payload itself only
/// carries the fixed-width fields and their lengths).
fn encode_input_payload(parent: u32, index: u32, seq: u32) -> Vec<u8> {
    let mut buf = vec![0u8; 20];
    buf[0..4].copy_from_slice(&parent.to_le_bytes());
    buf[4..8].copy_from_slice(&index.to_le_bytes());
    buf[8..12].copy_from_slice(&seq.to_le_bytes());
    buf[12..16].copy_from_slice(&0u32.to_le_bytes()); // script_len
    buf[16..20].copy_from_slice(&0u32.to_le_bytes()); // witness_len
    buf
}

#[test]
fn put_then_get_returns_byte_identical_element() {
    let dir = tempfile::tempdir().unwrap();
    let mut head = Head::create(dir.path().join("input.head"), 20, 4).unwrap();
    let body = Body::create(dir.path().join("input.body"), 64, 50).unwrap();
    let map = Hashmap::new(4, 7, 20);

    let key: &[u8; 7] = b"1234567";
    let payload = encode_input_payload(0x5634_1201, 0, 0x5634_1202);

    let link = map.allocate(&body).unwrap();
    map.commit(&mut head, &body, link, key, &payload).unwrap();

    assert!(map.exists(&head, &body, key).unwrap());
    let found = map.first(&head, &body, key).unwrap().unwrap();
    assert_eq!(found, link);

    let offset = map.payload_offset();
    let size = map.payload_size();
    let record = map.payload(&body, link).unwrap();
    let readback = &record.as_slice(offset + size)[offset..];
    assert_eq!(readback, payload.as_slice());

    assert_eq!(
        u32::from_le_bytes(readback[0..4].try_into().unwrap()),
        0x5634_1201
    );
    assert_eq!(
        u32::from_le_bytes(readback[8..12].try_into().unwrap()),
        0x5634_1202
    );
}

#[test]
fn bucket_selection_is_consistent_for_repeated_lookups() {
    let dir = tempfile::tempdir().unwrap();
    let mut head = Head::create(dir.path().join("h.head"), 20, 4).unwrap();
    let body = Body::create(dir.path().join("h.body"), 64, 50).unwrap();
    let map = Hashmap::new(4, 7, 20);

    let key = b"7654321";
    let link = map.allocate(&body).unwrap();
    map.commit(&mut head, &body, link, key, &encode_input_payload(1, 2, 3))
        .unwrap();

    for _ in 0..5 {
        assert!(map.exists(&head, &body, key).unwrap());
    }
    assert!(!map.exists(&head, &body, b"0000000").unwrap());
}

#[test]
fn arraymap_bounds_record_size_four() {
    // Spec.md §8 scenario 6, colocated here as the positional
    // counterpart of the hashmap round-trip above.
    let dir = tempfile::tempdir().unwrap();
    let body = Body::create(dir.path().join("a.body"), 8, 50).unwrap();
    let map = Arraymap::new(4, 4);

    map.push(&body, &0xa1b2_c3d4u32.to_le_bytes()).unwrap();
    map.push(&body, &0u32.to_le_bytes()).unwrap();

    let first = map.get(&body, 0).unwrap();
    assert!(!first.is_exhausted());
    assert_eq!(&*first.bytes(), &[0xd4, 0xc3, 0xb2, 0xa1]);
    assert_eq!(
        u32::from_le_bytes(first.bytes()[..4].try_into().unwrap()),
        0xa1b2_c3d4
    );

    let past_end = map.get(&body, 2).unwrap();
    assert!(past_end.is_exhausted());
}

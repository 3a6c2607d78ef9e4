//! Shared helpers for the end-to-end scenario tests (spec.md §8).

use chainstore::chain::{Block, Context, Header, Input, Output, Point, Transaction, NULL_HASH};
use chainstore::{Query, Settings};

/// A store with small bucket counts, suitable for fast scenario tests.
pub fn settings_in(dir: &std::path::Path) -> Settings {
    Settings {
        dir: dir.to_path_buf(),
        header_buckets: 16,
        point_buckets: 16,
        input_buckets: 16,
        tx_buckets: 16,
        txs_buckets: 16,
        address_buckets: 16,
        strong_tx_buckets: 16,
        ..Settings::default()
    }
}

/// A single-input, single-output coinbase transaction paying `value`.
pub fn coinbase(value: u64) -> Transaction {
    Transaction {
        version: 1,
        inputs: vec![Input {
            previous_output: Point::null(),
            script: vec![],
            witness: vec![],
            sequence: 0xFFFF_FFFF,
        }],
        outputs: vec![Output { value, script: vec![1] }],
        locktime: 0,
    }
}

/// A coinbase with `count` outputs of `value` each, for scenarios that
/// need more than one spendable output per block.
pub fn coinbase_with_outputs(value: u64, count: usize) -> Transaction {
    Transaction {
        version: 1,
        inputs: vec![Input {
            previous_output: Point::null(),
            script: vec![],
            witness: vec![],
            sequence: 0xFFFF_FFFF,
        }],
        outputs: (0..count).map(|_| Output { value, script: vec![1] }).collect(),
        locktime: 0,
    }
}

/// A transaction spending `(prevout_hash, prevout_index)` into one new output.
pub fn spend(prevout_hash: [u8; 32], prevout_index: u32, value: u64) -> Transaction {
    Transaction {
        version: 1,
        inputs: vec![Input {
            previous_output: Point { hash: prevout_hash, index: prevout_index },
            script: vec![],
            witness: vec![],
            sequence: 0xFFFF_FFFF,
        }],
        outputs: vec![Output { value, script: vec![] }],
        locktime: 0,
    }
}

/// A header extending `previous`, distinguished by `nonce`.
pub fn header_after(previous: [u8; 32], nonce: u32) -> Header {
    Header {
        version: 1,
        previous_hash: previous,
        merkle_root: NULL_HASH,
        time: 0,
        bits: 0,
        nonce,
    }
}

/// Inserts `block` at `height` and returns its header link.
pub fn insert_block(query: &Query<'_>, block: &Block, height: u32) -> u64 {
    query
        .set_block(block, Context { height, median_time_past: 0 })
        .expect("set_block")
}

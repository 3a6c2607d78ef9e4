//! Minimal stand-ins for the Bitcoin consensus chain types.
//!
//! The real block, header, transaction, input, output and point types
//! — along with their canonical (double-SHA256) serialization — are
//! explicitly out of scope for this engine (spec §1): they are an
//! external collaborator. This module provides just enough of their
//! public shape (fields, a cheap deterministic identity hash, and a
//! fixed little-endian codec) for the storage engine to be built,
//! exercised and tested against. It is not a consensus implementation:
//! no script interpreter, no proof-of-work check, no real double-SHA256.

use std::fmt;

/// A 32-byte digest identifying a header, transaction, or filter head.
pub type Hash = [u8; 32];

/// The all-zero hash, used as the previous-block link of genesis.
pub const NULL_HASH: Hash = [0u8; 32];

/// Cheap, non-cryptographic stand-in for double-SHA256. Deterministic
/// and collision-resistant enough for exercising the engine; never use
/// this for consensus.
#[must_use]
pub fn digest(bytes: &[u8]) -> Hash {
    // FNV-1a 64-bit, splattered across the 32-byte digest in four lanes
    // with a different seed per lane so distinct inputs of the same
    // length don't produce repeating 8-byte patterns.
    const SEEDS: [u64; 4] = [
        0xcbf2_9ce4_8422_2325,
        0x9e37_79b9_7f4a_7c15,
        0xff51_afd7_ed55_8ccd,
        0xc4ce_b9fe_1a85_ec53,
    ];
    let mut out = [0u8; 32];
    for (lane, seed) in SEEDS.iter().enumerate() {
        let mut hash = *seed;
        for &byte in bytes {
            hash ^= u64::from(byte);
            hash = hash.wrapping_mul(0x0000_0100_0000_01B3);
        }
        hash ^= lane as u64;
        out[lane * 8..lane * 8 + 8].copy_from_slice(&hash.to_le_bytes());
    }
    out
}

/// An outpoint: the transaction hash and output index being spent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Point {
    /// Hash of the transaction holding the referenced output.
    pub hash: Hash,
    /// Index of the referenced output within that transaction.
    pub index: u32,
}

impl Point {
    /// The null point used by coinbase inputs.
    #[must_use]
    pub const fn null() -> Self {
        Self {
            hash: NULL_HASH,
            index: u32::MAX,
        }
    }

    /// True if this is the coinbase null point.
    #[must_use]
    pub fn is_null(&self) -> bool {
        self.hash == NULL_HASH && self.index == u32::MAX
    }
}

/// A transaction input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Input {
    /// Outpoint spent by this input (null for coinbase).
    pub previous_output: Point,
    /// Unlocking script bytes (opaque to this engine).
    pub script: Vec<u8>,
    /// Witness stack, one entry per item (opaque to this engine).
    pub witness: Vec<Vec<u8>>,
    /// nSequence.
    pub sequence: u32,
}

impl Input {
    /// True if this input is a coinbase input.
    #[must_use]
    pub fn is_coinbase(&self) -> bool {
        self.previous_output.is_null()
    }
}

/// A transaction output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Output {
    /// Value in satoshis.
    pub value: u64,
    /// Locking script bytes (opaque to this engine).
    pub script: Vec<u8>,
}

/// A transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transaction {
    /// Version field.
    pub version: u32,
    /// Inputs, in order.
    pub inputs: Vec<Input>,
    /// Outputs, in order.
    pub outputs: Vec<Output>,
    /// Locktime.
    pub locktime: u32,
}

impl Transaction {
    /// True if this transaction is a coinbase (single input, null prevout).
    #[must_use]
    pub fn is_coinbase(&self) -> bool {
        self.inputs.len() == 1 && self.inputs[0].is_coinbase()
    }

    /// Identity hash over a simple canonical encoding.
    #[must_use]
    pub fn hash(&self) -> Hash {
        let mut buf = Vec::new();
        buf.extend_from_slice(&self.version.to_le_bytes());
        for input in &self.inputs {
            buf.extend_from_slice(&input.previous_output.hash);
            buf.extend_from_slice(&input.previous_output.index.to_le_bytes());
            buf.extend_from_slice(&input.sequence.to_le_bytes());
            buf.extend_from_slice(&input.script);
        }
        for output in &self.outputs {
            buf.extend_from_slice(&output.value.to_le_bytes());
            buf.extend_from_slice(&output.script);
        }
        buf.extend_from_slice(&self.locktime.to_le_bytes());
        digest(&buf)
    }

    /// Self-contained length-prefixed encoding used by the `buffer`
    /// cache (spec §3 "Bootstrap/neutrino/buffer cache accessors"),
    /// which stores a whole pending transaction rather than the
    /// cross-table links the `tx`/`input`/`output` archives use.
    #[must_use]
    pub fn encode(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        buf.extend_from_slice(&self.version.to_le_bytes());
        buf.extend_from_slice(&self.locktime.to_le_bytes());
        buf.extend_from_slice(&(self.inputs.len() as u32).to_le_bytes());
        for input in &self.inputs {
            buf.extend_from_slice(&input.previous_output.hash);
            buf.extend_from_slice(&input.previous_output.index.to_le_bytes());
            buf.extend_from_slice(&input.sequence.to_le_bytes());
            buf.extend_from_slice(&(input.script.len() as u32).to_le_bytes());
            buf.extend_from_slice(&input.script);
            buf.extend_from_slice(&(input.witness.len() as u32).to_le_bytes());
            for item in &input.witness {
                buf.extend_from_slice(&(item.len() as u32).to_le_bytes());
                buf.extend_from_slice(item);
            }
        }
        buf.extend_from_slice(&(self.outputs.len() as u32).to_le_bytes());
        for output in &self.outputs {
            buf.extend_from_slice(&output.value.to_le_bytes());
            buf.extend_from_slice(&(output.script.len() as u32).to_le_bytes());
            buf.extend_from_slice(&output.script);
        }
        buf
    }

    /// Inverse of [`Self::encode`]. Returns `None` on malformed bytes
    /// (truncated cache entry); the cache is best-effort, so callers
    /// treat a decode failure the same as a cache miss.
    #[must_use]
    pub fn decode(bytes: &[u8]) -> Option<Self> {
        let mut cursor = Cursor::new(bytes);
        let version = cursor.take_u32()?;
        let locktime = cursor.take_u32()?;
        let input_count = cursor.take_u32()?;
        let mut inputs = Vec::with_capacity(input_count as usize);
        for _ in 0..input_count {
            let hash = cursor.take_hash()?;
            let index = cursor.take_u32()?;
            let sequence = cursor.take_u32()?;
            let script_len = cursor.take_u32()?;
            let script = cursor.take_bytes(script_len as usize)?.to_vec();
            let witness_count = cursor.take_u32()?;
            let mut witness = Vec::with_capacity(witness_count as usize);
            for _ in 0..witness_count {
                let item_len = cursor.take_u32()?;
                witness.push(cursor.take_bytes(item_len as usize)?.to_vec());
            }
            inputs.push(Input {
                previous_output: Point { hash, index },
                script,
                witness,
                sequence,
            });
        }
        let output_count = cursor.take_u32()?;
        let mut outputs = Vec::with_capacity(output_count as usize);
        for _ in 0..output_count {
            let value = cursor.take_u64()?;
            let script_len = cursor.take_u32()?;
            let script = cursor.take_bytes(script_len as usize)?.to_vec();
            outputs.push(Output { value, script });
        }
        Some(Self { version, inputs, outputs, locktime })
    }
}

/// Minimal bounds-checked byte cursor for [`Transaction::decode`].
struct Cursor<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    fn take_bytes(&mut self, len: usize) -> Option<&'a [u8]> {
        let end = self.pos.checked_add(len)?;
        let slice = self.bytes.get(self.pos..end)?;
        self.pos = end;
        Some(slice)
    }

    fn take_u32(&mut self) -> Option<u32> {
        self.take_bytes(4).map(|b| u32::from_le_bytes(b.try_into().unwrap()))
    }

    fn take_u64(&mut self) -> Option<u64> {
        self.take_bytes(8).map(|b| u64::from_le_bytes(b.try_into().unwrap()))
    }

    fn take_hash(&mut self) -> Option<Hash> {
        self.take_bytes(32).map(|b| b.try_into().unwrap())
    }
}

/// A block header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    /// Version field.
    pub version: u32,
    /// Hash of the previous block header (all-zero for genesis).
    pub previous_hash: Hash,
    /// Merkle root over the block's transactions.
    pub merkle_root: Hash,
    /// Block time (Unix seconds).
    pub time: u32,
    /// Compact-form difficulty target.
    pub bits: u32,
    /// Proof-of-work nonce.
    pub nonce: u32,
}

impl Header {
    /// Identity hash over a simple canonical encoding.
    #[must_use]
    pub fn hash(&self) -> Hash {
        let mut buf = Vec::with_capacity(80);
        buf.extend_from_slice(&self.version.to_le_bytes());
        buf.extend_from_slice(&self.previous_hash);
        buf.extend_from_slice(&self.merkle_root);
        buf.extend_from_slice(&self.time.to_le_bytes());
        buf.extend_from_slice(&self.bits.to_le_bytes());
        buf.extend_from_slice(&self.nonce.to_le_bytes());
        digest(&buf)
    }
}

/// A full block: header plus transactions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    /// The block header.
    pub header: Header,
    /// Transactions, coinbase first.
    pub transactions: Vec<Transaction>,
}

/// Chain-position context accompanying a header/block as it is
/// archived: the height and median-time-past it is associated with.
/// (The original's `context` also carries validation flags; those live
/// entirely in validation logic this engine does not implement and so
/// are omitted.)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Context {
    /// Chain height of the associated block.
    pub height: u32,
    /// Median time past at that height.
    pub median_time_past: u32,
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", hex(&self.hash), self.index)
    }
}

fn hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

#[cfg(test)]
mod chain_tests {
    use super::*;

    #[test]
    fn digest_is_deterministic() {
        assert_eq!(digest(b"abc"), digest(b"abc"));
        assert_ne!(digest(b"abc"), digest(b"abd"));
    }

    #[test]
    fn coinbase_input_has_null_prevout() {
        let input = Input {
            previous_output: Point::null(),
            script: vec![],
            witness: vec![],
            sequence: 0xFFFF_FFFF,
        };
        assert!(input.is_coinbase());
    }

    #[test]
    fn transaction_hash_changes_with_content() {
        let base = Transaction {
            version: 1,
            inputs: vec![],
            outputs: vec![Output {
                value: 50_000,
                script: vec![1, 2, 3],
            }],
            locktime: 0,
        };
        let mut other = base.clone();
        other.outputs[0].value = 50_001;
        assert_ne!(base.hash(), other.hash());
    }

    #[test]
    fn encode_decode_round_trips_with_witness() {
        let tx = Transaction {
            version: 2,
            inputs: vec![Input {
                previous_output: Point { hash: [9u8; 32], index: 3 },
                script: vec![1, 2, 3],
                witness: vec![vec![0xde, 0xad], vec![]],
                sequence: 0xFFFF_FFFE,
            }],
            outputs: vec![Output { value: 4_200_000, script: vec![0xa9, 0x14] }],
            locktime: 500_000,
        };
        let decoded = Transaction::decode(&tx.encode()).unwrap();
        assert_eq!(decoded, tx);
    }

    #[test]
    fn decode_rejects_truncated_bytes() {
        assert!(Transaction::decode(&[1, 2, 3]).is_none());
    }
}

//! Database configuration settings.
//!
//! Plain data, not a loader: reading these from a config file or the
//! environment is the job of the (out of scope) settings loader. This
//! mirrors `examples/original_source/include/bitcoin/database/settings.hpp`
//! field for field, one `(buckets, record_size, growth_rate)` triple
//! per hashmap archive/index and a `(record_size, growth_rate)` pair
//! per arraymap table.

use std::path::PathBuf;

/// Per-table growth rate, percent headroom added on each `reserve`
/// that has to grow the body file (spec §4.B).
pub type GrowthRate = u16;

/// Root settings for a store: the directory plus per-table tuning.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Root directory the store lives under.
    pub dir: PathBuf,

    /// Coinbase maturity, in blocks, used by `is_mature`.
    pub coinbase_maturity: u32,

    // -- Archives -----------------------------------------------------
    /// `header` table bucket count.
    pub header_buckets: u32,
    /// `header` table record size in bytes.
    pub header_size: u32,
    /// `header` table growth rate (percent).
    pub header_rate: GrowthRate,

    /// `point` table bucket count.
    pub point_buckets: u32,
    /// `point` table record size in bytes.
    pub point_size: u32,
    /// `point` table growth rate (percent).
    pub point_rate: GrowthRate,

    /// `input` table bucket count.
    pub input_buckets: u32,
    /// `input` table maximum slab size in bytes (soft hint only).
    pub input_size: u32,
    /// `input` table growth rate (percent).
    pub input_rate: GrowthRate,

    /// `output` arraymap slab growth rate (percent).
    pub output_size: u32,
    /// `output` table growth rate (percent).
    pub output_rate: GrowthRate,

    /// `puts` arraymap record size in bytes.
    pub puts_size: u32,
    /// `puts` table growth rate (percent).
    pub puts_rate: GrowthRate,

    /// `tx` table bucket count.
    pub tx_buckets: u32,
    /// `tx` table record size in bytes.
    pub tx_size: u32,
    /// `tx` table growth rate (percent).
    pub tx_rate: GrowthRate,

    /// `txs` table bucket count.
    pub txs_buckets: u32,
    /// `txs` table slab growth size hint in bytes.
    pub txs_size: u32,
    /// `txs` table growth rate (percent).
    pub txs_rate: GrowthRate,

    // -- Indexes --------------------------------------------------------
    /// `address` table bucket count.
    pub address_buckets: u32,
    /// `address` table record size in bytes.
    pub address_size: u32,
    /// `address` table growth rate (percent).
    pub address_rate: GrowthRate,

    /// `candidate` arraymap record size in bytes.
    pub candidate_size: u32,
    /// `candidate` table growth rate (percent).
    pub candidate_rate: GrowthRate,

    /// `confirmed` arraymap record size in bytes.
    pub confirmed_size: u32,
    /// `confirmed` table growth rate (percent).
    pub confirmed_rate: GrowthRate,

    /// `strong_tx` table bucket count.
    pub strong_tx_buckets: u32,
    /// `strong_tx` table record size in bytes.
    pub strong_tx_size: u32,
    /// `strong_tx` table growth rate (percent).
    pub strong_tx_rate: GrowthRate,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("./chainstore"),
            coinbase_maturity: 100,

            header_buckets: 100_000,
            header_size: 80,
            header_rate: 50,

            point_buckets: 100_000,
            point_size: 32,
            point_rate: 50,

            input_buckets: 200_000,
            input_size: 0, // slab
            input_rate: 50,

            output_size: 0, // slab
            output_rate: 50,

            puts_size: 4,
            puts_rate: 50,

            tx_buckets: 200_000,
            tx_size: 0, // slab
            tx_rate: 50,

            txs_buckets: 100_000,
            txs_size: 0, // slab
            txs_rate: 50,

            address_buckets: 100_000,
            address_size: 4,
            address_rate: 50,

            candidate_size: 4,
            candidate_rate: 50,

            confirmed_size: 4,
            confirmed_rate: 50,

            strong_tx_buckets: 100_000,
            strong_tx_size: 4,
            strong_tx_rate: 50,
        }
    }
}

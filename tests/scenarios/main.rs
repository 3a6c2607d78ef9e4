//! End-to-end scenario test suite (spec.md §8). Each submodule covers
//! one of the spec's literal walkthroughs against the real engine.

mod helpers;

mod candidate_chain;
mod coinbase_maturity;
mod crash_restore;
mod double_spend;
mod hashmap_roundtrip;

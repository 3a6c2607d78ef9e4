//! Scenario 4 (spec.md §8): a coinbase output cannot be spent until
//! `coinbase_maturity` confirmations have passed.

use chainstore::chain::{Block, Context, Input, Output, Point, Transaction};
use chainstore::{Query, Store};

use crate::helpers::{coinbase, header_after, settings_in};

#[test]
fn spending_input_is_immature_before_the_coinbase_maturity_window() {
    let dir = tempfile::tempdir().unwrap();
    let store = Store::create(settings_in(dir.path())).unwrap();
    let query = Query::new(&store);

    let genesis = Block {
        header: header_after(chainstore::chain::NULL_HASH, 0),
        transactions: vec![coinbase(50_0000_0000)],
    };
    let genesis_link = query.initialize(&genesis).unwrap();
    let coinbase_hash = genesis.transactions[0].hash();

    let spender = Transaction {
        version: 1,
        inputs: vec![Input {
            previous_output: Point { hash: coinbase_hash, index: 0 },
            script: vec![],
            witness: vec![],
            sequence: 0xFFFF_FFFF,
        }],
        outputs: vec![Output { value: 49_0000_0000, script: vec![] }],
        locktime: 0,
    };
    let block1 = Block {
        header: header_after(genesis.header.hash(), 1),
        transactions: vec![spender],
    };
    let block1_link = query.set_block(&block1, Context { height: 1, median_time_past: 0 }).unwrap();
    query.set_strong(block1_link).unwrap();

    let tx_link = query.to_transactions(block1_link).unwrap()[0];
    let input_link = query.to_tx_inputs(tx_link).unwrap()[0];

    // genesis is at height 0; the default coinbase_maturity is 100, so
    // a spender landing at height 99 is still one block short, and
    // height 100 is exactly the boundary at which it matures.
    assert!(!query.is_input_mature(input_link, 99).unwrap());
    assert!(query.is_input_mature(input_link, 100).unwrap());

    assert!(query.is_header(&genesis.header.hash()).unwrap());
    assert_eq!(query.header_height(genesis_link).unwrap(), 0);
}

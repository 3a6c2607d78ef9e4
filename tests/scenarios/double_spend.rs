//! Scenario 3 (spec.md §8): two strong transactions independently
//! spending the same outpoints. Per the `is_spent` contract ("self is
//! ignored to allow mempool-style idempotence"), an outpoint with only
//! one spender — even a strong one — is not yet spent; the double
//! spend is only observable once a second, distinct strong spender of
//! the same outpoint exists, exactly as the literal scenario produces
//! it by inserting block3a and calling `set_strong` on it.

use chainstore::chain::{Block, Context, Input, Output, Point, Transaction};
use chainstore::{Query, Store};

use crate::helpers::{coinbase_with_outputs, header_after, settings_in};

#[test]
fn conflicting_spend_is_detected_only_once_a_second_strong_spender_exists() {
    let dir = tempfile::tempdir().unwrap();
    let store = Store::create(settings_in(dir.path())).unwrap();
    let query = Query::new(&store);

    let genesis = Block {
        header: header_after(chainstore::chain::NULL_HASH, 0),
        transactions: vec![coinbase_with_outputs(100, 3)],
    };
    let genesis_link = query.initialize(&genesis).unwrap();
    let coinbase_hash = genesis.transactions[0].hash();

    let spend_all = Transaction {
        version: 1,
        inputs: (0..3)
            .map(|index| Input {
                previous_output: Point { hash: coinbase_hash, index },
                script: vec![],
                witness: vec![],
                sequence: 0xFFFF_FFFF,
            })
            .collect(),
        outputs: vec![Output { value: 90, script: vec![] }],
        locktime: 0,
    };
    let block2 = Block {
        header: header_after(genesis.header.hash(), 1),
        transactions: vec![spend_all],
    };
    let block2_link = query.set_block(&block2, Context { height: 1, median_time_past: 0 }).unwrap();
    assert!(query.set_strong(block2_link).unwrap());
    query.push_confirmed(block2_link).unwrap();

    let block2_tx_link = query.to_transactions(block2_link).unwrap()[0];
    let block2_inputs = query.to_tx_inputs(block2_tx_link).unwrap();
    assert_eq!(block2_inputs.len(), 3);

    // block2 is, so far, the only spender of any of these three
    // outpoints — `is_spent` excludes the input being asked about, so
    // none of them are spent yet.
    for &input_link in &block2_inputs {
        let (point_fk, index) = query.to_prevout(input_link).unwrap();
        assert!(!query.is_spent(point_fk, index, input_link).unwrap());
    }

    // block3a double-spends outputs 0 and 1 (but not 2) and is made
    // strong, just as the literal scenario's "set_strong(3)" step does.
    let double_spend = Transaction {
        version: 1,
        inputs: vec![
            Input {
                previous_output: Point { hash: coinbase_hash, index: 0 },
                script: vec![],
                witness: vec![],
                sequence: 0xFFFF_FFFF,
            },
            Input {
                previous_output: Point { hash: coinbase_hash, index: 1 },
                script: vec![],
                witness: vec![],
                sequence: 0xFFFF_FFFF,
            },
        ],
        outputs: vec![Output { value: 50, script: vec![0xff] }],
        locktime: 0,
    };
    let block3 = Block {
        header: header_after(block2.header.hash(), 2),
        transactions: vec![double_spend],
    };
    let block3_link = query.set_block(&block3, Context { height: 2, median_time_past: 0 }).unwrap();
    assert!(query.set_strong(block3_link).unwrap());
    assert!(query.is_strong_association(block3_link).unwrap());

    // Now block2's inputs at index 0 and 1 are confirmed double-spent
    // by block3a's strong transaction; index 2 has no other spender.
    for &input_link in &block2_inputs {
        let (point_fk, index) = query.to_prevout(input_link).unwrap();
        let spent = query.is_spent(point_fk, index, input_link).unwrap();
        assert_eq!(spent, index == 0 || index == 1, "index {index}");
    }

    let block3_tx_link = query.to_transactions(block3_link).unwrap()[0];
    let conflicting_inputs = query.to_tx_inputs(block3_tx_link).unwrap();
    assert_eq!(conflicting_inputs.len(), 2);

    for &conflicting_input in &conflicting_inputs {
        let (point_fk, index) = query.to_prevout(conflicting_input).unwrap();
        assert!(query.is_spent(point_fk, index, conflicting_input).unwrap());

        let spenders = query.to_spenders(point_fk, index).unwrap();
        assert_eq!(spenders.len(), 2);
        assert!(spenders.contains(&conflicting_input));
    }

    assert!(query.is_candidate_block(genesis_link, 0).unwrap());
}

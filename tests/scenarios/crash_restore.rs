//! Scenario 5 (spec.md §8): a snapshot followed by unflushed writes
//! and an unclean close is fully undone by `restore`.

use chainstore::chain::Block;
use chainstore::{Query, Store};

use crate::helpers::{coinbase, header_after, insert_block, settings_in};

#[test]
fn restore_after_an_unclean_close_discards_writes_since_the_last_snapshot() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = Store::create(settings_in(dir.path())).unwrap();
    let query = Query::new(&store);

    let genesis = Block {
        header: header_after(chainstore::chain::NULL_HASH, 0),
        transactions: vec![coinbase(1)],
    };
    let genesis_link = query.initialize(&genesis).unwrap();

    let block1 = Block {
        header: header_after(genesis.header.hash(), 1),
        transactions: vec![coinbase(2)],
    };
    let link1 = insert_block(&query, &block1, 1);
    query.push_candidate(link1).unwrap();

    let block2 = Block {
        header: header_after(block1.header.hash(), 2),
        transactions: vec![coinbase(3)],
    };
    let link2 = insert_block(&query, &block2, 2);
    query.push_candidate(link2).unwrap();

    store.snapshot().unwrap();

    // Insert a third block after the snapshot and never snapshot again
    // — this simulates a crash between the write and the next flush.
    let block3 = Block {
        header: header_after(block2.header.hash(), 3),
        transactions: vec![coinbase(4)],
    };
    let link3 = insert_block(&query, &block3, 3);
    query.push_candidate(link3).unwrap();
    assert_eq!(query.get_top_candidate(), Some(3));

    drop(query);
    store.close().unwrap();

    let (mut store, needs_restore) = Store::open(settings_in(dir.path())).unwrap();
    assert!(needs_restore, "close never snapshotted, so restore is required");
    store.restore().unwrap();

    let query = Query::new(&store);
    assert_eq!(query.get_top_confirmed(), Some(0));
    assert_eq!(query.get_top_candidate(), Some(2));
    assert!(query.is_candidate_block(genesis_link, 0).unwrap());
    assert!(query.is_candidate_block(link1, 1).unwrap());
    assert!(query.is_candidate_block(link2, 2).unwrap());
    assert!(query.to_candidate(3).unwrap().is_none());
    assert!(!query.is_header(&block3.header.hash()).unwrap());
}

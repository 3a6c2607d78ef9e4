//! Scenario 2 (spec.md §8): candidate chain push/pop across three
//! blocks (genesis, block1, block2).

use chainstore::{Query, Store};

use crate::helpers::{coinbase, header_after, insert_block, settings_in};

#[test]
fn pushing_then_popping_candidates_tracks_the_tip() {
    let dir = tempfile::tempdir().unwrap();
    let store = Store::create(settings_in(dir.path())).unwrap();
    let query = Query::new(&store);

    let genesis = chainstore::chain::Block {
        header: header_after(chainstore::chain::NULL_HASH, 0),
        transactions: vec![coinbase(1)],
    };
    let genesis_link = query.initialize(&genesis).unwrap();
    assert!(query.is_initialized());
    assert_eq!(query.get_top_candidate(), Some(0));

    let block1 = chainstore::chain::Block {
        header: header_after(genesis.header.hash(), 1),
        transactions: vec![coinbase(2)],
    };
    let link1 = insert_block(&query, &block1, 1);
    query.push_candidate(link1).unwrap();
    assert_eq!(query.get_top_candidate(), Some(1));

    let block2 = chainstore::chain::Block {
        header: header_after(block1.header.hash(), 2),
        transactions: vec![coinbase(3)],
    };
    let link2 = insert_block(&query, &block2, 2);
    query.push_candidate(link2).unwrap();
    assert_eq!(query.get_top_candidate(), Some(2));

    assert!(query.is_candidate_block(genesis_link, 0).unwrap());
    assert!(query.is_candidate_block(link1, 1).unwrap());
    assert!(query.is_candidate_block(link2, 2).unwrap());

    query.pop_candidate().unwrap();
    assert_eq!(query.get_top_candidate(), Some(1));
    assert!(query.to_candidate(2).unwrap().is_none());
    assert!(query.is_candidate_block(link1, 1).unwrap());

    query.pop_candidate().unwrap();
    assert_eq!(query.get_top_candidate(), Some(0));
    assert!(query.to_candidate(1).unwrap().is_none());
}

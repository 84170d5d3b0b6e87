//! Nonce reservation across one construction session.

use assert_matches::assert_matches;
use std::collections::BTreeSet;

use testament_core::{RecordNonce, TestamentError};
use testament_ledger::RecordLedger;
use testament_testkit::{record, spent_record, MemoryRecordSource};

#[test]
fn session_never_hands_out_a_nonce_twice() {
    let mut ledger = RecordLedger::with_records([
        record(1_000, "r1"),
        record(1_000, "r2"),
        record(5_000, "r3"),
    ]);

    let mut seen = BTreeSet::new();
    for _ in 0..3 {
        let chosen = ledger.select_and_reserve(500).unwrap();
        assert!(seen.insert(chosen.nonce));
    }
    assert_matches!(
        ledger.select_and_reserve(500),
        Err(TestamentError::InsufficientBalance { required: 500 })
    );

    ledger.clear_session();
    assert_eq!(ledger.select_and_reserve(500).unwrap().nonce.as_str(), "r1");
}

#[test]
fn found_record_can_only_be_reserved_once() {
    let mut ledger = RecordLedger::with_records([record(2_000, "only")]);
    let found = ledger.find_value_record(1_000, ledger.reserved_nonces()).unwrap();
    ledger.reserve(&found).unwrap();
    assert_matches!(
        ledger.reserve(&found),
        Err(TestamentError::NonceAlreadyReserved { .. })
    );
    assert_eq!(
        ledger.reserved_nonces().iter().collect::<Vec<_>>(),
        vec![&RecordNonce::from("only")]
    );
}

#[test]
fn independent_ledgers_do_not_share_sessions() {
    let pool = [record(1_000, "shared")];
    let mut first = RecordLedger::with_records(pool.clone());
    let mut second = RecordLedger::with_records(pool);
    first.select_and_reserve(1_000).unwrap();
    second.select_and_reserve(1_000).unwrap();
    assert!(first.session().contains(&RecordNonce::from("shared")));
}

#[tokio::test]
async fn refresh_drops_spent_records_and_keeps_reservations() {
    let source = MemoryRecordSource::with_records([
        record(1_000, "a"),
        spent_record(9_000, "b"),
        record(3_000, "c"),
    ]);
    let mut ledger = RecordLedger::new();
    assert_eq!(ledger.refresh(&source).await.unwrap(), 2);
    assert_eq!(ledger.total_unspent(), 4_000);

    let reserved = ledger.select_and_reserve(2_000).unwrap();
    assert_eq!(reserved.nonce.as_str(), "c");
    ledger.mark_spent(&RecordNonce::from("a"));

    // The source still reports "a" as unspent until the network catches up.
    ledger.refresh(&source).await.unwrap();
    assert_eq!(ledger.records().len(), 1);
    assert!(ledger.session().contains(&reserved.nonce));
    assert_eq!(ledger.available_balance(), 0);
    assert_eq!(source.fetch_calls(), 2);
}

#[tokio::test]
async fn refresh_propagates_source_failure() {
    let source = MemoryRecordSource::with_records([record(1_000, "a")]);
    source.set_unavailable(true);
    let mut ledger = RecordLedger::with_records([record(50, "old")]);
    assert_matches!(
        ledger.refresh(&source).await,
        Err(TestamentError::Network { .. })
    );
    assert_eq!(ledger.records().len(), 1);
}

//! Contract tests run against both sequence backends.
//!
//! The scripted and lock-guarded strategies must be indistinguishable
//! through the `Sequence` trait, so every check here runs twice.

use seqstore::test_support::MemoryAtomicStore;
use seqstore::test_support::MemoryMutex;
use seqstore::test_support::MemoryScriptStore;
use seqstore::LockedCounter;
use seqstore::ScriptedSequence;
use seqstore::Sequence;
use seqstore::SequenceError;

fn scripted(key: &str) -> ScriptedSequence<MemoryScriptStore> {
    ScriptedSequence::new(MemoryScriptStore::new(), key, || 100)
}

fn locked(key: &str) -> LockedCounter<MemoryAtomicStore, MemoryMutex> {
    LockedCounter::new(MemoryAtomicStore::new(), MemoryMutex::new(), key, || 100)
}

async fn check_first_use_then_steady_state(seq: &dyn Sequence) {
    // Fresh key, baseline 100: first call initializes and lands on 110,
    // the second is a plain increment to 120.
    assert_eq!(seq.next(10).await.unwrap(), 110);
    assert_eq!(seq.next(10).await.unwrap(), 120);
}

async fn check_raw_next_absence_contract(seq: &dyn Sequence) {
    // No default: absence is reported and nothing is created, repeatedly.
    for _ in 0..3 {
        assert_eq!(seq.raw_next(10, None).await.unwrap(), None);
    }
    // Still first-use afterward.
    assert_eq!(seq.next(10).await.unwrap(), 110);
}

async fn check_raw_next_default_exact(seq: &dyn Sequence) {
    assert_eq!(seq.raw_next(10, Some(110)).await.unwrap(), Some(110));
    // The key now exists, so the same call becomes a plain increment.
    assert_eq!(seq.raw_next(10, Some(999)).await.unwrap(), Some(120));
}

async fn check_step_validation(seq: &dyn Sequence) {
    assert!(matches!(seq.next(0).await, Err(SequenceError::InvalidStep { step: 0 })));
    assert!(matches!(seq.next(-5).await, Err(SequenceError::InvalidStep { step: -5 })));
    assert!(matches!(
        seq.raw_next(-1, Some(10)).await,
        Err(SequenceError::InvalidStep { step: -1 })
    ));
}

async fn check_reset_idempotence(seq: &dyn Sequence) {
    // Reset of an absent key succeeds.
    seq.reset().await.unwrap();

    seq.next(10).await.unwrap();
    seq.reset().await.unwrap();

    // Back to first-use behavior with the supplier as baseline.
    assert_eq!(seq.current_value().await.unwrap(), 100);
    assert_eq!(seq.next(10).await.unwrap(), 110);
}

async fn check_force_set(seq: &dyn Sequence) {
    seq.force_set(500).await.unwrap();
    assert_eq!(seq.next(5).await.unwrap(), 505);
}

async fn check_current_value_is_read_only(seq: &dyn Sequence) {
    // Supplier fallback before initialization, and no write happens: the
    // next call still behaves as first use.
    assert_eq!(seq.current_value().await.unwrap(), 100);
    assert_eq!(seq.next(10).await.unwrap(), 110);
    assert_eq!(seq.current_value().await.unwrap(), 110);
}

#[tokio::test]
async fn scripted_first_use_then_steady_state() {
    check_first_use_then_steady_state(&scripted("seq_a")).await;
}

#[tokio::test]
async fn locked_first_use_then_steady_state() {
    check_first_use_then_steady_state(&locked("seq_a")).await;
}

#[tokio::test]
async fn scripted_raw_next_absence_contract() {
    check_raw_next_absence_contract(&scripted("seq_b")).await;
}

#[tokio::test]
async fn locked_raw_next_absence_contract() {
    check_raw_next_absence_contract(&locked("seq_b")).await;
}

#[tokio::test]
async fn scripted_raw_next_default_exact() {
    check_raw_next_default_exact(&scripted("seq_c")).await;
}

#[tokio::test]
async fn locked_raw_next_default_exact() {
    check_raw_next_default_exact(&locked("seq_c")).await;
}

#[tokio::test]
async fn scripted_step_validation() {
    check_step_validation(&scripted("seq_d")).await;
}

#[tokio::test]
async fn locked_step_validation() {
    check_step_validation(&locked("seq_d")).await;
}

#[tokio::test]
async fn scripted_reset_idempotence() {
    check_reset_idempotence(&scripted("seq_e")).await;
}

#[tokio::test]
async fn locked_reset_idempotence() {
    check_reset_idempotence(&locked("seq_e")).await;
}

#[tokio::test]
async fn scripted_force_set() {
    check_force_set(&scripted("seq_f")).await;
}

#[tokio::test]
async fn locked_force_set() {
    check_force_set(&locked("seq_f")).await;
}

#[tokio::test]
async fn scripted_current_value_is_read_only() {
    check_current_value_is_read_only(&scripted("seq_g")).await;
}

#[tokio::test]
async fn locked_current_value_is_read_only() {
    check_current_value_is_read_only(&locked("seq_g")).await;
}

#[tokio::test]
async fn fallback_overflow_is_a_range_error() {
    let seq = ScriptedSequence::new(MemoryScriptStore::new(), "seq_h", || i64::MAX);
    assert!(matches!(
        seq.next(1).await,
        Err(SequenceError::ValueRangeExceeded { .. })
    ));
}

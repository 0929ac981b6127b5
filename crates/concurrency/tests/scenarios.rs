//! End-to-end scenarios driven entirely through `TransactionManager::dispatch`,
//! the way a CLI-fed run would exercise the engine.

use availdb_concurrency::{Command, Output, TransactionManager};
use availdb_core::{AbortReason, SiteId, TxnId, VarId};

fn var(n: u8) -> VarId {
    VarId::new(n).unwrap()
}

fn site(n: u8) -> SiteId {
    SiteId::new(n).unwrap()
}

fn txn(s: &str) -> TxnId {
    TxnId::new(s)
}

#[test]
fn first_committer_wins_and_dump_reflects_the_winner() {
    let mut tm = TransactionManager::new();
    tm.dispatch(Command::Begin(txn("T1")));
    tm.dispatch(Command::Begin(txn("T2")));
    tm.dispatch(Command::Write(txn("T1"), var(1), 101));
    tm.dispatch(Command::Write(txn("T2"), var(1), 102));
    assert_eq!(
        tm.dispatch(Command::End(txn("T1"))),
        vec![Output::Committed { txn: txn("T1") }]
    );
    assert_eq!(
        tm.dispatch(Command::End(txn("T2"))),
        vec![Output::Aborted { txn: txn("T2"), reason: AbortReason::WwConflict { var: 1 } }]
    );

    let dump = tm.dispatch(Command::Dump);
    let Output::Dump(snapshot) = &dump[0] else { panic!("expected a dump") };
    assert_eq!(snapshot[&site(2)].values[&var(1)], 101);
}

#[test]
fn available_copies_abort_when_write_target_fails() {
    let mut tm = TransactionManager::new();
    tm.dispatch(Command::Begin(txn("T1")));
    tm.dispatch(Command::Write(txn("T1"), var(6), 66));
    tm.dispatch(Command::Fail(site(3)));
    assert_eq!(
        tm.dispatch(Command::End(txn("T1"))),
        vec![Output::Aborted {
            txn: txn("T1"),
            reason: AbortReason::SiteFailedAfterWrite { site: 3 }
        }]
    );
}

#[test]
fn recovery_gates_replicated_reads_until_a_fresh_commit() {
    let mut tm = TransactionManager::new();
    tm.dispatch(Command::Fail(site(2)));
    tm.dispatch(Command::Recover(site(2)));
    tm.dispatch(Command::Begin(txn("T1")));
    let read = tm.dispatch(Command::Read(txn("T1"), var(2)));
    let Output::Read { value, .. } = read[0] else { panic!("expected a read") };
    assert_eq!(value, 20);

    tm.dispatch(Command::Begin(txn("T7")));
    tm.dispatch(Command::Write(txn("T7"), var(2), 222));
    tm.dispatch(Command::End(txn("T7")));

    tm.dispatch(Command::Begin(txn("T8")));
    let read2 = tm.dispatch(Command::Read(txn("T8"), var(2)));
    assert_eq!(read2, vec![Output::Read { var: var(2), value: 222 }]);
}

#[test]
fn snapshot_isolation_hides_concurrent_commits() {
    let mut tm = TransactionManager::new();
    tm.dispatch(Command::Begin(txn("T1")));
    tm.dispatch(Command::Begin(txn("T2")));
    tm.dispatch(Command::Write(txn("T1"), var(4), 40));
    tm.dispatch(Command::End(txn("T1")));
    assert_eq!(
        tm.dispatch(Command::Read(txn("T2"), var(4))),
        vec![Output::Read { var: var(4), value: 40 }]
    );
}

#[test]
fn dangerous_cycle_aborts_the_second_committer() {
    let mut tm = TransactionManager::new();
    tm.dispatch(Command::Begin(txn("T1")));
    tm.dispatch(Command::Begin(txn("T2")));

    // T1 reads x2 (sees the initial value), T2 writes x2 -> RW: T1 -> T2.
    tm.dispatch(Command::Read(txn("T1"), var(2)));
    tm.dispatch(Command::Write(txn("T2"), var(2), 1));

    // T2 reads x4, T1 writes x4 -> RW: T2 -> T1, closing T1 -> T2 -> T1.
    tm.dispatch(Command::Read(txn("T2"), var(4)));
    tm.dispatch(Command::Write(txn("T1"), var(4), 2));

    assert_eq!(tm.dispatch(Command::End(txn("T1"))), vec![Output::Committed { txn: txn("T1") }]);
    assert_eq!(
        tm.dispatch(Command::End(txn("T2"))),
        vec![Output::Aborted { txn: txn("T2"), reason: AbortReason::DangerousCycle }]
    );
}

#[test]
fn waiting_read_on_single_home_variable_resumes_after_recovery() {
    let mut tm = TransactionManager::new();
    tm.dispatch(Command::Fail(site(4))); // home of x3
    tm.dispatch(Command::Begin(txn("T1")));
    assert_eq!(
        tm.dispatch(Command::Read(txn("T1"), var(3))),
        vec![Output::Waiting { txn: txn("T1"), var: var(3) }]
    );

    let resumed = tm.dispatch(Command::Recover(site(4)));
    assert!(resumed.contains(&Output::Read { var: var(3), value: 30 }));

    assert_eq!(
        tm.dispatch(Command::End(txn("T1"))),
        vec![Output::Committed { txn: txn("T1") }]
    );
}

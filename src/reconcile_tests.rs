use super::*;
use crate::dispatch::dispatch;
use crate::test_support::{seeded_file_store, seeded_store, ScriptedProvider};

const PHONE_A: &str = "+15550000001";
const PHONE_B: &str = "+15550000002";
const PHONE_C: &str = "+15550000003";

const PAYLOAD: &str = r#"{"summary":"Happy customer","duration":61}"#;

fn store_with_calls(provider: &ScriptedProvider, phones: &[&str]) -> LeadStore {
    let mut store = seeded_store(phones);
    for id in 1..=phones.len() as LeadId {
        dispatch(&mut store, provider, id).expect("dispatch");
    }
    store
}

#[test]
fn unfinished_calls_stay_calling() {
    let provider = ScriptedProvider::default();
    let mut store = store_with_calls(&provider, &[PHONE_A]);

    let report = check_status(&mut store, &provider).expect("check");

    assert_eq!(report.checked, 1);
    assert_eq!(report.updated, 0);
    assert_eq!(report.results[0].outcome, ReconcileOutcome::StillPending);
    let lead = store.get(1).expect("lead");
    assert_eq!(lead.status, LeadStatus::Calling);
    assert!(lead.feedback.is_none());
}

#[test]
fn ended_calls_record_raw_payload_and_outcome() {
    let provider = ScriptedProvider::default();
    let mut store = store_with_calls(&provider, &[PHONE_A, PHONE_B]);
    provider.finish("call-1", CallOutcome::Success, PAYLOAD);
    provider.finish("call-2", CallOutcome::Declined, "{}");

    let report = check_status(&mut store, &provider).expect("check");

    assert_eq!(report.checked, 2);
    assert_eq!(report.updated, 2);
    let completed = store.get(1).expect("lead 1");
    assert_eq!(completed.status, LeadStatus::Completed);
    assert_eq!(completed.feedback.as_deref(), Some(PAYLOAD));
    let rejected = store.get(2).expect("lead 2");
    assert_eq!(rejected.status, LeadStatus::Rejected);
    assert_eq!(rejected.feedback.as_deref(), Some("{}"));
    assert_eq!(
        report
            .results
            .iter()
            .map(|entry| entry.outcome)
            .collect::<Vec<_>>(),
        vec![ReconcileOutcome::Completed, ReconcileOutcome::Rejected]
    );
}

#[test]
fn provider_error_for_one_lead_does_not_stop_the_rest() {
    let provider = ScriptedProvider::default().fail_result("call-1");
    let mut store = store_with_calls(&provider, &[PHONE_A, PHONE_B]);
    provider.finish("call-2", CallOutcome::Success, PAYLOAD);

    let report = check_status(&mut store, &provider).expect("check");

    assert_eq!(report.checked, 2);
    assert_eq!(report.updated, 1);
    let failed = &report.results[0];
    assert_eq!(failed.outcome, ReconcileOutcome::Error);
    assert_eq!(failed.error.as_ref().map(|e| e.kind.as_str()), Some("dispatch"));
    assert_eq!(store.get(1).expect("lead").status, LeadStatus::Calling);
    assert_eq!(store.get(2).expect("lead").status, LeadStatus::Completed);
}

#[test]
fn second_run_changes_nothing() {
    let provider = ScriptedProvider::default();
    let mut store = store_with_calls(&provider, &[PHONE_A]);
    provider.finish("call-1", CallOutcome::Success, PAYLOAD);

    let first = check_status(&mut store, &provider).expect("first");
    let second = check_status(&mut store, &provider).expect("second");

    assert_eq!(first.updated, 1);
    assert_eq!(second.checked, 0);
    assert_eq!(second.updated, 0);
    assert_eq!(store.get(1).expect("lead").feedback.as_deref(), Some(PAYLOAD));
}

#[test]
fn only_calling_leads_are_polled() {
    let provider = ScriptedProvider::default();
    let mut store = seeded_store(&[PHONE_A, PHONE_B, PHONE_C]);
    dispatch(&mut store, &provider, 2).expect("dispatch lead 2");

    check_status(&mut store, &provider).expect("check");

    assert_eq!(*provider.polled.borrow(), vec!["call-1".to_string()]);
    assert_eq!(store.get(1).expect("lead").status, LeadStatus::Pending);
}

#[test]
fn no_calling_leads_yields_empty_report() {
    let provider = ScriptedProvider::default();
    let mut store = seeded_store(&[PHONE_A]);
    let report = check_status(&mut store, &provider).expect("check");
    assert_eq!(report, ReconcileReport::default());
}

#[test]
fn lead_deleted_during_check_is_skipped() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("leads.json");
    let provider = ScriptedProvider::default();
    let mut store = seeded_file_store(&path, &[PHONE_A, PHONE_B]);
    dispatch(&mut store, &provider, 1).expect("dispatch 1");
    dispatch(&mut store, &provider, 2).expect("dispatch 2");
    provider.finish("call-1", CallOutcome::Success, PAYLOAD);
    provider.finish("call-2", CallOutcome::Success, PAYLOAD);
    let other = path.clone();
    provider.on_poll("call-1", move || {
        let mut operator = LeadStore::open(&other);
        operator.delete(1).expect("delete while checking");
    });

    let report = check_status(&mut store, &provider).expect("check");

    assert_eq!(report.checked, 2);
    assert_eq!(report.updated, 1);
    assert!(report.results.iter().all(|entry| entry.lead_id != 1));
    assert!(matches!(store.get(1), Err(LeadError::NotFound(1))));
    assert_eq!(store.get(2).expect("lead 2").status, LeadStatus::Completed);
}

#[test]
fn lead_finalized_during_check_keeps_its_feedback() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("leads.json");
    let provider = ScriptedProvider::default();
    let mut store = seeded_file_store(&path, &[PHONE_A, PHONE_B]);
    dispatch(&mut store, &provider, 1).expect("dispatch 1");
    dispatch(&mut store, &provider, 2).expect("dispatch 2");
    provider.finish("call-1", CallOutcome::Success, PAYLOAD);
    provider.finish("call-2", CallOutcome::Declined, "{}");
    let earlier = r#"{"summary":"Recorded by another run"}"#;
    let other = path.clone();
    provider.on_poll("call-1", move || {
        let mut watcher = LeadStore::open(&other);
        watcher
            .update_status(1, StatusUpdate::terminal(LeadStatus::Completed, earlier))
            .expect("finish from another run");
    });
    let other = path.clone();
    provider.on_poll("call-2", move || {
        let mut watcher = LeadStore::open(&other);
        watcher
            .update_status(2, StatusUpdate::terminal(LeadStatus::Completed, earlier))
            .expect("finish from another run");
    });

    let report = check_status(&mut store, &provider).expect("check");

    assert_eq!(report.checked, 2);
    assert_eq!(report.updated, 0);
    assert!(report.results.is_empty());
    let first = store.get(1).expect("lead 1");
    assert_eq!(first.status, LeadStatus::Completed);
    assert_eq!(first.feedback.as_deref(), Some(earlier));
    let second = store.get(2).expect("lead 2");
    assert_eq!(second.status, LeadStatus::Completed);
    assert_eq!(second.feedback.as_deref(), Some(earlier));
}

//! Status reconciliation for leads with calls in flight.
use crate::error::{ErrorReport, LeadError, LeadResult};
use crate::feedback;
use crate::lead::{LeadId, LeadStatus};
use crate::provider::{CallOutcome, CallProvider, CallResult};
use crate::store::{LeadStore, StatusUpdate};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReconcileOutcome {
    StillPending,
    Completed,
    Rejected,
    Error,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReconcileEntry {
    pub lead_id: LeadId,
    pub name: String,
    pub outcome: ReconcileOutcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorReport>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ReconcileReport {
    pub checked: usize,
    pub updated: usize,
    pub results: Vec<ReconcileEntry>,
}

/// Poll the provider for every `calling` lead and record finished calls.
///
/// A provider error leaves the lead `calling` for the next run. Leads that
/// moved out of `calling` since the snapshot are skipped.
pub fn check_status<P: CallProvider>(
    store: &mut LeadStore,
    provider: &P,
) -> LeadResult<ReconcileReport> {
    let snapshot = store.list_with_status(LeadStatus::Calling)?;
    let mut report = ReconcileReport::default();
    for lead in snapshot {
        report.checked += 1;
        let Some(call_id) = lead.provider_call_id.as_deref() else {
            tracing::warn!(lead_id = lead.id, "calling lead has no provider call id");
            continue;
        };
        let entry = |outcome, error| ReconcileEntry {
            lead_id: lead.id,
            name: lead.name.clone(),
            outcome,
            error,
        };
        let result = match provider.get_call_result(call_id) {
            Ok(result) => result,
            Err(source) => {
                tracing::warn!(lead_id = lead.id, call_id, error = %source, "call status check failed");
                let err = LeadError::Dispatch { id: lead.id, source };
                report
                    .results
                    .push(entry(ReconcileOutcome::Error, Some(err.report())));
                continue;
            }
        };
        let (raw_payload, outcome) = match result {
            CallResult::Pending => {
                tracing::debug!(lead_id = lead.id, call_id, "call still in progress");
                report
                    .results
                    .push(entry(ReconcileOutcome::StillPending, None));
                continue;
            }
            CallResult::Ended {
                raw_payload,
                outcome,
            } => (raw_payload, outcome),
        };
        let (status, outcome) = match outcome {
            CallOutcome::Success => (LeadStatus::Completed, ReconcileOutcome::Completed),
            CallOutcome::Declined => (LeadStatus::Rejected, ReconcileOutcome::Rejected),
        };
        let parsed = feedback::normalize(Some(&raw_payload));
        tracing::debug!(lead_id = lead.id, source = ?parsed.source, "feedback payload received");
        match store.update_status(lead.id, StatusUpdate::terminal(status, &raw_payload)) {
            Ok(()) => {
                report.updated += 1;
                report.results.push(entry(outcome, None));
            }
            Err(LeadError::InvalidTransition { from, .. }) => {
                tracing::info!(lead_id = lead.id, status = %from, "lead changed during check, skipped");
            }
            Err(LeadError::NotFound(_)) => {
                tracing::info!(lead_id = lead.id, "lead deleted during check, skipped");
            }
            Err(err) => return Err(err),
        }
    }
    tracing::info!(
        checked = report.checked,
        updated = report.updated,
        "status check finished"
    );
    Ok(report)
}

#[cfg(test)]
#[path = "reconcile_tests.rs"]
mod tests;

//! Outbound call dispatch, single and bulk.
//!
//! A lead only moves to `calling` after the provider returns a call id. A
//! failed placement leaves it `pending` so it can be retried.
use crate::error::{ErrorReport, LeadError, LeadResult};
use crate::lead::{Lead, LeadId, LeadStatus};
use crate::provider::{CallProvider, CallRequest, ProviderError};
use crate::store::{LeadStore, StatusUpdate};
use crate::util::now_epoch_ms;
use serde::Serialize;

/// Place a call for one `pending` lead and return the provider call id.
pub fn dispatch<P: CallProvider>(
    store: &mut LeadStore,
    provider: &P,
    lead_id: LeadId,
) -> LeadResult<String> {
    let lead = store.get(lead_id)?;
    dispatch_lead(store, provider, &lead)
}

fn dispatch_lead<P: CallProvider>(
    store: &mut LeadStore,
    provider: &P,
    lead: &Lead,
) -> LeadResult<String> {
    if lead.status != LeadStatus::Pending {
        return Err(LeadError::InvalidTransition {
            id: lead.id,
            from: lead.status,
            to: LeadStatus::Calling,
        });
    }
    let request = CallRequest {
        name: lead.name.clone(),
        phone: lead.phone.clone(),
        email: lead.email.clone(),
    };
    let call_id = provider
        .place_call(&request)
        .map_err(|source| LeadError::Dispatch { id: lead.id, source })?;
    let call_id = call_id.trim().to_string();
    if call_id.is_empty() {
        return Err(LeadError::Dispatch {
            id: lead.id,
            source: ProviderError::new("voice_provider", "missing_call_id"),
        });
    }
    store.update_status(lead.id, StatusUpdate::calling(&call_id, now_epoch_ms()?))?;
    tracing::info!(lead_id = lead.id, call_id = %call_id, "call dispatched");
    Ok(call_id)
}

/// Outcome of dispatching one lead inside a bulk run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BulkDispatchEntry {
    pub lead_id: LeadId,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider_call_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorReport>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BulkDispatchReport {
    pub attempted: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub results: Vec<BulkDispatchEntry>,
}

/// Dispatch every lead that is `pending` right now.
///
/// Each lead is attempted independently. A failure is recorded in the report
/// and the run moves on. Failed leads stay `pending` until the next explicit
/// dispatch.
pub fn dispatch_all_pending<P: CallProvider>(
    store: &mut LeadStore,
    provider: &P,
) -> LeadResult<BulkDispatchReport> {
    let snapshot = store.list_with_status(LeadStatus::Pending)?;
    let mut report = BulkDispatchReport::default();
    for lead in snapshot {
        report.attempted += 1;
        let entry = match dispatch_lead(store, provider, &lead) {
            Ok(call_id) => {
                report.succeeded += 1;
                BulkDispatchEntry {
                    lead_id: lead.id,
                    name: lead.name.clone(),
                    provider_call_id: Some(call_id),
                    error: None,
                }
            }
            Err(err) => {
                tracing::warn!(lead_id = lead.id, error = %err, "bulk dispatch failed for lead");
                report.failed += 1;
                BulkDispatchEntry {
                    lead_id: lead.id,
                    name: lead.name.clone(),
                    provider_call_id: None,
                    error: Some(err.report()),
                }
            }
        };
        report.results.push(entry);
    }
    tracing::info!(
        attempted = report.attempted,
        succeeded = report.succeeded,
        "bulk dispatch finished"
    );
    Ok(report)
}

#[cfg(test)]
#[path = "dispatch_tests.rs"]
mod tests;

//! Request/response surface over the lead engine.
//!
//! The CLI talks only to [`LeadService`]. Operations that change lead state
//! take a [`Session`]; read-only operations do not.
use crate::dispatch::{self, BulkDispatchReport};
use crate::error::{LeadError, LeadResult};
use crate::feedback::{self, ParsedFeedback};
use crate::intake;
use crate::lead::{sort_for_display, Campaign, Lead, LeadId, LeadStatus, NewLead};
use crate::provider::CallProvider;
use crate::reconcile::{self, ReconcileReport};
use crate::session::Session;
use crate::store::{LeadStats, LeadStore};
use serde::Serialize;
use std::io::Read;

/// Filters for [`LeadService::list_leads`].
#[derive(Debug, Clone, Copy, Default)]
pub struct LeadFilter {
    pub status: Option<LeadStatus>,
    pub campaign: Option<Campaign>,
}

impl LeadFilter {
    fn matches(&self, lead: &Lead) -> bool {
        self.status.is_none_or(|status| lead.status == status)
            && self.campaign.is_none_or(|campaign| lead.campaign == campaign)
    }
}

/// Lead plus its table preview.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LeadRow {
    #[serde(flatten)]
    pub lead: Lead,
    pub feedback_preview: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImportReport {
    pub imported: usize,
    pub leads: Vec<Lead>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DispatchReceipt {
    pub lead_id: LeadId,
    pub provider_call_id: String,
}

/// Raw and normalized feedback for one lead.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeedbackView {
    pub lead_id: LeadId,
    pub name: String,
    pub status: LeadStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw: Option<String>,
    pub parsed: ParsedFeedback,
}

pub struct LeadService<P> {
    store: LeadStore,
    provider: Option<P>,
}

impl<P: CallProvider> LeadService<P> {
    /// Service without a call provider; call operations fail with `config`.
    pub fn new(store: LeadStore) -> Self {
        Self {
            store,
            provider: None,
        }
    }

    pub fn with_provider(mut self, provider: P) -> Self {
        self.provider = Some(provider);
        self
    }

    /// Create a lead in the session's campaign.
    pub fn create_lead(
        &mut self,
        session: &Session,
        name: &str,
        phone: &str,
        email: &str,
    ) -> LeadResult<Lead> {
        let new = NewLead::new(name, phone, email).with_campaign(session.campaign);
        self.store.create(&new)
    }

    /// Import every row of a CSV file, or none of them.
    pub fn import_leads<R: Read>(&mut self, session: &Session, input: R) -> LeadResult<ImportReport> {
        let rows = intake::read_leads(input, session.campaign)?;
        let leads = self.store.create_many(&rows)?;
        tracing::info!(operator = %session.operator, count = leads.len(), "csv import");
        Ok(ImportReport {
            imported: leads.len(),
            leads,
        })
    }

    /// Leads in display order.
    pub fn list_leads(&self, filter: LeadFilter) -> LeadResult<Vec<LeadRow>> {
        let mut leads = self.store.list()?;
        leads.retain(|lead| filter.matches(lead));
        sort_for_display(&mut leads);
        Ok(leads
            .into_iter()
            .map(|lead| {
                let feedback_preview = feedback::preview(lead.feedback.as_deref());
                LeadRow {
                    lead,
                    feedback_preview,
                }
            })
            .collect())
    }

    pub fn get_lead(&self, id: LeadId) -> LeadResult<Lead> {
        self.store.get(id)
    }

    pub fn lead_feedback(&self, id: LeadId) -> LeadResult<FeedbackView> {
        let lead = self.store.get(id)?;
        let parsed = feedback::normalize(lead.feedback.as_deref());
        Ok(FeedbackView {
            lead_id: lead.id,
            name: lead.name,
            status: lead.status,
            raw: lead.feedback,
            parsed,
        })
    }

    pub fn dispatch_lead(&mut self, session: &Session, id: LeadId) -> LeadResult<DispatchReceipt> {
        let provider = self.provider.as_ref().ok_or_else(no_provider)?;
        let provider_call_id = dispatch::dispatch(&mut self.store, provider, id)?;
        tracing::debug!(operator = %session.operator, lead_id = id, "dispatch requested");
        Ok(DispatchReceipt {
            lead_id: id,
            provider_call_id,
        })
    }

    pub fn dispatch_all(&mut self, session: &Session) -> LeadResult<BulkDispatchReport> {
        let provider = self.provider.as_ref().ok_or_else(no_provider)?;
        tracing::debug!(operator = %session.operator, "bulk dispatch requested");
        dispatch::dispatch_all_pending(&mut self.store, provider)
    }

    pub fn check_status(&mut self, session: &Session) -> LeadResult<ReconcileReport> {
        let provider = self.provider.as_ref().ok_or_else(no_provider)?;
        tracing::debug!(operator = %session.operator, "status check requested");
        reconcile::check_status(&mut self.store, provider)
    }

    pub fn delete_lead(&mut self, session: &Session, id: LeadId) -> LeadResult<Lead> {
        let removed = self.store.delete(id)?;
        tracing::info!(operator = %session.operator, lead_id = id, "lead removed");
        Ok(removed)
    }

    /// Status counts, optionally limited to one campaign.
    pub fn stats(&self, campaign: Option<Campaign>) -> LeadResult<LeadStats> {
        match campaign {
            Some(campaign) => Ok(LeadStats::tally(&self.store.list_campaign(campaign)?)),
            None => self.store.stats(),
        }
    }
}

fn no_provider() -> LeadError {
    LeadError::Config("no call provider configured".to_string())
}

#[cfg(test)]
#[path = "service_tests.rs"]
mod tests;

//! Lead records and the call-status lifecycle.
//!
//! A lead starts `pending`, moves to `calling` once the provider hands back a
//! call id, and ends `completed` or `rejected`. Terminal states never move.
use crate::error::{LeadError, LeadResult};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

pub type LeadId = u64;

/// Call status of a lead.
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum LeadStatus {
    Pending,
    Calling,
    Completed,
    Rejected,
}

impl LeadStatus {
    /// Return the stable string identifier used in JSON artifacts.
    pub fn as_str(&self) -> &'static str {
        match self {
            LeadStatus::Pending => "pending",
            LeadStatus::Calling => "calling",
            LeadStatus::Completed => "completed",
            LeadStatus::Rejected => "rejected",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, LeadStatus::Completed | LeadStatus::Rejected)
    }

    /// Whether the lifecycle permits moving from `self` to `next`.
    ///
    /// Re-applying a terminal status is handled by the store, which needs the
    /// feedback payload to decide between a no-op and a conflict.
    pub fn can_transition_to(&self, next: LeadStatus) -> bool {
        matches!(
            (self, next),
            (LeadStatus::Pending, LeadStatus::Calling)
                | (LeadStatus::Calling, LeadStatus::Completed)
                | (LeadStatus::Calling, LeadStatus::Rejected)
        )
    }

    /// Rank used by the lead table: finished calls first, untouched leads last.
    pub fn display_rank(&self) -> u8 {
        match self {
            LeadStatus::Completed => 0,
            LeadStatus::Rejected => 1,
            LeadStatus::Calling => 2,
            LeadStatus::Pending => 3,
        }
    }
}

impl fmt::Display for LeadStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LeadStatus {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(LeadStatus::Pending),
            "calling" => Ok(LeadStatus::Calling),
            "completed" => Ok(LeadStatus::Completed),
            "rejected" => Ok(LeadStatus::Rejected),
            other => Err(format!(
                "unknown status {other:?} (expected pending, calling, completed or rejected)"
            )),
        }
    }
}

/// Campaign a lead was captured for.
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum Campaign {
    #[default]
    Feedback,
    Marketing,
}

impl Campaign {
    pub fn as_str(&self) -> &'static str {
        match self {
            Campaign::Feedback => "feedback",
            Campaign::Marketing => "marketing",
        }
    }
}

impl fmt::Display for Campaign {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Campaign {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "feedback" => Ok(Campaign::Feedback),
            "marketing" => Ok(Campaign::Marketing),
            other => Err(format!(
                "unknown campaign {other:?} (expected feedback or marketing)"
            )),
        }
    }
}

/// A customer contact tracked through the call workflow.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct Lead {
    pub id: LeadId,
    pub name: String,
    pub phone: String,
    pub email: String,
    pub status: LeadStatus,
    #[serde(default)]
    pub campaign: Campaign,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider_call_id: Option<String>,
    /// Raw provider payload, exactly as received.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feedback: Option<String>,
    pub created_at_epoch_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub called_at_epoch_ms: Option<u64>,
}

/// Contact fields supplied at intake, before an id is assigned.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct NewLead {
    pub name: String,
    pub phone: String,
    pub email: String,
    #[serde(default)]
    pub campaign: Campaign,
}

impl NewLead {
    pub fn new(name: &str, phone: &str, email: &str) -> Self {
        Self {
            name: name.to_string(),
            phone: phone.to_string(),
            email: email.to_string(),
            campaign: Campaign::default(),
        }
    }

    pub fn with_campaign(mut self, campaign: Campaign) -> Self {
        self.campaign = campaign;
        self
    }

    /// Trim and validate the contact fields.
    pub fn validated(&self) -> LeadResult<NewLead> {
        let name = required_field("name", &self.name)?;
        let phone = required_field("phone", &self.phone)?;
        let email = required_field("email", &self.email)?;
        if !phone_pattern().is_match(&phone) {
            return Err(LeadError::Validation(format!(
                "phone {phone:?} is not a valid phone number"
            )));
        }
        let digits = phone.chars().filter(|c| c.is_ascii_digit()).count();
        if !(MIN_PHONE_DIGITS..=MAX_PHONE_DIGITS).contains(&digits) {
            return Err(LeadError::Validation(format!(
                "phone {phone:?} must have {MIN_PHONE_DIGITS}-{MAX_PHONE_DIGITS} digits"
            )));
        }
        if !email_pattern().is_match(&email) {
            return Err(LeadError::Validation(format!(
                "email {email:?} is not a valid email address"
            )));
        }
        Ok(NewLead {
            name,
            phone,
            email,
            campaign: self.campaign,
        })
    }
}

const MIN_PHONE_DIGITS: usize = 7;
const MAX_PHONE_DIGITS: usize = 15;

fn required_field(label: &str, value: &str) -> LeadResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(LeadError::Validation(format!("{label} is required")));
    }
    Ok(trimmed.to_string())
}

fn phone_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^\+?[0-9][0-9 ().\-]*[0-9]$").expect("regex for phone numbers")
    })
}

fn email_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("regex for email addresses")
    })
}

/// Ordering used when presenting leads: status rank, then newest first.
pub fn display_order(a: &Lead, b: &Lead) -> Ordering {
    a.status
        .display_rank()
        .cmp(&b.status.display_rank())
        .then_with(|| b.created_at_epoch_ms.cmp(&a.created_at_epoch_ms))
        .then_with(|| b.id.cmp(&a.id))
}

/// Sort leads in place for display. The store's base order is not used.
pub fn sort_for_display(leads: &mut [Lead]) {
    leads.sort_by(display_order);
}

#[cfg(test)]
#[path = "lead_tests.rs"]
mod tests;

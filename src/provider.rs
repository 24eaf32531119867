//! External voice-call provider seam.
//!
//! The engine only needs two capabilities: place a call and fetch its
//! result. Everything provider-specific, including which outcome counts as
//! a decline, stays behind [`CallProvider`].
mod http;

pub use http::HttpCallProvider;

use serde::Serialize;

/// Contact details sent with an outbound call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CallRequest {
    pub name: String,
    pub phone: String,
    pub email: String,
}

/// How an ended call resolved from the customer's side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CallOutcome {
    Success,
    Declined,
}

/// Provider view of a previously placed call.
#[derive(Debug, Clone, PartialEq)]
pub enum CallResult {
    /// The call has not finished yet.
    Pending,
    Ended {
        raw_payload: String,
        outcome: CallOutcome,
    },
}

/// Failure talking to the provider.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{provider} {kind}{}", detail_suffix(.status, .detail))]
pub struct ProviderError {
    pub provider: &'static str,
    /// Short classification such as `timeout`, `http_status`, `json_parse`.
    pub kind: &'static str,
    pub status: Option<u16>,
    pub detail: Option<String>,
}

impl ProviderError {
    pub fn new(provider: &'static str, kind: &'static str) -> Self {
        Self {
            provider,
            kind,
            status: None,
            detail: None,
        }
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }
}

fn detail_suffix(status: &Option<u16>, detail: &Option<String>) -> String {
    match (status, detail) {
        (Some(status), Some(detail)) => format!(" (HTTP {status}: {detail})"),
        (Some(status), None) => format!(" (HTTP {status})"),
        (None, Some(detail)) => format!(" ({detail})"),
        (None, None) => String::new(),
    }
}

/// Capability the dispatchers and reconciler consume.
pub trait CallProvider {
    /// Place an outbound call and return the provider's call id.
    fn place_call(&self, request: &CallRequest) -> Result<String, ProviderError>;

    /// Fetch the current result for a call id returned by `place_call`.
    fn get_call_result(&self, call_id: &str) -> Result<CallResult, ProviderError>;
}

impl<P: CallProvider + ?Sized> CallProvider for &P {
    fn place_call(&self, request: &CallRequest) -> Result<String, ProviderError> {
        (**self).place_call(request)
    }

    fn get_call_result(&self, call_id: &str) -> Result<CallResult, ProviderError> {
        (**self).get_call_result(call_id)
    }
}

impl<P: CallProvider + ?Sized> CallProvider for Box<P> {
    fn place_call(&self, request: &CallRequest) -> Result<String, ProviderError> {
        (**self).place_call(request)
    }

    fn get_call_result(&self, call_id: &str) -> Result<CallResult, ProviderError> {
        (**self).get_call_result(call_id)
    }
}

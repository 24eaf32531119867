//! HTTP client for a Vapi-style voice-call REST API.
//!
//! `POST {base}/call` places a call and returns its `id`. `GET {base}/call/{id}`
//! returns the call object, which is flattened into the raw feedback payload
//! once the call's `status` is `ended`.
use super::{CallOutcome, CallProvider, CallRequest, CallResult, ProviderError};
use crate::config::ProviderConfig;
use anyhow::{anyhow, Result};
use serde_json::{json, Map, Value};
use std::time::Duration;

const PROVIDER: &str = "voice_provider";
const USER_AGENT: &str = concat!("leadcall/", env!("CARGO_PKG_VERSION"));
const MAX_ERROR_DETAIL_CHARS: usize = 200;

pub struct HttpCallProvider {
    agent: ureq::Agent,
    base_url: String,
    api_key: String,
    assistant_id: Option<String>,
    phone_number_id: Option<String>,
    default_country_code: Option<String>,
    declined_reasons: Vec<String>,
}

impl HttpCallProvider {
    pub fn new(config: &ProviderConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
            .ok_or_else(|| anyhow!("provider api_key is not configured"))?;
        let agent: ureq::Agent = ureq::Agent::config_builder()
            .timeout_global(Some(Duration::from_millis(config.timeout_ms)))
            .http_status_as_error(false)
            .build()
            .into();
        Ok(Self {
            agent,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            assistant_id: config.assistant_id.clone(),
            phone_number_id: config.phone_number_id.clone(),
            default_country_code: config.default_country_code.clone(),
            declined_reasons: config.declined_reasons.clone(),
        })
    }

    fn read_json(
        &self,
        mut response: ureq::http::Response<ureq::Body>,
    ) -> Result<Value, ProviderError> {
        let status = response.status().as_u16();
        if !(200..300).contains(&status) {
            let body = response.body_mut().read_to_string().unwrap_or_default();
            let mut err = ProviderError::new(PROVIDER, "http_status").with_status(status);
            let detail = error_detail(&body);
            if !detail.is_empty() {
                err = err.with_detail(detail);
            }
            return Err(err);
        }
        response
            .body_mut()
            .read_json::<Value>()
            .map_err(|err| ProviderError::new(PROVIDER, "json_parse").with_detail(err.to_string()))
    }
}

impl CallProvider for HttpCallProvider {
    fn place_call(&self, request: &CallRequest) -> Result<String, ProviderError> {
        let payload = place_call_payload(
            request,
            self.assistant_id.as_deref(),
            self.phone_number_id.as_deref(),
            self.default_country_code.as_deref(),
        );
        let url = format!("{}/call", self.base_url);
        tracing::debug!(%url, phone = %request.phone, "placing call");
        let response = self
            .agent
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Accept", "application/json")
            .header("User-Agent", USER_AGENT)
            .send_json(&payload)
            .map_err(provider_error_from_ureq)?;
        let body = self.read_json(response)?;
        call_id_from_json(&body)
    }

    fn get_call_result(&self, call_id: &str) -> Result<CallResult, ProviderError> {
        let url = format!("{}/call/{}", self.base_url, call_id);
        tracing::debug!(%url, "fetching call result");
        let response = self
            .agent
            .get(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Accept", "application/json")
            .header("User-Agent", USER_AGENT)
            .call()
            .map_err(provider_error_from_ureq)?;
        let body = self.read_json(response)?;
        Ok(call_result_from_json(&body, &self.declined_reasons))
    }
}

/// Build the `POST /call` body.
pub(crate) fn place_call_payload(
    request: &CallRequest,
    assistant_id: Option<&str>,
    phone_number_id: Option<&str>,
    default_country_code: Option<&str>,
) -> Value {
    let mut body = Map::new();
    if let Some(id) = assistant_id {
        body.insert("assistantId".to_string(), json!(id));
    }
    if let Some(id) = phone_number_id {
        body.insert("phoneNumberId".to_string(), json!(id));
    }
    body.insert(
        "customer".to_string(),
        json!({
            "number": e164_number(&request.phone, default_country_code),
            "name": request.name,
            "email": request.email,
        }),
    );
    Value::Object(body)
}

/// Strip separators and apply the default country code when the number has
/// no leading `+`.
pub(crate) fn e164_number(phone: &str, default_country_code: Option<&str>) -> String {
    let digits: String = phone.chars().filter(char::is_ascii_digit).collect();
    if phone.trim_start().starts_with('+') {
        return format!("+{digits}");
    }
    match default_country_code {
        Some(code) => format!("+{}{digits}", code.trim_start_matches('+')),
        None => digits,
    }
}

pub(crate) fn call_id_from_json(body: &Value) -> Result<String, ProviderError> {
    body.get("id")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(str::to_string)
        .ok_or_else(|| ProviderError::new(PROVIDER, "missing_call_id"))
}

/// Map a provider call object onto the engine's result type.
///
/// Only `status == "ended"` is final. The raw payload keeps the fields the
/// feedback normalizer reads, in the provider's own naming.
pub(crate) fn call_result_from_json(body: &Value, declined_reasons: &[String]) -> CallResult {
    let status = body.get("status").and_then(Value::as_str).unwrap_or_default();
    if status != "ended" {
        return CallResult::Pending;
    }

    let mut payload = Map::new();
    let summary =
        string_at(body, &["summary"]).or_else(|| string_at(body, &["analysis", "summary"]));
    if let Some(summary) = summary {
        payload.insert("summary".to_string(), json!(summary));
    }
    let transcript =
        string_at(body, &["transcript"]).or_else(|| string_at(body, &["artifact", "transcript"]));
    if let Some(transcript) = transcript {
        payload.insert("transcript".to_string(), json!(transcript));
    }
    if let Some(duration) = call_duration_secs(body) {
        payload.insert("duration".to_string(), json!(duration));
    }
    let ended_reason = string_at(body, &["endedReason"]);
    if let Some(reason) = ended_reason.as_deref() {
        payload.insert("endedReason".to_string(), json!(reason));
    }
    payload.insert("status".to_string(), json!(status));
    if let Some(analysis) = body.get("analysis").filter(|value| value.is_object()) {
        payload.insert("analysis".to_string(), analysis.clone());
    }

    let declined = ended_reason.as_deref().is_some_and(|reason| {
        declined_reasons
            .iter()
            .any(|declined| declined.eq_ignore_ascii_case(reason))
    });
    CallResult::Ended {
        raw_payload: Value::Object(payload).to_string(),
        outcome: if declined {
            CallOutcome::Declined
        } else {
            CallOutcome::Success
        },
    }
}

fn string_at(body: &Value, path: &[&str]) -> Option<String> {
    let mut current = body;
    for key in path {
        current = current.get(key)?;
    }
    current
        .as_str()
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .map(str::to_string)
}

fn call_duration_secs(body: &Value) -> Option<f64> {
    if let Some(seconds) = body.get("duration").and_then(Value::as_f64) {
        return Some(seconds);
    }
    let started = string_at(body, &["startedAt"])?;
    let ended = string_at(body, &["endedAt"])?;
    let started = chrono::DateTime::parse_from_rfc3339(&started).ok()?;
    let ended = chrono::DateTime::parse_from_rfc3339(&ended).ok()?;
    let millis = (ended - started).num_milliseconds();
    (millis >= 0).then_some(millis as f64 / 1000.0)
}

fn error_detail(body: &str) -> String {
    let message = serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|value| {
            value
                .get("message")
                .map(|message| match message {
                    Value::String(text) => text.clone(),
                    other => other.to_string(),
                })
        })
        .unwrap_or_else(|| body.trim().to_string());
    crate::util::truncate_chars(&message, MAX_ERROR_DETAIL_CHARS)
}

fn provider_error_from_ureq(err: ureq::Error) -> ProviderError {
    let rendered = err.to_string();
    ProviderError::new(PROVIDER, classify_transport_error_kind(&rendered)).with_detail(rendered)
}

fn classify_transport_error_kind(raw: &str) -> &'static str {
    let lower = raw.to_ascii_lowercase();
    if lower.contains("timeout") || lower.contains("timed out") {
        "timeout"
    } else if lower.contains("tls") || lower.contains("ssl") || lower.contains("certificate") {
        "tls"
    } else if lower.contains("dns") || lower.contains("host not found") {
        "dns"
    } else if lower.contains("connection") || lower.contains("connect") {
        "connection"
    } else {
        "transport"
    }
}

#[cfg(test)]
#[path = "http_tests.rs"]
mod tests;

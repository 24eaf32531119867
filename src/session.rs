//! Operator session.
//!
//! A session is an explicit value rather than ambient state. Mutating lead
//! operations take a `&Session`, so they cannot run without one. No
//! credentials are checked; the session only records who is operating and
//! which campaign new leads belong to.
use crate::error::{LeadError, LeadResult};
use crate::lead::Campaign;
use crate::paths::DataPaths;
use crate::util::now_epoch_ms;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::fs;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Session {
    pub operator: String,
    #[serde(default)]
    pub campaign: Campaign,
    pub started_at_epoch_ms: u64,
}

impl Session {
    /// Start an in-process session without persisting it.
    pub fn begin(operator: &str, campaign: Campaign) -> LeadResult<Self> {
        let operator = operator.trim();
        if operator.is_empty() {
            return Err(LeadError::Validation(
                "operator must be non-empty".to_string(),
            ));
        }
        Ok(Self {
            operator: operator.to_string(),
            campaign,
            started_at_epoch_ms: now_epoch_ms()?,
        })
    }
}

/// Open a session and write it to `session.json`, replacing any previous one.
pub fn login(paths: &DataPaths, operator: &str, campaign: Campaign) -> LeadResult<Session> {
    let session = Session::begin(operator, campaign)?;
    let path = paths.session_path();
    fs::create_dir_all(paths.root())
        .with_context(|| format!("create data dir {}", paths.root().display()))?;
    let text = serde_json::to_string_pretty(&session).context("serialize session")?;
    fs::write(&path, text.as_bytes()).with_context(|| format!("write {}", path.display()))?;
    tracing::info!(operator = %session.operator, campaign = %session.campaign, "session opened");
    Ok(session)
}

/// Load the current session; a missing file is `Unauthorized`.
pub fn load(paths: &DataPaths) -> LeadResult<Session> {
    let path = paths.session_path();
    if !path.is_file() {
        return Err(LeadError::Unauthorized);
    }
    let bytes = fs::read(&path).with_context(|| format!("read {}", path.display()))?;
    let session: Session = serde_json::from_slice(&bytes)
        .with_context(|| format!("parse session {}", path.display()))?;
    Ok(session)
}

/// Close the current session. Returns the session that was closed, if any.
pub fn logout(paths: &DataPaths) -> LeadResult<Option<Session>> {
    let closed = match load(paths) {
        Ok(session) => Some(session),
        Err(LeadError::Unauthorized) => return Ok(None),
        // An unreadable session file is still removed.
        Err(err) => {
            tracing::warn!(error = %err, "discarding unreadable session");
            None
        }
    };
    let path = paths.session_path();
    fs::remove_file(&path).with_context(|| format!("remove {}", path.display()))?;
    tracing::info!("session closed");
    Ok(closed)
}

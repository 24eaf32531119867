//! Configuration helpers.
//!
//! Config lives at `<data_dir>/config.json`. Provider credentials can be
//! overridden from the environment, which wins over the file:
//! 1. `LEADCALL_PROVIDER_URL`, `LEADCALL_API_KEY`, `LEADCALL_ASSISTANT_ID`,
//!    `LEADCALL_PHONE_NUMBER_ID`
//! 2. `config.json`
//! 3. built-in defaults
use crate::paths::DataPaths;
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;

pub const CONFIG_SCHEMA_VERSION: u32 = 1;
pub const DEFAULT_PROVIDER_URL: &str = "https://api.vapi.ai";
const DEFAULT_TIMEOUT_MS: u64 = 30_000;

pub const ENV_PROVIDER_URL: &str = "LEADCALL_PROVIDER_URL";
pub const ENV_API_KEY: &str = "LEADCALL_API_KEY";
pub const ENV_ASSISTANT_ID: &str = "LEADCALL_ASSISTANT_ID";
pub const ENV_PHONE_NUMBER_ID: &str = "LEADCALL_PHONE_NUMBER_ID";

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct LeadcallConfig {
    pub schema_version: u32,
    #[serde(default)]
    pub provider: ProviderConfig,
}

/// Voice-call provider settings.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ProviderConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assistant_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone_number_id: Option<String>,
    /// Prefixed to numbers entered without a leading `+`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_country_code: Option<String>,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    /// Provider `endedReason` values that mark a lead `rejected`.
    #[serde(default = "default_declined_reasons")]
    pub declined_reasons: Vec<String>,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_key: None,
            assistant_id: None,
            phone_number_id: None,
            default_country_code: None,
            timeout_ms: default_timeout_ms(),
            declined_reasons: default_declined_reasons(),
        }
    }
}

fn default_base_url() -> String {
    DEFAULT_PROVIDER_URL.to_string()
}

fn default_timeout_ms() -> u64 {
    DEFAULT_TIMEOUT_MS
}

fn default_declined_reasons() -> Vec<String> {
    vec!["customer-busy".to_string()]
}

/// Build the default config used when none exists yet.
pub fn default_config() -> LeadcallConfig {
    LeadcallConfig {
        schema_version: CONFIG_SCHEMA_VERSION,
        provider: ProviderConfig::default(),
    }
}

/// Load `config.json`, falling back to defaults when it is absent.
pub fn load_config(paths: &DataPaths) -> Result<LeadcallConfig> {
    let path = paths.config_path();
    if !path.is_file() {
        return Ok(default_config());
    }
    let bytes = fs::read(&path).with_context(|| format!("read config {}", path.display()))?;
    let config: LeadcallConfig =
        serde_json::from_slice(&bytes).context("parse leadcall config JSON")?;
    Ok(config)
}

/// Persist a config to disk in a stable JSON format.
pub fn write_config(paths: &DataPaths, config: &LeadcallConfig) -> Result<()> {
    let path = paths.config_path();
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).context("create data dir")?;
    }
    let text = serde_json::to_string_pretty(config).context("serialize leadcall config")?;
    fs::write(&path, text.as_bytes()).with_context(|| format!("write {}", path.display()))?;
    Ok(())
}

/// Validate schema version and provider settings.
pub fn validate_config(config: &LeadcallConfig) -> Result<()> {
    if config.schema_version != CONFIG_SCHEMA_VERSION {
        return Err(anyhow!(
            "unsupported leadcall config schema_version {}",
            config.schema_version
        ));
    }
    let base_url = config.provider.base_url.trim();
    if base_url.is_empty() {
        return Err(anyhow!("provider.base_url must be non-empty"));
    }
    if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
        return Err(anyhow!(
            "provider.base_url must start with http:// or https:// (got {base_url:?})"
        ));
    }
    if config.provider.timeout_ms == 0 {
        return Err(anyhow!("provider.timeout_ms must be greater than zero"));
    }
    Ok(())
}

/// Apply environment overrides using `lookup` to read variables.
pub fn apply_env_overrides<F>(config: &mut LeadcallConfig, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    let read = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
    if let Some(url) = read(ENV_PROVIDER_URL) {
        config.provider.base_url = url;
    }
    if let Some(key) = read(ENV_API_KEY) {
        config.provider.api_key = Some(key);
    }
    if let Some(id) = read(ENV_ASSISTANT_ID) {
        config.provider.assistant_id = Some(id);
    }
    if let Some(id) = read(ENV_PHONE_NUMBER_ID) {
        config.provider.phone_number_id = Some(id);
    }
}

/// Load, apply process environment overrides, and validate.
pub fn load_effective_config(paths: &DataPaths) -> Result<LeadcallConfig> {
    let mut config = load_config(paths)?;
    apply_env_overrides(&mut config, |key| std::env::var(key).ok());
    validate_config(&config)?;
    Ok(config)
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;

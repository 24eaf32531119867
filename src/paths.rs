//! Typed paths into the leadcall data directory.
//!
//! Centralizing path construction keeps file access consistent across
//! commands and prevents drift when the layout evolves.
use anyhow::{anyhow, Result};
use std::env;
use std::path::{Path, PathBuf};

pub const HOME_ENV: &str = "LEADCALL_HOME";

/// Convenience wrapper for locating data-dir artifacts.
#[derive(Debug, Clone)]
pub struct DataPaths {
    root: PathBuf,
}

impl DataPaths {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    /// Resolve the data dir: explicit flag, then `LEADCALL_HOME`, then the
    /// platform data dir.
    pub fn resolve(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Ok(Self::new(path.to_path_buf()));
        }
        if let Some(home) = env::var_os(HOME_ENV).filter(|value| !value.is_empty()) {
            return Ok(Self::new(PathBuf::from(home)));
        }
        let base = dirs::data_dir()
            .ok_or_else(|| anyhow!("no data directory; pass --data-dir or set {HOME_ENV}"))?;
        Ok(Self::new(base.join("leadcall")))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Return the `leads.json` path.
    pub fn leads_path(&self) -> PathBuf {
        self.root.join("leads.json")
    }

    /// Return the `config.json` path.
    pub fn config_path(&self) -> PathBuf {
        self.root.join("config.json")
    }

    /// Return the `session.json` path.
    pub fn session_path(&self) -> PathBuf {
        self.root.join("session.json")
    }
}

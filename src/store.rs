//! Persistent lead store.
//!
//! The store owns every lead record. Each mutation reads the current
//! document, applies the change to a copy, and replaces the file through an
//! atomic rename, so readers see either the old document or the new one.
//! Mutations hold an exclusive lock on a sibling `.lock` file for the whole
//! read-modify-write, so concurrent handles never write over each other.
use crate::error::{LeadError, LeadResult};
use crate::lead::{Campaign, Lead, LeadId, LeadStatus, NewLead};
use crate::util::now_epoch_ms;
use anyhow::{anyhow, Context};
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

pub const STORE_SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Clone, Deserialize, Serialize)]
struct StoreDocument {
    schema_version: u32,
    next_id: LeadId,
    leads: Vec<Lead>,
}

impl Default for StoreDocument {
    fn default() -> Self {
        Self {
            schema_version: STORE_SCHEMA_VERSION,
            next_id: 1,
            leads: Vec::new(),
        }
    }
}

impl StoreDocument {
    fn find_mut(&mut self, id: LeadId) -> LeadResult<&mut Lead> {
        self.leads
            .iter_mut()
            .find(|lead| lead.id == id)
            .ok_or(LeadError::NotFound(id))
    }

    fn insert(&mut self, new: NewLead, created_at_epoch_ms: u64) -> Lead {
        let lead = Lead {
            id: self.next_id,
            name: new.name,
            phone: new.phone,
            email: new.email,
            status: LeadStatus::Pending,
            campaign: new.campaign,
            provider_call_id: None,
            feedback: None,
            created_at_epoch_ms,
            called_at_epoch_ms: None,
        };
        self.next_id += 1;
        self.leads.push(lead.clone());
        lead
    }
}

/// Exclusive writer lock on a file store. Released when dropped.
struct StoreLock {
    _file: File,
}

impl StoreLock {
    fn acquire(store_path: &Path) -> anyhow::Result<Self> {
        let lock_path = lock_path_for(store_path);
        if let Some(parent) = lock_path
            .parent()
            .filter(|parent| !parent.as_os_str().is_empty())
        {
            fs::create_dir_all(parent).with_context(|| format!("create {}", parent.display()))?;
        }
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&lock_path)
            .with_context(|| format!("open lock file {}", lock_path.display()))?;
        // fs2's blocking lock, not the std `File::lock` family.
        FileExt::lock_exclusive(&file)
            .with_context(|| format!("lock {}", lock_path.display()))?;
        tracing::trace!(lock = %lock_path.display(), "store lock acquired");
        Ok(Self { _file: file })
    }
}

/// `leads.json` locks through `leads.json.lock`.
pub fn lock_path_for(store_path: &Path) -> PathBuf {
    let mut name = store_path
        .file_name()
        .map(|name| name.to_os_string())
        .unwrap_or_else(|| "leads".into());
    name.push(".lock");
    store_path.with_file_name(name)
}

enum Backend {
    File(PathBuf),
    Memory(StoreDocument),
}

/// Field writes that accompany a status transition.
#[derive(Debug, Clone, PartialEq)]
pub struct StatusUpdate {
    pub status: LeadStatus,
    pub provider_call_id: Option<String>,
    pub called_at_epoch_ms: Option<u64>,
    pub feedback: Option<String>,
}

impl StatusUpdate {
    /// Transition to `calling` with the provider's call id.
    pub fn calling(provider_call_id: &str, called_at_epoch_ms: u64) -> Self {
        Self {
            status: LeadStatus::Calling,
            provider_call_id: Some(provider_call_id.to_string()),
            called_at_epoch_ms: Some(called_at_epoch_ms),
            feedback: None,
        }
    }

    /// Transition to a terminal status carrying the raw provider payload.
    pub fn terminal(status: LeadStatus, feedback: &str) -> Self {
        Self {
            status,
            provider_call_id: None,
            called_at_epoch_ms: None,
            feedback: Some(feedback.to_string()),
        }
    }
}

/// Lead counts per status.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LeadStats {
    pub total: usize,
    pub pending: usize,
    pub calling: usize,
    pub completed: usize,
    pub rejected: usize,
}

impl LeadStats {
    pub fn tally(leads: &[Lead]) -> Self {
        let mut stats = LeadStats {
            total: leads.len(),
            ..LeadStats::default()
        };
        for lead in leads {
            match lead.status {
                LeadStatus::Pending => stats.pending += 1,
                LeadStatus::Calling => stats.calling += 1,
                LeadStatus::Completed => stats.completed += 1,
                LeadStatus::Rejected => stats.rejected += 1,
            }
        }
        stats
    }
}

pub struct LeadStore {
    backend: Backend,
}

impl LeadStore {
    /// Open a file-backed store. A missing file is an empty store.
    pub fn open(path: &Path) -> Self {
        Self {
            backend: Backend::File(path.to_path_buf()),
        }
    }

    pub fn in_memory() -> Self {
        Self {
            backend: Backend::Memory(StoreDocument::default()),
        }
    }

    /// Validate and create a `pending` lead.
    pub fn create(&mut self, new: &NewLead) -> LeadResult<Lead> {
        let valid = new.validated()?;
        let now = now_epoch_ms()?;
        let _lock = self.lock()?;
        let mut doc = self.read_document()?;
        let lead = doc.insert(valid, now);
        self.write_document(doc)?;
        tracing::info!(lead_id = lead.id, "lead created");
        Ok(lead)
    }

    /// Create every row or none of them.
    pub fn create_many(&mut self, rows: &[NewLead]) -> LeadResult<Vec<Lead>> {
        let mut valid = Vec::with_capacity(rows.len());
        for (idx, row) in rows.iter().enumerate() {
            let checked = row
                .validated()
                .map_err(|err| LeadError::Validation(format!("row {}: {err}", idx + 1)))?;
            valid.push(checked);
        }
        let now = now_epoch_ms()?;
        let _lock = self.lock()?;
        let mut doc = self.read_document()?;
        let created: Vec<Lead> = valid.into_iter().map(|row| doc.insert(row, now)).collect();
        self.write_document(doc)?;
        tracing::info!(count = created.len(), "leads imported");
        Ok(created)
    }

    /// All leads in insertion order.
    pub fn list(&self) -> LeadResult<Vec<Lead>> {
        Ok(self.read_document()?.leads)
    }

    pub fn list_with_status(&self, status: LeadStatus) -> LeadResult<Vec<Lead>> {
        let mut leads = self.list()?;
        leads.retain(|lead| lead.status == status);
        Ok(leads)
    }

    pub fn list_campaign(&self, campaign: Campaign) -> LeadResult<Vec<Lead>> {
        let mut leads = self.list()?;
        leads.retain(|lead| lead.campaign == campaign);
        Ok(leads)
    }

    pub fn get(&self, id: LeadId) -> LeadResult<Lead> {
        self.read_document()?
            .leads
            .into_iter()
            .find(|lead| lead.id == id)
            .ok_or(LeadError::NotFound(id))
    }

    /// Apply a status transition together with its field writes.
    ///
    /// Re-applying the terminal status a lead already holds with identical
    /// feedback is a no-op. Any other change to a terminal lead is rejected,
    /// so stored feedback is never overwritten.
    pub fn update_status(&mut self, id: LeadId, update: StatusUpdate) -> LeadResult<()> {
        let _lock = self.lock()?;
        let mut doc = self.read_document()?;
        let lead = doc.find_mut(id)?;
        let from = lead.status;
        let to = update.status;

        if from == to && from.is_terminal() && update.feedback == lead.feedback {
            tracing::debug!(lead_id = id, status = %to, "terminal status already applied");
            return Ok(());
        }
        if !from.can_transition_to(to) {
            return Err(LeadError::InvalidTransition { id, from, to });
        }

        match to {
            LeadStatus::Calling => {
                let call_id = update
                    .provider_call_id
                    .filter(|call_id| !call_id.trim().is_empty())
                    .ok_or_else(|| {
                        LeadError::Validation("calling requires a provider call id".to_string())
                    })?;
                lead.provider_call_id = Some(call_id);
                lead.called_at_epoch_ms = match update.called_at_epoch_ms {
                    Some(at) => Some(at),
                    None => Some(now_epoch_ms()?),
                };
            }
            LeadStatus::Completed | LeadStatus::Rejected => {
                if lead.feedback.is_none() {
                    lead.feedback = update.feedback;
                }
            }
            LeadStatus::Pending => return Err(LeadError::InvalidTransition { id, from, to }),
        }
        lead.status = to;

        self.write_document(doc)?;
        tracing::info!(lead_id = id, from = %from, to = %to, "lead status changed");
        Ok(())
    }

    /// Remove a lead regardless of status.
    pub fn delete(&mut self, id: LeadId) -> LeadResult<Lead> {
        let _lock = self.lock()?;
        let mut doc = self.read_document()?;
        let idx = doc
            .leads
            .iter()
            .position(|lead| lead.id == id)
            .ok_or(LeadError::NotFound(id))?;
        let removed = doc.leads.remove(idx);
        self.write_document(doc)?;
        tracing::info!(lead_id = id, status = %removed.status, "lead deleted");
        Ok(removed)
    }

    pub fn stats(&self) -> LeadResult<LeadStats> {
        Ok(LeadStats::tally(&self.list()?))
    }

    /// `&mut self` already serializes the in-memory backend.
    fn lock(&self) -> LeadResult<Option<StoreLock>> {
        match &self.backend {
            Backend::Memory(_) => Ok(None),
            Backend::File(path) => StoreLock::acquire(path)
                .map(Some)
                .map_err(LeadError::from),
        }
    }

    fn read_document(&self) -> LeadResult<StoreDocument> {
        match &self.backend {
            Backend::Memory(doc) => Ok(doc.clone()),
            Backend::File(path) => load_document(path).map_err(LeadError::from),
        }
    }

    fn write_document(&mut self, doc: StoreDocument) -> LeadResult<()> {
        match &mut self.backend {
            Backend::Memory(current) => {
                *current = doc;
                Ok(())
            }
            Backend::File(path) => write_document_atomic(path, &doc).map_err(LeadError::from),
        }
    }
}

fn load_document(path: &Path) -> anyhow::Result<StoreDocument> {
    if !path.is_file() {
        return Ok(StoreDocument::default());
    }
    let bytes = fs::read(path).with_context(|| format!("read lead store {}", path.display()))?;
    let doc: StoreDocument = serde_json::from_slice(&bytes)
        .with_context(|| format!("parse lead store {}", path.display()))?;
    if doc.schema_version != STORE_SCHEMA_VERSION {
        return Err(anyhow!(
            "unsupported lead store schema_version {}",
            doc.schema_version
        ));
    }
    Ok(doc)
}

fn write_document_atomic(path: &Path, doc: &StoreDocument) -> anyhow::Result<()> {
    let parent = path
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(parent).with_context(|| format!("create {}", parent.display()))?;
    let mut staged = tempfile::NamedTempFile::new_in(parent)
        .with_context(|| format!("stage lead store in {}", parent.display()))?;
    let text = serde_json::to_string_pretty(doc).context("serialize lead store")?;
    staged
        .write_all(text.as_bytes())
        .context("write staged lead store")?;
    staged
        .as_file()
        .sync_all()
        .context("sync staged lead store")?;
    staged
        .persist(path)
        .with_context(|| format!("replace {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;

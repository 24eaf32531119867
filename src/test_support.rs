//! Scripted provider double shared by unit tests.
use crate::lead::NewLead;
use crate::provider::{CallOutcome, CallProvider, CallRequest, CallResult, ProviderError};
use crate::store::LeadStore;
use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

/// Side effect run once while the provider is handling a request.
type Hook = Box<dyn FnOnce()>;

const FAKE: &str = "fake_provider";

#[derive(Default)]
pub struct ScriptedProvider {
    /// Phones whose `place_call` fails.
    pub failing_phones: BTreeSet<String>,
    /// Phones whose `place_call` returns a blank call id.
    pub blank_id_phones: BTreeSet<String>,
    /// Call ids whose `get_call_result` fails.
    pub failing_results: BTreeSet<String>,
    /// Scripted results; unknown call ids report `Pending`.
    pub results: RefCell<BTreeMap<String, CallResult>>,
    pub placed: RefCell<Vec<CallRequest>>,
    pub polled: RefCell<Vec<String>>,
    /// Run inside `place_call` for a phone, before the call id is returned.
    place_hooks: RefCell<BTreeMap<String, Hook>>,
    /// Run inside `get_call_result` for a call id, before the result is returned.
    poll_hooks: RefCell<BTreeMap<String, Hook>>,
}

impl ScriptedProvider {
    pub fn fail_phone(mut self, phone: &str) -> Self {
        self.failing_phones.insert(phone.to_string());
        self
    }

    pub fn blank_id_for(mut self, phone: &str) -> Self {
        self.blank_id_phones.insert(phone.to_string());
        self
    }

    pub fn fail_result(mut self, call_id: &str) -> Self {
        self.failing_results.insert(call_id.to_string());
        self
    }

    pub fn finish(&self, call_id: &str, outcome: CallOutcome, raw_payload: &str) {
        self.results.borrow_mut().insert(
            call_id.to_string(),
            CallResult::Ended {
                raw_payload: raw_payload.to_string(),
                outcome,
            },
        );
    }

    pub fn on_place(&self, phone: &str, hook: impl FnOnce() + 'static) {
        self.place_hooks
            .borrow_mut()
            .insert(phone.to_string(), Box::new(hook));
    }

    pub fn on_poll(&self, call_id: &str, hook: impl FnOnce() + 'static) {
        self.poll_hooks
            .borrow_mut()
            .insert(call_id.to_string(), Box::new(hook));
    }

    pub fn placed_count(&self) -> usize {
        self.placed.borrow().len()
    }
}

impl CallProvider for ScriptedProvider {
    fn place_call(&self, request: &CallRequest) -> Result<String, ProviderError> {
        if self.failing_phones.contains(&request.phone) {
            return Err(ProviderError::new(FAKE, "http_status")
                .with_status(400)
                .with_detail("scripted failure"));
        }
        let hook = self.place_hooks.borrow_mut().remove(&request.phone);
        if let Some(hook) = hook {
            hook();
        }
        let mut placed = self.placed.borrow_mut();
        placed.push(request.clone());
        if self.blank_id_phones.contains(&request.phone) {
            return Ok("  ".to_string());
        }
        Ok(format!("call-{}", placed.len()))
    }

    fn get_call_result(&self, call_id: &str) -> Result<CallResult, ProviderError> {
        self.polled.borrow_mut().push(call_id.to_string());
        let hook = self.poll_hooks.borrow_mut().remove(call_id);
        if let Some(hook) = hook {
            hook();
        }
        if self.failing_results.contains(call_id) {
            return Err(ProviderError::new(FAKE, "timeout"));
        }
        Ok(self
            .results
            .borrow()
            .get(call_id)
            .cloned()
            .unwrap_or(CallResult::Pending))
    }
}

/// In-memory store seeded with valid leads, one per phone number.
pub fn seeded_store(phones: &[&str]) -> LeadStore {
    seed(LeadStore::in_memory(), phones)
}

/// File-backed store at `path`, seeded the same way. Other handles opened on
/// `path` see and change the same leads.
pub fn seeded_file_store(path: &Path, phones: &[&str]) -> LeadStore {
    seed(LeadStore::open(path), phones)
}

fn seed(mut store: LeadStore, phones: &[&str]) -> LeadStore {
    for (idx, phone) in phones.iter().enumerate() {
        let name = format!("Lead {}", idx + 1);
        let email = format!("lead{}@example.com", idx + 1);
        store
            .create(&NewLead::new(&name, phone, &email))
            .expect("seed lead");
    }
    store
}

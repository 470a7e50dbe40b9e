//! Nullable ledger: scripted integrity reports, in-memory identities,
//! at-most-one-vote enforcement.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use securecast_client::ClientError;
use securecast_ledger::{IntegrityReport, LedgerApi, LedgerError, VoteReceipt};
use securecast_types::{Identity, Party};

use crate::journal::{record, Journal};

/// One scripted answer for `verify_integrity`. When the script runs out,
/// the ledger reports intact.
#[derive(Clone, Copy, Debug)]
pub enum IntegrityStep {
    Intact,
    Corrupted,
    Unreachable,
}

#[derive(Default)]
pub struct NullLedger {
    identities: Mutex<HashMap<String, Identity>>,
    voted: Mutex<HashSet<String>>,
    integrity_script: Mutex<VecDeque<IntegrityStep>>,
    lookup_unreachable: AtomicBool,
    journal: Option<Journal>,
    calls: Mutex<Vec<String>>,
}

impl NullLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_journal(journal: Journal) -> Self {
        Self {
            journal: Some(journal),
            ..Self::default()
        }
    }

    /// Pre-load an identity, as if it had been replicated earlier.
    pub fn insert_identity(&self, identity: Identity) {
        self.identities
            .lock()
            .unwrap()
            .insert(identity.email.clone(), identity);
    }

    /// Pre-mark an email as having voted.
    pub fn mark_voted(&self, email: &str) {
        self.voted.lock().unwrap().insert(email.to_string());
    }

    /// Queue integrity answers, consumed one per `verify_integrity` call.
    pub fn script_integrity(&self, steps: impl IntoIterator<Item = IntegrityStep>) {
        self.integrity_script.lock().unwrap().extend(steps);
    }

    /// Make every identity lookup fail at the transport layer.
    pub fn set_lookup_unreachable(&self, unreachable: bool) {
        self.lookup_unreachable.store(unreachable, Ordering::SeqCst);
    }

    pub fn contains(&self, email: &str) -> bool {
        self.identities.lock().unwrap().contains_key(email)
    }

    pub fn has_voted(&self, email: &str) -> bool {
        self.voted.lock().unwrap().contains(email)
    }

    /// Every call received, in order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn outage() -> LedgerError {
        LedgerError::Client(ClientError::Transport {
            endpoint: "null://ledger".into(),
            detail: "scripted outage".into(),
        })
    }
}

#[async_trait]
impl LedgerApi for NullLedger {
    async fn fetch_identity(&self, email: &str) -> Result<Option<Identity>, LedgerError> {
        record(&self.journal, &self.calls, format!("ledger.details:{email}"));
        if self.lookup_unreachable.load(Ordering::SeqCst) {
            return Err(Self::outage());
        }
        Ok(self.identities.lock().unwrap().get(email).cloned())
    }

    async fn verify_integrity(&self) -> Result<IntegrityReport, LedgerError> {
        record(&self.journal, &self.calls, "ledger.verify".into());
        let step = self
            .integrity_script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(IntegrityStep::Intact);
        match step {
            IntegrityStep::Intact => Ok(IntegrityReport {
                intact: true,
                message: "Tree integrity verified successfully".into(),
            }),
            IntegrityStep::Corrupted => Ok(IntegrityReport {
                intact: false,
                message: "Tree integrity check failed".into(),
            }),
            IntegrityStep::Unreachable => Err(Self::outage()),
        }
    }

    async fn add(&self, identity: &Identity) -> Result<String, LedgerError> {
        record(
            &self.journal,
            &self.calls,
            format!("ledger.add:{}", identity.email),
        );
        self.insert_identity(identity.clone());
        Ok("User added".into())
    }

    async fn update(&self, identity: &Identity) -> Result<String, LedgerError> {
        record(
            &self.journal,
            &self.calls,
            format!("ledger.update:{}", identity.email),
        );
        self.insert_identity(identity.clone());
        Ok("User updated".into())
    }

    async fn cast_vote(&self, email: &str, _party: &Party) -> Result<VoteReceipt, LedgerError> {
        record(&self.journal, &self.calls, format!("ledger.vote:{email}"));
        let mut voted = self.voted.lock().unwrap();
        if voted.contains(email) {
            return Ok(VoteReceipt::AlreadyCast {
                message: "User has already voted".into(),
            });
        }
        voted.insert(email.to_string());
        Ok(VoteReceipt::Accepted {
            message: "Vote recorded".into(),
        })
    }
}

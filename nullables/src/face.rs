//! Nullable face oracle: a fixed decision, recorded per call.

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use securecast_facematch::FaceOracle;

use crate::journal::{record, Journal};

pub struct NullFaceOracle {
    decision: AtomicBool,
    journal: Option<Journal>,
    calls: Mutex<Vec<String>>,
}

impl NullFaceOracle {
    pub fn matching() -> Self {
        Self {
            decision: AtomicBool::new(true),
            journal: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn rejecting() -> Self {
        Self {
            decision: AtomicBool::new(false),
            journal: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn with_journal(mut self, journal: Journal) -> Self {
        self.journal = Some(journal);
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl FaceOracle for NullFaceOracle {
    async fn matches(&self, _captured: &str, _reference: &str) -> bool {
        record(&self.journal, &self.calls, "face.matches".into());
        self.decision.load(Ordering::SeqCst)
    }
}

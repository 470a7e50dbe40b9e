//! Shared call journal for cross-service ordering assertions.

use std::sync::{Arc, Mutex};

/// Append-only log of `service.method[:detail]` entries.
pub type Journal = Arc<Mutex<Vec<String>>>;

pub fn shared_journal() -> Journal {
    Arc::new(Mutex::new(Vec::new()))
}

pub(crate) fn record(journal: &Option<Journal>, own: &Mutex<Vec<String>>, entry: String) {
    if let Some(journal) = journal {
        journal.lock().unwrap().push(entry.clone());
    }
    own.lock().unwrap().push(entry);
}

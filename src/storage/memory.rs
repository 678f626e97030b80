use std::sync::Arc;

use parking_lot::RwLock;

use super::Storage;
use crate::sampler::CompletedTrial;

/// In-memory trial storage (the default).
///
/// This is a thin wrapper around `Arc<RwLock<Vec<CompletedTrial>>>`.
pub struct MemoryStorage {
    trials: Arc<RwLock<Vec<CompletedTrial>>>,
}

impl MemoryStorage {
    /// Creates a new, empty in-memory store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            trials: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Creates an in-memory store pre-populated with `trials`.
    #[must_use]
    pub fn with_trials(trials: Vec<CompletedTrial>) -> Self {
        Self {
            trials: Arc::new(RwLock::new(trials)),
        }
    }
}

impl Default for MemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl Storage for MemoryStorage {
    fn push(&self, trial: CompletedTrial) {
        self.trials.write().push(trial);
    }

    fn trials_arc(&self) -> &Arc<RwLock<Vec<CompletedTrial>>> {
        &self.trials
    }
}

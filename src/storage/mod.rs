//! Trial storage backends.
//!
//! A [`Study`](crate::Study) records every finished trial through a
//! [`Storage`]. [`MemoryStorage`] is the default. Pass a pre-filled store
//! (or your own backend) to [`Study::with_storage`](crate::Study::with_storage)
//! to continue an earlier search.

mod memory;

use std::sync::Arc;

pub use memory::MemoryStorage;
use parking_lot::RwLock;

use crate::sampler::CompletedTrial;

/// Append-only store of finished trials.
pub trait Storage: Send + Sync {
    /// Append a finished trial.
    fn push(&self, trial: CompletedTrial);

    /// The shared trial list.
    fn trials_arc(&self) -> &Arc<RwLock<Vec<CompletedTrial>>>;

    /// A snapshot of every stored trial, in recording order.
    fn trials(&self) -> Vec<CompletedTrial> {
        self.trials_arc().read().clone()
    }

    /// Number of stored trials.
    fn len(&self) -> usize {
        self.trials_arc().read().len()
    }

    /// Returns `true` if nothing has been stored.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

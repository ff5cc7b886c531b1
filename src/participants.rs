//! Participant cache.
//!
//! Resolving the participants of a collaboration model is a host query with
//! non-trivial cost, and the answer only changes when the model is
//! redeployed. The cache memoizes per process definition and is invalidated
//! explicitly on redeploy.

use std::sync::Arc;

use dashmap::DashMap;

use crate::error::Result;
use crate::host::ProcessEngine;
use crate::types::Participant;

/// Memoized participant lookups, keyed by process definition id.
pub struct ParticipantCache {
    host: Arc<dyn ProcessEngine>,
    entries: DashMap<String, Arc<Vec<Participant>>>,
}

impl std::fmt::Debug for ParticipantCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParticipantCache")
            .field("entries", &self.entries.len())
            .finish()
    }
}

impl ParticipantCache {
    /// Creates an empty cache backed by the given host engine.
    pub fn new(host: Arc<dyn ProcessEngine>) -> Self {
        Self {
            host,
            entries: DashMap::new(),
        }
    }

    /// Returns the participants of a process definition, querying the host
    /// on first use. Host errors are not cached.
    pub async fn get_or_resolve(&self, process_definition_id: &str) -> Result<Arc<Vec<Participant>>> {
        if let Some(cached) = self.entries.get(process_definition_id) {
            return Ok(Arc::clone(&cached));
        }
        let resolved = Arc::new(self.host.resolve_participants(process_definition_id).await?);
        // Two concurrent misses both query the host; last insert wins, both
        // answers are equal.
        self.entries
            .insert(process_definition_id.to_string(), Arc::clone(&resolved));
        tracing::debug!(
            process_definition_id,
            participants = resolved.len(),
            "cached participant resolution"
        );
        Ok(resolved)
    }

    /// Drops the cached entry for one process definition.
    pub fn invalidate(&self, process_definition_id: &str) {
        self.entries.remove(process_definition_id);
    }

    /// Drops every cached entry.
    pub fn invalidate_all(&self) {
        self.entries.clear();
    }

    /// Number of cached definitions.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// `true` if nothing is cached.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

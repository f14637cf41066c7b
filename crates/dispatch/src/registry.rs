//! In-flight registry: at most one operation per cache resource
//!
//! The registry is advisory and in-process only. It does not stop another
//! program from opening the same cache directory.

use cachectl_core::{Error, Result};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};

/// Keyed mutual-exclusion table mapping resource identifiers to guard tokens
#[derive(Debug, Default)]
pub struct InFlightRegistry {
    entries: DashMap<String, u64>,
    next_token: AtomicU64,
}

impl InFlightRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim `resource`, or fail with `ResourceBusy` if it is already claimed.
    ///
    /// Check and insert happen under the same shard lock, so two concurrent
    /// callers for one identifier can never both succeed.
    pub fn try_acquire(&self, resource: &str) -> Result<InFlightGuard<'_>> {
        let token = self.next_token.fetch_add(1, Ordering::Relaxed);

        match self.entries.entry(resource.to_string()) {
            Entry::Occupied(_) => {
                tracing::debug!(resource, "resource already in flight");
                Err(Error::resource_busy(resource))
            }
            Entry::Vacant(slot) => {
                slot.insert(token);
                tracing::debug!(resource, token, "resource acquired");
                Ok(InFlightGuard {
                    registry: self,
                    resource: resource.to_string(),
                    token,
                })
            }
        }
    }

    #[must_use]
    pub fn contains(&self, resource: &str) -> bool {
        self.entries.contains_key(resource)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn release(&self, resource: &str, token: u64) {
        if self
            .entries
            .remove_if(resource, |_, held| *held == token)
            .is_some()
        {
            tracing::debug!(resource, token, "resource released");
        }
    }
}

/// Holds a resource claim; the claim is released when the guard is dropped
#[derive(Debug)]
pub struct InFlightGuard<'a> {
    registry: &'a InFlightRegistry,
    resource: String,
    token: u64,
}

impl InFlightGuard<'_> {
    pub fn resource(&self) -> &str {
        &self.resource
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.registry.release(&self.resource, self.token);
    }
}

//! Named locks - per-key mutual exclusion inside one process
//!
//! Used to serialise remote operations that race on the provider side,
//! e.g. subnet creation within one VPC zone competing for CIDR space.

use std::sync::Arc;

use dashmap::DashMap;
use log::debug;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Registry of async mutexes addressed by name
#[derive(Debug, Default, Clone)]
pub struct NamedLocks {
    locks: Arc<DashMap<String, Arc<Mutex<()>>>>,
}

/// Holds a named lock until dropped
#[derive(Debug)]
pub struct NamedGuard {
    key: String,
    _guard: OwnedMutexGuard<()>,
}

impl NamedGuard {
    pub fn key(&self) -> &str {
        &self.key
    }
}

impl Drop for NamedGuard {
    fn drop(&mut self) {
        debug!("released lock '{}'", self.key);
    }
}

impl NamedLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lock key used for subnet creation
    pub fn subnet_key(vpc: &str, zone: &str) -> String {
        format!("{}/{}", vpc, zone)
    }

    /// Wait for exclusive ownership of `key`
    pub async fn lock(&self, key: &str) -> NamedGuard {
        let mutex = self
            .locks
            .entry(key.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        debug!("waiting for lock '{}'", key);
        let guard = mutex.lock_owned().await;
        debug!("acquired lock '{}'", key);
        NamedGuard {
            key: key.to_string(),
            _guard: guard,
        }
    }

    /// Number of keys ever locked
    pub fn len(&self) -> usize {
        self.locks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }
}

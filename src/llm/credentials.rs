//! Credential pools and round-robin key selection
//!
//! A provider may be configured with several interchangeable API keys. The
//! pool asks a [`CredentialSelector`] which one to use for each call; the
//! default [`RoundRobin`] selector is created once at startup and shared by
//! every pool in the process.

use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Picks an index into a pool of `pool_size` credentials
pub trait CredentialSelector: Send + Sync {
    /// Return an index in `0..pool_size`. Never called with `pool_size == 0`.
    fn select(&self, pool_size: usize) -> usize;
}

/// Process-wide call counter modulo the pool size
///
/// Concurrent callers may observe the same counter value; exact balance is
/// not required.
#[derive(Debug, Default)]
pub struct RoundRobin {
    counter: AtomicUsize,
}

impl RoundRobin {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of selections made so far
    pub fn calls(&self) -> usize {
        self.counter.load(Ordering::Relaxed)
    }
}

impl CredentialSelector for RoundRobin {
    fn select(&self, pool_size: usize) -> usize {
        self.counter.fetch_add(1, Ordering::Relaxed) % pool_size
    }
}

/// The credentials configured for one provider
#[derive(Clone)]
pub struct CredentialPool {
    keys: Vec<String>,
    selector: Arc<dyn CredentialSelector>,
}

impl CredentialPool {
    /// Build a pool, dropping blank keys
    pub fn new(keys: Vec<String>, selector: Arc<dyn CredentialSelector>) -> Self {
        let keys = keys
            .into_iter()
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty())
            .collect();
        Self { keys, selector }
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Select the credential for the next call
    pub fn pick(&self) -> Option<&str> {
        match self.keys.len() {
            0 => None,
            1 => Some(&self.keys[0]),
            n => {
                let index = self.selector.select(n) % n;
                Some(&self.keys[index])
            }
        }
    }
}

impl fmt::Debug for CredentialPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Never print key material
        f.debug_struct("CredentialPool")
            .field("keys", &self.keys.len())
            .finish()
    }
}

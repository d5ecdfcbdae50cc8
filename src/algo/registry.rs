//! Algorithm name -> implementation table.
//!
//! Built once at start-up and then shared read-only (behind an `Arc`) by
//! every request handler, so lookups need no locking.

use std::collections::HashMap;
use std::sync::Arc;

use super::SignAlgorithm;

/// Registered signature algorithms keyed by name.
#[derive(Clone, Default)]
pub struct AlgorithmRegistry {
    algorithms: HashMap<&'static str, Arc<dyn SignAlgorithm>>,
}

impl AlgorithmRegistry {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with ES256, ES256K, EdDSA, RS256 and RS512.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        super::ecdsa::register(&mut registry);
        super::secp256k1::register(&mut registry);
        super::eddsa::register(&mut registry);
        super::rsa::register(&mut registry);
        registry
    }

    /// Add an algorithm. A later registration under the same name wins.
    pub fn register<A: SignAlgorithm + 'static>(&mut self, algorithm: A) {
        let name = algorithm.name();
        if self.algorithms.insert(name, Arc::new(algorithm)).is_some() {
            tracing::debug!(algorithm = name, "Algorithm re-registered");
        }
    }

    /// Find an algorithm by name.
    pub fn lookup(&self, name: &str) -> Option<Arc<dyn SignAlgorithm>> {
        self.algorithms.get(name).cloned()
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.algorithms.keys().copied().collect();
        names.sort_unstable();
        names
    }
}

impl std::fmt::Debug for AlgorithmRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AlgorithmRegistry")
            .field("algorithms", &self.names())
            .finish()
    }
}

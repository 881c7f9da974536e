//! Process-wide pacer registry, owned by the orchestrator

use super::limiter::{PacerSnapshot, ProviderPacer};
use crate::config::SwitchyardConfig;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

/// Lazily creates one [`ProviderPacer`] per provider key from configuration
#[derive(Debug)]
pub struct PacerRegistry {
    config: Arc<SwitchyardConfig>,
    pacers: RwLock<HashMap<String, Arc<ProviderPacer>>>,
}

impl PacerRegistry {
    pub fn new(config: Arc<SwitchyardConfig>) -> Self {
        Self {
            config,
            pacers: RwLock::new(HashMap::new()),
        }
    }

    /// Get or create the pacer for a provider
    pub fn get(&self, provider: &str) -> Arc<ProviderPacer> {
        let key = provider.to_lowercase();

        if let Some(pacer) = self.pacers.read().get(&key) {
            return Arc::clone(pacer);
        }

        let mut pacers = self.pacers.write();
        // Double-check after acquiring write lock
        Arc::clone(pacers.entry(key.clone()).or_insert_with(|| {
            let settings = self.config.provider(&key);
            Arc::new(ProviderPacer::new(key, &settings))
        }))
    }

    /// Penalize a provider's pacer, creating it if needed
    pub fn penalize(&self, provider: &str, duration: Duration) -> f64 {
        self.get(provider).penalize(duration)
    }

    /// Snapshots of every pacer created so far, sorted by provider
    pub fn snapshot(&self) -> Vec<PacerSnapshot> {
        let mut snapshots: Vec<PacerSnapshot> =
            self.pacers.read().values().map(|p| p.snapshot()).collect();
        snapshots.sort_by(|a, b| a.provider.cmp(&b.provider));
        snapshots
    }

    pub fn len(&self) -> usize {
        self.pacers.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.pacers.read().is_empty()
    }

    /// Drop all pacer state; the next `get` starts fresh
    pub fn reset(&self) {
        self.pacers.write().clear();
    }
}

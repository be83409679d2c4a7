//! Probe with a fixed outcome, for tests that must not touch the network

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};

use directory::database::ObservedHealth;
use directory::health::{HealthProbe, ProbeTarget};

pub struct StaticProbe {
    outcome: ObservedHealth,
    calls: AtomicUsize,
}

impl StaticProbe {
    pub fn new(outcome: ObservedHealth) -> Self {
        Self {
            outcome,
            calls: AtomicUsize::new(0),
        }
    }

    /// Number of probes issued so far
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl HealthProbe for StaticProbe {
    async fn probe(&self, _target: &ProbeTarget) -> ObservedHealth {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.outcome
    }
}

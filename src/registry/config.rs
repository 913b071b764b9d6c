//! Registry configuration

use std::time::Duration;

use crate::stream::WorkerTuning;

/// Configuration for the stream registry
#[derive(Debug, Clone)]
pub struct RegistryConfig {
    /// Tuning handed to every worker the registry creates
    pub tuning: WorkerTuning,

    /// How often the background reaper sweeps for dead workers
    pub reap_interval: Duration,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            tuning: WorkerTuning::default(),
            reap_interval: Duration::from_secs(60),
        }
    }
}

impl RegistryConfig {
    /// Set worker tuning
    pub fn tuning(mut self, tuning: WorkerTuning) -> Self {
        self.tuning = tuning;
        self
    }

    /// Set the reaper interval (zero is raised to one second)
    pub fn reap_interval(mut self, interval: Duration) -> Self {
        self.reap_interval = interval.max(Duration::from_secs(1));
        self
    }
}

//! Engine configuration.

use std::time::Duration;

/// Defaults for every search an [`Engine`](crate::engine::Engine) runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Number of worker threads.
    pub threads: usize,
    /// Stop after this many completed states.
    pub sample: Option<usize>,
    /// Shuffle expansion order.
    pub random: bool,
    /// How often the controlling thread wakes to check for cancellation.
    pub poll_interval: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            threads: num_cpus(),
            sample: None,
            random: false,
            poll_interval: Duration::from_millis(100),
        }
    }
}

impl EngineConfig {
    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = threads.max(1);
        self
    }

    pub fn with_sample(mut self, sample: Option<usize>) -> Self {
        self.sample = sample;
        self
    }

    pub fn with_random(mut self, random: bool) -> Self {
        self.random = random;
        self
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }
}

/// Get number of CPUs (fallback to 1).
fn num_cpus() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

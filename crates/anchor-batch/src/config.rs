use std::time::Duration;

/// Flush deadline used when a configured `max_wait` is zero. An unbounded
/// accumulation window would starve latency-sensitive callers, so "no
/// timeout" is not representable.
pub const DEFAULT_MAX_WAIT: Duration = Duration::from_millis(25);

/// Configuration for the [`MerkleBatcher`](crate::MerkleBatcher).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BatcherConfig {
    /// Leaves per batch before an immediate flush. Minimum 1 (which
    /// degenerates to one ledger write per leaf).
    pub batch_size: usize,
    /// How long a non-full batch may stay open before it is flushed anyway,
    /// measured from the first leaf's admission.
    pub max_wait: Duration,
    /// Capacity of the producer hand-off queue. Zero means "derive from
    /// batch size". A sizing hint only — correctness never depends on it.
    pub queue_capacity: usize,
}

impl Default for BatcherConfig {
    fn default() -> Self {
        Self {
            batch_size: 16,
            max_wait: DEFAULT_MAX_WAIT,
            queue_capacity: 0,
        }
    }
}

impl BatcherConfig {
    /// Clamp out-of-range values to usable ones.
    pub fn normalized(mut self) -> Self {
        if self.batch_size < 1 {
            self.batch_size = 1;
        }
        if self.max_wait.is_zero() {
            self.max_wait = DEFAULT_MAX_WAIT;
        }
        if self.queue_capacity == 0 {
            self.queue_capacity = self.batch_size * 4;
        }
        self
    }
}

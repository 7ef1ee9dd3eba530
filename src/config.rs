/// Configuration for attaching a shared-memory queue.
#[derive(Debug, Clone)]
pub struct ShmConfig {
    /// POSIX shared-memory object name, e.g. `"/my_queue"`.
    pub name: String,
    /// Requested data-area capacity in bytes. Rounded up to a power of two
    /// (at least [`crate::layout::MIN_CAPACITY`]) via
    /// [`crate::layout::round_power_of_two`] before use. Ignored on attach to
    /// an already-initialised segment, where the on-disk `mask` wins.
    pub capacity: u64,
    /// Create the segment if it does not already exist.
    pub create_if_missing: bool,
    /// Enable the optional [`crate::metrics::Metrics`] counters.
    pub enable_metrics: bool,
}

impl ShmConfig {
    /// Creates a new configuration for a named segment of the given capacity.
    pub fn new(name: impl Into<String>, capacity: u64, create_if_missing: bool) -> Self {
        Self {
            name: name.into(),
            capacity,
            create_if_missing,
            enable_metrics: false,
        }
    }

    /// Enables metrics collection on the attached queue.
    #[must_use]
    pub fn with_metrics(mut self, enable: bool) -> Self {
        self.enable_metrics = enable;
        self
    }
}

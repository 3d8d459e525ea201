/// Controls how 429 responses interact with the retry budget.
///
/// The default keeps rate-limit waits outside the attempt budget, so a
/// server that answers 429 forever stalls the call until the caller's own
/// deadline fires; callers needing a hard ceiling wrap the call in
/// `tokio::time::timeout`.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum RateLimitPolicy {
    /// Honor every rate-limit wait without consuming the attempt budget.
    Unlimited,
    /// Each rate-limit cycle spends one attempt from the shared budget.
    CountAttempts,
}

/// Configures HTTP timeout and retry behavior.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ExecutorOptions {
    /// Per-request timeout in milliseconds.
    pub timeout_ms: u64,
    /// Maximum number of retries after the initial attempt.
    pub max_retries: usize,
    /// Base retry backoff in milliseconds (exponential strategy); also the
    /// rate-limit wait when the server sends no usable `Retry-After`.
    pub base_delay_ms: u64,
    /// How 429 responses are budgeted.
    pub rate_limit: RateLimitPolicy,
}

impl Default for ExecutorOptions {
    fn default() -> Self {
        Self {
            timeout_ms: 10_000,
            max_retries: 3,
            base_delay_ms: 1_000,
            rate_limit: RateLimitPolicy::Unlimited,
        }
    }
}

/// Configures the coordinator's response cache.
///
/// By default entries never expire and the cache grows without bound for
/// the life of the process. Both limits are opt-in.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct CacheOptions {
    /// Maximum number of cached responses; the oldest entry is evicted once
    /// the cache is full. `None` keeps the cache unbounded.
    pub max_entries: Option<usize>,
    /// Entry time-to-live in milliseconds; an expired entry is dropped on
    /// read and refetched. `None` keeps entries for the process lifetime.
    pub ttl_ms: Option<u64>,
}

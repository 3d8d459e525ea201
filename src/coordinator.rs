use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use serde_json::{json, Value};

use crate::{CacheOptions, Headers, QueryParams, RequestExecutor, RequestSpec};

/// Cached response body with its insertion time for TTL checks.
#[derive(Clone, Debug)]
struct CacheEntry {
    value: Value,
    inserted_at: Instant,
}

impl CacheEntry {
    fn new(value: Value) -> Self {
        Self {
            value,
            inserted_at: Instant::now(),
        }
    }

    fn is_expired(&self, ttl: Option<Duration>) -> bool {
        match ttl {
            Some(ttl) => self.inserted_at.elapsed() > ttl,
            None => false,
        }
    }
}

#[derive(Clone, Debug)]
/// Request front end that degrades to fallback data instead of failing.
///
/// Every operation resolves to a structured JSON value; no call panics or
/// surfaces a transport error. Clones share the cache and the fallback
/// table, so one coordinator can be handed to any number of tasks.
///
/// # Example
///
/// ```no_run
/// use resilient_http::{FallbackCoordinator, RequestExecutor};
/// use serde_json::json;
///
/// # async fn run() {
/// let api = FallbackCoordinator::new(RequestExecutor::new());
/// api.set_fallback_data("https://api.example.com/tickets", json!({ "tickets": [] }));
/// let tickets = api.get_with_cache("https://api.example.com/tickets", (), ()).await;
/// # }
/// ```
pub struct FallbackCoordinator {
    executor: RequestExecutor,
    options: CacheOptions,
    cache: Arc<Mutex<HashMap<String, CacheEntry>>>,
    fallback: Arc<Mutex<HashMap<String, Value>>>,
}

impl FallbackCoordinator {
    /// Creates a coordinator around the given executor.
    pub fn new(executor: RequestExecutor) -> Self {
        Self {
            executor,
            options: CacheOptions::default(),
            cache: Arc::new(Mutex::new(HashMap::new())),
            fallback: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Applies cache options such as capacity and entry TTL.
    pub fn with_cache_options(mut self, options: CacheOptions) -> Self {
        self.options = options;
        self
    }

    /// Executes a request, substituting fallback data on failure.
    ///
    /// On success the live body is returned untouched. On failure the
    /// supplied fallback is returned verbatim; without one, the result is
    /// `{"status": "error", "message": "Network request failed",
    /// "fallback": true}`.
    pub async fn with_fallback(&self, spec: &RequestSpec, fallback: Option<Value>) -> Value {
        match self.executor.execute(spec).await {
            Some(body) => body,
            None => {
                #[cfg(feature = "tracing")]
                tracing::warn!("request to {} failed, using fallback", spec.url());
                fallback.unwrap_or_else(network_failed_marker)
            }
        }
    }

    /// Registers fallback data for a URL; the last write wins.
    ///
    /// The data is not validated and is served verbatim whenever a request
    /// to that URL fails with no cached value to cover it.
    pub fn set_fallback_data(&self, url: impl Into<String>, data: Value) {
        self.lock_fallback().insert(url.into(), data);
    }

    /// GET with response caching keyed by URL and query parameters.
    ///
    /// A fresh cached value short-circuits the call; no request is made and
    /// staleness is bounded only by the configured TTL. On a miss the
    /// request runs with full retry semantics and a success is cached. A
    /// failure consults the fallback table by URL (never cached), and with
    /// no fallback registered the result is
    /// `{"status": "error", "message": "No data available"}`.
    pub async fn get_with_cache<H, P>(&self, url: impl Into<String>, headers: H, params: P) -> Value
    where
        H: Into<Headers>,
        P: Into<QueryParams>,
    {
        let url = url.into();
        let params = params.into();
        let key = cache_key(&url, &params);

        if let Some(cached) = self.cached_value(&key) {
            #[cfg(feature = "tracing")]
            tracing::debug!("cache hit for {}", url);
            return cached;
        }

        let spec = RequestSpec::get(url.as_str()).headers(headers).params(params);
        match self.executor.execute(&spec).await {
            Some(body) => {
                self.store(key, body.clone());
                body
            }
            None => self.fallback_for(&url),
        }
    }

    fn fallback_for(&self, url: &str) -> Value {
        let table = self.lock_fallback();
        match table.get(url) {
            Some(data) => {
                #[cfg(feature = "tracing")]
                tracing::warn!("serving fallback data for {}", url);
                data.clone()
            }
            None => no_data_marker(),
        }
    }

    fn cached_value(&self, key: &str) -> Option<Value> {
        let ttl = self.options.ttl_ms.map(Duration::from_millis);
        let mut cache = self.lock_cache();

        if let Some(entry) = cache.get(key) {
            if !entry.is_expired(ttl) {
                return Some(entry.value.clone());
            }
        }
        // Drops the entry when present but expired.
        cache.remove(key);
        None
    }

    fn store(&self, key: String, value: Value) {
        let mut cache = self.lock_cache();

        if let Some(max_entries) = self.options.max_entries {
            // A zero-capacity cache never stores.
            if max_entries == 0 {
                return;
            }
            if !cache.contains_key(&key) {
                while cache.len() >= max_entries {
                    let oldest = cache
                        .iter()
                        .min_by_key(|(_, entry)| entry.inserted_at)
                        .map(|(oldest, _)| oldest.clone());
                    if let Some(oldest) = oldest {
                        cache.remove(&oldest);
                    } else {
                        break;
                    }
                }
            }
        }

        cache.insert(key, CacheEntry::new(value));
    }

    fn lock_cache(&self) -> MutexGuard<'_, HashMap<String, CacheEntry>> {
        lock_unpoisoned(&self.cache)
    }

    fn lock_fallback(&self) -> MutexGuard<'_, HashMap<String, Value>> {
        lock_unpoisoned(&self.fallback)
    }
}

/// Cache fingerprint: URL plus the canonical query serialization.
///
/// The canonical form escapes `?`, so a parameter value can never mimic
/// the separator used here.
fn cache_key(url: &str, params: &QueryParams) -> String {
    if params.is_empty() {
        url.to_owned()
    } else {
        format!("{url}?{}", params.canonical())
    }
}

fn lock_unpoisoned<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn network_failed_marker() -> Value {
    json!({ "status": "error", "message": "Network request failed", "fallback": true })
}

fn no_data_marker() -> Value {
    json!({ "status": "error", "message": "No data available" })
}

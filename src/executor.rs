use std::time::Duration;

use reqwest::{header, StatusCode};
use serde_json::{json, Value};
use tokio::time::sleep;

use crate::{ExecutorOptions, Failure, RateLimitPolicy, RequestSpec, Result};

#[derive(Clone, Debug)]
/// HTTP executor with timeout, exponential retry, and rate-limit cooperation.
///
/// Cheap to clone; clones share the underlying connection pool. The executor
/// holds no per-request state, so one instance can serve any number of
/// concurrent calls.
///
/// # Example
///
/// ```no_run
/// use resilient_http::{RequestExecutor, RequestSpec};
///
/// # async fn run() {
/// let executor = RequestExecutor::new();
/// let spec = RequestSpec::get("https://api.example.com/status");
/// let body = executor.execute(&spec).await;
/// # }
/// ```
pub struct RequestExecutor {
    http: reqwest::Client,
    options: ExecutorOptions,
}

impl RequestExecutor {
    /// Creates an executor with default options.
    pub fn new() -> Self {
        Self {
            http: reqwest::Client::new(),
            options: ExecutorOptions::default(),
        }
    }

    /// Applies executor options such as timeout and retry behavior.
    pub fn with_options(mut self, options: ExecutorOptions) -> Self {
        self.options = options;
        self
    }

    /// Executes a request, absorbing the failure cause.
    ///
    /// Returns `Some(body)` on success and `None` once the request has
    /// definitively failed, whether by a non-retryable response or an
    /// exhausted retry budget. Callers that need the cause use
    /// [`RequestExecutor::try_execute`].
    pub async fn execute(&self, spec: &RequestSpec) -> Option<Value> {
        self.try_execute(spec).await.ok()
    }

    /// Executes a request, surfacing the final [`Failure`] on error.
    ///
    /// The retry loop makes at most `max_retries + 1` budgeted attempts:
    ///
    /// - status < 400 resolves immediately; the body is parsed as JSON, and
    ///   a non-JSON body is wrapped as `{"status": "success", "data": ...}`
    ///   rather than treated as an error;
    /// - status 429 waits out the server's `Retry-After` (integer seconds;
    ///   missing or unparseable means `base_delay_ms`) and retries. Whether
    ///   the cycle consumes budget is governed by [`RateLimitPolicy`];
    /// - any other status >= 400 fails immediately with [`Failure::Http`];
    /// - timeouts and refused connections sleep
    ///   `base_delay_ms * 2^(attempt - 1)` and retry until the budget runs
    ///   out, then return the last failure;
    /// - other transport errors fail immediately without retry.
    pub async fn try_execute(&self, spec: &RequestSpec) -> Result<Value> {
        let budget = self.options.max_retries.saturating_add(1);
        let mut attempt = 1usize;

        loop {
            #[cfg(feature = "tracing")]
            tracing::debug!("attempt {}/{}: {} {}", attempt, budget, spec.method, spec.url);

            match self.attempt_once(spec).await {
                Attempt::Success(body) => return Ok(body),
                Attempt::RateLimited { delay } => {
                    if self.options.rate_limit == RateLimitPolicy::CountAttempts {
                        if attempt >= budget {
                            #[cfg(feature = "tracing")]
                            tracing::error!(
                                "rate-limit budget exhausted after {} attempts",
                                attempt
                            );
                            return Err(Failure::RateLimited { retry_after: delay });
                        }
                        attempt += 1;
                    }

                    #[cfg(feature = "tracing")]
                    tracing::warn!("rate limited, waiting {} ms", delay.as_millis());
                    sleep(delay).await;
                }
                Attempt::Retryable(failure) => {
                    if attempt >= budget {
                        #[cfg(feature = "tracing")]
                        tracing::error!(
                            "retry budget exhausted after {} attempts: {}",
                            attempt,
                            failure
                        );
                        return Err(failure);
                    }

                    let delay = backoff_delay(self.options.base_delay_ms, attempt);
                    #[cfg(feature = "tracing")]
                    tracing::warn!("{}; retrying after {} ms", failure, delay.as_millis());
                    sleep(delay).await;
                    attempt += 1;
                }
                Attempt::Fatal(failure) => {
                    #[cfg(feature = "tracing")]
                    tracing::error!("request failed without retry: {}", failure);
                    return Err(failure);
                }
            }
        }
    }

    /// Executes a GET request.
    pub async fn get(&self, url: impl Into<String>) -> Option<Value> {
        self.execute(&RequestSpec::get(url)).await
    }

    /// Executes a POST request with a JSON body.
    pub async fn post(&self, url: impl Into<String>, body: Value) -> Option<Value> {
        self.execute(&RequestSpec::post(url).body(body)).await
    }

    /// Executes a PUT request with a JSON body.
    pub async fn put(&self, url: impl Into<String>, body: Value) -> Option<Value> {
        self.execute(&RequestSpec::put(url).body(body)).await
    }

    /// Executes a DELETE request.
    pub async fn delete(&self, url: impl Into<String>) -> Option<Value> {
        self.execute(&RequestSpec::delete(url)).await
    }

    async fn attempt_once(&self, spec: &RequestSpec) -> Attempt {
        let mut request = self
            .http
            .request(spec.method.as_reqwest(), &spec.url)
            .timeout(Duration::from_millis(self.options.timeout_ms));

        if !spec.params.is_empty() {
            request = request.query(spec.params.as_map());
        }
        for (name, value) in spec.headers.iter() {
            request = request.header(name, value);
        }
        if let Some(body) = &spec.body {
            request = request.json(body);
        }

        match request.send().await {
            Ok(response) => self.classify_response(response).await,
            Err(err) => self.classify_send_error(err),
        }
    }

    async fn classify_response(&self, response: reqwest::Response) -> Attempt {
        let status = response.status();

        if status == StatusCode::TOO_MANY_REQUESTS {
            let delay = parse_retry_after(
                response
                    .headers()
                    .get(header::RETRY_AFTER)
                    .and_then(|value| value.to_str().ok()),
                self.options.base_delay_ms,
            );
            return Attempt::RateLimited { delay };
        }

        let body = match response.text().await {
            Ok(body) => body,
            Err(err) => return self.classify_send_error(err),
        };

        if status.as_u16() >= 400 {
            return Attempt::Fatal(Failure::Http {
                status: status.as_u16(),
                body,
            });
        }

        Attempt::Success(decode_success_body(&body))
    }

    fn classify_send_error(&self, err: reqwest::Error) -> Attempt {
        if err.is_timeout() {
            return Attempt::Retryable(Failure::Timeout {
                timeout_ms: self.options.timeout_ms,
                source: err,
            });
        }
        if err.is_connect() {
            return Attempt::Retryable(Failure::ConnectionRefused(err));
        }
        if err.is_builder() {
            return Attempt::Fatal(Failure::Unexpected(format!("invalid request: {err}")));
        }
        Attempt::Fatal(Failure::Transport(err))
    }
}

impl Default for RequestExecutor {
    fn default() -> Self {
        Self::new()
    }
}

/// How one network attempt resolved.
enum Attempt {
    Success(Value),
    RateLimited { delay: Duration },
    Retryable(Failure),
    Fatal(Failure),
}

/// Backoff before retry number `attempt` (1-based): `base * 2^(attempt - 1)`.
fn backoff_delay(base_delay_ms: u64, attempt: usize) -> Duration {
    // Cap the exponent to keep the shift in range.
    let exp = attempt.saturating_sub(1).min(16) as u32;
    Duration::from_millis(base_delay_ms.saturating_mul(1u64 << exp))
}

/// Interprets a `Retry-After` header as integer seconds.
///
/// Absent or unparseable values fall back to `base_delay_ms`; the HTTP-date
/// form of the header is not supported.
fn parse_retry_after(header: Option<&str>, base_delay_ms: u64) -> Duration {
    header
        .and_then(|value| value.trim().parse::<u64>().ok())
        .map(Duration::from_secs)
        .unwrap_or_else(|| Duration::from_millis(base_delay_ms))
}

fn decode_success_body(body: &str) -> Value {
    match serde_json::from_str::<Value>(body) {
        Ok(value) => value,
        Err(_) => json!({ "status": "success", "data": body }),
    }
}

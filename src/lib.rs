//! `resilient-http` is an async HTTP request layer that keeps degraded
//! backends from taking the caller down with them.
//!
//! Two pieces compose the crate:
//! - [`RequestExecutor`] executes one request with timeout, exponential
//!   retry for transient faults, and `Retry-After` cooperation on 429;
//! - [`FallbackCoordinator`] wraps an executor with response caching and
//!   per-URL fallback data so every call resolves to a structured JSON
//!   value, never an error.

mod coordinator;
mod error;
mod executor;
mod options;
mod request;

pub use coordinator::FallbackCoordinator;
pub use error::Failure;
pub use executor::RequestExecutor;
pub use options::{CacheOptions, ExecutorOptions, RateLimitPolicy};
pub use request::{Headers, Method, QueryParams, RequestSpec};

pub type Result<T> = std::result::Result<T, Failure>;

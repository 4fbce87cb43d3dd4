//! HTTP client module
//!
//! Provides the HTTP client used for every API call.
//!
//! # Features
//!
//! - **Bearer Authentication**: The access token is attached to every request
//! - **Explicit Retry Policy**: Bounded attempts with a backoff schedule
//! - **Rate Limiting**: Token bucket rate limiter using governor

mod client;
mod rate_limit;
mod retry;

pub use client::{HttpClient, HttpClientConfig, RequestConfig};
pub use rate_limit::{RateLimiter, RateLimiterConfig};
pub use retry::RetryPolicy;

#[cfg(test)]
mod tests;

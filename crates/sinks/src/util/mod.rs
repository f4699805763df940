//! Shared utilities for sinks

mod rate_limited_logger;

pub use rate_limited_logger::{DEFAULT_REPORT_INTERVAL, RateLimitedLogger};

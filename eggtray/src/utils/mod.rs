//! Utility modules for eggtray

pub mod retry;

pub use retry::{retry_with_backoff, RetryPolicy, Retryable};

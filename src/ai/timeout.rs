//! Timeout helpers
//!
//! Wrap an async operation so that an expired deadline surfaces as
//! [`WikiError::Timeout`] naming the operation.

use std::future::Future;
use std::time::Duration;

use crate::types::{Result, WikiError};

/// Execute an async operation with a timeout
///
/// ```ignore
/// let text = with_timeout(
///     Duration::from_secs(300),
///     provider.synthesize(&request),
///     "generate 100",
/// ).await?;
/// ```
pub async fn with_timeout<T, F>(timeout: Duration, future: F, operation_name: &str) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match tokio::time::timeout(timeout, future).await {
        Ok(result) => result,
        Err(_) => Err(WikiError::timeout(operation_name, timeout)),
    }
}

/// Like [`with_timeout`] for futures that cannot fail on their own
pub async fn with_timeout_map<T, F>(timeout: Duration, future: F, operation_name: &str) -> Result<T>
where
    F: Future<Output = T>,
{
    match tokio::time::timeout(timeout, future).await {
        Ok(result) => Ok(result),
        Err(_) => Err(WikiError::timeout(operation_name, timeout)),
    }
}

//! Slow Backend
//!
//! Stand-in for an expensive query or upstream API call.

use std::time::Duration;

use bytes::Bytes;
use tracing::info;

/// Format of the returned timestamp, e.g. `Sat, 17 Oct 2026 10:00:00 GMT`.
pub const TIMESTAMP_FORMAT: &str = "%a, %d %b %Y %H:%M:%S GMT";

/// Waits `delay`, then returns the current UTC time as an HTTP-date.
pub async fn slow_query(delay: Duration) -> anyhow::Result<Bytes> {
    info!(delay_ms = delay.as_millis() as u64, "Running expensive query");
    tokio::time::sleep(delay).await;

    Ok(Bytes::from(
        chrono::Utc::now().format(TIMESTAMP_FORMAT).to_string(),
    ))
}

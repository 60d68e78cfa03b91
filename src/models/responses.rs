//! Response DTOs for the demo HTTP API
//!
//! Defines the structure of outgoing HTTP response bodies.

use serde::Serialize;

use crate::cache::StatsSnapshot;

/// Response body for GET /pageview
#[derive(Debug, Clone, Serialize)]
pub struct PageviewResponse {
    /// Always "ok"
    pub status: String,
    /// Counter value after this view
    pub views: i64,
}

impl PageviewResponse {
    pub fn new(views: i64) -> Self {
        Self {
            status: "ok".to_string(),
            views,
        }
    }
}

/// Response body for GET /get-cached
#[derive(Debug, Clone, Serialize)]
pub struct CachedResponse {
    /// Result of the expensive call, possibly served from the store
    pub data: String,
    /// Always "ok"
    pub status: String,
}

impl CachedResponse {
    pub fn new(data: impl Into<String>) -> Self {
        Self {
            data: data.into(),
            status: "ok".to_string(),
        }
    }
}

/// Response body for the stats endpoint (GET /stats)
#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    #[serde(flatten)]
    pub counters: StatsSnapshot,
    /// Hit rate (hits / (hits + misses))
    pub hit_rate: f64,
}

impl StatsResponse {
    /// Creates a new StatsResponse from a counter snapshot
    pub fn new(counters: StatsSnapshot) -> Self {
        let hit_rate = counters.hit_rate();
        Self { counters, hit_rate }
    }
}

/// Response body for the health endpoint (GET /health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Health status (e.g., "healthy")
    pub status: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl HealthResponse {
    /// Creates a new HealthResponse with current timestamp
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Error response body for all error conditions
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    /// Error message describing what went wrong
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pageview_response_serialize() {
        let json = serde_json::to_value(PageviewResponse::new(7)).unwrap();
        assert_eq!(json["status"], "ok");
        assert_eq!(json["views"], 7);
    }

    #[test]
    fn test_cached_response_serialize() {
        let json = serde_json::to_value(CachedResponse::new("Sat, 17 Oct 2026 10:00:00 +0000")).unwrap();
        assert_eq!(json["status"], "ok");
        assert_eq!(json["data"], "Sat, 17 Oct 2026 10:00:00 +0000");
    }

    #[test]
    fn test_stats_response_flattens_counters() {
        let counters = StatsSnapshot {
            hits: 80,
            misses: 20,
            ..StatsSnapshot::default()
        };
        let resp = StatsResponse::new(counters);
        assert!((resp.hit_rate - 0.8).abs() < 0.001);

        let json = serde_json::to_value(&resp).unwrap();
        assert_eq!(json["hits"], 80);
        assert_eq!(json["misses"], 20);
        assert!(json.get("counters").is_none());
    }

    #[test]
    fn test_health_response_serialize() {
        let json = serde_json::to_string(&HealthResponse::healthy()).unwrap();
        assert!(json.contains("healthy"));
        assert!(json.contains("timestamp"));
    }

    #[test]
    fn test_error_response_serialize() {
        let json = serde_json::to_string(&ErrorResponse::new("Something went wrong")).unwrap();
        assert!(json.contains("error"));
        assert!(json.contains("Something went wrong"));
    }
}

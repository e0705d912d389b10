use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use serde::Serialize;
use tracing::debug;

use crate::errors::Result;
use crate::model::Envelope;

/// Result of one envelope transmission. Transport problems are classified
/// here rather than propagated, so the send loop never aborts on them.
#[derive(Debug, Clone, Serialize)]
pub struct SendOutcome {
    pub success: bool,
    pub timestamp: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Running success/failure tally, safe to share across concurrent sends.
#[derive(Debug, Default)]
pub struct SendStats {
    pub successful: AtomicU64,
    pub failed: AtomicU64,
}

impl SendStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, outcome: &SendOutcome) {
        if outcome.success {
            self.successful.fetch_add(1, Ordering::Relaxed);
        } else {
            self.failed.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn success_rate(&self) -> f64 {
        let successful = self.successful.load(Ordering::Relaxed);
        let failed = self.failed.load(Ordering::Relaxed);
        let total = successful + failed;
        if total == 0 {
            0.0
        } else {
            successful as f64 / total as f64 * 100.0
        }
    }
}

/// Thin HTTP client posting envelopes to the EMS endpoint.
#[derive(Clone)]
pub struct ApiClient {
    client: reqwest::Client,
    api_url: String,
}

impl ApiClient {
    pub fn new(api_url: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            api_url: api_url.to_string(),
        })
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    /// Posts one envelope as JSON. Exactly one attempt per envelope; any
    /// 2xx status counts as success.
    pub async fn send(&self, envelope: &Envelope) -> SendOutcome {
        let timestamp = envelope.ts.clone();

        match self.client.post(&self.api_url).json(envelope).send().await {
            Ok(response) => {
                let status = response.status();
                let body = response.json::<serde_json::Value>().await.ok();

                if status.is_success() {
                    SendOutcome {
                        success: true,
                        timestamp,
                        response: body,
                        error: None,
                    }
                } else {
                    debug!("Endpoint returned {} for {}", status, timestamp);
                    let error = match body {
                        Some(payload) => format!("HTTP {}: {}", status.as_u16(), payload),
                        None => format!("HTTP {}", status.as_u16()),
                    };
                    SendOutcome {
                        success: false,
                        timestamp,
                        response: None,
                        error: Some(error),
                    }
                }
            }
            Err(e) => SendOutcome {
                success: false,
                timestamp,
                response: None,
                error: Some(e.to_string()),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outcome(success: bool) -> SendOutcome {
        SendOutcome {
            success,
            timestamp: "2025-10-20T00:00:00".to_string(),
            response: None,
            error: if success {
                None
            } else {
                Some("HTTP 500".to_string())
            },
        }
    }

    #[test]
    fn test_stats_tally() {
        let stats = SendStats::new();
        stats.record(&outcome(true));
        stats.record(&outcome(true));
        stats.record(&outcome(true));
        stats.record(&outcome(false));

        assert_eq!(stats.successful.load(Ordering::Relaxed), 3);
        assert_eq!(stats.failed.load(Ordering::Relaxed), 1);
        assert_eq!(stats.success_rate(), 75.0);
    }

    #[test]
    fn test_success_rate_with_no_sends() {
        assert_eq!(SendStats::new().success_rate(), 0.0);
    }

    #[test]
    fn test_outcome_serialization_omits_empty_fields() {
        let value = serde_json::to_value(outcome(true)).unwrap();
        let object = value.as_object().unwrap();
        assert!(object.contains_key("success"));
        assert!(object.contains_key("timestamp"));
        assert!(!object.contains_key("response"));
        assert!(!object.contains_key("error"));

        let value = serde_json::to_value(outcome(false)).unwrap();
        assert_eq!(value["error"], "HTTP 500");
    }
}

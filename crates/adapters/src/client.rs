//! Shared HTTP client: retry, exponential backoff with jitter, and
//! status classification. Every adapter funnels its requests here.

use std::time::Duration;

use capitol_model::Source;
use tracing::warn;

use crate::error::AdapterError;

const USER_AGENT: &str = concat!("capitol/", env!("CARGO_PKG_VERSION"));

/// Retry budget and timing knobs, configurable per run.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Total attempts before giving up (default 5).
    pub budget: u32,
    /// Per-call wall-clock timeout (default 30s).
    pub timeout: Duration,
    /// First backoff step (default 1s); doubles per retry.
    pub base_backoff: Duration,
    /// Backoff ceiling (default 32s).
    pub max_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            budget: 5,
            timeout: Duration::from_secs(30),
            base_backoff: Duration::from_secs(1),
            max_backoff: Duration::from_secs(32),
        }
    }
}

impl RetryPolicy {
    /// Backoff for the given 1-based attempt: 1s, 2s, 4s … capped,
    /// with ±20% jitter.
    fn backoff(&self, attempt: u32) -> Duration {
        let exp = self.base_backoff.as_secs_f64() * f64::from(2u32.saturating_pow(attempt - 1));
        let capped = exp.min(self.max_backoff.as_secs_f64());
        let jitter = 0.8 + 0.4 * rand::random::<f64>();
        Duration::from_secs_f64(capped * jitter)
    }
}

/// HTTP client bound to one source, owning its retry policy.
pub struct FetchClient {
    http: reqwest::Client,
    origin: Source,
    policy: RetryPolicy,
}

impl FetchClient {
    pub fn new(origin: Source, policy: RetryPolicy) -> Result<Self, AdapterError> {
        let http = reqwest::Client::builder()
            .timeout(policy.timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| AdapterError::SourceUnavailable {
                origin,
                attempts: 0,
                reason: format!("cannot build HTTP client: {e}"),
            })?;
        Ok(Self { http, origin, policy })
    }

    pub fn origin(&self) -> Source {
        self.origin
    }

    /// GET returning parsed JSON, with the standard retry loop.
    pub async fn get_json(
        &self,
        url: &str,
        query: &[(&str, String)],
        headers: &[(&str, &str)],
    ) -> Result<serde_json::Value, AdapterError> {
        let text = self.get_text(url, query, headers).await?;
        serde_json::from_str(text.trim_start_matches('\u{feff}')).map_err(|e| {
            AdapterError::SourceUnavailable {
                origin: self.origin,
                attempts: 1,
                reason: format!("bad JSON from {url}: {e}"),
            }
        })
    }

    /// GET returning the raw body. Retries 429 (honoring Retry-After)
    /// and 5xx/network errors; other 4xx fail immediately.
    pub async fn get_text(
        &self,
        url: &str,
        query: &[(&str, String)],
        headers: &[(&str, &str)],
    ) -> Result<String, AdapterError> {
        let mut last_was_rate_limit = false;
        let mut last_reason = String::new();

        for attempt in 1..=self.policy.budget {
            let mut req = self.http.get(url).query(query);
            for (name, value) in headers {
                req = req.header(*name, *value);
            }

            match req.send().await {
                Ok(resp) => {
                    let status = resp.status().as_u16();

                    if status == 429 {
                        last_was_rate_limit = true;
                        last_reason = "HTTP 429".into();
                        if attempt < self.policy.budget {
                            let wait = resp
                                .headers()
                                .get("retry-after")
                                .and_then(|v| v.to_str().ok())
                                .and_then(|v| v.parse::<u64>().ok())
                                .map(Duration::from_secs)
                                .unwrap_or_else(|| self.policy.backoff(attempt));
                            warn!(source = %self.origin, attempt, wait_s = wait.as_secs(), "rate limited, backing off");
                            tokio::time::sleep(wait).await;
                        }
                        continue;
                    }

                    if status >= 500 {
                        last_was_rate_limit = false;
                        last_reason = format!("HTTP {status}");
                        if attempt < self.policy.budget {
                            let wait = self.policy.backoff(attempt);
                            warn!(source = %self.origin, attempt, status, "upstream error, backing off");
                            tokio::time::sleep(wait).await;
                        }
                        continue;
                    }

                    if status >= 400 {
                        // 4xx other than 429: retrying cannot fix it.
                        return Err(AdapterError::SourceUnavailable {
                            origin: self.origin,
                            attempts: attempt,
                            reason: format!("HTTP {status} from {url}"),
                        });
                    }

                    return resp.text().await.map_err(|e| AdapterError::SourceUnavailable {
                        origin: self.origin,
                        attempts: attempt,
                        reason: format!("cannot read body: {e}"),
                    });
                }
                Err(e) => {
                    last_was_rate_limit = false;
                    last_reason = e.to_string();
                    if attempt < self.policy.budget {
                        let wait = self.policy.backoff(attempt);
                        warn!(source = %self.origin, attempt, error = %e, "transport error, backing off");
                        tokio::time::sleep(wait).await;
                    }
                }
            }
        }

        if last_was_rate_limit {
            Err(AdapterError::RateLimited { origin: self.origin, attempts: self.policy.budget })
        } else {
            Err(AdapterError::SourceUnavailable {
                origin: self.origin,
                attempts: self.policy.budget,
                reason: last_reason,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;

    fn quick_policy() -> RetryPolicy {
        RetryPolicy {
            budget: 3,
            timeout: Duration::from_secs(5),
            base_backoff: Duration::from_millis(1),
            max_backoff: Duration::from_millis(2),
        }
    }

    #[tokio::test]
    async fn success_returns_body() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/ok");
                then.status(200).body("{\"members\": []}");
            })
            .await;

        let client = FetchClient::new(Source::CongressGov, quick_policy()).unwrap();
        let body = client.get_json(&server.url("/ok"), &[], &[]).await.unwrap();
        assert!(body["members"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn rate_limit_exhausts_to_rate_limited() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET).path("/limited");
                then.status(429).header("retry-after", "0");
            })
            .await;

        let client = FetchClient::new(Source::CongressGov, quick_policy()).unwrap();
        let err = client.get_text(&server.url("/limited"), &[], &[]).await.unwrap_err();
        assert!(matches!(err, AdapterError::RateLimited { attempts: 3, .. }));
        mock.assert_hits_async(3).await;
    }

    #[tokio::test]
    async fn client_error_fails_fast() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET).path("/forbidden");
                then.status(403);
            })
            .await;

        let client = FetchClient::new(Source::CongressGov, quick_policy()).unwrap();
        let err = client.get_text(&server.url("/forbidden"), &[], &[]).await.unwrap_err();
        assert!(matches!(err, AdapterError::SourceUnavailable { attempts: 1, .. }));
        mock.assert_hits_async(1).await;
    }

    #[tokio::test]
    async fn server_error_retries_then_gives_up() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET).path("/broken");
                then.status(503);
            })
            .await;

        let client = FetchClient::new(Source::ChamberSite, quick_policy()).unwrap();
        let err = client.get_text(&server.url("/broken"), &[], &[]).await.unwrap_err();
        assert!(matches!(err, AdapterError::SourceUnavailable { attempts: 3, .. }));
        mock.assert_hits_async(3).await;
    }
}

use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT_ENCODING};
use reqwest::{Client, Response, StatusCode};
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::core::error::{BrowserError, BrowserResult};

const APP_USER_AGENT: &str = concat!("version-browser/", env!("CARGO_PKG_VERSION"));

/// Header carrying the absolute time at which a rate-limited client may retry.
pub const RATE_LIMIT_RESET_HEADER: &str = "x-ratelimit-reset";

/// Pause used when the server's reset time has already passed.
const STALE_RESET_DELAY_MS: i64 = 250;

pub fn build_http_client() -> Result<Client, reqwest::Error> {
    let mut default_headers = HeaderMap::new();
    default_headers.insert(ACCEPT_ENCODING, HeaderValue::from_static("identity"));

    Client::builder()
        .user_agent(APP_USER_AGENT)
        .default_headers(default_headers)
        .build()
}

/// Parse a reset header value: unix seconds (integer or fractional) or RFC 3339.
pub fn parse_reset_timestamp(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(secs) = value.parse::<f64>() {
        if !secs.is_finite() || secs < 0.0 {
            return None;
        }
        return DateTime::from_timestamp_millis((secs * 1000.0) as i64);
    }
    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Shared rate-limit window for every request of one run.
///
/// A 429 response records the server's reset time; every later request waits
/// for it before going out. The lock is held while sleeping, so concurrent
/// callers queue behind a single sleeper instead of each sleeping and
/// retrying on their own.
#[derive(Debug, Default)]
pub struct RateLimiter {
    resume_at: Mutex<Option<DateTime<Utc>>>,
}

impl RateLimiter {
    pub fn new() -> Self {
        Self::default()
    }

    /// GET `url`, retrying indefinitely while the server answers 429.
    ///
    /// Any other non-success status is returned as `DownloadFailed`.
    pub async fn get(&self, client: &Client, url: &str) -> BrowserResult<Response> {
        let mut attempts = 0u32;
        loop {
            self.wait_until_clear().await;

            let response = client.get(url).send().await?;
            let status = response.status();

            if status == StatusCode::TOO_MANY_REQUESTS {
                let reset = response
                    .headers()
                    .get(RATE_LIMIT_RESET_HEADER)
                    .and_then(|v| v.to_str().ok())
                    .and_then(parse_reset_timestamp)
                    .ok_or_else(|| BrowserError::RateLimitResetUnusable {
                        url: url.to_string(),
                    })?;
                attempts += 1;
                let now = Utc::now();
                let resume = if reset > now {
                    warn!("Rate limited on {} (attempt {}), retrying at {}", url, attempts, reset);
                    reset
                } else {
                    warn!(
                        "Rate limited on {} (attempt {}) with stale reset {}, retrying shortly",
                        url, attempts, reset
                    );
                    now + chrono::Duration::milliseconds(STALE_RESET_DELAY_MS)
                };
                self.defer_until(resume).await;
                continue;
            }

            if !status.is_success() {
                return Err(BrowserError::DownloadFailed {
                    url: url.to_string(),
                    status: status.as_u16(),
                });
            }

            return Ok(response);
        }
    }

    async fn defer_until(&self, reset: DateTime<Utc>) {
        let mut resume_at = self.resume_at.lock().await;
        *resume_at = Some(match *resume_at {
            Some(existing) if existing > reset => existing,
            _ => reset,
        });
    }

    async fn wait_until_clear(&self) {
        let resume_at = self.resume_at.lock().await;
        if let Some(at) = *resume_at {
            let remaining = (at - Utc::now()).to_std().unwrap_or(Duration::ZERO);
            if !remaining.is_zero() {
                debug!("Waiting {:?} for rate limit window", remaining);
                tokio::time::sleep(remaining).await;
            }
        }
    }
}

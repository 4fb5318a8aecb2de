//! DeepL translation with exponential backoff on overload.
//!
//! # Architecture
//!
//! The module uses a trait-based design for flexibility:
//! - [`Translate`]: Core trait defining one async translation call
//! - [`DeepLClient`]: DeepL REST API implementation
//! - [`RetryTranslate`]: Decorator that retries any [`Translate`] on overload
//!
//! # Retry Strategy
//!
//! - Only overload signals (HTTP 429, 503, 529) are retried
//! - At most 5 calls in total
//! - Delay after failed attempt `n` (counted from 1) is
//!   `min(1 s × 2^n, 60 s)`, so 2 s, 4 s, 8 s, 16 s
//! - Any other error is returned after the first call

use crate::config::{RETRY_ATTEMPTS, RETRY_BASE_DELAY, RETRY_MAX_DELAY};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{Duration, Instant};
use tokio::time::sleep;
use tracing::{error, instrument, warn};

const DEEPL_FREE_URL: &str = "https://api-free.deepl.com";
const DEEPL_PRO_URL: &str = "https://api.deepl.com";
/// DeepL's "service under high load" status.
const STATUS_HIGH_LOAD: u16 = 529;

#[derive(thiserror::Error, Debug)]
pub enum TranslateError {
    #[error("DeepL authentication key is not configured")]
    MissingAuthKey,
    #[error("translation service overloaded (status {status}): {message}")]
    Overloaded { status: u16, message: String },
    #[error("translation service error (status {status}): {message}")]
    Api { status: u16, message: String },
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("translation response contained no text")]
    EmptyResponse,
    #[error("gave up after {attempts} attempts: {last}")]
    RetriesExhausted {
        attempts: u32,
        last: Box<TranslateError>,
    },
}

impl TranslateError {
    /// Whether the service asked us to slow down.
    pub fn is_overload(&self) -> bool {
        matches!(self, Self::Overloaded { .. })
    }
}

/// One text translation.
pub trait Translate {
    async fn translate(
        &self,
        text: &str,
        source_lang: &str,
        target_lang: &str,
    ) -> Result<String, TranslateError>;
}

/// Client for DeepL's `/v2/translate` endpoint.
#[derive(Clone)]
pub struct DeepLClient {
    base_url: String,
    auth_key: String,
    http: reqwest::Client,
}

impl fmt::Debug for DeepLClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeepLClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

#[derive(Serialize)]
struct TranslateRequest<'a> {
    text: [&'a str; 1],
    source_lang: String,
    target_lang: String,
}

#[derive(Deserialize)]
struct TranslateResponse {
    translations: Vec<Translation>,
}

#[derive(Deserialize)]
struct Translation {
    text: String,
}

impl DeepLClient {
    /// Build a client for `auth_key`.
    ///
    /// Free-tier keys (ending in `:fx`) talk to `api-free.deepl.com`, other
    /// keys to `api.deepl.com`, unless `base_url` is given.
    ///
    /// # Errors
    ///
    /// [`TranslateError::MissingAuthKey`] when the key is absent or blank.
    pub fn new(auth_key: Option<&str>, base_url: Option<&str>) -> Result<Self, TranslateError> {
        let auth_key = auth_key
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .ok_or(TranslateError::MissingAuthKey)?;
        let base_url = match base_url {
            Some(url) => url.trim_end_matches('/').to_string(),
            None if auth_key.ends_with(":fx") => DEEPL_FREE_URL.to_string(),
            None => DEEPL_PRO_URL.to_string(),
        };
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;
        Ok(Self {
            base_url,
            auth_key: auth_key.to_string(),
            http,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

impl Translate for DeepLClient {
    #[instrument(level = "debug", skip_all, fields(chars = text.chars().count()))]
    async fn translate(
        &self,
        text: &str,
        source_lang: &str,
        target_lang: &str,
    ) -> Result<String, TranslateError> {
        let t0 = Instant::now();
        let body = TranslateRequest {
            text: [text],
            source_lang: source_lang.to_uppercase(),
            target_lang: target_lang.to_uppercase(),
        };
        let resp = self
            .http
            .post(format!("{}/v2/translate", self.base_url))
            .header("Authorization", format!("DeepL-Auth-Key {}", self.auth_key))
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            warn!(
                elapsed_ms = t0.elapsed().as_millis() as u64,
                status = status.as_u16(),
                "DeepL call failed"
            );
            return Err(classify(status, message));
        }

        let parsed: TranslateResponse = resp.json().await?;
        parsed
            .translations
            .into_iter()
            .next()
            .map(|t| t.text)
            .ok_or(TranslateError::EmptyResponse)
    }
}

fn classify(status: StatusCode, message: String) -> TranslateError {
    let code = status.as_u16();
    if status == StatusCode::TOO_MANY_REQUESTS
        || status == StatusCode::SERVICE_UNAVAILABLE
        || code == STATUS_HIGH_LOAD
    {
        TranslateError::Overloaded {
            status: code,
            message,
        }
    } else {
        TranslateError::Api {
            status: code,
            message,
        }
    }
}

/// Delay after failed attempt `attempt` (counted from 1): `min(base × 2^attempt, max)`.
pub fn backoff_delay(base: Duration, max: Duration, attempt: u32) -> Duration {
    let factor = 2u32.checked_pow(attempt).unwrap_or(u32::MAX);
    base.saturating_mul(factor).min(max)
}

/// Wrapper that retries any [`Translate`] implementation while it reports overload.
pub struct RetryTranslate<T> {
    inner: T,
    /// Total calls allowed, the first one included.
    max_attempts: u32,
    base_delay: Duration,
    max_delay: Duration,
}

impl<T> RetryTranslate<T> {
    /// Wrap `inner` with the default policy (5 attempts, 1 s base, 60 s cap).
    pub fn new(inner: T) -> Self {
        Self::with_policy(inner, RETRY_ATTEMPTS, RETRY_BASE_DELAY, RETRY_MAX_DELAY)
    }

    pub fn with_policy(inner: T, max_attempts: u32, base_delay: Duration, max_delay: Duration) -> Self {
        Self {
            inner,
            max_attempts: max_attempts.max(1),
            base_delay,
            max_delay,
        }
    }

    pub fn inner(&self) -> &T {
        &self.inner
    }
}

impl<T> fmt::Debug for RetryTranslate<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryTranslate")
            .field("max_attempts", &self.max_attempts)
            .field("base_delay", &self.base_delay)
            .field("max_delay", &self.max_delay)
            .finish()
    }
}

impl<T: Translate> Translate for RetryTranslate<T> {
    #[instrument(level = "debug", skip_all)]
    async fn translate(
        &self,
        text: &str,
        source_lang: &str,
        target_lang: &str,
    ) -> Result<String, TranslateError> {
        let total_t0 = Instant::now();
        let mut attempt = 0u32;

        loop {
            attempt += 1;
            let err = match self.inner.translate(text, source_lang, target_lang).await {
                Ok(translated) => return Ok(translated),
                Err(e) if e.is_overload() => e,
                Err(e) => return Err(e),
            };

            if attempt >= self.max_attempts {
                error!(
                    attempt,
                    max = self.max_attempts,
                    elapsed_ms_total = total_t0.elapsed().as_millis() as u64,
                    error = %err,
                    "translate() exhausted retries"
                );
                return Err(TranslateError::RetriesExhausted {
                    attempts: attempt,
                    last: Box::new(err),
                });
            }

            let delay = backoff_delay(self.base_delay, self.max_delay, attempt);
            warn!(
                attempt,
                max = self.max_attempts,
                ?delay,
                error = %err,
                "Translation service overloaded; backing off"
            );
            sleep(delay).await;
        }
    }
}

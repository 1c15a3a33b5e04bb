use std::time::Duration;

use chantier_core::AppConfig;
use reqwest::{RequestBuilder, Response, Url};
use serde::de::DeserializeOwned;

use crate::error::{SupabaseError, extract_error_message};

/// Request timeout for every call, uploads included.
pub const REQUEST_TIMEOUT_SECS: u64 = 30;
/// Backoff between replays of an idempotent request.
pub const DEFAULT_RETRY_DELAYS_SECS: [u64; 3] = [1, 2, 4];

/// Client for the Supabase REST surfaces.
///
/// Every request carries the anon key as `apikey`; the `Authorization` bearer is the
/// user's access token when one is given so row-level security applies.
#[derive(Clone)]
pub struct SupabaseClient {
    pub(crate) client: reqwest::Client,
    pub(crate) base_url: String,
    pub(crate) anon_key: String,
    pub(crate) retry_delays: Vec<Duration>,
}

impl std::fmt::Debug for SupabaseClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SupabaseClient")
            .field("client", &self.client)
            .field("base_url", &self.base_url)
            .field("anon_key", &"***")
            .field("retry_delays", &self.retry_delays)
            .finish()
    }
}

impl SupabaseClient {
    /// Creates a new client for the project at `base_url`.
    ///
    /// # Errors
    /// Returns an error if the URL is not absolute or the HTTP client cannot be built.
    pub fn new(base_url: impl Into<String>, anon_key: impl Into<String>) -> Result<Self, SupabaseError> {
        let base_url = base_url.into().trim_end_matches('/').to_owned();
        Url::parse(&base_url).map_err(|e| SupabaseError::InvalidUrl(format!("{base_url}: {e}")))?;
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| SupabaseError::ClientInit(e.to_string()))?;
        Ok(Self {
            client,
            base_url,
            anon_key: anon_key.into(),
            retry_delays: DEFAULT_RETRY_DELAYS_SECS.iter().map(|s| Duration::from_secs(*s)).collect(),
        })
    }

    pub fn from_config(config: &AppConfig) -> Result<Self, SupabaseError> {
        Self::new(config.supabase_url.clone(), config.anon_key.clone())
    }

    /// Replace the backoff schedule for idempotent requests. An empty schedule disables replays.
    #[must_use]
    pub fn with_retry_delays(mut self, delays: Vec<Duration>) -> Self {
        self.retry_delays = delays;
        self
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Build `{base_url}/{segments...}` with each segment percent-encoded.
    ///
    /// A segment containing `/` is split so object keys keep their folder structure.
    pub(crate) fn endpoint(&self, segments: &[&str]) -> Result<Url, SupabaseError> {
        let mut url =
            Url::parse(&self.base_url).map_err(|e| SupabaseError::InvalidUrl(e.to_string()))?;
        {
            let mut path = url
                .path_segments_mut()
                .map_err(|()| SupabaseError::InvalidUrl(self.base_url.clone()))?;
            path.pop_if_empty();
            for segment in segments {
                path.extend(segment.split('/').filter(|s| !s.is_empty()));
            }
        }
        Ok(url)
    }

    pub(crate) fn request(
        &self,
        method: reqwest::Method,
        url: Url,
        access_token: Option<&str>,
    ) -> RequestBuilder {
        let bearer = access_token.unwrap_or(&self.anon_key);
        self.client
            .request(method, url)
            .header("apikey", &self.anon_key)
            .header("Authorization", format!("Bearer {bearer}"))
    }

    /// Send once; non-2xx statuses become `HttpStatus` with the service's message.
    pub(crate) async fn send(&self, request: RequestBuilder) -> Result<Response, SupabaseError> {
        let response = request.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_else(|_| "Could not read error body".to_owned());
        Err(SupabaseError::HttpStatus { code: status.as_u16(), message: extract_error_message(&body) })
    }

    /// Send a read request, replaying it on transient failures.
    pub(crate) async fn send_idempotent<F>(&self, what: &str, build: F) -> Result<Response, SupabaseError>
    where
        F: Fn() -> RequestBuilder,
    {
        let max_retries = self.retry_delays.len();
        let mut last_error: Option<SupabaseError> = None;

        for attempt in 0..=max_retries {
            if attempt > 0 {
                let delay = self.retry_delays.get(attempt - 1).copied().unwrap_or_default();
                tokio::time::sleep(delay).await;
                tracing::warn!("{what}: retry attempt {attempt}/{max_retries} after {delay:?}");
            }

            match self.send(build()).await {
                Ok(response) => return Ok(response),
                Err(err) if err.is_transient() => last_error = Some(err),
                Err(err) => return Err(err),
            }
        }

        let last = last_error.unwrap_or(SupabaseError::HttpStatus {
            code: 0,
            message: "no attempt made".to_owned(),
        });
        if max_retries == 0 {
            return Err(last);
        }
        Err(SupabaseError::RetriesExhausted(Box::new(last)))
    }

    pub(crate) async fn parse_json<T: DeserializeOwned>(
        response: Response,
        context: &str,
    ) -> Result<T, SupabaseError> {
        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| SupabaseError::JsonParse {
            context: format!("{context} (body: {})", truncate(&body, 200)),
            source: e,
        })
    }
}

/// Truncates a string to the given maximum length at a char boundary.
#[must_use]
pub fn truncate(s: &str, max_len: usize) -> &str {
    if s.len() <= max_len {
        s
    } else {
        let mut end = max_len;
        while end > 0 && !s.is_char_boundary(end) {
            end = end.saturating_sub(1);
        }
        s.get(..end).unwrap_or("")
    }
}

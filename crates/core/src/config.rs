//! Runtime configuration, read once at startup.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_BUCKET, DEFAULT_MAX_UPLOAD_MB, DEFAULT_PV_LOG_TABLE, DEFAULT_SIGNED_URL_TTL_SECS,
};
use crate::env_config::{env_optional, env_parse_with_default, env_required};
use crate::error::CoreError;

/// How document links are produced when listing a project's attachments.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UrlMode {
    /// Time-limited signed URLs (private bucket).
    #[default]
    Signed,
    /// Permanent public URLs (public bucket).
    Public,
}

impl UrlMode {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match *self {
            Self::Signed => "signed",
            Self::Public => "public",
        }
    }
}

impl fmt::Display for UrlMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UrlMode {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "signed" => Ok(Self::Signed),
            "public" => Ok(Self::Public),
            other => Err(CoreError::InvalidConfig {
                field: "CHANTIER_URL_MODE",
                reason: format!("expected 'signed' or 'public', got '{other}'"),
            }),
        }
    }
}

/// Connection and behaviour settings for the tracker.
#[derive(Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub supabase_url: String,
    pub anon_key: String,
    pub bucket: String,
    pub max_upload_mb: u64,
    pub signed_url_ttl_secs: u64,
    pub url_mode: UrlMode,
    /// Auxiliary table receiving one row per uploaded document, when enabled.
    pub pv_log_table: Option<String>,
}

impl fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppConfig")
            .field("supabase_url", &self.supabase_url)
            .field("anon_key", &"***")
            .field("bucket", &self.bucket)
            .field("max_upload_mb", &self.max_upload_mb)
            .field("signed_url_ttl_secs", &self.signed_url_ttl_secs)
            .field("url_mode", &self.url_mode)
            .field("pv_log_table", &self.pv_log_table)
            .finish()
    }
}

impl AppConfig {
    /// Build a configuration with defaults for everything but the connection.
    #[must_use]
    pub fn new(supabase_url: impl Into<String>, anon_key: impl Into<String>) -> Self {
        Self {
            supabase_url: supabase_url.into().trim_end_matches('/').to_owned(),
            anon_key: anon_key.into(),
            bucket: DEFAULT_BUCKET.to_owned(),
            max_upload_mb: DEFAULT_MAX_UPLOAD_MB,
            signed_url_ttl_secs: DEFAULT_SIGNED_URL_TTL_SECS,
            url_mode: UrlMode::Signed,
            pv_log_table: None,
        }
    }

    /// Read the configuration from the environment.
    ///
    /// `SUPABASE_URL` and `SUPABASE_ANON_KEY` are required; the rest fall back to defaults.
    pub fn from_env() -> Result<Self, CoreError> {
        let mut config = Self::new(env_required("SUPABASE_URL")?, env_required("SUPABASE_ANON_KEY")?);
        if let Some(bucket) = env_optional("CHANTIER_BUCKET") {
            config.bucket = bucket;
        }
        config.max_upload_mb = env_parse_with_default("CHANTIER_MAX_UPLOAD_MB", DEFAULT_MAX_UPLOAD_MB);
        config.signed_url_ttl_secs =
            env_parse_with_default("CHANTIER_SIGNED_URL_TTL_SECS", DEFAULT_SIGNED_URL_TTL_SECS);
        if let Some(mode) = env_optional("CHANTIER_URL_MODE") {
            config.url_mode = mode.parse()?;
        }
        if env_parse_with_default("CHANTIER_LOG_UPLOADS", false) {
            config.pv_log_table = Some(
                env_optional("CHANTIER_PV_LOG_TABLE").unwrap_or_else(|| DEFAULT_PV_LOG_TABLE.to_owned()),
            );
        }
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), CoreError> {
        if !self.supabase_url.starts_with("http://") && !self.supabase_url.starts_with("https://") {
            return Err(CoreError::InvalidConfig {
                field: "SUPABASE_URL",
                reason: format!("'{}' is not an http(s) URL", self.supabase_url),
            });
        }
        if self.max_upload_mb == 0 {
            return Err(CoreError::InvalidConfig {
                field: "CHANTIER_MAX_UPLOAD_MB",
                reason: "must be greater than zero".to_owned(),
            });
        }
        if self.signed_url_ttl_secs == 0 {
            return Err(CoreError::InvalidConfig {
                field: "CHANTIER_SIGNED_URL_TTL_SECS",
                reason: "must be greater than zero".to_owned(),
            });
        }
        Ok(())
    }

    /// Upload ceiling in bytes.
    #[must_use]
    pub const fn max_upload_bytes(&self) -> u64 {
        self.max_upload_mb.saturating_mul(1024 * 1024)
    }

    /// Host part of the Supabase URL, for display in the network banner.
    #[must_use]
    pub fn host(&self) -> &str {
        self.supabase_url.split("//").last().unwrap_or(&self.supabase_url)
    }
}

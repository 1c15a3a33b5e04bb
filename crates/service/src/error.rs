//! Typed error enum for the service layer.

use chantier_core::CoreError;
use chantier_supabase::SupabaseError;
use thiserror::Error;

/// Service-layer error unifying validation and backend failures.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Call to Supabase failed (network, status, parse).
    #[error("{0}")]
    Supabase(#[from] SupabaseError),

    /// Caller provided invalid input (bad percentage, missing project).
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Configuration prevents the operation.
    #[error("not configured: {0}")]
    NotConfigured(String),
}

impl ServiceError {
    /// Whether this error is likely transient (worth retrying).
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Supabase(e) if e.is_transient())
    }

    /// Whether the session's token was rejected.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Supabase(e) if e.is_unauthorized())
    }
}

impl From<CoreError> for ServiceError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::InvalidInput(msg) => Self::InvalidInput(msg),
            other => Self::NotConfigured(other.to_string()),
        }
    }
}

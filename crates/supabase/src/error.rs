//! Typed error enum for the Supabase client.

use thiserror::Error;

/// Errors from Supabase API calls.
#[derive(Debug, Error)]
pub enum SupabaseError {
    #[error("HTTP request failed: {0}")]
    HttpRequest(#[from] reqwest::Error),
    #[error("HTTP status {code}: {message}")]
    HttpStatus { code: u16, message: String },
    #[error("JSON parse error in {context}: {source}")]
    JsonParse {
        context: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("insert into {0} returned no row")]
    EmptyInsert(String),
    #[error("invalid URL: {0}")]
    InvalidUrl(String),
    #[error("client initialization failed: {0}")]
    ClientInit(String),
    #[error("all retries exhausted, last error: {0}")]
    RetriesExhausted(Box<SupabaseError>),
}

impl SupabaseError {
    /// Whether this error is transient and the request may be replayed.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            Self::HttpRequest(_) => true,
            Self::HttpStatus { code, .. } => matches!(code, 429 | 500 | 502 | 503 | 504),
            _ => false,
        }
    }

    /// Whether the access token was rejected (expired or revoked).
    #[must_use]
    pub fn is_unauthorized(&self) -> bool {
        match self {
            Self::HttpStatus { code: 401 | 403, .. } => true,
            Self::HttpStatus { code: 400, message } => message.to_ascii_lowercase().contains("jwt"),
            Self::RetriesExhausted(inner) => inner.is_unauthorized(),
            _ => false,
        }
    }
}

/// Pull a human-readable message out of an error body.
///
/// Auth, PostgREST and storage each use their own field; fall back to the raw body.
#[must_use]
pub fn extract_error_message(body: &str) -> String {
    let trimmed = body.trim();
    if let Ok(serde_json::Value::Object(map)) = serde_json::from_str::<serde_json::Value>(trimmed) {
        for key in ["error_description", "msg", "message", "error"] {
            if let Some(serde_json::Value::String(msg)) = map.get(key) {
                if !msg.is_empty() {
                    return msg.clone();
                }
            }
        }
    }
    if trimmed.is_empty() { "empty response body".to_owned() } else { trimmed.to_owned() }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_error_message_variants() {
        assert_eq!(
            extract_error_message(r#"{"error":"invalid_grant","error_description":"Invalid login credentials"}"#),
            "Invalid login credentials"
        );
        assert_eq!(extract_error_message(r#"{"code":400,"msg":"User already registered"}"#), "User already registered");
        assert_eq!(
            extract_error_message(r#"{"code":"42501","message":"new row violates row-level security policy"}"#),
            "new row violates row-level security policy"
        );
        assert_eq!(
            extract_error_message(r#"{"statusCode":"409","error":"Duplicate","message":"The resource already exists"}"#),
            "The resource already exists"
        );
        assert_eq!(extract_error_message("Bad Gateway"), "Bad Gateway");
        assert_eq!(extract_error_message(""), "empty response body");
    }

    #[test]
    fn test_is_transient() {
        assert!(SupabaseError::HttpStatus { code: 503, message: String::new() }.is_transient());
        assert!(!SupabaseError::HttpStatus { code: 400, message: String::new() }.is_transient());
        assert!(!SupabaseError::EmptyInsert("t".to_owned()).is_transient());
    }

    #[test]
    fn test_is_unauthorized() {
        assert!(SupabaseError::HttpStatus { code: 401, message: String::new() }.is_unauthorized());
        assert!(SupabaseError::HttpStatus { code: 400, message: "jwt expired".to_owned() }.is_unauthorized());
        assert!(!SupabaseError::HttpStatus { code: 400, message: "bad".to_owned() }.is_unauthorized());
    }
}

//! Service layer for the chantier tracker
//!
//! Centralizes the form operations between the HTTP handlers and the Supabase client.

#![allow(clippy::missing_errors_doc, reason = "Errors are self-explanatory from Result types")]
#![allow(clippy::implicit_return, reason = "Implicit return is idiomatic Rust")]
#![allow(clippy::question_mark_used, reason = "? operator is idiomatic Rust")]

mod auth_service;
mod document_service;
mod error;
mod project_service;
mod update_service;

#[cfg(test)]
mod test_support;

pub use auth_service::AuthService;
pub use document_service::{DocumentService, DocumentSettings};
pub use error::ServiceError;
pub use project_service::ProjectService;
pub use update_service::UpdateService;

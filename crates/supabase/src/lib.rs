//! Supabase client for the chantier tracker
//!
//! Thin typed wrappers over the hosted auth (`/auth/v1`), table (`/rest/v1`) and
//! object storage (`/storage/v1`) endpoints.

pub mod auth;
pub mod client;
pub mod error;
pub mod rest;
pub mod storage;
pub mod wire;

#[cfg(test)]
mod retry_tests;

pub use auth::SignUpOutcome;
pub use client::SupabaseClient;
pub use error::SupabaseError;
pub use wire::{HealthStatus, SignedUrl, StorageObject};

//! Core types for the chantier tracker
//!
//! Domain types, validation helpers and configuration shared by every other crate.

mod auth;
mod banner;
mod config;
pub mod constants;
mod document;
pub mod env_config;
mod error;
mod project;

pub use auth::*;
pub use banner::*;
pub use config::*;
pub use constants::*;
pub use document::*;
pub use error::*;
pub use project::*;

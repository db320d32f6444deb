//! # Hearth Shared Library
//!
//! This crate contains the record types shared by the Hearth web application,
//! its API surface and its background task worker.
//!
//! ## Module Organization
//!
//! - `models`: Users, accounts, memberships, invites, notes, blog posts,
//!   guestbook entries, counters and QStash task records
//! - `envelope`: Success/data/error response envelopes
//! - `auth`: Contract for authentication providers
//! - `config`: Model-level configuration (invite expiry, retry limits)
//! - `error`: Common error types
//! - `telemetry`: Tracing subscriber setup

pub mod auth;
pub mod config;
pub mod envelope;
pub mod error;
pub mod models;
pub mod telemetry;

pub use error::{ModelError, ModelResult};

/// Current version of the Hearth shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Mints a new opaque record identifier (UUID v4, hyphenated)
pub fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

//! Albumwire - a command-line client for an artist and album catalog.
//!
//! This crate provides authenticated access to the catalog HTTP API with
//! transparent credential refresh, and a live STOMP notification channel
//! that streams album changes with automatic reconnection.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

/// Application layer containing session services, use cases and DTOs.
pub mod application;
/// Domain layer containing entities, errors, and port definitions.
pub mod domain;
/// Infrastructure layer containing adapters for external services.
pub mod infrastructure;
/// Presentation layer containing the CLI dispatcher and console output.
pub mod presentation;

/// Current version of the application.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name.
pub const NAME: &str = "albumwire";

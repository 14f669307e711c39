//! Application layer with session services, use cases and DTOs.

/// Data transfer objects.
pub mod dto;
/// Session and notification services.
pub mod services;
/// Use case implementations.
pub mod use_cases;

pub use dto::{AuthResponse, SessionSource};
pub use services::{NotificationBuffer, SessionManager, TokenStore};
pub use use_cases::{LoginUseCase, RestoreSessionUseCase};

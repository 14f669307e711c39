//! Presentation layer with the command dispatcher and console output.

/// Command dispatcher.
pub mod app;
/// Plain-text rendering.
pub mod console;
/// Live notification loop.
pub mod watch;

pub use app::App;
pub use watch::{StopReason, WatchOutcome, Watcher};

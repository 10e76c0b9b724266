//! Plain data types shared across the host and its features.
//!
//! # Core Concepts
//!
//! - [`LifecycleState`]: Where the application is in the fixed feature lifecycle
//!   (initialize → start → run → exit-request → shutdown).
//! - [`LaunchOutcome`]: Whether a launch reached steady state or was cancelled by a feature.
//! - [`ExitRequest`]: Message a view-model sends to ask the running app to close.
//! - [`DiagnosticsReport`]: Read-only snapshot of loaded features, active views and
//!   localization coverage.
//! - [`ProjectItem`]: A project workspace navigable through the view selector.

mod diagnostics;
mod lifecycle;
mod project;

pub use diagnostics::*;
pub use lifecycle::*;
pub use project::*;

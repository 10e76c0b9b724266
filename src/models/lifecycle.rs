use std::fmt;

use serde::{Deserialize, Serialize};

/// The lifecycle state of the application host.
///
/// States are entered in strict order, each once per run:
/// Created → Loaded → Initialized → Starting → Running → ExitRequested →
/// ShuttingDown → Terminated.
///
/// The only backwards edge is ExitRequested → Running, taken when a feature
/// vetoes a close request. A cancelled Starting phase jumps straight to
/// ShuttingDown.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleState {
    Created,
    Loaded,
    Initialized,
    Starting,
    Running,
    ExitRequested,
    ShuttingDown,
    Terminated,
}

impl LifecycleState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Loaded => "loaded",
            Self::Initialized => "initialized",
            Self::Starting => "starting",
            Self::Running => "running",
            Self::ExitRequested => "exit_requested",
            Self::ShuttingDown => "shutting_down",
            Self::Terminated => "terminated",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "created" => Some(Self::Created),
            "loaded" => Some(Self::Loaded),
            "initialized" => Some(Self::Initialized),
            "starting" => Some(Self::Starting),
            "running" => Some(Self::Running),
            "exit_requested" => Some(Self::ExitRequested),
            "shutting_down" => Some(Self::ShuttingDown),
            "terminated" => Some(Self::Terminated),
            _ => None,
        }
    }

    /// Whether the shutdown phase has begun (or already finished).
    pub fn is_exiting(&self) -> bool {
        matches!(self, Self::ShuttingDown | Self::Terminated)
    }
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a launch ended up.
///
/// - `Running`: every feature started; the app is in steady state
/// - `StartupCancelled`: a feature cancelled the Starting phase, shutdown has
///   already run and the caller should exit the process
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum LaunchOutcome {
    Running,
    StartupCancelled,
}

/// Messenger message asking the running app to close, subject to the usual veto.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExitRequest;

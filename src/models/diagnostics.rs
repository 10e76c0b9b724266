use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::lifecycle::LifecycleState;

/// Snapshot of the host internals, for status bars and `fshell diagnostics`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiagnosticsReport {
    pub state: LifecycleState,
    pub created_at: DateTime<Utc>,
    /// Loaded feature names, in load order.
    pub features: Vec<String>,
    /// Every published view, with the number of its currently active instances.
    pub published_views: Vec<ViewUsage>,
    pub localizations: Vec<LocalizationCoverage>,
}

/// A published view name and how many of its views are attached right now.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ViewUsage {
    pub view_name: String,
    pub active_count: usize,
}

/// Number of localized strings declared for a language across all features.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LocalizationCoverage {
    pub language: String,
    pub string_count: usize,
}

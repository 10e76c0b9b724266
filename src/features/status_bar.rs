use std::any::Any;
use std::sync::Arc;

use async_trait::async_trait;

use crate::app::Feature;
use crate::host::{Dependency, DependencySlot, Host, LocalizedResources};
use crate::models::DiagnosticsReport;
use crate::views::{PublishedView, ViewModel};

#[derive(Default)]
pub struct StatusBarFeature;

impl StatusBarFeature {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Feature for StatusBarFeature {
    fn name(&self) -> &'static str {
        "StatusBar"
    }

    fn published_views(self: Arc<Self>) -> Vec<PublishedView> {
        vec![PublishedView::new("IDE.StatusBar", "StatusBarView", |_| {
            let view_model: Arc<dyn ViewModel> = Arc::new(StatusBarViewModel::default());
            Ok(Some(view_model))
        })
        .with_description("The status bar.")]
    }

    fn localized_resources(&self) -> Vec<LocalizedResources> {
        vec![
            LocalizedResources::new("en-us").with("StatusBar.Ready", "Ready"),
            LocalizedResources::new("fi-fi").with("StatusBar.Ready", "Valmis"),
        ]
    }
}

/// Shows a one-line summary of the host diagnostics.
#[derive(Default)]
pub struct StatusBarViewModel {
    host: Dependency<Host>,
}

impl StatusBarViewModel {
    pub fn diagnostics(&self) -> Option<DiagnosticsReport> {
        self.host.get().map(|host| host.diagnostics())
    }

    pub fn summary(&self) -> Option<String> {
        let report = self.diagnostics()?;
        let active: usize = report.published_views.iter().map(|v| v.active_count).sum();
        Some(format!(
            "{} features, {} active views, {}",
            report.features.len(),
            active,
            report.state
        ))
    }
}

impl ViewModel for StatusBarViewModel {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn dependencies(&self) -> Vec<&dyn DependencySlot> {
        vec![&self.host as &dyn DependencySlot]
    }
}

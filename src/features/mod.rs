//! The features that make up the stock application.
//!
//! Load order matters: it decides which feature wins when several provide
//! the same capability, and the order of the sequential Starting phase.

pub mod app_settings;
pub mod home_screen;
pub mod menu;
pub mod project;
pub mod shell;
pub mod status_bar;
pub mod view_selector;

use std::sync::Arc;

use crate::app::Feature;

pub use app_settings::{AppSettings, AppSettingsFeature};
pub use home_screen::HomeScreenFeature;
pub use menu::MenuFeature;
pub use project::{ProjectFactory, ProjectFeature};
pub use shell::{Shell, ShellFeature, Theme};
pub use status_bar::StatusBarFeature;
pub use view_selector::{NavItem, ViewSelector, ViewSelectorFeature};

/// The built-in features, in load order.
pub fn builtin() -> Vec<Arc<dyn Feature>> {
    vec![
        Arc::new(ShellFeature::new()) as Arc<dyn Feature>,
        Arc::new(MenuFeature::new()),
        Arc::new(ViewSelectorFeature::new()),
        Arc::new(StatusBarFeature::new()),
        Arc::new(HomeScreenFeature::new()),
        Arc::new(AppSettingsFeature::new()),
        Arc::new(ProjectFeature::new()),
    ]
}

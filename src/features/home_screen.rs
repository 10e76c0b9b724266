use std::any::Any;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::app::Feature;
use crate::config::DEFAULT_CULTURE;
use crate::features::shell::{Shell, Theme};
use crate::features::view_selector::ViewSelector;
use crate::host::{Dependency, DependencySlot, Host, LocalizedResources};
use crate::models::ProjectItem;
use crate::views::{PublishedView, ViewModel};

#[derive(Default)]
pub struct HomeScreenFeature;

impl HomeScreenFeature {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Feature for HomeScreenFeature {
    fn name(&self) -> &'static str {
        "HomeScreen"
    }

    fn published_views(self: Arc<Self>) -> Vec<PublishedView> {
        vec![PublishedView::new("IDE.HomeScreen", "HomeScreenView", |_| {
            let view_model: Arc<dyn ViewModel> = Arc::new(HomeScreenViewModel::default());
            Ok(Some(view_model))
        })
        .with_description("The Home screen.")]
    }

    fn localized_resources(&self) -> Vec<LocalizedResources> {
        vec![
            LocalizedResources::new("en-us")
                .with("HomeScreen.Welcome", "Welcome")
                .with("HomeScreen.Language", "Language")
                .with("HomeScreen.Theme", "Theme")
                .with("HomeScreen.RecentProjects", "Recent projects"),
            LocalizedResources::new("fi-fi")
                .with("HomeScreen.Welcome", "Tervetuloa")
                .with("HomeScreen.Language", "Kieli")
                .with("HomeScreen.Theme", "Teema")
                .with("HomeScreen.RecentProjects", "Viimeisimmät projektit"),
        ]
    }
}

/// A language the user can switch to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LanguageOption {
    pub identifier: String,
    pub localized_name: String,
}

impl LanguageOption {
    fn new(identifier: &str, localized_name: &str) -> Self {
        Self {
            identifier: identifier.to_string(),
            localized_name: localized_name.to_string(),
        }
    }
}

#[derive(Default)]
pub struct HomeScreenViewModel {
    shell: Dependency<dyn Shell>,
    selector: Dependency<dyn ViewSelector>,
    languages: RwLock<Vec<LanguageOption>>,
    selected_language: RwLock<Option<String>>,
}

impl HomeScreenViewModel {
    pub fn languages(&self) -> Vec<LanguageOption> {
        self.languages.read().clone()
    }

    pub fn selected_language(&self) -> Option<String> {
        self.selected_language.read().clone()
    }

    /// Switches the UI language. Ignored for unknown identifiers or without a shell.
    pub fn select_language(&self, identifier: &str) -> bool {
        let Some(shell) = self.shell.get() else {
            return false;
        };
        if !self.languages.read().iter().any(|l| l.identifier == identifier) {
            tracing::warn!("Unknown language '{}'", identifier);
            return false;
        }

        *self.selected_language.write() = Some(identifier.to_string());
        shell.set_language(identifier);
        true
    }

    pub fn change_theme(&self, theme: Theme) {
        if let Some(shell) = self.shell.get() {
            shell.set_theme(theme);
        }
    }

    pub fn change_accent(&self, accent: &str) {
        if let Some(shell) = self.shell.get() {
            shell.set_accent_color(accent);
        }
    }

    pub fn recent_projects(&self) -> Vec<Arc<ProjectItem>> {
        self.selector
            .get()
            .map(|selector| selector.projects())
            .unwrap_or_default()
    }
}

impl ViewModel for HomeScreenViewModel {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn dependencies(&self) -> Vec<&dyn DependencySlot> {
        vec![&self.shell as &dyn DependencySlot, &self.selector]
    }

    fn initialize(&self, _host: &Host) -> anyhow::Result<()> {
        let Some(shell) = self.shell.get() else {
            tracing::error!(
                "HomeScreenViewModel: required dependency Shell could not be resolved"
            );
            return Ok(());
        };

        let languages = vec![
            LanguageOption::new(DEFAULT_CULTURE, "English"),
            LanguageOption::new("fi-fi", "Suomi"),
        ];
        let current = shell.language();
        *self.selected_language.write() = languages
            .iter()
            .find(|l| l.identifier == current)
            .map(|l| l.identifier.clone());
        *self.languages.write() = languages;
        Ok(())
    }
}

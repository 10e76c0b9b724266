//! The root UI: theme, accent color and language.

use std::any::Any;
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};

use crate::app::Feature;
use crate::config::{normalize_language, DEFAULT_CULTURE};
use crate::host::{CapabilityRegistrar, Host, LocalizedResources, WeakHost};
use crate::views::{PublishedView, View, ViewModel};

pub const THEME_KEY: &str = "APP.Theme";
pub const ACCENT_COLOR_KEY: &str = "APP.AccentColor";
pub const LANGUAGE_KEY: &str = "APP.Language";

/// Accent color used until the user picks one.
pub const DEFAULT_ACCENT_COLOR: &str = "#FF0078D7";
const TRANSPARENT: &str = "#00000000";

/// Published views the shell lays out around its content area.
pub const SHELL_REGIONS: [&str; 3] = ["IDE.MainMenu", "IDE.ViewSelector", "IDE.StatusBar"];

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Light => "Light",
            Self::Dark => "Dark",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "Light" => Some(Self::Light),
            "Dark" => Some(Self::Dark),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThemeChanged {
    pub from: Theme,
    pub to: Theme,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccentColorChanged {
    pub from: String,
    pub to: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LanguageChanged {
    pub from: String,
    pub to: String,
}

/// Controls the shell. Every setter persists the new value.
pub trait Shell: Send + Sync {
    fn theme(&self) -> Theme;

    fn set_theme(&self, theme: Theme);

    /// `#AARRGGBB`.
    fn accent_color(&self) -> String;

    /// Accepts `#RRGGBB` or `#AARRGGBB`; anything else becomes transparent.
    fn set_accent_color(&self, color: &str);

    fn language(&self) -> String;

    fn set_language(&self, language: &str);
}

struct Appearance {
    theme: Theme,
    accent_color: String,
    language: String,
}

pub struct ShellFeature {
    appearance: RwLock<Appearance>,
    host: RwLock<WeakHost>,
}

impl Default for ShellFeature {
    fn default() -> Self {
        Self {
            appearance: RwLock::new(Appearance {
                theme: Theme::Light,
                accent_color: DEFAULT_ACCENT_COLOR.to_string(),
                language: DEFAULT_CULTURE.to_string(),
            }),
            host: RwLock::new(WeakHost::default()),
        }
    }
}

impl ShellFeature {
    pub fn new() -> Self {
        Self::default()
    }

    fn host(&self) -> Option<Host> {
        self.host.read().upgrade()
    }

    fn persist(&self, key: &str, value: &str) {
        let Some(host) = self.host() else {
            return;
        };
        if let Err(e) = host.set_value(key, value) {
            tracing::warn!("Could not store {}: {}", key, e);
        }
    }

    fn publish<M: Any + Send + Sync>(&self, message: M) {
        if let Some(host) = self.host() {
            host.messenger().send(&message);
        }
    }
}

impl Shell for ShellFeature {
    fn theme(&self) -> Theme {
        self.appearance.read().theme
    }

    fn set_theme(&self, theme: Theme) {
        let previous = std::mem::replace(&mut self.appearance.write().theme, theme);
        if previous != theme {
            self.publish(ThemeChanged {
                from: previous,
                to: theme,
            });
        }
        self.persist(THEME_KEY, theme.as_str());
    }

    fn accent_color(&self) -> String {
        self.appearance.read().accent_color.clone()
    }

    fn set_accent_color(&self, color: &str) {
        let color = parse_accent_color(color).unwrap_or_else(|| {
            tracing::warn!("Invalid accent color '{}'", color);
            TRANSPARENT.to_string()
        });

        let previous =
            std::mem::replace(&mut self.appearance.write().accent_color, color.clone());
        if previous != color {
            self.publish(AccentColorChanged {
                from: previous,
                to: color.clone(),
            });
        }
        self.persist(ACCENT_COLOR_KEY, &color);
    }

    fn language(&self) -> String {
        self.appearance.read().language.clone()
    }

    fn set_language(&self, language: &str) {
        let language = normalize_language(language);
        let previous =
            std::mem::replace(&mut self.appearance.write().language, language.clone());
        if previous != language {
            if let Some(host) = self.host() {
                host.set_language(&language);
            }
            self.publish(LanguageChanged {
                from: previous,
                to: language.clone(),
            });
        }
        self.persist(LANGUAGE_KEY, &language);
    }
}

#[async_trait]
impl Feature for ShellFeature {
    fn name(&self) -> &'static str {
        "Shell"
    }

    fn provide(self: Arc<Self>, registrar: &mut CapabilityRegistrar<'_>) {
        registrar.provide::<dyn Shell>(self);
    }

    fn published_views(self: Arc<Self>) -> Vec<PublishedView> {
        vec![PublishedView::new("IDE.Shell", "ShellView", move |_| {
            let view_model: Arc<dyn ViewModel> = Arc::new(ShellViewModel::new(self.clone()));
            Ok(Some(view_model))
        })
        .with_description("The root UI.")]
    }

    fn localized_resources(&self) -> Vec<LocalizedResources> {
        vec![
            LocalizedResources::new("en-us")
                .with("Yes", "Yes")
                .with("No", "No")
                .with("Cancel", "Cancel")
                .with("Open", "Open")
                .with("Shell.Title", "Feature Shell"),
            LocalizedResources::new("fi-fi")
                .with("Yes", "Kyllä")
                .with("No", "Ei")
                .with("Cancel", "Peruuta")
                .with("Open", "Avaa")
                .with("Shell.Title", "Feature Shell"),
        ]
    }

    async fn initialize(&self, host: &Host) -> Result<()> {
        *self.host.write() = host.downgrade();

        let theme: String = host.get_value(THEME_KEY, Theme::Light.as_str().to_string())?;
        self.set_theme(Theme::from_str(&theme).unwrap_or_default());

        let accent: Option<String> = host.get_value(ACCENT_COLOR_KEY, None)?;
        self.set_accent_color(accent.as_deref().unwrap_or(DEFAULT_ACCENT_COLOR));

        let language: String = host.get_value(LANGUAGE_KEY, host.language())?;
        self.set_language(&language);

        Ok(())
    }
}

/// Upper-cased `#AARRGGBB`, or `None` when `color` is not a hex color.
fn parse_accent_color(color: &str) -> Option<String> {
    let hex = color.trim().strip_prefix('#')?;
    if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    match hex.len() {
        6 => Some(format!("#FF{}", hex.to_ascii_uppercase())),
        8 => Some(format!("#{}", hex.to_ascii_uppercase())),
        _ => None,
    }
}

// ============================================================
// View model
// ============================================================

/// Hosts the navigation and status regions around the content area.
pub struct ShellViewModel {
    shell: Arc<dyn Shell>,
    regions: Mutex<Vec<View>>,
}

impl ShellViewModel {
    pub fn new(shell: Arc<dyn Shell>) -> Self {
        Self {
            shell,
            regions: Mutex::new(Vec::new()),
        }
    }

    pub fn theme(&self) -> Theme {
        self.shell.theme()
    }

    pub fn accent_color(&self) -> String {
        self.shell.accent_color()
    }

    /// Names of the regions that were created.
    pub fn regions(&self) -> Vec<String> {
        self.regions
            .lock()
            .iter()
            .map(|view| view.name().to_string())
            .collect()
    }
}

impl ViewModel for ShellViewModel {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn initialize(&self, host: &Host) -> Result<()> {
        let mut regions = self.regions.lock();
        for name in SHELL_REGIONS {
            match host.create_view(name, None) {
                Some(view) => regions.push(view),
                None => tracing::warn!("Shell region '{}' is not available", name),
            }
        }
        Ok(())
    }

    fn activate(&self) {
        for view in self.regions.lock().iter() {
            view.attach();
        }
    }

    fn deactivate(&self) {
        for view in self.regions.lock().iter() {
            view.detach();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_accent_color() {
        assert_eq!(parse_accent_color("#0078d7").as_deref(), Some("#FF0078D7"));
        assert_eq!(parse_accent_color("#800078D7").as_deref(), Some("#800078D7"));
        assert_eq!(parse_accent_color("0078D7"), None);
        assert_eq!(parse_accent_color("#GG0000"), None);
    }
}

//! User-configurable settings: the category/setting tree and the feature that owns it.
//!
//! Features register their settings during the Starting phase through the
//! [`AppSettings`] capability. Each setting picks up its persisted value as it
//! is registered, and every value is written back to the settings store on
//! shutdown.

mod category;
mod setting;

use std::any::Any;
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;

pub use category::{Category, SettingsTree};
pub use setting::{
    BooleanSetting, ErasedSetting, IntegerSetting, SetOutcome, Setting, SettingKind, SettingValue,
    StringSetting, Validator,
};

use crate::app::Feature;
use crate::error::ShellError;
use crate::host::{
    CapabilityRegistrar, Dependency, DependencySlot, Host, LocalizedResources, Messenger,
};
use crate::store::SettingsStore;
use crate::views::{PublishedView, ViewModel};

pub struct CommonCategories;

impl CommonCategories {
    pub const GENERAL: &'static str = "Category.General";
    pub const APPEARANCE: &'static str = "Category.Appearance";
    pub const PROJECTS: &'static str = "Category.Projects";
}

/// Published on the host messenger whenever a registered setting changes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettingValueChanged {
    pub key: String,
    pub value: SettingValue,
}

/// The settings registry capability.
pub trait AppSettings: Send + Sync {
    /// Root categories.
    fn categories(&self) -> Vec<Arc<Category>>;

    fn register_category(
        &self,
        key: &str,
        parent: Option<&Arc<Category>>,
    ) -> Result<Arc<Category>, ShellError>;

    fn register_integer_setting(
        &self,
        key: &str,
        category_path: &[&str],
        default: i32,
        validate: Option<Validator<i32>>,
    ) -> Result<Arc<IntegerSetting>, ShellError>;

    fn register_boolean_setting(
        &self,
        key: &str,
        category_path: &[&str],
        default: bool,
        validate: Option<Validator<bool>>,
    ) -> Result<Arc<BooleanSetting>, ShellError>;

    fn register_string_setting(
        &self,
        key: &str,
        category_path: &[&str],
        default: &str,
        validate: Option<Validator<String>>,
    ) -> Result<Arc<StringSetting>, ShellError>;

    fn find_setting(&self, key: &str) -> Option<Arc<dyn ErasedSetting>>;

    /// Assigns every setting its default value.
    fn reset_all(&self);
}

#[derive(Default)]
pub struct AppSettingsFeature {
    tree: SettingsTree,
    store: Dependency<SettingsStore>,
    messenger: Dependency<Messenger>,
}

impl AppSettingsFeature {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tree(&self) -> &SettingsTree {
        &self.tree
    }

    fn register<T: SettingKind>(
        &self,
        key: &str,
        category_path: &[&str],
        default: T,
        validate: Option<Validator<T>>,
    ) -> Result<Arc<Setting<T>>, ShellError> {
        let setting = self
            .tree
            .register_setting(key, category_path, default, validate)?;

        if let Some(persisted) = self.store.get().and_then(|store| store.get_raw(key)) {
            setting.import(&persisted);
        }

        if let Some(messenger) = self.messenger.get() {
            let key = key.to_string();
            setting.on_changed(move |value: &T| {
                messenger.send(&SettingValueChanged {
                    key: key.clone(),
                    value: value.clone().into_value(),
                });
            });
        }

        Ok(setting)
    }

    /// Writes every setting into the settings store.
    pub fn export_all(&self) -> usize {
        let Some(store) = self.store.get() else {
            tracing::warn!("No settings store; settings were not exported");
            return 0;
        };

        let mut exported = 0;
        for setting in self.tree.all_settings() {
            match store.set_raw(setting.key(), setting.export()) {
                Ok(()) => exported += 1,
                Err(e) => tracing::warn!("Could not export setting '{}': {}", setting.key(), e),
            }
        }
        exported
    }
}

impl AppSettings for AppSettingsFeature {
    fn categories(&self) -> Vec<Arc<Category>> {
        self.tree.categories()
    }

    fn register_category(
        &self,
        key: &str,
        parent: Option<&Arc<Category>>,
    ) -> Result<Arc<Category>, ShellError> {
        self.tree.register_category(key, parent)
    }

    fn register_integer_setting(
        &self,
        key: &str,
        category_path: &[&str],
        default: i32,
        validate: Option<Validator<i32>>,
    ) -> Result<Arc<IntegerSetting>, ShellError> {
        self.register(key, category_path, default, validate)
    }

    fn register_boolean_setting(
        &self,
        key: &str,
        category_path: &[&str],
        default: bool,
        validate: Option<Validator<bool>>,
    ) -> Result<Arc<BooleanSetting>, ShellError> {
        self.register(key, category_path, default, validate)
    }

    fn register_string_setting(
        &self,
        key: &str,
        category_path: &[&str],
        default: &str,
        validate: Option<Validator<String>>,
    ) -> Result<Arc<StringSetting>, ShellError> {
        self.register(key, category_path, default.to_string(), validate)
    }

    fn find_setting(&self, key: &str) -> Option<Arc<dyn ErasedSetting>> {
        self.tree.find_setting(key)
    }

    fn reset_all(&self) {
        let changed = self.tree.reset_all();
        tracing::info!("Reset all settings ({} changed)", changed);
    }
}

#[async_trait]
impl Feature for AppSettingsFeature {
    fn name(&self) -> &'static str {
        "AppSettings"
    }

    fn provide(self: Arc<Self>, registrar: &mut CapabilityRegistrar<'_>) {
        registrar.provide::<dyn AppSettings>(self);
    }

    fn published_views(self: Arc<Self>) -> Vec<PublishedView> {
        vec![PublishedView::new("IDE.AppSettings", "AppSettingsView", move |_| {
            let view_model: Arc<dyn ViewModel> = Arc::new(AppSettingsViewModel {
                settings: self.clone(),
            });
            Ok(Some(view_model))
        })
        .with_description("The App Settings view.")]
    }

    fn localized_resources(&self) -> Vec<LocalizedResources> {
        vec![
            LocalizedResources::new("en-us")
                .with("AppSettings.Title", "Settings")
                .with("AppSettings.ResetAll", "Reset all")
                .with(CommonCategories::GENERAL, "General")
                .with(CommonCategories::APPEARANCE, "Appearance")
                .with(CommonCategories::PROJECTS, "Projects"),
            LocalizedResources::new("fi-fi")
                .with("AppSettings.Title", "Asetukset")
                .with("AppSettings.ResetAll", "Palauta oletukset")
                .with(CommonCategories::GENERAL, "Yleiset")
                .with(CommonCategories::APPEARANCE, "Ulkoasu")
                .with(CommonCategories::PROJECTS, "Projektit"),
        ]
    }

    fn dependencies(&self) -> Vec<&dyn DependencySlot> {
        vec![&self.store as &dyn DependencySlot, &self.messenger]
    }

    async fn initialize(&self, _host: &Host) -> Result<()> {
        for key in [
            CommonCategories::GENERAL,
            CommonCategories::APPEARANCE,
            CommonCategories::PROJECTS,
        ] {
            self.tree.register_category(key, None)?;
        }
        Ok(())
    }

    async fn shutdown(&self, _host: &Host) -> Result<()> {
        let exported = self.export_all();
        tracing::debug!("Exported {} settings", exported);
        Ok(())
    }
}

// ============================================================
// View model
// ============================================================

/// One row of the settings outline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutlineEntry {
    Category { key: String, level: usize },
    Setting { key: String, level: usize, value: SettingValue, error: bool },
}

pub struct AppSettingsViewModel {
    settings: Arc<dyn AppSettings>,
}

impl AppSettingsViewModel {
    /// The tree flattened depth first, each category followed by its settings
    /// and then its subcategories.
    pub fn outline(&self) -> Vec<OutlineEntry> {
        fn walk(category: &Arc<Category>, level: usize, out: &mut Vec<OutlineEntry>) {
            out.push(OutlineEntry::Category {
                key: category.key().to_string(),
                level,
            });
            for setting in category.settings() {
                out.push(OutlineEntry::Setting {
                    key: setting.key().to_string(),
                    level: level + 1,
                    value: setting.value(),
                    error: setting.has_error(),
                });
            }
            for child in category.categories() {
                walk(&child, level + 1, out);
            }
        }

        let mut out = Vec::new();
        for root in self.settings.categories() {
            walk(&root, 0, &mut out);
        }
        out
    }

    pub fn set(&self, key: &str, value: SettingValue) -> Option<SetOutcome> {
        let Some(setting) = self.settings.find_setting(key) else {
            tracing::warn!("Setting '{}' not found", key);
            return None;
        };
        Some(setting.set_value(value))
    }

    pub fn reset_all(&self) {
        self.settings.reset_all();
    }
}

impl ViewModel for AppSettingsViewModel {
    fn as_any(&self) -> &dyn Any {
        self
    }
}

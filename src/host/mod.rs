//! The host context handed to every feature and view-model.
//!
//! # Core Concepts
//!
//! - [`ServiceDirectory`]: one instance per capability type, with owner-checked removal.
//! - [`CapabilityBindings`]: the declared capability → feature table built at load.
//! - [`Dependency`]: a slot the resolver fills from the host and the bindings.
//! - [`Messenger`]: typed publish/subscribe with RAII subscriptions.
//! - [`Localizer`]: per-feature localized strings with a coalesced app-wide table.
//!
//! [`Host`] is a cheap, cloneable handle; all clones share the same state.

mod localization;
mod messenger;
mod resolver;
mod services;

use std::any::type_name;
use std::path::PathBuf;
use std::sync::{Arc, Weak};

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::de::DeserializeOwned;
use serde::Serialize;

pub use localization::{LocalizedResources, LocalizedStrings, Localizer};
pub use messenger::{Messenger, Subscription};
pub use resolver::{resolve, Dependency, DependencySlot};
pub use services::{CapabilityBindings, CapabilityRegistrar, Owner, ServiceDirectory};

use crate::config::HostConfig;
use crate::error::ShellError;
use crate::models::{DiagnosticsReport, LifecycleState};
use crate::store::SettingsStore;
use crate::views::{PublishedViewInfo, View, ViewParameter, ViewRegistry};

/// Name the host's own capabilities are bound under.
const HOST_PROVIDER: &str = "host";

#[derive(Clone)]
pub struct Host {
    inner: Arc<HostInner>,
}

#[derive(Clone, Default)]
pub struct WeakHost {
    inner: Weak<HostInner>,
}

impl WeakHost {
    pub fn upgrade(&self) -> Option<Host> {
        self.inner.upgrade().map(|inner| Host { inner })
    }
}

struct HostInner {
    config: HostConfig,
    created_at: DateTime<Utc>,
    services: ServiceDirectory,
    settings: SettingsStore,
    messenger: Messenger,
    localizer: RwLock<Localizer>,
    features: RwLock<Vec<String>>,
    bindings: RwLock<CapabilityBindings>,
    views: RwLock<ViewRegistry>,
    state: RwLock<LifecycleState>,
}

impl Host {
    pub fn new(config: HostConfig) -> Self {
        let localizer = Localizer::new(&config.language);
        Self {
            inner: Arc::new(HostInner {
                config,
                created_at: Utc::now(),
                services: ServiceDirectory::new(),
                settings: SettingsStore::open_memory(),
                messenger: Messenger::new(),
                localizer: RwLock::new(localizer),
                features: RwLock::new(Vec::new()),
                bindings: RwLock::new(CapabilityBindings::new()),
                views: RwLock::new(ViewRegistry::new()),
                state: RwLock::new(LifecycleState::Created),
            }),
        }
    }

    /// A handle that does not keep the host alive, for features that outlive a phase call.
    pub fn downgrade(&self) -> WeakHost {
        WeakHost {
            inner: Arc::downgrade(&self.inner),
        }
    }

    pub fn config(&self) -> &HostConfig {
        &self.inner.config
    }

    pub fn settings_file(&self) -> PathBuf {
        self.inner.config.settings_file()
    }

    pub fn temp_dir(&self) -> PathBuf {
        self.inner.config.temp_dir()
    }

    pub fn projects_dir(&self) -> PathBuf {
        self.inner.config.projects_dir()
    }

    pub fn lifecycle_state(&self) -> LifecycleState {
        *self.inner.state.read()
    }

    pub(crate) fn set_state(&self, state: LifecycleState) {
        let mut current = self.inner.state.write();
        if *current != state {
            tracing::debug!("Lifecycle: {} -> {}", *current, state);
            *current = state;
        }
    }

    /// Loaded feature names, in load order.
    pub fn feature_names(&self) -> Vec<String> {
        self.inner.features.read().clone()
    }

    // ============================================================
    // Installation (called once by the app while loading features)
    // ============================================================

    pub(crate) fn install_features(
        &self,
        names: Vec<String>,
        bindings: CapabilityBindings,
        views: ViewRegistry,
    ) {
        *self.inner.features.write() = names;
        *self.inner.bindings.write() = bindings;
        *self.inner.views.write() = views;
    }

    pub(crate) fn add_localization(&self, feature: &str, resources: Vec<LocalizedResources>) {
        self.inner.localizer.write().add_feature(feature, resources);
    }

    // ============================================================
    // Service directory
    // ============================================================

    /// Registers `instance` as the provider of `T`. Returns `false` if `T`
    /// already has a provider.
    pub fn register<T>(&self, instance: Arc<T>, owner: Option<&Owner>) -> bool
    where
        T: ?Sized + Send + Sync + 'static,
    {
        self.inner.services.register(instance, owner)
    }

    pub fn unregister<T>(&self, owner: &Owner) -> bool
    where
        T: ?Sized + 'static,
    {
        self.inner.services.unregister::<T>(owner)
    }

    /// The registered provider of `T`, falling back to the capability bindings.
    ///
    /// The earliest-loaded feature that declared `T` wins. The winner is
    /// registered without an owner so later lookups hit the directory.
    pub fn get_instance<T>(&self) -> Option<Arc<T>>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        if let Some(instance) = self.inner.services.get::<T>() {
            return Some(instance);
        }

        let bindings = self.inner.bindings.read();
        let (instance, provider) = bindings.first::<T>()?;

        let providers = bindings.providers::<T>();
        if providers.len() > 1 {
            tracing::warn!(
                "{} is provided by several features ({}); using {}",
                type_name::<T>(),
                providers.join(", "),
                provider
            );
        }

        self.inner.services.register(instance.clone(), None);
        Some(instance)
    }

    pub fn services(&self) -> &ServiceDirectory {
        &self.inner.services
    }

    // ============================================================
    // Dependency resolution
    // ============================================================

    /// Fills `slots` from the host's own capabilities, then from the feature
    /// bindings in load order. Returns the number of slots filled.
    pub fn resolve_dependencies(&self, target: &str, slots: &[&dyn DependencySlot]) -> usize {
        if slots.is_empty() {
            return 0;
        }

        let own = self.own_capabilities();
        let bindings = self.inner.bindings.read();
        resolve(target, slots, &[&own, &*bindings])
    }

    fn own_capabilities(&self) -> CapabilityBindings {
        let mut own = CapabilityBindings::new();
        own.bind::<Host>(HOST_PROVIDER, Arc::new(self.clone()));
        own.bind::<Messenger>(HOST_PROVIDER, Arc::new(self.inner.messenger.clone()));
        own.bind::<SettingsStore>(HOST_PROVIDER, Arc::new(self.inner.settings.clone()));
        own
    }

    // ============================================================
    // Settings
    // ============================================================

    pub fn settings(&self) -> &SettingsStore {
        &self.inner.settings
    }

    pub fn get_value<T: DeserializeOwned>(&self, key: &str, default: T) -> Result<T, ShellError> {
        self.inner.settings.get_value(key, default)
    }

    pub fn set_value<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<(), ShellError> {
        self.inner.settings.set_value(key, value)
    }

    pub fn clear_value(&self, key: &str) -> Result<bool, ShellError> {
        self.inner.settings.clear_value(key)
    }

    pub(crate) fn load_settings(&self) {
        self.inner.settings.load_or_default(&self.settings_file());
    }

    pub(crate) fn save_settings(&self) {
        self.inner.settings.save_or_log(&self.settings_file());
    }

    // ============================================================
    // Messaging
    // ============================================================

    pub fn messenger(&self) -> &Messenger {
        &self.inner.messenger
    }

    // ============================================================
    // Localization
    // ============================================================

    pub fn language(&self) -> String {
        self.inner.localizer.read().language().to_string()
    }

    /// Switches the UI language and re-localizes every attached view.
    pub fn set_language(&self, language: &str) -> bool {
        if !self.inner.localizer.write().set_language(language) {
            return false;
        }

        tracing::info!("Language changed to {}", self.language());
        let localizer = self.inner.localizer.read();
        self.inner
            .views
            .read()
            .relocalize(|owner| localizer.feature_strings(owner));
        true
    }

    pub fn localized_text(&self, key: &str) -> Option<String> {
        self.inner.localizer.read().text(key)
    }

    /// Looks `key` up in one feature's strings, falling back to the default culture.
    pub fn feature_localized_text(&self, feature: &str, key: &str) -> Option<String> {
        self.inner.localizer.read().feature_text(feature, key)
    }

    // ============================================================
    // Published views
    // ============================================================

    /// Materializes the published view `view_name`.
    ///
    /// Returns `None` when the name is unknown, when the factory refuses the
    /// parameter, or when the factory or the view-model's initialize fails.
    /// None of these are fatal.
    pub fn create_view(&self, view_name: &str, parameter: Option<ViewParameter>) -> Option<View> {
        let info = self.published_view(view_name);
        let Some(info) = info else {
            tracing::warn!("Published view '{}' not found", view_name);
            return None;
        };

        let view_model = match info.create_view_model(parameter.as_ref()) {
            Ok(Some(view_model)) => view_model,
            Ok(None) => {
                tracing::debug!("{} declined to create view '{}'", info.owner, view_name);
                return None;
            }
            Err(e) => {
                tracing::error!("Failed to create view '{}': {:#}", view_name, e);
                return None;
            }
        };

        self.resolve_dependencies(view_name, &view_model.dependencies());
        if let Err(e) = view_model.initialize(self) {
            tracing::error!("Failed to initialize view '{}': {:#}", view_name, e);
            return None;
        }

        let strings = self.inner.localizer.read().feature_strings(&info.owner);
        Some(self.inner.views.read().instantiate(&info, view_model, strings))
    }

    pub fn published_view(&self, view_name: &str) -> Option<PublishedViewInfo> {
        self.inner.views.read().get(view_name).cloned()
    }

    pub fn published_view_names(&self) -> Vec<String> {
        self.inner.views.read().names().to_vec()
    }

    pub fn active_view_count(&self) -> usize {
        self.inner.views.read().active_count()
    }

    // ============================================================
    // Diagnostics
    // ============================================================

    pub fn diagnostics(&self) -> DiagnosticsReport {
        DiagnosticsReport {
            state: self.lifecycle_state(),
            created_at: self.inner.created_at,
            features: self.feature_names(),
            published_views: self.inner.views.read().usage(),
            localizations: self.inner.localizer.read().coverage(),
        }
    }
}

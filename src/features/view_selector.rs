//! Main navigation: the home screen, the settings view and open projects.

use std::any::Any;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::app::Feature;
use crate::features::project::ProjectFactory;
use crate::features::shell::Shell;
use crate::host::{
    CapabilityRegistrar, Dependency, DependencySlot, Host, LocalizedResources, WeakHost,
};
use crate::models::ProjectItem;
use crate::views::{PublishedView, View, ViewModel, ViewParameter};

/// An entry in the navigation list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NavItem {
    Home,
    Settings,
    Project(Uuid),
}

/// Published on the host messenger when the current item changes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewChanged {
    pub from: Option<NavItem>,
    pub to: NavItem,
}

/// What a navigation entry shows once it has been opened.
#[derive(Debug)]
pub enum NavContent {
    View(View),
    /// The published view could not be created; the message is shown instead.
    NotFound(String),
}

/// Controls the view selector.
pub trait ViewSelector: Send + Sync {
    fn projects(&self) -> Vec<Arc<ProjectItem>>;

    fn current(&self) -> Option<NavItem>;

    fn activate_home(&self);

    fn activate_settings(&self);

    fn activate_project(&self, item: &ProjectItem);

    /// Adds `item` to the project list. Returns `false` if it is already there.
    fn add_project(&self, item: Arc<ProjectItem>) -> bool;

    fn remove_project(&self, id: Uuid) -> bool;
}

struct NavEntry {
    view_name: &'static str,
    parameter: Option<ViewParameter>,
    content: Option<Arc<NavContent>>,
}

impl NavEntry {
    fn new(view_name: &'static str, parameter: Option<ViewParameter>) -> Self {
        Self {
            view_name,
            parameter,
            content: None,
        }
    }
}

#[derive(Default)]
pub struct ViewSelectorFeature {
    host: RwLock<WeakHost>,
    shell: Dependency<dyn Shell>,
    project_factory: Dependency<dyn ProjectFactory>,
    projects: RwLock<Vec<Arc<ProjectItem>>>,
    entries: Mutex<HashMap<NavItem, NavEntry>>,
    current: RwLock<Option<NavItem>>,
}

impl ViewSelectorFeature {
    pub fn new() -> Self {
        Self::default()
    }

    /// The opened content of `item`, if it has been activated before.
    pub fn content(&self, item: NavItem) -> Option<Arc<NavContent>> {
        self.entries
            .lock()
            .get(&item)
            .and_then(|entry| entry.content.clone())
    }

    fn host(&self) -> Option<Host> {
        self.host.read().upgrade()
    }

    fn activate(&self, item: NavItem) {
        let Some(host) = self.host() else {
            tracing::warn!("View selector used before initialization");
            return;
        };

        let pending = {
            let entries = self.entries.lock();
            let Some(entry) = entries.get(&item) else {
                tracing::warn!("Cannot activate view because it has been removed");
                return;
            };
            match &entry.content {
                Some(_) => None,
                None => Some((entry.view_name, entry.parameter.clone())),
            }
        };

        // Created outside the lock; factories may call back into the selector.
        if let Some((view_name, parameter)) = pending {
            let content = match host.create_view(view_name, parameter) {
                Some(view) => NavContent::View(view),
                None => NavContent::NotFound(not_found_message(&host, view_name)),
            };
            if let Some(entry) = self.entries.lock().get_mut(&item) {
                entry.content.get_or_insert_with(|| Arc::new(content));
            }
        }

        let previous = std::mem::replace(&mut *self.current.write(), Some(item));
        if previous == Some(item) {
            return;
        }

        if let Some(NavContent::View(view)) = previous.and_then(|p| self.content(p)).as_deref() {
            view.detach();
        }
        if let Some(NavContent::View(view)) = self.content(item).as_deref() {
            view.attach();
        }

        host.messenger().send(&ViewChanged {
            from: previous,
            to: item,
        });
    }

    fn open_project(&self, factory: &dyn ProjectFactory, path: &Path) -> Arc<ProjectItem> {
        let item = factory.open_project(path);
        self.add_project(item.clone());
        item
    }
}

fn not_found_message(host: &Host, view_name: &str) -> String {
    match host.feature_localized_text("ViewSelector", "ViewSelector.NotFound") {
        Some(template) => template.replace("{0}", view_name),
        None => format!("View '{}' was not found", view_name),
    }
}

impl ViewSelector for ViewSelectorFeature {
    fn projects(&self) -> Vec<Arc<ProjectItem>> {
        self.projects.read().clone()
    }

    fn current(&self) -> Option<NavItem> {
        *self.current.read()
    }

    fn activate_home(&self) {
        self.activate(NavItem::Home);
    }

    fn activate_settings(&self) {
        self.activate(NavItem::Settings);
    }

    fn activate_project(&self, item: &ProjectItem) {
        self.activate(NavItem::Project(item.id));
    }

    fn add_project(&self, item: Arc<ProjectItem>) -> bool {
        let mut projects = self.projects.write();
        if projects.iter().any(|p| p.id == item.id) {
            return false;
        }

        let parameter: ViewParameter = item.clone();
        self.entries.lock().insert(
            NavItem::Project(item.id),
            NavEntry::new(item.kind.view_name(), Some(parameter)),
        );
        projects.push(item);
        true
    }

    fn remove_project(&self, id: Uuid) -> bool {
        let removed = {
            let mut projects = self.projects.write();
            let before = projects.len();
            projects.retain(|p| p.id != id);
            projects.len() != before
        };
        if !removed {
            tracing::warn!("Cannot remove project because it does not exist");
            return false;
        }

        let item = NavItem::Project(id);
        if self.current() == Some(item) {
            self.activate_home();
        }
        self.entries.lock().remove(&item);
        true
    }
}

#[async_trait]
impl Feature for ViewSelectorFeature {
    fn name(&self) -> &'static str {
        "ViewSelector"
    }

    fn provide(self: Arc<Self>, registrar: &mut CapabilityRegistrar<'_>) {
        registrar.provide::<dyn ViewSelector>(self);
    }

    fn published_views(self: Arc<Self>) -> Vec<PublishedView> {
        vec![
            PublishedView::new("IDE.ViewSelector", "ViewSelectorView", move |_| {
                let view_model: Arc<dyn ViewModel> = Arc::new(ViewSelectorViewModel {
                    selector: self.clone(),
                    project_factory: Dependency::new(),
                });
                Ok(Some(view_model))
            })
            .with_description("The main navigation for project views."),
        ]
    }

    fn localized_resources(&self) -> Vec<LocalizedResources> {
        vec![
            LocalizedResources::new("en-us")
                .with("ViewSelector.Home", "Home")
                .with("ViewSelector.Settings", "Settings")
                .with("ViewSelector.Exit", "Exit")
                .with("ViewSelector.ExitPrompt", "{0} project(s) have unsaved changes")
                .with("ViewSelector.NotFound", "View '{0}' was not found"),
            LocalizedResources::new("fi-fi")
                .with("ViewSelector.Home", "Koti")
                .with("ViewSelector.Settings", "Asetukset")
                .with("ViewSelector.Exit", "Lopeta")
                .with("ViewSelector.ExitPrompt", "{0} projektissa on tallentamattomia muutoksia")
                .with("ViewSelector.NotFound", "Näkymää '{0}' ei löytynyt"),
        ]
    }

    fn dependencies(&self) -> Vec<&dyn DependencySlot> {
        vec![&self.shell as &dyn DependencySlot, &self.project_factory]
    }

    async fn initialize(&self, host: &Host) -> Result<()> {
        *self.host.write() = host.downgrade();

        if self.shell.get().is_none() {
            tracing::error!(
                "ViewSelector: required dependency Shell could not be resolved; navigation may not work properly"
            );
        }

        let mut entries = self.entries.lock();
        entries.insert(NavItem::Home, NavEntry::new("IDE.HomeScreen", None));
        entries.insert(NavItem::Settings, NavEntry::new("IDE.AppSettings", None));
        Ok(())
    }

    async fn running(&self, _host: &Host, args: &[String]) -> Result<()> {
        if args.is_empty() {
            return Ok(());
        }

        let Some(factory) = self.project_factory.get() else {
            tracing::warn!("No project factory; ignoring {} argument(s)", args.len());
            return Ok(());
        };

        let mut last = None;
        for arg in args {
            last = Some(self.open_project(factory.as_ref(), Path::new(arg)));
        }
        if let Some(item) = last {
            self.activate_project(&item);
        }
        Ok(())
    }

    async fn exit_requested(&self, host: &Host, cancel: &CancellationToken) -> Result<()> {
        let dirty: Vec<_> = self
            .projects()
            .into_iter()
            .filter(|p| p.is_dirty())
            .collect();
        if dirty.is_empty() {
            return Ok(());
        }

        let prompt = host
            .feature_localized_text(self.name(), "ViewSelector.ExitPrompt")
            .unwrap_or_else(|| "{0} project(s) have unsaved changes".to_string())
            .replace("{0}", &dirty.len().to_string());
        let titles: Vec<&str> = dirty.iter().map(|p| p.title.as_str()).collect();
        tracing::warn!("{}: {}", prompt, titles.join(", "));

        cancel.cancel();
        Ok(())
    }

    async fn shutdown(&self, _host: &Host) -> Result<()> {
        *self.current.write() = None;
        let entries = std::mem::take(&mut *self.entries.lock());
        drop(entries);
        Ok(())
    }
}

// ============================================================
// View model
// ============================================================

pub struct ViewSelectorViewModel {
    selector: Arc<ViewSelectorFeature>,
    project_factory: Dependency<dyn ProjectFactory>,
}

impl ViewSelectorViewModel {
    pub fn projects(&self) -> Vec<Arc<ProjectItem>> {
        self.selector.projects()
    }

    pub fn is_home_selected(&self) -> bool {
        self.selector.current() == Some(NavItem::Home)
    }

    pub fn is_settings_selected(&self) -> bool {
        self.selector.current() == Some(NavItem::Settings)
    }

    pub fn activate_home(&self) {
        self.selector.activate_home();
    }

    pub fn activate_settings(&self) {
        self.selector.activate_settings();
    }

    /// Creates a new project, adds it to the list and opens it.
    pub fn add_project(&self) -> Option<Arc<ProjectItem>> {
        let factory = self.project_factory.get()?;
        let item = factory.create_project();
        self.selector.add_project(item.clone());
        self.selector.activate_project(&item);
        Some(item)
    }

    pub fn open_project(&self, path: &Path) -> Option<Arc<ProjectItem>> {
        let factory = self.project_factory.get()?;
        let item = self.selector.open_project(factory.as_ref(), path);
        self.selector.activate_project(&item);
        Some(item)
    }
}

impl ViewModel for ViewSelectorViewModel {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn dependencies(&self) -> Vec<&dyn DependencySlot> {
        vec![&self.project_factory as &dyn DependencySlot]
    }

    fn initialize(&self, _host: &Host) -> Result<()> {
        if self.project_factory.get().is_none() {
            tracing::error!(
                "ViewSelectorViewModel: required dependency ProjectFactory could not be resolved"
            );
        }
        Ok(())
    }

    /// Shows the home screen when the navigation first appears.
    fn activate(&self) {
        self.selector.activate_home();
    }
}

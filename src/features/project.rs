//! Project workspaces: creation, opening and the main project view.

use std::any::Any;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use chrono::Local;
use parking_lot::RwLock;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::app::Feature;
use crate::features::app_settings::{AppSettings, CommonCategories, StringSetting};
use crate::host::{CapabilityRegistrar, Dependency, DependencySlot, Host, LocalizedResources};
use crate::models::{ProjectItem, ProjectKind};
use crate::views::{PublishedView, ViewModel};

pub const DEFAULT_TITLE_KEY: &str = "PROJECT.DefaultTitle";
const DEFAULT_TITLE: &str = "My project";

/// Creates and opens project items.
pub trait ProjectFactory: Send + Sync {
    /// A new, empty project under the projects directory.
    fn create_project(&self) -> Arc<ProjectItem>;

    fn open_project(&self, path: &Path) -> Arc<ProjectItem>;
}

#[derive(Default)]
pub struct ProjectFeature {
    settings: Dependency<dyn AppSettings>,
    projects_dir: RwLock<Option<PathBuf>>,
    default_title: RwLock<Option<Arc<StringSetting>>>,
}

impl ProjectFeature {
    pub fn new() -> Self {
        Self::default()
    }

    fn default_title(&self) -> String {
        self.default_title
            .read()
            .as_ref()
            .map(|setting| setting.value())
            .filter(|title| !title.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_TITLE.to_string())
    }
}

/// `__unnamed_<yyyymmdd>-<hhmm>-<last uuid group>`.
pub fn unnamed_folder_name() -> String {
    let uuid = Uuid::new_v4().to_string();
    let tail = uuid.rsplit('-').next().unwrap_or(&uuid);
    format!("__unnamed_{}-{}", Local::now().format("%Y%m%d-%H%M"), tail)
}

impl ProjectFactory for ProjectFeature {
    fn create_project(&self) -> Arc<ProjectItem> {
        let base = self
            .projects_dir
            .read()
            .clone()
            .unwrap_or_else(std::env::temp_dir);
        let path = base.join(unnamed_folder_name());

        tracing::info!("Created project at {}", path.display());
        Arc::new(ProjectItem::new(
            self.default_title(),
            path,
            ProjectKind::Workspace,
        ))
    }

    fn open_project(&self, path: &Path) -> Arc<ProjectItem> {
        let title = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        Arc::new(ProjectItem::new(title, path, ProjectKind::Workspace))
    }
}

#[async_trait]
impl Feature for ProjectFeature {
    fn name(&self) -> &'static str {
        "Project"
    }

    fn provide(self: Arc<Self>, registrar: &mut CapabilityRegistrar<'_>) {
        registrar.provide::<dyn ProjectFactory>(self);
    }

    fn published_views(self: Arc<Self>) -> Vec<PublishedView> {
        vec![PublishedView::new(
            ProjectKind::Workspace.view_name(),
            "ProjectView",
            |parameter| {
                let Some(item) = parameter.and_then(|p| p.clone().downcast::<ProjectItem>().ok())
                else {
                    return Ok(None);
                };
                let view_model: Arc<dyn ViewModel> = Arc::new(ProjectViewModel::new(item));
                Ok(Some(view_model))
            },
        )
        .with_description("The main view for project workspace.")]
    }

    fn localized_resources(&self) -> Vec<LocalizedResources> {
        vec![
            LocalizedResources::new("en-us")
                .with(DEFAULT_TITLE_KEY, "Default project title")
                .with("Project.Save", "Save"),
            LocalizedResources::new("fi-fi")
                .with(DEFAULT_TITLE_KEY, "Projektin oletusnimi")
                .with("Project.Save", "Tallenna"),
        ]
    }

    fn dependencies(&self) -> Vec<&dyn DependencySlot> {
        vec![&self.settings as &dyn DependencySlot]
    }

    async fn initialize(&self, host: &Host) -> Result<()> {
        *self.projects_dir.write() = Some(host.projects_dir());
        Ok(())
    }

    async fn starting(&self, _host: &Host, _cancel: &CancellationToken) -> Result<()> {
        let Some(settings) = self.settings.get() else {
            tracing::warn!("Project: AppSettings not available; using the built-in default title");
            return Ok(());
        };

        let setting = settings.register_string_setting(
            DEFAULT_TITLE_KEY,
            &[CommonCategories::PROJECTS],
            DEFAULT_TITLE,
            Some(Box::new(|title: &String| !title.trim().is_empty())),
        )?;
        *self.default_title.write() = Some(setting);
        Ok(())
    }
}

// ============================================================
// View model
// ============================================================

pub struct ProjectViewModel {
    item: Arc<ProjectItem>,
    content: RwLock<String>,
}

impl ProjectViewModel {
    pub fn new(item: Arc<ProjectItem>) -> Self {
        Self {
            item,
            content: RwLock::new(String::new()),
        }
    }

    pub fn item(&self) -> &Arc<ProjectItem> {
        &self.item
    }

    pub fn project_title(&self) -> &str {
        &self.item.title
    }

    pub fn is_dirty(&self) -> bool {
        self.item.is_dirty()
    }

    pub fn content(&self) -> String {
        self.content.read().clone()
    }

    /// Replaces the editor content and marks the project dirty.
    pub fn set_content(&self, content: impl Into<String>) {
        *self.content.write() = content.into();
        self.item.mark_dirty();
    }

    pub fn save(&self) {
        self.item.mark_saved();
    }
}

impl ViewModel for ProjectViewModel {
    fn as_any(&self) -> &dyn Any {
        self
    }
}

//! Published views: named (view-model, view) pairs that features expose so
//! other parts of the app can request them without knowing the feature.
//!
//! The host owns a [`ViewRegistry`] built from every feature's
//! [`published_views`](crate::app::Feature::published_views). Requesters go
//! through [`Host::create_view`](crate::host::Host::create_view); the UI glue
//! calls [`View::attach`] / [`View::detach`] as the view enters and leaves the
//! live tree.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::{Mutex, RwLock};
use uuid::Uuid;

use crate::error::ShellError;
use crate::host::{DependencySlot, Host, LocalizedStrings};
use crate::models::ViewUsage;

/// Opaque argument passed from a requester to a view factory.
pub type ViewParameter = Arc<dyn Any + Send + Sync>;

/// Produces a view-model, or `Ok(None)` to refuse the parameter.
pub type ViewFactory =
    Arc<dyn Fn(Option<&ViewParameter>) -> anyhow::Result<Option<Arc<dyn ViewModel>>> + Send + Sync>;

/// The data context behind a published view.
pub trait ViewModel: Send + Sync + 'static {
    fn as_any(&self) -> &dyn Any;

    /// Slots the host fills before [`initialize`](Self::initialize) runs.
    fn dependencies(&self) -> Vec<&dyn DependencySlot> {
        Vec::new()
    }

    /// Called once, after dependencies are resolved. An error discards the view.
    fn initialize(&self, _host: &Host) -> anyhow::Result<()> {
        Ok(())
    }

    /// Called when the view is attached to the live UI tree.
    fn activate(&self) {}

    /// Called when the view is detached from the live UI tree.
    fn deactivate(&self) {}
}

/// A view a feature declares at load time.
pub struct PublishedView {
    pub name: String,
    /// Descriptor of the concrete view the UI glue should instantiate.
    pub view_type: &'static str,
    pub description: Option<String>,
    factory: ViewFactory,
}

impl PublishedView {
    pub fn new<F>(name: impl Into<String>, view_type: &'static str, factory: F) -> Self
    where
        F: Fn(Option<&ViewParameter>) -> anyhow::Result<Option<Arc<dyn ViewModel>>>
            + Send
            + Sync
            + 'static,
    {
        Self {
            name: name.into(),
            view_type,
            description: None,
            factory: Arc::new(factory),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// A published view bound to the feature that declared it.
#[derive(Clone)]
pub struct PublishedViewInfo {
    pub owner: String,
    pub view_name: String,
    pub view_type: &'static str,
    pub description: Option<String>,
    factory: ViewFactory,
}

impl PublishedViewInfo {
    pub(crate) fn create_view_model(
        &self,
        parameter: Option<&ViewParameter>,
    ) -> anyhow::Result<Option<Arc<dyn ViewModel>>> {
        (self.factory)(parameter)
    }
}

impl fmt::Debug for PublishedViewInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PublishedViewInfo")
            .field("owner", &self.owner)
            .field("view_name", &self.view_name)
            .field("view_type", &self.view_type)
            .field("description", &self.description)
            .finish()
    }
}

struct ViewState {
    id: Uuid,
    name: String,
    owner: String,
    view_type: &'static str,
    view_model: Arc<dyn ViewModel>,
    strings: RwLock<LocalizedStrings>,
}

type ActiveViews = Mutex<HashMap<Uuid, Arc<ViewState>>>;

/// A materialized published view.
///
/// Attach/detach calls are always balanced: repeated calls are no-ops, and
/// dropping an attached view detaches it.
pub struct View {
    state: Arc<ViewState>,
    attached: AtomicBool,
    active: Weak<ActiveViews>,
}

impl View {
    pub fn id(&self) -> Uuid {
        self.state.id
    }

    pub fn name(&self) -> &str {
        &self.state.name
    }

    pub fn owner(&self) -> &str {
        &self.state.owner
    }

    pub fn view_type(&self) -> &'static str {
        self.state.view_type
    }

    pub fn view_model(&self) -> &Arc<dyn ViewModel> {
        &self.state.view_model
    }

    /// The view-model as its concrete type.
    pub fn data_context<T: 'static>(&self) -> Option<&T> {
        self.state.view_model.as_any().downcast_ref::<T>()
    }

    pub fn text(&self, key: &str) -> Option<String> {
        self.state.strings.read().get(key).map(str::to_string)
    }

    pub fn strings(&self) -> LocalizedStrings {
        self.state.strings.read().clone()
    }

    pub fn is_attached(&self) -> bool {
        self.attached.load(Ordering::SeqCst)
    }

    /// Marks the view as part of the live UI tree and activates its view-model.
    pub fn attach(&self) -> bool {
        if self.attached.swap(true, Ordering::SeqCst) {
            return false;
        }

        if let Some(active) = self.active.upgrade() {
            active.lock().insert(self.state.id, self.state.clone());
        }
        tracing::debug!("Published view activated: {}", self.state.name);
        self.state.view_model.activate();
        true
    }

    pub fn detach(&self) -> bool {
        if !self.attached.swap(false, Ordering::SeqCst) {
            return false;
        }

        self.state.view_model.deactivate();
        if let Some(active) = self.active.upgrade() {
            active.lock().remove(&self.state.id);
        }
        tracing::debug!("Published view deactivated: {}", self.state.name);
        true
    }
}

impl Drop for View {
    fn drop(&mut self) {
        self.detach();
    }
}

impl fmt::Debug for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("View")
            .field("id", &self.state.id)
            .field("name", &self.state.name)
            .field("owner", &self.state.owner)
            .field("attached", &self.is_attached())
            .finish()
    }
}

/// Name → published view table, plus the set of currently attached views.
#[derive(Default)]
pub struct ViewRegistry {
    published: HashMap<String, PublishedViewInfo>,
    order: Vec<String>,
    active: Arc<ActiveViews>,
}

impl ViewRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a feature's view. A name that is already taken is rejected.
    pub fn publish(&mut self, owner: &str, view: PublishedView) -> Result<(), ShellError> {
        if let Some(existing) = self.published.get(&view.name) {
            return Err(ShellError::DuplicateView {
                name: view.name,
                first: existing.owner.clone(),
                second: owner.to_string(),
            });
        }

        self.order.push(view.name.clone());
        self.published.insert(
            view.name.clone(),
            PublishedViewInfo {
                owner: owner.to_string(),
                view_name: view.name,
                view_type: view.view_type,
                description: view.description,
                factory: view.factory,
            },
        );
        Ok(())
    }

    pub fn get(&self, view_name: &str) -> Option<&PublishedViewInfo> {
        self.published.get(view_name)
    }

    /// Published view names in declaration order.
    pub fn names(&self) -> &[String] {
        &self.order
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn active_count(&self) -> usize {
        self.active.lock().len()
    }

    /// Every published view with its number of attached instances.
    pub fn usage(&self) -> Vec<ViewUsage> {
        let active = self.active.lock();
        self.order
            .iter()
            .map(|name| ViewUsage {
                view_name: name.clone(),
                active_count: active.values().filter(|v| &v.name == name).count(),
            })
            .collect()
    }

    pub(crate) fn instantiate(
        &self,
        info: &PublishedViewInfo,
        view_model: Arc<dyn ViewModel>,
        strings: LocalizedStrings,
    ) -> View {
        View {
            state: Arc::new(ViewState {
                id: Uuid::new_v4(),
                name: info.view_name.clone(),
                owner: info.owner.clone(),
                view_type: info.view_type,
                view_model,
                strings: RwLock::new(strings),
            }),
            attached: AtomicBool::new(false),
            active: Arc::downgrade(&self.active),
        }
    }

    /// Replaces the strings of every attached view, e.g. after a language change.
    pub(crate) fn relocalize(&self, strings_for: impl Fn(&str) -> LocalizedStrings) {
        let active: Vec<Arc<ViewState>> = self.active.lock().values().cloned().collect();
        for view in active {
            *view.strings.write() = strings_for(&view.owner);
        }
    }
}

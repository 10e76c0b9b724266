use std::fmt;
use std::sync::{Arc, Weak};

use parking_lot::RwLock;

use super::setting::{ErasedSetting, Setting, SettingKind, Validator};
use super::CommonCategories;
use crate::error::{require_key, ShellError};

/// A node in the settings tree. The key doubles as its localization key.
pub struct Category {
    key: String,
    parent: RwLock<Weak<Category>>,
    categories: RwLock<Vec<Arc<Category>>>,
    settings: RwLock<Vec<Arc<dyn ErasedSetting>>>,
}

impl Category {
    fn new(key: &str) -> Arc<Self> {
        Arc::new(Self {
            key: key.to_string(),
            parent: RwLock::new(Weak::new()),
            categories: RwLock::new(Vec::new()),
            settings: RwLock::new(Vec::new()),
        })
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn parent(&self) -> Option<Arc<Category>> {
        self.parent.read().upgrade()
    }

    /// Child categories, in registration order.
    pub fn categories(&self) -> Vec<Arc<Category>> {
        self.categories.read().clone()
    }

    /// Settings directly in this category, in registration order.
    pub fn settings(&self) -> Vec<Arc<dyn ErasedSetting>> {
        self.settings.read().clone()
    }

    pub fn child(&self, key: &str) -> Option<Arc<Category>> {
        self.categories
            .read()
            .iter()
            .find(|c| c.key == key)
            .cloned()
    }

    /// Distance from the root; root categories are level 0.
    pub fn level(&self) -> usize {
        let mut level = 0;
        let mut current = self.parent();
        while let Some(category) = current {
            level += 1;
            current = category.parent();
        }
        level
    }

    fn has_ancestor(&self, ancestor: &Arc<Category>) -> bool {
        let mut current = self.parent();
        while let Some(category) = current {
            if Arc::ptr_eq(&category, ancestor) {
                return true;
            }
            current = category.parent();
        }
        false
    }

    fn is_child_of(&self, parent: Option<&Arc<Category>>) -> bool {
        match (self.parent(), parent) {
            (None, None) => true,
            (Some(current), Some(parent)) => Arc::ptr_eq(&current, parent),
            _ => false,
        }
    }

    fn attach(parent: &Arc<Category>, child: &Arc<Category>) {
        parent.categories.write().push(child.clone());
        *child.parent.write() = Arc::downgrade(parent);
    }
}

impl fmt::Debug for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Category")
            .field("key", &self.key)
            .field("categories", &self.categories.read().len())
            .field("settings", &self.settings.read().len())
            .finish()
    }
}

/// The category/setting hierarchy.
///
/// Structural changes are serialized through the root list lock, so
/// concurrent registrations never create duplicate siblings.
#[derive(Default)]
pub struct SettingsTree {
    roots: RwLock<Vec<Arc<Category>>>,
}

impl SettingsTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Root categories, in registration order.
    pub fn categories(&self) -> Vec<Arc<Category>> {
        self.roots.read().clone()
    }

    /// Returns the category with `key` under `parent`, creating it if needed.
    pub fn register_category(
        &self,
        key: &str,
        parent: Option<&Arc<Category>>,
    ) -> Result<Arc<Category>, ShellError> {
        require_key(key)?;

        let mut roots = self.roots.write();
        if let Some(existing) = collect_categories(&roots)
            .into_iter()
            .find(|c| c.key == key && c.is_child_of(parent))
        {
            return Ok(existing);
        }

        let category = Category::new(key);
        match parent {
            Some(parent) => Category::attach(parent, &category),
            None => roots.push(category.clone()),
        }
        Ok(category)
    }

    /// Moves `category` under `new_parent` (or to the root list), detaching
    /// it from its current parent first. Refuses to create a cycle.
    pub fn move_category(&self, category: &Arc<Category>, new_parent: Option<&Arc<Category>>) -> bool {
        let mut roots = self.roots.write();

        if let Some(parent) = new_parent {
            if Arc::ptr_eq(parent, category) || parent.has_ancestor(category) {
                tracing::warn!(
                    "Cannot move category '{}' under its own descendant '{}'",
                    category.key,
                    parent.key
                );
                return false;
            }
        }

        if category.is_child_of(new_parent) {
            return true;
        }

        match category.parent() {
            Some(old) => old.categories.write().retain(|c| !Arc::ptr_eq(c, category)),
            None => roots.retain(|c| !Arc::ptr_eq(c, category)),
        }

        match new_parent {
            Some(parent) => Category::attach(parent, category),
            None => {
                *category.parent.write() = Weak::new();
                roots.push(category.clone());
            }
        }
        true
    }

    /// Resolves `path` to a category, creating missing segments.
    ///
    /// An empty path means [`CommonCategories::GENERAL`]; a blank segment
    /// becomes `"."`.
    pub fn get_or_create_parent(&self, path: &[&str]) -> Arc<Category> {
        let mut roots = self.roots.write();

        let first = segment_key(path.first().copied().unwrap_or(CommonCategories::GENERAL));
        let mut current = match roots.iter().find(|c| c.key == first) {
            Some(existing) => existing.clone(),
            None => {
                let category = Category::new(first);
                roots.push(category.clone());
                category
            }
        };

        for part in path.iter().skip(1) {
            let key = segment_key(part);
            current = match current.child(key) {
                Some(existing) => existing,
                None => {
                    let category = Category::new(key);
                    Category::attach(&current, &category);
                    category
                }
            };
        }

        current
    }

    /// Creates a setting in the category at `path` and attaches it.
    pub fn register_setting<T: SettingKind>(
        &self,
        key: &str,
        path: &[&str],
        default: T,
        validate: Option<Validator<T>>,
    ) -> Result<Arc<Setting<T>>, ShellError> {
        require_key(key)?;

        let parent = self.get_or_create_parent(path);
        let setting = Arc::new(Setting::new(key, &parent, default, validate));
        parent.settings.write().push(setting.clone());
        Ok(setting)
    }

    pub fn find_category(&self, key: &str) -> Option<Arc<Category>> {
        self.all_categories().into_iter().find(|c| c.key == key)
    }

    pub fn find_setting(&self, key: &str) -> Option<Arc<dyn ErasedSetting>> {
        self.all_settings().into_iter().find(|s| s.key() == key)
    }

    /// Every category, depth first.
    pub fn all_categories(&self) -> Vec<Arc<Category>> {
        collect_categories(&self.roots.read())
    }

    /// Every setting reachable from the roots, depth first.
    pub fn all_settings(&self) -> Vec<Arc<dyn ErasedSetting>> {
        self.all_categories()
            .iter()
            .flat_map(|category| category.settings())
            .collect()
    }

    /// Assigns every setting its default. Returns how many changed.
    pub fn reset_all(&self) -> usize {
        self.all_settings()
            .iter()
            .filter(|setting| setting.reset() == super::SetOutcome::Changed)
            .count()
    }
}

fn segment_key(part: &str) -> &str {
    if part.trim().is_empty() {
        "."
    } else {
        part
    }
}

fn collect_categories(roots: &[Arc<Category>]) -> Vec<Arc<Category>> {
    fn walk(categories: &[Arc<Category>], out: &mut Vec<Arc<Category>>) {
        for category in categories {
            out.push(category.clone());
            walk(&category.categories.read(), out);
        }
    }

    let mut out = Vec::new();
    walk(roots, &mut out);
    out
}

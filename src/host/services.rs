use std::any::{type_name, Any, TypeId};
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use uuid::Uuid;

/// Identity of whoever registered a service.
///
/// Two owners are equal only if one is a clone of the other; creating two
/// owners with the same label yields distinct identities.
#[derive(Clone)]
pub struct Owner {
    id: Uuid,
    label: Arc<str>,
}

impl Owner {
    pub fn new(label: impl AsRef<str>) -> Self {
        Self {
            id: Uuid::new_v4(),
            label: Arc::from(label.as_ref()),
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }
}

impl PartialEq for Owner {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Owner {}

impl fmt::Debug for Owner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Owner({}, {})", self.label, self.id)
    }
}

struct ServiceEntry {
    type_name: &'static str,
    /// Always an `Arc<T>` for the `T` the entry is keyed by.
    instance: Box<dyn Any + Send + Sync>,
    owner: Option<Owner>,
}

/// Type-keyed registry holding at most one instance per capability.
///
/// Capabilities are usually trait objects (`dyn AppSettings`), so `T` may be
/// unsized; instances are always shared as `Arc<T>`.
#[derive(Default)]
pub struct ServiceDirectory {
    entries: RwLock<HashMap<TypeId, ServiceEntry>>,
}

impl ServiceDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `instance` as the provider of `T`. Fails without side effects
    /// if `T` already has a provider.
    pub fn register<T>(&self, instance: Arc<T>, owner: Option<&Owner>) -> bool
    where
        T: ?Sized + Send + Sync + 'static,
    {
        let mut entries = self.entries.write();
        match entries.entry(TypeId::of::<T>()) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                slot.insert(ServiceEntry {
                    type_name: type_name::<T>(),
                    instance: Box::new(instance),
                    owner: owner.cloned(),
                });
                true
            }
        }
    }

    /// Removes the provider of `T`, but only for the owner that registered it.
    /// Entries registered without an owner can never be removed.
    pub fn unregister<T>(&self, owner: &Owner) -> bool
    where
        T: ?Sized + 'static,
    {
        let mut entries = self.entries.write();
        let key = TypeId::of::<T>();
        match entries.get(&key) {
            Some(entry) if entry.owner.as_ref() == Some(owner) => {
                entries.remove(&key);
                true
            }
            _ => false,
        }
    }

    pub fn get<T>(&self) -> Option<Arc<T>>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        self.entries
            .read()
            .get(&TypeId::of::<T>())
            .and_then(|entry| entry.instance.downcast_ref::<Arc<T>>())
            .cloned()
    }

    pub fn contains<T: ?Sized + 'static>(&self) -> bool {
        self.entries.read().contains_key(&TypeId::of::<T>())
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Capability type names currently registered, sorted.
    pub fn registered(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.entries.read().values().map(|e| e.type_name).collect();
        names.sort_unstable();
        names
    }
}

struct Binding {
    provider: String,
    /// Always an `Arc<T>` for the `T` the binding list is keyed by.
    instance: Box<dyn Any + Send + Sync>,
}

/// Declared capability → provider table, built once when features load.
///
/// Providers for the same capability are kept in declaration order; the
/// first one wins every lookup.
#[derive(Default)]
pub struct CapabilityBindings {
    table: HashMap<TypeId, Vec<Binding>>,
}

impl CapabilityBindings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bind<T>(&mut self, provider: &str, instance: Arc<T>)
    where
        T: ?Sized + Send + Sync + 'static,
    {
        self.table.entry(TypeId::of::<T>()).or_default().push(Binding {
            provider: provider.to_string(),
            instance: Box::new(instance),
        });
    }

    /// The winning provider of `T` and its name.
    pub fn first<T>(&self) -> Option<(Arc<T>, &str)>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        let binding = self.table.get(&TypeId::of::<T>())?.first()?;
        let instance = binding.instance.downcast_ref::<Arc<T>>()?.clone();
        Some((instance, binding.provider.as_str()))
    }

    /// Every provider of `T`, in declaration order.
    pub fn providers<T: ?Sized + 'static>(&self) -> Vec<&str> {
        self.providers_of(TypeId::of::<T>())
    }

    pub(crate) fn providers_of(&self, capability: TypeId) -> Vec<&str> {
        self.table
            .get(&capability)
            .map(|bindings| bindings.iter().map(|b| b.provider.as_str()).collect())
            .unwrap_or_default()
    }

    /// The winning candidate for `capability`, still boxed as `Arc<T>`.
    pub(crate) fn first_candidate(&self, capability: TypeId) -> Option<&(dyn Any + Send + Sync)> {
        self.table
            .get(&capability)
            .and_then(|bindings| bindings.first())
            .map(|binding| binding.instance.as_ref())
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}

/// Handed to a feature while it declares the capabilities it provides.
pub struct CapabilityRegistrar<'a> {
    provider: &'a str,
    bindings: &'a mut CapabilityBindings,
}

impl<'a> CapabilityRegistrar<'a> {
    pub fn new(provider: &'a str, bindings: &'a mut CapabilityBindings) -> Self {
        Self { provider, bindings }
    }

    pub fn provide<T>(&mut self, instance: Arc<T>) -> &mut Self
    where
        T: ?Sized + Send + Sync + 'static,
    {
        self.bindings.bind(self.provider, instance);
        self
    }
}

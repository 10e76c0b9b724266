use std::any::{type_name, Any, TypeId};
use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;

use super::services::CapabilityBindings;

/// A settable slot that the resolver fills with a capability instance.
///
/// Features and view-models list their slots explicitly; nothing is
/// discovered by scanning.
pub trait DependencySlot: Send + Sync {
    fn capability(&self) -> TypeId;

    fn capability_name(&self) -> &'static str;

    /// Stores `candidate` if it is an `Arc` of this slot's capability.
    fn fill(&self, candidate: &(dyn Any + Send + Sync)) -> bool;

    fn is_resolved(&self) -> bool;
}

/// An optional, injected reference to a capability `T`.
///
/// Empty until resolution runs, and stays empty when nothing provides `T`;
/// callers must handle `None`.
pub struct Dependency<T: ?Sized> {
    slot: RwLock<Option<Arc<T>>>,
}

impl<T: ?Sized> Dependency<T> {
    pub fn new() -> Self {
        Self {
            slot: RwLock::new(None),
        }
    }

    pub fn get(&self) -> Option<Arc<T>> {
        self.slot.read().clone()
    }

    pub fn set(&self, instance: Arc<T>) {
        *self.slot.write() = Some(instance);
    }
}

impl<T: ?Sized> Default for Dependency<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: ?Sized> fmt::Debug for Dependency<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dependency")
            .field("capability", &type_name::<T>())
            .field("resolved", &self.slot.read().is_some())
            .finish()
    }
}

impl<T> DependencySlot for Dependency<T>
where
    T: ?Sized + Send + Sync + 'static,
{
    fn capability(&self) -> TypeId {
        TypeId::of::<T>()
    }

    fn capability_name(&self) -> &'static str {
        type_name::<T>()
    }

    fn fill(&self, candidate: &(dyn Any + Send + Sync)) -> bool {
        match candidate.downcast_ref::<Arc<T>>() {
            Some(instance) => {
                self.set(instance.clone());
                true
            }
            None => false,
        }
    }

    fn is_resolved(&self) -> bool {
        self.slot.read().is_some()
    }
}

/// Fills every slot from the first pool that has a candidate for it.
///
/// Pools are consulted in order (the host's own capabilities first, then the
/// feature bindings in load order). Unmatched slots are left empty. Returns
/// the number of slots filled.
pub fn resolve(target: &str, slots: &[&dyn DependencySlot], pools: &[&CapabilityBindings]) -> usize {
    let mut resolved = 0;

    for slot in slots {
        let filled = pools
            .iter()
            .filter_map(|pool| pool.first_candidate(slot.capability()))
            .any(|candidate| slot.fill(candidate));

        if filled {
            resolved += 1;
        } else {
            tracing::debug!(
                "{}: dependency {} could not be resolved",
                target,
                slot.capability_name()
            );
        }
    }

    resolved
}

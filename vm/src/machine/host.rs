use std::any::{type_name, Any, TypeId};
use std::collections::HashMap;
use std::fmt;

use crate::error::RuntimeError;

/// Host-side state owned by a VM, keyed by type.
///
/// Native libraries keep their handles here (a graphics backend, an open
/// file table) instead of in globals, so two VMs never share host state.
#[derive(Default)]
pub struct HostMap {
    slots: HashMap<TypeId, Box<dyn Any>>,
}

impl HostMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `host`, returning the one it replaces.
    pub fn attach<T: Any>(&mut self, host: T) -> Option<T> {
        self.slots
            .insert(TypeId::of::<T>(), Box::new(host))
            .and_then(|old| old.downcast::<T>().ok())
            .map(|old| *old)
    }

    pub fn detach<T: Any>(&mut self) -> Option<T> {
        self.slots
            .remove(&TypeId::of::<T>())
            .and_then(|old| old.downcast::<T>().ok())
            .map(|old| *old)
    }

    pub fn contains<T: Any>(&self) -> bool {
        self.slots.contains_key(&TypeId::of::<T>())
    }

    pub fn get<T: Any>(&self) -> Result<&T, RuntimeError> {
        self.slots
            .get(&TypeId::of::<T>())
            .and_then(|h| h.downcast_ref::<T>())
            .ok_or(RuntimeError::HostUnavailable(type_name::<T>()))
    }

    pub fn get_mut<T: Any>(&mut self) -> Result<&mut T, RuntimeError> {
        self.slots
            .get_mut(&TypeId::of::<T>())
            .and_then(|h| h.downcast_mut::<T>())
            .ok_or(RuntimeError::HostUnavailable(type_name::<T>()))
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

impl fmt::Debug for HostMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HostMap")
            .field("attached", &self.slots.len())
            .finish()
    }
}

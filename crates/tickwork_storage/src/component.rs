//! Component registry and per-entity component blobs.

use tickwork_foundation::{ComponentType, Error, ErrorKind, Result};
use tracing::debug;

use crate::schema::{ComponentDesc, ComponentMeta};

/// One component instance attached to an entity.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ComponentBlob {
    pub(crate) component: ComponentType,
    pub(crate) data: Vec<u8>,
}

impl ComponentBlob {
    /// Returns the type of this blob.
    #[must_use]
    pub fn component(&self) -> ComponentType {
        self.component
    }

    /// Returns the stored bytes.
    #[must_use]
    pub fn data(&self) -> &[u8] {
        &self.data
    }
}

/// Registry of component schemas, kept in registration order.
#[derive(Clone, Debug, Default)]
pub struct ComponentRegistry {
    metas: Vec<ComponentMeta>,
}

impl ComponentRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a component schema.
    ///
    /// # Errors
    ///
    /// Returns an invalid argument error for the reserved type id, a zero
    /// size, or an id that is already registered.
    pub fn register(&mut self, desc: ComponentDesc) -> Result<&ComponentMeta> {
        if desc.component.is_reserved() {
            return Err(Error::invalid_argument("component type 0 is reserved"));
        }
        if desc.size == 0 {
            return Err(Error::invalid_argument(format!(
                "{} must have a nonzero size",
                desc.component
            )));
        }
        if self.get(desc.component).is_some() {
            return Err(Error::new(ErrorKind::DuplicateComponent(desc.component)));
        }

        debug!(
            component = desc.component.raw(),
            size = desc.size,
            name = desc.name.as_str(),
            "registered component type"
        );
        self.metas.push(ComponentMeta {
            component: desc.component,
            size: desc.size,
            alignment: desc.alignment.max(1),
            name: desc.name,
        });
        let last = self.metas.len() - 1;
        Ok(&self.metas[last])
    }

    /// Looks up a registered schema.
    #[must_use]
    pub fn get(&self, component: ComponentType) -> Option<&ComponentMeta> {
        self.metas.iter().find(|meta| meta.component == component)
    }

    /// Looks up a registered schema, failing if it is absent.
    ///
    /// # Errors
    ///
    /// Returns an unregistered-component error.
    pub fn require(&self, component: ComponentType) -> Result<&ComponentMeta> {
        self.get(component)
            .ok_or_else(|| Error::new(ErrorKind::UnregisteredComponent(component)))
    }

    /// Iterates over schemas in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &ComponentMeta> {
        self.metas.iter()
    }

    /// Returns the number of registered types.
    #[must_use]
    pub fn len(&self) -> usize {
        self.metas.len()
    }

    /// Returns true if nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.metas.is_empty()
    }
}

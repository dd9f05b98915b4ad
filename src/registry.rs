//! Extension handler registry
//!
//! The hosting application builds an [`ExtensionRegistry`] once and passes
//! it by shared reference into every decode call. Decoding never mutates it.
//!
//! Two key shapes are supported:
//!
//! - string keys ([`ExtensionRegistry::register_type`]), matched against the
//!   canonical `namespace:local` form of an `xsi:type` and, failing that,
//!   against the raw lexical value;
//! - `(namespace, local name)` pairs ([`ExtensionRegistry::register_element`]).
//!
//! Which shape a family consults is decided by its
//! [`ExtensionPoint`](crate::dispatch::ExtensionPoint) implementation.

use once_cell::sync::Lazy;
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::assertion::{CustomBaseId, CustomCondition, CustomStatement};
use crate::documents::Element;
use crate::error::Result;
use crate::metadata::CustomRoleDescriptor;
use crate::namespaces::QName;

/// The extensible element families
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Family {
    /// `saml:BaseID`
    BaseId,
    /// `saml:Condition`
    Condition,
    /// `saml:Statement`
    Statement,
    /// `md:RoleDescriptor`
    RoleDescriptor,
}

impl fmt::Display for Family {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Family::BaseId => "BaseID",
            Family::Condition => "Condition",
            Family::Statement => "Statement",
            Family::RoleDescriptor => "RoleDescriptor",
        };
        f.write_str(name)
    }
}

/// Decode function stored in the registry
pub type DecodeFn<T> = dyn Fn(&Element, &ExtensionRegistry) -> Result<T> + Send + Sync;

/// A registered decoder, typed by the family it produces
#[derive(Clone)]
pub enum Handler {
    /// Produces custom `BaseID` types
    BaseId(Arc<DecodeFn<Arc<dyn CustomBaseId>>>),
    /// Produces custom `Condition` types
    Condition(Arc<DecodeFn<Arc<dyn CustomCondition>>>),
    /// Produces custom `Statement` types
    Statement(Arc<DecodeFn<Arc<dyn CustomStatement>>>),
    /// Produces custom `RoleDescriptor` types
    RoleDescriptor(Arc<DecodeFn<Arc<dyn CustomRoleDescriptor>>>),
}

impl Handler {
    /// Wrap a decoder for a custom `BaseID` type
    pub fn base_id<T, F>(decode: F) -> Self
    where
        T: CustomBaseId + 'static,
        F: Fn(&Element, &ExtensionRegistry) -> Result<T> + Send + Sync + 'static,
    {
        Handler::BaseId(Arc::new(
            move |element: &Element, registry: &ExtensionRegistry| {
                decode(element, registry).map(|v| Arc::new(v) as Arc<dyn CustomBaseId>)
            },
        ))
    }

    /// Wrap a decoder for a custom `Condition` type
    pub fn condition<T, F>(decode: F) -> Self
    where
        T: CustomCondition + 'static,
        F: Fn(&Element, &ExtensionRegistry) -> Result<T> + Send + Sync + 'static,
    {
        Handler::Condition(Arc::new(
            move |element: &Element, registry: &ExtensionRegistry| {
                decode(element, registry).map(|v| Arc::new(v) as Arc<dyn CustomCondition>)
            },
        ))
    }

    /// Wrap a decoder for a custom `Statement` type
    pub fn statement<T, F>(decode: F) -> Self
    where
        T: CustomStatement + 'static,
        F: Fn(&Element, &ExtensionRegistry) -> Result<T> + Send + Sync + 'static,
    {
        Handler::Statement(Arc::new(
            move |element: &Element, registry: &ExtensionRegistry| {
                decode(element, registry).map(|v| Arc::new(v) as Arc<dyn CustomStatement>)
            },
        ))
    }

    /// Wrap a decoder for a custom `RoleDescriptor` type
    pub fn role_descriptor<T, F>(decode: F) -> Self
    where
        T: CustomRoleDescriptor + 'static,
        F: Fn(&Element, &ExtensionRegistry) -> Result<T> + Send + Sync + 'static,
    {
        Handler::RoleDescriptor(Arc::new(
            move |element: &Element, registry: &ExtensionRegistry| {
                decode(element, registry).map(|v| Arc::new(v) as Arc<dyn CustomRoleDescriptor>)
            },
        ))
    }

    /// The family this handler produces
    pub fn family(&self) -> Family {
        match self {
            Handler::BaseId(_) => Family::BaseId,
            Handler::Condition(_) => Family::Condition,
            Handler::Statement(_) => Family::Statement,
            Handler::RoleDescriptor(_) => Family::RoleDescriptor,
        }
    }
}

impl fmt::Debug for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Handler({})", self.family())
    }
}

static EMPTY: Lazy<ExtensionRegistry> = Lazy::new(ExtensionRegistry::new);

/// Lookup table from type identifiers to handlers
#[derive(Debug, Clone, Default)]
pub struct ExtensionRegistry {
    by_type: HashMap<String, Handler>,
    by_element: HashMap<QName, Handler>,
}

impl ExtensionRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Shared registry with no handlers
    pub fn empty() -> &'static ExtensionRegistry {
        &EMPTY
    }

    /// Register a handler under a string type identifier
    pub fn register_type(&mut self, type_id: impl Into<String>, handler: Handler) -> &mut Self {
        let type_id = type_id.into();
        let family = handler.family();
        if let Some(previous) = self.by_type.insert(type_id.clone(), handler) {
            tracing::debug!(
                type_id = %type_id,
                previous = %previous.family(),
                family = %family,
                "replaced extension handler"
            );
        } else {
            tracing::trace!(type_id = %type_id, family = %family, "registered extension handler");
        }
        self
    }

    /// Builder form of [`register_type`](Self::register_type)
    pub fn with_type(mut self, type_id: impl Into<String>, handler: Handler) -> Self {
        self.register_type(type_id, handler);
        self
    }

    /// Register a handler under a `(namespace, local name)` pair
    pub fn register_element(
        &mut self,
        namespace: Option<&str>,
        local_name: &str,
        handler: Handler,
    ) -> &mut Self {
        let key = QName::new(namespace, local_name);
        let family = handler.family();
        if let Some(previous) = self.by_element.insert(key.clone(), handler) {
            tracing::debug!(
                type_name = %key,
                previous = %previous.family(),
                family = %family,
                "replaced extension handler"
            );
        } else {
            tracing::trace!(type_name = %key, family = %family, "registered extension handler");
        }
        self
    }

    /// Builder form of [`register_element`](Self::register_element)
    pub fn with_element(
        mut self,
        namespace: Option<&str>,
        local_name: &str,
        handler: Handler,
    ) -> Self {
        self.register_element(namespace, local_name, handler);
        self
    }

    /// Handler registered under a string type identifier
    pub fn handler(&self, type_id: &str) -> Option<&Handler> {
        self.by_type.get(type_id)
    }

    /// Handler registered under a `(namespace, local name)` pair
    pub fn element_handler(&self, namespace: Option<&str>, local_name: &str) -> Option<&Handler> {
        self.by_element.get(&QName::new(namespace, local_name))
    }

    /// String lookup: the resolved canonical form first, then the raw value
    pub fn type_handler(&self, type_name: &QName, raw: &str) -> Option<&Handler> {
        let canonical = type_name.canonical();
        self.handler(&canonical).or_else(|| {
            if raw != canonical {
                self.handler(raw)
            } else {
                None
            }
        })
    }

    /// Number of registered handlers across both key shapes
    pub fn len(&self) -> usize {
        self.by_type.len() + self.by_element.len()
    }

    /// Whether no handlers are registered
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

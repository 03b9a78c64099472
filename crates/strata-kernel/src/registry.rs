//! Typed component registry.
//!
//! Every concrete per-layer implementation is registered at startup under
//! `(kind, logical name, layer rank)` together with its declared
//! dependencies and a factory. The resolver probes the registry the same way
//! it probes a filesystem, so layer selection stays identical for both.
//!
//! ```text
//! Registry ── (controller, "Dashboard", 3) ──► Registration
//!                                                ├─ capability
//!                                                ├─ dependencies [Dependency]
//!                                                ├─ extends (parent = layer below)
//!                                                └─ factory(&Construct) -> Shared
//! ```

use crate::app::AppHandle;
use crate::component::{ComponentDescriptor, ComponentKind};
use crate::error::{FrameworkError, Result};
use crate::layer::{Layer, LayerRank};
use crate::resolver::ComponentCatalog;
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::rc::Rc;

/// What a dependency or registered component provides.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    /// The application handle itself.
    Framework,
    Service,
    Helper,
    Model,
    Controller,
    Factory,
    View,
}

impl Capability {
    pub fn of_kind(kind: ComponentKind) -> Self {
        match kind {
            ComponentKind::Controller => Capability::Controller,
            ComponentKind::Service => Capability::Service,
            ComponentKind::Model => Capability::Model,
            ComponentKind::Helper => Capability::Helper,
            ComponentKind::View => Capability::View,
            ComponentKind::Factory => Capability::Factory,
        }
    }
}

/// A declared constructor dependency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dependency {
    pub name: String,
    pub capability: Capability,
}

impl Dependency {
    pub fn framework() -> Self {
        Self {
            name: "App".to_string(),
            capability: Capability::Framework,
        }
    }

    pub fn service(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            capability: Capability::Service,
        }
    }

    pub fn helper(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            capability: Capability::Helper,
        }
    }

    pub fn model(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            capability: Capability::Model,
        }
    }
}

/// A type-erased shared instance.
///
/// Wraps an `Rc<T>` (including unsized `Rc<dyn Trait>`) so it can be cached
/// and handed back to consumers that know the concrete handle type.
#[derive(Clone)]
pub struct Shared(Rc<dyn Any>);

impl Shared {
    pub fn new<T: ?Sized + 'static>(value: Rc<T>) -> Self {
        Shared(Rc::new(value))
    }

    /// Recover the `Rc<T>` this handle was created from.
    pub fn get<T: ?Sized + 'static>(&self) -> Option<Rc<T>> {
        self.0.downcast_ref::<Rc<T>>().cloned()
    }

    pub fn is<T: ?Sized + 'static>(&self) -> bool {
        self.0.is::<Rc<T>>()
    }
}

impl fmt::Debug for Shared {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Shared(..)")
    }
}

/// Everything a factory receives when constructing one layer implementation.
pub struct Construct<'a> {
    pub handle: &'a AppHandle,
    pub descriptor: &'a ComponentDescriptor,
    deps: BTreeMap<String, Shared>,
    args: Vec<Shared>,
    parent: Option<Shared>,
}

impl<'a> Construct<'a> {
    pub(crate) fn new(
        handle: &'a AppHandle,
        descriptor: &'a ComponentDescriptor,
        deps: BTreeMap<String, Shared>,
        args: Vec<Shared>,
        parent: Option<Shared>,
    ) -> Self {
        Self {
            handle,
            descriptor,
            deps,
            args,
            parent,
        }
    }

    /// A resolved declared dependency, by name.
    pub fn dependency<T: ?Sized + 'static>(&self, name: &str) -> Result<Rc<T>> {
        let shared = self.deps.get(name).ok_or_else(|| {
            FrameworkError::load(format!(
                "{} did not declare dependency {name}",
                self.descriptor.type_name()
            ))
        })?;
        shared.get::<T>().ok_or_else(|| {
            FrameworkError::load(format!(
                "dependency {name} of {} has an unexpected type",
                self.descriptor.type_name()
            ))
        })
    }

    /// Positional constructor argument supplied by the caller.
    pub fn arg<T: ?Sized + 'static>(&self, index: usize) -> Result<Rc<T>> {
        self.args
            .get(index)
            .and_then(Shared::get::<T>)
            .ok_or_else(|| {
                FrameworkError::load(format!(
                    "{} expects constructor argument #{index}",
                    self.descriptor.type_name()
                ))
            })
    }

    pub fn args(&self) -> &[Shared] {
        &self.args
    }

    /// The constructed implementation this one extends.
    pub fn parent<T: ?Sized + 'static>(&self) -> Result<Rc<T>> {
        self.parent
            .as_ref()
            .and_then(Shared::get::<T>)
            .ok_or_else(|| {
                FrameworkError::load(format!(
                    "{} extends a parent of an unexpected type",
                    self.descriptor.type_name()
                ))
            })
    }

    pub fn has_parent(&self) -> bool {
        self.parent.is_some()
    }
}

pub type Factory = Rc<dyn Fn(&Construct<'_>) -> Result<Shared>>;

#[derive(Clone)]
pub struct Registration {
    pub capability: Capability,
    pub dependencies: Vec<Dependency>,
    pub extends: bool,
    pub factory: Factory,
}

impl fmt::Debug for Registration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registration")
            .field("capability", &self.capability)
            .field("dependencies", &self.dependencies)
            .field("extends", &self.extends)
            .finish_non_exhaustive()
    }
}

type RegistryKey = (ComponentKind, String, LayerRank);

#[derive(Debug, Default, Clone)]
pub struct Registry {
    entries: BTreeMap<RegistryKey, Registration>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start registering an implementation. Nothing is stored until a
    /// factory is attached.
    pub fn register(
        &mut self,
        kind: ComponentKind,
        name: impl Into<String>,
        layer: LayerRank,
    ) -> Registering<'_> {
        Registering {
            registry: self,
            key: (kind, name.into(), layer),
            dependencies: Vec::new(),
            extends: false,
        }
    }

    pub fn get(&self, kind: ComponentKind, name: &str, layer: LayerRank) -> Option<&Registration> {
        self.entries.get(&(kind, name.to_string(), layer))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl ComponentCatalog for Registry {
    fn provides(&self, layer: &Layer, kind: ComponentKind, name: &str, _relative: &Path) -> bool {
        self.get(kind, name, layer.layer).is_some()
    }
}

/// Builder returned by [`Registry::register`].
#[must_use = "a registration is only stored once a factory is attached"]
pub struct Registering<'r> {
    registry: &'r mut Registry,
    key: RegistryKey,
    dependencies: Vec<Dependency>,
    extends: bool,
}

impl Registering<'_> {
    pub fn depends_on(mut self, dependency: Dependency) -> Self {
        self.dependencies.push(dependency);
        self
    }

    /// Override the next more generic implementation of the same name.
    pub fn extends(mut self) -> Self {
        self.extends = true;
        self
    }

    /// Attach a raw factory and store the registration. Later registrations
    /// of the same key replace earlier ones.
    pub fn factory(self, factory: impl Fn(&Construct<'_>) -> Result<Shared> + 'static) {
        let capability = Capability::of_kind(self.key.0);
        self.registry.entries.insert(
            self.key,
            Registration {
                capability,
                dependencies: self.dependencies,
                extends: self.extends,
                factory: Rc::new(factory),
            },
        );
    }

    /// Attach a factory producing a typed handle.
    pub fn provide<T: ?Sized + 'static>(
        self,
        factory: impl Fn(&Construct<'_>) -> Result<Rc<T>> + 'static,
    ) {
        self.factory(move |construct| factory(construct).map(Shared::new))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    trait Greeter {
        fn greet(&self) -> String;
    }

    struct English;

    impl Greeter for English {
        fn greet(&self) -> String {
            "hello".to_string()
        }
    }

    #[test]
    fn shared_round_trips_trait_objects() {
        let greeter: Rc<dyn Greeter> = Rc::new(English);
        let shared = Shared::new(greeter);
        assert!(shared.is::<dyn Greeter>());
        let back = shared.get::<dyn Greeter>().expect("same handle type");
        assert_eq!(back.greet(), "hello");
        assert!(shared.get::<String>().is_none());
    }

    #[test]
    fn registry_probe_matches_exact_layer() {
        let mut registry = Registry::new();
        registry
            .register(ComponentKind::Service, "GreeterService", 3)
            .depends_on(Dependency::framework())
            .provide::<dyn Greeter>(|_| Ok(Rc::new(English)));

        let layer = |rank: LayerRank| Layer {
            layer: rank,
            directory: format!("{rank}x"),
            suffix: format!("L{rank}"),
        };
        let path = Path::new("services/GreeterService.rs");
        assert!(registry.provides(&layer(3), ComponentKind::Service, "GreeterService", path));
        assert!(!registry.provides(&layer(1), ComponentKind::Service, "GreeterService", path));
        assert!(!registry.provides(&layer(3), ComponentKind::Helper, "GreeterService", path));

        let registration = registry
            .get(ComponentKind::Service, "GreeterService", 3)
            .expect("registered");
        assert_eq!(registration.capability, Capability::Service);
        assert_eq!(registration.dependencies, vec![Dependency::framework()]);
        assert!(!registration.extends);
    }
}

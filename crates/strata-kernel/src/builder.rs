//! Component construction.
//!
//! Two entry points with different injection depth:
//!
//! - [`AppHandle::get_component`] builds the resolved implementation from
//!   caller-supplied constructor arguments only.
//! - [`AppHandle::build_component`] additionally resolves every declared
//!   dependency by capability (framework handle, service, helper or model),
//!   reusing request-cached instances, and guards against cycles.
//!
//! Both construct the explicit override chain: a registration that
//! `extends` receives the constructed implementation of the next lower
//! layer as its parent.

use crate::app::AppHandle;
use crate::component::{ComponentDescriptor, ComponentKind};
use crate::controller::Controller;
use crate::error::{FrameworkError, Result};
use crate::layer::{GUEST_LAYER, LayerRank};
use crate::model::{MODEL_FACTORY, ModelFactory};
use crate::registry::{Capability, Construct, Dependency, Shared};
use crate::resolver::ResolveOptions;
use serde_json::Value;
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;
use tracing::debug;

/// Request-scoped construction state.
#[derive(Default)]
pub(crate) struct BuildState {
    cache: RefCell<BTreeMap<String, Shared>>,
    building: RefCell<Vec<String>>,
    model_factory: RefCell<Option<Rc<dyn ModelFactory>>>,
}

impl BuildState {
    /// Forget in-flight markers left behind by a failed build.
    pub(crate) fn reset_in_flight(&self) {
        self.building.borrow_mut().clear();
    }

    pub(crate) fn clear(&self) {
        self.cache.borrow_mut().clear();
        self.building.borrow_mut().clear();
        self.model_factory.borrow_mut().take();
    }
}

/// Downcast a built component to the handle type its consumer expects.
pub fn downcast<T: ?Sized + 'static>(shared: Shared, kind: ComponentKind, name: &str) -> Result<Rc<T>> {
    shared.get::<T>().ok_or_else(|| {
        FrameworkError::load(format!("{kind} {name} did not produce the expected type"))
    })
}

impl AppHandle {
    /// Build with dependency injection and cycle detection.
    pub fn build_component(
        &self,
        kind: ComponentKind,
        name: &str,
        layer: Option<LayerRank>,
        exact_layer_only: bool,
    ) -> Result<Shared> {
        let key = format!("{kind}{name}");
        {
            let building = self.build_state().building.borrow();
            if building.contains(&key) {
                let mut chain = building.join(" -> ");
                chain.push_str(" -> ");
                chain.push_str(&key);
                return Err(FrameworkError::CircularDependency { key, chain });
            }
        }

        let resolution = self.find_components(
            kind,
            name,
            ResolveOptions::at(layer).exact(exact_layer_only).collecting(),
        )?;
        if resolution.selected.is_none() {
            return Err(FrameworkError::not_found(kind, name));
        }
        self.build_state().building.borrow_mut().push(key.clone());
        let built = self.construct_chain(&resolution.chain, resolution.chain.len() - 1, &[], true)?;

        self.build_state()
            .cache
            .borrow_mut()
            .insert(name.to_string(), built.clone());
        self.build_state().building.borrow_mut().retain(|entry| entry != &key);
        Ok(built)
    }

    /// Build from explicit constructor arguments, without injection.
    pub fn get_component(
        &self,
        kind: ComponentKind,
        name: &str,
        args: Vec<Shared>,
        layer: Option<LayerRank>,
        exact_layer_only: bool,
    ) -> Result<Shared> {
        let resolution = self.find_components(
            kind,
            name,
            ResolveOptions::at(layer).exact(exact_layer_only).collecting(),
        )?;
        if resolution.selected.is_none() {
            return Err(FrameworkError::not_found(kind, name));
        }
        self.construct_chain(&resolution.chain, resolution.chain.len() - 1, &args, false)
    }

    pub fn build_controller(&self, name: &str) -> Result<Rc<dyn Controller>> {
        let shared = self.build_component(ComponentKind::Controller, name, None, false)?;
        downcast::<dyn Controller>(shared, ComponentKind::Controller, name)
    }

    pub fn build_service<T: ?Sized + 'static>(&self, name: &str) -> Result<Rc<T>> {
        let shared = self.build_component(ComponentKind::Service, name, None, false)?;
        downcast(shared, ComponentKind::Service, name)
    }

    pub fn build_helper<T: ?Sized + 'static>(&self, name: &str) -> Result<Rc<T>> {
        let shared = self.build_component(ComponentKind::Helper, name, None, false)?;
        downcast(shared, ComponentKind::Helper, name)
    }

    /// `get_service("Translator", ..)` builds `TranslatorService` with the
    /// handle as its first constructor argument.
    pub fn get_service<T: ?Sized + 'static>(&self, name: &str, args: Vec<Shared>) -> Result<Rc<T>> {
        let full = format!("{name}Service");
        let shared = self.get_component(ComponentKind::Service, &full, self.with_handle(args), None, false)?;
        downcast(shared, ComponentKind::Service, &full)
    }

    pub fn get_helper<T: ?Sized + 'static>(&self, name: &str, args: Vec<Shared>) -> Result<Rc<T>> {
        let full = format!("{name}Helper");
        let shared = self.get_component(ComponentKind::Helper, &full, self.with_handle(args), None, false)?;
        downcast(shared, ComponentKind::Helper, &full)
    }

    fn with_handle(&self, args: Vec<Shared>) -> Vec<Shared> {
        let mut full = Vec::with_capacity(args.len() + 1);
        full.push(Shared::new(Rc::new(self.clone())));
        full.extend(args);
        full
    }

    /// Build a model through the layered model factory.
    ///
    /// - explicit layer, no cache: a fresh factory at that layer
    /// - explicit layer, cache: a fresh factory that replaces the memoized one
    /// - authenticated request: the memoized factory at the request's layer
    /// - guest: a fresh factory at the guest layer
    pub fn get_model(
        &self,
        name: &str,
        args: Vec<Value>,
        layer: Option<LayerRank>,
        cache: bool,
    ) -> Result<Shared> {
        let connection_type = self.settings().model_connection(name).map(ToOwned::to_owned);
        let connection_type = connection_type.as_deref();

        if let Some(layer) = layer {
            let factory = self.model_factory_at(layer)?;
            if cache {
                *self.build_state().model_factory.borrow_mut() = Some(Rc::clone(&factory));
            }
            return factory.create(name, connection_type, args, layer);
        }

        if let Some(user_layer) = self.request().layer() {
            let memoized = self.build_state().model_factory.borrow().clone();
            let factory = match memoized {
                Some(factory) => factory,
                None => {
                    let factory = self.model_factory_at(user_layer)?;
                    *self.build_state().model_factory.borrow_mut() = Some(Rc::clone(&factory));
                    factory
                }
            };
            return factory.create(name, connection_type, args, user_layer);
        }

        let factory = self.model_factory_at(GUEST_LAYER)?;
        factory.create(name, connection_type, args, GUEST_LAYER)
    }

    /// Typed shorthand for [`AppHandle::get_model`] with defaults.
    pub fn model<T: ?Sized + 'static>(&self, name: &str) -> Result<Rc<T>> {
        let shared = self.get_model(name, Vec::new(), None, false)?;
        downcast(shared, ComponentKind::Model, name)
    }

    fn model_factory_at(&self, layer: LayerRank) -> Result<Rc<dyn ModelFactory>> {
        let shared = self.get_component(ComponentKind::Factory, MODEL_FACTORY, Vec::new(), Some(layer), false)?;
        downcast::<dyn ModelFactory>(shared, ComponentKind::Factory, MODEL_FACTORY)
    }

    /// A request-cached instance, by dependency or component name.
    pub fn cached(&self, name: &str) -> Option<Shared> {
        self.build_state().cache.borrow().get(name).cloned()
    }

    fn resolve_dependency(&self, dependency: &Dependency) -> Result<Shared> {
        if let Some(hit) = self.cached(&dependency.name) {
            return Ok(hit);
        }
        let name = dependency.name.as_str();
        let shared = match dependency.capability {
            Capability::Framework => Shared::new(Rc::new(self.clone())),
            Capability::Service => self.build_component(ComponentKind::Service, name, None, false)?,
            Capability::Helper => self.build_component(ComponentKind::Helper, name, None, false)?,
            Capability::Controller => {
                self.build_component(ComponentKind::Controller, name, None, false)?
            }
            Capability::Factory => self.get_component(ComponentKind::Factory, name, Vec::new(), None, false)?,
            Capability::Model => self.get_model(name, Vec::new(), None, false)?,
            Capability::View => {
                return Err(FrameworkError::load(format!(
                    "view {name} cannot be injected as a dependency"
                )));
            }
        };
        if dependency.capability != Capability::Model {
            self.build_state()
                .cache
                .borrow_mut()
                .insert(dependency.name.clone(), shared.clone());
        }
        Ok(shared)
    }

    /// Construct `chain[index]`, first constructing the implementations it
    /// extends.
    fn construct_chain(
        &self,
        chain: &[ComponentDescriptor],
        index: usize,
        args: &[Shared],
        inject: bool,
    ) -> Result<Shared> {
        let descriptor = &chain[index];
        let registration = self
            .registry()
            .get(descriptor.kind, &descriptor.name, descriptor.layer)
            .ok_or_else(|| {
                FrameworkError::load(format!(
                    "{} is not registered for {}",
                    descriptor.type_name(),
                    descriptor.path.display()
                ))
            })?;

        let parent = if registration.extends {
            if index == 0 {
                return Err(FrameworkError::load(format!(
                    "{} extends a parent but no eligible lower layer provides {}",
                    descriptor.type_name(),
                    descriptor.name
                )));
            }
            Some(self.construct_chain(chain, index - 1, args, inject)?)
        } else {
            None
        };

        let mut deps = BTreeMap::new();
        if inject {
            for dependency in &registration.dependencies {
                let shared = self.resolve_dependency(dependency)?;
                deps.insert(dependency.name.clone(), shared);
            }
        }

        debug!(
            component = %descriptor.type_name(),
            layer = descriptor.layer,
            deps = deps.len(),
            extends = registration.extends,
            "constructing component"
        );
        let construct = Construct::new(self, descriptor, deps, args.to_vec(), parent);
        (registration.factory)(&construct)
    }
}

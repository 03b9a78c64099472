//! The application handle and the top-level request runner.
//!
//! [`AppHandle`] is the explicit context every component receives at
//! construction: configuration, request state, the registry and the
//! request-scoped caches. [`App`] owns one handle per request and runs a
//! route through authentication and dispatch.

use crate::builder::BuildState;
use crate::component::ComponentKind;
use crate::config::{Config, ConfigPath, Settings};
use crate::dispatch::Dispatcher;
use crate::error::{FrameworkError, Result};
use crate::layer::{LayerRank, RoleRank};
use crate::model::{Connection, ConnectionOpener, JsonDirectoryOpener};
use crate::parent::CallStack;
use crate::registry::Registry;
use crate::report;
use crate::request::RequestContext;
use crate::resolver::{FsCatalog, ResolveOptions, Resolution, Resolver};
use crate::response::{Payload, Response};
use crate::route::{RouteInfo, RouteTarget};
use serde_json::Value;
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::path::{Component, Path, PathBuf};
use std::rc::Rc;
use tracing::{debug, info, info_span};
use uuid::Uuid;

/// Logical name of the service that authenticates requests.
pub const AUTH_SERVICE: &str = "AuthService";

/// Authentication collaborator. Implementations write the authenticated
/// layer, role and context through the handle they were built with and
/// may rewrite the route (e.g. to a login page).
pub trait Authenticator {
    fn authenticate_request(&self, route: RouteInfo) -> Result<RouteInfo>;
}

struct AppInner {
    config: Config,
    settings: Settings,
    registry: Registry,
    root: PathBuf,
    request: RequestContext,
    opener: Rc<dyn ConnectionOpener>,
    build: BuildState,
    connections: RefCell<BTreeMap<String, Rc<dyn Connection>>>,
    calls: CallStack,
}

#[derive(Clone)]
pub struct AppHandle {
    inner: Rc<AppInner>,
}

impl AppHandle {
    pub fn new(
        config: Config,
        registry: Registry,
        root: impl Into<PathBuf>,
        opener: Rc<dyn ConnectionOpener>,
    ) -> Result<Self> {
        let settings = Settings::from_config(&config)?;
        let calls = CallStack::new(settings.parent_call_helpers.clone());
        Ok(Self {
            inner: Rc::new(AppInner {
                config,
                settings,
                registry,
                root: root.into(),
                request: RequestContext::new(),
                opener,
                build: BuildState::default(),
                connections: RefCell::new(BTreeMap::new()),
                calls,
            }),
        })
    }

    pub fn config(&self) -> &Config {
        &self.inner.config
    }

    pub fn settings(&self) -> &Settings {
        &self.inner.settings
    }

    pub fn registry(&self) -> &Registry {
        &self.inner.registry
    }

    pub fn root(&self) -> &Path {
        &self.inner.root
    }

    pub fn request(&self) -> &RequestContext {
        &self.inner.request
    }

    pub fn calls(&self) -> &CallStack {
        &self.inner.calls
    }

    pub(crate) fn build_state(&self) -> &BuildState {
        &self.inner.build
    }

    pub fn get_config<'p>(&self, path: impl Into<ConfigPath<'p>>) -> Option<&Value> {
        self.inner.config.get(path)
    }

    pub fn brand_name(&self) -> Result<String> {
        self.inner
            .config
            .get_str("general.brandName")
            .filter(|brand| !brand.is_empty())
            .map(ToOwned::to_owned)
            .ok_or_else(|| FrameworkError::configuration("missing general.brandName"))
    }

    pub fn set_user_layer(&self, layer: LayerRank) -> bool {
        self.inner.request.set_layer(layer)
    }

    pub fn set_user_level(&self, level: RoleRank) -> bool {
        self.inner.request.set_role(level)
    }

    pub fn set_context(&self, key: impl Into<String>, value: Value) {
        self.inner.request.set_value(key, value);
    }

    pub fn context(&self, key: &str) -> Option<Value> {
        self.inner.request.value(key)
    }

    /// Resolve against the registry.
    pub fn find_components(
        &self,
        kind: ComponentKind,
        name: &str,
        options: ResolveOptions,
    ) -> Result<Resolution> {
        let default_layer = self.inner.request.authorized_layer();
        Resolver::new(&self.inner.settings, &self.inner.registry, default_layer)
            .find_files(kind, name, options)
    }

    /// Resolve against files under the installation root.
    pub fn find_files(
        &self,
        kind: ComponentKind,
        name: &str,
        options: ResolveOptions,
    ) -> Result<Resolution> {
        let default_layer = self.inner.request.authorized_layer();
        let catalog = FsCatalog::new(&self.inner.root);
        Resolver::new(&self.inner.settings, &catalog, default_layer).find_files(kind, name, options)
    }

    /// The connection to `database`, opened on first use in this request.
    pub fn connection(&self, database: &str) -> Result<Rc<dyn Connection>> {
        if let Some(open) = self.inner.connections.borrow().get(database) {
            return Ok(Rc::clone(open));
        }
        debug!(database, "opening connection");
        let connection = self.inner.opener.open(database)?;
        self.inner
            .connections
            .borrow_mut()
            .insert(database.to_string(), Rc::clone(&connection));
        Ok(connection)
    }

    pub fn open_connections(&self) -> Vec<String> {
        self.inner.connections.borrow().keys().cloned().collect()
    }

    /// Drop request-scoped caches. Cached components hold handle clones,
    /// so this also breaks those reference cycles.
    pub(crate) fn release(&self) {
        self.inner.build.clear();
        self.inner.connections.borrow_mut().clear();
        self.inner.calls.clear();
    }
}

/// One request's worth of framework.
pub struct App {
    handle: AppHandle,
}

impl App {
    /// Connections read JSON tables under `{root}/databases`.
    pub fn new(config: Config, registry: Registry, root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        let opener = Rc::new(JsonDirectoryOpener::new(&root));
        Self::with_opener(config, registry, root, opener)
    }

    pub fn with_opener(
        config: Config,
        registry: Registry,
        root: impl Into<PathBuf>,
        opener: Rc<dyn ConnectionOpener>,
    ) -> Result<Self> {
        Ok(Self {
            handle: AppHandle::new(config, registry, root, opener)?,
        })
    }

    pub fn handle(&self) -> &AppHandle {
        &self.handle
    }

    /// Run one route. Every failure is reported before it is returned.
    pub fn run(&self, route: RouteInfo) -> Result<Response> {
        let request_id = Uuid::new_v4();
        let span = info_span!("request", %request_id, kind = %route.kind);
        let _entered = span.enter();
        info!(controller = %route.controller, action = %route.action, "request started");

        match self.handle_route(route) {
            Ok(response) => {
                info!(status = response.status, "request finished");
                Ok(response)
            }
            Err(err) => {
                self.report_failure(&err);
                Err(err)
            }
        }
    }

    fn handle_route(&self, route: RouteInfo) -> Result<Response> {
        self.handle.build_state().reset_in_flight();
        self.prepare_debugging();
        let authenticator = self.handle.build_service::<dyn Authenticator>(AUTH_SERVICE)?;
        let route = authenticator.authenticate_request(route)?;

        match route.target()? {
            RouteTarget::Action {
                controller,
                action,
                params,
            } => {
                let mut response = Dispatcher::new(&self.handle).dispatch(controller, action, params)?;
                self.locate_template(&mut response);
                Ok(response)
            }
            RouteTarget::LegacyScript { path, name } => {
                let relative = Path::new(path);
                let inside_root = relative
                    .components()
                    .all(|part| matches!(part, Component::Normal(_) | Component::CurDir));
                let script = self.handle.root().join(relative);
                if inside_root && script.is_file() {
                    Ok(Response::file(script))
                } else {
                    Err(FrameworkError::LegacyScriptNotFound(name.to_string()))
                }
            }
        }
    }

    /// Impersonation from the debug panel. Runs before authentication, so
    /// the write-once layer and role win over the authenticator's writes.
    fn prepare_debugging(&self) {
        let impersonation = &self.handle.settings().debug;
        if !impersonation.impersonating() {
            return;
        }
        if let Some(layer) = impersonation.fixed_user_layer {
            self.handle.set_user_layer(layer);
        }
        if let Some(level) = impersonation.fixed_user_level {
            self.handle.set_user_level(level);
        }
        debug!(
            layer = ?impersonation.fixed_user_layer,
            level = ?impersonation.fixed_user_level,
            "impersonating"
        );
    }

    fn locate_template(&self, response: &mut Response) {
        let Payload::View(view) = &mut response.payload else {
            return;
        };
        if view.template_path.is_some() {
            return;
        }
        match self
            .handle
            .find_files(ComponentKind::View, &view.template, ResolveOptions::at(view.layer))
        {
            Ok(resolution) => {
                view.template_path = resolution
                    .selected
                    .map(|descriptor| self.handle.root().join(descriptor.path));
            }
            Err(err) => debug!(template = %view.template, %err, "template lookup skipped"),
        }
    }

    fn report_failure(&self, err: &FrameworkError) {
        let settings = self.handle.settings();
        let frames = self.handle.calls().take_failure_trace();
        let text = report::render(err, &frames, settings.log_arg_length_limit, chrono::Local::now());
        let log_file = settings
            .error_log_path
            .as_deref()
            .map(|path| self.handle.root().join(path.trim_start_matches('/')));
        report::emit(&text, log_file.as_deref());
    }
}

impl Drop for App {
    fn drop(&mut self) {
        self.handle.release();
    }
}

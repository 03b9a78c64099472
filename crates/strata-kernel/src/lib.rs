//! # Strata Kernel
//!
//! Layered component resolution and role-aware dispatch.
//!
//! The same logical component name can be implemented once per
//! installation layer. A request resolves the most specific implementation
//! at or below its authorized layer, builds it with its declared
//! dependencies, and dispatches an action by the caller's role. A layer
//! implementation reaches the one it overrides through an explicit parent
//! chain.
//!
//! ## Architecture
//!
//! ```text
//! Config / Settings      ← settings tree, typed section views
//!     │
//! Resolver               ← (kind, name, authorized layer) → descriptor(s)
//!     │
//! Registry               ← (kind, name, layer) → factory + dependencies
//!     │
//! Builder (AppHandle)    ← dependency injection, cycle guard, model factory
//!     │
//! Dispatcher             ← four role strategies over controllers
//!     │
//! CallStack              ← frames for call_parent through the override chain
//!     │
//! App::run               ← authenticate, dispatch, report failures
//! ```
//!
//! Execution is single-threaded and request-scoped: one [`App`] serves one
//! request and owns every cache used while serving it.

pub mod app;
pub mod builder;
pub mod component;
pub mod config;
pub mod controller;
pub mod dispatch;
pub mod error;
pub mod layer;
pub mod model;
pub mod parent;
pub mod registry;
pub mod report;
pub mod request;
pub mod resolver;
pub mod response;
pub mod route;

pub use app::{AUTH_SERVICE, App, AppHandle, Authenticator};
pub use builder::downcast;
pub use component::{ComponentDescriptor, ComponentKind};
pub use config::{Config, ConfigPath, DebugSettings, Settings};
pub use controller::{ActionHandler, ActionTable, Controller, LayeredController, find_declaring};
pub use dispatch::{Dispatcher, Strategy};
pub use error::{FrameworkError, Result};
pub use layer::{GUEST_LAYER, Layer, LayerRank, LayerStack, RoleRank, RoleTable};
pub use model::{
    Connection, ConnectionModelFactory, ConnectionOpener, JsonDirectoryOpener, MODEL_FACTORY,
    MemoryOpener, ModelFactory, Table, open_model,
};
pub use parent::{ActionCall, CallStack, FrameSnapshot};
pub use registry::{Capability, Construct, Dependency, Registry, Shared};
pub use request::{Principal, RequestContext};
pub use resolver::{ComponentCatalog, FsCatalog, ResolveOptions, Resolution, Resolver};
pub use response::{Payload, Response, ViewModel};
pub use route::{RouteInfo, RouteTarget};

use super::LAYER;
use crate::contracts::{Context, Translator};
use crate::{USER_SESSION, framework};
use serde_json::{Value, json};
use std::rc::Rc;
use strata_kernel::route::MVC_ACTION;
use strata_kernel::{
    AppHandle, Authenticator, ComponentKind, Dependency, FrameworkError, LayerRank, Registry,
    Result, RoleRank, RouteInfo, Table, downcast,
};
use tracing::debug;

pub struct TranslatorService {
    handle: AppHandle,
}

impl Translator for TranslatorService {
    fn translate(&self, key: &str, replacements: &[&str]) -> String {
        let template = self
            .handle
            .config()
            .get_str(["translations", key])
            .unwrap_or(key)
            .to_string();
        replacements
            .iter()
            .enumerate()
            .fold(template, |text, (i, value)| text.replace(&format!("{{{i}}}"), value))
    }
}

pub struct ContextService {
    handle: AppHandle,
}

impl Context for ContextService {
    fn get(&self, key: &str) -> Option<Value> {
        self.handle.context(key)
    }
}

/// Reads the signed-in user from the request context, verifies its
/// session and records layer and role. Guests are sent to the login page
/// unless the controller is public.
pub struct AuthService {
    handle: AppHandle,
}

impl AuthService {
    fn guest_route(&self, route: RouteInfo) -> RouteInfo {
        if route.kind != MVC_ACTION {
            return route;
        }
        let public = self
            .handle
            .get_config("auth.public_controllers")
            .and_then(Value::as_array)
            .is_some_and(|names| {
                names
                    .iter()
                    .any(|name| name.as_str() == Some(route.controller.as_str()))
            });
        if public {
            route
        } else {
            debug!(controller = %route.controller, "guest redirected to login");
            RouteInfo::action("AuthController", "showLogin", Vec::new())
        }
    }

    fn verify_session(&self, token: &str, layer: LayerRank) -> Result<()> {
        let shared = self.handle.get_model(USER_SESSION, Vec::new(), Some(layer), false)?;
        let sessions = downcast::<Table>(shared, ComponentKind::Model, USER_SESSION)?;
        let active = sessions
            .find_by("token", &json!(token))?
            .iter()
            .any(|row| row.get("active") == Some(&Value::Bool(true)));
        if active {
            Ok(())
        } else {
            Err(FrameworkError::action(401, "session expired"))
        }
    }
}

/// A rank from the user record. Missing or out-of-range values read as `0`.
fn rank(user: &Value, key: &str) -> u32 {
    user.get(key)
        .and_then(Value::as_u64)
        .and_then(|n| u32::try_from(n).ok())
        .unwrap_or(0)
}

impl Authenticator for AuthService {
    fn authenticate_request(&self, route: RouteInfo) -> Result<RouteInfo> {
        let Some(user) = self.handle.context("user") else {
            if self.handle.request().layer().is_some() {
                return Ok(route);
            }
            return Ok(self.guest_route(route));
        };
        let layer: LayerRank = rank(&user, "layer");
        let level: RoleRank = rank(&user, "level");
        if layer == 0 {
            return Ok(self.guest_route(route));
        }
        if let Some(token) = user.get("session_token").and_then(Value::as_str) {
            self.verify_session(token, layer)?;
        }
        self.handle.set_user_layer(layer);
        self.handle.set_user_level(level);
        debug!(layer, level, "request authenticated");
        Ok(route)
    }
}

pub(super) fn register(registry: &mut Registry) {
    registry
        .register(ComponentKind::Service, "TranslatorService", LAYER)
        .depends_on(Dependency::framework())
        .provide::<dyn Translator>(|c| {
            Ok(Rc::new(TranslatorService {
                handle: framework(c)?,
            }))
        });

    registry
        .register(ComponentKind::Service, "ContextService", LAYER)
        .depends_on(Dependency::framework())
        .provide::<dyn Context>(|c| {
            Ok(Rc::new(ContextService {
                handle: framework(c)?,
            }))
        });

    registry
        .register(ComponentKind::Service, strata_kernel::AUTH_SERVICE, LAYER)
        .depends_on(Dependency::framework())
        .provide::<dyn Authenticator>(|c| {
            Ok(Rc::new(AuthService {
                handle: framework(c)?,
            }))
        });
}

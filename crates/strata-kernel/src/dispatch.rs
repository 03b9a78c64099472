//! Role-aware action dispatch.
//!
//! Four strategies are tried in order; the first match runs:
//!
//! 1. role-specialized controller `{Controller}_{RoleSuffix}`, action `{action}`
//! 2. default controller, action `{action}_{RoleSuffix}`
//! 3. default controller, actions of lower roles (opt-in per controller)
//! 4. default controller, action `{action}`
//!
//! A missing specialized controller is a soft signal to continue. Any other
//! failure, including one raised inside an invoked action, propagates.

use crate::app::AppHandle;
use crate::component::ComponentKind;
use crate::controller::has_action;
use crate::error::{FrameworkError, Result};
use crate::response::Response;
use serde_json::Value;
use tracing::debug;

/// Which strategy produced the response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    SpecializedController,
    SpecializedAction,
    LowerRoleFallback,
    DefaultAction,
}

pub struct Dispatcher<'a> {
    handle: &'a AppHandle,
}

impl<'a> Dispatcher<'a> {
    pub fn new(handle: &'a AppHandle) -> Self {
        Self { handle }
    }

    pub fn dispatch(&self, controller: &str, action: &str, params: &[Value]) -> Result<Response> {
        self.dispatch_traced(controller, action, params)
            .map(|(response, _)| response)
    }

    pub fn dispatch_traced(
        &self,
        controller_name: &str,
        action: &str,
        params: &[Value],
    ) -> Result<(Response, Strategy)> {
        let role = self.handle.request().role();
        let settings = self.handle.settings();
        let role_suffix = settings.role_suffix(role).unwrap_or_default();
        let calls = self.handle.calls();

        if !role_suffix.is_empty() {
            let specialized = format!("{controller_name}_{role_suffix}");
            match self.handle.build_controller(&specialized) {
                Ok(controller) if has_action(&controller, action) => {
                    debug!(controller = %specialized, action, "dispatching to role controller");
                    let response = calls.invoke(&controller, action, params.to_vec())?;
                    return Ok((response, Strategy::SpecializedController));
                }
                Ok(_) => {
                    debug!(controller = %specialized, action, "role controller lacks action");
                }
                Err(err) if err.is_missing(ComponentKind::Controller, &specialized) => {}
                Err(err) => return Err(err),
            }
        }

        let controller = self.handle.build_controller(controller_name)?;

        if !role_suffix.is_empty() {
            let specialized = format!("{action}_{role_suffix}");
            if has_action(&controller, &specialized) {
                debug!(controller = controller_name, action = %specialized, "dispatching to role action");
                let response = calls.invoke(&controller, &specialized, params.to_vec())?;
                return Ok((response, Strategy::SpecializedAction));
            }
        }

        if controller.use_user_level_fallback() {
            // Gated on the current role's suffix, not the fallback role's.
            for level in (1..role).rev() {
                let fallback_suffix = settings.role_suffix(level).unwrap_or_default();
                let candidate = format!("{action}_{fallback_suffix}");
                if !role_suffix.is_empty() && has_action(&controller, &candidate) {
                    debug!(controller = controller_name, action = %candidate, level, "dispatching to lower role action");
                    let response = calls.invoke(&controller, &candidate, params.to_vec())?;
                    return Ok((response, Strategy::LowerRoleFallback));
                }
            }
        }

        if has_action(&controller, action) {
            let response = calls.invoke(&controller, action, params.to_vec())?;
            return Ok((response, Strategy::DefaultAction));
        }

        Err(FrameworkError::ActionNotFound {
            controller: controller_name.to_string(),
            action: action.to_string(),
        })
    }
}

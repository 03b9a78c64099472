//! Routing input produced by the external router.

use crate::error::{FrameworkError, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const MVC_ACTION: &str = "mvc_action";
pub const LEGACY_SCRIPT: &str = "legacy_script";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RouteInfo {
    #[serde(rename = "type")]
    pub kind: String,
    pub controller: String,
    pub action: String,
    pub params: Vec<Value>,
    pub script_path: String,
    pub script_name: String,
}

/// A route after its type has been checked.
#[derive(Debug, Clone, PartialEq)]
pub enum RouteTarget<'a> {
    Action {
        controller: &'a str,
        action: &'a str,
        params: &'a [Value],
    },
    LegacyScript {
        path: &'a str,
        name: &'a str,
    },
}

impl RouteInfo {
    pub fn action(
        controller: impl Into<String>,
        action: impl Into<String>,
        params: Vec<Value>,
    ) -> Self {
        Self {
            kind: MVC_ACTION.to_string(),
            controller: controller.into(),
            action: action.into(),
            params,
            ..Self::default()
        }
    }

    pub fn legacy(script_path: impl Into<String>, script_name: impl Into<String>) -> Self {
        Self {
            kind: LEGACY_SCRIPT.to_string(),
            script_path: script_path.into(),
            script_name: script_name.into(),
            ..Self::default()
        }
    }

    pub fn target(&self) -> Result<RouteTarget<'_>> {
        match self.kind.as_str() {
            MVC_ACTION => Ok(RouteTarget::Action {
                controller: &self.controller,
                action: &self.action,
                params: &self.params,
            }),
            LEGACY_SCRIPT => Ok(RouteTarget::LegacyScript {
                path: &self.script_path,
                name: &self.script_name,
            }),
            other => Err(FrameworkError::UnknownRouteType(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn route_deserializes_from_router_shape() {
        let route: RouteInfo = serde_json::from_value(json!({
            "type": "mvc_action",
            "controller": "DashboardController",
            "action": "show",
            "params": ["sales"]
        }))
        .expect("router shape");
        assert_eq!(
            route.target().expect("known type"),
            RouteTarget::Action {
                controller: "DashboardController",
                action: "show",
                params: &[json!("sales")],
            }
        );
    }

    #[test]
    fn unknown_route_type_is_rejected() {
        let route = RouteInfo {
            kind: "websocket".to_string(),
            ..RouteInfo::default()
        };
        let err = route.target().expect_err("unknown type");
        assert_eq!(err.status(), 500);
        assert_eq!(err.to_string(), "unknown route type: 'websocket'");
    }
}

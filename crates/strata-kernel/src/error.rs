//! Error types for Strata kernel operations.

use crate::component::ComponentKind;

/// Errors raised while resolving, building or dispatching components.
#[derive(Debug, thiserror::Error)]
pub enum FrameworkError {
    /// The settings tree is missing a required section or is malformed.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The component kind has no configured subdirectory.
    #[error("unknown component kind: {0}")]
    UnknownKind(String),

    /// No eligible layer provides the requested component.
    #[error("{kind} not found: {name}")]
    NotFound { kind: ComponentKind, name: String },

    /// No dispatch strategy found an action for the route.
    #[error("action not found for route: {controller}->{action}")]
    ActionNotFound { controller: String, action: String },

    /// A component was requested again while it was still being built.
    #[error("circular dependency detected for component: {key}\ncurrent build stack: {chain}")]
    CircularDependency { key: String, chain: String },

    /// A component resolved but did not produce the expected type.
    #[error("load error: {0}")]
    Load(String),

    /// The parent-call chain could not identify a caller, parent or method.
    #[error("logic error: {0}")]
    Logic(String),

    /// A legacy route pointed at a script that does not exist.
    #[error("legacy script not found: {0}")]
    LegacyScriptNotFound(String),

    /// The router produced a route type the runner does not understand.
    #[error("unknown route type: '{0}'")]
    UnknownRouteType(String),

    /// A failure raised by business code inside an invoked action.
    #[error("{message}")]
    Action { status: u16, message: String },

    #[error("failed to parse TOML settings: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("failed to parse JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl FrameworkError {
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    pub fn not_found(kind: ComponentKind, name: impl Into<String>) -> Self {
        Self::NotFound {
            kind,
            name: name.into(),
        }
    }

    pub fn load(message: impl Into<String>) -> Self {
        Self::Load(message.into())
    }

    pub fn logic(message: impl Into<String>) -> Self {
        Self::Logic(message.into())
    }

    /// An error raised from inside an action body with an explicit status.
    pub fn action(status: u16, message: impl Into<String>) -> Self {
        Self::Action {
            status,
            message: message.into(),
        }
    }

    /// HTTP-class status for the response boundary.
    pub fn status(&self) -> u16 {
        match self {
            Self::NotFound { .. } | Self::ActionNotFound { .. } | Self::LegacyScriptNotFound(_) => {
                404
            }
            Self::Action { status, .. } => *status,
            _ => 500,
        }
    }

    /// Whether this failure belongs to the not-found family.
    pub fn is_not_found(&self) -> bool {
        self.status() == 404 && !matches!(self, Self::Action { .. })
    }

    /// Whether this is the not-found failure for one specific component.
    pub fn is_missing(&self, kind: ComponentKind, name: &str) -> bool {
        matches!(self, Self::NotFound { kind: k, name: n } if *k == kind && n == name)
    }

    /// Stable variant name used in failure reports.
    pub fn variant_name(&self) -> &'static str {
        match self {
            Self::Configuration(_) => "ConfigurationError",
            Self::UnknownKind(_) => "ConfigurationError",
            Self::NotFound { .. } => "NotFoundError",
            Self::ActionNotFound { .. } => "NotFoundError",
            Self::CircularDependency { .. } => "CircularDependencyError",
            Self::Load(_) => "LoadError",
            Self::Logic(_) => "LogicError",
            Self::LegacyScriptNotFound(_) => "NotFoundError",
            Self::UnknownRouteType(_) => "RoutingError",
            Self::Action { .. } => "ActionError",
            Self::Toml(_) | Self::Json(_) => "ConfigurationError",
            Self::Io(_) => "IoError",
        }
    }
}

pub type Result<T, E = FrameworkError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_family_maps_to_404() {
        let err = FrameworkError::not_found(ComponentKind::Controller, "Report_Manager");
        assert_eq!(err.status(), 404);
        assert!(err.is_not_found());
        assert!(err.is_missing(ComponentKind::Controller, "Report_Manager"));
        assert!(!err.is_missing(ComponentKind::Service, "Report_Manager"));

        let err = FrameworkError::ActionNotFound {
            controller: "Report".to_string(),
            action: "show".to_string(),
        };
        assert_eq!(err.status(), 404);
        assert_eq!(err.to_string(), "action not found for route: Report->show");
    }

    #[test]
    fn action_errors_keep_their_status_and_are_not_soft() {
        let err = FrameworkError::action(404, "no such vehicle");
        assert_eq!(err.status(), 404);
        assert!(!err.is_not_found());

        let err = FrameworkError::CircularDependency {
            key: "serviceA".to_string(),
            chain: "serviceA -> serviceB -> serviceA".to_string(),
        };
        assert_eq!(err.status(), 500);
        assert_eq!(err.variant_name(), "CircularDependencyError");
    }
}

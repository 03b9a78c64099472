//! Component kinds and resolved component descriptors.
//!
//! A component is addressed by its kind and logical name. The resolver turns
//! that pair into a [`ComponentDescriptor`] naming the layer whose
//! implementation answers the request.

use crate::layer::LayerRank;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Classification of layered components.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum ComponentKind {
    Controller,
    Service,
    Model,
    Helper,
    View,
    Factory,
}

impl ComponentKind {
    pub const ALL: [ComponentKind; 6] = [
        ComponentKind::Controller,
        ComponentKind::Service,
        ComponentKind::Model,
        ComponentKind::Helper,
        ComponentKind::View,
        ComponentKind::Factory,
    ];

    /// Key used in the `component_types` settings section.
    pub fn as_str(&self) -> &'static str {
        match self {
            ComponentKind::Controller => "controller",
            ComponentKind::Service => "service",
            ComponentKind::Model => "model",
            ComponentKind::Helper => "helper",
            ComponentKind::View => "view",
            ComponentKind::Factory => "factory",
        }
    }

    /// File extension used when no `component_extensions` override exists.
    pub fn default_extension(&self) -> &'static str {
        match self {
            ComponentKind::View => "xsl",
            _ => "rs",
        }
    }
}

impl fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ComponentKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ComponentKind::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown component kind: {s}"))
    }
}

/// Resolved metadata identifying which layer answers a component request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentDescriptor {
    pub kind: ComponentKind,
    pub name: String,
    /// `{layerDirectory}/{subdirectory}/{name}.{ext}`, relative to the install root.
    pub path: PathBuf,
    pub suffix: String,
    pub layer: LayerRank,
}

impl ComponentDescriptor {
    /// Concrete per-layer type name: `{name}_{suffix}`.
    pub fn type_name(&self) -> String {
        format!("{}_{}", self.name, self.suffix)
    }
}

impl fmt::Display for ComponentDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.type_name(), self.path.display())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_parses_case_insensitively() {
        assert_eq!("Controller".parse::<ComponentKind>(), Ok(ComponentKind::Controller));
        assert_eq!("view".parse::<ComponentKind>(), Ok(ComponentKind::View));
        assert!("widget".parse::<ComponentKind>().is_err());
    }

    #[test]
    fn type_name_joins_name_and_layer_suffix() {
        let descriptor = ComponentDescriptor {
            kind: ComponentKind::Controller,
            name: "EmissionsController".to_string(),
            path: PathBuf::from("3audi/controllers/EmissionsController.rs"),
            suffix: "3Audi".to_string(),
            layer: 3,
        };
        assert_eq!(descriptor.type_name(), "EmissionsController_3Audi");
    }
}

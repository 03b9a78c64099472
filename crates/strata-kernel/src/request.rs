//! Request-scoped state: authenticated layer and role, plus free-form context.
//!
//! Layer and role are write-once. The first write wins for the lifetime of
//! the request; later writes are logged and ignored.

use crate::layer::{GUEST_LAYER, LayerRank, RoleRank};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::cell::{OnceCell, RefCell};
use std::collections::BTreeMap;

/// Immutable snapshot of who the request runs as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Principal {
    /// `None` for a guest.
    pub layer: Option<LayerRank>,
    pub role: RoleRank,
}

impl Principal {
    pub fn authorized_layer(&self) -> LayerRank {
        self.layer.unwrap_or(GUEST_LAYER)
    }

    pub fn is_authenticated(&self) -> bool {
        self.layer.is_some()
    }
}

#[derive(Debug, Default)]
pub struct RequestContext {
    layer: OnceCell<LayerRank>,
    role: OnceCell<RoleRank>,
    values: RefCell<BTreeMap<String, Value>>,
}

impl RequestContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the authenticated layer. Returns whether this write took effect.
    ///
    /// Rank `0` means "unauthenticated" and is never stored.
    pub fn set_layer(&self, layer: LayerRank) -> bool {
        if layer == 0 {
            return false;
        }
        match self.layer.set(layer) {
            Ok(()) => true,
            Err(rejected) => {
                tracing::warn!(
                    current = self.layer.get().copied(),
                    rejected,
                    "layer already set for this request; ignoring"
                );
                false
            }
        }
    }

    /// Set the role rank. Returns whether this write took effect.
    pub fn set_role(&self, role: RoleRank) -> bool {
        match self.role.set(role) {
            Ok(()) => true,
            Err(rejected) => {
                tracing::warn!(
                    current = self.role.get().copied(),
                    rejected,
                    "role already set for this request; ignoring"
                );
                false
            }
        }
    }

    pub fn layer(&self) -> Option<LayerRank> {
        self.layer.get().copied()
    }

    /// The authenticated layer, or the guest layer when none is set.
    pub fn authorized_layer(&self) -> LayerRank {
        self.layer().unwrap_or(GUEST_LAYER)
    }

    pub fn role(&self) -> RoleRank {
        self.role.get().copied().unwrap_or(0)
    }

    pub fn principal(&self) -> Principal {
        Principal {
            layer: self.layer(),
            role: self.role(),
        }
    }

    pub fn set_value(&self, key: impl Into<String>, value: Value) {
        self.values.borrow_mut().insert(key.into(), value);
    }

    pub fn value(&self, key: &str) -> Option<Value> {
        self.values.borrow().get(key).cloned()
    }

    /// Look up a dotted path below a context key, e.g. `user.id_dealer`.
    pub fn lookup(&self, path: &str) -> Option<Value> {
        let mut segments = path.split('.');
        let head = segments.next()?;
        let values = self.values.borrow();
        let mut current = values.get(head)?;
        for segment in segments {
            current = match current {
                Value::Object(map) => map.get(segment)?,
                Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
                _ => return None,
            };
        }
        Some(current.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn layer_and_role_are_write_once() {
        let request = RequestContext::new();
        assert_eq!(request.authorized_layer(), GUEST_LAYER);
        assert!(request.set_layer(3));
        assert!(!request.set_layer(1));
        assert!(request.set_role(2));
        assert!(!request.set_role(0));
        assert_eq!(
            request.principal(),
            Principal {
                layer: Some(3),
                role: 2
            }
        );
    }

    #[test]
    fn zero_layer_leaves_the_request_unauthenticated() {
        let request = RequestContext::new();
        assert!(!request.set_layer(0));
        assert!(!request.principal().is_authenticated());
        assert!(request.set_layer(1));
    }

    #[test]
    fn lookup_walks_nested_context_values() {
        let request = RequestContext::new();
        request.set_value("user", json!({"id_dealer": 714, "roles": ["a", "b"]}));
        assert_eq!(request.lookup("user.id_dealer"), Some(json!(714)));
        assert_eq!(request.lookup("user.roles.1"), Some(json!("b")));
        assert_eq!(request.lookup("user.missing"), None);
    }
}

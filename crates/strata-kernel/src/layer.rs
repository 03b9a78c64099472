//! Installation layers (vertical axis) and user roles (horizontal axis).
//!
//! Layers are totally ordered from most generic (lowest rank) to most
//! specific (highest rank). A user's authorized layer is an upper bound on
//! what the resolver may return. Roles specialize within a layer and are
//! independent of it.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Rank of an installation layer. Higher is more specific.
pub type LayerRank = u32;

/// Rank of a user role. `0` means "no role".
pub type RoleRank = u32;

/// Rank used when a request carries no authenticated layer.
pub const GUEST_LAYER: LayerRank = 1;

/// One installation tier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Layer {
    pub layer: LayerRank,
    pub directory: String,
    pub suffix: String,
}

/// The configured layers, held most specific first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LayerStack {
    layers: Vec<Layer>,
}

impl LayerStack {
    /// Build a stack from unordered layers. Ranks must be unique.
    pub fn new(mut layers: Vec<Layer>) -> Result<Self, String> {
        let mut seen = BTreeSet::new();
        for layer in &layers {
            if !seen.insert(layer.layer) {
                return Err(format!("duplicate layer rank {}", layer.layer));
            }
            if layer.directory.trim().is_empty() {
                return Err(format!("layer {} has an empty directory", layer.layer));
            }
        }
        layers.sort_by(|a, b| b.layer.cmp(&a.layer));
        Ok(Self { layers })
    }

    /// Layers in descending specificity.
    pub fn descending(&self) -> impl Iterator<Item = &Layer> {
        self.layers.iter()
    }

    pub fn most_specific(&self) -> Option<&Layer> {
        self.layers.first()
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }
}

/// Mapping from role rank to the suffix used for role-specialized names.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoleTable {
    suffixes: BTreeMap<RoleRank, String>,
}

impl RoleTable {
    pub fn new(suffixes: BTreeMap<RoleRank, String>) -> Self {
        Self { suffixes }
    }

    /// Suffix for a role rank. Rank `0` and unmapped ranks have none.
    pub fn suffix(&self, rank: RoleRank) -> Option<&str> {
        if rank == 0 {
            return None;
        }
        self.suffixes.get(&rank).map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layer(rank: LayerRank, directory: &str, suffix: &str) -> Layer {
        Layer {
            layer: rank,
            directory: directory.to_string(),
            suffix: suffix.to_string(),
        }
    }

    #[test]
    fn stack_orders_most_specific_first() {
        let stack = LayerStack::new(vec![
            layer(1, "1base", "Base"),
            layer(3, "3audi", "3Audi"),
            layer(2, "2group", "Group"),
        ])
        .expect("valid layers");
        let ranks: Vec<LayerRank> = stack.descending().map(|l| l.layer).collect();
        assert_eq!(ranks, vec![3, 2, 1]);
        assert_eq!(stack.most_specific().map(|l| l.suffix.as_str()), Some("3Audi"));
    }

    #[test]
    fn stack_rejects_duplicate_ranks() {
        let err = LayerStack::new(vec![layer(1, "a", "A"), layer(1, "b", "B")])
            .expect_err("duplicate ranks must fail");
        assert!(err.contains("duplicate layer rank 1"));
    }

    #[test]
    fn role_zero_and_unmapped_ranks_have_no_suffix() {
        let roles = RoleTable::new(BTreeMap::from([
            (1, "Seller".to_string()),
            (2, "Manager".to_string()),
        ]));
        assert_eq!(roles.suffix(0), None);
        assert_eq!(roles.suffix(2), Some("Manager"));
        assert_eq!(roles.suffix(7), None);
    }
}

//! Layer resolution: which installation layer answers a component request.
//!
//! Layers are scanned most specific first. A layer above the authorized
//! layer is never eligible. The first match is the selected descriptor; when
//! every match is collected, the chain is returned most generic first so a
//! specific implementation can be constructed on top of the generic ones.

use crate::component::{ComponentDescriptor, ComponentKind};
use crate::config::Settings;
use crate::error::{FrameworkError, Result};
use crate::layer::{Layer, LayerRank};
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tracing::debug;

/// Probe answering "does this layer provide this component".
pub trait ComponentCatalog {
    fn provides(&self, layer: &Layer, kind: ComponentKind, name: &str, relative: &Path) -> bool;
}

/// Catalog backed by files under an installation root.
#[derive(Debug, Clone)]
pub struct FsCatalog {
    root: PathBuf,
}

impl FsCatalog {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl ComponentCatalog for FsCatalog {
    fn provides(&self, layer: &Layer, _kind: ComponentKind, _name: &str, relative: &Path) -> bool {
        self.root.join(&layer.directory).join(relative).is_file()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResolveOptions {
    /// Upper bound on eligible layers. `None` uses the request's layer.
    pub authorized_layer: Option<LayerRank>,
    /// Only the authorized layer itself is eligible.
    pub exact_layer_only: bool,
    /// Keep scanning after the first match and return every match.
    pub collect_all: bool,
}

impl ResolveOptions {
    pub fn at(layer: Option<LayerRank>) -> Self {
        Self {
            authorized_layer: layer,
            ..Self::default()
        }
    }

    pub fn exact(mut self, exact: bool) -> Self {
        self.exact_layer_only = exact;
        self
    }

    pub fn collecting(mut self) -> Self {
        self.collect_all = true;
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Resolution {
    /// Most specific eligible match.
    pub selected: Option<ComponentDescriptor>,
    /// Every eligible match, most generic first. Only filled when collecting.
    pub chain: Vec<ComponentDescriptor>,
}

impl Resolution {
    pub fn require(self, kind: ComponentKind, name: &str) -> Result<ComponentDescriptor> {
        self.selected
            .ok_or_else(|| FrameworkError::not_found(kind, name))
    }
}

pub struct Resolver<'a> {
    settings: &'a Settings,
    catalog: &'a dyn ComponentCatalog,
    default_layer: LayerRank,
}

impl<'a> Resolver<'a> {
    pub fn new(
        settings: &'a Settings,
        catalog: &'a dyn ComponentCatalog,
        default_layer: LayerRank,
    ) -> Self {
        Self {
            settings,
            catalog,
            default_layer,
        }
    }

    /// Relative path of a component inside any layer directory.
    pub fn relative_path(&self, kind: ComponentKind, name: &str) -> Result<PathBuf> {
        let subdir = self.settings.component_subdir(kind)?;
        let ext = self.settings.extension(kind);
        Ok(PathBuf::from(subdir).join(format!("{name}.{ext}")))
    }

    pub fn find_files(
        &self,
        kind: ComponentKind,
        name: &str,
        options: ResolveOptions,
    ) -> Result<Resolution> {
        let relative = self.relative_path(kind, name)?;
        if !is_valid_name(name) {
            debug!(%kind, name, "rejecting invalid component name");
            return Ok(Resolution::default());
        }
        let authorized = options.authorized_layer.unwrap_or(self.default_layer);

        let mut resolution = Resolution::default();
        for layer in self.settings.layers.descending() {
            if layer.layer > authorized {
                continue;
            }
            if options.exact_layer_only && layer.layer != authorized {
                continue;
            }
            if self.catalog.provides(layer, kind, name, &relative) {
                let descriptor = ComponentDescriptor {
                    kind,
                    name: name.to_string(),
                    path: PathBuf::from(&layer.directory).join(&relative),
                    suffix: layer.suffix.clone(),
                    layer: layer.layer,
                };
                if options.collect_all {
                    resolution.chain.push(descriptor.clone());
                }
                if resolution.selected.is_none() {
                    resolution.selected = Some(descriptor);
                }
                if !options.collect_all {
                    break;
                }
                continue;
            }
            if options.exact_layer_only {
                break;
            }
        }
        resolution.chain.reverse();

        match &resolution.selected {
            Some(descriptor) => debug!(
                %kind,
                name,
                authorized,
                layer = descriptor.layer,
                chain = resolution.chain.len(),
                "resolved component"
            ),
            None => debug!(%kind, name, authorized, "no eligible layer provides component"),
        }
        Ok(resolution)
    }
}

/// Logical names are identifiers: they become path segments and type names.
pub fn is_valid_name(name: &str) -> bool {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("name regex must compile"))
        .is_match(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use std::collections::BTreeSet;

    struct Fixed(BTreeSet<(LayerRank, &'static str)>);

    impl ComponentCatalog for Fixed {
        fn provides(&self, layer: &Layer, _kind: ComponentKind, name: &str, _: &Path) -> bool {
            self.0.iter().any(|(rank, n)| *rank == layer.layer && *n == name)
        }
    }

    fn settings() -> Settings {
        let config = Config::from_toml_str(
            r#"
            [[layers]]
            layer = 1
            directory = "1base"
            suffix = "Base"
            [[layers]]
            layer = 2
            directory = "2group"
            suffix = "Group"
            [[layers]]
            layer = 3
            directory = "3audi"
            suffix = "3Audi"
            [component_types]
            controller = "controllers"
            view = "views"
            "#,
        )
        .expect("config parses");
        Settings::from_config(&config).expect("settings parse")
    }

    fn catalog() -> Fixed {
        Fixed(BTreeSet::from([
            (1, "Dashboard"),
            (3, "Dashboard"),
            (3, "Emissions"),
            (2, "Group"),
        ]))
    }

    #[test]
    fn selects_most_specific_eligible_layer() {
        let settings = settings();
        let catalog = catalog();
        let resolver = Resolver::new(&settings, &catalog, 1);

        let found = resolver
            .find_files(ComponentKind::Controller, "Dashboard", ResolveOptions::at(Some(3)))
            .expect("kind configured");
        let selected = found.selected.expect("layer 3 provides Dashboard");
        assert_eq!(selected.layer, 3);
        assert_eq!(selected.path, PathBuf::from("3audi/controllers/Dashboard.rs"));
        assert!(found.chain.is_empty());

        let found = resolver
            .find_files(ComponentKind::Controller, "Dashboard", ResolveOptions::at(Some(2)))
            .expect("kind configured");
        assert_eq!(found.selected.map(|d| d.layer), Some(1));
    }

    #[test]
    fn default_layer_bounds_resolution() {
        let settings = settings();
        let catalog = catalog();
        let resolver = Resolver::new(&settings, &catalog, 1);
        let found = resolver
            .find_files(ComponentKind::View, "Emissions", ResolveOptions::default())
            .expect("kind configured");
        assert_eq!(found.selected, None);
    }

    #[test]
    fn collect_all_orders_generic_first() {
        let settings = settings();
        let catalog = catalog();
        let resolver = Resolver::new(&settings, &catalog, 3);
        let found = resolver
            .find_files(
                ComponentKind::Controller,
                "Dashboard",
                ResolveOptions::default().collecting(),
            )
            .expect("kind configured");
        let layers: Vec<LayerRank> = found.chain.iter().map(|d| d.layer).collect();
        assert_eq!(layers, vec![1, 3]);
        assert_eq!(found.selected.map(|d| d.layer), Some(3));
    }

    #[test]
    fn exact_layer_only_probes_a_single_layer() {
        let settings = settings();
        let catalog = catalog();
        let resolver = Resolver::new(&settings, &catalog, 1);
        let exact = |layer| ResolveOptions::at(Some(layer)).exact(true);

        let found = resolver
            .find_files(ComponentKind::Controller, "Dashboard", exact(2))
            .expect("kind configured");
        assert_eq!(found.selected, None);

        let found = resolver
            .find_files(ComponentKind::Controller, "Group", exact(2))
            .expect("kind configured");
        assert_eq!(found.selected.map(|d| d.suffix), Some("Group".to_string()));
    }

    #[test]
    fn unknown_kind_is_fatal_and_bad_names_are_absent() {
        let settings = settings();
        let catalog = catalog();
        let resolver = Resolver::new(&settings, &catalog, 3);
        let err = resolver
            .find_files(ComponentKind::Service, "Dashboard", ResolveOptions::default())
            .expect_err("service kind is not configured");
        assert!(matches!(err, FrameworkError::UnknownKind(_)));

        let found = resolver
            .find_files(ComponentKind::Controller, "../Dashboard", ResolveOptions::default())
            .expect("kind configured");
        assert_eq!(found.selected, None);
    }

    #[test]
    fn names_are_identifiers() {
        assert!(is_valid_name("EmissionsController_Admin"));
        assert!(is_valid_name("_private"));
        assert!(!is_valid_name("9lives"));
        assert!(!is_valid_name("a/b"));
        assert!(!is_valid_name(""));
    }
}

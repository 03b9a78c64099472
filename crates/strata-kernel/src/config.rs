//! Settings tree and path-based configuration access.
//!
//! The tree is a nested JSON mapping loaded once from TOML or JSON and read
//! only afterwards. [`Config::get`] walks it one segment at a time and never
//! fails for missing keys. [`Settings`] is the typed view over the sections
//! the kernel itself depends on.

use crate::component::ComponentKind;
use crate::error::{FrameworkError, Result};
use crate::layer::{Layer, LayerRank, LayerStack, RoleRank, RoleTable};
use serde_json::{Map, Value};
use std::borrow::Cow;
use std::collections::BTreeMap;
use std::path::Path;

pub const DEFAULT_LOG_ARG_LENGTH_LIMIT: usize = 512;
pub const DEFAULT_PARENT_CALL_HELPERS: &[&str] = &["call_parent", "parent_response", "parent_return"];

/// A configuration path: dotted (`"a.b.c"`) or pre-split segments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigPath<'a> {
    Dotted(&'a str),
    Segments(Vec<Cow<'a, str>>),
}

impl ConfigPath<'_> {
    fn segments(&self) -> Vec<&str> {
        match self {
            ConfigPath::Dotted(path) => path.split('.').collect(),
            ConfigPath::Segments(segments) => segments.iter().map(|s| s.as_ref()).collect(),
        }
    }
}

impl<'a> From<&'a str> for ConfigPath<'a> {
    fn from(path: &'a str) -> Self {
        ConfigPath::Dotted(path)
    }
}

impl<'a> From<&'a String> for ConfigPath<'a> {
    fn from(path: &'a String) -> Self {
        ConfigPath::Dotted(path.as_str())
    }
}

impl<'a> From<&'a [&'a str]> for ConfigPath<'a> {
    fn from(segments: &'a [&'a str]) -> Self {
        ConfigPath::Segments(segments.iter().map(|s| Cow::Borrowed(*s)).collect())
    }
}

impl<'a, const N: usize> From<[&'a str; N]> for ConfigPath<'a> {
    fn from(segments: [&'a str; N]) -> Self {
        ConfigPath::Segments(segments.into_iter().map(Cow::Borrowed).collect())
    }
}

impl From<Vec<String>> for ConfigPath<'_> {
    fn from(segments: Vec<String>) -> Self {
        ConfigPath::Segments(segments.into_iter().map(Cow::Owned).collect())
    }
}

/// The read-only settings tree.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    tree: Value,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            tree: Value::Object(Map::new()),
        }
    }
}

impl Config {
    /// Wrap an already-parsed tree. The root must be a mapping.
    pub fn from_value(tree: Value) -> Result<Self> {
        if !tree.is_object() {
            return Err(FrameworkError::configuration(
                "settings root must be a mapping",
            ));
        }
        Ok(Self { tree })
    }

    pub fn from_toml_str(text: &str) -> Result<Self> {
        let tree: Value = toml::from_str(text)?;
        Self::from_value(tree)
    }

    pub fn from_json_str(text: &str) -> Result<Self> {
        let tree: Value = serde_json::from_str(text)?;
        Self::from_value(tree)
    }

    /// Load from a file; `.json` files are JSON, everything else is TOML.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Self::from_json_str(&text),
            _ => Self::from_toml_str(&text),
        }
    }

    pub fn tree(&self) -> &Value {
        &self.tree
    }

    /// Walk the tree along `path`.
    ///
    /// Returns `None` as soon as a segment is missing or the current value is
    /// not a container. Numeric segments index into arrays.
    pub fn get<'p>(&self, path: impl Into<ConfigPath<'p>>) -> Option<&Value> {
        let path = path.into();
        let mut value = &self.tree;
        for segment in path.segments() {
            value = match value {
                Value::Object(map) => map.get(segment)?,
                Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
                _ => return None,
            };
        }
        Some(value)
    }

    /// Like [`Config::get`], returning `default` when the path is absent.
    pub fn get_or<'p>(&self, path: impl Into<ConfigPath<'p>>, default: Value) -> Value {
        self.get(path).cloned().unwrap_or(default)
    }

    pub fn get_str<'p>(&self, path: impl Into<ConfigPath<'p>>) -> Option<&str> {
        self.get(path).and_then(Value::as_str)
    }

    pub fn get_u64<'p>(&self, path: impl Into<ConfigPath<'p>>) -> Option<u64> {
        self.get(path).and_then(|value| match value {
            Value::Number(n) => n.as_u64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        })
    }

    pub fn get_bool<'p>(&self, path: impl Into<ConfigPath<'p>>) -> bool {
        self.get(path).and_then(Value::as_bool).unwrap_or(false)
    }
}

/// Debug-panel impersonation settings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DebugSettings {
    pub enabled: bool,
    pub panel: bool,
    pub fixed_user_layer: Option<LayerRank>,
    pub fixed_user_level: Option<RoleRank>,
}

impl DebugSettings {
    pub fn impersonating(&self) -> bool {
        self.enabled && self.panel
    }
}

/// Typed view over the kernel's required settings sections.
#[derive(Debug, Clone)]
pub struct Settings {
    pub layers: LayerStack,
    pub roles: RoleTable,
    pub parent_call_helpers: Vec<String>,
    pub log_arg_length_limit: usize,
    pub error_log_path: Option<String>,
    pub debug: DebugSettings,
    component_types: BTreeMap<ComponentKind, String>,
    component_extensions: BTreeMap<ComponentKind, String>,
    model_connections: BTreeMap<String, String>,
}

impl Settings {
    pub fn from_config(config: &Config) -> Result<Self> {
        let layers = parse_layers(config.get("layers"))?;
        let component_types = parse_kind_map(config.get("component_types"), "component_types")?;
        let component_extensions =
            parse_kind_map(config.get("component_extensions"), "component_extensions")?;
        let roles = parse_roles(config.get("user_roles"))?;
        let model_connections = parse_string_map(config.get("model_connections"), "model_connections")?;

        let parent_call_helpers = match config.get("parent_call_helpers") {
            None => DEFAULT_PARENT_CALL_HELPERS
                .iter()
                .map(|s| s.to_string())
                .collect(),
            Some(Value::Array(items)) => items
                .iter()
                .map(|item| {
                    item.as_str().map(ToOwned::to_owned).ok_or_else(|| {
                        FrameworkError::configuration("parent_call_helpers must list strings")
                    })
                })
                .collect::<Result<Vec<_>>>()?,
            Some(_) => {
                return Err(FrameworkError::configuration(
                    "parent_call_helpers must be a list",
                ));
            }
        };

        let log_arg_length_limit = config
            .get_u64("log_arg_length_limit")
            .map(|n| n as usize)
            .unwrap_or(DEFAULT_LOG_ARG_LENGTH_LIMIT);
        let error_log_path = config
            .get_str("error_log_path")
            .filter(|path| !path.trim().is_empty())
            .map(ToOwned::to_owned);

        let debug = DebugSettings {
            enabled: config.get_bool("debug.enabled"),
            panel: config.get_bool("debug.panel"),
            fixed_user_layer: config
                .get_u64("debug.fixed_user_layer")
                .filter(|n| *n > 0)
                .map(|n| n as LayerRank),
            fixed_user_level: config
                .get_u64("debug.fixed_user_level")
                .filter(|n| *n > 0)
                .map(|n| n as RoleRank),
        };

        Ok(Self {
            layers,
            roles,
            parent_call_helpers,
            log_arg_length_limit,
            error_log_path,
            debug,
            component_types,
            component_extensions,
            model_connections,
        })
    }

    /// Subdirectory holding components of `kind`.
    pub fn component_subdir(&self, kind: ComponentKind) -> Result<&str> {
        self.component_types
            .get(&kind)
            .map(String::as_str)
            .filter(|subdir| !subdir.is_empty())
            .ok_or_else(|| FrameworkError::UnknownKind(kind.to_string()))
    }

    pub fn extension(&self, kind: ComponentKind) -> &str {
        self.component_extensions
            .get(&kind)
            .map(String::as_str)
            .unwrap_or_else(|| kind.default_extension())
    }

    /// Connection type for a model, from `model_connections`.
    pub fn model_connection(&self, model: &str) -> Option<&str> {
        self.model_connections.get(model).map(String::as_str)
    }

    pub fn role_suffix(&self, rank: RoleRank) -> Option<&str> {
        self.roles.suffix(rank)
    }
}

fn parse_layers(raw: Option<&Value>) -> Result<LayerStack> {
    let rows: Vec<&Value> = match raw {
        Some(Value::Array(items)) => items.iter().collect(),
        Some(Value::Object(map)) => map.values().collect(),
        Some(_) => {
            return Err(FrameworkError::configuration(
                "`layers` must be a list or mapping",
            ));
        }
        None => return Err(FrameworkError::configuration("missing `layers` section")),
    };
    let mut layers = Vec::with_capacity(rows.len());
    for (idx, row) in rows.into_iter().enumerate() {
        let layer: Layer = serde_json::from_value(row.clone()).map_err(|e| {
            FrameworkError::configuration(format!("layers[{idx}] is malformed: {e}"))
        })?;
        layers.push(layer);
    }
    LayerStack::new(layers).map_err(FrameworkError::Configuration)
}

fn parse_string_map(raw: Option<&Value>, section: &str) -> Result<BTreeMap<String, String>> {
    let Some(raw) = raw else {
        return Ok(BTreeMap::new());
    };
    let Some(map) = raw.as_object() else {
        return Err(FrameworkError::configuration(format!(
            "`{section}` must be a mapping"
        )));
    };
    map.iter()
        .map(|(key, value)| {
            value
                .as_str()
                .map(|v| (key.clone(), v.to_string()))
                .ok_or_else(|| {
                    FrameworkError::configuration(format!("`{section}.{key}` must be a string"))
                })
        })
        .collect()
}

fn parse_kind_map(raw: Option<&Value>, section: &str) -> Result<BTreeMap<ComponentKind, String>> {
    parse_string_map(raw, section)?
        .into_iter()
        .map(|(key, value)| {
            let kind = key.parse::<ComponentKind>().map_err(|e| {
                FrameworkError::configuration(format!("`{section}`: {e}"))
            })?;
            Ok((kind, value))
        })
        .collect()
}

fn parse_roles(raw: Option<&Value>) -> Result<RoleTable> {
    let suffixes = parse_string_map(raw, "user_roles")?
        .into_iter()
        .map(|(key, value)| {
            let rank = key.trim().parse::<RoleRank>().map_err(|_| {
                FrameworkError::configuration(format!("`user_roles` key `{key}` is not a rank"))
            })?;
            Ok((rank, value))
        })
        .collect::<Result<BTreeMap<_, _>>>()?;
    Ok(RoleTable::new(suffixes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const SAMPLE: &str = r#"
        error_log_path = ""

        [general]
        brandName = "audi"

        [[layers]]
        layer = 1
        directory = "1base"
        suffix = "Base"

        [[layers]]
        layer = 3
        directory = "3audi"
        suffix = "3Audi"

        [component_types]
        controller = "controllers"
        view = "views"

        [user_roles]
        1 = "Seller"
        2 = "Manager"

        [a.b]
        c = 42
    "#;

    #[test]
    fn segment_and_dotted_paths_are_equivalent() {
        let config = Config::from_toml_str(SAMPLE).expect("sample parses");
        assert_eq!(config.get(["a", "b", "c"]), config.get("a.b.c"));
        assert_eq!(config.get("a.b.c"), Some(&json!(42)));
        assert_eq!(
            config.get(vec!["general".to_string(), "brandName".to_string()]),
            Some(&json!("audi"))
        );
    }

    #[test]
    fn missing_segments_return_the_default() {
        let config = Config::from_toml_str(SAMPLE).expect("sample parses");
        assert_eq!(config.get("a.b.c.d"), None);
        assert_eq!(config.get("a.x.c"), None);
        assert_eq!(config.get_or("general.missing", json!("fallback")), json!("fallback"));
        assert_eq!(config.get(""), None);
    }

    #[test]
    fn numeric_segments_index_lists() {
        let config = Config::from_toml_str(SAMPLE).expect("sample parses");
        assert_eq!(config.get_str("layers.1.suffix"), Some("3Audi"));
        assert_eq!(config.get("layers.9.suffix"), None);
    }

    #[test]
    fn settings_view_parses_required_sections() {
        let config = Config::from_toml_str(SAMPLE).expect("sample parses");
        let settings = Settings::from_config(&config).expect("settings parse");
        assert_eq!(settings.layers.len(), 2);
        assert_eq!(settings.role_suffix(2), Some("Manager"));
        assert_eq!(settings.component_subdir(ComponentKind::View).ok(), Some("views"));
        assert_eq!(settings.extension(ComponentKind::View), "xsl");
        assert!(matches!(
            settings.component_subdir(ComponentKind::Helper),
            Err(FrameworkError::UnknownKind(_))
        ));
        assert_eq!(settings.error_log_path, None);
        assert_eq!(settings.log_arg_length_limit, DEFAULT_LOG_ARG_LENGTH_LIMIT);
        assert_eq!(settings.parent_call_helpers.len(), 3);
    }

    #[test]
    fn missing_layers_is_a_configuration_error() {
        let config = Config::from_value(json!({"component_types": {}})).expect("object root");
        let err = Settings::from_config(&config).expect_err("layers are required");
        assert!(matches!(err, FrameworkError::Configuration(_)));
    }

    #[test]
    fn non_mapping_root_is_rejected() {
        assert!(Config::from_value(json!([1, 2])).is_err());
    }
}

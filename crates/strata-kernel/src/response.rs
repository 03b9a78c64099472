//! Response boundary.
//!
//! The kernel produces an abstract [`Response`]; turning it into protocol
//! output is the host's job.

use crate::layer::LayerRank;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Data handed to the template renderer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewModel {
    pub template: String,
    /// Pin template resolution to one layer.
    pub layer: Option<LayerRank>,
    /// Filled by the runner once the template has been located.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub template_path: Option<PathBuf>,
    pub values: Map<String, Value>,
}

impl ViewModel {
    pub fn new(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
            layer: None,
            template_path: None,
            values: Map::new(),
        }
    }

    pub fn at_layer(mut self, layer: LayerRank) -> Self {
        self.layer = Some(layer);
        self
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(key, value);
        self
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.values.insert(key.into(), value.into());
    }

    /// Append to the list stored under `key`, creating it when absent. A
    /// scalar already stored there becomes the first element.
    pub fn add(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        let entry = self
            .values
            .entry(key.into())
            .or_insert_with(|| Value::Array(Vec::new()));
        match entry {
            Value::Array(items) => items.push(value.into()),
            other => {
                let first = other.take();
                *other = Value::Array(vec![first, value.into()]);
            }
        }
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.values.remove(key)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "content", rename_all = "snake_case")]
pub enum Payload {
    View(ViewModel),
    Json(Value),
    File(PathBuf),
    Redirect(String),
    Raw(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    pub status: u16,
    pub headers: BTreeMap<String, String>,
    pub payload: Payload,
}

impl Response {
    pub fn new(status: u16, payload: Payload) -> Self {
        Self {
            status,
            headers: BTreeMap::new(),
            payload,
        }
    }

    pub fn view(view: ViewModel) -> Self {
        Self::new(200, Payload::View(view))
    }

    pub fn json(value: Value) -> Self {
        Self::new(200, Payload::Json(value)).with_header("Content-Type", "application/json")
    }

    /// JSON error body `{"success": false, "message": ...}`.
    pub fn json_error(status: u16, message: impl Into<String>) -> Self {
        let body = serde_json::json!({ "success": false, "message": message.into() });
        let mut response = Self::json(body);
        response.status = status;
        response
    }

    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self::new(200, Payload::File(path.into()))
    }

    pub fn redirect(location: impl Into<String>) -> Self {
        let location = location.into();
        Self::new(302, Payload::Redirect(location.clone())).with_header("Location", location)
    }

    pub fn raw(body: impl Into<String>) -> Self {
        Self::new(200, Payload::Raw(body.into()))
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.status = status;
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn view_model(&self) -> Option<&ViewModel> {
        match &self.payload {
            Payload::View(view) => Some(view),
            _ => None,
        }
    }

    pub fn view_model_mut(&mut self) -> Option<&mut ViewModel> {
        match &mut self.payload {
            Payload::View(view) => Some(view),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn view_model_add_creates_and_appends_lists() {
        let mut view = ViewModel::new("dashboard");
        view.add("alerts", "first");
        view.add("alerts", "second");
        view.set("title", "Panel");
        view.add("title", "Sub");
        assert_eq!(view.get("alerts"), Some(&json!(["first", "second"])));
        assert_eq!(view.get("title"), Some(&json!(["Panel", "Sub"])));
        assert_eq!(view.remove("alerts"), Some(json!(["first", "second"])));
        assert_eq!(view.get("alerts"), None);
    }

    #[test]
    fn redirect_sets_location_header() {
        let response = Response::redirect("/login");
        assert_eq!(response.status, 302);
        assert_eq!(response.headers.get("Location").map(String::as_str), Some("/login"));
    }

    #[test]
    fn payload_serializes_with_kind_tag() {
        let response = Response::json_error(404, "missing");
        let value = serde_json::to_value(&response).expect("serializable");
        assert_eq!(value["status"], json!(404));
        assert_eq!(value["payload"]["kind"], json!("json"));
        assert_eq!(value["payload"]["content"]["success"], json!(false));
    }
}

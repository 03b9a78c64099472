//! Data models, model factories and per-request database connections.
//!
//! Models are built through a layered `ModelFactory` component. The base
//! factory maps a model's configured connection type to a logical database
//! name and hands the model its connection as a constructor argument.
//! Connections are opened at most once per database name per request.

use crate::app::AppHandle;
use crate::component::ComponentKind;
use crate::error::{FrameworkError, Result};
use crate::layer::LayerRank;
use crate::registry::{Construct, Shared};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::rc::Rc;

/// Logical name of the layered factory component.
pub const MODEL_FACTORY: &str = "ModelFactory";

pub const MASTER_CONNECTION: &str = "master";
pub const DEALER_CONNECTION: &str = "dealer";

/// An open logical database.
pub trait Connection {
    fn database(&self) -> &str;

    /// Every row of `table`, as JSON objects.
    fn rows(&self, table: &str) -> Result<Vec<Value>>;
}

pub trait ConnectionOpener {
    fn open(&self, database: &str) -> Result<Rc<dyn Connection>>;
}

pub trait ModelFactory {
    fn create(
        &self,
        model: &str,
        connection_type: Option<&str>,
        args: Vec<Value>,
        layer: LayerRank,
    ) -> Result<Shared>;
}

/// Tables stored as `{root}/databases/{database}/{table}.json`.
#[derive(Debug, Clone)]
pub struct JsonDirectoryOpener {
    root: PathBuf,
}

impl JsonDirectoryOpener {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl ConnectionOpener for JsonDirectoryOpener {
    fn open(&self, database: &str) -> Result<Rc<dyn Connection>> {
        let dir = self.root.join("databases").join(database);
        if !dir.is_dir() {
            return Err(FrameworkError::configuration(format!(
                "database {database} not found at {}",
                dir.display()
            )));
        }
        Ok(Rc::new(JsonDirectory {
            database: database.to_string(),
            dir,
        }))
    }
}

struct JsonDirectory {
    database: String,
    dir: PathBuf,
}

impl Connection for JsonDirectory {
    fn database(&self) -> &str {
        &self.database
    }

    fn rows(&self, table: &str) -> Result<Vec<Value>> {
        let path = self.dir.join(format!("{table}.json"));
        read_rows(&path)
    }
}

fn read_rows(path: &Path) -> Result<Vec<Value>> {
    let text = std::fs::read_to_string(path)?;
    let value: Value = serde_json::from_str(&text)?;
    match value {
        Value::Array(rows) => Ok(rows),
        _ => Err(FrameworkError::load(format!(
            "{} does not hold a list of rows",
            path.display()
        ))),
    }
}

type Tables = BTreeMap<String, Vec<Value>>;

/// In-memory databases, for fixtures and tests.
#[derive(Debug, Clone, Default)]
pub struct MemoryOpener {
    databases: BTreeMap<String, Rc<Tables>>,
}

impl MemoryOpener {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_table(mut self, database: &str, table: &str, rows: Vec<Value>) -> Self {
        let tables = self.databases.entry(database.to_string()).or_default();
        Rc::make_mut(tables).insert(table.to_string(), rows);
        self
    }
}

impl ConnectionOpener for MemoryOpener {
    fn open(&self, database: &str) -> Result<Rc<dyn Connection>> {
        let tables = self.databases.get(database).ok_or_else(|| {
            FrameworkError::configuration(format!("database {database} is not available"))
        })?;
        Ok(Rc::new(MemoryConnection {
            database: database.to_string(),
            tables: Rc::clone(tables),
        }))
    }
}

struct MemoryConnection {
    database: String,
    tables: Rc<Tables>,
}

impl Connection for MemoryConnection {
    fn database(&self) -> &str {
        &self.database
    }

    fn rows(&self, table: &str) -> Result<Vec<Value>> {
        Ok(self.tables.get(table).cloned().unwrap_or_default())
    }
}

/// A table-backed model.
pub struct Table {
    table: String,
    primary_key: String,
    searchable: Vec<String>,
    connection: Rc<dyn Connection>,
    args: Vec<Value>,
}

impl Table {
    pub fn new(connection: Rc<dyn Connection>, table: &str, primary_key: &str) -> Self {
        Self {
            table: table.to_string(),
            primary_key: primary_key.to_string(),
            searchable: Vec::new(),
            connection,
            args: Vec::new(),
        }
    }

    /// Build from model-factory input: argument 0 is the connection,
    /// argument 1 the caller's extra constructor arguments.
    pub fn from_construct(construct: &Construct<'_>, table: &str, primary_key: &str) -> Result<Self> {
        let connection = construct.arg::<dyn Connection>(0)?;
        let mut model = Self::new(connection, table, primary_key);
        if construct.args().len() > 1 {
            model.args = (*construct.arg::<Vec<Value>>(1)?).clone();
        }
        Ok(model)
    }

    /// Columns `find_by` may filter on, besides the primary key.
    pub fn searchable(mut self, columns: &[&str]) -> Self {
        self.searchable = columns.iter().map(|c| c.to_string()).collect();
        self
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn database(&self) -> &str {
        self.connection.database()
    }

    pub fn args(&self) -> &[Value] {
        &self.args
    }

    pub fn all(&self) -> Result<Vec<Value>> {
        self.connection.rows(&self.table)
    }

    pub fn find(&self, id: &Value) -> Result<Option<Value>> {
        Ok(self
            .all()?
            .into_iter()
            .find(|row| row.get(&self.primary_key) == Some(id)))
    }

    pub fn find_by(&self, column: &str, value: &Value) -> Result<Vec<Value>> {
        if column != self.primary_key && !self.searchable.iter().any(|c| c == column) {
            return Err(FrameworkError::logic(format!(
                "column {column} is not searchable on {}",
                self.table
            )));
        }
        Ok(self
            .all()?
            .into_iter()
            .filter(|row| row.get(column) == Some(value))
            .collect())
    }
}

/// Build `model` at `layer` over a connection to `database`.
pub fn open_model(
    handle: &AppHandle,
    model: &str,
    database: &str,
    args: Vec<Value>,
    layer: LayerRank,
) -> Result<Shared> {
    let connection = handle.connection(database)?;
    handle.get_component(
        ComponentKind::Model,
        model,
        vec![Shared::new(connection), Shared::new(Rc::new(args))],
        Some(layer),
        false,
    )
}

/// The base factory: `master` and `dealer` connection types.
pub struct ConnectionModelFactory {
    handle: AppHandle,
}

impl ConnectionModelFactory {
    pub fn new(handle: AppHandle) -> Self {
        Self { handle }
    }

    pub fn handle(&self) -> &AppHandle {
        &self.handle
    }

    /// Logical database behind a connection type.
    pub fn database_for(&self, connection_type: &str) -> Result<String> {
        let brand = self.handle.brand_name()?;
        match connection_type {
            MASTER_CONNECTION => Ok(format!("{brand}_master")),
            DEALER_CONNECTION => {
                let dealer = self
                    .handle
                    .request()
                    .lookup("user.id_dealer")
                    .and_then(|id| match id {
                        Value::String(s) => Some(s),
                        Value::Number(n) => Some(n.to_string()),
                        _ => None,
                    })
                    .ok_or_else(|| {
                        FrameworkError::configuration(
                            "dealer connection requires context user.id_dealer",
                        )
                    })?;
                Ok(format!("{brand}_{dealer}"))
            }
            other => Err(FrameworkError::configuration(format!(
                "unknown connection type: {other}"
            ))),
        }
    }
}

impl ModelFactory for ConnectionModelFactory {
    fn create(
        &self,
        model: &str,
        connection_type: Option<&str>,
        args: Vec<Value>,
        layer: LayerRank,
    ) -> Result<Shared> {
        let connection_type = connection_type.ok_or_else(|| {
            FrameworkError::configuration(format!("model {model} has no configured connection"))
        })?;
        let database = self.database_for(connection_type)?;
        open_model(&self.handle, model, &database, args, layer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn cars() -> Rc<dyn Connection> {
        MemoryOpener::new()
            .with_table(
                "audi_master",
                "models",
                vec![
                    json!({"id_model": 1, "name": "A3", "segment": "compact"}),
                    json!({"id_model": 2, "name": "Q5", "segment": "suv"}),
                ],
            )
            .open("audi_master")
            .expect("fixture database exists")
    }

    #[test]
    fn table_reads_rows_through_its_connection() {
        let table = Table::new(cars(), "models", "id_model").searchable(&["segment"]);
        assert_eq!(table.database(), "audi_master");
        assert_eq!(table.all().expect("rows").len(), 2);
        assert_eq!(
            table.find(&json!(2)).expect("rows"),
            Some(json!({"id_model": 2, "name": "Q5", "segment": "suv"}))
        );
        assert_eq!(table.find_by("segment", &json!("compact")).expect("rows").len(), 1);
    }

    #[test]
    fn filtering_on_unlisted_columns_is_rejected() {
        let table = Table::new(cars(), "models", "id_model");
        let err = table
            .find_by("name", &json!("A3"))
            .expect_err("name is not searchable");
        assert!(matches!(err, FrameworkError::Logic(_)));
    }

    #[test]
    fn memory_opener_rejects_unknown_databases() {
        let err = MemoryOpener::new()
            .open("audi_714")
            .err()
            .expect("no such database");
        assert!(matches!(err, FrameworkError::Configuration(_)));
    }
}

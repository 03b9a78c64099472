use super::LAYER;
use std::rc::Rc;
use strata_kernel::{ComponentKind, Registry, Table};

/// `(logical name, table, primary key, searchable columns)`
const TABLES: &[(&str, &str, &str, &[&str])] = &[
    ("CarModel", "models", "id_model", &["segment"]),
    ("Color", "colors", "id_color", &["id_model", "id_color"]),
    ("Extra", "extras", "id_extra", &["id_extra", "name"]),
    (crate::USER_SESSION, "user_sessions", "id_session", &["token", "id_user"]),
];

pub(super) fn register(registry: &mut Registry) {
    for &(name, table, primary_key, searchable) in TABLES {
        registry
            .register(ComponentKind::Model, name, LAYER)
            .provide::<Table>(move |c| {
                Ok(Rc::new(
                    Table::from_construct(c, table, primary_key)?.searchable(searchable),
                ))
            });
    }
}

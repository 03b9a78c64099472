use super::LAYER;
use crate::contracts::EmissionsReport;
use serde_json::{Value, json};
use std::rc::Rc;
use strata_kernel::{ComponentKind, Dependency, Registry, Result, Table};

pub struct EmissionsService {
    car_models: Rc<Table>,
}

impl EmissionsReport for EmissionsService {
    fn emissions_data(&self) -> Result<Vec<Value>> {
        Ok(self
            .car_models
            .all()?
            .iter()
            .map(|model| {
                json!({
                    "name": model.get("name").cloned().unwrap_or(Value::Null),
                    "price": format_price(model.get("price").and_then(Value::as_f64).unwrap_or(0.0)),
                    "emissions": format!(
                        "{} g/km",
                        model.get("emissions").map(display_number).unwrap_or_default()
                    ),
                })
            })
            .collect())
    }
}

fn display_number(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// `1234.5` → `1.234,50 €`
pub fn format_price(amount: f64) -> String {
    let cents = (amount * 100.0).round() as i64;
    let sign = if cents < 0 { "-" } else { "" };
    let cents = cents.unsigned_abs();
    let whole = (cents / 100).to_string();

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, digit) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(digit);
    }
    format!("{sign}{grouped},{:02} €", cents % 100)
}

pub(super) fn register(registry: &mut Registry) {
    registry
        .register(ComponentKind::Service, "EmissionsService", LAYER)
        .depends_on(Dependency::model("CarModel"))
        .provide::<dyn EmissionsReport>(|c| {
            Ok(Rc::new(EmissionsService {
                car_models: c.dependency::<Table>("CarModel")?,
            }))
        });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prices_use_dot_grouping_and_comma_decimals() {
        assert_eq!(format_price(1234.56), "1.234,56 €");
        assert_eq!(format_price(38900.0), "38.900,00 €");
        assert_eq!(format_price(999.999), "1.000,00 €");
        assert_eq!(format_price(12.5), "12,50 €");
        assert_eq!(format_price(1_250_000.0), "1.250.000,00 €");
    }
}

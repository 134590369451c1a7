//! Request validation from the catalog's form field rules and column types.

use crate::config::{ColumnConfig, FieldDef, FieldType, MasterConfig};
use crate::error::AppError;
use regex::Regex;
use serde_json::{Map, Value};

pub struct RequestValidator;

impl RequestValidator {
    /// Validate a create body. Required fields backed by a writable column must be present and non-empty.
    pub fn validate(body: &Map<String, Value>, master: &MasterConfig) -> Result<(), AppError> {
        for field in stored_fields(master) {
            let val = body.get(&field.name);
            if field.required && val.map_or(true, is_blank) {
                return Err(AppError::Validation(format!("{} is required", field.label)));
            }
            if let Some(v) = val {
                validate_field(field, v)?;
            }
        }
        check_column_types(body, master)
    }

    /// Validate only the fields present in body (for updates). Required is not enforced for missing fields.
    pub fn validate_partial(body: &Map<String, Value>, master: &MasterConfig) -> Result<(), AppError> {
        for field in stored_fields(master) {
            if let Some(v) = body.get(&field.name) {
                if field.required && is_blank(v) {
                    return Err(AppError::Validation(format!("{} is required", field.label)));
                }
                validate_field(field, v)?;
            }
        }
        check_column_types(body, master)
    }
}

/// Form fields that map to a writable column; cascade-only dropdowns are not stored.
fn stored_fields(master: &MasterConfig) -> impl Iterator<Item = &FieldDef> {
    master
        .ui
        .fields
        .iter()
        .filter(move |f| master.column(&f.name).is_some())
}

fn is_blank(v: &Value) -> bool {
    match v {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        _ => false,
    }
}

fn validate_field(field: &FieldDef, v: &Value) -> Result<(), AppError> {
    if v.is_null() {
        return Ok(());
    }
    if field.type_ == FieldType::Number {
        let numeric = match v {
            Value::Number(_) => true,
            Value::String(s) => s.trim().is_empty() || s.trim().parse::<f64>().is_ok(),
            _ => false,
        };
        if !numeric {
            return Err(AppError::Validation(format!("{} must be a number", field.label)));
        }
    }
    if let Some(max) = field.max_length {
        if let Some(s) = v.as_str() {
            if s.chars().count() > max as usize {
                return Err(AppError::Validation(format!(
                    "{} must be at most {} characters",
                    field.label, max
                )));
            }
        }
    }
    if let Some(ref pattern) = field.pattern {
        let compiled;
        let re = match &field.pattern_re {
            Some(re) => re,
            None => {
                compiled = Regex::new(pattern)
                    .map_err(|_| AppError::Validation(format!("invalid pattern for {}", field.name)))?;
                &compiled
            }
        };
        let text = match v {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        if !re.is_match(&text) {
            return Err(AppError::Validation(format!("{} does not match required pattern", field.label)));
        }
    }
    Ok(())
}

/// Every body value must be castable to its column's type; the database would otherwise
/// reject it as an internal error.
fn check_column_types(body: &Map<String, Value>, master: &MasterConfig) -> Result<(), AppError> {
    for (name, v) in body {
        let Some(column) = master.column(name) else { continue };
        if v.is_null() || accepts(column, v) {
            continue;
        }
        let label = master
            .ui
            .fields
            .iter()
            .find(|f| &f.name == name)
            .map_or(name.as_str(), |f| f.label.as_str());
        let expected = match column.pg_type() {
            "int2" | "int4" | "int8" => "a whole number",
            "numeric" | "float8" => "a number",
            "bool" => "true or false",
            "date" | "timestamptz" => "a date string",
            _ => "text",
        };
        return Err(AppError::Validation(format!("{} must be {}", label, expected)));
    }
    Ok(())
}

fn accepts(column: &ColumnConfig, v: &Value) -> bool {
    match column.pg_type() {
        "int2" | "int4" | "int8" => match v {
            Value::Number(n) => n.is_i64() || n.is_u64(),
            Value::String(s) => s.trim().parse::<i64>().is_ok(),
            _ => false,
        },
        "numeric" | "float8" => match v {
            Value::Number(_) => true,
            Value::String(s) => s.trim().parse::<f64>().is_ok(),
            _ => false,
        },
        "bool" => matches!(v, Value::Bool(_) | Value::String(_)),
        "date" | "timestamptz" => v.is_string(),
        _ => matches!(v, Value::String(_) | Value::Number(_) | Value::Bool(_)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::load_builtin;
    use serde_json::json;

    fn body(v: Value) -> Map<String, Value> {
        v.as_object().cloned().expect("object")
    }

    #[test]
    fn create_requires_stored_fields_only() {
        let c = load_builtin().expect("catalog");
        let district = c.get("DISTRICT").expect("district");
        // country_code drives the cascade but is not a district column.
        let ok = body(json!({ "stateid": 3, "district": "Pune" }));
        assert!(RequestValidator::validate(&ok, district).is_ok());

        let missing = body(json!({ "stateid": 3 }));
        let err = RequestValidator::validate(&missing, district).unwrap_err();
        assert_eq!(err.to_string(), "District Name is required");
    }

    #[test]
    fn blank_string_counts_as_missing() {
        let c = load_builtin().expect("catalog");
        let skills = c.get("SKILLS").expect("skills");
        assert!(RequestValidator::validate(&body(json!({ "optionname": "  " })), skills).is_err());
        assert!(RequestValidator::validate_partial(&body(json!({ "optionname": "" })), skills).is_err());
    }

    #[test]
    fn max_length_and_pattern() {
        let c = load_builtin().expect("catalog");
        let country = c.get("COUNTRY").expect("country");
        let long = body(json!({ "country_code": "IND", "country": "India" }));
        let err = RequestValidator::validate(&long, country).unwrap_err();
        assert!(err.to_string().contains("at most 2 characters"));

        let digits = body(json!({ "country_code": "1N", "country": "India" }));
        assert!(RequestValidator::validate(&digits, country).is_err());
    }

    #[test]
    fn number_fields_accept_numeric_strings() {
        let c = load_builtin().expect("catalog");
        let country = c.get("COUNTRY").expect("country");
        assert!(RequestValidator::validate_partial(&body(json!({ "advisor": "42" })), country).is_ok());
        assert!(RequestValidator::validate_partial(&body(json!({ "advisor": 42 })), country).is_ok());
        let err = RequestValidator::validate_partial(&body(json!({ "advisor": "abc" })), country).unwrap_err();
        assert_eq!(err.to_string(), "Advisor ID must be a number");
    }

    #[test]
    fn values_must_fit_the_column_type() {
        let c = load_builtin().expect("catalog");
        let district = c.get("DISTRICT").expect("district");
        let err = RequestValidator::validate(&body(json!({ "district": "X", "stateid": true })), district).unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert_eq!(err.to_string(), "State must be a whole number");

        let err = RequestValidator::validate_partial(&body(json!({ "stateid": { "id": 3 } })), district).unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert!(RequestValidator::validate_partial(&body(json!({ "stateid": "3" })), district).is_ok());
        assert!(RequestValidator::validate_partial(&body(json!({ "stateid": 2.5 })), district).is_err());

        let skills = c.get("SKILLS").expect("skills");
        assert!(RequestValidator::validate(&body(json!({ "optionname": ["a"] })), skills).is_err());
    }

    #[test]
    fn catalog_patterns_are_precompiled() {
        let c = load_builtin().expect("catalog");
        let country = c.get("COUNTRY").expect("country");
        let code = country.ui.fields.iter().find(|f| f.name == "country_code").expect("field");
        assert!(code.pattern_re.as_ref().is_some_and(|re| re.is_match("IN")));
    }

    #[test]
    fn partial_skips_absent_required_fields() {
        let c = load_builtin().expect("catalog");
        let state = c.get("STATE").expect("state");
        assert!(RequestValidator::validate_partial(&body(json!({ "region": "South" })), state).is_ok());
    }
}

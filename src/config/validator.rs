//! Catalog validation: identifier safety and cross-references between masters.

use crate::config::{CatalogConfig, MasterConfig, PkType};
use crate::error::ConfigError;
use regex::Regex;
use std::collections::{HashMap, HashSet};
use std::sync::OnceLock;

/// Identifiers are spliced into SQL, so they are restricted to lower-case snake_case.
fn identifier_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[a-z_][a-z0-9_]*$").expect("static identifier pattern"))
}

/// Column types accepted for parameter casts and schema bootstrap.
const PG_TYPES: &[&str] = &["text", "varchar", "int2", "int4", "int8", "numeric", "float8", "bool", "date", "timestamptz"];

fn check_ident(master: &str, what: &str, name: &str) -> Result<(), ConfigError> {
    if identifier_re().is_match(name) {
        Ok(())
    } else {
        Err(ConfigError::InvalidIdentifier {
            master: master.to_string(),
            what: what.to_string(),
            name: name.to_string(),
        })
    }
}

fn check_pg_type(master: &str, pg_type: &str) -> Result<(), ConfigError> {
    if PG_TYPES.contains(&pg_type) {
        Ok(())
    } else {
        Err(ConfigError::Validation(format!(
            "{}: unsupported pg_type '{}'",
            master, pg_type
        )))
    }
}

pub fn validate(config: &CatalogConfig) -> Result<(), ConfigError> {
    if config.masters.is_empty() {
        return Err(ConfigError::Validation("catalog must declare at least one master".into()));
    }
    let keys: HashSet<&str> = config.masters.iter().map(|m| m.key.as_str()).collect();
    if keys.len() != config.masters.len() {
        let mut seen = HashSet::new();
        for m in &config.masters {
            if !seen.insert(m.key.as_str()) {
                return Err(ConfigError::DuplicateKey(m.key.clone()));
            }
        }
    }

    // table -> pk of masters declared so far; foreign keys may only point backwards.
    let mut declared: HashMap<&str, &str> = HashMap::new();
    for m in &config.masters {
        validate_master(m, &keys, &declared)?;
        declared.insert(m.table.as_str(), m.pk.as_str());
    }
    Ok(())
}

fn validate_master(
    m: &MasterConfig,
    keys: &HashSet<&str>,
    earlier: &HashMap<&str, &str>,
) -> Result<(), ConfigError> {
    let key = m.key.as_str();
    if key.is_empty() || key.to_uppercase() != key {
        return Err(ConfigError::Validation(format!("master key '{}' must be upper-case", key)));
    }
    check_ident(key, "table", &m.table)?;
    check_ident(key, "pk", &m.pk)?;
    check_ident(key, "sort", &m.sort)?;
    if let Some(alias) = &m.alias {
        check_ident(key, "alias", alias)?;
    }
    if m.columns.is_empty() {
        return Err(ConfigError::Validation(format!("{}: no writable columns", key)));
    }
    let mut column_names = HashSet::new();
    for c in &m.columns {
        check_ident(key, "column", c.name())?;
        check_pg_type(key, c.pg_type())?;
        if !column_names.insert(c.name()) {
            return Err(ConfigError::Validation(format!("{}: duplicate column '{}'", key, c.name())));
        }
    }
    let readable = |name: &str| name == m.pk || column_names.contains(name);
    if !readable(&m.sort) {
        return Err(ConfigError::Validation(format!("{}: sort column '{}' is not a column", key, m.sort)));
    }
    if m.pk_type == PkType::Text && m.column(&m.pk).is_none() {
        return Err(ConfigError::Validation(format!(
            "{}: text primary key '{}' must be writable",
            key, m.pk
        )));
    }

    let mut join_aliases = HashSet::new();
    if !m.joins.is_empty() && m.alias.is_none() {
        return Err(ConfigError::Validation(format!("{}: alias is required when joins are declared", key)));
    }
    for j in &m.joins {
        check_ident(key, "join table", &j.table)?;
        check_ident(key, "join alias", &j.alias)?;
        check_ident(key, "join column", &j.local)?;
        check_ident(key, "join column", &j.foreign)?;
        for s in &j.select {
            check_ident(key, "join select", &s.column)?;
            check_ident(key, "join select", s.output_name())?;
        }
        if m.alias.as_deref() == Some(j.alias.as_str()) || !join_aliases.insert(j.alias.as_str()) {
            return Err(ConfigError::DuplicateAlias {
                master: key.to_string(),
                alias: j.alias.clone(),
            });
        }
        if !readable(&j.local) {
            return Err(ConfigError::Validation(format!("{}: join column '{}' is not a column", key, j.local)));
        }
        if j.foreign_key && earlier.get(j.table.as_str()) != Some(&j.foreign.as_str()) {
            return Err(ConfigError::MissingReference {
                kind: "foreign key table",
                id: format!("{} -> {}.{}", key, j.table, j.foreign),
            });
        }
    }

    for f in &m.filters {
        check_ident(key, "filter column", &f.column)?;
        check_pg_type(key, f.pg_type())?;
        if f.params.is_empty() {
            return Err(ConfigError::Validation(format!("{}: filter on '{}' has no params", key, f.column)));
        }
        match &f.join {
            Some(join) if !join_aliases.contains(join.as_str()) => {
                return Err(ConfigError::MissingReference {
                    kind: "join alias",
                    id: format!("{}.{}", key, join),
                });
            }
            None if !readable(&f.column) => {
                return Err(ConfigError::Validation(format!(
                    "{}: filter column '{}' is not a column",
                    key, f.column
                )));
            }
            _ => {}
        }
    }

    let field_names: HashSet<&str> = m.ui.fields.iter().map(|f| f.name.as_str()).collect();
    for field in &m.ui.fields {
        if let Some(lookup) = &field.lookup_master {
            if !keys.contains(lookup.as_str()) {
                return Err(ConfigError::MissingReference {
                    kind: "lookup master",
                    id: lookup.clone(),
                });
            }
        }
        if let Some(parent) = &field.parent_field {
            if parent == &field.name || !field_names.contains(parent.as_str()) {
                return Err(ConfigError::MissingReference {
                    kind: "parent field",
                    id: format!("{}.{}", key, parent),
                });
            }
        }
        if let Some(pattern) = &field.pattern {
            Regex::new(pattern).map_err(|e| {
                ConfigError::Validation(format!("{}: invalid pattern for {}: {}", key, field.name, e))
            })?;
        }
    }
    Ok(())
}

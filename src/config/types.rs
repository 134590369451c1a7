//! Raw catalog types matching the JSON catalog file (catalog/masters.json).

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Whole catalog as read from JSON: body-key aliases shared by every master, then the masters in display order.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct CatalogConfig {
    #[serde(default)]
    pub aliases: BTreeMap<String, String>,
    pub masters: Vec<MasterConfig>,
}

/// How the `:id` path segment is parsed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PkType {
    Int8,
    Text,
}

impl PkType {
    pub fn pg_type(&self) -> &'static str {
        match self {
            PkType::Int8 => "int8",
            PkType::Text => "text",
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ColumnConfig {
    Name(String),
    Typed {
        name: String,
        #[serde(default)]
        pg_type: Option<String>,
    },
}

impl ColumnConfig {
    pub fn name(&self) -> &str {
        match self {
            ColumnConfig::Name(n) => n,
            ColumnConfig::Typed { name, .. } => name,
        }
    }

    /// PostgreSQL type used for the parameter cast; text unless the catalog says otherwise.
    pub fn pg_type(&self) -> &str {
        match self {
            ColumnConfig::Typed { pg_type: Some(t), .. } => t,
            _ => "text",
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct JoinSelect {
    pub column: String,
    #[serde(default, rename = "as")]
    pub as_: Option<String>,
}

impl JoinSelect {
    pub fn output_name(&self) -> &str {
        self.as_.as_deref().unwrap_or(&self.column)
    }
}

/// LEFT JOIN to a parent table: `<main>.local = <alias>.foreign`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct JoinConfig {
    pub table: String,
    pub alias: String,
    pub local: String,
    pub foreign: String,
    #[serde(default)]
    pub select: Vec<JoinSelect>,
    /// Emit a REFERENCES constraint when bootstrapping the schema.
    #[serde(default)]
    pub foreign_key: bool,
}

/// Equality filter driven by a query parameter. `join` picks a joined alias instead of the main table.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FilterConfig {
    pub params: Vec<String>,
    pub column: String,
    #[serde(default)]
    pub join: Option<String>,
    #[serde(default)]
    pub pg_type: Option<String>,
}

impl FilterConfig {
    pub fn pg_type(&self) -> &str {
        self.pg_type.as_deref().unwrap_or("text")
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    Text,
    Number,
    Dropdown,
}

/// One form field. Serialized camelCase for clients; the catalog file itself is snake_case.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all(serialize = "camelCase"))]
pub struct FieldDef {
    pub name: String,
    pub label: String,
    #[serde(rename = "type")]
    pub type_: FieldType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lookup_master: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_field: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value_key: Option<String>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    /// `pattern` compiled once when the catalog is resolved.
    #[serde(skip)]
    pub pattern_re: Option<Regex>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GridColumn {
    pub key: String,
    pub label: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct UiConfig {
    pub label: String,
    #[serde(default)]
    pub fields: Vec<FieldDef>,
    #[serde(default)]
    pub columns: Vec<GridColumn>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MasterConfig {
    pub key: String,
    pub table: String,
    #[serde(default)]
    pub alias: Option<String>,
    pub pk: String,
    pub pk_type: PkType,
    /// Display column; `search` matches against it.
    pub sort: String,
    pub columns: Vec<ColumnConfig>,
    #[serde(default)]
    pub joins: Vec<JoinConfig>,
    #[serde(default)]
    pub filters: Vec<FilterConfig>,
    #[serde(default)]
    pub aliases: BTreeMap<String, String>,
    pub ui: UiConfig,
}

impl MasterConfig {
    pub fn column(&self, name: &str) -> Option<&ColumnConfig> {
        self.columns.iter().find(|c| c.name() == name)
    }

    /// Alias (or bare table name) used to qualify main-table columns.
    pub fn main_ref(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.table)
    }
}

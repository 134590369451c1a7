//! Builds parameterized page, count, INSERT, UPDATE, DELETE from a master definition.

use crate::config::{FilterConfig, MasterConfig};
use serde_json::{Map, Value};

/// Quote identifier for PostgreSQL (safe: only from validated catalog).
fn quoted(s: &str) -> String {
    format!("\"{}\"", s.replace('"', "\"\""))
}

fn qualified(table_ref: &str, column: &str) -> String {
    format!("{}.{}", quoted(table_ref), quoted(column))
}

/// Escape LIKE metacharacters so a search term matches literally.
pub fn escape_like(term: &str) -> String {
    let mut out = String::with_capacity(term.len() + 2);
    for c in term.chars() {
        if matches!(c, '\\' | '%' | '_') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

#[derive(Debug)]
pub struct QueryBuf {
    pub sql: String,
    pub params: Vec<Value>,
}

impl QueryBuf {
    fn new() -> Self {
        QueryBuf {
            sql: String::new(),
            params: Vec::new(),
        }
    }

    fn push_param(&mut self, v: Value) -> u32 {
        let n = self.params.len() as u32 + 1;
        self.params.push(v);
        n
    }

    fn placeholder(&mut self, v: Value, pg_type: &str) -> String {
        let n = self.push_param(v);
        format!("${}::{}", n, pg_type)
    }
}

/// What a list request asks for, after query parsing.
#[derive(Debug)]
pub struct ListCriteria<'a> {
    pub search: Option<String>,
    /// Matched filters with the raw query value, in catalog order.
    pub filters: Vec<(&'a FilterConfig, String)>,
    pub limit: u32,
    pub offset: u64,
}

/// FROM clause: main table (aliased when configured) and its LEFT JOINs.
fn from_clause(master: &MasterConfig) -> String {
    let mut from = quoted(&master.table);
    if let Some(alias) = &master.alias {
        from.push_str(" AS ");
        from.push_str(&quoted(alias));
    }
    let main = master.main_ref();
    for j in &master.joins {
        from.push_str(&format!(
            " LEFT JOIN {} AS {} ON {} = {}",
            quoted(&j.table),
            quoted(&j.alias),
            qualified(main, &j.local),
            qualified(&j.alias, &j.foreign)
        ));
    }
    from
}

/// WHERE clause shared by page and count queries; pushes params in clause order.
fn where_clause(master: &MasterConfig, criteria: &ListCriteria<'_>, q: &mut QueryBuf) -> String {
    let main = master.main_ref();
    let mut parts = Vec::new();
    if let Some(term) = criteria.search.as_deref().filter(|s| !s.is_empty()) {
        let n = q.push_param(Value::String(format!("%{}%", escape_like(term))));
        parts.push(format!("{}::text ILIKE ${}", qualified(main, &master.sort), n));
    }
    for (filter, raw) in &criteria.filters {
        let source = filter.join.as_deref().unwrap_or(main);
        let ph = q.placeholder(Value::String(raw.clone()), filter.pg_type());
        parts.push(format!("{} = {}", qualified(source, &filter.column), ph));
    }
    if parts.is_empty() {
        String::new()
    } else {
        format!(" WHERE {}", parts.join(" AND "))
    }
}

/// One page of rows, newest first: main columns plus the joins' selected parent columns.
pub fn select_page(master: &MasterConfig, criteria: &ListCriteria<'_>) -> QueryBuf {
    let mut q = QueryBuf::new();
    let main = master.main_ref();
    let mut select_parts = vec![format!("{}.*", quoted(main))];
    for j in &master.joins {
        for s in &j.select {
            select_parts.push(format!("{} AS {}", qualified(&j.alias, &s.column), quoted(s.output_name())));
        }
    }
    let where_sql = where_clause(master, criteria, &mut q);
    q.sql = format!(
        "SELECT {} FROM {}{} ORDER BY {} DESC LIMIT {} OFFSET {}",
        select_parts.join(", "),
        from_clause(master),
        where_sql,
        qualified(main, &master.pk),
        criteria.limit,
        criteria.offset
    );
    q
}

/// Total matching rows for the same criteria; binds the same params as `select_page`.
pub fn count(master: &MasterConfig, criteria: &ListCriteria<'_>) -> QueryBuf {
    let mut q = QueryBuf::new();
    let where_sql = where_clause(master, criteria, &mut q);
    q.sql = format!("SELECT COUNT(*) AS total FROM {}{}", from_clause(master), where_sql);
    q
}

/// INSERT of the writable columns present in body, in catalog order.
pub fn insert(master: &MasterConfig, body: &Map<String, Value>) -> QueryBuf {
    let mut q = QueryBuf::new();
    let mut cols = Vec::new();
    let mut placeholders = Vec::new();
    for c in &master.columns {
        let Some(v) = body.get(c.name()) else { continue };
        placeholders.push(q.placeholder(v.clone(), c.pg_type()));
        cols.push(quoted(c.name()));
    }
    q.sql = format!(
        "INSERT INTO {} ({}) VALUES ({}) RETURNING *",
        quoted(&master.table),
        cols.join(", "),
        placeholders.join(", ")
    );
    q
}

/// UPDATE by id: SET only writable columns present in body; id is the last param.
pub fn update(master: &MasterConfig, id: &Value, body: &Map<String, Value>) -> QueryBuf {
    let mut q = QueryBuf::new();
    let mut sets = Vec::new();
    for c in &master.columns {
        let Some(v) = body.get(c.name()) else { continue };
        let ph = q.placeholder(v.clone(), c.pg_type());
        sets.push(format!("{} = {}", quoted(c.name()), ph));
    }
    let id_ph = q.placeholder(id.clone(), master.pk_type.pg_type());
    q.sql = format!(
        "UPDATE {} SET {} WHERE {} = {} RETURNING *",
        quoted(&master.table),
        sets.join(", "),
        quoted(&master.pk),
        id_ph
    );
    q
}

/// DELETE by id, returning the key so a miss can be told apart from a hit.
pub fn delete(master: &MasterConfig, id: &Value) -> QueryBuf {
    let mut q = QueryBuf::new();
    let id_ph = q.placeholder(id.clone(), master.pk_type.pg_type());
    q.sql = format!(
        "DELETE FROM {} WHERE {} = {} RETURNING {}",
        quoted(&master.table),
        quoted(&master.pk),
        id_ph,
        quoted(&master.pk)
    );
    q
}

//! Bootstrap master tables from the catalog: CREATE TABLE IF NOT EXISTS in catalog order.
//! Parents come first, so foreign-key joins can reference them.

use crate::config::{Catalog, MasterConfig, PkType};
use crate::error::AppError;
use sqlx::PgPool;

fn quote(s: &str) -> String {
    format!("\"{}\"", s.replace('"', "\"\""))
}

/// DDL for one master. Generated int8 keys become BIGSERIAL; writable keys keep their type.
pub fn create_table_sql(master: &MasterConfig) -> String {
    let mut col_defs = Vec::new();
    if master.column(&master.pk).is_none() {
        let typ = match master.pk_type {
            PkType::Int8 => "BIGSERIAL",
            PkType::Text => "TEXT",
        };
        col_defs.push(format!("{} {} PRIMARY KEY", quote(&master.pk), typ));
    }
    for c in &master.columns {
        let mut def = format!("{} {}", quote(c.name()), c.pg_type().to_uppercase());
        if c.name() == master.pk {
            def.push_str(" PRIMARY KEY");
        }
        if let Some(j) = master.joins.iter().find(|j| j.foreign_key && j.local == c.name()) {
            def.push_str(&format!(" REFERENCES {} ({})", quote(&j.table), quote(&j.foreign)));
        }
        col_defs.push(def);
    }
    format!(
        "CREATE TABLE IF NOT EXISTS {} (\n    {}\n)",
        quote(&master.table),
        col_defs.join(",\n    ")
    )
}

/// Create every catalog table that does not exist yet, in one transaction.
pub async fn apply_migrations(pool: &PgPool, catalog: &Catalog) -> Result<(), AppError> {
    let mut tx = pool.begin().await?;
    for m in &catalog.masters {
        let sql = create_table_sql(m);
        tracing::debug!(sql = %sql, "migration");
        sqlx::query(&sql).execute(&mut *tx).await?;
    }
    tx.commit().await?;
    tracing::info!(tables = catalog.masters.len(), "master tables ensured");
    Ok(())
}

//! services/api/src/adapters/db.rs
//!
//! This module contains the database adapter, which is the concrete implementation
//! of the `DataStore` port from the `core` crate. It reads and appends rows of the
//! hosted PostgreSQL tables using `sqlx`. Tables are assumed to exist already.

use async_trait::async_trait;
use design_studio_core::ports::{DataStore, PortError, PortResult, Row, Table};
use serde_json::Value;
use sqlx::types::Json;
use sqlx::PgPool;
use tracing::{error, info};

/// SQLSTATE for `undefined_column`.
const UNDEFINED_COLUMN: &str = "42703";
/// SQLSTATE for `undefined_table`.
const UNDEFINED_TABLE: &str = "42P01";

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A database adapter that implements the `DataStore` port.
#[derive(Clone)]
pub struct DbAdapter {
    pool: PgPool,
}

impl DbAdapter {
    /// Creates a new `DbAdapter`.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

//=========================================================================================
// SQL Helpers
//=========================================================================================

/// Quotes a column name for use as an SQL identifier.
fn quote_ident(name: &str) -> PortResult<String> {
    if name.is_empty() || name.contains('"') || name.contains('\0') {
        return Err(PortError::Unexpected(format!("Invalid column name '{}'", name)));
    }
    Ok(format!("\"{}\"", name))
}

fn map_sqlx_error(table: Table, e: sqlx::Error) -> PortError {
    if let sqlx::Error::Database(db_err) = &e {
        match db_err.code().as_deref() {
            Some(UNDEFINED_COLUMN) => return PortError::MissingColumn(db_err.message().to_string()),
            Some(UNDEFINED_TABLE) => {
                return PortError::NotFound(format!("Table {} not found", table.name()))
            }
            _ => {}
        }
    }
    PortError::Upstream(e.to_string())
}

/// Keeps only `columns` of each row, failing on a column the table lacks.
fn project(rows: Vec<Row>, columns: &[&str]) -> PortResult<Vec<Row>> {
    rows.into_iter()
        .map(|mut row| {
            let mut projected = Row::new();
            for column in columns {
                let value = row
                    .remove(*column)
                    .ok_or_else(|| PortError::MissingColumn(column.to_string()))?;
                projected.insert(column.to_string(), value);
            }
            Ok(projected)
        })
        .collect()
}

//=========================================================================================
// `DataStore` Trait Implementation
//=========================================================================================

#[async_trait]
impl DataStore for DbAdapter {
    async fn select(&self, table: Table, columns: Option<&[&str]>) -> PortResult<Vec<Row>> {
        let sql = format!("SELECT to_jsonb(t) FROM {} t", table.name());
        let values: Vec<Json<Value>> = sqlx::query_scalar(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                error!("Failed to read {}: {}", table.name(), e);
                map_sqlx_error(table, e)
            })?;

        let rows: Vec<Row> = values
            .into_iter()
            .filter_map(|Json(value)| match value {
                Value::Object(map) => Some(map),
                _ => None,
            })
            .collect();
        info!("Read {} rows from {}.", rows.len(), table.name());

        match columns {
            Some(columns) => project(rows, columns),
            None => Ok(rows),
        }
    }

    async fn insert(&self, table: Table, row: Row) -> PortResult<()> {
        if row.is_empty() {
            return Err(PortError::Unexpected("Refusing to insert an empty row".to_string()));
        }
        let columns = row
            .keys()
            .map(|k| quote_ident(k))
            .collect::<PortResult<Vec<_>>>()?
            .join(", ");

        // Let PostgreSQL coerce each JSON field onto the table's own column types.
        let sql = format!(
            "INSERT INTO {table} ({columns}) SELECT {columns} FROM jsonb_populate_record(NULL::{table}, $1)",
            table = table.name(),
            columns = columns,
        );
        sqlx::query(&sql)
            .bind(Json(Value::Object(row)))
            .execute(&self.pool)
            .await
            .map_err(|e| {
                error!("Failed to insert into {}: {}", table.name(), e);
                map_sqlx_error(table, e)
            })?;

        info!("Inserted one row into {}.", table.name());
        Ok(())
    }
}

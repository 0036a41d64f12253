//! Database pre-flight check
//!
//! Verifies that the tables backing the synchronized models exist before the
//! declarations are regenerated. This never runs as part of a sync.

use sqlx::FromRow;

use crate::db::connection::DatabaseConnection;
use crate::error::{Error, Result};

#[derive(FromRow)]
struct TableRow {
    table_name: String,
}

/// Fail with [`Error::Validation`] naming every expected table that is missing
pub async fn validate_schema(connection: &DatabaseConnection, expected_tables: &[String]) -> Result<()> {
    if expected_tables.is_empty() {
        return Ok(());
    }

    let existing = list_tables(connection).await.map_err(|e| {
        Error::Validation(format!("Failed to query {} catalog: {}", connection.driver(), e))
    })?;

    let missing: Vec<&str> = expected_tables
        .iter()
        .filter(|table| !existing.iter().any(|name| name == *table))
        .map(String::as_str)
        .collect();

    if !missing.is_empty() {
        tracing::warn!(missing = ?missing, "Expected tables are missing");
        return Err(Error::Validation(format!(
            "Missing tables: {}",
            missing.join(", ")
        )));
    }

    tracing::info!(tables = expected_tables.len(), "Database pre-flight check passed");
    Ok(())
}

async fn list_tables(connection: &DatabaseConnection) -> Result<Vec<String>> {
    let rows = match connection {
        DatabaseConnection::Postgres(pool) => {
            let sql = r#"
                SELECT table_name::text AS table_name
                FROM information_schema.tables
                WHERE table_schema = current_schema() AND table_type = 'BASE TABLE'
            "#;
            sqlx::query_as::<_, TableRow>(sql).fetch_all(pool).await?
        }
        DatabaseConnection::MySql(pool) => {
            let sql = r#"
                SELECT CAST(table_name AS CHAR) AS table_name
                FROM information_schema.tables
                WHERE table_schema = DATABASE()
                  AND table_type = 'BASE TABLE'
            "#;
            sqlx::query_as::<_, TableRow>(sql).fetch_all(pool).await?
        }
        DatabaseConnection::Sqlite(pool) => {
            let sql = r#"SELECT name AS table_name FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%'"#;
            sqlx::query_as::<_, TableRow>(sql).fetch_all(pool).await?
        }
    };

    Ok(rows.into_iter().map(|row| row.table_name).collect())
}

//! Deployment Repository
//!
//! Handles all database operations related to deployment records.

use chrono::{DateTime, Utc};
use nexus_core::{DeploymentRecord, EnvironmentKind, Property};
use sqlx::{Sqlite, SqlitePool};

/// Insert an empty deployment row and return its id
///
/// Properties are filled in afterwards with `set_property`. Write functions
/// accept a pool or an open transaction (`&mut *tx`).
pub async fn insert<'e, E>(executor: E, environment: EnvironmentKind) -> Result<i64, sqlx::Error>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
{
    let now = Utc::now();

    let result = sqlx::query(
        r#"
        INSERT INTO deployments (environment, created_at, updated_at)
        VALUES (?, ?, ?)
        "#,
    )
    .bind(environment.as_str())
    .bind(now)
    .bind(now)
    .execute(executor)
    .await?;

    Ok(result.last_insert_rowid())
}

/// Store a single property value on a row
pub async fn set_property<'e, E>(
    executor: E,
    id: i64,
    property: Property,
    value: &str,
) -> Result<bool, sqlx::Error>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
{
    // Column names come from the closed Property enum, never from input
    let sql = format!(
        "UPDATE deployments SET {} = ?, updated_at = ? WHERE id = ?",
        property.column()
    );

    let result = sqlx::query(&sql)
        .bind(value)
        .bind(Utc::now())
        .bind(id)
        .execute(executor)
        .await?;

    Ok(result.rows_affected() > 0)
}

/// Store the environment variant tag on a row
pub async fn set_environment<'e, E>(
    executor: E,
    id: i64,
    environment: EnvironmentKind,
) -> Result<bool, sqlx::Error>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
{
    let result = sqlx::query("UPDATE deployments SET environment = ?, updated_at = ? WHERE id = ?")
        .bind(environment.as_str())
        .bind(Utc::now())
        .bind(id)
        .execute(executor)
        .await?;

    Ok(result.rows_affected() > 0)
}

/// Find a deployment by name
pub async fn find_by_name(
    pool: &SqlitePool,
    name: &str,
) -> Result<Option<DeploymentRecord>, sqlx::Error> {
    let row = sqlx::query_as::<_, DeploymentRow>(
        r#"
        SELECT id, name, domain, email, environment, created_at, updated_at
        FROM deployments
        WHERE name = ?
        "#,
    )
    .bind(name)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(|r| r.into()))
}

/// List all deployments, oldest first
pub async fn list_all(pool: &SqlitePool) -> Result<Vec<DeploymentRecord>, sqlx::Error> {
    let rows = sqlx::query_as::<_, DeploymentRow>(
        r#"
        SELECT id, name, domain, email, environment, created_at, updated_at
        FROM deployments
        ORDER BY id ASC
        "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(|r| r.into()).collect())
}

/// Delete a deployment by name
pub async fn delete_by_name(pool: &SqlitePool, name: &str) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM deployments WHERE name = ?")
        .bind(name)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

// =============================================================================
// Database Row Types
// =============================================================================

#[derive(sqlx::FromRow)]
struct DeploymentRow {
    id: i64,
    name: Option<String>,
    domain: Option<String>,
    email: Option<String>,
    environment: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<DeploymentRow> for DeploymentRecord {
    fn from(row: DeploymentRow) -> Self {
        DeploymentRecord {
            id: row.id,
            name: row.name,
            domain: row.domain,
            email: row.email,
            environment: row.environment,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

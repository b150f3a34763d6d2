//! Minimal data initialization for Merx.
//!
//! Seeds an admin user so a fresh deployment has a working account.

use sqlx::{PgPool, Row};
use tracing::info;

use super::Result;

/// Initialize minimal data for the system to start.
///
/// Creates the admin user if no user with the given email exists.
/// Idempotent: safe to run multiple times.
pub async fn init_minimal_data(pool: &PgPool, admin_email: Option<String>) -> Result<i64> {
    let admin_email = admin_email.unwrap_or_else(|| "admin@merx.local".to_string());

    let mut tx = pool.begin().await?;

    let existing = sqlx::query(
        r#"
        SELECT id FROM users
        WHERE email = $1 AND deleted = FALSE
        LIMIT 1
        "#,
    )
    .bind(&admin_email)
    .fetch_optional(&mut *tx)
    .await?;

    if let Some(row) = existing {
        let id: i64 = row.get("id");
        info!(user_id = id, email = %admin_email, "Admin user already exists");
        tx.commit().await?;
        return Ok(id);
    }

    let id: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO users (email, first_name, last_name, phone, status, role, created_at, updated_at, deleted, version)
        VALUES ($1, 'Merx', 'Admin', NULL, 'ACTIVE', 'ADMIN', now(), now(), FALSE, 1)
        RETURNING id
        "#,
    )
    .bind(&admin_email)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;

    info!(user_id = id, email = %admin_email, "Admin user created");
    Ok(id)
}

//! Application settings persistence.
//!
//! Key/value settings stored as text and parsed by the consumer.

use crate::error::{DuckboardError, Result};
use sqlx::sqlite::SqlitePool;
use tracing::warn;

/// Upserts a setting, refreshing its timestamp.
pub async fn set_setting(pool: &SqlitePool, key: &str, value: &str) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO app_settings (key, value, updated_at)
        VALUES (?, ?, datetime('now'))
        ON CONFLICT(key) DO UPDATE SET
            value = excluded.value,
            updated_at = datetime('now')
        "#,
    )
    .bind(key)
    .bind(value)
    .execute(pool)
    .await
    .map_err(|e| DuckboardError::state_store(format!("Failed to save setting '{key}': {e}")))?;

    Ok(())
}

/// Retrieves a setting, or `None` when absent.
pub async fn get_setting(pool: &SqlitePool, key: &str) -> Result<Option<String>> {
    let row: Option<(String,)> = sqlx::query_as("SELECT value FROM app_settings WHERE key = ?")
        .bind(key)
        .fetch_optional(pool)
        .await
        .map_err(|e| DuckboardError::state_store(format!("Failed to read setting '{key}': {e}")))?;

    Ok(row.map(|(v,)| v))
}

/// Retrieves a setting, falling back to the given default when absent.
pub async fn get_setting_or(pool: &SqlitePool, key: &str, default: &str) -> Result<String> {
    Ok(get_setting(pool, key)
        .await?
        .unwrap_or_else(|| default.to_string()))
}

/// Retrieves an integer setting.
///
/// Falls back to the default when the key is absent or the stored text does
/// not parse; a malformed value is a non-critical condition and never fails
/// the caller.
pub async fn get_setting_int(pool: &SqlitePool, key: &str, default: i64) -> Result<i64> {
    match get_setting(pool, key).await? {
        Some(text) => match text.parse::<i64>() {
            Ok(value) => Ok(value),
            Err(_) => {
                warn!(key, value = %text, "setting is not an integer, using default");
                Ok(default)
            }
        },
        None => Ok(default),
    }
}

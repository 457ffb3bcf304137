use sqlx::{query, query_as, SqlitePool};

use crate::db::models::KvRecord;

/// Reads the value stored under `key`
pub async fn get_value(pool: &SqlitePool, key: &str) -> Result<Option<String>, sqlx::Error> {
    let record = query_as::<_, KvRecord>("SELECT key, value, updated FROM kv_store WHERE key = ?")
        .bind(key)
        .fetch_optional(pool)
        .await?;

    Ok(record.map(|record| record.value))
}

/// Inserts or replaces the value stored under `key`
pub async fn put_value(pool: &SqlitePool, key: &str, value: &str) -> Result<(), sqlx::Error> {
    let updated = chrono::Utc::now().to_rfc3339();

    query(
        "INSERT INTO kv_store (key, value, updated) VALUES (?, ?, ?)
         ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated = excluded.updated",
    )
    .bind(key)
    .bind(value)
    .bind(updated)
    .execute(pool)
    .await?;

    Ok(())
}

/// Removes `key`, returning whether a row was deleted
pub async fn delete_value(pool: &SqlitePool, key: &str) -> Result<bool, sqlx::Error> {
    let result = query("DELETE FROM kv_store WHERE key = ?")
        .bind(key)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use crate::db::setup_database;
    use sqlx::sqlite::SqlitePoolOptions;

    /// In-memory database with the schema applied. A single connection keeps
    /// every query on the same memory database.
    pub async fn setup_test_db() -> Result<SqlitePool, sqlx::Error> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await?;

        setup_database(&pool).await?;
        Ok(pool)
    }

    #[tokio::test]
    async fn test_put_then_get_value() -> Result<(), Box<dyn std::error::Error>> {
        let pool = setup_test_db().await?;

        assert_eq!(get_value(&pool, "key").await?, None);

        put_value(&pool, "key", "first-token").await?;
        assert_eq!(get_value(&pool, "key").await?.as_deref(), Some("first-token"));

        // Writing again replaces rather than duplicating
        put_value(&pool, "key", "second-token").await?;
        assert_eq!(get_value(&pool, "key").await?.as_deref(), Some("second-token"));

        Ok(())
    }

    #[tokio::test]
    async fn test_delete_value() -> Result<(), Box<dyn std::error::Error>> {
        let pool = setup_test_db().await?;
        put_value(&pool, "key", "token").await?;

        assert!(delete_value(&pool, "key").await?);
        assert!(!delete_value(&pool, "key").await?);
        assert_eq!(get_value(&pool, "key").await?, None);

        Ok(())
    }
}

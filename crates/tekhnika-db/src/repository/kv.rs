//! # Key-Value Repository
//!
//! Small string store for client-side state such as the persisted cart.
//! Values are opaque text; the typed helpers store JSON.

use chrono::Utc;
use serde::{de::DeserializeOwned, Serialize};
use sqlx::SqlitePool;
use tracing::{debug, warn};

use crate::error::{DbError, DbResult};

/// Repository for the `kv_store` table.
#[derive(Debug, Clone)]
pub struct KvRepository {
    pool: SqlitePool,
}

impl KvRepository {
    /// Creates a new KvRepository.
    pub fn new(pool: SqlitePool) -> Self {
        KvRepository { pool }
    }

    /// Reads a raw value.
    pub async fn get(&self, key: &str) -> DbResult<Option<String>> {
        let value: Option<String> = sqlx::query_scalar("SELECT value FROM kv_store WHERE key = ?1")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;

        Ok(value)
    }

    /// Writes a raw value, replacing any previous one.
    pub async fn put(&self, key: &str, value: &str) -> DbResult<()> {
        debug!(key = %key, bytes = value.len(), "Writing kv entry");

        sqlx::query(
            r#"
            INSERT INTO kv_store (key, value, updated_at)
            VALUES (?1, ?2, ?3)
            ON CONFLICT (key) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(key)
        .bind(value)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Deletes a key. Returns whether it existed.
    pub async fn delete(&self, key: &str) -> DbResult<bool> {
        let result = sqlx::query("DELETE FROM kv_store WHERE key = ?1")
            .bind(key)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Reads and deserializes a JSON value.
    ///
    /// Returns `Corrupt` when the stored text does not parse as `T`.
    pub async fn get_json<T: DeserializeOwned>(&self, key: &str) -> DbResult<Option<T>> {
        match self.get(key).await? {
            Some(raw) => serde_json::from_str(&raw).map(Some).map_err(|e| {
                warn!(key = %key, error = %e, "Stored value does not parse");
                DbError::corrupt(key, e)
            }),
            None => Ok(None),
        }
    }

    /// Serializes and writes a JSON value.
    pub async fn put_json<T: Serialize>(&self, key: &str, value: &T) -> DbResult<()> {
        let raw = serde_json::to_string(value)?;
        self.put(key, &raw).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Database, DbConfig};
    use chrono::TimeZone;
    use tekhnika_core::{Cart, Money, Product};

    #[tokio::test]
    async fn test_put_get_delete() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let kv = db.kv();

        assert_eq!(kv.get("theme").await.unwrap(), None);

        kv.put("theme", "dark").await.unwrap();
        kv.put("theme", "light").await.unwrap();
        assert_eq!(kv.get("theme").await.unwrap().as_deref(), Some("light"));

        assert!(kv.delete("theme").await.unwrap());
        assert!(!kv.delete("theme").await.unwrap());
    }

    #[tokio::test]
    async fn test_cart_round_trip() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let now = Utc.with_ymd_and_hms(2024, 11, 29, 10, 0, 0).unwrap();

        let mut cart = Cart::new();
        let fridge =
            Product::new("fridge", "Холодильник", Money::from_rubles(45_000)).with_stock(3);
        cart.add_product(&fridge, 2, now).unwrap();

        db.kv().put_json("cart", &cart).await.unwrap();
        let loaded: Cart = db.kv().get_json("cart").await.unwrap().unwrap();
        assert_eq!(loaded, cart);
    }

    #[tokio::test]
    async fn test_unparseable_json_is_corrupt() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        db.kv().put("cart", "{not json").await.unwrap();

        let result: DbResult<Option<Cart>> = db.kv().get_json("cart").await;
        assert!(matches!(result, Err(DbError::Corrupt { .. })));
    }
}

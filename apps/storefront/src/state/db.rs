//! # Database State
//!
//! Wraps the `Database` handle for use in commands.
//!
//! The `Database` from `tekhnika-db` holds a `SqlitePool`, which is
//! thread-safe; commands run queries concurrently without extra locking.
//!
//! ## Usage in Commands
//! ```rust,ignore
//! pub async fn list_categories(db: &DbState) -> Result<Vec<Category>, ApiError> {
//!     Ok(db.inner().categories().list().await?)
//! }
//! ```

use tekhnika_db::{Database, DbConfig};

use crate::error::{ApiError, ErrorCode};

/// Database handle shared by all commands.
#[derive(Debug, Clone)]
pub struct DbState {
    db: Database,
}

impl DbState {
    /// Wraps an open database.
    pub fn new(db: Database) -> Self {
        DbState { db }
    }

    /// Opens (and migrates) the database described by `config`.
    pub async fn open(config: DbConfig) -> Result<Self, ApiError> {
        let db = Database::new(config).await?;
        if !db.health_check().await {
            return Err(ApiError::new(
                ErrorCode::DatabaseError,
                "Database is not responding",
            ));
        }
        Ok(DbState::new(db))
    }

    /// Returns a reference to the inner Database.
    pub fn inner(&self) -> &Database {
        &self.db
    }
}

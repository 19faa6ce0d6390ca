//! # Category Repository
//!
//! Categories for catalog navigation, ordered by `sort_order`.

use sqlx::{FromRow, SqlitePool};
use tracing::{debug, warn};

use crate::error::DbResult;
use tekhnika_core::document::CategoryDocument;
use tekhnika_core::validation;
use tekhnika_core::Category;

#[derive(Debug, Clone, FromRow)]
struct CategoryRow {
    id: String,
    name: String,
    slug: String,
    sort_order: i64,
}

impl From<CategoryRow> for Category {
    fn from(row: CategoryRow) -> Self {
        Category {
            id: row.id,
            name: row.name,
            slug: row.slug,
            sort_order: row.sort_order,
        }
    }
}

/// Repository for category database operations.
#[derive(Debug, Clone)]
pub struct CategoryRepository {
    pool: SqlitePool,
}

impl CategoryRepository {
    /// Creates a new CategoryRepository.
    pub fn new(pool: SqlitePool) -> Self {
        CategoryRepository { pool }
    }

    /// Lists all categories in menu order.
    pub async fn list(&self) -> DbResult<Vec<Category>> {
        let rows = sqlx::query_as::<_, CategoryRow>(
            "SELECT id, name, slug, sort_order FROM categories ORDER BY sort_order, name",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Category::from).collect())
    }

    /// Gets a category by id or slug.
    pub async fn find(&self, id_or_slug: &str) -> DbResult<Option<Category>> {
        let row = sqlx::query_as::<_, CategoryRow>(
            "SELECT id, name, slug, sort_order FROM categories WHERE id = ?1 OR slug = ?1",
        )
        .bind(id_or_slug)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Category::from))
    }

    /// Inserts or replaces a category.
    pub async fn upsert(&self, category: &Category) -> DbResult<()> {
        validation::validate_slug(&category.slug)?;
        debug!(id = %category.id, slug = %category.slug, "Upserting category");

        sqlx::query(
            r#"
            INSERT INTO categories (id, name, slug, sort_order)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT (id) DO UPDATE SET
                name = excluded.name,
                slug = excluded.slug,
                sort_order = excluded.sort_order
            "#,
        )
        .bind(&category.id)
        .bind(&category.name)
        .bind(&category.slug)
        .bind(category.sort_order)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Imports category documents; returns `(imported, rejected)` where
    /// `rejected` holds `(id, reason)` pairs.
    pub async fn import(
        &self,
        documents: Vec<CategoryDocument>,
    ) -> DbResult<(usize, Vec<(String, String)>)> {
        let mut imported = 0;
        let mut rejected = Vec::new();

        for document in documents {
            let id = document.id.clone();
            match Category::try_from(document) {
                Ok(category) => {
                    self.upsert(&category).await?;
                    imported += 1;
                }
                Err(e) => {
                    warn!(id = %id, error = %e, "Skipping invalid category document");
                    rejected.push((id, e.to_string()));
                }
            }
        }

        Ok((imported, rejected))
    }
}

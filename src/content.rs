//! Content item storage.
//!
//! The engine audits content it does not own; in the original deployment
//! the surrounding CMS is the entity source. Standalone, registered items
//! live in the `content_items` table so the batch driver and CLI have
//! something to iterate. Re-registering an item with changed text bumps its
//! revision id.

use anyhow::Result;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use crate::models::ContentItem;

#[derive(Clone)]
pub struct ContentStore {
    pool: SqlitePool,
}

/// Input for registering content. A missing entity id gets a generated UUID.
#[derive(Debug, Clone)]
pub struct NewContent {
    pub entity_type: String,
    pub entity_id: Option<String>,
    pub langcode: String,
    pub title: String,
    pub body: String,
}

impl ContentStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert or update a content item, returning its entity id. An update
    /// that changes the title or body increments `revision_id`.
    pub async fn register(&self, content: &NewContent) -> Result<String> {
        let entity_id = content
            .entity_id
            .clone()
            .unwrap_or_else(|| Uuid::new_v4().to_string());
        let now = chrono::Utc::now().timestamp();

        let existing = sqlx::query(
            "SELECT revision_id, title, body FROM content_items \
             WHERE entity_type = ? AND entity_id = ? AND langcode = ?",
        )
        .bind(&content.entity_type)
        .bind(&entity_id)
        .bind(&content.langcode)
        .fetch_optional(&self.pool)
        .await?;

        let revision_id = match existing {
            Some(row) => {
                let old_revision: i64 = row.get("revision_id");
                let old_title: String = row.get("title");
                let old_body: String = row.get("body");
                if old_title == content.title && old_body == content.body {
                    old_revision
                } else {
                    old_revision + 1
                }
            }
            None => 1,
        };

        sqlx::query(
            r#"
            INSERT INTO content_items
                (entity_type, entity_id, langcode, revision_id, title, body, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(entity_type, entity_id, langcode) DO UPDATE SET
                revision_id = excluded.revision_id,
                title = excluded.title,
                body = excluded.body,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(&content.entity_type)
        .bind(&entity_id)
        .bind(&content.langcode)
        .bind(revision_id)
        .bind(&content.title)
        .bind(&content.body)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(entity_id)
    }

    pub async fn get(
        &self,
        entity_type: &str,
        entity_id: &str,
        langcode: &str,
    ) -> Result<Option<ContentItem>> {
        let row = sqlx::query(
            "SELECT entity_type, entity_id, langcode, revision_id, title, body, updated_at \
             FROM content_items WHERE entity_type = ? AND entity_id = ? AND langcode = ?",
        )
        .bind(entity_type)
        .bind(entity_id)
        .bind(langcode)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| row_to_item(&r)))
    }

    /// All items, optionally filtered by entity type, oldest update first.
    pub async fn list(&self, entity_type: Option<&str>) -> Result<Vec<ContentItem>> {
        let rows = match entity_type {
            Some(et) => {
                sqlx::query(
                    "SELECT entity_type, entity_id, langcode, revision_id, title, body, updated_at \
                     FROM content_items WHERE entity_type = ? \
                     ORDER BY updated_at, entity_type, entity_id, langcode",
                )
                .bind(et)
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query(
                    "SELECT entity_type, entity_id, langcode, revision_id, title, body, updated_at \
                     FROM content_items ORDER BY updated_at, entity_type, entity_id, langcode",
                )
                .fetch_all(&self.pool)
                .await?
            }
        };

        Ok(rows.iter().map(row_to_item).collect())
    }

    /// Remove an item in every language, along with its cached scores.
    pub async fn remove(&self, entity_type: &str, entity_id: &str) -> Result<bool> {
        let mut tx = self.pool.begin().await?;

        let deleted = sqlx::query(
            "DELETE FROM content_items WHERE entity_type = ? AND entity_id = ?",
        )
        .bind(entity_type)
        .bind(entity_id)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        sqlx::query("DELETE FROM audit_scores WHERE entity_type = ? AND entity_id = ?")
            .bind(entity_type)
            .bind(entity_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(deleted > 0)
    }
}

fn row_to_item(row: &sqlx::sqlite::SqliteRow) -> ContentItem {
    ContentItem {
        entity_type: row.get("entity_type"),
        entity_id: row.get("entity_id"),
        langcode: row.get("langcode"),
        revision_id: row.get("revision_id"),
        title: row.get("title"),
        body: row.get("body"),
        updated_at: row.get("updated_at"),
    }
}

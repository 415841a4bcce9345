//! Persistent score cache.
//!
//! The `audit_scores` table is the cache — "caching" here means skipping
//! re-analysis work, not an extra memory tier, so there is no in-process
//! memoization and every mutation is persisted immediately. Storage errors
//! propagate to the caller; retries belong to the batch driver.

use anyhow::Result;
use sqlx::{Row, SqlitePool};

use crate::models::{EntityRef, ScoreRecord};

#[derive(Clone)]
pub struct ScoreCache {
    pool: SqlitePool,
}

impl ScoreCache {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Fetch the live score for the full cache key, newest first. A miss is
    /// indistinguishable from "never analyzed" by design: the fingerprints
    /// are pure functions of current state.
    pub async fn lookup(
        &self,
        entity: &EntityRef,
        factor_id: &str,
        content_hash: &str,
        config_hash: &str,
    ) -> Result<Option<f64>> {
        let score: Option<f64> = sqlx::query_scalar(
            r#"
            SELECT score FROM audit_scores
            WHERE entity_type = ? AND entity_id = ? AND langcode = ?
              AND factor_id = ? AND content_hash = ? AND config_hash = ?
            ORDER BY analyzed_at DESC
            LIMIT 1
            "#,
        )
        .bind(&entity.entity_type)
        .bind(&entity.entity_id)
        .bind(&entity.langcode)
        .bind(factor_id)
        .bind(content_hash)
        .bind(config_hash)
        .fetch_optional(&self.pool)
        .await?;

        Ok(score)
    }

    /// Write a score for the full cache key as a single atomic upsert.
    ///
    /// The UNIQUE constraint over the key tuple guarantees at most one live
    /// row even under concurrent writers; last writer wins on the value,
    /// which is acceptable since both computed from identical fingerprints.
    /// The timestamp is refreshed on every write.
    #[allow(clippy::too_many_arguments)]
    pub async fn store(
        &self,
        entity: &EntityRef,
        revision_id: i64,
        factor_id: &str,
        score: f64,
        content_hash: &str,
        config_hash: &str,
    ) -> Result<()> {
        let now = chrono::Utc::now().timestamp();

        sqlx::query(
            r#"
            INSERT INTO audit_scores
                (entity_type, entity_id, revision_id, langcode, factor_id,
                 score, content_hash, config_hash, analyzed_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(entity_type, entity_id, langcode, factor_id, content_hash, config_hash)
            DO UPDATE SET
                revision_id = excluded.revision_id,
                score = excluded.score,
                analyzed_at = excluded.analyzed_at
            "#,
        )
        .bind(&entity.entity_type)
        .bind(&entity.entity_id)
        .bind(revision_id)
        .bind(&entity.langcode)
        .bind(factor_id)
        .bind(score)
        .bind(content_hash)
        .bind(config_hash)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Delete all score rows for an entity, in every language, regardless of
    /// factor, hash, or timestamp. Used by forced re-analysis.
    pub async fn clear(&self, entity_type: &str, entity_id: &str) -> Result<u64> {
        let result = sqlx::query(
            "DELETE FROM audit_scores WHERE entity_type = ? AND entity_id = ?",
        )
        .bind(entity_type)
        .bind(entity_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    /// All live score rows for an entity, in every language, newest first.
    pub async fn records(&self, entity_type: &str, entity_id: &str) -> Result<Vec<ScoreRecord>> {
        let rows = sqlx::query(
            r#"
            SELECT entity_type, entity_id, revision_id, langcode, factor_id,
                   score, content_hash, config_hash, analyzed_at
            FROM audit_scores
            WHERE entity_type = ? AND entity_id = ?
            ORDER BY analyzed_at DESC, factor_id
            "#,
        )
        .bind(entity_type)
        .bind(entity_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .iter()
            .map(|row| ScoreRecord {
                entity_type: row.get("entity_type"),
                entity_id: row.get("entity_id"),
                revision_id: row.get("revision_id"),
                langcode: row.get("langcode"),
                factor_id: row.get("factor_id"),
                score: row.get("score"),
                content_hash: row.get("content_hash"),
                config_hash: row.get("config_hash"),
                analyzed_at: row.get("analyzed_at"),
            })
            .collect())
    }

    /// Entity ids of the given type with any analysis newer than the cutoff
    /// timestamp. Used by the batch driver to skip recently analyzed items.
    pub async fn analyzed_since(&self, entity_type: &str, cutoff: i64) -> Result<Vec<String>> {
        let ids: Vec<String> = sqlx::query_scalar(
            "SELECT DISTINCT entity_id FROM audit_scores \
             WHERE entity_type = ? AND analyzed_at > ?",
        )
        .bind(entity_type)
        .bind(cutoff)
        .fetch_all(&self.pool)
        .await?;

        Ok(ids)
    }
}

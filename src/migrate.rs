use anyhow::Result;

use crate::config::Config;
use crate::db;

pub async fn run_migrations(config: &Config) -> Result<()> {
    let pool = db::connect(config).await?;

    // Create factors table
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS factors (
            id TEXT PRIMARY KEY,
            label TEXT NOT NULL,
            description TEXT NOT NULL DEFAULT '',
            kind TEXT NOT NULL,
            options_json TEXT,
            weight INTEGER NOT NULL DEFAULT 0,
            enabled INTEGER NOT NULL DEFAULT 1
        )
        "#,
    )
    .execute(&pool)
    .await?;

    // Create content items table
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS content_items (
            entity_type TEXT NOT NULL,
            entity_id TEXT NOT NULL,
            langcode TEXT NOT NULL DEFAULT 'en',
            revision_id INTEGER NOT NULL DEFAULT 1,
            title TEXT NOT NULL DEFAULT '',
            body TEXT NOT NULL DEFAULT '',
            updated_at INTEGER NOT NULL,
            PRIMARY KEY (entity_type, entity_id, langcode)
        )
        "#,
    )
    .execute(&pool)
    .await?;

    // Create audit scores table. The UNIQUE constraint over the full cache
    // key is what makes store() an atomic upsert with at most one live row
    // per key tuple.
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS audit_scores (
            entity_type TEXT NOT NULL,
            entity_id TEXT NOT NULL,
            revision_id INTEGER NOT NULL DEFAULT 0,
            langcode TEXT NOT NULL,
            factor_id TEXT NOT NULL,
            score REAL NOT NULL,
            content_hash TEXT NOT NULL,
            config_hash TEXT NOT NULL,
            analyzed_at INTEGER NOT NULL,
            UNIQUE(entity_type, entity_id, langcode, factor_id, content_hash, config_hash)
        )
        "#,
    )
    .execute(&pool)
    .await?;

    // Create indexes
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_audit_scores_factor ON audit_scores(factor_id)")
        .execute(&pool)
        .await?;
    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_audit_scores_entity ON audit_scores(entity_type, entity_id)",
    )
    .execute(&pool)
    .await?;
    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_audit_scores_analyzed_at ON audit_scores(analyzed_at DESC)",
    )
    .execute(&pool)
    .await?;
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_factors_weight ON factors(weight)")
        .execute(&pool)
        .await?;

    pool.close().await;
    Ok(())
}

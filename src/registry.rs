//! Factor definition storage.
//!
//! CRUD over the `factors` table. Listing order is weight, then label, and
//! that order is what the config fingerprint serializes, so it must stay
//! stable across calls.

use anyhow::{bail, Result};
use sqlx::{Row, SqlitePool};

use crate::models::{Factor, FactorKind};

#[derive(Clone)]
pub struct FactorRegistry {
    pool: SqlitePool,
}

impl FactorRegistry {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// All factors, including disabled ones, in registry order.
    pub async fn all(&self) -> Result<Vec<Factor>> {
        let rows = sqlx::query(
            "SELECT id, label, description, kind, options_json, weight, enabled \
             FROM factors ORDER BY weight, label",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_factor).collect()
    }

    /// Enabled factors only, in registry order.
    pub async fn enabled(&self) -> Result<Vec<Factor>> {
        Ok(self.all().await?.into_iter().filter(|f| f.enabled).collect())
    }

    pub async fn get(&self, factor_id: &str) -> Result<Option<Factor>> {
        let row = sqlx::query(
            "SELECT id, label, description, kind, options_json, weight, enabled \
             FROM factors WHERE id = ?",
        )
        .bind(factor_id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(row_to_factor).transpose()
    }

    /// Insert or update a factor definition. The id is the merge key and is
    /// immutable; everything else is replaced.
    pub async fn save(&self, factor: &Factor) -> Result<()> {
        validate(factor)?;

        let options_json = match &factor.kind {
            FactorKind::Quantitative => None,
            FactorKind::Qualitative { options } => Some(serde_json::to_string(options)?),
        };

        sqlx::query(
            r#"
            INSERT INTO factors (id, label, description, kind, options_json, weight, enabled)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                label = excluded.label,
                description = excluded.description,
                kind = excluded.kind,
                options_json = excluded.options_json,
                weight = excluded.weight,
                enabled = excluded.enabled
            "#,
        )
        .bind(&factor.id)
        .bind(&factor.label)
        .bind(&factor.description)
        .bind(factor.kind.as_str())
        .bind(options_json)
        .bind(factor.weight)
        .bind(factor.enabled as i64)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Delete a factor and cascade-delete every score row referencing it,
    /// for any entity.
    pub async fn delete(&self, factor_id: &str) -> Result<bool> {
        let mut tx = self.pool.begin().await?;

        let deleted = sqlx::query("DELETE FROM factors WHERE id = ?")
            .bind(factor_id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        sqlx::query("DELETE FROM audit_scores WHERE factor_id = ?")
            .bind(factor_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(deleted > 0)
    }
}

fn row_to_factor(row: &sqlx::sqlite::SqliteRow) -> Result<Factor> {
    let kind_str: String = row.get("kind");
    let options_json: Option<String> = row.get("options_json");

    let kind = match kind_str.as_str() {
        "quantitative" => FactorKind::Quantitative,
        "qualitative" => {
            let options: Vec<String> = match options_json {
                Some(json) => serde_json::from_str(&json)?,
                None => Vec::new(),
            };
            FactorKind::Qualitative { options }
        }
        other => bail!("Unknown factor kind in storage: '{}'", other),
    };

    let enabled: i64 = row.get("enabled");

    Ok(Factor {
        id: row.get("id"),
        label: row.get("label"),
        description: row.get("description"),
        kind,
        weight: row.get("weight"),
        enabled: enabled != 0,
    })
}

fn validate(factor: &Factor) -> Result<()> {
    if factor.id.is_empty()
        || !factor
            .id
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
    {
        bail!(
            "Factor id '{}' must be a machine name (lowercase letters, digits, underscores)",
            factor.id
        );
    }
    if factor.label.trim().is_empty() {
        bail!("Factor label must not be empty");
    }
    if let FactorKind::Qualitative { options } = &factor.kind {
        if options.len() < 2 {
            bail!("Qualitative factor '{}' needs at least 2 options", factor.id);
        }
        let mut seen = std::collections::HashSet::new();
        for option in options {
            if option.trim().is_empty() {
                bail!("Qualitative factor '{}' has an empty option", factor.id);
            }
            if !seen.insert(option.as_str()) {
                bail!(
                    "Qualitative factor '{}' has duplicate option '{}'",
                    factor.id,
                    option
                );
            }
        }
    }
    Ok(())
}

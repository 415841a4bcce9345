//! Factor management commands.
//!
//! The CLI counterpart of the factor administration screens: add, list,
//! update, and delete scoring factor definitions. Any change made here
//! shifts the config fingerprint, which invalidates every cached score.

use anyhow::{bail, Result};

use crate::config::Config;
use crate::db;
use crate::models::{Factor, FactorKind};
use crate::registry::FactorRegistry;

#[allow(clippy::too_many_arguments)]
pub async fn run_factor_add(
    config: &Config,
    id: String,
    label: String,
    description: String,
    kind: String,
    options: Vec<String>,
    weight: i64,
    disabled: bool,
) -> Result<()> {
    let pool = db::connect(config).await?;
    let registry = FactorRegistry::new(pool.clone());

    if registry.get(&id).await?.is_some() {
        pool.close().await;
        bail!("factor '{}' already exists (use `factor set` to update it)", id);
    }

    let kind = parse_kind(&kind, options)?;
    let factor = Factor {
        id: id.clone(),
        label,
        description,
        kind,
        weight,
        enabled: !disabled,
    };

    registry.save(&factor).await?;
    println!("added factor '{}'", id);

    pool.close().await;
    Ok(())
}

/// Update fields of an existing factor. Unset flags keep current values;
/// the id itself is immutable.
pub async fn run_factor_set(
    config: &Config,
    id: String,
    label: Option<String>,
    description: Option<String>,
    options: Option<Vec<String>>,
    weight: Option<i64>,
    enabled: Option<bool>,
) -> Result<()> {
    let pool = db::connect(config).await?;
    let registry = FactorRegistry::new(pool.clone());

    let mut factor = match registry.get(&id).await? {
        Some(f) => f,
        None => {
            pool.close().await;
            bail!("factor not found: {}", id);
        }
    };

    if let Some(label) = label {
        factor.label = label;
    }
    if let Some(description) = description {
        factor.description = description;
    }
    if let Some(options) = options {
        match factor.kind {
            FactorKind::Qualitative { .. } => {
                factor.kind = FactorKind::Qualitative { options };
            }
            FactorKind::Quantitative => {
                pool.close().await;
                bail!("factor '{}' is quantitative and cannot carry options", id);
            }
        }
    }
    if let Some(weight) = weight {
        factor.weight = weight;
    }
    if let Some(enabled) = enabled {
        factor.enabled = enabled;
    }

    registry.save(&factor).await?;
    println!("updated factor '{}'", id);

    pool.close().await;
    Ok(())
}

pub async fn run_factor_list(config: &Config) -> Result<()> {
    let pool = db::connect(config).await?;
    let registry = FactorRegistry::new(pool.clone());

    let factors = registry.all().await?;
    if factors.is_empty() {
        println!("No factors defined.");
        pool.close().await;
        return Ok(());
    }

    println!(
        "{:<20} {:<24} {:<13} {:>6}  {:<8}  OPTIONS",
        "ID", "LABEL", "KIND", "WEIGHT", "ENABLED"
    );
    for factor in &factors {
        println!(
            "{:<20} {:<24} {:<13} {:>6}  {:<8}  {}",
            factor.id,
            factor.label,
            factor.kind.as_str(),
            factor.weight,
            factor.enabled,
            factor.kind.options().join(", ")
        );
    }

    pool.close().await;
    Ok(())
}

/// Delete a factor definition and cascade-delete all of its cached scores.
pub async fn run_factor_delete(config: &Config, id: String) -> Result<()> {
    let pool = db::connect(config).await?;
    let registry = FactorRegistry::new(pool.clone());

    if !registry.delete(&id).await? {
        pool.close().await;
        bail!("factor not found: {}", id);
    }
    println!("deleted factor '{}' and its cached scores", id);

    pool.close().await;
    Ok(())
}

fn parse_kind(kind: &str, options: Vec<String>) -> Result<FactorKind> {
    match kind {
        "quantitative" => {
            if !options.is_empty() {
                bail!("quantitative factors do not take options");
            }
            Ok(FactorKind::Quantitative)
        }
        "qualitative" => Ok(FactorKind::Qualitative { options }),
        other => bail!(
            "Unknown factor kind: '{}'. Must be quantitative or qualitative.",
            other
        ),
    }
}

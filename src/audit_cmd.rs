//! Single-entity audit command.
//!
//! Evaluates one registered content item and prints the report: qualitative
//! classifications as a table first, quantitative scores as banded gauge
//! lines below, matching the order factors are configured in.

use anyhow::{bail, Result};

use crate::analyzer::{score_status, Analyzer, AuditStatus};
use crate::cache::ScoreCache;
use crate::codec;
use crate::config::Config;
use crate::content::ContentStore;
use crate::db;
use crate::models::FactorKind;
use crate::provider;
use crate::registry::FactorRegistry;

pub async fn run_audit(
    config: &Config,
    entity_type: &str,
    entity_id: &str,
    langcode: &str,
    refresh: bool,
) -> Result<()> {
    let pool = db::connect(config).await?;

    let content = ContentStore::new(pool.clone());
    let item = match content.get(entity_type, entity_id, langcode).await? {
        Some(item) => item,
        None => {
            pool.close().await;
            bail!("content item not found: {}:{} [{}]", entity_type, entity_id, langcode);
        }
    };

    let cache = ScoreCache::new(pool.clone());
    if refresh {
        cache.clear(entity_type, entity_id).await?;
    }

    let registry = FactorRegistry::new(pool.clone());
    let chat = provider::create_provider(&config.ai)?;
    let analyzer = Analyzer::new(registry.clone(), cache, chat);

    let evaluation = analyzer.evaluate(&item).await?;

    for warning in &evaluation.warnings {
        eprintln!("Warning: {}", warning);
    }

    match evaluation.status {
        AuditStatus::NoFactors => {
            println!("No audit factors are currently enabled.");
            pool.close().await;
            return Ok(());
        }
        AuditStatus::NoContent => {
            println!("No content available for analysis.");
            pool.close().await;
            return Ok(());
        }
        AuditStatus::ProviderDisabled if evaluation.scores.is_empty() => {
            println!("No chat AI provider is configured for audit analysis.");
            pool.close().await;
            return Ok(());
        }
        _ => {}
    }

    let title_display = if item.title.is_empty() {
        "(untitled)"
    } else {
        item.title.as_str()
    };
    println!("Audit — {} ({}:{} [{}])", title_display, entity_type, entity_id, langcode);
    println!();

    let factors = registry.enabled().await?;

    // Classifications first, then scored factors, each in registry order.
    let mut printed_classifications = false;
    for factor in &factors {
        if let FactorKind::Qualitative { options } = &factor.kind {
            if let Some(score) = evaluation.scores.get(&factor.id) {
                if !printed_classifications {
                    println!("Classifications");
                    printed_classifications = true;
                }
                println!("  {:<28} {}", factor.label, codec::score_to_label(options, *score));
            }
        }
    }
    if printed_classifications {
        println!();
    }

    let mut printed_scores = false;
    for factor in &factors {
        if matches!(factor.kind, FactorKind::Quantitative) {
            if let Some(score) = evaluation.scores.get(&factor.id) {
                if !printed_scores {
                    println!("Scores (-1.0 poor .. +1.0 excellent)");
                    printed_scores = true;
                }
                println!(
                    "  {:<28} {:+.1}  {}",
                    factor.label,
                    score,
                    score_status(*score)
                );
            }
        }
    }

    if !printed_classifications && !printed_scores {
        println!("No scores available for this item.");
    }

    pool.close().await;
    Ok(())
}

/// Delete an entity's cached scores so the next evaluation starts fresh.
pub async fn run_clear(config: &Config, entity_type: &str, entity_id: &str) -> Result<()> {
    let pool = db::connect(config).await?;
    let cache = ScoreCache::new(pool.clone());

    let deleted = cache.clear(entity_type, entity_id).await?;
    println!("cleared {} cached score(s) for {}:{}", deleted, entity_type, entity_id);

    pool.close().await;
    Ok(())
}

//! Chunked batch analysis.
//!
//! Walks registered content items that lack recent analysis and drives the
//! analyzer over them in fixed-size chunks. Per-entity failures are
//! collected and reported at the end of the run rather than aborting it;
//! model-call warnings are printed as they happen.

use anyhow::Result;

use crate::analyzer::{Analyzer, AuditStatus};
use crate::cache::ScoreCache;
use crate::config::Config;
use crate::content::ContentStore;
use crate::db;
use crate::models::ContentItem;
use crate::provider;
use crate::registry::FactorRegistry;

pub async fn run_batch(
    config: &Config,
    entity_type: Option<String>,
    force_refresh: bool,
    limit: Option<usize>,
) -> Result<()> {
    let pool = db::connect(config).await?;

    let content = ContentStore::new(pool.clone());
    let cache = ScoreCache::new(pool.clone());
    let registry = FactorRegistry::new(pool.clone());
    let chat = provider::create_provider(&config.ai)?;
    let analyzer = Analyzer::new(registry, cache.clone(), chat);

    let mut items = content.list(entity_type.as_deref()).await?;
    let total_registered = items.len();

    // Skip items with any analysis inside the freshness window, unless the
    // caller asked for a forced refresh.
    if !force_refresh {
        items = filter_stale(&cache, items, config.batch.freshness_days).await?;
    }

    if let Some(lim) = limit {
        items.truncate(lim);
    }

    if items.is_empty() {
        println!("audit batch");
        println!("  registered items: {}", total_registered);
        println!("  nothing to analyze");
        println!("ok");
        pool.close().await;
        return Ok(());
    }

    let chunk_size = config.batch.chunk_size;
    let total = items.len();
    let mut processed = 0u64;
    let mut scored = 0u64;
    let mut errors: Vec<String> = Vec::new();

    println!("audit batch");

    for chunk in items.chunks(chunk_size) {
        for item in chunk {
            let entity = item.entity_ref();

            if force_refresh {
                // Drop existing scores so the evaluation starts from a
                // clean miss for every factor.
                if let Err(e) = cache.clear(&item.entity_type, &item.entity_id).await {
                    errors.push(format!("Error clearing {}: {}", entity, e));
                    continue;
                }
            }

            match analyzer.evaluate(item).await {
                Ok(evaluation) => {
                    for warning in &evaluation.warnings {
                        eprintln!("Warning: {}: {}", entity, warning);
                    }
                    if evaluation.status == AuditStatus::ProviderDisabled {
                        eprintln!(
                            "Warning: {}: no chat AI provider is configured",
                            entity
                        );
                    }
                    scored += evaluation.scores.len() as u64;
                    processed += 1;
                }
                Err(e) => {
                    errors.push(format!("Error processing {}: {}", entity, e));
                }
            }
        }

        println!(
            "  processed {} of {} items...",
            (processed as usize + errors.len()).min(total),
            total
        );
    }

    println!("  candidates: {}", total);
    println!("  processed: {}", processed);
    println!("  scores: {}", scored);
    println!("  errors: {}", errors.len());
    for error in &errors {
        eprintln!("  {}", error);
    }
    println!("ok");

    pool.close().await;
    Ok(())
}

/// Keep only items with no score row newer than `now - freshness_days`.
async fn filter_stale(
    cache: &ScoreCache,
    items: Vec<ContentItem>,
    freshness_days: i64,
) -> Result<Vec<ContentItem>> {
    let cutoff = chrono::Utc::now().timestamp() - freshness_days * 86_400;

    let mut entity_types: Vec<String> = items.iter().map(|i| i.entity_type.clone()).collect();
    entity_types.sort();
    entity_types.dedup();

    let mut fresh_ids: std::collections::HashSet<(String, String)> =
        std::collections::HashSet::new();
    for entity_type in &entity_types {
        for id in cache.analyzed_since(entity_type, cutoff).await? {
            fresh_ids.insert((entity_type.clone(), id));
        }
    }

    Ok(items
        .into_iter()
        .filter(|item| {
            !fresh_ids.contains(&(item.entity_type.clone(), item.entity_id.clone()))
        })
        .collect())
}

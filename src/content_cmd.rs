//! Content management commands.
//!
//! Registers and inspects the content items the engine audits. Bodies may
//! be given inline or read from a file; markup is kept as stored text and
//! stripped at analysis time.

use anyhow::{bail, Context, Result};
use std::path::PathBuf;

use crate::config::Config;
use crate::content::{ContentStore, NewContent};
use crate::db;
use crate::extract;

#[allow(clippy::too_many_arguments)]
pub async fn run_content_add(
    config: &Config,
    entity_type: String,
    entity_id: Option<String>,
    langcode: String,
    title: String,
    body: Option<String>,
    body_file: Option<PathBuf>,
) -> Result<()> {
    let body = match (body, body_file) {
        (Some(text), None) => text,
        (None, Some(path)) => std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read body file: {}", path.display()))?,
        (Some(_), Some(_)) => bail!("use either --body or --body-file, not both"),
        (None, None) => String::new(),
    };

    let pool = db::connect(config).await?;
    let store = ContentStore::new(pool.clone());

    let entity_id = store
        .register(&NewContent {
            entity_type: entity_type.clone(),
            entity_id,
            langcode: langcode.clone(),
            title,
            body,
        })
        .await?;

    println!("registered {}:{} [{}]", entity_type, entity_id, langcode);

    pool.close().await;
    Ok(())
}

pub async fn run_content_list(config: &Config, entity_type: Option<String>) -> Result<()> {
    let pool = db::connect(config).await?;
    let store = ContentStore::new(pool.clone());

    let items = store.list(entity_type.as_deref()).await?;
    if items.is_empty() {
        println!("No content items registered.");
        pool.close().await;
        return Ok(());
    }

    println!(
        "{:<12} {:<38} {:<6} {:>4}  TITLE",
        "TYPE", "ID", "LANG", "REV"
    );
    for item in &items {
        let title = if item.title.is_empty() {
            "(untitled)"
        } else {
            item.title.as_str()
        };
        println!(
            "{:<12} {:<38} {:<6} {:>4}  {}",
            item.entity_type, item.entity_id, item.langcode, item.revision_id, title
        );
    }

    pool.close().await;
    Ok(())
}

pub async fn run_content_show(
    config: &Config,
    entity_type: &str,
    entity_id: &str,
    langcode: &str,
) -> Result<()> {
    let pool = db::connect(config).await?;
    let store = ContentStore::new(pool.clone());

    let item = match store.get(entity_type, entity_id, langcode).await? {
        Some(item) => item,
        None => {
            pool.close().await;
            bail!("content item not found: {}:{} [{}]", entity_type, entity_id, langcode);
        }
    };

    let date = chrono::DateTime::from_timestamp(item.updated_at, 0)
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_default();

    println!("{}:{} [{}]", item.entity_type, item.entity_id, item.langcode);
    println!("  title:    {}", item.title);
    println!("  revision: {}", item.revision_id);
    println!("  updated:  {}", date);
    println!();
    println!("{}", extract::plain_text(&item.body));

    pool.close().await;
    Ok(())
}

/// Remove a content item and its cached scores.
pub async fn run_content_remove(config: &Config, entity_type: &str, entity_id: &str) -> Result<()> {
    let pool = db::connect(config).await?;
    let store = ContentStore::new(pool.clone());

    if !store.remove(entity_type, entity_id).await? {
        pool.close().await;
        bail!("content item not found: {}:{}", entity_type, entity_id);
    }
    println!("removed {}:{}", entity_type, entity_id);

    pool.close().await;
    Ok(())
}

//! # Audit Harness CLI (`audit`)
//!
//! The `audit` binary is the primary interface for Audit Harness. It
//! provides commands for database initialization, factor and content
//! management, single-entity audits, batch analysis, and cache control.
//!
//! ## Usage
//!
//! ```bash
//! audit --config ./config/audit.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `audit init` | Create the SQLite database and run schema migrations |
//! | `audit factor <add\|list\|set\|delete>` | Manage scoring factor definitions |
//! | `audit content <add\|list\|show\|remove>` | Manage registered content items |
//! | `audit show <type> <id>` | Evaluate one item and print its report |
//! | `audit batch` | Analyze all registered items lacking recent results |
//! | `audit clear <type> <id>` | Drop an item's cached scores (force refresh) |
//!
//! ## Examples
//!
//! ```bash
//! # Initialize the database
//! audit init --config ./config/audit.toml
//!
//! # Define a quantitative factor
//! audit factor add seo_clarity --label "SEO clarity" \
//!     --description "How clearly the page signals its topic to search engines"
//!
//! # Define a qualitative factor
//! audit factor add funnel_stage --label "Funnel stage" --kind qualitative \
//!     --description "Marketing funnel stage this content serves" \
//!     --option Awareness --option Consideration --option Decision --option Retention
//!
//! # Register content and audit it
//! audit content add article --title "Pricing guide" --body-file ./pricing.html
//! audit show article <id>
//!
//! # Re-analyze everything, ignoring cached results
//! audit batch --force
//! ```

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use audit_harness::{audit_cmd, batch, config, content_cmd, factor_cmd, migrate};

/// Audit Harness CLI — an AI-assisted content scoring and caching engine.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file. See `config/audit.example.toml` for a full example.
#[derive(Parser)]
#[command(
    name = "audit",
    about = "Audit Harness — an AI-assisted content scoring and caching engine",
    version,
    long_about = "Audit Harness evaluates registered content against operator-defined scoring \
    factors using a chat model, and caches the results keyed by content and configuration \
    fingerprints so unchanged content is never re-analyzed."
)]
struct Cli {
    /// Path to configuration file (TOML).
    ///
    /// Defaults to `./config/audit.toml`. Database, AI provider, and batch
    /// settings are read from this file.
    #[arg(long, global = true, default_value = "./config/audit.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand)]
enum Commands {
    /// Initialize the database schema.
    ///
    /// Creates the SQLite database file and all required tables (factors,
    /// content_items, audit_scores). This command is idempotent — running
    /// it multiple times is safe.
    Init,

    /// Manage scoring factor definitions.
    ///
    /// Factors are what the model scores content against. Editing any
    /// factor changes the configuration fingerprint and invalidates every
    /// cached score.
    Factor {
        #[command(subcommand)]
        action: FactorAction,
    },

    /// Manage registered content items.
    Content {
        #[command(subcommand)]
        action: ContentAction,
    },

    /// Evaluate one content item and print its audit report.
    ///
    /// Serves cached scores when the content and configuration are
    /// unchanged; otherwise calls the configured chat provider (at most
    /// one call per factor kind) and caches the results.
    Show {
        /// Entity type (e.g. `article`).
        entity_type: String,

        /// Entity id.
        entity_id: String,

        /// Language code of the item to audit.
        #[arg(long, default_value = "en")]
        lang: String,

        /// Drop cached scores first and force a fresh analysis.
        #[arg(long)]
        refresh: bool,
    },

    /// Analyze registered content items in chunks.
    ///
    /// Selects items without recent analysis (see `[batch] freshness_days`)
    /// and evaluates them. Per-item errors are collected and reported at
    /// the end; the run continues past them.
    Batch {
        /// Only process items of this entity type.
        #[arg(long)]
        entity_type: Option<String>,

        /// Re-analyze items even if recent results exist (clears each
        /// item's cached scores first).
        #[arg(long)]
        force: bool,

        /// Maximum number of items to process.
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Drop an entity's cached scores.
    ///
    /// The next evaluation of the entity will re-invoke the model for
    /// every enabled factor.
    Clear {
        /// Entity type.
        entity_type: String,

        /// Entity id.
        entity_id: String,
    },
}

/// Factor management subcommands.
#[derive(Subcommand)]
enum FactorAction {
    /// Add a new scoring factor.
    Add {
        /// Machine name (lowercase letters, digits, underscores).
        /// Immutable once created.
        id: String,

        /// Human-readable name.
        #[arg(long)]
        label: String,

        /// What this factor measures. Sent to the model verbatim, so write
        /// it as an instruction the model can score against.
        #[arg(long, default_value = "")]
        description: String,

        /// Factor kind: `quantitative` (scored -1.0..+1.0) or
        /// `qualitative` (classified into fixed options).
        #[arg(long, default_value = "quantitative")]
        kind: String,

        /// Category label for qualitative factors; repeat the flag once per
        /// option, in order. Order is significant — it defines the
        /// label ↔ score mapping.
        #[arg(long = "option")]
        options: Vec<String>,

        /// Sort weight; lower weights are shown first.
        #[arg(long, default_value_t = 0)]
        weight: i64,

        /// Create the factor disabled (excluded from analysis).
        #[arg(long)]
        disabled: bool,
    },

    /// List all factors.
    List,

    /// Update fields of an existing factor. Flags that are not given keep
    /// their current values; the id cannot change.
    Set {
        /// Machine name of the factor to update.
        id: String,

        /// New human-readable name.
        #[arg(long)]
        label: Option<String>,

        /// New description.
        #[arg(long)]
        description: Option<String>,

        /// Replacement option list for qualitative factors; repeat once per
        /// option, in order.
        #[arg(long = "option")]
        options: Option<Vec<String>>,

        /// New sort weight.
        #[arg(long)]
        weight: Option<i64>,

        /// Enable the factor.
        #[arg(long, conflicts_with = "disable")]
        enable: bool,

        /// Disable the factor (kept in the registry, excluded from
        /// analysis).
        #[arg(long)]
        disable: bool,
    },

    /// Delete a factor and every cached score referencing it.
    Delete {
        /// Machine name of the factor to delete.
        id: String,
    },
}

/// Content management subcommands.
#[derive(Subcommand)]
enum ContentAction {
    /// Register a content item (or update an existing one).
    ///
    /// Updating an item with changed text bumps its revision and, through
    /// the content fingerprint, invalidates its cached scores.
    Add {
        /// Entity type (e.g. `article`, `page`).
        entity_type: String,

        /// Entity id. Generated if omitted.
        #[arg(long)]
        id: Option<String>,

        /// Language code of this item.
        #[arg(long, default_value = "en")]
        lang: String,

        /// Item title.
        #[arg(long, default_value = "")]
        title: String,

        /// Body text (may contain HTML; it is stripped at analysis time).
        #[arg(long)]
        body: Option<String>,

        /// Read the body from a file instead.
        #[arg(long)]
        body_file: Option<PathBuf>,
    },

    /// List registered content items.
    List {
        /// Only list items of this entity type.
        #[arg(long)]
        entity_type: Option<String>,
    },

    /// Print one content item, body rendered as plain text.
    Show {
        /// Entity type.
        entity_type: String,
        /// Entity id.
        entity_id: String,
        /// Language code.
        #[arg(long, default_value = "en")]
        lang: String,
    },

    /// Remove a content item and its cached scores.
    Remove {
        /// Entity type.
        entity_type: String,
        /// Entity id.
        entity_id: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let cfg = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Init => {
            migrate::run_migrations(&cfg).await?;
            println!("Database initialized successfully.");
        }
        Commands::Factor { action } => match action {
            FactorAction::Add {
                id,
                label,
                description,
                kind,
                options,
                weight,
                disabled,
            } => {
                factor_cmd::run_factor_add(
                    &cfg,
                    id,
                    label,
                    description,
                    kind,
                    options,
                    weight,
                    disabled,
                )
                .await?;
            }
            FactorAction::List => {
                factor_cmd::run_factor_list(&cfg).await?;
            }
            FactorAction::Set {
                id,
                label,
                description,
                options,
                weight,
                enable,
                disable,
            } => {
                let enabled = if enable {
                    Some(true)
                } else if disable {
                    Some(false)
                } else {
                    None
                };
                factor_cmd::run_factor_set(&cfg, id, label, description, options, weight, enabled)
                    .await?;
            }
            FactorAction::Delete { id } => {
                factor_cmd::run_factor_delete(&cfg, id).await?;
            }
        },
        Commands::Content { action } => match action {
            ContentAction::Add {
                entity_type,
                id,
                lang,
                title,
                body,
                body_file,
            } => {
                content_cmd::run_content_add(&cfg, entity_type, id, lang, title, body, body_file)
                    .await?;
            }
            ContentAction::List { entity_type } => {
                content_cmd::run_content_list(&cfg, entity_type).await?;
            }
            ContentAction::Show {
                entity_type,
                entity_id,
                lang,
            } => {
                content_cmd::run_content_show(&cfg, &entity_type, &entity_id, &lang).await?;
            }
            ContentAction::Remove {
                entity_type,
                entity_id,
            } => {
                content_cmd::run_content_remove(&cfg, &entity_type, &entity_id).await?;
            }
        },
        Commands::Show {
            entity_type,
            entity_id,
            lang,
            refresh,
        } => {
            audit_cmd::run_audit(&cfg, &entity_type, &entity_id, &lang, refresh).await?;
        }
        Commands::Batch {
            entity_type,
            force,
            limit,
        } => {
            batch::run_batch(&cfg, entity_type, force, limit).await?;
        }
        Commands::Clear {
            entity_type,
            entity_id,
        } => {
            audit_cmd::run_clear(&cfg, &entity_type, &entity_id).await?;
        }
    }

    Ok(())
}

//! # Audit Harness
//!
//! An AI-assisted content scoring and caching engine over SQLite.
//!
//! Audit Harness lets an operator define scoring factors — quantitative
//! (continuous [-1.0, +1.0] scores) or qualitative (a closed set of
//! category labels) — and have a chat model evaluate registered content
//! against them. Results are fingerprinted by content and configuration
//! and cached in SQLite, so repeated audits of unchanged content never
//! re-invoke the model.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐   ┌──────────────────────────┐   ┌──────────┐
//! │ Content      │──▶│  Analyzer                 │──▶│  SQLite   │
//! │ items        │   │ fingerprint → cache check │   │ factors + │
//! └──────────────┘   │ → batched chat → validate │   │ scores    │
//!                    └────────────┬──────────────┘   └────┬─────┘
//!                                 │                       │
//!                           ┌──────────┐            ┌──────────┐
//!                           │ Chat API │            │   CLI    │
//!                           │ (openai) │            │ (audit)  │
//!                           └──────────┘            └──────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! audit init                                  # create database
//! audit factor add seo_clarity --label "SEO clarity" \
//!     --description "How clearly the page signals its topic"
//! audit content add article --title "Hello" --body "<p>World</p>"
//! audit show article <id>                     # evaluate + print report
//! audit batch                                 # analyze everything stale
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`models`] | Core data types |
//! | [`codec`] | Qualitative label ↔ numeric score mapping |
//! | [`fingerprint`] | Content and configuration hashing |
//! | [`registry`] | Factor definition storage |
//! | [`cache`] | Persistent score cache |
//! | [`content`] | Content item storage |
//! | [`extract`] | Plain-text extraction |
//! | [`provider`] | Chat provider abstraction |
//! | [`analyzer`] | Audit orchestration |
//! | [`batch`] | Chunked batch analysis |
//! | [`db`] | Database connection |
//! | [`migrate`] | Schema migrations |

pub mod analyzer;
pub mod audit_cmd;
pub mod batch;
pub mod cache;
pub mod codec;
pub mod config;
pub mod content;
pub mod content_cmd;
pub mod db;
pub mod extract;
pub mod factor_cmd;
pub mod fingerprint;
pub mod migrate;
pub mod models;
pub mod provider;
pub mod registry;

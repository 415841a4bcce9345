//! Core data models used throughout Audit Harness.
//!
//! These types represent the scoring factors, the content items being
//! audited, and the cached score records that flow through the engine.

use serde::{Deserialize, Serialize};

/// The two kinds of scoring factor.
///
/// Quantitative factors are scored on a continuous [-1.0, +1.0] scale.
/// Qualitative factors classify content into one of a fixed, ordered list
/// of category labels; the option list lives on this variant only, so a
/// quantitative factor cannot carry options by construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FactorKind {
    Quantitative,
    Qualitative { options: Vec<String> },
}

impl FactorKind {
    /// Storage discriminant for the `kind` column.
    pub fn as_str(&self) -> &'static str {
        match self {
            FactorKind::Quantitative => "quantitative",
            FactorKind::Qualitative { .. } => "qualitative",
        }
    }

    /// The option list for qualitative factors, empty otherwise.
    pub fn options(&self) -> &[String] {
        match self {
            FactorKind::Quantitative => &[],
            FactorKind::Qualitative { options } => options,
        }
    }
}

/// A scoring factor definition.
///
/// The `id` is a machine name, unique and immutable once created. Factors
/// with lower `weight` sort first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Factor {
    pub id: String,
    pub label: String,
    pub description: String,
    pub kind: FactorKind,
    pub weight: i64,
    pub enabled: bool,
}

/// Identity of a content entity in a specific language.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EntityRef {
    pub entity_type: String,
    pub entity_id: String,
    pub langcode: String,
}

impl EntityRef {
    pub fn new(
        entity_type: impl Into<String>,
        entity_id: impl Into<String>,
        langcode: impl Into<String>,
    ) -> Self {
        Self {
            entity_type: entity_type.into(),
            entity_id: entity_id.into(),
            langcode: langcode.into(),
        }
    }
}

impl std::fmt::Display for EntityRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}:{} [{}]",
            self.entity_type, self.entity_id, self.langcode
        )
    }
}

/// A registered content item, the unit of analysis.
#[derive(Debug, Clone)]
pub struct ContentItem {
    pub entity_type: String,
    pub entity_id: String,
    pub langcode: String,
    pub revision_id: i64,
    pub title: String,
    pub body: String,
    pub updated_at: i64,
}

impl ContentItem {
    pub fn entity_ref(&self) -> EntityRef {
        EntityRef::new(
            self.entity_type.clone(),
            self.entity_id.clone(),
            self.langcode.clone(),
        )
    }
}

/// A cached audit score row.
///
/// The numeric `score` is always in [-1.0, +1.0] regardless of factor kind;
/// qualitative classifications are stored through the codec and decoded back
/// to labels on read. At most one live row exists per
/// (entity_type, entity_id, langcode, factor_id, content_hash, config_hash).
#[derive(Debug, Clone)]
pub struct ScoreRecord {
    pub entity_type: String,
    pub entity_id: String,
    pub revision_id: i64,
    pub langcode: String,
    pub factor_id: String,
    pub score: f64,
    pub content_hash: String,
    pub config_hash: String,
    pub analyzed_at: i64,
}

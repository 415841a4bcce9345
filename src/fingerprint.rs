//! Content and configuration fingerprints that key cache validity.
//!
//! Both hashes are pure functions of current state. A lookup whose freshly
//! computed pair matches no live row is indistinguishable from "never
//! analyzed" and triggers re-analysis; there are no stored version counters.

use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::extract;
use crate::models::{ContentItem, Factor};

/// Digest over an item's analyzable text plus its identity.
///
/// The entity type, id, and langcode are mixed in so identical text on two
/// entities (or two translations) cannot collide, and any edit to the title
/// or body invalidates cached scores. The item's own langcode is used, never
/// a viewer-side language.
pub fn content_hash(item: &ContentItem) -> String {
    let text = extract::analyzable_text(&item.title, &item.body);

    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    hasher.update(item.entity_type.as_bytes());
    hasher.update(item.entity_id.as_bytes());
    hasher.update(item.langcode.as_bytes());
    format!("{:x}", hasher.finalize())
}

#[derive(Serialize)]
struct ConfigFingerprint<'a> {
    factors: &'a [Factor],
    ai_provider: &'a str,
}

/// Digest over the entire factor set plus the active provider identity.
///
/// Every field of every factor participates, including disabled ones, so
/// any single-field edit, any add/remove, any reorder of a qualitative
/// option list, or a provider/model switch invalidates all cached scores.
/// Callers must pass the factor set in registry order (weight, then label)
/// so the serialization is stable.
pub fn config_hash(factors: &[Factor], provider_identity: &str) -> String {
    let fingerprint = ConfigFingerprint {
        factors,
        ai_provider: provider_identity,
    };
    // Field order in the JSON encoding follows struct declaration order,
    // which makes the serialization deterministic for a given input.
    let encoded = serde_json::to_string(&fingerprint).unwrap_or_default();

    let mut hasher = Sha256::new();
    hasher.update(encoded.as_bytes());
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::FactorKind;

    fn item(entity_id: &str, title: &str, body: &str) -> ContentItem {
        ContentItem {
            entity_type: "article".to_string(),
            entity_id: entity_id.to_string(),
            langcode: "en".to_string(),
            revision_id: 1,
            title: title.to_string(),
            body: body.to_string(),
            updated_at: 0,
        }
    }

    fn factor(id: &str) -> Factor {
        Factor {
            id: id.to_string(),
            label: "SEO clarity".to_string(),
            description: "How clear the SEO signals are".to_string(),
            kind: FactorKind::Quantitative,
            weight: 0,
            enabled: true,
        }
    }

    #[test]
    fn test_content_hash_deterministic() {
        let a = item("1", "Title", "<p>Body</p>");
        assert_eq!(content_hash(&a), content_hash(&a));
    }

    #[test]
    fn test_content_hash_changes_with_text() {
        let a = item("1", "Title", "<p>Body</p>");
        let b = item("1", "Title", "<p>Body edited</p>");
        assert_ne!(content_hash(&a), content_hash(&b));
    }

    #[test]
    fn test_content_hash_mixes_in_identity() {
        // Same text on different entities must not collide
        let a = item("1", "Title", "Body");
        let b = item("2", "Title", "Body");
        assert_ne!(content_hash(&a), content_hash(&b));

        let mut c = item("1", "Title", "Body");
        c.langcode = "de".to_string();
        assert_ne!(content_hash(&a), content_hash(&c));

        let mut d = item("1", "Title", "Body");
        d.entity_type = "page".to_string();
        assert_ne!(content_hash(&a), content_hash(&d));
    }

    #[test]
    fn test_content_hash_ignores_markup_noise() {
        // Markup that strips to the same text hashes the same
        let a = item("1", "Title", "<p>Body   text</p>");
        let b = item("1", "Title", "<div>Body text</div>");
        assert_eq!(content_hash(&a), content_hash(&b));
    }

    #[test]
    fn test_config_hash_sensitive_to_every_field() {
        let base = vec![factor("seo_clarity")];
        let base_hash = config_hash(&base, "openai/gpt-4o");

        let mut edited = base.clone();
        edited[0].label = "Clarity".to_string();
        assert_ne!(config_hash(&edited, "openai/gpt-4o"), base_hash);

        let mut edited = base.clone();
        edited[0].description = "changed".to_string();
        assert_ne!(config_hash(&edited, "openai/gpt-4o"), base_hash);

        let mut edited = base.clone();
        edited[0].weight = 3;
        assert_ne!(config_hash(&edited, "openai/gpt-4o"), base_hash);

        let mut edited = base.clone();
        edited[0].enabled = false;
        assert_ne!(config_hash(&edited, "openai/gpt-4o"), base_hash);

        let mut edited = base.clone();
        edited[0].kind = FactorKind::Qualitative {
            options: vec!["Low".to_string(), "High".to_string()],
        };
        assert_ne!(config_hash(&edited, "openai/gpt-4o"), base_hash);
    }

    #[test]
    fn test_config_hash_sensitive_to_option_order() {
        let make = |options: &[&str]| {
            vec![Factor {
                id: "funnel_stage".to_string(),
                label: "Funnel stage".to_string(),
                description: String::new(),
                kind: FactorKind::Qualitative {
                    options: options.iter().map(|s| s.to_string()).collect(),
                },
                weight: 0,
                enabled: true,
            }]
        };
        let forward = make(&["Awareness", "Decision"]);
        let reversed = make(&["Decision", "Awareness"]);
        assert_ne!(
            config_hash(&forward, "openai/gpt-4o"),
            config_hash(&reversed, "openai/gpt-4o")
        );
    }

    #[test]
    fn test_config_hash_sensitive_to_factor_set() {
        let one = vec![factor("seo_clarity")];
        let two = vec![factor("seo_clarity"), factor("tone_fit")];
        assert_ne!(
            config_hash(&one, "openai/gpt-4o"),
            config_hash(&two, "openai/gpt-4o")
        );
    }

    #[test]
    fn test_config_hash_sensitive_to_provider() {
        let factors = vec![factor("seo_clarity")];
        assert_ne!(
            config_hash(&factors, "openai/gpt-4o"),
            config_hash(&factors, "openai/gpt-4o-mini")
        );
    }
}

//! Audit orchestration.
//!
//! [`Analyzer::evaluate`] runs one content item through the engine:
//! fingerprint, cache check, kind-grouped model calls for the misses,
//! reply validation, and write-through to the score cache. Factors of the
//! same kind are batched into a single prompt, so an evaluation costs at
//! most two model calls no matter how many factors are configured.
//!
//! The two kind groups fail independently: a chat error or an undecodable
//! reply yields a warning and zero results for that group, and the affected
//! factors stay cache misses to be retried on the next evaluation.

use anyhow::Result;
use std::collections::BTreeMap;

use crate::cache::ScoreCache;
use crate::codec;
use crate::extract;
use crate::fingerprint;
use crate::models::{ContentItem, Factor, FactorKind};
use crate::provider::ChatProvider;
use crate::registry::FactorRegistry;

/// Why an evaluation produced no (or partial) scores.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuditStatus {
    /// Factors were evaluated (possibly with per-group warnings).
    Analyzed,
    /// No enabled factors are configured.
    NoFactors,
    /// The item has no analyzable text.
    NoContent,
    /// Cache misses exist but no chat provider is configured.
    ProviderDisabled,
}

/// Result of evaluating one content item.
///
/// `scores` maps factor id to the numeric storage form; qualitative values
/// decode to labels via [`codec::score_to_label`] with the factor's current
/// options. Factors whose model call failed or returned unusable data are
/// absent and will be retried next evaluation.
#[derive(Debug)]
pub struct Evaluation {
    pub status: AuditStatus,
    pub scores: BTreeMap<String, f64>,
    pub warnings: Vec<String>,
}

impl Evaluation {
    fn status_only(status: AuditStatus) -> Self {
        Self {
            status,
            scores: BTreeMap::new(),
            warnings: Vec::new(),
        }
    }
}

pub struct Analyzer {
    registry: FactorRegistry,
    cache: ScoreCache,
    provider: Option<Box<dyn ChatProvider>>,
}

impl Analyzer {
    /// All collaborators are injected; the analyzer performs no ambient
    /// service lookups.
    pub fn new(
        registry: FactorRegistry,
        cache: ScoreCache,
        provider: Option<Box<dyn ChatProvider>>,
    ) -> Self {
        Self {
            registry,
            cache,
            provider,
        }
    }

    /// Evaluate a content item against every enabled factor.
    ///
    /// Storage errors propagate; model errors do not (they become
    /// warnings on the returned [`Evaluation`]).
    pub async fn evaluate(&self, item: &ContentItem) -> Result<Evaluation> {
        let all_factors = self.registry.all().await?;
        let enabled: Vec<&Factor> = all_factors.iter().filter(|f| f.enabled).collect();
        if enabled.is_empty() {
            return Ok(Evaluation::status_only(AuditStatus::NoFactors));
        }

        let content = extract::analyzable_text(&item.title, &item.body);
        if content.is_empty() {
            return Ok(Evaluation::status_only(AuditStatus::NoContent));
        }

        // The config fingerprint covers the full factor set, disabled ones
        // included, plus the provider identity.
        let provider_identity = self
            .provider
            .as_ref()
            .map(|p| p.identity())
            .unwrap_or("disabled");
        let content_hash = fingerprint::content_hash(item);
        let config_hash = fingerprint::config_hash(&all_factors, provider_identity);

        let entity = item.entity_ref();
        let mut scores = BTreeMap::new();
        let mut misses: Vec<&Factor> = Vec::new();

        for factor in enabled.iter().copied() {
            match self
                .cache
                .lookup(&entity, &factor.id, &content_hash, &config_hash)
                .await?
            {
                Some(score) => {
                    scores.insert(factor.id.clone(), score);
                }
                None => misses.push(factor),
            }
        }

        if misses.is_empty() {
            return Ok(Evaluation {
                status: AuditStatus::Analyzed,
                scores,
                warnings: Vec::new(),
            });
        }

        let provider = match &self.provider {
            Some(p) => p.as_ref(),
            None => {
                return Ok(Evaluation {
                    status: AuditStatus::ProviderDisabled,
                    scores,
                    warnings: Vec::new(),
                });
            }
        };

        let quantitative: Vec<&Factor> = misses
            .iter()
            .copied()
            .filter(|f| matches!(f.kind, FactorKind::Quantitative))
            .collect();
        let qualitative: Vec<&Factor> = misses
            .iter()
            .copied()
            .filter(|f| matches!(f.kind, FactorKind::Qualitative { .. }))
            .collect();

        let mut warnings = Vec::new();

        if !quantitative.is_empty() {
            match self.score_quantitative(provider, &content, &quantitative).await {
                Ok(fresh) => {
                    for (factor_id, value) in fresh {
                        self.cache
                            .store(
                                &entity,
                                item.revision_id,
                                &factor_id,
                                value,
                                &content_hash,
                                &config_hash,
                            )
                            .await?;
                        scores.insert(factor_id, value);
                    }
                }
                Err(e) => warnings.push(format!("Quantitative factor analysis failed: {}", e)),
            }
        }

        if !qualitative.is_empty() {
            match self.classify_qualitative(provider, &content, &qualitative).await {
                Ok(fresh) => {
                    for (factor_id, label) in fresh {
                        let options = qualitative
                            .iter()
                            .find(|f| f.id == factor_id)
                            .map(|f| f.kind.options())
                            .unwrap_or(&[]);
                        let value = codec::label_to_score(options, &label);
                        self.cache
                            .store(
                                &entity,
                                item.revision_id,
                                &factor_id,
                                value,
                                &content_hash,
                                &config_hash,
                            )
                            .await?;
                        scores.insert(factor_id, value);
                    }
                }
                Err(e) => warnings.push(format!("Qualitative factor analysis failed: {}", e)),
            }
        }

        Ok(Evaluation {
            status: AuditStatus::Analyzed,
            scores,
            warnings,
        })
    }

    /// One batched scoring call for all missing quantitative factors.
    async fn score_quantitative(
        &self,
        provider: &dyn ChatProvider,
        content: &str,
        factors: &[&Factor],
    ) -> Result<BTreeMap<String, f64>> {
        let prompt = build_quantitative_prompt(content, factors);
        let reply = provider.chat(&prompt).await?;

        let decoded = match decode_json_object(&reply) {
            Some(map) => map,
            None => return Ok(BTreeMap::new()),
        };

        Ok(validate_quantitative(factors, &decoded))
    }

    /// One batched classification call for all missing qualitative factors.
    async fn classify_qualitative(
        &self,
        provider: &dyn ChatProvider,
        content: &str,
        factors: &[&Factor],
    ) -> Result<BTreeMap<String, String>> {
        let prompt = build_qualitative_prompt(content, factors);
        let reply = provider.chat(&prompt).await?;

        let decoded = match decode_json_object(&reply) {
            Some(map) => map,
            None => return Ok(BTreeMap::new()),
        };

        Ok(validate_qualitative(factors, &decoded))
    }
}

// ============ Prompt construction ============

pub(crate) fn build_quantitative_prompt(content: &str, factors: &[&Factor]) -> String {
    let json_template = factors
        .iter()
        .map(|f| format!("\"{}\": 0.0", f.id))
        .collect::<Vec<_>>()
        .join(", ");
    let factors_text = factors
        .iter()
        .map(|f| format!("{}: {}", f.id, f.description))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "<task>Analyze the following content for quantitative audit factors.</task>\n\
         <content>\n{content}\n</content>\n\n\
         <factors>\n{factors_text}\n</factors>\n\n\
         <instructions>Provide precise scores between -1.0 and +1.0 for each factor where:\n\
         - -1.0 indicates very poor performance on that factor\n\
         - 0.0 indicates average/neutral performance\n\
         - +1.0 indicates excellent performance on that factor</instructions>\n\
         <output_format>Respond with a simple JSON object containing only the required scores:\n\
         {{{json_template}}}</output_format>"
    )
}

pub(crate) fn build_qualitative_prompt(content: &str, factors: &[&Factor]) -> String {
    // Option labels go into the prompt verbatim so the model cannot invent
    // categories that would fail the exact-match validation.
    let json_template = factors
        .iter()
        .map(|f| {
            let first = f.kind.options().first().map(String::as_str).unwrap_or("");
            format!("\"{}\": \"{}\"", f.id, first)
        })
        .collect::<Vec<_>>()
        .join(", ");
    let factors_text = factors
        .iter()
        .map(|f| {
            format!(
                "{}: {} (Options: {})",
                f.id,
                f.description,
                f.kind.options().join(", ")
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "<task>Classify the following content for qualitative audit factors.</task>\n\
         <content>\n{content}\n</content>\n\n\
         <factors>\n{factors_text}\n</factors>\n\n\
         <instructions>For each factor, select the most appropriate classification from the \
         provided options. Choose the option that best describes where this content fits.</instructions>\n\
         <output_format>Respond with a simple JSON object containing only the required classifications:\n\
         {{{json_template}}}</output_format>"
    )
}

// ============ Reply decoding ============

/// Decode a model reply as a flat JSON object.
///
/// Tries strict JSON first, then the contents of a fenced code block, then
/// the outermost `{...}` slice, since models wrap JSON in prose or fences
/// despite instructions. Anything else yields `None` — no partial-parse
/// recovery.
pub(crate) fn decode_json_object(
    reply: &str,
) -> Option<serde_json::Map<String, serde_json::Value>> {
    if let Some(map) = parse_object(reply) {
        return Some(map);
    }

    if let Some(inner) = fenced_block(reply) {
        if let Some(map) = parse_object(inner) {
            return Some(map);
        }
    }

    let start = reply.find('{')?;
    let end = reply.rfind('}')?;
    if end > start {
        return parse_object(&reply[start..=end]);
    }
    None
}

fn parse_object(text: &str) -> Option<serde_json::Map<String, serde_json::Value>> {
    match serde_json::from_str::<serde_json::Value>(text.trim()) {
        Ok(serde_json::Value::Object(map)) => Some(map),
        _ => None,
    }
}

/// The contents of the first ``` fence, tolerating a language tag.
fn fenced_block(reply: &str) -> Option<&str> {
    let start = reply.find("```")?;
    let after = &reply[start + 3..];
    let body_start = after.find('\n')? + 1;
    let body = &after[body_start..];
    let end = body.find("```")?;
    Some(&body[..end])
}

// ============ Reply validation ============

/// Keep numeric values only, clamped to [-1, +1]. Non-numeric entries are
/// dropped so the factor stays a miss this round.
pub(crate) fn validate_quantitative(
    factors: &[&Factor],
    decoded: &serde_json::Map<String, serde_json::Value>,
) -> BTreeMap<String, f64> {
    let mut scores = BTreeMap::new();
    for factor in factors {
        let value = match decoded.get(&factor.id) {
            Some(serde_json::Value::Number(n)) => n.as_f64(),
            Some(serde_json::Value::String(s)) => s.trim().parse::<f64>().ok(),
            _ => None,
        };
        if let Some(v) = value {
            if v.is_finite() {
                scores.insert(factor.id.clone(), v.clamp(-1.0, 1.0));
            }
        }
    }
    scores
}

/// Keep values that exactly match one of the factor's declared options.
pub(crate) fn validate_qualitative(
    factors: &[&Factor],
    decoded: &serde_json::Map<String, serde_json::Value>,
) -> BTreeMap<String, String> {
    let mut labels = BTreeMap::new();
    for factor in factors {
        let value = match decoded.get(&factor.id) {
            Some(serde_json::Value::String(s)) => Some(s.clone()),
            Some(serde_json::Value::Number(n)) => Some(n.to_string()),
            _ => None,
        };
        if let Some(label) = value {
            if factor.kind.options().iter().any(|o| *o == label) {
                labels.insert(factor.id.clone(), label);
            }
        }
    }
    labels
}

/// Verbal band for a quantitative score, used by report rendering.
pub fn score_status(score: f64) -> &'static str {
    if score >= 0.7 {
        "Excellent"
    } else if score >= 0.3 {
        "Good"
    } else if score >= -0.3 {
        "Average"
    } else if score >= -0.7 {
        "Needs Improvement"
    } else {
        "Poor"
    }
}

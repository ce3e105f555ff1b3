use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::agent::{CompletionRequest, ModelBackend};

/// Where the fields of an [`Advisory`] came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisSource {
    /// Structured model output, reconciled against the rule-based floor.
    Model,
    /// The model answered but not in the requested shape; fields are
    /// rule-based and the reply is kept as `narrative`.
    Narrative,
    /// No model configured, or the call failed.
    Fallback,
}

/// Result envelope shared by every domain analyzer.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Advisory<T> {
    #[serde(flatten)]
    pub analysis: T,
    pub source: AnalysisSource,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub narrative: Option<String>,
}

impl<T> Advisory<T> {
    pub fn fallback(analysis: T) -> Self {
        Self {
            analysis,
            source: AnalysisSource::Fallback,
            narrative: None,
        }
    }
}

/// Everything the runner needs to ask the model for one domain analysis.
pub struct AdvisoryRequest<'a> {
    /// Log field only ("criminal-defense", "intake", ...).
    pub domain: &'a str,
    pub system_prompt: &'a str,
    pub user_prompt: String,
    /// JSON shape the model must answer with, shown verbatim in the prompt.
    pub response_schema: &'a str,
}

/// Compute an analysis, preferring the model and never failing.
///
/// The rule-based `fallback` is always built by the caller first. If a model
/// is configured it gets one call; a well-formed JSON reply is merged through
/// `reconcile(model, &fallback)`, anything else degrades to the fallback.
pub async fn run_advisory<T, R>(
    backend: Option<&dyn ModelBackend>,
    request: AdvisoryRequest<'_>,
    fallback: T,
    reconcile: R,
) -> Advisory<T>
where
    T: DeserializeOwned,
    R: FnOnce(T, &T) -> T,
{
    let domain = request.domain;
    let Some(backend) = backend else {
        debug!(domain, "no model backend configured, using rule-based analysis");
        return Advisory::fallback(fallback);
    };

    let completion = CompletionRequest::new(
        format!(
            "{}\n\n{}",
            request.system_prompt,
            structured_output_instruction(request.response_schema)
        ),
        request.user_prompt,
    );

    let text = match backend.complete(&completion).await {
        Ok(text) => text,
        Err(e) => {
            warn!(
                domain,
                backend = backend.name(),
                "model call failed, using rule-based analysis: {e:#}"
            );
            return Advisory::fallback(fallback);
        }
    };

    match parse_structured::<T>(&text) {
        Some(parsed) => {
            info!(domain, backend = backend.name(), output_len = text.len(), "structured model analysis received");
            Advisory {
                analysis: reconcile(parsed, &fallback),
                source: AnalysisSource::Model,
                narrative: None,
            }
        }
        None if text.trim().is_empty() => {
            warn!(domain, backend = backend.name(), "model returned an empty reply, using rule-based analysis");
            Advisory::fallback(fallback)
        }
        None => {
            warn!(
                domain,
                backend = backend.name(),
                output_len = text.len(),
                "model reply did not match the response schema, keeping it as narrative"
            );
            Advisory {
                analysis: fallback,
                source: AnalysisSource::Narrative,
                narrative: Some(text.trim().to_string()),
            }
        }
    }
}

fn structured_output_instruction(schema: &str) -> String {
    format!(
        "Respond with a single JSON object and nothing else. \
         Use exactly this shape (camelCase keys, arrays of strings unless shown otherwise):\n{schema}"
    )
}

/// The outermost `{...}` span of a reply, tolerating prose or code fences
/// around it.
pub fn extract_json(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}

pub fn parse_structured<T: DeserializeOwned>(text: &str) -> Option<T> {
    serde_json::from_str(extract_json(text)?).ok()
}

/// Render known case facts as a bullet list, marking absent ones unknown.
pub fn facts_block(title: &str, facts: &[(&str, Option<String>)]) -> String {
    let mut s = format!("{title}\n");
    for (label, value) in facts {
        s.push_str(&format!("- {label}: {}\n", value.as_deref().unwrap_or("unknown")));
    }
    s
}

/// Render an optional flag for [`facts_block`].
pub fn yes_no(flag: Option<bool>) -> Option<String> {
    flag.map(|b| if b { "yes".to_string() } else { "no".to_string() })
}

/// Replace an empty model list with the rule-based one.
pub fn backfill<T: Clone>(target: &mut Vec<T>, from: &[T]) {
    if target.is_empty() {
        target.extend_from_slice(from);
    }
}

/// Append rule-based items the model left out, ignoring case.
pub fn merge_unique(target: &mut Vec<String>, from: &[String]) {
    for item in from {
        if !target.iter().any(|t| t.eq_ignore_ascii_case(item)) {
            target.push(item.clone());
        }
    }
}

/// Drop repeated items anywhere in the list, keeping first occurrences in order.
pub fn dedup_keep_first<T: PartialEq>(items: &mut Vec<T>) {
    let mut kept: Vec<T> = Vec::with_capacity(items.len());
    for item in items.drain(..) {
        if !kept.contains(&item) {
            kept.push(item);
        }
    }
    *items = kept;
}

pub fn backfill_text(target: &mut String, from: &str) {
    if target.trim().is_empty() {
        *target = from.to_string();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extract_json_strips_fences_and_prose() {
        let text = "Here you go:\n```json\n{\"a\": {\"b\": 1}}\n```\nThanks.";
        assert_eq!(extract_json(text), Some("{\"a\": {\"b\": 1}}"));
        assert_eq!(extract_json("no json here"), None);
        assert_eq!(extract_json("} backwards {"), None);
    }

    #[test]
    fn facts_block_marks_unknowns() {
        let block = facts_block(
            "Case facts:",
            &[("Name", Some("Jane".into())), ("Detained", None)],
        );
        assert!(block.contains("- Name: Jane"));
        assert!(block.contains("- Detained: unknown"));
    }

    #[test]
    fn backfill_only_fills_empty() {
        let mut empty: Vec<String> = vec![];
        backfill(&mut empty, &["a".to_string()]);
        assert_eq!(empty, vec!["a"]);

        let mut full = vec!["model".to_string()];
        backfill(&mut full, &["a".to_string()]);
        assert_eq!(full, vec!["model"]);

        let mut merged = vec!["Driver's License Suspension".to_string()];
        merge_unique(&mut merged, &["driver's license suspension".to_string(), "Fines".to_string()]);
        assert_eq!(merged, vec!["Driver's License Suspension", "Fines"]);

        let mut text = "  ".to_string();
        backfill_text(&mut text, "rule");
        assert_eq!(text, "rule");
    }

    #[test]
    fn dedup_removes_non_adjacent_repeats() {
        let mut items = vec!["a", "b", "a", "c", "b"];
        dedup_keep_first(&mut items);
        assert_eq!(items, vec!["a", "b", "c"]);
    }
}

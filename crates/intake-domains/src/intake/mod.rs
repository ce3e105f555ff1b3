pub mod tables;

use std::sync::Arc;

use intake_core::advisory::{
    backfill, backfill_text, dedup_keep_first, facts_block, run_advisory, yes_no, AdvisoryRequest,
    AnalysisSource,
};
use intake_core::agent::ModelBackend;
use intake_core::keywords::{matched, normalize};
use intake_core::routing::{lookup_routing, RoutingInfo};
use intake_core::{ContactInfo, Language, PracticeArea, UrgencyLevel};
use serde::{Deserialize, Deserializer, Serialize};
use tracing::info;

pub use tables::estimated_response_time;
use tables::*;

pub const DOMAIN: &str = "intake";

const SUMMARY_SNIPPET_CHARS: usize = 160;

/// A raw client inquiry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntakeRequest {
    pub message: String,
    #[serde(default)]
    pub language: Option<Language>,
    #[serde(default)]
    pub is_emergency: bool,
    #[serde(default)]
    pub contact: Option<ContactInfo>,
}

impl IntakeRequest {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            ..Default::default()
        }
    }

    pub fn emergency(mut self, is_emergency: bool) -> Self {
        self.is_emergency = is_emergency;
        self
    }

    pub fn language(mut self, language: Language) -> Self {
        self.language = Some(language);
        self
    }

    pub fn contact(mut self, contact: ContactInfo) -> Self {
        self.contact = Some(contact);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub primary: PracticeArea,
    /// Later areas in the priority order that also matched.
    pub secondary: Vec<PracticeArea>,
    /// Keywords that selected `primary`.
    pub matched: Vec<&'static str>,
}

/// First-match-wins scan of [`CLASSIFICATION_ORDER`].
pub fn classify(message: &str) -> Classification {
    let mut hits = CLASSIFICATION_ORDER
        .iter()
        .map(|(area, keywords)| (*area, matched(message, keywords)))
        .filter(|(_, m)| !m.is_empty());

    match hits.next() {
        Some((primary, matched)) => Classification {
            primary,
            secondary: hits.map(|(area, _)| area).collect(),
            matched,
        },
        None => Classification {
            primary: PracticeArea::General,
            secondary: Vec::new(),
            matched: Vec::new(),
        },
    }
}

pub fn assess_urgency(message: &str, is_emergency: bool) -> UrgencyLevel {
    if is_emergency {
        return UrgencyLevel::Emergency;
    }
    URGENCY_ORDER
        .iter()
        .find(|(_, keywords)| !matched(message, keywords).is_empty())
        .map(|(level, _)| *level)
        .unwrap_or_default()
}

fn urgency_cues(message: &str) -> Vec<&'static str> {
    URGENCY_ORDER
        .iter()
        .map(|(_, keywords)| matched(message, keywords))
        .find(|m| !m.is_empty())
        .unwrap_or_default()
}

/// Two or more common Spanish words mark the message as Spanish.
pub fn detect_language(message: &str) -> Language {
    if matched(message, SPANISH_MARKERS).len() >= 2 {
        Language::Es
    } else {
        Language::En
    }
}

fn snippet(message: &str) -> String {
    let collapsed = normalize_whitespace(message);
    if collapsed.chars().count() <= SUMMARY_SNIPPET_CHARS {
        return collapsed;
    }
    let chars: Vec<char> = collapsed.chars().take(SUMMARY_SNIPPET_CHARS).collect();
    let end = chars
        .iter()
        .rposition(|c| *c == ' ')
        .filter(|&i| i > SUMMARY_SNIPPET_CHARS / 2)
        .unwrap_or(chars.len());
    let cut: String = chars[..end].iter().collect();
    format!("{cut}...")
}

fn normalize_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn summarize(area: PracticeArea, urgency: UrgencyLevel, message: &str) -> String {
    if normalize(message).trim().is_empty() {
        return format!("{} inquiry ({urgency} urgency) with no details provided", area.label());
    }
    format!("{} inquiry ({urgency} urgency): {}", area.label(), snippet(message))
}

fn key_information(request: &IntakeRequest, classification: &Classification) -> Vec<String> {
    let mut out = Vec::new();
    if request.is_emergency {
        out.push("Client flagged this as an emergency".to_string());
    }
    if !classification.matched.is_empty() {
        out.push(format!("Practice area keywords: {}", classification.matched.join(", ")));
    }
    if !classification.secondary.is_empty() {
        let labels: Vec<&str> = classification.secondary.iter().map(|a| a.label()).collect();
        out.push(format!("Also mentions: {}", labels.join(", ")));
    }
    let cues = urgency_cues(&request.message);
    if !cues.is_empty() {
        out.push(format!("Urgency cues: {}", cues.join(", ")));
    }
    if let Some(contact) = &request.contact {
        if let Some(name) = &contact.name {
            out.push(format!("Contact name: {name}"));
        }
        if let Some(method) = &contact.preferred_contact {
            out.push(format!("Preferred contact: {method}"));
        }
    }
    if out.is_empty() {
        out.push("No specific details extracted; follow up with the client".into());
    }
    out
}

/// Routing decision before it is expanded into an [`IntakeResult`]; also the
/// shape the model is asked to answer with.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Triage {
    #[serde(deserialize_with = "lenient_area")]
    pub practice_area: Option<PracticeArea>,
    #[serde(deserialize_with = "lenient_areas")]
    pub secondary_practice_areas: Vec<PracticeArea>,
    #[serde(deserialize_with = "lenient_urgency")]
    pub urgency_level: Option<UrgencyLevel>,
    pub summary: String,
    pub key_information: Vec<String>,
}

fn parse_area(value: &serde_json::Value) -> Option<PracticeArea> {
    value.as_str()?.parse().ok()
}

/// Tags outside the enum become `None` instead of failing the whole reply.
fn lenient_area<'de, D: Deserializer<'de>>(d: D) -> Result<Option<PracticeArea>, D::Error> {
    Ok(parse_area(&serde_json::Value::deserialize(d)?))
}

fn lenient_areas<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<PracticeArea>, D::Error> {
    let value = serde_json::Value::deserialize(d)?;
    Ok(value
        .as_array()
        .map(|items| items.iter().filter_map(parse_area).collect())
        .unwrap_or_default())
}

fn lenient_urgency<'de, D: Deserializer<'de>>(d: D) -> Result<Option<UrgencyLevel>, D::Error> {
    let value = serde_json::Value::deserialize(d)?;
    Ok(value.as_str().and_then(UrgencyLevel::from_label))
}

/// Keyword triage. Pure.
pub fn keyword_triage(request: &IntakeRequest) -> Triage {
    let classification = classify(&request.message);
    let urgency = assess_urgency(&request.message, request.is_emergency);
    Triage {
        practice_area: Some(classification.primary),
        secondary_practice_areas: classification.secondary.clone(),
        urgency_level: Some(urgency),
        summary: summarize(classification.primary, urgency, &request.message),
        key_information: key_information(request, &classification),
    }
}

fn reconcile(mut model: Triage, rules: &Triage) -> Triage {
    let floor = rules.urgency_level.unwrap_or_default();
    model.urgency_level = Some(model.urgency_level.unwrap_or(floor).max(floor));
    if model.practice_area.is_none() {
        model.practice_area = rules.practice_area;
    }
    backfill(&mut model.secondary_practice_areas, &rules.secondary_practice_areas);
    let primary = model.practice_area;
    model.secondary_practice_areas.retain(|a| Some(*a) != primary);
    dedup_keep_first(&mut model.secondary_practice_areas);
    backfill_text(&mut model.summary, &rules.summary);
    backfill(&mut model.key_information, &rules.key_information);
    model
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IntakeResult {
    pub practice_area: PracticeArea,
    pub secondary_practice_areas: Vec<PracticeArea>,
    pub urgency_level: UrgencyLevel,
    pub summary: String,
    pub key_information: Vec<String>,
    pub required_documents: Vec<String>,
    pub next_steps: Vec<String>,
    pub routing_recommendation: RoutingInfo,
    pub estimated_response_time: &'static str,
    pub language: Language,
    pub source: AnalysisSource,
}

fn build_result(request: &IntakeRequest, triage: Triage, source: AnalysisSource) -> IntakeResult {
    let area = triage.practice_area.unwrap_or(PracticeArea::General);
    let urgency = triage.urgency_level.unwrap_or_default();

    let mut next_steps = Vec::new();
    if urgency == UrgencyLevel::Emergency {
        next_steps.push(EMERGENCY_STEP.to_string());
    }
    next_steps.extend(tables::next_steps(area).iter().map(|s| s.to_string()));

    IntakeResult {
        practice_area: area,
        secondary_practice_areas: triage.secondary_practice_areas,
        urgency_level: urgency,
        summary: triage.summary,
        key_information: triage.key_information,
        required_documents: required_documents(area).iter().map(|s| s.to_string()).collect(),
        next_steps,
        routing_recommendation: lookup_routing(area).clone(),
        estimated_response_time: estimated_response_time(urgency),
        language: request
            .language
            .unwrap_or_else(|| detect_language(&request.message)),
        source,
    }
}

/// Keyword-only routing. Deterministic.
pub fn route_offline(request: &IntakeRequest) -> IntakeResult {
    build_result(request, keyword_triage(request), AnalysisSource::Fallback)
}

const SYSTEM_PROMPT: &str = "\
You triage incoming client messages for a multi-practice law firm. Choose exactly one\n\
primary practice area from: REMOVAL_DEFENSE, FAMILY_IMMIGRATION, BUSINESS_IMMIGRATION,\n\
CRIMINAL_DEFENSE, PERSONAL_INJURY, WORKERS_COMP, FAMILY_LAW, TRAFFIC, BUSINESS_LAW, GENERAL.\n\
List any other areas the message also involves. Rate urgency: emergency (detention,\n\
arrest, imminent removal), urgent (hearing or deadline within days), high (deadline\n\
within weeks), standard. Messages may be in English or Spanish.";

const RESPONSE_SCHEMA: &str = r#"{
  "practiceArea": "REMOVAL_DEFENSE | ... | GENERAL",
  "secondaryPracticeAreas": ["..."],
  "urgencyLevel": "emergency | urgent | high | standard",
  "summary": "one or two sentences for the attorney",
  "keyInformation": ["..."]
}"#;

fn user_prompt(request: &IntakeRequest) -> String {
    let contact = request.contact.as_ref();
    let mut prompt = facts_block(
        "Intake details:",
        &[
            ("Language", request.language.map(|l| l.as_str().to_string())),
            ("Client flagged emergency", yes_no(Some(request.is_emergency))),
            ("Contact name", contact.and_then(|c| c.name.clone())),
            ("Preferred contact", contact.and_then(|c| c.preferred_contact.clone())),
        ],
    );
    prompt.push_str("\nClient message:\n");
    prompt.push_str(request.message.trim());
    prompt
}

/// Routes inquiries to a practice area, with an optional model assist.
#[derive(Clone, Default)]
pub struct IntakeRouter {
    backend: Option<Arc<dyn ModelBackend>>,
}

impl IntakeRouter {
    pub fn new(backend: Option<Arc<dyn ModelBackend>>) -> Self {
        Self { backend }
    }

    pub fn offline() -> Self {
        Self::default()
    }

    /// Never fails. Without a backend this is [`route_offline`].
    pub async fn route(&self, request: &IntakeRequest) -> IntakeResult {
        let rules = keyword_triage(request);
        let advisory = run_advisory(
            self.backend.as_deref(),
            AdvisoryRequest {
                domain: DOMAIN,
                system_prompt: SYSTEM_PROMPT,
                user_prompt: user_prompt(request),
                response_schema: RESPONSE_SCHEMA,
            },
            rules,
            reconcile,
        )
        .await;

        let result = build_result(request, advisory.analysis, advisory.source);
        info!(
            practice_area = %result.practice_area,
            urgency = %result.urgency_level,
            source = ?result.source,
            "intake routed"
        );
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detained_by_ice_outranks_divorce() {
        let c = classify("I was detained by ICE and also need a divorce");
        assert_eq!(c.primary, PracticeArea::RemovalDefense);
        assert_eq!(c.secondary, vec![PracticeArea::FamilyLaw]);
        assert!(c.matched.contains(&"ice"));
    }

    #[test]
    fn divorce_and_visa_routes_to_business_immigration() {
        let c = classify("I need a divorce but my visa depends on my husband");
        assert_eq!(c.primary, PracticeArea::BusinessImmigration);
        assert_eq!(c.secondary, vec![PracticeArea::FamilyLaw]);
    }

    #[test]
    fn family_immigration_terms_take_precedence_over_visa() {
        let c = classify("Can I get a K-1 fiancé visa for my partner?");
        assert_eq!(c.primary, PracticeArea::FamilyImmigration);
        assert!(c.secondary.contains(&PracticeArea::BusinessImmigration));
    }

    #[test]
    fn ice_inside_other_words_does_not_count() {
        assert_eq!(classify("I got a notice from the office").primary, PracticeArea::General);
    }

    #[test]
    fn spanish_messages_classify() {
        assert_eq!(classify("Mi esposo fue detenido por la migra").primary, PracticeArea::RemovalDefense);
        assert_eq!(classify("Tuve un accidente de carro").primary, PracticeArea::PersonalInjury);
        assert_eq!(classify("Necesito ayuda con mi divorcio").primary, PracticeArea::FamilyLaw);
    }

    #[test]
    fn each_area_has_a_reachable_keyword() {
        let samples = [
            ("facing deportation", PracticeArea::RemovalDefense),
            ("filing an I-130 for my mother", PracticeArea::FamilyImmigration),
            ("my employer will file an H-1B", PracticeArea::BusinessImmigration),
            ("I got a DUI", PracticeArea::CriminalDefense),
            ("slip and fall at the store", PracticeArea::PersonalInjury),
            ("a workers comp claim", PracticeArea::WorkersComp),
            ("child support modification", PracticeArea::FamilyLaw),
            ("a speeding ticket", PracticeArea::Traffic),
            ("forming an LLC", PracticeArea::BusinessLaw),
            ("I have a question", PracticeArea::General),
        ];
        for (message, area) in samples {
            assert_eq!(classify(message).primary, area, "{message}");
        }
    }

    #[test]
    fn urgency_tiers_and_emergency_flag() {
        assert_eq!(assess_urgency("my son was arrested last night", false), UrgencyLevel::Emergency);
        assert_eq!(assess_urgency("my court date is friday", false), UrgencyLevel::Urgent);
        assert_eq!(assess_urgency("I was served with a lawsuit", false), UrgencyLevel::High);
        assert_eq!(assess_urgency("question about a will", false), UrgencyLevel::Standard);
        assert_eq!(assess_urgency("question about a will", true), UrgencyLevel::Emergency);
    }

    #[test]
    fn response_times() {
        assert_eq!(estimated_response_time(UrgencyLevel::Emergency), "within 1 hour");
        assert_eq!(estimated_response_time(UrgencyLevel::Urgent), "within 4 hours");
        assert_eq!(estimated_response_time(UrgencyLevel::High), "within 24 hours");
        assert_eq!(estimated_response_time(UrgencyLevel::Standard), "within 1-2 business days");
    }

    #[test]
    fn offline_route_builds_full_result() {
        let request = IntakeRequest::new("I was detained by ICE and also need a divorce");
        let result = route_offline(&request);
        assert_eq!(result.practice_area, PracticeArea::RemovalDefense);
        assert_eq!(result.urgency_level, UrgencyLevel::Emergency);
        assert_eq!(result.next_steps[0], EMERGENCY_STEP);
        assert_eq!(result.routing_recommendation.queue, "removal-defense");
        assert_eq!(result.estimated_response_time, "within 1 hour");
        assert_eq!(result.language, Language::En);
        assert_eq!(result.source, AnalysisSource::Fallback);
        assert!(result.summary.starts_with("Removal Defense inquiry"));
        assert!(!result.required_documents.is_empty());
    }

    #[test]
    fn language_is_detected_unless_given() {
        let es = route_offline(&IntakeRequest::new("Hola, necesito un abogado para mi hijo"));
        assert_eq!(es.language, Language::Es);
        let forced = route_offline(&IntakeRequest::new("Hola, necesito ayuda").language(Language::En));
        assert_eq!(forced.language, Language::En);
    }

    #[test]
    fn long_messages_are_truncated_in_summary() {
        let message = "word ".repeat(100);
        let summary = summarize(PracticeArea::General, UrgencyLevel::Standard, &message);
        assert!(summary.ends_with("..."));
        assert!(summary.len() < 250);
        let empty = summarize(PracticeArea::General, UrgencyLevel::Standard, "   ");
        assert!(empty.contains("no details provided"));
    }

    #[test]
    fn snippet_cuts_on_character_positions() {
        // 50 two-byte letters, one early space, then a long unbroken word.
        let message = format!("{} {}", "é".repeat(50), "a".repeat(200));
        let cut = snippet(&message);
        let body = cut.strip_suffix("...").unwrap();
        assert_eq!(body.chars().count(), SUMMARY_SNIPPET_CHARS);

        let message = "canción ".repeat(40);
        let body = snippet(&message);
        let body = body.strip_suffix("...").unwrap();
        assert!(body.split(' ').all(|w| w == "canción"), "{body}");
    }

    #[test]
    fn reconcile_drops_scattered_duplicate_areas() {
        let rules = keyword_triage(&IntakeRequest::new("help"));
        let model = Triage {
            practice_area: Some(PracticeArea::RemovalDefense),
            secondary_practice_areas: vec![
                PracticeArea::FamilyLaw,
                PracticeArea::Traffic,
                PracticeArea::FamilyLaw,
                PracticeArea::RemovalDefense,
                PracticeArea::Traffic,
            ],
            ..Default::default()
        };
        let merged = reconcile(model, &rules);
        assert_eq!(
            merged.secondary_practice_areas,
            vec![PracticeArea::FamilyLaw, PracticeArea::Traffic]
        );
    }

    #[test]
    fn model_triage_parses_leniently() {
        let triage: Triage = serde_json::from_str(
            r#"{"practiceArea": "TAX_LAW", "secondaryPracticeAreas": ["family-law", "bogus"], "urgencyLevel": "URGENT"}"#,
        )
        .unwrap();
        assert_eq!(triage.practice_area, None);
        assert_eq!(triage.secondary_practice_areas, vec![PracticeArea::FamilyLaw]);
        assert_eq!(triage.urgency_level, Some(UrgencyLevel::Urgent));

        let triage: Triage = serde_json::from_str(r#"{"urgencyLevel": "critical"}"#).unwrap();
        assert_eq!(triage.urgency_level, Some(UrgencyLevel::Emergency));
    }

    #[test]
    fn reconcile_never_lowers_urgency_and_fills_unknown_area() {
        let rules = keyword_triage(&IntakeRequest::new("help").emergency(true));
        let model = Triage {
            urgency_level: Some(UrgencyLevel::Standard),
            summary: "Client needs help".into(),
            ..Default::default()
        };
        let merged = reconcile(model, &rules);
        assert_eq!(merged.urgency_level, Some(UrgencyLevel::Emergency));
        assert_eq!(merged.practice_area, Some(PracticeArea::General));
        assert_eq!(merged.summary, "Client needs help");
        assert_eq!(merged.key_information, rules.key_information);
    }
}

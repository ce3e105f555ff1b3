pub(crate) mod knowledge;

use intake_core::advisory::{
    backfill, backfill_text, dedup_keep_first, facts_block, merge_unique, run_advisory, yes_no,
    Advisory, AdvisoryRequest,
};
use intake_core::agent::ModelBackend;
use intake_core::keywords::mentions_any;
use intake_core::{lenient_severity, CaseFields, LegalOption, Severity};
use serde::{Deserialize, Deserializer, Serialize};

use knowledge::*;

pub const DOMAIN: &str = "criminal-defense";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ChargeCategory {
    Felony,
    Misdemeanor,
    Infraction,
    #[default]
    Unknown,
}

/// Facts read from the intake record. Everything is optional.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CriminalFacts {
    pub client_name: Option<String>,
    pub charges: Option<String>,
    pub is_detained: Option<bool>,
    pub prior_record: Option<String>,
    pub arrest_date: Option<String>,
    pub court_date: Option<String>,
    pub jurisdiction: Option<String>,
    pub immigration_status: Option<String>,
    pub has_attorney: Option<bool>,
}

impl CriminalFacts {
    pub fn from_fields(fields: &CaseFields) -> Self {
        Self {
            client_name: fields.text("clientName"),
            charges: fields.text("charges"),
            is_detained: fields.flag("isDetained"),
            prior_record: fields.text("priorRecord"),
            arrest_date: fields.text("arrestDate"),
            court_date: fields.text("courtDate"),
            jurisdiction: fields.text("jurisdiction"),
            immigration_status: fields.text("immigrationStatus"),
            has_attorney: fields.flag("hasAttorney"),
        }
    }

    fn charges_mention(&self, terms: &[&str]) -> bool {
        self.charges.as_deref().is_some_and(|c| mentions_any(c, terms))
    }

    pub fn has_prior_record(&self) -> bool {
        self.prior_record.as_deref().is_some_and(|r| !denies_record(r))
    }

    /// `None` when the status is unknown.
    pub fn is_noncitizen(&self) -> Option<bool> {
        let status = self.immigration_status.as_deref()?;
        if mentions_any(status, NONCITIZEN_TERMS) {
            Some(true)
        } else if mentions_any(status, &["citizen", "ciudadano"]) {
            Some(false)
        } else {
            None
        }
    }

    pub fn charge_category(&self) -> ChargeCategory {
        if self.charges_mention(FELONY_TERMS) {
            ChargeCategory::Felony
        } else if self.charges_mention(MISDEMEANOR_TERMS) {
            ChargeCategory::Misdemeanor
        } else if self.charges_mention(INFRACTION_TERMS) {
            ChargeCategory::Infraction
        } else {
            ChargeCategory::Unknown
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CriminalAnalysis {
    #[serde(deserialize_with = "lenient_severity")]
    pub severity: Severity,
    #[serde(deserialize_with = "lenient_category")]
    pub charge_category: ChargeCategory,
    /// "high", "medium" or "low".
    pub plea_bargain_likelihood: String,
    pub defenses: Vec<LegalOption>,
    pub collateral_consequences: Vec<String>,
    pub bond_recommendation: String,
    pub timeline: String,
    pub required_documents: Vec<String>,
    pub next_steps: Vec<String>,
    pub strategic_considerations: Vec<String>,
}

/// Anything outside the enum reads as `Unknown`, which reconcile backfills.
fn lenient_category<'de, D: Deserializer<'de>>(d: D) -> Result<ChargeCategory, D::Error> {
    let value = serde_json::Value::deserialize(d)?;
    Ok(value
        .as_str()
        .and_then(|s| serde_json::from_value(serde_json::Value::String(s.trim().to_lowercase())).ok())
        .unwrap_or_default())
}

const SYSTEM_PROMPT: &str = "\
You are a criminal defense case analyst working for a law firm's intake team.\n\
Given the client's facts, assess how serious the matter is, which defenses may apply,\n\
how likely a negotiated plea is, and which collateral consequences (license, firearm,\n\
immigration, employment) the client faces. Do not give final legal advice; the\n\
analysis is reviewed by an attorney before it reaches the client.";

const RESPONSE_SCHEMA: &str = r#"{
  "severity": "critical | urgent | standard",
  "chargeCategory": "felony | misdemeanor | infraction | unknown",
  "pleaBargainLikelihood": "high | medium | low",
  "defenses": [{"name": "...", "eligibility": "high | medium | low | requires review", "rationale": "..."}],
  "collateralConsequences": ["..."],
  "bondRecommendation": "...",
  "timeline": "...",
  "requiredDocuments": ["..."],
  "nextSteps": ["..."],
  "strategicConsiderations": ["..."]
}"#;

pub fn user_prompt(facts: &CriminalFacts) -> String {
    facts_block(
        "Criminal defense intake facts:",
        &[
            ("Client name", facts.client_name.clone()),
            ("Charges", facts.charges.clone()),
            ("Currently detained", yes_no(facts.is_detained)),
            ("Prior record", facts.prior_record.clone()),
            ("Arrest date", facts.arrest_date.clone()),
            ("Next court date", facts.court_date.clone()),
            ("Jurisdiction", facts.jurisdiction.clone()),
            ("Immigration status", facts.immigration_status.clone()),
            ("Already has an attorney", yes_no(facts.has_attorney)),
        ],
    )
}

pub fn severity(facts: &CriminalFacts) -> Severity {
    if facts.is_detained == Some(true) {
        Severity::Critical
    } else if facts.charge_category() == ChargeCategory::Felony || facts.court_date.is_some() {
        Severity::Urgent
    } else {
        Severity::Standard
    }
}

/// Serious felonies are "low", a prior record is "high", everything else
/// "medium". A clean record never yields "high".
pub fn plea_bargain_likelihood(facts: &CriminalFacts) -> &'static str {
    if facts.charges_mention(SERIOUS_FELONY_TERMS) {
        "low"
    } else if facts.has_prior_record() {
        "high"
    } else {
        "medium"
    }
}

pub fn collateral_consequences(facts: &CriminalFacts) -> Vec<String> {
    let mut out = vec!["Criminal record visible on background checks".to_string()];
    for (terms, consequences) in COLLATERAL_CONSEQUENCES {
        if facts.charges_mention(terms) {
            out.extend(consequences.iter().map(|c| c.to_string()));
        }
    }
    if facts.charge_category() == ChargeCategory::Felony {
        out.push("Loss of voting and firearm rights while serving a felony sentence".into());
    }
    if facts.is_noncitizen() == Some(true) {
        out.push("Possible deportation or inadmissibility; immigration counsel must review any plea".into());
    }
    dedup_keep_first(&mut out);
    out
}

pub fn bond_recommendation(facts: &CriminalFacts) -> String {
    let felony_history = facts
        .prior_record
        .as_deref()
        .is_some_and(|r| facts.has_prior_record() && mentions_any(r, FELONY_TERMS));
    match facts.is_detained {
        Some(false) => "Not applicable: client is not in custody".into(),
        None => "Confirm custody status; if detained, request release on own recognizance".into(),
        Some(true) if felony_history => {
            "Expect a high bail amount because of prior felony history; prepare a bail-reduction \
             motion with community-ties and employment evidence"
                .into()
        }
        Some(true) if facts.charge_category() == ChargeCategory::Felony => {
            "Request a prompt bail hearing and propose supervised release conditions".into()
        }
        Some(true) => "Request release on own recognizance or a low bail amount".into(),
    }
}

fn defenses(facts: &CriminalFacts) -> Vec<LegalOption> {
    let first_offender = !facts.has_prior_record();
    let mut out = vec![LegalOption::new(
        "Challenge the lawfulness of the stop, search or arrest",
        "requires review",
        "Depends on the police report and any video evidence",
    )];
    if facts.charges_mention(DUI_TERMS) {
        out.push(LegalOption::new(
            "Challenge breath or blood test accuracy",
            "medium",
            "Calibration records and chain of custody are frequently contested",
        ));
        out.push(LegalOption::new(
            "Contest field sobriety test administration",
            "medium",
            "Tests must follow standardized procedures",
        ));
    }
    if facts.charges_mention(DRUG_TERMS) {
        out.push(LegalOption::new(
            "Suppress evidence from an unlawful search",
            "medium",
            "Search warrants and consent need review",
        ));
        out.push(LegalOption::new(
            "Drug court or treatment diversion",
            if first_offender { "high" } else { "low" },
            "Diversion is usually reserved for first or low-level offenders",
        ));
    }
    if facts.charges_mention(VIOLENCE_TERMS) {
        out.push(LegalOption::new(
            "Self-defense or defense of others",
            "requires review",
            "Depends on witness statements and injuries",
        ));
    }
    if facts.charges_mention(THEFT_TERMS) {
        out.push(LegalOption::new(
            "Lack of intent",
            "medium",
            "The prosecution must prove intent to permanently deprive",
        ));
    }
    if first_offender && facts.charge_category() != ChargeCategory::Felony {
        out.push(LegalOption::new(
            "Pretrial diversion for first-time offenders",
            "high",
            "A clean record usually qualifies for diversion or deferred adjudication",
        ));
    }
    out.push(LegalOption::new(
        "Insufficient evidence / reasonable doubt",
        "requires review",
        "Evaluated once discovery is received",
    ));
    out
}

fn timeline(category: ChargeCategory) -> &'static str {
    match category {
        ChargeCategory::Felony => "Felony cases typically take 6-12 months from arraignment to resolution",
        ChargeCategory::Misdemeanor => "Misdemeanor cases typically resolve within 3-6 months",
        ChargeCategory::Infraction => "Infractions usually resolve within 1-2 months",
        ChargeCategory::Unknown => "Depends on the charges; most cases resolve within 3-12 months",
    }
}

fn required_documents(facts: &CriminalFacts) -> Vec<String> {
    let mut docs: Vec<String> = BASE_DOCUMENTS.iter().map(|d| d.to_string()).collect();
    if facts.charges_mention(DUI_TERMS) {
        docs.extend(DUI_DOCUMENTS.iter().map(|d| d.to_string()));
    }
    if facts.is_noncitizen() == Some(true) {
        docs.extend(IMMIGRATION_DOCUMENTS.iter().map(|d| d.to_string()));
    }
    docs
}

fn next_steps(facts: &CriminalFacts) -> Vec<String> {
    let mut steps = Vec::new();
    if facts.is_detained == Some(true) {
        steps.push("Arrange an immediate jail visit or attorney call with the client".to_string());
    }
    steps.push("Do not discuss the case with police, cellmates or on recorded jail phones".into());
    match &facts.court_date {
        Some(date) => steps.push(format!("Prepare for the court date on {date}")),
        None => steps.push("Confirm the arraignment date with the court clerk".into()),
    }
    if facts.charges_mention(DUI_TERMS) {
        steps.push("Request a DMV hearing within 10 days of arrest to contest the license suspension".into());
    }
    if facts.has_attorney != Some(true) {
        steps.push("Schedule a consultation with a criminal defense attorney".into());
    }
    steps.push("Gather the documents listed for this case".into());
    steps
}

fn strategic_considerations(facts: &CriminalFacts) -> Vec<String> {
    let mut out = Vec::new();
    if facts.is_noncitizen() == Some(true) {
        out.push("Any plea must be screened for immigration consequences (Padilla v. Kentucky)".to_string());
    }
    if facts.has_prior_record() {
        out.push("Prior record raises sentencing exposure; check for enhancement allegations".into());
    } else {
        out.push("A clean record strengthens the case for diversion or a reduced charge".into());
    }
    if facts.charge_category() == ChargeCategory::Felony {
        out.push("Evaluate negotiating a reduction to a misdemeanor".into());
    }
    out.push("Preserve evidence early: video footage, receipts and witness contacts".into());
    out
}

/// Rule-based analysis. Deterministic and infallible.
pub fn fallback_analysis(facts: &CriminalFacts) -> CriminalAnalysis {
    let category = facts.charge_category();
    CriminalAnalysis {
        severity: severity(facts),
        charge_category: category,
        plea_bargain_likelihood: plea_bargain_likelihood(facts).to_string(),
        defenses: defenses(facts),
        collateral_consequences: collateral_consequences(facts),
        bond_recommendation: bond_recommendation(facts),
        timeline: timeline(category).to_string(),
        required_documents: required_documents(facts),
        next_steps: next_steps(facts),
        strategic_considerations: strategic_considerations(facts),
    }
}

fn reconcile(mut model: CriminalAnalysis, rules: &CriminalAnalysis) -> CriminalAnalysis {
    model.severity = model.severity.max(rules.severity);
    if model.charge_category == ChargeCategory::Unknown {
        model.charge_category = rules.charge_category;
    }
    backfill_text(&mut model.plea_bargain_likelihood, &rules.plea_bargain_likelihood);
    backfill(&mut model.defenses, &rules.defenses);
    merge_unique(&mut model.collateral_consequences, &rules.collateral_consequences);
    backfill_text(&mut model.bond_recommendation, &rules.bond_recommendation);
    backfill_text(&mut model.timeline, &rules.timeline);
    backfill(&mut model.required_documents, &rules.required_documents);
    backfill(&mut model.next_steps, &rules.next_steps);
    backfill(&mut model.strategic_considerations, &rules.strategic_considerations);
    model
}

pub async fn analyze(
    backend: Option<&dyn ModelBackend>,
    fields: &CaseFields,
) -> Advisory<CriminalAnalysis> {
    let facts = CriminalFacts::from_fields(fields);
    let rules = fallback_analysis(&facts);
    let request = AdvisoryRequest {
        domain: DOMAIN,
        system_prompt: SYSTEM_PROMPT,
        user_prompt: user_prompt(&facts),
        response_schema: RESPONSE_SCHEMA,
    };
    run_advisory(backend, request, rules, reconcile).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn facts(v: serde_json::Value) -> CriminalFacts {
        CriminalFacts::from_fields(&CaseFields::from_value(v))
    }

    #[test]
    fn dui_first_offense_scenario() {
        let f = facts(json!({
            "clientName": "Jane Doe",
            "charges": "DUI first offense",
            "isDetained": false,
            "priorRecord": "None",
        }));
        let a = fallback_analysis(&f);
        assert_eq!(a.plea_bargain_likelihood, "medium");
        assert!(a.collateral_consequences.contains(&"Driver's license suspension".to_string()));
        assert_eq!(a.charge_category, ChargeCategory::Misdemeanor);
        assert_eq!(a.severity, Severity::Standard);
        assert_eq!(a.bond_recommendation, "Not applicable: client is not in custody");
    }

    #[test]
    fn detained_is_critical() {
        let f = facts(json!({"charges": "shoplifting", "isDetained": "yes"}));
        assert_eq!(severity(&f), Severity::Critical);
    }

    #[test]
    fn felony_or_court_date_is_urgent() {
        assert_eq!(severity(&facts(json!({"charges": "burglary"}))), Severity::Urgent);
        assert_eq!(
            severity(&facts(json!({"charges": "trespass", "courtDate": "2026-11-02"}))),
            Severity::Urgent
        );
        assert_eq!(severity(&facts(json!({"charges": "trespass"}))), Severity::Standard);
    }

    #[test]
    fn plea_likelihood_rules() {
        assert_eq!(plea_bargain_likelihood(&facts(json!({"charges": "homicide"}))), "low");
        assert_eq!(
            plea_bargain_likelihood(&facts(json!({"charges": "theft", "priorRecord": "2 prior thefts"}))),
            "high"
        );
        assert_eq!(
            plea_bargain_likelihood(&facts(json!({"charges": "theft", "priorRecord": "No priors"}))),
            "medium"
        );
        assert_eq!(plea_bargain_likelihood(&facts(json!({}))), "medium");
    }

    #[test]
    fn prior_record_answers() {
        for none in [
            "None",
            "None.",
            "No.",
            "none!",
            "nope",
            "N/A",
            "first offense",
            "Never been arrested",
            "None, this is my first arrest",
            "This is the first time I've been in trouble",
            "ninguno",
        ] {
            assert!(!facts(json!({"priorRecord": none})).has_prior_record(), "{none}");
        }
        assert!(facts(json!({"priorRecord": "Felony burglary 2015"})).has_prior_record());
        assert!(facts(json!({"priorRecord": "No felonies, but a DUI in 2018"})).has_prior_record());
    }

    #[test]
    fn punctuated_denial_keeps_plea_at_medium() {
        for answer in ["None.", "No.", "none!", "None, this is my first arrest"] {
            let f = facts(json!({"charges": "DUI first offense", "priorRecord": answer}));
            assert_eq!(plea_bargain_likelihood(&f), "medium", "{answer}");
        }
    }

    #[test]
    fn bond_keys_off_felony_history() {
        let f = facts(json!({
            "isDetained": true,
            "charges": "possession",
            "priorRecord": "felony robbery conviction in 2019",
        }));
        assert!(bond_recommendation(&f).contains("high bail"));

        let f = facts(json!({"isDetained": true, "charges": "possession", "priorRecord": "none"}));
        assert!(bond_recommendation(&f).contains("own recognizance"));
    }

    #[test]
    fn noncitizen_gets_immigration_consequences() {
        let f = facts(json!({"charges": "domestic battery", "immigrationStatus": "Green card holder"}));
        let a = fallback_analysis(&f);
        assert!(a.collateral_consequences.iter().any(|c| c.contains("deportation")));
        assert!(a.strategic_considerations.iter().any(|c| c.contains("Padilla")));
        assert!(a.required_documents.iter().any(|d| d.contains("Immigration documents")));
        assert!(a.collateral_consequences.contains(&"Federal prohibition on firearm possession".to_string()));
    }

    #[test]
    fn citizen_is_not_flagged() {
        let f = facts(json!({"immigrationStatus": "US citizen"}));
        assert_eq!(f.is_noncitizen(), Some(false));
        assert_eq!(facts(json!({})).is_noncitizen(), None);
    }

    #[test]
    fn empty_record_still_produces_advice() {
        let a = fallback_analysis(&CriminalFacts::default());
        assert_eq!(a.severity, Severity::Standard);
        assert_eq!(a.charge_category, ChargeCategory::Unknown);
        assert!(!a.next_steps.is_empty());
        assert!(!a.strategic_considerations.is_empty());
        assert!(!a.defenses.is_empty());
    }

    #[test]
    fn reconcile_keeps_rule_floor_and_triggered_consequences() {
        let f = facts(json!({"charges": "DUI", "isDetained": true}));
        let rules = fallback_analysis(&f);
        let model = CriminalAnalysis {
            severity: Severity::Standard,
            collateral_consequences: vec!["Fines".into()],
            ..Default::default()
        };
        let merged = reconcile(model, &rules);
        assert_eq!(merged.severity, Severity::Critical);
        assert_eq!(merged.collateral_consequences[0], "Fines");
        assert!(merged.collateral_consequences.contains(&"Driver's license suspension".to_string()));
        assert_eq!(merged.next_steps, rules.next_steps);
        assert_eq!(merged.charge_category, ChargeCategory::Misdemeanor);
    }

    #[test]
    fn near_miss_tiers_still_parse() {
        let model: CriminalAnalysis = serde_json::from_value(json!({
            "severity": "high",
            "chargeCategory": "Gross misdemeanor",
            "pleaBargainLikelihood": "medium",
        }))
        .unwrap();
        assert_eq!(model.severity, Severity::Urgent);
        assert_eq!(model.charge_category, ChargeCategory::Unknown);

        let rules = fallback_analysis(&facts(json!({"charges": "burglary"})));
        let merged = reconcile(model, &rules);
        assert_eq!(merged.severity, Severity::Urgent);
        assert_eq!(merged.charge_category, ChargeCategory::Felony);
    }
}

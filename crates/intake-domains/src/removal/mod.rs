pub mod knowledge;

use intake_core::advisory::{
    backfill, backfill_text, facts_block, merge_unique, run_advisory, yes_no, Advisory,
    AdvisoryRequest,
};
use intake_core::agent::ModelBackend;
use intake_core::keywords::mentions_any;
use intake_core::{lenient_urgency, CaseFields, LegalOption, UrgencyLevel};
use serde::{Deserialize, Serialize};

use crate::criminal::knowledge::denies_record;
use knowledge::*;

pub const DOMAIN: &str = "removal-defense";

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RemovalFacts {
    pub is_detained: Option<bool>,
    pub has_notice_to_appear: Option<bool>,
    pub hearing_date: Option<String>,
    pub years_in_us: Option<f64>,
    pub has_qualifying_relative: Option<bool>,
    pub criminal_history: Option<String>,
    pub fear_of_return: Option<bool>,
    pub prior_deportation: Option<bool>,
    pub entry_method: Option<String>,
    pub is_lawful_permanent_resident: Option<bool>,
    pub years_as_resident: Option<f64>,
}

impl RemovalFacts {
    pub fn from_fields(fields: &CaseFields) -> Self {
        Self {
            is_detained: fields.flag("isDetained"),
            has_notice_to_appear: fields.flag("hasNoticeToAppear"),
            hearing_date: fields.text("hearingDate"),
            years_in_us: fields.number("yearsInUs"),
            has_qualifying_relative: fields.flag("hasQualifyingRelative"),
            criminal_history: fields.text("criminalHistory"),
            fear_of_return: fields.flag("fearOfReturn"),
            prior_deportation: fields.flag("priorDeportation"),
            entry_method: fields.text("entryMethod"),
            is_lawful_permanent_resident: fields.flag("isLawfulPermanentResident"),
            years_as_resident: fields.number("yearsAsResident"),
        }
    }

    pub fn has_criminal_history(&self) -> bool {
        self.criminal_history.as_deref().is_some_and(|h| !denies_record(h))
    }

    fn history_mentions(&self, terms: &[&str]) -> bool {
        self.has_criminal_history()
            && self
                .criminal_history
                .as_deref()
                .is_some_and(|h| mentions_any(h, terms))
    }

    pub fn has_aggravated_felony(&self) -> bool {
        self.history_mentions(AGGRAVATED_FELONY_TERMS)
    }

    fn has_disqualifying_conviction(&self) -> bool {
        self.has_aggravated_felony() || self.history_mentions(DISQUALIFYING_TERMS)
    }

    /// `None` when the entry method is unknown or ambiguous.
    pub fn entered_with_inspection(&self) -> Option<bool> {
        let method = self.entry_method.as_deref()?;
        if mentions_any(method, UNINSPECTED_ENTRY_TERMS) {
            Some(false)
        } else if mentions_any(method, INSPECTED_ENTRY_TERMS) {
            Some(true)
        } else {
            None
        }
    }

    fn is_lpr(&self) -> bool {
        self.is_lawful_permanent_resident == Some(true)
    }

    fn in_proceedings(&self) -> bool {
        self.has_notice_to_appear == Some(true) || self.hearing_date.is_some()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RemovalDefenseAnalysis {
    #[serde(deserialize_with = "lenient_urgency")]
    pub urgency: UrgencyLevel,
    pub relief_options: Vec<LegalOption>,
    pub bond_eligibility: String,
    pub bond_recommendation: String,
    pub required_evidence: Vec<String>,
    pub timeline: String,
    pub next_steps: Vec<String>,
    pub strategic_considerations: Vec<String>,
}

const SYSTEM_PROMPT: &str = "\
You are a removal-defense analyst trained on immigration court practice. Given the\n\
facts of a client facing deportation, identify every form of relief (cancellation of\n\
removal, asylum, withholding, CAT, adjustment of status, voluntary departure,\n\
prosecutorial discretion), assess bond eligibility and list the evidence and deadlines.\n\
An attorney reviews the output.";

const RESPONSE_SCHEMA: &str = r#"{
  "urgency": "emergency | urgent | high | standard",
  "reliefOptions": [{"name": "...", "eligibility": "high | medium | low | requires review", "rationale": "..."}],
  "bondEligibility": "...",
  "bondRecommendation": "...",
  "requiredEvidence": ["..."],
  "timeline": "...",
  "nextSteps": ["..."],
  "strategicConsiderations": ["..."]
}"#;

pub fn user_prompt(facts: &RemovalFacts) -> String {
    let num = |n: Option<f64>| n.map(|v| v.to_string());
    facts_block(
        "Removal defense intake facts:",
        &[
            ("Detained", yes_no(facts.is_detained)),
            ("Has Notice to Appear", yes_no(facts.has_notice_to_appear)),
            ("Hearing date", facts.hearing_date.clone()),
            ("Years in the US", num(facts.years_in_us)),
            ("US citizen or LPR qualifying relative", yes_no(facts.has_qualifying_relative)),
            ("Criminal history", facts.criminal_history.clone()),
            ("Fear of return", yes_no(facts.fear_of_return)),
            ("Prior deportation", yes_no(facts.prior_deportation)),
            ("Entry method", facts.entry_method.clone()),
            ("Lawful permanent resident", yes_no(facts.is_lawful_permanent_resident)),
            ("Years as resident", num(facts.years_as_resident)),
        ],
    )
}

pub fn urgency(facts: &RemovalFacts) -> UrgencyLevel {
    if facts.is_detained == Some(true) {
        UrgencyLevel::Emergency
    } else if facts.prior_deportation == Some(true) {
        UrgencyLevel::Urgent
    } else if facts.in_proceedings() {
        UrgencyLevel::High
    } else {
        UrgencyLevel::Standard
    }
}

fn option(code: &str, eligibility: &str, rationale: &str) -> Option<(&'static RemovalRelief, LegalOption)> {
    let relief = relief_type(code)?;
    Some((relief, LegalOption::new(relief.name, eligibility, rationale)))
}

pub fn relief_options(facts: &RemovalFacts) -> Vec<(&'static RemovalRelief, LegalOption)> {
    let mut out = Vec::new();
    let years = facts.years_in_us.unwrap_or(0.0);

    if facts.is_lpr() {
        let resident = facts.years_as_resident.unwrap_or(0.0);
        if resident >= 5.0 && years >= 7.0 && !facts.has_aggravated_felony() {
            out.extend(option(
                "lpr-cancellation",
                "high",
                "Permanent resident for 5+ years with 7+ years in the US and no aggravated felony",
            ));
        } else if facts.has_aggravated_felony() {
            out.extend(option(
                "lpr-cancellation",
                "low",
                "An aggravated felony conviction bars cancellation; challenge the classification",
            ));
        }
    } else if years >= 10.0 && !facts.has_disqualifying_conviction() {
        match facts.has_qualifying_relative {
            Some(true) => out.extend(option(
                "non-lpr-cancellation",
                "high",
                "10+ years of presence with a qualifying relative; hardship must be proven",
            )),
            None => out.extend(option(
                "non-lpr-cancellation",
                "requires review",
                "10+ years of presence; a US citizen or LPR spouse, parent or child is required",
            )),
            Some(false) => {}
        }
    }

    if facts.fear_of_return == Some(true) {
        if years >= 1.0 {
            out.extend(option("asylum", "low", "Past the one-year filing deadline unless an exception applies"));
        } else {
            out.extend(option("asylum", "medium", "Fear of return within the first year in the US"));
        }
        out.extend(option("withholding", "medium", "No filing deadline; available despite the asylum bar"));
    }

    if !facts.is_lpr()
        && facts.entered_with_inspection() == Some(true)
        && facts.has_qualifying_relative == Some(true)
    {
        out.extend(option("adjustment", "high", "Inspected entry and a qualifying relative to petition"));
    }

    if facts.has_aggravated_felony() {
        out.extend(option("prosecutorial-discretion", "low", "Serious criminal history weighs against discretion"));
    } else {
        out.extend(option(
            "voluntary-departure",
            "medium",
            "Avoids a removal order and the bars that come with it",
        ));
        out.extend(option(
            "prosecutorial-discretion",
            "requires review",
            "Ask DHS counsel to dismiss or close the case based on equities",
        ));
    }

    out
}

pub fn bond_eligibility(facts: &RemovalFacts) -> &'static str {
    if facts.is_detained == Some(false) {
        "not applicable"
    } else if facts.has_aggravated_felony() {
        "likely ineligible (mandatory detention)"
    } else if facts.prior_deportation == Some(true) {
        "limited (a reinstated removal order is not bond-eligible)"
    } else if facts.history_mentions(FELONY_TERMS) {
        "eligible, contested"
    } else {
        "eligible"
    }
}

pub fn bond_recommendation(facts: &RemovalFacts) -> String {
    if facts.is_detained == Some(false) {
        return "Not detained; keep the court and ICE informed of every address change".into();
    }
    if facts.has_aggravated_felony() {
        "Mandatory detention likely; evaluate a Joseph hearing to contest the charge and request parole".into()
    } else if facts.history_mentions(FELONY_TERMS) {
        "Prepare a strong bond package (rehabilitation evidence, community ties, a sponsor) and expect a higher bond".into()
    } else {
        "Request a bond redetermination hearing with evidence of community ties, employment and a US citizen sponsor".into()
    }
}

fn timeline(facts: &RemovalFacts) -> &'static str {
    if facts.is_detained == Some(true) {
        "Detained docket: master hearing within weeks, individual hearing often within 2-3 months"
    } else if facts.in_proceedings() {
        "Non-detained docket: individual hearings are often scheduled years out"
    } else {
        "No case pending; affirmative options can be prepared now"
    }
}

fn next_steps(facts: &RemovalFacts) -> Vec<String> {
    let mut steps = Vec::new();
    if facts.is_detained == Some(true) {
        steps.push("Locate the client through the ICE detainee locator and request a bond hearing".to_string());
    }
    if facts.prior_deportation == Some(true) {
        steps.push("Obtain the prior removal order and assess reinstatement risk".into());
    }
    if facts.in_proceedings() {
        steps.push("File a notice of appearance (EOIR-28) with the immigration court".into());
    }
    if let Some(date) = &facts.hearing_date {
        steps.push(format!("Calendar the hearing on {date} and confirm it with the EOIR case status line"));
    }
    if facts.has_criminal_history() {
        steps.push("Order certified dispositions for every arrest and conviction".into());
    }
    steps.push("File a FOIA request for the client's immigration file".into());
    steps.push("Schedule a case evaluation with a removal defense attorney".into());
    steps
}

fn strategic_considerations(facts: &RemovalFacts) -> Vec<String> {
    let mut out = vec!["Missing a hearing results in an in absentia removal order".to_string()];
    if facts.prior_deportation == Some(true) {
        out.push("Reentry after removal can be prosecuted federally; coordinate with criminal counsel".into());
    }
    if facts.fear_of_return == Some(true) {
        out.push("Withholding and CAT remain available even if asylum is time-barred".into());
    }
    if facts.is_lpr() && facts.has_criminal_history() {
        out.push("Check whether the conviction actually triggers removability before conceding charges".into());
    }
    if facts.is_detained == Some(true) {
        out.push("Collect hardship and equities evidence from family immediately; detained cases move fast".into());
    }
    out
}

/// Rule-based analysis. Deterministic and infallible.
pub fn fallback_analysis(facts: &RemovalFacts) -> RemovalDefenseAnalysis {
    let options = relief_options(facts);

    let mut evidence: Vec<String> = BASE_EVIDENCE.iter().map(|e| e.to_string()).collect();
    if facts.has_criminal_history() {
        evidence.push("Certified court dispositions for all criminal cases".into());
    }
    for (relief, _) in &options {
        for item in relief.evidence {
            if !evidence.iter().any(|e| e == item) {
                evidence.push(item.to_string());
            }
        }
    }

    RemovalDefenseAnalysis {
        urgency: urgency(facts),
        relief_options: options.into_iter().map(|(_, o)| o).collect(),
        bond_eligibility: bond_eligibility(facts).to_string(),
        bond_recommendation: bond_recommendation(facts),
        required_evidence: evidence,
        timeline: timeline(facts).to_string(),
        next_steps: next_steps(facts),
        strategic_considerations: strategic_considerations(facts),
    }
}

fn reconcile(mut model: RemovalDefenseAnalysis, rules: &RemovalDefenseAnalysis) -> RemovalDefenseAnalysis {
    model.urgency = model.urgency.max(rules.urgency);
    backfill(&mut model.relief_options, &rules.relief_options);
    backfill_text(&mut model.bond_eligibility, &rules.bond_eligibility);
    backfill_text(&mut model.bond_recommendation, &rules.bond_recommendation);
    merge_unique(&mut model.required_evidence, &rules.required_evidence);
    backfill_text(&mut model.timeline, &rules.timeline);
    backfill(&mut model.next_steps, &rules.next_steps);
    backfill(&mut model.strategic_considerations, &rules.strategic_considerations);
    model
}

pub async fn analyze(
    backend: Option<&dyn ModelBackend>,
    fields: &CaseFields,
) -> Advisory<RemovalDefenseAnalysis> {
    let facts = RemovalFacts::from_fields(fields);
    let rules = fallback_analysis(&facts);
    let request = AdvisoryRequest {
        domain: DOMAIN,
        system_prompt: SYSTEM_PROMPT,
        user_prompt: user_prompt(&facts),
        response_schema: RESPONSE_SCHEMA,
    };
    run_advisory(backend, request, rules, reconcile).await
}

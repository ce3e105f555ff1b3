//! Humanitarian relief screening: asylum, U and T visas, VAWA, SIJS and TPS.

use intake_core::advisory::{
    backfill, backfill_text, facts_block, run_advisory, yes_no, Advisory, AdvisoryRequest,
};
use intake_core::agent::ModelBackend;
use intake_core::keywords::mentions_any;
use intake_core::{lenient_urgency, CaseFields, LegalOption, UrgencyLevel};
use serde::{Deserialize, Serialize};

pub const DOMAIN: &str = "humanitarian";

pub struct ReliefType {
    pub code: &'static str,
    pub name: &'static str,
    pub evidence: &'static [&'static str],
    pub timeline: &'static str,
}

pub const RELIEF_TYPES: &[ReliefType] = &[
    ReliefType {
        code: "asylum",
        name: "Asylum",
        evidence: &[
            "Detailed personal declaration of past harm and fear of return",
            "Country-conditions reports",
            "Identity documents and proof of arrival date",
        ],
        timeline: "Affirmative interviews are backlogged for years; court cases follow the immigration judge's calendar",
    },
    ReliefType {
        code: "withholding",
        name: "Withholding of removal and Convention Against Torture protection",
        evidence: &["Evidence that persecution or torture is more likely than not"],
        timeline: "Decided by the immigration judge in removal proceedings",
    },
    ReliefType {
        code: "u-visa",
        name: "U visa (crime victim)",
        evidence: &[
            "Law-enforcement certification (Form I-918 Supplement B)",
            "Police reports and medical records documenting the harm",
        ],
        timeline: "Several years because of the annual cap; work permit after the bona fide determination",
    },
    ReliefType {
        code: "t-visa",
        name: "T visa (trafficking victim)",
        evidence: &["Declaration describing the trafficking", "Any law-enforcement reports or endorsements"],
        timeline: "Typically 12-24 months",
    },
    ReliefType {
        code: "vawa",
        name: "VAWA self-petition",
        evidence: &[
            "Proof of the abuser's US citizenship or permanent residence",
            "Proof of the family relationship",
            "Evidence of abuse (declarations, police or medical records, protective orders)",
        ],
        timeline: "Typically 18-36 months for the I-360",
    },
    ReliefType {
        code: "sijs",
        name: "Special Immigrant Juvenile Status",
        evidence: &[
            "State-court predicate order with the required findings",
            "Birth certificate proving age under 21",
        ],
        timeline: "State-court order first, then the I-360 in about 6-12 months; residence depends on visa availability",
    },
    ReliefType {
        code: "tps",
        name: "Temporary Protected Status",
        evidence: &["Proof of nationality", "Proof of continuous residence since the designation date"],
        timeline: "Typically 3-12 months",
    },
];

/// Countries with a current TPS designation. Designations change; verify
/// dates before filing.
pub const TPS_COUNTRIES: &[&str] = &[
    "afghanistan", "burma", "myanmar", "cameroon", "el salvador", "ethiopia", "haiti",
    "honduras", "lebanon", "nepal", "nicaragua", "somalia", "south sudan", "sudan", "syria",
    "ukraine", "venezuela", "yemen",
];

const PROTECTED_GROUNDS: &[&str] = &[
    "race", "religio*", "nationality", "politic*", "social group",
    "lgbt*", "gay", "lesbian", "transgender", "ethnic*", "raza", "religión",
];

pub fn relief_type(code: &str) -> Option<&'static ReliefType> {
    RELIEF_TYPES.iter().find(|r| r.code == code)
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct HumanitarianFacts {
    pub country_of_origin: Option<String>,
    pub years_in_us: Option<f64>,
    pub entry_date: Option<String>,
    pub fear_of_return: Option<bool>,
    pub persecution_ground: Option<String>,
    pub crime_victim: Option<bool>,
    pub cooperated_with_police: Option<bool>,
    pub trafficking_victim: Option<bool>,
    pub abused_by_spouse_or_parent: Option<bool>,
    pub abuser_is_citizen: Option<bool>,
    pub age: Option<f64>,
    pub abandoned_by_parent: Option<bool>,
    pub tps_country: Option<String>,
    pub in_removal_proceedings: Option<bool>,
    pub is_detained: Option<bool>,
}

impl HumanitarianFacts {
    pub fn from_fields(fields: &CaseFields) -> Self {
        Self {
            country_of_origin: fields.text("countryOfOrigin"),
            years_in_us: fields.number("yearsInUs"),
            entry_date: fields.text("entryDate"),
            fear_of_return: fields.flag("fearOfReturn"),
            persecution_ground: fields.text("persecutionGround"),
            crime_victim: fields.flag("crimeVictim"),
            cooperated_with_police: fields.flag("cooperatedWithPolice"),
            trafficking_victim: fields.flag("traffickingVictim"),
            abused_by_spouse_or_parent: fields.flag("abusedBySpouseOrParent"),
            abuser_is_citizen: fields.flag("abuserIsCitizen"),
            age: fields.number("age"),
            abandoned_by_parent: fields.flag("abandonedByParent"),
            tps_country: fields.text("tpsCountry"),
            in_removal_proceedings: fields.flag("inRemovalProceedings"),
            is_detained: fields.flag("isDetained"),
        }
    }

    /// Fear of return with a year or more already spent in the US.
    pub fn asylum_deadline_at_risk(&self) -> bool {
        self.fear_of_return == Some(true) && self.years_in_us.is_some_and(|y| y >= 1.0)
    }

    fn protected_ground(&self) -> Option<bool> {
        self.persecution_ground
            .as_deref()
            .map(|g| mentions_any(g, PROTECTED_GROUNDS))
    }

    fn is_minor(&self) -> bool {
        self.age.is_some_and(|a| a < 21.0)
    }

    /// `tpsCountry` if given, otherwise the country of origin.
    pub fn tps_eligible_country(&self) -> bool {
        self.tps_country
            .as_deref()
            .or(self.country_of_origin.as_deref())
            .is_some_and(|c| mentions_any(c, TPS_COUNTRIES))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct HumanitarianAnalysis {
    #[serde(deserialize_with = "lenient_urgency")]
    pub urgency: UrgencyLevel,
    pub relief_options: Vec<LegalOption>,
    pub filing_deadlines: Vec<String>,
    pub required_evidence: Vec<String>,
    pub timeline: String,
    pub next_steps: Vec<String>,
    pub strategic_considerations: Vec<String>,
}

const SYSTEM_PROMPT: &str = "\
You screen immigration clients for humanitarian relief at a law firm: asylum,\n\
withholding of removal, CAT, U visa, T visa, VAWA, Special Immigrant Juvenile Status\n\
and Temporary Protected Status. Identify every form of relief the facts support, flag\n\
filing deadlines (especially the one-year asylum bar) and list the evidence needed.\n\
An attorney reviews the output.";

const RESPONSE_SCHEMA: &str = r#"{
  "urgency": "emergency | urgent | high | standard",
  "reliefOptions": [{"name": "...", "eligibility": "high | medium | low | requires review", "rationale": "..."}],
  "filingDeadlines": ["..."],
  "requiredEvidence": ["..."],
  "timeline": "...",
  "nextSteps": ["..."],
  "strategicConsiderations": ["..."]
}"#;

pub fn user_prompt(facts: &HumanitarianFacts) -> String {
    let num = |n: Option<f64>| n.map(|v| v.to_string());
    facts_block(
        "Humanitarian relief intake facts:",
        &[
            ("Country of origin", facts.country_of_origin.clone()),
            ("Years in the US", num(facts.years_in_us)),
            ("Entry date", facts.entry_date.clone()),
            ("Fear of return", yes_no(facts.fear_of_return)),
            ("Persecution ground", facts.persecution_ground.clone()),
            ("Crime victim", yes_no(facts.crime_victim)),
            ("Cooperated with police", yes_no(facts.cooperated_with_police)),
            ("Trafficking victim", yes_no(facts.trafficking_victim)),
            ("Abused by spouse or parent", yes_no(facts.abused_by_spouse_or_parent)),
            ("Abuser is US citizen or LPR", yes_no(facts.abuser_is_citizen)),
            ("Age", num(facts.age)),
            ("Abandoned or neglected by a parent", yes_no(facts.abandoned_by_parent)),
            ("TPS country", facts.tps_country.clone()),
            ("In removal proceedings", yes_no(facts.in_removal_proceedings)),
            ("Detained", yes_no(facts.is_detained)),
        ],
    )
}

pub fn urgency(facts: &HumanitarianFacts) -> UrgencyLevel {
    if facts.is_detained == Some(true) {
        UrgencyLevel::Emergency
    } else if facts.in_removal_proceedings == Some(true) {
        UrgencyLevel::Urgent
    } else if facts.asylum_deadline_at_risk() {
        UrgencyLevel::High
    } else {
        UrgencyLevel::Standard
    }
}

fn option(code: &str, eligibility: &str, rationale: &str) -> Option<(&'static ReliefType, LegalOption)> {
    let relief = relief_type(code)?;
    Some((relief, LegalOption::new(relief.name, eligibility, rationale)))
}

pub fn relief_options(facts: &HumanitarianFacts) -> Vec<(&'static ReliefType, LegalOption)> {
    let mut out = Vec::new();

    if facts.fear_of_return == Some(true) {
        if facts.asylum_deadline_at_risk() {
            out.extend(option(
                "asylum",
                "low",
                "Filed after the one-year deadline; needs changed or extraordinary circumstances",
            ));
        } else {
            let (label, why) = match facts.protected_ground() {
                Some(true) => ("high", "Fear of return tied to a protected ground"),
                Some(false) => ("requires review", "Harm must connect to a protected ground"),
                None => ("medium", "Persecution ground not yet identified"),
            };
            out.extend(option("asylum", label, why));
        }
        out.extend(option("withholding", "medium", "No filing deadline; higher burden of proof"));
    }

    match (facts.crime_victim, facts.cooperated_with_police) {
        (Some(true), Some(true)) => out.extend(option(
            "u-visa",
            "high",
            "Crime victim who helped law enforcement",
        )),
        (Some(true), _) => out.extend(option(
            "u-visa",
            "medium",
            "Crime victim; law-enforcement cooperation must be certified",
        )),
        _ => {}
    }

    if facts.trafficking_victim == Some(true) {
        out.extend(option("t-visa", "high", "Victim of trafficking"));
    }

    if facts.abused_by_spouse_or_parent == Some(true) {
        match facts.abuser_is_citizen {
            Some(true) => out.extend(option("vawa", "high", "Abused by a US citizen or permanent resident family member")),
            None => out.extend(option("vawa", "medium", "Abuser's immigration status must be confirmed")),
            Some(false) => out.extend(option("vawa", "low", "VAWA requires a citizen or permanent resident abuser")),
        }
    }

    if facts.is_minor() {
        match facts.abandoned_by_parent {
            Some(true) => out.extend(option("sijs", "high", "Under 21 and abused, abandoned or neglected by a parent")),
            None => out.extend(option("sijs", "requires review", "Under 21; parental abuse, abandonment or neglect must be shown")),
            Some(false) => {}
        }
    }

    if facts.tps_eligible_country() {
        out.extend(option("tps", "medium", "National of a TPS-designated country; residence dates must be checked"));
    }

    out
}

fn filing_deadlines(facts: &HumanitarianFacts, codes: &[&str]) -> Vec<String> {
    let mut out = Vec::new();
    if codes.contains(&"asylum") {
        match facts.years_in_us {
            Some(y) if y >= 1.0 => out.push(
                "One-year asylum deadline has likely passed; document any changed or extraordinary circumstances".to_string(),
            ),
            Some(_) => out.push("File the asylum application (I-589) within one year of arrival".into()),
            None => out.push("Confirm the arrival date: asylum must be filed within one year of it".into()),
        }
    }
    if codes.contains(&"sijs") {
        out.push("Obtain the state-court order and file the I-360 before age 21".into());
    }
    if codes.contains(&"tps") {
        out.push("File within the current TPS registration period".into());
    }
    if facts.in_removal_proceedings == Some(true) {
        out.push("Meet every filing deadline set by the immigration court".into());
    }
    if out.is_empty() {
        out.push("No filing deadline identified from the facts provided".into());
    }
    out
}

fn next_steps(facts: &HumanitarianFacts, codes: &[&str]) -> Vec<String> {
    let mut steps = Vec::new();
    if facts.is_detained == Some(true) {
        steps.push("Locate the client in ICE custody and request a bond or parole review".to_string());
    }
    if facts.in_removal_proceedings == Some(true) {
        steps.push("File a notice of appearance with the immigration court".into());
    }
    if codes.contains(&"u-visa") && facts.cooperated_with_police != Some(true) {
        steps.push("Request a law-enforcement certification from the investigating agency".into());
    }
    if codes.contains(&"asylum") {
        steps.push("Prepare a detailed declaration of the harm suffered and feared".into());
    }
    steps.push("Gather identity documents and proof of entry date".into());
    steps.push("Schedule a confidential screening interview with an attorney".into());
    steps
}

fn strategic_considerations(facts: &HumanitarianFacts, codes: &[&str]) -> Vec<String> {
    let mut out = Vec::new();
    if codes.len() > 1 {
        out.push("Several forms of relief may be pursued in parallel; choose a lead application".to_string());
    }
    if facts.asylum_deadline_at_risk() {
        out.push("Withholding and CAT protection have no filing deadline if asylum is barred".into());
    }
    if codes.contains(&"u-visa") || codes.contains(&"t-visa") || codes.contains(&"vawa") {
        out.push("Confidentiality protections apply to VAWA, U and T applicants".into());
    }
    out.push("Screen for criminal history before filing; some convictions bar relief".into());
    out
}

/// Rule-based analysis. Deterministic and infallible.
pub fn fallback_analysis(facts: &HumanitarianFacts) -> HumanitarianAnalysis {
    let options = relief_options(facts);
    let codes: Vec<&str> = options.iter().map(|(r, _)| r.code).collect();

    let mut evidence = vec!["Passport, birth certificate or other identity documents".to_string()];
    for (relief, _) in &options {
        for item in relief.evidence {
            if !evidence.iter().any(|e| e == item) {
                evidence.push(item.to_string());
            }
        }
    }

    let timeline = options
        .first()
        .map(|(r, _)| format!("{}: {}", r.name, r.timeline))
        .unwrap_or_else(|| "Timeline depends on the relief identified at screening".to_string());

    let mut relief: Vec<LegalOption> = options.into_iter().map(|(_, o)| o).collect();
    if relief.is_empty() {
        relief.push(LegalOption::new(
            "Full humanitarian relief screening",
            "requires review",
            "No form of relief matched the facts provided",
        ));
    }

    HumanitarianAnalysis {
        urgency: urgency(facts),
        relief_options: relief,
        filing_deadlines: filing_deadlines(facts, &codes),
        required_evidence: evidence,
        timeline,
        next_steps: next_steps(facts, &codes),
        strategic_considerations: strategic_considerations(facts, &codes),
    }
}

fn reconcile(mut model: HumanitarianAnalysis, rules: &HumanitarianAnalysis) -> HumanitarianAnalysis {
    model.urgency = model.urgency.max(rules.urgency);
    backfill(&mut model.relief_options, &rules.relief_options);
    backfill(&mut model.filing_deadlines, &rules.filing_deadlines);
    backfill(&mut model.required_evidence, &rules.required_evidence);
    backfill_text(&mut model.timeline, &rules.timeline);
    backfill(&mut model.next_steps, &rules.next_steps);
    backfill(&mut model.strategic_considerations, &rules.strategic_considerations);
    model
}

pub async fn analyze(
    backend: Option<&dyn ModelBackend>,
    fields: &CaseFields,
) -> Advisory<HumanitarianAnalysis> {
    let facts = HumanitarianFacts::from_fields(fields);
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

    fn facts(v: serde_json::Value) -> HumanitarianFacts {
        HumanitarianFacts::from_fields(&CaseFields::from_value(v))
    }

    fn codes(f: &HumanitarianFacts) -> Vec<&'static str> {
        relief_options(f).iter().map(|(r, _)| r.code).collect()
    }

    #[test]
    fn urgency_tiers() {
        assert_eq!(urgency(&facts(json!({"isDetained": true, "inRemovalProceedings": true}))), UrgencyLevel::Emergency);
        assert_eq!(urgency(&facts(json!({"inRemovalProceedings": "yes"}))), UrgencyLevel::Urgent);
        assert_eq!(urgency(&facts(json!({"fearOfReturn": true, "yearsInUs": 3}))), UrgencyLevel::High);
        assert_eq!(urgency(&facts(json!({"fearOfReturn": true, "yearsInUs": 0.5}))), UrgencyLevel::Standard);
    }

    #[test]
    fn recent_arrival_with_political_fear_has_strong_asylum_claim() {
        let f = facts(json!({"fearOfReturn": true, "yearsInUs": 0.5, "persecutionGround": "political opinion"}));
        let options = relief_options(&f);
        assert_eq!(options[0].0.code, "asylum");
        assert_eq!(options[0].1.eligibility, "high");
        let a = fallback_analysis(&f);
        assert!(a.filing_deadlines[0].contains("within one year"));
    }

    #[test]
    fn late_asylum_claim_is_flagged() {
        let f = facts(json!({"fearOfReturn": true, "yearsInUs": 4}));
        let options = relief_options(&f);
        assert_eq!(options[0].1.eligibility, "low");
        assert_eq!(options[1].0.code, "withholding");
        let a = fallback_analysis(&f);
        assert!(a.filing_deadlines[0].contains("likely passed"));
        assert!(a.strategic_considerations.iter().any(|s| s.contains("no filing deadline")));
    }

    #[test]
    fn victim_based_relief() {
        let f = facts(json!({"crimeVictim": true, "cooperatedWithPolice": true}));
        assert_eq!(relief_options(&f)[0].1.eligibility, "high");

        let f = facts(json!({"crimeVictim": true}));
        assert_eq!(relief_options(&f)[0].1.eligibility, "medium");
        assert!(fallback_analysis(&f).next_steps.iter().any(|s| s.contains("certification")));

        assert_eq!(codes(&facts(json!({"traffickingVictim": true}))), vec!["t-visa"]);
        assert_eq!(
            codes(&facts(json!({"abusedBySpouseOrParent": true, "abuserIsCitizen": true}))),
            vec!["vawa"]
        );
    }

    #[test]
    fn sijs_requires_age_under_21() {
        assert_eq!(codes(&facts(json!({"age": 17, "abandonedByParent": true}))), vec!["sijs"]);
        assert!(codes(&facts(json!({"age": 22, "abandonedByParent": true}))).is_empty());
        assert!(codes(&facts(json!({"age": 17, "abandonedByParent": false}))).is_empty());
    }

    #[test]
    fn tps_uses_designated_country_table() {
        assert_eq!(codes(&facts(json!({"countryOfOrigin": "Venezuela"}))), vec!["tps"]);
        assert_eq!(codes(&facts(json!({"countryOfOrigin": "Mexico", "tpsCountry": "Haiti"}))), vec!["tps"]);
        assert!(codes(&facts(json!({"countryOfOrigin": "Mexico"}))).is_empty());
        assert!(facts(json!({"countryOfOrigin": "South Sudan"})).tps_eligible_country());
    }

    #[test]
    fn empty_record_still_produces_advice() {
        let a = fallback_analysis(&HumanitarianFacts::default());
        assert_eq!(a.urgency, UrgencyLevel::Standard);
        assert_eq!(a.relief_options[0].eligibility, "requires review");
        assert_eq!(a.filing_deadlines.len(), 1);
        assert!(!a.next_steps.is_empty());
        assert!(!a.strategic_considerations.is_empty());
    }

    #[test]
    fn reconcile_keeps_urgency_floor() {
        let rules = fallback_analysis(&facts(json!({"isDetained": true})));
        let merged = reconcile(HumanitarianAnalysis::default(), &rules);
        assert_eq!(merged.urgency, UrgencyLevel::Emergency);
        assert_eq!(merged.next_steps, rules.next_steps);
    }
}

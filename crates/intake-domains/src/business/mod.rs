use intake_core::advisory::{
    backfill, backfill_text, dedup_keep_first, facts_block, run_advisory, yes_no, Advisory,
    AdvisoryRequest,
};
use intake_core::agent::ModelBackend;
use intake_core::keywords::{matches, mentions_any};
use intake_core::{lenient_severity, CaseFields, LegalOption, Severity};
use serde::{Deserialize, Serialize};

pub const DOMAIN: &str = "business-immigration";

// ── Visa knowledge table ─────────────────────────────────────────────────

pub struct VisaCategory {
    pub code: &'static str,
    pub name: &'static str,
    pub requirements: &'static [&'static str],
    pub timeline: &'static str,
    pub common_issues: &'static [&'static str],
    pub documents: &'static [&'static str],
}

pub const VISA_CATEGORIES: &[VisaCategory] = &[
    VisaCategory {
        code: "H-1B",
        name: "H-1B specialty occupation",
        requirements: &[
            "Job requires at least a bachelor's degree in a specific field",
            "Beneficiary holds the degree or an equivalent (three years of experience per year of study)",
            "US employer files a Labor Condition Application and pays the prevailing wage",
        ],
        timeline: "Registration in March, petitions filed from April 1, earliest start October 1; premium processing adds a 15-business-day decision",
        common_issues: &[
            "Annual cap lottery selection",
            "Specialty-occupation Requests for Evidence",
            "Degree equivalency evaluations",
        ],
        documents: &["Degree and transcript evaluations", "Detailed job description", "Labor Condition Application"],
    },
    VisaCategory {
        code: "L-1A",
        name: "L-1A intracompany executive or manager",
        requirements: &[
            "One continuous year of employment in the last three years with a related foreign entity",
            "Executive or managerial role abroad and in the US",
            "Qualifying parent, subsidiary, branch or affiliate relationship",
        ],
        timeline: "2-4 months; 15 business days with premium processing",
        common_issues: &[
            "Proof of the corporate relationship",
            "Managerial-capacity Requests for Evidence",
            "New-office petitions approved for one year only",
        ],
        documents: &["Organizational charts for both entities", "Proof of ownership between entities"],
    },
    VisaCategory {
        code: "L-1B",
        name: "L-1B specialized knowledge",
        requirements: &[
            "One continuous year of employment in the last three years with a related foreign entity",
            "Specialized knowledge of the company's products, processes or procedures",
        ],
        timeline: "2-4 months; 15 business days with premium processing",
        common_issues: &["Demonstrating knowledge that is special or advanced"],
        documents: &["Training records and internal documentation of the specialized knowledge"],
    },
    VisaCategory {
        code: "O-1",
        name: "O-1 extraordinary ability",
        requirements: &[
            "Sustained national or international acclaim",
            "Evidence meeting at least three of the regulatory criteria (awards, press, judging, high salary, ...)",
            "Advisory opinion from a peer group or labor organization",
        ],
        timeline: "2-3 months; 15 business days with premium processing",
        common_issues: &["Weak or self-published evidence", "Missing advisory opinion"],
        documents: &["Awards, press coverage and publications", "Expert recommendation letters"],
    },
    VisaCategory {
        code: "E-2",
        name: "E-2 treaty investor",
        requirements: &[
            "Citizenship of a treaty country",
            "Substantial, at-risk investment in a real operating US business",
            "Investor directs and develops the enterprise",
        ],
        timeline: "Consular processing typically 2-6 months depending on the post",
        common_issues: &["Marginal-enterprise findings", "Source-of-funds documentation"],
        documents: &["Business plan", "Source-of-funds evidence", "Proof of investment transfers"],
    },
    VisaCategory {
        code: "EB-5",
        name: "EB-5 immigrant investor",
        requirements: &[
            "Investment of $1,050,000, or $800,000 in a targeted employment area",
            "Creation of 10 full-time US jobs",
            "Lawful source of the invested funds",
        ],
        timeline: "Several years including conditional residence; varies by country backlog",
        common_issues: &["Source-of-funds tracing", "Regional-center project risk"],
        documents: &["Source-of-funds tracing", "Investment agreements"],
    },
    VisaCategory {
        code: "TN",
        name: "TN USMCA professional",
        requirements: &[
            "Canadian or Mexican citizenship",
            "Job offer in a profession listed in the USMCA schedule",
            "Required credentials for that profession",
        ],
        timeline: "Same-day adjudication at the border for Canadians; consular interview for Mexicans",
        common_issues: &["Job title not matching a listed profession"],
        documents: &["Employer support letter describing the TN profession"],
    },
    VisaCategory {
        code: "EB-2 NIW",
        name: "EB-2 National Interest Waiver",
        requirements: &[
            "Advanced degree or exceptional ability",
            "Proposed endeavor of substantial merit and national importance",
            "Beneficiary is well positioned to advance the endeavor",
        ],
        timeline: "I-140 adjudication 6-12 months, then adjustment or consular processing",
        common_issues: &["Showing national importance beyond a single employer"],
        documents: &["Publications or project evidence", "Recommendation letters"],
    },
    VisaCategory {
        code: "PERM",
        name: "PERM labor certification (EB-2 / EB-3)",
        requirements: &[
            "Permanent full-time job offer from a US employer",
            "Recruitment showing no qualified US workers",
            "Prevailing wage determination",
        ],
        timeline: "18-30 months for labor certification and I-140, plus priority-date wait",
        common_issues: &["Recruitment audits", "Priority-date backlogs for India and China"],
        documents: &["Prevailing wage determination", "Recruitment report"],
    },
];

/// Treaty countries (subset) whose nationals can hold E-2 status.
const E2_TREATY_COUNTRIES: &[&str] = &[
    "argentina", "australia", "austria", "belgium", "canada", "chile", "colombia",
    "costa rica", "france", "germany", "honduras", "ireland", "italy", "japan",
    "korea", "mexico", "netherlands", "panama", "paraguay", "philippines", "spain",
    "taiwan", "turkey", "united kingdom", "uk",
];

const USMCA_COUNTRIES: &[&str] = &["canada", "canadian", "mexico", "mexican", "méxico"];

const EXECUTIVE_TITLES: &[&str] = &[
    "manager", "director", "executive", "vp", "vice president", "president", "ceo", "cto",
    "cfo", "head of*", "gerente",
];

pub fn visa_category(code: &str) -> Option<&'static VisaCategory> {
    VISA_CATEGORIES.iter().find(|v| v.code == code)
}

// ── Facts ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Education {
    HighSchool,
    Bachelors,
    Masters,
    Doctorate,
}

fn parse_education(text: &str) -> Option<Education> {
    if mentions_any(text, &["phd", "ph d", "doctorate", "doctoral", "doctorado"]) {
        Some(Education::Doctorate)
    } else if mentions_any(text, &["master*", "mba", "ms", "ma", "maestría", "maestria"]) {
        Some(Education::Masters)
    } else if mentions_any(text, &["bachelor*", "ba", "bs", "bsc", "degree", "university", "licenciatura"]) {
        Some(Education::Bachelors)
    } else if mentions_any(text, &["high school", "secundaria", "preparatoria"]) {
        Some(Education::HighSchool)
    } else {
        None
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct BusinessFacts {
    pub company_name: Option<String>,
    pub beneficiary_name: Option<String>,
    pub visa_type: Option<String>,
    pub job_title: Option<String>,
    pub education_level: Option<String>,
    pub years_experience: Option<f64>,
    pub offered_salary: Option<f64>,
    pub has_us_employer: Option<bool>,
    pub is_executive: Option<bool>,
    pub years_with_foreign_affiliate: Option<f64>,
    pub extraordinary_ability: Option<bool>,
    pub investment_amount: Option<f64>,
    pub nationality: Option<String>,
    pub current_status: Option<String>,
    pub status_expiring: Option<bool>,
}

impl BusinessFacts {
    pub fn from_fields(fields: &CaseFields) -> Self {
        Self {
            company_name: fields.text("companyName"),
            beneficiary_name: fields.text("beneficiaryName"),
            visa_type: fields.text("visaType"),
            job_title: fields.text("jobTitle"),
            education_level: fields.text("educationLevel"),
            years_experience: fields.number("yearsExperience"),
            offered_salary: fields.number("offeredSalary"),
            has_us_employer: fields.flag("hasUsEmployer"),
            is_executive: fields.flag("isExecutive"),
            years_with_foreign_affiliate: fields.number("yearsWithForeignAffiliate"),
            extraordinary_ability: fields.flag("extraordinaryAbility"),
            investment_amount: fields.number("investmentAmount"),
            nationality: fields.text("nationality"),
            current_status: fields.text("currentStatus"),
            status_expiring: fields.flag("statusExpiring"),
        }
    }

    pub fn education(&self) -> Option<Education> {
        self.education_level.as_deref().and_then(parse_education)
    }

    fn is_executive(&self) -> bool {
        self.is_executive.unwrap_or_else(|| {
            self.job_title
                .as_deref()
                .is_some_and(|t| mentions_any(t, EXECUTIVE_TITLES))
        })
    }

    fn nationality_in(&self, countries: &[&str]) -> Option<bool> {
        self.nationality.as_deref().map(|n| mentions_any(n, countries))
    }

    fn requested(&self, code: &str) -> bool {
        self.visa_type.as_deref().is_some_and(|v| matches(v, code))
    }

    fn status_expiring(&self) -> bool {
        self.status_expiring == Some(true)
            || self
                .current_status
                .as_deref()
                .is_some_and(|s| mentions_any(s, &["expir*", "vence*", "vencid*"]))
    }

    /// A requested H-1B that is not a transfer, extension or cap-exempt filing.
    fn wants_cap_subject_h1b(&self) -> bool {
        self.requested("H-1B")
            && !self
                .visa_type
                .as_deref()
                .is_some_and(|v| mentions_any(v, &["transfer", "extension", "cap-exempt", "cap exempt", "amend*"]))
    }
}

// ── Analysis ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BusinessImmigrationAnalysis {
    #[serde(deserialize_with = "lenient_severity")]
    pub severity: Severity,
    pub recommended_visas: Vec<LegalOption>,
    pub requirements: Vec<String>,
    pub timeline: String,
    pub required_documents: Vec<String>,
    pub common_issues: Vec<String>,
    pub next_steps: Vec<String>,
    pub strategic_considerations: Vec<String>,
}

const SYSTEM_PROMPT: &str = "\
You are a business immigration analyst for a law firm. Given facts about an employer and a\n\
foreign national, identify the nonimmigrant and immigrant visa categories that fit\n\
(H-1B, L-1A, L-1B, O-1, E-2, EB-5, TN, EB-2 NIW, PERM), rate each one's eligibility,\n\
and list the requirements, documents, timeline and risks. An attorney reviews the output.";

const RESPONSE_SCHEMA: &str = r#"{
  "severity": "critical | urgent | standard",
  "recommendedVisas": [{"name": "...", "eligibility": "high | medium | low | requires review", "rationale": "..."}],
  "requirements": ["..."],
  "timeline": "...",
  "requiredDocuments": ["..."],
  "commonIssues": ["..."],
  "nextSteps": ["..."],
  "strategicConsiderations": ["..."]
}"#;

pub fn user_prompt(facts: &BusinessFacts) -> String {
    let num = |n: Option<f64>| n.map(|v| v.to_string());
    facts_block(
        "Business immigration intake facts:",
        &[
            ("Company", facts.company_name.clone()),
            ("Beneficiary", facts.beneficiary_name.clone()),
            ("Requested visa", facts.visa_type.clone()),
            ("Job title", facts.job_title.clone()),
            ("Education", facts.education_level.clone()),
            ("Years of experience", num(facts.years_experience)),
            ("Offered salary (USD)", num(facts.offered_salary)),
            ("Has US employer", yes_no(facts.has_us_employer)),
            ("Executive or manager", yes_no(facts.is_executive)),
            ("Years with foreign affiliate", num(facts.years_with_foreign_affiliate)),
            ("Extraordinary ability evidence", yes_no(facts.extraordinary_ability)),
            ("Investment amount (USD)", num(facts.investment_amount)),
            ("Nationality", facts.nationality.clone()),
            ("Current status", facts.current_status.clone()),
            ("Status expiring soon", yes_no(facts.status_expiring)),
        ],
    )
}

pub fn severity(facts: &BusinessFacts) -> Severity {
    if facts.status_expiring() {
        Severity::Critical
    } else if facts.wants_cap_subject_h1b() {
        Severity::Urgent
    } else {
        Severity::Standard
    }
}

fn option(code: &str, eligibility: &str, rationale: impl Into<String>) -> Option<(&'static VisaCategory, LegalOption)> {
    let category = visa_category(code)?;
    Some((category, LegalOption::new(category.name, eligibility, rationale)))
}

fn eligibility_rank(label: &str) -> u8 {
    match label {
        "high" => 0,
        "medium" => 1,
        "low" => 2,
        _ => 3,
    }
}

/// Candidate categories in best-first order.
pub fn recommended_visas(facts: &BusinessFacts) -> Vec<(&'static VisaCategory, LegalOption)> {
    let mut out = Vec::new();
    let employer = facts.has_us_employer == Some(true);
    let education = facts.education();
    let affiliate_years = facts.years_with_foreign_affiliate.unwrap_or(0.0);

    if employer {
        match education {
            Some(e) if e >= Education::Bachelors => out.extend(option(
                "H-1B",
                "high",
                "US employer and a qualifying degree",
            )),
            _ if facts.years_experience.unwrap_or(0.0) >= 12.0 => out.extend(option(
                "H-1B",
                "medium",
                "No degree on file, but experience may establish equivalency",
            )),
            _ if facts.requested("H-1B") => out.extend(option(
                "H-1B",
                "low",
                "Degree or equivalent experience not established",
            )),
            _ => {}
        }
    }

    if affiliate_years >= 1.0 {
        if facts.is_executive() {
            out.extend(option("L-1A", "high", "A year or more with a related foreign entity in an executive role"));
        } else {
            out.extend(option("L-1B", "medium", "A year or more with a related foreign entity; specialized knowledge must be shown"));
        }
    } else if facts.requested("L-1A") || facts.requested("L-1B") || facts.requested("L-1") {
        out.extend(option("L-1A", "low", "Needs one continuous year with a related foreign entity"));
    }

    if facts.extraordinary_ability == Some(true) {
        out.extend(option("O-1", "medium", "Eligibility turns on the strength of the acclaim evidence"));
    } else if facts.requested("O-1") {
        out.extend(option("O-1", "requires review", "Evidence of extraordinary ability not yet provided"));
    }

    if let Some(true) = facts.nationality_in(E2_TREATY_COUNTRIES) {
        match facts.investment_amount {
            Some(a) if a >= 100_000.0 => out.extend(option("E-2", "high", "Treaty national with a substantial investment")),
            Some(_) => out.extend(option("E-2", "low", "Investment may be too small to be substantial")),
            None if facts.requested("E-2") => out.extend(option("E-2", "medium", "Treaty national; investment amount unknown")),
            None => {}
        }
    }

    match facts.investment_amount {
        Some(a) if a >= 1_050_000.0 => out.extend(option("EB-5", "high", "Investment meets the standard threshold")),
        Some(a) if a >= 800_000.0 => out.extend(option("EB-5", "medium", "Investment meets the targeted-employment-area threshold only")),
        _ => {}
    }

    if employer && facts.nationality_in(USMCA_COUNTRIES) == Some(true) {
        out.extend(option("TN", "medium", "USMCA national; the job must match a listed profession"));
    }

    if education.is_some_and(|e| e >= Education::Masters) {
        out.extend(option("EB-2 NIW", "medium", "Advanced degree; national-importance showing required"));
    }

    if employer {
        out.extend(option("PERM", "medium", "Long-term path to permanent residence through the employer"));
    }

    // Anything the client asked for that no rule produced.
    for category in VISA_CATEGORIES {
        if facts.requested(category.code) && !out.iter().any(|(c, _)| c.code == category.code) {
            out.extend(option(category.code, "requires review", "Requested by the client"));
        }
    }

    out.sort_by_key(|(_, o)| eligibility_rank(&o.eligibility));
    out
}

fn next_steps(facts: &BusinessFacts, codes: &[&str]) -> Vec<String> {
    let mut steps = Vec::new();
    if facts.status_expiring() {
        steps.push("File an extension or change of status before the current status expires".to_string());
    }
    if codes.contains(&"H-1B") && facts.wants_cap_subject_h1b() {
        steps.push("Register the beneficiary during the March H-1B electronic registration period".into());
    }
    steps.push("Collect the beneficiary's passport, resume and diplomas".into());
    if facts.has_us_employer == Some(true) {
        steps.push("Schedule a strategy call with the employer's HR contact".into());
    } else {
        steps.push("Confirm whether a US employer or investment vehicle is in place".into());
    }
    steps
}

fn strategic_considerations(facts: &BusinessFacts, codes: &[&str]) -> Vec<String> {
    let mut out = vec!["Maintain lawful status throughout processing; gaps can bar a later change of status".to_string()];
    if codes.contains(&"H-1B") {
        out.push("Have a lottery alternative ready (cap-exempt employer, O-1 or L-1)".into());
    }
    if codes.contains(&"E-2") {
        out.push("E-2 requires intent to depart when status ends; plan a separate green card route".into());
    }
    if codes.contains(&"PERM") || codes.contains(&"EB-2 NIW") {
        out.push("Check the Visa Bulletin for priority-date backlogs by country of birth".into());
    }
    if facts.nationality.is_none() {
        out.push("Nationality determines treaty and backlog options; confirm it".into());
    }
    out
}

/// Rule-based analysis. Deterministic and infallible.
pub fn fallback_analysis(facts: &BusinessFacts) -> BusinessImmigrationAnalysis {
    let options = recommended_visas(facts);
    let codes: Vec<&str> = options.iter().map(|(c, _)| c.code).collect();
    let viable: Vec<&VisaCategory> = options
        .iter()
        .filter(|(_, o)| eligibility_rank(&o.eligibility) <= 1)
        .map(|(c, _)| *c)
        .collect();

    let mut requirements: Vec<String> = Vec::new();
    let mut common_issues: Vec<String> = Vec::new();
    let mut documents = vec![
        "Beneficiary passport and current immigration documents".to_string(),
        "Resume and diplomas".to_string(),
    ];
    for category in &viable {
        requirements.extend(category.requirements.iter().map(|r| format!("{}: {r}", category.code)));
        common_issues.extend(category.common_issues.iter().map(|i| format!("{}: {i}", category.code)));
        documents.extend(category.documents.iter().map(|d| d.to_string()));
    }
    if requirements.is_empty() {
        requirements.push("A qualifying employer, investment or extraordinary-ability record must be identified".into());
    }
    dedup_keep_first(&mut documents);

    let timeline = options
        .first()
        .map(|(c, _)| format!("{}: {}", c.code, c.timeline))
        .unwrap_or_else(|| "Timeline depends on the category selected at consultation".to_string());

    let mut recommended: Vec<LegalOption> = options.into_iter().map(|(_, o)| o).collect();
    if recommended.is_empty() {
        recommended.push(LegalOption::new(
            "Consultation to identify a qualifying category",
            "requires review",
            "No category matched the facts provided",
        ));
    }

    BusinessImmigrationAnalysis {
        severity: severity(facts),
        recommended_visas: recommended,
        requirements,
        timeline,
        required_documents: documents,
        common_issues,
        next_steps: next_steps(facts, &codes),
        strategic_considerations: strategic_considerations(facts, &codes),
    }
}

fn reconcile(
    mut model: BusinessImmigrationAnalysis,
    rules: &BusinessImmigrationAnalysis,
) -> BusinessImmigrationAnalysis {
    model.severity = model.severity.max(rules.severity);
    backfill(&mut model.recommended_visas, &rules.recommended_visas);
    backfill(&mut model.requirements, &rules.requirements);
    backfill_text(&mut model.timeline, &rules.timeline);
    backfill(&mut model.required_documents, &rules.required_documents);
    backfill(&mut model.common_issues, &rules.common_issues);
    backfill(&mut model.next_steps, &rules.next_steps);
    backfill(&mut model.strategic_considerations, &rules.strategic_considerations);
    model
}

pub async fn analyze(
    backend: Option<&dyn ModelBackend>,
    fields: &CaseFields,
) -> Advisory<BusinessImmigrationAnalysis> {
    let facts = BusinessFacts::from_fields(fields);
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

    fn facts(v: serde_json::Value) -> BusinessFacts {
        BusinessFacts::from_fields(&CaseFields::from_value(v))
    }

    fn codes(f: &BusinessFacts) -> Vec<&'static str> {
        recommended_visas(f).iter().map(|(c, _)| c.code).collect()
    }

    #[test]
    fn degree_holder_with_employer_gets_h1b_first() {
        let f = facts(json!({
            "hasUsEmployer": true,
            "educationLevel": "Bachelor of Science",
            "visaType": "H-1B",
        }));
        let options = recommended_visas(&f);
        assert_eq!(options[0].0.code, "H-1B");
        assert_eq!(options[0].1.eligibility, "high");
        assert!(codes(&f).contains(&"PERM"));
        assert_eq!(severity(&f), Severity::Urgent);
    }

    #[test]
    fn h1b_transfer_is_not_urgent() {
        let f = facts(json!({"visaType": "H-1B transfer", "hasUsEmployer": true}));
        assert_eq!(severity(&f), Severity::Standard);
    }

    #[test]
    fn expiring_status_is_critical() {
        let f = facts(json!({"currentStatus": "F-1 OPT expiring in June"}));
        assert_eq!(severity(&f), Severity::Critical);
        let a = fallback_analysis(&f);
        assert!(a.next_steps[0].contains("before the current status expires"));
    }

    #[test]
    fn executive_transferee_gets_l1a() {
        let f = facts(json!({"jobTitle": "Regional Sales Director", "yearsWithForeignAffiliate": "3"}));
        assert_eq!(codes(&f), vec!["L-1A"]);
        let f = facts(json!({"jobTitle": "Engineer", "yearsWithForeignAffiliate": 2}));
        assert_eq!(codes(&f), vec!["L-1B"]);
    }

    #[test]
    fn treaty_investor_rules() {
        let f = facts(json!({"nationality": "Spain", "investmentAmount": "$150,000"}));
        assert_eq!(codes(&f), vec!["E-2"]);
        let f = facts(json!({"nationality": "India", "investmentAmount": 150000}));
        assert!(codes(&f).is_empty());
        let f = facts(json!({"nationality": "Brazil", "investmentAmount": 900000}));
        let options = recommended_visas(&f);
        assert_eq!(options[0].0.code, "EB-5");
        assert_eq!(options[0].1.eligibility, "medium");
    }

    #[test]
    fn advanced_degree_adds_niw() {
        let f = facts(json!({"educationLevel": "PhD in chemistry"}));
        assert_eq!(codes(&f), vec!["EB-2 NIW"]);
        assert_eq!(f.education(), Some(Education::Doctorate));
    }

    #[test]
    fn requested_but_unsupported_category_is_listed_for_review() {
        let f = facts(json!({"visaType": "TN"}));
        let options = recommended_visas(&f);
        assert_eq!(options.len(), 1);
        assert_eq!(options[0].0.code, "TN");
        assert_eq!(options[0].1.eligibility, "requires review");
    }

    #[test]
    fn empty_record_recommends_consultation() {
        let a = fallback_analysis(&BusinessFacts::default());
        assert_eq!(a.severity, Severity::Standard);
        assert_eq!(a.recommended_visas.len(), 1);
        assert_eq!(a.recommended_visas[0].eligibility, "requires review");
        assert!(!a.next_steps.is_empty());
        assert!(!a.strategic_considerations.is_empty());
        assert!(!a.requirements.is_empty());
    }

    #[test]
    fn every_category_has_complete_reference_data() {
        for v in VISA_CATEGORIES {
            assert!(!v.requirements.is_empty(), "{}", v.code);
            assert!(!v.timeline.is_empty(), "{}", v.code);
            assert!(!v.common_issues.is_empty(), "{}", v.code);
            assert!(!v.documents.is_empty(), "{}", v.code);
        }
    }
}

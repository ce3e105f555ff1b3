use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

// ── Practice areas ───────────────────────────────────────────────────────

/// The closed set of legal specialties an inquiry can be routed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PracticeArea {
    RemovalDefense,
    BusinessImmigration,
    FamilyImmigration,
    CriminalDefense,
    PersonalInjury,
    WorkersComp,
    FamilyLaw,
    Traffic,
    BusinessLaw,
    General,
}

impl PracticeArea {
    pub const ALL: [PracticeArea; 10] = [
        PracticeArea::RemovalDefense,
        PracticeArea::BusinessImmigration,
        PracticeArea::FamilyImmigration,
        PracticeArea::CriminalDefense,
        PracticeArea::PersonalInjury,
        PracticeArea::WorkersComp,
        PracticeArea::FamilyLaw,
        PracticeArea::Traffic,
        PracticeArea::BusinessLaw,
        PracticeArea::General,
    ];

    pub fn as_tag(&self) -> &'static str {
        match self {
            PracticeArea::RemovalDefense => "REMOVAL_DEFENSE",
            PracticeArea::BusinessImmigration => "BUSINESS_IMMIGRATION",
            PracticeArea::FamilyImmigration => "FAMILY_IMMIGRATION",
            PracticeArea::CriminalDefense => "CRIMINAL_DEFENSE",
            PracticeArea::PersonalInjury => "PERSONAL_INJURY",
            PracticeArea::WorkersComp => "WORKERS_COMP",
            PracticeArea::FamilyLaw => "FAMILY_LAW",
            PracticeArea::Traffic => "TRAFFIC",
            PracticeArea::BusinessLaw => "BUSINESS_LAW",
            PracticeArea::General => "GENERAL",
        }
    }

    /// Human-readable label used in summaries.
    pub fn label(&self) -> &'static str {
        match self {
            PracticeArea::RemovalDefense => "Removal Defense",
            PracticeArea::BusinessImmigration => "Business Immigration",
            PracticeArea::FamilyImmigration => "Family Immigration",
            PracticeArea::CriminalDefense => "Criminal Defense",
            PracticeArea::PersonalInjury => "Personal Injury",
            PracticeArea::WorkersComp => "Workers' Compensation",
            PracticeArea::FamilyLaw => "Family Law",
            PracticeArea::Traffic => "Traffic",
            PracticeArea::BusinessLaw => "Business Law",
            PracticeArea::General => "General Practice",
        }
    }
}

impl fmt::Display for PracticeArea {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_tag())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown practice area: {0}")]
pub struct UnknownPracticeArea(pub String);

impl FromStr for PracticeArea {
    type Err = UnknownPracticeArea;

    /// Accepts `REMOVAL_DEFENSE`, `removal_defense` and `removal-defense`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().replace('-', "_").to_ascii_uppercase();
        PracticeArea::ALL
            .into_iter()
            .find(|a| a.as_tag() == wanted)
            .ok_or_else(|| UnknownPracticeArea(s.to_string()))
    }
}

// ── Urgency ──────────────────────────────────────────────────────────────

/// Four-tier urgency used by the intake router and the immigration-court
/// analyzers. Ordered so that `max` picks the more urgent tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum UrgencyLevel {
    #[default]
    Standard,
    High,
    Urgent,
    Emergency,
}

impl UrgencyLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            UrgencyLevel::Standard => "standard",
            UrgencyLevel::High => "high",
            UrgencyLevel::Urgent => "urgent",
            UrgencyLevel::Emergency => "emergency",
        }
    }

    /// Read a model-supplied tier, accepting common synonyms.
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_lowercase().as_str() {
            "emergency" | "critical" | "immediate" => Some(UrgencyLevel::Emergency),
            "urgent" => Some(UrgencyLevel::Urgent),
            "high" | "elevated" => Some(UrgencyLevel::High),
            "standard" | "normal" | "medium" | "low" | "routine" => Some(UrgencyLevel::Standard),
            _ => None,
        }
    }
}

impl fmt::Display for UrgencyLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Three-tier severity used by the criminal and business analyzers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    #[default]
    Standard,
    Urgent,
    Critical,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Standard => "standard",
            Severity::Urgent => "urgent",
            Severity::Critical => "critical",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_lowercase().as_str() {
            "critical" | "emergency" | "severe" => Some(Severity::Critical),
            "urgent" | "high" | "serious" => Some(Severity::Urgent),
            "standard" | "normal" | "medium" | "low" | "routine" => Some(Severity::Standard),
            _ => None,
        }
    }
}

/// `deserialize_with` for model replies: an unrecognized tier reads as the
/// lowest one instead of rejecting the whole reply. Rule floors restore it.
pub fn lenient_urgency<'de, D: Deserializer<'de>>(d: D) -> Result<UrgencyLevel, D::Error> {
    let value = Value::deserialize(d)?;
    Ok(value.as_str().and_then(UrgencyLevel::from_label).unwrap_or_default())
}

pub fn lenient_severity<'de, D: Deserializer<'de>>(d: D) -> Result<Severity, D::Error> {
    let value = Value::deserialize(d)?;
    Ok(value.as_str().and_then(Severity::from_label).unwrap_or_default())
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Client metadata ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    En,
    Es,
}

impl Language {
    pub fn as_str(&self) -> &'static str {
        match self {
            Language::En => "en",
            Language::Es => "es",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ContactInfo {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    /// "phone", "email", "text", ...
    pub preferred_contact: Option<String>,
}

impl ContactInfo {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.email.is_none() && self.phone.is_none()
    }
}

// ── Advisory building blocks ─────────────────────────────────────────────

/// One applicable legal option (defense, visa category, form of relief).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegalOption {
    pub name: String,
    /// Informal label: "high", "medium", "low", "requires review", or free text.
    pub eligibility: String,
    #[serde(default)]
    pub rationale: String,
}

impl LegalOption {
    pub fn new(name: &str, eligibility: &str, rationale: impl Into<String>) -> Self {
        Self {
            name: name.to_string(),
            eligibility: eligibility.to_string(),
            rationale: rationale.into(),
        }
    }
}

// ── Case fields ──────────────────────────────────────────────────────────

/// The loosely-typed record of client-supplied facts handed to an analyzer.
///
/// Values may be strings, booleans, numbers or missing. Accessors never fail:
/// anything absent or unreadable is reported as unknown (`None`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CaseFields(Map<String, Value>);

impl CaseFields {
    pub fn new() -> Self {
        Self::default()
    }

    /// Non-object values (arrays, strings, null) become the empty record.
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::Object(map) => Self(map),
            _ => Self::default(),
        }
    }

    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.0.insert(key.to_string(), value.into());
        self
    }

    pub fn insert(&mut self, key: &str, value: impl Into<Value>) {
        self.0.insert(key.to_string(), value.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Trimmed, non-empty text. Numbers and booleans are rendered as text.
    pub fn text(&self, key: &str) -> Option<String> {
        match self.0.get(key)? {
            Value::String(s) => {
                let s = s.trim();
                (!s.is_empty()).then(|| s.to_string())
            }
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }

    /// Yes/no flag. Accepts booleans, 0/1 and the usual English and Spanish
    /// spellings; anything else is unknown.
    pub fn flag(&self, key: &str) -> Option<bool> {
        match self.0.get(key)? {
            Value::Bool(b) => Some(*b),
            Value::Number(n) => n.as_f64().map(|v| v != 0.0),
            Value::String(s) => match s.trim().to_lowercase().as_str() {
                "true" | "yes" | "y" | "1" | "si" | "sí" => Some(true),
                "false" | "no" | "n" | "0" => Some(false),
                _ => None,
            },
            _ => None,
        }
    }

    /// Flag that treats unknown as `false`.
    pub fn is_set(&self, key: &str) -> bool {
        self.flag(key).unwrap_or(false)
    }

    /// Numeric value; numeric strings like "12" or "12.5 years" are read
    /// from their leading number.
    pub fn number(&self, key: &str) -> Option<f64> {
        match self.0.get(key)? {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => leading_number(s),
            _ => None,
        }
    }
}

fn leading_number(s: &str) -> Option<f64> {
    let s = s.trim().trim_start_matches('$').replace(',', "");
    let end = s
        .char_indices()
        .find(|(_, c)| !(c.is_ascii_digit() || *c == '.'))
        .map(|(i, _)| i)
        .unwrap_or(s.len());
    s[..end].parse().ok()
}

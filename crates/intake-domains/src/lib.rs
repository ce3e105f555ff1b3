pub mod business;
pub mod criminal;
pub mod humanitarian;
pub mod intake;
pub mod removal;

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use intake_core::advisory::{Advisory, AnalysisSource};
use intake_core::agent::ModelBackend;
use intake_core::{CaseFields, PracticeArea};
use serde::Serialize;
use tracing::info;

use business::BusinessImmigrationAnalysis;
use criminal::CriminalAnalysis;
use humanitarian::HumanitarianAnalysis;
use removal::RemovalDefenseAnalysis;

/// The legal domains that have a dedicated case analyzer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum DomainTag {
    CriminalDefense,
    BusinessImmigration,
    Humanitarian,
    RemovalDefense,
}

impl DomainTag {
    pub const ALL: [DomainTag; 4] = [
        DomainTag::CriminalDefense,
        DomainTag::BusinessImmigration,
        DomainTag::Humanitarian,
        DomainTag::RemovalDefense,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DomainTag::CriminalDefense => criminal::DOMAIN,
            DomainTag::BusinessImmigration => business::DOMAIN,
            DomainTag::Humanitarian => humanitarian::DOMAIN,
            DomainTag::RemovalDefense => removal::DOMAIN,
        }
    }

    /// Analyzer for an intake practice area, if one exists. Humanitarian
    /// relief is only reachable by name.
    pub fn for_practice_area(area: PracticeArea) -> Option<DomainTag> {
        match area {
            PracticeArea::RemovalDefense => Some(DomainTag::RemovalDefense),
            PracticeArea::BusinessImmigration => Some(DomainTag::BusinessImmigration),
            PracticeArea::CriminalDefense => Some(DomainTag::CriminalDefense),
            _ => None,
        }
    }
}

impl fmt::Display for DomainTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown domain: {0}")]
pub struct UnknownDomain(pub String);

impl FromStr for DomainTag {
    type Err = UnknownDomain;

    /// Accepts `criminal-defense`, `criminal_defense` and any letter case.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().replace('_', "-").to_ascii_lowercase();
        DomainTag::ALL
            .into_iter()
            .find(|d| d.as_str() == wanted)
            .ok_or_else(|| UnknownDomain(s.to_string()))
    }
}

/// One domain analysis, tagged with the domain that produced it.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "domain", rename_all = "kebab-case")]
pub enum CaseAnalysis {
    CriminalDefense(Advisory<CriminalAnalysis>),
    BusinessImmigration(Advisory<BusinessImmigrationAnalysis>),
    Humanitarian(Advisory<HumanitarianAnalysis>),
    RemovalDefense(Advisory<RemovalDefenseAnalysis>),
}

impl CaseAnalysis {
    pub fn domain(&self) -> DomainTag {
        match self {
            CaseAnalysis::CriminalDefense(_) => DomainTag::CriminalDefense,
            CaseAnalysis::BusinessImmigration(_) => DomainTag::BusinessImmigration,
            CaseAnalysis::Humanitarian(_) => DomainTag::Humanitarian,
            CaseAnalysis::RemovalDefense(_) => DomainTag::RemovalDefense,
        }
    }

    pub fn source(&self) -> AnalysisSource {
        match self {
            CaseAnalysis::CriminalDefense(a) => a.source,
            CaseAnalysis::BusinessImmigration(a) => a.source,
            CaseAnalysis::Humanitarian(a) => a.source,
            CaseAnalysis::RemovalDefense(a) => a.source,
        }
    }

    /// Severity for criminal and business cases, urgency for the others.
    pub fn urgency_label(&self) -> &'static str {
        match self {
            CaseAnalysis::CriminalDefense(a) => a.analysis.severity.as_str(),
            CaseAnalysis::BusinessImmigration(a) => a.analysis.severity.as_str(),
            CaseAnalysis::Humanitarian(a) => a.analysis.urgency.as_str(),
            CaseAnalysis::RemovalDefense(a) => a.analysis.urgency.as_str(),
        }
    }

    pub fn next_steps(&self) -> &[String] {
        match self {
            CaseAnalysis::CriminalDefense(a) => &a.analysis.next_steps,
            CaseAnalysis::BusinessImmigration(a) => &a.analysis.next_steps,
            CaseAnalysis::Humanitarian(a) => &a.analysis.next_steps,
            CaseAnalysis::RemovalDefense(a) => &a.analysis.next_steps,
        }
    }

    pub fn strategic_considerations(&self) -> &[String] {
        match self {
            CaseAnalysis::CriminalDefense(a) => &a.analysis.strategic_considerations,
            CaseAnalysis::BusinessImmigration(a) => &a.analysis.strategic_considerations,
            CaseAnalysis::Humanitarian(a) => &a.analysis.strategic_considerations,
            CaseAnalysis::RemovalDefense(a) => &a.analysis.strategic_considerations,
        }
    }
}

/// Runs the domain analyzers against a shared, optional model backend.
#[derive(Clone, Default)]
pub struct Analyzer {
    backend: Option<Arc<dyn ModelBackend>>,
}

impl Analyzer {
    pub fn new(backend: Option<Arc<dyn ModelBackend>>) -> Self {
        Self { backend }
    }

    /// Rule-based analysis only.
    pub fn offline() -> Self {
        Self::default()
    }

    pub fn has_backend(&self) -> bool {
        self.backend.is_some()
    }

    /// Never fails; missing fields lower the quality of the advice only.
    pub async fn analyze_case(&self, domain: DomainTag, fields: &CaseFields) -> CaseAnalysis {
        let backend = self.backend.as_deref();
        let analysis = match domain {
            DomainTag::CriminalDefense => {
                CaseAnalysis::CriminalDefense(criminal::analyze(backend, fields).await)
            }
            DomainTag::BusinessImmigration => {
                CaseAnalysis::BusinessImmigration(business::analyze(backend, fields).await)
            }
            DomainTag::Humanitarian => {
                CaseAnalysis::Humanitarian(humanitarian::analyze(backend, fields).await)
            }
            DomainTag::RemovalDefense => {
                CaseAnalysis::RemovalDefense(removal::analyze(backend, fields).await)
            }
        };
        info!(
            domain = %domain,
            urgency = analysis.urgency_label(),
            source = ?analysis.source(),
            "case analyzed"
        );
        analysis
    }
}

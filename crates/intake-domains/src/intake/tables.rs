//! Keyword and response tables for the intake router.
//!
//! `CLASSIFICATION_ORDER` is checked top to bottom and the first area with a
//! matching keyword wins, so its order is part of the routing contract:
//! removal defense outranks everything, family immigration's specific terms
//! are checked before the bare "visa" of business immigration, and business
//! immigration outranks family law ("divorce" + "visa" routes to business
//! immigration).

use intake_core::{PracticeArea, UrgencyLevel};

pub const CLASSIFICATION_ORDER: &[(PracticeArea, &[&str])] = &[
    (
        PracticeArea::RemovalDefense,
        &[
            "deport*", "deportación", "deportacion", "removal", "ice", "la migra", "migra",
            "detained", "detention", "detenido", "detenida", "immigration court",
            "corte de inmigración", "notice to appear", "nta", "immigration judge", "asylum",
            "asilo",
        ],
    ),
    (
        PracticeArea::FamilyImmigration,
        &[
            "k-1", "fiancé", "fiancee", "fiancée", "fiance", "prometido", "prometida", "i-130",
            "spouse visa", "family petition", "marriage green card", "green card through marriage",
            "petition for my", "petición familiar", "residencia por matrimonio", "naturalization",
            "citizenship", "n-400", "ciudadanía",
        ],
    ),
    (
        PracticeArea::BusinessImmigration,
        &[
            "visa", "h-1b", "h1b", "l-1", "l-1a", "l-1b", "o-1", "e-2", "eb-5", "eb-2", "tn",
            "work permit", "sponsor*", "perm", "labor certification", "green card",
            "investor visa", "visa de trabajo", "permiso de trabajo",
        ],
    ),
    (
        PracticeArea::CriminalDefense,
        &[
            "arrest*", "charged", "charges", "criminal", "dui", "dwi", "felony", "misdemeanor",
            "jail", "police", "probation", "warrant", "bail", "arrestado", "arrestada", "cárcel",
            "carcel", "policía", "policia", "cargos", "fianza",
        ],
    ),
    (
        PracticeArea::PersonalInjury,
        &[
            "accident", "injur*", "hurt", "car crash", "crash", "collision", "slip and fall",
            "medical malpractice", "wrongful death", "accidente", "lesion*", "lesión", "herido",
            "herida", "choque",
        ],
    ),
    (
        PracticeArea::WorkersComp,
        &[
            "workers comp*", "workers' comp*", "worker's comp*", "work injury", "on the job",
            "workplace", "at work", "compensación laboral", "accidente de trabajo", "en el trabajo",
        ],
    ),
    (
        PracticeArea::FamilyLaw,
        &[
            "divorce", "custody", "child support", "alimony", "spousal support", "visitation",
            "adoption", "prenup*", "paternity", "divorcio", "custodia", "manutención",
            "pensión alimenticia",
        ],
    ),
    (
        PracticeArea::Traffic,
        &[
            "ticket", "speeding", "traffic", "license suspended", "suspended license",
            "driving without a license", "citation", "multa", "infracción",
            "licencia suspendida",
        ],
    ),
    (
        PracticeArea::BusinessLaw,
        &[
            "contract", "llc", "corporation", "incorporat*", "business formation", "partnership",
            "trademark", "breach", "my business", "my company", "contrato", "negocio", "empresa",
        ],
    ),
];

/// Checked in order; the first tier with a matching keyword wins.
pub const URGENCY_ORDER: &[(UrgencyLevel, &[&str])] = &[
    (
        UrgencyLevel::Emergency,
        &[
            "detained", "detenido", "detenida", "arrested", "arrestado", "arrestada",
            "in custody", "in jail", "en la cárcel", "ice raid", "being deported",
            "deported tomorrow", "emergency", "emergencia",
        ],
    ),
    (
        UrgencyLevel::Urgent,
        &[
            "court date", "hearing", "audiencia", "tomorrow", "mañana", "this week",
            "esta semana", "deadline", "fecha límite", "notice to appear", "warrant", "expir*",
            "urgent", "urgente",
        ],
    ),
    (
        UrgencyLevel::High,
        &[
            "soon", "next month", "pronto", "received a notice", "notice", "served", "lawsuit",
            "demanda", "accident", "injur*",
        ],
    ),
];

pub fn estimated_response_time(urgency: UrgencyLevel) -> &'static str {
    match urgency {
        UrgencyLevel::Emergency => "within 1 hour",
        UrgencyLevel::Urgent => "within 4 hours",
        UrgencyLevel::High => "within 24 hours",
        UrgencyLevel::Standard => "within 1-2 business days",
    }
}

pub const EMERGENCY_STEP: &str =
    "Call our 24/7 emergency line now; an attorney will respond within 1 hour";

pub fn required_documents(area: PracticeArea) -> &'static [&'static str] {
    match area {
        PracticeArea::RemovalDefense => &[
            "Notice to Appear or any immigration court notice",
            "A-number and detention location, if detained",
            "Passport and any prior immigration applications",
            "Certified dispositions of any criminal cases",
        ],
        PracticeArea::FamilyImmigration => &[
            "Birth and marriage certificates",
            "Petitioner's proof of US citizenship or permanent residence",
            "Beneficiary's passport and entry records",
        ],
        PracticeArea::BusinessImmigration => &[
            "Passport and current visa or I-94",
            "Resume and diplomas",
            "Job offer or employer details",
        ],
        PracticeArea::CriminalDefense => &[
            "Charging document or citation",
            "Bail or bond paperwork",
            "Court notices with hearing dates",
        ],
        PracticeArea::PersonalInjury => &[
            "Accident or police report",
            "Medical records and bills",
            "Photos of the scene and injuries",
            "Insurance information for every party",
        ],
        PracticeArea::WorkersComp => &[
            "Employer's incident report",
            "Medical records for the injury",
            "Pay stubs showing lost wages",
        ],
        PracticeArea::FamilyLaw => &[
            "Marriage certificate and any prior court orders",
            "Children's birth certificates",
            "Recent income and asset statements",
        ],
        PracticeArea::Traffic => &["The ticket or citation", "Driving record, if available"],
        PracticeArea::BusinessLaw => &[
            "Contracts or agreements in dispute",
            "Formation documents for the business",
            "Relevant correspondence",
        ],
        PracticeArea::General => &["Any documents related to the matter"],
    }
}

pub fn next_steps(area: PracticeArea) -> &'static [&'static str] {
    match area {
        PracticeArea::RemovalDefense => &[
            "Do not sign any documents from immigration officers without a lawyer",
            "Gather the Notice to Appear and all immigration paperwork",
            "Schedule a removal defense consultation",
        ],
        PracticeArea::FamilyImmigration => &[
            "Confirm the petitioner's status and relationship to the beneficiary",
            "Schedule a family immigration consultation",
        ],
        PracticeArea::BusinessImmigration => &[
            "Share the employer's details and the beneficiary's current status",
            "Schedule a business immigration strategy call",
        ],
        PracticeArea::CriminalDefense => &[
            "Do not discuss the case with police or anyone else",
            "Send us every court paper you have received",
            "Schedule a criminal defense consultation before the next court date",
        ],
        PracticeArea::PersonalInjury => &[
            "Get medical treatment and keep every record",
            "Do not give a recorded statement to the other insurer",
            "Schedule a free case review",
        ],
        PracticeArea::WorkersComp => &[
            "Report the injury to your employer in writing if you have not already",
            "Schedule a workers' compensation consultation",
        ],
        PracticeArea::FamilyLaw => &[
            "Collect existing court orders and financial records",
            "Schedule a family law consultation",
        ],
        PracticeArea::Traffic => &[
            "Note the court or payment deadline on the ticket",
            "Schedule a traffic consultation before the deadline",
        ],
        PracticeArea::BusinessLaw => &[
            "Collect the contracts and correspondence involved",
            "Schedule a business law consultation",
        ],
        PracticeArea::General => &[
            "Tell us a little more about your situation",
            "Schedule a general consultation",
        ],
    }
}

/// Common Spanish words used to guess the message language when the client
/// did not pick one.
pub const SPANISH_MARKERS: &[&str] = &[
    "hola", "necesito", "ayuda", "abogado", "abogada", "tengo", "quiero", "por favor",
    "gracias", "mi", "mis", "esposo", "esposa", "hijo", "hija", "fue", "estoy", "porque",
    "cómo", "como", "qué", "usted",
];

//! Static criminal-defense reference data consumed by the rule-based analysis.

use intake_core::keywords::{mentions_any, normalize};

pub(crate) const FELONY_TERMS: &[&str] = &[
    "felony",
    "murder",
    "homicide",
    "manslaughter",
    "robbery",
    "burglary",
    "aggravated*",
    "kidnap*",
    "rape",
    "sexual assault",
    "trafficking",
    "grand theft",
    "arson",
    "carjacking",
    "possession with intent",
    "distribution",
    "assault with a deadly weapon",
    "delito grave",
];

pub(crate) const MISDEMEANOR_TERMS: &[&str] = &[
    "misdemeanor",
    "dui",
    "dwi",
    "owi",
    "drunk driving",
    "petty theft",
    "shoplifting",
    "possession",
    "trespass*",
    "disorderly conduct",
    "domestic*",
    "assault",
    "battery",
    "vandalism",
    "theft",
    "resisting arrest",
];

pub(crate) const INFRACTION_TERMS: &[&str] = &["infraction", "ticket", "citation", "speeding"];

/// Charges serious enough that prosecutors rarely offer favorable pleas.
pub(crate) const SERIOUS_FELONY_TERMS: &[&str] = &[
    "murder",
    "homicide",
    "manslaughter",
    "kidnap*",
    "rape",
    "sexual assault",
    "armed robbery",
    "carjacking",
];

/// Whole prior-record answers that mean "no record", after normalization.
pub(crate) const NO_RECORD_ANSWERS: &[&str] = &[
    "none", "no", "n a", "na", "nothing", "clean", "0", "ninguno", "nada",
];

/// An answer opening with one of these words denies a record.
pub(crate) const NO_RECORD_LEADING: &[&str] = &[
    "none", "no", "nope", "nothing", "never", "clean", "ninguno", "ninguna", "nada",
];

pub(crate) const NO_RECORD_PHRASES: &[&str] = &[
    "no prior*",
    "no criminal record",
    "no record",
    "first offense",
    "first arrest",
    "first time",
    "never arrested",
    "never been arrested",
    "sin antecedentes",
    "primera vez",
];

/// Words that turn a denial into a partial admission ("no felonies, but...").
pub(crate) const RECORD_QUALIFIERS: &[&str] = &["but", "except", "although", "pero", "excepto"];

/// Does a free-text prior-record answer say the client has no record?
pub(crate) fn denies_record(answer: &str) -> bool {
    let normalized = normalize(answer);
    let answer = normalized.trim();
    if NO_RECORD_ANSWERS.contains(&answer) {
        return true;
    }
    if mentions_any(answer, RECORD_QUALIFIERS) {
        return false;
    }
    let leading = answer.split(' ').next().unwrap_or_default();
    NO_RECORD_LEADING.contains(&leading) || mentions_any(answer, NO_RECORD_PHRASES)
}

pub(crate) const DUI_TERMS: &[&str] = &[
    "dui",
    "dwi",
    "owi",
    "drunk driving",
    "driving under the influence",
    "intoxicated",
];

pub(crate) const DRUG_TERMS: &[&str] = &[
    "drug*",
    "possession",
    "narcotic*",
    "marijuana",
    "cocaine",
    "heroin",
    "meth*",
    "fentanyl",
    "controlled substance",
];

pub(crate) const DOMESTIC_TERMS: &[&str] = &[
    "domestic*",
    "family violence",
    "restraining order",
    "protective order",
];

pub(crate) const VIOLENCE_TERMS: &[&str] = &["assault", "battery", "fight", "domestic*"];

pub(crate) const THEFT_TERMS: &[&str] = &[
    "theft",
    "shoplifting",
    "larceny",
    "burglary",
    "robbery",
    "fraud",
    "embezzlement",
];

pub(crate) const WEAPON_TERMS: &[&str] = &["weapon*", "firearm*", "gun", "knife"];

pub(crate) const SEX_OFFENSE_TERMS: &[&str] = &["sexual*", "rape", "indecent*", "lewd"];

/// Immigration-status answers that indicate the client is not a citizen.
pub(crate) const NONCITIZEN_TERMS: &[&str] = &[
    "non-citizen",
    "noncitizen",
    "not a citizen",
    "undocumented",
    "green card",
    "permanent resident",
    "lpr",
    "visa",
    "daca",
    "tps",
    "asylum*",
    "refugee",
];

/// Charge keyword set → collateral consequences it triggers.
pub(crate) const COLLATERAL_CONSEQUENCES: &[(&[&str], &[&str])] = &[
    (
        DUI_TERMS,
        &[
            "Driver's license suspension",
            "Mandatory DUI education or treatment program",
            "Possible ignition interlock device requirement",
            "Increased insurance premiums",
        ],
    ),
    (
        DRUG_TERMS,
        &[
            "Ineligibility for certain federal benefits and student aid",
            "Professional license review",
        ],
    ),
    (
        DOMESTIC_TERMS,
        &[
            "Federal prohibition on firearm possession",
            "Protective order restricting contact or residence",
            "Impact on child custody proceedings",
        ],
    ),
    (
        THEFT_TERMS,
        &["Crime-of-dishonesty finding that affects employment and professional licensing"],
    ),
    (WEAPON_TERMS, &["Loss of firearm rights"]),
    (SEX_OFFENSE_TERMS, &["Possible sex-offender registration"]),
];

pub(crate) const BASE_DOCUMENTS: &[&str] = &[
    "Charging document, complaint or citation",
    "Bail or bond paperwork",
    "Police report (we will request it if you do not have it)",
    "All court notices with hearing dates",
];

pub(crate) const DUI_DOCUMENTS: &[&str] = &[
    "Breath or blood test results",
    "DMV notice of suspension",
];

pub(crate) const IMMIGRATION_DOCUMENTS: &[&str] =
    &["Immigration documents (green card, visa, work permit)"];

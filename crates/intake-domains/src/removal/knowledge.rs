//! Reference data for removal-defense screening.

pub struct RemovalRelief {
    pub code: &'static str,
    pub name: &'static str,
    pub evidence: &'static [&'static str],
}

pub const RELIEF_TYPES: &[RemovalRelief] = &[
    RemovalRelief {
        code: "non-lpr-cancellation",
        name: "Cancellation of removal for non-permanent residents",
        evidence: &[
            "Proof of 10 years of continuous physical presence (leases, tax returns, school and medical records)",
            "Birth or marriage certificates for the qualifying US citizen or LPR relatives",
            "Evidence of exceptional and extremely unusual hardship to those relatives",
            "Good moral character evidence (letters, tax compliance)",
        ],
    },
    RemovalRelief {
        code: "lpr-cancellation",
        name: "Cancellation of removal for permanent residents",
        evidence: &[
            "Green card and proof of the date residence was granted",
            "Proof of 7 years of continuous residence after admission",
            "Evidence of rehabilitation, family ties and employment",
        ],
    },
    RemovalRelief {
        code: "asylum",
        name: "Asylum",
        evidence: &[
            "Detailed declaration of past persecution and fear of return",
            "Country-conditions reports",
        ],
    },
    RemovalRelief {
        code: "withholding",
        name: "Withholding of removal and Convention Against Torture protection",
        evidence: &["Evidence that persecution or torture is more likely than not"],
    },
    RemovalRelief {
        code: "adjustment",
        name: "Adjustment of status through a qualifying relative",
        evidence: &[
            "Proof of lawful entry (I-94, visa, parole document)",
            "Approved or pending I-130 petition from the relative",
            "Affidavit of support (I-864)",
        ],
    },
    RemovalRelief {
        code: "voluntary-departure",
        name: "Voluntary departure",
        evidence: &["Valid passport or travel document", "Proof of funds for departure"],
    },
    RemovalRelief {
        code: "prosecutorial-discretion",
        name: "Prosecutorial discretion (dismissal or administrative closure)",
        evidence: &["Equities packet: family ties, length of residence, employment, community letters"],
    },
];

pub fn relief_type(code: &str) -> Option<&'static RemovalRelief> {
    RELIEF_TYPES.iter().find(|r| r.code == code)
}

/// Offenses treated as aggravated felonies; they bar cancellation, voluntary
/// departure and usually bond.
pub(crate) const AGGRAVATED_FELONY_TERMS: &[&str] = &[
    "aggravated felony",
    "murder",
    "rape",
    "sexual abuse of a minor",
    "drug trafficking",
    "trafficking",
    "firearm trafficking",
    "money laundering",
    "crime of violence",
];

/// Convictions that bar non-LPR cancellation in addition to aggravated felonies.
pub(crate) const DISQUALIFYING_TERMS: &[&str] = &[
    "felony",
    "moral turpitude",
    "cimt",
    "fraud",
    "theft",
    "burglary",
    "robbery",
    "drug*",
    "controlled substance",
    "possession",
    "domestic*",
    "child abuse",
];

pub(crate) const FELONY_TERMS: &[&str] = &["felony", "delito grave"];

/// Entry-method answers that mean the client was inspected and admitted or paroled.
pub(crate) const INSPECTED_ENTRY_TERMS: &[&str] = &[
    "visa",
    "inspected",
    "with inspection",
    "parole*",
    "admitted",
    "tourist",
    "student",
    "airport",
    "port of entry",
    "border crossing card",
    "i-94",
];

pub(crate) const UNINSPECTED_ENTRY_TERMS: &[&str] = &[
    "without inspection",
    "ewi",
    "crossed",
    "illegal*",
    "undocumented",
    "sin inspección",
    "sin papeles",
];

pub(crate) const BASE_EVIDENCE: &[&str] = &[
    "Notice to Appear and every immigration court notice",
    "Passport, birth certificate or other identity documents",
];

use serde::Serialize;

use crate::types::PracticeArea;

/// Which specialist queue handles a practice area, and how fast.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoutingInfo {
    pub practice_area: PracticeArea,
    pub specialist: &'static str,
    pub queue: &'static str,
    /// 1 is the highest priority.
    pub priority: u8,
    pub availability: &'static str,
    pub special_instructions: &'static [&'static str],
}

pub const GENERAL_COUNSEL: RoutingInfo = RoutingInfo {
    practice_area: PracticeArea::General,
    specialist: "General Counsel",
    queue: "general-intake",
    priority: 4,
    availability: "Monday-Friday, 9am-6pm",
    special_instructions: &[
        "Review the inquiry and reassign to a specialist queue if a practice area becomes clear",
    ],
};

const ROUTING_TABLE: &[RoutingInfo] = &[
    RoutingInfo {
        practice_area: PracticeArea::RemovalDefense,
        specialist: "Removal Defense Team",
        queue: "removal-defense",
        priority: 1,
        availability: "24/7 emergency line",
        special_instructions: &[
            "Confirm detention location and A-number on first contact",
            "Check for scheduled hearings or removal dates",
            "Escalate detained clients to the on-call attorney immediately",
        ],
    },
    RoutingInfo {
        practice_area: PracticeArea::CriminalDefense,
        specialist: "Criminal Defense Team",
        queue: "criminal-defense",
        priority: 1,
        availability: "24/7 for arrests, otherwise Monday-Saturday",
        special_instructions: &[
            "Advise the client not to discuss the case with police or other inmates",
            "Flag non-citizen clients for an immigration-consequences review",
        ],
    },
    RoutingInfo {
        practice_area: PracticeArea::BusinessImmigration,
        specialist: "Business Immigration Team",
        queue: "business-immigration",
        priority: 3,
        availability: "Monday-Friday, 8am-6pm",
        special_instructions: &[
            "Collect current status and expiration dates for every beneficiary",
            "Note H-1B cap season deadlines",
        ],
    },
    RoutingInfo {
        practice_area: PracticeArea::FamilyImmigration,
        specialist: "Family Immigration Team",
        queue: "family-immigration",
        priority: 3,
        availability: "Monday-Friday, 9am-6pm",
        special_instructions: &[
            "Identify the petitioner's status and the relationship to the beneficiary",
        ],
    },
    RoutingInfo {
        practice_area: PracticeArea::PersonalInjury,
        specialist: "Personal Injury Team",
        queue: "personal-injury",
        priority: 2,
        availability: "7 days a week, 8am-8pm",
        special_instructions: &[
            "Record the incident date to check the statute of limitations",
            "Ask whether the client has spoken with any insurance adjuster",
        ],
    },
    RoutingInfo {
        practice_area: PracticeArea::WorkersComp,
        specialist: "Workers' Compensation Team",
        queue: "workers-comp",
        priority: 2,
        availability: "Monday-Friday, 8am-6pm",
        special_instructions: &[
            "Confirm whether the injury was reported to the employer and when",
        ],
    },
    RoutingInfo {
        practice_area: PracticeArea::FamilyLaw,
        specialist: "Family Law Team",
        queue: "family-law",
        priority: 3,
        availability: "Monday-Friday, 9am-6pm",
        special_instructions: &[
            "Screen for domestic violence and safety concerns before scheduling",
        ],
    },
    RoutingInfo {
        practice_area: PracticeArea::Traffic,
        specialist: "Traffic Defense Team",
        queue: "traffic",
        priority: 4,
        availability: "Monday-Friday, 9am-5pm",
        special_instructions: &["Collect the citation number and court date"],
    },
    RoutingInfo {
        practice_area: PracticeArea::BusinessLaw,
        specialist: "Business Law Team",
        queue: "business-law",
        priority: 4,
        availability: "Monday-Friday, 9am-6pm",
        special_instructions: &["Run a conflict check on every named entity"],
    },
    GENERAL_COUNSEL,
];

/// Routing metadata for a practice area. Total over the enum.
pub fn lookup_routing(area: PracticeArea) -> &'static RoutingInfo {
    ROUTING_TABLE
        .iter()
        .find(|r| r.practice_area == area)
        .unwrap_or(&GENERAL_COUNSEL)
}

/// Routing metadata for a raw tag; unknown tags get the general counsel entry.
pub fn lookup_routing_tag(tag: &str) -> &'static RoutingInfo {
    match tag.parse::<PracticeArea>() {
        Ok(area) => lookup_routing(area),
        Err(_) => &GENERAL_COUNSEL,
    }
}

pub fn routing_table() -> &'static [RoutingInfo] {
    ROUTING_TABLE
}

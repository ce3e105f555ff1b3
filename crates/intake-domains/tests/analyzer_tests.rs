use std::sync::{Arc, Mutex};

use anyhow::{bail, Result};
use async_trait::async_trait;
use intake_core::advisory::AnalysisSource;
use intake_core::agent::{CompletionRequest, ModelBackend};
use intake_core::{CaseFields, PracticeArea, Severity, UrgencyLevel};
use intake_domains::intake::{route_offline, IntakeRequest, IntakeRouter};
use intake_domains::{Analyzer, CaseAnalysis, DomainTag};
use serde_json::json;
use tracing_test::traced_test;

/// Replies with a fixed string and counts calls.
struct Scripted {
    reply: Result<String, String>,
    calls: Mutex<usize>,
}

impl Scripted {
    fn ok(reply: &str) -> Arc<Self> {
        Arc::new(Self { reply: Ok(reply.into()), calls: Mutex::new(0) })
    }

    fn failing() -> Arc<Self> {
        Arc::new(Self { reply: Err("connection refused".into()), calls: Mutex::new(0) })
    }

    fn calls(&self) -> usize {
        *self.calls.lock().unwrap()
    }
}

#[async_trait]
impl ModelBackend for Scripted {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, _request: &CompletionRequest) -> Result<String> {
        *self.calls.lock().unwrap() += 1;
        match &self.reply {
            Ok(text) => Ok(text.clone()),
            Err(msg) => bail!("{msg}"),
        }
    }
}

fn fields(v: serde_json::Value) -> CaseFields {
    CaseFields::from_value(v)
}

// ── analyze_case ─────────────────────────────────────────────────────────

#[tokio::test]
async fn jane_doe_dui_offline() {
    let analysis = Analyzer::offline()
        .analyze_case(
            DomainTag::CriminalDefense,
            &fields(json!({
                "clientName": "Jane Doe",
                "charges": "DUI first offense",
                "isDetained": false,
                "priorRecord": "None",
            })),
        )
        .await;

    let CaseAnalysis::CriminalDefense(advisory) = &analysis else {
        panic!("wrong domain: {analysis:?}");
    };
    assert_eq!(advisory.source, AnalysisSource::Fallback);
    assert_eq!(advisory.analysis.plea_bargain_likelihood, "medium");
    assert!(advisory
        .analysis
        .collateral_consequences
        .iter()
        .any(|c| c == "Driver's license suspension"));

    let value = serde_json::to_value(&analysis).unwrap();
    assert_eq!(value["domain"], "criminal-defense");
    assert_eq!(value["pleaBargainLikelihood"], "medium");
    assert_eq!(value["source"], "fallback");
}

#[tokio::test]
async fn every_domain_handles_the_empty_record() {
    let analyzer = Analyzer::offline();
    for domain in DomainTag::ALL {
        let analysis = analyzer.analyze_case(domain, &CaseFields::new()).await;
        assert_eq!(analysis.domain(), domain);
        assert!(!analysis.urgency_label().is_empty(), "{domain}");
        assert!(!analysis.next_steps().is_empty(), "{domain}");
        assert!(!analysis.strategic_considerations().is_empty(), "{domain}");
    }
}

#[tokio::test]
async fn offline_analysis_is_idempotent() {
    let analyzer = Analyzer::offline();
    let record = fields(json!({
        "isDetained": "yes",
        "yearsInUs": "11",
        "hasQualifyingRelative": true,
        "fearOfReturn": true,
    }));
    for domain in DomainTag::ALL {
        let first = analyzer.analyze_case(domain, &record).await;
        let second = analyzer.analyze_case(domain, &record).await;
        assert_eq!(first, second, "{domain}");
    }
}

#[tokio::test]
async fn detained_clients_are_top_tier() {
    let analyzer = Analyzer::offline();
    let record = fields(json!({"isDetained": true}));

    let criminal = analyzer.analyze_case(DomainTag::CriminalDefense, &record).await;
    assert_eq!(criminal.urgency_label(), Severity::Critical.as_str());
    let removal = analyzer.analyze_case(DomainTag::RemovalDefense, &record).await;
    assert_eq!(removal.urgency_label(), UrgencyLevel::Emergency.as_str());
    let humanitarian = analyzer.analyze_case(DomainTag::Humanitarian, &record).await;
    assert_eq!(humanitarian.urgency_label(), UrgencyLevel::Emergency.as_str());
}

#[tokio::test]
#[traced_test]
async fn failing_backend_degrades_to_rules() {
    let backend = Scripted::failing();
    let analyzer = Analyzer::new(Some(backend.clone()));
    let record = fields(json!({"yearsInUs": 12, "hasQualifyingRelative": true}));

    let analysis = analyzer.analyze_case(DomainTag::RemovalDefense, &record).await;
    assert_eq!(backend.calls(), 1);
    assert_eq!(analysis.source(), AnalysisSource::Fallback);
    assert_eq!(analysis, Analyzer::offline().analyze_case(DomainTag::RemovalDefense, &record).await);
    assert!(logs_contain("model call failed"));
    assert!(logs_contain("connection refused"));
}

#[tokio::test]
async fn structured_reply_cannot_lower_severity() {
    let backend = Scripted::ok(
        r#"```json
        {"severity": "standard", "chargeCategory": "felony", "pleaBargainLikelihood": "low",
         "defenses": [{"name": "Self-defense", "eligibility": "medium", "rationale": "Witness statements"}]}
        ```"#,
    );
    let analyzer = Analyzer::new(Some(backend));
    let analysis = analyzer
        .analyze_case(
            DomainTag::CriminalDefense,
            &fields(json!({"charges": "aggravated assault", "isDetained": true})),
        )
        .await;

    let CaseAnalysis::CriminalDefense(advisory) = analysis else {
        panic!("wrong domain");
    };
    assert_eq!(advisory.source, AnalysisSource::Model);
    assert_eq!(advisory.analysis.severity, Severity::Critical);
    assert_eq!(advisory.analysis.defenses[0].name, "Self-defense");
    assert!(!advisory.analysis.next_steps.is_empty());
    assert!(!advisory.analysis.bond_recommendation.is_empty());
}

#[tokio::test]
async fn off_vocabulary_tiers_stay_structured() {
    let analyzer = Analyzer::new(Some(Scripted::ok(
        r#"{"severity": "high", "pleaBargainLikelihood": "medium"}"#,
    )));
    let CaseAnalysis::CriminalDefense(advisory) = analyzer
        .analyze_case(DomainTag::CriminalDefense, &fields(json!({"charges": "DUI", "isDetained": true})))
        .await
    else {
        panic!("wrong domain");
    };
    assert_eq!(advisory.source, AnalysisSource::Model);
    assert_eq!(advisory.analysis.severity, Severity::Critical);

    let analyzer = Analyzer::new(Some(Scripted::ok(
        r#"{"urgency": "critical", "bondEligibility": "eligible"}"#,
    )));
    let CaseAnalysis::RemovalDefense(advisory) = analyzer
        .analyze_case(DomainTag::RemovalDefense, &fields(json!({})))
        .await
    else {
        panic!("wrong domain");
    };
    assert_eq!(advisory.source, AnalysisSource::Model);
    assert_eq!(advisory.analysis.urgency, UrgencyLevel::Emergency);

    let analyzer = Analyzer::new(Some(Scripted::ok(r#"{"urgency": "asap"}"#)));
    let CaseAnalysis::Humanitarian(advisory) = analyzer
        .analyze_case(DomainTag::Humanitarian, &fields(json!({"isDetained": true})))
        .await
    else {
        panic!("wrong domain");
    };
    assert_eq!(advisory.source, AnalysisSource::Model);
    assert_eq!(advisory.analysis.urgency, UrgencyLevel::Emergency);
}

#[tokio::test]
async fn prose_reply_is_kept_as_narrative() {
    let backend = Scripted::ok("The client likely qualifies for an O-1 visa.");
    let analyzer = Analyzer::new(Some(backend));
    let analysis = analyzer
        .analyze_case(DomainTag::BusinessImmigration, &fields(json!({"extraordinaryAbility": true})))
        .await;

    let CaseAnalysis::BusinessImmigration(advisory) = analysis else {
        panic!("wrong domain");
    };
    assert_eq!(advisory.source, AnalysisSource::Narrative);
    assert_eq!(
        advisory.narrative.as_deref(),
        Some("The client likely qualifies for an O-1 visa.")
    );
    assert_eq!(advisory.analysis.recommended_visas[0].name, "O-1 extraordinary ability");
}

// ── intake routing ───────────────────────────────────────────────────────

#[tokio::test]
async fn ice_and_divorce_routes_to_removal_defense() {
    let result = IntakeRouter::offline()
        .route(&IntakeRequest::new("I was detained by ICE and also need a divorce"))
        .await;
    assert_eq!(result.practice_area, PracticeArea::RemovalDefense);
    assert_eq!(result.secondary_practice_areas, vec![PracticeArea::FamilyLaw]);

    let value = serde_json::to_value(&result).unwrap();
    assert_eq!(value["practiceArea"], "REMOVAL_DEFENSE");
    assert_eq!(value["routingRecommendation"]["queue"], "removal-defense");
    assert_eq!(value["urgencyLevel"], "emergency");
}

#[tokio::test]
async fn emergency_flag_dominates_any_message() {
    let router = IntakeRouter::offline();
    for message in ["", "question about a will", "speeding ticket next month", "¿Hola?"] {
        let result = router.route(&IntakeRequest::new(message).emergency(true)).await;
        assert_eq!(result.urgency_level, UrgencyLevel::Emergency, "{message:?}");
        assert_eq!(result.estimated_response_time, "within 1 hour");
    }
}

#[tokio::test]
async fn emergency_flag_dominates_the_model() {
    let backend = Scripted::ok(r#"{"practiceArea": "TRAFFIC", "urgencyLevel": "standard", "summary": "Ticket"}"#);
    let router = IntakeRouter::new(Some(backend.clone()));
    let result = router
        .route(&IntakeRequest::new("got a ticket").emergency(true))
        .await;
    assert_eq!(backend.calls(), 1);
    assert_eq!(result.source, AnalysisSource::Model);
    assert_eq!(result.practice_area, PracticeArea::Traffic);
    assert_eq!(result.urgency_level, UrgencyLevel::Emergency);
    assert_eq!(result.summary, "Ticket");
}

#[tokio::test]
async fn unknown_model_tag_falls_back_to_keywords() {
    let backend = Scripted::ok(r#"{"practiceArea": "MARITIME_LAW", "urgencyLevel": "high"}"#);
    let router = IntakeRouter::new(Some(backend));
    let result = router
        .route(&IntakeRequest::new("I was in a car accident last week"))
        .await;
    assert_eq!(result.practice_area, PracticeArea::PersonalInjury);
    assert_eq!(result.urgency_level, UrgencyLevel::High);
}

#[tokio::test]
#[traced_test]
async fn failed_model_call_routes_like_offline() {
    let request = IntakeRequest::new("My employer wants to sponsor an H-1B");
    let result = IntakeRouter::new(Some(Scripted::failing())).route(&request).await;
    assert_eq!(result, route_offline(&request));
    assert!(logs_contain("model call failed"));
}

#[test]
fn every_message_resolves_to_a_known_area() {
    let messages = [
        String::new(),
        "   ".to_string(),
        "🙂🙂🙂".to_string(),
        "x".repeat(5000),
        "Necesito un abogado".to_string(),
        "deport deportation deported".to_string(),
    ];
    for message in messages {
        let result = route_offline(&IntakeRequest::new(message.as_str()));
        assert!(PracticeArea::ALL.contains(&result.practice_area), "{message:?}");
        assert!(!result.next_steps.is_empty());
    }
}

#[test]
fn offline_routing_is_idempotent() {
    let request = IntakeRequest::new("Me arrestaron y tengo audiencia mañana");
    assert_eq!(route_offline(&request), route_offline(&request));
}

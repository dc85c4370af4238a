//! End-to-end validation scenarios and properties.

use amis_core::{
    validate, ComplianceValidator, ConfidenceCalibrator, ConfidenceLevel, EngineConfig, HarmAction,
    HarmAssessment, HarmThresholds, Severity, SourceClassifier, SourceRef, SourceRegistry,
    Standard, Tier, ViolationType,
};
use proptest::prelude::*;

fn refs(urls: &[&str]) -> Vec<SourceRef> {
    urls.iter().map(|u| SourceRef::new(*u)).collect()
}

// ===================================================================
// SCENARIOS
// ===================================================================

#[test]
fn test_chest_pain_without_emergency_referral() {
    let result = validate(
        "This is probably nothing serious, most likely a pulled muscle. Just rest and see how it goes.",
        "I have crushing chest pain radiating to my left arm",
        &[],
    );

    let red_flag = result
        .violations
        .iter()
        .find(|v| v.violation_type == ViolationType::RedFlagNoEmergencyReferral)
        .expect("red flag violation");
    assert_eq!(red_flag.standard, Standard::TherapeuticScope);
    assert_eq!(red_flag.severity, Severity::Critical);

    assert!(!result.compliant);
    assert_eq!(result.harm_assessment.action, HarmAction::Block);
    assert!(result.must_withhold());
    assert!(result
        .recommendations
        .iter()
        .any(|r| r.contains("emergency services")));
}

#[test]
fn test_turmeric_dosing_from_unknown_blog() {
    let response = "Turmeric is proven to reduce inflammation. Take 500mg twice daily.";
    let result = validate(
        response,
        "Does turmeric help with arthritis pain?",
        &refs(&["example-blog.com"]),
    );

    assert_eq!(result.source_classifications[0].tier, Tier::ExpertOpinion);

    let overconfident = result
        .violations
        .iter()
        .find(|v| v.violation_type == ViolationType::OverconfidentLanguage)
        .expect("overconfidence violation");
    assert_eq!(overconfident.standard, Standard::UncertaintyDisclosure);
    let span = overconfident.evidence_span.as_ref().unwrap();
    assert_eq!(&response[span.start..span.end], "proven");

    let dosing = result
        .violations
        .iter()
        .find(|v| v.violation_type == ViolationType::SpecificDosingProvided)
        .expect("dosing violation");
    assert!(dosing.is_critical());
    assert_eq!(dosing.evidence_span.as_ref().unwrap().text, "500mg");

    assert!(result.has_violation(ViolationType::MissingPhysicianReferral));
    assert!(!result.compliant);
}

#[test]
fn test_well_sourced_vitamin_d_response_is_compliant() {
    let result = validate(
        "A Cochrane systematic review found insufficient evidence to determine whether vitamin D \
         supplementation changes COVID-19 outcomes. The trials were small and of low certainty, \
         and more research is needed. Talk to your doctor before starting any supplement.",
        "What does the evidence say about vitamin D and COVID-19 outcomes?",
        &refs(&["https://www.cochranelibrary.com/cdsr/doi/10.1002/14651858.CD015043"]),
    );

    assert!(result.violations.is_empty(), "{:?}", result.violations);
    assert_eq!(result.score, 1.0);
    assert_eq!(result.harm_assessment.action, HarmAction::Pass);
    assert!(result.compliant);
}

#[test]
fn test_clean_response_gets_compliant_recommendation() {
    let result = validate(
        "A Cochrane systematic review found that regular handwashing lowers infection rates. \
         Talk to your doctor if you have questions.",
        "Does handwashing matter?",
        &refs(&["https://www.cochranelibrary.com/cdsr/1", "https://www.nejm.org/doi/x"]),
    );

    assert!(result.compliant, "{:?}", result.violations);
    assert_eq!(result.recommendations, vec!["Response meets compliance requirements."]);
}

#[test]
fn test_single_tier_three_source_requires_hedging() {
    assert_eq!(
        ConfidenceCalibrator::calibrate(&[Tier::SupportingEvidence]),
        ConfidenceLevel::Uncertain
    );

    let result = validate(
        "Regular walking is proven to lower blood pressure. Evidence is limited for older adults.",
        "",
        &refs(&["https://www.mayoclinic.org/healthy-lifestyle"]),
    );
    assert!(result
        .violations_for(Standard::UncertaintyDisclosure)
        .any(|v| v.violation_type == ViolationType::OverconfidentLanguage));
}

#[test]
fn test_embedded_tier_five_link_is_flagged() {
    let result = validate(
        "According to a Cochrane review this is unclear; watch https://www.youtube.com/watch?v=abc for a summary.",
        "",
        &refs(&["https://www.cochranelibrary.com/cdsr/1"]),
    );

    let tier5: Vec<_> = result
        .violations
        .iter()
        .filter(|v| v.violation_type == ViolationType::Tier5Source)
        .collect();
    assert_eq!(tier5.len(), 1);
    assert!(!result.compliant);
}

#[test]
fn test_empty_input_is_speculative_and_passes_harm() {
    let report = ComplianceValidator::default().evaluate("", "", &[]);

    assert_eq!(report.required_confidence, ConfidenceLevel::Speculative);
    assert_eq!(report.result.harm_assessment, HarmAssessment::clear());
    assert!(!report.result.has_critical());
    assert!(report.result.violations.is_empty());
    assert_eq!(report.result.score, 1.0);
}

#[test]
fn test_emergency_words_in_answer_are_not_red_flag_intent() {
    let result = validate(
        "A Cochrane systematic review found statins lower the rate of heart attack and stroke. \
         Evidence is limited for people over 75, so talk to your doctor.",
        "What do statins do? What is the consensus?",
        &refs(&["https://www.cochranelibrary.com/cdsr/1", "https://www.nejm.org/doi/x"]),
    );

    assert!(!result.has_violation(ViolationType::RedFlagNoEmergencyReferral));
    assert!(!result.has_critical(), "{:?}", result.violations);
}

#[test]
fn test_daily_rate_dose_is_flagged() {
    let result = validate(
        "Take 500 mg/day of turmeric.",
        "Should I take turmeric for my knees?",
        &[],
    );

    let dosing = result
        .violations
        .iter()
        .find(|v| v.violation_type == ViolationType::SpecificDosingProvided)
        .expect("dosing violation");
    assert_eq!(dosing.evidence_span.as_ref().unwrap().text, "500 mg/day");
    assert!(result.harm_assessment.direct >= 3);
}

#[test]
fn test_validation_is_idempotent() {
    let validator = ComplianceValidator::default();
    let args = (
        "Turmeric is proven to reduce inflammation. Take 500mg twice daily.",
        "Does turmeric help with arthritis pain?",
        refs(&["example-blog.com", "reddit.com/r/arthritis"]),
    );

    let first = validator.validate(args.0, args.1, &args.2);
    let second = validator.validate(args.0, args.1, &args.2);
    assert_eq!(first, second);
    assert_eq!(
        serde_json::to_string(&first).unwrap(),
        serde_json::to_string(&second).unwrap()
    );
}

#[test]
fn test_configured_red_flag_keyword() {
    let config = EngineConfig::from_yaml("redFlagKeywords:\n  - blue lips\n").unwrap();
    let validator = ComplianceValidator::new(config);

    let result = validator.validate("Keep them warm.", "My toddler has blue lips", &[]);
    assert!(result.has_violation(ViolationType::RedFlagNoEmergencyReferral));
}

#[test]
fn test_result_serializes_in_camel_case() {
    let result = validate("Text.", "", &refs(&["who.int"]));
    let json = serde_json::to_value(&result).unwrap();

    assert!(json.get("harmAssessment").is_some());
    assert_eq!(json["sourceClassifications"][0]["tier"], 1);
    assert_eq!(json["sourceClassifications"][0]["normalizedDomain"], "who.int");
    assert!(json.get("notes").is_none());
}

// ===================================================================
// PROPERTIES
// ===================================================================

fn thresholds() -> impl Strategy<Value = HarmThresholds> {
    (1u8..=10)
        .prop_flat_map(|warn| (Just(warn), warn..=10u8))
        .prop_map(|(warn, block)| HarmThresholds { block, warn })
}

proptest! {
    #[test]
    fn prop_action_is_monotonic_in_max_score(t in thresholds(), a in 0u8..=10, b in 0u8..=10) {
        let (low, high) = if a <= b { (a, b) } else { (b, a) };
        prop_assert!(t.action_for(low) <= t.action_for(high));
    }

    #[test]
    fn prop_raising_a_dimension_never_relaxes_action(
        scores in proptest::array::uniform4(0u8..=10),
        dimension in 0usize..4,
        bump in 0u8..=10,
    ) {
        let thresholds = HarmThresholds::default();
        let base = HarmAssessment::from_scores(scores[0], scores[1], scores[2], scores[3], &thresholds);

        let mut raised = scores;
        raised[dimension] = raised[dimension].saturating_add(bump);
        let after = HarmAssessment::from_scores(raised[0], raised[1], raised[2], raised[3], &thresholds);

        prop_assert!(after.action >= base.action);
    }

    #[test]
    fn prop_score_in_unit_interval(response in ".{0,300}", query in ".{0,120}") {
        let result = validate(&response, &query, &[]);
        prop_assert!((0.0..=1.0).contains(&result.score));
        if result.has_critical() || result.harm_assessment.action == HarmAction::Block {
            prop_assert!(!result.compliant);
        }
    }

    #[test]
    fn prop_validate_is_deterministic(response in "[a-zA-Z0-9 .,]{0,200}", query in "[a-zA-Z ?]{0,80}") {
        let validator = ComplianceValidator::default();
        prop_assert_eq!(
            validator.validate(&response, &query, &[]),
            validator.validate(&response, &query, &[])
        );
    }

    #[test]
    fn prop_unknown_domains_are_tier_four(name in "[a-z]{3,12}", path in "(/[a-z0-9]{1,8}){0,3}") {
        let registry = SourceRegistry::default();
        let url = format!("https://www.{}.example{}", name, path);
        let source = SourceClassifier::new(&registry).classify(&url);
        prop_assert_eq!(source.tier, Tier::ExpertOpinion);
        prop_assert!(source.permitted);
    }
}

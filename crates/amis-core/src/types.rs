//! Core types for compliance validation.
//!
//! Everything here is plain data. A `ComplianceResult` is created fresh for
//! every validation call and carries no reference back into the engine.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use thiserror::Error;

use crate::config::HarmThresholds;
use crate::evidence::EvidenceSpan;

/// A tier value outside 1..=5.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("invalid tier {0}: expected a value between 1 and 5")]
pub struct InvalidTier(pub u8);

/// Source quality tier. Lower is more authoritative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Tier {
    /// Systematic reviews, national guideline bodies
    PrimaryAuthority = 1,
    /// Major journals, professional society guidelines
    HighQualityEvidence = 2,
    /// Clinical references, academic medical centers, government health sites
    SupportingEvidence = 3,
    /// Expert opinion and anything the registry does not know
    ExpertOpinion = 4,
    /// Social, video and forum platforms
    Excluded = 5,
}

impl Tier {
    /// All tiers in lookup order.
    pub const ALL: [Tier; 5] = [
        Tier::PrimaryAuthority,
        Tier::HighQualityEvidence,
        Tier::SupportingEvidence,
        Tier::ExpertOpinion,
        Tier::Excluded,
    ];

    /// Numeric level (1-5).
    pub fn level(self) -> u8 {
        self as u8
    }

    /// Human-readable tier name.
    pub fn name(self) -> &'static str {
        match self {
            Tier::PrimaryAuthority => "Primary Authority",
            Tier::HighQualityEvidence => "High-Quality Primary Evidence",
            Tier::SupportingEvidence => "Supporting Evidence",
            Tier::ExpertOpinion => "Expert Opinion",
            Tier::Excluded => "Excluded Sources",
        }
    }

    /// How a source of this tier may be used.
    pub fn usage_guideline(self) -> &'static str {
        match self {
            Tier::PrimaryAuthority => "Primary weight; definitive statements permitted",
            Tier::HighQualityEvidence => "Supplements Tier 1; qualified definitive statements",
            Tier::SupportingEvidence => "Context only; must not contradict Tier 1-2 consensus",
            Tier::ExpertOpinion => "Narrative framing only; never sole basis for claims",
            Tier::Excluded => "Never used for medical claims",
        }
    }

    /// Strongest confidence a claim resting on this tier alone may carry.
    pub fn confidence_ceiling(self) -> Option<ConfidenceLevel> {
        match self {
            Tier::PrimaryAuthority => Some(ConfidenceLevel::Definitive),
            Tier::HighQualityEvidence => Some(ConfidenceLevel::QualifiedDefinitive),
            Tier::SupportingEvidence => Some(ConfidenceLevel::Qualified),
            Tier::ExpertOpinion => Some(ConfidenceLevel::Uncertain),
            Tier::Excluded => None,
        }
    }

    /// Tier 5 sources may never support a claim.
    pub fn is_permitted(self) -> bool {
        self != Tier::Excluded
    }

    /// Tier 1 and Tier 2 count as authoritative citations.
    pub fn is_authoritative(self) -> bool {
        self <= Tier::HighQualityEvidence
    }
}

impl TryFrom<u8> for Tier {
    type Error = InvalidTier;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Tier::PrimaryAuthority),
            2 => Ok(Tier::HighQualityEvidence),
            3 => Ok(Tier::SupportingEvidence),
            4 => Ok(Tier::ExpertOpinion),
            5 => Ok(Tier::Excluded),
            other => Err(InvalidTier(other)),
        }
    }
}

impl From<Tier> for u8 {
    fn from(tier: Tier) -> Self {
        tier.level()
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Tier {} ({})", self.level(), self.name())
    }
}

/// Required strength of assertive language, weakest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfidenceLevel {
    Speculative,
    Uncertain,
    Qualified,
    QualifiedDefinitive,
    Definitive,
}

impl ConfidenceLevel {
    /// Levels at which overconfident language is checked and an
    /// uncertainty warning is mandatory.
    pub fn requires_warning(self) -> bool {
        matches!(self, ConfidenceLevel::Uncertain | ConfidenceLevel::Speculative)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ConfidenceLevel::Speculative => "speculative",
            ConfidenceLevel::Uncertain => "uncertain",
            ConfidenceLevel::Qualified => "qualified",
            ConfidenceLevel::QualifiedDefinitive => "qualified definitive",
            ConfidenceLevel::Definitive => "definitive",
        }
    }
}

/// Violation severity, least severe first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Medium,
    High,
    Critical,
}

/// The five content standards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Standard {
    /// Standard 1: claims rest on reviewed literature
    LiteratureReview = 1,
    /// Standard 2: source quality hierarchy
    SourceHierarchy = 2,
    /// Standard 3: mandatory uncertainty disclosure
    UncertaintyDisclosure = 3,
    /// Standard 4: dissent labeling without false certainty
    DissentLabeling = 4,
    /// Standard 5: therapeutic advice requires physician evaluation
    TherapeuticScope = 5,
}

impl Standard {
    pub const ALL: [Standard; 5] = [
        Standard::LiteratureReview,
        Standard::SourceHierarchy,
        Standard::UncertaintyDisclosure,
        Standard::DissentLabeling,
        Standard::TherapeuticScope,
    ];

    pub fn number(self) -> u8 {
        self as u8
    }

    /// The question a check for this standard answers.
    pub fn question(self) -> &'static str {
        match self {
            Standard::LiteratureReview => "Does the response rest on appraised literature?",
            Standard::SourceHierarchy => "Are the cited sources permitted and of adequate tier?",
            Standard::UncertaintyDisclosure => "Does the language match the strength of the evidence?",
            Standard::DissentLabeling => "Is dissent acknowledged without false certainty?",
            Standard::TherapeuticScope => "Does the response defer therapy and emergencies to clinicians?",
        }
    }
}

impl TryFrom<u8> for Standard {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Standard::ALL
            .into_iter()
            .find(|s| s.number() == value)
            .ok_or_else(|| format!("invalid standard {}: expected a value between 1 and 5", value))
    }
}

impl From<Standard> for u8 {
    fn from(standard: Standard) -> Self {
        standard.number()
    }
}

impl fmt::Display for Standard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Standard {}", self.number())
    }
}

/// What kind of rule a violation broke.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationType {
    NoSources,
    NoEvidenceAppraisal,
    Tier5Source,
    NoHighTierSources,
    OverconfidentLanguage,
    MissingUncertaintyWarning,
    UnlabeledDissent,
    DogmaticLanguage,
    RedFlagNoEmergencyReferral,
    MissingPhysicianReferral,
    SpecificDosingProvided,
}

impl ViolationType {
    pub fn as_str(self) -> &'static str {
        match self {
            ViolationType::NoSources => "no_sources",
            ViolationType::NoEvidenceAppraisal => "no_evidence_appraisal",
            ViolationType::Tier5Source => "tier_5_source",
            ViolationType::NoHighTierSources => "no_high_tier_sources",
            ViolationType::OverconfidentLanguage => "overconfident_language",
            ViolationType::MissingUncertaintyWarning => "missing_uncertainty_warning",
            ViolationType::UnlabeledDissent => "unlabeled_dissent",
            ViolationType::DogmaticLanguage => "dogmatic_language",
            ViolationType::RedFlagNoEmergencyReferral => "red_flag_no_emergency_referral",
            ViolationType::MissingPhysicianReferral => "missing_physician_referral",
            ViolationType::SpecificDosingProvided => "specific_dosing_provided",
        }
    }
}

impl fmt::Display for ViolationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single broken rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Violation {
    pub standard: Standard,
    pub violation_type: ViolationType,
    pub severity: Severity,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub evidence_span: Option<EvidenceSpan>,
}

impl Violation {
    pub fn new(
        standard: Standard,
        violation_type: ViolationType,
        severity: Severity,
        message: impl Into<String>,
    ) -> Self {
        Self {
            standard,
            violation_type,
            severity,
            message: message.into(),
            evidence_span: None,
        }
    }

    /// Attach the span that triggered the violation.
    pub fn with_evidence(mut self, evidence: EvidenceSpan) -> Self {
        self.evidence_span = Some(evidence);
        self
    }

    pub fn is_critical(&self) -> bool {
        self.severity == Severity::Critical
    }
}

/// A source as supplied by the generation pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceRef {
    pub url: String,
}

impl SourceRef {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }
}

impl From<&str> for SourceRef {
    fn from(url: &str) -> Self {
        Self::new(url)
    }
}

/// Where a classified source came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceOrigin {
    /// Supplied in the source list
    Cited,
    /// Mentioned inside the response text
    Embedded,
}

/// A classified source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Source {
    pub url: String,
    pub normalized_domain: String,
    pub tier: Tier,
    pub tier_name: String,
    pub usage_guideline: String,
    /// Registry entry that matched, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub matched_entry: Option<String>,
    pub origin: SourceOrigin,
    pub permitted: bool,
}

/// A numeric quantity with a dosing unit found in response text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DosingSpan {
    pub start: usize,
    pub end: usize,
    pub text: String,
}

impl DosingSpan {
    pub fn to_evidence(&self) -> EvidenceSpan {
        EvidenceSpan::response(self.start, self.end, self.text.clone())
    }
}

/// Output of the intent detector.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntentResult {
    pub is_therapeutic: bool,
    pub is_red_flag: bool,
    pub matched_therapeutic_patterns: BTreeSet<String>,
    pub matched_red_flag_patterns: BTreeSet<String>,
    pub detected_dosing_spans: Vec<DosingSpan>,
}

/// Action the caller must take on the candidate response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HarmAction {
    Pass,
    Warn,
    Block,
}

/// Scores for the four harm dimensions and the resulting action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HarmAssessment {
    pub direct: u8,
    pub indirect: u8,
    pub epistemic: u8,
    pub systemic: u8,
    pub action: HarmAction,
}

impl HarmAssessment {
    /// Build an assessment; scores above 10 are clamped.
    pub fn from_scores(
        direct: u8,
        indirect: u8,
        epistemic: u8,
        systemic: u8,
        thresholds: &HarmThresholds,
    ) -> Self {
        let direct = direct.min(MAX_HARM_SCORE);
        let indirect = indirect.min(MAX_HARM_SCORE);
        let epistemic = epistemic.min(MAX_HARM_SCORE);
        let systemic = systemic.min(MAX_HARM_SCORE);
        let max = direct.max(indirect).max(epistemic).max(systemic);

        Self {
            direct,
            indirect,
            epistemic,
            systemic,
            action: thresholds.action_for(max),
        }
    }

    /// All four dimensions at zero.
    pub fn clear() -> Self {
        Self {
            direct: 0,
            indirect: 0,
            epistemic: 0,
            systemic: 0,
            action: HarmAction::Pass,
        }
    }

    pub fn max_score(&self) -> u8 {
        self.direct
            .max(self.indirect)
            .max(self.epistemic)
            .max(self.systemic)
    }
}

/// Upper bound of every harm dimension.
pub const MAX_HARM_SCORE: u8 = 10;

/// Which input a note refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputField {
    Response,
    Query,
}

/// Kind of non-fatal input problem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoteKind {
    InputTooLarge,
}

/// A non-fatal problem with the input itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InputNote {
    pub kind: NoteKind,
    pub severity: Severity,
    pub field: InputField,
    pub message: String,
}

/// The verdict for one candidate response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComplianceResult {
    pub compliant: bool,
    pub score: f64,
    pub violations: Vec<Violation>,
    pub harm_assessment: HarmAssessment,
    pub source_classifications: Vec<Source>,
    pub recommendations: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub notes: Vec<InputNote>,
}

impl ComplianceResult {
    pub fn has_critical(&self) -> bool {
        self.violations.iter().any(Violation::is_critical)
    }

    /// The response must not reach the end user unmodified.
    pub fn must_withhold(&self) -> bool {
        self.has_critical() || self.harm_assessment.action == HarmAction::Block
    }

    pub fn violations_for(&self, standard: Standard) -> impl Iterator<Item = &Violation> {
        self.violations.iter().filter(move |v| v.standard == standard)
    }

    pub fn has_violation(&self, violation_type: ViolationType) -> bool {
        self.violations
            .iter()
            .any(|v| v.violation_type == violation_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tier_round_trips_through_u8() {
        for tier in Tier::ALL {
            assert_eq!(Tier::try_from(tier.level()).unwrap(), tier);
        }
        assert_eq!(Tier::try_from(0), Err(InvalidTier(0)));
        assert_eq!(Tier::try_from(6), Err(InvalidTier(6)));
    }

    #[test]
    fn test_tier_serializes_as_integer() {
        let json = serde_json::to_string(&Tier::SupportingEvidence).unwrap();
        assert_eq!(json, "3");
        assert!(serde_json::from_str::<Tier>("7").is_err());
    }

    #[test]
    fn test_confidence_ordering() {
        assert!(ConfidenceLevel::Definitive > ConfidenceLevel::QualifiedDefinitive);
        assert!(ConfidenceLevel::Qualified > ConfidenceLevel::Uncertain);
        assert!(ConfidenceLevel::Uncertain > ConfidenceLevel::Speculative);
        assert!(ConfidenceLevel::Speculative.requires_warning());
        assert!(!ConfidenceLevel::Qualified.requires_warning());
    }

    #[test]
    fn test_harm_assessment_clamps_scores() {
        let assessment = HarmAssessment::from_scores(12, 0, 0, 0, &HarmThresholds::default());
        assert_eq!(assessment.direct, 10);
        assert_eq!(assessment.action, HarmAction::Block);
    }

    #[test]
    fn test_violation_serializes_camel_case() {
        let violation = Violation::new(
            Standard::TherapeuticScope,
            ViolationType::SpecificDosingProvided,
            Severity::Critical,
            "dosing",
        );
        let json = serde_json::to_value(&violation).unwrap();
        assert_eq!(json["standard"], 5);
        assert_eq!(json["violationType"], "specific_dosing_provided");
        assert_eq!(json["severity"], "critical");
        assert!(json.get("evidenceSpan").is_none());
    }
}

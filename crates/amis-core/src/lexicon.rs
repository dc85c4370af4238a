//! Keyword, phrase and pattern tables.
//!
//! Every detector reads its vocabulary from a [`Lexicons`] value instead of
//! inline conditionals, so the tables can be extended from configuration and
//! tested on their own. The built-in tables below are compiled once; an
//! extended copy is built per configuration.

use lazy_static::lazy_static;
use regex::Regex;
use std::collections::BTreeSet;
use thiserror::Error;

/// A lexicon entry that failed to compile.
#[derive(Error, Debug)]
#[error("invalid pattern '{pattern}': {source}")]
pub struct LexiconError {
    pub pattern: String,
    #[source]
    pub source: regex::Error,
}

// =========================================================================
// SHARED TEXT PATTERNS
// =========================================================================

lazy_static! {
    /// Numeric quantity followed by a dosing unit, with an optional rate
    /// (`/day`, `/kg`). A volume denominator is captured in group 1 so lab
    /// concentrations like `120 mg/dL` can be skipped.
    pub static ref DOSING_PATTERN: Regex = Regex::new(
        r"(?i)\b\d+(?:[.,]\d+)?\s*(?:mg|mcg|µg|ml|g|iu|tablets?|capsules?|pills?)\b(?:(/(?:dl|l|ml|µl|ul))\b|/(?:day|d|kg|dose|hours?|hr|h|week|wk)\b)?"
    ).unwrap();

    /// Lab-like values: a reference word followed by a number, or a number
    /// with a laboratory unit.
    pub static ref LAB_VALUE_PATTERN: Regex = Regex::new(
        r"(?i)\b(?:normal|reference|range|level|levels|result)\b[^.\n]{0,30}?\d+(?:\.\d+)?|\b\d+(?:\.\d+)?\s*(?:mg/dl|mmol/l|u/l|iu/l|ng/ml|pg/ml|g/dl|meq/l|umol/l|mmhg)\b"
    ).unwrap();

    /// URLs and bare domain mentions inside free text.
    pub static ref EMBEDDED_SOURCE_PATTERN: Regex = Regex::new(
        r#"(?i)\b(?:https?://)?(?:[a-z0-9](?:[a-z0-9-]*[a-z0-9])?\.)+(?:com|org|net|gov|edu|int|info|io|uk|ca|au|nz|ie|de|fr|be|health)\b(?:/[^\s<>()\[\]"']*)?"#
    ).unwrap();

    /// URL scheme prefix.
    pub static ref SCHEME_PATTERN: Regex = Regex::new(
        r"^[a-z][a-z0-9+.\-]*://"
    ).unwrap();

    static ref BUILTIN_LEXICONS: Lexicons = Lexicons::compile_builtin()
        .expect("built-in lexicons are valid");
}

// =========================================================================
// BUILT-IN TABLES
// =========================================================================

pub const DEFAULT_THERAPEUTIC_PATTERNS: &[&str] = &[
    r"\bshould i (take|stop|start|use|try|switch|increase|decrease|double|skip)\b",
    r"\bcan i (take|stop|start|use|try|switch|mix|combine)\b",
    r"\bhow (much|many)\b.{0,40}\b(should|can|do) i\b",
    r"\bwhat (dose|dosage)\b",
    r"\b(dose|dosage) (of|for)\b",
    r"\b(stop|start|quit) taking\b",
    r"\b(instead of|replace) my\b",
    r"\bchange my (medication|meds|dose|dosage|prescription)\b",
    r"\b(treat|cure|heal|fix) my\b",
    r"\bwhat can i (do|take) (for|about) my\b",
    r"\b(does|do|will|would)\b.{0,40}\b(help|cure|treat|relieve|heal)\b",
];

pub const DEFAULT_RED_FLAG_KEYWORDS: &[&str] = &[
    "chest pain", "crushing chest", "heart attack",
    "difficulty breathing", "can't breathe", "cannot breathe", "shortness of breath",
    "severe headache", "worst headache", "thunderclap headache",
    "sudden weakness", "facial droop", "facial drooping", "stroke", "slurred speech",
    "sudden numbness", "one side of my body",
    "vision loss", "sudden blindness",
    "severe abdominal pain", "rigid abdomen",
    "blood in stool", "bloody stool", "vomiting blood",
    "suicidal", "want to die", "kill myself", "end my life",
    "self harm", "self-harm", "hurt myself", "harm myself",
    "anaphylaxis", "can't swallow", "throat closing",
    "severe bleeding", "won't stop bleeding",
    "high fever", "sudden confusion", "unresponsive", "seizure", "overdose",
];

pub const DEFAULT_OVERCONFIDENCE_MARKERS: &[&str] = &[
    "definitely", "proven", "guaranteed", "always", "100%", "certainly",
    "undoubtedly", "without a doubt",
];

pub const DEFAULT_UNCERTAINTY_WARNINGS: &[&str] = &[
    "evidence is limited", "limited evidence", "insufficient evidence",
    "not well established", "more research is needed", "further research is needed",
    "remains uncertain", "is uncertain", "uncertainty", "preliminary",
    "not a substitute for", "not medical advice", "consult",
    "talk to your doctor", "healthcare provider",
];

pub const DEFAULT_EMERGENCY_REFERRALS: &[&str] = &[
    r"\b911\b", r"\b999\b", r"\b112\b", r"\b988\b",
    r"\bemergency\b",
    r"\bcall\b.{0,60}\bimmediately\b",
    r"\bcrisis (line|hotline|text line)\b",
    r"\bsuicide (prevention )?(hotline|lifeline)\b",
    r"\bseek (immediate|urgent) (medical )?(care|attention|help)\b",
];

pub const DEFAULT_PHYSICIAN_REFERRALS: &[&str] = &[
    r"\b(consult|speak (with|to)|talk (with|to)|see|ask|check with)\b.{0,40}\b(doctor|physician|clinician|pharmacist|gp|healthcare (provider|professional))\b",
    r"\bmedical advice\b",
    r"\bhealthcare provider\b",
];

pub const DEFAULT_CONTROVERSY_TOPICS: &[&str] = &[
    "vitamin d", "ivermectin", "hydroxychloroquine", "fluoride", "statins",
    "homeopathy", "acupuncture", "chiropractic", "ketogenic", "keto diet",
    "intermittent fasting", "saturated fat", "red meat", "gluten", "raw milk",
    "chelation", "vaccine", "vaccines", "masks",
];

pub const DEFAULT_DISSENT_MARKERS: &[&str] = &[
    "consensus", "most experts", "mainstream", "minority view", "some experts",
    "some studies", "other studies", "conflicting", "mixed evidence",
    "evidence is mixed", "debated", "debate", "controversial",
    "insufficient evidence", "not all experts", "critics", "disagree",
];

pub const DEFAULT_DOGMATIC_PATTERNS: &[&str] = &[
    r"\bthe only( correct| real| true)? (way|answer|treatment|cure|option)\b",
    r"\bthere is no (debate|question)\b",
    r"\b(anyone|everyone) who disagrees\b",
    r"\babsolute truth\b",
    r"\bsettled science\b",
];

pub const DEFAULT_EVIDENCE_APPRAISAL: &[&str] = &[
    "systematic review", "meta-analysis", "evidence quality", "quality of evidence",
    "level of evidence", "study design", "randomized", "randomised",
    "controlled trial", "cohort study", "grade",
];

pub const DEFAULT_AUTHORITATIVE_CITATIONS: &[&str] = &[
    "cochrane", "world health organization", "uspstf",
    "preventive services task force", "nice guideline", "nice guidance",
    "systematic review", "meta-analysis", "clinical practice guideline",
];

pub const DEFAULT_HIGH_RISK_MEDICATIONS: &[&str] = &[
    "warfarin", "coumadin", "blood thinner", "insulin", "metformin",
    "opioid", "morphine", "fentanyl", "oxycodone", "chemotherapy",
    "immunosuppressant", "lithium", "digoxin", "theophylline",
    "anticoagulant", "antiplatelet", "methotrexate",
];

pub const DEFAULT_CONTRAINDICATIONS: &[&str] = &[
    "contraindicated", "should not take", "avoid if", "dangerous with",
    "interaction with", "interacts with",
];

pub const DEFAULT_VULNERABLE_POPULATIONS: &[&str] = &[
    r"\bpregnan\w*",
    r"\bbreastfeed\w*",
    r"\b(child|children|infant|infants|baby|toddler)\b",
    r"\belderly\b",
    r"\b(kidney|liver) (disease|failure)\b",
    r"\bimmunocompromised\b",
];

pub const DEFAULT_REASSURANCE_PATTERNS: &[&str] = &[
    r"\bnothing to worry about\b",
    r"\bprobably (just|fine|okay|nothing|normal)\b",
    r"\bunlikely to be serious\b",
    r"\bno need to (see|visit|consult|call)\b",
    r"\bcan wait\b",
    r"\bjust (rest|relax|wait)\b",
    r"\bdon'?t worry\b",
];

pub const DEFAULT_DELAY_PHRASES: &[&str] = &[
    "wait and see", "give it time", "should resolve", "will pass",
];

pub const DEFAULT_SYMPTOM_INDICATORS: &[&str] = &[
    "pain", "ache", "aches", "swelling", "bleeding", "fever", "nausea",
    "dizzy", "dizziness", "tired", "weak", "weakness", "rash", "cough", "vomiting",
];

pub const DEFAULT_ALTERNATIVE_CARE_PATTERNS: &[&str] = &[
    r"\binstead of (seeing )?(a |your )?(doctor|medication|treatment)\b",
    r"\bnatural alternative\b",
    r"\bhome remed(y|ies)\b",
    r"\bdon'?t need to see\b",
];

pub const DEFAULT_URGENCY_MARKERS: &[&str] = &[
    "emergency", "911", "999", "112", "urgent", "urgently", "immediately",
    "right away", "at once",
];

pub const DEFAULT_LAB_QUALIFIERS: &[&str] = &[
    "varies", "vary", "depends", "individual", "age", "sex", "laboratory",
    "lab to lab", "your doctor",
];

pub const DEFAULT_COMPLEX_CONDITIONS: &[&str] = &[
    "cancer", "diabetes", "heart disease", "autoimmune", "mental health",
    "chronic", "dementia",
];

pub const DEFAULT_NUANCE_MARKERS: &[&str] = &[
    "varies", "depends", "individual", "type", "stage", "complex",
    "multiple factors", "consult",
];

pub const DEFAULT_BENEFIT_WORDS: &[&str] = &[
    "benefit", "benefits", "advantage", "helps", "improves", "reduces risk",
];

pub const DEFAULT_RISK_WORDS: &[&str] = &[
    "risk", "risks", "side effect", "side effects", "adverse", "complication",
    "complications", "danger", "harm",
];

pub const DEFAULT_SENSITIVE_TOPICS: &[&str] = &[
    "vaccine", "vaccines", "vaccination", "immunization", "pandemic", "epidemic",
    "outbreak", "covid", "coronavirus", "hiv", "cancer screening", "mammogram",
    "colonoscopy", "abortion", "contraception", "mental health", "depression",
    "anxiety", "addiction", "opioid crisis",
];

pub const DEFAULT_DISTRUST_PATTERNS: &[&str] = &[
    r"\b(big pharma|medical establishment|mainstream medicine)\b.{0,30}\b(lies?|lying|wrong|corrupt|hiding)\b",
    r"\bdoctors don'?t want you to know\b",
    r"\bsuppressed (cure|treatment)s?\b",
    r"\bthey don'?t tell you\b",
];

pub const DEFAULT_MISINFORMATION_PATTERNS: &[&str] = &[
    r"\bmiracle cure\b",
    r"\bwhat (doctors|they) don'?t tell you\b",
    r"\bbanned by (the )?(fda|government)\b",
    r"\bnatural cure for cancer\b",
    r"\bvaccines?\b.{0,20}\b(cause autism|autism|dangerous|poison)\b",
];

pub const DEFAULT_HIGH_REACH_TOPICS: &[&str] = &[
    "covid", "vaccine", "vaccines", "pandemic", "weight loss", "diabetes cure",
];

// =========================================================================
// PHRASE LEXICON
// =========================================================================

/// One occurrence of a lexicon entry in a text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhraseMatch {
    /// The lexicon entry (phrase or pattern source) that matched
    pub phrase: String,
    pub start: usize,
    pub end: usize,
    /// The matched text as it appears in the input
    pub text: String,
}

#[derive(Debug, Clone)]
struct LexiconEntry {
    phrase: String,
    regex: Regex,
}

/// A compiled, case-insensitive list of phrases or patterns.
#[derive(Debug, Clone, Default)]
pub struct PhraseLexicon {
    entries: Vec<LexiconEntry>,
}

impl PhraseLexicon {
    /// Compile literal phrases. Phrases are word-bounded at alphanumeric ends.
    pub fn literal<I, S>(phrases: I) -> Result<Self, LexiconError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut lexicon = Self::default();
        lexicon.extend_literal(phrases)?;
        Ok(lexicon)
    }

    /// Compile regular-expression patterns.
    pub fn patterns<I, S>(patterns: I) -> Result<Self, LexiconError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut lexicon = Self::default();
        lexicon.extend_patterns(patterns)?;
        Ok(lexicon)
    }

    /// Append literal phrases, skipping ones already present.
    pub fn extend_literal<I, S>(&mut self, phrases: I) -> Result<(), LexiconError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for phrase in phrases {
            let phrase = phrase.as_ref().trim().to_lowercase();
            if phrase.is_empty() || self.contains(&phrase) {
                continue;
            }
            let regex = compile(&phrase, &literal_regex(&phrase))?;
            self.entries.push(LexiconEntry { phrase, regex });
        }
        Ok(())
    }

    /// Append regex patterns, skipping ones already present.
    pub fn extend_patterns<I, S>(&mut self, patterns: I) -> Result<(), LexiconError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for pattern in patterns {
            let pattern = pattern.as_ref().trim();
            if pattern.is_empty() || self.contains(pattern) {
                continue;
            }
            let regex = compile(pattern, &format!("(?i){}", pattern))?;
            self.entries.push(LexiconEntry {
                phrase: pattern.to_string(),
                regex,
            });
        }
        Ok(())
    }

    pub fn contains(&self, phrase: &str) -> bool {
        self.entries.iter().any(|e| e.phrase == phrase)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn phrases(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.phrase.as_str())
    }

    /// True if any entry occurs in `text`.
    pub fn is_match(&self, text: &str) -> bool {
        self.entries.iter().any(|e| e.regex.is_match(text))
    }

    /// The earliest occurrence of any entry.
    pub fn first_match(&self, text: &str) -> Option<PhraseMatch> {
        self.entries
            .iter()
            .filter_map(|e| {
                e.regex.find(text).map(|m| PhraseMatch {
                    phrase: e.phrase.clone(),
                    start: m.start(),
                    end: m.end(),
                    text: m.as_str().to_string(),
                })
            })
            .min_by_key(|m| (m.start, m.end))
    }

    /// Every occurrence of every entry, ordered by position.
    pub fn find_all(&self, text: &str) -> Vec<PhraseMatch> {
        let mut matches: Vec<PhraseMatch> = self
            .entries
            .iter()
            .flat_map(|e| {
                e.regex.find_iter(text).map(move |m| PhraseMatch {
                    phrase: e.phrase.clone(),
                    start: m.start(),
                    end: m.end(),
                    text: m.as_str().to_string(),
                })
            })
            .collect();

        matches.sort_by(|a, b| (a.start, a.end, &a.phrase).cmp(&(b.start, b.end, &b.phrase)));
        matches
    }

    /// Distinct entries that occur in `text`.
    pub fn matched_phrases(&self, text: &str) -> BTreeSet<String> {
        self.entries
            .iter()
            .filter(|e| e.regex.is_match(text))
            .map(|e| e.phrase.clone())
            .collect()
    }
}

fn compile(phrase: &str, source: &str) -> Result<Regex, LexiconError> {
    Regex::new(source).map_err(|source| LexiconError {
        pattern: phrase.to_string(),
        source,
    })
}

/// Escape a literal phrase, adding word boundaries where the phrase starts
/// or ends with a word character.
fn literal_regex(phrase: &str) -> String {
    let mut out = String::from("(?i)");
    if phrase.chars().next().is_some_and(is_word_char) {
        out.push_str(r"\b");
    }
    out.push_str(&regex::escape(phrase));
    if phrase.chars().last().is_some_and(is_word_char) {
        out.push_str(r"\b");
    }
    out
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

// =========================================================================
// LEXICON SETS
// =========================================================================

/// Vocabulary used by the harm cascade analyzer.
#[derive(Debug, Clone)]
pub struct HarmLexicons {
    pub high_risk_medications: PhraseLexicon,
    pub contraindications: PhraseLexicon,
    pub vulnerable_populations: PhraseLexicon,
    pub reassurance: PhraseLexicon,
    pub delay: PhraseLexicon,
    pub symptom_indicators: PhraseLexicon,
    pub alternative_care: PhraseLexicon,
    pub urgency: PhraseLexicon,
    pub lab_qualifiers: PhraseLexicon,
    pub complex_conditions: PhraseLexicon,
    pub nuance: PhraseLexicon,
    pub benefits: PhraseLexicon,
    pub risks: PhraseLexicon,
    pub sensitive_topics: PhraseLexicon,
    pub distrust: PhraseLexicon,
    pub misinformation: PhraseLexicon,
    pub high_reach_topics: PhraseLexicon,
}

/// All phrase tables the engine consults.
#[derive(Debug, Clone)]
pub struct Lexicons {
    pub therapeutic: PhraseLexicon,
    pub red_flags: PhraseLexicon,
    pub overconfidence: PhraseLexicon,
    pub uncertainty_warnings: PhraseLexicon,
    pub emergency_referrals: PhraseLexicon,
    pub physician_referrals: PhraseLexicon,
    pub controversy_topics: PhraseLexicon,
    pub dissent_markers: PhraseLexicon,
    pub dogmatic: PhraseLexicon,
    pub evidence_appraisal: PhraseLexicon,
    pub authoritative_citations: PhraseLexicon,
    pub harm: HarmLexicons,
}

impl Lexicons {
    fn compile_builtin() -> Result<Self, LexiconError> {
        Ok(Self {
            therapeutic: PhraseLexicon::patterns(DEFAULT_THERAPEUTIC_PATTERNS)?,
            red_flags: PhraseLexicon::literal(DEFAULT_RED_FLAG_KEYWORDS)?,
            overconfidence: PhraseLexicon::literal(DEFAULT_OVERCONFIDENCE_MARKERS)?,
            uncertainty_warnings: PhraseLexicon::literal(DEFAULT_UNCERTAINTY_WARNINGS)?,
            emergency_referrals: PhraseLexicon::patterns(DEFAULT_EMERGENCY_REFERRALS)?,
            physician_referrals: PhraseLexicon::patterns(DEFAULT_PHYSICIAN_REFERRALS)?,
            controversy_topics: PhraseLexicon::literal(DEFAULT_CONTROVERSY_TOPICS)?,
            dissent_markers: PhraseLexicon::literal(DEFAULT_DISSENT_MARKERS)?,
            dogmatic: PhraseLexicon::patterns(DEFAULT_DOGMATIC_PATTERNS)?,
            evidence_appraisal: PhraseLexicon::literal(DEFAULT_EVIDENCE_APPRAISAL)?,
            authoritative_citations: PhraseLexicon::literal(DEFAULT_AUTHORITATIVE_CITATIONS)?,
            harm: HarmLexicons {
                high_risk_medications: PhraseLexicon::literal(DEFAULT_HIGH_RISK_MEDICATIONS)?,
                contraindications: PhraseLexicon::literal(DEFAULT_CONTRAINDICATIONS)?,
                vulnerable_populations: PhraseLexicon::patterns(DEFAULT_VULNERABLE_POPULATIONS)?,
                reassurance: PhraseLexicon::patterns(DEFAULT_REASSURANCE_PATTERNS)?,
                delay: PhraseLexicon::literal(DEFAULT_DELAY_PHRASES)?,
                symptom_indicators: PhraseLexicon::literal(DEFAULT_SYMPTOM_INDICATORS)?,
                alternative_care: PhraseLexicon::patterns(DEFAULT_ALTERNATIVE_CARE_PATTERNS)?,
                urgency: PhraseLexicon::literal(DEFAULT_URGENCY_MARKERS)?,
                lab_qualifiers: PhraseLexicon::literal(DEFAULT_LAB_QUALIFIERS)?,
                complex_conditions: PhraseLexicon::literal(DEFAULT_COMPLEX_CONDITIONS)?,
                nuance: PhraseLexicon::literal(DEFAULT_NUANCE_MARKERS)?,
                benefits: PhraseLexicon::literal(DEFAULT_BENEFIT_WORDS)?,
                risks: PhraseLexicon::literal(DEFAULT_RISK_WORDS)?,
                sensitive_topics: PhraseLexicon::literal(DEFAULT_SENSITIVE_TOPICS)?,
                distrust: PhraseLexicon::patterns(DEFAULT_DISTRUST_PATTERNS)?,
                misinformation: PhraseLexicon::patterns(DEFAULT_MISINFORMATION_PATTERNS)?,
                high_reach_topics: PhraseLexicon::literal(DEFAULT_HIGH_REACH_TOPICS)?,
            },
        })
    }

    /// A copy of these lexicons with the configured extension lists appended.
    pub fn extended(
        &self,
        red_flag_keywords: &[String],
        therapeutic_patterns: &[String],
        overconfidence_markers: &[String],
    ) -> Result<Self, LexiconError> {
        let mut lexicons = self.clone();
        lexicons.red_flags.extend_literal(red_flag_keywords)?;
        lexicons.therapeutic.extend_patterns(therapeutic_patterns)?;
        lexicons.overconfidence.extend_literal(overconfidence_markers)?;
        Ok(lexicons)
    }
}

impl Default for Lexicons {
    fn default() -> Self {
        BUILTIN_LEXICONS.clone()
    }
}

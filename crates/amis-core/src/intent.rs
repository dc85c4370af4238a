//! Intent detection.
//!
//! Flags queries that ask for treatment decisions and queries that describe
//! emergency symptoms, and finds specific dosing in the response.

use std::collections::BTreeSet;

use crate::lexicon::{Lexicons, DOSING_PATTERN};
use crate::types::{DosingSpan, IntentResult};

/// Classifies the intent of a query/response pair.
pub struct IntentDetector<'a> {
    lexicons: &'a Lexicons,
}

impl<'a> IntentDetector<'a> {
    pub fn new(lexicons: &'a Lexicons) -> Self {
        Self { lexicons }
    }

    /// Therapeutic and red-flag patterns are matched against the query;
    /// dosing spans are looked for in the response only.
    pub fn detect(&self, query: &str, response: &str) -> IntentResult {
        let matched_therapeutic_patterns = self.detect_therapeutic(query);
        let matched_red_flag_patterns = self.detect_red_flag(query);

        IntentResult {
            is_therapeutic: !matched_therapeutic_patterns.is_empty(),
            is_red_flag: !matched_red_flag_patterns.is_empty(),
            matched_therapeutic_patterns,
            matched_red_flag_patterns,
            detected_dosing_spans: find_dosing_spans(response),
        }
    }

    /// Therapeutic patterns matched in the query.
    pub fn detect_therapeutic(&self, query: &str) -> BTreeSet<String> {
        self.lexicons.therapeutic.matched_phrases(query)
    }

    /// Red-flag keywords matched in the query.
    pub fn detect_red_flag(&self, query: &str) -> BTreeSet<String> {
        self.lexicons.red_flags.matched_phrases(query)
    }
}

/// Numeric quantities with a dosing unit, in order of appearance.
///
/// Concentrations such as `120 mg/dL` are lab values, not doses, and are
/// skipped. Rates such as `500 mg/day` or `10 mg/kg` are doses.
pub fn find_dosing_spans(response: &str) -> Vec<DosingSpan> {
    DOSING_PATTERN
        .captures_iter(response)
        .filter(|caps| caps.get(1).is_none())
        .filter_map(|caps| caps.get(0))
        .map(|m| DosingSpan {
            start: m.start(),
            end: m.end(),
            text: m.as_str().to_string(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detect(query: &str, response: &str) -> IntentResult {
        let lexicons = Lexicons::default();
        IntentDetector::new(&lexicons).detect(query, response)
    }

    #[test]
    fn test_red_flag_in_query() {
        let intent = detect("I have crushing chest pain radiating to my left arm", "");
        assert!(intent.is_red_flag);
        assert!(intent.matched_red_flag_patterns.contains("chest pain"));
        assert!(intent.matched_red_flag_patterns.contains("crushing chest"));
    }

    #[test]
    fn test_therapeutic_question() {
        let intent = detect("Should I stop taking my blood pressure medication?", "");
        assert!(intent.is_therapeutic);
        assert!(!intent.is_red_flag);
    }

    #[test]
    fn test_does_x_help_is_therapeutic() {
        let intent = detect("Does turmeric help with arthritis?", "");
        assert!(intent.is_therapeutic);
    }

    #[test]
    fn test_informational_query_is_neither() {
        let intent = detect("What is the evidence on vitamin D and COVID-19 outcomes?", "");
        assert!(!intent.is_therapeutic);
        assert!(!intent.is_red_flag);
    }

    #[test]
    fn test_dosing_spans_in_response() {
        let response = "Take 500mg of turmeric twice daily, or 2 tablets at night.";
        let spans = find_dosing_spans(response);
        let texts: Vec<&str> = spans.iter().map(|s| s.text.as_str()).collect();
        assert_eq!(texts, vec!["500mg", "2 tablets"]);
        assert_eq!(&response[spans[0].start..spans[0].end], "500mg");
    }

    #[test]
    fn test_concentrations_are_not_doses() {
        assert!(find_dosing_spans("A fasting glucose of 120 mg/dL is above normal.").is_empty());
    }

    #[test]
    fn test_rate_doses_are_doses() {
        let spans = find_dosing_spans("Take 500 mg/day, or 10 mg/kg for children.");
        let texts: Vec<&str> = spans.iter().map(|s| s.text.as_str()).collect();
        assert_eq!(texts, vec!["500 mg/day", "10 mg/kg"]);
    }

    #[test]
    fn test_red_flag_words_in_response_do_not_set_intent() {
        let intent = detect(
            "What do statins do?",
            "A Cochrane systematic review found statins reduce the risk of heart attack and stroke.",
        );
        assert!(!intent.is_red_flag);
        assert!(intent.matched_red_flag_patterns.is_empty());
    }

    #[test]
    fn test_help_phrasing_in_response_does_not_set_intent() {
        let intent = detect(
            "What is known about exercise and back pain?",
            "Trials suggest regular exercise does help reduce back pain for many people.",
        );
        assert!(!intent.is_therapeutic);
        assert!(intent.matched_therapeutic_patterns.is_empty());
    }

    #[test]
    fn test_dosing_only_read_from_response() {
        let intent = detect("Is 500mg of turmeric safe?", "Turmeric is a spice.");
        assert!(intent.detected_dosing_spans.is_empty());
    }
}

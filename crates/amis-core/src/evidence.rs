//! Evidence spans for violations.
//!
//! Every violation that was triggered by a piece of text points back at it,
//! so callers can highlight or redact the offending region.

use serde::{Deserialize, Serialize};

/// Which input a span points into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvidenceSource {
    Response,
    Query,
    /// An entry of the supplied source list
    Source,
}

/// A byte range in one of the inputs plus the text it covers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvidenceSpan {
    pub source: EvidenceSource,
    pub start: usize,
    pub end: usize,
    pub text: String,
    /// Index into the supplied source list, for `EvidenceSource::Source`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_index: Option<usize>,
}

impl EvidenceSpan {
    /// Span in the response text.
    pub fn response(start: usize, end: usize, text: impl Into<String>) -> Self {
        Self {
            source: EvidenceSource::Response,
            start,
            end,
            text: text.into(),
            source_index: None,
        }
    }

    /// Span in the query text.
    pub fn query(start: usize, end: usize, text: impl Into<String>) -> Self {
        Self {
            source: EvidenceSource::Query,
            start,
            end,
            text: text.into(),
            source_index: None,
        }
    }

    /// The whole URL of a supplied source.
    pub fn cited_source(index: usize, url: impl Into<String>) -> Self {
        let url = url.into();
        Self {
            source: EvidenceSource::Source,
            start: 0,
            end: url.len(),
            text: url,
            source_index: Some(index),
        }
    }

    /// Slice `haystack[start..end]` into a response span.
    ///
    /// Returns `None` when the range is out of bounds or splits a character.
    pub fn slice_response(haystack: &str, start: usize, end: usize) -> Option<Self> {
        haystack
            .get(start..end)
            .map(|text| Self::response(start, end, text))
    }

    /// Pointer notation, e.g. `response[47:72]` or `sources[2]`.
    pub fn pointer(&self) -> String {
        match (self.source, self.source_index) {
            (EvidenceSource::Source, Some(index)) => format!("sources[{}]", index),
            (EvidenceSource::Source, None) => "sources".to_string(),
            (EvidenceSource::Response, _) => format!("response[{}:{}]", self.start, self.end),
            (EvidenceSource::Query, _) => format!("query[{}:{}]", self.start, self.end),
        }
    }
}

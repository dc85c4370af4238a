//! Source classification.
//!
//! Resolves a URL or bare domain to a tier using a [`SourceRegistry`].
//! Unknown domains resolve to Tier 4, which is never sufficient sole support
//! for a claim, so an unknown source can only lower the confidence a
//! response may express.

use std::collections::HashSet;

use crate::lexicon::{EMBEDDED_SOURCE_PATTERN, SCHEME_PATTERN};
use crate::registry::SourceRegistry;
use crate::types::{Source, SourceOrigin, SourceRef, Tier};

/// Tier used for domains the registry does not know.
pub const DEFAULT_UNKNOWN_TIER: Tier = Tier::ExpertOpinion;

/// Host and path of a URL after normalisation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedUrl {
    /// Lower-cased host without scheme, credentials, port or leading `www.`
    pub host: String,
    /// Path without query or fragment, no trailing slash
    pub path: String,
}

/// Strip scheme, credentials, port, leading `www.`, query and fragment.
pub fn normalize(url: &str) -> NormalizedUrl {
    let lowered = url.trim().to_lowercase();
    let without_scheme = SCHEME_PATTERN.replace(&lowered, "");
    let rest = without_scheme.trim_start_matches('/');

    let (authority, tail) = match rest.find(&['/', '?', '#'][..]) {
        Some(idx) => rest.split_at(idx),
        None => (rest, ""),
    };

    let authority = authority.rsplit('@').next().unwrap_or(authority);
    let host = authority.split(':').next().unwrap_or(authority);
    let host = host.trim_end_matches('.');
    let host = host.strip_prefix("www.").unwrap_or(host);

    let path = tail.split(&['?', '#'][..]).next().unwrap_or("");
    let path = path.trim_end_matches('/');

    NormalizedUrl {
        host: host.to_string(),
        path: path.to_string(),
    }
}

/// A URL or domain mention found inside response text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbeddedMention {
    pub text: String,
    pub start: usize,
    pub end: usize,
}

/// Classifies sources against a registry snapshot.
pub struct SourceClassifier<'a> {
    registry: &'a SourceRegistry,
}

impl<'a> SourceClassifier<'a> {
    pub fn new(registry: &'a SourceRegistry) -> Self {
        Self { registry }
    }

    /// Classify a cited URL.
    pub fn classify(&self, url: &str) -> Source {
        self.classify_as(url, SourceOrigin::Cited)
    }

    /// Classify a URL, recording where it came from.
    pub fn classify_as(&self, url: &str, origin: SourceOrigin) -> Source {
        let normalized = normalize(url);

        let (tier, matched_entry) = match self.registry.lookup(&normalized.host, &normalized.path) {
            Some((tier, entry)) => (tier, Some(entry.name.clone())),
            None => (DEFAULT_UNKNOWN_TIER, None),
        };

        Source {
            url: url.to_string(),
            normalized_domain: normalized.host,
            tier,
            tier_name: tier.name().to_string(),
            usage_guideline: tier.usage_guideline().to_string(),
            matched_entry,
            origin,
            permitted: tier.is_permitted(),
        }
    }

    /// Classify every supplied source, preserving order.
    pub fn classify_all(&self, sources: &[SourceRef]) -> Vec<Source> {
        sources.iter().map(|s| self.classify(&s.url)).collect()
    }

    /// Classify URL and domain mentions in `text` whose domain is not in
    /// `known_domains`. Each domain is reported once.
    pub fn classify_embedded(&self, text: &str, known_domains: &HashSet<String>) -> Vec<Source> {
        let mut seen = known_domains.clone();

        extract_embedded(text)
            .into_iter()
            .filter_map(|mention| {
                let source = self.classify_as(&mention.text, SourceOrigin::Embedded);
                seen.insert(source.normalized_domain.clone()).then_some(source)
            })
            .collect()
    }
}

/// URL and domain mentions in `text`, trailing punctuation removed.
pub fn extract_embedded(text: &str) -> Vec<EmbeddedMention> {
    EMBEDDED_SOURCE_PATTERN
        .find_iter(text)
        .filter_map(|m| {
            let trimmed = m.as_str().trim_end_matches(&['.', ',', ';', ':', '!', '?'][..]);
            (!trimmed.is_empty()).then(|| EmbeddedMention {
                text: trimmed.to_string(),
                start: m.start(),
                end: m.start() + trimmed.len(),
            })
        })
        .collect()
}

/// Tier distribution of a set of classified sources.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceMix {
    /// Count per tier, index 0 = Tier 1
    pub counts: [usize; 5],
    /// Most authoritative permitted tier present
    pub best: Option<Tier>,
    /// Advisory notes
    pub notes: Vec<String>,
}

impl SourceMix {
    pub fn from_sources(sources: &[Source]) -> Self {
        let mut counts = [0usize; 5];
        for source in sources {
            counts[usize::from(source.tier.level() - 1)] += 1;
        }

        let best = sources
            .iter()
            .map(|s| s.tier)
            .filter(|t| t.is_permitted())
            .min();

        let mut notes = Vec::new();
        let high = counts[0] + counts[1];

        if !sources.is_empty() && high == 0 {
            notes.push(
                "No Tier 1-2 sources: medical claims lack high-quality support.".to_string(),
            );
        }
        if counts[2] > high && high > 0 {
            notes.push(
                "More Tier 3 than Tier 1-2 sources: consider adding higher-quality evidence."
                    .to_string(),
            );
        }

        Self { counts, best, notes }
    }

    pub fn count(&self, tier: Tier) -> usize {
        self.counts[usize::from(tier.level() - 1)]
    }
}

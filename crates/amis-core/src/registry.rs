//! Source registry: domain patterns mapped to tiers.
//!
//! The registry is built once, validated, and never mutated afterwards.
//! Extending it produces a new registry (see [`SourceRegistry::with_overrides`]).

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::config::{ConfigError, RegistryOverrides};
use crate::types::Tier;

/// A domain (optionally with a path prefix) and the name it is known by.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierEntry {
    /// `domain.tld` or `domain.tld/path/prefix`
    pub pattern: String,
    pub name: String,
}

impl TierEntry {
    pub fn new(pattern: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into().trim().to_lowercase(),
            name: name.into(),
        }
    }

    fn host(&self) -> &str {
        match self.pattern.find('/') {
            Some(idx) => &self.pattern[..idx],
            None => &self.pattern,
        }
    }

    fn path(&self) -> Option<&str> {
        self.pattern.find('/').map(|idx| &self.pattern[idx..])
    }

    /// Exact host or dot-bounded subdomain, plus path prefix if the entry has one.
    pub fn matches(&self, host: &str, path: &str) -> bool {
        let entry_host = self.host();
        let host_matches = host == entry_host
            || host
                .strip_suffix(entry_host)
                .is_some_and(|prefix| prefix.ends_with('.'));

        if !host_matches {
            return false;
        }

        match self.path() {
            None => true,
            Some(prefix) => {
                let prefix = prefix.trim_end_matches('/');
                path == prefix
                    || path
                        .strip_prefix(prefix)
                        .is_some_and(|rest| rest.starts_with('/'))
            }
        }
    }
}

const TIER_1_DEFAULTS: &[(&str, &str)] = &[
    ("cochranelibrary.com", "Cochrane Library"),
    ("cochrane.org", "Cochrane Collaboration"),
    ("who.int", "World Health Organization"),
    ("nice.org.uk", "NICE (UK)"),
    ("uspreventiveservicestaskforce.org", "USPSTF (US)"),
    ("sign.ac.uk", "SIGN (Scotland)"),
    ("nhmrc.gov.au", "NHMRC (Australia)"),
    ("cadth.ca", "CADTH (Canada)"),
];

const TIER_2_DEFAULTS: &[(&str, &str)] = &[
    ("nejm.org", "New England Journal of Medicine"),
    ("thelancet.com", "The Lancet"),
    ("jamanetwork.com", "JAMA Network"),
    ("bmj.com", "BMJ"),
    ("acpjournals.org", "Annals of Internal Medicine"),
    ("ahajournals.org", "AHA Journals"),
    ("onlinelibrary.wiley.com/journal/diabetes", "Diabetes journals"),
    ("gastrojournal.org", "Gastroenterology"),
    ("jneurosci.org", "Journal of Neuroscience"),
    ("acc.org", "American College of Cardiology"),
    ("asco.org", "American Society of Clinical Oncology"),
    ("diabetes.org", "American Diabetes Association"),
    ("heart.org", "American Heart Association"),
    ("acog.org", "ACOG"),
    ("aafp.org", "AAFP"),
];

const TIER_3_DEFAULTS: &[(&str, &str)] = &[
    ("uptodate.com", "UpToDate"),
    ("medlineplus.gov", "MedlinePlus (NIH)"),
    ("dynamed.com", "DynaMed"),
    ("mayoclinic.org", "Mayo Clinic"),
    ("clevelandclinic.org", "Cleveland Clinic"),
    ("hopkinsmedicine.org", "Johns Hopkins Medicine"),
    ("health.harvard.edu", "Harvard Health"),
    ("stanfordhealthcare.org", "Stanford Health Care"),
    ("ucsfhealth.org", "UCSF Health"),
    ("mountsinai.org", "Mount Sinai"),
    ("cdc.gov", "CDC"),
    ("nih.gov", "NIH"),
    ("nhs.uk", "NHS (UK)"),
    ("healthdirect.gov.au", "HealthDirect (Australia)"),
    ("pubmed.ncbi.nlm.nih.gov", "PubMed"),
    ("ncbi.nlm.nih.gov", "NCBI"),
    ("gov", "Government health source"),
];

const TIER_4_DEFAULTS: &[(&str, &str)] = &[
    ("medpagetoday.com", "MedPage Today"),
    ("statnews.com", "STAT News"),
    ("kevinmd.com", "KevinMD"),
];

const TIER_5_DEFAULTS: &[(&str, &str)] = &[
    ("youtube.com", "YouTube"),
    ("youtu.be", "YouTube (short URL)"),
    ("tiktok.com", "TikTok"),
    ("vimeo.com", "Vimeo"),
    ("twitter.com", "Twitter/X"),
    ("x.com", "X (Twitter)"),
    ("facebook.com", "Facebook"),
    ("instagram.com", "Instagram"),
    ("linkedin.com", "LinkedIn"),
    ("threads.net", "Threads"),
    ("reddit.com", "Reddit"),
    ("quora.com", "Quora"),
    ("healthboards.com", "Health forums"),
    ("patient.info/forums", "Patient forums"),
    ("medium.com", "Medium"),
    ("substack.com", "Substack"),
    ("healthline.com", "Healthline (aggregator)"),
    ("webmd.com", "WebMD (aggregator)"),
    ("verywellhealth.com", "Verywell Health"),
    ("medicalnewstoday.com", "Medical News Today"),
];

fn entries(table: &[(&str, &str)]) -> Vec<TierEntry> {
    table
        .iter()
        .map(|(pattern, name)| TierEntry::new(*pattern, *name))
        .collect()
}

/// Tier lookup tables.
#[derive(Debug, Clone)]
pub struct SourceRegistry {
    /// Tier 1 through Tier 4, checked in that order
    ranked: [Vec<TierEntry>; 4],
    /// Tier 5 platforms, checked before everything else
    excluded: Vec<TierEntry>,
}

impl SourceRegistry {
    /// Build and validate a registry.
    pub fn new(ranked: [Vec<TierEntry>; 4], excluded: Vec<TierEntry>) -> Result<Self, ConfigError> {
        let registry = Self { ranked, excluded };
        registry.validate()?;
        Ok(registry)
    }

    /// Entries for one tier.
    pub fn entries(&self, tier: Tier) -> &[TierEntry] {
        match tier {
            Tier::Excluded => &self.excluded,
            ranked => &self.ranked[usize::from(ranked.level() - 1)],
        }
    }

    /// Total number of entries across all tiers.
    pub fn len(&self) -> usize {
        self.ranked.iter().map(Vec::len).sum::<usize>() + self.excluded.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Reject empty patterns and any pattern listed more than once.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut seen: HashMap<&str, Tier> = HashMap::new();

        for tier in Tier::ALL {
            for entry in self.entries(tier) {
                if entry.pattern.is_empty() {
                    return Err(ConfigError::EmptyEntry(format!(
                        "registry entry '{}' in tier {} has no pattern",
                        entry.name,
                        tier.level()
                    )));
                }
                if let Some(first) = seen.insert(entry.pattern.as_str(), tier) {
                    return Err(ConfigError::DuplicateDomain {
                        domain: entry.pattern.clone(),
                        first_tier: first.level(),
                        second_tier: tier.level(),
                    });
                }
            }
        }

        Ok(())
    }

    /// A new registry with the override entries appended to each tier.
    pub fn with_overrides(&self, overrides: &RegistryOverrides) -> Result<Self, ConfigError> {
        let mut ranked = self.ranked.clone();
        let mut excluded = self.excluded.clone();

        for (tier, extra) in overrides.ranked_entries() {
            let target = match tier {
                Tier::Excluded => &mut excluded,
                ranked_tier => &mut ranked[usize::from(ranked_tier.level() - 1)],
            };
            target.extend(extra.iter().map(|e| TierEntry::new(&e.pattern, &e.name)));
        }

        Self::new(ranked, excluded)
    }

    /// Tier 5 first, then Tier 1 through Tier 4; first match wins.
    pub fn lookup(&self, host: &str, path: &str) -> Option<(Tier, &TierEntry)> {
        if let Some(entry) = self.excluded.iter().find(|e| e.matches(host, path)) {
            return Some((Tier::Excluded, entry));
        }

        Tier::ALL[..4].iter().find_map(|tier| {
            self.entries(*tier)
                .iter()
                .find(|e| e.matches(host, path))
                .map(|e| (*tier, e))
        })
    }
}

impl Default for SourceRegistry {
    fn default() -> Self {
        Self {
            ranked: [
                entries(TIER_1_DEFAULTS),
                entries(TIER_2_DEFAULTS),
                entries(TIER_3_DEFAULTS),
                entries(TIER_4_DEFAULTS),
            ],
            excluded: entries(TIER_5_DEFAULTS),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RegistryEntry;

    #[test]
    fn test_default_registry_is_valid() {
        assert!(SourceRegistry::default().validate().is_ok());
    }

    #[test]
    fn test_entry_matches_subdomain_on_dot_boundary() {
        let entry = TierEntry::new("x.com", "X");
        assert!(entry.matches("x.com", ""));
        assert!(entry.matches("mobile.x.com", ""));
        assert!(!entry.matches("fox.com", ""));
    }

    #[test]
    fn test_entry_with_path_prefix() {
        let entry = TierEntry::new("patient.info/forums", "Patient forums");
        assert!(entry.matches("patient.info", "/forums/discuss/123"));
        assert!(entry.matches("patient.info", "/forums"));
        assert!(!entry.matches("patient.info", "/forumsx"));
        assert!(!entry.matches("patient.info", "/health/asthma"));
    }

    #[test]
    fn test_tier_five_checked_first() {
        let registry = SourceRegistry::default();
        let (tier, entry) = registry.lookup("m.youtube.com", "/watch").unwrap();
        assert_eq!(tier, Tier::Excluded);
        assert_eq!(entry.name, "YouTube");
    }

    #[test]
    fn test_gov_suffix_is_tier_three() {
        let registry = SourceRegistry::default();
        let (tier, _) = registry.lookup("fda.gov", "").unwrap();
        assert_eq!(tier, Tier::SupportingEvidence);
    }

    #[test]
    fn test_duplicate_across_tiers_rejected() {
        let overrides = RegistryOverrides {
            tier3: vec![RegistryEntry {
                pattern: "nejm.org".to_string(),
                name: "NEJM again".to_string(),
            }],
            ..Default::default()
        };

        let err = SourceRegistry::default().with_overrides(&overrides).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::DuplicateDomain { first_tier: 2, second_tier: 3, .. }
        ));
    }

    #[test]
    fn test_override_adds_tier_five_platform() {
        let overrides = RegistryOverrides {
            tier5: vec![RegistryEntry {
                pattern: "misinfo.example".to_string(),
                name: "Known misinformation site".to_string(),
            }],
            ..Default::default()
        };

        let registry = SourceRegistry::default().with_overrides(&overrides).unwrap();
        let (tier, _) = registry.lookup("misinfo.example", "").unwrap();
        assert_eq!(tier, Tier::Excluded);
    }

    #[test]
    fn test_empty_pattern_rejected() {
        let result = SourceRegistry::new(
            [vec![TierEntry::new("  ", "Blank")], vec![], vec![], vec![]],
            vec![],
        );
        assert!(matches!(result, Err(ConfigError::EmptyEntry(_))));
    }
}

//! Response classification
//!
//! Maps the raw availability text returned by the service to a status via an
//! ordered rule list. Unavailable rules run first: the service phrases
//! rejections as "NOT available", which a naive "available" match would
//! misread.

use crate::types::PlateStatus;

/// One classification rule: case-insensitive substring → status
#[derive(Debug, Clone)]
pub struct Rule {
    pub pattern: String,
    pub status: PlateStatus,
}

/// Ordered rule list applied to raw response text
#[derive(Debug, Clone)]
pub struct Classifier {
    rules: Vec<Rule>,
}

impl Classifier {
    /// Build a classifier from pattern lists, unavailable rules first.
    pub fn from_patterns(unavailable: &[String], available: &[String]) -> Self {
        let mut rules = Vec::with_capacity(unavailable.len() + available.len());
        for pattern in unavailable {
            rules.push(Rule {
                pattern: pattern.to_lowercase(),
                status: PlateStatus::Unavailable,
            });
        }
        for pattern in available {
            rules.push(Rule {
                pattern: pattern.to_lowercase(),
                status: PlateStatus::Available,
            });
        }
        Self { rules }
    }

    /// Classify a raw response. Total: always returns a status, and the raw
    /// text is preserved verbatim as the message so unrecognized responses
    /// can be audited.
    pub fn classify(&self, raw: &str) -> (PlateStatus, String) {
        let haystack = raw.to_lowercase();
        for rule in &self.rules {
            if haystack.contains(&rule.pattern) {
                return (rule.status, raw.to_string());
            }
        }
        (PlateStatus::Unknown, raw.to_string())
    }
}

impl Default for Classifier {
    fn default() -> Self {
        Self::from_patterns(&default_unavailable_patterns(), &default_available_patterns())
    }
}

/// Phrases the service uses when a plate is taken or not registrable
pub fn default_unavailable_patterns() -> Vec<String> {
    ["not available", "unavailable", "already taken", "taken"]
        .into_iter()
        .map(String::from)
        .collect()
}

/// Phrases the service uses when a plate can be registered
pub fn default_available_patterns() -> Vec<String> {
    ["congratulations", "available"]
        .into_iter()
        .map(String::from)
        .collect()
}

use crate::error::{ProcessingError, Result};
use crate::utils::constants::DEFAULT_MATCH_THRESHOLD;
use crate::utils::progress::ProgressReporter;
use indexmap::{IndexMap, IndexSet};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;
use tracing::{debug, info};

/// String similarity used by the city matcher, scaled to `[0, 100]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Scorer {
    /// Normalized Indel similarity (insertions and deletions only).
    #[default]
    Ratio,
    /// Normalized Levenshtein similarity.
    Levenshtein,
    /// Jaro-Winkler similarity.
    JaroWinkler,
}

impl Scorer {
    pub fn score(&self, a: &str, b: &str) -> f64 {
        match self {
            Scorer::Ratio => ratio(a, b),
            Scorer::Levenshtein => strsim::normalized_levenshtein(a, b) * 100.0,
            Scorer::JaroWinkler => strsim::jaro_winkler(a, b) * 100.0,
        }
    }

    /// Highest score two strings of these lengths could reach, if the scorer
    /// has a length bound.
    fn upper_bound(&self, len_a: usize, len_b: usize) -> Option<f64> {
        let diff = len_a.abs_diff(len_b) as f64;
        match self {
            Scorer::Ratio => {
                let total = (len_a + len_b) as f64;
                if total == 0.0 {
                    Some(100.0)
                } else {
                    Some(100.0 * (1.0 - diff / total))
                }
            }
            Scorer::Levenshtein => {
                let longest = len_a.max(len_b) as f64;
                if longest == 0.0 {
                    Some(100.0)
                } else {
                    Some(100.0 * (1.0 - diff / longest))
                }
            }
            Scorer::JaroWinkler => None,
        }
    }
}

impl FromStr for Scorer {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "ratio" | "indel" => Ok(Scorer::Ratio),
            "levenshtein" => Ok(Scorer::Levenshtein),
            "jaro_winkler" | "jarowinkler" => Ok(Scorer::JaroWinkler),
            other => Err(format!("Unknown scorer: {}", other)),
        }
    }
}

impl fmt::Display for Scorer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scorer::Ratio => write!(f, "ratio"),
            Scorer::Levenshtein => write!(f, "levenshtein"),
            Scorer::JaroWinkler => write!(f, "jaro_winkler"),
        }
    }
}

/// Normalized Indel similarity of two strings in `[0, 100]`.
///
/// `100 * (1 - indel / (|a| + |b|))` where `indel` is the number of
/// insertions and deletions turning `a` into `b`. Two empty strings score 100.
pub fn ratio(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let total = a.len() + b.len();
    if total == 0 {
        return 100.0;
    }

    let lcs = longest_common_subsequence(&a, &b);
    let distance = total - 2 * lcs;
    100.0 * (1.0 - distance as f64 / total as f64)
}

fn longest_common_subsequence(a: &[char], b: &[char]) -> usize {
    let (short, long) = if a.len() <= b.len() { (a, b) } else { (b, a) };
    let mut row = vec![0usize; short.len() + 1];

    for &lc in long {
        let mut diagonal = 0;
        for (j, &sc) in short.iter().enumerate() {
            let above = row[j + 1];
            row[j + 1] = if lc == sc {
                diagonal + 1
            } else {
                above.max(row[j])
            };
            diagonal = above;
        }
    }

    row[short.len()]
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CityMatch {
    pub target: String,
    pub score: f64,
}

/// A measurement city whose best candidate did not clear the threshold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RejectedCity {
    pub city: String,
    pub best: Option<CityMatch>,
}

/// Accepted rewrites from measurement city to gazetteer city.
///
/// Entries keep the order in which the measurement cities were first seen.
/// A city without an entry maps to itself.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MatchMapping {
    matches: IndexMap<String, CityMatch>,
    rejected: Vec<RejectedCity>,
}

impl MatchMapping {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, city: impl Into<String>, target: impl Into<String>, score: f64) {
        self.matches.insert(
            city.into(),
            CityMatch {
                target: target.into(),
                score,
            },
        );
    }

    pub fn get(&self, city: &str) -> Option<&str> {
        self.matches.get(city).map(|m| m.target.as_str())
    }

    pub fn get_match(&self, city: &str) -> Option<&CityMatch> {
        self.matches.get(city)
    }

    /// The gazetteer city for `city`, or `city` itself when unmapped.
    pub fn resolve<'a>(&'a self, city: &'a str) -> &'a str {
        self.get(city).unwrap_or(city)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &CityMatch)> {
        self.matches.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn rejected(&self) -> &[RejectedCity] {
        &self.rejected
    }

    pub fn len(&self) -> usize {
        self.matches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }

    /// Number of accepted matches that rewrite the city to a different name.
    pub fn rewritten_count(&self) -> usize {
        self.matches
            .iter()
            .filter(|(city, m)| *city != &m.target)
            .count()
    }
}

struct Candidate<'a> {
    name: &'a str,
    len: usize,
}

/// Fuzzy matcher from measurement city names onto gazetteer city names.
///
/// For each source city the candidate with the highest score wins, with ties
/// going to the candidate that comes first. A match is recorded only when
/// its score is strictly greater than the threshold.
pub struct CityMatcher {
    scorer: Scorer,
    threshold: f64,
    max_pairs: Option<u64>,
    max_workers: usize,
}

impl CityMatcher {
    pub fn new() -> Self {
        Self {
            scorer: Scorer::Ratio,
            threshold: DEFAULT_MATCH_THRESHOLD,
            max_pairs: None,
            max_workers: num_cpus::get(),
        }
    }

    pub fn with_scorer(mut self, scorer: Scorer) -> Self {
        self.scorer = scorer;
        self
    }

    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn with_max_pairs(mut self, max_pairs: Option<u64>) -> Self {
        self.max_pairs = max_pairs;
        self
    }

    pub fn with_max_workers(mut self, max_workers: usize) -> Self {
        self.max_workers = max_workers.max(1);
        self
    }

    pub fn scorer(&self) -> Scorer {
        self.scorer
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Distinct values in first-seen order.
    pub fn distinct<'a, I>(values: I) -> IndexSet<String>
    where
        I: IntoIterator<Item = &'a str>,
    {
        values.into_iter().map(str::to_string).collect()
    }

    /// Build the mapping for every distinct source city.
    pub fn match_cities(
        &self,
        sources: &IndexSet<String>,
        candidates: &IndexSet<String>,
        progress: Option<&ProgressReporter>,
    ) -> Result<MatchMapping> {
        if !(0.0..=100.0).contains(&self.threshold) {
            return Err(ProcessingError::Config(format!(
                "Match threshold must be between 0 and 100, got: {}",
                self.threshold
            )));
        }

        let pairs = sources.len() as u64 * candidates.len() as u64;
        if let Some(limit) = self.max_pairs {
            if pairs > limit {
                return Err(ProcessingError::MatchBudgetExceeded { pairs, limit });
            }
        }

        info!(
            sources = sources.len(),
            candidates = candidates.len(),
            scorer = %self.scorer,
            threshold = self.threshold,
            "Matching cities"
        );

        let candidate_list: Vec<Candidate> = candidates
            .iter()
            .map(|name| Candidate {
                name: name.as_str(),
                len: name.chars().count(),
            })
            .collect();
        let exact: HashSet<&str> = candidates.iter().map(String::as_str).collect();

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.max_workers)
            .build()
            .map_err(|e| ProcessingError::Config(e.to_string()))?;

        let source_list: Vec<&String> = sources.iter().collect();
        let results: Vec<(&String, Option<CityMatch>)> = pool.install(|| {
            source_list
                .par_iter()
                .map(|city| {
                    let best = if exact.contains(city.as_str()) {
                        Some(CityMatch {
                            target: city.to_string(),
                            score: 100.0,
                        })
                    } else {
                        self.best_candidate(city, &candidate_list)
                    };

                    if let Some(p) = progress {
                        p.increment(1);
                    }

                    (*city, best)
                })
                .collect()
        });

        let mut mapping = MatchMapping::new();
        for (city, best) in results {
            match best {
                Some(found) if found.score > self.threshold => {
                    mapping.matches.insert(city.clone(), found);
                }
                best => mapping.rejected.push(RejectedCity {
                    city: city.clone(),
                    best,
                }),
            }
        }

        debug!(
            accepted = mapping.len(),
            rewritten = mapping.rewritten_count(),
            rejected = mapping.rejected.len(),
            "City matching finished"
        );

        Ok(mapping)
    }

    /// Best scoring candidate for a single city.
    pub fn best_match(&self, city: &str, candidates: &[String]) -> Option<CityMatch> {
        let candidate_list: Vec<Candidate> = candidates
            .iter()
            .map(|name| Candidate {
                name: name.as_str(),
                len: name.chars().count(),
            })
            .collect();
        self.best_candidate(city, &candidate_list)
    }

    fn best_candidate(&self, city: &str, candidates: &[Candidate]) -> Option<CityMatch> {
        let city_len = city.chars().count();
        let mut best: Option<(&str, f64)> = None;

        for candidate in candidates {
            // Candidates that cannot clear the threshold never change the outcome
            if let Some(bound) = self.scorer.upper_bound(city_len, candidate.len) {
                if bound <= self.threshold {
                    continue;
                }
            }

            let score = self.scorer.score(city, candidate.name);
            if best.map_or(true, |(_, top)| score > top) {
                best = Some((candidate.name, score));
                if score >= 100.0 {
                    break;
                }
            }
        }

        best.map(|(target, score)| CityMatch {
            target: target.to_string(),
            score,
        })
    }
}

impl Default for CityMatcher {
    fn default() -> Self {
        Self::new()
    }
}

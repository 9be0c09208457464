use crate::utils::countries::{Country, ALIASES, COUNTRIES};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

static COUNTRY_INDEX: Lazy<HashMap<String, &'static Country>> = Lazy::new(build_index);

fn build_index() -> HashMap<String, &'static Country> {
    let by_alpha2: HashMap<&str, &'static Country> =
        COUNTRIES.iter().map(|c| (c.alpha2, c)).collect();

    let mut index = HashMap::with_capacity(COUNTRIES.len() * 5 + ALIASES.len());
    for country in COUNTRIES {
        let keys = [
            Some(country.alpha2),
            Some(country.alpha3),
            Some(country.numeric),
            Some(country.name),
            country.official_name,
        ];
        for key in keys.into_iter().flatten() {
            index.entry(lookup_key(key)).or_insert(country);
        }
    }

    for (alias, alpha2) in ALIASES {
        if let Some(country) = by_alpha2.get(alpha2) {
            index.entry(lookup_key(alias)).or_insert(*country);
        }
    }

    index
}

fn lookup_key(raw: &str) -> String {
    raw.trim().to_lowercase()
}

/// Look up a country by code, name, official name or known alias.
///
/// Matching ignores case and surrounding whitespace.
pub fn lookup_country(raw: &str) -> Option<&'static Country> {
    COUNTRY_INDEX.get(&lookup_key(raw)).copied()
}

/// Map a country designator to its ISO 3166-1 alpha-2 code.
///
/// Unrecognized input is returned unchanged so that rows are never lost at
/// load time; such rows simply fail to join later.
pub fn resolve_country(raw: &str) -> String {
    match lookup_country(raw) {
        Some(country) => country.alpha2.to_string(),
        None => raw.to_string(),
    }
}

/// Which side of the join the country resolver is applied to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CountryResolution {
    /// Resolve measurement countries with pass-through fallback; gazetteer
    /// codes are used as stored.
    #[default]
    Lenient,
    /// Resolve both sides and drop rows whose country is not recognized.
    Strict,
}

impl FromStr for CountryResolution {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "lenient" => Ok(CountryResolution::Lenient),
            "strict" => Ok(CountryResolution::Strict),
            other => Err(format!("Unknown country resolution: {}", other)),
        }
    }
}

impl fmt::Display for CountryResolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CountryResolution::Lenient => write!(f, "lenient"),
            CountryResolution::Strict => write!(f, "strict"),
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct CountryResolver {
    strategy: CountryResolution,
}

impl CountryResolver {
    pub fn new(strategy: CountryResolution) -> Self {
        Self { strategy }
    }

    /// Country of a measurement row, or `None` if the row should be dropped.
    pub fn resolve_measurement(&self, raw: &str) -> Option<String> {
        match self.strategy {
            CountryResolution::Lenient => Some(resolve_country(raw)),
            CountryResolution::Strict => lookup_country(raw).map(|c| c.alpha2.to_string()),
        }
    }

    /// Country of a gazetteer row, or `None` if the row should be dropped.
    pub fn resolve_gazetteer(&self, raw: &str) -> Option<String> {
        match self.strategy {
            CountryResolution::Lenient => Some(raw.to_string()),
            CountryResolution::Strict => lookup_country(raw).map(|c| c.alpha2.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_codes_are_stable() {
        assert_eq!(resolve_country("US"), "US");
        assert_eq!(resolve_country("FR"), "FR");
        assert_eq!(resolve_country("gb"), "GB");
    }

    #[test]
    fn test_names_and_codes_resolve() {
        assert_eq!(resolve_country("United States"), "US");
        assert_eq!(resolve_country("United States of America"), "US");
        assert_eq!(resolve_country("france"), "FR");
        assert_eq!(resolve_country("DEU"), "DE");
        assert_eq!(resolve_country("250"), "FR");
        assert_eq!(
            resolve_country("United Kingdom of Great Britain and Northern Ireland"),
            "GB"
        );
        assert_eq!(resolve_country("Viet Nam"), "VN");
        assert_eq!(resolve_country("Russian Federation"), "RU");
        assert_eq!(resolve_country("Bolivia (Plurinational State of)"), "BO");
        assert_eq!(resolve_country(" Côte d'Ivoire "), "CI");
    }

    #[test]
    fn test_unknown_country_passes_through() {
        assert_eq!(resolve_country("Unknownland"), "Unknownland");
        assert_eq!(resolve_country(""), "");
        assert!(lookup_country("Unknownland").is_none());
    }

    #[test]
    fn test_lenient_resolver() {
        let resolver = CountryResolver::new(CountryResolution::Lenient);
        assert_eq!(resolver.resolve_measurement("France"), Some("FR".to_string()));
        assert_eq!(
            resolver.resolve_measurement("Unknownland"),
            Some("Unknownland".to_string())
        );
        // Gazetteer values are taken as stored
        assert_eq!(resolver.resolve_gazetteer("France"), Some("France".to_string()));
    }

    #[test]
    fn test_strict_resolver() {
        let resolver = CountryResolver::new(CountryResolution::Strict);
        assert_eq!(resolver.resolve_measurement("France"), Some("FR".to_string()));
        assert_eq!(resolver.resolve_gazetteer("France"), Some("FR".to_string()));
        assert_eq!(resolver.resolve_gazetteer("FR"), Some("FR".to_string()));
        assert_eq!(resolver.resolve_measurement("Unknownland"), None);
    }

    #[test]
    fn test_resolution_from_str() {
        assert_eq!(
            "Strict".parse::<CountryResolution>().unwrap(),
            CountryResolution::Strict
        );
        assert_eq!(
            "lenient".parse::<CountryResolution>().unwrap(),
            CountryResolution::Lenient
        );
        assert!("fuzzy".parse::<CountryResolution>().is_err());
    }
}

//! Record linkage between the measurement table and the gazetteer.
//!
//! Cities are normalized on both sides, countries are resolved to ISO
//! alpha-2 codes, measurement cities are fuzzily matched onto gazetteer
//! cities, and the rewritten rows are joined on the exact (city, country)
//! key.

pub mod country;
pub mod join;
pub mod matcher;
pub mod normalizer;

pub use country::{lookup_country, resolve_country, CountryResolution, CountryResolver};
pub use join::{JoinEngine, JoinOutcome};
pub use matcher::{ratio, CityMatch, CityMatcher, MatchMapping, RejectedCity, Scorer};
pub use normalizer::{normalize, normalize_in_place};

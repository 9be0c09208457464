use crate::linkage::{JoinOutcome, MatchMapping};
use serde::{Deserialize, Serialize};

/// Row and city counts for one linkage run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LinkageReport {
    pub measurement_rows: usize,
    pub gazetteer_rows: usize,
    /// Rows dropped because their country was not recognized (strict mode only).
    pub unresolved_measurement_countries: usize,
    pub unresolved_gazetteer_countries: usize,
    pub distinct_cities: usize,
    pub candidate_cities: usize,
    pub matched_cities: usize,
    /// Matched cities whose target differs from the source spelling.
    pub rewritten_cities: usize,
    pub rejected_cities: usize,
    pub unmatched_key: usize,
    pub missing_coordinates: usize,
    pub joined_rows: usize,
    pub scorer: String,
    pub threshold: f64,
    pub measurements_cached: bool,
    pub gazetteer_cached: bool,
}

impl LinkageReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_mapping(&mut self, mapping: &MatchMapping) {
        self.matched_cities = mapping.len();
        self.rewritten_cities = mapping.rewritten_count();
        self.rejected_cities = mapping.rejected().len();
    }

    pub fn record_join(&mut self, outcome: &JoinOutcome) {
        self.joined_rows = outcome.joined;
        self.unmatched_key = outcome.unmatched_key;
        self.missing_coordinates = outcome.missing_coordinates;
    }

    pub fn unresolved_countries(&self) -> usize {
        self.unresolved_measurement_countries + self.unresolved_gazetteer_countries
    }

    /// Measurement rows that did not make it into the joined table.
    pub fn dropped_rows(&self) -> usize {
        self.measurement_rows.saturating_sub(self.joined_rows)
    }

    /// Share of measurement rows that were joined, in percent.
    pub fn join_rate(&self) -> f64 {
        if self.measurement_rows == 0 {
            0.0
        } else {
            100.0 * self.joined_rows as f64 / self.measurement_rows as f64
        }
    }

    pub fn summary(&self) -> String {
        let mut summary = String::new();

        summary.push_str("=== Linkage Report ===\n");
        summary.push_str(&format!(
            "Measurement Rows: {}{}\n",
            self.measurement_rows,
            cached_marker(self.measurements_cached)
        ));
        summary.push_str(&format!(
            "Gazetteer Rows: {}{}\n",
            self.gazetteer_rows,
            cached_marker(self.gazetteer_cached)
        ));
        if self.unresolved_countries() > 0 {
            summary.push_str(&format!(
                "Unresolved Countries: {} measurement, {} gazetteer rows dropped\n",
                self.unresolved_measurement_countries, self.unresolved_gazetteer_countries
            ));
        }

        summary.push_str(&format!(
            "\nCity Matching ({}, threshold {}):\n",
            self.scorer, self.threshold
        ));
        summary.push_str(&format!(
            "  Distinct Cities: {} against {} candidates\n",
            self.distinct_cities, self.candidate_cities
        ));
        summary.push_str(&format!(
            "  Matched: {} ({} rewritten)\n",
            self.matched_cities, self.rewritten_cities
        ));
        summary.push_str(&format!("  Rejected: {}\n", self.rejected_cities));

        summary.push_str("\nJoin:\n");
        summary.push_str(&format!(
            "  Joined Rows: {} ({:.1}%)\n",
            self.joined_rows,
            self.join_rate()
        ));
        summary.push_str(&format!("  No Gazetteer Entry: {}\n", self.unmatched_key));
        summary.push_str(&format!(
            "  Missing Coordinates: {}\n",
            self.missing_coordinates
        ));

        summary
    }
}

fn cached_marker(cached: bool) -> &'static str {
    if cached {
        " (cached)"
    } else {
        ""
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_stages() {
        let mut mapping = MatchMapping::new();
        mapping.insert("parris", "paris", 90.9);
        mapping.insert("lyon", "lyon", 100.0);

        let outcome = JoinOutcome {
            joined: 3,
            unmatched_key: 1,
            missing_coordinates: 1,
            ..Default::default()
        };

        let mut report = LinkageReport::new();
        report.measurement_rows = 5;
        report.record_mapping(&mapping);
        report.record_join(&outcome);

        assert_eq!(report.matched_cities, 2);
        assert_eq!(report.rewritten_cities, 1);
        assert_eq!(report.joined_rows, 3);
        assert_eq!(report.dropped_rows(), 2);
        assert!((report.join_rate() - 60.0).abs() < 1e-9);
    }

    #[test]
    fn test_summary_mentions_counts() {
        let report = LinkageReport {
            measurement_rows: 10,
            joined_rows: 7,
            unresolved_measurement_countries: 2,
            scorer: "ratio".to_string(),
            threshold: 85.0,
            measurements_cached: true,
            ..Default::default()
        };

        let summary = report.summary();
        assert!(summary.contains("Measurement Rows: 10 (cached)"));
        assert!(summary.contains("Joined Rows: 7 (70.0%)"));
        assert!(summary.contains("Unresolved Countries: 2 measurement"));
        assert!(summary.contains("ratio, threshold 85"));
    }

    #[test]
    fn test_empty_report_has_zero_rate() {
        assert_eq!(LinkageReport::new().join_rate(), 0.0);
    }
}

use crate::config::LinkerConfig;
use crate::error::Result;
use crate::linkage::{normalize_in_place, CityMatcher, CountryResolver, JoinEngine, MatchMapping};
use crate::models::{GazetteerRecord, JoinedTable, MeasurementRecord};
use crate::processors::cache::TableCache;
use crate::processors::linkage_report::LinkageReport;
use crate::readers::{ConcurrentReader, GazetteerReader, MeasurementReader, SourcePair};
use crate::utils::progress::ProgressReporter;
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

/// Everything one linkage run produces.
#[derive(Debug, Clone)]
pub struct LinkageOutcome {
    pub table: Arc<JoinedTable>,
    pub mapping: MatchMapping,
    pub report: LinkageReport,
}

/// Load, resolve, normalize, match and join.
pub struct LinkagePipeline {
    config: LinkerConfig,
    cache: TableCache,
}

impl LinkagePipeline {
    pub fn new(config: LinkerConfig) -> Self {
        Self {
            config,
            cache: TableCache::new(),
        }
    }

    pub fn config(&self) -> &LinkerConfig {
        &self.config
    }

    pub fn cache(&self) -> &TableCache {
        &self.cache
    }

    /// Run the whole pipeline over two CSV files.
    ///
    /// Sources whose bytes have not changed since a previous run on this
    /// pipeline are taken from the cache instead of being parsed again.
    pub async fn run(
        &mut self,
        measurement_path: &Path,
        gazetteer_path: &Path,
        progress: Option<&ProgressReporter>,
    ) -> Result<LinkageOutcome> {
        if let Some(p) = progress {
            p.set_message("Reading input tables...");
        }

        let reader = ConcurrentReader::new(self.config.use_mmap);
        let sources = reader.open_sources(measurement_path, gazetteer_path).await?;
        let (measurements, gazetteer, cached) = self.load_tables(&sources)?;

        info!(
            measurements = measurements.len(),
            gazetteer = gazetteer.len(),
            measurements_cached = cached.0,
            gazetteer_cached = cached.1,
            "Loaded input tables"
        );

        let mut outcome = self.link_tables(&measurements, &gazetteer, progress)?;
        outcome.report.measurements_cached = cached.0;
        outcome.report.gazetteer_cached = cached.1;

        if let Some(p) = progress {
            p.finish_with_message(&format!("Linked {} rows", outcome.report.joined_rows));
        }

        Ok(outcome)
    }

    /// Parse whatever is not cached; both tables are parsed in parallel.
    #[allow(clippy::type_complexity)]
    fn load_tables(
        &mut self,
        sources: &SourcePair,
    ) -> Result<(
        Arc<Vec<MeasurementRecord>>,
        Arc<Vec<GazetteerRecord>>,
        (bool, bool),
    )> {
        let cached_measurements = self.cache.get_measurements(&sources.measurements.fingerprint);
        let cached_gazetteer = self.cache.get_gazetteer(&sources.gazetteer.fingerprint);
        let cached = (cached_measurements.is_some(), cached_gazetteer.is_some());

        let measurement_reader =
            MeasurementReader::new().with_columns(self.config.measurement_columns.clone());
        let gazetteer_reader =
            GazetteerReader::new().with_columns(self.config.gazetteer_columns.clone());

        let (measurements, gazetteer) = rayon::join(
            || match cached_measurements {
                Some(table) => Ok(table),
                None => measurement_reader
                    .read_from_source(&sources.measurements)
                    .map(Arc::new),
            },
            || match cached_gazetteer {
                Some(table) => Ok(table),
                None => gazetteer_reader
                    .read_from_source(&sources.gazetteer)
                    .map(Arc::new),
            },
        );
        let measurements = measurements?;
        let gazetteer = gazetteer?;

        if !cached.0 {
            self.cache.insert_measurements(
                sources.measurements.fingerprint.clone(),
                Arc::clone(&measurements),
            );
        }
        if !cached.1 {
            self.cache
                .insert_gazetteer(sources.gazetteer.fingerprint.clone(), Arc::clone(&gazetteer));
        }

        Ok((measurements, gazetteer, cached))
    }

    /// Link two already loaded tables. Inputs are left untouched.
    pub fn link_tables(
        &self,
        measurements: &[MeasurementRecord],
        gazetteer: &[GazetteerRecord],
        progress: Option<&ProgressReporter>,
    ) -> Result<LinkageOutcome> {
        let settings = &self.config.matching;
        let mut report = LinkageReport {
            measurement_rows: measurements.len(),
            gazetteer_rows: gazetteer.len(),
            scorer: settings.scorer.to_string(),
            threshold: settings.threshold,
            ..LinkageReport::default()
        };

        if let Some(p) = progress {
            p.set_message("Resolving countries...");
        }

        let resolver = CountryResolver::new(self.config.country_resolution);
        let measurements = prepare_measurements(measurements, &resolver, &mut report);
        let gazetteer = prepare_gazetteer(gazetteer, &resolver, &mut report);

        if report.unresolved_countries() > 0 {
            warn!(
                measurement_rows = report.unresolved_measurement_countries,
                gazetteer_rows = report.unresolved_gazetteer_countries,
                "Dropped rows with unrecognized countries"
            );
        }

        let sources = CityMatcher::distinct(measurements.iter().map(|m| m.city.as_str()));
        let candidates = CityMatcher::distinct(gazetteer.iter().map(|g| g.city.as_str()));
        report.distinct_cities = sources.len();
        report.candidate_cities = candidates.len();

        if let Some(p) = progress {
            p.set_message("Matching cities...");
            p.set_length(sources.len() as u64);
        }

        let matcher = CityMatcher::new()
            .with_scorer(settings.scorer)
            .with_threshold(settings.threshold)
            .with_max_pairs(settings.pair_limit())
            .with_max_workers(settings.workers());
        let mapping = matcher.match_cities(&sources, &candidates, progress)?;
        report.record_mapping(&mapping);

        if let Some(p) = progress {
            p.set_message("Joining coordinates...");
        }

        let outcome = JoinEngine::new().join(&measurements, &gazetteer, &mapping);
        report.record_join(&outcome);

        info!(
            joined = report.joined_rows,
            matched_cities = report.matched_cities,
            rejected_cities = report.rejected_cities,
            "Linkage complete"
        );

        Ok(LinkageOutcome {
            table: Arc::new(outcome.table),
            mapping,
            report,
        })
    }
}

fn prepare_measurements(
    measurements: &[MeasurementRecord],
    resolver: &CountryResolver,
    report: &mut LinkageReport,
) -> Vec<MeasurementRecord> {
    let mut prepared = Vec::with_capacity(measurements.len());
    for record in measurements {
        let Some(country) = resolver.resolve_measurement(&record.country) else {
            report.unresolved_measurement_countries += 1;
            continue;
        };

        let mut record = record.clone();
        record.country = country;
        normalize_in_place(&mut record.city);
        prepared.push(record);
    }
    prepared
}

fn prepare_gazetteer(
    gazetteer: &[GazetteerRecord],
    resolver: &CountryResolver,
    report: &mut LinkageReport,
) -> Vec<GazetteerRecord> {
    let mut prepared = Vec::with_capacity(gazetteer.len());
    for record in gazetteer {
        let Some(country) = resolver.resolve_gazetteer(&record.country) else {
            report.unresolved_gazetteer_countries += 1;
            continue;
        };

        let mut record = record.clone();
        record.country = country;
        normalize_in_place(&mut record.city);
        prepared.push(record);
    }
    prepared
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::linkage::CountryResolution;
    use crate::models::JoinedRecord;
    use pretty_assertions::assert_eq;

    fn pipeline() -> LinkagePipeline {
        LinkagePipeline::new(LinkerConfig::default())
    }

    #[test]
    fn test_parris_links_to_paris() -> Result<()> {
        let measurements = vec![MeasurementRecord::new(
            "France", "Parris", 50.0, 20.0, 10.0, 5.0,
        )];
        let gazetteer = vec![GazetteerRecord::new("Paris", "FR", Some(48.85), Some(2.35))];

        let outcome = pipeline().link_tables(&measurements, &gazetteer, None)?;

        assert_eq!(
            outcome.table.records(),
            &[JoinedRecord::new(
                "FR", "paris", 50.0, 20.0, 10.0, 5.0, 48.85, 2.35
            )]
        );
        assert_eq!(outcome.mapping.get("parris"), Some("paris"));
        assert_eq!(outcome.report.rewritten_cities, 1);
        assert_eq!(outcome.report.joined_rows, 1);

        // Caller's rows keep their raw text
        assert_eq!(measurements[0].city, "Parris");

        Ok(())
    }

    #[test]
    fn test_unmatched_and_missing_coordinates_are_counted() -> Result<()> {
        let measurements = vec![
            MeasurementRecord::new("France", "Paris", 50.0, 20.0, 10.0, 5.0),
            MeasurementRecord::new("France", "Zzzqqq", 40.0, 10.0, 5.0, 2.0),
            MeasurementRecord::new("France", "Lyon", 30.0, 10.0, 5.0, 2.0),
        ];
        let gazetteer = vec![
            GazetteerRecord::new("Paris", "FR", Some(48.85), Some(2.35)),
            GazetteerRecord::new("Lyon", "FR", Some(45.75), None),
        ];

        let outcome = pipeline().link_tables(&measurements, &gazetteer, None)?;
        let report = &outcome.report;

        assert_eq!(outcome.table.len(), 1);
        assert_eq!(report.distinct_cities, 3);
        assert_eq!(report.candidate_cities, 2);
        assert_eq!(report.matched_cities, 2);
        assert_eq!(report.rejected_cities, 1);
        assert_eq!(report.unmatched_key, 1);
        assert_eq!(report.missing_coordinates, 1);
        assert_eq!(report.dropped_rows(), 2);

        Ok(())
    }

    #[test]
    fn test_strict_resolution_drops_unknown_countries() -> Result<()> {
        let mut config = LinkerConfig::default();
        config.country_resolution = CountryResolution::Strict;
        let pipeline = LinkagePipeline::new(config);

        let measurements = vec![
            MeasurementRecord::new("Germany", "Berlin", 40.0, 15.0, 20.0, 8.0),
            MeasurementRecord::new("Atlantis", "Poseidonia", 10.0, 1.0, 1.0, 1.0),
        ];
        let gazetteer = vec![
            GazetteerRecord::new("Berlin", "Germany", Some(52.52), Some(13.41)),
            GazetteerRecord::new("Poseidonia", "Atlantis", Some(0.0), Some(0.0)),
        ];

        let outcome = pipeline.link_tables(&measurements, &gazetteer, None)?;

        assert_eq!(outcome.table.len(), 1);
        assert_eq!(outcome.table.records()[0].country, "DE");
        assert_eq!(outcome.report.unresolved_measurement_countries, 1);
        assert_eq!(outcome.report.unresolved_gazetteer_countries, 1);

        Ok(())
    }

    #[test]
    fn test_lenient_keeps_gazetteer_country_text() -> Result<()> {
        let measurements = vec![MeasurementRecord::new(
            "Germany", "Berlin", 40.0, 15.0, 20.0, 8.0,
        )];
        let gazetteer = vec![GazetteerRecord::new(
            "Berlin",
            "Germany",
            Some(52.52),
            Some(13.41),
        )];

        let outcome = pipeline().link_tables(&measurements, &gazetteer, None)?;

        // "Germany" resolves to "DE" on the measurement side only
        assert!(outcome.table.is_empty());
        assert_eq!(outcome.report.unmatched_key, 1);

        Ok(())
    }

    #[test]
    fn test_pair_guard_is_applied() {
        let mut config = LinkerConfig::default();
        config.matching.max_pairs = 1;
        let pipeline = LinkagePipeline::new(config);

        let measurements = vec![
            MeasurementRecord::new("France", "Paris", 50.0, 20.0, 10.0, 5.0),
            MeasurementRecord::new("France", "Lyon", 30.0, 10.0, 5.0, 2.0),
        ];
        let gazetteer = vec![GazetteerRecord::new("Paris", "FR", Some(48.85), Some(2.35))];

        assert!(pipeline.link_tables(&measurements, &gazetteer, None).is_err());
    }
}

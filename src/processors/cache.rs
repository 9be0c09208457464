use crate::models::{GazetteerRecord, MeasurementRecord};
use crate::readers::SourceFingerprint;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// Parsed tables keyed by the fingerprint of the bytes they came from.
///
/// Only one entry is kept per path: storing a new fingerprint for a path
/// evicts whatever was cached for its old content.
#[derive(Debug, Default)]
pub struct TableCache {
    measurements: HashMap<SourceFingerprint, Arc<Vec<MeasurementRecord>>>,
    gazetteer: HashMap<SourceFingerprint, Arc<Vec<GazetteerRecord>>>,
    hits: u64,
    misses: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub entries: usize,
}

impl TableCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_measurements(
        &mut self,
        fingerprint: &SourceFingerprint,
    ) -> Option<Arc<Vec<MeasurementRecord>>> {
        let found = self.measurements.get(fingerprint).cloned();
        self.record_lookup(fingerprint, found.is_some());
        found
    }

    pub fn insert_measurements(
        &mut self,
        fingerprint: SourceFingerprint,
        records: Arc<Vec<MeasurementRecord>>,
    ) {
        self.measurements.retain(|key, _| key.path != fingerprint.path);
        self.measurements.insert(fingerprint, records);
    }

    pub fn get_gazetteer(
        &mut self,
        fingerprint: &SourceFingerprint,
    ) -> Option<Arc<Vec<GazetteerRecord>>> {
        let found = self.gazetteer.get(fingerprint).cloned();
        self.record_lookup(fingerprint, found.is_some());
        found
    }

    pub fn insert_gazetteer(
        &mut self,
        fingerprint: SourceFingerprint,
        records: Arc<Vec<GazetteerRecord>>,
    ) {
        self.gazetteer.retain(|key, _| key.path != fingerprint.path);
        self.gazetteer.insert(fingerprint, records);
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits,
            misses: self.misses,
            entries: self.measurements.len() + self.gazetteer.len(),
        }
    }

    pub fn clear(&mut self) {
        self.measurements.clear();
        self.gazetteer.clear();
    }

    fn record_lookup(&mut self, fingerprint: &SourceFingerprint, hit: bool) {
        if hit {
            self.hits += 1;
        } else {
            self.misses += 1;
        }
        debug!(
            path = %fingerprint.path.display(),
            sha256 = fingerprint.short_hash(),
            hit,
            "Table cache lookup"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    fn measurements() -> Arc<Vec<MeasurementRecord>> {
        Arc::new(vec![MeasurementRecord::new(
            "France", "Paris", 50.0, 20.0, 10.0, 5.0,
        )])
    }

    #[test]
    fn test_hit_after_insert() {
        let mut cache = TableCache::new();
        let fingerprint = SourceFingerprint::from_bytes(Path::new("aq.csv"), b"v1");

        assert!(cache.get_measurements(&fingerprint).is_none());
        cache.insert_measurements(fingerprint.clone(), measurements());

        let cached = cache.get_measurements(&fingerprint);
        assert_eq!(cached.map(|t| t.len()), Some(1));
        assert_eq!(
            cache.stats(),
            CacheStats {
                hits: 1,
                misses: 1,
                entries: 1
            }
        );
    }

    #[test]
    fn test_changed_content_replaces_entry() {
        let mut cache = TableCache::new();
        let path = Path::new("aq.csv");
        let old = SourceFingerprint::from_bytes(path, b"v1");
        let new = SourceFingerprint::from_bytes(path, b"v2");

        cache.insert_measurements(old.clone(), measurements());
        assert!(cache.get_measurements(&new).is_none());

        cache.insert_measurements(new.clone(), measurements());
        assert!(cache.get_measurements(&old).is_none());
        assert!(cache.get_measurements(&new).is_some());
        assert_eq!(cache.stats().entries, 1);
    }

    #[test]
    fn test_tables_are_separate() {
        let mut cache = TableCache::new();
        let fingerprint = SourceFingerprint::from_bytes(Path::new("same.csv"), b"x");

        cache.insert_measurements(fingerprint.clone(), measurements());
        assert!(cache.get_gazetteer(&fingerprint).is_none());

        cache.insert_gazetteer(
            fingerprint.clone(),
            Arc::new(vec![GazetteerRecord::new("Paris", "FR", Some(48.85), Some(2.35))]),
        );
        assert_eq!(cache.stats().entries, 2);

        cache.clear();
        assert_eq!(cache.stats().entries, 0);
    }
}

use crate::error::Result;
use crate::readers::source::SourceFile;
use std::path::{Path, PathBuf};
use tokio::task::JoinHandle;
use tracing::debug;

/// Opens both input tables at the same time on the blocking pool.
pub struct ConcurrentReader {
    use_mmap: bool,
}

impl ConcurrentReader {
    pub fn new(use_mmap: bool) -> Self {
        Self { use_mmap }
    }

    /// Read (or map) the measurement and gazetteer files concurrently.
    ///
    /// Parsing happens later so the caller can skip it on a cache hit.
    pub async fn open_sources(
        &self,
        measurement_path: &Path,
        gazetteer_path: &Path,
    ) -> Result<SourcePair> {
        let measurement_handle = Self::spawn_open(measurement_path.to_path_buf(), self.use_mmap);
        let gazetteer_handle = Self::spawn_open(gazetteer_path.to_path_buf(), self.use_mmap);

        let (measurements, gazetteer) = tokio::try_join!(measurement_handle, gazetteer_handle)?;
        let pair = SourcePair {
            measurements: measurements?,
            gazetteer: gazetteer?,
        };

        debug!(
            measurement_bytes = pair.measurements.fingerprint.len,
            gazetteer_bytes = pair.gazetteer.fingerprint.len,
            "Opened input tables"
        );

        Ok(pair)
    }

    fn spawn_open(path: PathBuf, use_mmap: bool) -> JoinHandle<Result<SourceFile>> {
        tokio::task::spawn_blocking(move || SourceFile::open(&path, use_mmap))
    }
}

impl Default for ConcurrentReader {
    fn default() -> Self {
        Self::new(false)
    }
}

/// Both input tables, unparsed.
pub struct SourcePair {
    pub measurements: SourceFile,
    pub gazetteer: SourceFile,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProcessingError;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[tokio::test]
    async fn test_open_sources() -> Result<()> {
        let mut measurements = NamedTempFile::new()?;
        writeln!(measurements, "country_name,city_name")?;
        let mut gazetteer = NamedTempFile::new()?;
        writeln!(gazetteer, "name,country_code,latitude,longitude")?;

        let reader = ConcurrentReader::new(true);
        let pair = reader
            .open_sources(measurements.path(), gazetteer.path())
            .await?;

        assert_eq!(pair.measurements.text(), "country_name,city_name\n");
        assert_eq!(pair.gazetteer.path, gazetteer.path());
        assert_ne!(pair.measurements.fingerprint, pair.gazetteer.fingerprint);

        Ok(())
    }

    #[tokio::test]
    async fn test_missing_file_is_io_error() -> Result<()> {
        let gazetteer = NamedTempFile::new()?;
        let reader = ConcurrentReader::default();
        let result = reader
            .open_sources(Path::new("/nonexistent/measurements.csv"), gazetteer.path())
            .await;

        assert!(matches!(result, Err(ProcessingError::Io(_))));
        Ok(())
    }
}

use crate::error::{ProcessingError, Result};
use crate::utils::constants::DEFAULT_BUFFER_SIZE;
use encoding_rs::{UTF_8, WINDOWS_1252};
use memmap2::Mmap;
use sha2::{Digest, Sha256};
use std::borrow::Cow;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Identity of a source file's content.
///
/// Two fingerprints are equal only if path, size and SHA-256 digest agree.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SourceFingerprint {
    pub path: PathBuf,
    pub len: u64,
    pub sha256: String,
}

impl SourceFingerprint {
    pub fn from_bytes(path: &Path, bytes: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(bytes);
        Self {
            path: path.to_path_buf(),
            len: bytes.len() as u64,
            sha256: format!("{:x}", hasher.finalize()),
        }
    }

    pub fn short_hash(&self) -> &str {
        &self.sha256[..12.min(self.sha256.len())]
    }
}

pub enum SourceData {
    Buffered(Vec<u8>),
    Mapped(Mmap),
}

impl AsRef<[u8]> for SourceData {
    fn as_ref(&self) -> &[u8] {
        match self {
            SourceData::Buffered(bytes) => bytes.as_slice(),
            SourceData::Mapped(map) => &map[..],
        }
    }
}

/// Raw bytes of one input table plus their fingerprint.
pub struct SourceFile {
    pub path: PathBuf,
    pub data: SourceData,
    pub fingerprint: SourceFingerprint,
}

impl SourceFile {
    pub fn open(path: &Path, use_mmap: bool) -> Result<Self> {
        let file = File::open(path)?;

        let data = if use_mmap {
            // Safety: the file is opened read-only and only read while mapped
            let map = unsafe { Mmap::map(&file)? };
            SourceData::Mapped(map)
        } else {
            let mut bytes = Vec::new();
            BufReader::with_capacity(DEFAULT_BUFFER_SIZE, file).read_to_end(&mut bytes)?;
            SourceData::Buffered(bytes)
        };

        let fingerprint = SourceFingerprint::from_bytes(path, data.as_ref());
        debug!(
            path = %path.display(),
            bytes = fingerprint.len,
            sha256 = fingerprint.short_hash(),
            mmap = use_mmap,
            "Opened source file"
        );

        Ok(Self {
            path: path.to_path_buf(),
            data,
            fingerprint,
        })
    }

    pub fn bytes(&self) -> &[u8] {
        self.data.as_ref()
    }

    /// File content as text; see [`decode_text`].
    pub fn text(&self) -> Cow<'_, str> {
        decode_text(self.bytes(), &self.path)
    }
}

/// Decode UTF-8 (dropping a BOM), falling back to Windows-1252 when the
/// bytes are not valid UTF-8.
pub fn decode_text<'a>(bytes: &'a [u8], path: &Path) -> Cow<'a, str> {
    let (text, had_errors) = UTF_8.decode_with_bom_removal(bytes);
    if !had_errors {
        return text;
    }

    warn!(path = %path.display(), "Source is not valid UTF-8, decoding as Windows-1252");
    let (text, _) = WINDOWS_1252.decode_without_bom_handling(bytes);
    text
}

/// Position of `column` in the header row.
pub(crate) fn column_index(
    headers: &csv::StringRecord,
    table: &'static str,
    column: &str,
) -> Result<usize> {
    headers
        .iter()
        .position(|h| h.trim() == column)
        .ok_or_else(|| ProcessingError::MissingColumn {
            table,
            column: column.to_string(),
        })
}

/// Empty cells are `None`; anything else must be a finite number.
pub(crate) fn parse_optional_number(
    value: &str,
    table: &'static str,
    row: usize,
    column: &str,
) -> Result<Option<f64>> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }

    match trimmed.parse::<f64>() {
        Ok(number) if number.is_finite() => Ok(Some(number)),
        _ => Err(ProcessingError::InvalidValue {
            table,
            row,
            column: column.to_string(),
            value: value.to_string(),
        }),
    }
}

//! Digit-at-index lookup against a static digit sequence on disk.
//!
//! The file holds the digits with a single separator at raw offset 1
//! (`3.14159...`). Callers address the sequence with the separator folded
//! out of the numbering: index `-1` is the integer digit, `0` is the
//! separator and `1` is the first fractional digit. The raw offset is
//! always `index + 1`.

use crate::domain::model::DigitResult;
use crate::domain::ports::DigitSource;
use crate::utils::error::{PosterError, Result};
use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

pub const DEFAULT_SEPARATOR: u8 = b'.';

#[derive(Debug, Clone)]
pub struct DigitLocator {
    path: PathBuf,
    separator: u8,
}

impl DigitLocator {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            separator: DEFAULT_SEPARATOR,
        }
    }

    pub fn with_separator(mut self, separator: u8) -> Self {
        self.separator = separator;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Looks up the character at `index`.
    ///
    /// Returns [`DigitResult::Absent`] for positions outside the sequence and
    /// [`PosterError::ResourceUnavailable`] when the file cannot be opened or
    /// read, whatever the index. The file is opened read-only on every call.
    pub fn lookup(&self, index: i64) -> Result<DigitResult> {
        // The file must be readable before any position is judged out of range.
        let mut file = File::open(&self.path).map_err(|e| self.unavailable(e))?;
        let len = file.metadata().map_err(|e| self.unavailable(e))?.len();

        let offset = match index.checked_add(1) {
            Some(offset) if offset >= 0 && (offset as u64) < len => offset as u64,
            _ => return Ok(DigitResult::Absent),
        };

        let mut byte = [0u8; 1];
        file.seek(SeekFrom::Start(offset))
            .and_then(|_| file.read_exact(&mut byte))
            .map_err(|e| self.unavailable(e))?;

        let result = classify(byte[0], self.separator);
        tracing::trace!(index, offset, result = %result, "digit lookup");
        Ok(result)
    }

    fn unavailable(&self, source: std::io::Error) -> PosterError {
        PosterError::ResourceUnavailable {
            path: self.path.clone(),
            source,
        }
    }
}

// A trailing newline is the end of the sequence, not a character of it.
fn classify(byte: u8, separator: u8) -> DigitResult {
    if byte == separator {
        DigitResult::Separator
    } else if byte.is_ascii_whitespace() {
        DigitResult::Absent
    } else {
        DigitResult::Digit(byte as char)
    }
}

impl DigitSource for DigitLocator {
    fn digit_at(&self, index: i64) -> Result<DigitResult> {
        self.lookup(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn locator_for(content: &str) -> (NamedTempFile, DigitLocator) {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file.flush().unwrap();
        let locator = DigitLocator::new(file.path());
        (file, locator)
    }

    #[test]
    fn test_lookup_short_sequence() {
        let (_file, locator) = locator_for("3.14159");

        assert_eq!(locator.lookup(-1).unwrap(), DigitResult::Digit('3'));
        assert_eq!(locator.lookup(0).unwrap(), DigitResult::Separator);
        assert_eq!(locator.lookup(1).unwrap(), DigitResult::Digit('1'));
        assert_eq!(locator.lookup(2).unwrap(), DigitResult::Digit('4'));
        assert_eq!(locator.lookup(3).unwrap(), DigitResult::Digit('1'));
        assert_eq!(locator.lookup(4).unwrap(), DigitResult::Digit('5'));
        assert_eq!(locator.lookup(5).unwrap(), DigitResult::Digit('9'));
        assert_eq!(locator.lookup(6).unwrap(), DigitResult::Absent);
    }

    #[test]
    fn test_lookup_before_start_is_absent() {
        let (_file, locator) = locator_for("3.14159");

        assert_eq!(locator.lookup(-2).unwrap(), DigitResult::Absent);
        assert_eq!(locator.lookup(i64::MIN).unwrap(), DigitResult::Absent);
        assert_eq!(locator.lookup(i64::MAX).unwrap(), DigitResult::Absent);
    }

    #[test]
    fn test_trailing_newline_ends_sequence() {
        let (_file, locator) = locator_for("3.14\n");

        assert_eq!(locator.lookup(2).unwrap(), DigitResult::Digit('4'));
        assert_eq!(locator.lookup(3).unwrap(), DigitResult::Absent);
        assert_eq!(locator.lookup(4).unwrap(), DigitResult::Absent);
    }

    #[test]
    fn test_missing_file_is_resource_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let locator = DigitLocator::new(dir.path().join("pi.txt"));

        for index in [i64::MIN, -100, -2, -1, 0, 1, 1_000_000, i64::MAX] {
            assert!(matches!(
                locator.lookup(index),
                Err(PosterError::ResourceUnavailable { .. })
            ));
        }
    }

    #[test]
    fn test_lookup_is_idempotent() {
        let (_file, locator) = locator_for("3.14159265358979");

        let first: Vec<_> = (-1..20).map(|i| locator.lookup(i).unwrap()).collect();
        let second: Vec<_> = (-1..20).map(|i| locator.lookup(i).unwrap()).collect();
        assert_eq!(first, second);
    }

    #[test]
    fn test_custom_separator() {
        let (_file, locator) = locator_for("3,14");
        let locator = locator.with_separator(b',');

        assert_eq!(locator.lookup(0).unwrap(), DigitResult::Separator);
        assert_eq!(locator.lookup(1).unwrap(), DigitResult::Digit('1'));
    }

    #[test]
    fn test_concurrent_lookups() {
        let (_file, locator) = locator_for("3.14159");
        let locator = std::sync::Arc::new(locator);

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let locator = locator.clone();
                std::thread::spawn(move || locator.lookup(4).unwrap())
            })
            .collect();

        for handle in handles {
            assert_eq!(handle.join().unwrap(), DigitResult::Digit('5'));
        }
    }
}

//! The reader type and the file access primitive every query builds on.

use crate::collector::paths::ProcPaths;
use crate::collector::procfs::parser::{Fields, LineQuery, ParseError};
use crate::collector::traits::FileSystem;
use crate::util::{DEFAULT_CLK_TCK, clock_ticks_per_second};
use std::io;
use std::path::{Path, PathBuf};
use tracing::{trace, warn};

/// Error type for reader failures.
#[derive(Debug)]
pub enum StatError {
    /// A file or directory could not be read.
    Io { path: PathBuf, source: io::Error },
    /// A value was missing, malformed or degenerate.
    Parse(ParseError),
}

impl StatError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        StatError::Io {
            path: path.into(),
            source,
        }
    }

    /// `true` when the file no longer exists. For per-process files this
    /// means the process exited after it was listed: the kernel reports
    /// `ENOENT` once the directory is gone and `ESRCH` while it is torn down.
    pub fn is_gone(&self) -> bool {
        match self {
            StatError::Io { source, .. } => {
                source.kind() == io::ErrorKind::NotFound
                    || source.raw_os_error() == Some(libc::ESRCH)
            }
            StatError::Parse(_) => false,
        }
    }
}

impl std::fmt::Display for StatError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StatError::Io { path, source } => {
                write!(f, "I/O error reading {}: {}", path.display(), source)
            }
            StatError::Parse(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for StatError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StatError::Io { source, .. } => Some(source),
            StatError::Parse(e) => Some(e),
        }
    }
}

impl From<ParseError> for StatError {
    fn from(e: ParseError) -> Self {
        StatError::Parse(e)
    }
}

/// Reads process and system statistics from a `/proc` tree.
///
/// The reader holds only configuration. Every query opens, reads and
/// releases its own files, so two queries about the same process can observe
/// different states of it.
#[derive(Debug, Clone)]
pub struct StatReader<F: FileSystem> {
    pub(crate) fs: F,
    pub(crate) paths: ProcPaths,
    pub(crate) clock_ticks: f64,
}

impl<F: FileSystem> StatReader<F> {
    /// Creates a reader using the system clock tick frequency.
    ///
    /// # Arguments
    /// * `fs` - Filesystem implementation (real or mock)
    /// * `paths` - Locations of `/proc` and the `/etc` files
    pub fn new(fs: F, paths: ProcPaths) -> Self {
        Self {
            fs,
            paths,
            clock_ticks: clock_ticks_per_second(),
        }
    }

    /// Overrides the clock tick frequency (ticks per second).
    ///
    /// A frequency that is not a positive finite number is replaced by the
    /// default of 100.
    pub fn with_clock_ticks(mut self, clock_ticks: f64) -> Self {
        self.clock_ticks = if clock_ticks.is_finite() && clock_ticks > 0.0 {
            clock_ticks
        } else {
            warn!(clock_ticks, "invalid clock tick frequency, using default");
            DEFAULT_CLK_TCK
        };
        self
    }

    pub fn clock_ticks(&self) -> f64 {
        self.clock_ticks
    }

    /// Reads `path` and returns the tokens of the line selected by `query`.
    ///
    /// An unreadable file is [`StatError::Io`]. A key that matches no line
    /// gives empty [`Fields`], which positional accessors report as a
    /// [`ParseError`].
    pub fn extract_tokens(&self, path: &Path, query: &LineQuery<'_>) -> Result<Fields, StatError> {
        let content = self.read(path)?;
        Ok(Fields::from_text(path, &content, query))
    }

    /// Reads a whole file, for queries that need several lines of it.
    pub(crate) fn read(&self, path: &Path) -> Result<String, StatError> {
        trace!(path = %path.display(), "reading");
        self.fs
            .read_to_string(path)
            .map_err(|e| StatError::io(path, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::mock::MockFs;

    fn reader() -> StatReader<MockFs> {
        StatReader::new(MockFs::typical_system(), ProcPaths::default()).with_clock_ticks(100.0)
    }

    #[test]
    fn test_extract_tokens_first_line() {
        let fields = reader()
            .extract_tokens(Path::new("/proc/uptime"), &LineQuery::first_line())
            .unwrap();
        assert_eq!(fields.tokens(), ["12345.67", "98765.43"]);
    }

    #[test]
    fn test_extract_tokens_by_key() {
        let fields = reader()
            .extract_tokens(Path::new("/proc/1234/status"), &LineQuery::key("VmData"))
            .unwrap();
        assert_eq!(fields.get(0, "VmData").unwrap(), "1234");
    }

    #[test]
    fn test_extract_tokens_missing_key_is_empty_not_io() {
        let fields = reader()
            .extract_tokens(Path::new("/proc/meminfo"), &LineQuery::key("HugePages_Total"))
            .unwrap();
        assert!(fields.is_empty());
        assert!(fields.get(0, "HugePages_Total").is_err());
    }

    #[test]
    fn test_extract_tokens_missing_file_is_io() {
        let err = reader()
            .extract_tokens(Path::new("/proc/999/status"), &LineQuery::key("VmData"))
            .unwrap_err();
        assert!(matches!(err, StatError::Io { .. }));
        assert!(err.is_gone());
        assert!(err.to_string().contains("/proc/999/status"));
    }

    #[test]
    fn test_parse_error_is_not_gone() {
        let err = StatError::from(ParseError::new("bad"));
        assert!(!err.is_gone());
        assert_eq!(err.to_string(), "Parse error: bad");
    }

    #[test]
    fn test_permission_denied_is_not_gone() {
        let err = StatError::io(
            "/proc/1/status",
            io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        );
        assert!(!err.is_gone());
    }

    #[test]
    fn test_esrch_is_gone() {
        let err = StatError::io(
            "/proc/1234/status",
            io::Error::from_raw_os_error(libc::ESRCH),
        );
        assert!(err.is_gone());
    }

    #[test]
    fn test_invalid_clock_ticks_fall_back_to_default() {
        for bad in [0.0, -100.0, f64::NAN, f64::INFINITY] {
            let reader = StatReader::new(MockFs::typical_system(), ProcPaths::default())
                .with_clock_ticks(bad);
            assert_eq!(reader.clock_ticks(), 100.0);
            let up = reader.process_up_time(1234).unwrap();
            assert!(up.is_finite());
            assert!((up - 5.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_clock_ticks_override() {
        let reader = reader().with_clock_ticks(250.0);
        assert_eq!(reader.clock_ticks(), 250.0);
    }
}

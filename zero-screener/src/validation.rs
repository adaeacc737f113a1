//! Input validation for screening requests and export targets.
//!
//! Every check here is side-effect free: range checks and the pool check
//! only look at their arguments, and the path check only inspects the
//! filesystem (it never creates anything).

use std::path::{Component, Path, PathBuf};

use zero_common::util::join_limited;
use zero_common::validation::{ensure_in_range, ValidationError, ValidationResult};

use crate::code::is_valid_stock_code;

/// Default number of stocks returned.
pub const DEFAULT_TOP_N: i64 = 20;
/// Smallest accepted result count.
pub const MIN_TOP_N: i64 = 1;
/// Largest accepted result count.
pub const MAX_TOP_N: i64 = 1000;

/// Default score floor (no filtering).
pub const DEFAULT_MIN_SCORE: f64 = 0.0;
/// Lowest accepted score floor.
pub const MIN_SCORE: f64 = 0.0;
/// Highest accepted score floor.
pub const MAX_SCORE: f64 = 100.0;

/// Default worker cap handed to the screener.
pub const DEFAULT_MAX_WORKERS: i64 = 5;
/// Smallest accepted worker cap.
pub const MIN_WORKERS: i64 = 1;
/// Largest accepted worker cap.
pub const MAX_WORKERS: i64 = 20;

/// Offending pool entries listed in an error message.
const MAX_REPORTED_CODES: usize = 5;

/// Export formats the exporter can write.
pub const ALLOWED_EXTENSIONS: &[&str] = &["csv", "xlsx", "xls"];

// ============================================================================
// Request Parameters
// ============================================================================

/// Validate the result-count limit.
pub fn validate_top_n(top_n: i64) -> ValidationResult<usize> {
    ensure_in_range("top_n", top_n, MIN_TOP_N, MAX_TOP_N).map(|n| n as usize)
}

/// Validate the minimum composite score.
pub fn validate_min_score(min_score: f64) -> ValidationResult<f64> {
    ensure_in_range("min_score", min_score, MIN_SCORE, MAX_SCORE)
}

/// Validate the worker cap.
pub fn validate_max_workers(workers: i64) -> ValidationResult<usize> {
    ensure_in_range("max_workers", workers, MIN_WORKERS, MAX_WORKERS).map(|n| n as usize)
}

/// Validate an explicit instrument pool.
///
/// `None` means whole-market scope and always passes. An empty list fails,
/// as does any code that is not six digits with an optional `.SH`/`.SZ`.
pub fn validate_stock_pool<S: AsRef<str>>(stock_pool: Option<&[S]>) -> ValidationResult<()> {
    let Some(pool) = stock_pool else {
        return Ok(());
    };

    if pool.is_empty() {
        return Err(ValidationError::InvalidValue {
            field: "stock_pool".into(),
            reason: "must not be an empty list".into(),
        });
    }

    let invalid: Vec<&str> = pool
        .iter()
        .map(AsRef::as_ref)
        .filter(|code| !is_valid_stock_code(code))
        .collect();

    if invalid.is_empty() {
        Ok(())
    } else {
        Err(ValidationError::InvalidValue {
            field: "stock_pool".into(),
            reason: format!(
                "contains invalid stock codes: {}\nStock codes must be 6 digits with an optional market suffix (.SH/.SZ)",
                join_limited(&invalid, MAX_REPORTED_CODES, ", ")
            ),
        })
    }
}

// ============================================================================
// Output Path Policy
// ============================================================================

/// Where export files may be written.
///
/// A path passes when its extension is allowed and its resolved location is
/// inside one of the allowed directories.
#[derive(Debug, Clone)]
pub struct OutputPathPolicy {
    allowed_dirs: Vec<PathBuf>,
    allowed_extensions: Vec<String>,
}

impl OutputPathPolicy {
    /// Policy confined to the given directories (resolved on construction).
    pub fn new<I, P>(dirs: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        let mut policy = Self {
            allowed_dirs: Vec::new(),
            allowed_extensions: ALLOWED_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
        };
        policy.add_dirs(dirs);
        policy
    }

    /// Working directory, home directory and system temp directory.
    pub fn from_environment() -> Self {
        let mut dirs = Vec::new();
        if let Ok(cwd) = std::env::current_dir() {
            dirs.push(cwd);
        }
        if let Some(home) = dirs::home_dir() {
            dirs.push(home);
        }
        dirs.push(std::env::temp_dir());
        Self::new(dirs)
    }

    /// Add more allowed directories.
    pub fn with_extra_dirs<I, P>(mut self, dirs: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        self.add_dirs(dirs);
        self
    }

    fn add_dirs<I, P>(&mut self, dirs: I)
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        for dir in dirs {
            let resolved = resolve_path(dir.as_ref());
            if !self.allowed_dirs.contains(&resolved) {
                self.allowed_dirs.push(resolved);
            }
        }
    }

    /// Resolved allowed directories.
    pub fn allowed_dirs(&self) -> &[PathBuf] {
        &self.allowed_dirs
    }

    /// Validate an output path and return its canonical absolute form.
    ///
    /// Checks, in order: non-empty, supported extension, inside an allowed
    /// directory, parent directory exists.
    pub fn validate(&self, path: &str) -> ValidationResult<PathBuf> {
        if path.trim().is_empty() {
            return Err(ValidationError::MissingField {
                field: "output".into(),
            });
        }

        let resolved = resolve_path(Path::new(path));

        let extension = resolved
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .unwrap_or_default();
        if !self.allowed_extensions.iter().any(|e| *e == extension) {
            return Err(ValidationError::InvalidPath {
                path: path.to_string(),
                reason: format!(
                    "unsupported file format '{}' (supported: {})",
                    if extension.is_empty() { "(none)".to_string() } else { format!(".{extension}") },
                    self.allowed_extensions
                        .iter()
                        .map(|e| format!(".{e}"))
                        .collect::<Vec<_>>()
                        .join(", ")
                ),
            });
        }

        if !self.allowed_dirs().iter().any(|dir| resolved.starts_with(dir)) {
            return Err(ValidationError::InvalidPath {
                path: path.to_string(),
                reason: format!(
                    "path must be inside one of: {}",
                    self.allowed_dirs()
                        .iter()
                        .map(|d| d.display().to_string())
                        .collect::<Vec<_>>()
                        .join(", ")
                ),
            });
        }

        match resolved.parent() {
            Some(parent) if parent.is_dir() => Ok(resolved),
            Some(parent) => Err(ValidationError::InvalidPath {
                path: path.to_string(),
                reason: format!("output directory does not exist: {}", parent.display()),
            }),
            None => Err(ValidationError::InvalidPath {
                path: path.to_string(),
                reason: "path has no parent directory".into(),
            }),
        }
    }
}

impl Default for OutputPathPolicy {
    fn default() -> Self {
        Self::from_environment()
    }
}

/// Validate `path` against the default (environment) policy.
pub fn validate_output_path(path: &str) -> ValidationResult<PathBuf> {
    OutputPathPolicy::from_environment().validate(path)
}

/// Make `path` absolute, collapse `.`/`..`, and resolve symlinks on the
/// longest existing ancestor. Missing trailing components are kept as-is.
pub fn resolve_path(path: &Path) -> PathBuf {
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .map(|cwd| cwd.join(path))
            .unwrap_or_else(|_| path.to_path_buf())
    };

    let mut normalized = PathBuf::new();
    for component in absolute.components() {
        match component {
            Component::ParentDir => {
                normalized.pop();
            }
            Component::CurDir => {}
            other => normalized.push(other.as_os_str()),
        }
    }

    let mut existing = normalized.as_path();
    let mut missing = Vec::new();
    loop {
        if let Ok(canonical) = existing.canonicalize() {
            let mut out = canonical;
            for part in missing.iter().rev() {
                out.push(part);
            }
            return out;
        }
        match (existing.parent(), existing.file_name()) {
            (Some(parent), Some(name)) => {
                missing.push(name.to_os_string());
                existing = parent;
            }
            _ => return normalized,
        }
    }
}

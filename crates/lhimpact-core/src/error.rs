use std::path::PathBuf;

/// Errors that can occur across the lhimpact crates.
///
/// Each variant wraps a specific failure domain. Library crates use this type
/// directly; the binary crate converts to `miette::Report` at the boundary.
///
/// # Examples
///
/// ```
/// use lhimpact_core::ImpactError;
///
/// let err = ImpactError::Config("missing gist token".into());
/// assert!(err.to_string().contains("missing gist token"));
/// ```
#[derive(Debug, thiserror::Error)]
pub enum ImpactError {
    /// Filesystem I/O failure.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid or missing configuration.
    #[error("configuration error: {0}")]
    Config(String),

    /// A shell command failed or could not be spawned.
    #[error("process error: {0}")]
    Process(String),

    /// GitHub API call failure.
    #[error("GitHub error: {0}")]
    GitHub(String),

    /// A Lighthouse report could not be read or parsed.
    #[error("report error: {0}")]
    Report(String),

    /// JSON serialization / deserialization failure.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// TOML deserialization failure.
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// A required file was not found.
    #[error("file not found: {}", .0.display())]
    FileNotFound(PathBuf),

    /// The surrounding operation was cancelled before this step completed.
    #[error("operation cancelled")]
    Cancelled,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_error_converts() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: ImpactError = io_err.into();
        assert!(err.to_string().contains("gone"));
    }

    #[test]
    fn config_error_displays_message() {
        let err = ImpactError::Config("bad value".into());
        assert_eq!(err.to_string(), "configuration error: bad value");
    }

    #[test]
    fn file_not_found_shows_path() {
        let err = ImpactError::FileNotFound(PathBuf::from("/tmp/report.json"));
        assert!(err.to_string().contains("/tmp/report.json"));
    }

    #[test]
    fn cancelled_is_terse() {
        assert_eq!(ImpactError::Cancelled.to_string(), "operation cancelled");
    }
}

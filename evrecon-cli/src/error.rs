//! CLI error type.

use std::fmt;

use evrecon::ReconstructError;

/// Failures surfaced by the `evrecon` binary. Every variant exits with 1.
#[derive(Debug)]
pub enum CliError {
    /// Command-line arguments could not be parsed.
    Argument(clap::Error),
    /// The reconstruction itself failed.
    Reconstruct(ReconstructError),
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            // clap renders its own "error:" prefix and usage line
            CliError::Argument(e) => write!(f, "{}", e.to_string().trim_end()),
            CliError::Reconstruct(e) => write!(f, "error: {}", e),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::Argument(e) => Some(e),
            CliError::Reconstruct(e) => Some(e),
        }
    }
}

impl From<ReconstructError> for CliError {
    fn from(e: ReconstructError) -> Self {
        CliError::Reconstruct(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reconstruct_error_display() {
        let err = CliError::from(ReconstructError::MissingColumn("polarity"));
        assert_eq!(
            err.to_string(),
            "error: missing required column 'polarity' in event header"
        );
    }

    #[test]
    fn test_source_is_preserved() {
        use std::error::Error;

        let err = CliError::from(ReconstructError::InvalidConfig("bad".to_string()));
        assert!(err.source().is_some());
    }
}

use thiserror::Error;

/// CLI-level error categories mapped to exit codes.
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Validation(#[from] govscout_core::ValidationError),

    #[error(transparent)]
    Config(#[from] govscout_core::ConfigError),

    #[error("command error: {0}")]
    Command(String),

    #[error("strict mode failed: {failure_count} upstream call(s) failed")]
    StrictModeViolation { failure_count: usize },

    #[error(transparent)]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl CliError {
    pub const fn exit_code(&self) -> u8 {
        match self {
            Self::Validation(_) => 2,
            Self::Command(_) => 2,
            Self::Config(_) => 3,
            Self::Serialization(_) => 4,
            Self::StrictModeViolation { .. } => 5,
            Self::Io(_) => 10,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes_separate_usage_config_and_strict_failures() {
        let validation = CliError::from(govscout_core::ValidationError::EmptyAddress);
        let config = CliError::from(govscout_core::ConfigError::Invalid {
            field: String::from("sam.limit"),
            reason: String::from("must be > 0"),
        });
        let strict = CliError::StrictModeViolation { failure_count: 2 };

        assert_eq!(validation.exit_code(), 2);
        assert_eq!(config.exit_code(), 3);
        assert_eq!(strict.exit_code(), 5);
        assert_eq!(
            strict.to_string(),
            "strict mode failed: 2 upstream call(s) failed"
        );
    }
}

use thiserror::Error;

#[derive(Clone, Debug, Error, PartialEq)]
pub enum DomainError {
    #[error("invalid scoring weights: {0}")]
    InvalidWeights(String),
    #[error("invalid pairing table `{table}`: {message}")]
    InvalidTable { table: &'static str, message: String },
}

#[derive(Clone, Debug, Error, PartialEq)]
pub enum ApplicationError {
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error("integration failure: {0}")]
    Integration(String),
    #[error("configuration failure: {0}")]
    Configuration(String),
}

impl ApplicationError {
    /// Stable snake_case class used in structured command output.
    pub fn error_class(&self) -> &'static str {
        match self {
            Self::Domain(DomainError::InvalidWeights(_)) => "invalid_weights",
            Self::Domain(DomainError::InvalidTable { .. }) => "invalid_table",
            Self::Integration(_) => "integration",
            Self::Configuration(_) => "configuration",
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::errors::{ApplicationError, DomainError};

    #[test]
    fn domain_error_converts_into_application_error() {
        let error = ApplicationError::from(DomainError::InvalidWeights(
            "weights sum to 0.9".to_owned(),
        ));

        assert_eq!(error.error_class(), "invalid_weights");
        assert_eq!(error.to_string(), "invalid scoring weights: weights sum to 0.9");
    }

    #[test]
    fn table_error_names_the_table() {
        let error = DomainError::InvalidTable {
            table: "seasonal",
            message: "multiplier for `fall` must be positive".to_owned(),
        };

        assert!(error.to_string().contains("`seasonal`"));
        assert_eq!(ApplicationError::from(error).error_class(), "invalid_table");
    }

    #[test]
    fn integration_and_configuration_classes_are_distinct() {
        assert_eq!(
            ApplicationError::Integration("timeout".to_owned()).error_class(),
            "integration"
        );
        assert_eq!(
            ApplicationError::Configuration("missing key".to_owned()).error_class(),
            "configuration"
        );
    }
}

/// Result type alias used throughout the simulator
pub type Result<T> = std::result::Result<T, SimError>;

/// Failures the ranking core can report. None of them are transient.
#[derive(Debug, thiserror::Error)]
pub enum SimError {
    #[error("Invalid configuration: {reason}")]
    InvalidConfiguration { reason: String },

    #[error("Numerical instability: {reason}")]
    NumericalInstability { reason: String },

    #[error("Config parse error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl SimError {
    pub fn invalid_config(reason: impl Into<String>) -> Self {
        SimError::InvalidConfiguration {
            reason: reason.into(),
        }
    }

    pub fn numerical(reason: impl Into<String>) -> Self {
        SimError::NumericalInstability {
            reason: reason.into(),
        }
    }
}

use thiserror::Error;

pub type CvResult<T> = Result<T, CvError>;

/// Coarse classification callers branch on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ErrorKind {
    Configuration,
    PropertyNotSupported,
    BalanceTypeNotSupported,
    Internal,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CvError {
    /// Inconsistent or missing caller input.
    #[error("Configuration error: {what}")]
    Configuration { what: String },

    /// The bound property or reaction package lacks a needed capability.
    #[error("Property not supported: {what}")]
    PropertyNotSupported { what: String },

    /// The requested balance kind is not implemented.
    #[error("Balance type not supported: {what}")]
    BalanceTypeNotSupported { what: String },

    /// Internal invariant violated. Indicates a bug, not misuse.
    #[error("Internal error: {what}")]
    Internal { what: String },
}

impl CvError {
    pub fn config(what: impl Into<String>) -> Self {
        CvError::Configuration { what: what.into() }
    }

    pub fn not_supported(what: impl Into<String>) -> Self {
        CvError::PropertyNotSupported { what: what.into() }
    }

    pub fn balance_type(what: impl Into<String>) -> Self {
        CvError::BalanceTypeNotSupported { what: what.into() }
    }

    pub fn internal(what: impl Into<String>) -> Self {
        CvError::Internal { what: what.into() }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            CvError::Configuration { .. } => ErrorKind::Configuration,
            CvError::PropertyNotSupported { .. } => ErrorKind::PropertyNotSupported,
            CvError::BalanceTypeNotSupported { .. } => ErrorKind::BalanceTypeNotSupported,
            CvError::Internal { .. } => ErrorKind::Internal,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_matches_variant() {
        assert_eq!(CvError::config("x").kind(), ErrorKind::Configuration);
        assert_eq!(
            CvError::not_supported("x").kind(),
            ErrorKind::PropertyNotSupported
        );
        assert_eq!(
            CvError::balance_type("x").kind(),
            ErrorKind::BalanceTypeNotSupported
        );
        assert_eq!(CvError::internal("x").kind(), ErrorKind::Internal);
    }

    #[test]
    fn display_carries_message() {
        let msg = format!("{}", CvError::config("has_phase_equilibrium was not set"));
        assert!(msg.contains("Configuration"));
        assert!(msg.contains("has_phase_equilibrium"));
    }
}

//! Package-level errors.

use cv_core::CvError;
use cv_model::ModelError;
use thiserror::Error;

pub type PropsResult<T> = Result<T, PropsError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PropsError {
    #[error("unknown phase '{name}'")]
    UnknownPhase { name: String },

    #[error("unknown component '{name}'")]
    UnknownComponent { name: String },

    #[error("unknown reaction '{name}'")]
    UnknownReaction { name: String },

    /// The package does not offer the requested quantity.
    #[error("{what} is not supported by package '{package}'")]
    NotSupported { package: String, what: String },

    /// Package definition is inconsistent.
    #[error("invalid package definition: {what}")]
    InvalidPackage { what: String },

    #[error("model check failed for '{block}': {what}")]
    CheckFailed { block: String, what: String },

    #[error(transparent)]
    Model(#[from] ModelError),
}

impl From<PropsError> for CvError {
    fn from(err: PropsError) -> Self {
        match err {
            PropsError::NotSupported { .. } => CvError::not_supported(err.to_string()),
            PropsError::InvalidPackage { .. } | PropsError::CheckFailed { .. } => {
                CvError::config(err.to_string())
            }
            PropsError::Model(inner) => inner.into(),
            other => CvError::internal(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cv_core::ErrorKind;

    #[test]
    fn kinds_after_conversion() {
        let e: CvError = PropsError::NotSupported {
            package: "pp".into(),
            what: "element composition".into(),
        }
        .into();
        assert_eq!(e.kind(), ErrorKind::PropertyNotSupported);

        let e: CvError = PropsError::UnknownPhase { name: "Sol".into() }.into();
        assert_eq!(e.kind(), ErrorKind::Internal);

        let e: CvError = PropsError::InvalidPackage { what: "no phases".into() }.into();
        assert_eq!(e.kind(), ErrorKind::Configuration);
    }
}

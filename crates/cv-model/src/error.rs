//! Model runtime errors.

use cv_core::CvError;
use thiserror::Error;

pub type ModelResult<T> = Result<T, ModelError>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ModelError {
    #[error("component '{name}' already exists on block '{block}'")]
    DuplicateComponent { block: String, name: String },

    #[error("component '{name}' not found on block '{block}'")]
    MissingComponent { block: String, name: String },

    #[error("index {index} is not part of '{component}'")]
    UnknownIndex { component: String, index: String },

    #[error("index {index} already present in '{component}'")]
    DuplicateIndex { component: String, index: String },
}

impl From<ModelError> for CvError {
    fn from(err: ModelError) -> Self {
        match err {
            // Re-adding a component means a builder was called twice.
            ModelError::DuplicateComponent { .. } => CvError::config(err.to_string()),
            other => CvError::internal(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cv_core::ErrorKind;

    #[test]
    fn duplicate_maps_to_configuration() {
        let err: CvError = ModelError::DuplicateComponent {
            block: "cv".into(),
            name: "material_balances".into(),
        }
        .into();
        assert_eq!(err.kind(), ErrorKind::Configuration);
    }

    #[test]
    fn lookups_map_to_internal() {
        let err: CvError = ModelError::UnknownIndex {
            component: "cv.area".into(),
            index: "[3]".into(),
        }
        .into();
        assert_eq!(err.kind(), ErrorKind::Internal);
    }
}

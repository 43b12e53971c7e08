use thiserror::Error;

/// Result type alias for this crate.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    /// The network geometry, hyper-parameters or supplied layers are inconsistent.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// Matrix dimensions do not line up for the requested computation.
    #[error("shape mismatch in {context}: expected {expected}, found {found}")]
    Shape {
        context: &'static str,
        expected: usize,
        found: usize,
    },

    #[error("label {label} is out of range for {num_classes} classes")]
    LabelOutOfRange { label: usize, num_classes: usize },

    #[error("batch contains no examples")]
    EmptyBatch,

    #[error("failed to read configuration: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse configuration: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// True for errors caused by the model's configuration rather than by the data of a call.
    pub fn is_config(&self) -> bool {
        matches!(self, Error::Config(_) | Error::Io(_) | Error::Json(_))
    }

    pub(crate) fn shape(context: &'static str, expected: usize, found: usize) -> Self {
        Error::Shape {
            context,
            expected,
            found,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_kind_is_separate_from_numeric_kind() {
        assert!(Error::Config("empty geometry".to_string()).is_config());
        assert!(!Error::shape("forward", 3, 2).is_config());
        assert!(!Error::EmptyBatch.is_config());
    }

    #[test]
    fn shape_error_message() {
        let err = Error::shape("layer input", 4, 2);
        assert_eq!(
            "shape mismatch in layer input: expected 4, found 2",
            err.to_string()
        );
    }
}

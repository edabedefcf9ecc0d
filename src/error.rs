use std::{fmt, path::PathBuf};
use thiserror::Error;

/// Category of a failed adapter stage.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FailureKind {
    /// The image reference points at nothing.
    InputMissing,
    /// The image reference exists but its bytes could not be obtained.
    InputUnreadable,
    /// Text extraction produced no text to summarize.
    NoExtractableText,
    /// Any failure raised by the model itself.
    ModelError,
}

impl FailureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureKind::InputMissing => "input_missing",
            FailureKind::InputUnreadable => "input_unreadable",
            FailureKind::NoExtractableText => "no_extractable_text",
            FailureKind::ModelError => "model_error",
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The failure arm of an [`crate::AdapterResult`].
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct AdapterFailure {
    pub kind: FailureKind,
    pub message: String,
}

impl AdapterFailure {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn model(message: impl Into<String>) -> Self {
        Self::new(FailureKind::ModelError, message)
    }
}

/// Errors raised while turning an image reference into bytes.
#[derive(Debug, Error)]
pub enum InputError {
    #[error("image not found: {}", .0.display())]
    Missing(PathBuf),

    #[error("failed to read image {}: {source}", path.display())]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("unsupported image format: {0}")]
    UnsupportedFormat(String),
}

impl InputError {
    pub fn kind(&self) -> FailureKind {
        match self {
            InputError::Missing(_) => FailureKind::InputMissing,
            InputError::Unreadable { .. } | InputError::UnsupportedFormat(_) => {
                FailureKind::InputUnreadable
            }
        }
    }
}

impl From<InputError> for AdapterFailure {
    fn from(error: InputError) -> Self {
        AdapterFailure::new(error.kind(), error.to_string())
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn input_errors_map_to_failure_kinds() {
        let missing = InputError::Missing(PathBuf::from("dog.png"));
        assert_eq!(missing.kind(), FailureKind::InputMissing);

        let unreadable = InputError::Unreadable {
            path: PathBuf::from("dog.png"),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        };
        assert_eq!(unreadable.kind(), FailureKind::InputUnreadable);

        let failure: AdapterFailure = InputError::UnsupportedFormat("gif".to_string()).into();
        assert_eq!(failure.kind, FailureKind::InputUnreadable);
        assert_eq!(failure.message, "unsupported image format: gif");
    }
}

//! Error types for the markup layer.

use thiserror::Error;

#[derive(Debug, Error, Clone)]
pub enum MarkupError {
    /// Load/save was attempted on an opaque payload.
    #[error("binary document: {path}")]
    BinaryDocument { path: String },

    #[error("markup parse error: {message}")]
    Parse { message: String },

    #[error("markup write error: {message}")]
    Write { message: String },
}

#[cfg(test)]
mod tests {
    use super::MarkupError;

    #[test]
    fn display_includes_context() {
        let err = MarkupError::BinaryDocument {
            path: "images/cover.jpg".to_string(),
        };
        assert!(err.to_string().contains("cover.jpg"));

        let err = MarkupError::Parse {
            message: "unexpected end".to_string(),
        };
        assert!(err.to_string().contains("parse"));
    }
}

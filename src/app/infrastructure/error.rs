use thiserror::Error;

#[derive(Error, Debug)]
pub enum HighlightError {
    #[error("Unsupported language: {0}")]
    UnsupportedLanguage(String),

    #[error("Unknown style: {0}")]
    UnknownStyle(String),

    #[error("Syntax error: {0}")]
    Syntax(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
}

/// Convenience type alias for Results with HighlightError
pub type Result<T> = std::result::Result<T, HighlightError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: HighlightError = io_err.into();
        assert!(matches!(err, HighlightError::Io(_)));
        assert!(err.to_string().contains("file not found"));
    }

    #[test]
    fn test_error_display() {
        let err = HighlightError::UnsupportedLanguage("cobol".to_string());
        assert_eq!(err.to_string(), "Unsupported language: cobol");

        let err = HighlightError::UnknownStyle("neon".to_string());
        assert_eq!(err.to_string(), "Unknown style: neon");
    }

    #[test]
    fn test_toml_error_conversion() {
        let toml_err = toml::from_str::<toml::Value>("= broken").unwrap_err();
        let err: HighlightError = toml_err.into();
        assert!(matches!(err, HighlightError::Toml(_)));
    }
}

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised by catalog stores and the legacy importer.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// A required text field was empty or blank after trimming. Nothing was written.
    #[error("{0}")]
    Validation(String),

    #[error("{kind} {id} not found")]
    NotFound { kind: &'static str, id: i64 },

    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("failed to access {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid catalog data: {0}")]
    Json(#[from] serde_json::Error),
}

impl CatalogError {
    pub(crate) fn meal_not_found(id: i64) -> Self {
        Self::NotFound { kind: "Meal", id }
    }

    #[must_use]
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

pub type Result<T, E = CatalogError> = std::result::Result<T, E>;

/// Trim `value` and reject it when nothing is left.
pub(crate) fn require_text(value: &str, field: &str) -> Result<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(CatalogError::Validation(format!("{field} must not be empty")));
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_require_text_trims() {
        assert_eq!(require_text("  Pasta \n", "name").unwrap(), "Pasta");
    }

    #[test]
    fn test_require_text_rejects_blank() {
        let err = require_text(" \t ", "Meal name").unwrap_err();
        assert!(err.is_validation());
        assert_eq!(err.to_string(), "Meal name must not be empty");
    }

    #[test]
    fn test_not_found_message() {
        let err = CatalogError::meal_not_found(42);
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "Meal 42 not found");
    }
}

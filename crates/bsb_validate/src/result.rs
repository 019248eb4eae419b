//! Validation result type.

use serde::Serialize;

use bsb_core::Dialect;

/// Outcome of a structural check.
///
/// The document is valid exactly when no errors were recorded; warnings and
/// info entries never affect validity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationResult {
    is_valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    dialect: Option<String>,
    errors: Vec<String>,
    warnings: Vec<String>,
    info: Vec<String>,
}

impl ValidationResult {
    pub fn new() -> Self {
        Self {
            is_valid: true,
            dialect: None,
            errors: Vec::new(),
            warnings: Vec::new(),
            info: Vec::new(),
        }
    }

    pub fn for_dialect(dialect: Dialect) -> Self {
        Self {
            dialect: Some(dialect.to_string()),
            ..Self::new()
        }
    }

    pub fn add_error(&mut self, message: impl Into<String>) {
        self.is_valid = false;
        self.errors.push(message.into());
    }

    pub fn add_warning(&mut self, message: impl Into<String>) {
        self.warnings.push(message.into());
    }

    pub fn add_info(&mut self, message: impl Into<String>) {
        self.info.push(message.into());
    }

    pub fn merge(&mut self, other: ValidationResult) {
        if !other.is_valid {
            self.is_valid = false;
        }
        self.errors.extend(other.errors);
        self.warnings.extend(other.warnings);
        self.info.extend(other.info);
    }

    pub fn is_valid(&self) -> bool {
        self.is_valid
    }

    pub fn dialect(&self) -> Option<&str> {
        self.dialect.as_deref()
    }

    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    pub fn info(&self) -> &[String] {
        &self.info
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validity_tracks_errors() {
        let mut result = ValidationResult::new();
        result.add_warning("just a warning");
        result.add_info("some info");
        assert!(result.is_valid());

        result.add_error("broken");
        assert!(!result.is_valid());
        assert_eq!(result.errors().len(), 1);
    }

    #[test]
    fn test_merge() {
        let mut first = ValidationResult::new();
        first.add_warning("w");

        let mut second = ValidationResult::new();
        second.add_error("e");

        first.merge(second);
        assert!(!first.is_valid());
        assert_eq!(first.warnings().len(), 1);
        assert_eq!(first.errors().len(), 1);
    }
}

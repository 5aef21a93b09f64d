use validator::ValidationError;

/// Validates the default-category label list: every label must be a non-empty
/// string of at most 100 characters
pub fn validate_default_labels(labels: &Vec<String>) -> Result<(), ValidationError> {
    for label in labels {
        if label.trim().is_empty() {
            let mut error = ValidationError::new("empty_label");
            error.message = Some("category labels must not be empty".into());
            return Err(error);
        }
        if label.chars().count() > 100 {
            let mut error = ValidationError::new("label_too_long");
            error.message = Some("category labels must be at most 100 characters".into());
            return Err(error);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_labels_are_accepted() {
        let labels = vec!["Food".to_string(), "Transport".to_string()];
        assert!(validate_default_labels(&labels).is_ok());
    }

    #[test]
    fn test_empty_label_is_rejected() {
        let labels = vec!["Food".to_string(), "  ".to_string()];
        assert!(validate_default_labels(&labels).is_err());
    }

    #[test]
    fn test_overlong_label_is_rejected() {
        let labels = vec!["x".repeat(101)];
        assert!(validate_default_labels(&labels).is_err());
    }
}

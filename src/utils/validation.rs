use crate::services::error::ServiceError;
use std::path::Path;

#[derive(Debug, Clone)]
pub struct ValidationError {
    pub code: &'static str,
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl std::error::Error for ValidationError {}

impl From<ValidationError> for ServiceError {
    fn from(err: ValidationError) -> Self {
        match err.code {
            "FILE_TOO_LARGE" => ServiceError::PayloadTooLarge(err.message),
            _ => ServiceError::InvalidInput(err.message),
        }
    }
}

/// Validates file size against maximum limit
pub fn validate_file_size(size: usize, max_size: usize) -> Result<(), ValidationError> {
    if size > max_size {
        return Err(ValidationError {
            code: "FILE_TOO_LARGE",
            message: format!(
                "File size {} bytes exceeds maximum allowed {} bytes ({} MB)",
                size,
                max_size,
                max_size / 1024 / 1024
            ),
        });
    }
    Ok(())
}

/// Stage names: 3-63 chars, leading letter, then ASCII alphanumerics, '_' or '-'.
pub fn validate_stage_name(name: &str) -> Result<(), ValidationError> {
    let valid_len = (3..=63).contains(&name.len());
    let leading_letter = name.chars().next().is_some_and(|c| c.is_ascii_alphabetic());
    let valid_chars = name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');

    if valid_len && leading_letter && valid_chars {
        Ok(())
    } else {
        Err(ValidationError {
            code: "INVALID_STAGE_NAME",
            message: format!(
                "Stage name '{}' must be 3-63 characters, start with a letter and contain only letters, digits, '_' or '-'",
                name
            ),
        })
    }
}

/// Reduces an uploaded file name to the object key it is stored under.
/// Only the final path component is kept.
pub fn sanitize_object_key(filename: &str) -> Result<String, ValidationError> {
    let name = filename
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or("")
        .trim();

    if name.is_empty() || name == "." || name == ".." {
        return Err(ValidationError {
            code: "INVALID_FILENAME",
            message: "Filename cannot be empty".to_string(),
        });
    }

    if name.len() != filename.trim().len() {
        tracing::warn!("Path components stripped from uploaded filename: {}", filename);
    }

    if name.chars().any(|c| c.is_control()) {
        return Err(ValidationError {
            code: "INVALID_FILENAME",
            message: "Filename cannot contain control characters".to_string(),
        });
    }

    if name.len() > 255 {
        return Err(ValidationError {
            code: "INVALID_FILENAME",
            message: "Filename cannot exceed 255 bytes".to_string(),
        });
    }

    Ok(name.to_string())
}

/// Lowercased extension including the leading dot, e.g. ".csv"
pub fn file_extension(key: &str) -> Option<String> {
    Path::new(key)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| format!(".{}", e.to_lowercase()))
}

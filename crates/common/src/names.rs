use crate::BlobMetadata;

/// Name of the zero-byte object that marks a virtual directory
pub const DIRECTORY_PLACEHOLDER: &str = ".placeholder";

/// Longest blob name the blob service accepts
pub const MAX_BLOB_NAME_LEN: usize = 1024;

/// Error type for name validation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NameValidationError {
    Blank,
    TooLong,
    ContainsControlCharacter,
    InvalidContainerName,
    InvalidMetadataKey,
    InvalidMetadataValue,
}

impl NameValidationError {
    pub fn message(&self) -> &'static str {
        match self {
            NameValidationError::Blank => "Name cannot be empty",
            NameValidationError::TooLong => "Name cannot be longer than 1024 characters",
            NameValidationError::ContainsControlCharacter => {
                "Name cannot contain control characters"
            }
            NameValidationError::InvalidContainerName => {
                "Container names must be 3-63 lowercase letters, digits or single hyphens, starting and ending with a letter or digit"
            }
            NameValidationError::InvalidMetadataKey => {
                "Metadata names must start with a letter or '_' and contain only letters, digits or '_'"
            }
            NameValidationError::InvalidMetadataValue => {
                "Metadata values must be printable ASCII"
            }
        }
    }
}

impl std::fmt::Display for NameValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for NameValidationError {}

/// True when the value is empty or whitespace only
pub fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}

pub fn validate_blob_name(name: &str) -> Result<(), NameValidationError> {
    if is_blank(name) {
        return Err(NameValidationError::Blank);
    }

    if name.chars().count() > MAX_BLOB_NAME_LEN {
        return Err(NameValidationError::TooLong);
    }

    if name.chars().any(char::is_control) {
        return Err(NameValidationError::ContainsControlCharacter);
    }

    Ok(())
}

/// Validate a container name against the blob service naming rules
pub fn validate_container_name(name: &str) -> Result<(), NameValidationError> {
    if is_blank(name) {
        return Err(NameValidationError::Blank);
    }

    let valid_chars = name
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-');
    if !(3..=63).contains(&name.len())
        || !valid_chars
        || name.starts_with('-')
        || name.ends_with('-')
        || name.contains("--")
    {
        return Err(NameValidationError::InvalidContainerName);
    }

    Ok(())
}

/// Build the placeholder blob path that simulates a directory on a flat namespace
///
/// `"reports/"` and `"reports"` both map to `"reports/.placeholder"`.
pub fn directory_placeholder(directory_name: &str) -> Result<String, NameValidationError> {
    if is_blank(directory_name) {
        return Err(NameValidationError::Blank);
    }

    let trimmed = directory_name.trim_end_matches('/');
    if is_blank(trimmed) {
        return Err(NameValidationError::Blank);
    }

    let path = format!("{}/{}", trimmed, DIRECTORY_PLACEHOLDER);
    validate_blob_name(&path)?;
    Ok(path)
}

/// Check metadata names and values before they are sent as `x-ms-meta-*` headers
pub fn validate_metadata(metadata: &BlobMetadata) -> Result<(), NameValidationError> {
    for (key, value) in metadata {
        let mut chars = key.chars();
        let starts_ok = chars
            .next()
            .map(|c| c.is_ascii_alphabetic() || c == '_')
            .unwrap_or(false);
        if !starts_ok || !chars.all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return Err(NameValidationError::InvalidMetadataKey);
        }

        if !value.chars().all(|c| c.is_ascii() && !c.is_ascii_control()) {
            return Err(NameValidationError::InvalidMetadataValue);
        }
    }
    Ok(())
}

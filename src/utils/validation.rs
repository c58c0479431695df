use crate::utils::error::{ConvertError, Result};

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

pub fn validate_path(field_name: &str, path: &str) -> Result<()> {
    if path.is_empty() {
        return Err(ConvertError::InvalidConfigValue {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path cannot be empty".to_string(),
        });
    }

    if path.contains('\0') {
        return Err(ConvertError::InvalidConfigValue {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path contains null bytes".to_string(),
        });
    }

    Ok(())
}

pub fn validate_positive_number(field_name: &str, value: usize, min_value: usize) -> Result<()> {
    if value < min_value {
        return Err(ConvertError::InvalidConfigValue {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: format!("Value must be at least {}", min_value),
        });
    }
    Ok(())
}

pub fn validate_non_empty_string(field_name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(ConvertError::InvalidConfigValue {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: "Value cannot be empty or whitespace-only".to_string(),
        });
    }
    Ok(())
}

/// Output stems become file names, so they may not carry directories.
pub fn validate_file_stem(field_name: &str, stem: &str) -> Result<()> {
    validate_non_empty_string(field_name, stem)?;

    if stem.contains(['/', '\\', '\0']) || stem == "." || stem == ".." {
        return Err(ConvertError::InvalidConfigValue {
            field: field_name.to_string(),
            value: stem.to_string(),
            reason: "File stem must be a plain file name".to_string(),
        });
    }
    Ok(())
}

pub fn validate_finite(field_name: &str, value: f64) -> Result<()> {
    if !value.is_finite() {
        return Err(ConvertError::InvalidConfigValue {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: "Value must be a finite number".to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_path() {
        assert!(validate_path("output.path", "./output").is_ok());
        assert!(validate_path("output.path", "").is_err());
        assert!(validate_path("output.path", "bad\0path").is_err());
    }

    #[test]
    fn test_validate_positive_number() {
        assert!(validate_positive_number("engine.concurrency", 4, 1).is_ok());
        assert!(validate_positive_number("engine.concurrency", 0, 1).is_err());
    }

    #[test]
    fn test_validate_file_stem() {
        assert!(validate_file_stem("output.stem", "converted").is_ok());
        assert!(validate_file_stem("output.stem", "  ").is_err());
        assert!(validate_file_stem("output.stem", "../escape").is_err());
        assert!(validate_file_stem("output.stem", "..").is_err());
    }

    #[test]
    fn test_validate_finite() {
        assert!(validate_finite("vertical_offsets.offset_m", 0.5).is_ok());
        assert!(validate_finite("vertical_offsets.offset_m", f64::NAN).is_err());
    }
}

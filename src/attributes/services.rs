use crate::error::AppError;

const MAX_NAME_LEN: usize = 255;

/// Interprets a boolean query flag. Absent and empty both mean `false`.
pub fn parse_flag(name: &str, raw: Option<&str>) -> Result<bool, AppError> {
    let Some(raw) = raw else {
        return Ok(false);
    };
    match raw.trim().to_ascii_lowercase().as_str() {
        "" | "0" | "false" | "no" | "off" => Ok(false),
        "1" | "true" | "yes" | "on" => Ok(true),
        other => Err(AppError::validation(format!(
            "{name} must be a boolean, got {other:?}"
        ))),
    }
}

pub fn validate_name(name: &str) -> Result<String, AppError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(AppError::validation("name must not be empty"));
    }
    if name.chars().count() > MAX_NAME_LEN {
        return Err(AppError::validation("name is too long"));
    }
    Ok(name.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flag_values() {
        assert!(!parse_flag("assigned_only", None).unwrap());
        assert!(!parse_flag("assigned_only", Some("")).unwrap());
        assert!(!parse_flag("assigned_only", Some("0")).unwrap());
        assert!(!parse_flag("assigned_only", Some("False")).unwrap());
        assert!(parse_flag("assigned_only", Some("1")).unwrap());
        assert!(parse_flag("assigned_only", Some("TRUE")).unwrap());
        assert!(parse_flag("assigned_only", Some("maybe")).is_err());
    }

    #[test]
    fn names_are_trimmed_and_bounded() {
        assert_eq!(validate_name("  Basil ").unwrap(), "Basil");
        assert!(validate_name("   ").is_err());
        assert!(validate_name(&"x".repeat(256)).is_err());
        assert!(validate_name(&"x".repeat(255)).is_ok());
    }
}

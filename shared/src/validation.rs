use std::borrow::Cow;

use validator::ValidationError;

use crate::constants::{
    EMPTY_PLAYER_NAME_ERROR, INAPPROPRIATE_PLAYER_NAME_ERROR, MAX_PLAYER_NAME_LENGTH, PLAYER_NAME_TOO_LONG_ERROR,
};
use crate::profanity::ProfanityFilter;

fn error(code: &'static str, message: &'static str) -> ValidationError {
    let mut err = ValidationError::new(code);
    err.message = Some(Cow::Borrowed(message));
    err
}

/// Checks a name typed into the "Add Player" form. Surrounding whitespace is
/// ignored; callers store the trimmed value.
pub fn validate_player_name(name: &str) -> Result<(), ValidationError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(error("empty_player_name", EMPTY_PLAYER_NAME_ERROR));
    }
    if name.chars().count() > MAX_PLAYER_NAME_LENGTH {
        return Err(error("player_name_too_long", PLAYER_NAME_TOO_LONG_ERROR));
    }
    if ProfanityFilter::contains_profanity(name) {
        return Err(error("inappropriate_player_name", INAPPROPRIATE_PLAYER_NAME_ERROR));
    }
    Ok(())
}

/// Human readable text for a validation failure produced in this module.
pub fn error_message(err: &ValidationError) -> String {
    err.message
        .as_ref()
        .map(|m| m.to_string())
        .unwrap_or_else(|| err.code.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_player_name_rules() {
        assert!(validate_player_name("Tom Davis").is_ok());
        assert!(validate_player_name("  Tom Davis  ").is_ok());

        let err = validate_player_name("   ").unwrap_err();
        assert_eq!(err.code, "empty_player_name");
        assert_eq!(error_message(&err), EMPTY_PLAYER_NAME_ERROR);

        let long = "x".repeat(MAX_PLAYER_NAME_LENGTH + 1);
        assert_eq!(validate_player_name(&long).unwrap_err().code, "player_name_too_long");
    }

    #[test]
    fn test_inappropriate_names_are_refused() {
        let err = validate_player_name("fuck").unwrap_err();
        assert_eq!(err.code, "inappropriate_player_name");
        assert_eq!(error_message(&err), INAPPROPRIATE_PLAYER_NAME_ERROR);
    }
}

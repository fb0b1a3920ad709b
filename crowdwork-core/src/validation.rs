use thiserror::Error;

use crate::{char_len, non_empty_trimmed};

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Message cannot be empty")]
    EmptyMessage,
    #[error("Message is {length} characters long, the limit is {max}")]
    MessageTooLong { length: usize, max: usize },
    #[error("Pick a song before requesting")]
    EmptySelection,
}

/// Validates a chat message, returning the trimmed text to send
pub fn validate_message(text: &str, max: usize) -> Result<&str, ValidationError> {
    let trimmed = non_empty_trimmed(text).ok_or(ValidationError::EmptyMessage)?;
    let length = char_len(trimmed);

    if length > max {
        return Err(ValidationError::MessageTooLong { length, max });
    }

    Ok(trimmed)
}

/// Validates a song selection, returning the trimmed text to request
pub fn validate_selection(song: &str) -> Result<&str, ValidationError> {
    non_empty_trimmed(song).ok_or(ValidationError::EmptySelection)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_length_boundary() {
        let exact = "a".repeat(300);
        let over = "a".repeat(301);

        assert_eq!(validate_message(&exact, 300), Ok(exact.as_str()));
        assert_eq!(
            validate_message(&over, 300),
            Err(ValidationError::MessageTooLong {
                length: 301,
                max: 300
            })
        );
    }

    #[test]
    fn surrounding_whitespace_does_not_count() {
        let padded = format!("  {}  ", "é".repeat(300));
        assert!(validate_message(&padded, 300).is_ok());
        assert_eq!(validate_message(" \t ", 300), Err(ValidationError::EmptyMessage));
    }

    #[test]
    fn empty_selection_is_rejected() {
        assert_eq!(validate_selection(""), Err(ValidationError::EmptySelection));
        assert_eq!(validate_selection(" Nina Simone "), Ok("Nina Simone"));
    }
}

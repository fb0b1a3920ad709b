/// Returns the length of a string in characters, not bytes.
pub fn char_len(text: &str) -> usize {
    text.chars().count()
}

/// Returns the trimmed text, or [None] if nothing is left after trimming.
pub fn non_empty_trimmed(text: &str) -> Option<&str> {
    let trimmed = text.trim();

    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_characters_not_bytes() {
        assert_eq!(char_len("héllo"), 5);
        assert_eq!(char_len(""), 0);
    }

    #[test]
    fn trims_to_none_when_blank() {
        assert_eq!(non_empty_trimmed("   \n"), None);
        assert_eq!(non_empty_trimmed("  hi "), Some("hi"));
    }
}

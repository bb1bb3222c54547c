//! Field helpers for structured logging

/// Maximum number of characters kept in a content preview.
pub const PREVIEW_CHARS: usize = 100;

/// Truncate text for a log preview (privacy-safe)
///
/// Returns `None` when content logging is disabled or the text is blank.
/// Truncation counts characters, not bytes, so multi-byte text is never
/// split mid-character.
///
/// # Examples
///
/// ```
/// use kabu::logging::truncate_preview;
///
/// assert_eq!(truncate_preview("日経平均の見通し", true).as_deref(), Some("日経平均の見通し"));
/// assert!(truncate_preview("hidden", false).is_none());
/// ```
pub fn truncate_preview(text: &str, enable_content_logging: bool) -> Option<String> {
    if !enable_content_logging {
        return None;
    }

    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    match text.char_indices().nth(PREVIEW_CHARS) {
        Some((cut, _)) => Some(format!("{}...", &text[..cut])),
        None => Some(text.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disabled_returns_none() {
        assert!(truncate_preview("anything", false).is_none());
    }

    #[test]
    fn test_blank_returns_none() {
        assert!(truncate_preview("   ", true).is_none());
    }

    #[test]
    fn test_long_multibyte_text_is_cut_on_char_boundary() {
        let text = "株".repeat(150);
        let preview = truncate_preview(&text, true).unwrap();
        assert_eq!(preview.chars().count(), PREVIEW_CHARS + 3);
        assert!(preview.ends_with("..."));
    }

    #[test]
    fn test_exact_length_is_not_truncated() {
        let text = "a".repeat(PREVIEW_CHARS);
        assert_eq!(truncate_preview(&text, true).unwrap(), text);
    }
}

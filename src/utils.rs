// Utility helpers

use crate::error::{AppError, Result};

/// Rejects blank input and caps it to `max_chars` characters.
pub fn cap_user_input(input: &str, max_chars: usize) -> Result<String> {
    if input.trim().is_empty() {
        return Err(AppError::BadRequest("message must not be empty".to_string()));
    }
    let max = max_chars.max(1);
    if input.chars().count() > max {
        tracing::debug!("Capping user input to {} characters", max);
        return Ok(input.chars().take(max).collect());
    }
    Ok(input.to_string())
}

/// Longest prefix of `text` that fits in `max_bytes` without splitting a character.
pub fn truncate_at_char_boundary(text: &str, max_bytes: usize) -> &str {
    if text.len() <= max_bytes {
        return text;
    }
    let mut end = max_bytes;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}

//! Byte-to-text decoding.

/// Decodes file bytes as text.
///
/// UTF-8 is tried first, then Latin-1, which maps every byte to a char.
/// Bodies containing NUL bytes are binary and yield `None`.
#[must_use]
pub fn decode_text(bytes: &[u8]) -> Option<String> {
    if bytes.contains(&0) {
        return None;
    }
    match std::str::from_utf8(bytes) {
        Ok(text) => Some(text.to_string()),
        Err(_) => Some(bytes.iter().map(|&b| char::from(b)).collect()),
    }
}

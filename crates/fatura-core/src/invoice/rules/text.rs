//! Word-level helpers for text glued together by PDF extraction.

use super::patterns::LETTERS;

/// Insert a space before every uppercase ASCII letter except a leading one.
///
/// PDF text extraction often joins adjacent table cells ("ResidencialTrifásico").
pub fn separate_words(line: &str) -> String {
    let mut separated = String::with_capacity(line.len() + 8);
    for (i, c) in line.char_indices() {
        if i > 0 && c.is_ascii_uppercase() {
            separated.push(' ');
        }
        separated.push(c);
    }
    separated
}

/// First run of letters in the line, or an empty string.
pub fn first_word(line: &str) -> &str {
    LETTERS.find(line).map(|m| m.as_str()).unwrap_or("")
}

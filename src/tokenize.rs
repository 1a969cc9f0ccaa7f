//! Splits lines of text into word tokens.
//!

/// A word character is an ASCII letter, digit, or underscore; anything
/// else is a delimiter.
fn is_delimiter(c: char) -> bool {
    !(c.is_ascii_alphanumeric() || c == '_')
}

/// Splits a line into a lazy sequence of word tokens.
///
/// Maximal runs of delimiter characters separate tokens, and runs at
/// either end of the line yield no empty tokens. Splitting is
/// equivalent to the pattern `[^A-Za-z0-9_]+`. Case is preserved as-is;
/// callers wanting case-insensitive counts must lowercase upstream.
pub fn tokens(line: &str) -> impl Iterator<Item = &str> {
    line.split(is_delimiter).filter(|t| !t.is_empty())
}

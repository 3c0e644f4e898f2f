//! Key Sanitization
//!
//! Maps arbitrary application keys to storage-legal document identifiers.
//! The backing store rejects a small set of characters in document ids, so
//! each disallowed character is rewritten to `*` followed by the two-digit
//! lowercase hex code of the character.
//!
//! Sanitization is deterministic but not reversed anywhere: the exact
//! original key is always persisted alongside the document and recovered
//! from there, never by decoding the sanitized id.

/// Characters the backing store does not accept in document ids
const DISALLOWED: [char; 5] = ['\\', '?', '/', '#', ' '];

/// Sanitize an application key into a storage-legal document id.
///
/// Characters in the disallowed set `{\, ?, /, #, space}` are replaced by
/// `*` plus the two-digit lowercase hex code of the character; all other
/// characters pass through unchanged.
///
/// # Example
///
/// ```rust
/// use statestore::sanitize_key;
///
/// assert_eq!(sanitize_key("a/b c"), "a*2fb*20c");
/// assert_eq!(sanitize_key("plain-key"), "plain-key");
/// ```
pub fn sanitize_key(key: &str) -> String {
    use std::fmt::Write;

    let mut out = String::with_capacity(key.len());
    for ch in key.chars() {
        if DISALLOWED.contains(&ch) {
            // Writing to a String cannot fail
            let _ = write!(out, "*{:02x}", ch as u32);
        } else {
            out.push(ch);
        }
    }
    out
}

//! Session identifier generation.
//!
//! Format: [4-char prefix][26-char nanoid] = 30 chars total
//! Alphabet: lowercase alphanumeric (0-9, a-z), safe to embed in file names and URLs.

/// Lowercase alphanumeric alphabet for generated identifiers.
const ID_ALPHABET: [char; 36] = [
    '0', '1', '2', '3', '4', '5', '6', '7', '8', '9', 'a', 'b', 'c', 'd', 'e', 'f', 'g', 'h', 'i',
    'j', 'k', 'l', 'm', 'n', 'o', 'p', 'q', 'r', 's', 't', 'u', 'v', 'w', 'x', 'y', 'z',
];

/// Prefix carried by every upload session identifier.
pub const SESSION_PREFIX: &str = "sess";

/// Length of the random part of an identifier.
const SUFFIX_LEN: usize = 26;

/// Total length of a session identifier.
pub const SESSION_ID_LEN: usize = SESSION_PREFIX.len() + SUFFIX_LEN;

/// Generate a session ID (prefix: "sess").
///
/// nanoid draws from the OS random source, so concurrent callers never need
/// to coordinate to avoid collisions.
pub fn generate_session_id() -> String {
    let suffix = nanoid::nanoid!(SUFFIX_LEN, &ID_ALPHABET);
    format!("{}{}", SESSION_PREFIX, suffix)
}

/// Returns true if `id` has the shape of a generated session ID.
///
/// Only the shape is checked; the session may not exist.
pub fn is_session_id(id: &str) -> bool {
    id.len() == SESSION_ID_LEN
        && id.starts_with(SESSION_PREFIX)
        && id
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_session_id_format() {
        let id = generate_session_id();
        assert_eq!(id.len(), 30);
        assert!(id.starts_with("sess"));
        assert!(is_session_id(&id));
    }

    #[test]
    fn test_session_ids_are_unique_across_threads() {
        let handles: Vec<_> = (0..4)
            .map(|_| {
                std::thread::spawn(|| (0..250).map(|_| generate_session_id()).collect::<Vec<_>>())
            })
            .collect();

        let mut seen = HashSet::new();
        for handle in handles {
            for id in handle.join().unwrap() {
                assert!(seen.insert(id), "duplicate session id generated");
            }
        }
        assert_eq!(seen.len(), 1000);
    }

    #[test]
    fn test_is_session_id_rejects_foreign_shapes() {
        assert!(!is_session_id(""));
        assert!(!is_session_id("sess"));
        assert!(!is_session_id("conn0123456789abcdefghijklmnop"));
        assert!(!is_session_id("sess0123456789ABCDEFGHIJKLMNOP"));
        assert!(!is_session_id("sess../../../../etc/passwd0000"));
    }
}

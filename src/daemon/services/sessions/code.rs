//! Session code generation and format checks.

use rand::Rng;

use crate::constants::{SESSION_CODE_ALPHABET, SESSION_CODE_LEN};

/// Generates a random session code.
///
/// Uniqueness is not checked here; the store retries inside its write
/// transaction when a candidate is already taken.
pub fn generate_code() -> String {
    let mut rng = rand::rng();
    (0..SESSION_CODE_LEN)
        .map(|_| {
            let idx = rng.random_range(0..SESSION_CODE_ALPHABET.len());
            char::from(SESSION_CODE_ALPHABET[idx])
        })
        .collect()
}

/// Checks whether `code` could have been produced by [`generate_code`].
///
/// Lookups of malformed codes are answered as not found without a
/// storage round trip.
pub fn is_well_formed(code: &str) -> bool {
    code.len() == SESSION_CODE_LEN && code.bytes().all(|b| SESSION_CODE_ALPHABET.contains(&b))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_generated_codes_are_well_formed() {
        for _ in 0..1000 {
            let code = generate_code();
            assert_eq!(code.len(), SESSION_CODE_LEN);
            assert!(is_well_formed(&code), "bad code: {code}");
        }
    }

    #[test]
    fn test_generated_codes_are_distinct() {
        let codes: HashSet<String> = (0..10_000).map(|_| generate_code()).collect();
        assert_eq!(codes.len(), 10_000);
    }

    #[test]
    fn test_malformed_codes_rejected() {
        assert!(!is_well_formed(""));
        assert!(!is_well_formed("short"));
        assert!(!is_well_formed("ABCDEFGHJK1")); // too long
        assert!(!is_well_formed("ABCDEFGH0K")); // ambiguous zero
        assert!(!is_well_formed("ABCD/../HK"));
        assert!(is_well_formed("ABCDEFGHJK"));
    }
}

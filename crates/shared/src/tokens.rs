//! Booking reference and single-use token generation.

use rand::Rng;
use uuid::Uuid;

/// Alphabet for booking references. Excludes 0/O, 1/I/L to avoid
/// transcription errors over the phone.
const REFERENCE_ALPHABET: &[u8] = b"ABCDEFGHJKMNPQRSTUVWXYZ23456789";

/// Length of the random portion of a booking reference.
const REFERENCE_LEN: usize = 6;

/// Generates a short human-readable booking reference, e.g. `TB-K7M2QX`.
///
/// References are for humans; uniqueness is enforced by the database index,
/// callers retry on collision.
pub fn generate_booking_reference() -> String {
    let mut rng = rand::thread_rng();
    let code: String = (0..REFERENCE_LEN)
        .map(|_| {
            let idx = rng.gen_range(0..REFERENCE_ALPHABET.len());
            REFERENCE_ALPHABET[idx] as char
        })
        .collect();
    format!("TB-{}", code)
}

/// Generates an unguessable single-use token (cancellation/reconfirmation).
///
/// Tokens are UUIDv4 and cryptographically unrelated to the booking id; they
/// are only ever resolved through a keyed lookup.
pub fn generate_action_token() -> Uuid {
    Uuid::new_v4()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_reference_format() {
        let reference = generate_booking_reference();
        assert!(reference.starts_with("TB-"));
        assert_eq!(reference.len(), 3 + REFERENCE_LEN);
    }

    #[test]
    fn test_reference_excludes_ambiguous_characters() {
        for _ in 0..200 {
            let reference = generate_booking_reference();
            for c in reference[3..].chars() {
                assert!(!"0O1IL".contains(c), "ambiguous char {} in {}", c, reference);
            }
        }
    }

    #[test]
    fn test_references_are_not_constant() {
        let refs: HashSet<String> = (0..50).map(|_| generate_booking_reference()).collect();
        assert!(refs.len() > 1);
    }

    #[test]
    fn test_action_tokens_are_unique() {
        let a = generate_action_token();
        let b = generate_action_token();
        assert_ne!(a, b);
    }
}

//! CSRF state tokens for the authorization redirect

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use rand::RngCore;

/// Generate an opaque state token.
///
/// 32 random bytes, URL-safe base64 without padding (43 characters).
#[must_use]
pub fn generate_state() -> String {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Compare the issued state with the one returned on callback in constant
/// time.
#[must_use]
pub fn validate_state(expected: &str, actual: &str) -> bool {
    let (expected, actual) = (expected.as_bytes(), actual.as_bytes());
    if expected.len() != actual.len() {
        return false;
    }
    expected.iter().zip(actual).fold(0u8, |acc, (a, b)| acc | (a ^ b)) == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_is_url_safe_and_unpadded() {
        let state = generate_state();

        assert_eq!(state.len(), 43);
        assert!(!state.contains('='));
        assert!(!state.contains('+'));
        assert!(!state.contains('/'));
    }

    #[test]
    fn test_states_are_unique() {
        assert_ne!(generate_state(), generate_state());
    }

    #[test]
    fn test_validate_state() {
        let state = generate_state();
        assert!(validate_state(&state, &state));
        assert!(!validate_state(&state, "forged"));
        assert!(!validate_state("", "x"));
    }
}

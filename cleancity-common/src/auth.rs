//! Admin token verification
//!
//! Pure functions only; the HTTP middleware lives in the service crate.
//! Tokens are compared as SHA-256 digests so the comparison time does not
//! depend on how many leading bytes of the raw token match.

use sha2::{Digest, Sha256};

/// Check a presented token against the configured one
///
/// `expected = None` means admin auth is disabled and every request passes.
pub fn admin_token_matches(provided: Option<&str>, expected: Option<&str>) -> bool {
    let Some(expected) = expected else {
        return true;
    };
    let Some(provided) = provided else {
        return false;
    };

    let a = Sha256::digest(provided.as_bytes());
    let b = Sha256::digest(expected.as_bytes());
    a.iter().zip(b.iter()).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

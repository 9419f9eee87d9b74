//! Integrity digest protecting a JKS container.
//!
//! The trailer is `SHA-1(UTF-16BE(token) || "Mighty Aphrodite" || body)`.
//! The token is not a secret; it only detects corruption and mismatched
//! stores.

use sha1::{Digest, Sha1};

/// Length of the trailing SHA-1 digest.
pub(crate) const DIGEST_LEN: usize = 20;

const WHITENER: &[u8] = b"Mighty Aphrodite";

pub(crate) fn integrity_digest(access_token: &str, body: &[u8]) -> [u8; DIGEST_LEN] {
    let mut hasher = Sha1::new();
    for unit in access_token.encode_utf16() {
        hasher.update(unit.to_be_bytes());
    }
    hasher.update(WHITENER);
    hasher.update(body);
    let mut digest = [0_u8; DIGEST_LEN];
    digest.copy_from_slice(&hasher.finalize());
    digest
}

/// Compare two digests without short-circuiting on the first difference.
pub(crate) fn digests_match(expected: &[u8; DIGEST_LEN], found: &[u8]) -> bool {
    found.len() == DIGEST_LEN
        && expected
            .iter()
            .zip(found)
            .fold(0_u8, |acc, (left, right)| acc | (left ^ right))
            == 0
}

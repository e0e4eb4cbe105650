//! Legacy NT hash generation.
//!
//! Windows stores the credential as an unsalted MD4 digest over the
//! password's 2-byte-per-character encoding. The encoding here narrows each
//! Unicode code point to its low 16 bits rather than producing surrogate
//! pairs; that mirrors the legacy on-wire format and consuming systems
//! depend on it bit-for-bit.

use md4::{Digest, Md4};
use tracing::instrument;

/// Maximum password length in characters before hashing; excess is
/// discarded. Windows historically allowed 14, the format reserves up to
/// 256 UCS-2 characters.
pub const MAX_PASSWORD_CHARS: usize = 256;

const HASH_LEN: usize = 16;

/// Narrow a password to the legacy 2-byte-per-character little-endian
/// buffer, capped at [`MAX_PASSWORD_CHARS`] characters.
fn ucs2le_bytes(password: &str) -> Vec<u8> {
    let mut buf = Vec::with_capacity(password.len() * 2);
    for c in password.chars().take(MAX_PASSWORD_CHARS) {
        // Low 16 bits only; supplementary-plane characters truncate.
        let unit = c as u32 as u16;
        buf.extend_from_slice(&unit.to_le_bytes());
    }
    buf
}

/// Compute the NT hash of a password as 32 lowercase hex characters.
///
/// Total and side-effect-free: it never fails for well-formed input, and a
/// fixed input always yields the same output.
#[must_use]
#[instrument(skip(password))]
pub fn nt_hash(password: &str) -> String {
    let digest = Md4::digest(ucs2le_bytes(password));
    debug_assert_eq!(digest.len(), HASH_LEN);
    hex::encode(digest)
}

//! Short code generation.
//!
//! Codes are 6 characters drawn from a 64-symbol URL-safe alphabet,
//! sampled from the thread-local CSPRNG so they are unpredictable.
//! Collisions are astronomically unlikely at this length but still
//! possible, so [`ensure_unique`] re-rolls against the store until an
//! unused code is found. The store's UNIQUE constraint remains the
//! authoritative guard against races between concurrent creations.

use anyhow::Result;
use rand::{rng, RngExt};

use crate::storage::Storage;

const ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789_-";

pub const CODE_LENGTH: usize = 6;

/// Generate one random short code.
pub fn generate() -> String {
    let mut rng = rng();
    (0..CODE_LENGTH)
        .map(|_| ALPHABET[rng.random_range(0..ALPHABET.len())] as char)
        .collect()
}

/// Generate a short code not currently present in the store.
///
/// Loops without an attempt cap: at 64^6 possible codes a retry is
/// vanishingly rare, and capping the loop would trade correctness for
/// nothing. Store errors propagate.
pub async fn ensure_unique(storage: &dyn Storage) -> Result<String> {
    loop {
        let code = generate();
        if !storage.code_exists(&code).await? {
            return Ok(code);
        }
    }
}

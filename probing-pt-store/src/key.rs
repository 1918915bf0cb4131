//! Source-phrase key derivation.
//!
//! Every lookup goes through a single 64-bit [`PhraseKey`]. The default
//! scheme, [`ShiftFold`], is the one existing stores were built with:
//!
//! ```text
//! key = Σ token[i] << i      (wrapping u64, shift count taken mod 64)
//! ```
//!
//! It is cheap but mixes poorly. Distinct phrases can share a key:
//!
//! - within 64 tokens, small IDs alias each other (`[2, 0]` and `[0, 1]`
//!   both give `2`);
//! - from position 64 on the shift count wraps to 0, so a token at position
//!   64 lands on the same bits as one at position 0.
//!
//! The table stores only the key, so a collision means two phrases would
//! share one record. [`crate::StoreWriter`] refuses to write such a store.
//! New stores may use [`Xxh3Fold`] instead; reader and writer must agree.

/// Fixed-width key for one source phrase.
pub type PhraseKey = u64;

/// Maps a source token-ID sequence to a [`PhraseKey`].
pub trait KeyDerivation: Send + Sync {
    fn derive_key(&self, token_ids: &[u64]) -> PhraseKey;
}

/// Positional shift-and-add fold. Format-compatible default.
#[derive(Debug, Clone, Copy, Default)]
pub struct ShiftFold;

impl KeyDerivation for ShiftFold {
    #[inline]
    fn derive_key(&self, token_ids: &[u64]) -> PhraseKey {
        derive_key(token_ids)
    }
}

/// xxh3 over the little-endian token bytes. Not compatible with
/// [`ShiftFold`] stores.
#[derive(Debug, Clone, Copy, Default)]
pub struct Xxh3Fold;

impl KeyDerivation for Xxh3Fold {
    fn derive_key(&self, token_ids: &[u64]) -> PhraseKey {
        let mut hasher = xxhash_rust::xxh3::Xxh3::new();
        for id in token_ids {
            hasher.update(&id.to_le_bytes());
        }
        hasher.digest()
    }
}

/// The [`ShiftFold`] key of `token_ids`.
#[inline]
pub fn derive_key(token_ids: &[u64]) -> PhraseKey {
    token_ids
        .iter()
        .enumerate()
        .fold(0u64, |key, (i, &id)| key.wrapping_add(id.wrapping_shl(i as u32)))
}

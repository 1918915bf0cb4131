//! Shared helpers for building throwaway stores.

#![allow(dead_code)]

use probing_pt_store::{Candidate, StoreWriter};
use std::path::Path;
use tempfile::TempDir;

/// A candidate with deterministic content derived from `seed`.
pub fn candidate(seed: u32, num_scores: usize, num_lex_scores: usize) -> Candidate {
    let target_len = (seed % 4 + 1) as usize;
    Candidate {
        target_phrase: (0..target_len as u32).map(|i| seed * 10 + i).collect(),
        scores: (0..num_scores).map(|i| -(seed as f32) - i as f32 * 0.25).collect(),
        lex_scores: (0..num_lex_scores).map(|i| i as f32 * 0.5).collect(),
        alignment: (0..target_len as u8).flat_map(|i| [0, i]).collect(),
    }
}

/// Write a store with `phrases` and return its temp dir.
pub fn build_store(
    num_scores: usize,
    num_lex_scores: usize,
    phrases: &[(Vec<u64>, Vec<Candidate>)],
) -> TempDir {
    let dir = TempDir::new().unwrap();
    write_store(dir.path(), num_scores, num_lex_scores, phrases);
    dir
}

pub fn write_store(
    dir: &Path,
    num_scores: usize,
    num_lex_scores: usize,
    phrases: &[(Vec<u64>, Vec<Candidate>)],
) {
    let mut writer = StoreWriter::new(num_scores, num_lex_scores, true);
    for (tokens, candidates) in phrases {
        writer.add_phrase(tokens, candidates.clone()).unwrap();
    }
    writer.finish(dir).unwrap();
}

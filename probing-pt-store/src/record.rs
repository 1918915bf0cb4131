//! Candidate records: the payload byte format.
//!
//! A record is one or more candidates packed back to back. Each candidate is
//! self-delimiting, so the record length from the hash slot is the only
//! framing needed.
//!
//! ## Candidate layout (little-endian)
//!
//! ```text
//! target_len: u16                      number of target token IDs
//! target:     [u32; target_len]
//! scores:     [f32; num_scores]
//! lex_scores: [f32; num_lex_scores]
//! align_len:  u16                      number of alignment elements (even)
//! alignment:  [u8; align_len]          (source_pos, target_pos) pairs
//! ```
//!
//! `num_scores` and `num_lex_scores` come from the store config and are not
//! repeated per candidate.

use crate::error::{Result, StoreError};
use crate::recycler::Recycler;
use serde::Serialize;

/// One translation option for a source phrase.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Candidate {
    /// Target-vocabulary IDs of the target phrase.
    pub target_phrase: Vec<u32>,
    /// Translation-model scores, `num_scores` long.
    pub scores: Vec<f32>,
    /// Lexical-reordering scores, `num_lex_scores` long.
    pub lex_scores: Vec<f32>,
    /// Flat alignment: element `2k` is a source position, `2k + 1` the
    /// target position it aligns to.
    pub alignment: Vec<u8>,
}

impl Candidate {
    /// Alignment as `(source_pos, target_pos)` pairs.
    pub fn alignment_pairs(&self) -> impl Iterator<Item = (u8, u8)> + '_ {
        self.alignment.chunks_exact(2).map(|p| (p[0], p[1]))
    }

    /// Clear all fields, keeping allocations.
    pub(crate) fn clear(&mut self) {
        self.target_phrase.clear();
        self.scores.clear();
        self.lex_scores.clear();
        self.alignment.clear();
    }

    /// Encoded size in bytes.
    pub fn encoded_len(&self) -> usize {
        2 + self.target_phrase.len() * 4
            + (self.scores.len() + self.lex_scores.len()) * 4
            + 2
            + self.alignment.len()
    }
}

/// Append the encoding of `candidate` to `out`.
///
/// Fails if a length does not fit its `u16` prefix or the alignment has an
/// odd element count. Score-vector lengths are checked by the writer, which
/// knows the store-wide counts.
pub fn encode_candidate(candidate: &Candidate, out: &mut Vec<u8>) -> Result<()> {
    let target_len = u16::try_from(candidate.target_phrase.len()).map_err(|_| {
        StoreError::InvalidInput(format!(
            "target phrase has {} tokens (max {})",
            candidate.target_phrase.len(),
            u16::MAX
        ))
    })?;
    let align_len = u16::try_from(candidate.alignment.len()).map_err(|_| {
        StoreError::InvalidInput(format!(
            "alignment has {} elements (max {})",
            candidate.alignment.len(),
            u16::MAX
        ))
    })?;
    if align_len % 2 != 0 {
        return Err(StoreError::InvalidInput(format!(
            "alignment has odd element count {align_len}"
        )));
    }

    out.reserve(candidate.encoded_len());
    out.extend_from_slice(&target_len.to_le_bytes());
    for id in &candidate.target_phrase {
        out.extend_from_slice(&id.to_le_bytes());
    }
    for s in candidate.scores.iter().chain(&candidate.lex_scores) {
        out.extend_from_slice(&s.to_le_bytes());
    }
    out.extend_from_slice(&align_len.to_le_bytes());
    out.extend_from_slice(&candidate.alignment);
    Ok(())
}

/// Cursor over one record. Every read is bounds-checked.
struct RecordReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> RecordReader<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    fn take(&mut self, n: usize, what: &str) -> Result<&'a [u8]> {
        if n > self.remaining() {
            return Err(StoreError::corrupt(format!(
                "record truncated reading {what}: need {n} bytes at {}, record len {}",
                self.pos,
                self.data.len()
            )));
        }
        let bytes = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(bytes)
    }

    fn u16(&mut self, what: &str) -> Result<u16> {
        let b = self.take(2, what)?;
        Ok(u16::from_le_bytes([b[0], b[1]]))
    }

    /// Byte length of `count` four-byte fields.
    fn words(&self, count: usize, what: &str) -> Result<usize> {
        count.checked_mul(4).ok_or_else(|| {
            StoreError::corrupt(format!("{what}: {count} fields overflow the record length"))
        })
    }

    fn u32_into(&mut self, count: usize, out: &mut Vec<u32>, what: &str) -> Result<()> {
        let len = self.words(count, what)?;
        let bytes = self.take(len, what)?;
        out.extend(
            bytes
                .chunks_exact(4)
                .map(|c| u32::from_le_bytes([c[0], c[1], c[2], c[3]])),
        );
        Ok(())
    }

    fn f32_into(&mut self, count: usize, out: &mut Vec<f32>, what: &str) -> Result<()> {
        let len = self.words(count, what)?;
        let bytes = self.take(len, what)?;
        out.extend(
            bytes
                .chunks_exact(4)
                .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]])),
        );
        Ok(())
    }

    fn read_candidate(
        &mut self,
        num_scores: usize,
        num_lex_scores: usize,
        candidate: &mut Candidate,
    ) -> Result<()> {
        let target_len = self.u16("target length")? as usize;
        self.u32_into(target_len, &mut candidate.target_phrase, "target phrase")?;
        self.f32_into(num_scores, &mut candidate.scores, "scores")?;
        self.f32_into(num_lex_scores, &mut candidate.lex_scores, "lexical scores")?;
        let align_len = self.u16("alignment length")? as usize;
        if align_len % 2 != 0 {
            return Err(StoreError::corrupt(format!(
                "odd alignment element count {align_len} at record offset {}",
                self.pos - 2
            )));
        }
        candidate
            .alignment
            .extend_from_slice(self.take(align_len, "alignment")?);
        Ok(())
    }
}

/// Decode every candidate in `bytes`.
///
/// Candidate shells and the output vector come from `recycler`. Decoding
/// must consume exactly `bytes.len()`; anything else is `CorruptStore`, in
/// which case everything taken from the recycler is handed back first.
/// Score values are returned as stored.
pub fn decode_record(
    bytes: &[u8],
    num_scores: usize,
    num_lex_scores: usize,
    recycler: &mut Recycler,
) -> Result<Vec<Candidate>> {
    let mut out = recycler.take_list();
    let mut reader = RecordReader::new(bytes);
    while reader.remaining() > 0 {
        let mut candidate = recycler.take_candidate();
        if let Err(e) = reader.read_candidate(num_scores, num_lex_scores, &mut candidate) {
            recycler.give_candidate(candidate);
            recycler.recycle(out);
            return Err(e);
        }
        out.push(candidate);
    }
    Ok(out)
}

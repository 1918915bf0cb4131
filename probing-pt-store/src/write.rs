//! Store writer: builds the `config`, `probing_hash.dat` and `binfile.dat`
//! files that [`crate::QueryEngine`] reads.
//!
//! Phrases are buffered in memory and written in insertion order by
//! [`StoreWriter::finish`]. Records are laid out back to back in the payload;
//! slots are placed with the same home-slot and linear-probe rule the reader
//! uses (see [`crate::table`]).

use crate::config::{
    StoreConfig, CONFIG_FILE, HASH_TABLE_FILE, LOAD_FACTOR, MAX_SCORES, PAYLOAD_FILE,
};
use crate::error::{Result, StoreError};
use crate::key::{KeyDerivation, PhraseKey, ShiftFold};
use crate::record::{encode_candidate, Candidate};
use crate::table::{bucket_count, home_slot, write_slot, SlotValue, EMPTY_KEY, SLOT_SIZE};
use std::collections::HashSet;
use std::io::Write;
use std::path::Path;

/// What [`StoreWriter::finish`] produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuildSummary {
    pub keys: u64,
    pub candidates: u64,
    pub payload_bytes: u64,
    pub buckets: u64,
    /// Longest probe sequence any stored key needs (1 = found at home slot).
    pub max_probe: u64,
}

/// Builder for a new store directory.
pub struct StoreWriter<K = ShiftFold> {
    num_scores: usize,
    num_lex_scores: usize,
    log_prob: bool,
    keys: K,
    /// Encoded records in insertion order.
    records: Vec<(PhraseKey, Vec<u8>, usize)>,
    seen: HashSet<PhraseKey>,
}

impl StoreWriter<ShiftFold> {
    pub fn new(num_scores: usize, num_lex_scores: usize, log_prob: bool) -> Self {
        Self::with_keys(num_scores, num_lex_scores, log_prob, ShiftFold)
    }
}

impl<K: KeyDerivation> StoreWriter<K> {
    /// A writer that derives phrase keys with `keys`. Readers must open the
    /// store with the same scheme.
    pub fn with_keys(num_scores: usize, num_lex_scores: usize, log_prob: bool, keys: K) -> Self {
        Self {
            num_scores,
            num_lex_scores,
            log_prob,
            keys,
            records: Vec::new(),
            seen: HashSet::new(),
        }
    }

    /// Add the candidates for one source phrase.
    ///
    /// Returns the phrase's key. Fails if another phrase already produced
    /// the same key: the table cannot tell two phrases with one key apart.
    pub fn add_phrase(&mut self, token_ids: &[u64], candidates: Vec<Candidate>) -> Result<PhraseKey> {
        let key = self.keys.derive_key(token_ids);
        self.add_key(key, candidates).map_err(|e| match e {
            StoreError::InvalidInput(msg) => {
                StoreError::InvalidInput(format!("phrase {token_ids:?}: {msg}"))
            }
            other => other,
        })?;
        Ok(key)
    }

    /// Add the candidates for a precomputed key.
    pub fn add_key(&mut self, key: PhraseKey, candidates: Vec<Candidate>) -> Result<()> {
        if key == EMPTY_KEY {
            return Err(StoreError::InvalidInput(
                "key 0 is reserved for empty slots".to_string(),
            ));
        }
        if self.seen.contains(&key) {
            return Err(StoreError::InvalidInput(format!(
                "duplicate key {key} (phrase keys collide)"
            )));
        }
        if candidates.is_empty() {
            return Err(StoreError::InvalidInput(format!(
                "key {key} has no candidates"
            )));
        }

        let mut bytes = Vec::with_capacity(candidates.iter().map(Candidate::encoded_len).sum());
        for (i, c) in candidates.iter().enumerate() {
            if c.scores.len() != self.num_scores || c.lex_scores.len() != self.num_lex_scores {
                return Err(StoreError::InvalidInput(format!(
                    "key {key} candidate {i}: expected {}+{} scores, got {}+{}",
                    self.num_scores,
                    self.num_lex_scores,
                    c.scores.len(),
                    c.lex_scores.len()
                )));
            }
            encode_candidate(c, &mut bytes)?;
        }
        if u32::try_from(bytes.len()).is_err() {
            return Err(StoreError::InvalidInput(format!(
                "key {key}: record of {} bytes exceeds u32 length",
                bytes.len()
            )));
        }

        self.seen.insert(key);
        self.records.push((key, bytes, candidates.len()));
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Write the store into `dir`, creating it if needed.
    pub fn finish(self, dir: &Path) -> Result<BuildSummary> {
        let _span = tracing::info_span!("StoreWriter::finish", ?dir).entered();
        if self.num_scores > MAX_SCORES || self.num_lex_scores > MAX_SCORES {
            return Err(StoreError::InvalidInput(format!(
                "score counts {}+{} exceed the limit of {MAX_SCORES}",
                self.num_scores, self.num_lex_scores
            )));
        }
        std::fs::create_dir_all(dir)?;

        let entries = self.records.len() as u64;
        let buckets = bucket_count(entries, LOAD_FACTOR).ok_or_else(|| {
            StoreError::InvalidInput(format!("{entries} keys overflow the bucket count"))
        })?;
        let mut table = vec![0u8; buckets as usize * SLOT_SIZE];
        let mut payload = std::io::BufWriter::new(std::fs::File::create(dir.join(PAYLOAD_FILE))?);

        let mut offset = 0u64;
        let mut candidates = 0u64;
        let mut max_probe = 0u64;
        for (key, bytes, count) in &self.records {
            payload.write_all(bytes)?;
            let value = SlotValue {
                offset,
                length: bytes.len() as u32,
            };
            offset += bytes.len() as u64;
            candidates += *count as u64;

            let mut index = home_slot(*key, buckets);
            let mut probes = 1;
            loop {
                let pos = index as usize * SLOT_SIZE;
                let slot = &mut table[pos..pos + SLOT_SIZE];
                if slot[0..8] == EMPTY_KEY.to_le_bytes() {
                    write_slot(slot, *key, value);
                    break;
                }
                index = (index + 1) % buckets;
                probes += 1;
            }
            max_probe = max_probe.max(probes);
        }
        payload.flush()?;
        std::fs::write(dir.join(HASH_TABLE_FILE), &table)?;

        StoreConfig::new(entries, self.num_scores, self.num_lex_scores, self.log_prob)
            .write(&dir.join(CONFIG_FILE))?;

        let summary = BuildSummary {
            keys: entries,
            candidates,
            payload_bytes: offset,
            buckets,
            max_probe,
        };
        tracing::info!(
            keys = summary.keys,
            candidates = summary.candidates,
            payload_bytes = summary.payload_bytes,
            max_probe = summary.max_probe,
            "wrote phrase table"
        );
        Ok(summary)
    }
}

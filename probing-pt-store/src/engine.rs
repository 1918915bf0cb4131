//! Query engine: opens a store directory and answers phrase lookups.
//!
//! Construction maps both binary files and validates the config; after that
//! the engine is immutable and `Sync`, so any number of threads may query it
//! concurrently without locking. Each thread brings its own [`Recycler`].

use crate::config::{StoreConfig, CONFIG_FILE, HASH_TABLE_FILE, LOAD_FACTOR, PAYLOAD_FILE};
use crate::error::{Result, StoreError};
use crate::key::{KeyDerivation, PhraseKey, ShiftFold};
use crate::payload::PayloadStore;
use crate::record::{decode_record, Candidate};
use crate::recycler::Recycler;
use crate::table::HashSlotTable;
use serde::Serialize;
use std::path::{Path, PathBuf};

// ============================================================================
// QueryResult
// ============================================================================

/// Outcome of one lookup.
///
/// `found == false` always comes with an empty `candidates`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryResult {
    pub found: bool,
    pub candidates: Vec<Candidate>,
}

impl QueryResult {
    pub fn not_found() -> Self {
        Self::default()
    }

    /// Hand the candidate buffers back to `recycler`.
    pub fn recycle_into(self, recycler: &mut Recycler) {
        recycler.recycle(self.candidates);
    }
}

/// Summary of a full-store consistency scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct VerifyReport {
    /// Occupied slots found in the table.
    pub slots: u64,
    /// Candidates decoded across all records.
    pub candidates: u64,
    /// Sum of record lengths referenced by the table.
    pub referenced_bytes: u64,
    /// Size of the payload file.
    pub payload_bytes: u64,
}

// ============================================================================
// QueryEngine
// ============================================================================

/// Read-only lookup engine over one store directory.
pub struct QueryEngine<K = ShiftFold> {
    dir: PathBuf,
    config: StoreConfig,
    table: HashSlotTable,
    payload: PayloadStore,
    keys: K,
}

impl QueryEngine<ShiftFold> {
    /// Open a store built with the default [`ShiftFold`] key scheme.
    pub fn open(dir: &Path) -> Result<Self> {
        Self::open_with(dir, ShiftFold)
    }
}

impl<K: KeyDerivation> QueryEngine<K> {
    /// Open a store whose keys were derived with `keys`.
    ///
    /// Fails with `IncompatibleFormat` before touching the binary files if
    /// the config's API version differs from [`crate::API_VERSION`].
    pub fn open_with(dir: &Path, keys: K) -> Result<Self> {
        let _span = tracing::info_span!("QueryEngine::open", ?dir).entered();

        let config = StoreConfig::read(&dir.join(CONFIG_FILE))?;
        if let Err(e) = config.check_version() {
            tracing::error!(
                found = config.api_version,
                "store API version mismatch, rebuild the phrase table"
            );
            return Err(e);
        }

        let payload = PayloadStore::open_stat(&dir.join(PAYLOAD_FILE))?;
        let table = HashSlotTable::open(
            &dir.join(HASH_TABLE_FILE),
            config.table_size,
            LOAD_FACTOR,
        )?;

        tracing::info!(
            entries = table.len(),
            buckets = table.bucket_count(),
            payload_bytes = payload.len(),
            num_scores = config.num_scores,
            num_lex_scores = config.num_lex_scores,
            log_prob = config.log_prob,
            "opened phrase table"
        );

        Ok(Self {
            dir: dir.to_path_buf(),
            config,
            table,
            payload,
            keys,
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    pub fn table(&self) -> &HashSlotTable {
        &self.table
    }

    pub fn payload_len(&self) -> u64 {
        self.payload.len()
    }

    /// Key this engine derives for `token_ids`.
    #[inline]
    pub fn key_for(&self, token_ids: &[u64]) -> PhraseKey {
        self.keys.derive_key(token_ids)
    }

    /// Look up a source phrase given as source-vocabulary IDs.
    pub fn query(&self, token_ids: &[u64], recycler: &mut Recycler) -> Result<QueryResult> {
        self.query_key(self.key_for(token_ids), recycler)
    }

    /// Look up a precomputed key.
    ///
    /// A missing key is `Ok` with `found == false`. A slot pointing outside
    /// the payload, or a malformed record, is `CorruptStore` for this call
    /// only; the engine stays usable.
    pub fn query_key(&self, key: PhraseKey, recycler: &mut Recycler) -> Result<QueryResult> {
        let Some(slot) = self.table.find(key)? else {
            tracing::trace!(key, "phrase not found");
            return Ok(QueryResult::not_found());
        };

        let candidates = self
            .payload
            .read(slot.offset, slot.length)
            .and_then(|bytes| {
                decode_record(
                    bytes,
                    self.config.num_scores,
                    self.config.num_lex_scores,
                    recycler,
                )
            })
            .map_err(|e| {
                tracing::warn!(
                    key,
                    offset = slot.offset,
                    length = slot.length,
                    error = %e,
                    "corrupt record"
                );
                e
            })?;

        tracing::trace!(key, candidates = candidates.len(), "phrase found");
        Ok(QueryResult {
            found: true,
            candidates,
        })
    }

    /// Keys of every occupied slot, in table order.
    pub fn keys(&self) -> impl Iterator<Item = PhraseKey> + '_ {
        self.table.occupied().map(|(key, _)| key)
    }

    /// Check every occupied slot: the key must be reachable by probing, its
    /// range must lie inside the payload, and the record must decode.
    ///
    /// Also checks the occupied-slot count against the config's table size.
    pub fn verify(&self) -> Result<VerifyReport> {
        let _span = tracing::info_span!("QueryEngine::verify", dir = ?self.dir).entered();
        let mut recycler = Recycler::new();
        let mut report = VerifyReport {
            slots: 0,
            candidates: 0,
            referenced_bytes: 0,
            payload_bytes: self.payload.len(),
        };

        for (key, slot) in self.table.occupied() {
            match self.table.find(key)? {
                Some(found) if found == slot => {}
                _ => {
                    return Err(StoreError::corrupt(format!(
                        "key {key} is stored but not reachable by probing"
                    )))
                }
            }
            let bytes = self.payload.read(slot.offset, slot.length)?;
            let candidates = decode_record(
                bytes,
                self.config.num_scores,
                self.config.num_lex_scores,
                &mut recycler,
            )
            .map_err(|e| StoreError::corrupt(format!("key {key}: {e}")))?;

            report.slots += 1;
            report.candidates += candidates.len() as u64;
            report.referenced_bytes += slot.length as u64;
            recycler.recycle(candidates);
        }

        if report.slots != self.config.table_size {
            return Err(StoreError::corrupt(format!(
                "config declares {} keys but table holds {}",
                self.config.table_size, report.slots
            )));
        }

        tracing::info!(
            slots = report.slots,
            candidates = report.candidates,
            "store verified"
        );
        Ok(report)
    }
}

impl<K> std::fmt::Debug for QueryEngine<K> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryEngine")
            .field("dir", &self.dir)
            .field("config", &self.config)
            .field("buckets", &self.table.bucket_count())
            .field("payload_bytes", &self.payload.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::write::StoreWriter;
    use tempfile::TempDir;

    fn cand(target: &[u32], scores: [f32; 4]) -> Candidate {
        Candidate {
            target_phrase: target.to_vec(),
            scores: scores.to_vec(),
            lex_scores: Vec::new(),
            alignment: vec![0, 0],
        }
    }

    #[test]
    fn engine_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<QueryEngine>();
        assert_send_sync::<QueryEngine<crate::key::Xxh3Fold>>();
    }

    #[test]
    fn query_by_tokens_and_key_agree() {
        let dir = TempDir::new().unwrap();
        let mut writer = StoreWriter::new(4, 0, true);
        writer
            .add_phrase(&[3, 4], vec![cand(&[7, 8], [-1.0, -2.0, -3.0, -4.0])])
            .unwrap();
        writer.finish(dir.path()).unwrap();

        let engine = QueryEngine::open(dir.path()).unwrap();
        let mut recycler = Recycler::new();
        let by_tokens = engine.query(&[3, 4], &mut recycler).unwrap();
        let by_key = engine
            .query_key(engine.key_for(&[3, 4]), &mut recycler)
            .unwrap();
        assert!(by_tokens.found);
        assert_eq!(by_tokens, by_key);
        assert_eq!(by_tokens.candidates[0].target_phrase, vec![7, 8]);
    }

    #[test]
    fn verify_counts_everything() {
        let dir = TempDir::new().unwrap();
        let mut writer = StoreWriter::new(4, 0, false);
        for i in 1..=20u64 {
            let candidates = (0..(i % 3 + 1))
                .map(|j| cand(&[j as u32], [0.0; 4]))
                .collect();
            writer.add_phrase(&[i, i + 1], candidates).unwrap();
        }
        let summary = writer.finish(dir.path()).unwrap();

        let engine = QueryEngine::open(dir.path()).unwrap();
        let report = engine.verify().unwrap();
        assert_eq!(report.slots, 20);
        assert_eq!(report.candidates, summary.candidates);
        assert_eq!(report.referenced_bytes, report.payload_bytes);
        assert_eq!(engine.keys().count(), 20);
    }
}

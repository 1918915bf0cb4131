//! Read-only, memory-mapped phrase-table store for a phrase-based decoder.
//!
//! A store is a directory holding three files produced offline:
//!
//! - `config`: five decimal lines (API version, table size, score counts, log flag)
//! - `probing_hash.dat`: an open-addressing slot array, key → (offset, length)
//! - `binfile.dat`: the payload, packed candidate records
//!
//! [`QueryEngine`] maps both binary files once and answers lookups by source
//! phrase (a sequence of vocabulary IDs) or by precomputed [`PhraseKey`].
//! Lookups never mutate the store, so a single engine can be shared across
//! worker threads; each worker owns its own [`Recycler`].

pub mod config;
pub mod display;
pub mod engine;
pub mod error;
pub mod key;
pub mod payload;
pub mod record;
pub mod recycler;
pub mod table;
pub mod vocab;
pub mod write;

// ── Query side ───────────────────────────────────────────────────────────────
pub use engine::{QueryEngine, QueryResult, VerifyReport};
pub use recycler::Recycler;

// ── Format ───────────────────────────────────────────────────────────────────
pub use config::{StoreConfig, API_VERSION, LOAD_FACTOR};
pub use key::{derive_key, KeyDerivation, PhraseKey, ShiftFold, Xxh3Fold};
pub use payload::PayloadStore;
pub use record::{decode_record, encode_candidate, Candidate};
pub use table::{table_size_bytes, HashSlotTable, SlotValue};

// ── Tooling ──────────────────────────────────────────────────────────────────
pub use display::CandidateList;
pub use vocab::Vocab;
pub use write::{BuildSummary, StoreWriter};

pub use error::{Result, StoreError};

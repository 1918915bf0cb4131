//! Store configuration: the `config` file and format-wide constants.
//!
//! ## Format
//!
//! ```text
//! <api_version>\n
//! <table_size>\n      number of distinct keys stored in the hash table
//! <num_scores>\n
//! <num_lex_scores>\n
//! <log_prob>\n        0 or 1: scores were log()'d and floored at build time
//! ```
//!
//! The payload size is not recorded here; it is taken from the filesystem.

use crate::error::{Result, StoreError};
use serde::Serialize;
use std::io::Write;
use std::path::Path;

/// API version this engine reads. Stores written by any other version must
/// be rebuilt.
pub const API_VERSION: u32 = 15;

/// Bucket multiplier applied to the key count when sizing the slot array.
///
/// Part of the on-disk format: reader and writer must use the same value.
pub const LOAD_FACTOR: f32 = 1.2;

/// Upper bound on `num_scores` and `num_lex_scores`.
pub const MAX_SCORES: usize = u16::MAX as usize;

/// Store config file name.
pub const CONFIG_FILE: &str = "config";
/// Hash slot table file name.
pub const HASH_TABLE_FILE: &str = "probing_hash.dat";
/// Payload file name.
pub const PAYLOAD_FILE: &str = "binfile.dat";
/// Source vocabulary (token ↔ ID), produced alongside the store.
pub const SOURCE_VOCAB_FILE: &str = "source_vocabids";
/// Target vocabulary, optional; used only for display.
pub const TARGET_VOCAB_FILE: &str = "target_vocabids";

/// Parsed contents of a store's `config` file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StoreConfig {
    pub api_version: u32,
    /// Number of distinct keys in the hash table.
    pub table_size: u64,
    pub num_scores: usize,
    pub num_lex_scores: usize,
    /// Scores are stored already log-transformed and floored.
    pub log_prob: bool,
}

impl StoreConfig {
    pub fn new(table_size: u64, num_scores: usize, num_lex_scores: usize, log_prob: bool) -> Self {
        Self {
            api_version: API_VERSION,
            table_size,
            num_scores,
            num_lex_scores,
            log_prob,
        }
    }

    /// Parse config text. Trailing lines beyond the fifth are ignored.
    pub fn parse(text: &str) -> Result<Self> {
        let mut lines = text.lines().map(str::trim);
        let mut next = |name: &str| -> Result<u64> {
            let line = lines
                .next()
                .ok_or_else(|| StoreError::InvalidConfig(format!("missing {name}")))?;
            line.parse::<u64>().map_err(|e| {
                StoreError::InvalidConfig(format!("{name}: {line:?} is not a number ({e})"))
            })
        };

        let api_version = next("api version")?;
        let table_size = next("table size")?;
        let num_scores = next("num_scores")?;
        let num_lex_scores = next("num_lex_scores")?;
        let log_prob = match next("log flag")? {
            0 => false,
            1 => true,
            other => {
                return Err(StoreError::InvalidConfig(format!(
                    "log flag must be 0 or 1, found {other}"
                )))
            }
        };

        for (name, count) in [("num_scores", num_scores), ("num_lex_scores", num_lex_scores)] {
            if count > MAX_SCORES as u64 {
                return Err(StoreError::InvalidConfig(format!(
                    "{name} {count} exceeds the limit of {MAX_SCORES}"
                )));
            }
        }

        let api_version = u32::try_from(api_version)
            .map_err(|_| StoreError::InvalidConfig(format!("api version {api_version} out of range")))?;

        Ok(Self {
            api_version,
            table_size,
            num_scores: num_scores as usize,
            num_lex_scores: num_lex_scores as usize,
            log_prob,
        })
    }

    /// Read and parse a `config` file.
    pub fn read(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::parse(&text)
    }

    /// Fail with `IncompatibleFormat` unless the store matches [`API_VERSION`].
    pub fn check_version(&self) -> Result<()> {
        if self.api_version != API_VERSION {
            return Err(StoreError::IncompatibleFormat {
                found: self.api_version,
                expected: API_VERSION,
            });
        }
        Ok(())
    }

    /// Write the config in the five-line format.
    pub fn write(&self, path: &Path) -> Result<()> {
        let mut file = std::io::BufWriter::new(std::fs::File::create(path)?);
        writeln!(file, "{}", self.api_version)?;
        writeln!(file, "{}", self.table_size)?;
        writeln!(file, "{}", self.num_scores)?;
        writeln!(file, "{}", self.num_lex_scores)?;
        writeln!(file, "{}", self.log_prob as u8)?;
        file.flush()?;
        Ok(())
    }
}

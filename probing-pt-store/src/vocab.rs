//! Vocabulary files: token ↔ ID maps shipped next to a store.
//!
//! The engine itself only ever sees IDs. These maps exist so tooling can
//! turn a textual source phrase into IDs and print target phrases as words.
//!
//! ## Format
//!
//! ```text
//! <id>\t<token>\n     one entry per line, ids are u64, tokens are UTF-8
//! ```
//!
//! Blank lines are skipped. IDs need not be dense or ordered.

use crate::error::{Result, StoreError};
use std::collections::HashMap;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;

/// Bidirectional token ↔ u64 dictionary.
///
/// Forward (id → token) and reverse (token → id) are both HashMap lookups;
/// the token text is an `Arc<str>` shared between the two.
#[derive(Debug, Default, Clone)]
pub struct Vocab {
    by_id: HashMap<u64, Arc<str>>,
    by_token: HashMap<Arc<str>, u64>,
}

impl Vocab {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `token` with `id`. Re-inserting an existing pair is a no-op;
    /// a conflicting pair is rejected.
    pub fn insert(&mut self, id: u64, token: &str) -> Result<()> {
        if let Some(existing) = self.by_id.get(&id) {
            if &**existing == token {
                return Ok(());
            }
            return Err(StoreError::InvalidInput(format!(
                "vocab id {id} maps to both {existing:?} and {token:?}"
            )));
        }
        if let Some(&other) = self.by_token.get(token) {
            return Err(StoreError::InvalidInput(format!(
                "vocab token {token:?} has ids {other} and {id}"
            )));
        }
        let token: Arc<str> = Arc::from(token);
        self.by_id.insert(id, Arc::clone(&token));
        self.by_token.insert(token, id);
        Ok(())
    }

    /// Token for `id`.
    pub fn resolve(&self, id: u64) -> Option<&str> {
        self.by_id.get(&id).map(|t| &**t)
    }

    /// ID for `token`.
    pub fn find(&self, token: &str) -> Option<u64> {
        self.by_token.get(token).copied()
    }

    /// IDs for every token of a phrase, or the first unknown token.
    pub fn phrase_ids<'a, I>(&self, tokens: I) -> std::result::Result<Vec<u64>, &'a str>
    where
        I: IntoIterator<Item = &'a str>,
    {
        tokens
            .into_iter()
            .map(|t| self.find(t).ok_or(t))
            .collect()
    }

    /// Render target IDs as space-separated words; unknown IDs print as `<id>`.
    pub fn render(&self, ids: &[u32]) -> String {
        let mut out = String::new();
        for (i, &id) in ids.iter().enumerate() {
            if i > 0 {
                out.push(' ');
            }
            match self.resolve(id as u64) {
                Some(word) => out.push_str(word),
                None => {
                    out.push('<');
                    out.push_str(&id.to_string());
                    out.push('>');
                }
            }
        }
        out
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }

    /// Iterator over `(id, token)` pairs in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = (u64, &str)> {
        self.by_id.iter().map(|(&id, t)| (id, &**t))
    }

    /// Parse vocabulary text.
    pub fn parse(text: &str) -> Result<Self> {
        let mut vocab = Vocab::new();
        for (line_no, line) in text.lines().enumerate() {
            let line = line.trim_end_matches('\r');
            if line.is_empty() {
                continue;
            }
            let (id, token) = line.split_once('\t').ok_or_else(|| {
                StoreError::InvalidInput(format!("vocab line {}: missing tab", line_no + 1))
            })?;
            let id: u64 = id.trim().parse().map_err(|e| {
                StoreError::InvalidInput(format!("vocab line {}: bad id {id:?}: {e}", line_no + 1))
            })?;
            vocab.insert(id, token)?;
        }
        Ok(vocab)
    }

    /// Read a vocabulary file.
    pub fn read(path: &Path) -> Result<Self> {
        let vocab = Self::parse(&std::fs::read_to_string(path)?)?;
        tracing::debug!(entries = vocab.len(), ?path, "loaded vocabulary");
        Ok(vocab)
    }

    /// Read a vocabulary file if it exists.
    pub fn read_optional(path: &Path) -> Result<Option<Self>> {
        if path.exists() {
            Self::read(path).map(Some)
        } else {
            Ok(None)
        }
    }

    /// Write in the `id\ttoken` format, sorted by id.
    pub fn write(&self, path: &Path) -> Result<()> {
        let mut entries: Vec<_> = self.iter().collect();
        entries.sort_unstable_by_key(|&(id, _)| id);
        let mut file = std::io::BufWriter::new(std::fs::File::create(path)?);
        for (id, token) in entries {
            writeln!(file, "{id}\t{token}")?;
        }
        file.flush()?;
        Ok(())
    }
}

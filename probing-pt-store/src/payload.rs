//! Payload store: the memory-mapped `binfile.dat`.
//!
//! Concatenated candidate records with no framing of their own; the hash
//! slot table supplies `(offset, length)` for each key.

use crate::error::{Result, StoreError};
use memmap2::Mmap;
use std::fs::File;
use std::path::Path;

/// Read-only view over the payload file.
pub struct PayloadStore {
    /// `None` for an empty payload file (nothing to map).
    mmap: Option<Mmap>,
}

impl PayloadStore {
    /// Map `path` read-only.
    ///
    /// `expected_size` is the size the caller took from the filesystem when
    /// the store was opened; a mapping of any other length is rejected.
    pub fn open(path: &Path, expected_size: u64) -> Result<Self> {
        let file = File::open(path)?;
        let mmap = if file.metadata()?.len() == 0 {
            None
        } else {
            // SAFETY: the store is immutable after build; nothing writes the
            // file while it is mapped.
            Some(unsafe { Mmap::map(&file)? })
        };
        let actual = mmap.as_ref().map_or(0, |m| m.len() as u64);
        if actual != expected_size {
            return Err(StoreError::SizeMismatch {
                what: "payload",
                expected: expected_size,
                actual,
            });
        }
        tracing::debug!(bytes = actual, ?path, "mapped payload");
        Ok(Self { mmap })
    }

    /// Map `path` using its current filesystem size.
    pub fn open_stat(path: &Path) -> Result<Self> {
        let size = std::fs::metadata(path)?.len();
        Self::open(path, size)
    }

    #[inline]
    pub fn bytes(&self) -> &[u8] {
        self.mmap.as_deref().unwrap_or(&[])
    }

    pub fn len(&self) -> u64 {
        self.bytes().len() as u64
    }

    pub fn is_empty(&self) -> bool {
        self.bytes().is_empty()
    }

    /// Borrow `length` bytes starting at `offset`.
    ///
    /// Returns `CorruptStore` if the range is not fully inside the mapping.
    #[inline]
    pub fn read(&self, offset: u64, length: u32) -> Result<&[u8]> {
        let data = self.bytes();
        let end = offset.checked_add(length as u64);
        match end {
            Some(end) if end <= data.len() as u64 => Ok(&data[offset as usize..end as usize]),
            _ => Err(StoreError::corrupt(format!(
                "payload range out of bounds: offset {} + length {} (payload len {})",
                offset,
                length,
                data.len()
            ))),
        }
    }
}

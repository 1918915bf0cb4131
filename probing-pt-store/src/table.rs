//! Hash slot table: the memory-mapped `probing_hash.dat`.
//!
//! A flat array of fixed-width slots filled by open addressing.
//!
//! ## Slot layout (24 bytes, little-endian)
//!
//! ```text
//! key:    u64   [0..8]     phrase key, 0 = empty slot
//! offset: u64   [8..16]    record start in the payload
//! length: u32   [16..20]   record length in bytes
//! pad:    u32   [20..24]   zero
//! ```
//!
//! ## Probing
//!
//! Home slot is `key % bucket_count` (keys are used as their own hash).
//! Collisions move to the next slot, wrapping from the last slot to slot 0.
//! A lookup ends at the matching key or at the first empty slot. The bucket
//! count is always larger than the key count, so a well-formed table has at
//! least one empty slot and every probe sequence terminates.

use crate::error::{Result, StoreError};
use crate::key::PhraseKey;
use memmap2::Mmap;
use std::fs::File;
use std::path::Path;

/// Width of one slot in bytes.
pub const SLOT_SIZE: usize = 24;

/// Key value marking an unused slot. Never a valid stored key.
pub const EMPTY_KEY: PhraseKey = 0;

/// Location of one key's record in the payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotValue {
    pub offset: u64,
    pub length: u32,
}

/// Number of buckets for `entries` keys at `load_factor`.
///
/// Computed in `f32` so every build and every reader round identically.
/// Never less than `entries + 1`, so at least one slot stays empty.
/// `None` when that count does not fit a `u64`.
pub fn bucket_count(entries: u64, load_factor: f32) -> Option<u64> {
    let scaled = (entries as f32 * load_factor).ceil() as u64;
    Some(scaled.max(entries.checked_add(1)?))
}

/// Physical byte size of a table holding `entries` keys.
///
/// Used identically by the writer and the reader; a file of any other size
/// cannot have been built for this `config`. Fails with `InvalidConfig` when
/// the size overflows a `u64`.
pub fn table_size_bytes(entries: u64, load_factor: f32) -> Result<u64> {
    bucket_count(entries, load_factor)
        .and_then(|buckets| buckets.checked_mul(SLOT_SIZE as u64))
        .ok_or_else(|| {
            StoreError::InvalidConfig(format!(
                "table size {entries} overflows the hash table byte size"
            ))
        })
}

#[inline]
pub(crate) fn home_slot(key: PhraseKey, buckets: u64) -> u64 {
    key % buckets
}

#[inline]
fn read_u64(data: &[u8], pos: usize) -> u64 {
    let mut buf = [0u8; 8];
    buf.copy_from_slice(&data[pos..pos + 8]);
    u64::from_le_bytes(buf)
}

#[inline]
fn read_u32(data: &[u8], pos: usize) -> u32 {
    let mut buf = [0u8; 4];
    buf.copy_from_slice(&data[pos..pos + 4]);
    u32::from_le_bytes(buf)
}

/// Serialize one slot. Used by the writer.
pub(crate) fn write_slot(buf: &mut [u8], key: PhraseKey, value: SlotValue) {
    buf[0..8].copy_from_slice(&key.to_le_bytes());
    buf[8..16].copy_from_slice(&value.offset.to_le_bytes());
    buf[16..20].copy_from_slice(&value.length.to_le_bytes());
    buf[20..24].copy_from_slice(&0u32.to_le_bytes());
}

/// Read-only open-addressing table over a mapped slot array.
pub struct HashSlotTable {
    mmap: Mmap,
    buckets: u64,
    entries: u64,
}

impl HashSlotTable {
    /// Map `path`, which must be exactly `table_size_bytes(declared, load_factor)`
    /// bytes long.
    pub fn open(path: &Path, declared_table_size: u64, load_factor: f32) -> Result<Self> {
        let expected = table_size_bytes(declared_table_size, load_factor)?;
        let file = File::open(path)?;
        let actual = file.metadata()?.len();
        if actual != expected {
            return Err(StoreError::SizeMismatch {
                what: "hash table",
                expected,
                actual,
            });
        }
        // SAFETY: the table is never written after build. Non-zero length is
        // guaranteed by bucket_count() >= 1.
        let mmap = unsafe { Mmap::map(&file)? };
        let buckets = expected / SLOT_SIZE as u64;
        tracing::debug!(buckets, entries = declared_table_size, ?path, "mapped hash table");
        Ok(Self {
            mmap,
            buckets,
            entries: declared_table_size,
        })
    }

    /// Number of keys the table was built with (from `config`).
    pub fn len(&self) -> u64 {
        self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries == 0
    }

    pub fn bucket_count(&self) -> u64 {
        self.buckets
    }

    #[inline]
    fn slot(&self, index: u64) -> (PhraseKey, SlotValue) {
        let pos = index as usize * SLOT_SIZE;
        let data = &self.mmap[pos..pos + SLOT_SIZE];
        (
            read_u64(data, 0),
            SlotValue {
                offset: read_u64(data, 8),
                length: read_u32(data, 16),
            },
        )
    }

    /// Look up `key`.
    ///
    /// `Ok(None)` when the probe reaches an empty slot. `CorruptStore` when
    /// every bucket was probed without finding either the key or an empty
    /// slot.
    pub fn find(&self, key: PhraseKey) -> Result<Option<SlotValue>> {
        if key == EMPTY_KEY {
            return Ok(None);
        }
        let mut index = home_slot(key, self.buckets);
        for _ in 0..self.buckets {
            let (stored, value) = self.slot(index);
            if stored == key {
                return Ok(Some(value));
            }
            if stored == EMPTY_KEY {
                return Ok(None);
            }
            index += 1;
            if index == self.buckets {
                index = 0;
            }
        }
        Err(StoreError::corrupt(format!(
            "probe for key {key} visited all {} buckets without an empty slot",
            self.buckets
        )))
    }

    /// Iterate occupied slots in physical order.
    pub fn occupied(&self) -> impl Iterator<Item = (PhraseKey, SlotValue)> + '_ {
        (0..self.buckets)
            .map(move |i| self.slot(i))
            .filter(|(key, _)| *key != EMPTY_KEY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    /// Build a raw table file by placing `(key, value)` pairs with the same
    /// probing the reader uses.
    fn write_table(path: &Path, pairs: &[(PhraseKey, SlotValue)]) {
        let buckets = bucket_count(pairs.len() as u64, 1.2).unwrap();
        let mut data = vec![0u8; (buckets as usize) * SLOT_SIZE];
        for &(key, value) in pairs {
            let mut i = home_slot(key, buckets);
            loop {
                let pos = i as usize * SLOT_SIZE;
                if read_u64(&data, pos) == EMPTY_KEY {
                    write_slot(&mut data[pos..pos + SLOT_SIZE], key, value);
                    break;
                }
                i = (i + 1) % buckets;
            }
        }
        std::fs::write(path, data).unwrap();
    }

    fn value(offset: u64, length: u32) -> SlotValue {
        SlotValue { offset, length }
    }

    #[test]
    fn sizing_formula() {
        assert_eq!(bucket_count(0, 1.2), Some(1));
        assert_eq!(bucket_count(1, 1.2), Some(2));
        assert_eq!(bucket_count(5, 1.2), Some(6));
        assert_eq!(bucket_count(10, 1.2), Some(12));
        assert_eq!(bucket_count(11, 1.2), Some(14));
        assert_eq!(table_size_bytes(10, 1.2).unwrap(), 12 * 24);
    }

    #[test]
    fn oversized_table_is_an_error() {
        assert_eq!(bucket_count(u64::MAX, 1.2), None);
        assert!(matches!(
            table_size_bytes(u64::MAX, 1.2),
            Err(StoreError::InvalidConfig(_))
        ));
        // Bucket count fits but the byte size does not.
        assert!(matches!(
            table_size_bytes(u64::MAX / 8, 1.2),
            Err(StoreError::InvalidConfig(_))
        ));
    }

    #[test]
    fn find_with_collisions_and_wraparound() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("probing_hash.dat");

        // 5 keys → 6 buckets. 5, 11 and 17 all home to slot 5 and wrap.
        let pairs = [
            (5, value(0, 10)),
            (11, value(10, 20)),
            (17, value(30, 5)),
            (1, value(35, 1)),
            (3, value(36, 2)),
        ];
        write_table(&path, &pairs);

        let table = HashSlotTable::open(&path, 5, 1.2).unwrap();
        assert_eq!(table.bucket_count(), 6);
        for (key, v) in pairs {
            assert_eq!(table.find(key).unwrap(), Some(v), "key {key}");
        }
        assert_eq!(table.find(23).unwrap(), None);
        assert_eq!(table.find(4).unwrap(), None);
        assert_eq!(table.find(EMPTY_KEY).unwrap(), None);
        assert_eq!(table.occupied().count(), 5);
    }

    #[test]
    fn wrong_file_size_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("probing_hash.dat");
        write_table(&path, &[(7, value(0, 1)), (8, value(1, 1))]);

        assert!(matches!(
            HashSlotTable::open(&path, 3, 1.2),
            Err(StoreError::SizeMismatch { what: "hash table", .. })
        ));
    }

    #[test]
    fn full_table_is_corrupt_not_a_hang() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("probing_hash.dat");

        // Declared 1 key → 2 buckets; fill both so there is no empty slot.
        let mut data = vec![0u8; 2 * SLOT_SIZE];
        write_slot(&mut data[0..SLOT_SIZE], 2, value(0, 0));
        write_slot(&mut data[SLOT_SIZE..], 3, value(0, 0));
        std::fs::write(&path, data).unwrap();

        let table = HashSlotTable::open(&path, 1, 1.2).unwrap();
        assert_eq!(table.find(3).unwrap(), Some(value(0, 0)));
        assert!(matches!(table.find(5), Err(StoreError::CorruptStore(_))));
    }
}

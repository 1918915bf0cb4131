//! Caller-owned pool of decode buffers.
//!
//! Decoding a record allocates one `Vec<Candidate>` plus four vectors per
//! candidate. On the query hot path those allocations dominate, so the
//! decoder takes shells from a [`Recycler`] and the caller hands them back
//! with [`Recycler::recycle`] once the results are consumed.
//!
//! A recycler is not shared: keep one per worker thread. Shells are cleared
//! when taken, so the decoded output never depends on what the pool held
//! before.

use crate::record::Candidate;

/// Default cap on pooled candidate shells.
const DEFAULT_MAX_POOLED: usize = 4096;

#[derive(Debug)]
pub struct Recycler {
    candidates: Vec<Candidate>,
    lists: Vec<Vec<Candidate>>,
    max_pooled: usize,
}

impl Recycler {
    pub fn new() -> Self {
        Self::with_limit(DEFAULT_MAX_POOLED)
    }

    /// Pool at most `max_pooled` candidate shells; extras are dropped.
    pub fn with_limit(max_pooled: usize) -> Self {
        Self {
            candidates: Vec::new(),
            lists: Vec::new(),
            max_pooled,
        }
    }

    /// A cleared candidate, reused if one is pooled.
    #[inline]
    pub(crate) fn take_candidate(&mut self) -> Candidate {
        match self.candidates.pop() {
            Some(mut c) => {
                c.clear();
                c
            }
            None => Candidate::default(),
        }
    }

    /// An empty output list, reused if one is pooled.
    #[inline]
    pub(crate) fn take_list(&mut self) -> Vec<Candidate> {
        self.lists.pop().unwrap_or_default()
    }

    #[inline]
    pub(crate) fn give_candidate(&mut self, candidate: Candidate) {
        if self.candidates.len() < self.max_pooled {
            self.candidates.push(candidate);
        }
    }

    /// Return a decoded candidate list to the pool.
    pub fn recycle(&mut self, mut list: Vec<Candidate>) {
        for candidate in list.drain(..) {
            self.give_candidate(candidate);
        }
        if self.lists.len() < self.max_pooled {
            self.lists.push(list);
        }
    }

    /// Drop everything pooled.
    pub fn reset(&mut self) {
        self.candidates.clear();
        self.lists.clear();
    }

    /// Number of candidate shells currently pooled.
    pub fn pooled_candidates(&self) -> usize {
        self.candidates.len()
    }
}

impl Default for Recycler {
    fn default() -> Self {
        Self::new()
    }
}

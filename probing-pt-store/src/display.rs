//! Human-readable rendering of query results, for debugging.

use crate::record::Candidate;
use crate::vocab::Vocab;
use std::fmt;

/// `Display` adapter over a candidate list.
///
/// ```text
/// Entry 1 of 2:
/// das Haus\t-0.5 -1.25 \t0-0 1-1
/// ```
///
/// Target words come from `vocab` when given, otherwise the raw IDs are
/// printed. Scores are the translation scores followed by the lexical
/// reordering scores.
pub struct CandidateList<'a> {
    candidates: &'a [Candidate],
    vocab: Option<&'a Vocab>,
}

impl<'a> CandidateList<'a> {
    pub fn new(candidates: &'a [Candidate]) -> Self {
        Self {
            candidates,
            vocab: None,
        }
    }

    pub fn with_vocab(mut self, vocab: Option<&'a Vocab>) -> Self {
        self.vocab = vocab;
        self
    }
}

impl fmt::Display for CandidateList<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let total = self.candidates.len();
        for (i, c) in self.candidates.iter().enumerate() {
            writeln!(f, "Entry {} of {}:", i + 1, total)?;
            match self.vocab {
                Some(vocab) => f.write_str(&vocab.render(&c.target_phrase))?,
                None => {
                    for (j, id) in c.target_phrase.iter().enumerate() {
                        if j > 0 {
                            f.write_str(" ")?;
                        }
                        write!(f, "{id}")?;
                    }
                }
            }
            f.write_str("\t")?;
            for s in c.scores.iter().chain(&c.lex_scores) {
                write!(f, "{s} ")?;
            }
            f.write_str("\t")?;
            for (j, (src, tgt)) in c.alignment_pairs().enumerate() {
                if j > 0 {
                    f.write_str(" ")?;
                }
                write!(f, "{src}-{tgt}")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

use crate::error::CliResult;
use probing_pt_store::config::TARGET_VOCAB_FILE;
use probing_pt_store::{CandidateList, QueryEngine, Recycler, Vocab};
use std::io::Write;
use std::path::Path;

/// Print each stored key in table order, followed by its candidates.
pub fn run(store: &Path, limit: Option<usize>) -> CliResult<()> {
    let engine = QueryEngine::open(store)?;
    let vocab = Vocab::read_optional(&store.join(TARGET_VOCAB_FILE))?;
    let limit = limit.unwrap_or(usize::MAX);

    let stdout = std::io::stdout();
    let mut out = std::io::BufWriter::new(stdout.lock());
    let mut recycler = Recycler::new();
    let mut printed = 0usize;

    for key in engine.keys().take(limit) {
        let result = engine.query_key(key, &mut recycler)?;
        writeln!(out, "key {key}")?;
        write!(
            out,
            "{}",
            CandidateList::new(&result.candidates).with_vocab(vocab.as_ref())
        )?;
        result.recycle_into(&mut recycler);
        printed += 1;
    }
    out.flush()?;

    tracing::info!(printed, total = engine.table().len(), "dump complete");
    Ok(())
}

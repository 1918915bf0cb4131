use crate::cli::{OutputFormat, PhraseArgs};
use crate::error::{CliError, CliResult};
use crate::output;
use probing_pt_store::config::{SOURCE_VOCAB_FILE, TARGET_VOCAB_FILE};
use probing_pt_store::{PhraseKey, QueryEngine, Recycler, Vocab};
use std::path::Path;

pub fn run(store: &Path, phrase: &PhraseArgs, format: OutputFormat) -> CliResult<()> {
    let engine = QueryEngine::open(store)?;
    let key = resolve_key(&engine, store, phrase)?;

    let mut recycler = Recycler::new();
    let result = engine.query_key(key, &mut recycler)?;

    match format {
        OutputFormat::Json => output::print_json(&serde_json::json!({
            "key": key,
            "found": result.found,
            "candidates": result.candidates,
        })),
        OutputFormat::Table => {
            if !result.found {
                println!("not found (key {key})");
                return Ok(());
            }
            let vocab = Vocab::read_optional(&store.join(TARGET_VOCAB_FILE))?;
            println!("key {key}: {} candidate(s)", result.candidates.len());
            println!(
                "{}",
                output::format_candidates(&result.candidates, vocab.as_ref())
            );
            Ok(())
        }
    }
}

fn resolve_key(engine: &QueryEngine, store: &Path, phrase: &PhraseArgs) -> CliResult<PhraseKey> {
    if let Some(key) = phrase.key {
        return Ok(key);
    }
    if let Some(ids) = &phrase.ids {
        return Ok(engine.key_for(ids));
    }
    let words = phrase
        .words
        .as_deref()
        .ok_or_else(|| CliError::Usage("one of --ids, --words or --key is required".into()))?;

    let path = store.join(SOURCE_VOCAB_FILE);
    let vocab = Vocab::read_optional(&path)?.ok_or_else(|| {
        CliError::Input(format!(
            "--words needs a source vocabulary at {}",
            path.display()
        ))
    })?;
    let ids = vocab
        .phrase_ids(words.split_whitespace())
        .map_err(|token| CliError::Input(format!("unknown source token '{token}'")))?;
    tracing::debug!(?ids, "resolved source phrase");
    Ok(engine.key_for(&ids))
}

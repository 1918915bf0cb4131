use crate::cli::OutputFormat;
use crate::error::CliResult;
use crate::output;
use probing_pt_store::config::{SOURCE_VOCAB_FILE, TARGET_VOCAB_FILE};
use probing_pt_store::QueryEngine;
use std::path::Path;

pub fn run(store: &Path, format: OutputFormat) -> CliResult<()> {
    let engine = QueryEngine::open(store)?;
    let config = engine.config();
    let table = engine.table();
    let load = if table.bucket_count() == 0 {
        0.0
    } else {
        table.len() as f64 / table.bucket_count() as f64
    };
    let source_vocab = store.join(SOURCE_VOCAB_FILE).exists();
    let target_vocab = store.join(TARGET_VOCAB_FILE).exists();

    match format {
        OutputFormat::Json => output::print_json(&serde_json::json!({
            "store": store.display().to_string(),
            "config": config,
            "entries": table.len(),
            "buckets": table.bucket_count(),
            "load": load,
            "payload_bytes": engine.payload_len(),
            "source_vocab": source_vocab,
            "target_vocab": target_vocab,
        })),
        OutputFormat::Table => {
            let rows = [
                ("store", store.display().to_string()),
                ("api version", config.api_version.to_string()),
                ("entries", table.len().to_string()),
                ("buckets", table.bucket_count().to_string()),
                ("load", format!("{load:.3}")),
                ("payload bytes", engine.payload_len().to_string()),
                ("scores", config.num_scores.to_string()),
                ("lex scores", config.num_lex_scores.to_string()),
                ("log prob", config.log_prob.to_string()),
                ("source vocab", yes_no(source_vocab)),
                ("target vocab", yes_no(target_vocab)),
            ];
            println!("{}", output::format_fields(&rows));
            Ok(())
        }
    }
}

fn yes_no(present: bool) -> String {
    let answer = if present { "yes" } else { "no" };
    answer.to_string()
}

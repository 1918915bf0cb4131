use crate::error::CliResult;
use comfy_table::{ContentArrangement, Table};
use probing_pt_store::{Candidate, Vocab};
use serde::Serialize;

/// Pretty-print any serializable value as JSON on stdout.
pub fn print_json<T: Serialize + ?Sized>(value: &T) -> CliResult<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Two-column `field | value` table.
pub fn format_fields(rows: &[(&str, String)]) -> String {
    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["field", "value"]);
    for (name, value) in rows {
        table.add_row(vec![name.to_string(), value.clone()]);
    }
    table.to_string()
}

/// One row per candidate. Target words come from `vocab` when present.
pub fn format_candidates(candidates: &[Candidate], vocab: Option<&Vocab>) -> String {
    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["#", "target", "scores", "lex scores", "alignment"]);

    for (i, c) in candidates.iter().enumerate() {
        let target = match vocab {
            Some(v) => v.render(&c.target_phrase),
            None => join(c.target_phrase.iter()),
        };
        let alignment = c
            .alignment_pairs()
            .map(|(s, t)| format!("{s}-{t}"))
            .collect::<Vec<_>>()
            .join(" ");
        table.add_row(vec![
            (i + 1).to_string(),
            target,
            join(c.scores.iter()),
            join(c.lex_scores.iter()),
            alignment,
        ]);
    }
    table.to_string()
}

fn join<T: ToString>(items: impl Iterator<Item = T>) -> String {
    items.map(|v| v.to_string()).collect::<Vec<_>>().join(" ")
}

use crate::cli::OutputFormat;
use crate::error::CliResult;
use crate::output;
use colored::Colorize;
use probing_pt_store::QueryEngine;
use std::path::Path;

pub fn run(store: &Path, format: OutputFormat) -> CliResult<()> {
    let engine = QueryEngine::open(store)?;
    let report = engine.verify()?;

    match format {
        OutputFormat::Json => output::print_json(&report),
        OutputFormat::Table => {
            println!(
                "{} {} keys, {} candidates, {} of {} payload bytes referenced",
                "ok:".green().bold(),
                report.slots,
                report.candidates,
                report.referenced_bytes,
                report.payload_bytes
            );
            Ok(())
        }
    }
}

mod cli;
mod commands;
mod error;
mod output;

use clap::Parser;
use cli::{Cli, Commands};
use error::exit_with_error;

fn init_tracing(cli: &Cli) {
    // --quiet forces logs off. --verbose uses RUST_LOG, or "info" when unset.
    // Without either flag logs stay off even if RUST_LOG is set: `dump` and
    // `query --format json` output is meant to be piped, and error text on
    // stderr is checked by scripts.
    let filter = if cli.quiet {
        tracing_subscriber::EnvFilter::new("off")
    } else if cli.verbose {
        tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into())
    } else {
        tracing_subscriber::EnvFilter::new("off")
    };

    let ansi = !(cli.no_color || std::env::var_os("NO_COLOR").is_some());

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(ansi)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let cli = Cli::parse();

    // Only --no-color / NO_COLOR switch color off; piping stdout should not
    // strip color from errors on stderr.
    if cli.no_color || std::env::var_os("NO_COLOR").is_some() {
        colored::control::set_override(false);
    }

    init_tracing(&cli);

    if let Err(e) = run(cli) {
        exit_with_error(e);
    }
}

fn run(cli: Cli) -> error::CliResult<()> {
    match cli.command {
        Commands::Info { store, format } => commands::info::run(&store, format),

        Commands::Query {
            store,
            phrase,
            format,
        } => commands::query::run(&store, &phrase, format),

        Commands::Dump { store, limit } => commands::dump::run(&store, limit),

        Commands::Verify { store, format } => commands::verify::run(&store, format),
    }
}

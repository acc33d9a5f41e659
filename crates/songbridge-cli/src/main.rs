//! Songbridge CLI - resolve playlist entries and sync them across catalogs.

mod cli;
mod commands;
mod snapshot;

use clap::Parser;
use cli::{Cli, Commands};
use songbridge::CancellationToken;
use tracing_subscriber::EnvFilter;

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let cancel = CancellationToken::new();
    let handler_token = cancel.clone();
    if let Err(e) = ctrlc::set_handler(move || {
        eprintln!("Cancelling after the current item...");
        handler_token.cancel();
    }) {
        tracing::warn!(error = %e, "could not install Ctrl-C handler");
    }

    let result = match cli.command {
        Commands::Resolve {
            label,
            description,
            channel,
            platform,
            catalog,
            engine,
            json,
        } => commands::resolve::run(
            label,
            description,
            channel,
            platform,
            catalog,
            engine,
            json,
            cli.verbose,
        ),

        Commands::Sync {
            source,
            target,
            engine,
            mode,
            ai_budget,
            remove_pending,
            dry_run: true,
            ..
        } => commands::diff::run(source, target, engine, mode, ai_budget, remove_pending, &cancel),

        Commands::Sync {
            source,
            target,
            engine,
            mode,
            ai_budget,
            remove_pending,
            report,
            dry_run: false,
        } => commands::sync::run(
            source,
            target,
            engine,
            mode,
            ai_budget,
            remove_pending,
            report,
            &cancel,
            cli.verbose,
        ),

        Commands::Diff {
            source,
            target,
            engine,
            mode,
            ai_budget,
            remove_pending,
        } => commands::diff::run(source, target, engine, mode, ai_budget, remove_pending, &cancel),

        Commands::Status { report, json } => commands::status::run(report, json, cli.verbose),

        Commands::Confirm {
            report,
            index,
            destination,
            feedback,
        } => commands::confirm::run_confirm(report, index, destination, feedback),

        Commands::Skip {
            report,
            index,
            feedback,
        } => commands::confirm::run_skip(report, index, feedback),

        Commands::Feedback { action, feedback } => commands::feedback::run(action, feedback),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

/// Log to stderr so command output stays clean. `RUST_LOG` wins when set.
fn init_logging(verbose: bool) {
    let default = if verbose { "songbridge=debug,warn" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

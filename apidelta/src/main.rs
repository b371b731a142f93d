//! apidelta: records added and removed API symbols between a base ref and HEAD.
//!
//! # Run sequence
//!
//! 1. Parse flags and initialize logging to stderr.
//! 2. Load config; flags override it.
//! 3. Read the repository and compute symbols (any git failure stops here,
//!    before the store is opened).
//! 4. Rebuild the store in one transaction, then write the optional summary.

use anyhow::Context;
use apidelta::{build_options, execute, Args, Config};
use apidelta_core::types::ChangeType;
use clap::Parser;
use tracing_subscriber::EnvFilter;

fn init_tracing(verbose: bool) {
    let default_level = if verbose {
        "apidelta=debug,apidelta_core=debug"
    } else {
        "apidelta=info,apidelta_core=info"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose);

    let config = Config::load(args.config.as_deref()).context("failed to load config")?;
    let opts = build_options(&args, &config);

    let run = execute(&opts, &args.db, args.summary_json.as_deref())
        .await
        .with_context(|| format!("audit of {} against {} failed", opts.repo.display(), opts.base))?;

    println!(
        "{} files changed, {} symbols added, {} symbols removed -> {}",
        run.files.len(),
        run.count_changes(ChangeType::Added),
        run.count_changes(ChangeType::Removed),
        args.db.display(),
    );
    Ok(())
}

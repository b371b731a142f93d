use std::path::PathBuf;

use clap::Parser;

use crate::config::Config;
use crate::pipeline::RunOptions;

/// Record added and removed API symbols between a base ref and HEAD.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to the git repository
    #[arg(long)]
    pub repo: PathBuf,

    /// Base ref to diff against (defaults to the config value, else origin/main)
    #[arg(long)]
    pub base: Option<String>,

    /// Output SQLite database path
    #[arg(long)]
    pub db: PathBuf,

    /// Optional path to write a JSON summary
    #[arg(long)]
    pub summary_json: Option<PathBuf>,

    /// Config file (TOML); defaults to $XDG_CONFIG_HOME/apidelta/config.toml
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Source file extensions to extract symbols from (can be repeated or comma separated)
    #[arg(long = "ext", value_delimiter = ',')]
    pub extensions: Vec<String>,

    /// Report renamed files as a deletion plus an addition
    #[arg(long)]
    pub no_renames: bool,

    /// Log per-file progress
    #[arg(short, long)]
    pub verbose: bool,
}

/// Merges command-line flags over the loaded configuration.
pub fn build_options(args: &Args, config: &Config) -> RunOptions {
    RunOptions {
        repo: args.repo.clone(),
        base: args.base.clone().unwrap_or_else(|| config.base.clone()),
        extensions: if args.extensions.is_empty() {
            config.extensions.clone()
        } else {
            args.extensions.clone()
        },
        detect_renames: config.detect_renames && !args.no_renames,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_override_config() {
        let args = Args::parse_from([
            "apidelta", "--repo", "/r", "--db", "/o.db", "--base", "v2", "--ext", "go,gox",
            "--no-renames",
        ]);
        let opts = build_options(&args, &Config::default());
        assert_eq!(opts.base, "v2");
        assert_eq!(opts.extensions, vec!["go", "gox"]);
        assert!(!opts.detect_renames);
        assert!(args.summary_json.is_none());
    }

    #[test]
    fn config_fills_unset_flags() {
        let args = Args::parse_from(["apidelta", "--repo", "/r", "--db", "/o.db"]);
        let config = Config { base: "develop".to_owned(), ..Config::default() };
        let opts = build_options(&args, &config);
        assert_eq!(opts.base, "develop");
        assert_eq!(opts.extensions, vec!["go"]);
        assert!(opts.detect_renames);
    }
}

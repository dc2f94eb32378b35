//! cli::args
//!
//! Command-line argument definitions using clap derive.
//!
//! # Global Flags
//!
//! These flags are available on all commands:
//! - `--help` / `-h`: Show help
//! - `--version`: Show version
//! - `--debug`: Enable debug logging
//! - `--quiet` / `-q`: Only errors and command output

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::core::config::DEFAULT_TOKEN_ENV;

/// gitimpart - Render configuration templates and deliver them to Git repositories
#[derive(Parser, Debug)]
#[command(name = "gitimpart")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    /// Only errors and command output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Parser::parse()
    }
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Render a template or data file and print the content tree
    #[command(
        name = "render",
        long_about = "Render a template or data file and print the content tree as JSON.\n\n\
            Files ending in .jsonnet are evaluated with the jsonnet tool; any other \
            file is read as JSON. The output has the shape \
            {\"$files\": {...}, \"$kustomize\": {...}} with aggregation members \
            already merged into $files.",
        after_help = "\
EXAMPLES:
    # Render a template with two external variables
    gitimpart render --file app.jsonnet --var env=prod,region=eu

    # Files named *.template.* also get github_repo_owner/github_repo_name
    GITHUB_REPOSITORY=acme/infra gitimpart render --file app.template.jsonnet"
    )]
    Render {
        #[command(flatten)]
        source: SourceArgs,
    },

    /// Render a file and deliver the result
    #[command(
        name = "push",
        long_about = "Render a file and deliver the result.\n\n\
            Without a repository the content is written to .gitimpart/<id> in the \
            current directory. With --repo (or a [git] table in --config) the \
            repository is cloned, the files are committed on the base branch and \
            pushed. With --pull-request a fresh gitimpart/<id>-<timestamp> branch is \
            pushed instead and a pull request is opened against the base branch.\n\n\
            A run that changes nothing creates no commit, no push and no pull request.",
        after_help = "\
EXAMPLES:
    # Commit straight to main
    gitimpart push --file app.jsonnet --repo acme/infra --branch main

    # Open a pull request instead
    gitimpart push --file app.jsonnet --repo acme/infra --pull-request

    # Use a target file and see what would change
    gitimpart push --file app.jsonnet --config target.toml --dry-run

TARGET FILE:
    [git]
    repo = \"acme/infra\"
    branch = \"main\"
    path = \"deploy/app\"
    push = true

    [pull_request]"
    )]
    Push(PushArgs),

    /// Generate shell completion scripts
    #[command(
        name = "completion",
        after_help = "\
EXAMPLES:
    gitimpart completion bash > ~/.local/share/bash-completion/completions/gitimpart
    gitimpart completion zsh > ~/.zfunc/_gitimpart
    gitimpart completion fish > ~/.config/fish/completions/gitimpart.fish"
    )]
    Completion {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// What to render and with which variables.
#[derive(Args, Debug, Clone)]
pub struct SourceArgs {
    /// Template (.jsonnet) or JSON data file
    #[arg(short, long, value_name = "FILE")]
    pub file: PathBuf,

    /// External variable; repeat or separate with commas
    #[arg(
        long = "var",
        value_name = "NAME=VALUE",
        value_parser = parse_var,
        value_delimiter = ','
    )]
    pub vars: Vec<(String, String)>,

    /// jsonnet executable
    #[arg(long, value_name = "PATH", default_value = "jsonnet")]
    pub jsonnet_bin: PathBuf,
}

#[derive(Args, Debug, Clone)]
pub struct PushArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    /// Target repository: OWNER/NAME, HOST/OWNER/NAME or an https URL
    #[arg(long, value_name = "REPO")]
    pub repo: Option<String>,

    /// Base branch (default: GITIMPART_BASE_BRANCH, then main)
    #[arg(long, value_name = "BRANCH")]
    pub branch: Option<String>,

    /// Delivery target file (TOML)
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Push a change branch and open a pull request
    #[arg(long)]
    pub pull_request: bool,

    /// Commit locally and show the diff; never push or open a pull request
    #[arg(long)]
    pub dry_run: bool,

    /// Environment variable holding the GitHub token
    #[arg(long, value_name = "NAME", default_value = DEFAULT_TOKEN_ENV)]
    pub github_token_env: String,

    /// kustomize executable (default: GITIMPART_KUSTOMIZE_BIN, then kustomize on PATH)
    #[arg(long, value_name = "PATH")]
    pub kustomize_bin: Option<PathBuf>,

    /// Clone location (default: GITIMPART_GIT_ROOT, then a temporary directory)
    #[arg(long, value_name = "DIR")]
    pub work_dir: Option<PathBuf>,

    /// Commit subject and pull request title
    #[arg(long)]
    pub subject: Option<String>,

    /// Commit body and pull request description
    #[arg(long)]
    pub body: Option<String>,
}

/// Parse one `NAME=VALUE` pair.
fn parse_var(s: &str) -> Result<(String, String), String> {
    let (name, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=VALUE, got '{}'", s))?;
    if name.trim().is_empty() {
        return Err(format!("variable name cannot be empty in '{}'", s));
    }
    Ok((name.trim().to_string(), value.to_string()))
}

/// Supported shells for completion
#[derive(clap::ValueEnum, Debug, Clone, Copy)]
#[allow(clippy::enum_variant_names)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
}

use clap::Parser;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "microshell",
    version,
    about = "Microshell: run commands joined by '|' and ';'",
    after_help = "Quote the operators so your own shell passes them through:\n  microshell /bin/ls -l '|' /usr/bin/wc -l ';' /bin/echo done"
)]
pub struct Cli {
    /// Config file (defaults to ./microshell.toml when present)
    #[arg(short = 'c', long = "config")]
    pub config: Option<PathBuf>,

    /// Dotenv file whose entries are added to the child environment
    #[arg(long = "env-file")]
    pub env_file: Option<PathBuf>,

    /// Resolve bare program names through PATH instead of passing them to execve as-is
    #[arg(short = 'p', long = "search-path")]
    pub search_path: bool,

    /// Print the stages that would run, without running anything
    #[arg(short = 'd', long = "dry-run")]
    pub dry_run: bool,

    /// Run each line of a script file as its own pipeline
    #[arg(short = 'f', long = "file", conflicts_with = "tokens")]
    pub file: Option<PathBuf>,

    /// Commands and operators
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    pub tokens: Vec<String>,
}

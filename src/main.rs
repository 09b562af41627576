mod cli;
mod config;
mod engine;
mod handlers;
mod utils;

use anyhow::Result;
use clap::Parser;
use cli::Cli;
use handlers::{plan, run, script};
use std::process::ExitCode;

fn main() -> Result<ExitCode> {
    env_logger::init();
    let cli = Cli::parse();

    if cli.dry_run {
        let pipelines = match &cli.file {
            Some(path) => script::read_script(path)?
                .into_iter()
                .map(|line| line.tokens)
                .collect(),
            None => vec![cli.tokens.clone()],
        };
        plan::handle_plan(&pipelines);
        return Ok(ExitCode::SUCCESS);
    }

    let settings = config::resolve_settings(&cli)?;
    match &cli.file {
        Some(path) => script::handle_script(path, settings),
        None => run::handle_run(&cli.tokens, settings),
    }
}

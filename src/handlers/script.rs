use anyhow::{Context, Result};
use log::{debug, info};
use std::fs;
use std::path::Path;
use std::process::ExitCode;
use crate::config::Settings;
use crate::engine::context::ShellContext;
use crate::engine::run_pipeline;
use crate::engine::sys::Sys;
use crate::handlers::run::open_context;
use crate::utils::to_exit_code;

/// One tokenized script line.
#[derive(Debug, Clone, PartialEq)]
pub struct ScriptLine {
    pub number: usize,
    pub tokens: Vec<String>,
}

/// Splits every non-blank, non-comment line with shell quoting rules.
pub fn parse_script(content: &str) -> Result<Vec<ScriptLine>> {
    let mut lines = Vec::new();
    for (idx, raw) in content.lines().enumerate() {
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let tokens = shell_words::split(trimmed)
            .with_context(|| format!("Failed to tokenize line {}: {}", idx + 1, trimmed))?;
        lines.push(ScriptLine { number: idx + 1, tokens });
    }
    Ok(lines)
}

pub fn read_script(path: &Path) -> Result<Vec<ScriptLine>> {
    let content = fs::read_to_string(path).with_context(|| format!("Failed to read script {:?}", path))?;
    parse_script(&content)
}

/// Runs the lines in order through one context; stops at the first non-zero status.
pub fn run_script<S: Sys>(lines: &[ScriptLine], ctx: &mut ShellContext<S>) -> i32 {
    for line in lines {
        debug!("script line {}: {:?}", line.number, line.tokens);
        let status = match run_pipeline(&line.tokens, ctx) {
            Ok(status) => status,
            Err(e) => e.exit_code(),
        };
        if status != 0 {
            info!("script stopped at line {} with status {}", line.number, status);
            return status;
        }
    }
    0
}

pub fn handle_script(path: &Path, settings: Settings) -> Result<ExitCode> {
    let lines = read_script(path)?;
    let mut ctx = match open_context(settings) {
        Ok(ctx) => ctx,
        Err(code) => return Ok(code),
    };
    Ok(to_exit_code(run_script(&lines, &mut ctx)))
}

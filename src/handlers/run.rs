use anyhow::Result;
use std::process::ExitCode;
use crate::config::Settings;
use crate::engine::context::ShellContext;
use crate::engine::run_pipeline;
use crate::engine::sys::Posix;
use crate::utils::to_exit_code;

/// Builds the engine context, or reports `error: fatal` if stdin can't be duplicated.
pub fn open_context(settings: Settings) -> Result<ShellContext<Posix>, ExitCode> {
    match ShellContext::new(settings.env) {
        Ok(mut ctx) => {
            ctx.search_path = settings.search_path;
            Ok(ctx)
        }
        Err(e) => {
            eprint!("{}", e.diagnostic());
            Err(to_exit_code(e.exit_code()))
        }
    }
}

pub fn handle_run(tokens: &[String], settings: Settings) -> Result<ExitCode> {
    let mut ctx = match open_context(settings) {
        Ok(ctx) => ctx,
        Err(code) => return Ok(code),
    };

    // Errors are already reported to stderr; the context keeps the status.
    run_pipeline(tokens, &mut ctx).ok();
    Ok(to_exit_code(ctx.exit_code))
}

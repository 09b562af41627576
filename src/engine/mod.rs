pub mod ast;
pub mod context;
pub mod error;
pub mod executor;
pub mod segmenter;
pub mod sys;
pub mod tracker;

#[cfg(test)]
pub mod testing;

use context::ShellContext;
use error::EngineError;
use executor::{StageOutcome, run_stage};
use log::{debug, info, warn};
use segmenter::next_command;
use sys::Sys;

/// Runs one token list (commands joined by `|` and `;`) to completion.
///
/// Stops at the first builtin error, fatal error or non-zero awaited stage.
/// Whatever happens, the stdin tracker is rebound to the original input
/// before returning, and (unless the run went fatal) every pipe stage is reaped.
/// Errors have already been written to the context's diagnostics when this returns.
pub fn run_pipeline<S: Sys>(tokens: &[String], ctx: &mut ShellContext<S>) -> Result<i32, EngineError> {
    let outcome = drive(tokens, ctx);
    let outcome = finish(outcome, ctx);

    match &outcome {
        Ok(status) => {
            info!("pipeline finished with status {}", status);
            ctx.exit_code = *status;
        }
        Err(e) => {
            ctx.report(e);
            ctx.exit_code = e.exit_code();
        }
    }
    outcome
}

fn drive<S: Sys>(tokens: &[String], ctx: &mut ShellContext<S>) -> Result<i32, EngineError> {
    let mut position = 0;
    let mut status = 0;

    while position < tokens.len() {
        let segment = next_command(tokens, position);
        position = segment.next;
        if segment.command.is_empty() {
            continue;
        }

        match run_stage(&segment.command, segment.operator, ctx)? {
            StageOutcome::Piped(pid) => debug!("stage {} streaming into the next one", pid),
            StageOutcome::Unlaunched => debug!("'{}' never started, next stage reads EOF", segment.command),
            StageOutcome::Exited(0) => status = 0,
            StageOutcome::Exited(code) => {
                debug!("'{}' exited with {}, halting", segment.command, code);
                return Ok(code);
            }
        }
    }
    Ok(status)
}

fn finish<S: Sys>(
    outcome: Result<i32, EngineError>,
    ctx: &mut ShellContext<S>,
) -> Result<i32, EngineError> {
    // The tracker has to drop the last pipe before pending writers are reaped.
    if ctx.tracker.is_redirected() {
        debug!("rebinding stdin tracker to the original input");
    }
    let restored = ctx.tracker.restore(&mut ctx.sys);
    let outcome = outcome.and_then(|status| restored.map(|()| status));

    match &outcome {
        Err(e) if e.is_fatal() => {
            if !ctx.pending().is_empty() {
                warn!("run aborted, {} pipe stage(s) left unreaped", ctx.pending().len());
            }
        }
        _ => ctx.reap_pending(),
    }
    outcome
}

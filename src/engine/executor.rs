use crate::engine::ast::{Command, Operator};
use crate::engine::context::ShellContext;
use crate::engine::error::EngineError;
use crate::engine::sys::{PipeEnds, SpawnRequest, Sys};
use crate::utils::resolve_program;
use log::debug;
use nix::sys::wait::WaitStatus;
use nix::unistd::Pid;
use std::ffi::CString;
use std::os::unix::ffi::OsStrExt;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageOutcome {
    /// Launched into a pipe; nobody waits for it until the run ends.
    Piped(Pid),
    /// Finished (or was a builtin) with this status.
    Exited(i32),
    /// A pipe stage that could not be launched; the next stage reads EOF.
    Unlaunched,
}

/// Runs one command. `operator` is what follows it in the token list.
pub fn run_stage<S: Sys>(
    command: &Command<'_>,
    operator: Operator,
    ctx: &mut ShellContext<S>,
) -> Result<StageOutcome, EngineError> {
    let Some(program) = command.program() else {
        return Ok(StageOutcome::Exited(0));
    };

    if command.is_builtin_cd() {
        return change_directory(command, ctx);
    }

    let Some(prepared) = PreparedCommand::new(command, ctx) else {
        ctx.report(&EngineError::Exec { program: program.to_string() });
        if operator.is_pipe() {
            return feed_eof(ctx);
        }
        return Ok(StageOutcome::Exited(1));
    };

    if operator.is_pipe() {
        launch_piped(&prepared, ctx)
    } else {
        launch_and_wait(&prepared, ctx)
    }
}

fn launch_piped<S: Sys>(
    prepared: &PreparedCommand,
    ctx: &mut ShellContext<S>,
) -> Result<StageOutcome, EngineError> {
    let (read_end, write_end) = ctx.sys.pipe()?;

    let request = SpawnRequest {
        program: &prepared.path,
        argv: &prepared.argv,
        envp: &prepared.envp,
        stdin: ctx.tracker.fd(),
        stdout: Some(PipeEnds {
            read: &read_end,
            write: &write_end,
        }),
        exec_diagnostic: &prepared.diagnostic,
    };
    let pid = ctx.sys.spawn(&request)?;
    debug!("launched {} as pipe stage {}", prepared.display, pid);

    drop(write_end);
    ctx.push_pending(pid);
    ctx.tracker.redirect(&mut ctx.sys, read_end)?;
    Ok(StageOutcome::Piped(pid))
}

/// Points the tracker at a pipe with no writer, as if the stage had exited silently.
fn feed_eof<S: Sys>(ctx: &mut ShellContext<S>) -> Result<StageOutcome, EngineError> {
    let (read_end, write_end) = ctx.sys.pipe()?;
    drop(write_end);
    ctx.tracker.redirect(&mut ctx.sys, read_end)?;
    Ok(StageOutcome::Unlaunched)
}

fn launch_and_wait<S: Sys>(
    prepared: &PreparedCommand,
    ctx: &mut ShellContext<S>,
) -> Result<StageOutcome, EngineError> {
    let request = SpawnRequest {
        program: &prepared.path,
        argv: &prepared.argv,
        envp: &prepared.envp,
        stdin: ctx.tracker.fd(),
        stdout: None,
        exec_diagnostic: &prepared.diagnostic,
    };
    let pid = ctx.sys.spawn(&request)?;
    debug!("launched {} as {}, waiting", prepared.display, pid);

    let status = ctx.sys.wait(pid)?;
    ctx.tracker.restore(&mut ctx.sys)?;

    let code = exit_code(status);
    debug!("{} finished with status {}", pid, code);
    Ok(StageOutcome::Exited(code))
}

/// Normal exits keep their code; anything else (signals) counts as success.
pub fn exit_code(status: WaitStatus) -> i32 {
    match status {
        WaitStatus::Exited(_, code) => code,
        _ => 0,
    }
}

fn change_directory<S: Sys>(
    command: &Command<'_>,
    ctx: &mut ShellContext<S>,
) -> Result<StageOutcome, EngineError> {
    let [path] = command.args() else {
        return Err(EngineError::BuiltinArgs);
    };
    ctx.sys
        .change_dir(Path::new(path))
        .map_err(|_| EngineError::BuiltinChdir(path.clone()))?;
    debug!("cd {}", path);
    Ok(StageOutcome::Exited(0))
}

/// C strings for `execve`, built in the parent so the child never allocates.
struct PreparedCommand {
    display: String,
    path: CString,
    argv: Vec<CString>,
    envp: Vec<CString>,
    diagnostic: Vec<u8>,
}

impl PreparedCommand {
    fn new<S: Sys>(command: &Command<'_>, ctx: &ShellContext<S>) -> Option<Self> {
        let program = command.program()?;
        let path = resolve_program(program, ctx.search_path, ctx.env.get("PATH"));
        let path = CString::new(path.as_os_str().as_bytes()).ok()?;
        let argv = command
            .tokens()
            .iter()
            .map(|t| CString::new(t.as_str()))
            .collect::<Result<Vec<_>, _>>()
            .ok()?;

        Some(Self {
            display: command.to_string(),
            path,
            argv,
            envp: ctx.env.to_envp(),
            diagnostic: EngineError::Exec { program: program.to_string() }
                .diagnostic()
                .into_bytes(),
        })
    }
}

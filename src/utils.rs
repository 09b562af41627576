use std::env;
use std::ffi::OsStr;
use std::path::PathBuf;
use std::process::ExitCode;

/// Resolves a bare program name through `PATH` when `search` is on.
/// Anything containing a `/`, or not found, is returned untouched so `execve`
/// reports it.
pub fn resolve_program(program: &str, search: bool, path_var: Option<&OsStr>) -> PathBuf {
    if !search || program.contains('/') {
        return PathBuf::from(program);
    }

    // Only the child's PATH is searched; the engine's own PATH never leaks in.
    let cwd = env::current_dir().unwrap_or_else(|_| PathBuf::from("/"));
    which::which_in(program, path_var, cwd).unwrap_or_else(|_| PathBuf::from(program))
}

/// Maps a pipeline status onto a process exit code (low 8 bits, like a shell).
pub fn to_exit_code(status: i32) -> ExitCode {
    ExitCode::from((status & 0xff) as u8)
}

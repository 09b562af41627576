pub mod posix;

use nix::sys::wait::WaitStatus;
use nix::unistd::Pid;
use std::ffi::{CStr, CString};
use std::path::Path;

pub use posix::Posix;

/// Both ends of the pipe a stage writes into.
pub struct PipeEnds<'a, F> {
    pub read: &'a F,
    pub write: &'a F,
}

/// Everything the child needs, prepared before the fork so the child side
/// never allocates.
pub struct SpawnRequest<'a, F> {
    pub program: &'a CStr,
    pub argv: &'a [CString],
    pub envp: &'a [CString],
    pub stdin: &'a F,
    pub stdout: Option<PipeEnds<'a, F>>,
    /// Written by the child when exec fails.
    pub exec_diagnostic: &'a [u8],
}

/// The process and descriptor operations the engine depends on.
///
/// Descriptors are owned values (`Self::Fd`); dropping one closes it. The
/// engine never closes anything explicitly on the parent side.
pub trait Sys {
    type Fd;

    /// Duplicates the engine's standard input.
    fn dup_stdin(&mut self) -> nix::Result<Self::Fd>;

    /// Returns `(read, write)`.
    fn pipe(&mut self) -> nix::Result<(Self::Fd, Self::Fd)>;

    /// Points `slot` at whatever `src` refers to, keeping the descriptor number of `slot`.
    fn rebind(&mut self, src: &Self::Fd, slot: &mut Self::Fd) -> nix::Result<()>;

    /// Points `slot` back at the engine's standard input.
    fn restore_stdin(&mut self, slot: &mut Self::Fd) -> nix::Result<()>;

    fn spawn(&mut self, request: &SpawnRequest<'_, Self::Fd>) -> nix::Result<Pid>;

    fn wait(&mut self, pid: Pid) -> nix::Result<WaitStatus>;

    fn change_dir(&mut self, path: &Path) -> nix::Result<()>;

    fn fd_number(fd: &Self::Fd) -> i32;
}

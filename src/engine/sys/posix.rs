use crate::engine::sys::{SpawnRequest, Sys};
use nix::errno::Errno;
use nix::sys::wait::{WaitStatus, waitpid};
use nix::unistd::{self, ForkResult, Pid};
use std::io;
use std::os::fd::{AsRawFd, OwnedFd};
use std::path::Path;

const FATAL_DIAGNOSTIC: &[u8] = b"error: fatal\n";
const CHILD_FAILURE_STATUS: i32 = 1;

/// The real system: `fork`/`execve` children and kernel descriptors.
#[derive(Debug, Default, Clone, Copy)]
pub struct Posix;

/// Why the child returned instead of becoming the target program.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ChildFailure {
    Rebind(Errno),
    Exec(Errno),
}

impl Sys for Posix {
    type Fd = OwnedFd;

    fn dup_stdin(&mut self) -> nix::Result<OwnedFd> {
        unistd::dup(io::stdin())
    }

    #[cfg(any(target_os = "linux", target_os = "android"))]
    fn pipe(&mut self) -> nix::Result<(OwnedFd, OwnedFd)> {
        // Children get the ends through dup2, which drops the flag on the copy.
        unistd::pipe2(nix::fcntl::OFlag::O_CLOEXEC)
    }

    #[cfg(not(any(target_os = "linux", target_os = "android")))]
    fn pipe(&mut self) -> nix::Result<(OwnedFd, OwnedFd)> {
        unistd::pipe()
    }

    fn rebind(&mut self, src: &OwnedFd, slot: &mut OwnedFd) -> nix::Result<()> {
        unistd::dup2(src, slot)
    }

    fn restore_stdin(&mut self, slot: &mut OwnedFd) -> nix::Result<()> {
        unistd::dup2(io::stdin(), slot)
    }

    fn spawn(&mut self, request: &SpawnRequest<'_, OwnedFd>) -> nix::Result<Pid> {
        // SAFETY: the child only calls dup2/close/execve/write/_exit, all
        // async-signal-safe, on data prepared before the fork.
        match unsafe { unistd::fork() }? {
            ForkResult::Parent { child } => Ok(child),
            ForkResult::Child => {
                let failure = enter_child(request);
                exit_child(failure, request.exec_diagnostic)
            }
        }
    }

    fn wait(&mut self, pid: Pid) -> nix::Result<WaitStatus> {
        loop {
            match waitpid(pid, None) {
                Err(Errno::EINTR) => continue,
                other => return other,
            }
        }
    }

    fn change_dir(&mut self, path: &Path) -> nix::Result<()> {
        unistd::chdir(path)
    }

    fn fd_number(fd: &OwnedFd) -> i32 {
        fd.as_raw_fd()
    }
}

/// Rebinds stdio and replaces the process image. Only returns on failure.
fn enter_child(request: &SpawnRequest<'_, OwnedFd>) -> ChildFailure {
    if let Err(errno) = bind_child_stdio(request) {
        return ChildFailure::Rebind(errno);
    }
    match unistd::execve(request.program, request.argv, request.envp) {
        Ok(never) => match never {},
        Err(errno) => ChildFailure::Exec(errno),
    }
}

fn bind_child_stdio(request: &SpawnRequest<'_, OwnedFd>) -> nix::Result<()> {
    unistd::dup2_stdin(request.stdin)?;
    unistd::close(request.stdin.as_raw_fd())?;
    if let Some(pipe) = &request.stdout {
        unistd::dup2_stdout(pipe.write)?;
        unistd::close(pipe.read.as_raw_fd())?;
        unistd::close(pipe.write.as_raw_fd())?;
    }
    Ok(())
}

fn exit_child(failure: ChildFailure, exec_diagnostic: &[u8]) -> ! {
    let message = match failure {
        ChildFailure::Rebind(_) => FATAL_DIAGNOSTIC,
        ChildFailure::Exec(_) => exec_diagnostic,
    };
    unistd::write(io::stderr(), message).ok();
    // SAFETY: `_exit` is async-signal-safe and skips atexit handlers and stdio
    // flushing, which belong to the parent's copy of the process.
    unsafe { nix::libc::_exit(CHILD_FAILURE_STATUS) }
}

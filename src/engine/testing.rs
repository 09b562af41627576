//! Test doubles: a `Sys` that spawns nothing and keeps a ledger of every
//! descriptor it hands out.

use crate::engine::sys::{SpawnRequest, Sys};
use nix::errno::Errno;
use nix::sys::signal::Signal;
use nix::sys::wait::WaitStatus;
use nix::unistd::Pid;
use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::sync::{Arc, Mutex};

#[derive(Default)]
struct Ledger {
    next_fd: i32,
    /// fd number -> what it currently refers to
    open: BTreeMap<i32, String>,
    double_closes: Vec<i32>,
}

/// Scoped fake descriptor; dropping it closes it in the ledger.
pub struct FakeFd {
    number: i32,
    ledger: Rc<RefCell<Ledger>>,
}

impl Drop for FakeFd {
    fn drop(&mut self) {
        let mut ledger = self.ledger.borrow_mut();
        if ledger.open.remove(&self.number).is_none() {
            ledger.double_closes.push(self.number);
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpawnRecord {
    pub pid: Pid,
    pub argv: Vec<String>,
    pub program: String,
    pub stdin: String,
    pub stdout: Option<String>,
    pub exec_diagnostic: String,
}

#[derive(Debug, Clone, Copy)]
enum Script {
    Exit(i32),
    Killed,
}

pub struct FakeSys {
    ledger: Rc<RefCell<Ledger>>,
    pipes: u32,
    next_pid: i32,
    scripts: HashMap<String, Script>,
    live: HashMap<Pid, String>,
    pub spawns: Vec<SpawnRecord>,
    pub waited: Vec<Pid>,
    pub chdirs: Vec<PathBuf>,
    pub missing_dirs: Vec<PathBuf>,
    pub fail_pipe: bool,
    pub fail_spawn: bool,
    pub fail_rebind: bool,
    pub fail_restore: bool,
}

impl FakeSys {
    pub fn new() -> Self {
        Self {
            ledger: Rc::new(RefCell::new(Ledger { next_fd: 3, ..Ledger::default() })),
            pipes: 0,
            next_pid: 100,
            scripts: HashMap::new(),
            live: HashMap::new(),
            spawns: Vec::new(),
            waited: Vec::new(),
            chdirs: Vec::new(),
            missing_dirs: Vec::new(),
            fail_pipe: false,
            fail_spawn: false,
            fail_rebind: false,
            fail_restore: false,
        }
    }

    /// Children running `program` exit with `code`.
    pub fn exit_with(&mut self, program: &str, code: i32) {
        self.scripts.insert(program.to_string(), Script::Exit(code));
    }

    /// Children running `program` are terminated by a signal.
    pub fn killed(&mut self, program: &str) {
        self.scripts.insert(program.to_string(), Script::Killed);
    }

    pub fn open_fds(&self) -> Vec<i32> {
        self.ledger.borrow().open.keys().copied().collect()
    }

    pub fn double_closes(&self) -> Vec<i32> {
        self.ledger.borrow().double_closes.clone()
    }

    pub fn referent(&self, fd: &FakeFd) -> String {
        self.ledger.borrow().open.get(&fd.number).cloned().unwrap_or_else(|| "closed".to_string())
    }

    pub fn spawned_programs(&self) -> Vec<&str> {
        self.spawns.iter().map(|s| s.program.as_str()).collect()
    }

    fn allocate(&self, referent: String) -> FakeFd {
        let mut ledger = self.ledger.borrow_mut();
        let number = ledger.next_fd;
        ledger.next_fd += 1;
        ledger.open.insert(number, referent);
        FakeFd { number, ledger: self.ledger.clone() }
    }

    fn set_referent(&self, fd: &FakeFd, referent: String) {
        self.ledger.borrow_mut().open.insert(fd.number, referent);
    }
}

impl Sys for FakeSys {
    type Fd = FakeFd;

    fn dup_stdin(&mut self) -> nix::Result<FakeFd> {
        Ok(self.allocate("stdin".to_string()))
    }

    fn pipe(&mut self) -> nix::Result<(FakeFd, FakeFd)> {
        if self.fail_pipe {
            return Err(Errno::EMFILE);
        }
        self.pipes += 1;
        let read = self.allocate(format!("pipe {} read", self.pipes));
        let write = self.allocate(format!("pipe {} write", self.pipes));
        Ok((read, write))
    }

    fn rebind(&mut self, src: &FakeFd, slot: &mut FakeFd) -> nix::Result<()> {
        if self.fail_rebind {
            return Err(Errno::EBADF);
        }
        let referent = self.referent(src);
        self.set_referent(slot, referent);
        Ok(())
    }

    fn restore_stdin(&mut self, slot: &mut FakeFd) -> nix::Result<()> {
        if self.fail_restore {
            return Err(Errno::EBADF);
        }
        self.set_referent(slot, "stdin".to_string());
        Ok(())
    }

    fn spawn(&mut self, request: &SpawnRequest<'_, FakeFd>) -> nix::Result<Pid> {
        if self.fail_spawn {
            return Err(Errno::EAGAIN);
        }
        let pid = Pid::from_raw(self.next_pid);
        self.next_pid += 1;

        let program = request.program.to_string_lossy().into_owned();
        let record = SpawnRecord {
            pid,
            argv: request.argv.iter().map(|a| a.to_string_lossy().into_owned()).collect(),
            program: program.clone(),
            stdin: self.referent(request.stdin),
            stdout: request.stdout.as_ref().map(|p| self.referent(p.write)),
            exec_diagnostic: String::from_utf8_lossy(request.exec_diagnostic).into_owned(),
        };
        self.spawns.push(record);
        self.live.insert(pid, program);
        Ok(pid)
    }

    fn wait(&mut self, pid: Pid) -> nix::Result<WaitStatus> {
        let program = self.live.remove(&pid).ok_or(Errno::ECHILD)?;
        self.waited.push(pid);
        match self.scripts.get(&program).copied().unwrap_or(Script::Exit(0)) {
            Script::Exit(code) => Ok(WaitStatus::Exited(pid, code)),
            Script::Killed => Ok(WaitStatus::Signaled(pid, Signal::SIGKILL, false)),
        }
    }

    fn change_dir(&mut self, path: &Path) -> nix::Result<()> {
        if self.missing_dirs.iter().any(|p| p == path) {
            return Err(Errno::ENOENT);
        }
        self.chdirs.push(path.to_path_buf());
        Ok(())
    }

    fn fd_number(fd: &FakeFd) -> i32 {
        fd.number
    }
}

/// Clonable in-memory diagnostics sink.
#[derive(Clone, Default)]
pub struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

impl SharedBuffer {
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().write(buf)
    }
    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

use crate::engine::error::EngineError;
use crate::engine::sys::{Posix, Sys};
use crate::engine::tracker::StdinTracker;
use log::{debug, warn};
use nix::unistd::Pid;
use std::ffi::{CString, OsStr, OsString};
use std::io::Write;
use std::os::unix::ffi::OsStrExt;

/// The environment handed to every child, passed through as-is.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Environment {
    vars: Vec<(OsString, OsString)>,
}

impl Environment {
    pub fn inherit() -> Self {
        Self {
            vars: std::env::vars_os().collect(),
        }
    }

    /// Replaces an existing entry in place, otherwise appends.
    pub fn set(&mut self, key: impl Into<OsString>, value: impl Into<OsString>) {
        let key = key.into();
        let value = value.into();
        match self.vars.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.vars.push((key, value)),
        }
    }

    pub fn get(&self, key: impl AsRef<OsStr>) -> Option<&OsStr> {
        let key = key.as_ref();
        self.vars.iter().find(|(k, _)| k == key).map(|(_, v)| v.as_os_str())
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    /// `KEY=VALUE` entries for `execve`; entries with interior NULs are dropped.
    pub fn to_envp(&self) -> Vec<CString> {
        self.vars
            .iter()
            .filter_map(|(k, v)| {
                let mut entry = k.as_bytes().to_vec();
                entry.push(b'=');
                entry.extend_from_slice(v.as_bytes());
                CString::new(entry).ok()
            })
            .collect()
    }
}

impl<K: Into<OsString>, V: Into<OsString>> Extend<(K, V)> for Environment {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (k, v) in iter {
            self.set(k, v);
        }
    }
}

/// State threaded through every run: the OS seam, the stdin tracker, the
/// child environment and the pipe stages nobody has waited for yet.
pub struct ShellContext<S: Sys> {
    pub sys: S,
    pub tracker: StdinTracker<S::Fd>,
    pub env: Environment,
    pub search_path: bool,
    pub exit_code: i32,
    pending: Vec<Pid>,
    diagnostics: Box<dyn Write>,
}

impl ShellContext<Posix> {
    pub fn new(env: Environment) -> Result<Self, EngineError> {
        Self::with_sys(Posix, env)
    }
}

impl<S: Sys> ShellContext<S> {
    pub fn with_sys(mut sys: S, env: Environment) -> Result<Self, EngineError> {
        let tracker = StdinTracker::open(&mut sys)?;
        Ok(Self {
            sys,
            tracker,
            env,
            search_path: false,
            exit_code: 0,
            pending: Vec::new(),
            diagnostics: Box::new(std::io::stderr()),
        })
    }

    #[cfg(test)]
    pub fn with_diagnostics(mut self, sink: Box<dyn Write>) -> Self {
        self.diagnostics = sink;
        self
    }

    pub fn report(&mut self, error: &EngineError) {
        self.diagnostics.write_all(error.diagnostic().as_bytes()).ok();
        self.diagnostics.flush().ok();
    }

    pub fn pending(&self) -> &[Pid] {
        &self.pending
    }

    pub(crate) fn push_pending(&mut self, pid: Pid) {
        self.pending.push(pid);
    }

    /// Waits for every unawaited pipe stage in launch order; statuses are ignored.
    pub(crate) fn reap_pending(&mut self) {
        for pid in std::mem::take(&mut self.pending) {
            match self.sys.wait(pid) {
                Ok(status) => debug!("reaped pipe stage {}: {:?}", pid, status),
                Err(e) => warn!("could not reap pipe stage {}: {}", pid, e),
            }
        }
    }
}

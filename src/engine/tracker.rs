use crate::engine::error::EngineError;
use crate::engine::sys::Sys;
use log::debug;

/// The descriptor that feeds the next stage's standard input.
///
/// Holds a duplicate of the engine's stdin for its whole life. A pipe stage
/// rebinds it to the pipe's read end, and every awaited stage (and the end of
/// every run) rebinds it back. The descriptor number never changes.
pub struct StdinTracker<F> {
    fd: F,
    redirected: bool,
}

impl<F> StdinTracker<F> {
    pub fn open<S: Sys<Fd = F>>(sys: &mut S) -> Result<Self, EngineError> {
        let fd = sys.dup_stdin()?;
        debug!("stdin tracker opened on fd {}", S::fd_number(&fd));
        Ok(Self { fd, redirected: false })
    }

    pub fn fd(&self) -> &F {
        &self.fd
    }

    pub fn is_redirected(&self) -> bool {
        self.redirected
    }

    /// Takes ownership of `read_end`; it is closed once the tracker refers to it.
    pub fn redirect<S: Sys<Fd = F>>(&mut self, sys: &mut S, read_end: F) -> Result<(), EngineError> {
        sys.rebind(&read_end, &mut self.fd)?;
        debug!(
            "stdin tracker fd {} now reads from pipe fd {}",
            S::fd_number(&self.fd),
            S::fd_number(&read_end)
        );
        self.redirected = true;
        Ok(())
    }

    pub fn restore<S: Sys<Fd = F>>(&mut self, sys: &mut S) -> Result<(), EngineError> {
        sys.restore_stdin(&mut self.fd)?;
        self.redirected = false;
        Ok(())
    }
}

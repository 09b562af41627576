use nix::errno::Errno;
use thiserror::Error;

/// Failures that halt a pipeline. The `Display` text is the literal diagnostic
/// (without the leading `error: `) and must not change.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EngineError {
    #[error("cd: bad arguments")]
    BuiltinArgs,

    #[error("cd: cannot change directory to {0}")]
    BuiltinChdir(String),

    #[error("fatal")]
    Fatal(#[source] Errno),

    /// Raised by the child after a failed exec; the parent only sees exit status 1.
    #[error("cannot execute {program}")]
    Exec { program: String },
}

impl EngineError {
    pub fn exit_code(&self) -> i32 {
        1
    }

    pub fn is_fatal(&self) -> bool {
        matches!(self, EngineError::Fatal(_))
    }

    pub fn diagnostic(&self) -> String {
        format!("error: {}\n", self)
    }
}

impl From<Errno> for EngineError {
    fn from(errno: Errno) -> Self {
        EngineError::Fatal(errno)
    }
}

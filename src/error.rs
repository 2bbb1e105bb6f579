// error.rs

use std::io;
use std::path::PathBuf;

use nix::errno::Errno;
use rustyline::error::ReadlineError;
use thiserror::Error;

/// Everything that can go wrong inside the shell core.
///
/// Variants split into two groups. Fatal ones end the session; the rest are
/// reported to the user where they are detected and the loop carries on.
#[derive(Debug, Error)]
pub enum ShellError {
    #[error("fork failed: {0}")]
    Fork(#[source] Errno),

    #[error("waiting for child {pid} failed: {source}")]
    Wait {
        pid: i32,
        #[source]
        source: Errno,
    },

    #[error("cannot install SIGCHLD handler: {0}")]
    SignalSetup(#[source] Errno),

    #[error("cannot change signal mask: {0}")]
    SignalMask(#[source] Errno),

    #[error("line editor failed: {0}")]
    Readline(#[from] ReadlineError),

    #[error(transparent)]
    Io(#[from] io::Error),

    #[error("!{0}: event not found")]
    ReplayNotFound(u64),

    #[error("{0}: invalid history reference")]
    InvalidReplay(String),

    #[error("cd: {}: {source}", .path.display())]
    ChangeDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("cd: HOME not set")]
    NoHome,

    #[error("{builtin}: {arg}: numeric argument required")]
    BadArgument { builtin: &'static str, arg: String },
}

impl ShellError {
    /// Fatal errors terminate the shell; all others are reported and absorbed.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            ShellError::Fork(_)
                | ShellError::Wait { .. }
                | ShellError::SignalSetup(_)
                | ShellError::SignalMask(_)
                | ShellError::Readline(_)
                | ShellError::Io(_)
        )
    }
}

pub type Result<T, E = ShellError> = std::result::Result<T, E>;

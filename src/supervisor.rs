// supervisor.rs

use std::ffi::CString;

use log::debug;
use nix::errno::Errno;
use nix::sys::signal::{SigSet, SigmaskHow, Signal};
use nix::sys::wait::{waitpid, WaitPidFlag, WaitStatus};
use nix::unistd::{fork, write, ForkResult, Pid};

use crate::error::{Result, ShellError};

/// Exit status of a child whose program could not be executed.
pub const EXEC_FAILURE_STATUS: i32 = 127;

/// How a foreground child finished its turn on the terminal.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ForegroundOutcome {
    Exited(i32),
    Signaled(Signal),
    Stopped(Signal),
    /// The child was already collected by someone else.
    Vanished,
}

/// Everything the child needs after `fork`, built up front so the child
/// never allocates.
struct ExecImage {
    args: Vec<CString>,
    arg_ptrs: Vec<*const libc::c_char>,
    failure_message: Vec<u8>,
}

impl ExecImage {
    fn new(argv: &[String]) -> Option<Self> {
        let args = argv
            .iter()
            .map(|arg| CString::new(arg.as_bytes()))
            .collect::<std::result::Result<Vec<_>, _>>()
            .ok()?;
        let name = argv.first()?;
        let arg_ptrs = args
            .iter()
            .map(|arg| arg.as_ptr())
            .chain(std::iter::once(std::ptr::null()))
            .collect();
        let failure_message = format!("Error: Invalid command: {name}\n").into_bytes();
        Some(Self { args, arg_ptrs, failure_message })
    }

    /// Replaces the process image; returns only if exec failed.
    fn exec(&self) {
        // SAFETY: `arg_ptrs` is a null-terminated array of pointers into `args`,
        // which outlives the call.
        unsafe {
            libc::execvp(self.args[0].as_ptr(), self.arg_ptrs.as_ptr());
        }
    }
}

/// Blocks `SIGCHLD` for the calling thread until dropped.
struct ChildSignalGuard {
    previous: SigSet,
}

impl ChildSignalGuard {
    fn block() -> Result<Self> {
        let mut set = SigSet::empty();
        set.add(Signal::SIGCHLD);
        let previous = set
            .thread_swap_mask(SigmaskHow::SIG_BLOCK)
            .map_err(ShellError::SignalMask)?;
        Ok(Self { previous })
    }
}

impl Drop for ChildSignalGuard {
    fn drop(&mut self) {
        if let Err(e) = self.previous.thread_set_mask() {
            log::error!("failed to restore signal mask: {e}");
        }
    }
}

/// Runs `argv` and blocks until that child exits or stops.
///
/// `SIGCHLD` stays blocked for the whole wait so the reaper cannot collect
/// this child; any notification raised meanwhile is delivered once the mask
/// is restored.
pub fn run_foreground(argv: &[String]) -> Result<ForegroundOutcome> {
    let guard = ChildSignalGuard::block()?;
    let pid = spawn(argv, &guard.previous)?;
    debug!("foreground child {pid} started");
    let outcome = wait_for(pid)?;
    debug!("foreground child {pid}: {outcome:?}");
    drop(guard);
    Ok(outcome)
}

/// Runs `argv` without waiting; the reaper collects it later.
pub fn run_background(argv: &[String]) -> Result<Pid> {
    let guard = ChildSignalGuard::block()?;
    let pid = spawn(argv, &guard.previous)?;
    debug!("background child {pid} started");
    Ok(pid)
}

fn spawn(argv: &[String], child_mask: &SigSet) -> Result<Pid> {
    let image = ExecImage::new(argv);
    // SAFETY: the child only calls async-signal-safe functions before exec or _exit.
    match unsafe { fork() } {
        Ok(ForkResult::Parent { child }) => Ok(child),
        Ok(ForkResult::Child) => {
            let _ = child_mask.thread_set_mask();
            if let Some(image) = &image {
                image.exec();
                let _ = write(libc::STDERR_FILENO, &image.failure_message);
            } else {
                let _ = write(libc::STDERR_FILENO, b"Error: Invalid command\n");
            }
            unsafe { libc::_exit(EXEC_FAILURE_STATUS) }
        }
        Err(e) => Err(ShellError::Fork(e)),
    }
}

fn wait_for(pid: Pid) -> Result<ForegroundOutcome> {
    loop {
        match waitpid(pid, Some(WaitPidFlag::WUNTRACED)) {
            Ok(WaitStatus::Exited(_, code)) => return Ok(ForegroundOutcome::Exited(code)),
            Ok(WaitStatus::Signaled(_, sig, _)) => return Ok(ForegroundOutcome::Signaled(sig)),
            Ok(WaitStatus::Stopped(_, sig)) => return Ok(ForegroundOutcome::Stopped(sig)),
            Ok(_) | Err(Errno::EINTR) => continue,
            Err(Errno::ECHILD) => return Ok(ForegroundOutcome::Vanished),
            Err(source) => {
                return Err(ShellError::Wait {
                    pid: pid.as_raw(),
                    source,
                })
            }
        }
    }
}

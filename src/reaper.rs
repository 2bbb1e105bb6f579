// reaper.rs

use std::sync::atomic::{AtomicUsize, Ordering};

use nix::errno::Errno;
use nix::sys::signal::{sigaction, SaFlags, SigAction, SigHandler, SigSet, Signal};
use nix::sys::wait::{waitpid, WaitPidFlag, WaitStatus};
use nix::unistd::{write, Pid};

use crate::error::{Result, ShellError};

static REAPED_TOTAL: AtomicUsize = AtomicUsize::new(0);
static REAPED_UNSEEN: AtomicUsize = AtomicUsize::new(0);

const NOTICE_PREFIX: &[u8] = b"reaped child ";
const NOTICE_LEN: usize = 48;

/// Registers the `SIGCHLD` handler. Stopped children do not raise it.
pub fn install() -> Result<()> {
    let action = SigAction::new(
        SigHandler::Handler(on_sigchld),
        SaFlags::SA_NOCLDSTOP,
        SigSet::empty(),
    );
    // SAFETY: the handler only calls waitpid, write and atomics.
    unsafe { sigaction(Signal::SIGCHLD, &action) }.map_err(ShellError::SignalSetup)?;
    Ok(())
}

extern "C" fn on_sigchld(_signal: libc::c_int) {
    let _errno = SavedErrno::save();
    drain_terminated(|pid, _| announce(pid));
}

/// Collects every child that has already terminated, without blocking.
///
/// `on_reaped` runs once per collected child. Returns how many were
/// collected; zero when nothing had terminated yet or there are no children.
pub fn drain_terminated<F>(mut on_reaped: F) -> usize
where
    F: FnMut(Pid, WaitStatus),
{
    let mut reaped = 0;
    loop {
        match waitpid(Pid::from_raw(-1), Some(WaitPidFlag::WNOHANG)) {
            Ok(WaitStatus::StillAlive) => break,
            Ok(status @ (WaitStatus::Exited(..) | WaitStatus::Signaled(..))) => {
                if let Some(pid) = status.pid() {
                    reaped += 1;
                    on_reaped(pid, status);
                }
            }
            Ok(_) | Err(Errno::EINTR) => continue,
            // ECHILD: nothing left to wait for.
            Err(_) => break,
        }
    }
    if reaped > 0 {
        REAPED_TOTAL.fetch_add(reaped, Ordering::Relaxed);
        REAPED_UNSEEN.fetch_add(reaped, Ordering::Relaxed);
    }
    reaped
}

/// Children reaped since the previous call.
pub fn take_reaped() -> usize {
    REAPED_UNSEEN.swap(0, Ordering::Relaxed)
}

pub fn total_reaped() -> usize {
    REAPED_TOTAL.load(Ordering::Relaxed)
}

/// Prints the reap notice straight to stdout. While the line editor holds the
/// terminal in raw mode, the notice can land inside a half-typed line.
fn announce(pid: Pid) {
    let mut buf = [0u8; NOTICE_LEN];
    let len = format_notice(&mut buf, pid.as_raw());
    let _ = write(libc::STDOUT_FILENO, &buf[..len]);
}

/// Writes `reaped child <pid>\n` into `buf` without allocating.
fn format_notice(buf: &mut [u8; NOTICE_LEN], pid: i32) -> usize {
    buf[..NOTICE_PREFIX.len()].copy_from_slice(NOTICE_PREFIX);
    let mut len = NOTICE_PREFIX.len();

    let mut digits = [0u8; 12];
    let mut n = pid.unsigned_abs();
    let mut count = 0;
    loop {
        digits[count] = b'0' + (n % 10) as u8;
        count += 1;
        n /= 10;
        if n == 0 {
            break;
        }
    }
    if pid < 0 {
        buf[len] = b'-';
        len += 1;
    }
    for &d in digits[..count].iter().rev() {
        buf[len] = d;
        len += 1;
    }
    buf[len] = b'\n';
    len + 1
}

/// Restores `errno` on drop so the interrupted code sees its own value.
struct SavedErrno(i32);

impl SavedErrno {
    fn save() -> Self {
        Self(Errno::last() as i32)
    }
}

impl Drop for SavedErrno {
    fn drop(&mut self) {
        set_errno(self.0);
    }
}

#[cfg(any(target_os = "linux", target_os = "android"))]
fn set_errno(value: i32) {
    unsafe { *libc::__errno_location() = value }
}

#[cfg(any(target_os = "macos", target_os = "ios"))]
fn set_errno(value: i32) {
    unsafe { *libc::__error() = value }
}

#[cfg(not(any(
    target_os = "linux",
    target_os = "android",
    target_os = "macos",
    target_os = "ios"
)))]
fn set_errno(_value: i32) {}

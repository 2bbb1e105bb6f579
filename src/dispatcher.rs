// dispatcher.rs

use std::io::Write;

use log::debug;

use crate::builtins::{change_dir, exit_status, print_history, Builtin};
use crate::error::{Result, ShellError};
use crate::history::{truncate_line, History, HISTORY_CAPACITY};
use crate::parser::{parse_command, parse_replay, ParsedCommand, ReplayRef};
use crate::supervisor::{run_background, run_foreground};
use crate::util::writeln_ignore_broken_pipe;

/// What the read loop should do after a line has been handled.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Exit(i32),
}

/// Routes command lines to built-ins or the process supervisor and keeps the
/// history log. Diagnostics and built-in output go to `out`.
pub struct Dispatcher<W: Write, const N: usize = HISTORY_CAPACITY> {
    history: History<N>,
    out: W,
}

impl<W: Write, const N: usize> Dispatcher<W, N> {
    pub fn new(history: History<N>, out: W) -> Self {
        Self { history, out }
    }

    pub fn history(&self) -> &History<N> {
        &self.history
    }

    pub fn into_output(self) -> W {
        self.out
    }

    /// Handles one raw input line: replay expansion, history, execution.
    ///
    /// Recoverable failures are reported on the output and yield
    /// `Flow::Continue`; only fatal errors are returned.
    pub fn handle_line(&mut self, raw: &str) -> Result<Flow> {
        // Only the terminator goes; an escaped trailing space is part of the
        // command. The cut matches what history stores, so replays run the same.
        let line = truncate_line(raw.trim_end_matches(['\n', '\r']));
        if line.trim().is_empty() {
            return Ok(Flow::Continue);
        }
        debug!("read {line:?}");

        let line = match self.expand_replay(line) {
            Ok(line) => line,
            Err(e) => return self.recover(e),
        };
        let command = parse_command(&line);
        self.dispatch(&line, &command)
    }

    /// Substitutes a `!id` reference with the recorded line.
    fn expand_replay(&self, line: &str) -> Result<String> {
        match parse_replay(line) {
            None => Ok(line.to_string()),
            Some(ReplayRef::Id(id)) => {
                let text = self.history.find(id).ok_or(ShellError::ReplayNotFound(id))?;
                debug!("replaying !{id}: {text:?}");
                Ok(text.to_string())
            }
            Some(ReplayRef::Invalid) => Err(ShellError::InvalidReplay(line.to_string())),
        }
    }

    /// Records `line` in history, then runs `command`.
    pub fn dispatch(&mut self, line: &str, command: &ParsedCommand) -> Result<Flow> {
        let id = self.history.append(line);
        let Some(name) = command.name() else {
            return Ok(Flow::Continue);
        };
        debug!("dispatching #{id} {:?} (background: {})", command.argv, command.background);

        let result = match Builtin::lookup(name) {
            Some(builtin) => self.run_builtin(builtin, &command.argv),
            None if command.background => run_background(&command.argv).map(|_| Flow::Continue),
            None => run_foreground(&command.argv).map(|_| Flow::Continue),
        };
        match result {
            Err(e) if !e.is_fatal() => self.recover(e),
            other => other,
        }
    }

    fn run_builtin(&mut self, builtin: Builtin, argv: &[String]) -> Result<Flow> {
        let arg = argv.get(1).map(String::as_str);
        match builtin {
            Builtin::Exit => match exit_status(arg) {
                Ok(code) => Ok(Flow::Exit(code)),
                Err(e) => {
                    self.report(&e)?;
                    Ok(Flow::Exit(2))
                }
            },
            Builtin::Cd => {
                let dir = change_dir(arg)?;
                debug!("cwd is now {}", dir.display());
                Ok(Flow::Continue)
            }
            Builtin::History => {
                print_history(&mut self.out, &self.history, arg)?;
                Ok(Flow::Continue)
            }
        }
    }

    fn recover(&mut self, e: ShellError) -> Result<Flow> {
        if e.is_fatal() {
            return Err(e);
        }
        self.report(&e)?;
        Ok(Flow::Continue)
    }

    fn report(&mut self, e: &ShellError) -> Result<()> {
        writeln_ignore_broken_pipe(&mut self.out, format!("Error: {e}"))?;
        self.out.flush()?;
        Ok(())
    }
}

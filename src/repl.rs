// repl.rs

use std::io::{self, BufRead, Write};

use log::debug;
use rustyline::error::ReadlineError;
use rustyline::history::DefaultHistory;
use rustyline::{CompletionType, Config, Editor};

use crate::completion::ShellHelper;
use crate::dispatcher::{Dispatcher, Flow};
use crate::error::{Result, ShellError};
use crate::reaper;
use crate::util::write_prompt;

/// Result of one attempt to read a command line.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ReadOutcome {
    Line(String),
    /// Nothing was read because a signal arrived; read again.
    Interrupted,
    Eof,
}

pub trait LineReader {
    fn read_line(&mut self, prompt: &str) -> Result<ReadOutcome>;
}

/// Interactive reader backed by rustyline.
pub struct EditorReader {
    editor: Editor<ShellHelper, DefaultHistory>,
}

impl EditorReader {
    pub fn new() -> Result<Self> {
        let config = Config::builder().completion_type(CompletionType::List).build();
        let mut editor = Editor::with_config(config)?;
        editor.set_helper(Some(ShellHelper::new()));
        Ok(Self { editor })
    }
}

impl LineReader for EditorReader {
    fn read_line(&mut self, prompt: &str) -> Result<ReadOutcome> {
        match self.editor.readline(prompt) {
            Ok(line) => {
                if !line.trim().is_empty() {
                    let _ = self.editor.add_history_entry(line.as_str());
                }
                Ok(ReadOutcome::Line(line))
            }
            Err(ReadlineError::Eof) => Ok(ReadOutcome::Eof),
            // Ctrl-C at the prompt discards the line.
            Err(ReadlineError::Interrupted) => Ok(ReadOutcome::Interrupted),
            Err(ReadlineError::Io(e)) if e.kind() == io::ErrorKind::Interrupted => {
                Ok(ReadOutcome::Interrupted)
            }
            Err(ReadlineError::Errno(errno)) if errno as i32 == libc::EINTR => {
                Ok(ReadOutcome::Interrupted)
            }
            Err(e) => Err(e.into()),
        }
    }
}

/// Reader for non-interactive input; prints the prompt to `prompt_out`.
pub struct StdinReader<R: BufRead, W: Write> {
    input: R,
    prompt_out: W,
}

impl<R: BufRead, W: Write> StdinReader<R, W> {
    pub fn new(input: R, prompt_out: W) -> Self {
        Self { input, prompt_out }
    }
}

impl<R: BufRead, W: Write> LineReader for StdinReader<R, W> {
    fn read_line(&mut self, prompt: &str) -> Result<ReadOutcome> {
        write_prompt(&mut self.prompt_out, prompt)?;
        let mut line = String::new();
        match self.input.read_line(&mut line) {
            Ok(0) => Ok(ReadOutcome::Eof),
            Ok(_) => Ok(ReadOutcome::Line(line)),
            Err(e) if e.kind() == io::ErrorKind::Interrupted => Ok(ReadOutcome::Interrupted),
            Err(e) => Err(ShellError::Io(e)),
        }
    }
}

/// Reads and dispatches lines until `exit` or end of input.
///
/// Returns the status the shell should exit with. Only fatal errors end the
/// loop early.
pub fn run<R, W, const N: usize>(
    reader: &mut R,
    dispatcher: &mut Dispatcher<W, N>,
    prompt: &str,
) -> Result<i32>
where
    R: LineReader + ?Sized,
    W: Write,
{
    loop {
        let line = match reader.read_line(prompt)? {
            ReadOutcome::Line(line) => line,
            ReadOutcome::Interrupted => {
                debug!("read interrupted, prompting again");
                continue;
            }
            ReadOutcome::Eof => {
                debug!("end of input");
                return Ok(0);
            }
        };

        let flow = dispatcher.handle_line(&line)?;

        let reaped = reaper::take_reaped();
        if reaped > 0 {
            debug!("{reaped} background children reaped since last prompt");
        }
        if let Flow::Exit(code) = flow {
            return Ok(code);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::History;
    use std::collections::VecDeque;
    use std::io::Cursor;

    struct Scripted(VecDeque<Result<ReadOutcome>>);

    impl Scripted {
        fn new(outcomes: Vec<Result<ReadOutcome>>) -> Self {
            Self(outcomes.into())
        }
    }

    impl LineReader for Scripted {
        fn read_line(&mut self, _prompt: &str) -> Result<ReadOutcome> {
            self.0.pop_front().unwrap_or(Ok(ReadOutcome::Eof))
        }
    }

    fn line(text: &str) -> Result<ReadOutcome> {
        Ok(ReadOutcome::Line(format!("{text}\n")))
    }

    fn dispatcher() -> Dispatcher<Vec<u8>, 3> {
        Dispatcher::new(History::new(), Vec::new())
    }

    #[test]
    fn interruption_is_retried() {
        let mut reader = Scripted::new(vec![
            Ok(ReadOutcome::Interrupted),
            line("history"),
            Ok(ReadOutcome::Interrupted),
            Ok(ReadOutcome::Interrupted),
            line("history"),
        ]);
        let mut d = dispatcher();
        assert_eq!(run(&mut reader, &mut d, "$ ").unwrap(), 0);
        assert_eq!(d.history().len(), 2);
    }

    #[test]
    fn exit_stops_reading() {
        let mut reader = Scripted::new(vec![line("exit 3"), line("history")]);
        let mut d = dispatcher();
        assert_eq!(run(&mut reader, &mut d, "$ ").unwrap(), 3);
        assert_eq!(d.history().len(), 1);
        assert_eq!(reader.0.len(), 1);
    }

    #[test]
    fn recoverable_errors_keep_the_loop_going() {
        let mut reader = Scripted::new(vec![line("!9"), line("history")]);
        let mut d = dispatcher();
        assert_eq!(run(&mut reader, &mut d, "$ ").unwrap(), 0);
        let out = String::from_utf8(d.into_output()).unwrap();
        assert_eq!(out, "Error: !9: event not found\n1\thistory\n");
    }

    #[test]
    fn reader_failure_is_fatal() {
        let failure = io::Error::new(io::ErrorKind::Other, "tty gone");
        let mut reader = Scripted::new(vec![line("history"), Err(ShellError::Io(failure))]);
        let mut d = dispatcher();
        let err = run(&mut reader, &mut d, "$ ").unwrap_err();
        assert!(err.is_fatal());
    }

    #[test]
    fn stdin_reader_prompts_and_reads() {
        let mut prompts = Vec::new();
        let mut reader = StdinReader::new(Cursor::new("ls -l\nhistory"), &mut prompts);
        assert_eq!(reader.read_line("> ").unwrap(), ReadOutcome::Line("ls -l\n".into()));
        assert_eq!(reader.read_line("> ").unwrap(), ReadOutcome::Line("history".into()));
        assert_eq!(reader.read_line("> ").unwrap(), ReadOutcome::Eof);
        drop(reader);
        assert_eq!(prompts, b"> > > ");
    }
}

// completion.rs

use std::ffi::OsStr;
use std::os::unix::fs::PermissionsExt;

use itertools::Itertools;
use rustyline::completion::{Completer, FilenameCompleter, Pair};
use rustyline::error::ReadlineError;
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::validate::{ValidationContext, ValidationResult, Validator};
use rustyline::{Context, Helper};

use crate::builtins::Builtin;

/// Line-editor helper: command names in the first word, file names after.
pub struct ShellHelper {
    files: FilenameCompleter,
}

impl ShellHelper {
    pub fn new() -> Self {
        Self {
            files: FilenameCompleter::new(),
        }
    }
}

impl Default for ShellHelper {
    fn default() -> Self {
        Self::new()
    }
}

/// Built-ins and executables on `path_var` whose name starts with `prefix`,
/// sorted and without duplicates.
pub fn command_candidates(prefix: &str, path_var: Option<&OsStr>) -> Vec<String> {
    let builtins = Builtin::NAMES
        .iter()
        .filter(|name| name.starts_with(prefix))
        .map(|name| name.to_string());

    let executables = path_var
        .into_iter()
        .flat_map(std::env::split_paths)
        .filter_map(|dir| std::fs::read_dir(dir).ok())
        .flat_map(|entries| entries.flatten())
        .filter_map(|entry| {
            let name = entry.file_name().into_string().ok()?;
            if !name.starts_with(prefix) {
                return None;
            }
            let meta = std::fs::metadata(entry.path()).ok()?;
            (meta.is_file() && meta.permissions().mode() & 0o111 != 0).then_some(name)
        });

    builtins.chain(executables).sorted().dedup().collect()
}

impl Completer for ShellHelper {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        ctx: &Context<'_>,
    ) -> Result<(usize, Vec<Pair>), ReadlineError> {
        let before = &line[..pos];
        let start = before.len() - before.trim_start().len();
        let word = &before[start..];
        if word.contains(char::is_whitespace) {
            return self.files.complete(line, pos, ctx);
        }
        let path_var = std::env::var_os("PATH");
        let pairs = command_candidates(word, path_var.as_deref())
            .into_iter()
            .map(|name| Pair {
                replacement: format!("{name} "),
                display: name,
            })
            .collect();
        Ok((start, pairs))
    }
}

impl Hinter for ShellHelper {
    type Hint = String;
}

impl Highlighter for ShellHelper {}

impl Validator for ShellHelper {
    fn validate(&self, _ctx: &mut ValidationContext) -> Result<ValidationResult, ReadlineError> {
        Ok(ValidationResult::Valid(None))
    }
}

impl Helper for ShellHelper {}

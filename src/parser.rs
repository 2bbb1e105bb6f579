// parser.rs

use log::warn;

/// Upper bound on the number of words in one command.
pub const MAX_ARGS: usize = 128;

pub const BACKGROUND_MARKER: char = '&';
pub const REPLAY_MARKER: char = '!';

/// Argument vector plus the foreground/background tag of one command line.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ParsedCommand {
    pub argv: Vec<String>,
    pub background: bool,
}

impl ParsedCommand {
    pub fn name(&self) -> Option<&str> {
        self.argv.first().map(String::as_str)
    }
}

/// What a line starting with the replay marker refers to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ReplayRef {
    Id(u64),
    Invalid,
}

/// Returns `None` for ordinary lines.
pub fn parse_replay(line: &str) -> Option<ReplayRef> {
    let rest = line.strip_prefix(REPLAY_MARKER)?.trim_end();
    if rest.is_empty() || !rest.bytes().all(|b| b.is_ascii_digit()) {
        return Some(ReplayRef::Invalid);
    }
    Some(rest.parse().map_or(ReplayRef::Invalid, ReplayRef::Id))
}

/// Splits a raw line into words.
///
/// Single quotes preserve everything literally, double quotes allow `\"`,
/// `\\` and `\$` escapes, and a bare backslash escapes the next character.
/// An unquoted `&` ends the current word; the command runs in the background
/// when the last such marker is followed only by whitespace.
pub fn parse_command(line: &str) -> ParsedCommand {
    enum State {
        Normal,
        Single,
        Double,
    }
    let mut argv = Vec::new();
    let mut cur = String::new();
    let mut in_word = false;
    let mut background = false;
    let mut state = State::Normal;
    let mut chars = line.chars().peekable();

    while let Some(ch) = chars.next() {
        match state {
            State::Normal => match ch {
                '\'' => {
                    state = State::Single;
                    in_word = true;
                    background = false;
                }
                '"' => {
                    state = State::Double;
                    in_word = true;
                    background = false;
                }
                '\\' => {
                    if let Some(next) = chars.next() {
                        cur.push(next);
                    }
                    in_word = true;
                    background = false;
                }
                BACKGROUND_MARKER => {
                    finish_word(&mut argv, &mut cur, &mut in_word);
                    background = true;
                }
                c if c.is_whitespace() => finish_word(&mut argv, &mut cur, &mut in_word),
                _ => {
                    cur.push(ch);
                    in_word = true;
                    background = false;
                }
            },
            State::Single => match ch {
                '\'' => state = State::Normal,
                _ => cur.push(ch),
            },
            State::Double => match ch {
                '"' => state = State::Normal,
                '\\' => match chars.peek() {
                    Some(&(next @ ('\\' | '"' | '$'))) => {
                        cur.push(next);
                        chars.next();
                    }
                    _ => cur.push('\\'),
                },
                _ => cur.push(ch),
            },
        }
    }
    finish_word(&mut argv, &mut cur, &mut in_word);

    if argv.len() > MAX_ARGS {
        warn!("dropping {} arguments beyond the limit of {}", argv.len() - MAX_ARGS, MAX_ARGS);
        argv.truncate(MAX_ARGS);
    }
    ParsedCommand { argv, background }
}

fn finish_word(argv: &mut Vec<String>, cur: &mut String, in_word: &mut bool) {
    if *in_word {
        argv.push(std::mem::take(cur));
        *in_word = false;
    }
}

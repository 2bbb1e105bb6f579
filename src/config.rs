// config.rs

use std::env;
use std::io::IsTerminal;

use argh::FromArgs;

pub const DEFAULT_PROMPT: &str = "ttsh> ";
pub const PROMPT_ENV: &str = "TTSH_PROMPT";

#[derive(FromArgs, Debug, Default)]
/// The Tiny Torero Shell: runs commands in the foreground or, with a trailing
/// `&`, in the background, and replays earlier lines with `!<id>`.
pub struct Args {
    /// prompt printed before each line (default: $TTSH_PROMPT or "ttsh> ")
    #[argh(option)]
    pub prompt: Option<String>,

    /// log debug diagnostics to stderr
    #[argh(switch, short = 'v')]
    pub verbose: bool,

    /// read plain lines from stdin even when it is a terminal
    #[argh(switch)]
    pub plain: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InputMode {
    /// Line editor with completion and arrow-key recall.
    Editor,
    /// Buffered stdin, for pipes and scripts.
    Plain,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Config {
    pub prompt: String,
    pub verbose: bool,
    pub input: InputMode,
}

impl Config {
    /// Merges flags with the environment and the terminal state of stdin.
    pub fn resolve(args: Args) -> Self {
        Self::resolve_with(args, env::var(PROMPT_ENV).ok(), std::io::stdin().is_terminal())
    }

    fn resolve_with(args: Args, env_prompt: Option<String>, stdin_is_tty: bool) -> Self {
        let prompt = args
            .prompt
            .or(env_prompt)
            .unwrap_or_else(|| DEFAULT_PROMPT.to_string());
        let input = if stdin_is_tty && !args.plain {
            InputMode::Editor
        } else {
            InputMode::Plain
        };
        Self {
            prompt,
            verbose: args.verbose,
            input,
        }
    }
}

use std::io;

use anyhow::{Context, Result};
use env_logger::Env;
use log::LevelFilter;

use ttsh::config::{Args, Config, InputMode};
use ttsh::repl::{self, EditorReader, LineReader, StdinReader};
use ttsh::{reaper, Dispatcher, History};

fn init_logging(verbose: bool) {
    let default_level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Warn
    };
    let mut builder =
        env_logger::Builder::from_env(Env::default().default_filter_or(default_level.as_str()));
    builder.format_timestamp_millis();
    let _ = builder.try_init();
}

fn run(config: &Config) -> Result<i32> {
    reaper::install().context("setting up background child reaping")?;

    let mut reader: Box<dyn LineReader> = match config.input {
        InputMode::Editor => Box::new(EditorReader::new().context("starting line editor")?),
        InputMode::Plain => Box::new(StdinReader::new(io::stdin().lock(), io::stdout())),
    };
    let history: History = History::new();
    let mut dispatcher = Dispatcher::new(history, io::stdout());
    let code = repl::run(reader.as_mut(), &mut dispatcher, &config.prompt)?;
    Ok(code)
}

fn main() {
    let args: Args = argh::from_env();
    let config = Config::resolve(args);
    init_logging(config.verbose);
    log::debug!("starting with {config:?}");

    match run(&config) {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("ttsh: {e:#}");
            std::process::exit(1);
        }
    }
}

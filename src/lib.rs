//! Core of the Tiny Torero Shell.
//!
//! The [`dispatcher::Dispatcher`] takes one command line at a time, records it
//! in a bounded [`history::History`], and either runs a built-in or hands the
//! command to the [`supervisor`], which forks and execs it in the foreground
//! or background. Background children are collected by the [`reaper`], a
//! `SIGCHLD` handler that drains every terminated child without blocking.

pub mod builtins;
pub mod completion;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod history;
pub mod parser;
pub mod reaper;
pub mod repl;
pub mod supervisor;
pub mod util;

pub use dispatcher::{Dispatcher, Flow};
pub use error::ShellError;
pub use history::{History, HistoryEntry};

// builtins.rs

use std::env;
use std::ffi::OsString;
use std::io::Write;
use std::path::PathBuf;

use crate::error::{Result, ShellError};
use crate::history::History;
use crate::util::writeln_ignore_broken_pipe;

/// Commands the shell runs itself instead of spawning.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Builtin {
    Exit,
    Cd,
    History,
}

impl Builtin {
    pub const NAMES: [&'static str; 3] = ["exit", "cd", "history"];

    /// Case-sensitive lookup by command name.
    pub fn lookup(name: &str) -> Option<Self> {
        match name {
            "exit" => Some(Builtin::Exit),
            "cd" => Some(Builtin::Cd),
            "history" => Some(Builtin::History),
            _ => None,
        }
    }
}

/// Status requested by `exit [n]`.
pub fn exit_status(arg: Option<&str>) -> Result<i32> {
    match arg {
        None => Ok(0),
        Some(raw) => raw.parse().map_err(|_| ShellError::BadArgument {
            builtin: "exit",
            arg: raw.to_string(),
        }),
    }
}

/// Works out where `cd` should go. No argument means `HOME`; a leading `~`
/// component is expanded against it too.
pub fn cd_target(arg: Option<&str>, home: Option<OsString>) -> Result<PathBuf> {
    match arg {
        None | Some("~") => home.map(PathBuf::from).ok_or(ShellError::NoHome),
        Some(path) => match path.strip_prefix("~/") {
            Some(rest) => {
                let home = home.ok_or(ShellError::NoHome)?;
                Ok(PathBuf::from(home).join(rest))
            }
            None => Ok(PathBuf::from(path)),
        },
    }
}

/// Changes the working directory; on failure it is left untouched.
pub fn change_dir(arg: Option<&str>) -> Result<PathBuf> {
    let target = cd_target(arg, env::var_os("HOME"))?;
    env::set_current_dir(&target).map_err(|source| ShellError::ChangeDir {
        path: target.clone(),
        source,
    })?;
    Ok(target)
}

/// Prints resident history entries as `<id>\t<text>`, oldest first.
/// With a count, only the newest `count` entries are shown.
pub fn print_history<W: Write, const N: usize>(
    mut out: W,
    history: &History<N>,
    count: Option<&str>,
) -> Result<()> {
    let skip = match count {
        None => 0,
        Some(raw) => {
            let n: usize = raw.parse().map_err(|_| ShellError::BadArgument {
                builtin: "history",
                arg: raw.to_string(),
            })?;
            history.len().saturating_sub(n)
        }
    };
    for entry in history.iter().skip(skip) {
        writeln_ignore_broken_pipe(&mut out, format!("{}\t{}", entry.id, entry.text))?;
    }
    out.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::path::Path;

    #[test]
    fn lookup_is_case_sensitive() {
        assert_eq!(Builtin::lookup("exit"), Some(Builtin::Exit));
        assert_eq!(Builtin::lookup("cd"), Some(Builtin::Cd));
        assert_eq!(Builtin::lookup("history"), Some(Builtin::History));
        assert_eq!(Builtin::lookup("EXIT"), None);
        assert_eq!(Builtin::lookup("ls"), None);
        for name in Builtin::NAMES {
            assert!(Builtin::lookup(name).is_some());
        }
    }

    #[test]
    fn exit_codes() {
        assert_eq!(exit_status(None).unwrap(), 0);
        assert_eq!(exit_status(Some("3")).unwrap(), 3);
        assert!(matches!(
            exit_status(Some("three")),
            Err(ShellError::BadArgument { builtin: "exit", .. })
        ));
    }

    #[test]
    fn cd_targets() {
        let home = Some(OsString::from("/home/user"));
        assert_eq!(cd_target(None, home.clone()).unwrap(), Path::new("/home/user"));
        assert_eq!(cd_target(Some("~"), home.clone()).unwrap(), Path::new("/home/user"));
        assert_eq!(cd_target(Some("~/src"), home.clone()).unwrap(), Path::new("/home/user/src"));
        assert_eq!(cd_target(Some("/tmp"), home.clone()).unwrap(), Path::new("/tmp"));
        assert_eq!(cd_target(Some("rel/dir"), home).unwrap(), Path::new("rel/dir"));
        assert!(matches!(cd_target(None, None), Err(ShellError::NoHome)));
        assert!(matches!(cd_target(Some("~/x"), None), Err(ShellError::NoHome)));
    }

    #[test]
    #[serial]
    fn change_dir_failure_keeps_cwd() {
        let before = env::current_dir().unwrap();
        let err = change_dir(Some("/nonexistent-path-xyz")).unwrap_err();
        assert!(matches!(err, ShellError::ChangeDir { .. }));
        assert!(!err.is_fatal());
        assert_eq!(env::current_dir().unwrap(), before);
    }

    #[test]
    #[serial]
    fn change_dir_moves() {
        let before = env::current_dir().unwrap();
        let tmp = env::temp_dir().canonicalize().unwrap();
        let target = change_dir(tmp.to_str()).unwrap();
        assert_eq!(target, tmp);
        assert_eq!(env::current_dir().unwrap().canonicalize().unwrap(), tmp);
        env::set_current_dir(before).unwrap();
    }

    #[test]
    fn history_listing() {
        let mut h: History<3> = History::new();
        for cmd in ["a", "b", "c", "d"] {
            h.append(cmd);
        }
        let mut out = Vec::new();
        print_history(&mut out, &h, None).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "2\tb\n3\tc\n4\td\n");

        let mut out = Vec::new();
        print_history(&mut out, &h, Some("2")).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "3\tc\n4\td\n");

        let mut out = Vec::new();
        print_history(&mut out, &h, Some("10")).unwrap();
        assert_eq!(String::from_utf8(out).unwrap().lines().count(), 3);

        let mut out = Vec::new();
        assert!(print_history(&mut out, &h, Some("x")).is_err());
        assert!(out.is_empty());
    }
}

use std::io::Write;
use std::path::Path;
use std::process::{Command, Output, Stdio};

fn run_shell_in(dir: &Path, input: &str) -> Output {
    let mut child = Command::new(env!("CARGO_BIN_EXE_ttsh"))
        .args(["--prompt", ""])
        .current_dir(dir)
        .env_remove("RUST_LOG")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("spawn ttsh");
    child
        .stdin
        .take()
        .expect("stdin")
        .write_all(input.as_bytes())
        .expect("write input");
    child.wait_with_output().expect("wait for ttsh")
}

fn run_shell(input: &str) -> Output {
    run_shell_in(&std::env::temp_dir(), input)
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

#[test]
fn end_of_input_exits_cleanly() {
    let output = run_shell("history\n");
    assert_eq!(output.status.code(), Some(0));
    assert_eq!(stdout(&output), "1\thistory\n");
}

#[test]
fn exit_status_is_propagated() {
    let output = run_shell("exit 5\nhistory\n");
    assert_eq!(output.status.code(), Some(5));
    assert_eq!(stdout(&output), "");
}

#[test]
fn failed_cd_keeps_directory() {
    let dir = std::env::temp_dir().canonicalize().unwrap();
    let output = run_shell_in(&dir, "cd /nonexistent-path-xyz\npwd\n");
    assert_eq!(output.status.code(), Some(0));
    let out = stdout(&output);
    let lines: Vec<&str> = out.lines().collect();
    assert_eq!(lines.len(), 2, "unexpected output: {out:?}");
    assert!(lines[0].starts_with("Error: cd: /nonexistent-path-xyz"));
    assert_eq!(Path::new(lines[1]).canonicalize().unwrap(), dir);
}

#[test]
fn missing_replay_id_is_reported() {
    let output = run_shell("!7\nhistory\n");
    assert_eq!(output.status.code(), Some(0));
    assert_eq!(stdout(&output), "Error: !7: event not found\n1\thistory\n");
}

#[test]
fn replay_runs_and_records_again() {
    let output = run_shell("history\n!1\n");
    assert_eq!(stdout(&output), "1\thistory\n1\thistory\n2\thistory\n");
}

#[test]
fn history_is_bounded() {
    let mut input: String = (0..12).map(|i| format!("history 0 {i}\n")).collect();
    input.push_str("history\n");
    let output = run_shell(&input);
    let out = stdout(&output);
    let ids: Vec<&str> = out.lines().filter_map(|l| l.split('\t').next()).collect();
    assert_eq!(ids, vec!["4", "5", "6", "7", "8", "9", "10", "11", "12", "13"]);
}

#[test]
fn unknown_program_is_reported_by_child() {
    let output = run_shell("ttsh-no-such-program-xyz\nhistory\n");
    assert_eq!(output.status.code(), Some(0));
    assert!(stderr(&output).contains("Error: Invalid command: ttsh-no-such-program-xyz"));
    assert_eq!(stdout(&output), "1\tttsh-no-such-program-xyz\n2\thistory\n");
}

#[test]
fn background_child_is_reaped_once() {
    let output = run_shell("sleep 0.2 &\nsleep 0.8\n");
    assert_eq!(output.status.code(), Some(0));
    let out = stdout(&output);
    let notices: Vec<&str> = out.lines().filter(|l| l.starts_with("reaped child ")).collect();
    assert_eq!(notices.len(), 1, "unexpected output: {out:?}");
    let pid = notices[0].trim_start_matches("reaped child ");
    assert!(pid.parse::<u32>().is_ok(), "bad pid in {:?}", notices[0]);
}

#[test]
fn foreground_output_comes_before_next_prompt() {
    let output = run_shell("echo one\necho two\n");
    assert_eq!(stdout(&output), "one\ntwo\n");
}

//! Command Dispatch
//!
//! Splits a raw line into verb and arguments, routes to the handler, and
//! maps every outcome to exactly one audit entry.

use crate::audit::{LogEntry, LogWriter};
use crate::errors::{HuskError, ResolveError};
use crate::resolver::Resolver;
use crate::session::Session;

/// What one dispatched line produced. The caller prints `output`; state
/// changes have already happened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutcome {
    pub output: String,
    pub should_exit: bool,
}

impl CommandOutcome {
    pub fn output(text: impl Into<String>) -> Self {
        CommandOutcome {
            output: text.into(),
            should_exit: false,
        }
    }

    pub fn silent() -> Self {
        CommandOutcome {
            output: String::new(),
            should_exit: false,
        }
    }

    pub fn exit(text: impl Into<String>) -> Self {
        CommandOutcome {
            output: text.into(),
            should_exit: true,
        }
    }
}

/// Run one raw input line against the session.
///
/// The line is recorded in history first. Blank lines produce no output
/// and no log entry; every other line produces exactly one log append.
/// Failed commands leave the current path untouched.
pub fn dispatch(
    session: &mut Session,
    resolver: &Resolver,
    log: &LogWriter,
    line: &str,
) -> Result<CommandOutcome, HuskError> {
    session.record(line);

    let mut parts = line.split_whitespace();
    let verb = match parts.next() {
        Some(v) => v,
        None => return Ok(CommandOutcome::silent()),
    };
    let args: Vec<&str> = parts.collect();

    let (outcome, action) = match verb {
        "ls" => handle_ls(session, resolver),
        "cd" => handle_cd(session, resolver, &args),
        "whoami" => handle_whoami(session),
        "du" => handle_du(session, resolver),
        "exit" => handle_exit(),
        _ => handle_unknown(session, verb),
    };

    log.append(LogEntry::now(action, session.username.as_str()))?;
    Ok(outcome)
}

fn handle_ls(session: &mut Session, resolver: &Resolver) -> (CommandOutcome, String) {
    match resolver.read_dir(&session.current) {
        Ok(names) if names.is_empty() => (
            CommandOutcome::output("empty directory\n"),
            "ls".to_string(),
        ),
        Ok(names) => {
            let mut out = String::new();
            for name in names {
                out.push_str(&name);
                out.push('\n');
            }
            (CommandOutcome::output(out), "ls".to_string())
        }
        Err(_) => (
            CommandOutcome::output("ls: directory not found\n"),
            "ls (directory-not-found)".to_string(),
        ),
    }
}

fn handle_cd(
    session: &mut Session,
    resolver: &Resolver,
    args: &[&str],
) -> (CommandOutcome, String) {
    let arg = match args.first() {
        Some(a) => *a,
        None => {
            return (
                CommandOutcome::output("cd: missing argument\n"),
                "cd (missing-argument)".to_string(),
            )
        }
    };

    let resolved = if arg == ".." {
        resolver.ascend(&session.current)
    } else {
        resolver.descend(&session.current, arg)
    };

    match resolved {
        Ok(next) => {
            session.current = next;
            (CommandOutcome::silent(), format!("cd {}", arg))
        }
        Err(ResolveError::BoundaryViolation) => (
            CommandOutcome::output("cd: cannot ascend above the filesystem root\n"),
            format!("cd {} (boundary-violation)", arg),
        ),
        Err(ResolveError::NotFound { path }) => (
            CommandOutcome::output(format!("cd: {}: directory not found\n", path)),
            format!("cd {} (directory-not-found)", arg),
        ),
    }
}

fn handle_whoami(session: &mut Session) -> (CommandOutcome, String) {
    (
        CommandOutcome::output(format!("{}\n", session.username)),
        "whoami".to_string(),
    )
}

fn handle_du(session: &mut Session, resolver: &Resolver) -> (CommandOutcome, String) {
    match resolver.disk_usage(&session.current) {
        Ok(total) => (
            CommandOutcome::output(format!("total {} bytes\n", total)),
            "du".to_string(),
        ),
        Err(_) => (
            CommandOutcome::output("du: directory not found\n"),
            "du (directory-not-found)".to_string(),
        ),
    }
}

fn handle_exit() -> (CommandOutcome, String) {
    (
        CommandOutcome::exit("logout\n"),
        "session closed".to_string(),
    )
}

fn handle_unknown(session: &mut Session, verb: &str) -> (CommandOutcome, String) {
    (
        CommandOutcome::output(format!(
            "{}: {}: command not found\n",
            session.username, verb
        )),
        format!("{} (unknown-command)", verb),
    )
}

use crate::ExitCode;
use crate::env::Environment;
use crate::error::ShellError;
use crate::lexer::Tokens;
use crate::redirect::{self, Redirect};
use anyhow::Result;
use std::fs;
use std::io::{self, Write};
use std::path::Path;
use std::process::{Command, ExitStatus, Stdio};

/// Exit code reported when a program image cannot be started.
pub const UNKNOWN_COMMAND_STATUS: ExitCode = 127;

/// Exit code reported when the shell loses track of a started child.
pub const WAIT_FAILED_STATUS: ExitCode = 1;

/// Reports whether `dir` has an entry named exactly `name`.
///
/// The directory listing is scanned rather than probing the joined path, so a
/// name matches only as a direct entry. Unreadable directories and unreadable
/// entries count as no match. The scan handle is dropped on every return path.
pub fn dir_contains(dir: &Path, name: &str) -> bool {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(err) => {
            tracing::debug!(dir = %dir.display(), error = %err, "skipping unreadable search directory");
            return false;
        }
    };
    entries
        .filter_map(|entry| entry.ok())
        .any(|entry| entry.file_name() == name)
}

/// Rewrites the command name into `dir/name` using the first directory in `dirs`
/// that contains it.
///
/// First match wins and the matched entry is not checked for being executable.
/// When no directory matches, `tokens` is left unchanged and `false` is returned.
pub fn resolve_in_dirs(tokens: &mut Tokens, dirs: &[String]) -> bool {
    let Some(name) = tokens.first().map(str::to_owned) else {
        return false;
    };
    for dir in dirs {
        if dir_contains(Path::new(dir), &name) {
            let qualified = format!("{}/{}", dir, name);
            tracing::debug!(command = %name, path = %qualified, "resolved command");
            tokens.replace_first(qualified);
            return true;
        }
    }
    tracing::debug!(command = %name, "command not found in search path");
    false
}

/// A fully prepared external command: resolved program, argument vector and
/// optional redirection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Launch {
    line: Tokens,
    program: String,
    argv: Vec<String>,
    redirect: Option<Redirect>,
}

impl Launch {
    /// Prepares `tokens` for execution.
    ///
    /// The redirection suffix, if any, is removed from the argument vector and
    /// the program path is resolved against `dirs`. `argv[0]` keeps the name
    /// as typed. Returns `None` for an empty line.
    pub fn plan(tokens: Tokens, dirs: &[String]) -> Option<Self> {
        if tokens.is_empty() {
            return None;
        }
        let redirect = Redirect::detect(&tokens);
        let argc = match redirect {
            Some(_) => tokens.len() - 2,
            None => tokens.len(),
        };
        let argv = tokens.as_slice()[..argc].to_vec();

        let mut resolved = tokens.clone();
        resolve_in_dirs(&mut resolved, dirs);
        let program = resolved.into_vec().swap_remove(0);

        Some(Self {
            line: tokens,
            program,
            argv,
            redirect,
        })
    }

    /// The path handed to the operating system to start the program.
    pub fn program(&self) -> &str {
        &self.program
    }

    /// The argument vector the program receives, `argv[0]` included.
    pub fn argv(&self) -> &[String] {
        &self.argv
    }

    pub fn redirect(&self) -> Option<&Redirect> {
        self.redirect.as_ref()
    }

    /// Starts the program and blocks until it terminates.
    ///
    /// Messages about redirection and unknown commands go to `out`; none of
    /// them is fatal. The error path is reserved for failures writing to `out`
    /// or waiting on the child.
    pub fn run(self, env: &Environment, out: &mut dyn Write) -> Result<ExitCode> {
        // Unresolved names are taken as paths relative to the shell's directory,
        // never looked up again on the process PATH.
        let mut cmd = Command::new(env.resolve(&self.program));
        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;
            cmd.arg0(&self.argv[0]);
        }
        cmd.args(&self.argv[1..])
            .envs(env.vars.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .current_dir(&env.current_dir);

        match &self.redirect {
            Some(Redirect::Output(target)) => match redirect::open_output(&env.resolve(target)) {
                Ok(file) => {
                    tracing::debug!(target = %target, "redirecting standard output");
                    cmd.stdout(Stdio::from(file));
                }
                Err(err) => {
                    tracing::warn!(error = %err, target = %target, "output redirection skipped");
                    writeln!(out, "{}", err)?;
                }
            },
            // Input redirection is parsed but never applied.
            Some(Redirect::Input(target)) => writeln!(out, "input {}", target)?,
            None => {}
        }
        out.flush()?;

        let mut child = match cmd.spawn() {
            Ok(child) => child,
            Err(source) => {
                let err = ShellError::UnknownCommand {
                    name: self.argv[0].clone(),
                    source,
                };
                tracing::debug!(program = %self.program, error = ?err, "spawn failed");
                writeln!(out, "{}", err)?;
                write!(out, "{}", self.line)?;
                return Ok(UNKNOWN_COMMAND_STATUS);
            }
        };
        tracing::debug!(pid = child.id(), program = %self.program, "spawned child");

        let waited = child.wait();
        finish(waited, &self.argv[0], out)
    }
}

/// Turns the outcome of waiting on a child into its exit code.
///
/// A failed wait is reported on `out` like any other per-command failure.
fn finish(waited: io::Result<ExitStatus>, name: &str, out: &mut dyn Write) -> Result<ExitCode> {
    match waited {
        Ok(exit_status) => {
            let code = match exit_status.code() {
                Some(x) => x,
                None => terminated_by_signal(exit_status),
            };
            tracing::debug!(code, command = %name, "child exited");
            Ok(code)
        }
        Err(source) => {
            let err = ShellError::Wait {
                name: name.to_owned(),
                source,
            };
            tracing::warn!(error = ?err, "wait failed");
            writeln!(out, "{}", err)?;
            Ok(WAIT_FAILED_STATUS)
        }
    }
}

#[cfg(unix)]
fn terminated_by_signal(exit_status: ExitStatus) -> i32 {
    use std::os::unix::process::ExitStatusExt;
    if let Some(signal) = ExitStatusExt::signal(&exit_status) {
        128 + signal
    } else if ExitStatusExt::core_dumped(&exit_status) {
        255
    } else {
        -1
    }
}

#[cfg(not(unix))]
fn terminated_by_signal(_exit_status: ExitStatus) -> i32 {
    -1
}

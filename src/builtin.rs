use crate::ExitCode;
use crate::env::Environment;
use crate::error::ShellError;
use crate::lexer::Tokens;
use anyhow::Result;
use argh::{EarlyExit, FromArgs};
use std::env;
use std::fs;
use std::io::Write;
use std::path::PathBuf;

/// Built-in commands known to the shell at compile time.
///
/// Builtins run in-process, never block and never spawn a child. They are
/// consulted before any external lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Builtin {
    Help,
    Exit,
    Pwd,
    Cd,
}

impl Builtin {
    /// The builtin table, in the order `?` lists it.
    pub const ALL: [Builtin; 4] = [Builtin::Help, Builtin::Exit, Builtin::Pwd, Builtin::Cd];

    /// Finds the builtin named exactly `name`.
    pub fn lookup(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|builtin| builtin.name() == name)
    }

    /// Position of this builtin in [`Builtin::ALL`].
    pub fn index(self) -> usize {
        self as usize
    }

    /// Canonical name of the command, as typed by the user.
    pub fn name(self) -> &'static str {
        match self {
            Builtin::Help => "?",
            Builtin::Exit => "exit",
            Builtin::Pwd => "pwd",
            Builtin::Cd => "cd",
        }
    }

    /// One-line description shown by `?`.
    pub fn doc(self) -> &'static str {
        match self {
            Builtin::Help => "show this help menu",
            Builtin::Exit => "exit the command shell",
            Builtin::Pwd => "print current dir",
            Builtin::Cd => "change current dir",
        }
    }

    /// Runs the builtin with the whole line, command name included at index 0.
    ///
    /// Command failures are written to `out` and turned into status 1; only a
    /// failure to write `out` itself is returned as an error.
    pub fn run(self, tokens: &Tokens, env: &mut Environment, out: &mut dyn Write) -> Result<ExitCode> {
        let args: Vec<&str> = tokens.iter().skip(1).collect();
        let outcome = match self {
            Builtin::Help => {
                for builtin in Self::ALL {
                    writeln!(out, "{} - {}", builtin.name(), builtin.doc())?;
                }
                Ok(0)
            }
            Builtin::Exit => {
                tracing::info!("exit requested");
                env.should_exit = true;
                Ok(0)
            }
            Builtin::Pwd => {
                writeln!(out, "{}", env.current_dir.display())?;
                Ok(0)
            }
            // Everything after the name is a directory, even `help` or `-x`.
            Builtin::Cd => match Cd::from_args(&[self.name()], &[&["--"][..], &args[..]].concat()) {
                Ok(cd) => cd.execute(env),
                Err(EarlyExit { output, status }) => {
                    write!(out, "{}", output)?;
                    return Ok(if status.is_err() { 1 } else { 0 });
                }
            },
        };
        match outcome {
            Ok(code) => Ok(code),
            Err(err) => {
                tracing::debug!(builtin = self.name(), error = ?err, "builtin failed");
                writeln!(out, "{}", err)?;
                Ok(1)
            }
        }
    }
}

#[derive(FromArgs)]
/// Change the current working directory.
/// If no target is provided, changes to the directory specified by the HOME environment variable.
struct Cd {
    #[argh(positional, greedy)]
    /// directory to switch to; absolute or relative to the current directory. Defaults to $HOME when omitted.
    targets: Vec<String>,
}

impl Cd {
    fn execute(self, env: &mut Environment) -> Result<ExitCode, ShellError> {
        let target = match self.targets.as_slice() {
            [] => PathBuf::from(env.get_var("HOME").ok_or(ShellError::NoHome)?),
            [target] => PathBuf::from(target),
            _ => return Err(ShellError::TooManyArguments),
        };

        let new_dir = env.resolve(&target);
        let canonical = fs::canonicalize(&new_dir).map_err(|source| ShellError::ChangeDir {
            target: target.clone(),
            source,
        })?;
        env::set_current_dir(&canonical)
            .map_err(|source| ShellError::ChangeDir { target, source })?;
        tracing::debug!(dir = %canonical.display(), "changed directory");
        env.current_dir = canonical;
        Ok(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::tokenize;
    use std::env as stdenv;
    use std::io;
    use std::sync::{Mutex, MutexGuard, OnceLock};
    use std::time::{SystemTime, UNIX_EPOCH};

    fn lock_current_dir() -> MutexGuard<'static, ()> {
        static MUTEX: OnceLock<Mutex<()>> = OnceLock::new();
        MUTEX
            .get_or_init(|| Mutex::new(()))
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn make_unique_temp_dir() -> io::Result<PathBuf> {
        let mut p = stdenv::temp_dir();
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        p.push(format!("builtin_test_cd_{}_{}", std::process::id(), nanos));
        fs::create_dir_all(&p)?;
        Ok(p)
    }

    fn run_line(line: &str, env: &mut Environment) -> (ExitCode, String) {
        let tokens = tokenize(line);
        let builtin = Builtin::lookup(tokens.first().unwrap()).expect("builtin");
        let mut out = Vec::new();
        let code = builtin.run(&tokens, env, &mut out).unwrap();
        (code, String::from_utf8(out).unwrap())
    }

    #[test]
    fn test_lookup_finds_every_entry_by_exact_name() {
        for (i, builtin) in Builtin::ALL.into_iter().enumerate() {
            assert_eq!(Builtin::lookup(builtin.name()), Some(builtin));
            assert_eq!(builtin.index(), i);
        }
    }

    #[test]
    fn test_lookup_rejects_non_matching_names() {
        assert_eq!(Builtin::lookup(""), None);
        assert_eq!(Builtin::lookup("ex"), None);
        assert_eq!(Builtin::lookup("exi"), None);
        assert_eq!(Builtin::lookup("exit2"), None);
        assert_eq!(Builtin::lookup("c"), None);
        assert_eq!(Builtin::lookup("PWD"), None);
        assert_eq!(Builtin::lookup("help"), None);
    }

    #[test]
    fn test_help_lists_table_in_order() {
        let mut env = Environment::empty(stdenv::temp_dir());
        let (code, out) = run_line("?", &mut env);
        assert_eq!(code, 0);
        assert_eq!(
            out,
            "? - show this help menu\n\
             exit - exit the command shell\n\
             pwd - print current dir\n\
             cd - change current dir\n"
        );
    }

    #[test]
    fn test_exit_sets_flag_and_ignores_arguments() {
        let mut env = Environment::empty(stdenv::temp_dir());
        let (code, out) = run_line("exit 42", &mut env);
        assert_eq!(code, 0);
        assert!(out.is_empty());
        assert!(env.should_exit);
    }

    #[test]
    fn test_pwd_prints_current_dir() {
        let mut env = Environment::empty("/some/where");
        let (code, out) = run_line("pwd", &mut env);
        assert_eq!(code, 0);
        assert_eq!(out, "/some/where\n");
    }

    #[test]
    fn test_cd_to_absolute_path() {
        let _lock = lock_current_dir();
        let temp = make_unique_temp_dir().expect("failed to create temp dir");
        let canonical_temp = fs::canonicalize(&temp).expect("canonicalize failed");
        let orig = stdenv::current_dir().unwrap();

        let mut env = Environment::empty(orig.clone());
        let (code, out) = run_line(&format!("cd {}", canonical_temp.display()), &mut env);

        assert_eq!(code, 0);
        assert!(out.is_empty());
        assert_eq!(fs::canonicalize(stdenv::current_dir().unwrap()).unwrap(), canonical_temp);
        assert_eq!(env.current_dir, canonical_temp);

        stdenv::set_current_dir(orig).expect("failed to restore cwd");
        let _ = fs::remove_dir_all(&temp);
    }

    #[test]
    fn test_cd_relative_to_current_dir() {
        let _lock = lock_current_dir();
        let temp = make_unique_temp_dir().expect("failed to create temp dir");
        let canonical_temp = fs::canonicalize(&temp).expect("canonicalize failed");
        fs::create_dir_all(canonical_temp.join("child")).unwrap();
        let orig = stdenv::current_dir().unwrap();

        let mut env = Environment::empty(canonical_temp.clone());
        let (code, _) = run_line("cd child", &mut env);

        assert_eq!(code, 0);
        assert_eq!(env.current_dir, canonical_temp.join("child"));

        stdenv::set_current_dir(orig).expect("failed to restore cwd");
        let _ = fs::remove_dir_all(&temp);
    }

    #[test]
    fn test_cd_to_home_when_no_arguments() {
        let _lock = lock_current_dir();
        let temp = make_unique_temp_dir().expect("failed to create temp dir");
        let canonical_temp = fs::canonicalize(&temp).expect("canonicalize failed");
        let orig = stdenv::current_dir().unwrap();

        let mut env = Environment::empty(orig.clone());
        env.set_var("HOME", canonical_temp.to_string_lossy().to_string());
        let (code, _) = run_line("cd", &mut env);

        assert_eq!(code, 0);
        assert_eq!(fs::canonicalize(stdenv::current_dir().unwrap()).unwrap(), canonical_temp);
        assert_eq!(env.current_dir, canonical_temp);

        stdenv::set_current_dir(orig).expect("failed to restore cwd");
        let _ = fs::remove_dir_all(&temp);
    }

    #[test]
    fn test_cd_without_home_reports_error() {
        let _lock = lock_current_dir();
        let orig = stdenv::current_dir().unwrap();
        let mut env = Environment::empty(orig.clone());

        let (code, out) = run_line("cd", &mut env);

        assert_eq!(code, 1);
        assert_eq!(out, "cd: no target and HOME not set\n");
        assert_eq!(stdenv::current_dir().unwrap(), orig);
    }

    #[test]
    fn test_cd_with_two_arguments_changes_nothing() {
        let _lock = lock_current_dir();
        let temp = make_unique_temp_dir().expect("failed to create temp dir");
        let orig = stdenv::current_dir().unwrap();
        let mut env = Environment::empty(orig.clone());

        let (code, out) = run_line(&format!("cd {} {}", temp.display(), temp.display()), &mut env);

        assert_eq!(code, 1);
        assert_eq!(out, "cd: too many arguments\n");
        assert_eq!(stdenv::current_dir().unwrap(), orig);
        assert_eq!(env.current_dir, orig);
        let _ = fs::remove_dir_all(&temp);
    }

    #[test]
    fn test_cd_targets_that_look_like_flags() {
        let _lock = lock_current_dir();
        let temp = make_unique_temp_dir().expect("failed to create temp dir");
        let canonical_temp = fs::canonicalize(&temp).expect("canonicalize failed");
        let orig = stdenv::current_dir().unwrap();

        for name in ["help", "--help", "-dash"] {
            fs::create_dir_all(canonical_temp.join(name)).unwrap();
            let mut env = Environment::empty(canonical_temp.clone());
            let (code, out) = run_line(&format!("cd {}", name), &mut env);

            assert_eq!(code, 0, "cd {} printed {:?}", name, out);
            assert!(out.is_empty());
            assert_eq!(env.current_dir, canonical_temp.join(name));
        }

        stdenv::set_current_dir(orig).expect("failed to restore cwd");
        let _ = fs::remove_dir_all(&temp);
    }

    #[test]
    fn test_cd_nonexistent_path_errors() {
        let _lock = lock_current_dir();
        let orig = stdenv::current_dir().unwrap();
        let mut env = Environment::empty(orig.clone());

        let name = format!("nonexistent_dir_for_builtin_test_{}", std::process::id());
        let (code, out) = run_line(&format!("cd {}", name), &mut env);

        assert_eq!(code, 1);
        assert_eq!(out, format!("cd: {}: no such dir\n", name));
        assert_eq!(stdenv::current_dir().unwrap(), orig);
    }
}

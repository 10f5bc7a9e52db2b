use crate::ExitCode;
use crate::builtin::Builtin;
use crate::env::Environment;
use crate::external::Launch;
use crate::lexer::{self, Tokens};
use crate::session::Session;
use anyhow::{Context, Result};
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use std::io::{BufRead, Write};

/// Where the read loop gets its command lines from.
pub trait LineSource {
    /// Reads the next line, showing `prompt` first when one is given.
    ///
    /// Returns `Ok(None)` at end of input. `out` is the shell's own output
    /// stream, for sources that print the prompt themselves.
    fn read_line(&mut self, prompt: Option<&str>, out: &mut dyn Write) -> Result<Option<String>>;
}

/// Line source over any buffered reader: a pipe, a script file or a test buffer.
pub struct ReaderSource<R> {
    reader: R,
}

impl<R: BufRead> ReaderSource<R> {
    pub fn new(reader: R) -> Self {
        Self { reader }
    }
}

impl<R: BufRead> LineSource for ReaderSource<R> {
    fn read_line(&mut self, prompt: Option<&str>, out: &mut dyn Write) -> Result<Option<String>> {
        if let Some(prompt) = prompt {
            write!(out, "{}", prompt)?;
            out.flush()?;
        }
        let mut buf = Vec::new();
        let read = self
            .reader
            .read_until(b'\n', &mut buf)
            .context("failed to read command line")?;
        if read == 0 {
            return Ok(None);
        }
        Ok(Some(String::from_utf8_lossy(&buf).into_owned()))
    }
}

/// Line source backed by a terminal line editor with in-memory history.
pub struct EditorSource {
    editor: DefaultEditor,
}

impl EditorSource {
    pub fn new() -> Result<Self> {
        let editor = DefaultEditor::new().context("failed to initialise line editor")?;
        Ok(Self { editor })
    }
}

impl LineSource for EditorSource {
    fn read_line(&mut self, prompt: Option<&str>, _out: &mut dyn Write) -> Result<Option<String>> {
        loop {
            match self.editor.readline(prompt.unwrap_or("")) {
                Ok(line) => {
                    if !line.trim().is_empty() {
                        self.editor.add_history_entry(line.as_str())?;
                    }
                    return Ok(Some(line));
                }
                // Ctrl-C drops the pending line and asks again.
                Err(ReadlineError::Interrupted) => continue,
                Err(ReadlineError::Eof) => return Ok(None),
                Err(err) => return Err(err).context("failed to read command line"),
            }
        }
    }
}

/// A minimal shell that runs builtins in-process and everything else as a child.
///
/// The interpreter owns the mutable [`Environment`] and the read-only
/// [`Session`]. Lines are handled strictly one at a time: at most one child
/// exists, and it is waited for before the next line is read.
///
/// Example
/// ```
/// use mini_shell::Interpreter;
/// use mini_shell::session::Session;
/// let mut sh = Interpreter::new(Session::new(false, "/bin:/usr/bin"));
/// let mut out = Vec::new();
/// let code = sh.execute_line("?", &mut out).unwrap();
/// assert_eq!(code, 0);
/// ```
pub struct Interpreter {
    env: Environment,
    session: Session,
}

impl Interpreter {
    /// Create an interpreter over the current process environment.
    pub fn new(session: Session) -> Self {
        Self::with_env(session, Environment::new())
    }

    pub fn with_env(session: Session, env: Environment) -> Self {
        Self { env, session }
    }

    pub fn env(&self) -> &Environment {
        &self.env
    }

    /// Runs one command line.
    ///
    /// Builtins are consulted first; anything else is resolved on the search
    /// path and launched. An empty line does nothing and returns 0.
    pub fn execute_line(&mut self, line: &str, out: &mut dyn Write) -> Result<ExitCode> {
        let tokens = lexer::tokenize(line);
        let builtin = tokens.first().and_then(Builtin::lookup);
        match builtin {
            Some(builtin) => builtin.run(&tokens, &mut self.env, out),
            None => self.execute_external(tokens, out),
        }
    }

    fn execute_external(&self, tokens: Tokens, out: &mut dyn Write) -> Result<ExitCode> {
        match Launch::plan(tokens, self.session.search_path()) {
            Some(launch) => launch.run(&self.env, out),
            None => Ok(0),
        }
    }

    /// Reads and runs lines until end of input or `exit`.
    ///
    /// In interactive sessions each read is preceded by the prompt
    /// `"<line_number>: "`, counting from 0. Always returns 0; errors are only
    /// returned for failures of the shell's own input or output.
    pub fn run_loop(&mut self, input: &mut dyn LineSource, out: &mut dyn Write) -> Result<ExitCode> {
        tracing::info!(interactive = self.session.is_interactive(), "shell loop started");
        let mut line_number = 0usize;
        while !self.env.should_exit {
            let prompt = self.session.prompt(line_number);
            let Some(line) = input.read_line(prompt.as_deref(), out)? else {
                break;
            };
            line_number += 1;
            let code = self.execute_line(&line, out)?;
            tracing::debug!(line_number, code, "line finished");
        }
        tracing::info!(lines = line_number, "shell loop finished");
        Ok(0)
    }

    /// Runs the loop on the process's standard input and output, using the
    /// line editor when the session is interactive.
    pub fn repl(&mut self) -> Result<ExitCode> {
        let mut stdout = std::io::stdout();
        if self.session.is_interactive() {
            let mut editor = EditorSource::new()?;
            self.run_loop(&mut editor, &mut stdout)
        } else {
            let mut reader = ReaderSource::new(std::io::stdin().lock());
            self.run_loop(&mut reader, &mut stdout)
        }
    }
}

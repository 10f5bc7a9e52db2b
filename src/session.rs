//! Per-process shell session state.
//!
//! Built once at startup and passed by reference to the components that need it.

use crate::env::Environment;
use crate::lexer;
use std::io::IsTerminal;

/// Interactivity and search-path configuration for one shell process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    interactive: bool,
    search_path: Vec<String>,
}

impl Session {
    /// Creates a session from a raw search-path string such as `"/bin:/usr/bin"`.
    pub fn new(interactive: bool, search_path: &str) -> Self {
        Self {
            interactive,
            search_path: lexer::tokenize_path(search_path).into_vec(),
        }
    }

    /// Creates a session from an explicit list of search directories.
    pub fn with_dirs<I, S>(interactive: bool, dirs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            interactive,
            search_path: dirs.into_iter().map(Into::into).collect(),
        }
    }

    /// Inspects the running process: interactive when standard input is a terminal
    /// and `force_batch` is not set. The search path comes from `search_path` when
    /// given, else from `PATH`.
    pub fn detect(env: &Environment, search_path: Option<&str>, force_batch: bool) -> Self {
        let interactive = !force_batch && std::io::stdin().is_terminal();
        let paths = search_path.or_else(|| env.get_var("PATH")).unwrap_or("");
        let session = Self::new(interactive, paths);
        tracing::debug!(
            interactive,
            dirs = session.search_path.len(),
            "shell session initialised"
        );
        session
    }

    pub fn is_interactive(&self) -> bool {
        self.interactive
    }

    /// The ordered, read-only list of directories searched for programs.
    pub fn search_path(&self) -> &[String] {
        &self.search_path
    }

    /// The prompt shown before reading line `line_number`, if any.
    pub fn prompt(&self, line_number: usize) -> Option<String> {
        self.interactive.then(|| format!("{}: ", line_number))
    }
}

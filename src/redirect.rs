//! Trailing `> file` / `< file` suffix handling.

use crate::error::ShellError;
use crate::lexer::Tokens;
use std::fs::{File, OpenOptions};
use std::path::Path;

/// Redirection requested by the last two tokens of a command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Redirect {
    /// `> file`: the child's standard output goes to `file`.
    Output(String),
    /// `< file`: recognised but not applied; standard input is left alone.
    Input(String),
}

impl Redirect {
    /// Detects a redirection suffix.
    ///
    /// Only an operator in the second-to-last position counts, and only when
    /// the line has more than two tokens, so `> out` on its own is a plain
    /// command named `>`.
    pub fn detect(tokens: &Tokens) -> Option<Self> {
        let len = tokens.len();
        if len <= 2 {
            return None;
        }
        let target = tokens[len - 1].to_owned();
        match &tokens[len - 2] {
            ">" => Some(Redirect::Output(target)),
            "<" => Some(Redirect::Input(target)),
            _ => None,
        }
    }
}

/// Opens (creating if needed) an output redirection target.
///
/// The file is opened write-only with user read/write permissions on creation.
/// It is not truncated: output overwrites from the start of the file.
pub fn open_output(path: &Path) -> Result<File, ShellError> {
    let mut options = OpenOptions::new();
    options.write(true).create(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    options.open(path).map_err(|source| ShellError::RedirectOpen {
        path: path.to_owned(),
        source,
    })
}

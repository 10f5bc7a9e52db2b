use std::io;
use std::path::PathBuf;

/// Failures local to one command cycle.
///
/// None of these stop the shell loop: each is reported once and the next line
/// is read.
#[derive(Debug, thiserror::Error)]
pub enum ShellError {
    /// The program image could not be started (missing, not executable, ...).
    #[error("unknown command: {name}")]
    UnknownCommand {
        name: String,
        #[source]
        source: io::Error,
    },

    /// Waiting for a started child failed.
    #[error("{name}: failed to wait for child: {source}")]
    Wait {
        name: String,
        #[source]
        source: io::Error,
    },

    /// The output redirection target could not be opened.
    #[error("failed to open file, rc: {}", .source.raw_os_error().unwrap_or(-1))]
    RedirectOpen {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// `cd` could not switch to the requested directory.
    #[error("cd: {}: no such dir", .target.display())]
    ChangeDir {
        target: PathBuf,
        #[source]
        source: io::Error,
    },

    /// `cd` was given more than one directory.
    #[error("cd: too many arguments")]
    TooManyArguments,

    /// `cd` was given no target and `HOME` is unset.
    #[error("cd: no target and HOME not set")]
    NoHome,
}

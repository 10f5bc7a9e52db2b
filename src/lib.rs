//! A minimal interactive command shell.
//!
//! The crate reads command lines, splits them into whitespace-delimited tokens,
//! runs a small set of builtins in-process and launches every other command as a
//! child process found on a search path. A trailing `> file` suffix sends the
//! child's standard output to a file.
//!
//! The main entry point is [`Interpreter`], which executes single lines with
//! [`Interpreter::execute_line`] or drives a whole read loop with
//! [`Interpreter::run_loop`]. The public modules expose the tokenizer, the
//! builtin table, the path resolver and the session state so they can be used
//! on their own.

pub mod builtin;
pub mod env;
pub mod error;
pub mod external;
mod interpreter;
pub mod lexer;
pub mod redirect;
pub mod session;

/// Conventional process exit code type used by this crate.
///
/// A value of 0 indicates success; any non-zero value indicates failure.
pub type ExitCode = i32;

/// Just a convenient re-export of the command runner and its input seam.
///
/// See [`Interpreter`] for the high-level API.
pub use interpreter::{EditorSource, Interpreter, LineSource, ReaderSource};

use anyhow::{Context, Result};
use argh::FromArgs;
use mini_shell::env::Environment;
use mini_shell::session::Session;
use mini_shell::{Interpreter, ReaderSource};
use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(FromArgs)]
/// A minimal command shell: runs builtins and programs found on a search path.
struct Args {
    #[argh(option)]
    /// directories to search for programs, separated by ':' or spaces; defaults to $PATH
    search_path: Option<String>,

    #[argh(switch, short = 'v')]
    /// log debug information to standard error
    verbose: bool,

    #[argh(positional)]
    /// read commands from this file instead of standard input
    script: Option<PathBuf>,
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<ExitCode> {
    let args: Args = argh::from_env();
    init_logging(args.verbose);

    let env = Environment::new();
    let session = Session::detect(&env, args.search_path.as_deref(), args.script.is_some());
    let mut shell = Interpreter::with_env(session, env);

    let code = match &args.script {
        Some(path) => {
            let file = File::open(path)
                .with_context(|| format!("can't open script {}", path.display()))?;
            let mut input = ReaderSource::new(BufReader::new(file));
            shell.run_loop(&mut input, &mut std::io::stdout())?
        }
        None => shell.repl()?,
    };
    Ok(ExitCode::from(code as u8))
}

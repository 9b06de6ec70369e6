use std::error::Error;
use std::fs;
use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use pypp::{Config, preprocess};
use tracing_subscriber::EnvFilter;

/// Expand pypp macros in a Python source file
#[derive(Parser)]
#[command(name = "pypp", version)]
struct Cli {
    /// Source file to preprocess
    file: PathBuf,

    /// Extra directory to search for included files (after PYPATH)
    #[arg(short = 'I', long = "include")]
    include: Vec<PathBuf>,

    /// Print the macro table around the output
    #[arg(long)]
    debug: bool,

    /// Log definitions, inclusions and expansions
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_writer(io::stderr)
        .init();

    let mut config = Config::from_env();
    config.search_roots.extend(cli.include);
    config.debug |= cli.debug;

    let source = match fs::read_to_string(&cli.file) {
        Ok(source) => source,
        Err(e) => {
            eprintln!("pypp: failed to read {}: {e}", cli.file.display());
            return ExitCode::FAILURE;
        }
    };

    match preprocess(&source, &config) {
        Ok(processed) => {
            match processed.report {
                Some(report) => print!("{report}"),
                None => print!("{}", processed.source),
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("pypp: {}: {e}", cli.file.display());
            let mut cause = e.source();
            while let Some(inner) = cause {
                eprintln!("  caused by: {inner}");
                cause = inner.source();
            }
            ExitCode::FAILURE
        }
    }
}

use clap::Parser;
use sqlseed::cli::CliArgs;
use sqlseed::commands::{self, Completion};
use std::io;
use std::process::ExitCode;
use std::str::FromStr;
use tracing::error;
use tracing::level_filters::LevelFilter;

fn main() -> ExitCode {
    let args = CliArgs::parse();

    let level = match LevelFilter::from_str(&args.log_level) {
        Ok(level) => level,
        Err(_) => {
            eprintln!("Invalid log level '{}', expected error, warn, info, debug, trace or off", args.log_level);
            return ExitCode::from(1);
        }
    };
    // Logs go to stderr so stdout carries only the report
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_ansi(!args.log_no_color)
        .with_writer(io::stderr)
        .init();

    let stdout = io::stdout();
    let mut out = stdout.lock();
    match commands::run(&args, &mut out) {
        Ok(Completion::Done) => ExitCode::SUCCESS,
        Ok(Completion::StatementsFailed) => ExitCode::from(2),
        Err(e) if e.is_connection_fault() => {
            error!(error = %e, "Connection failure");
            eprintln!("Fatal: {}", e);
            ExitCode::from(1)
        }
        Err(e) => {
            error!(error = %e, "Command failed");
            eprintln!("{}", e);
            ExitCode::from(1)
        }
    }
}

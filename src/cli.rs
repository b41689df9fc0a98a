use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser, Clone, Debug)]
#[clap(name = "sqlseed", version, about = "Create, seed and inspect SQLite databases from SQL scripts")]
pub struct CliArgs {
    #[clap(short = 'c', long, global = true, help = "Configuration file. Defaults to <config dir>/sqlseed/config.toml")]
    pub config: Option<PathBuf>,
    #[clap(
        short = 'd',
        long,
        global = true,
        env = "SQLSEED_DATABASE",
        help = "Database file or SQLite URI. Overrides connection.database"
    )]
    pub database: Option<String>,
    #[clap(short = 'l', long, global = true, default_value = "warn", help = "error, warn, info, debug, trace, off")]
    pub log_level: String,
    #[clap(long, global = true, help = "Disable colored log output")]
    pub log_no_color: bool,
    #[clap(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Clone, Debug)]
pub enum Command {
    /// Create a new, empty database. Fails if the file exists
    Create,
    /// Execute a SQL script statement by statement, committing after each
    Seed {
        #[clap(help = "SQL script to run. Defaults to seed.script from the configuration")]
        script: Option<PathBuf>,
        #[clap(long, help = "List the statements that would run without opening the database")]
        dry_run: bool,
        #[clap(long, help = "Exit with status 2 if any statement failed")]
        strict: bool,
        #[clap(short = 'f', long, value_enum, default_value = "text")]
        format: OutputFormat,
    },
    /// Print the rows of the given tables, or of inspect.tables from the configuration
    Inspect {
        #[clap(help = "Tables to dump with SELECT *")]
        tables: Vec<String>,
        #[clap(short = 'f', long, value_enum, default_value = "text")]
        format: OutputFormat,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

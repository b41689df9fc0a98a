//! Subcommand handlers. Each one opens at most one connection, runs its
//! operations in order and closes the connection before rendering.
use crate::cli::{CliArgs, Command, OutputFormat};
use crate::config::Config;
use crate::core::db::{create_database, execute_batch, split_statements, BatchReport, Session};
use crate::core::{Result, SeedError};
use crate::inspect::{inspect_tables, TableQuery};
use crate::report::{self, RunInfo};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{info, info_span};

/// How a command finished, beyond hard errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    /// Everything ran; failures (if any) are in the report
    Done,
    /// `--strict` was given and at least one statement failed
    StatementsFailed,
}

/// Loads configuration and applies command-line overrides.
pub fn resolve_config(args: &CliArgs) -> Result<Config> {
    let mut config = Config::load(args.config.as_deref())?;
    if let Some(database) = &args.database {
        config.connection.database = database.clone();
    }
    config.validate()?;
    Ok(config)
}

/// Runs the parsed command, writing its report to `out`.
pub fn run(args: &CliArgs, out: &mut dyn Write) -> Result<Completion> {
    let run = RunInfo::new();
    let _span = info_span!("run", run_id = %run.run_id).entered();

    match &args.command {
        Command::Seed {
            script,
            dry_run: true,
            ..
        } => {
            // Dry runs never touch the database, so they do not need one configured
            let config = Config::load(args.config.as_deref())?;
            let path = script_path(script.clone(), &config)?;
            let script = read_script(&path)?;
            out.write_all(report::render_dry_run(&split_statements(&script)).as_bytes())?;
            Ok(Completion::Done)
        }
        Command::Seed {
            script,
            strict,
            format,
            ..
        } => {
            let config = resolve_config(args)?;
            let path = script_path(script.clone(), &config)?;
            seed(&run, &config, &path, *strict, *format, out)
        }
        Command::Create => {
            let config = resolve_config(args)?;
            create_database(&config.connection)?;
            writeln!(out, "Database created successfully.")?;
            Ok(Completion::Done)
        }
        Command::Inspect { tables, format } => {
            let config = resolve_config(args)?;
            let tables: Vec<TableQuery> = if tables.is_empty() {
                config.inspect.tables.clone()
            } else {
                tables.iter().map(TableQuery::all).collect()
            };
            inspect(&run, &config, &tables, *format, out)
        }
    }
}

fn seed(
    run: &RunInfo,
    config: &Config,
    path: &Path,
    strict: bool,
    format: OutputFormat,
    out: &mut dyn Write,
) -> Result<Completion> {
    let script = read_script(path)?;
    info!(script = %path.display(), database = %config.connection.database, "Seeding database");

    let mut session = Session::open(&config.connection)?;
    let result = execute_batch(&mut session, &script);
    // Release the connection before surfacing any batch error
    let closed = session.close();
    let completion = report_batch(run, &config.connection.database, result, strict, format, out)?;
    closed?;
    Ok(completion)
}

/// Renders the batch report to `out`. A batch stopped by a connection
/// fault still has the outcomes of its earlier statements rendered before
/// the fault is returned.
fn report_batch(
    run: &RunInfo,
    database: &str,
    result: Result<BatchReport>,
    strict: bool,
    format: OutputFormat,
    out: &mut dyn Write,
) -> Result<Completion> {
    let batch = match result {
        Ok(batch) => batch,
        Err(SeedError::BatchAborted { report, cause }) => {
            write_batch(run, database, &report, format, out)?;
            return Err(*cause);
        }
        Err(err) => return Err(err),
    };
    write_batch(run, database, &batch, format, out)?;

    if strict && batch.has_failures() {
        Ok(Completion::StatementsFailed)
    } else {
        Ok(Completion::Done)
    }
}

fn write_batch(
    run: &RunInfo,
    database: &str,
    batch: &BatchReport,
    format: OutputFormat,
    out: &mut dyn Write,
) -> Result<()> {
    let rendered = match format {
        OutputFormat::Text => report::render_batch_text(batch),
        OutputFormat::Json => {
            let mut json = report::render_batch_json(run, database, batch)?;
            json.push('\n');
            json
        }
    };
    out.write_all(rendered.as_bytes())?;
    Ok(())
}

fn inspect(
    run: &RunInfo,
    config: &Config,
    tables: &[TableQuery],
    format: OutputFormat,
    out: &mut dyn Write,
) -> Result<Completion> {
    if tables.is_empty() {
        return Err(SeedError::Config(
            "no tables to inspect; pass table names or configure inspect.tables".to_string(),
        ));
    }
    for table in tables {
        table.validate()?;
    }

    let session = Session::open_read_only(&config.connection)?;
    let result = inspect_tables(session.connection(), tables);
    let closed = session.close();
    let reports = result?;
    closed?;

    let rendered = match format {
        OutputFormat::Text => report::render_inspection_text(&reports),
        OutputFormat::Json => {
            let mut json = report::render_inspection_json(run, &config.connection.database, &reports)?;
            json.push('\n');
            json
        }
    };
    out.write_all(rendered.as_bytes())?;
    Ok(Completion::Done)
}

fn script_path(script: Option<PathBuf>, config: &Config) -> Result<PathBuf> {
    script.or_else(|| config.seed.script.clone()).ok_or_else(|| {
        SeedError::Config("no script given; pass a path or set seed.script".to_string())
    })
}

fn read_script(path: &Path) -> Result<String> {
    fs::read_to_string(path)
        .map_err(|e| SeedError::Config(format!("cannot read script '{}': {}", path.display(), e)))
}

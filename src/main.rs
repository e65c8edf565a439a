//! Purpose: `ssmex` CLI entry point for batch export and cross-reference runs.
//! Role: Binary crate root; parses args, runs one command to completion, exits.
//! Invariants: Errors are emitted as labeled lines on stderr.
//! Invariants: Process exit code is derived from `core::error::to_exit_code`.
//! Invariants: All store access goes through `core::store::RecordStore`.
use std::error::Error as StdError;
use std::fs::{self, File};
use std::io::{self, BufWriter};
use std::path::{Path, PathBuf};

use clap::{
    CommandFactory, Parser, Subcommand, ValueEnum, ValueHint,
    error::ErrorKind as ClapErrorKind,
};
use clap_complete::aot::Shell;

mod command_dispatch;

use ssmex::core::error::{Error, ErrorKind, to_exit_code};
use ssmex::core::export::{ARTIFACT_SUFFIX, ExportSummary, export};
use ssmex::core::report::{MissingPolicy, cross_reference, write_report};
use ssmex::core::store::{MapOrder, RecordStore, StoreConfig};

#[derive(Copy, Clone, Debug)]
struct RunOutcome {
    exit_code: i32,
}

impl RunOutcome {
    fn ok() -> Self {
        Self { exit_code: 0 }
    }

    fn with_code(exit_code: i32) -> Self {
        Self { exit_code }
    }
}

fn main() {
    let exit_code = match run() {
        Ok(outcome) => outcome.exit_code,
        Err(err) => {
            emit_error(&err);
            to_exit_code(err.kind())
        }
    };
    std::process::exit(exit_code);
}

fn run() -> Result<RunOutcome, Error> {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => match err.kind() {
            ClapErrorKind::DisplayHelp | ClapErrorKind::DisplayVersion => {
                print_clap_message(&err)?;
                return Ok(RunOutcome::ok());
            }
            ClapErrorKind::DisplayHelpOnMissingArgumentOrSubcommand => {
                print_clap_message(&err)?;
                return Ok(RunOutcome::with_code(to_exit_code(ErrorKind::Usage)));
            }
            _ => {
                return Err(Error::new(ErrorKind::Usage)
                    .with_message(clap_error_summary(&err))
                    .with_hint("Run `ssmex --help` for usage."));
            }
        },
    };

    command_dispatch::dispatch_command(cli.command, cli.db)
}

fn print_clap_message(err: &clap::Error) -> Result<(), Error> {
    err.print().map_err(|io_err| {
        Error::new(ErrorKind::Io)
            .with_message("failed to write help")
            .with_source(io_err)
    })
}

fn clap_error_summary(err: &clap::Error) -> String {
    let rendered = err.to_string();
    let first = rendered.lines().next().unwrap_or("invalid arguments");
    first.strip_prefix("error: ").unwrap_or(first).to_string()
}

#[derive(Parser)]
#[command(
    name = "ssmex",
    version,
    about = "Export System Support Map records and cross-reference owner registrations",
    long_about = r#"Batch tooling for the System Support Map store.

`export` writes one JSON artifact per map whose document carries a matching
"version" tag. `cross-reference` resolves a directory of exported artifacts
back to each owner's registration row and emits a tab-separated report. The
two stages share nothing but the artifact directory, so they can run minutes
or days apart."#,
    arg_required_else_help = true
)]
struct Cli {
    #[arg(
        long,
        value_name = "URL",
        help = "PostgreSQL connection URL (default: $SSMEX_DB)"
    )]
    db: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum MissingPolicyCli {
    Abort,
    Skip,
}

impl From<MissingPolicyCli> for MissingPolicy {
    fn from(value: MissingPolicyCli) -> Self {
        match value {
            MissingPolicyCli::Abort => MissingPolicy::Abort,
            MissingPolicyCli::Skip => MissingPolicy::Skip,
        }
    }
}

#[derive(Subcommand)]
enum Command {
    #[command(
        arg_required_else_help = true,
        about = "Export maps matching a site version as JSON artifacts",
        long_about = r#"Fetch every map from the store, keep those whose document's
"version" tag equals VERSION exactly, and write one JSON artifact per match
into OUTPUT_DIR (created if absent), oldest modification first."#,
        after_help = r#"EXAMPLES
  $ ssmex --db postgresql://ssm@localhost/ssm export 2.0 ./out
  $ SSMEX_DB=postgresql://ssm@localhost/ssm ssmex export CountyHealth ./county

NOTES
  - Artifacts are named {version}-{role}-{id}.json after sanitization.
  - Re-running the same export overwrites artifacts in place."#
    )]
    Export {
        #[arg(help = "Version tag to match against each document's \"version\" field")]
        version: String,
        #[arg(help = "Directory for the exported .json artifacts", value_hint = ValueHint::DirPath)]
        output_dir: PathBuf,
    },
    #[command(
        arg_required_else_help = true,
        about = "Resolve exported artifacts to owner registration rows",
        long_about = r#"Scan INPUT_DIR for exported .json artifacts, resolve the record id
encoded in each file name to its map and owning user, and write a
tab-separated report (header plus one row per artifact)."#,
        after_help = r#"EXAMPLES
  $ ssmex --db postgresql://ssm@localhost/ssm cross-reference ./out report.tsv
  $ ssmex --db postgresql://ssm@localhost/ssm cross-reference ./out        # stdout
  $ ssmex --db ... cross-reference ./out report.tsv --missing skip

NOTES
  - The record id is the last digit run in each artifact name.
  - --missing abort (default) fails on the first unresolved artifact;
    --missing skip warns on stderr and keeps going."#
    )]
    CrossReference {
        #[arg(help = "Directory containing exported .json artifacts", value_hint = ValueHint::DirPath)]
        input_dir: PathBuf,
        #[arg(
            help = "Report output path (tab-separated; stdout when omitted)",
            value_hint = ValueHint::FilePath
        )]
        output: Option<PathBuf>,
        #[arg(
            long,
            default_value = "abort",
            value_enum,
            help = "Policy for artifacts with no matching map or user"
        )]
        missing: MissingPolicyCli,
    },
    #[command(
        arg_required_else_help = true,
        about = "Generate shell completions",
        after_help = r#"EXAMPLES
  $ ssmex completion bash > ~/.local/share/bash-completion/completions/ssmex
  $ ssmex completion zsh > ~/.zfunc/_ssmex"#
    )]
    Completion {
        #[arg(help = "Shell to generate completions for")]
        shell: Shell,
    },
}

fn require_db(db: Option<String>) -> Result<String, Error> {
    db.or_else(|| std::env::var("SSMEX_DB").ok()).ok_or_else(|| {
        Error::new(ErrorKind::Usage)
            .with_message("no store connection URL configured")
            .with_hint("Pass --db postgresql://user@host:port/ssm or set SSMEX_DB.")
    })
}

fn list_artifact_files(dir: &Path) -> Result<Vec<String>, Error> {
    let entries = fs::read_dir(dir).map_err(|err| {
        Error::new(ErrorKind::Io)
            .with_message("failed to read artifact directory")
            .with_path(dir)
            .with_source(err)
    })?;

    let mut names = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|err| {
            Error::new(ErrorKind::Io)
                .with_message("failed to read artifact directory entry")
                .with_path(dir)
                .with_source(err)
        })?;
        let name = entry.file_name();
        let Some(name) = name.to_str() else { continue };
        if name.ends_with(ARTIFACT_SUFFIX) {
            names.push(name.to_string());
        }
    }
    // Directory iteration order is platform-dependent; sort for stable reports.
    names.sort();
    Ok(names)
}

fn print_export_header(version: &str, map_count: usize) {
    println!("{map_count} maps fetched, matching version {version}");
    println!();
    println!(
        "{:>3}  {:<34} {:>12}   {}",
        "#", "version", "size (bytes)", "last modified"
    );
    println!("{}", "_".repeat(75));
}

fn print_export_row(summary: &ExportSummary) {
    println!(
        "{:>3}. {:<34} {:>12}   {}",
        summary.seq, summary.version, summary.bytes, summary.modified_at
    );
}

fn emit_error(err: &Error) {
    eprintln!("error: {}", error_message(err));
    if let Some(hint) = err.hint() {
        eprintln!("hint: {hint}");
    }
    if let Some(path) = err.path() {
        eprintln!("path: {}", path.display());
    }
    if let Some(table) = err.table() {
        eprintln!("table: {table}");
    }
    if let Some(map_id) = err.map_id() {
        eprintln!("map id: {map_id}");
    }
    for cause in error_causes(err) {
        eprintln!("cause: {cause}");
    }
}

fn error_message(err: &Error) -> String {
    err.message()
        .map(str::to_string)
        .unwrap_or_else(|| format!("{:?}", err.kind()))
}

fn error_causes(err: &Error) -> Vec<String> {
    let mut causes = Vec::new();
    let mut source = StdError::source(err);
    while let Some(cause) = source {
        causes.push(cause.to_string());
        source = cause.source();
    }
    causes
}

#[cfg(test)]
mod tests {
    use super::{clap_error_summary, error_message, list_artifact_files};
    use clap::CommandFactory;
    use ssmex::core::error::{Error, ErrorKind};

    #[test]
    fn artifact_listing_is_sorted_and_filtered() {
        let temp = tempfile::tempdir().expect("tempdir");
        for name in ["b-2.json", "a-1.json", "notes.txt", "c-3.json.tmp"] {
            std::fs::write(temp.path().join(name), b"{}").expect("write");
        }

        let names = list_artifact_files(temp.path()).expect("list");
        assert_eq!(names, vec!["a-1.json", "b-2.json"]);
    }

    #[test]
    fn missing_artifact_directory_is_an_io_error() {
        let temp = tempfile::tempdir().expect("tempdir");
        let missing = temp.path().join("absent");
        let err = list_artifact_files(&missing).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Io);
        assert_eq!(err.path(), Some(missing.as_path()));
    }

    #[test]
    fn error_message_falls_back_to_the_kind() {
        assert_eq!(error_message(&Error::new(ErrorKind::Store)), "Store");
        assert_eq!(
            error_message(&Error::new(ErrorKind::Store).with_message("boom")),
            "boom"
        );
    }

    #[test]
    fn clap_errors_summarize_to_one_line() {
        let err = super::Cli::command()
            .try_get_matches_from(["ssmex", "bogus-subcommand"])
            .unwrap_err();
        let summary = clap_error_summary(&err);
        assert!(!summary.is_empty());
        assert!(!summary.contains('\n'));
    }
}

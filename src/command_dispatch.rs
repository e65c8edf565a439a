//! Purpose: Hold top-level CLI command dispatch for `ssmex`.
//! Exports: `dispatch_command`.
//! Role: Keep `main.rs` focused on parse/bootstrap and delegate command execution.
//! Invariants: Store configuration is resolved here and injected into the store.
//! Invariants: Helpers in `main.rs` remain the source of output formatting.

use super::*;

pub(super) fn dispatch_command(command: Command, db: Option<String>) -> Result<RunOutcome, Error> {
    match command {
        Command::Completion { shell } => {
            let mut cmd = Cli::command();
            clap_complete::aot::generate(shell, &mut cmd, "ssmex", &mut io::stdout());
            Ok(RunOutcome::ok())
        }
        Command::Export {
            version,
            output_dir,
        } => {
            let store = RecordStore::new(StoreConfig::new(require_db(db)?));
            let maps = store.fetch_maps(MapOrder::ByModifiedAt)?;
            print_export_header(&version, maps.len());
            let summaries = export(&maps, &version, &output_dir, print_export_row)?;
            println!();
            println!(
                "Exported {} artifacts to {}",
                summaries.len(),
                output_dir.display()
            );
            Ok(RunOutcome::ok())
        }
        Command::CrossReference {
            input_dir,
            output,
            missing,
        } => {
            let artifact_names = list_artifact_files(&input_dir)?;
            let store = RecordStore::new(StoreConfig::new(require_db(db)?));
            let maps = store.fetch_maps(MapOrder::ById)?;
            let users = store.fetch_users()?;

            let report = cross_reference(&artifact_names, &maps, &users, missing.into())?;
            for skipped in &report.skipped {
                eprintln!(
                    "warning: skipping {}: {}",
                    skipped.file_name,
                    error_message(&skipped.error)
                );
            }

            match output {
                Some(path) => {
                    let file = File::create(&path).map_err(|err| {
                        Error::new(ErrorKind::Io)
                            .with_message("failed to create report file")
                            .with_path(&path)
                            .with_source(err)
                    })?;
                    let mut writer = BufWriter::new(file);
                    write_report(&report.rows, &mut writer)?;
                    println!("Wrote {} rows to {}", report.rows.len(), path.display());
                }
                None => write_report(&report.rows, &mut io::stdout().lock())?,
            }
            Ok(RunOutcome::ok())
        }
    }
}

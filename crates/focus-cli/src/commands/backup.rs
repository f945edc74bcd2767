use std::path::{Path, PathBuf};

use focus_core::backup::{
    export_backup, import_backup, parse_backup, render_backup_json, suggested_backup_file_name,
    ImportSummary,
};

use crate::commands::common::{confirm, Workspace};
use crate::error::CliError;

/// Directories get a generated file name inside them.
pub fn resolve_backup_output(output: &Path, timestamp_ms: i64) -> PathBuf {
    if output.is_dir() {
        output.join(suggested_backup_file_name(timestamp_ms))
    } else {
        output.to_path_buf()
    }
}

pub async fn run_export(workspace: &Workspace, output: Option<&Path>) -> Result<(), CliError> {
    let bundle = export_backup(&workspace.local).await?;
    let rendered = render_backup_json(&bundle)?;

    if let Some(output) = output {
        let path = resolve_backup_output(output, bundle.exported_at.timestamp_millis());
        std::fs::write(&path, rendered)?;
        println!("{}", path.display());
    } else {
        println!("{rendered}");
    }

    Ok(())
}

pub async fn run_import(
    workspace: &Workspace,
    path: &Path,
    assume_yes: bool,
) -> Result<ImportSummary, CliError> {
    let payload = std::fs::read_to_string(path)?;
    let bundle = parse_backup(&payload)?;

    confirm(
        &format!(
            "Replace local records with the backup exported at {}?",
            bundle.exported_at.to_rfc3339()
        ),
        assume_yes,
    )?;
    let summary = import_backup(&workspace.local, &bundle).await?;

    let describe = |count: Option<usize>| {
        count.map_or_else(|| "unchanged".to_string(), |count| count.to_string())
    };
    println!(
        "Imported backup: sessions {}, interrupts {}",
        describe(summary.sessions),
        describe(summary.interrupts)
    );
    Ok(summary)
}

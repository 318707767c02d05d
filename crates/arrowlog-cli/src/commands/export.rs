use std::path::{Path, PathBuf};

use arrowlog_core::export::{render_sessions_export, suggested_export_file_name};
use arrowlog_core::services::ArcheryService;

use crate::cli::ExportFormat;
use crate::error::CliError;

pub async fn run_export(
    format: ExportFormat,
    output_path: Option<&Path>,
    service: &ArcheryService,
) -> Result<(), CliError> {
    let sessions = service.all_sessions().await;
    let rendered = render_sessions_export(&sessions, format.into())?;

    if let Some(path) = output_path {
        let path = export_target(path, format);
        std::fs::write(&path, rendered)?;
        println!("{}", path.display());
    } else {
        println!("{rendered}");
    }

    Ok(())
}

/// A directory target gets the default export file name appended.
pub fn export_target(path: &Path, format: ExportFormat) -> PathBuf {
    if path.is_dir() {
        path.join(suggested_export_file_name(format.into()))
    } else {
        path.to_path_buf()
    }
}

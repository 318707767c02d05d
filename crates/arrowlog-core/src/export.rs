//! Session export helpers.

use std::fmt::Write as _;

use serde::{Deserialize, Serialize};

use crate::models::Session;
use crate::stats::{session_arrows, session_avg_per_arrow, session_total};

/// Header row of the CSV export.
pub const CSV_HEADER: &str = "session_date,location,total_points,arrows,avg_per_arrow,notes";

/// Export output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Json,
    Csv,
}

impl ExportFormat {
    #[must_use]
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Csv => "csv",
        }
    }
}

/// Render the full collection as pretty-printed JSON.
pub fn render_json_export(sessions: &[Session]) -> serde_json::Result<String> {
    serde_json::to_string_pretty(sessions)
}

/// Render one summary row per session.
#[must_use]
pub fn render_csv_export(sessions: &[Session]) -> String {
    let mut output = String::from(CSV_HEADER);
    for session in sessions {
        output.push('\n');
        let _ = write!(
            output,
            "{},{},{},{},{:.2},{}",
            session.session_date,
            quote(&session.location),
            session_total(session),
            session_arrows(session),
            session_avg_per_arrow(session),
            quote(&session.notes),
        );
    }
    output
}

fn quote(value: &str) -> String {
    format!("\"{}\"", value.replace('"', "\"\""))
}

/// Render sessions in the selected format.
pub fn render_sessions_export(
    sessions: &[Session],
    format: ExportFormat,
) -> serde_json::Result<String> {
    match format {
        ExportFormat::Json => render_json_export(sessions),
        ExportFormat::Csv => Ok(render_csv_export(sessions)),
    }
}

/// Default file name for an export.
#[must_use]
pub fn suggested_export_file_name(format: ExportFormat) -> String {
    format!("archery-sessions.{}", format.extension())
}

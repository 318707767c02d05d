use arrowlog_core::services::ArcheryService;

use crate::commands::common::{format_session_detail, resolve_session};
use crate::error::CliError;

pub async fn run_show(id: &str, as_json: bool, service: &ArcheryService) -> Result<(), CliError> {
    let session = resolve_session(id, service).await?;

    if as_json {
        println!("{}", serde_json::to_string_pretty(&session)?);
    } else {
        for line in format_session_detail(&session) {
            println!("{line}");
        }
    }

    Ok(())
}

use arrowlog_core::services::ArcheryService;

use crate::commands::common::{format_session_lines, session_to_list_item, SessionListItem};
use crate::error::CliError;

pub async fn run_list(
    limit: usize,
    as_json: bool,
    service: &ArcheryService,
) -> Result<(), CliError> {
    let sessions = service.list_sessions(limit).await;

    if as_json {
        let json_items = sessions
            .iter()
            .map(session_to_list_item)
            .collect::<Vec<SessionListItem>>();
        println!("{}", serde_json::to_string_pretty(&json_items)?);
    } else if sessions.is_empty() {
        println!("No sessions yet. Start one with `arrowlog new`.");
    } else {
        for line in format_session_lines(&sessions) {
            println!("{line}");
        }
    }

    Ok(())
}

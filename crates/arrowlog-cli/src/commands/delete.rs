use arrowlog_core::services::ArcheryService;

use crate::commands::common::resolve_session;
use crate::error::CliError;

pub async fn run_delete(id: &str, service: &ArcheryService) -> Result<(), CliError> {
    let session = resolve_session(id, service).await?;

    service.delete_session(session.session_id).await?;
    println!("{}", session.session_id);
    Ok(())
}

/// Drop a draft that never reached the remote store.
pub async fn run_discard(id: &str, service: &ArcheryService) -> Result<(), CliError> {
    let session = resolve_session(id, service).await?;

    service.discard_draft(session.session_id).await?;
    println!("{}", session.session_id);
    Ok(())
}

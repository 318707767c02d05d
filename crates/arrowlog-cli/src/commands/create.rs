use arrowlog_core::services::ArcheryService;

use crate::commands::common::parse_session_date;
use crate::error::CliError;

pub async fn run_new(date: Option<&str>, service: &ArcheryService) -> Result<(), CliError> {
    let date = date.map(parse_session_date).transpose()?;
    let session = service.create_session(date).await?;
    println!("{}", session.session_id);
    Ok(())
}

use arrowlog_core::services::ArcheryService;
use arrowlog_core::Session;

use crate::cli::{CoordinateArgs, EndCommands};
use crate::commands::common::{format_end_line, join_words, parse_session_date, resolve_session};
use crate::error::CliError;

pub async fn run_end(command: EndCommands, service: &ArcheryService) -> Result<(), CliError> {
    match command {
        EndCommands::Add { id } => {
            let session = resolve_session(&id, service).await?;
            let updated = service.add_end(session.session_id).await?;
            if let Some(end) = updated.ends.last() {
                println!("{}", format_end_line(end));
            }
        }
        EndCommands::Remove { id, end } => {
            let session = resolve_session(&id, service).await?;
            let updated = service.remove_end(session.session_id, end).await?;
            print_summary(&updated);
        }
    }
    Ok(())
}

pub async fn run_distance(
    id: &str,
    meters: Option<i64>,
    clear: bool,
    service: &ArcheryService,
) -> Result<(), CliError> {
    if meters.is_none() && !clear {
        return Err(CliError::MissingDistance);
    }
    let session = resolve_session(id, service).await?;
    let updated = service.set_distance(session.session_id, meters).await?;
    print_summary(&updated);
    Ok(())
}

pub async fn run_shots(id: &str, count: usize, service: &ArcheryService) -> Result<(), CliError> {
    let session = resolve_session(id, service).await?;
    let updated = service.set_shots_per_end(session.session_id, count).await?;
    print_summary(&updated);
    Ok(())
}

pub async fn run_shot(
    id: &str,
    end_index: u32,
    shot_index: u32,
    value: &str,
    service: &ArcheryService,
) -> Result<(), CliError> {
    let session = resolve_session(id, service).await?;
    let updated = service
        .set_shot(session.session_id, end_index, shot_index, value)
        .await?;
    if let Some(end) = updated.end(end_index) {
        println!("{}", format_end_line(end));
    }
    Ok(())
}

pub async fn run_notes(
    id: &str,
    text: &[String],
    service: &ArcheryService,
) -> Result<(), CliError> {
    let session = resolve_session(id, service).await?;
    let updated = service
        .set_notes(session.session_id, &join_words(text))
        .await?;
    print_summary(&updated);
    Ok(())
}

pub async fn run_location(
    id: &str,
    text: &[String],
    coordinates: CoordinateArgs,
    service: &ArcheryService,
) -> Result<(), CliError> {
    let coordinates = match (coordinates.lat, coordinates.lng) {
        (Some(lat), Some(lng)) => Some((lat, lng)),
        (None, None) => None,
        _ => return Err(CliError::IncompleteCoordinates),
    };
    let session = resolve_session(id, service).await?;
    let updated = service
        .set_location(session.session_id, &join_words(text), coordinates)
        .await?;
    print_summary(&updated);
    Ok(())
}

pub async fn run_date(id: &str, date: &str, service: &ArcheryService) -> Result<(), CliError> {
    let date = parse_session_date(date)?;
    let session = resolve_session(id, service).await?;
    let updated = service.set_date(session.session_id, date).await?;
    print_summary(&updated);
    Ok(())
}

fn print_summary(session: &Session) {
    println!(
        "{}  {}  {} end(s)",
        session.session_id,
        session.session_date,
        session.ends.len()
    );
}

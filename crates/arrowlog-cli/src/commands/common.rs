use std::env;
use std::path::{Path, PathBuf};

use arrowlog_core::config::ClientConfig;
use arrowlog_core::models::{parse_instant, ConflictWinner, End, PendingWrite};
use arrowlog_core::services::ArcheryService;
use arrowlog_core::stats::{
    session_arrows, session_avg_per_arrow, session_avg_per_end, session_total,
};
use arrowlog_core::{Session, SessionId, SyncConflict, ValidationError};
use chrono::{NaiveDate, Utc};
use serde::Serialize;

use crate::error::CliError;

const SHORT_ID_LEN: usize = 13;

#[derive(Debug, Serialize)]
pub struct SessionListItem {
    pub id: String,
    pub session_date: NaiveDate,
    pub location: String,
    pub total_points: u32,
    pub arrows: usize,
    pub ends: usize,
    pub avg_per_arrow: f64,
    pub is_draft: bool,
    pub updated_at: String,
    pub relative_time: String,
}

#[derive(Debug, Serialize)]
pub struct PendingWriteItem {
    pub id: String,
    pub created_at: String,
    pub sessions: usize,
}

pub fn resolve_db_path(cli_db_path: Option<PathBuf>) -> Result<PathBuf, CliError> {
    match cli_db_path.or_else(|| env::var_os("ARROWLOG_DB_PATH").map(PathBuf::from)) {
        Some(path) => Ok(path),
        None => default_db_path(),
    }
}

pub fn default_db_path() -> Result<PathBuf, CliError> {
    dirs::data_dir()
        .map(|dir| dir.join("arrowlog").join("arrowlog.db"))
        .ok_or_else(|| CliError::Config("Failed to resolve CLI data directory".to_string()))
}

pub fn open_service(db_path: &Path, config: &ClientConfig) -> Result<ArcheryService, CliError> {
    Ok(ArcheryService::open_path(db_path, config)?)
}

pub fn normalize_session_identifier(id: &str) -> Result<String, CliError> {
    let trimmed = id.trim();
    if trimmed.is_empty() {
        Err(CliError::EmptySessionId)
    } else {
        Ok(trimmed.to_string())
    }
}

/// Resolve a full id or a unique id prefix to a session.
pub async fn resolve_session(
    session_query: &str,
    service: &ArcheryService,
) -> Result<Session, CliError> {
    let session_query = normalize_session_identifier(session_query)?;
    if let Ok(session_id) = session_query.parse::<SessionId>() {
        if let Some(session) = service.get_session(session_id).await {
            return Ok(session);
        }
    }

    let matching_ids = service.session_ids_by_prefix(&session_query, 3).await;

    match matching_ids.as_slice() {
        [] => Err(CliError::SessionNotFound(session_query)),
        [session_id] => service
            .get_session(*session_id)
            .await
            .ok_or(CliError::SessionNotFound(session_query)),
        _ => {
            let options = matching_ids
                .iter()
                .map(|id| short_id(*id))
                .collect::<Vec<_>>()
                .join(", ");

            Err(CliError::AmbiguousSessionId(format!(
                "ID prefix '{session_query}' is ambiguous; matches: {options}"
            )))
        }
    }
}

pub fn short_id(id: SessionId) -> String {
    id.to_string().chars().take(SHORT_ID_LEN).collect()
}

pub fn parse_session_date(raw: &str) -> Result<NaiveDate, CliError> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").map_err(|_| {
        CliError::Core(arrowlog_core::Error::Validation(ValidationError::InvalidDate(
            raw.trim().to_string(),
        )))
    })
}

pub fn join_words(parts: &[String]) -> String {
    parts.join(" ").trim().to_string()
}

pub fn format_session_lines(sessions: &[Session]) -> Vec<String> {
    let now_ms = Utc::now().timestamp_millis();
    sessions
        .iter()
        .map(|session| {
            let location = location_label(session, 24);
            let total = session_total(session);
            let arrows = session_arrows(session);
            let relative_time = relative_updated_at(session, now_ms);
            let line = format!(
                "{:<13}  {}  {location:<24}  {total:>4} pts  {arrows:>3} arrows  {relative_time}",
                short_id(session.session_id),
                session.session_date,
            );
            if session.is_local_only {
                format!("{line}  [draft]")
            } else {
                line
            }
        })
        .collect()
}

pub fn session_to_list_item(session: &Session) -> SessionListItem {
    let now_ms = Utc::now().timestamp_millis();
    SessionListItem {
        id: session.session_id.to_string(),
        session_date: session.session_date,
        location: session.location.clone(),
        total_points: session_total(session),
        arrows: session_arrows(session),
        ends: session.ends.len(),
        avg_per_arrow: session_avg_per_arrow(session),
        is_draft: session.is_local_only,
        updated_at: session.updated_at.clone(),
        relative_time: relative_updated_at(session, now_ms),
    }
}

pub fn format_session_detail(session: &Session) -> Vec<String> {
    let mut lines = vec![
        format!("Session   {}", session.session_id),
        format!("Date      {}", session.session_date),
    ];

    let location = location_label(session, usize::MAX);
    let location = match session.coordinates {
        Some(point) => format!("{location} ({:.5}, {:.5})", point.lat, point.lng),
        None => location,
    };
    lines.push(format!("Location  {location}"));
    if let Some(distance) = session.distance() {
        lines.push(format!("Distance  {}m", distance.meters()));
    }
    lines.push(format!(
        "Status    {}",
        if session.is_local_only {
            "draft"
        } else {
            "published"
        }
    ));
    lines.push(format!(
        "Updated   {}",
        format_sync_timestamp(&session.updated_at)
    ));
    if !session.notes.is_empty() {
        lines.push(format!("Notes     {}", session.notes));
    }
    if !session.photos.is_empty() {
        lines.push(format!("Photos    {}", session.photos.len()));
    }

    lines.push(String::new());
    lines.extend(session.ends.iter().map(format_end_line));
    lines.push(String::new());
    lines.push(format!(
        "Total {} pts over {} arrows ({:.2} per arrow, {:.2} per end)",
        session_total(session),
        session_arrows(session),
        session_avg_per_arrow(session),
        session_avg_per_end(session),
    ));
    lines
}

pub fn format_end_line(end: &End) -> String {
    let shots = end
        .shots
        .iter()
        .map(|shot| format!("{:>2}", shot.value.as_str()))
        .collect::<Vec<_>>()
        .join(" ");
    let photo = if end.photo.is_some() { "  [photo]" } else { "" };
    format!("End {:>2}   {shots}  = {:>3}{photo}", end.end_index, end.total())
}

pub fn format_sync_conflict_lines(conflicts: &[SyncConflict]) -> Vec<String> {
    conflicts
        .iter()
        .map(|conflict| {
            format!(
                "{}  {}  session={}  winner={}  local={} remote={}",
                format_sync_timestamp(&conflict.resolved_at),
                conflict.strategy,
                conflict.session_id,
                winner_label(conflict.winner),
                conflict.local_updated_at,
                conflict.remote_updated_at
            )
        })
        .collect()
}

pub fn pending_write_to_item(write: &PendingWrite) -> PendingWriteItem {
    PendingWriteItem {
        id: write.id.to_string(),
        created_at: write.created_at.clone(),
        sessions: write.payload.len(),
    }
}

pub fn format_pending_write_lines(writes: &[PendingWrite]) -> Vec<String> {
    writes
        .iter()
        .map(|write| {
            format!(
                "{}  {}  {} session(s)",
                format_sync_timestamp(&write.created_at),
                write.id,
                write.payload.len()
            )
        })
        .collect()
}

/// Render a stored RFC 3339 instant as a UTC label, or verbatim if unparsable.
pub fn format_sync_timestamp(raw: &str) -> String {
    parse_instant(raw).map_or_else(
        || raw.to_string(),
        |instant| instant.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
    )
}

pub fn format_relative_time(timestamp_ms: i64, now_ms: i64) -> String {
    let diff = now_ms.saturating_sub(timestamp_ms);
    let minute = 60_000;
    let hour = 60 * minute;
    let day = 24 * hour;
    let week = 7 * day;
    let month = 30 * day;
    let year = 365 * day;

    if diff < minute {
        "just now".to_string()
    } else if diff < hour {
        format!("{}m ago", diff / minute)
    } else if diff < day {
        format!("{}h ago", diff / hour)
    } else if diff < week {
        format!("{}d ago", diff / day)
    } else if diff < month {
        format!("{}w ago", diff / week)
    } else if diff < year {
        format!("{}mo ago", diff / month)
    } else {
        format!("{}y ago", diff / year)
    }
}

const fn winner_label(winner: ConflictWinner) -> &'static str {
    match winner {
        ConflictWinner::Local => "local",
        ConflictWinner::Remote => "remote",
    }
}

fn relative_updated_at(session: &Session, now_ms: i64) -> String {
    session.updated_instant().map_or_else(
        || session.updated_at.clone(),
        |instant| format_relative_time(instant.timestamp_millis(), now_ms),
    )
}

fn location_label(session: &Session, max_chars: usize) -> String {
    let location = session.location.trim();
    if location.is_empty() {
        return "(no location)".to_string();
    }
    if location.chars().count() <= max_chars {
        location.to_string()
    } else {
        let mut truncated = location
            .chars()
            .take(max_chars.saturating_sub(3))
            .collect::<String>();
        truncated.push_str("...");
        truncated
    }
}

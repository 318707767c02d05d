use arrowlog_core::clock::EditWindow;
use arrowlog_core::config::ClientConfig;
use arrowlog_core::services::ArcheryService;
use arrowlog_core::sync::{MemoryRemoteStore, SyncCounts, SyncReport};
use arrowlog_core::{Error, ShotValue};
use chrono::NaiveDate;
use clap::CommandFactory;
use pretty_assertions::assert_eq;

use crate::cli::{Cli, CompletionShell, CoordinateArgs, EndCommands, ExportFormat};
use crate::commands::common::{
    format_end_line, format_relative_time, format_session_detail, format_session_lines,
    format_sync_timestamp, join_words, normalize_session_identifier, parse_session_date,
    resolve_session, session_to_list_item, short_id,
};
use crate::commands::completions::render_completions;
use crate::commands::config::format_config_lines;
use crate::commands::delete::{run_delete, run_discard};
use crate::commands::edit::{run_distance, run_end, run_location, run_shot};
use crate::commands::export::{export_target, run_export};
use crate::commands::stats::format_stats_lines;
use crate::commands::sync::{format_sync_report, run_publish, run_pull, run_sync};
use crate::error::CliError;

fn service() -> ArcheryService {
    let config = ClientConfig {
        edit_window: EditWindow::Unrestricted,
        ..ClientConfig::default()
    };
    ArcheryService::open_in_memory(&config).unwrap()
}

fn common_prefix(left: &str, right: &str) -> String {
    left.chars()
        .zip(right.chars())
        .take_while(|(a, b)| a == b)
        .map(|(a, _)| a)
        .collect()
}

#[test]
fn cli_definition_is_consistent() {
    Cli::command().debug_assert();
}

#[test]
fn completions_name_the_binary() {
    let script = String::from_utf8(render_completions(CompletionShell::Bash)).unwrap();
    assert!(script.contains("arrowlog"));
}

#[test]
fn format_relative_time_units() {
    let now = 10_000_000;
    assert_eq!(format_relative_time(now - 30_000, now), "just now");
    assert_eq!(format_relative_time(now - 120_000, now), "2m ago");
    assert_eq!(format_relative_time(now - 2 * 60 * 60_000, now), "2h ago");
}

#[test]
fn format_sync_timestamp_returns_utc_label() {
    assert_eq!(
        format_sync_timestamp("2024-03-09T20:00:00.000Z"),
        "2024-03-09 20:00:00 UTC"
    );
    assert_eq!(format_sync_timestamp("not a time"), "not a time");
}

#[test]
fn parse_session_date_accepts_iso_dates_only() {
    assert_eq!(
        parse_session_date(" 2024-03-09 ").unwrap(),
        NaiveDate::from_ymd_opt(2024, 3, 9).unwrap()
    );
    assert!(matches!(
        parse_session_date("03/09/2024"),
        Err(CliError::Core(Error::Validation(_)))
    ));
}

#[test]
fn normalize_session_identifier_rejects_empty() {
    assert!(matches!(
        normalize_session_identifier(" \n "),
        Err(CliError::EmptySessionId)
    ));
    assert_eq!(normalize_session_identifier("  0190abc  ").unwrap(), "0190abc");
}

#[test]
fn join_words_trims_joined_text() {
    let parts = vec!["North".to_string(), "field ".to_string()];
    assert_eq!(join_words(&parts), "North field");
    assert_eq!(join_words(&[]), "");
}

#[test]
fn format_sync_report_flags_partial_pushes() {
    let report = SyncReport {
        delivered: 1,
        synced_at: Some("2024-03-09T20:00:00.000Z".to_string()),
        expected: Some(SyncCounts {
            sessions: 2,
            ends: 4,
            shots: 20,
        }),
        observed: Some(SyncCounts {
            sessions: 1,
            ends: 2,
            shots: 10,
        }),
        partial: true,
    };

    let lines = format_sync_report(&report);

    assert_eq!(lines[0], "Sync completed: 1 write(s) delivered");
    assert_eq!(lines[1], "Last synced 2024-03-09 20:00:00 UTC");
    assert!(lines[2].starts_with("Warning: remote holds 1 session(s)"));
}

#[test]
fn format_config_lines_hide_token_value() {
    let config = ClientConfig {
        api_token: Some("secret-token".to_string()),
        ..ClientConfig::default()
    };

    let lines = format_config_lines(&config, std::path::Path::new("/tmp/config.json"));

    assert!(lines.iter().all(|line| !line.contains("secret-token")));
    assert!(lines.iter().any(|line| line.ends_with("same_day")));
}

#[test]
fn format_stats_lines_round_averages() {
    let stats = arrowlog_core::stats::LifetimeStats {
        session_count: 1,
        arrow_count: 3,
        total_points: 17,
        avg_per_arrow: 17.0 / 3.0,
        avg_per_end: 17.0,
    };

    let lines = format_stats_lines(&stats);

    assert_eq!(lines[3], "Avg per arrow  5.67");
}

#[tokio::test(flavor = "current_thread")]
async fn resolve_session_supports_exact_and_prefix_id() {
    let service = service();
    let first = service.create_session(None).await.unwrap();
    let second = service.create_session(None).await.unwrap();
    let first_id = first.session_id.to_string();
    let second_id = second.session_id.to_string();

    let exact = resolve_session(&first_id, &service).await.unwrap();
    assert_eq!(exact.session_id, first.session_id);

    let unique = common_prefix(&first_id, &second_id).len() + 1;
    let by_prefix = resolve_session(&second_id[..unique], &service)
        .await
        .unwrap();
    assert_eq!(by_prefix.session_id, second.session_id);

    let shared = common_prefix(&first_id, &second_id);
    assert!(!shared.is_empty());
    let ambiguous = resolve_session(&shared, &service).await.unwrap_err();
    assert!(matches!(ambiguous, CliError::AmbiguousSessionId(_)));
    assert!(ambiguous.to_string().contains(&short_id(first.session_id)));

    assert!(matches!(
        resolve_session("zzzz", &service).await,
        Err(CliError::SessionNotFound(_))
    ));
}

#[tokio::test(flavor = "current_thread")]
async fn session_listing_and_detail_show_scores() {
    let service = service();
    let session = service
        .create_session(NaiveDate::from_ymd_opt(2024, 3, 9))
        .await
        .unwrap();
    let id = session.session_id.to_string();
    run_shot(&id, 1, 1, "X", &service).await.unwrap();
    run_shot(&id, 1, 2, "7", &service).await.unwrap();
    run_location(
        &id,
        &["North".to_string(), "range".to_string()],
        CoordinateArgs {
            lat: Some(45.5),
            lng: Some(-122.6),
        },
        &service,
    )
    .await
    .unwrap();

    let stored = service.get_session(session.session_id).await.unwrap();
    let lines = format_session_lines(std::slice::from_ref(&stored));
    assert!(lines[0].contains("North range"));
    assert!(lines[0].contains("17 pts"));
    assert!(lines[0].ends_with("[draft]"));

    let detail = format_session_detail(&stored);
    assert!(detail.contains(&"Date      2024-03-09".to_string()));
    assert!(detail
        .iter()
        .any(|line| line.starts_with("Location  North range (45.50000")));
    assert_eq!(
        detail.last().unwrap(),
        "Total 17 pts over 5 arrows (3.40 per arrow, 17.00 per end)"
    );

    let item = session_to_list_item(&stored);
    assert_eq!(item.total_points, 17);
    assert!(item.is_draft);
}

#[tokio::test(flavor = "current_thread")]
async fn end_line_lists_shot_tokens() {
    let service = service();
    let session = service.create_session(None).await.unwrap();
    let updated = service
        .set_shot(session.session_id, 1, 3, ShotValue::Ten.as_str())
        .await
        .unwrap();

    assert_eq!(
        format_end_line(&updated.ends[0]),
        "End  1    M  M 10  M  M  =  10"
    );
}

#[tokio::test(flavor = "current_thread")]
async fn end_commands_add_and_remove() {
    let service = service();
    let session = service.create_session(None).await.unwrap();
    let id = session.session_id.to_string();

    run_end(EndCommands::Add { id: id.clone() }, &service)
        .await
        .unwrap();
    assert_eq!(
        service.get_session(session.session_id).await.unwrap().ends.len(),
        2
    );

    run_end(EndCommands::Remove { id, end: 1 }, &service)
        .await
        .unwrap();
    let remaining = service.get_session(session.session_id).await.unwrap();
    assert_eq!(remaining.ends.len(), 1);
    assert_eq!(remaining.ends[0].end_index, 1);
}

#[tokio::test(flavor = "current_thread")]
async fn edit_commands_validate_arguments() {
    let service = service();
    let session = service.create_session(None).await.unwrap();
    let id = session.session_id.to_string();

    assert!(matches!(
        run_distance(&id, None, false, &service).await,
        Err(CliError::MissingDistance)
    ));
    assert!(matches!(
        run_distance(&id, Some(301), false, &service).await,
        Err(CliError::Core(Error::Validation(_)))
    ));
    assert!(matches!(
        run_location(
            &id,
            &["Field".to_string()],
            CoordinateArgs {
                lat: Some(10.0),
                lng: None,
            },
            &service,
        )
        .await,
        Err(CliError::IncompleteCoordinates)
    ));
    assert!(matches!(
        run_shot(&id, 1, 1, "11", &service).await,
        Err(CliError::Core(Error::Validation(_)))
    ));

    run_distance(&id, Some(18), false, &service).await.unwrap();
    let stored = service.get_session(session.session_id).await.unwrap();
    assert_eq!(stored.distance().map(|distance| distance.meters()), Some(18));
}

#[tokio::test(flavor = "current_thread")]
async fn delete_and_discard_by_prefix() {
    let service = service();
    let draft = service.create_session(None).await.unwrap();
    let draft_id = draft.session_id.to_string();

    run_discard(&draft_id, &service).await.unwrap();
    assert!(service.get_session(draft.session_id).await.is_none());

    let remote = MemoryRemoteStore::default();
    let published = service.create_session(None).await.unwrap();
    let published_id = published.session_id.to_string();
    run_publish(&published_id, &service, &remote).await.unwrap();

    assert!(run_discard(&published_id, &service).await.is_err());
    run_delete(&published_id[..20], &service).await.unwrap();
    assert!(service.get_session(published.session_id).await.is_none());
}

#[tokio::test(flavor = "current_thread")]
async fn publish_bootstraps_and_pushes_the_session() {
    let service = service();
    let remote = MemoryRemoteStore::default();
    let session = service.create_session(None).await.unwrap();

    run_publish(&session.session_id.to_string(), &service, &remote)
        .await
        .unwrap();

    assert!(service.meta().await.is_some());
    assert_eq!(remote.pushes().len(), 1);
    assert_eq!(remote.sessions().len(), 1);
    assert!(!service
        .get_session(session.session_id)
        .await
        .unwrap()
        .is_local_only);
    assert!(service.pending_writes().await.unwrap().is_empty());
}

#[tokio::test(flavor = "current_thread")]
async fn publish_from_a_second_device_keeps_the_first_devices_session() {
    let remote = MemoryRemoteStore::default();
    let laptop = service();
    let phone = service();

    let first = laptop.create_session(None).await.unwrap();
    run_publish(&first.session_id.to_string(), &laptop, &remote.clone())
        .await
        .unwrap();

    let second = phone.create_session(None).await.unwrap();
    run_publish(&second.session_id.to_string(), &phone, &remote.clone())
        .await
        .unwrap();

    let mut stored: Vec<_> = remote
        .sessions()
        .into_iter()
        .map(|session| session.session_id)
        .collect();
    stored.sort();
    let mut expected = vec![first.session_id, second.session_id];
    expected.sort();
    assert_eq!(stored, expected);
    assert!(phone.get_session(first.session_id).await.is_some());
}

#[tokio::test(flavor = "current_thread")]
async fn sync_without_published_sessions_reports_nothing_to_sync() {
    let service = service();
    let remote = MemoryRemoteStore::default();
    service.create_session(None).await.unwrap();

    let error = run_sync(&service, &remote).await.unwrap_err();

    assert!(matches!(error, CliError::Core(Error::NothingToSync)));
    assert!(remote.pushes().is_empty());
}

#[tokio::test(flavor = "current_thread")]
async fn pull_merges_remote_sessions() {
    let service = service();
    let remote_session = arrowlog_core::Session::new_draft(
        NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
        chrono::Utc::now(),
        5,
    );
    let remote = MemoryRemoteStore::default().with_sessions(vec![remote_session.clone()]);

    run_pull(&service, &remote).await.unwrap();

    assert!(service
        .get_session(remote_session.session_id)
        .await
        .is_some());
}

#[tokio::test(flavor = "current_thread")]
async fn export_into_directory_uses_suggested_name() {
    let service = service();
    service.create_session(None).await.unwrap();
    let dir = tempfile::tempdir().unwrap();

    run_export(ExportFormat::Csv, Some(dir.path()), &service)
        .await
        .unwrap();

    let written = std::fs::read_to_string(dir.path().join("archery-sessions.csv")).unwrap();
    assert!(written.starts_with("session_date,location,total_points"));
    assert_eq!(written.lines().count(), 2);

    let file = dir.path().join("custom.json");
    assert_eq!(export_target(&file, ExportFormat::Json), file);
}

use arrowlog_core::services::ArcheryService;
use arrowlog_core::sync::{RemoteStore, SyncOptions, SyncReport};

use crate::commands::common::{
    format_pending_write_lines, format_sync_conflict_lines, format_sync_timestamp,
    pending_write_to_item, resolve_session, PendingWriteItem,
};
use crate::error::CliError;

pub async fn run_pull<R: RemoteStore>(
    service: &ArcheryService,
    remote: &R,
) -> Result<(), CliError> {
    let report = service.refresh(remote).await?;
    println!(
        "Connected to {} ({}): {} session(s) pulled, {} conflict(s) resolved",
        report.meta.store_title, report.meta.store_id, report.pulled, report.conflicts
    );
    Ok(())
}

pub async fn run_sync<R: RemoteStore>(
    service: &ArcheryService,
    remote: &R,
) -> Result<(), CliError> {
    sync_with_options(service, remote, SyncOptions::default()).await
}

/// Promote a draft and push it in the same cycle.
pub async fn run_publish<R: RemoteStore>(
    id: &str,
    service: &ArcheryService,
    remote: &R,
) -> Result<(), CliError> {
    let session = resolve_session(id, service).await?;
    let options = SyncOptions {
        publish_session_id: Some(session.session_id),
    };
    sync_with_options(service, remote, options).await
}

async fn sync_with_options<R: RemoteStore>(
    service: &ArcheryService,
    remote: &R,
    options: SyncOptions,
) -> Result<(), CliError> {
    // Each invocation is a fresh process, so merge remote edits before pushing
    // the full collection back.
    tracing::info!("Refreshing from the remote store before sync");
    let refreshed = service.refresh(remote).await?;
    tracing::debug!(
        "Pulled {} session(s), {} conflict(s) resolved",
        refreshed.pulled,
        refreshed.conflicts
    );

    let report = service.sync_now(remote, options).await?;
    for line in format_sync_report(&report) {
        println!("{line}");
    }
    Ok(())
}

pub fn format_sync_report(report: &SyncReport) -> Vec<String> {
    let mut lines = vec![format!(
        "Sync completed: {} write(s) delivered",
        report.delivered
    )];
    if let Some(synced_at) = report.synced_at.as_deref() {
        lines.push(format!("Last synced {}", format_sync_timestamp(synced_at)));
    }
    if report.partial {
        let expected = report.expected.unwrap_or_default();
        let observed = report.observed.unwrap_or_default();
        lines.push(format!(
            "Warning: remote holds {} session(s), {} end(s), {} shot(s); sent {}, {}, {}",
            observed.sessions,
            observed.ends,
            observed.shots,
            expected.sessions,
            expected.ends,
            expected.shots
        ));
    }
    lines
}

pub async fn run_sync_queue(as_json: bool, service: &ArcheryService) -> Result<(), CliError> {
    let writes = service.pending_writes().await?;

    if as_json {
        let json_items = writes
            .iter()
            .map(pending_write_to_item)
            .collect::<Vec<PendingWriteItem>>();
        println!("{}", serde_json::to_string_pretty(&json_items)?);
        return Ok(());
    }

    if writes.is_empty() {
        println!("No pending writes.");
        return Ok(());
    }

    for line in format_pending_write_lines(&writes) {
        println!("{line}");
    }
    Ok(())
}

pub async fn run_sync_conflicts(
    limit: usize,
    as_json: bool,
    service: &ArcheryService,
) -> Result<(), CliError> {
    let conflicts = service.list_conflicts(limit).await;

    if as_json {
        println!("{}", serde_json::to_string_pretty(&conflicts)?);
        return Ok(());
    }

    if conflicts.is_empty() {
        println!("No sync conflicts recorded.");
        return Ok(());
    }

    for line in format_sync_conflict_lines(&conflicts) {
        println!("{line}");
    }
    Ok(())
}

pub async fn run_logout(service: &ArcheryService) -> Result<(), CliError> {
    service.sign_out().await?;
    println!("Disconnected from the remote store. Local sessions were kept.");
    Ok(())
}

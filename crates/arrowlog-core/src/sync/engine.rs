//! Sync orchestrator.
//!
//! Owns the in-memory session collection and is its only writer. Every edit
//! is applied to a copy, persisted, and only then swapped in, so a failed
//! edit or write leaves memory and the local store agreeing with each other.

use chrono::NaiveDate;
use serde::Serialize;

use super::merge::merge_with_conflicts;
use super::remote::{RemoteStore, SyncCounts};
use super::state::{SyncEvent, SyncState};
use crate::clock::{Clock, EditWindow};
use crate::db::{DurableMedium, LocalStore, PendingWriteQueue};
use crate::error::{Error, Result};
use crate::models::{
    normalize_sessions, AppMeta, Distance, GeoPoint, PendingWrite, PhotoRef, Session, SessionId,
    ShotValue, SyncConflict, DEFAULT_SHOTS_PER_END, MAX_SHOTS_PER_END, MIN_SHOTS_PER_END,
};

/// Editing rules applied by the orchestrator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineSettings {
    pub edit_window: EditWindow,
    pub default_shots_per_end: usize,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            edit_window: EditWindow::SameDay,
            default_shots_per_end: DEFAULT_SHOTS_PER_END,
        }
    }
}

/// Options for one sync cycle.
#[derive(Debug, Clone, Copy, Default)]
pub struct SyncOptions {
    /// Draft to promote to published as part of this cycle
    pub publish_session_id: Option<SessionId>,
}

/// Outcome of a successful sync cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncReport {
    /// Queue entries pushed and removed
    pub delivered: usize,
    /// Remote-confirmed instant of the last push
    pub synced_at: Option<String>,
    /// Counts of the last payload pushed
    pub expected: Option<SyncCounts>,
    /// Counts seen by the verification pull, `None` if it failed
    pub observed: Option<SyncCounts>,
    /// The remote holds fewer records than were pushed
    pub partial: bool,
}

/// Outcome of a refresh from the remote store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshReport {
    pub meta: AppMeta,
    pub pulled: usize,
    pub conflicts: usize,
}

/// Drives the local store, the write queue and the remote store.
pub struct SyncEngine<M: DurableMedium, C: Clock> {
    medium: M,
    clock: C,
    settings: EngineSettings,
    sessions: Vec<Session>,
    meta: Option<AppMeta>,
    state: SyncState,
    last_error: Option<String>,
}

impl<M: DurableMedium, C: Clock> SyncEngine<M, C> {
    /// Load the persisted collection and meta from `medium`.
    pub fn new(medium: M, clock: C, settings: EngineSettings) -> Self {
        let store = LocalStore::new(&medium);
        let sessions = store.load();
        let meta = store.load_meta();
        tracing::debug!("Loaded {} sessions from local store", sessions.len());

        Self {
            medium,
            clock,
            settings,
            sessions,
            meta,
            state: SyncState::NotSynced,
            last_error: None,
        }
    }

    pub fn sessions(&self) -> &[Session] {
        &self.sessions
    }

    pub fn session(&self, id: SessionId) -> Option<&Session> {
        self.sessions.iter().find(|session| session.session_id == id)
    }

    pub const fn meta(&self) -> Option<&AppMeta> {
        self.meta.as_ref()
    }

    pub const fn state(&self) -> SyncState {
        self.state
    }

    /// Message from the last failed cycle
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub const fn clock(&self) -> &C {
        &self.clock
    }

    pub const fn settings(&self) -> EngineSettings {
        self.settings
    }

    pub fn pending_writes(&self) -> Result<Vec<PendingWrite>> {
        PendingWriteQueue::new(&self.medium).list()
    }

    pub fn conflicts(&self) -> Vec<SyncConflict> {
        LocalStore::new(&self.medium).load_conflicts()
    }

    /// Start a new draft dated `date`, or today in the reference zone.
    pub fn create_session(&mut self, date: Option<NaiveDate>) -> Result<Session> {
        let date = date.unwrap_or_else(|| self.clock.today());
        let session = Session::new_draft(
            date,
            self.clock.now(),
            self.settings.default_shots_per_end,
        );

        let mut next = Vec::with_capacity(self.sessions.len() + 1);
        next.push(session.clone());
        next.extend(self.sessions.iter().cloned());
        self.commit(next)?;

        tracing::info!("Created session {} for {date}", session.session_id);
        Ok(session)
    }

    pub fn add_end(&mut self, id: SessionId) -> Result<Session> {
        let window = self.settings.edit_window;
        let today = self.clock.today();
        self.edit(id, |session| {
            window.check_append(session, today)?;
            session.add_end();
            Ok(())
        })
    }

    pub fn remove_end(&mut self, id: SessionId, end_index: u32) -> Result<Session> {
        self.edit(id, |session| {
            session.remove_end(end_index)?;
            Ok(())
        })
    }

    /// Apply a distance to every end; `None` clears it.
    pub fn set_distance(&mut self, id: SessionId, meters: Option<i64>) -> Result<Session> {
        let distance = meters.map(Distance::new).transpose()?;
        self.edit(id, |session| {
            session.set_distance(distance);
            Ok(())
        })
    }

    /// Resize every end. Growing is an append and honours the edit window.
    pub fn set_shots_per_end(&mut self, id: SessionId, count: usize) -> Result<Session> {
        let window = self.settings.edit_window;
        let today = self.clock.today();
        self.edit(id, |session| {
            let grows = session.shots_per_end().is_some_and(|current| count > current);
            if grows && (MIN_SHOTS_PER_END..=MAX_SHOTS_PER_END).contains(&count) {
                window.check_append(session, today)?;
            }
            session.set_shots_per_end(count)?;
            Ok(())
        })
    }

    pub fn set_shot(
        &mut self,
        id: SessionId,
        end_index: u32,
        shot_index: u32,
        token: &str,
    ) -> Result<Session> {
        let value = ShotValue::parse_token(token)?;
        self.edit(id, |session| {
            session.set_shot(end_index, shot_index, value)?;
            Ok(())
        })
    }

    pub fn set_location(
        &mut self,
        id: SessionId,
        location: &str,
        coordinates: Option<(f64, f64)>,
    ) -> Result<Session> {
        let point = coordinates
            .map(|(lat, lng)| GeoPoint::new(lat, lng))
            .transpose()?;
        self.edit(id, |session| {
            session.set_location(location, point);
            Ok(())
        })
    }

    pub fn set_notes(&mut self, id: SessionId, notes: &str) -> Result<Session> {
        self.edit(id, |session| {
            session.set_notes(notes);
            Ok(())
        })
    }

    pub fn set_date(&mut self, id: SessionId, date: NaiveDate) -> Result<Session> {
        self.edit(id, |session| {
            session.set_date(date);
            Ok(())
        })
    }

    pub fn add_photo(&mut self, id: SessionId, photo: PhotoRef) -> Result<Session> {
        self.edit(id, |session| {
            session.add_photo(photo);
            Ok(())
        })
    }

    pub fn set_end_photo(
        &mut self,
        id: SessionId,
        end_index: u32,
        photo: Option<PhotoRef>,
    ) -> Result<Session> {
        self.edit(id, |session| {
            session.set_end_photo(end_index, photo)?;
            Ok(())
        })
    }

    /// Remove a session locally; the next push drops it remotely too.
    pub fn delete_session(&mut self, id: SessionId) -> Result<Session> {
        let position = self.position(id)?;
        let mut next = self.sessions.clone();
        let removed = next.remove(position);
        self.commit(next)?;
        tracing::info!("Deleted session {id}");
        Ok(removed)
    }

    /// Drop a draft that was never published.
    pub fn discard_draft(&mut self, id: SessionId) -> Result<Session> {
        let position = self.position(id)?;
        if !self.sessions[position].is_local_only {
            return Err(Error::InvalidInput(format!(
                "session {id} is already published; delete it instead"
            )));
        }
        self.delete_session(id)
    }

    /// Resolve the remote store, pull it and merge it into the local collection.
    pub async fn refresh<R: RemoteStore>(&mut self, remote: &R) -> Result<RefreshReport> {
        let meta = remote.bootstrap().await?;
        let store = LocalStore::new(&self.medium);
        store.save_meta(Some(&meta))?;
        self.meta = Some(meta.clone());

        let mut pulled = remote.pull(&meta.store_id).await?;
        normalize_sessions(&mut pulled);
        let outcome = merge_with_conflicts(&self.sessions, &pulled, self.clock.now());

        store.save(&outcome.sessions)?;
        store.append_conflicts(&outcome.conflicts)?;
        self.sessions = outcome.sessions;

        if !outcome.conflicts.is_empty() {
            tracing::info!("Resolved {} sync conflicts", outcome.conflicts.len());
        }
        tracing::info!(
            "Refreshed from {}: {} remote, {} merged",
            meta.store_title,
            pulled.len(),
            self.sessions.len()
        );

        Ok(RefreshReport {
            meta,
            pulled: pulled.len(),
            conflicts: outcome.conflicts.len(),
        })
    }

    /// Forget the remote identity.
    pub fn sign_out(&mut self) -> Result<()> {
        LocalStore::new(&self.medium).save_meta(None)?;
        self.meta = None;
        tracing::info!("Signed out of remote store");
        Ok(())
    }

    /// Run one sync cycle: snapshot, enqueue, then drain the queue in order.
    ///
    /// A failed push leaves its queue entry in place for the next call.
    pub async fn sync_now<R: RemoteStore>(
        &mut self,
        remote: &R,
        options: SyncOptions,
    ) -> Result<SyncReport> {
        let Some(meta) = self.meta.clone() else {
            return Err(Error::NotBootstrapped);
        };

        self.transition(SyncEvent::Started);
        self.last_error = None;

        match self.run_cycle(remote, meta, options).await {
            Ok(report) => {
                self.transition(SyncEvent::Succeeded);
                tracing::info!("Sync delivered {} pending writes", report.delivered);
                Ok(report)
            }
            Err(error) => {
                self.transition(SyncEvent::Failed);
                self.last_error = Some(error.to_string());
                if error.is_user_recoverable() {
                    tracing::info!("Sync skipped: {error}");
                } else {
                    tracing::warn!("Sync failed: {error}");
                }
                Err(error)
            }
        }
    }

    async fn run_cycle<R: RemoteStore>(
        &mut self,
        remote: &R,
        mut meta: AppMeta,
        options: SyncOptions,
    ) -> Result<SyncReport> {
        let mut snapshot = self.sessions.clone();
        normalize_sessions(&mut snapshot);
        if let Some(publish_id) = options.publish_session_id {
            if let Some(session) = snapshot.iter_mut().find(|s| s.session_id == publish_id) {
                session.is_local_only = false;
            }
        }

        let target: Vec<Session> = snapshot
            .iter()
            .filter(|session| !session.is_local_only)
            .cloned()
            .collect();
        if target.is_empty() {
            return Err(Error::NothingToSync);
        }

        let queue = PendingWriteQueue::new(&self.medium);
        queue.enqueue(&PendingWrite::snapshot(&target, self.clock.now()))?;

        // The promotion is durable once its payload is queued.
        LocalStore::new(&self.medium).save(&snapshot)?;
        self.sessions = snapshot;

        let mut report = SyncReport::default();
        for write in queue.list()? {
            let receipt = remote.push(&meta.store_id, &write.payload).await?;
            let expected = SyncCounts::of(&write.payload);
            let observed = match remote.pull(&meta.store_id).await {
                Ok(pulled) => Some(SyncCounts::of(&pulled)),
                Err(error) => {
                    tracing::warn!("Verification pull after push failed: {error}");
                    None
                }
            };
            queue.remove(write.id)?;

            meta = meta.with_synced_at(receipt.synced_at.clone());
            LocalStore::new(&self.medium).save_meta(Some(&meta))?;
            self.meta = Some(meta.clone());

            let receipt_short = matches!(
                (receipt.counts, receipt.persisted),
                (Some(sent), Some(kept)) if sent != kept
            );
            let observed_short = observed.is_some_and(|seen| seen != expected);
            if receipt_short || observed_short {
                tracing::warn!(
                    "Remote holds {observed:?} after pushing {expected:?} (write {})",
                    write.id
                );
                report.partial = true;
            }

            report.delivered += 1;
            report.synced_at = Some(receipt.synced_at);
            report.expected = Some(expected);
            report.observed = observed;
        }

        Ok(report)
    }

    fn position(&self, id: SessionId) -> Result<usize> {
        self.sessions
            .iter()
            .position(|session| session.session_id == id)
            .ok_or_else(|| Error::NotFound(id.to_string()))
    }

    fn edit<F>(&mut self, id: SessionId, apply: F) -> Result<Session>
    where
        F: FnOnce(&mut Session) -> Result<()>,
    {
        let position = self.position(id)?;
        let mut session = self.sessions[position].clone();
        apply(&mut session)?;
        session.touch(self.clock.now());

        let mut next = self.sessions.clone();
        next[position] = session.clone();
        self.commit(next)?;
        Ok(session)
    }

    fn commit(&mut self, next: Vec<Session>) -> Result<()> {
        LocalStore::new(&self.medium).save(&next)?;
        self.sessions = next;
        self.transition(SyncEvent::LocalMutation);
        Ok(())
    }

    fn transition(&mut self, event: SyncEvent) {
        let next = self.state.on_event(event);
        if next != self.state {
            tracing::debug!("Sync state {} -> {}", self.state, next);
        }
        self.state = next;
    }
}

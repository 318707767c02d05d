//! Shared service handle over one sync engine.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::NaiveDate;
use tokio::sync::Mutex;

use crate::clock::{Clock, SystemClock};
use crate::config::ClientConfig;
use crate::db::{Database, DurableMedium};
use crate::models::{AppMeta, PendingWrite, PhotoRef, Session, SessionId, SyncConflict};
use crate::stats::{lifetime_stats, LifetimeStats};
use crate::sync::{
    EngineSettings, RefreshReport, RemoteStore, SyncEngine, SyncOptions, SyncReport, SyncState,
};
use crate::Result;

/// Cloneable handle; every call takes the engine lock, so sync cycles queue
/// behind each other instead of draining the write queue twice.
pub struct ArcheryService<M: DurableMedium = Database, C: Clock = SystemClock> {
    engine: Arc<Mutex<SyncEngine<M, C>>>,
    db_path: Option<PathBuf>,
}

impl<M: DurableMedium, C: Clock> Clone for ArcheryService<M, C> {
    fn clone(&self) -> Self {
        Self {
            engine: Arc::clone(&self.engine),
            db_path: self.db_path.clone(),
        }
    }
}

impl ArcheryService<Database, SystemClock> {
    /// Open the on-disk store at `db_path` with settings from `config`.
    pub fn open_path(db_path: impl Into<PathBuf>, config: &ClientConfig) -> Result<Self> {
        let db_path = db_path.into();
        let db = Self::open_database(&db_path)?;
        let engine = SyncEngine::new(db, config.clock()?, config.engine_settings());
        Ok(Self {
            engine: Arc::new(Mutex::new(engine)),
            db_path: Some(db_path),
        })
    }

    /// Open an in-memory store (primarily for tests).
    pub fn open_in_memory(config: &ClientConfig) -> Result<Self> {
        let engine = SyncEngine::new(
            Database::open_in_memory()?,
            config.clock()?,
            config.engine_settings(),
        );
        Ok(Self::from_engine(engine))
    }

    fn open_database(db_path: &Path) -> Result<Database> {
        match Database::open(db_path) {
            Ok(db) => Ok(db),
            Err(error) if Self::is_corrupted_db_error(&error) => {
                tracing::warn!(
                    "Local database at {} is unreadable ({error}); starting a fresh one",
                    db_path.display()
                );
                Self::quarantine_corrupted_db_files(db_path)?;
                Database::open(db_path)
            }
            Err(error) => Err(error),
        }
    }

    fn is_corrupted_db_error(error: &crate::Error) -> bool {
        let message = error.to_string().to_ascii_lowercase();
        message.contains("file is not a database") || message.contains("malformed")
    }

    fn quarantine_corrupted_db_files(db_path: &Path) -> Result<()> {
        if db_path.exists() {
            let timestamp = chrono::Utc::now().timestamp_millis();
            let file_name = db_path
                .file_name()
                .map_or_else(|| "arrowlog.db".into(), |name| name.to_string_lossy());
            let backup_path = db_path.with_file_name(format!("{file_name}.corrupt-{timestamp}"));

            std::fs::rename(db_path, &backup_path)?;
            tracing::warn!(
                "Moved corrupted local DB file from {} to {}",
                db_path.display(),
                backup_path.display()
            );
        }

        let Some(parent) = db_path.parent() else {
            return Ok(());
        };
        let Some(base_name) = db_path.file_name().and_then(|name| name.to_str()) else {
            return Ok(());
        };
        let sidecar_prefix = format!("{base_name}-");

        for entry in std::fs::read_dir(parent)? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            let file_name = entry.file_name();
            if file_name.to_string_lossy().starts_with(&sidecar_prefix) {
                let path = entry.path();
                std::fs::remove_file(&path)?;
                tracing::warn!("Removed stale SQLite sidecar {}", path.display());
            }
        }

        Ok(())
    }
}

impl<M: DurableMedium, C: Clock> ArcheryService<M, C> {
    pub fn from_engine(engine: SyncEngine<M, C>) -> Self {
        Self {
            engine: Arc::new(Mutex::new(engine)),
            db_path: None,
        }
    }

    pub fn db_path(&self) -> Option<&Path> {
        self.db_path.as_deref()
    }

    /// Sessions newest first, at most `limit`.
    pub async fn list_sessions(&self, limit: usize) -> Vec<Session> {
        let engine = self.engine.lock().await;
        engine.sessions().iter().take(limit).cloned().collect()
    }

    pub async fn all_sessions(&self) -> Vec<Session> {
        self.engine.lock().await.sessions().to_vec()
    }

    pub async fn get_session(&self, id: SessionId) -> Option<Session> {
        self.engine.lock().await.session(id).cloned()
    }

    /// Ids whose string form starts with `prefix`, at most `limit`.
    pub async fn session_ids_by_prefix(&self, prefix: &str, limit: usize) -> Vec<SessionId> {
        let prefix = prefix.trim().to_ascii_lowercase();
        let engine = self.engine.lock().await;
        engine
            .sessions()
            .iter()
            .map(|session| session.session_id)
            .filter(|id| id.to_string().starts_with(&prefix))
            .take(limit)
            .collect()
    }

    pub async fn sync_state(&self) -> SyncState {
        self.engine.lock().await.state()
    }

    pub async fn last_error(&self) -> Option<String> {
        self.engine.lock().await.last_error().map(ToString::to_string)
    }

    pub async fn meta(&self) -> Option<AppMeta> {
        self.engine.lock().await.meta().cloned()
    }

    pub async fn settings(&self) -> EngineSettings {
        self.engine.lock().await.settings()
    }

    pub async fn pending_writes(&self) -> Result<Vec<PendingWrite>> {
        self.engine.lock().await.pending_writes()
    }

    /// Logged conflicts, most recent first, at most `limit`.
    pub async fn list_conflicts(&self, limit: usize) -> Vec<SyncConflict> {
        let mut conflicts = self.engine.lock().await.conflicts();
        conflicts.reverse();
        conflicts.truncate(limit);
        conflicts
    }

    pub async fn stats(&self) -> LifetimeStats {
        lifetime_stats(self.engine.lock().await.sessions())
    }

    pub async fn create_session(&self, date: Option<NaiveDate>) -> Result<Session> {
        self.engine.lock().await.create_session(date)
    }

    pub async fn add_end(&self, id: SessionId) -> Result<Session> {
        self.engine.lock().await.add_end(id)
    }

    pub async fn remove_end(&self, id: SessionId, end_index: u32) -> Result<Session> {
        self.engine.lock().await.remove_end(id, end_index)
    }

    pub async fn set_distance(&self, id: SessionId, meters: Option<i64>) -> Result<Session> {
        self.engine.lock().await.set_distance(id, meters)
    }

    pub async fn set_shots_per_end(&self, id: SessionId, count: usize) -> Result<Session> {
        self.engine.lock().await.set_shots_per_end(id, count)
    }

    pub async fn set_shot(
        &self,
        id: SessionId,
        end_index: u32,
        shot_index: u32,
        token: &str,
    ) -> Result<Session> {
        self.engine
            .lock()
            .await
            .set_shot(id, end_index, shot_index, token)
    }

    pub async fn set_location(
        &self,
        id: SessionId,
        location: &str,
        coordinates: Option<(f64, f64)>,
    ) -> Result<Session> {
        self.engine
            .lock()
            .await
            .set_location(id, location, coordinates)
    }

    pub async fn set_notes(&self, id: SessionId, notes: &str) -> Result<Session> {
        self.engine.lock().await.set_notes(id, notes)
    }

    pub async fn set_date(&self, id: SessionId, date: NaiveDate) -> Result<Session> {
        self.engine.lock().await.set_date(id, date)
    }

    pub async fn add_photo(&self, id: SessionId, photo: PhotoRef) -> Result<Session> {
        self.engine.lock().await.add_photo(id, photo)
    }

    pub async fn set_end_photo(
        &self,
        id: SessionId,
        end_index: u32,
        photo: Option<PhotoRef>,
    ) -> Result<Session> {
        self.engine.lock().await.set_end_photo(id, end_index, photo)
    }

    pub async fn delete_session(&self, id: SessionId) -> Result<Session> {
        self.engine.lock().await.delete_session(id)
    }

    pub async fn discard_draft(&self, id: SessionId) -> Result<Session> {
        self.engine.lock().await.discard_draft(id)
    }

    pub async fn refresh<R: RemoteStore>(&self, remote: &R) -> Result<RefreshReport> {
        self.engine.lock().await.refresh(remote).await
    }

    /// Run a sync cycle, waiting for any cycle already in flight.
    pub async fn sync_now<R: RemoteStore>(
        &self,
        remote: &R,
        options: SyncOptions,
    ) -> Result<SyncReport> {
        self.engine.lock().await.sync_now(remote, options).await
    }

    pub async fn sign_out(&self) -> Result<()> {
        self.engine.lock().await.sign_out()
    }
}

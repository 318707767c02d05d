//! Durable FIFO of sync payloads awaiting remote confirmation

use crate::error::Result;
use crate::models::{PendingWrite, WriteId};

use super::medium::{DurableMedium, PENDING_WRITES_NAMESPACE};

/// Pending-write queue over a durable medium.
///
/// Entries live in their own namespace, one key per entry, so a crash
/// between enqueue and confirmation leaves the entry recoverable.
pub struct PendingWriteQueue<'a, M: DurableMedium + ?Sized> {
    medium: &'a M,
}

impl<'a, M: DurableMedium + ?Sized> PendingWriteQueue<'a, M> {
    pub const fn new(medium: &'a M) -> Self {
        Self { medium }
    }

    /// Add an entry, replacing any entry with the same id.
    pub fn enqueue(&self, entry: &PendingWrite) -> Result<()> {
        let json = serde_json::to_string(entry)?;
        self.medium
            .put(PENDING_WRITES_NAMESPACE, &entry.id.to_string(), &json)?;
        tracing::debug!("Queued pending write {}", entry.id);
        Ok(())
    }

    /// Undelivered entries, oldest first.
    ///
    /// Ties on `created_at` fall back to the id, which is time-ordered.
    pub fn list(&self) -> Result<Vec<PendingWrite>> {
        let mut entries: Vec<PendingWrite> = self
            .medium
            .list(PENDING_WRITES_NAMESPACE)?
            .into_iter()
            .filter_map(|(key, raw)| match serde_json::from_str::<PendingWrite>(&raw) {
                Ok(entry) => Some(entry),
                Err(error) => {
                    tracing::warn!("Skipping unreadable pending write {key}: {error}");
                    None
                }
            })
            .collect();

        entries.sort_by(|a, b| {
            a.created_instant()
                .cmp(&b.created_instant())
                .then_with(|| a.created_at.cmp(&b.created_at))
                .then_with(|| a.id.to_string().cmp(&b.id.to_string()))
        });
        Ok(entries)
    }

    pub fn remove(&self, id: WriteId) -> Result<()> {
        self.medium
            .delete(PENDING_WRITES_NAMESPACE, &id.to_string())?;
        tracing::debug!("Removed pending write {id}");
        Ok(())
    }

    pub fn len(&self) -> Result<usize> {
        Ok(self.list()?.len())
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }
}

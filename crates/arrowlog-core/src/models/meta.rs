//! Remote identity cached on the device

use serde::{Deserialize, Serialize};

/// Which remote store this device syncs with, and when it last confirmed a push.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppMeta {
    /// Remote store handle
    #[serde(alias = "spreadsheetId")]
    pub store_id: String,
    /// Human-readable store name
    #[serde(alias = "spreadsheetTitle")]
    pub store_title: String,
    /// Instant reported by the remote for the last confirmed push
    #[serde(default)]
    pub last_synced_at: Option<String>,
}

impl AppMeta {
    #[must_use]
    pub fn new(store_id: impl Into<String>, store_title: impl Into<String>) -> Self {
        Self {
            store_id: store_id.into(),
            store_title: store_title.into(),
            last_synced_at: None,
        }
    }

    /// Copy of this meta carrying a newer sync confirmation.
    #[must_use]
    pub fn with_synced_at(&self, synced_at: impl Into<String>) -> Self {
        Self {
            last_synced_at: Some(synced_at.into()),
            ..self.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_spreadsheet_field_names() {
        let meta: AppMeta = serde_json::from_str(
            r#"{"spreadsheetId":"sheet-1","spreadsheetTitle":"Practice Log"}"#,
        )
        .unwrap();
        assert_eq!(meta, AppMeta::new("sheet-1", "Practice Log"));
    }

    #[test]
    fn with_synced_at_keeps_identity() {
        let meta = AppMeta::new("sheet-1", "Practice Log").with_synced_at("2024-01-01T10:00:00Z");
        assert_eq!(meta.store_id, "sheet-1");
        assert_eq!(meta.last_synced_at.as_deref(), Some("2024-01-01T10:00:00Z"));
    }
}

use crate::error::{AppError, AppResult};
use crate::store::models::BotInstance;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use uuid::Uuid;

/// Whole-table JSON snapshot of every bot instance.
///
/// Reads soft-fail to an empty table. Writes replace the file atomically
/// (temp file then rename) but are not serialized here; the registry
/// holds the only writer.
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    path: PathBuf,
}

impl SnapshotStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the table in stored order.
    ///
    /// Missing, empty or unparseable storage yields an empty table.
    pub async fn load_all(&self) -> Vec<BotInstance> {
        let raw = match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Vec::new(),
            Err(e) => {
                warn!("Error loading bots data from {}: {}", self.path.display(), e);
                return Vec::new();
            }
        };

        if raw.trim().is_empty() {
            return Vec::new();
        }

        match serde_json::from_str::<Vec<BotInstance>>(&raw) {
            Ok(instances) => instances,
            Err(e) => {
                warn!("Bots data at {} is unreadable, starting empty: {}", self.path.display(), e);
                Vec::new()
            }
        }
    }

    /// Overwrite the table with `instances`.
    pub async fn save_all(&self, instances: &[BotInstance]) -> AppResult<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                AppError::storage(format!("failed to prepare bots data directory: {e}"))
            })?;
        }

        let payload = serde_json::to_vec_pretty(instances)
            .map_err(|e| AppError::storage(format!("failed to encode bots data: {e}")))?;

        let temp_path = self
            .path
            .with_extension(format!("{}.tmp", Uuid::new_v4().simple()));
        if let Err(e) = tokio::fs::write(&temp_path, payload).await {
            let _ = tokio::fs::remove_file(&temp_path).await;
            return Err(AppError::storage(format!("failed to write bots data: {e}")));
        }

        if let Err(e) = tokio::fs::rename(&temp_path, &self.path).await {
            let _ = tokio::fs::remove_file(&temp_path).await;
            return Err(AppError::storage(format!("failed to finalize bots data: {e}")));
        }

        debug!("Saved {} bot instance(s) to {}", instances.len(), self.path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::models::InstanceStatus;
    use chrono::Utc;

    fn instance(id: &str, port: u16) -> BotInstance {
        BotInstance {
            id: id.to_string(),
            credential: "00:11".to_string(),
            prefix: "$".to_string(),
            port,
            status: InstanceStatus::Stopped,
            last_error: None,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_missing_file_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = SnapshotStore::new(dir.path().join("missing.json"));
        assert!(store.load_all().await.is_empty());
    }

    #[tokio::test]
    async fn test_empty_and_corrupt_files_load_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bots.json");
        let store = SnapshotStore::new(&path);

        tokio::fs::write(&path, "").await.unwrap();
        assert!(store.load_all().await.is_empty());

        tokio::fs::write(&path, "{ not json").await.unwrap();
        assert!(store.load_all().await.is_empty());
    }

    #[tokio::test]
    async fn test_save_then_load_preserves_order() {
        let dir = tempfile::tempdir().unwrap();
        let store = SnapshotStore::new(dir.path().join("nested").join("bots.json"));

        let table = vec![instance("bot_b", 3002), instance("bot_a", 3001)];
        store.save_all(&table).await.unwrap();

        let loaded = store.load_all().await;
        let ids: Vec<_> = loaded.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, ["bot_b", "bot_a"]);
    }

    #[tokio::test]
    async fn test_save_replaces_previous_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let store = SnapshotStore::new(dir.path().join("bots.json"));

        store.save_all(&[instance("bot_1", 3001), instance("bot_2", 3002)]).await.unwrap();
        store.save_all(&[instance("bot_3", 3003)]).await.unwrap();

        let loaded = store.load_all().await;
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].id, "bot_3");

        // No temp files left behind
        let mut entries = tokio::fs::read_dir(dir.path()).await.unwrap();
        let mut names = Vec::new();
        while let Some(entry) = entries.next_entry().await.unwrap() {
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
        assert_eq!(names, ["bots.json"]);
    }

    #[tokio::test]
    async fn test_unwritable_location_is_storage_error() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        tokio::fs::write(&blocker, "file, not a directory").await.unwrap();

        let store = SnapshotStore::new(blocker.join("bots.json"));
        let result = store.save_all(&[instance("bot_1", 3001)]).await;
        assert!(matches!(result, Err(AppError::Storage(_))));
    }
}

//! Bot instance registry.
//!
//! Owns the instance table: creation with port allocation, the lifecycle
//! state machine, prefix edits and deletion. Every operation runs under a
//! single async mutex that also owns the snapshot store, so each
//! load-modify-save cycle happens in one total order and no update is lost.

pub mod lifecycle;
pub mod ports;

use crate::config::RegistryConfig;
use crate::error::{AppError, AppResult};
use crate::store::{BotInstance, InstanceStatus, InstanceSummary, SnapshotStore};
use crate::vault::{mask, CredentialVault};
use chrono::Utc;
use lifecycle::{LifecycleEvent, AUTHENTICATION_FAILED};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{info, warn};
use uuid::Uuid;

const MAX_PREFIX_LEN: usize = 5;

/// Shared registry handle for use across the application.
pub type SharedRegistry = Arc<InstanceRegistry>;

pub struct InstanceRegistry {
    store: Mutex<SnapshotStore>,
    vault: Arc<CredentialVault>,
    base_port: u16,
    default_prefix: String,
}

impl InstanceRegistry {
    pub fn new(store: SnapshotStore, vault: Arc<CredentialVault>) -> Self {
        Self::from_config(store, vault, &RegistryConfig::default())
    }

    pub fn from_config(
        store: SnapshotStore,
        vault: Arc<CredentialVault>,
        config: &RegistryConfig,
    ) -> Self {
        Self {
            store: Mutex::new(store),
            vault,
            base_port: config.base_port,
            default_prefix: config.default_prefix.clone(),
        }
    }

    /// Register a new bot. The secret is encrypted before it is stored and
    /// the instance starts out `Stopped` on the lowest free port.
    pub async fn add(&self, secret: &str, prefix: Option<&str>) -> AppResult<InstanceSummary> {
        if secret.trim().is_empty() {
            return Err(AppError::validation("token must not be empty"));
        }
        let prefix = prefix.unwrap_or(self.default_prefix.as_str());
        validate_prefix(prefix)?;

        let credential = self.vault.encrypt(secret)?;
        let masked = mask(secret);

        self.mutate(|table| {
            let port = ports::next_free_port(table.iter().map(|b| b.port), self.base_port)?;
            let id = fresh_id(table);
            let instance = BotInstance {
                id,
                credential,
                prefix: prefix.to_string(),
                port,
                status: InstanceStatus::Stopped,
                last_error: None,
                created_at: Utc::now(),
            };
            let summary = instance.summarize(masked);
            table.push(instance);
            Ok(summary)
        })
        .await
        .inspect(|summary| info!("Added bot {} on port {}", summary.id, summary.port))
    }

    /// Validate the stored credential and move the bot to `Running`, or to
    /// `Error` if the credential no longer decrypts.
    pub async fn start(&self, id: &str) -> AppResult<InstanceSummary> {
        let outcome = self
            .mutate(|table| {
                let instance = find_mut(table, id)?;
                // Decide first, then apply a single transition.
                let (event, result) = match self.vault.decrypt(&instance.credential) {
                    Ok(plaintext) => (LifecycleEvent::StartValidated, Ok(mask(&plaintext))),
                    Err(e) => {
                        warn!("Credential for bot {} failed validation: {}", id, e);
                        let reason = AUTHENTICATION_FAILED.to_string();
                        (LifecycleEvent::StartRejected { reason }, Err(AppError::Authentication))
                    }
                };
                lifecycle::apply(instance, event);
                Ok(result.map(|masked| instance.summarize(masked)))
            })
            .await?;

        match &outcome {
            Ok(summary) => info!("Bot {} is running on port {}", summary.id, summary.port),
            Err(_) => warn!("Bot {} moved to error state", id),
        }
        outcome
    }

    /// Move the bot to `Stopped` from any state. Stopping a stopped bot is a no-op.
    pub async fn stop(&self, id: &str) -> AppResult<InstanceSummary> {
        self.mutate(|table| {
            let instance = find_mut(table, id)?;
            lifecycle::apply(instance, LifecycleEvent::Stop);
            Ok(instance.summarize(self.vault.masked(&instance.credential)))
        })
        .await
        .inspect(|summary| info!("Bot {} stopped", summary.id))
    }

    /// Change the command prefix. Status is untouched.
    pub async fn set_prefix(&self, id: &str, prefix: &str) -> AppResult<InstanceSummary> {
        validate_prefix(prefix)?;
        self.mutate(|table| {
            let instance = find_mut(table, id)?;
            instance.prefix = prefix.to_string();
            Ok(instance.summarize(self.vault.masked(&instance.credential)))
        })
        .await
    }

    /// Remove the bot for good. Its id and port become free immediately.
    pub async fn delete(&self, id: &str) -> AppResult<()> {
        self.mutate(|table| {
            let index = table
                .iter()
                .position(|b| b.id == id)
                .ok_or_else(|| AppError::NotFound(id.to_string()))?;
            table.remove(index);
            Ok(())
        })
        .await?;
        info!("Deleted bot {}", id);
        Ok(())
    }

    /// Every live instance in stored order, credentials masked.
    pub async fn list(&self) -> Vec<InstanceSummary> {
        let table = self.store.lock().await.load_all().await;
        table
            .iter()
            .map(|b| b.summarize(self.vault.masked(&b.credential)))
            .collect()
    }

    pub async fn get(&self, id: &str) -> AppResult<InstanceSummary> {
        let table = self.store.lock().await.load_all().await;
        table
            .iter()
            .find(|b| b.id == id)
            .map(|b| b.summarize(self.vault.masked(&b.credential)))
            .ok_or_else(|| AppError::NotFound(id.to_string()))
    }

    /// Run `operation` against a freshly loaded table and persist the result.
    ///
    /// The lock is held across load and save. If `operation` fails nothing
    /// is written.
    async fn mutate<T, F>(&self, operation: F) -> AppResult<T>
    where
        F: FnOnce(&mut Vec<BotInstance>) -> AppResult<T>,
    {
        let store = self.store.lock().await;
        let mut table = store.load_all().await;
        let result = operation(&mut table)?;
        store.save_all(&table).await?;
        Ok(result)
    }
}

impl std::fmt::Debug for InstanceRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InstanceRegistry")
            .field("base_port", &self.base_port)
            .field("default_prefix", &self.default_prefix)
            .finish_non_exhaustive()
    }
}

fn validate_prefix(prefix: &str) -> AppResult<()> {
    let len = prefix.chars().count();
    if len == 0 || len > MAX_PREFIX_LEN {
        return Err(AppError::validation(format!(
            "prefix must be 1-{MAX_PREFIX_LEN} characters"
        )));
    }
    Ok(())
}

fn find_mut<'a>(table: &'a mut [BotInstance], id: &str) -> AppResult<&'a mut BotInstance> {
    table
        .iter_mut()
        .find(|b| b.id == id)
        .ok_or_else(|| AppError::NotFound(id.to_string()))
}

fn fresh_id(table: &[BotInstance]) -> String {
    loop {
        let id = format!("bot_{}", Uuid::new_v4().simple());
        if table.iter().all(|b| b.id != id) {
            return id;
        }
    }
}

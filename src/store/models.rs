use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle state of a bot instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InstanceStatus {
    Stopped,
    Running,
    Error,
}

impl InstanceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Stopped => "stopped",
            Self::Running => "running",
            Self::Error => "error",
        }
    }
}

impl std::fmt::Display for InstanceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A registered bot, as persisted in the instance table.
///
/// `credential` holds the encrypted blob; it never leaves the registry
/// except through a masked [`InstanceSummary`].
#[derive(Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BotInstance {
    pub id: String,
    #[serde(alias = "token")]
    pub credential: String,
    pub prefix: String,
    pub port: u16,
    pub status: InstanceStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl std::fmt::Debug for BotInstance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BotInstance")
            .field("id", &self.id)
            .field("credential", &"<redacted>")
            .field("prefix", &self.prefix)
            .field("port", &self.port)
            .field("status", &self.status)
            .field("last_error", &self.last_error)
            .field("created_at", &self.created_at)
            .finish()
    }
}

/// Outward projection of a bot instance with the credential masked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstanceSummary {
    pub id: String,
    pub credential: String,
    pub prefix: String,
    pub port: u16,
    pub status: InstanceStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl BotInstance {
    /// Build the summary for this instance from an already masked credential.
    pub fn summarize(&self, masked_credential: String) -> InstanceSummary {
        InstanceSummary {
            id: self.id.clone(),
            credential: masked_credential,
            prefix: self.prefix.clone(),
            port: self.port,
            status: self.status,
            last_error: self.last_error.clone(),
            created_at: self.created_at,
        }
    }
}

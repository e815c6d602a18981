pub mod models;
pub mod snapshot;

pub use models::{BotInstance, InstanceStatus, InstanceSummary};
pub use snapshot::SnapshotStore;

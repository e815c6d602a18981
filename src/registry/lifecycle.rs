//! Bot instance state machine.
//!
//! | From                  | Event           | To       |
//! |-----------------------|-----------------|----------|
//! | (none)                | add             | Stopped  |
//! | Stopped/Error/Running | start, valid    | Running  |
//! | Stopped/Error/Running | start, invalid  | Error    |
//! | any                   | stop            | Stopped  |
//!
//! Deletion is an absence from the table, not a state.

use crate::store::{BotInstance, InstanceStatus};

/// Message recorded on an instance whose credential failed validation.
pub const AUTHENTICATION_FAILED: &str = "Authentication failed";

/// Something that moves an instance between states.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LifecycleEvent {
    /// Credential decrypted during `start`
    StartValidated,
    /// Credential failed to decrypt during `start`
    StartRejected { reason: String },
    Stop,
}

/// Apply exactly one transition. `start` callers must validate first and
/// pass the outcome here; there is no intermediate state.
pub fn apply(instance: &mut BotInstance, event: LifecycleEvent) {
    let (status, last_error) = match event {
        LifecycleEvent::StartValidated => (InstanceStatus::Running, None),
        LifecycleEvent::StartRejected { reason } => (InstanceStatus::Error, Some(reason)),
        LifecycleEvent::Stop => (InstanceStatus::Stopped, None),
    };
    instance.status = status;
    instance.last_error = last_error;
}

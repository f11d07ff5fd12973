//! Bootstrap error handling

use std::time::Duration;

use mongodb::error::Error as DriverError;
use thiserror::Error;

use super::topology::ReplicaSetStatus;

/// Errors raised while bringing up the replica set
#[derive(Error, Debug)]
pub enum BootstrapError {
    /// Status was never observed before the deadline
    #[error("Replica set unreachable after {timeout:?}{}", detail_suffix(.last_error))]
    Unreachable {
        timeout: Duration,
        last_error: Option<String>,
    },

    /// Status was observed but members never all became primary or secondary
    #[error("Replica set did not converge within {timeout:?} (last status: {status})")]
    Unstable {
        timeout: Duration,
        status: ReplicaSetStatus,
    },

    /// The topology has not been initiated yet
    #[error("Replica set is not initiated yet")]
    NotInitialized,

    /// An administrative command failed
    #[error("Admin command '{command}' failed: {source}")]
    Admin {
        command: &'static str,
        #[source]
        source: DriverError,
    },

    /// An administrative reply did not have the expected shape
    #[error("Unexpected reply to '{command}': {details}")]
    MalformedReply {
        command: &'static str,
        details: String,
    },

    #[error("Invalid host '{host}': {details}")]
    InvalidHost { host: String, details: String },

    #[error("No replica set hosts configured")]
    NoHosts,
}

impl BootstrapError {
    /// Whether a later status poll could still succeed
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            BootstrapError::NotInitialized | BootstrapError::Admin { .. }
        )
    }
}

fn detail_suffix(detail: &Option<String>) -> String {
    detail
        .as_ref()
        .map(|d| format!(": {}", d))
        .unwrap_or_default()
}

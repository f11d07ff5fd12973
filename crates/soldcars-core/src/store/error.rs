//! Store error handling
//!
//! Provides typed errors for store operations. Storage-level faults that the
//! domain cares about (duplicate natural key, durability timeout) get their
//! own variants; everything else is carried as a driver error.

use std::time::Duration;

use mongodb::error::{Error as DriverError, ErrorKind, WriteFailure};
use thiserror::Error;

use crate::schema::ValidationError;

/// Server code for a unique index violation
pub const DUPLICATE_KEY: i32 = 11000;

/// Server code for a write concern not satisfied within its timeout
pub const WRITE_CONCERN_FAILED: i32 = 64;

/// Errors that can occur during store operations
#[derive(Error, Debug)]
pub enum StoreError {
    /// Input failed schema validation
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// A required lookup matched nothing
    #[error("Car with serial number '{serial}' not found.")]
    NotFound { serial: u32 },

    /// Natural key collision on insert
    #[error("Car with serial number '{serial}' already exists.")]
    AlreadyExists { serial: u32 },

    /// Majority acknowledgment did not arrive in time
    ///
    /// The write may still have been applied on the primary. It is not
    /// retried.
    #[error("Car with serial number '{serial}' was not acknowledged by a majority of replicas within {timeout:?}")]
    DurabilityTimeout {
        serial: u32,
        timeout: Duration,
        #[source]
        source: DriverError,
    },

    /// Connection settings are unusable
    #[error("Invalid store settings: {details}")]
    InvalidSettings { details: String },

    /// Client could not be created for the configured hosts
    #[error("Failed to connect to '{hosts}': {source}")]
    Connection {
        hosts: String,
        #[source]
        source: DriverError,
    },

    /// Stored document does not have the expected shape
    #[error("Invalid document in store: {details}")]
    InvalidDocument { details: String },

    /// Any other driver error
    #[error("Store error: {0}")]
    Driver(#[from] DriverError),
}

impl StoreError {
    /// Translate a failed insert of the car with `serial`
    pub fn from_write(error: DriverError, serial: u32, timeout: Duration) -> Self {
        match WriteFault::of(&error) {
            WriteFault::DuplicateKey => StoreError::AlreadyExists { serial },
            WriteFault::DurabilityTimeout => StoreError::DurabilityTimeout {
                serial,
                timeout,
                source: error,
            },
            WriteFault::Other => StoreError::Driver(error),
        }
    }

    /// Whether the caller sent something the store refused, as opposed to
    /// the store failing
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            StoreError::Validation(_)
                | StoreError::NotFound { .. }
                | StoreError::AlreadyExists { .. }
        )
    }

    /// Get a recovery suggestion for this error
    pub fn recovery_suggestion(&self) -> Option<&'static str> {
        match self {
            StoreError::DurabilityTimeout { .. } => Some(
                "The write may or may not be durable. Look the car up before inserting it again.",
            ),
            StoreError::AlreadyExists { .. } => {
                Some("Use a different serial number, or fetch the existing car.")
            }
            StoreError::Connection { .. } | StoreError::InvalidSettings { .. } => {
                Some("Check MONGODB_HOSTS and MONGODB_REPLSET.")
            }
            _ => None,
        }
    }
}

/// Storage fault classes the domain distinguishes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum WriteFault {
    DuplicateKey,
    DurabilityTimeout,
    Other,
}

impl WriteFault {
    pub(crate) fn of(error: &DriverError) -> Self {
        match error.kind.as_ref() {
            ErrorKind::Write(WriteFailure::WriteError(e)) => Self::from_code(e.code),
            ErrorKind::Write(WriteFailure::WriteConcernError(e)) => Self::from_code(e.code),
            ErrorKind::Command(e) => Self::from_code(e.code),
            _ => WriteFault::Other,
        }
    }

    pub(crate) fn from_code(code: i32) -> Self {
        match code {
            DUPLICATE_KEY => WriteFault::DuplicateKey,
            WRITE_CONCERN_FAILED => WriteFault::DurabilityTimeout,
            _ => WriteFault::Other,
        }
    }
}

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

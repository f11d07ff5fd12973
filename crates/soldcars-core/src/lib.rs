//! soldcars Core Library
//!
//! This crate provides the core functionality for soldcars, a service that
//! records sold cars in a replicated document store.
//!
//! # Architecture
//!
//! - **Schema**: every record is validated against a declarative schema
//!   before it reaches the store
//! - **Store**: a shared connection registry and per-call consistency hints
//!   (primary, stale-tolerant reads, majority-durable writes)
//! - **Cluster**: idempotent replica-set initiation and convergence polling
//!
//! # Quick Start
//!
//! ```text
//! let config = Config::load()?;
//! let registry = Arc::new(ConnectionRegistry::new(config.store_settings()));
//! let store = CarStore::new(Arc::clone(&registry));
//!
//! let mut car = Car::validate(&input)?;
//! store.insert(&mut car).await?;
//! let record = store.one(car.serial_number(), &Lookup::new().stale_ok()).await?;
//! ```
//!
//! # Modules
//!
//! - `schema`: Schema nodes, validation and mock generation
//! - `models`: The car record and its schema
//! - `store`: Connection registry and car collection access
//! - `cluster`: Replica-set bootstrap
//! - `config`: Application configuration

pub mod cluster;
pub mod config;
pub mod models;
pub mod schema;
pub mod store;

pub use cluster::{BootstrapError, BootstrapState, ClusterBootstrap};
pub use config::Config;
pub use models::Car;
pub use schema::{Record, SchemaNode, ValidationError};
pub use store::{CarStore, ConnectionRegistry, Consistency, Lookup, StoreError, StoreResult};

//! Replica-set bootstrap
//!
//! Brings a set of store hosts up as a replica set:
//!
//! ```text
//! Uninitialized -> Initiating -> Converging -> Ready
//!                      |             |
//!                      +--> Failed <-+
//! ```
//!
//! ## Usage
//!
//! ```ignore
//! let bootstrap = ClusterBootstrap::connect(&config.bootstrap_settings()?)?;
//! let elapsed = bootstrap.run().await?;
//! bootstrap.into_admin().close().await;
//! ```

mod admin;
mod bootstrap;
mod error;
mod topology;

pub use admin::{ClusterAdmin, MongoAdmin};
pub use bootstrap::{BootstrapState, ClusterBootstrap};
pub use error::BootstrapError;
pub use topology::{Member, MemberRole, MemberStatus, ReplicaSetConfig, ReplicaSetStatus};

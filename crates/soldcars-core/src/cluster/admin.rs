//! Administrative commands against the replica set

use std::future::Future;
use std::time::Duration;

use mongodb::bson::doc;
use mongodb::error::{Error as DriverError, ErrorKind};
use mongodb::options::{ClientOptions, ServerAddress};
use mongodb::{Client, Database};
use tracing::{debug, info};

use super::error::BootstrapError;
use super::topology::{ReplicaSetConfig, ReplicaSetStatus};

/// Server code for "no replica set configuration yet"
const NOT_YET_INITIALIZED: i32 = 94;

/// Server code for "replica set already initiated"
const ALREADY_INITIALIZED: i32 = 23;

/// Bound on a single admin round trip, so one dead host cannot stall a poll
const ADMIN_TIMEOUT: Duration = Duration::from_secs(5);

/// Administrative surface bootstrap needs
pub trait ClusterAdmin: Send + Sync {
    /// Current configuration, or `None` if the set was never initiated
    fn replica_config(
        &self,
    ) -> impl Future<Output = Result<Option<ReplicaSetConfig>, BootstrapError>> + Send;

    /// Initiate the set with `config`
    fn initiate(
        &self,
        config: &ReplicaSetConfig,
    ) -> impl Future<Output = Result<(), BootstrapError>> + Send;

    /// Current member roles
    fn replica_status(
        &self,
    ) -> impl Future<Output = Result<ReplicaSetStatus, BootstrapError>> + Send;
}

/// [`ClusterAdmin`] over a direct connection to one contact host
pub struct MongoAdmin {
    client: Client,
}

impl MongoAdmin {
    /// Client for `contact_host`; no I/O happens until the first command
    pub fn connect(contact_host: &str) -> Result<Self, BootstrapError> {
        let address =
            ServerAddress::parse(contact_host).map_err(|e| BootstrapError::InvalidHost {
                host: contact_host.to_string(),
                details: e.to_string(),
            })?;

        let mut options = ClientOptions::default();
        options.hosts = vec![address];
        options.direct_connection = Some(true);
        options.connect_timeout = Some(ADMIN_TIMEOUT);
        options.server_selection_timeout = Some(ADMIN_TIMEOUT);

        let client = Client::with_options(options).map_err(|source| BootstrapError::Admin {
            command: "connect",
            source,
        })?;
        debug!("Admin client for {}", contact_host);
        Ok(Self { client })
    }

    pub async fn close(self) {
        self.client.shutdown().await;
    }

    fn admin_db(&self) -> Database {
        self.client.database("admin")
    }
}

impl ClusterAdmin for MongoAdmin {
    async fn replica_config(&self) -> Result<Option<ReplicaSetConfig>, BootstrapError> {
        let command = "replSetGetConfig";
        let reply = match self.admin_db().run_command(doc! { command: 1 }, None).await {
            Ok(reply) => reply,
            Err(e) if command_code(&e) == Some(NOT_YET_INITIALIZED) => return Ok(None),
            Err(source) => return Err(BootstrapError::Admin { command, source }),
        };

        let config = reply
            .get_document("config")
            .map_err(|e| BootstrapError::MalformedReply {
                command,
                details: e.to_string(),
            })?;
        ReplicaSetConfig::from_document(config).map(Some)
    }

    async fn initiate(&self, config: &ReplicaSetConfig) -> Result<(), BootstrapError> {
        let command = "replSetInitiate";
        match self
            .admin_db()
            .run_command(doc! { command: config.to_document() }, None)
            .await
        {
            Ok(_) => Ok(()),
            // Lost a race with another bootstrapper; the set exists either way
            Err(e) if command_code(&e) == Some(ALREADY_INITIALIZED) => {
                info!("Replica set '{}' was initiated concurrently", config.name);
                Ok(())
            }
            Err(source) => Err(BootstrapError::Admin { command, source }),
        }
    }

    async fn replica_status(&self) -> Result<ReplicaSetStatus, BootstrapError> {
        let command = "replSetGetStatus";
        match self.admin_db().run_command(doc! { command: 1 }, None).await {
            Ok(reply) => ReplicaSetStatus::from_document(&reply),
            Err(e) if command_code(&e) == Some(NOT_YET_INITIALIZED) => {
                Err(BootstrapError::NotInitialized)
            }
            Err(source) => Err(BootstrapError::Admin { command, source }),
        }
    }
}

fn command_code(error: &DriverError) -> Option<i32> {
    match error.kind.as_ref() {
        ErrorKind::Command(e) => Some(e.code),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_connect_is_lazy() {
        let admin = MongoAdmin::connect("localhost:27017").unwrap();
        admin.close().await;
    }

    #[test]
    fn test_invalid_contact_host() {
        assert!(matches!(
            MongoAdmin::connect("m1:notaport"),
            Err(BootstrapError::InvalidHost { .. })
        ));
    }
}

//! Connection registry
//!
//! Process-scoped set of live store clients, keyed by name. Created at
//! startup, shared by reference, and closed once at shutdown.

use std::collections::HashMap;

use mongodb::options::{ClientOptions, ServerAddress};
use mongodb::Client;
use tokio::sync::RwLock;
use tracing::{debug, info};

use super::error::{StoreError, StoreResult};
use crate::config::StoreSettings;

/// Key of the connection used when callers do not ask for a specific one
pub const DEFAULT_KEY: &str = "default";

const APP_NAME: &str = "soldcars";

/// Keyed collection of store clients
///
/// Clients are created lazily on first use of a key. Concurrent callers
/// asking for the same key get the same client.
pub struct ConnectionRegistry {
    settings: StoreSettings,
    clients: RwLock<HashMap<String, Client>>,
}

impl ConnectionRegistry {
    pub fn new(settings: StoreSettings) -> Self {
        Self {
            settings,
            clients: RwLock::new(HashMap::new()),
        }
    }

    pub fn settings(&self) -> &StoreSettings {
        &self.settings
    }

    /// Get the client registered under `key`, if any
    pub async fn get(&self, key: &str) -> Option<Client> {
        self.clients.read().await.get(key).cloned()
    }

    /// Get the client for `key`, creating and registering it if needed
    pub async fn get_or_create(&self, key: &str) -> StoreResult<Client> {
        if let Some(client) = self.get(key).await {
            return Ok(client);
        }

        let mut clients = self.clients.write().await;
        // Another caller may have registered it while we waited for the lock
        if let Some(client) = clients.get(key) {
            return Ok(client.clone());
        }

        let client = self.connect()?;
        info!("Registered store connection '{}'", key);
        clients.insert(key.to_string(), client.clone());
        Ok(client)
    }

    /// The client under [`DEFAULT_KEY`]
    pub async fn default_client(&self) -> StoreResult<Client> {
        self.get_or_create(DEFAULT_KEY).await
    }

    /// Install a fresh client under `key` and close the one it replaces
    ///
    /// The swap happens under the write lock, so no caller can obtain the
    /// old client once it is being closed.
    pub async fn replace(&self, key: &str) -> StoreResult<Client> {
        let client = self.connect()?;
        let previous = self
            .clients
            .write()
            .await
            .insert(key.to_string(), client.clone());

        if let Some(previous) = previous {
            debug!("Closing replaced store connection '{}'", key);
            previous.shutdown().await;
        }
        info!("Registered store connection '{}'", key);
        Ok(client)
    }

    /// Close every registered client
    pub async fn close_all(&self) {
        let clients: Vec<_> = self.clients.write().await.drain().collect();
        for (key, client) in clients {
            debug!("Closing store connection '{}'", key);
            client.shutdown().await;
        }
    }

    /// Number of registered clients
    pub async fn len(&self) -> usize {
        self.clients.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    fn connect(&self) -> StoreResult<Client> {
        let options = client_options(&self.settings)?;
        Client::with_options(options).map_err(|source| StoreError::Connection {
            hosts: self.settings.hosts.join(","),
            source,
        })
    }
}

/// Driver options for the configured hosts and replica set
pub fn client_options(settings: &StoreSettings) -> StoreResult<ClientOptions> {
    let hosts = parse_addresses(&settings.hosts)?;

    let mut options = ClientOptions::default();
    options.hosts = hosts;
    options.repl_set_name = settings.replica_set.clone();
    options.app_name = Some(APP_NAME.to_string());
    // Callers own retry policy
    options.retry_writes = Some(false);
    options.retry_reads = Some(false);
    Ok(options)
}

/// Parse `host[:port]` strings into driver addresses
fn parse_addresses(hosts: &[String]) -> StoreResult<Vec<ServerAddress>> {
    if hosts.is_empty() {
        return Err(StoreError::InvalidSettings {
            details: "host list is empty".to_string(),
        });
    }

    hosts
        .iter()
        .map(|host| {
            ServerAddress::parse(host).map_err(|e| StoreError::InvalidSettings {
                details: format!("bad host '{}': {}", host, e),
            })
        })
        .collect()
}

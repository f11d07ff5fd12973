//! Replica-set bring-up
//!
//! `init` installs a configuration built from the host list (or adopts the
//! existing one), and `wait` polls member roles until every member serves
//! or the deadline passes.

use std::time::Duration;

use tokio::sync::watch;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use super::admin::{ClusterAdmin, MongoAdmin};
use super::error::BootstrapError;
use super::topology::{ReplicaSetConfig, ReplicaSetStatus};
use crate::config::BootstrapSettings;

/// Bootstrap progress
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootstrapState {
    /// Nothing attempted yet
    Uninitialized,
    /// Looking up or installing the configuration
    Initiating,
    /// Polling member roles
    Converging,
    /// Every member is primary or secondary
    Ready,
    /// Initiation failed or the deadline passed
    Failed,
}

/// Drives a replica set from unconfigured to serving
pub struct ClusterBootstrap<A> {
    admin: A,
    desired: ReplicaSetConfig,
    poll_interval: Duration,
    member_timeout: Duration,
    state: watch::Sender<BootstrapState>,
    state_rx: watch::Receiver<BootstrapState>,
}

impl ClusterBootstrap<MongoAdmin> {
    /// Bootstrap talking to the first host of the sorted host set
    pub fn connect(settings: &BootstrapSettings) -> Result<Self, BootstrapError> {
        let desired = ReplicaSetConfig::from_hosts(&settings.replica_set, &settings.hosts)?;
        let admin = MongoAdmin::connect(desired.contact_host())?;
        Self::new(admin, settings)
    }
}

impl<A: ClusterAdmin> ClusterBootstrap<A> {
    pub fn new(admin: A, settings: &BootstrapSettings) -> Result<Self, BootstrapError> {
        let desired = ReplicaSetConfig::from_hosts(&settings.replica_set, &settings.hosts)?;
        let (state, state_rx) = watch::channel(BootstrapState::Uninitialized);

        Ok(Self {
            admin,
            desired,
            poll_interval: settings.poll_interval,
            member_timeout: settings.member_timeout,
            state,
            state_rx,
        })
    }

    pub fn admin(&self) -> &A {
        &self.admin
    }

    pub fn into_admin(self) -> A {
        self.admin
    }

    /// Configuration `init` installs on an unconfigured set
    pub fn desired_config(&self) -> &ReplicaSetConfig {
        &self.desired
    }

    /// Bound on the whole of `wait`: the per-member budget times the member count
    pub fn timeout(&self) -> Duration {
        let members: u32 = self.desired.member_count().try_into().unwrap_or(u32::MAX);
        self.member_timeout.saturating_mul(members)
    }

    pub fn state(&self) -> BootstrapState {
        *self.state_rx.borrow()
    }

    /// Subscribe to state changes
    pub fn subscribe_state(&self) -> watch::Receiver<BootstrapState> {
        self.state_rx.clone()
    }

    /// Initiate the set unless it already has a configuration
    ///
    /// An existing configuration is returned unchanged, so calling this
    /// against a running set is harmless.
    pub async fn init(&self) -> Result<ReplicaSetConfig, BootstrapError> {
        self.set_state(BootstrapState::Initiating);

        match self.initiate_if_needed().await {
            Ok(config) => Ok(config),
            Err(e) => {
                warn!("Replica set initiation failed: {}", e);
                self.set_state(BootstrapState::Failed);
                Err(e)
            }
        }
    }

    async fn initiate_if_needed(&self) -> Result<ReplicaSetConfig, BootstrapError> {
        if let Some(existing) = self.admin.replica_config().await? {
            info!(
                "Replica set '{}' already configured with {} members",
                existing.name,
                existing.member_count()
            );
            return Ok(existing);
        }

        info!(
            "Initiating replica set '{}' with {} members",
            self.desired.name,
            self.desired.member_count()
        );
        self.admin.initiate(&self.desired).await?;
        Ok(self.desired.clone())
    }

    /// Poll until every member is primary or secondary
    ///
    /// Transient poll failures count as "not alive yet"; any other failure
    /// ends the wait at once. Returns the elapsed time on convergence.
    /// Dropping the future stops polling.
    pub async fn wait(&self) -> Result<Duration, BootstrapError> {
        let timeout = self.timeout();
        let started = Instant::now();
        let deadline = started + timeout;
        self.set_state(BootstrapState::Converging);

        let mut observed: Option<ReplicaSetStatus> = None;
        let mut last_error: Option<String> = None;
        let mut attempt: u64 = 0;

        loop {
            attempt += 1;
            let remaining = deadline.saturating_duration_since(Instant::now());

            match tokio::time::timeout(remaining, self.admin.replica_status()).await {
                Ok(Ok(status)) if status.is_converged() => {
                    let elapsed = started.elapsed();
                    info!("Replica set converged after {:?} ({})", elapsed, status);
                    self.set_state(BootstrapState::Ready);
                    return Ok(elapsed);
                }
                Ok(Ok(status)) => {
                    debug!("Poll {}: not converged: {}", attempt, status);
                    observed = Some(status);
                }
                Ok(Err(e)) if e.is_transient() => {
                    debug!("Poll {}: not alive yet: {}", attempt, e);
                    last_error = Some(e.to_string());
                }
                Ok(Err(e)) => {
                    warn!("Poll {}: giving up: {}", attempt, e);
                    self.set_state(BootstrapState::Failed);
                    return Err(e);
                }
                Err(_) => {
                    debug!("Poll {}: status request outlived the deadline", attempt);
                    last_error = Some("status request timed out".to_string());
                }
            }

            let now = Instant::now();
            if now >= deadline {
                break;
            }
            tokio::time::sleep(self.poll_interval.min(deadline - now)).await;
        }

        self.set_state(BootstrapState::Failed);
        let error = match observed {
            Some(status) => BootstrapError::Unstable { timeout, status },
            None => BootstrapError::Unreachable {
                timeout,
                last_error,
            },
        };
        warn!("{}", error);
        Err(error)
    }

    /// `init` followed by `wait`
    pub async fn run(&self) -> Result<Duration, BootstrapError> {
        self.init().await?;
        self.wait().await
    }

    fn set_state(&self, state: BootstrapState) {
        let previous = self.state.send_replace(state);
        if previous != state {
            debug!("Bootstrap state {:?} -> {:?}", previous, state);
        }
    }
}

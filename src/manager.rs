//! Connection lifecycle management.
//!
//! This module owns the single session to the router. It performs the
//! initial connect (fatal on failure, since there is nothing to serve
//! without a session), exposes the current session handle to command
//! dispatch, and
//! runs a background keep-alive loop that probes the session at a fixed
//! interval and replaces it when the probe fails.
//!
//! # Sharing contract
//!
//! The current session lives behind `RwLock<Arc<C>>`. Readers clone the
//! `Arc` and release the lock before issuing any remote call, so a reader
//! always observes either the fully-old or the fully-new session, and no
//! lock is ever held across the wire. A session replaced mid-flight is not
//! cancelled: calls already running against the old handle complete (or
//! fail) on the stale transport.
//!
//! # Reconnect policy
//!
//! Only the *initial* connect is fatal. Once a session has been
//! established, a failed probe triggers reconnect attempts with capped
//! exponential backoff plus jitter, retried until the router answers again.
//! Steady-state operation never exits the process.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use rand::Rng;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tokio::time::{interval, sleep, MissedTickBehavior};

use crate::client::{ApiClient, Transport};
use crate::config::ConnectionParams;

/// How often the keep-alive loop probes the session. Not configurable at
/// runtime.
pub const KEEP_ALIVE_INTERVAL: Duration = Duration::from_secs(30);

/// The liveness probe: a cheap read-only command every RouterOS version
/// answers.
const PROBE_COMMAND: &str = "/system/identity/print";

const INITIAL_BACKOFF: Duration = Duration::from_millis(500);
const MAX_BACKOFF: Duration = Duration::from_secs(30);

/// Factory for new sessions. The keep-alive loop dials through this on
/// every reconnect; tests substitute a fake.
#[async_trait]
pub trait Dial: Send + Sync + 'static {
    type Conn: Transport;

    async fn dial(&self) -> Result<Self::Conn>;
}

/// Dials [`ApiClient`] sessions from the resolved connection parameters.
pub struct ApiDialer {
    params: ConnectionParams,
}

impl ApiDialer {
    pub fn new(params: ConnectionParams) -> Self {
        Self { params }
    }
}

#[async_trait]
impl Dial for ApiDialer {
    type Conn = ApiClient;

    async fn dial(&self) -> Result<ApiClient> {
        ApiClient::dial(
            &self.params.address,
            self.params.port,
            &self.params.username,
            &self.params.password,
        )
        .await
    }
}

/// Lifecycle state of the managed session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// Connected and answering probes.
    Connected,
    /// A probe failed; reconnect attempts are in progress.
    Reconnecting,
}

/// Owns the single session to the router and keeps it alive.
pub struct SessionManager<D: Dial> {
    dialer: Arc<D>,
    session: Arc<RwLock<Arc<D::Conn>>>,
    state: Arc<RwLock<ConnectionState>>,
    keep_alive_interval: Duration,
}

impl<D: Dial> SessionManager<D> {
    /// Establishes the initial session. A failure here is fatal to the
    /// caller: there is no previous session to fall back on.
    pub async fn connect(dialer: D) -> Result<Self> {
        let conn = dialer.dial().await?;
        Ok(Self {
            dialer: Arc::new(dialer),
            session: Arc::new(RwLock::new(Arc::new(conn))),
            state: Arc::new(RwLock::new(ConnectionState::Connected)),
            keep_alive_interval: KEEP_ALIVE_INTERVAL,
        })
    }

    /// Returns the current session handle. The handle stays valid for the
    /// caller even if the keep-alive loop installs a replacement while a
    /// call is in flight.
    pub async fn session(&self) -> Arc<D::Conn> {
        self.session.read().await.clone()
    }

    /// Returns the current lifecycle state.
    pub async fn state(&self) -> ConnectionState {
        *self.state.read().await
    }

    /// Spawns the background keep-alive loop. The task runs until the
    /// returned handle is aborted; the caller holds it for the life of the
    /// process and aborts it on shutdown.
    pub fn spawn_keep_alive(&self) -> JoinHandle<()> {
        let dialer = Arc::clone(&self.dialer);
        let session = Arc::clone(&self.session);
        let state = Arc::clone(&self.state);
        let period = self.keep_alive_interval;

        tokio::spawn(async move {
            let mut ticker = interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The first tick fires immediately; the session was just
            // dialed, so skip it.
            ticker.tick().await;

            loop {
                ticker.tick().await;
                probe_and_repair(&*dialer, &session, &state).await;
            }
        })
    }

    #[cfg(test)]
    fn set_keep_alive_interval(&mut self, period: Duration) {
        self.keep_alive_interval = period;
    }
}

/// One keep-alive cycle: probe the current session, and on failure dial
/// replacements until one succeeds.
async fn probe_and_repair<D: Dial>(
    dialer: &D,
    session: &RwLock<Arc<D::Conn>>,
    state: &RwLock<ConnectionState>,
) {
    let current = session.read().await.clone();
    match current.run(PROBE_COMMAND, &[]).await {
        Ok(_) => {
            tracing::debug!("keep-alive probe ok");
        }
        Err(e) => {
            tracing::warn!(error = %e, "Keep alive failed, attempting to reconnect");
            *state.write().await = ConnectionState::Reconnecting;

            let conn = reconnect(dialer, INITIAL_BACKOFF, MAX_BACKOFF).await;
            *session.write().await = Arc::new(conn);
            *state.write().await = ConnectionState::Connected;
            tracing::info!("Session re-established");
        }
    }
}

/// Dials until a session comes up, doubling the delay between attempts up
/// to `max_backoff`, with jitter so a fleet of clients does not hammer a
/// recovering router in lockstep.
async fn reconnect<D: Dial>(dialer: &D, initial_backoff: Duration, max_backoff: Duration) -> D::Conn {
    let mut backoff = initial_backoff;
    let mut attempt = 1u32;

    loop {
        match dialer.dial().await {
            Ok(conn) => return conn,
            Err(e) => {
                let jitter = Duration::from_millis(
                    rand::thread_rng().gen_range(0..=backoff.as_millis().max(1) as u64 / 2),
                );
                tracing::warn!(
                    error = %e,
                    attempt,
                    delay = ?(backoff + jitter),
                    "Reconnect attempt failed"
                );
                sleep(backoff + jitter).await;
                backoff = (backoff * 2).min(max_backoff);
                attempt = attempt.saturating_add(1);
            }
        }
    }
}

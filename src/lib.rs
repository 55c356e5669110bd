//! MikroTik Wi-Fi management library.
//!
//! Manages wireless network configuration on a RouterOS device over its
//! binary management API: list, create, update, and remove wireless
//! networks and their WPA2 security profiles.
//!
//! The heart of the crate is the [`manager::SessionManager`], which owns
//! the single authenticated session to the router, keeps it alive with
//! periodic probes, and transparently replaces it when it drops. The
//! domain operations in [`wifi`] are stateless pass-throughs issued over
//! whatever session is current.
//!
//! # Modules
//!
//! - [`client`] - RouterOS API client (dial, login, run)
//! - [`config`] - Connection parameter resolution
//! - [`error`] - Custom error types for the library
//! - [`manager`] - Session lifecycle: keep-alive and reconnect
//! - [`proto`] - API wire framing (word lengths, sentences)
//! - [`wifi`] - Wireless network operations
//!
//! # Example Usage
//!
//! ```no_run
//! use mikrotik_wifi::config::ConnectionParams;
//! use mikrotik_wifi::manager::{ApiDialer, SessionManager};
//! use mikrotik_wifi::wifi;
//!
//! # async fn demo(params: ConnectionParams) -> anyhow::Result<()> {
//! let manager = SessionManager::connect(ApiDialer::new(params)).await?;
//! let keep_alive = manager.spawn_keep_alive();
//!
//! let session = manager.session().await;
//! for ssid in wifi::list_networks(&*session).await? {
//!     println!("{ssid}");
//! }
//!
//! keep_alive.abort();
//! # Ok(())
//! # }
//! ```

/// RouterOS API client: dialing, authentication, and command execution.
pub mod client;

/// Connection parameter resolution from flags, environment, and config file.
pub mod config;

/// Error types for the library. Uses `thiserror` for ergonomic handling.
pub mod error;

/// Session lifecycle management: shared handle, keep-alive loop, reconnect.
pub mod manager;

/// Wire framing for the RouterOS binary API.
pub mod proto;

/// Wireless network domain operations (list, create, update, remove).
pub mod wifi;

// Re-export the pieces a caller needs to stand up a session and use it.
pub use client::{ApiClient, Reply, Transport};
pub use config::ConnectionParams;
pub use error::MikrotikWifiError;
pub use manager::{ApiDialer, ConnectionState, SessionManager, KEEP_ALIVE_INTERVAL};

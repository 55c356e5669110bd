//! RouterOS API client.
//!
//! This module provides the transport used by every command the tool issues:
//! [`ApiClient::dial`] opens a TCP connection to the router's API port and
//! authenticates, and [`Transport::run`] sends one command sentence and
//! collects the reply records.
//!
//! # Reply handling
//!
//! The router answers a command with zero or more `!re` sentences (one per
//! record), terminated by `!done`. An `!trap` sentence reports a command
//! error and still ends with `!done`; `!fatal` means the router is closing
//! the connection. Both are surfaced as errors carrying the router's
//! message.
//!
//! # Example
//!
//! ```no_run
//! use mikrotik_wifi::client::{ApiClient, Transport};
//!
//! # async fn demo() -> anyhow::Result<()> {
//! let client = ApiClient::dial("192.168.88.1", 8728, "admin", "").await?;
//! let replies = client.run("/system/identity/print", &[]).await?;
//! println!("identity: {:?}", replies[0].get("name"));
//! # Ok(())
//! # }
//! ```

use std::collections::HashMap;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tokio::time::timeout;

use crate::error::MikrotikWifiError;
use crate::proto;

/// How long a single dial or command exchange may take before it is
/// abandoned. The protocol itself defines no timeout; this is the sane
/// default applied at the transport.
pub const COMMAND_TIMEOUT: Duration = Duration::from_secs(10);

/// One `!re` record from a command reply: the router's attribute words
/// parsed into a key-value map.
#[derive(Debug, Clone, Default)]
pub struct Reply {
    attributes: HashMap<String, String>,
}

impl Reply {
    pub(crate) fn from_words(words: &[String]) -> Self {
        let attributes = words
            .iter()
            .filter_map(|w| proto::parse_attribute(w))
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Self { attributes }
    }

    /// Returns the value of an attribute, if the record carries it.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(String::as_str)
    }
}

/// The command-issuing seam between the session manager, the domain
/// operations, and the wire. Implemented by [`ApiClient`] for real routers
/// and by fakes in tests.
#[async_trait]
pub trait Transport: Send + Sync + 'static {
    /// Issues one command and returns the reply records.
    async fn run(&self, command: &str, args: &[String]) -> Result<Vec<Reply>>;
}

/// An authenticated connection to one RouterOS device.
pub struct ApiClient {
    // The API is one-request-at-a-time: the stream is locked for the full
    // send/receive exchange.
    stream: Mutex<TcpStream>,
}

impl ApiClient {
    /// Opens a TCP connection to `address:port` and logs in with the plain
    /// post-6.43 `/login` exchange.
    pub async fn dial(address: &str, port: u16, username: &str, password: &str) -> Result<Self> {
        let mut stream = timeout(COMMAND_TIMEOUT, TcpStream::connect((address, port)))
            .await
            .map_err(|_| MikrotikWifiError::ConnectionFailed {
                address: format!("{address}:{port}"),
                reason: format!("connect timed out after {COMMAND_TIMEOUT:?}"),
            })?
            .map_err(|e| MikrotikWifiError::ConnectionFailed {
                address: format!("{address}:{port}"),
                reason: e.to_string(),
            })?;

        let login = vec![
            "/login".to_string(),
            format!("=name={username}"),
            format!("=password={password}"),
        ];
        timeout(COMMAND_TIMEOUT, exchange(&mut stream, &login))
            .await
            .map_err(|_| MikrotikWifiError::Timeout(COMMAND_TIMEOUT))?
            .map_err(|e| MikrotikWifiError::LoginFailed(format!("{e:#}")))?;

        Ok(Self {
            stream: Mutex::new(stream),
        })
    }
}

#[async_trait]
impl Transport for ApiClient {
    async fn run(&self, command: &str, args: &[String]) -> Result<Vec<Reply>> {
        let mut words = Vec::with_capacity(1 + args.len());
        words.push(command.to_string());
        words.extend_from_slice(args);

        let mut stream = self.stream.lock().await;
        timeout(COMMAND_TIMEOUT, exchange(&mut *stream, &words))
            .await
            .map_err(|_| MikrotikWifiError::Timeout(COMMAND_TIMEOUT))?
            .with_context(|| format!("Command {command} failed"))
    }
}

/// Sends one sentence and reads reply sentences until the router signals
/// the end of the command.
async fn exchange<S>(stream: &mut S, words: &[String]) -> Result<Vec<Reply>>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    proto::write_sentence(stream, words).await?;

    let mut replies = Vec::new();
    let mut trap: Option<String> = None;

    loop {
        let sentence = proto::read_sentence(stream).await?;
        let Some((marker, rest)) = sentence.split_first() else {
            // Keep-alive padding between sentences; ignore.
            continue;
        };

        match marker.as_str() {
            "!re" => replies.push(Reply::from_words(rest)),
            "!done" => {
                return match trap {
                    Some(message) => Err(MikrotikWifiError::Trap(message).into()),
                    None => Ok(replies),
                };
            }
            "!trap" => {
                let message = Reply::from_words(rest)
                    .get("message")
                    .unwrap_or("unknown error")
                    .to_string();
                trap = Some(message);
            }
            "!fatal" => {
                let message = rest.first().cloned().unwrap_or_default();
                return Err(MikrotikWifiError::Fatal(message).into());
            }
            other => {
                return Err(MikrotikWifiError::Protocol(format!(
                    "unexpected reply marker '{other}'"
                ))
                .into());
            }
        }
    }
}

use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MikrotikWifiError {
    #[error("Failed to connect to RouterOS at {address}: {reason}")]
    ConnectionFailed { address: String, reason: String },

    #[error("RouterOS login failed: {0}")]
    LoginFailed(String),

    #[error("RouterOS error: {0}")]
    Trap(String),

    #[error("Connection closed by router: {0}")]
    Fatal(String),

    #[error("Malformed API reply: {0}")]
    Protocol(String),

    #[error("Command timed out after {0:?}")]
    Timeout(Duration),

    #[error("Word of {0} bytes exceeds the maximum word size")]
    WordTooLong(usize),

    #[error("Unknown property '{0}' (expected 'ssid' or 'password')")]
    UnknownProperty(String),
}

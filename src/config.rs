use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_ADDRESS: &str = "192.168.88.1";
pub const DEFAULT_USERNAME: &str = "admin";
pub const DEFAULT_PASSWORD: &str = "";
pub const DEFAULT_PORT: u16 = 8728;

/// Connection parameters for the router, fixed for the life of the
/// process once resolved.
#[derive(Debug, Clone)]
pub struct ConnectionParams {
    pub address: String,
    pub username: String,
    pub password: String,
    pub port: u16,
}

impl ConnectionParams {
    /// Resolves the final parameters. The CLI layer passes `None` for
    /// anything the user did not supply via flag or environment variable;
    /// those fall back to the config file, then to the built-in defaults.
    /// An empty password is accepted as-is.
    pub fn resolve(
        address: Option<String>,
        username: Option<String>,
        password: Option<String>,
        port: Option<u16>,
        file: &FileConfig,
    ) -> Self {
        Self {
            address: address
                .or_else(|| file.address.clone())
                .unwrap_or_else(|| DEFAULT_ADDRESS.to_string()),
            username: username
                .or_else(|| file.username.clone())
                .unwrap_or_else(|| DEFAULT_USERNAME.to_string()),
            password: password
                .or_else(|| file.password.clone())
                .unwrap_or_else(|| DEFAULT_PASSWORD.to_string()),
            port: port.or(file.port).unwrap_or(DEFAULT_PORT),
        }
    }
}

/// Optional on-disk defaults, read from the user config directory. Every
/// field may be omitted; flags and environment variables take precedence.
#[derive(Debug, Deserialize, Default)]
pub struct FileConfig {
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub port: Option<u16>,
}

impl FileConfig {
    pub fn load() -> Result<Self> {
        let path = config_path()?;
        Self::load_from(&path)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(FileConfig::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }
}

pub fn config_path() -> Result<PathBuf> {
    let config_dir = dirs::config_dir().context("Could not determine config directory")?;
    Ok(config_dir.join("mikrotik-wifi").join("config.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn builtin_defaults_apply_when_nothing_is_supplied() {
        let params = ConnectionParams::resolve(None, None, None, None, &FileConfig::default());
        assert_eq!(params.address, DEFAULT_ADDRESS);
        assert_eq!(params.username, DEFAULT_USERNAME);
        assert_eq!(params.password, DEFAULT_PASSWORD);
        assert_eq!(params.port, DEFAULT_PORT);
    }

    #[test]
    fn explicit_values_win_over_the_config_file() {
        let file = FileConfig {
            address: Some("10.0.0.1".to_string()),
            username: Some("ops".to_string()),
            password: Some("filepw".to_string()),
            port: Some(8729),
        };

        let params = ConnectionParams::resolve(
            Some("10.0.0.2".to_string()),
            None,
            Some(String::new()),
            None,
            &file,
        );

        assert_eq!(params.address, "10.0.0.2");
        assert_eq!(params.username, "ops");
        // An explicitly empty password is not replaced by the file value.
        assert_eq!(params.password, "");
        assert_eq!(params.port, 8729);
    }

    #[test]
    fn partial_config_file_fills_only_its_own_fields() {
        let mut tmp = NamedTempFile::new().unwrap();
        writeln!(tmp, "address = \"router.lan\"\nport = 8730").unwrap();

        let file = FileConfig::load_from(tmp.path()).unwrap();
        let params = ConnectionParams::resolve(None, None, None, None, &file);

        assert_eq!(params.address, "router.lan");
        assert_eq!(params.port, 8730);
        assert_eq!(params.username, DEFAULT_USERNAME);
    }

    #[test]
    fn missing_config_file_means_empty_defaults() {
        let file = FileConfig::load_from(Path::new("/nonexistent/mikrotik-wifi.toml")).unwrap();
        assert!(file.address.is_none());
        assert!(file.port.is_none());
    }

    #[test]
    fn malformed_config_file_is_an_error() {
        let mut tmp = NamedTempFile::new().unwrap();
        writeln!(tmp, "port = \"not a number\"").unwrap();

        assert!(FileConfig::load_from(tmp.path()).is_err());
    }
}

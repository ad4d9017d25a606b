//! Appliance inventory loaded from a JSON config file.
//!
//! The file is a JSON list; each entry describes one appliance:
//!
//! ```json
//! [
//!   {
//!     "nickname": "hsm1",
//!     "hostname": "1.1.1.1",
//!     "ssh_port": 22,
//!     "ssh_login": "admin",
//!     "ssh_password": "password",
//!     "ssh_fingerprint": "SHA256:40QvIN7FAGgYxl+5UVoTskPK1zKswZcDzPCK6aZReuU",
//!     "hsm_password": "other_password"
//!   }
//! ]
//! ```

use std::path::Path;

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Deserializer};

use crate::error::{ConfigError, Result};
use crate::transport::SshConfig;

/// Default config file location used by the command-line tools.
pub const DEFAULT_PATH: &str = "./lunash.json";

/// One appliance entry.
#[derive(Debug, Deserialize)]
pub struct ApplianceConfig {
    /// Short name, optional.
    #[serde(default)]
    pub nickname: String,

    /// Hostname or IP address.
    pub hostname: String,

    /// SSH port.
    #[serde(default = "default_port")]
    pub ssh_port: u16,

    /// SSH username.
    pub ssh_login: String,

    /// SSH password.
    #[serde(deserialize_with = "secret")]
    pub ssh_password: SecretString,

    /// Pinned host key fingerprint, `SHA256:<base64>`.
    pub ssh_fingerprint: String,

    /// Partition password for `hsm login`.
    #[serde(deserialize_with = "secret")]
    pub hsm_password: SecretString,
}

fn default_port() -> u16 {
    22
}

fn secret<'de, D>(deserializer: D) -> std::result::Result<SecretString, D::Error>
where
    D: Deserializer<'de>,
{
    String::deserialize(deserializer).map(|s| SecretString::new(s.into_boxed_str()))
}

impl ApplianceConfig {
    /// Whether `name` is this appliance's hostname or nickname.
    pub fn matches(&self, name: &str) -> bool {
        self.hostname == name || (!self.nickname.is_empty() && self.nickname == name)
    }

    /// Transport settings for this appliance.
    pub fn ssh_config(&self) -> SshConfig {
        SshConfig::new(
            self.hostname.clone(),
            self.ssh_login.clone(),
            SecretString::new(self.ssh_password.expose_secret().into()),
            self.ssh_fingerprint.clone(),
        )
        .with_port(self.ssh_port)
    }
}

/// Load every appliance in the config file, in file order.
pub fn load_all(path: impl AsRef<Path>) -> Result<Vec<ApplianceConfig>> {
    let path = path.as_ref();
    let data = std::fs::read(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    let configs = serde_json::from_slice(&data).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;

    Ok(configs)
}

/// Load the appliances matching any of `names`, in file order.
pub fn load_selected<S: AsRef<str>>(
    path: impl AsRef<Path>,
    names: &[S],
) -> Result<Vec<ApplianceConfig>> {
    Ok(load_all(path)?
        .into_iter()
        .filter(|config| names.iter().any(|name| config.matches(name.as_ref())))
        .collect())
}

/// Load the first appliance matching `name`.
pub fn load_one(path: impl AsRef<Path>, name: &str) -> Result<ApplianceConfig> {
    load_all(path)?
        .into_iter()
        .find(|config| config.matches(name))
        .ok_or_else(|| {
            ConfigError::UnknownAppliance {
                name: name.to_string(),
            }
            .into()
        })
}

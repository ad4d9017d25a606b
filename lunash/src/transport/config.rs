//! SSH connection configuration.

use std::time::Duration;

use secrecy::SecretString;

/// SSH connection configuration.
#[derive(Debug)]
pub struct SshConfig {
    /// Target host (hostname or IP address).
    pub host: String,

    /// SSH port (default: 22).
    pub port: u16,

    /// Username for authentication.
    pub username: String,

    /// Password for authentication.
    pub password: SecretString,

    /// Pinned host key fingerprint, `SHA256:<base64>`.
    pub fingerprint: String,

    /// Timeout for establishing the connection.
    pub timeout: Duration,

    /// Drop the connection after this long without traffic.
    ///
    /// `None` by default: appliance commands can stay silent for minutes.
    pub inactivity_timeout: Option<Duration>,
}

impl SshConfig {
    /// Create a config with the default port, a 30 second connect timeout
    /// and no inactivity timeout.
    pub fn new(
        host: impl Into<String>,
        username: impl Into<String>,
        password: SecretString,
        fingerprint: impl Into<String>,
    ) -> Self {
        Self {
            host: host.into(),
            port: 22,
            username: username.into(),
            password,
            fingerprint: fingerprint.into(),
            timeout: Duration::from_secs(30),
            inactivity_timeout: None,
        }
    }

    /// Set the SSH port.
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Set the connect timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the inactivity timeout.
    pub fn with_inactivity_timeout(mut self, timeout: Duration) -> Self {
        self.inactivity_timeout = Some(timeout);
        self
    }

    /// Get the socket address for connection.
    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_socket_addr_and_redaction() {
        let password = SecretString::new("pw".into());
        let config = SshConfig::new("10.0.0.5", "admin", password, "SHA256:x").with_port(2222);
        assert_eq!(config.socket_addr(), "10.0.0.5:2222");
        assert!(!format!("{config:?}").contains("\"pw\""));
    }

    #[test]
    fn test_timeouts() {
        let password = SecretString::new("pw".into());
        let config = SshConfig::new("10.0.0.5", "admin", password, "SHA256:x");
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert_eq!(config.inactivity_timeout, None);

        let config = config
            .with_timeout(Duration::from_secs(5))
            .with_inactivity_timeout(Duration::from_secs(600));
        assert_eq!(config.timeout, Duration::from_secs(5));
        assert_eq!(config.inactivity_timeout, Some(Duration::from_secs(600)));
    }
}

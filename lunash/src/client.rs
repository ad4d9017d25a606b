//! Connection to one appliance.

use std::sync::Arc;

use log::info;
use secrecy::{ExposeSecret, SecretString};

use crate::config::ApplianceConfig;
use crate::error::Result;
use crate::scp::Scp;
use crate::shell::{RunOutcome, Shell};
use crate::steplog::{Quiet, StepLog};
use crate::transport::SshTransport;

/// An open SSH connection to one appliance.
///
/// # Example
///
/// ```rust,no_run
/// use lunash::{Client, config};
///
/// # async fn example() -> Result<(), lunash::Error> {
/// let appliance = config::load_one("./lunash.json", "hsm1")?;
/// let client = Client::connect(&appliance).await?;
///
/// let outcome = client.run(&["hsm show"], false).await;
/// for record in &outcome.records {
///     println!("{}", record.output);
/// }
///
/// client.close().await?;
/// # Ok(())
/// # }
/// ```
pub struct Client {
    transport: SshTransport,
    shell: Shell,
    scp: Scp,
}

impl Client {
    /// Connect with quiet step logging.
    pub async fn connect(appliance: &ApplianceConfig) -> Result<Self> {
        Self::connect_with_log(appliance, Arc::new(Quiet)).await
    }

    /// Connect, reporting every protocol step to `log`.
    pub async fn connect_with_log(
        appliance: &ApplianceConfig,
        log: Arc<dyn StepLog>,
    ) -> Result<Self> {
        let transport = SshTransport::connect(appliance.ssh_config()).await?;
        info!("connected to {}", appliance.hostname);

        let password = SecretString::new(appliance.hsm_password.expose_secret().into());
        let shell = Shell::new().with_password(password).with_log(log.clone());
        let scp = Scp::new().with_log(log);

        Ok(Self {
            transport,
            shell,
            scp,
        })
    }

    /// Run `commands` in a shell session, after `hsm login` if `login`.
    pub async fn run<S: AsRef<str>>(&self, commands: &[S], login: bool) -> RunOutcome {
        self.shell.run(&self.transport, commands, login).await
    }

    /// Download the file at `path`.
    pub async fn scp_get(&self, path: &str) -> Result<Vec<u8>> {
        self.scp.get_file(&self.transport, path).await
    }

    /// Upload `data` to `path`.
    pub async fn scp_put(&self, path: &str, data: &[u8]) -> Result<()> {
        self.scp.put_file(&self.transport, path, data).await
    }

    /// Host this client is connected to.
    pub fn host(&self) -> &str {
        self.transport.host()
    }

    /// Disconnect from the appliance.
    pub async fn close(self) -> Result<()> {
        self.transport.close().await
    }
}

//! SSH transport implementation using russh.

use std::io;
use std::sync::{Arc, Mutex};

use bytes::{Buf, BytesMut};
use log::{debug, trace, warn};
use russh::client::{self, Handle, Msg};
use russh::keys::{HashAlg, PublicKey};
use russh::{Channel, ChannelMsg};
use secrecy::ExposeSecret;

use super::config::SshConfig;
use crate::error::{ChannelError, Result, TransportError};
use crate::session::{PtyConfig, Session, SessionFactory, SessionIo};

/// SSH transport wrapping a russh client connection.
pub struct SshTransport {
    /// The russh session handle.
    session: Handle<SshHandler>,

    /// Host this transport is connected to.
    host: String,
}

impl SshTransport {
    /// Connect to the appliance, pin its host key and authenticate.
    pub async fn connect(config: SshConfig) -> Result<Self> {
        let ssh_config = Arc::new(client::Config {
            inactivity_timeout: config.inactivity_timeout,
            ..Default::default()
        });

        let host_key_error: Arc<Mutex<Option<TransportError>>> = Arc::new(Mutex::new(None));

        let handler = SshHandler {
            host: config.host.clone(),
            fingerprint: config.fingerprint.clone(),
            host_key_error: host_key_error.clone(),
        };

        debug!("connecting to {}", config.socket_addr());

        let mut session = tokio::time::timeout(
            config.timeout,
            client::connect(ssh_config, (config.host.as_str(), config.port), handler),
        )
        .await
        .map_err(|_| TransportError::Timeout(config.timeout))?
        .map_err(|e| {
            // prefer the detailed error stored by check_server_key
            let stored = host_key_error.lock().ok().and_then(|mut slot| slot.take());
            match (stored, e) {
                (Some(hk_err), _) => hk_err,
                (None, russh::Error::IO(source)) => TransportError::ConnectionFailed {
                    host: config.host.clone(),
                    port: config.port,
                    source,
                },
                (None, e) => TransportError::Ssh(e),
            }
        })?;

        Self::authenticate(&mut session, &config).await?;

        Ok(Self {
            session,
            host: config.host,
        })
    }

    /// Authenticate with the server.
    async fn authenticate(session: &mut Handle<SshHandler>, config: &SshConfig) -> Result<()> {
        let success = session
            .authenticate_password(&config.username, config.password.expose_secret())
            .await
            .map_err(TransportError::Ssh)?
            .success();

        if !success {
            return Err(TransportError::AuthenticationFailed {
                user: config.username.clone(),
            }
            .into());
        }

        Ok(())
    }

    /// Host this transport is connected to.
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Close the connection.
    pub async fn close(self) -> Result<()> {
        self.session
            .disconnect(russh::Disconnect::ByApplication, "", "en")
            .await
            .map_err(TransportError::Ssh)?;
        Ok(())
    }
}

impl SessionFactory for SshTransport {
    type Session = SshSession;

    async fn open_session(&self) -> Result<SshSession> {
        let channel = self
            .session
            .channel_open_session()
            .await
            .map_err(ChannelError::OpenFailed)?;
        trace!("opened session {:?} on {}", channel.id(), self.host);
        Ok(SshSession::new(channel))
    }
}

/// One session channel on an [`SshTransport`].
pub struct SshSession {
    channel: Channel<Msg>,

    /// Data received but not yet handed to a reader.
    pending: BytesMut,

    /// The remote sent EOF or closed the channel.
    eof: bool,
}

impl SshSession {
    fn new(channel: Channel<Msg>) -> Self {
        Self {
            channel,
            pending: BytesMut::with_capacity(4096),
            eof: false,
        }
    }

    /// Handle one channel message. Returns `Some(accepted)` for a request reply.
    fn absorb(&mut self, msg: Option<ChannelMsg>) -> Option<bool> {
        match msg {
            Some(ChannelMsg::Data { data }) => self.pending.extend_from_slice(&data),
            Some(ChannelMsg::ExtendedData { data, ext }) => {
                debug!(
                    "stderr({}): {}",
                    ext,
                    String::from_utf8_lossy(&data).trim_end()
                );
            }
            Some(ChannelMsg::Success) => return Some(true),
            Some(ChannelMsg::Failure) => return Some(false),
            Some(ChannelMsg::Eof) | Some(ChannelMsg::Close) | None => self.eof = true,
            Some(other) => trace!("ignoring channel message {:?}", other),
        }
        None
    }

    /// Wait for the reply to a request sent with `want_reply`.
    async fn wait_reply(&mut self) -> bool {
        while !self.eof {
            let msg = self.channel.wait().await;
            if let Some(accepted) = self.absorb(msg) {
                return accepted;
            }
        }
        false
    }
}

impl SessionIo for SshSession {
    async fn write_all(&mut self, data: &[u8]) -> io::Result<()> {
        self.channel.data(data).await.map_err(io::Error::other)
    }

    async fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        while self.pending.is_empty() && !self.eof {
            let msg = self.channel.wait().await;
            self.absorb(msg);
        }

        let n = buf.len().min(self.pending.len());
        buf[..n].copy_from_slice(&self.pending[..n]);
        self.pending.advance(n);
        Ok(n)
    }
}

impl Session for SshSession {
    async fn request_pty(&mut self, pty: &PtyConfig) -> Result<()> {
        self.channel
            .request_pty(true, &pty.term, pty.cols, pty.rows, 0, 0, &pty.modes)
            .await
            .map_err(ChannelError::Ssh)?;

        if !self.wait_reply().await {
            return Err(ChannelError::PtyRequestFailed.into());
        }
        Ok(())
    }

    async fn request_shell(&mut self) -> Result<()> {
        self.channel
            .request_shell(true)
            .await
            .map_err(ChannelError::Ssh)?;

        if !self.wait_reply().await {
            return Err(ChannelError::ShellRequestFailed.into());
        }
        Ok(())
    }

    async fn exec(&mut self, command: &str) -> Result<()> {
        self.channel
            .exec(true, command)
            .await
            .map_err(ChannelError::Ssh)?;

        if !self.wait_reply().await {
            return Err(ChannelError::ExecFailed {
                command: command.to_string(),
            }
            .into());
        }
        Ok(())
    }

    async fn close(self) -> Result<()> {
        if !self.eof {
            if let Err(e) = self.channel.eof().await {
                warn!("failed to send EOF before close: {}", e);
            }
        }
        self.channel
            .close()
            .await
            .map_err(|e| ChannelError::CloseFailed {
                source: Box::new(e),
            })?;
        Ok(())
    }
}

/// SSH client handler for russh.
struct SshHandler {
    host: String,

    /// Expected `SHA256:` fingerprint of the host key.
    fingerprint: String,

    /// Stores a detailed host-key error so connect() can surface it
    /// instead of the generic russh::Error::UnknownKey.
    host_key_error: Arc<Mutex<Option<TransportError>>>,
}

impl SshHandler {
    fn verify(&self, key: &PublicKey) -> std::result::Result<(), TransportError> {
        let actual = key.fingerprint(HashAlg::Sha256).to_string();
        if actual == self.fingerprint {
            Ok(())
        } else {
            Err(TransportError::HostKeyMismatch {
                host: self.host.clone(),
                fingerprint: actual,
            })
        }
    }
}

impl client::Handler for SshHandler {
    type Error = russh::Error;

    async fn check_server_key(
        &mut self,
        server_public_key: &PublicKey,
    ) -> std::result::Result<bool, Self::Error> {
        match self.verify(server_public_key) {
            Ok(()) => Ok(true),
            Err(e) => {
                warn!("{}", e);
                if let Ok(mut slot) = self.host_key_error.lock() {
                    *slot = Some(e);
                }
                Ok(false)
            }
        }
    }
}

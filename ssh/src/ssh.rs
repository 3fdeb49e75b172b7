use std::sync::Arc;

use async_trait::async_trait;
use log;
use russh::*;
use russh::keys::*;
use tokio::sync::Mutex;

use crate::runner::{render, Outcome, RunOutput, Runner};
use crate::SshError;

/// [`Runner`] that executes commands over SSH.
///
/// The session is opened lazily on the first command and reused afterwards;
/// every command runs on its own exec channel. A stale session is dropped and
/// re-dialed once before the command is reported as failed.
pub struct SshRunner {
    pub host: String,
    pub user: String,
    port: u16,
    private_key_path: Option<String>,
    password: Option<String>,
    session: Arc<Mutex<Option<client::Handle<Client>>>>,
}

struct Client;

impl client::Handler for Client {
    type Error = russh::Error;

    async fn check_server_key(
        &mut self,
        _server_public_key: &ssh_key::PublicKey,
    ) -> Result<bool, Self::Error> {
        Ok(true)
    }
}

impl SshRunner {
    pub fn new(host: String, user: String, port: Option<u16>) -> Self {
        Self {
            host,
            user,
            port: port.unwrap_or(22),
            private_key_path: None,
            password: None,
            session: Arc::new(Mutex::new(None)),
        }
    }

    pub fn with_private_key_path(mut self, private_key_path: String) -> Self {
        self.private_key_path = Some(private_key_path);
        self
    }

    pub fn with_password(mut self, password: String) -> Self {
        self.password = Some(password);
        self
    }

    async fn connect(&self) -> Result<client::Handle<Client>, SshError> {
        let config = Arc::new(client::Config::default());
        let mut session =
            client::connect(config, (self.host.as_str(), self.port), Client).await?;

        let authenticated = if let Some(path) = &self.private_key_path {
            let key_pair = load_secret_key(path, None)
                .map_err(|err| SshError::AuthenticationError(err.to_string()))?;
            let auth_res = session
                .authenticate_publickey(
                    &self.user,
                    PrivateKeyWithHashAlg::new(
                        Arc::new(key_pair),
                        session.best_supported_rsa_hash().await?.flatten(),
                    ),
                )
                .await?;
            auth_res.success()
        } else if let Some(password) = &self.password {
            session
                .authenticate_password(&self.user, password)
                .await?
                .success()
        } else {
            return Err(SshError::ConfigurationError(
                "neither a private key nor a password is configured".to_string(),
            ));
        };

        if !authenticated {
            return Err(SshError::AuthenticationError(format!(
                "authentication as {}@{} failed",
                self.user, self.host
            )));
        }

        log::debug!("SSH session to {}@{} established", self.user, self.host);
        Ok(session)
    }

    async fn open_channel(
        &self,
        guard: &mut Option<client::Handle<Client>>,
    ) -> Result<Channel<client::Msg>, SshError> {
        if let Some(session) = guard.as_ref() {
            match session.channel_open_session().await {
                Ok(channel) => return Ok(channel),
                Err(err) => {
                    log::debug!("cached SSH session is stale ({err}), reconnecting");
                    *guard = None;
                }
            }
        }

        let session = self.connect().await?;
        let channel = session.channel_open_session().await?;
        *guard = Some(session);

        Ok(channel)
    }
}

#[async_trait]
impl Runner for SshRunner {
    async fn run(&self, command: &str, args: &[&str]) -> Result<RunOutput, SshError> {
        let rendered = render(command, args)?;
        log::debug!("running on {}: {rendered}", self.host);

        let mut guard = self.session.lock().await;
        let mut channel = self.open_channel(&mut guard).await?;
        channel.exec(true, rendered.as_str()).await?;

        let mut stdout = Vec::new();
        let mut stderr = Vec::new();
        let mut exit_code = None;
        let mut signal = None;

        while let Some(msg) = channel.wait().await {
            match msg {
                ChannelMsg::Data { ref data } => stdout.extend_from_slice(data),
                ChannelMsg::ExtendedData { ref data, ext: 1 } => stderr.extend_from_slice(data),
                ChannelMsg::ExitStatus { exit_status } => exit_code = Some(exit_status),
                ChannelMsg::ExitSignal { signal_name, .. } => signal = Some(signal_name),
                _ => {}
            }
        }

        let outcome = match (exit_code, signal) {
            (Some(0), _) => Outcome::Success,
            (Some(code), _) => Outcome::Failure {
                exit_code: Some(code),
                message: format!("command exited with status {code}"),
            },
            (None, Some(signal)) => Outcome::Failure {
                exit_code: None,
                message: format!("command was terminated by signal {signal:?}"),
            },
            (None, None) => Outcome::Failure {
                exit_code: None,
                message: "channel closed without an exit status".to_string(),
            },
        };

        Ok(RunOutput {
            stdout: String::from_utf8_lossy(&stdout).into_owned(),
            stderr: String::from_utf8_lossy(&stderr).into_owned(),
            outcome,
        })
    }
}

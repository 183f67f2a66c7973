use std::collections::HashMap;
use std::sync::Arc;

use tokio::io::{AsyncReadExt, AsyncWriteExt, DuplexStream, ReadHalf, WriteHalf};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

use crate::command::{
    AuthenticatorId, ChannelRequest, ChannelResponse, CredentialSummary, decode, encode,
};
use crate::framing::{FRAME_SIZE, FrameCommand, FramingError, Message, Reassembler};
use crate::host::{ChannelHost, HostAuthenticator, Registry};
use harness_authenticator::AuthenticatorCapabilities;

/// Errors of the automation channel and its controller API.
#[derive(Debug, thiserror::Error)]
pub enum ChannelError {
    /// A command was issued before [`VirtualAuthenticatorEnvironment::initialize`].
    #[error("automation channel is not initialized; call initialize() first")]
    NotInitialized,
    /// The referenced authenticator does not exist in this environment.
    #[error("no {0} in this environment")]
    UnknownAuthenticator(AuthenticatorId),
    /// The byte pipe failed, usually because the host task is gone.
    #[error("channel i/o failed: {0}")]
    Io(#[from] std::io::Error),
    /// The host closed the channel before replying.
    #[error("the channel host went away")]
    HostClosed,
    /// A payload could not be encoded or decoded.
    #[error("channel codec failure: {0}")]
    Codec(String),
    /// The framing layer rejected a frame.
    #[error(transparent)]
    Framing(#[from] FramingError),
    /// The host reported a command failure.
    #[error("channel command failed: {0}")]
    Command(String),
}

/// A virtual authenticator shared between the automation channel and the
/// ceremony layer, the way a browser's virtual device is visible both to
/// the automation protocol and to the page's WebAuthn calls.
pub type SharedAuthenticator = Arc<Mutex<HostAuthenticator>>;

/// Controller for a session of virtual authenticators.
///
/// Lifecycle: [`initialize`](Self::initialize) once, add one or more
/// authenticators, run ceremonies against them, then
/// [`cleanup`](Self::cleanup) unconditionally in teardown; cleanup and
/// [`remove_authenticator`](Self::remove_authenticator) are safe no-ops
/// when there is nothing to tear down. Everything else fails fast when the
/// required setup step has not happened.
#[derive(Default)]
pub struct VirtualAuthenticatorEnvironment {
    channel: Option<Channel>,
    registry: Registry,
}

struct Channel {
    writer: WriteHalf<DuplexStream>,
    reader: ReadHalf<DuplexStream>,
    reassembler: Reassembler,
    next_channel: u32,
    host: JoinHandle<()>,
}

impl VirtualAuthenticatorEnvironment {
    /// Create an environment whose channel is not yet open.
    pub fn new() -> Self {
        Self {
            channel: None,
            registry: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Open the automation channel and enable the environment.
    ///
    /// Must be called once before any authenticator is added. Calling it
    /// again on an initialized environment is an error.
    pub async fn initialize(&mut self) -> Result<(), ChannelError> {
        if self.channel.is_some() {
            return Err(ChannelError::Command(
                "environment is already initialized".into(),
            ));
        }

        let (controller_side, host_side) = tokio::io::duplex(FRAME_SIZE * 16);
        let host = ChannelHost::new(Arc::clone(&self.registry));
        let host = tokio::spawn(host.run(host_side));

        let (reader, writer) = tokio::io::split(controller_side);
        self.channel = Some(Channel {
            writer,
            reader,
            reassembler: Reassembler::default(),
            next_channel: 1,
            host,
        });

        match self.send(ChannelRequest::EnableEnvironment).await? {
            ChannelResponse::Ok => Ok(()),
            other => Err(unexpected(other)),
        }
    }

    /// Whether [`initialize`](Self::initialize) has completed.
    pub fn is_initialized(&self) -> bool {
        self.channel.is_some()
    }

    /// Add a virtual authenticator with the given capabilities.
    pub async fn add_authenticator(
        &mut self,
        capabilities: AuthenticatorCapabilities,
    ) -> Result<AuthenticatorId, ChannelError> {
        match self
            .send(ChannelRequest::AddAuthenticator { capabilities })
            .await?
        {
            ChannelResponse::AuthenticatorAdded { authenticator } => Ok(authenticator),
            other => Err(unexpected(other)),
        }
    }

    /// Enumerate the credentials currently stored by an authenticator.
    pub async fn credentials(
        &mut self,
        authenticator: AuthenticatorId,
    ) -> Result<Vec<CredentialSummary>, ChannelError> {
        match self
            .send(ChannelRequest::GetCredentials { authenticator })
            .await?
        {
            ChannelResponse::Credentials { credentials } => Ok(credentials),
            other => Err(unexpected(other)),
        }
    }

    /// Look one credential up by id.
    pub async fn credential(
        &mut self,
        authenticator: AuthenticatorId,
        credential_id: &[u8],
    ) -> Result<Option<CredentialSummary>, ChannelError> {
        Ok(self
            .credentials(authenticator)
            .await?
            .into_iter()
            .find(|cred| cred.credential_id.as_slice() == credential_id))
    }

    /// Delete one stored credential; returns whether it existed. The change
    /// is visible to the next `credentials` call immediately.
    pub async fn remove_credential(
        &mut self,
        authenticator: AuthenticatorId,
        credential_id: &[u8],
    ) -> Result<bool, ChannelError> {
        match self
            .send(ChannelRequest::RemoveCredential {
                authenticator,
                credential_id: credential_id.into(),
            })
            .await?
        {
            ChannelResponse::Removed { existed } => Ok(existed),
            other => Err(unexpected(other)),
        }
    }

    /// Delete every credential stored by an authenticator.
    pub async fn clear_credentials(
        &mut self,
        authenticator: AuthenticatorId,
    ) -> Result<(), ChannelError> {
        match self
            .send(ChannelRequest::ClearCredentials { authenticator })
            .await?
        {
            ChannelResponse::Ok => Ok(()),
            other => Err(unexpected(other)),
        }
    }

    /// Set whether subsequent ceremonies report user verification success.
    pub async fn set_user_verified(
        &mut self,
        authenticator: AuthenticatorId,
        verified: bool,
    ) -> Result<(), ChannelError> {
        match self
            .send(ChannelRequest::SetUserVerified {
                authenticator,
                verified,
            })
            .await?
        {
            ChannelResponse::Ok => Ok(()),
            other => Err(unexpected(other)),
        }
    }

    /// Tear one authenticator down. A no-op when the environment was never
    /// initialized or the authenticator is already gone.
    pub async fn remove_authenticator(
        &mut self,
        authenticator: AuthenticatorId,
    ) -> Result<(), ChannelError> {
        if self.channel.is_none() {
            return Ok(());
        }
        match self
            .send(ChannelRequest::RemoveAuthenticator { authenticator })
            .await?
        {
            ChannelResponse::Removed { .. } => Ok(()),
            other => Err(unexpected(other)),
        }
    }

    /// Tear the whole environment down: disable it host-side and close the
    /// channel. Best effort, never fails, safe to call repeatedly.
    pub async fn cleanup(&mut self) {
        if self.channel.is_none() {
            return;
        }
        if let Err(err) = self.send(ChannelRequest::DisableEnvironment).await {
            log::warn!("disable on cleanup failed: {err}");
        }
        if let Some(channel) = self.channel.take() {
            // Dropping the pipe halves ends the host's read loop.
            drop(channel.writer);
            drop(channel.reader);
            channel.host.abort();
        }
        self.registry.lock().await.clear();
    }

    /// Hand out the live authenticator behind a handle so the ceremony
    /// layer can drive WebAuthn against it.
    pub async fn ceremony_authenticator(
        &self,
        authenticator: AuthenticatorId,
    ) -> Result<SharedAuthenticator, ChannelError> {
        if self.channel.is_none() {
            return Err(ChannelError::NotInitialized);
        }
        self.registry
            .lock()
            .await
            .get(&authenticator)
            .cloned()
            .ok_or(ChannelError::UnknownAuthenticator(authenticator))
    }

    /// Send one command and wait for its reply. The channel processes
    /// commands strictly in order.
    async fn send(&mut self, request: ChannelRequest) -> Result<ChannelResponse, ChannelError> {
        let channel = self.channel.as_mut().ok_or(ChannelError::NotInitialized)?;

        let payload = encode(&request).map_err(ChannelError::Codec)?;
        let channel_id = channel.next_channel;
        channel.next_channel = channel.next_channel.wrapping_add(1);
        let message = Message::new(channel_id, FrameCommand::Cbor, &payload)?;
        for frame in message.to_frames() {
            channel.writer.write_all(&frame).await?;
        }
        channel.writer.flush().await?;

        let mut frame = [0u8; FRAME_SIZE];
        loop {
            if channel.reader.read_exact(&mut frame).await.is_err() {
                return Err(ChannelError::HostClosed);
            }
            let Some(message) = channel.reassembler.handle_frame(&frame)? else {
                continue;
            };
            if message.channel != channel_id {
                log::warn!("ignoring stray channel message for id {}", message.channel);
                continue;
            }
            if message.command == FrameCommand::Error {
                return Err(ChannelError::Command(
                    String::from_utf8_lossy(&message.payload).into_owned(),
                ));
            }
            return match decode::<ChannelResponse>(&message.payload)
                .map_err(ChannelError::Codec)?
            {
                ChannelResponse::Error { message } => Err(ChannelError::Command(message)),
                response => Ok(response),
            };
        }
    }
}

fn unexpected(response: ChannelResponse) -> ChannelError {
    ChannelError::Codec(format!("unexpected channel response: {response:?}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn lifecycle_round_trip() {
        let mut env = VirtualAuthenticatorEnvironment::new();
        env.initialize().await.expect("initialize");

        let id = env
            .add_authenticator(AuthenticatorCapabilities::platform())
            .await
            .expect("add authenticator");
        assert!(env.credentials(id).await.expect("query").is_empty());

        env.set_user_verified(id, false).await.expect("toggle uv");
        env.remove_authenticator(id).await.expect("remove");
        assert!(matches!(
            env.credentials(id).await,
            Err(ChannelError::Command(_))
        ));

        env.cleanup().await;
        env.cleanup().await; // idempotent
    }

    #[tokio::test]
    async fn commands_fail_fast_before_initialize() {
        let mut env = VirtualAuthenticatorEnvironment::new();
        assert!(matches!(
            env.add_authenticator(AuthenticatorCapabilities::platform())
                .await,
            Err(ChannelError::NotInitialized)
        ));
        // Teardown paths stay silent.
        env.remove_authenticator(AuthenticatorId(1))
            .await
            .expect("no-op remove");
        env.cleanup().await;
    }

    #[tokio::test]
    async fn credential_mutations_are_visible_immediately() {
        let mut env = VirtualAuthenticatorEnvironment::new();
        env.initialize().await.expect("initialize");
        let id = env
            .add_authenticator(AuthenticatorCapabilities::platform())
            .await
            .expect("add authenticator");

        // Create a credential directly on the shared device, as a ceremony
        // would.
        let device = env.ceremony_authenticator(id).await.expect("shared device");
        {
            let mut device = device.lock().await;
            device
                .make_credential(sample_request())
                .await
                .expect("creation");
        }

        let creds = env.credentials(id).await.expect("query");
        assert_eq!(creds.len(), 1);
        let credential_id = creds[0].credential_id.clone();

        assert!(env
            .remove_credential(id, &credential_id)
            .await
            .expect("remove"));
        assert!(env.credentials(id).await.expect("query").is_empty());
        assert!(!env
            .remove_credential(id, &credential_id)
            .await
            .expect("second remove"));
    }

    pub(crate) fn sample_request() -> harness_types::ctap2::make_credential::Request {
        use harness_types::{ctap2::make_credential, webauthn};
        make_credential::Request {
            client_data_hash: harness_types::rand::random_vec(32).into(),
            rp: make_credential::PublicKeyCredentialRpEntity {
                id: "wallet.keyfold.dev".into(),
                name: None,
            },
            user: webauthn::PublicKeyCredentialUserEntity {
                id: harness_types::rand::random_vec(16).into(),
                name: "maya@example.com".into(),
                display_name: "Maya".into(),
            },
            pub_key_cred_params: webauthn::PublicKeyCredentialParameters::es256(),
            exclude_list: None,
            extensions: None,
            options: make_credential::Options {
                rk: true,
                up: true,
                uv: true,
            },
        }
    }
}

//! The channel host: owns the authenticator registry and executes commands
//! one at a time, in arrival order.

use std::collections::HashMap;
use std::sync::Arc;

use harness_authenticator::{
    Authenticator, CredentialStore, MemoryStore, ToggleUserValidation,
};
use harness_types::ctap2::Aaguid;
use tokio::io::{AsyncReadExt, AsyncWriteExt, DuplexStream};
use tokio::sync::Mutex;

use crate::command::{
    AuthenticatorId, ChannelRequest, ChannelResponse, CredentialSummary, decode, encode,
};
use crate::framing::{FRAME_SIZE, FrameCommand, Message, Reassembler};

/// The concrete authenticator type the environment hosts.
pub type HostAuthenticator = Authenticator<MemoryStore, ToggleUserValidation>;

pub(crate) type Registry = Arc<Mutex<HashMap<AuthenticatorId, Arc<Mutex<HostAuthenticator>>>>>;

pub(crate) struct ChannelHost {
    registry: Registry,
    next_id: u32,
    enabled: bool,
}

impl ChannelHost {
    pub fn new(registry: Registry) -> Self {
        Self {
            registry,
            next_id: 1,
            enabled: false,
        }
    }

    /// Serve commands until the controller side closes the pipe.
    pub async fn run(mut self, stream: DuplexStream) {
        let (mut reader, mut writer) = tokio::io::split(stream);
        let mut reassembler = Reassembler::default();
        let mut frame = [0u8; FRAME_SIZE];

        loop {
            if reader.read_exact(&mut frame).await.is_err() {
                log::debug!("automation channel closed, host exiting");
                break;
            }
            let message = match reassembler.handle_frame(&frame) {
                Ok(Some(message)) => message,
                Ok(None) => continue,
                Err(err) => {
                    log::warn!("dropping malformed channel frame: {err}");
                    continue;
                }
            };

            let response = match decode::<ChannelRequest>(&message.payload) {
                Ok(request) => self.execute(request).await,
                Err(err) => ChannelResponse::Error {
                    message: format!("undecodable command: {err}"),
                },
            };

            let payload = match encode(&response) {
                Ok(payload) => payload,
                Err(err) => {
                    log::error!("could not encode channel response: {err}");
                    continue;
                }
            };
            let Ok(reply) = Message::new(message.channel, FrameCommand::Cbor, &payload) else {
                log::error!("channel response does not fit a message");
                continue;
            };
            for frame in reply.to_frames() {
                if writer.write_all(&frame).await.is_err() {
                    return;
                }
            }
            let _ = writer.flush().await;
        }
    }

    async fn execute(&mut self, request: ChannelRequest) -> ChannelResponse {
        if !self.enabled && !matches!(request, ChannelRequest::EnableEnvironment) {
            return ChannelResponse::Error {
                message: "environment is not enabled; send enableEnvironment first".into(),
            };
        }

        match request {
            ChannelRequest::EnableEnvironment => {
                self.enabled = true;
                ChannelResponse::Ok
            }
            ChannelRequest::AddAuthenticator { capabilities } => {
                let user = if capabilities.has_user_verification {
                    let user = ToggleUserValidation::new();
                    user.set_user_verified(capabilities.is_user_verified);
                    user
                } else {
                    ToggleUserValidation::without_uv()
                };
                let authenticator = Authenticator::new(
                    Aaguid::new_empty(),
                    capabilities,
                    MemoryStore::new(),
                    user,
                );

                let id = AuthenticatorId(self.next_id);
                self.next_id += 1;
                self.registry
                    .lock()
                    .await
                    .insert(id, Arc::new(Mutex::new(authenticator)));
                log::debug!("added virtual {id}");
                ChannelResponse::AuthenticatorAdded { authenticator: id }
            }
            ChannelRequest::RemoveAuthenticator { authenticator } => {
                let existed = self.registry.lock().await.remove(&authenticator).is_some();
                ChannelResponse::Removed { existed }
            }
            ChannelRequest::GetCredentials { authenticator } => {
                match self.authenticator(authenticator).await {
                    Some(device) => {
                        let device = device.lock().await;
                        let transports = device.transports();
                        let credentials = device
                            .store()
                            .all_credentials()
                            .await
                            .into_iter()
                            .map(|cred| CredentialSummary {
                                credential_id: cred.credential_id.clone(),
                                rp_id: cred.rp_id.clone(),
                                user_handle: cred.user_handle.clone(),
                                counter: cred.counter,
                                transports: transports.clone(),
                            })
                            .collect();
                        ChannelResponse::Credentials { credentials }
                    }
                    None => unknown(authenticator),
                }
            }
            ChannelRequest::RemoveCredential {
                authenticator,
                credential_id,
            } => match self.authenticator(authenticator).await {
                Some(device) => {
                    let existed = device
                        .lock()
                        .await
                        .store_mut()
                        .delete_credential(&credential_id)
                        .await;
                    ChannelResponse::Removed { existed }
                }
                None => unknown(authenticator),
            },
            ChannelRequest::ClearCredentials { authenticator } => {
                match self.authenticator(authenticator).await {
                    Some(device) => {
                        device.lock().await.store_mut().clear().await;
                        ChannelResponse::Ok
                    }
                    None => unknown(authenticator),
                }
            }
            ChannelRequest::SetUserVerified {
                authenticator,
                verified,
            } => match self.authenticator(authenticator).await {
                Some(device) => {
                    device
                        .lock()
                        .await
                        .user_validation()
                        .set_user_verified(verified);
                    ChannelResponse::Ok
                }
                None => unknown(authenticator),
            },
            ChannelRequest::DisableEnvironment => {
                self.registry.lock().await.clear();
                self.enabled = false;
                ChannelResponse::Ok
            }
        }
    }

    async fn authenticator(&self, id: AuthenticatorId) -> Option<Arc<Mutex<HostAuthenticator>>> {
        self.registry.lock().await.get(&id).cloned()
    }
}

fn unknown(id: AuthenticatorId) -> ChannelResponse {
    ChannelResponse::Error {
        message: format!("no {id} in this environment"),
    }
}

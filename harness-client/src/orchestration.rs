use reqwest::StatusCode;
use serde::{Serialize, de::DeserializeOwned};
use url::Url;
use uuid::Uuid;

use harness_types::webauthn::{
    AuthenticatedPublicKeyCredential, AuthenticationExtensionsClientInputs,
    CreatedPublicKeyCredential, CredentialCreationOptions, CredentialRequestOptions,
};

use crate::{
    CeremonyProvider, HarnessConfig, WebauthnError,
    wire::{
        FinishResponse, LoginBeginResponse, LoginFinishRequest, RegisterBeginRequest,
        RegisterBeginResponse, RegisterFinishRequest, TenantRedirect,
    },
};

/// Errors of the backend orchestration layer.
///
/// Non-2xx statuses are errors carrying status and body text, except the
/// tenant-redirect 409 on login, which is an expected outcome and comes
/// back as [`LoginOutcome::TenantRedirect`].
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    /// The request did not complete.
    #[error("request to {url} failed: {source}")]
    Http {
        /// The request URL.
        url: String,
        /// The transport error.
        #[source]
        source: reqwest::Error,
    },
    /// The backend answered with an unexpected status.
    #[error("backend returned {status}: {body}")]
    Status {
        /// The HTTP status code.
        status: u16,
        /// The response body text.
        body: String,
    },
    /// The response body did not parse.
    #[error("could not parse backend response: {0}")]
    Parse(String),
    /// The configured base URL cannot be joined with an endpoint path.
    #[error("backend url cannot be joined with `{0}`")]
    BadUrl(String),
    /// The WebAuthn ceremony between begin and finish failed.
    #[error("ceremony failed: {0}")]
    Ceremony(WebauthnError),
}

/// What a completed login flow produced.
#[derive(Debug, Clone)]
pub enum LoginOutcome {
    /// The backend accepted the assertion.
    Success(FinishResponse),
    /// The backend demands the login be redone under another tenant.
    TenantRedirect(TenantRedirect),
}

/// What a completed registration flow produced.
#[derive(Debug)]
pub struct RegistrationOutcome {
    /// The new user's id in the backend.
    pub uuid: Uuid,
    /// The created credential, PRF outputs included.
    pub credential: CreatedPublicKeyCredential,
}

/// HTTP client for the wallet backend's WebAuthn endpoints, optionally
/// scoped to a tenant (`/t/{tenantId}/...`).
#[derive(Debug, Clone)]
pub struct BackendClient {
    http: reqwest::Client,
    base_url: Url,
    tenant: Option<String>,
}

impl BackendClient {
    /// A client for the configured backend, unscoped (global endpoints).
    pub fn new(config: &HarnessConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: config.backend_url.clone(),
            tenant: None,
        }
    }

    /// The same backend, scoped to a tenant.
    pub fn for_tenant(&self, tenant: impl Into<String>) -> Self {
        Self {
            http: self.http.clone(),
            base_url: self.base_url.clone(),
            tenant: Some(tenant.into()),
        }
    }

    /// The tenant this client is scoped to, if any.
    pub fn tenant(&self) -> Option<&str> {
        self.tenant.as_deref()
    }

    fn endpoint(&self, path: &str) -> Result<Url, BackendError> {
        let scoped = match &self.tenant {
            Some(tenant) => format!("t/{tenant}/{path}"),
            None => path.to_owned(),
        };
        self.base_url
            .join(&scoped)
            .map_err(|_| BackendError::BadUrl(scoped))
    }

    async fn post_json<T: Serialize>(
        &self,
        path: &str,
        body: &T,
    ) -> Result<reqwest::Response, BackendError> {
        let url = self.endpoint(path)?;
        log::debug!("POST {url}");
        self.http
            .post(url.clone())
            .json(body)
            .send()
            .await
            .map_err(|source| BackendError::Http {
                url: url.to_string(),
                source,
            })
    }

    /// `POST register-webauthn-begin`: fetch creation options.
    pub async fn register_begin(
        &self,
        name: &str,
    ) -> Result<CredentialCreationOptions, BackendError> {
        let response = self
            .post_json(
                "user/register-webauthn-begin",
                &RegisterBeginRequest { name: name.into() },
            )
            .await?;
        let begin: RegisterBeginResponse = parse_json(expect_success(response).await?).await?;
        Ok(begin.into())
    }

    /// `POST register-webauthn-finish`: submit the created credential.
    pub async fn register_finish(
        &self,
        credential: &CreatedPublicKeyCredential,
    ) -> Result<FinishResponse, BackendError> {
        let body = RegisterFinishRequest::from(credential.clone());
        let response = self.post_json("user/register-webauthn-finish", &body).await?;
        parse_json(expect_success(response).await?).await
    }

    /// `POST login-webauthn-begin`: fetch request options.
    pub async fn login_begin(&self) -> Result<CredentialRequestOptions, BackendError> {
        let response = self
            .post_json("user/login-webauthn-begin", &serde_json::json!({}))
            .await?;
        let begin: LoginBeginResponse = parse_json(expect_success(response).await?).await?;
        Ok(begin.into())
    }

    /// `POST login-webauthn-finish`: submit the assertion.
    ///
    /// A 409 with a tenant-redirect body is returned as data, verbatim.
    pub async fn login_finish(
        &self,
        credential: &AuthenticatedPublicKeyCredential,
    ) -> Result<LoginOutcome, BackendError> {
        let body = LoginFinishRequest::from(credential.clone());
        let response = self.post_json("user/login-webauthn-finish", &body).await?;

        if response.status() == StatusCode::CONFLICT {
            let body = body_text(response).await;
            let redirect: TenantRedirect = serde_json::from_str(&body)
                .map_err(|_| BackendError::Status { status: 409, body })?;
            return Ok(LoginOutcome::TenantRedirect(redirect));
        }

        parse_json(expect_success(response).await?)
            .await
            .map(LoginOutcome::Success)
    }

    /// Full registration flow: begin, run the ceremony, finish.
    pub async fn register(
        &self,
        name: &str,
        provider: &impl CeremonyProvider,
        origin: &Url,
        extensions: Option<AuthenticationExtensionsClientInputs>,
    ) -> Result<RegistrationOutcome, BackendError> {
        let mut options = self.register_begin(name).await?;
        if extensions.is_some() {
            options.public_key.extensions = extensions;
        }

        let credential = provider
            .create(origin, options)
            .await
            .map_err(BackendError::Ceremony)?;

        let finish = self.register_finish(&credential).await?;
        Ok(RegistrationOutcome {
            uuid: finish.uuid,
            credential,
        })
    }

    /// Full login flow: begin, run the ceremony, finish.
    ///
    /// Returns the outcome together with the assertion credential so
    /// scenarios can inspect extension outputs and the user handle.
    pub async fn login(
        &self,
        provider: &impl CeremonyProvider,
        origin: &Url,
        extensions: Option<AuthenticationExtensionsClientInputs>,
    ) -> Result<(LoginOutcome, AuthenticatedPublicKeyCredential), BackendError> {
        let mut options = self.login_begin().await?;
        if extensions.is_some() {
            options.public_key.extensions = extensions;
        }

        let credential = provider
            .get(origin, options)
            .await
            .map_err(BackendError::Ceremony)?;

        let outcome = self.login_finish(&credential).await?;
        Ok((outcome, credential))
    }
}

async fn expect_success(response: reqwest::Response) -> Result<reqwest::Response, BackendError> {
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else {
        Err(BackendError::Status {
            status: status.as_u16(),
            body: body_text(response).await,
        })
    }
}

async fn body_text(response: reqwest::Response) -> String {
    response.text().await.unwrap_or_default()
}

async fn parse_json<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, BackendError> {
    let url = response.url().clone();
    let bytes = response
        .bytes()
        .await
        .map_err(|source| BackendError::Http {
            url: url.to_string(),
            source,
        })?;
    serde_json::from_slice(&bytes).map_err(|err| BackendError::Parse(err.to_string()))
}

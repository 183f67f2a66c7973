//! In-process stand-in for the wallet backend's WebAuthn endpoints.
//!
//! This mimics only the wire contract the harness exercises: challenge
//! issuance, per-tenant credential bookkeeping, uuid continuity between
//! registration and login, and the cross-tenant 409 redirect. The real
//! backend's credential verification is the system under test and is
//! deliberately not reproduced here.

// Handlers are async by axum's contract even when they never await.
#![allow(clippy::unused_async)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use axum::routing::post;
use axum::Router;
use serde_json::{Value, json};
use uuid::Uuid;

use harness_client::wire::{LoginFinishRequest, RegisterBeginRequest, RegisterFinishRequest};
use harness_types::{encoding, webauthn::CollectedClientData};

#[derive(Default)]
struct BackendState {
    /// Pending registrations keyed by the issued challenge (base64url).
    pending_registrations: HashMap<String, PendingRegistration>,
    /// Pending logins keyed by the issued challenge (base64url).
    pending_logins: HashMap<String, PendingLogin>,
    /// Registered credentials keyed by credential id (base64url).
    credentials: HashMap<String, StoredCredential>,
}

struct PendingRegistration {
    name: String,
    uuid: Uuid,
    tenant: Option<String>,
}

struct PendingLogin {
    tenant: Option<String>,
}

struct StoredCredential {
    uuid: Uuid,
    tenant: Option<String>,
}

type Shared = Arc<Mutex<BackendState>>;

/// Spawn the stand-in on an ephemeral port; returns the port.
pub async fn spawn() -> u16 {
    let state: Shared = Arc::new(Mutex::new(BackendState::default()));
    let router = router(state);
    wallet_harness::mock::spawn(0, router)
        .await
        .expect("backend stand-in binds")
}

fn router(state: Shared) -> Router {
    Router::new()
        .route("/user/register-webauthn-begin", post(register_begin_global))
        .route("/user/register-webauthn-finish", post(register_finish_global))
        .route("/user/login-webauthn-begin", post(login_begin_global))
        .route("/user/login-webauthn-finish", post(login_finish_global))
        .route(
            "/t/:tenant/user/register-webauthn-begin",
            post(register_begin_tenant),
        )
        .route(
            "/t/:tenant/user/register-webauthn-finish",
            post(register_finish_tenant),
        )
        .route("/t/:tenant/user/login-webauthn-begin", post(login_begin_tenant))
        .route(
            "/t/:tenant/user/login-webauthn-finish",
            post(login_finish_tenant),
        )
        .with_state(state)
}

const RP_ID: &str = "localhost";

fn tagged(bytes: &[u8]) -> Value {
    json!({ "$b64u": encoding::base64url(bytes) })
}

fn register_begin(state: &Shared, tenant: Option<String>, name: String) -> Json<Value> {
    let challenge = harness_types::rand::random_vec(32);
    let uuid = Uuid::new_v4();
    let handle = match &tenant {
        Some(tenant) => format!("{tenant}:{uuid}"),
        None => uuid.to_string(),
    };

    state
        .lock()
        .expect("backend state lock")
        .pending_registrations
        .insert(
            encoding::base64url(&challenge),
            PendingRegistration {
                name: name.clone(),
                uuid,
                tenant,
            },
        );

    Json(json!({
        "publicKey": {
            "rp": { "id": RP_ID, "name": "Keyfold Wallet" },
            "user": {
                "id": tagged(handle.as_bytes()),
                "name": name,
                "displayName": name,
            },
            "challenge": tagged(&challenge),
            "pubKeyCredParams": [ { "type": "public-key", "alg": -7 } ],
            "authenticatorSelection": {
                "residentKey": "required",
                "requireResidentKey": true,
                "userVerification": "required"
            },
            "attestation": "none"
        }
    }))
}

fn client_data_challenge(client_data_json: &[u8]) -> Result<(String, CollectedClientData), Response> {
    serde_json::from_slice::<CollectedClientData>(client_data_json)
        .map(|data| (data.challenge.clone(), data))
        .map_err(|err| {
            (
                StatusCode::BAD_REQUEST,
                format!("client data does not parse: {err}"),
            )
                .into_response()
        })
}

fn register_finish(
    state: &Shared,
    tenant: Option<String>,
    request: RegisterFinishRequest,
) -> Response {
    let (challenge, _) = match client_data_challenge(&request.response.client_data_json) {
        Ok(parsed) => parsed,
        Err(response) => return response,
    };

    let mut state = state.lock().expect("backend state lock");
    let Some(pending) = state.pending_registrations.remove(&challenge) else {
        return (StatusCode::BAD_REQUEST, "unknown registration challenge").into_response();
    };
    if pending.tenant != tenant {
        return (StatusCode::BAD_REQUEST, "challenge was issued for another tenant")
            .into_response();
    }

    state.credentials.insert(
        encoding::base64url(&request.raw_id),
        StoredCredential {
            uuid: pending.uuid,
            tenant: pending.tenant,
        },
    );
    log::info!("registered {} as {}", pending.name, pending.uuid);

    Json(json!({ "uuid": pending.uuid })).into_response()
}

fn login_begin(state: &Shared, tenant: Option<String>) -> Json<Value> {
    let challenge = harness_types::rand::random_vec(32);
    state
        .lock()
        .expect("backend state lock")
        .pending_logins
        .insert(encoding::base64url(&challenge), PendingLogin { tenant });

    Json(json!({
        "publicKey": {
            "challenge": tagged(&challenge),
            "rpId": RP_ID,
            "userVerification": "required"
        }
    }))
}

fn login_finish(state: &Shared, tenant: Option<String>, request: LoginFinishRequest) -> Response {
    let (challenge, _) = match client_data_challenge(&request.response.client_data_json) {
        Ok(parsed) => parsed,
        Err(response) => return response,
    };

    let mut state = state.lock().expect("backend state lock");
    let Some(pending) = state.pending_logins.remove(&challenge) else {
        return (StatusCode::BAD_REQUEST, "unknown login challenge").into_response();
    };
    if pending.tenant != tenant {
        return (StatusCode::BAD_REQUEST, "challenge was issued for another tenant")
            .into_response();
    }

    let Some(credential) = state.credentials.get(&encoding::base64url(&request.raw_id)) else {
        return (StatusCode::UNAUTHORIZED, "unknown credential").into_response();
    };

    // A credential registered under a tenant must log in under it.
    if credential.tenant != tenant {
        if let Some(home_tenant) = &credential.tenant {
            return (
                StatusCode::CONFLICT,
                Json(json!({
                    "error": "Tenant redirect required",
                    "redirect_tenant": home_tenant,
                    "user_id": credential.uuid,
                })),
            )
                .into_response();
        }
        return (StatusCode::UNAUTHORIZED, "credential is not tenant scoped").into_response();
    }

    Json(json!({ "uuid": credential.uuid, "tenantId": credential.tenant })).into_response()
}

async fn register_begin_global(
    State(state): State<Shared>,
    Json(request): Json<RegisterBeginRequest>,
) -> Json<Value> {
    register_begin(&state, None, request.name)
}

async fn register_begin_tenant(
    State(state): State<Shared>,
    Path(tenant): Path<String>,
    Json(request): Json<RegisterBeginRequest>,
) -> Json<Value> {
    register_begin(&state, Some(tenant), request.name)
}

async fn register_finish_global(
    State(state): State<Shared>,
    Json(request): Json<RegisterFinishRequest>,
) -> Response {
    register_finish(&state, None, request)
}

async fn register_finish_tenant(
    State(state): State<Shared>,
    Path(tenant): Path<String>,
    Json(request): Json<RegisterFinishRequest>,
) -> Response {
    register_finish(&state, Some(tenant), request)
}

async fn login_begin_global(State(state): State<Shared>) -> Json<Value> {
    login_begin(&state, None)
}

async fn login_begin_tenant(State(state): State<Shared>, Path(tenant): Path<String>) -> Json<Value> {
    login_begin(&state, Some(tenant))
}

async fn login_finish_global(
    State(state): State<Shared>,
    Json(request): Json<LoginFinishRequest>,
) -> Response {
    login_finish(&state, None, request)
}

async fn login_finish_tenant(
    State(state): State<Shared>,
    Path(tenant): Path<String>,
    Json(request): Json<LoginFinishRequest>,
) -> Response {
    login_finish(&state, Some(tenant), request)
}

//! Mock OpenID4VP verifier.

// Handlers are async by axum's contract even when they never await.
#![allow(clippy::unused_async)]

use std::sync::Arc;

use axum::{Json, Router, extract::State, routing::get};
use serde_json::{Value, json};

/// Configuration of the mock verifier.
#[derive(Debug, Clone)]
pub struct VerifierConfig {
    /// The verifier identifier URL advertised in the metadata.
    pub verifier_url: String,

    /// Trusted wallet client ids advertised to relying parties.
    pub trusted_wallets: Vec<String>,
}

impl Default for VerifierConfig {
    fn default() -> Self {
        Self {
            verifier_url: "http://127.0.0.1:9281".into(),
            trusted_wallets: vec!["keyfold-wallet".into()],
        }
    }
}

impl VerifierConfig {
    /// Defaults overridden by `MOCK_VERIFIER_URL` and
    /// `MOCK_VERIFIER_TRUSTED_WALLETS` (comma separated).
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            verifier_url: std::env::var("MOCK_VERIFIER_URL").unwrap_or(defaults.verifier_url),
            trusted_wallets: std::env::var("MOCK_VERIFIER_TRUSTED_WALLETS")
                .map(|raw| raw.split(',').map(str::to_owned).collect())
                .unwrap_or(defaults.trusted_wallets),
        }
    }
}

/// The verifier's routes: OpenID4VP discovery plus a canned presentation
/// request.
pub fn router(config: VerifierConfig) -> Router {
    Router::new()
        .route("/.well-known/openid4vp-verifier", get(metadata))
        .route("/presentation_request", get(presentation_request))
        .with_state(Arc::new(config))
}

async fn metadata(State(config): State<Arc<VerifierConfig>>) -> Json<Value> {
    Json(json!({
        "verifier_id": config.verifier_url,
        "response_types_supported": ["vp_token"],
        "vp_formats_supported": {
            "mso_mdoc": { "alg_values_supported": ["ES256"] },
            "dc+sd-jwt": { "sd-jwt_alg_values": ["ES256"] }
        },
        "trusted_wallets": config.trusted_wallets,
    }))
}

async fn presentation_request(State(config): State<Arc<VerifierConfig>>) -> Json<Value> {
    Json(json!({
        "client_id": config.verifier_url,
        "response_type": "vp_token",
        "response_mode": "direct_post",
        "response_uri": format!("{}/response", config.verifier_url),
        "nonce": "mock-verifier-nonce",
        "presentation_definition": {
            "id": "age-over-18",
            "input_descriptors": [{
                "id": "org.iso.18013.5.1.mDL",
                "format": { "mso_mdoc": { "alg": ["ES256"] } },
                "constraints": {
                    "fields": [{
                        "path": ["$['org.iso.18013.5.1']['age_over_18']"],
                        "intent_to_retain": false
                    }]
                }
            }]
        }
    }))
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    use super::*;

    #[tokio::test]
    async fn presentation_request_is_well_formed() {
        let response = router(VerifierConfig::default())
            .oneshot(
                Request::builder()
                    .uri("/presentation_request")
                    .body(Body::empty())
                    .expect("request builds"),
            )
            .await
            .expect("router responds");
        assert_eq!(response.status(), StatusCode::OK);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body reads");
        let json: Value = serde_json::from_slice(&body).expect("json body");
        assert_eq!(json["response_type"], "vp_token");
        assert!(json["presentation_definition"]["input_descriptors"].is_array());
    }
}

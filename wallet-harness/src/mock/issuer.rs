//! Mock OpenID4VCI credential issuer.

// Handlers are async by axum's contract even when they never await.
#![allow(clippy::unused_async)]

use std::sync::Arc;

use axum::{Json, Router, extract::State, routing::get};
use serde_json::{Value, json};

/// Configuration of the mock issuer.
#[derive(Debug, Clone)]
pub struct IssuerConfig {
    /// The issuer identifier URL advertised in the metadata.
    pub issuer_url: String,

    /// IACA certificates (base64 DER) served under `/mdoc_iacas`.
    pub iaca_certificates: Vec<String>,
}

impl Default for IssuerConfig {
    fn default() -> Self {
        Self {
            issuer_url: "http://127.0.0.1:9280".into(),
            iaca_certificates: Vec::new(),
        }
    }
}

impl IssuerConfig {
    /// Defaults overridden by `MOCK_ISSUER_URL` and `MOCK_ISSUER_IACAS`
    /// (comma separated).
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            issuer_url: std::env::var("MOCK_ISSUER_URL").unwrap_or(defaults.issuer_url),
            iaca_certificates: std::env::var("MOCK_ISSUER_IACAS")
                .map(|raw| raw.split(',').map(str::to_owned).collect())
                .unwrap_or(defaults.iaca_certificates),
        }
    }
}

/// The issuer's routes: OpenID4VCI discovery plus the mdoc IACA list.
pub fn router(config: IssuerConfig) -> Router {
    Router::new()
        .route("/.well-known/openid-credential-issuer", get(metadata))
        .route("/mdoc_iacas", get(iacas))
        .with_state(Arc::new(config))
}

async fn metadata(State(config): State<Arc<IssuerConfig>>) -> Json<Value> {
    Json(json!({
        "credential_issuer": config.issuer_url,
        "credential_endpoint": format!("{}/credential", config.issuer_url),
        "credential_configurations_supported": {
            "org.iso.18013.5.1.mDL": {
                "format": "mso_mdoc",
                "doctype": "org.iso.18013.5.1.mDL",
                "cryptographic_binding_methods_supported": ["cose_key"],
                "credential_signing_alg_values_supported": ["ES256"]
            },
            "eu.europa.ec.eudi.pid.1": {
                "format": "dc+sd-jwt",
                "vct": "eu.europa.ec.eudi.pid.1",
                "credential_signing_alg_values_supported": ["ES256"]
            }
        }
    }))
}

async fn iacas(State(config): State<Arc<IssuerConfig>>) -> Json<Value> {
    let certificates: Vec<Value> = config
        .iaca_certificates
        .iter()
        .map(|cert| json!({ "certificate": cert }))
        .collect();
    Json(json!({ "iacas": certificates }))
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    use super::*;

    #[tokio::test]
    async fn metadata_advertises_the_configured_issuer() {
        let router = router(IssuerConfig {
            issuer_url: "http://issuer.test".into(),
            iaca_certificates: vec!["AAAA".into()],
        });

        let response = router
            .oneshot(
                Request::builder()
                    .uri("/.well-known/openid-credential-issuer")
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
        assert_eq!(json["credential_issuer"], "http://issuer.test");
        assert_eq!(json["credential_endpoint"], "http://issuer.test/credential");
    }
}

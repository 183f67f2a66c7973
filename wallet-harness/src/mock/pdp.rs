//! Mock AuthZEN policy decision point.

// Handlers are async by axum's contract even when they never await.
#![allow(clippy::unused_async)]

use std::sync::Arc;

use axum::{Json, Router, extract::State, routing::post};
use serde::Deserialize;
use serde_json::{Value, json};

/// Configuration of the mock PDP.
#[derive(Debug, Clone, Default)]
pub struct PdpConfig {
    /// Subject ids that are denied; everyone else is permitted.
    pub denied_subjects: Vec<String>,
}

impl PdpConfig {
    /// Defaults overridden by `MOCK_PDP_DENIED_SUBJECTS` (comma separated).
    pub fn from_env() -> Self {
        Self {
            denied_subjects: std::env::var("MOCK_PDP_DENIED_SUBJECTS")
                .map(|raw| raw.split(',').map(str::to_owned).collect())
                .unwrap_or_default(),
        }
    }
}

/// The PDP's single route: the AuthZEN evaluation endpoint.
pub fn router(config: PdpConfig) -> Router {
    Router::new()
        .route("/access/v1/evaluation", post(evaluate))
        .with_state(Arc::new(config))
}

#[derive(Debug, Deserialize)]
struct EvaluationRequest {
    #[serde(default)]
    subject: Option<Subject>,
}

#[derive(Debug, Deserialize)]
struct Subject {
    #[serde(default)]
    id: Option<String>,
}

async fn evaluate(
    State(config): State<Arc<PdpConfig>>,
    Json(request): Json<EvaluationRequest>,
) -> Json<Value> {
    let subject = request.subject.and_then(|subject| subject.id);
    let decision = match &subject {
        Some(id) => !config.denied_subjects.contains(id),
        None => false,
    };
    log::debug!("pdp decision for {subject:?}: {decision}");
    Json(json!({ "decision": decision }))
}

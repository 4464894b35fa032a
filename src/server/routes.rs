//! Axum route handlers.
//!
//! Handlers stay thin: deserialize, delegate to the registry's services,
//! return the structured result. Domain failures come back as 200 with
//! `success: false`; only malformed requests produce 4xx.

use std::sync::Arc;

use axum::{
    extract::State,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::profile::StyleProfile;
use crate::registry::ServiceRegistry;
use crate::types::{ContextLabel, ConversionRequest, StyleVariant};

/// Shared application state for the HTTP server.
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<ServiceRegistry>,
}

impl AppState {
    pub fn new(registry: Arc<ServiceRegistry>) -> Self {
        Self { registry }
    }
}

/// Build the axum router with all routes.
pub fn app_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/convert", post(convert_handler))
        .route("/rag/ask", post(ask_handler))
        .route("/rag/ask-styles", post(ask_styles_handler))
        .route("/feedback", post(feedback_handler))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// GET /health — liveness plus component status.
async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    let pipeline = state.registry.pipeline.status();
    let index = state.registry.index.status();
    Json(serde_json::json!({
        "status": "ok",
        "version": crate::VERSION,
        "service": "tonepilot",
        "pipeline": pipeline,
        "index": index,
    }))
}

/// POST /convert — two-stage tone conversion.
async fn convert_handler(
    State(state): State<AppState>,
    Json(request): Json<ConversionRequest>,
) -> impl IntoResponse {
    let result = state.registry.pipeline.convert_request(&request).await;
    Json(result)
}

fn default_ask_context() -> ContextLabel {
    ContextLabel::Personal
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AskRequest {
    query: String,
    /// Optional free-text context prepended to the query.
    #[serde(default)]
    context: Option<String>,
}

/// POST /rag/ask — single grounded answer.
async fn ask_handler(
    State(state): State<AppState>,
    Json(request): Json<AskRequest>,
) -> impl IntoResponse {
    let result = state
        .registry
        .rag
        .ask(&request.query, request.context.as_deref())
        .await;
    Json(result)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AskStylesRequest {
    query: String,
    #[serde(default)]
    profile: StyleProfile,
    #[serde(default = "default_ask_context")]
    context: ContextLabel,
}

/// POST /rag/ask-styles — grounded answer in three style variants.
async fn ask_styles_handler(
    State(state): State<AppState>,
    Json(request): Json<AskStylesRequest>,
) -> impl IntoResponse {
    let result = state
        .registry
        .rag
        .ask_with_styles(&request.query, &request.profile, &request.context)
        .await;
    Json(result)
}

fn default_selected_variant() -> StyleVariant {
    StyleVariant::Neutral
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FeedbackRequest {
    comment: String,
    #[serde(default)]
    profile: StyleProfile,
    #[serde(default)]
    rating: Option<u8>,
    #[serde(default = "default_selected_variant")]
    selected_variant: StyleVariant,
}

/// POST /feedback — route feedback to the adaptation paths.
async fn feedback_handler(
    State(state): State<AppState>,
    Json(request): Json<FeedbackRequest>,
) -> impl IntoResponse {
    let outcome = state
        .registry
        .feedback
        .process_feedback(
            &request.comment,
            &request.profile,
            request.rating,
            request.selected_variant,
        )
        .await;
    Json(outcome)
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use serde_json::Value;
    use tower::ServiceExt;

    use super::*;
    use crate::config::Settings;
    use crate::error::OrchestrationError;
    use crate::llm::LanguageModel;
    use crate::pipeline::ConversionPipeline;
    use crate::prompts::StylePromptBuilder;
    use crate::retrieval::InMemoryIndex;
    use crate::types::Capability;

    struct CannedModel;

    #[async_trait]
    impl LanguageModel for CannedModel {
        fn model(&self) -> &str {
            "canned"
        }

        async fn generate(&self, _prompt: &str) -> Result<String, OrchestrationError> {
            Ok("canned output".to_string())
        }
    }

    fn test_state() -> AppState {
        let llm: Arc<dyn LanguageModel> = Arc::new(CannedModel);
        let prompts: Arc<dyn crate::prompts::PromptTemplates> =
            Arc::new(StylePromptBuilder::new().unwrap());
        let pipeline = Arc::new(ConversionPipeline::with_capability(
            Capability::unavailable("probe skipped in tests"),
            llm.clone(),
            prompts.clone(),
        ));
        let index = Arc::new(InMemoryIndex::from_passages(vec![(
            "policy.txt".into(),
            "Annual leave requires five days notice.".into(),
        )]));
        let registry = ServiceRegistry::from_parts(
            Settings::default(),
            llm,
            prompts,
            pipeline,
            index,
        );
        AppState::new(Arc::new(registry))
    }

    async fn post_json(app: Router, uri: &str, body: Value) -> (StatusCode, Value) {
        let request = Request::builder()
            .method("POST")
            .uri(uri)
            .header("Content-Type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), 64 * 1024)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn health_reports_component_status() {
        let app = app_router(test_state());
        let request = Request::builder()
            .uri("/health")
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let bytes = axum::body::to_bytes(response.into_body(), 64 * 1024)
            .await
            .unwrap();
        let json: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(json["status"], "ok");
        assert_eq!(json["service"], "tonepilot");
        assert_eq!(json["pipeline"]["endpointReady"], false);
        assert_eq!(json["index"]["ready"], true);
    }

    #[tokio::test]
    async fn convert_returns_structured_result() {
        let app = app_router(test_state());
        let (status, json) = post_json(
            app,
            "/convert",
            serde_json::json!({
                "text": "send me the file",
                "forceConvert": true,
            }),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["success"], true);
        assert_eq!(json["convertedText"], "canned output");
        assert_eq!(json["method"], "gpt_only");
        assert_eq!(json["reason"], "user_explicit_request");
    }

    #[tokio::test]
    async fn convert_decline_is_200_with_failure_body() {
        let app = app_router(test_state());
        let (status, json) = post_json(
            app,
            "/convert",
            serde_json::json!({"text": "hey", "context": "personal"}),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["success"], false);
        assert_eq!(json["method"], "none");
        assert_eq!(json["reason"], "condition_not_met");
    }

    #[tokio::test]
    async fn ask_styles_returns_variants_and_sources() {
        let app = app_router(test_state());
        let (status, json) = post_json(
            app,
            "/rag/ask-styles",
            serde_json::json!({"query": "annual leave notice"}),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["success"], true);
        assert_eq!(json["variants"]["direct"], "canned output");
        assert_eq!(json["sources"][0]["source"], "policy.txt");
    }

    #[tokio::test]
    async fn feedback_routes_to_advanced_path() {
        let app = app_router(test_state());
        let (status, json) = post_json(
            app,
            "/feedback",
            serde_json::json!({
                "comment": "sharper please",
                "profile": {"userId": "u-1"},
                "rating": 5,
                "selectedVariant": "direct",
            }),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["success"], true);
        assert_eq!(json["processingMethod"], "advanced");
    }
}

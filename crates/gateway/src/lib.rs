//! HTTP generation gateway for Sitewright.
//!
//! Exposes a health check and `POST /generate`, which validates the model,
//! forwards the prompt to the configured providers and answers with the
//! generated text and token counts. The gateway keeps no session state.
//!
//! Built on Axum for high performance async HTTP.

use axum::extract::DefaultBodyLimit;
use axum::extract::rejection::JsonRejection;
use axum::{
    Router,
    extract::State,
    http::StatusCode,
    response::Json,
    routing::{get, post},
};
use serde::Serialize;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tracing::{error, info, warn};

use sitewright_config::AppConfig;
use sitewright_core::wire::{
    ErrorReply, GENERATION_FAILED, GenerateBody, GenerateReply, INVALID_REQUEST, UNSUPPORTED_MODEL,
};
use sitewright_core::{GenerationError, GenerationRequest, Generator, ModelId};

/// Shared application state for the gateway.
pub struct GatewayState {
    pub generator: Arc<dyn Generator>,
}

type SharedState = Arc<GatewayState>;

/// Build the Axum router with the API routes.
///
/// Layers applied:
/// - Request body size limit
/// - Permissive CORS, so a browser UI on another origin can call in
/// - HTTP trace logging
pub fn build_router(state: SharedState, max_body_bytes: usize) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/generate", post(generate_handler))
        .with_state(state)
        .layer(DefaultBodyLimit::max(max_body_bytes))
        .layer(CorsLayer::permissive())
        .layer(tower_http::trace::TraceLayer::new_for_http())
}

/// The API routes plus, when configured, a static directory served for
/// every other path.
pub fn build_app(state: SharedState, config: &AppConfig) -> Router {
    let router = build_router(state, config.gateway.max_body_bytes);
    match config.gateway.static_dir.as_deref() {
        Some(dir) => {
            info!(dir = %dir, "Serving static files");
            router.fallback_service(ServeDir::new(dir))
        }
        None => router,
    }
}

/// Start the gateway HTTP server.
pub async fn start(config: AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let host = config.gateway.host.clone();
    let port = config.gateway.port;
    let addr = format!("{host}:{port}");

    let router = sitewright_providers::build_from_config(&config);
    for model in ModelId::ALL {
        let provider = model.provider();
        if config.api_key(provider.as_str()).is_none() {
            warn!(
                provider = %provider,
                model = %model,
                "No operator key configured; requests must bring their own"
            );
        }
    }

    let state = Arc::new(GatewayState {
        generator: Arc::new(router),
    });
    let app = build_app(state, &config);

    info!(addr = %addr, "Gateway starting");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

// --- Handlers ---

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

type ApiError = (StatusCode, Json<ErrorReply>);

fn unsupported_model(details: String) -> ApiError {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorReply {
            error: UNSUPPORTED_MODEL.into(),
            details: Some(details),
        }),
    )
}

/// Malformed bodies still get the `{error, details}` shape. Oversized ones
/// keep their 413.
fn invalid_request(rejection: JsonRejection) -> ApiError {
    let status = match rejection.status() {
        StatusCode::PAYLOAD_TOO_LARGE => StatusCode::PAYLOAD_TOO_LARGE,
        _ => StatusCode::BAD_REQUEST,
    };
    let details = rejection.body_text();
    warn!(status = %status, details = %details, "Rejected generate request");
    (
        status,
        Json(ErrorReply {
            error: INVALID_REQUEST.into(),
            details: Some(details),
        }),
    )
}

async fn generate_handler(
    State(state): State<SharedState>,
    payload: Result<Json<GenerateBody>, JsonRejection>,
) -> Result<Json<GenerateReply>, ApiError> {
    let Json(body) = payload.map_err(invalid_request)?;
    let model: ModelId = body.model.parse().map_err(|e: GenerationError| {
        warn!(model = %body.model, "Unsupported model requested");
        unsupported_model(e.to_string())
    })?;

    info!(model = %model, prompt_len = body.prompt.len(), "Generate request");

    let request = GenerationRequest::new(model, body.prompt.clone()).with_credentials(body.credentials());

    match state.generator.generate(request).await {
        Ok(generation) => Ok(Json(GenerateReply {
            content: generation.content,
            input_tokens: generation.input_tokens,
            output_tokens: generation.output_tokens,
        })),
        Err(e @ GenerationError::UnsupportedModel(_)) => Err(unsupported_model(e.to_string())),
        Err(GenerationError::Failed { details }) => {
            error!(model = %model, details = %details, "Generation failed");
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorReply {
                    error: GENERATION_FAILED.into(),
                    details: Some(details),
                }),
            ))
        }
    }
}

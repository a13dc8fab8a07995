// src/api.rs
use std::any::Any;
use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use tower_http::{catch_panic::CatchPanicLayer, cors::CorsLayer};

use crate::aggregate::FeedAggregator;
use crate::auth::{require_bearer, TokenAuthority};
use crate::error::TriageError;
use crate::priority::SortedFeed;
use crate::report::ClassifiedReport;
use crate::triage::TriageService;

/// Shared state for the handlers. Every collaborator is built once at startup
/// and injected here.
#[derive(Clone)]
pub struct AppState {
    pub triage: TriageService,
    pub feed: Arc<FeedAggregator>,
    pub auth: Arc<TokenAuthority>,
}

pub fn router(state: AppState) -> Router {
    let protected = Router::new()
        .route("/triage", post(triage))
        .route("/auto-triage", get(auto_triage))
        .route_layer(middleware::from_fn_with_state(
            state.auth.clone(),
            require_bearer,
        ));

    Router::new()
        .route("/health", get(|| async { "OK" }))
        .merge(protected)
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

/// A panic anywhere below the router (handlers, classifier, sources) becomes
/// the generic 500 body.
fn panic_response(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = err
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| err.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic");
    TriageError::Internal(format!("handler panicked: {detail}")).into_response()
}

#[derive(serde::Deserialize)]
struct TriageReq {
    #[serde(default)]
    text: Option<String>,
}

async fn triage(
    State(state): State<AppState>,
    body: Result<Json<TriageReq>, JsonRejection>,
) -> Result<Json<ClassifiedReport>, TriageError> {
    let text = match body {
        Ok(Json(TriageReq { text: Some(t) })) => t,
        Ok(_) => return Err(TriageError::Validation("Text is required".to_string())),
        Err(rej) => {
            tracing::debug!(target: "api", error = %rej, "rejected /triage body");
            return Err(TriageError::Validation("Text is required".to_string()));
        }
    };
    let report = state.triage.submit_manual_report(&text).await?;
    Ok(Json(report))
}

async fn auto_triage(State(state): State<AppState>) -> Result<Json<SortedFeed>, TriageError> {
    let feed = state.feed.sorted_feed().await?;
    Ok(Json(feed))
}

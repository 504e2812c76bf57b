use std::io::Read;
use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Extension, Json, Router};
use hiretop::applications::application_router;
use hiretop::documents::{BlobError, BlobStore};
use hiretop::offers::{ContractType, OfferFilters};
use hiretop::ServiceError;
use serde::Deserialize;
use serde_json::json;

use crate::infra::{ApiApp, AppState};

/// Query string of the public offer board. `skills` is a comma separated list of names.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct BoardParams {
    pub(crate) search: Option<String>,
    pub(crate) contract_type: Option<ContractType>,
    pub(crate) location: Option<String>,
    pub(crate) skills: Option<String>,
    pub(crate) page: Option<u32>,
}

impl BoardParams {
    fn into_filters(self) -> (OfferFilters, u32) {
        let skills = self
            .skills
            .map(|raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|name| !name.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();
        let filters = OfferFilters {
            search: self.search,
            contract_type: self.contract_type,
            location: self.location,
            skills,
        };
        (filters, self.page.unwrap_or(1))
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct SignedLinkParams {
    pub(crate) expires: i64,
    pub(crate) signature: String,
}

pub(crate) fn with_hiring_routes(app: Arc<ApiApp>) -> Router {
    let board = Router::new()
        .route("/api/v1/offers", get(offer_board_endpoint))
        .with_state(app.clone());

    application_router(app)
        .merge(board)
        .route("/health", get(healthcheck))
        .route("/ready", get(readiness_endpoint))
        .route("/metrics", get(metrics_endpoint))
        .route("/files/*locator", get(signed_file_endpoint))
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

pub(crate) async fn offer_board_endpoint(
    State(app): State<Arc<ApiApp>>,
    Query(params): Query<BoardParams>,
) -> Response {
    let (filters, page) = params.into_filters();
    match app.offers.list_published(filters, page) {
        Ok(page) => Json(page).into_response(),
        Err(err) => err.into_response(),
    }
}

/// Serves a stored document to anyone holding a valid signed link.
pub(crate) async fn signed_file_endpoint(
    Extension(state): Extension<AppState>,
    Path(locator): Path<String>,
    Query(params): Query<SignedLinkParams>,
) -> Response {
    if !state.blobs.verify(&locator, params.expires, &params.signature) {
        return (
            StatusCode::FORBIDDEN,
            Json(json!({ "error": "link is invalid or has expired" })),
        )
            .into_response();
    }

    let mut bytes = Vec::new();
    let read = state
        .blobs
        .get(&locator)
        .and_then(|mut body| body.read_to_end(&mut bytes).map_err(BlobError::from));
    match read {
        Ok(_) => {
            let content_type = mime_guess::from_path(&locator).first_or_octet_stream();
            (
                StatusCode::OK,
                [(header::CONTENT_TYPE, content_type.to_string())],
                bytes,
            )
                .into_response()
        }
        Err(BlobError::Missing) => ServiceError::not_found("document").into_response(),
        Err(err) => ServiceError::from(err).into_response(),
    }
}

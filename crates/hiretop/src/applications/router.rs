use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use base64::Engine;
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::domain::{
    ApplicationFilters, ApplicationId, ApplicationScope, ApplicationStatus, ApplicationUpdate,
    ApplyRequest,
};
use crate::app::HireTop;
use crate::company::CompanyId;
use crate::documents::{BlobStore, Disposition, DocumentDownload, DocumentUpload};
use crate::error::ServiceError;
use crate::identity::{Actor, RoleName, UserId};
use crate::notify::Notifier;
use crate::offers::JobOfferId;
use crate::store::HiringStore;

/// Header carrying the authenticated user id, set by the session layer in front of the API.
pub const ACTOR_HEADER: &str = "x-hiretop-user";

/// Router exposing the application lifecycle over HTTP.
pub fn application_router<S, B, N>(app: Arc<HireTop<S, B, N>>) -> Router
where
    S: HiringStore + 'static,
    B: BlobStore + 'static,
    N: Notifier + 'static,
{
    Router::new()
        .route(
            "/api/v1/offers/:offer_id/applications",
            post(apply_handler::<S, B, N>),
        )
        .route("/api/v1/applications", get(list_handler::<S, B, N>))
        .route(
            "/api/v1/applications/:application_id",
            get(show_handler::<S, B, N>)
                .patch(update_handler::<S, B, N>)
                .delete(delete_handler::<S, B, N>),
        )
        .route(
            "/api/v1/applications/:application_id/status",
            put(status_handler::<S, B, N>),
        )
        .route(
            "/api/v1/applications/:application_id/document",
            get(document_handler::<S, B, N>),
        )
        .route(
            "/api/v1/applications/:application_id/document/link",
            get(document_link_handler::<S, B, N>),
        )
        .route(
            "/api/v1/talents/:user_id/cv",
            get(profile_document_handler::<S, B, N>),
        )
        .with_state(app)
}

/// Document sent inline in a JSON body.
#[derive(Debug, Clone, Deserialize)]
pub struct EncodedDocument {
    pub file_name: String,
    #[serde(default)]
    pub content_type: Option<String>,
    pub content_base64: String,
}

impl EncodedDocument {
    fn decode(self) -> Result<DocumentUpload, ServiceError> {
        let bytes = base64::engine::general_purpose::STANDARD
            .decode(self.content_base64.trim())
            .map_err(|_| ServiceError::Validation("document is not valid base64".to_string()))?;
        Ok(DocumentUpload {
            file_name: self.file_name,
            content_type: self.content_type,
            bytes,
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ApplyBody {
    pub message: Option<String>,
    pub use_profile_cv: bool,
    pub document: Option<EncodedDocument>,
    pub disponibility: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct UpdateBody {
    pub message: Option<String>,
    pub use_profile_cv: Option<bool>,
    pub document: Option<EncodedDocument>,
    pub disponibility: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StatusBody {
    pub status: ApplicationStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListScope {
    Company,
    Talent,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ListParams {
    pub scope: Option<ListScope>,
    pub company_id: Option<CompanyId>,
    pub search: Option<String>,
    pub status: Option<ApplicationStatus>,
    pub job_offer_id: Option<JobOfferId>,
    pub page: Option<u32>,
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(default)]
pub struct DocumentParams {
    pub disposition: Disposition,
}

#[derive(Debug, Clone, Serialize)]
pub struct DocumentLink {
    pub url: String,
    pub expires_in_seconds: u64,
}

pub(crate) async fn apply_handler<S, B, N>(
    State(app): State<Arc<HireTop<S, B, N>>>,
    headers: HeaderMap,
    Path(offer_id): Path<JobOfferId>,
    Json(body): Json<ApplyBody>,
) -> Response
where
    S: HiringStore + 'static,
    B: BlobStore + 'static,
    N: Notifier + 'static,
{
    let actor = match authenticate(&app, &headers) {
        Ok(actor) => actor,
        Err(response) => return response,
    };
    let result = body
        .document
        .map(EncodedDocument::decode)
        .transpose()
        .and_then(|document| {
            app.applications.apply(
                &actor,
                offer_id,
                ApplyRequest {
                    message: body.message,
                    use_profile_cv: body.use_profile_cv,
                    document,
                    disponibility: body.disponibility,
                },
            )
        });
    respond(StatusCode::CREATED, result)
}

pub(crate) async fn list_handler<S, B, N>(
    State(app): State<Arc<HireTop<S, B, N>>>,
    headers: HeaderMap,
    Query(params): Query<ListParams>,
) -> Response
where
    S: HiringStore + 'static,
    B: BlobStore + 'static,
    N: Notifier + 'static,
{
    let actor = match authenticate(&app, &headers) {
        Ok(actor) => actor,
        Err(response) => return response,
    };
    let filters = ApplicationFilters {
        search: params.search,
        status: params.status,
        job_offer_id: params.job_offer_id,
    };
    let page = params.page.unwrap_or(1);
    let scope = params.scope.unwrap_or(if actor.has_role(RoleName::Talent) {
        ListScope::Talent
    } else {
        ListScope::Company
    });

    let result = match scope {
        ListScope::Talent => {
            app.applications
                .list_applications(filters, ApplicationScope::Talent(&actor), page)
        }
        ListScope::Company => company_scope(&app, &actor, params.company_id).and_then(|company_id| {
            app.applications
                .list_applications(filters, ApplicationScope::Company(company_id), page)
        }),
    };
    respond(StatusCode::OK, result)
}

pub(crate) async fn show_handler<S, B, N>(
    State(app): State<Arc<HireTop<S, B, N>>>,
    headers: HeaderMap,
    Path(application_id): Path<ApplicationId>,
) -> Response
where
    S: HiringStore + 'static,
    B: BlobStore + 'static,
    N: Notifier + 'static,
{
    let actor = match authenticate(&app, &headers) {
        Ok(actor) => actor,
        Err(response) => return response,
    };
    respond(
        StatusCode::OK,
        app.applications.get_application(&actor, application_id),
    )
}

pub(crate) async fn update_handler<S, B, N>(
    State(app): State<Arc<HireTop<S, B, N>>>,
    headers: HeaderMap,
    Path(application_id): Path<ApplicationId>,
    Json(body): Json<UpdateBody>,
) -> Response
where
    S: HiringStore + 'static,
    B: BlobStore + 'static,
    N: Notifier + 'static,
{
    let actor = match authenticate(&app, &headers) {
        Ok(actor) => actor,
        Err(response) => return response,
    };
    let result = body
        .document
        .map(EncodedDocument::decode)
        .transpose()
        .and_then(|document| {
            app.applications.update_application(
                &actor,
                application_id,
                ApplicationUpdate {
                    message: body.message,
                    use_profile_cv: body.use_profile_cv,
                    document,
                    disponibility: body.disponibility,
                },
            )
        });
    respond(StatusCode::OK, result)
}

pub(crate) async fn delete_handler<S, B, N>(
    State(app): State<Arc<HireTop<S, B, N>>>,
    headers: HeaderMap,
    Path(application_id): Path<ApplicationId>,
) -> Response
where
    S: HiringStore + 'static,
    B: BlobStore + 'static,
    N: Notifier + 'static,
{
    let actor = match authenticate(&app, &headers) {
        Ok(actor) => actor,
        Err(response) => return response,
    };
    match app.applications.delete_application(&actor, application_id) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => err.into_response(),
    }
}

pub(crate) async fn status_handler<S, B, N>(
    State(app): State<Arc<HireTop<S, B, N>>>,
    headers: HeaderMap,
    Path(application_id): Path<ApplicationId>,
    Json(body): Json<StatusBody>,
) -> Response
where
    S: HiringStore + 'static,
    B: BlobStore + 'static,
    N: Notifier + 'static,
{
    let actor = match authenticate(&app, &headers) {
        Ok(actor) => actor,
        Err(response) => return response,
    };
    respond(
        StatusCode::OK,
        app.applications
            .confirm_or_revoke_apply(&actor, application_id, body.status),
    )
}

pub(crate) async fn document_handler<S, B, N>(
    State(app): State<Arc<HireTop<S, B, N>>>,
    headers: HeaderMap,
    Path(application_id): Path<ApplicationId>,
    Query(params): Query<DocumentParams>,
) -> Response
where
    S: HiringStore + 'static,
    B: BlobStore + 'static,
    N: Notifier + 'static,
{
    let actor = match authenticate(&app, &headers) {
        Ok(actor) => actor,
        Err(response) => return response,
    };
    serve_download(app.documents.open_application_document(
        &actor,
        application_id,
        params.disposition,
    ))
}

/// Issues a short-lived link to the application document, checked like a direct read.
pub(crate) async fn document_link_handler<S, B, N>(
    State(app): State<Arc<HireTop<S, B, N>>>,
    headers: HeaderMap,
    Path(application_id): Path<ApplicationId>,
) -> Response
where
    S: HiringStore + 'static,
    B: BlobStore + 'static,
    N: Notifier + 'static,
{
    let actor = match authenticate(&app, &headers) {
        Ok(actor) => actor,
        Err(response) => return response,
    };
    let ttl = app.documents.link_ttl();
    let result = app
        .documents
        .signed_application_document_url(&actor, application_id, ttl)
        .map(|url| DocumentLink {
            url,
            expires_in_seconds: ttl.as_secs(),
        });
    respond(StatusCode::OK, result)
}

/// Profile CV of a talent, readable by the talent and by companies they applied to.
pub(crate) async fn profile_document_handler<S, B, N>(
    State(app): State<Arc<HireTop<S, B, N>>>,
    headers: HeaderMap,
    Path(user_id): Path<UserId>,
    Query(params): Query<DocumentParams>,
) -> Response
where
    S: HiringStore + 'static,
    B: BlobStore + 'static,
    N: Notifier + 'static,
{
    let actor = match authenticate(&app, &headers) {
        Ok(actor) => actor,
        Err(response) => return response,
    };
    serve_download(
        app.documents
            .open_profile_document(&actor, user_id, params.disposition),
    )
}

fn serve_download(result: Result<DocumentDownload, ServiceError>) -> Response {
    let download = match result {
        Ok(download) => download,
        Err(err) => return err.into_response(),
    };
    let content_type = download.content_type.clone();
    let content_disposition = download.content_disposition.clone();
    match download.into_bytes() {
        Ok(bytes) => (
            StatusCode::OK,
            [
                (header::CONTENT_TYPE, content_type),
                (header::CONTENT_DISPOSITION, content_disposition),
            ],
            bytes,
        )
            .into_response(),
        Err(err) => err.into_response(),
    }
}

/// Resolves the acting user from [`ACTOR_HEADER`]. Unknown users are unauthenticated;
/// unverified ones are refused.
fn authenticate<S, B, N>(app: &HireTop<S, B, N>, headers: &HeaderMap) -> Result<Actor, Response>
where
    S: HiringStore + 'static,
    B: BlobStore + 'static,
    N: Notifier + 'static,
{
    let user_id = headers
        .get(ACTOR_HEADER)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.trim().parse::<UserId>().ok())
        .ok_or_else(unauthenticated)?;
    let actor = match app.identity.actor(user_id) {
        Ok(actor) => actor,
        Err(ServiceError::NotFound(_)) => return Err(unauthenticated()),
        Err(other) => return Err(other.into_response()),
    };
    actor
        .require_verified_email()
        .map_err(IntoResponse::into_response)?;
    Ok(actor)
}

fn company_scope<S, B, N>(
    app: &HireTop<S, B, N>,
    actor: &Actor,
    requested: Option<CompanyId>,
) -> Result<CompanyId, ServiceError>
where
    S: HiringStore + 'static,
    B: BlobStore + 'static,
    N: Notifier + 'static,
{
    let membership = app.companies.membership();
    match requested {
        Some(company_id) => {
            membership.require_membership(actor.user_id, company_id)?;
            Ok(company_id)
        }
        None => Ok(membership.resolve_company_for_user(actor.user_id)?.id),
    }
}

fn unauthenticated() -> Response {
    let payload = json!({
        "error": "authentication required",
    });
    (StatusCode::UNAUTHORIZED, Json(payload)).into_response()
}

fn respond<T: Serialize>(status: StatusCode, result: Result<T, ServiceError>) -> Response {
    match result {
        Ok(value) => (status, Json(value)).into_response(),
        Err(err) => err.into_response(),
    }
}

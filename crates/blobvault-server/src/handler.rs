use std::sync::Arc;

use axum::extract::{Multipart, Path, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use blobvault_repo::{BlobDigest, BlobId, BlobRepository, BlobSummary, RepoResult, UserId};
use blobvault_store::FsContentStore;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::auth::Caller;
use crate::error::{ServerError, ServerResult};
use crate::router::AppState;

/// Multipart field carrying uploaded content.
pub const UPLOAD_FIELD: &str = "file";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisibilityRequest {
    pub public: bool,
}

/// Body for ACL add/replace. `user` is accepted as a single extra name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AclRequest {
    #[serde(default)]
    pub user: Option<String>,
    #[serde(default)]
    pub allowed_users: Vec<String>,
}

impl AclRequest {
    fn users(self) -> ServerResult<Vec<UserId>> {
        self.user
            .into_iter()
            .chain(self.allowed_users)
            .map(|name| UserId::parse(name).map_err(|e| ServerError::BadRequest(e.to_string())))
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AclResponse {
    pub user: UserId,
    pub allowed_users: Vec<UserId>,
}

struct Upload {
    filename: String,
    data: Vec<u8>,
}

async fn read_upload(mut multipart: Multipart) -> ServerResult<Upload> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }
        let filename = field.file_name().unwrap_or_default().to_string();
        if filename.is_empty() {
            return Err(ServerError::BadRequest("no selected file".into()));
        }
        let data = field.bytes().await?.to_vec();
        return Ok(Upload { filename, data });
    }
    Err(ServerError::BadRequest(format!("missing multipart field '{UPLOAD_FIELD}'")))
}

fn parse_blob_id(raw: &str) -> ServerResult<BlobId> {
    raw.parse().map_err(|_| ServerError::UnknownBlob(raw.to_string()))
}

/// Run a repository call on the blocking pool.
async fn with_repo<T, F>(state: &AppState, f: F) -> ServerResult<T>
where
    F: FnOnce(&BlobRepository<FsContentStore>) -> RepoResult<T> + Send + 'static,
    T: Send + 'static,
{
    let repo = Arc::clone(&state.repo);
    let result = tokio::task::spawn_blocking(move || f(&repo))
        .await
        .map_err(|e| ServerError::Internal(e.to_string()))?;
    Ok(result?)
}

pub async fn status() -> &'static str {
    "Service running"
}

pub async fn create_blob(
    State(state): State<AppState>,
    caller: Caller,
    multipart: Multipart,
) -> ServerResult<(StatusCode, Json<BlobSummary>)> {
    let owner = caller.require()?.clone();
    let upload = read_upload(multipart).await?;
    let (blob_id, location) = with_repo(&state, move |repo| {
        repo.create(&upload.data, &upload.filename, &owner)
    })
    .await?;
    info!(blob_id = %blob_id, location = %location, "blob created");
    Ok((StatusCode::CREATED, Json(BlobSummary { blob_id, location })))
}

pub async fn list_blobs(
    State(state): State<AppState>,
    caller: Caller,
) -> ServerResult<Json<Vec<BlobSummary>>> {
    let listed = with_repo(&state, move |repo| Ok(repo.list(caller.user()))).await?;
    Ok(Json(listed))
}

pub async fn download_blob(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<String>,
) -> ServerResult<Response> {
    let id = parse_blob_id(&id)?;
    let (location, data) = with_repo(&state, move |repo| repo.content(&id, caller.user())).await?;
    let filename = location.file_name().unwrap_or("blob").to_string();
    Ok((
        [
            (header::CONTENT_TYPE, "application/octet-stream".to_string()),
            (header::CONTENT_DISPOSITION, format!("attachment; filename=\"{filename}\"")),
        ],
        data,
    )
        .into_response())
}

pub async fn update_blob(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<String>,
    multipart: Multipart,
) -> ServerResult<StatusCode> {
    let user = caller.require()?.clone();
    let id = parse_blob_id(&id)?;
    let upload = read_upload(multipart).await?;
    with_repo(&state, move |repo| {
        repo.update(&id, &upload.data, &upload.filename, &user)
    })
    .await?;
    info!(blob_id = %id, "blob updated");
    Ok(StatusCode::NO_CONTENT)
}

pub async fn delete_blob(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<String>,
) -> ServerResult<StatusCode> {
    let user = caller.require()?.clone();
    let id = parse_blob_id(&id)?;
    with_repo(&state, move |repo| repo.remove(&id, &user)).await?;
    info!(blob_id = %id, "blob deleted");
    Ok(StatusCode::NO_CONTENT)
}

pub async fn blob_hash(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<String>,
) -> ServerResult<Json<Vec<BlobDigest>>> {
    let id = parse_blob_id(&id)?;
    let digests = with_repo(&state, move |repo| repo.hash(&id, caller.user())).await?;
    Ok(Json(digests))
}

pub async fn set_visibility(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<String>,
    Json(body): Json<VisibilityRequest>,
) -> ServerResult<StatusCode> {
    let user = caller.require()?.clone();
    let id = parse_blob_id(&id)?;
    with_repo(&state, move |repo| repo.set_visibility(&id, body.public, &user)).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_acl(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<String>,
) -> ServerResult<Json<AclResponse>> {
    let user = caller.require()?.clone();
    let id = parse_blob_id(&id)?;
    let requester = user.clone();
    let permitted = with_repo(&state, move |repo| repo.list_permissions(&id, &requester)).await?;
    Ok(Json(AclResponse {
        user,
        allowed_users: permitted.into_iter().collect(),
    }))
}

pub async fn add_acl(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<String>,
    Json(body): Json<AclRequest>,
) -> ServerResult<StatusCode> {
    let user = caller.require()?.clone();
    let id = parse_blob_id(&id)?;
    let users = body.users()?;
    with_repo(&state, move |repo| repo.add_permission(&id, users, &user)).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn replace_acl(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<String>,
    Json(body): Json<AclRequest>,
) -> ServerResult<StatusCode> {
    let user = caller.require()?.clone();
    let id = parse_blob_id(&id)?;
    let users = body.users()?;
    with_repo(&state, move |repo| repo.replace_permissions(&id, users, &user)).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn remove_acl(
    State(state): State<AppState>,
    caller: Caller,
    Path((id, username)): Path<(String, String)>,
) -> ServerResult<StatusCode> {
    let user = caller.require()?.clone();
    let id = parse_blob_id(&id)?;
    let target = UserId::parse(username).map_err(|e| ServerError::BadRequest(e.to_string()))?;
    with_repo(&state, move |repo| repo.remove_permission(&id, &target, &user)).await?;
    Ok(StatusCode::NO_CONTENT)
}

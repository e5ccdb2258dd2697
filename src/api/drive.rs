use axum::{
    Extension, Json, Router,
    extract::{Path, State},
    routing::{get, post, put},
};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::{
    AppState, DbConn, DbPool, Error,
    auth::AccessClaims,
    db::{Document, Folder, NewDocument, NewFolder},
};

use super::extract::Valid;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/create-folder", post(create_folder))
        .route("/rename-folder", put(rename_folder).patch(rename_folder))
        .route("/fetch-home", get(fetch_home))
        .route("/fetch-folder/{folder_id}", get(fetch_folder))
        .route("/create-document", post(create_document))
}

#[derive(Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
struct CreateFolder {
    #[serde(default)]
    #[validate(length(max = 255))]
    name: String,
    folder_id: Option<i32>,
}

#[derive(Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
struct RenameFolder {
    #[serde(default)]
    #[validate(length(max = 255))]
    name: String,
    folder_id: Option<i32>,
}

#[derive(Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
struct CreateDocument {
    #[serde(default)]
    #[validate(length(max = 255))]
    name: String,
    #[serde(default)]
    #[validate(length(min = 1, max = 1024))]
    key: String,
    #[validate(url)]
    url: Option<String>,
    folder_id: Option<i32>,
}

#[derive(Serialize)]
struct FolderResponse {
    success: bool,
    message: &'static str,
    folder: Folder,
}

#[derive(Serialize)]
struct DocumentResponse {
    success: bool,
    message: &'static str,
    document: Document,
}

#[derive(Serialize)]
struct ListingResponse {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    folder: Option<Folder>,
    folders: Vec<Folder>,
    documents: Vec<Document>,
}

fn required_name(name: &str) -> Result<&str, Error> {
    match name.trim() {
        "" => Err(Error::validation_failed("Provide Name")),
        name => Ok(name),
    }
}

async fn owned_folder(conn: &DbConn, owner_id: i32, id: i32) -> Result<Folder, Error> {
    Folder::find(conn, owner_id, id)
        .await?
        .ok_or_else(|| Error::not_found("Folder not found"))
}

async fn create_folder(
    State(pool): State<DbPool>,
    Extension(claims): Extension<AccessClaims>,
    Valid(request): Valid<CreateFolder>,
) -> Result<Json<FolderResponse>, Error> {
    let name = required_name(&request.name)?;
    let conn = pool.get().await?;
    if let Some(parent) = request.folder_id {
        owned_folder(&conn, claims.id, parent).await?;
    }
    let folder = Folder::create(&conn, NewFolder::new(claims.id, name, request.folder_id)).await?;
    debug!(user = claims.id, folder = folder.id, "created folder");
    Ok(Json(FolderResponse {
        success: true,
        message: "New Folder Created",
        folder,
    }))
}

async fn rename_folder(
    State(pool): State<DbPool>,
    Extension(claims): Extension<AccessClaims>,
    Valid(request): Valid<RenameFolder>,
) -> Result<Json<FolderResponse>, Error> {
    let name = required_name(&request.name)?;
    let Some(folder_id) = request.folder_id else {
        return Err(Error::validation_failed("Name or folderId is missing"));
    };
    let conn = pool.get().await?;
    let Some(folder) = Folder::rename(&conn, claims.id, folder_id, name.to_owned()).await? else {
        return Err(Error::not_found("Folder not found"));
    };
    Ok(Json(FolderResponse {
        success: true,
        message: "Folder renamed successfully",
        folder,
    }))
}

async fn fetch_home(
    State(pool): State<DbPool>,
    Extension(claims): Extension<AccessClaims>,
) -> Result<Json<ListingResponse>, Error> {
    let conn = pool.get().await?;
    let folders = Folder::children(&conn, claims.id, None).await?;
    let documents = Document::in_folder(&conn, claims.id, None).await?;
    Ok(Json(ListingResponse {
        success: true,
        folder: None,
        folders,
        documents,
    }))
}

async fn fetch_folder(
    State(pool): State<DbPool>,
    Extension(claims): Extension<AccessClaims>,
    Path(folder_id): Path<i32>,
) -> Result<Json<ListingResponse>, Error> {
    let conn = pool.get().await?;
    let folder = owned_folder(&conn, claims.id, folder_id).await?;
    let folders = Folder::children(&conn, claims.id, Some(folder.id)).await?;
    let documents = Document::in_folder(&conn, claims.id, Some(folder.id)).await?;
    Ok(Json(ListingResponse {
        success: true,
        folder: Some(folder),
        folders,
        documents,
    }))
}

async fn create_document(
    State(pool): State<DbPool>,
    Extension(claims): Extension<AccessClaims>,
    Valid(request): Valid<CreateDocument>,
) -> Result<Json<DocumentResponse>, Error> {
    let name = required_name(&request.name)?;
    let conn = pool.get().await?;
    if let Some(folder) = request.folder_id {
        owned_folder(&conn, claims.id, folder).await?;
    }
    let document = Document::create(
        &conn,
        NewDocument::new(claims.id, name, request.key, request.url, request.folder_id),
    )
    .await?;
    Ok(Json(DocumentResponse {
        success: true,
        message: "Document saved",
        document,
    }))
}

use axum::{
    extract::{Multipart, Path, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Redirect, Response},
    Form, Json,
};
use futures::{StreamExt, TryStreamExt};
use std::{io, sync::Mutex};
use tracing::info;

use crate::{
    adapters::inbound::http::{
        dto::{DeleteBlobForm, ErrorResponseDto, ListBlobsResponseDto},
        error::PageError,
        router::AppState,
        views,
    },
    domain::{
        errors::{GalleryError, ValidationError},
        models::extract_object_name,
        value_objects::BlobName,
    },
};

/// Resolve what the delete form posted into a bare blob name
///
/// The gallery page posts the blob URL, so anything that looks like a URL goes
/// through the same extraction the listing is the inverse of.
pub fn resolve_blob_name(input: &str) -> Result<BlobName, ValidationError> {
    let input = input.trim();
    if input.contains("://") {
        extract_object_name(input)
    } else {
        BlobName::try_from(input)
    }
}

/// Render the gallery page
pub async fn index(State(app_state): State<AppState>) -> Result<Html<String>, PageError> {
    let blobs = app_state.gallery_service.list().await?;
    Ok(Html(views::render_gallery(&blobs)))
}

/// Handle blob listing as JSON
pub async fn list_blobs(
    State(app_state): State<AppState>,
) -> Result<Json<ListBlobsResponseDto>, (StatusCode, Json<ErrorResponseDto>)> {
    let blobs = app_state.gallery_service.list().await.map_err(|e| {
        let status_code = StatusCode::from(&e);
        (status_code, Json(ErrorResponseDto::from_gallery_error(&e)))
    })?;

    Ok(Json(ListBlobsResponseDto::from(blobs)))
}

/// Handle upload of every file part in the multipart body
///
/// Files are stored one at a time; the first failure ends the request and is
/// reported, files stored before it stay stored. A body the multipart layer
/// rejects (malformed, over the size limit) keeps the status it was rejected
/// with.
pub async fn upload(
    State(app_state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Redirect, PageError> {
    let gallery_service = &app_state.gallery_service;
    let mut uploaded = 0usize;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| PageError::from(&e))?
    {
        // Plain form fields carry no file name; browsers send an empty
        // file part when nothing was picked.
        let file_name = match field.file_name() {
            Some(file_name) if !file_name.is_empty() => file_name.to_string(),
            _ => continue,
        };

        let rejected: Mutex<Option<PageError>> = Mutex::new(None);
        let content = field
            .map_err(|e| {
                let err = io::Error::new(io::ErrorKind::Other, e.body_text());
                if let Ok(mut slot) = rejected.lock() {
                    slot.get_or_insert_with(|| PageError::from(&e));
                }
                err
            })
            .boxed();

        let result = gallery_service.upload(&file_name, content).await;
        if let Err(err) = result {
            let body_error = rejected.lock().ok().and_then(|mut slot| slot.take());
            return Err(body_error.unwrap_or(PageError::Gallery(err)));
        }
        uploaded += 1;
    }

    info!(uploaded, "Upload request finished");
    Ok(Redirect::to("/"))
}

/// Handle deletion of one blob, addressed by URL or bare name
pub async fn delete_blob(
    State(app_state): State<AppState>,
    Form(form): Form<DeleteBlobForm>,
) -> Result<Redirect, PageError> {
    let name = resolve_blob_name(&form.name).map_err(GalleryError::from)?;

    app_state.gallery_service.delete_one(&name).await?;
    Ok(Redirect::to("/"))
}

/// Handle deletion of every blob in the container
pub async fn delete_all(State(app_state): State<AppState>) -> Result<Redirect, PageError> {
    app_state.gallery_service.delete_all().await?;
    Ok(Redirect::to("/"))
}

/// Serve blob bytes for backends hosted by this server
pub async fn get_blob(
    State(app_state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Response, PageError> {
    let name = BlobName::try_from(name.as_str()).map_err(GalleryError::from)?;
    let content = app_state.gallery_service.open_blob(&name).await?;

    Ok(([(header::CONTENT_TYPE, content.content_type)], content.data).into_response())
}

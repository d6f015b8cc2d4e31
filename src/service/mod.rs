//service/mod.rs
pub mod fallback;
pub mod listing_service;
pub mod request_context;

use actix_web::error::{ErrorBadRequest, ErrorInternalServerError, ErrorPayloadTooLarge};
use actix_web::http::Method;
use actix_web::{web, Error, HttpRequest, HttpResponse};
use bytes::BytesMut;
use futures::StreamExt;
use log::{debug, error, info, warn};

use crate::app_state::AppState;
use crate::gateway::auth::authorize;
use crate::origin::OriginRequest;
use crate::render::{render_index, render_not_found};
use crate::service::fallback::FallbackDecision;
use crate::service::request_context::PathContext;
use crate::storage::BucketError;

const HTML_CONTENT_TYPE: &str = "text/html; charset=utf-8";

async fn check_authorization(req: &HttpRequest, app_state: &AppState) -> Result<bool, Error> {
    authorize(req, &app_state.credentials).await.map_err(|e| {
        error!("Authorization could not be checked: {}", e);
        ErrorInternalServerError("Internal Server Error")
    })
}

fn not_authorized() -> HttpResponse {
    HttpResponse::Unauthorized().body("Not authorized.")
}

fn write_context(req: &HttpRequest) -> Result<PathContext, Error> {
    PathContext::for_write(req).map_err(|e| {
        warn!("Rejecting write: {}", e);
        ErrorBadRequest(e.to_string())
    })
}

fn bucket_write_error(key: &str, e: BucketError) -> Error {
    match e {
        BucketError::InvalidKey(reason) => {
            warn!("Invalid key {}: {}", key, reason);
            ErrorBadRequest(format!("Invalid key: {}", reason))
        }
        other => {
            error!("Bucket write for key {} failed: {}", key, other);
            ErrorInternalServerError("Internal Server Error")
        }
    }
}

/// Authenticated upload of the request body to the bucket
pub async fn put_service(mut payload: web::Payload, req: HttpRequest, app_state: web::Data<AppState>) -> Result<HttpResponse, Error> {
    if !check_authorization(&req, &app_state).await? {
        return Ok(not_authorized());
    }

    let context = write_context(&req)?;
    debug!("PUT service called for key: {}", context.object_key);

    let limit = app_state.config.server.max_payload_size;
    let mut bytes = BytesMut::new();
    while let Some(chunk) = payload.next().await {
        let chunk = chunk.map_err(|e| {
            warn!("Error reading payload chunk: {}", e);
            ErrorBadRequest("Error reading payload")
        })?;
        if (bytes.len() + chunk.len()) as u64 > limit {
            warn!("Payload for key {} exceeds {} bytes", context.object_key, limit);
            return Err(ErrorPayloadTooLarge("Payload too large"));
        }
        bytes.extend_from_slice(&chunk);
    }

    if bytes.is_empty() {
        warn!("No body provided for key: {}", context.object_key);
        return Ok(HttpResponse::BadRequest().body("No body provided."));
    }

    let size = bytes.len();
    app_state
        .bucket
        .put(&context.object_key, bytes.freeze())
        .await
        .map_err(|e| bucket_write_error(&context.object_key, e))?;

    info!("Stored {} bytes at key: {}", size, context.object_key);
    Ok(HttpResponse::Ok().body("Upload successful."))
}

/// Authenticated removal of one object from the bucket
pub async fn delete_service(req: HttpRequest, app_state: web::Data<AppState>) -> Result<HttpResponse, Error> {
    if !check_authorization(&req, &app_state).await? {
        return Ok(not_authorized());
    }

    let context = write_context(&req)?;
    debug!("DELETE service called for key: {}", context.object_key);

    app_state
        .bucket
        .delete(&context.object_key)
        .await
        .map_err(|e| bucket_write_error(&context.object_key, e))?;

    info!("Deleted key: {}", context.object_key);
    Ok(HttpResponse::Ok().body("Delete successful."))
}

/// GET and HEAD: ask the origin first, fall back to a synthesized listing
pub async fn read_service(req: HttpRequest, app_state: web::Data<AppState>) -> Result<HttpResponse, Error> {
    let is_head = req.method() == Method::HEAD;

    let origin_request = OriginRequest::from_http_request(&req);
    let origin_response = app_state.origin.fetch(&origin_request).await.map_err(|e| {
        error!("Origin fetch for {} failed: {}", origin_request.path_and_query, e);
        ErrorInternalServerError("Internal Server Error")
    })?;

    if app_state.fallback.decide(&origin_response) == FallbackDecision::ReturnOrigin {
        debug!("Returning origin response with status {}", origin_response.status);
        return Ok(origin_response.into_http_response());
    }

    let listing_config = &app_state.config.listing;
    let context = PathContext::for_read(&req, listing_config.decode_path).map_err(|e| {
        warn!("Rejecting read: {}", e);
        ErrorBadRequest(e.to_string())
    })?;
    debug!("Synthesizing listing for prefix: '{}'", context.object_key);

    let listing = app_state
        .listing_service
        .list_directory(&context.object_key, &listing_config.delimiter)
        .await
        .map_err(|e| {
            error!("Listing for prefix '{}' failed: {}", context.object_key, e);
            ErrorInternalServerError("Internal Server Error")
        })?;

    if listing.is_empty() {
        info!("Nothing found under prefix '{}'", context.object_key);
        let body = if is_head { String::new() } else { render_not_found(&context.hostname) };
        return Ok(HttpResponse::NotFound().content_type(HTML_CONTENT_TYPE).body(body));
    }

    // A zero-byte object standing in for the folder itself is not a child
    let files: Vec<_> = listing
        .objects
        .into_iter()
        .filter(|o| o.key != context.object_key)
        .collect();
    let folders: Vec<_> = listing
        .common_prefixes
        .into_iter()
        .filter(|p| *p != context.object_key)
        .collect();

    info!(
        "Rendering index for '{}': {} folders, {} files",
        context.display_path(),
        folders.len(),
        files.len()
    );
    if is_head {
        return Ok(HttpResponse::Ok().content_type(HTML_CONTENT_TYPE).finish());
    }
    let html = render_index(&files, &folders, &context.display_path(), &app_state.descriptions);
    Ok(HttpResponse::Ok().content_type(HTML_CONTENT_TYPE).body(html))
}

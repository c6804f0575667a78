//! HTTP request handlers for the integrity monitor
//!
//! Challenge issuance is open; hashing and listing require a signed
//! challenge bound to the caller's session cookie.

use actix_web::cookie::{Cookie, SameSite};
use actix_web::{web, HttpRequest, HttpResponse, Responder};
use common::crypto::demo_key_pair;
use common::security::ChallengeResponse;
use common::{FileTreeRequest, HashFilesRequest, MonitorError, Result};
use log::{error, info};
use serde_json::json;
use uuid::Uuid;
use super::AppState;

pub const SESSION_COOKIE: &str = "integrity_session";

fn session_id(req: &HttpRequest) -> Option<String> {
    req.cookie(SESSION_COOKIE).map(|c| c.value().to_string())
}

/// Issues a challenge for the caller's session, creating the session if
/// the request did not carry one.
pub async fn issue_challenge(req: HttpRequest, state: web::Data<AppState>) -> impl Responder {
    let (session, is_new) = match session_id(&req) {
        Some(id) => (id, false),
        None => (Uuid::new_v4().to_string(), true),
    };

    let challenge = state.gate.store().issue(&session);
    info!("Issued challenge for session {}", session);

    let mut response = HttpResponse::Ok();
    if is_new {
        response.cookie(
            Cookie::build(SESSION_COOKIE, session)
                .path("/")
                .http_only(true)
                .same_site(SameSite::Strict)
                .finish(),
        );
    }
    response.json(ChallengeResponse { challenge: challenge.value })
}

pub async fn hash_files(
    req: HttpRequest,
    state: web::Data<AppState>,
    body: web::Json<HashFilesRequest>,
) -> Result<HttpResponse> {
    let request = body.into_inner();
    state.gate.authorize(session_id(&req).as_deref(), &request.challenge, &request.signature)?;

    info!("Hashing {} named file(s)", request.files.len());
    let engine = state.engine.clone();
    let records = web::block(move || engine.hash_named(&request.files))
        .await
        .map_err(|e| {
            error!("Hashing task failed: {}", e);
            MonitorError::InternalError(e.to_string())
        })?;

    Ok(HttpResponse::Ok().json(records))
}

pub async fn file_tree(
    req: HttpRequest,
    state: web::Data<AppState>,
    body: web::Json<FileTreeRequest>,
) -> Result<HttpResponse> {
    let request = body.into_inner();
    state.gate.authorize(session_id(&req).as_deref(), &request.challenge, &request.signature)?;

    info!("Listing files matching {:?}", request.search_pattern);
    let engine = state.engine.clone();
    let pattern = request.search_pattern;
    let records = web::block(move || engine.list_and_hash(&pattern))
        .await
        .map_err(|e| {
            error!("Listing task failed: {}", e);
            MonitorError::InternalError(e.to_string())
        })?;

    Ok(HttpResponse::Ok().json(records))
}

/// Diagnostic key pair; only served when explicitly enabled.
pub async fn demo_keys(state: web::Data<AppState>) -> Result<HttpResponse> {
    if !state.enable_demo_keys {
        return Ok(HttpResponse::NotFound().finish());
    }

    let pair = demo_key_pair()?;
    info!("Generated demo key pair (self-test {})", if pair.self_test_verified { "passed" } else { "failed" });
    Ok(HttpResponse::Ok().json(pair))
}

pub async fn get_status(state: web::Data<AppState>) -> impl Responder {
    HttpResponse::Ok().json(json!({
        "status": "ok",
        "timestamp": chrono::Utc::now().timestamp(),
        "codeSigning": state.engine.code_signing_enabled(),
    }))
}

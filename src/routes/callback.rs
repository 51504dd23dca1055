use actix_web::{web, HttpResponse, Responder};
use std::sync::Arc;
use validator::Validate;
use crate::core::DialogueRouter;
use crate::models::{CallbackEvent, ErrorResponse, HealthResponse};
use crate::services::ProfileGateway;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub router: DialogueRouter,
    pub profiles: Arc<dyn ProfileGateway>,
    pub confirmation_token: String,
    pub secret: Option<String>,
}

/// Configure the Callback API and health routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg
        .route("/health", web::get().to(health_check))
        .route("/callback", web::post().to(callback));
}

/// Health check endpoint
async fn health_check(state: web::Data<AppState>) -> impl Responder {
    let storage_healthy = state.profiles.health_check().await;

    let status = if storage_healthy { "healthy" } else { "degraded" };

    HttpResponse::Ok().json(HealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        active_sessions: state.router.sessions().len(),
        timestamp: chrono::Utc::now(),
    })
}

/// VK Callback API endpoint
///
/// POST /api/v1/callback
///
/// VK expects the plain text `ok` quickly, so messages are queued per user
/// and handled after the event is acknowledged.
async fn callback(
    state: web::Data<AppState>,
    event: web::Json<CallbackEvent>,
) -> impl Responder {
    if let Err(errors) = event.validate() {
        tracing::info!("Validation failed for callback event: {:?}", errors);
        return HttpResponse::BadRequest().json(ErrorResponse {
            error: "Validation failed".to_string(),
            message: errors.to_string(),
            status_code: 400,
        });
    }

    if let Some(expected) = &state.secret {
        if event.secret.as_deref() != Some(expected.as_str()) {
            tracing::warn!("Rejected callback event with a wrong secret (group {:?})", event.group_id);
            return HttpResponse::Forbidden().json(ErrorResponse {
                error: "Forbidden".to_string(),
                message: "Secret key does not match".to_string(),
                status_code: 403,
            });
        }
    }

    if event.event_type == "confirmation" {
        tracing::info!("Answering Callback API confirmation for group {:?}", event.group_id);
        return HttpResponse::Ok()
            .content_type("text/plain")
            .body(state.confirmation_token.clone());
    }

    match event.message() {
        Some(message) => {
            state.router.submit(message.from_id, message.text);
        }
        None => {
            tracing::debug!("Ignoring callback event of type {}", event.event_type);
        }
    }

    HttpResponse::Ok().content_type("text/plain").body("ok")
}

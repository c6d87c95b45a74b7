use crate::compose;
use crate::config::Config;
use crate::errors::AppError;
use crate::hubspot::HubSpotClient;
use crate::lead;
use crate::mailer::{self, EmailKind, Mailer, SendEmail};
use crate::models::{EmailOutcome, LeadData, LeadResponse, NormalizedLead};
use crate::rate_limit::{self, RateLimiter};
use axum::{
    extract::{ConnectInfo, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, limit::RequestBodyLimitLayer, trace::TraceLayer};

/// Shared application state injected into handlers.
pub struct AppState {
    /// Application configuration, assembled once at startup.
    pub config: Config,
    /// Client for the CRM object API.
    pub hubspot: HubSpotClient,
    /// Client for the transactional-email API.
    pub mailer: Mailer,
    /// Process-wide fixed-window request counter.
    pub rate_limiter: RateLimiter,
}

/// Builds the application router with its middleware stack.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/lead", post(submit_lead).fallback(method_not_allowed))
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                // Form payloads are small; 64 KiB is generous.
                .layer(RequestBodyLimitLayer::new(64 * 1024)),
        )
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// Health check endpoint.
pub async fn health() -> (StatusCode, Json<Value>) {
    (
        StatusCode::OK,
        Json(json!({
            "status": "healthy",
            "service": "lead-capture-api",
            "version": env!("CARGO_PKG_VERSION"),
        })),
    )
}

/// Any verb other than POST on the lead path.
async fn method_not_allowed() -> AppError {
    AppError::MethodNotAllowed
}

fn json_response<T: serde::Serialize>(status: StatusCode, body: &T) -> Response {
    (
        status,
        [(header::CACHE_CONTROL, "no-store")],
        Json(serde_json::to_value(body).unwrap_or_else(|_| json!({}))),
    )
        .into_response()
}

/// POST /api/lead
///
/// Orchestrates one submission end to end: content-type gate, validation,
/// honeypot, rate limiting, the sequential CRM calls, then best-effort email
/// dispatch. CRM failures abort with a generic 500; email failures only
/// surface as warnings in the success body.
pub async fn submit_lead(
    State(state): State<Arc<AppState>>,
    connect_info: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
    body: String,
) -> Result<Response, AppError> {
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");
    if !content_type.to_lowercase().contains("application/json") {
        return Err(AppError::Validation(
            "Content-Type inválido. Usa application/json.".to_string(),
        ));
    }

    let raw: Value = serde_json::from_str(&body).map_err(|_| {
        AppError::Validation("Payload inválido. Se esperaba un objeto JSON.".to_string())
    })?;

    let submission = lead::validate(&raw)?;

    // Honeypot field: respond as accepted to avoid signaling bots, without
    // touching the CRM or email systems.
    if submission.website.is_some() {
        tracing::info!("Honeypot triggered; dropping submission silently");
        return Ok(json_response(
            StatusCode::ACCEPTED,
            &LeadResponse {
                ok: true,
                message: "Solicitud recibida.".to_string(),
                data: LeadData {
                    contact_id: "hidden".to_string(),
                    company_id: None,
                    deal_id: "hidden".to_string(),
                },
                email: EmailOutcome::none(),
            },
        ));
    }

    let client_key = rate_limit::client_key(&headers, connect_info.map(|ci| ci.0.ip()));
    if state
        .rate_limiter
        .check_and_record(&client_key, Utc::now().timestamp_millis())
    {
        tracing::warn!("Rate limit exceeded for {}", client_key);
        return Err(AppError::RateLimited);
    }

    let normalized = lead::normalize(&submission);
    tracing::info!("Processing lead from '{}'", normalized.nombre);

    // Sequential CRM calls: each id feeds the next step. Any failure aborts
    // the request before email dispatch.
    let contact_id = state.hubspot.upsert_contact(&normalized).await?;
    let company_id = state
        .hubspot
        .upsert_company(normalized.empresa.as_deref())
        .await?;
    let deal_id = state
        .hubspot
        .create_deal(
            &normalized,
            &state.config.hubspot_pipeline_id,
            &state.config.hubspot_stage_id,
        )
        .await?;

    state
        .hubspot
        .associate("deals", &deal_id, "contacts", &contact_id)
        .await?;
    if let Some(ref company) = company_id {
        state
            .hubspot
            .associate("deals", &deal_id, "companies", company)
            .await?;
        state
            .hubspot
            .associate("contacts", &contact_id, "companies", company)
            .await?;
    }

    let email = dispatch_emails(
        &state,
        &normalized,
        &contact_id,
        company_id.as_deref(),
        &deal_id,
    )
    .await;

    Ok(json_response(
        StatusCode::OK,
        &LeadResponse {
            ok: true,
            message: "Lead creado correctamente.".to_string(),
            data: LeadData {
                contact_id,
                company_id,
                deal_id,
            },
            email,
        },
    ))
}

/// Attempts the internal alert and, when the lead left an address, the user
/// confirmation. Each channel is caught independently; a failure appends a
/// warning and flips its own flag, never failing the request.
async fn dispatch_emails(
    state: &AppState,
    lead: &NormalizedLead,
    contact_id: &str,
    company_id: Option<&str>,
    deal_id: &str,
) -> EmailOutcome {
    let config = &state.config;
    let mut internal_sent = false;
    let mut user_sent = false;
    let mut warnings: Vec<String> = Vec::new();

    let content = compose::internal_email(lead, contact_id, company_id, deal_id, config);
    let internal = SendEmail {
        to: config.notify_email.clone().unwrap_or_default(),
        subject: content.subject,
        html: content.html,
        text: content.text,
        from: config.from_email.clone().unwrap_or_default(),
        reply_to: config.reply_to_email.clone(),
        idempotency_key: Some(mailer::idempotency_key(
            EmailKind::Internal,
            Some(deal_id),
            lead,
        )),
    };
    match state.mailer.send(&internal).await {
        Ok(()) => internal_sent = true,
        Err(e) => {
            tracing::warn!("Internal notification email failed: {}", e);
            warnings.push("No se pudo enviar la notificación interna.".to_string());
        }
    }

    if let Some(ref user_address) = lead.email {
        let content = compose::confirmation_email(lead, config);
        let confirmation = SendEmail {
            to: user_address.clone(),
            subject: content.subject,
            html: content.html,
            text: content.text,
            from: config.from_email.clone().unwrap_or_default(),
            reply_to: config.reply_to_email.clone(),
            idempotency_key: Some(mailer::idempotency_key(EmailKind::User, Some(deal_id), lead)),
        };
        match state.mailer.send(&confirmation).await {
            Ok(()) => user_sent = true,
            Err(e) => {
                tracing::warn!("User confirmation email failed: {}", e);
                warnings.push("No se pudo enviar la confirmación al usuario.".to_string());
            }
        }
    }

    EmailOutcome {
        internal_sent,
        user_sent,
        warning: if warnings.is_empty() {
            None
        } else {
            Some(warnings.join(" "))
        },
    }
}

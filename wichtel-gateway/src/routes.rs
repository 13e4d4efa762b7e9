//! Axum route handlers for the Wichtel gateway API.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use wichtel_core::{EventId, Participant};
use wichtel_mail::{EventSession, MailBackend};

use crate::{config::GatewayConfig, error::GatewayError, pool::EventPool, verify::HumanVerifier};

// ── Shared state ─────────────────────────────────────────────────────────────

/// Everything a handler needs: the event pool, bot protection and settings.
pub struct AppState<B> {
    pub pool: Arc<EventPool<B>>,
    pub verifier: Arc<dyn HumanVerifier>,
    pub config: Arc<GatewayConfig>,
}

impl<B> Clone for AppState<B> {
    fn clone(&self) -> Self {
        Self {
            pool: Arc::clone(&self.pool),
            verifier: Arc::clone(&self.verifier),
            config: Arc::clone(&self.config),
        }
    }
}

impl<B: MailBackend> AppState<B> {
    fn session(&self, id: EventId) -> Result<Arc<EventSession<B>>, GatewayError> {
        self.pool.get(id).ok_or(GatewayError::EventNotFound(id))
    }
}

// ── Request / response types ──────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct CreateEventResponse {
    pub id: EventId,
}

#[derive(Debug, Deserialize)]
pub struct AddParticipantBody {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub captcha_token: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct AssignBody {
    #[serde(default)]
    pub captcha_token: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct TestMailBody {
    #[serde(default)]
    pub recipient: Option<String>,
}

/// Public view of a participant. Email addresses are not echoed back.
#[derive(Debug, Serialize)]
pub struct ParticipantView {
    pub name: String,
    pub is_admin: bool,
}

impl From<&Participant> for ParticipantView {
    fn from(p: &Participant) -> Self {
        Self { name: p.name.clone(), is_admin: p.is_admin }
    }
}

#[derive(Debug, Serialize)]
pub struct ParticipantList {
    pub participants: Vec<ParticipantView>,
    pub pending: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct ClientConfig {
    pub recaptcha_site_key: Option<String>,
    pub development: bool,
}

// ── Router ────────────────────────────────────────────────────────────────────

/// Build the application router over the given state.
pub fn create_router<B: MailBackend + 'static>(state: AppState<B>) -> Router {
    Router::new()
        .route("/v1/events", post(create_event::<B>))
        .route("/v1/events/{id}", delete(drop_event::<B>))
        .route(
            "/v1/events/{id}/participants",
            get(list_participants::<B>).post(add_participant::<B>),
        )
        .route("/v1/events/{id}/participants/{name}", delete(remove_participant::<B>))
        .route("/v1/events/{id}/assignments", post(request_assignment::<B>))
        .route("/v1/events/{id}/confirm/{token}", get(confirm_assignment::<B>))
        .route("/v1/events/{id}/cancel/{token}", post(cancel_assignment::<B>))
        .route("/v1/events/{id}/reset", post(reset_event::<B>))
        .route("/v1/config", get(client_config::<B>))
        .route("/v1/mail/status", get(mail_status::<B>))
        .route("/v1/mail/test", post(send_test_mail::<B>))
        .route("/health", get(health))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

// ── Handlers ──────────────────────────────────────────────────────────────────

/// `GET /health` — liveness probe.
pub async fn health() -> impl IntoResponse {
    (StatusCode::OK, Json(serde_json::json!({"status": "ok"})))
}

/// `POST /v1/events` — open a new gift exchange and return its ID.
pub async fn create_event<B: MailBackend + 'static>(State(state): State<AppState<B>>) -> impl IntoResponse {
    let id = state.pool.create().id();
    tracing::info!(event = %id, "event created");
    (StatusCode::CREATED, Json(CreateEventResponse { id }))
}

/// `DELETE /v1/events/{id}` — drop an event and everything in it.
///
/// # Errors
/// Returns [`GatewayError::EventNotFound`] if the ID is not registered.
pub async fn drop_event<B: MailBackend + 'static>(
    State(state): State<AppState<B>>,
    Path(id): Path<EventId>,
) -> Result<impl IntoResponse, GatewayError> {
    if !state.pool.remove(id) {
        return Err(GatewayError::EventNotFound(id));
    }
    Ok(StatusCode::NO_CONTENT)
}

/// `GET /v1/events/{id}/participants`
///
/// # Errors
/// Returns [`GatewayError::EventNotFound`] if the ID is not registered.
pub async fn list_participants<B: MailBackend + 'static>(
    State(state): State<AppState<B>>,
    Path(id): Path<EventId>,
) -> Result<impl IntoResponse, GatewayError> {
    let session = state.session(id)?;
    let participants = session.participants().await.iter().map(ParticipantView::from).collect();
    Ok(Json(ParticipantList {
        participants,
        pending: session.is_pending().await,
        created_at: session.created_at(),
    }))
}

/// `POST /v1/events/{id}/participants` — register a participant.
///
/// # Errors
/// Validation, duplicate, pending-batch and bot-protection failures.
pub async fn add_participant<B: MailBackend + 'static>(
    State(state): State<AppState<B>>,
    Path(id): Path<EventId>,
    Json(body): Json<AddParticipantBody>,
) -> Result<impl IntoResponse, GatewayError> {
    let session = state.session(id)?;
    let check = state.verifier.verify(body.captcha_token.as_deref()).await;
    let participant = session.add_participant(&body.name, &body.email, check).await?;
    Ok((StatusCode::CREATED, Json(ParticipantView::from(&participant))))
}

/// `DELETE /v1/events/{id}/participants/{name}`
///
/// # Errors
/// Unknown event or participant, the admin, or a pending batch.
pub async fn remove_participant<B: MailBackend + 'static>(
    State(state): State<AppState<B>>,
    Path((id, name)): Path<(EventId, String)>,
) -> Result<impl IntoResponse, GatewayError> {
    state.session(id)?.remove_participant(&name).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// `POST /v1/events/{id}/assignments` — generate a pending batch and mail
/// the confirmation link to the admin.
///
/// The body is optional; when present it may carry `captcha_token`. If the
/// link cannot be mailed the batch is cancelled so the event is not stuck.
///
/// # Errors
/// Too few participants, an existing pending batch, bot protection, or a
/// mail failure.
pub async fn request_assignment<B: MailBackend + 'static>(
    State(state): State<AppState<B>>,
    Path(id): Path<EventId>,
    body: Bytes,
) -> Result<impl IntoResponse, GatewayError> {
    let body: AssignBody = parse_optional_json(&body)?;
    let session = state.session(id)?;
    let check = state.verifier.verify(body.captcha_token.as_deref()).await;
    let token = session.request_assignment(check).await?;

    let confirm_url = format!("{}/v1/events/{id}/confirm/{}", state.config.public_url, token.expose());
    if let Err(e) = session.send_confirmation_request(&token, &confirm_url).await {
        if let Err(cancel_err) = session.cancel_assignment(token.expose()).await {
            tracing::warn!(event = %id, error = %cancel_err, "could not discard unmailed batch");
        }
        return Err(e.into());
    }

    Ok((
        StatusCode::ACCEPTED,
        Json(serde_json::json!({
            "status": "pending",
            "message": "confirmation link sent to the event organizer",
        })),
    ))
}

/// `GET /v1/events/{id}/confirm/{token}` — dispatch the pending batch.
///
/// # Errors
/// Returns 404 for an unknown event or an invalid, used or cancelled token.
pub async fn confirm_assignment<B: MailBackend + 'static>(
    State(state): State<AppState<B>>,
    Path((id, token)): Path<(EventId, String)>,
) -> Result<impl IntoResponse, GatewayError> {
    let report = state.session(id)?.confirm_assignment(&token).await?;
    Ok(Json(report))
}

/// `POST /v1/events/{id}/cancel/{token}` — discard the pending batch.
///
/// # Errors
/// Returns 404 for an unknown event or token.
pub async fn cancel_assignment<B: MailBackend + 'static>(
    State(state): State<AppState<B>>,
    Path((id, token)): Path<(EventId, String)>,
) -> Result<impl IntoResponse, GatewayError> {
    state.session(id)?.cancel_assignment(&token).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// `POST /v1/events/{id}/reset` — clear participants and pending batches.
///
/// # Errors
/// Returns [`GatewayError::EventNotFound`] if the ID is not registered.
pub async fn reset_event<B: MailBackend + 'static>(
    State(state): State<AppState<B>>,
    Path(id): Path<EventId>,
) -> Result<impl IntoResponse, GatewayError> {
    state.session(id)?.reset().await;
    Ok(StatusCode::NO_CONTENT)
}

/// `GET /v1/config` — settings a browser client needs.
pub async fn client_config<B: MailBackend + 'static>(State(state): State<AppState<B>>) -> impl IntoResponse {
    Json(ClientConfig {
        recaptcha_site_key: state.config.recaptcha_site_key.clone(),
        development: state.config.development,
    })
}

/// `GET /v1/mail/status` — mail backend diagnostics.
pub async fn mail_status<B: MailBackend + 'static>(State(state): State<AppState<B>>) -> impl IntoResponse {
    Json(state.pool.sender().backend().status().await)
}

/// `POST /v1/mail/test` — send a diagnostic message (development only).
///
/// # Errors
/// Returns [`GatewayError::DevelopmentOnly`] outside development mode, or
/// the mail error if delivery fails.
pub async fn send_test_mail<B: MailBackend + 'static>(
    State(state): State<AppState<B>>,
    body: Bytes,
) -> Result<impl IntoResponse, GatewayError> {
    if !state.config.development {
        return Err(GatewayError::DevelopmentOnly);
    }
    let body: TestMailBody = parse_optional_json(&body)?;
    let recipient = body.recipient.unwrap_or_else(|| "test@example.com".to_owned());
    let status = state.pool.sender().send_test_message(&recipient).await?;
    tracing::info!(recipient = %recipient, service = %status.service, "test mail sent");
    Ok(Json(serde_json::json!({"sent": true, "recipient": recipient, "status": status})))
}

// ── Helpers ───────────────────────────────────────────────────────────────────

fn parse_optional_json<T: Default + for<'de> Deserialize<'de>>(body: &[u8]) -> Result<T, GatewayError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(T::default());
    }
    serde_json::from_slice(body).map_err(|e| GatewayError::InvalidRequest(format!("malformed JSON body: {e}")))
}

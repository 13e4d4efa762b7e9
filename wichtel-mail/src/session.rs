//! Per-event state machine tying the registry, the pending store and the
//! batch sender together.
//!
//! ```text
//! NONE ──request──▶ PENDING ──confirm──▶ CONFIRMED ─┐
//!                      │                            ├─▶ NONE
//!                      └────cancel────▶ CANCELLED ──┘
//! ```
//!
//! State lives behind one async mutex. Mail is sent after the guard is
//! dropped, so a slow backend never blocks other requests for the event.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use wichtel_core::{
    generate, ConfirmationToken, CoreError, EventId, HumanCheck, Participant, ParticipantRegistry,
    PendingStore,
};

use crate::backend::MailBackend;
use crate::sender::{BatchSender, DispatchReport};
use crate::SessionError;

#[derive(Debug, Default)]
struct EventState {
    registry: ParticipantRegistry,
    pending: PendingStore,
}

/// One gift exchange: its participants and at most one pending batch.
///
/// All operations are safe to call concurrently.
#[derive(Debug)]
pub struct EventSession<B> {
    id: EventId,
    created_at: DateTime<Utc>,
    state: Mutex<EventState>,
    sender: BatchSender<B>,
}

impl<B: MailBackend> EventSession<B> {
    /// Create an empty event that mails through `sender`.
    #[must_use]
    pub fn new(id: EventId, sender: BatchSender<B>) -> Self {
        Self { id, created_at: Utc::now(), state: Mutex::new(EventState::default()), sender }
    }

    /// Create an empty event with a fresh id over `backend`.
    #[must_use]
    pub fn with_backend(backend: Arc<B>) -> Self {
        Self::new(EventId::new(), BatchSender::new(backend))
    }

    /// Event identifier.
    #[must_use]
    pub fn id(&self) -> EventId {
        self.id
    }

    /// When the event was created.
    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Register a participant. The first one becomes the admin.
    ///
    /// # Errors
    /// - [`CoreError::HumanVerificationFailed`] if `check` is rejected.
    /// - [`CoreError::BatchAlreadyPending`] while a batch awaits confirmation.
    /// - Validation and duplicate errors from [`ParticipantRegistry::add`].
    pub async fn add_participant(
        &self,
        name: &str,
        email: &str,
        check: HumanCheck,
    ) -> Result<Participant, SessionError> {
        check.require()?;
        let mut state = self.state.lock().await;
        if state.pending.is_pending() {
            return Err(CoreError::BatchAlreadyPending.into());
        }
        let participant = state.registry.add(name, email)?;
        tracing::info!(
            event = %self.id,
            admin = participant.is_admin,
            participants = state.registry.len(),
            "participant added"
        );
        Ok(participant)
    }

    /// Remove a non-admin participant.
    ///
    /// # Errors
    /// - [`CoreError::BatchAlreadyPending`] while a batch awaits confirmation.
    /// - [`CoreError::ParticipantNotFound`] or [`CoreError::AdminProtected`].
    pub async fn remove_participant(&self, name: &str) -> Result<(), SessionError> {
        let mut state = self.state.lock().await;
        if state.pending.is_pending() {
            return Err(CoreError::BatchAlreadyPending.into());
        }
        state.registry.remove(name)?;
        tracing::info!(event = %self.id, participants = state.registry.len(), "participant removed");
        Ok(())
    }

    /// Snapshot of the participants in registration order.
    pub async fn participants(&self) -> Vec<Participant> {
        self.state.lock().await.registry.to_vec()
    }

    /// Whether a batch awaits confirmation.
    pub async fn is_pending(&self) -> bool {
        self.state.lock().await.pending.is_pending()
    }

    /// Generate assignments and hold them under a fresh one-time token.
    ///
    /// Nothing is mailed; see [`EventSession::send_confirmation_request`].
    ///
    /// # Errors
    /// - [`CoreError::HumanVerificationFailed`] if `check` is rejected.
    /// - [`CoreError::InsufficientParticipants`] for fewer than two participants.
    /// - [`CoreError::BatchAlreadyPending`] if a batch is already waiting.
    /// - [`CoreError::AssignmentGeneration`] if the shuffle bound is exhausted.
    pub async fn request_assignment(&self, check: HumanCheck) -> Result<ConfirmationToken, SessionError> {
        check.require()?;
        let mut state = self.state.lock().await;
        if state.pending.is_pending() {
            return Err(CoreError::BatchAlreadyPending.into());
        }
        let assignments = generate(&state.registry.to_vec())?;
        let count = assignments.len();
        let token = state.pending.create_pending(assignments)?;
        tracing::info!(
            event = %self.id,
            participants = count,
            token = %token.fingerprint(),
            "assignment batch pending confirmation"
        );
        Ok(token)
    }

    /// Mail the admin the link that confirms the batch held under `token`.
    ///
    /// # Errors
    /// - [`CoreError::TokenNotFound`] if `token` is not pending.
    /// - [`CoreError::ParticipantNotFound`] if the event has no admin.
    /// - Any [`crate::MailError`] from delivery.
    pub async fn send_confirmation_request(
        &self,
        token: &ConfirmationToken,
        confirm_url: &str,
    ) -> Result<(), SessionError> {
        let admin = {
            let state = self.state.lock().await;
            let batch = state.pending.get(token).ok_or(CoreError::TokenNotFound)?;
            batch
                .assignments
                .iter()
                .map(|a| &a.giver)
                .find(|p| p.is_admin)
                .cloned()
                .ok_or_else(|| CoreError::ParticipantNotFound { name: "admin".to_owned() })?
        };
        self.sender.send_confirmation_request(&admin, confirm_url).await?;
        tracing::info!(event = %self.id, token = %token.fingerprint(), "confirmation link sent");
        Ok(())
    }

    /// Consume the batch held under `raw_token` and notify every giver.
    ///
    /// The batch is taken and the registry cleared before any mail is sent,
    /// so the token works exactly once even under concurrent calls.
    ///
    /// # Errors
    /// Returns [`CoreError::TokenNotFound`] for a malformed, unknown, already
    /// confirmed or cancelled token. Delivery failures are reported in the
    /// [`DispatchReport`], not as errors.
    pub async fn confirm_assignment(&self, raw_token: &str) -> Result<DispatchReport, SessionError> {
        let token = ConfirmationToken::parse(raw_token)?;
        let batch = {
            let mut state = self.state.lock().await;
            let batch = state.pending.take(&token).ok_or(CoreError::TokenNotFound)?;
            state.registry.clear();
            state.pending.clear();
            batch
        };
        tracing::info!(
            event = %self.id,
            token = %token.fingerprint(),
            participants = batch.assignments.len(),
            "assignment batch confirmed"
        );

        let creator = batch.assignments.iter().map(|a| &a.giver).find(|p| p.is_admin);
        Ok(self.sender.send_assignments(&batch.assignments, creator).await)
    }

    /// Discard the batch held under `raw_token`. Participants are kept.
    ///
    /// # Errors
    /// Returns [`CoreError::TokenNotFound`] if no such batch is pending.
    pub async fn cancel_assignment(&self, raw_token: &str) -> Result<(), SessionError> {
        let token = ConfirmationToken::parse(raw_token)?;
        self.state.lock().await.pending.cancel(&token)?;
        tracing::info!(event = %self.id, token = %token.fingerprint(), "assignment batch cancelled");
        Ok(())
    }

    /// Drop all participants and any pending batch.
    pub async fn reset(&self) {
        let mut state = self.state.lock().await;
        state.registry.clear();
        state.pending.clear();
        tracing::info!(event = %self.id, "event reset");
    }
}

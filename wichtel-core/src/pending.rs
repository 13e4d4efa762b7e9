//! Pending assignment batches awaiting organizer confirmation.
//!
//! The store is a plain map from token to batch with explicit removal on
//! consumption. It is not synchronised; the owning session serialises access.

use std::collections::HashMap;

use chrono::{DateTime, Utc};

use crate::assignment::Assignment;
use crate::error::CoreError;
use crate::token::ConfirmationToken;

/// A generated but unconfirmed set of assignments.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub struct PendingBatch {
    /// The one-time token that confirms or cancels this batch.
    pub token: ConfirmationToken,
    /// The derangement awaiting dispatch.
    pub assignments: Vec<Assignment>,
    /// When the batch was generated.
    pub created_at: DateTime<Utc>,
}

/// Token-keyed storage of pending batches with a single-flight policy.
#[derive(Debug, Default)]
pub struct PendingStore {
    batches: HashMap<ConfirmationToken, PendingBatch>,
}

impl PendingStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `assignments` under a freshly generated token.
    ///
    /// # Errors
    /// Returns [`CoreError::BatchAlreadyPending`] if a batch is already
    /// waiting; the existing batch is kept.
    pub fn create_pending(
        &mut self,
        assignments: Vec<Assignment>,
    ) -> Result<ConfirmationToken, CoreError> {
        if self.is_pending() {
            return Err(CoreError::BatchAlreadyPending);
        }
        let token = ConfirmationToken::generate();
        let batch = PendingBatch { token: token.clone(), assignments, created_at: Utc::now() };
        self.batches.insert(token.clone(), batch);
        Ok(token)
    }

    /// Remove and return the batch for `token`. A token can be taken once.
    pub fn take(&mut self, token: &ConfirmationToken) -> Option<PendingBatch> {
        self.batches.remove(token)
    }

    /// Borrow the batch for `token` without consuming it.
    #[must_use]
    pub fn get(&self, token: &ConfirmationToken) -> Option<&PendingBatch> {
        self.batches.get(token)
    }

    /// Discard the batch for `token` without dispatching it.
    ///
    /// # Errors
    /// Returns [`CoreError::TokenNotFound`] if no such batch is pending.
    pub fn cancel(&mut self, token: &ConfirmationToken) -> Result<(), CoreError> {
        self.batches.remove(token).map(|_| ()).ok_or(CoreError::TokenNotFound)
    }

    /// Whether `token` refers to a pending batch.
    #[must_use]
    pub fn contains(&self, token: &ConfirmationToken) -> bool {
        self.batches.contains_key(token)
    }

    /// Whether any batch is waiting for confirmation.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        !self.batches.is_empty()
    }

    /// Number of pending batches (zero or one under the single-flight policy).
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.batches.len()
    }

    /// Drop every pending batch.
    pub fn clear(&mut self) {
        self.batches.clear();
    }
}

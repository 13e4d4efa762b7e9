//! Batch dispatch of assignment notifications.
//!
//! Every giver is attempted exactly once, in order; a failure for one
//! recipient never aborts the rest. Each backend call is bounded by a
//! timeout and is not retried.

use std::sync::Arc;
use std::time::Duration;

use chrono::Local;
use serde::Serialize;
use wichtel_core::{Assignment, EmailMessage, Participant};

use crate::backend::{MailBackend, MailStatus};
use crate::config::DEFAULT_SEND_TIMEOUT;
use crate::templates;
use crate::MailError;

/// One recipient that could not be notified.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeliveryFailure {
    /// Recipient email address.
    pub recipient: String,
    /// Backend error text.
    pub reason: String,
}

/// Outcome of dispatching a confirmed batch.
///
/// `sent` and `failed` count giver notifications only; the organizer
/// summary is reported separately in `creator_notified`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DispatchReport {
    /// Givers successfully notified.
    pub sent: usize,
    /// Givers that could not be notified.
    pub failed: usize,
    /// Per-recipient failure details.
    pub failures: Vec<DeliveryFailure>,
    /// Whether the organizer summary was delivered.
    pub creator_notified: bool,
}

impl DispatchReport {
    /// Whether every giver and the organizer were notified.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.failed == 0 && self.creator_notified
    }
}

/// Sends templated messages through a shared backend.
#[derive(Debug)]
pub struct BatchSender<B> {
    backend: Arc<B>,
    timeout: Duration,
}

impl<B> Clone for BatchSender<B> {
    fn clone(&self) -> Self {
        Self { backend: Arc::clone(&self.backend), timeout: self.timeout }
    }
}

impl<B: MailBackend> BatchSender<B> {
    /// Create a sender with [`DEFAULT_SEND_TIMEOUT`].
    #[must_use]
    pub fn new(backend: Arc<B>) -> Self {
        Self::with_timeout(backend, DEFAULT_SEND_TIMEOUT)
    }

    /// Create a sender with a custom per-message timeout.
    #[must_use]
    pub fn with_timeout(backend: Arc<B>, timeout: Duration) -> Self {
        Self { backend, timeout }
    }

    /// The underlying backend.
    #[must_use]
    pub fn backend(&self) -> &Arc<B> {
        &self.backend
    }

    /// Send one message within the configured timeout.
    ///
    /// # Errors
    /// Returns [`MailError::Timeout`] if the backend does not finish in
    /// time, or the backend's own error.
    pub async fn deliver(&self, message: &EmailMessage) -> Result<(), MailError> {
        tokio::time::timeout(self.timeout, self.backend.send_email(message))
            .await
            .map_err(|_| MailError::Timeout(self.timeout))?
    }

    /// Notify every giver of their receiver, then send the organizer a
    /// summary of who was notified.
    ///
    /// With `creator = None` no summary is sent.
    pub async fn send_assignments(
        &self,
        assignments: &[Assignment],
        creator: Option<&Participant>,
    ) -> DispatchReport {
        let mut report = DispatchReport::default();
        let mut notified = Vec::with_capacity(assignments.len());
        let mut unreachable = Vec::new();

        for assignment in assignments {
            let message = templates::assignment_notice(&assignment.giver, &assignment.receiver);
            match self.deliver(&message).await {
                Ok(()) => {
                    report.sent += 1;
                    notified.push(assignment.giver.name.as_str());
                }
                Err(e) => {
                    tracing::warn!(recipient = %assignment.giver.email, error = %e, "assignment notification failed");
                    report.failed += 1;
                    unreachable.push(assignment.giver.name.as_str());
                    report.failures.push(DeliveryFailure {
                        recipient: assignment.giver.email.clone(),
                        reason: e.to_string(),
                    });
                }
            }
        }

        if let Some(creator) = creator {
            let summary = templates::creator_summary(creator, &notified, &unreachable);
            match self.deliver(&summary).await {
                Ok(()) => report.creator_notified = true,
                Err(e) => {
                    tracing::warn!(recipient = %creator.email, error = %e, "organizer summary failed");
                }
            }
        }

        tracing::info!(
            sent = report.sent,
            failed = report.failed,
            creator_notified = report.creator_notified,
            "assignment dispatch finished"
        );
        report
    }

    /// Mail `creator` the one-time confirmation link.
    ///
    /// # Errors
    /// See [`BatchSender::deliver`].
    pub async fn send_confirmation_request(
        &self,
        creator: &Participant,
        confirm_url: &str,
    ) -> Result<(), MailError> {
        self.deliver(&templates::confirmation_request(creator, confirm_url)).await
    }

    /// Send a diagnostic message describing the backend to `recipient`.
    ///
    /// # Errors
    /// See [`BatchSender::deliver`].
    pub async fn send_test_message(&self, recipient: &str) -> Result<MailStatus, MailError> {
        let status = self.backend.status().await;
        self.deliver(&templates::test_message(recipient, &status, Local::now())).await?;
        Ok(status)
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;
    use crate::testing::RecordingBackend;

    fn people(n: usize) -> Vec<Participant> {
        (0..n)
            .map(|i| match Participant::new(&format!("Person {i}"), &format!("p{i}@example.com"), i == 0) {
                Ok(p) => p,
                Err(e) => panic!("fixture invalid: {e}"),
            })
            .collect()
    }

    fn ring(people: &[Participant]) -> Vec<Assignment> {
        people
            .iter()
            .enumerate()
            .map(|(i, p)| Assignment::new(p.clone(), people[(i + 1) % people.len()].clone()))
            .collect()
    }

    #[tokio::test]
    async fn second_failure_does_not_stop_the_batch() {
        let backend = Arc::new(RecordingBackend::new().failing_call(2));
        let sender = BatchSender::new(Arc::clone(&backend));
        let group = people(3);

        let report = sender.send_assignments(&ring(&group), None).await;

        assert_eq!(report.sent, 2);
        assert_eq!(report.failed, 1);
        assert_eq!(backend.attempts(), 3, "every giver must be attempted");
        assert_eq!(report.failures[0].recipient, "p1@example.com");
        assert!(!report.creator_notified);
    }

    #[tokio::test]
    async fn each_giver_learns_only_their_receiver() {
        let backend = Arc::new(RecordingBackend::new());
        let sender = BatchSender::new(Arc::clone(&backend));
        let group = people(3);

        let report = sender.send_assignments(&ring(&group), Some(&group[0])).await;
        assert!(report.is_complete());

        let sent = backend.sent();
        assert_eq!(sent.len(), 4, "three notices plus one summary");
        for (message, assignment) in sent.iter().zip(ring(&group)) {
            assert_eq!(message.recipients(), [assignment.giver.email.clone()]);
            assert!(message.body().contains(&assignment.receiver.name));
        }
        let summary = &sent[3];
        assert_eq!(summary.recipients(), ["p0@example.com".to_owned()]);
        assert!(!summary.body().contains("Secret Santa for"));
    }

    #[tokio::test]
    async fn summary_failure_is_reported_separately() {
        let backend = Arc::new(RecordingBackend::new().failing_call(3));
        let sender = BatchSender::new(Arc::clone(&backend));
        let group = people(2);

        let report = sender.send_assignments(&ring(&group), Some(&group[0])).await;
        assert_eq!(report.sent, 2);
        assert_eq!(report.failed, 0);
        assert!(!report.creator_notified);
        assert!(!report.is_complete());
    }

    #[tokio::test]
    async fn slow_backend_times_out() {
        let backend = Arc::new(RecordingBackend::new().with_delay(Duration::from_millis(200)));
        let sender = BatchSender::with_timeout(backend, Duration::from_millis(10));
        let message = EmailMessage::to("a@example.com", "s", "b");
        assert!(matches!(sender.deliver(&message).await, Err(MailError::Timeout(_))));
    }

    #[tokio::test]
    async fn test_message_goes_to_recipient() {
        let backend = Arc::new(RecordingBackend::new());
        let sender = BatchSender::new(Arc::clone(&backend));
        let status = match sender.send_test_message("test@example.com").await {
            Ok(s) => s,
            Err(e) => panic!("unexpected error: {e}"),
        };
        assert!(status.available);
        assert_eq!(backend.sent()[0].recipients(), ["test@example.com".to_owned()]);
    }

    proptest! {
        #[test]
        fn counts_add_up_for_any_failing_recipient(n in 2usize..12, bad in 0usize..12) {
            let rt = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
                Ok(rt) => rt,
                Err(e) => panic!("runtime build failed: {e}"),
            };
            let group = people(n);
            let backend = Arc::new(RecordingBackend::new().failing_recipient(format!("p{bad}@example.com")));
            let sender = BatchSender::new(Arc::clone(&backend));

            let report = rt.block_on(sender.send_assignments(&ring(&group), None));

            prop_assert_eq!(report.sent + report.failed, n);
            prop_assert_eq!(report.failed, usize::from(bad < n));
            prop_assert_eq!(report.failures.len(), report.failed);
            prop_assert_eq!(backend.attempts(), n);
        }
    }
}

/// Errors produced by the `wichtel-core` crate.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum CoreError {
    /// A participant field failed validation (empty name, malformed email).
    #[error("invalid {field}: {reason}")]
    Validation { field: &'static str, reason: String },

    /// A participant with the same name or email is already registered.
    #[error("a participant with the {field} '{value}' was already added")]
    DuplicateParticipant { field: &'static str, value: String },

    /// No participant with the given name is registered.
    #[error("participant '{name}' not found")]
    ParticipantNotFound { name: String },

    /// The event creator cannot be removed from their own event.
    #[error("cannot remove the admin participant '{name}'")]
    AdminProtected { name: String },

    /// Fewer than two participants; no derangement exists.
    #[error("need at least {required} participants to assign gift partners, got {actual}")]
    InsufficientParticipants { required: usize, actual: usize },

    /// The shuffle retry bound was exhausted without finding a derangement.
    #[error("no valid assignment found after {attempts} shuffle attempts")]
    AssignmentGeneration { attempts: u32 },

    /// A pending batch already awaits confirmation.
    #[error("an assignment is already awaiting confirmation")]
    BatchAlreadyPending,

    /// The confirmation token is unknown, malformed, or already consumed.
    #[error("invalid or expired confirmation link")]
    TokenNotFound,

    /// The bot-protection gate rejected the request.
    #[error("human verification failed")]
    HumanVerificationFailed,
}

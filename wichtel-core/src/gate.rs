use crate::error::CoreError;

/// Outcome of the bot-protection check performed by the boundary layer.
///
/// Verification itself (captcha scoring and the like) happens outside this
/// crate; operations that accept public input only see the verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HumanCheck {
    /// The request passed bot protection, or protection is disabled.
    Verified,
    /// The request failed bot protection.
    Rejected,
}

impl HumanCheck {
    /// Fail with [`CoreError::HumanVerificationFailed`] unless verified.
    ///
    /// # Errors
    /// Returns [`CoreError::HumanVerificationFailed`] for [`HumanCheck::Rejected`].
    pub fn require(self) -> Result<(), CoreError> {
        match self {
            Self::Verified => Ok(()),
            Self::Rejected => Err(CoreError::HumanVerificationFailed),
        }
    }
}

impl From<bool> for HumanCheck {
    fn from(verified: bool) -> Self {
        if verified {
            Self::Verified
        } else {
            Self::Rejected
        }
    }
}

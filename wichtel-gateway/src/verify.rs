//! Bot-protection seam for public endpoints.
//!
//! Handlers turn the client's captcha token into a [`HumanCheck`] verdict
//! before calling into the session. The gateway never scores tokens itself:
//! that is left to a fronting proxy, so the built-in verifier accepts every
//! request.

use async_trait::async_trait;
use wichtel_core::HumanCheck;

use crate::config::GatewayConfig;

/// Decide whether a request comes from a human.
#[async_trait]
pub trait HumanVerifier: Send + Sync {
    /// Judge the client-supplied token.
    async fn verify(&self, token: Option<&str>) -> HumanCheck;
}

/// Accepts every request.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoVerification;

#[async_trait]
impl HumanVerifier for NoVerification {
    async fn verify(&self, _token: Option<&str>) -> HumanCheck {
        HumanCheck::Verified
    }
}

/// Choose a verifier from the gateway settings.
#[must_use]
pub fn verifier_for(config: &GatewayConfig) -> Box<dyn HumanVerifier> {
    if config.recaptcha_site_key.is_some() {
        tracing::info!("captcha tokens are not scored here; verification is delegated to a fronting proxy");
    } else {
        tracing::info!("bot protection disabled; no site key configured");
    }
    Box::new(NoVerification)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn disabled_verifier_accepts_missing_token() {
        let verifier = verifier_for(&GatewayConfig::default());
        assert_eq!(verifier.verify(None).await, HumanCheck::Verified);
    }

    #[tokio::test]
    async fn site_key_does_not_enable_local_scoring() {
        let config = GatewayConfig { recaptcha_site_key: Some("site-key".to_owned()), ..GatewayConfig::default() };
        let verifier = verifier_for(&config);
        assert_eq!(verifier.verify(None).await, HumanCheck::Verified);
        assert_eq!(verifier.verify(Some("i-am-a-bot")).await, HumanCheck::Verified);
    }
}

//! SMTP relay backend for production delivery.

use std::time::Duration;

use async_trait::async_trait;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Tokio1Executor};
use wichtel_core::EmailMessage;

use crate::backend::{MailBackend, MailStatus, ServiceKind};
use crate::config::SmtpConfig;
use crate::envelope::{build_message, parse_mailbox};
use crate::MailError;

/// Real SMTP relay backend.
///
/// Implicit TLS when `use_ssl` is set, STARTTLS when `use_tls` is set,
/// plain otherwise.
pub struct SmtpBackend {
    config: SmtpConfig,
    server: String,
    sender: Mailbox,
    transport: AsyncSmtpTransport<Tokio1Executor>,
}

impl std::fmt::Debug for SmtpBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmtpBackend").field("config", &self.config).finish_non_exhaustive()
    }
}

impl SmtpBackend {
    /// Build a relay transport from `config`.
    ///
    /// # Errors
    /// Returns [`MailError::Configuration`] if no server is set, or if TLS or
    /// SSL is enabled without both username and password.
    /// Returns [`MailError::InvalidAddress`] for a bad default sender.
    pub fn new(config: SmtpConfig, timeout: Duration) -> Result<Self, MailError> {
        let server = config
            .server
            .clone()
            .ok_or_else(|| MailError::Configuration("MAIL_SERVER is required for SMTP delivery".to_owned()))?;

        let encrypted = config.use_ssl || config.use_tls;
        let credentials = match (&config.username, &config.password) {
            (Some(user), Some(pass)) => Some(Credentials::new(user.clone(), pass.clone())),
            _ if encrypted => {
                return Err(MailError::Configuration(
                    "MAIL_USERNAME and MAIL_PASSWORD are required when TLS or SSL is enabled".to_owned(),
                ));
            }
            _ => None,
        };

        let sender = parse_mailbox(&config.default_sender)?;

        let builder = if config.use_ssl {
            AsyncSmtpTransport::<Tokio1Executor>::relay(&server)
        } else if config.use_tls {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&server)
        } else {
            Ok(AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&server))
        }
        .map_err(|e| MailError::Configuration(format!("TLS setup for {server}: {e}")))?;

        let mut builder = builder.port(config.port).timeout(Some(timeout));
        if let Some(credentials) = credentials {
            builder = builder.credentials(credentials);
        }

        Ok(Self { transport: builder.build(), server, sender, config })
    }

    fn endpoint(&self) -> String {
        format!("{}:{}", self.server, self.config.port)
    }
}

#[async_trait]
impl MailBackend for SmtpBackend {
    async fn send_email(&self, message: &EmailMessage) -> Result<(), MailError> {
        let email = build_message(&self.sender, message)?;
        self.transport
            .send(email)
            .await
            .map_err(|e| MailError::Connection(format!("{}: {e}", self.endpoint())))?;
        Ok(())
    }

    async fn is_available(&self) -> bool {
        match self.transport.test_connection().await {
            Ok(ok) => ok,
            Err(e) => {
                tracing::debug!(endpoint = %self.endpoint(), "SMTP probe failed: {e}");
                false
            }
        }
    }

    async fn status(&self) -> MailStatus {
        let available = self.is_available().await;
        let status_message = if available {
            format!("connected to {}", self.endpoint())
        } else {
            format!("cannot reach {}", self.endpoint())
        };
        MailStatus {
            service: "SMTP".to_owned(),
            kind: ServiceKind::Production,
            available,
            endpoint: self.endpoint(),
            default_sender: self.config.default_sender.clone(),
            requires_auth: self.config.username.is_some(),
            tls: self.config.use_tls || self.config.use_ssl,
            status_message,
            web_ui: None,
            server_version: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> SmtpConfig {
        SmtpConfig {
            server: Some("smtp.example.com".to_owned()),
            username: Some("santa".to_owned()),
            password: Some("hohoho".to_owned()),
            ..SmtpConfig::default()
        }
    }

    #[test]
    fn missing_server_is_configuration_error() {
        let cfg = SmtpConfig { server: None, ..config() };
        let result = SmtpBackend::new(cfg, Duration::from_secs(1));
        assert!(matches!(result, Err(MailError::Configuration(ref m)) if m.contains("MAIL_SERVER")));
    }

    #[test]
    fn tls_without_credentials_is_configuration_error() {
        let cfg = SmtpConfig { password: None, ..config() };
        assert!(matches!(
            SmtpBackend::new(cfg, Duration::from_secs(1)),
            Err(MailError::Configuration(_))
        ));
    }

    #[test]
    fn plain_relay_without_credentials_is_allowed() {
        let cfg = SmtpConfig {
            use_tls: false,
            use_ssl: false,
            username: None,
            password: None,
            ..config()
        };
        assert!(SmtpBackend::new(cfg, Duration::from_secs(1)).is_ok());
    }

    #[tokio::test]
    async fn starttls_relay_builds_and_reports_production_status() {
        let cfg = SmtpConfig { server: Some("127.0.0.1".to_owned()), port: 1, ..config() };
        let backend = match SmtpBackend::new(cfg, Duration::from_millis(200)) {
            Ok(b) => b,
            Err(e) => panic!("unexpected error: {e}"),
        };
        let status = backend.status().await;
        assert_eq!(status.kind, ServiceKind::Production);
        assert!(!status.available);
        assert!(status.tls);
        assert!(status.requires_auth);
        assert_eq!(status.endpoint, "127.0.0.1:1");
        assert!(status.web_ui.is_none());
    }

    #[test]
    fn debug_does_not_leak_password() {
        let backend = match SmtpBackend::new(config(), Duration::from_secs(1)) {
            Ok(b) => b,
            Err(e) => panic!("unexpected error: {e}"),
        };
        assert!(!format!("{backend:?}").contains("hohoho"));
    }
}

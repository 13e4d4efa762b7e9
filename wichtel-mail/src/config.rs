//! Mail backend configuration read from the process environment.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::MailError;

/// Default per-message delivery bound.
pub const DEFAULT_SEND_TIMEOUT: Duration = Duration::from_secs(30);

/// Which mail backend to construct.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// Local capture server; messages never reach real inboxes.
    Capture,
    /// Real SMTP relay.
    Smtp,
}

impl FromStr for BackendKind {
    type Err = MailError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "capture" | "mailpit" => Ok(Self::Capture),
            "smtp" => Ok(Self::Smtp),
            other => Err(MailError::Configuration(format!(
                "unknown mail backend '{other}'; expected 'capture' or 'smtp'"
            ))),
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Capture => f.write_str("capture"),
            Self::Smtp => f.write_str("smtp"),
        }
    }
}

/// Settings for the local capture server (Mailpit-compatible).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[non_exhaustive]
pub struct CaptureConfig {
    /// Host the capture server listens on.
    pub host: String,
    /// SMTP port of the capture server.
    pub smtp_port: u16,
    /// Web UI / API port of the capture server.
    pub web_port: u16,
    /// Path or bare name of the capture server binary.
    pub binary_path: PathBuf,
    /// Envelope sender for captured mail.
    pub default_sender: String,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_owned(),
            smtp_port: 1025,
            web_port: 8025,
            binary_path: PathBuf::from("mailpit"),
            default_sender: "noreply@localhost".to_owned(),
        }
    }
}

/// Settings for a real SMTP relay.
#[derive(Clone, Serialize, Deserialize)]
#[non_exhaustive]
pub struct SmtpConfig {
    /// Relay hostname; required.
    pub server: Option<String>,
    /// Relay port.
    pub port: u16,
    /// Upgrade the connection with STARTTLS.
    pub use_tls: bool,
    /// Connect with implicit TLS (SMTPS).
    pub use_ssl: bool,
    /// Login name; required when TLS or SSL is enabled.
    pub username: Option<String>,
    /// Login password; required when TLS or SSL is enabled.
    pub password: Option<String>,
    /// Envelope sender.
    pub default_sender: String,
}

impl Default for SmtpConfig {
    fn default() -> Self {
        Self {
            server: None,
            port: 587,
            use_tls: true,
            use_ssl: false,
            username: None,
            password: None,
            default_sender: "noreply@localhost".to_owned(),
        }
    }
}

impl fmt::Debug for SmtpConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SmtpConfig")
            .field("server", &self.server)
            .field("port", &self.port)
            .field("use_tls", &self.use_tls)
            .field("use_ssl", &self.use_ssl)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("default_sender", &self.default_sender)
            .finish()
    }
}

/// Everything the backend factory needs.
#[derive(Debug, Clone, Default)]
#[non_exhaustive]
pub struct MailSettings {
    /// Development mode: prefer the capture backend.
    pub development: bool,
    /// Explicit backend choice that overrides the development flag.
    pub force: Option<BackendKind>,
    /// Capture backend settings.
    pub capture: CaptureConfig,
    /// SMTP backend settings.
    pub smtp: SmtpConfig,
    /// Per-message delivery bound.
    pub send_timeout: Duration,
}

impl MailSettings {
    /// Read settings from the process environment.
    ///
    /// # Errors
    /// Returns [`MailError::Configuration`] if a numeric or enum variable
    /// cannot be parsed, or if `MAIL_TIMEOUT_SECS` is zero.
    pub fn from_env() -> Result<Self, MailError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read settings through `lookup`, which maps a variable name to its value.
    ///
    /// | Variable | Default |
    /// |----------|---------|
    /// | `WICHTEL_ENV` (`development`) / `USE_MAILPIT` | off |
    /// | `MAIL_BACKEND` (`capture`, `mailpit`, `smtp`) | unset |
    /// | `MAILPIT_HOST` / `MAILPIT_PORT` / `MAILPIT_WEB_PORT` | `localhost` / 1025 / 8025 |
    /// | `MAILPIT_BINARY` | `mailpit` |
    /// | `MAIL_SERVER` / `MAIL_PORT` | unset / 587 |
    /// | `MAIL_USE_TLS` / `MAIL_USE_SSL` | true / false |
    /// | `MAIL_USERNAME` / `MAIL_PASSWORD` | unset |
    /// | `MAIL_DEFAULT_SENDER` | `noreply@localhost` |
    /// | `MAIL_TIMEOUT_SECS` | 30 |
    ///
    /// # Errors
    /// See [`MailSettings::from_env`].
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, MailError> {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_owned()).filter(|v| !v.is_empty());

        let development = get("WICHTEL_ENV").is_some_and(|v| v.eq_ignore_ascii_case("development"))
            || get("USE_MAILPIT").is_some_and(|v| is_truthy(&v));
        let force = get("MAIL_BACKEND").map(|v| v.parse()).transpose()?;

        let capture_defaults = CaptureConfig::default();
        let smtp_defaults = SmtpConfig::default();
        let default_sender =
            get("MAIL_DEFAULT_SENDER").unwrap_or_else(|| capture_defaults.default_sender.clone());

        let capture = CaptureConfig {
            host: get("MAILPIT_HOST").unwrap_or(capture_defaults.host),
            smtp_port: parse_or("MAILPIT_PORT", get("MAILPIT_PORT"), capture_defaults.smtp_port)?,
            web_port: parse_or("MAILPIT_WEB_PORT", get("MAILPIT_WEB_PORT"), capture_defaults.web_port)?,
            binary_path: get("MAILPIT_BINARY").map_or(capture_defaults.binary_path, PathBuf::from),
            default_sender: default_sender.clone(),
        };

        let smtp = SmtpConfig {
            server: get("MAIL_SERVER"),
            port: parse_or("MAIL_PORT", get("MAIL_PORT"), smtp_defaults.port)?,
            use_tls: get("MAIL_USE_TLS").map_or(smtp_defaults.use_tls, |v| is_truthy(&v)),
            use_ssl: get("MAIL_USE_SSL").map_or(smtp_defaults.use_ssl, |v| is_truthy(&v)),
            username: get("MAIL_USERNAME"),
            password: get("MAIL_PASSWORD"),
            default_sender,
        };

        let timeout_secs =
            parse_or("MAIL_TIMEOUT_SECS", get("MAIL_TIMEOUT_SECS"), DEFAULT_SEND_TIMEOUT.as_secs())?;
        if timeout_secs == 0 {
            return Err(MailError::Configuration("MAIL_TIMEOUT_SECS must be at least 1".to_owned()));
        }

        Ok(Self {
            development,
            force,
            capture,
            smtp,
            send_timeout: Duration::from_secs(timeout_secs),
        })
    }
}

/// `true`, `1`, `on` and `yes` (any case) are truthy.
#[must_use]
pub fn is_truthy(value: &str) -> bool {
    matches!(value.trim().to_ascii_lowercase().as_str(), "true" | "1" | "on" | "yes")
}

fn parse_or<T: FromStr>(key: &str, raw: Option<String>, default: T) -> Result<T, MailError>
where
    T::Err: fmt::Display,
{
    match raw {
        None => Ok(default),
        Some(v) => v
            .parse()
            .map_err(|e| MailError::Configuration(format!("{key}='{v}' is invalid: {e}"))),
    }
}

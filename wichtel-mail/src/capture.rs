//! Local capture server backend (Mailpit-compatible).
//!
//! Mail is handed to the capture server over plain SMTP and can be inspected
//! in its web UI. Nothing reaches real inboxes.

use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use lettre::message::Mailbox;
use lettre::{AsyncSmtpTransport, AsyncTransport, Tokio1Executor};
use tokio::net::TcpStream;
use tokio::process::{Child, Command};
use tokio::sync::Mutex;
use wichtel_core::EmailMessage;

use crate::backend::{MailBackend, MailStatus, ServiceKind};
use crate::capture_api::fetch_info;
use crate::config::CaptureConfig;
use crate::envelope::{build_message, parse_mailbox};
use crate::MailError;

/// Bound on a single TCP reachability probe.
const PROBE_TIMEOUT: Duration = Duration::from_millis(500);

/// Capture server backend.
///
/// Holds the capture server child process when this backend started it; the
/// process is killed when the backend is dropped.
pub struct CaptureBackend {
    config: CaptureConfig,
    sender: Mailbox,
    transport: AsyncSmtpTransport<Tokio1Executor>,
    timeout: Duration,
    child: Mutex<Option<Child>>,
}

impl std::fmt::Debug for CaptureBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CaptureBackend")
            .field("config", &self.config)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl CaptureBackend {
    /// Create a backend for the capture server described by `config`.
    ///
    /// # Errors
    /// Returns [`MailError::InvalidAddress`] if the default sender is invalid.
    pub fn new(config: CaptureConfig, timeout: Duration) -> Result<Self, MailError> {
        let sender = parse_mailbox(&config.default_sender)?;
        let transport = AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(config.host.as_str())
            .port(config.smtp_port)
            .timeout(Some(timeout))
            .build();
        Ok(Self { config, sender, transport, timeout, child: Mutex::new(None) })
    }

    /// The configuration this backend was built from.
    #[must_use]
    pub fn config(&self) -> &CaptureConfig {
        &self.config
    }

    /// URL of the capture server's web inbox.
    #[must_use]
    pub fn web_ui_url(&self) -> String {
        format!("http://{}:{}", self.config.host, self.config.web_port)
    }

    async fn port_open(&self) -> bool {
        matches!(
            tokio::time::timeout(PROBE_TIMEOUT, TcpStream::connect((self.config.host.as_str(), self.config.smtp_port)))
                .await,
            Ok(Ok(_))
        )
    }

    /// Start the capture server unless its SMTP port is already open.
    ///
    /// # Errors
    /// Returns [`MailError::BinaryNotFound`] if the binary cannot be located
    /// and [`MailError::StartFailed`] if it does not open its port in time.
    pub async fn ensure_running(&self) -> Result<(), MailError> {
        if self.port_open().await {
            tracing::debug!(host = %self.config.host, port = self.config.smtp_port, "capture server already running");
            return Ok(());
        }

        which_binary(&self.config.binary_path)?;

        let smtp_addr = format!("{}:{}", self.config.host, self.config.smtp_port);
        let web_addr = format!("{}:{}", self.config.host, self.config.web_port);
        tracing::info!(
            binary = %self.config.binary_path.display(),
            smtp = %smtp_addr,
            web = %web_addr,
            "starting capture server"
        );

        let mut guard = self.child.lock().await;
        let child = Command::new(&self.config.binary_path)
            .arg("--smtp")
            .arg(&smtp_addr)
            .arg("--listen")
            .arg(&web_addr)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| MailError::StartFailed(format!("exec {}: {e}", self.config.binary_path.display())))?;
        *guard = Some(child);
        drop(guard);

        self.wait_for_port().await?;
        tracing::info!(web_ui = %self.web_ui_url(), "capture server started");
        Ok(())
    }

    /// Wait for the SMTP port to accept connections.
    async fn wait_for_port(&self) -> Result<(), MailError> {
        for _ in 0..50u8 {
            if self.port_open().await {
                return Ok(());
            }
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
        Err(MailError::StartFailed(format!(
            "port {}:{} did not open within 5s",
            self.config.host, self.config.smtp_port
        )))
    }
}

#[async_trait]
impl MailBackend for CaptureBackend {
    async fn send_email(&self, message: &EmailMessage) -> Result<(), MailError> {
        let email = build_message(&self.sender, message)?;
        self.transport
            .send(email)
            .await
            .map_err(|e| MailError::Connection(format!("capture server rejected message: {e}")))?;
        tracing::debug!(recipients = message.recipients().len(), "message captured");
        Ok(())
    }

    async fn is_available(&self) -> bool {
        self.port_open().await
    }

    async fn status(&self) -> MailStatus {
        let available = self.port_open().await;
        let server_version = if available {
            fetch_info(&self.config.host, self.config.web_port, self.timeout)
                .await
                .map_err(|e| tracing::debug!("capture info unavailable: {e}"))
                .ok()
                .map(|info| info.version)
        } else {
            None
        };
        let status_message = if available {
            format!("capture server running; view mail at {}", self.web_ui_url())
        } else {
            "capture server not reachable".to_owned()
        };

        MailStatus {
            service: "Mailpit".to_owned(),
            kind: ServiceKind::Development,
            available,
            endpoint: format!("{}:{}", self.config.host, self.config.smtp_port),
            default_sender: self.config.default_sender.clone(),
            requires_auth: false,
            tls: false,
            status_message,
            web_ui: Some(self.web_ui_url()),
            server_version,
        }
    }
}

/// Locate `path` directly or on `$PATH`.
fn which_binary(path: &Path) -> Result<(), MailError> {
    if path.is_absolute() || path.components().count() > 1 {
        if path.exists() {
            return Ok(());
        }
        return Err(MailError::BinaryNotFound { path: path.to_owned() });
    }

    let found = std::env::var_os("PATH")
        .map(|paths| std::env::split_paths(&paths).map(|dir| dir.join(path)).any(|p| p.is_file()))
        .unwrap_or(false);

    if found {
        Ok(())
    } else {
        Err(MailError::BinaryNotFound { path: path.to_owned() })
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use tokio::net::TcpListener;

    use super::*;

    async fn closed_port() -> u16 {
        let listener = match TcpListener::bind("127.0.0.1:0").await {
            Ok(l) => l,
            Err(e) => panic!("bind failed: {e}"),
        };
        match listener.local_addr() {
            Ok(addr) => addr.port(),
            Err(e) => panic!("local_addr failed: {e}"),
        }
    }

    fn backend(port: u16, binary: &str) -> CaptureBackend {
        let config = CaptureConfig {
            host: "127.0.0.1".to_owned(),
            smtp_port: port,
            web_port: port,
            binary_path: PathBuf::from(binary),
            ..CaptureConfig::default()
        };
        match CaptureBackend::new(config, Duration::from_secs(2)) {
            Ok(b) => b,
            Err(e) => panic!("unexpected error: {e}"),
        }
    }

    #[tokio::test]
    async fn closed_port_reports_unavailable() {
        let backend = backend(closed_port().await, "/nonexistent/mailpit");
        assert!(!backend.is_available().await);

        let status = backend.status().await;
        assert!(!status.available);
        assert_eq!(status.kind, ServiceKind::Development);
        assert_eq!(status.service, "Mailpit");
        assert!(status.server_version.is_none());
        assert!(status.web_ui.is_some());
    }

    #[tokio::test]
    async fn open_port_reports_available() {
        let listener = match TcpListener::bind("127.0.0.1:0").await {
            Ok(l) => l,
            Err(e) => panic!("bind failed: {e}"),
        };
        let port = match listener.local_addr() {
            Ok(addr) => addr.port(),
            Err(e) => panic!("local_addr failed: {e}"),
        };
        let backend = backend(port, "/nonexistent/mailpit");
        assert!(backend.is_available().await);
        assert!(backend.ensure_running().await.is_ok(), "running server must not be restarted");
    }

    #[tokio::test]
    async fn missing_binary_is_reported() {
        let backend = backend(closed_port().await, "/nonexistent/mailpit");
        let result = backend.ensure_running().await;
        assert!(matches!(result, Err(MailError::BinaryNotFound { .. })), "got {result:?}");
    }

    #[test]
    fn bare_name_missing_from_path_is_not_found() {
        let result = which_binary(Path::new("wichtel-definitely-not-installed"));
        assert!(matches!(result, Err(MailError::BinaryNotFound { .. })));
    }

    #[test]
    fn invalid_sender_is_rejected() {
        let config = CaptureConfig { default_sender: "nope".to_owned(), ..CaptureConfig::default() };
        assert!(matches!(
            CaptureBackend::new(config, Duration::from_secs(1)),
            Err(MailError::InvalidAddress { .. })
        ));
    }
}

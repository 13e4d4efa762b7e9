//! Gateway settings read from the process environment.

/// Default bind address.
pub const DEFAULT_LISTEN_ADDR: &str = "127.0.0.1:3456";

/// HTTP-facing settings. Mail settings live in [`wichtel_mail::MailSettings`].
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Address the server binds to.
    pub listen_addr: String,
    /// Base URL used when building confirmation links, without trailing slash.
    pub public_url: String,
    /// Development mode; enables the test-mail route.
    pub development: bool,
    /// Public bot-protection key handed to clients.
    pub recaptcha_site_key: Option<String>,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            listen_addr: DEFAULT_LISTEN_ADDR.to_owned(),
            public_url: format!("http://{DEFAULT_LISTEN_ADDR}"),
            development: false,
            recaptcha_site_key: None,
        }
    }
}

impl GatewayConfig {
    /// Read settings from the process environment.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read settings through `lookup`.
    ///
    /// `WICHTEL_PUBLIC_URL` defaults to `http://` plus the listen address.
    /// The reCAPTCHA secret is never read; token scoring belongs to a
    /// fronting proxy.
    #[must_use]
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_owned()).filter(|v| !v.is_empty());

        let listen_addr = get("WICHTEL_LISTEN_ADDR").unwrap_or_else(|| DEFAULT_LISTEN_ADDR.to_owned());
        let public_url = get("WICHTEL_PUBLIC_URL")
            .unwrap_or_else(|| format!("http://{listen_addr}"))
            .trim_end_matches('/')
            .to_owned();
        let development = get("WICHTEL_ENV").is_some_and(|v| v.eq_ignore_ascii_case("development"))
            || get("USE_MAILPIT").is_some_and(|v| wichtel_mail::config::is_truthy(&v));

        Self {
            listen_addr,
            public_url,
            development,
            recaptcha_site_key: get("RECAPTCHA_SITE_KEY"),
        }
    }
}

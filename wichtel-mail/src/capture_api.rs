//! Minimal HTTP client for the capture server's web API.
//!
//! Only `GET /api/v1/info` is needed, so a single hyper http1 connection
//! over a `TcpStream` is enough.

use std::time::Duration;

use http_body_util::{BodyExt, Empty};
use hyper::body::Bytes;
use hyper::{Method, Request, Uri};
use hyper_util::rt::TokioIo;
use serde::Deserialize;
use tokio::net::TcpStream;

use crate::MailError;

/// Summary returned by the capture server's info endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[non_exhaustive]
pub struct CaptureInfo {
    /// Server version string.
    #[serde(rename = "Version", default)]
    pub version: String,
    /// Number of stored messages.
    #[serde(rename = "Messages", default)]
    pub messages: u64,
}

/// Fetch `/api/v1/info` from `host:port` within `timeout`.
///
/// # Errors
/// Returns [`MailError::ApiError`] on connection, HTTP or decoding errors and
/// [`MailError::Timeout`] if the request does not finish in time.
pub(crate) async fn fetch_info(host: &str, port: u16, timeout: Duration) -> Result<CaptureInfo, MailError> {
    let body = tokio::time::timeout(timeout, get(host, port, "/api/v1/info"))
        .await
        .map_err(|_| MailError::Timeout(timeout))??;
    serde_json::from_str(&body).map_err(|e| MailError::ApiError(format!("decode info response: {e}")))
}

async fn get(host: &str, port: u16, uri_path: &str) -> Result<String, MailError> {
    let stream = TcpStream::connect((host, port))
        .await
        .map_err(|e| MailError::ApiError(format!("connect to {host}:{port}: {e}")))?;

    let (mut sender, conn) = hyper::client::conn::http1::handshake(TokioIo::new(stream))
        .await
        .map_err(|e| MailError::ApiError(format!("HTTP handshake: {e}")))?;

    tokio::spawn(async move {
        if let Err(e) = conn.await {
            tracing::debug!("capture API connection closed: {e}");
        }
    });

    let uri: Uri = uri_path
        .parse()
        .map_err(|e| MailError::ApiError(format!("invalid URI path {uri_path}: {e}")))?;

    let req = Request::builder()
        .method(Method::GET)
        .uri(uri)
        .header("Host", format!("{host}:{port}"))
        .header("Accept", "application/json")
        .body(Empty::<Bytes>::new())
        .map_err(|e| MailError::ApiError(format!("build request: {e}")))?;

    let resp = sender
        .send_request(req)
        .await
        .map_err(|e| MailError::ApiError(format!("send request: {e}")))?;

    let status = resp.status();
    let bytes = resp
        .into_body()
        .collect()
        .await
        .map_err(|e| MailError::ApiError(format!("read response body: {e}")))?
        .to_bytes();
    let body = String::from_utf8_lossy(&bytes).into_owned();

    if !status.is_success() {
        return Err(MailError::ApiError(format!("HTTP {status} from {uri_path}: {body}")));
    }
    Ok(body)
}

#[cfg(test)]
mod tests {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    use super::*;

    /// Serve one canned HTTP response on an ephemeral port.
    async fn serve_once(status_line: &'static str, body: &'static str) -> u16 {
        let listener = match TcpListener::bind("127.0.0.1:0").await {
            Ok(l) => l,
            Err(e) => panic!("bind failed: {e}"),
        };
        let port = match listener.local_addr() {
            Ok(addr) => addr.port(),
            Err(e) => panic!("local_addr failed: {e}"),
        };
        tokio::spawn(async move {
            if let Ok((mut socket, _)) = listener.accept().await {
                let mut buf = [0u8; 1024];
                let _ = socket.read(&mut buf).await;
                let response = format!(
                    "{status_line}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                    body.len()
                );
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            }
        });
        port
    }

    #[tokio::test]
    async fn info_response_is_decoded() {
        let port = serve_once("HTTP/1.1 200 OK", r#"{"Version":"v1.21.0","Messages":3}"#).await;
        let info = match fetch_info("127.0.0.1", port, Duration::from_secs(5)).await {
            Ok(i) => i,
            Err(e) => panic!("unexpected error: {e}"),
        };
        assert_eq!(info.version, "v1.21.0");
        assert_eq!(info.messages, 3);
    }

    #[tokio::test]
    async fn non_success_status_is_api_error() {
        let port = serve_once("HTTP/1.1 500 Internal Server Error", r#"{"error":"boom"}"#).await;
        let result = fetch_info("127.0.0.1", port, Duration::from_secs(5)).await;
        assert!(matches!(result, Err(MailError::ApiError(ref msg)) if msg.contains("500")), "got {result:?}");
    }

    #[tokio::test]
    async fn closed_port_is_api_error() {
        let port = {
            let listener = match TcpListener::bind("127.0.0.1:0").await {
                Ok(l) => l,
                Err(e) => panic!("bind failed: {e}"),
            };
            match listener.local_addr() {
                Ok(addr) => addr.port(),
                Err(e) => panic!("local_addr failed: {e}"),
            }
        };
        let result = fetch_info("127.0.0.1", port, Duration::from_secs(5)).await;
        assert!(matches!(result, Err(MailError::ApiError(_))), "got {result:?}");
    }
}

//! Where calendar documents come from.
//!
//! The reconciler only needs "give me the current calendar as text", so the
//! HTTP transport sits behind [`CalendarSource`].

use std::future::Future;
use std::time::Duration;

use crate::error::{CalNoteError, CalNoteResult};

/// Sent with every request; some calendar hosts refuse clients without one.
const USER_AGENT: &str = "Mozilla/5.0";

/// Default bound on a single fetch.
pub const FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// Produces the raw text of the remote calendar.
pub trait CalendarSource: Send + Sync + 'static {
    fn fetch(&self) -> impl Future<Output = CalNoteResult<String>> + Send;
}

/// Fetches a calendar over HTTP(S).
#[derive(Clone, Debug)]
pub struct HttpSource {
    client: reqwest::Client,
    url: String,
}

impl HttpSource {
    pub fn new(url: &str, timeout: Duration) -> CalNoteResult<Self> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| CalNoteError::Fetch(format!("Could not build HTTP client: {e}")))?;

        Ok(HttpSource {
            client,
            url: normalize_url(url),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl CalendarSource for HttpSource {
    async fn fetch(&self) -> CalNoteResult<String> {
        tracing::debug!(url = %self.url, "Fetching calendar");

        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| CalNoteError::Fetch(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(CalNoteError::Fetch(format!(
                "{} returned HTTP {}",
                self.url, status
            )));
        }

        response
            .text()
            .await
            .map_err(|e| CalNoteError::Fetch(format!("Could not read response body: {e}")))
    }
}

/// Rewrite `webcal://` / `webcals://` subscription links to `https://`.
pub fn normalize_url(url: &str) -> String {
    let url = url.trim();
    for scheme in ["webcals://", "webcal://"] {
        if url
            .get(..scheme.len())
            .is_some_and(|prefix| prefix.eq_ignore_ascii_case(scheme))
        {
            return format!("https://{}", &url[scheme.len()..]);
        }
    }
    url.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Serve one canned HTTP response on a local port and return its URL.
    async fn serve_once(status_line: &'static str, body: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 4096];
            let _ = socket.read(&mut buf).await;
            let response = format!(
                "{status_line}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.ok();
        });
        format!("http://{addr}/calendar.ics")
    }

    #[test]
    fn test_normalize_webcal() {
        assert_eq!(
            normalize_url("webcal://example.com/cal.ics"),
            "https://example.com/cal.ics"
        );
    }

    #[test]
    fn test_normalize_webcals_and_case() {
        assert_eq!(
            normalize_url("WEBCALS://example.com/cal.ics"),
            "https://example.com/cal.ics"
        );
        assert_eq!(
            normalize_url("Webcal://example.com/cal.ics"),
            "https://example.com/cal.ics"
        );
    }

    #[test]
    fn test_normalize_leaves_http_alone() {
        assert_eq!(
            normalize_url("http://localhost:8080/cal.ics"),
            "http://localhost:8080/cal.ics"
        );
        assert_eq!(
            normalize_url(" https://example.com/cal.ics "),
            "https://example.com/cal.ics"
        );
    }

    #[test]
    fn test_http_source_normalizes_on_construction() {
        let source = HttpSource::new("webcal://example.com/cal.ics", FETCH_TIMEOUT).unwrap();
        assert_eq!(source.url(), "https://example.com/cal.ics");
    }

    #[tokio::test]
    async fn test_fetch_returns_body_on_success() {
        let url = serve_once("HTTP/1.1 200 OK", "BEGIN:VCALENDAR\r\nEND:VCALENDAR\r\n").await;
        let source = HttpSource::new(&url, FETCH_TIMEOUT).unwrap();
        let body = source.fetch().await.unwrap();
        assert!(body.starts_with("BEGIN:VCALENDAR"));
    }

    #[tokio::test]
    async fn test_fetch_non_success_status_is_fetch_error() {
        let url = serve_once("HTTP/1.1 503 Service Unavailable", "down").await;
        let source = HttpSource::new(&url, FETCH_TIMEOUT).unwrap();
        assert!(matches!(source.fetch().await, Err(CalNoteError::Fetch(_))));
    }

    #[tokio::test]
    async fn test_fetch_unreachable_host_is_fetch_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let source = HttpSource::new(&format!("http://{addr}/cal.ics"), Duration::from_secs(2)).unwrap();
        assert!(matches!(source.fetch().await, Err(CalNoteError::Fetch(_))));
    }
}

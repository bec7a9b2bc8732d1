use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use http::StatusCode;
use http::header::HeaderValue;
use hyper_util::rt::TokioExecutor;
use octocrab::service::middleware::base_uri::BaseUriLayer;
use octocrab::service::middleware::extra_headers::ExtraHeadersLayer;

use super::events::{Event, decode_events};
use super::{FetchError, Username};

const USER_AGENT: &str = "github-activity-cli";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

pub struct Client {
    octocrab: octocrab::Octocrab,
    api_base: url::Url,
    timeout: Duration,
}

impl Client {
    pub fn new(host: &str) -> anyhow::Result<Self> {
        Self::with_api_base(&api_base_url(host), REQUEST_TIMEOUT)
    }

    pub(crate) fn with_api_base(api_base: &str, timeout: Duration) -> anyhow::Result<Self> {
        let api_base = url::Url::parse(api_base)
            .with_context(|| format!("invalid API base URL `{api_base}`"))?;
        if api_base.cannot_be_a_base() {
            anyhow::bail!("invalid API base URL `{api_base}`");
        }
        let octocrab = build_github_client(&api_base)?;
        Ok(Self {
            octocrab,
            api_base,
            timeout,
        })
    }

    /// Issues a single GET for the user's public events. Nothing is retried.
    pub async fn fetch_events(&self, username: &Username) -> Result<Vec<Event>, FetchError> {
        let url = events_url(&self.api_base, username);
        tracing::debug!(%url, "fetching public events");

        tokio::time::timeout(self.timeout, self.get_events(&url, username))
            .await
            .map_err(|_| {
                FetchError::Network(format!("request timed out after {:?}", self.timeout))
            })?
    }

    async fn get_events(
        &self,
        url: &url::Url,
        username: &Username,
    ) -> Result<Vec<Event>, FetchError> {
        let response = self
            .octocrab
            ._get(url.as_str())
            .await
            .map_err(|e| FetchError::Network(format!("failed to fetch data: {e}")))?;

        let status = response.status();
        tracing::debug!(status = status.as_u16(), "received response");
        check_status(status, username)
            .inspect_err(|err| tracing::debug!(%err, "request failed"))?;

        let body = self
            .octocrab
            .body_to_string(response)
            .await
            .map_err(|e| FetchError::Network(format!("failed to read response: {e}")))?;

        let events = decode_events(&body)?;
        tracing::debug!(count = events.len(), "decoded events");
        Ok(events)
    }
}

/// Assembles the octocrab service stack by hand: the default builder always
/// sends its own `user-agent: octocrab` and retries server errors.
fn build_github_client(api_base: &url::Url) -> anyhow::Result<octocrab::Octocrab> {
    let base_uri: http::Uri = api_base
        .origin()
        .ascii_serialization()
        .parse()
        .context("failed to set base URI")?;
    let connector = hyper_rustls::HttpsConnectorBuilder::new()
        .with_native_roots()
        .context("failed to load native TLS roots")?
        .https_or_http()
        .enable_http1()
        .build();
    let client = hyper_util::client::legacy::Client::builder(TokioExecutor::new()).build(connector);
    let headers = vec![(http::header::USER_AGENT, HeaderValue::from_static(USER_AGENT))];

    let octocrab = octocrab::OctocrabBuilder::new_empty()
        .with_service(client)
        .with_layer(&BaseUriLayer::new(base_uri))
        .with_layer(&ExtraHeadersLayer::new(Arc::new(headers)))
        .with_auth(octocrab::AuthState::None)
        .build()?;
    Ok(octocrab)
}

fn api_base_url(host: &str) -> String {
    if host.eq_ignore_ascii_case("github.com") {
        "https://api.github.com".to_string()
    } else {
        format!("https://{host}/api/v3")
    }
}

fn events_url(api_base: &url::Url, username: &Username) -> url::Url {
    let mut url = api_base.clone();
    url.path_segments_mut()
        .expect("API base URL is checked in Client::with_api_base")
        .pop_if_empty()
        .extend(["users", username.as_str(), "events"]);
    url
}

fn check_status(status: StatusCode, username: &Username) -> Result<(), FetchError> {
    match status {
        StatusCode::OK => Ok(()),
        StatusCode::NOT_FOUND => Err(FetchError::UserNotFound(username.to_string())),
        StatusCode::FORBIDDEN => Err(FetchError::RateLimited),
        other => Err(FetchError::UnexpectedStatus(other.as_u16())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::github::EventKind;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    fn octocat() -> Username {
        Username::parse("octocat").unwrap()
    }

    /// Serves one canned HTTP response and hands back the raw request text.
    async fn serve_once(
        status_line: &'static str,
        body: &'static str,
    ) -> (String, tokio::task::JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 1024];
            while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
            }
            let response = format!(
                "HTTP/1.1 {status_line}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.unwrap();
            String::from_utf8_lossy(&request).into_owned()
        });
        (format!("http://{addr}"), handle)
    }

    #[test]
    fn api_base_url_differs_by_host() {
        assert_eq!(api_base_url("github.com"), "https://api.github.com");
        assert_eq!(api_base_url("GitHub.com"), "https://api.github.com");
        assert_eq!(
            api_base_url("ghe.example.com"),
            "https://ghe.example.com/api/v3"
        );
    }

    #[test]
    fn events_url_substitutes_username() {
        let base = url::Url::parse("https://api.github.com").unwrap();
        assert_eq!(
            events_url(&base, &octocat()).as_str(),
            "https://api.github.com/users/octocat/events"
        );

        let enterprise = url::Url::parse("https://ghe.example.com/api/v3").unwrap();
        assert_eq!(
            events_url(&enterprise, &octocat()).as_str(),
            "https://ghe.example.com/api/v3/users/octocat/events"
        );
    }

    #[test]
    fn events_url_escapes_username() {
        let base = url::Url::parse("https://api.github.com").unwrap();
        let username = Username::parse("a b/c").unwrap();
        assert_eq!(
            events_url(&base, &username).as_str(),
            "https://api.github.com/users/a%20b%2Fc/events"
        );
    }

    #[test]
    fn check_status_classifies_codes() {
        assert_eq!(check_status(StatusCode::OK, &octocat()), Ok(()));
        assert_eq!(
            check_status(StatusCode::NOT_FOUND, &octocat()),
            Err(FetchError::UserNotFound("octocat".to_string()))
        );
        assert_eq!(
            check_status(StatusCode::FORBIDDEN, &octocat()),
            Err(FetchError::RateLimited)
        );
        assert_eq!(
            check_status(StatusCode::INTERNAL_SERVER_ERROR, &octocat()),
            Err(FetchError::UnexpectedStatus(500))
        );
        assert_eq!(
            check_status(StatusCode::CREATED, &octocat()),
            Err(FetchError::UnexpectedStatus(201))
        );
    }

    #[test]
    fn fetch_error_messages() {
        assert_eq!(
            FetchError::UserNotFound("octocat".to_string()).to_string(),
            "user 'octocat' not found"
        );
        assert!(FetchError::RateLimited.to_string().contains("rate limit"));
        assert_eq!(
            FetchError::Network("failed to fetch data: connection refused".to_string()).to_string(),
            "failed to fetch data: connection refused"
        );
        assert_eq!(
            FetchError::UnexpectedStatus(502).to_string(),
            "GitHub API returned status code: 502"
        );
    }

    #[tokio::test]
    async fn fetch_events_decodes_success_response() {
        let (base, server) = serve_once(
            "200 OK",
            r#"[{"type": "WatchEvent", "repo": {"name": "o/r"}, "payload": {"action": "started"}}]"#,
        )
        .await;
        let client = Client::with_api_base(&base, REQUEST_TIMEOUT).unwrap();

        let events = client.fetch_events(&octocat()).await.unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind, EventKind::Watch);
        assert_eq!(events[0].repo, "o/r");

        let request = server.await.unwrap().to_ascii_lowercase();
        assert!(request.starts_with("get /users/octocat/events "));
        let user_agents: Vec<_> = request
            .lines()
            .filter(|line| line.starts_with("user-agent:"))
            .collect();
        assert_eq!(user_agents, ["user-agent: github-activity-cli"]);
    }

    #[tokio::test]
    async fn fetch_events_maps_not_found() {
        let (base, _server) = serve_once("404 Not Found", r#"{"message": "Not Found"}"#).await;
        let client = Client::with_api_base(&base, REQUEST_TIMEOUT).unwrap();

        let err = client.fetch_events(&octocat()).await.unwrap_err();
        assert_eq!(err, FetchError::UserNotFound("octocat".to_string()));
    }

    #[tokio::test]
    async fn fetch_events_maps_forbidden_to_rate_limited() {
        let (base, _server) = serve_once("403 Forbidden", r#"{"message": "rate limited"}"#).await;
        let client = Client::with_api_base(&base, REQUEST_TIMEOUT).unwrap();

        let err = client.fetch_events(&octocat()).await.unwrap_err();
        assert_eq!(err, FetchError::RateLimited);
    }

    #[tokio::test]
    async fn fetch_events_does_not_retry_server_errors() {
        let (base, _server) = serve_once("500 Internal Server Error", "{}").await;
        let client = Client::with_api_base(&base, REQUEST_TIMEOUT).unwrap();

        let err = client.fetch_events(&octocat()).await.unwrap_err();
        assert_eq!(err, FetchError::UnexpectedStatus(500));
    }

    #[tokio::test]
    async fn fetch_events_reports_malformed_body() {
        let (base, _server) = serve_once("200 OK", r#"{"not": "an array"}"#).await;
        let client = Client::with_api_base(&base, REQUEST_TIMEOUT).unwrap();

        let err = client.fetch_events(&octocat()).await.unwrap_err();
        assert!(matches!(err, FetchError::Decode(_)));
    }

    #[tokio::test]
    async fn fetch_events_times_out() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let _server = tokio::spawn(async move {
            let (socket, _) = listener.accept().await.unwrap();
            tokio::time::sleep(Duration::from_secs(5)).await;
            drop(socket);
        });
        let client =
            Client::with_api_base(&format!("http://{addr}"), Duration::from_millis(200)).unwrap();

        let err = client.fetch_events(&octocat()).await.unwrap_err();
        assert_eq!(
            err,
            FetchError::Network("request timed out after 200ms".to_string())
        );
    }

    #[tokio::test]
    async fn fetch_events_reports_connection_failure() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        let client = Client::with_api_base(&format!("http://{addr}"), REQUEST_TIMEOUT).unwrap();

        let err = client.fetch_events(&octocat()).await.unwrap_err();
        assert!(matches!(err, FetchError::Network(_)));
    }
}

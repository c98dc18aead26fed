// HTTP plumbing shared by the rubric fetch and sync calls.
use crate::credentials::ApiCredentials;
use crate::error::{Result, RubricError};
use log::debug;
use reqwest::blocking::{Client, Response};
use reqwest::Url;
use std::time::Duration;

/// Request timeout used by [`ApiSession::new`].
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Enumeration representing the types of HTTP request methods.
///
/// The `Put` variant carries the JSON body sent with the request.
#[derive(Clone, Debug)]
pub enum HttpMethod {
    Get,
    Put(serde_json::Value),
}

impl HttpMethod {
    fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Put(_) => "PUT",
        }
    }
}

/// Credentials plus the HTTP client used to reach the backend.
///
/// Built once by the caller and handed to the client at construction time, so the
/// editor never reads the token or the base URL from process-wide state.
#[derive(Clone, Debug)]
pub struct ApiSession {
    pub credentials: ApiCredentials,
    pub client: Client,
}

impl ApiSession {
    /// Creates a session with a blocking client and [`DEFAULT_TIMEOUT`].
    pub fn new(credentials: ApiCredentials) -> Result<Self> {
        let client = Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .build()
            .map_err(|e| RubricError::Network(format!("Failed to build HTTP client: {}", e)))?;
        Ok(ApiSession {
            credentials,
            client,
        })
    }

    /// Creates a session around a client configured by the caller.
    pub fn with_client(credentials: ApiCredentials, client: Client) -> Self {
        ApiSession {
            credentials,
            client,
        }
    }

    /// Joins `path` to the base URL without doubling the slash.
    pub fn url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.credentials.url_api.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    /// Like [`ApiSession::url`], with `segment` appended as one percent-encoded path segment.
    pub fn url_with_segment(&self, path: &str, segment: &str) -> Result<String> {
        let mut url = Url::parse(&self.url(path))
            .map_err(|e| RubricError::Credentials(format!("Invalid API URL: {}", e)))?;
        url.path_segments_mut()
            .map_err(|_| RubricError::Credentials("Invalid API URL".to_string()))?
            .push(segment);
        Ok(url.to_string())
    }
}

/// Sends one authenticated HTTP request.
///
/// The token is checked before anything is built, so a missing token never reaches the
/// network. There is no retry: a failure is returned as is and the caller decides.
///
/// Returns:
/// - `Ok(Response)`: for any 2xx status.
/// - `Err(RubricError::AuthorizationMissing)`: blank token.
/// - `Err(RubricError::Network)`: transport failure or timeout.
/// - `Err(RubricError::Server)`: non-2xx status, with the response body as message.
pub fn send_http_request(
    method: HttpMethod,
    url: &str,
    session: &ApiSession,
    params: Vec<(String, String)>,
) -> Result<Response> {
    if !session.credentials.has_token() {
        return Err(RubricError::AuthorizationMissing);
    }
    debug!("{} {}", method.as_str(), url);

    let request_builder = match &method {
        HttpMethod::Get => session
            .client
            .get(url)
            .bearer_auth(&session.credentials.token_api)
            .query(&params),
        HttpMethod::Put(body) => session
            .client
            .put(url)
            .bearer_auth(&session.credentials.token_api)
            .query(&params)
            .json(body),
    };

    match request_builder.send() {
        Ok(response) if response.status().is_success() => Ok(response),
        Ok(response) => {
            let status = response.status().as_u16();
            let message = response.text().unwrap_or_default();
            Err(RubricError::Server { status, message })
        }
        Err(e) => Err(RubricError::Network(e.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(url: &str, token: &str) -> ApiSession {
        ApiSession::with_client(
            ApiCredentials {
                url_api: url.to_string(),
                token_api: token.to_string(),
            },
            Client::new(),
        )
    }

    #[test]
    fn test_url_joins_without_double_slash() {
        let s = session("http://localhost:4000/api/", "t");
        assert_eq!(s.url("/rubro/sync"), "http://localhost:4000/api/rubro/sync");
        assert_eq!(s.url("rubro/MAT"), "http://localhost:4000/api/rubro/MAT");
    }

    #[test]
    fn test_url_with_segment_encodes_the_key() {
        let s = session("http://localhost:4000/api", "t");
        assert_eq!(
            s.url_with_segment("rubro", "MAT 101/A").unwrap(),
            "http://localhost:4000/api/rubro/MAT%20101%2FA"
        );
    }

    #[test]
    fn test_missing_token_short_circuits() {
        // Port 9 is never contacted: the token check comes first.
        let s = session("http://127.0.0.1:9", "  ");
        let result = send_http_request(HttpMethod::Get, &s.url("rubro/MAT"), &s, vec![]);
        assert!(matches!(result, Err(RubricError::AuthorizationMissing)));
    }
}

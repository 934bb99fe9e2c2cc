use std::time::Duration;

use phonebook_core::{Contact, ContactDraft, ContactId, DirectoryService, ServiceError};
use reqwest::blocking::{Client, Response};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION};
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::debug;
use url::Url;

use crate::retry::{RetryPolicy, Step};
use crate::{ClientError, Result};

const PERSONS_PATH: &str = "api/persons";
const DEFAULT_USER_AGENT: &str = "phonebook";

#[derive(Debug, Clone)]
pub struct ClientOptions {
    pub base_url: Url,
    pub api_token: Option<String>,
    pub timeout: Duration,
    pub connect_timeout: Duration,
    pub retry: RetryPolicy,
    pub user_agent: Option<String>,
}

impl ClientOptions {
    pub fn new(base_url: Url) -> Self {
        Self {
            base_url,
            api_token: None,
            timeout: Duration::from_secs(10),
            connect_timeout: Duration::from_secs(5),
            retry: RetryPolicy::default(),
            user_agent: None,
        }
    }
}

/// [`DirectoryService`] over the `/api/persons` REST resource.
#[derive(Debug, Clone)]
pub struct HttpDirectory {
    client: Client,
    persons_url: Url,
    retry: RetryPolicy,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: Option<String>,
    message: Option<String>,
}

impl HttpDirectory {
    pub fn new(options: ClientOptions) -> Result<Self> {
        let persons_url = persons_url(&options.base_url)?;

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(
            "x-requested-with",
            HeaderValue::from_static("XMLHttpRequest"),
        );
        if let Some(token) = options.api_token.as_deref() {
            let mut value = HeaderValue::from_str(&format!("Bearer {token}"))
                .map_err(|_| ClientError::InvalidToken)?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }

        let client = Client::builder()
            .user_agent(options.user_agent.as_deref().unwrap_or(DEFAULT_USER_AGENT))
            .default_headers(headers)
            .timeout(options.timeout)
            .connect_timeout(options.connect_timeout)
            .build()?;

        Ok(Self {
            client,
            persons_url,
            retry: options.retry,
        })
    }

    fn item_url(&self, id: &ContactId) -> std::result::Result<Url, ServiceError> {
        let mut url = self.persons_url.clone();
        url.path_segments_mut()
            .map_err(|_| ServiceError::Transport("base url cannot hold a path".to_string()))?
            .push(id.as_str());
        Ok(url)
    }

    fn send(
        &self,
        method: Method,
        url: Url,
        body: Option<&ContactDraft>,
    ) -> std::result::Result<Response, ServiceError> {
        debug!(%method, %url, "directory request");
        self.retry.run(|| {
            let mut request = self.client.request(method.clone(), url.clone());
            if let Some(body) = body {
                request = request.json(body);
            }
            match request.send() {
                Ok(response) if self.retry.retries_status(response.status().as_u16()) => {
                    Step::Transient(error_from_response(response))
                }
                Ok(response) => Step::Ready(response),
                Err(err) if err.is_timeout() => Step::Fatal(ServiceError::Timeout),
                Err(err) if err.is_builder() => Step::Fatal(ServiceError::Transport(err.to_string())),
                Err(err) => Step::Transient(ServiceError::Transport(err.to_string())),
            }
        })
    }
}

impl DirectoryService for HttpDirectory {
    fn fetch_all(&self) -> std::result::Result<Vec<Contact>, ServiceError> {
        let response = self.send(Method::GET, self.persons_url.clone(), None)?;
        expect_json(response)
    }

    fn create(&self, draft: &ContactDraft) -> std::result::Result<Contact, ServiceError> {
        let response = self.send(Method::POST, self.persons_url.clone(), Some(draft))?;
        expect_json(response)
    }

    fn update(
        &self,
        id: &ContactId,
        draft: &ContactDraft,
    ) -> std::result::Result<Contact, ServiceError> {
        let response = self.send(Method::PUT, self.item_url(id)?, Some(draft))?;
        expect_json(response)
    }

    fn delete(&self, id: &ContactId) -> std::result::Result<(), ServiceError> {
        let response = self.send(Method::DELETE, self.item_url(id)?, None)?;
        expect_success(response).map(|_| ())
    }
}

fn persons_url(base_url: &Url) -> Result<Url> {
    if !matches!(base_url.scheme(), "http" | "https") {
        return Err(ClientError::InvalidBaseUrl(format!(
            "{base_url}: scheme must be http or https"
        )));
    }
    let mut base = base_url.clone();
    base.set_query(None);
    base.set_fragment(None);
    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }
    base.join(PERSONS_PATH)
        .map_err(|err| ClientError::InvalidBaseUrl(format!("{base_url}: {err}")))
}

fn expect_success(response: Response) -> std::result::Result<Response, ServiceError> {
    if response.status().is_success() {
        Ok(response)
    } else {
        Err(error_from_response(response))
    }
}

fn expect_json<T: DeserializeOwned>(response: Response) -> std::result::Result<T, ServiceError> {
    let response = expect_success(response)?;
    if response.status() == StatusCode::NO_CONTENT {
        return Err(ServiceError::Decode("empty response body".to_string()));
    }
    let body = response
        .text()
        .map_err(|err| ServiceError::Transport(err.to_string()))?;
    if body.trim().is_empty() {
        return Err(ServiceError::Decode("empty response body".to_string()));
    }
    serde_json::from_str(&body).map_err(|err| ServiceError::Decode(err.to_string()))
}

/// Maps a non-success response onto the service error taxonomy, preferring
/// the server's `error` or `message` text over the status reason.
fn error_from_response(response: Response) -> ServiceError {
    let status = response.status();
    let body = response.text().unwrap_or_default();
    let message = error_message(status, &body);
    let code = status.as_u16();
    match status {
        StatusCode::NOT_FOUND => ServiceError::NotFound(message),
        StatusCode::TOO_MANY_REQUESTS => ServiceError::Unavailable {
            status: code,
            message,
        },
        _ if status.is_server_error() => ServiceError::Unavailable {
            status: code,
            message,
        },
        _ => ServiceError::Rejected {
            status: code,
            message,
        },
    }
}

fn error_message(status: StatusCode, body: &str) -> String {
    let from_body = serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|parsed| non_blank(parsed.error).or_else(|| non_blank(parsed.message)));
    from_body
        .or_else(|| status.canonical_reason().map(str::to_string))
        .unwrap_or_else(|| format!("HTTP Error {}", status.as_u16()))
}

fn non_blank(text: Option<String>) -> Option<String> {
    text.map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty())
}

#[cfg(test)]
mod tests {
    use super::{error_message, persons_url};
    use reqwest::StatusCode;
    use url::Url;

    #[test]
    fn persons_url_appends_resource_path() {
        let base = Url::parse("http://localhost:3001").unwrap();
        assert_eq!(
            persons_url(&base).unwrap().as_str(),
            "http://localhost:3001/api/persons"
        );
    }

    #[test]
    fn persons_url_keeps_base_path_prefix() {
        let base = Url::parse("https://example.com/phonebook?x=1").unwrap();
        assert_eq!(
            persons_url(&base).unwrap().as_str(),
            "https://example.com/phonebook/api/persons"
        );
    }

    #[test]
    fn persons_url_rejects_other_schemes() {
        let base = Url::parse("ftp://example.com").unwrap();
        assert!(persons_url(&base).is_err());
    }

    #[test]
    fn error_message_prefers_error_then_message_fields() {
        assert_eq!(
            error_message(StatusCode::BAD_REQUEST, r#"{"error":"Name is required"}"#),
            "Name is required"
        );
        assert_eq!(
            error_message(StatusCode::BAD_REQUEST, r#"{"message":"Bad payload"}"#),
            "Bad payload"
        );
    }

    #[test]
    fn error_message_skips_blank_error_field() {
        assert_eq!(
            error_message(
                StatusCode::BAD_REQUEST,
                r#"{"error":"","message":"Bad payload"}"#
            ),
            "Bad payload"
        );
        assert_eq!(
            error_message(StatusCode::BAD_REQUEST, r#"{"error":"  ","message":""}"#),
            "Bad Request"
        );
    }

    #[test]
    fn error_message_falls_back_to_status_text() {
        assert_eq!(error_message(StatusCode::NOT_FOUND, "<html>"), "Not Found");
        assert_eq!(error_message(StatusCode::BAD_GATEWAY, ""), "Bad Gateway");
        let unknown = StatusCode::from_u16(599).unwrap();
        assert_eq!(error_message(unknown, ""), "HTTP Error 599");
    }
}

use async_trait::async_trait;
use crowdwork_core::{
    AuthStatus, Backend, BackendError, BackendResult, ChatMessage, DjProfile, RequestStatus,
    SongRequest,
};
use log::debug;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use url::Url;

/// A backend reached over its REST API
pub struct HttpBackend {
    base: Url,
    client: Client,
    token: Option<String>,
}

#[derive(Debug, Serialize)]
struct StatusBody {
    status: RequestStatus,
}

#[derive(Debug, Deserialize)]
struct LikeResponse {
    likes: Option<u32>,
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: Option<String>,
    message: Option<String>,
}

impl HttpBackend {
    pub fn new(base: Url) -> Self {
        Self {
            base,
            client: Client::new(),
            token: None,
        }
    }

    /// Sends the given token as a bearer on every request
    pub fn with_token<S>(mut self, token: S) -> Self
    where
        S: Into<String>,
    {
        self.token = Some(token.into());
        self
    }

    /// Builds an endpoint url below the base, percent-encoding each segment
    fn endpoint(&self, segments: &[&str]) -> BackendResult<Url> {
        let mut url = self.base.clone();

        url.path_segments_mut()
            .map_err(|_| BackendError::Network(format!("{} cannot be a base url", self.base)))?
            .pop_if_empty()
            .extend(segments);

        Ok(url)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    /// Sends a request and returns the body, or the backend's error as [BackendError::Rejected]
    async fn send(&self, request: RequestBuilder) -> BackendResult<(StatusCode, String)> {
        let response = self
            .authorize(request)
            .send()
            .await
            .map_err(|e| BackendError::Network(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| BackendError::Network(e.to_string()))?;

        if !status.is_success() {
            return Err(BackendError::Rejected {
                status: status.as_u16(),
                message: error_message(status, &body),
            });
        }

        Ok((status, body))
    }

    async fn fetch<T>(&self, segments: &[&str]) -> BackendResult<T>
    where
        T: DeserializeOwned,
    {
        let url = self.endpoint(segments)?;
        debug!("GET {}", url);

        let (_, body) = self.send(self.client.get(url)).await?;
        decode(&body)
    }
}

#[async_trait]
impl Backend for HttpBackend {
    async fn session_requests(&self, session_id: &str) -> BackendResult<Vec<SongRequest>> {
        self.fetch(&["session", session_id, "requests"]).await
    }

    async fn session_messages(&self, session_id: &str) -> BackendResult<Vec<ChatMessage>> {
        self.fetch(&["session", session_id, "messages"]).await
    }

    async fn session_dj(&self, session_id: &str) -> BackendResult<DjProfile> {
        self.fetch(&["session", session_id, "dj"]).await
    }

    async fn update_status(&self, request_id: &str, status: RequestStatus) -> BackendResult<()> {
        let url = self.endpoint(&["request", request_id, "status"])?;
        debug!("PUT {} ({})", url, status);

        // The updated resource is ignored, callers refresh instead
        self.send(self.client.put(url).json(&StatusBody { status }))
            .await
            .map(|_| ())
    }

    async fn like_request(&self, request_id: &str) -> BackendResult<u32> {
        let url = self.endpoint(&["request", request_id, "like"])?;
        debug!("PUT {}", url);

        let (status, body) = self.send(self.client.put(url)).await?;
        let response: LikeResponse = decode(&body)?;

        match response {
            LikeResponse {
                error: Some(message),
                ..
            } => Err(BackendError::Rejected {
                status: status.as_u16(),
                message,
            }),
            LikeResponse {
                likes: Some(likes), ..
            } => Ok(likes),
            _ => Err(BackendError::Decode("like response has no count".to_string())),
        }
    }

    async fn check_auth(&self) -> BackendResult<AuthStatus> {
        self.fetch(&["auth", "check"]).await
    }
}

fn decode<T>(body: &str) -> BackendResult<T>
where
    T: DeserializeOwned,
{
    serde_json::from_str(body).map_err(|e| BackendError::Decode(e.to_string()))
}

/// Picks the most useful error text out of a failed response
fn error_message(status: StatusCode, body: &str) -> String {
    let from_json = serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.error.or(b.message));

    if let Some(message) = from_json {
        return message;
    }

    let body = body.trim();

    if !body.is_empty() {
        return body.to_string();
    }

    match status.canonical_reason() {
        Some(reason) => format!("{} {}", status.as_u16(), reason),
        None => status.as_u16().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_encoded_endpoints_below_base() {
        let backend = HttpBackend::new(Url::parse("https://api.crowdwork.test/v1/").unwrap());

        let url = backend.endpoint(&["session", "a b/c", "requests"]).unwrap();

        assert_eq!(
            url.as_str(),
            "https://api.crowdwork.test/v1/session/a%20b%2Fc/requests"
        );

        let bare = HttpBackend::new(Url::parse("http://localhost:8080").unwrap());
        assert_eq!(
            bare.endpoint(&["auth", "check"]).unwrap().as_str(),
            "http://localhost:8080/auth/check"
        );
    }

    #[test]
    fn extracts_error_messages() {
        assert_eq!(
            error_message(StatusCode::BAD_REQUEST, r#"{"error":"Request already played"}"#),
            "Request already played"
        );
        assert_eq!(
            error_message(StatusCode::FORBIDDEN, r#"{"message":"Not your dancefloor"}"#),
            "Not your dancefloor"
        );
        assert_eq!(
            error_message(StatusCode::BAD_GATEWAY, "  upstream died \n"),
            "upstream died"
        );
        assert_eq!(
            error_message(StatusCode::NOT_FOUND, ""),
            "404 Not Found"
        );
    }

    #[test]
    fn decode_failures_are_reported() {
        let result: BackendResult<Vec<SongRequest>> = decode("<html>");
        assert!(matches!(result, Err(BackendError::Decode(_))));
    }
}

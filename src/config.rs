use std::{env, path::PathBuf};

use url::Url;

use crate::ClientError;

/// The backend the client talks to when nothing else is configured
pub const DEFAULT_API_URL: &str = "http://localhost:8080";
pub const DEFAULT_GUARD_FILE: &str = "crowdwork-votes.json";

/// Where and as whom the client connects, read from the environment
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub session_id: String,
    pub api_url: Url,
    pub socket_url: Url,
    pub token: Option<String>,
    pub guard_file: PathBuf,
}

impl ClientConfig {
    pub fn from_env() -> Result<Self, ClientError> {
        let session_id = env::args().nth(1).ok_or(ClientError::MissingSession)?;

        let api_url = env::var("CROWDWORK_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.to_string());
        let api_url = parse_url("CROWDWORK_API_URL", &api_url)?;

        let socket_url = match env::var("CROWDWORK_SOCKET_URL") {
            Ok(url) => parse_url("CROWDWORK_SOCKET_URL", &url)?,
            Err(_) => socket_url_for(&api_url)?,
        };

        let token = env::var("CROWDWORK_TOKEN").ok().filter(|t| !t.is_empty());

        let guard_file = env::var("CROWDWORK_GUARD_FILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_GUARD_FILE));

        Ok(Self {
            session_id,
            api_url,
            socket_url,
            token,
            guard_file,
        })
    }
}

fn parse_url(variable: &'static str, value: &str) -> Result<Url, ClientError> {
    Url::parse(value).map_err(|e| ClientError::InvalidUrl {
        variable,
        reason: e.to_string(),
    })
}

/// Derives the real-time channel url from the api url, `http://host` becomes `ws://host/socket`
pub fn socket_url_for(api_url: &Url) -> Result<Url, ClientError> {
    let scheme = match api_url.scheme() {
        "https" => "wss",
        _ => "ws",
    };

    let mut url = api_url.clone();
    let invalid = |reason: &str| ClientError::InvalidUrl {
        variable: "CROWDWORK_API_URL",
        reason: reason.to_string(),
    };

    url.set_scheme(scheme)
        .map_err(|_| invalid("scheme cannot be changed"))?;
    url.path_segments_mut()
        .map_err(|_| invalid("cannot be a base url"))?
        .pop_if_empty()
        .push("socket");

    Ok(url)
}

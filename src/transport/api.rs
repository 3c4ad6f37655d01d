use crate::transport::errors::TransportError;
use crate::transport::types::{Channel, Member, MessageLine, Target};
use async_trait::async_trait;
use log::debug;
use reqwest::{RequestBuilder, Response};
use serde::{Deserialize, Serialize};
use url::Url;

/// Loads the history of one conversation, oldest first.
#[async_trait]
pub trait HistorySource: Send + Sync {
    async fn fetch(&self, target: &Target) -> Result<Vec<MessageLine>, TransportError>;
}

#[derive(Debug, Serialize)]
struct Credentials<'a> {
    username: &'a str,
    password: &'a str,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    pub username: String,
}

/// HTTP side of the chat backend: auth, lists and history.
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base: Url,
    token: Option<String>,
}

impl ApiClient {
    pub fn new(server_url: &str) -> Result<Self, TransportError> {
        let base = Url::parse(server_url.trim())
            .map_err(|err| TransportError::InvalidConfig(format!("server url: {err}")))?;
        if !matches!(base.scheme(), "http" | "https") {
            return Err(TransportError::InvalidConfig(format!(
                "unsupported scheme {}",
                base.scheme()
            )));
        }
        Ok(Self {
            http: reqwest::Client::new(),
            base,
            token: None,
        })
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub async fn register(&self, username: &str, password: &str) -> Result<(), TransportError> {
        let request = self
            .http
            .post(self.endpoint("/register")?)
            .json(&Credentials { username, password });
        check(request.send().await?).await?;
        Ok(())
    }

    pub async fn login(
        &self,
        username: &str,
        password: &str,
    ) -> Result<LoginResponse, TransportError> {
        let request = self
            .http
            .post(self.endpoint("/login")?)
            .json(&Credentials { username, password });
        let response = check(request.send().await?).await?;
        Ok(response.json().await?)
    }

    pub async fn channels(&self) -> Result<Vec<Channel>, TransportError> {
        let request = self.authorized(self.http.get(self.endpoint("/channels")?));
        let response = check(request.send().await?).await?;
        Ok(response.json().await?)
    }

    pub async fn members(&self) -> Result<Vec<Member>, TransportError> {
        let request = self.authorized(self.http.get(self.endpoint("/users")?));
        let response = check(request.send().await?).await?;
        Ok(response.json().await?)
    }

    pub async fn history(&self, target: &Target) -> Result<Vec<MessageLine>, TransportError> {
        let url = self.history_url(target)?;
        debug!("fetching history for {target}");
        let request = self.authorized(self.http.get(url));
        let response = check(request.send().await?).await?;
        Ok(response.json().await?)
    }

    fn history_url(&self, target: &Target) -> Result<Url, TransportError> {
        let (path, key, value) = match target {
            Target::Channel(id) => ("/history", "channel_id", id.to_string()),
            Target::Direct(user) => ("/dm_history", "with_user", user.clone()),
        };
        let mut url = self.endpoint(path)?;
        url.query_pairs_mut().append_pair(key, &value);
        Ok(url)
    }

    fn endpoint(&self, path: &str) -> Result<Url, TransportError> {
        self.base
            .join(path)
            .map_err(|err| TransportError::InvalidConfig(format!("endpoint {path}: {err}")))
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }
}

#[async_trait]
impl HistorySource for ApiClient {
    async fn fetch(&self, target: &Target) -> Result<Vec<MessageLine>, TransportError> {
        self.history(target).await
    }
}

async fn check(response: Response) -> Result<Response, TransportError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let message = response.text().await.unwrap_or_default();
    Err(TransportError::Rejected {
        status: status.as_u16(),
        message,
    })
}

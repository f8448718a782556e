use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::{de::DeserializeOwned, Deserialize};
use shared::{
    domain::{UserId, UserRecord},
    error::ErrorCode,
    protocol::{MutationResponse, NewUser, UserListQuery, UserListResponse, UserPatch},
};
use tracing::debug;
use url::Url;

use crate::{
    error::ClientError,
    ports::{UserCreator, UserDirectory, UserListSource, UserMutator},
};

/// HTTP client for the user administration API.
#[derive(Clone)]
pub struct UsersApi {
    http: Client,
    base_url: Url,
    access_token: Option<String>,
}

#[derive(Deserialize)]
struct ErrorBody {
    code: Option<ErrorCode>,
    message: Option<String>,
}

impl UsersApi {
    pub fn new(base_url: &str) -> Result<Self, ClientError> {
        let base_url = Url::parse(base_url)?;
        if base_url.cannot_be_a_base() {
            return Err(ClientError::InvalidUrl(base_url.to_string()));
        }
        Ok(Self {
            http: Client::new(),
            base_url,
            access_token: None,
        })
    }

    pub fn with_access_token(mut self, token: impl Into<String>) -> Self {
        let token = token.into();
        self.access_token = (!token.trim().is_empty()).then_some(token);
        self
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, ClientError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ClientError::InvalidUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn request(&self, method: reqwest::Method, url: Url) -> reqwest::RequestBuilder {
        let builder = self.http.request(method, url);
        match &self.access_token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ClientError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response.json().await?);
    }

    let body = response.text().await.unwrap_or_default();
    debug!(status = status.as_u16(), %body, "user api returned an error");
    let parsed = serde_json::from_str::<ErrorBody>(&body).ok();
    let code = parsed.as_ref().and_then(|body| body.code);
    let message = parsed
        .and_then(|body| body.message)
        .filter(|message| !message.is_empty())
        .unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("request failed")
                .to_string()
        });
    Err(ClientError::Http {
        status: status.as_u16(),
        code,
        message,
    })
}

#[async_trait]
impl UserListSource for UsersApi {
    async fn list_users(&self, query: &UserListQuery) -> Result<UserListResponse, ClientError> {
        let url = self.endpoint(&["users"])?;
        let response = self
            .request(reqwest::Method::GET, url)
            .query(query)
            .send()
            .await?;
        decode(response).await
    }
}

#[async_trait]
impl UserDirectory for UsersApi {
    async fn get_user(&self, user_id: &UserId) -> Result<UserRecord, ClientError> {
        let url = self.endpoint(&["users", user_id.as_str()])?;
        let response = self.request(reqwest::Method::GET, url).send().await?;
        decode(response).await
    }
}

#[async_trait]
impl UserMutator for UsersApi {
    async fn update_user(
        &self,
        user_id: &UserId,
        patch: &UserPatch,
    ) -> Result<MutationResponse, ClientError> {
        let url = self.endpoint(&["users", user_id.as_str()])?;
        let response = self
            .request(reqwest::Method::PATCH, url)
            .json(patch)
            .send()
            .await?;
        decode(response).await
    }
}

#[async_trait]
impl UserCreator for UsersApi {
    async fn create_user(&self, new_user: &NewUser) -> Result<MutationResponse, ClientError> {
        let url = self.endpoint(&["users"])?;
        let response = self
            .request(reqwest::Method::POST, url)
            .json(new_user)
            .send()
            .await?;
        decode(response).await
    }
}

#[cfg(test)]
#[path = "tests/api_tests.rs"]
mod tests;

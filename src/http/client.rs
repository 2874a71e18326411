use std::sync::Arc;

use http::{Method, StatusCode};
use reqwest::Response;
use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, warn};

use crate::auth::AuthContext;
use crate::models::payload::error_message;

#[derive(Debug, Error)]
pub enum ApiError {
    /// The backend rejected the bearer token. The session has already been
    /// ended by the time the caller sees this.
    #[error("session expired or revoked")]
    Unauthorized,

    #[error("request failed with status {status}: {message}")]
    Status { status: u16, message: String },

    #[error("network failure: {0}")]
    Network(String),

    #[error("could not decode response: {0}")]
    Decode(String),
}

/// Client for every backend call other than the auth endpoints.
///
/// Attaches the stored bearer token to each request and is the one place
/// that reacts to 401: the auth context is told, and it decides whether the
/// session ends.
#[derive(Clone)]
pub struct ApiClient {
    auth: Arc<AuthContext>,
}

impl ApiClient {
    pub fn new(auth: Arc<AuthContext>) -> Self {
        ApiClient { auth }
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let response = self.send::<()>(Method::GET, path, None).await?;
        decode(response).await
    }

    pub async fn post<B, T>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let response = self.send(Method::POST, path, Some(body)).await?;
        decode(response).await
    }

    pub async fn put<B, T>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let response = self.send(Method::PUT, path, Some(body)).await?;
        decode(response).await
    }

    pub async fn delete(&self, path: &str) -> Result<(), ApiError> {
        self.send::<()>(Method::DELETE, path, None).await.map(|_| ())
    }

    /// Sends one request and applies the response policy shared by all
    /// calls. Successful responses are handed back untouched.
    pub async fn send<B>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<Response, ApiError>
    where
        B: Serialize + ?Sized,
    {
        let backend = self.auth.backend();
        let url = backend.url(path);
        let token = self.auth.current_token();

        let mut request = backend.client().request(method.clone(), &url);
        if let Some(token) = &token {
            request = request.bearer_auth(token);
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        debug!("{} {}", method, url);
        let response = request.send().await.map_err(|e| {
            warn!("No response from {} {}: {}", method, url, e);
            ApiError::Network(e.to_string())
        })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        if status == StatusCode::UNAUTHORIZED {
            match &token {
                Some(token) => {
                    self.auth.handle_unauthorized(token);
                }
                None => debug!("401 from {} without a token attached", url),
            }
            return Err(ApiError::Unauthorized);
        }

        let text = response.text().await.unwrap_or_default();
        let message = error_message(&text).unwrap_or(text);
        warn!("{} {} failed with {}: {}", method, url, status, message);
        Err(ApiError::Status {
            status: status.as_u16(),
            message,
        })
    }
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
    response
        .json::<T>()
        .await
        .map_err(|e| ApiError::Decode(e.to_string()))
}

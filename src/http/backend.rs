use reqwest::{Client, Response, StatusCode};
use serde::Serialize;
use serde_json::{json, Value};
use tracing::{debug, info};

use crate::auth::AuthError;
use crate::config::{ApiConfig, EndpointsConfig};
use crate::models::payload::{error_message, parse_login_response, LoginRequest};
use crate::models::user::token_preview;
use crate::models::{LoginOutcome, LoginRole, Registration};

/// The backend's auth endpoints, called without going through the 401
/// interceptor: a rejected login or a rejected stored token is handled by the
/// auth context itself.
pub struct Backend {
    client: Client,
    base_url: String,
    endpoints: EndpointsConfig,
}

impl Backend {
    pub fn new(api: &ApiConfig, endpoints: &EndpointsConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(api.timeout()).build()?;
        info!("Using backend at '{}'", api.base_url);
        Ok(Backend {
            client,
            base_url: api.base_url.trim_end_matches('/').to_string(),
            endpoints: endpoints.clone(),
        })
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    pub fn endpoints(&self) -> &EndpointsConfig {
        &self.endpoints
    }

    /// Joins a path onto the base URL.
    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn login_path(&self, role: LoginRole) -> &str {
        match (role, &self.endpoints.admin_login) {
            (LoginRole::Admin, Some(path)) => path,
            _ => &self.endpoints.login,
        }
    }

    /// `POST /auth/login {email, password, role}`.
    pub async fn login(
        &self,
        email: &str,
        password: &str,
        role: LoginRole,
    ) -> Result<LoginOutcome, AuthError> {
        let url = self.url(self.login_path(role));
        debug!("Sending login request for '{}' as {} to {}", email, role, url);

        let body = LoginRequest {
            email,
            password,
            role,
        };
        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| AuthError::NetworkFailure(format!("Error sending request: {}", e)))?;

        let response = check_status(response).await?;
        let body: Value = response
            .json()
            .await
            .map_err(|e| AuthError::InvalidResponse(format!("Error parsing JSON: {}", e)))?;
        parse_login_response(&body, role).map_err(AuthError::InvalidResponse)
    }

    /// `POST /auth/logout`. Callers treat any failure as non-fatal.
    pub async fn notify_logout(&self, token: &str) -> Result<(), String> {
        let url = self.url(&self.endpoints.logout);
        debug!("Notifying backend of logout for token '{}'", token_preview(token));
        let response = self
            .client
            .post(&url)
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| format!("Error sending request: {}", e))?;
        if response.status().is_success() {
            Ok(())
        } else {
            Err(format!("Unexpected status code: {}", response.status()))
        }
    }

    /// GETs `path` with the token attached and returns the JSON body.
    pub async fn fetch_identity(&self, path: &str, token: &str) -> Result<Value, String> {
        let url = self.url(path);
        debug!("Sending identity request to: {}", url);
        let response = self
            .client
            .get(&url)
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| format!("Error sending request: {}", e))?;

        let status = response.status();
        if status.is_success() {
            response
                .json::<Value>()
                .await
                .map_err(|e| format!("Error parsing JSON: {}", e))
        } else if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            Err(format!("Token rejected ({})", status.as_u16()))
        } else {
            Err(format!("Unexpected status code: {}", status))
        }
    }

    /// Creates an account. Nothing is logged in here.
    pub async fn register(&self, registration: &Registration) -> Result<(), AuthError> {
        match registration {
            Registration::Company(body) => {
                self.post_form(&self.endpoints.register_company, body).await
            }
            Registration::Freelancer(body) => {
                self.post_form(&self.endpoints.register_freelancer, body).await
            }
        }
    }

    pub async fn forgot_password(&self, email: &str, role: LoginRole) -> Result<(), AuthError> {
        self.post_form(
            &self.endpoints.forgot_password,
            &json!({ "email": email, "role": role }),
        )
        .await
    }

    /// Completes a reset started by [`Backend::forgot_password`]. The reset
    /// token travels in the path, as issued in the reset email.
    pub async fn reset_password(&self, reset_token: &str, password: &str) -> Result<(), AuthError> {
        let path = format!(
            "{}/{}",
            self.endpoints.reset_password.trim_end_matches('/'),
            reset_token
        );
        self.post_form(&path, &json!({ "password": password })).await
    }

    async fn post_form<T: Serialize + ?Sized>(&self, path: &str, body: &T) -> Result<(), AuthError> {
        let url = self.url(path);
        debug!("Sending form to {}", url);
        let response = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| AuthError::NetworkFailure(format!("Error sending request: {}", e)))?;
        check_status(response).await.map(|_| ())
    }
}

/// Splits a response into success, rejected (4xx) and server trouble (5xx).
async fn check_status(response: Response) -> Result<Response, AuthError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let text = response.text().await.unwrap_or_default();
    let message = error_message(&text).unwrap_or_default();
    if status.is_client_error() {
        Err(AuthError::CredentialsRejected {
            status: status.as_u16(),
            message,
        })
    } else {
        Err(AuthError::NetworkFailure(format!(
            "Unexpected status code: {} {}",
            status, message
        )))
    }
}

// Authentication endpoints: login, registration, logout, current profile.

use tracing::debug;

use crate::client::{ApiClient, HttpMethod, RequestSpec};
use crate::error::Error;
use crate::models::{LoginInput, LoginResponse, RegisterInput, User};
use crate::payload::Payload;

use super::to_body;

impl ApiClient {
    /// `POST /auth/login`. Does not persist the returned token.
    pub async fn login(&self, input: &LoginInput) -> Result<LoginResponse, Error> {
        let spec = RequestSpec::new(HttpMethod::Post, "auth/login")
            .payload(Payload::Json(to_body(input)?));
        self.send_json(spec).await
    }

    /// `POST /auth/register`. Returns the same shape as login.
    pub async fn register(&self, input: &RegisterInput) -> Result<LoginResponse, Error> {
        let spec = RequestSpec::new(HttpMethod::Post, "auth/register")
            .payload(Payload::Json(to_body(input)?));
        self.send_json(spec).await
    }

    /// `POST /auth/logout`. Revokes the token server-side.
    pub async fn logout(&self) -> Result<(), Error> {
        self.send(RequestSpec::new(HttpMethod::Post, "auth/logout"))
            .await?;
        debug!("logout acknowledged");
        Ok(())
    }

    /// `GET /user`.
    ///
    /// Returns `Ok(None)` when the backend answers without a body or
    /// without a `data` member.
    pub async fn current_user(&self) -> Result<Option<User>, Error> {
        let resp = self.send(RequestSpec::new(HttpMethod::Get, "user")).await?;
        match resp.body.as_ref().and_then(|b| b.get("data")) {
            Some(data) if !data.is_null() => resp.data().map(Some),
            _ => Ok(None),
        }
    }
}

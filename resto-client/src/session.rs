//! Explicit login session
//!
//! A [`Session`] is created by `login`/`register` and destroyed by `logout`.
//! It is handed to whatever needs an authenticated client; there is no
//! process-wide current user.

use shared::client::{LoginRequest, LoginResponse, RegisterRequest};
use shared::models::{Dashboard, Role, User};
use shared::validation::{RegistrationForm, validate_registration};

use crate::{ApiClient, ClientError, ClientResult, FormResult};

/// Authenticated user plus its bearer token
#[derive(Debug, Clone)]
pub struct Session {
    token: String,
    user: User,
}

impl Session {
    pub fn new(token: String, user: User) -> Self {
        Self { token, user }
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn user(&self) -> &User {
        &self.user
    }

    pub fn role(&self) -> Role {
        self.user.role
    }

    /// Dashboard to open for this session's role
    pub fn dashboard(&self) -> Dashboard {
        self.user.role.dashboard()
    }
}

impl From<LoginResponse> for Session {
    fn from(response: LoginResponse) -> Self {
        Self::new(response.token, response.user)
    }
}

impl ApiClient {
    /// Login with email and password
    pub async fn login(&self, email: &str, password: &str) -> ClientResult<Session> {
        let request = LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        };
        let body = self.post("auth/login", &request).await?;
        let response: LoginResponse = shared::envelope::decode_object(body)
            .map_err(|e| ClientError::InvalidResponse(format!("login: {e}")))?;

        tracing::info!(user_id = response.user.id, role = ?response.user.role, "Logged in");
        Ok(response.into())
    }

    /// Register a new account. The form is validated before anything is sent.
    pub async fn register(&self, form: &RegistrationForm) -> FormResult<Session> {
        validate_registration(form)?;

        let request = RegisterRequest {
            username: form.username.trim().to_string(),
            email: form.email.trim().to_string(),
            password: form.password.clone(),
            role: None,
        };
        let body = self.post("auth/register", &request).await?;
        let response: LoginResponse = shared::envelope::decode_object(body)
            .map_err(|e| ClientError::InvalidResponse(format!("register: {e}")))?;

        tracing::info!(user_id = response.user.id, "Registered");
        Ok(response.into())
    }

    /// A copy of this client that authenticates as `session`.
    ///
    /// Writes the session's role may not perform are refused locally.
    pub fn authenticated(&self, session: &Session) -> ApiClient {
        self.clone()
            .with_token(session.token())
            .with_role(session.role())
    }

    /// End the session. The token is dropped locally even if the server call fails.
    pub async fn logout(&mut self, session: Session) -> ClientResult<()> {
        let result = self
            .authenticated(&session)
            .post_empty("auth/logout")
            .await
            .map(|_| ());
        self.clear_token();

        if let Err(e) = &result {
            tracing::warn!(error = %e, "Logout request failed, session cleared locally");
        }
        result
    }
}

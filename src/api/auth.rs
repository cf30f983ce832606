//! Authentication endpoints: login, signup, session validation.

use serde::{Deserialize, Serialize};

use super::http::HttpClient;
use super::types::User;
use crate::error::ApiError;

#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest {
  pub email: String,
  pub password: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct SignupRequest {
  pub name: String,
  pub email: String,
  pub password: String,
  pub role_id: u64,
}

/// Payload of a successful login or signup.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthPayload {
  pub user: User,
  pub token: String,
}

#[derive(Clone)]
pub struct AuthApi {
  http: HttpClient,
}

impl AuthApi {
  pub fn new(http: HttpClient) -> Self {
    Self { http }
  }

  pub async fn login(&self, credentials: &LoginRequest) -> Result<AuthPayload, ApiError> {
    self.http.post("/auth/login", credentials).await
  }

  pub async fn signup(&self, payload: &SignupRequest) -> Result<AuthPayload, ApiError> {
    self.http.post("/auth/signup", payload).await
  }

  /// The backend's view of the current session; used to validate a restored
  /// token at startup.
  pub async fn me(&self) -> Result<User, ApiError> {
    self.http.get("/users/me").await
  }
}

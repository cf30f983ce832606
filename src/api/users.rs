//! User and role endpoints.

use serde::Deserialize;

use super::http::HttpClient;
use super::types::{CreateUser, Role, UpdateUser, User};
use crate::error::ApiError;

#[derive(Clone)]
pub struct UsersApi {
  http: HttpClient,
}

#[derive(Deserialize)]
struct RolesPayload {
  roles: Vec<Role>,
}

impl UsersApi {
  pub fn new(http: HttpClient) -> Self {
    Self { http }
  }

  pub async fn list(&self) -> Result<Vec<User>, ApiError> {
    self.http.get("/users").await
  }

  pub async fn get(&self, id: u64) -> Result<User, ApiError> {
    self.http.get(&format!("/users/{}", id)).await
  }

  pub async fn create(&self, payload: &CreateUser) -> Result<User, ApiError> {
    self.http.post("/users", payload).await
  }

  pub async fn update(&self, id: u64, payload: &UpdateUser) -> Result<User, ApiError> {
    self.http.put(&format!("/users/{}", id), payload).await
  }

  pub async fn delete(&self, id: u64) -> Result<(), ApiError> {
    self.http.delete(&format!("/users/{}", id)).await
  }

  pub async fn roles(&self) -> Result<Vec<Role>, ApiError> {
    let payload: RolesPayload = self.http.get("/roles").await?;
    Ok(payload.roles)
  }
}

//! User and role reads plus user administration mutations.

use tokio::time::Duration;

use crate::api::types::{CreateUser, Role, UpdateUser, User};
use crate::api::UsersApi;
use crate::cache::{CacheClient, MutationEvent, QueryKey};
use crate::error::ApiError;
use crate::messages;

const USERS_STALE_TIME: Duration = Duration::from_secs(5 * 60);
const ROLES_STALE_TIME: Duration = Duration::from_secs(10 * 60);

#[derive(Clone)]
pub struct UsersView {
  cache: CacheClient,
  api: UsersApi,
}

impl UsersView {
  pub fn new(cache: CacheClient, api: UsersApi) -> Self {
    Self { cache, api }
  }

  /// Active users, sorted by name for stable display and assignment pickers.
  pub async fn active_users(&self) -> Result<Vec<User>, ApiError> {
    let api = self.api.clone();
    let mut users: Vec<User> = self
      .cache
      .query(
        QueryKey::UsersList,
        self.cache.defaults().with_stale(USERS_STALE_TIME),
        move || {
          let api = api.clone();
          async move { api.list().await }
        },
      )
      .await?;
    users.retain(|u| u.is_active != Some(false));
    users.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(users)
  }

  pub async fn user(&self, id: u64) -> Result<User, ApiError> {
    let api = self.api.clone();
    self
      .cache
      .query(
        QueryKey::UserDetail(id),
        self.cache.defaults().with_stale(USERS_STALE_TIME),
        move || {
          let api = api.clone();
          async move { api.get(id).await }
        },
      )
      .await
  }

  pub async fn roles(&self) -> Result<Vec<Role>, ApiError> {
    let api = self.api.clone();
    self
      .cache
      .query(
        QueryKey::RolesList,
        self.cache.defaults().with_stale(ROLES_STALE_TIME),
        move || {
          let api = api.clone();
          async move { api.roles().await }
        },
      )
      .await
  }

  pub async fn create(&self, payload: CreateUser) -> Result<User, ApiError> {
    self
      .cache
      .mutate(MutationEvent::UserCreated, messages::USER_CREATE, || {
        self.api.create(&payload)
      })
      .await
  }

  pub async fn update(&self, id: u64, payload: UpdateUser) -> Result<User, ApiError> {
    self
      .cache
      .mutate(
        MutationEvent::UserUpdated { id },
        messages::USER_UPDATE,
        || self.api.update(id, &payload),
      )
      .await
  }

  pub async fn delete(&self, id: u64) -> Result<(), ApiError> {
    self
      .cache
      .mutate(
        MutationEvent::UserDeleted { id },
        messages::USER_DELETE,
        || self.api.delete(id),
      )
      .await
  }
}

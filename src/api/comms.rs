//! Communication-log endpoints. Append-mostly: create, edit, soft-delete.

use super::http::HttpClient;
use super::types::{Communication, CreateCommunication, UpdateCommunication};
use crate::error::ApiError;

/// Server-side filters for communication lists.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct CommunicationFilters {
  pub lead_id: Option<u64>,
  pub created_by: Option<u64>,
}

#[derive(Clone)]
pub struct CommsApi {
  http: HttpClient,
}

impl CommsApi {
  pub fn new(http: HttpClient) -> Self {
    Self { http }
  }

  pub async fn list(&self, filters: &CommunicationFilters) -> Result<Vec<Communication>, ApiError> {
    let mut query = Vec::new();
    if let Some(id) = filters.lead_id {
      query.push(("lead_id", id.to_string()));
    }
    if let Some(id) = filters.created_by {
      query.push(("created_by", id.to_string()));
    }
    self.http.get_query("/communications", &query).await
  }

  pub async fn create(&self, payload: &CreateCommunication) -> Result<Communication, ApiError> {
    self.http.post("/communications", payload).await
  }

  pub async fn update(
    &self,
    id: u64,
    payload: &UpdateCommunication,
  ) -> Result<Communication, ApiError> {
    self.http.put(&format!("/communications/{}", id), payload).await
  }

  pub async fn delete(&self, id: u64) -> Result<(), ApiError> {
    self.http.delete(&format!("/communications/{}", id)).await
  }
}

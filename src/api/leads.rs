//! Lead endpoints, including the reference lists they depend on.

use serde::{Deserialize, Serialize};

use super::http::HttpClient;
use super::types::{CreateLead, Lead, LeadStatus, Source, UpdateLead};
use crate::error::ApiError;

#[derive(Clone)]
pub struct LeadsApi {
  http: HttpClient,
}

/// Wire body for lead creation; the backend requires the acting user.
#[derive(Serialize)]
struct CreateLeadBody<'a> {
  #[serde(flatten)]
  payload: &'a CreateLead,
  created_by: u64,
}

#[derive(Serialize)]
struct UpdateLeadBody<'a> {
  #[serde(flatten)]
  payload: &'a UpdateLead,
  updated_by: u64,
}

/// Reference lists come back one level deeper than other payloads.
#[derive(Deserialize)]
struct StatusesPayload {
  statuses: Vec<LeadStatus>,
}

#[derive(Deserialize)]
struct SourcesPayload {
  sources: Vec<Source>,
}

impl LeadsApi {
  pub fn new(http: HttpClient) -> Self {
    Self { http }
  }

  pub async fn list(&self) -> Result<Vec<Lead>, ApiError> {
    self.http.get("/leads").await
  }

  pub async fn get(&self, id: u64) -> Result<Lead, ApiError> {
    self.http.get(&format!("/leads/{}", id)).await
  }

  pub async fn list_by_status(&self, status_id: u64) -> Result<Vec<Lead>, ApiError> {
    self.http.get(&format!("/leads/status/{}", status_id)).await
  }

  pub async fn create(&self, payload: &CreateLead) -> Result<Lead, ApiError> {
    let body = CreateLeadBody {
      payload,
      created_by: self.http.current_user_id()?,
    };
    self.http.post("/leads", &body).await
  }

  pub async fn update(&self, id: u64, payload: &UpdateLead) -> Result<Lead, ApiError> {
    let body = UpdateLeadBody {
      payload,
      updated_by: self.http.current_user_id()?,
    };
    self.http.put(&format!("/leads/{}", id), &body).await
  }

  pub async fn delete(&self, id: u64) -> Result<(), ApiError> {
    self.http.delete(&format!("/leads/{}", id)).await
  }

  /// Flip the lead to converted; one-directional in normal flow.
  pub async fn convert(&self, id: u64) -> Result<(), ApiError> {
    self.http.post_empty(&format!("/leads/{}/convert", id)).await
  }

  pub async fn statuses(&self) -> Result<Vec<LeadStatus>, ApiError> {
    let payload: StatusesPayload = self.http.get("/lead-statuses").await?;
    Ok(payload.statuses)
  }

  pub async fn sources(&self) -> Result<Vec<Source>, ApiError> {
    let payload: SourcesPayload = self.http.get("/sources").await?;
    Ok(payload.sources)
  }
}

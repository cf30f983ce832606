//! Lead list, detail, and kanban reads plus the lead mutations.

use tokio::time::Duration;

use crate::api::types::{CreateLead, Lead, LeadStatus, Source, UpdateLead};
use crate::api::LeadsApi;
use crate::cache::{CacheClient, MutationEvent, QueryKey};
use crate::error::ApiError;
use crate::messages;

/// Leads churn quickly, so their lists go stale well before the default.
const LEADS_STALE_TIME: Duration = Duration::from_secs(2 * 60);
/// Statuses and sources are reference data edited rarely.
const REFERENCE_STALE_TIME: Duration = Duration::from_secs(10 * 60);

#[derive(Clone)]
pub struct LeadsView {
  cache: CacheClient,
  api: LeadsApi,
}

impl LeadsView {
  pub fn new(cache: CacheClient, api: LeadsApi) -> Self {
    Self { cache, api }
  }

  pub async fn leads(&self) -> Result<Vec<Lead>, ApiError> {
    let api = self.api.clone();
    self
      .cache
      .query(
        QueryKey::LeadsList,
        self.cache.defaults().with_stale(LEADS_STALE_TIME),
        move || {
          let api = api.clone();
          async move { api.list().await }
        },
      )
      .await
  }

  pub async fn lead(&self, id: u64) -> Result<Lead, ApiError> {
    let api = self.api.clone();
    self
      .cache
      .query(
        QueryKey::LeadDetail(id),
        self.cache.defaults().with_stale(LEADS_STALE_TIME),
        move || {
          let api = api.clone();
          async move { api.get(id).await }
        },
      )
      .await
  }

  /// One kanban column: the leads currently in `status_id`.
  pub async fn leads_by_status(&self, status_id: u64) -> Result<Vec<Lead>, ApiError> {
    let api = self.api.clone();
    self
      .cache
      .query(
        QueryKey::LeadsByStatus(status_id),
        self.cache.defaults().with_stale(LEADS_STALE_TIME),
        move || {
          let api = api.clone();
          async move { api.list_by_status(status_id).await }
        },
      )
      .await
  }

  pub async fn statuses(&self) -> Result<Vec<LeadStatus>, ApiError> {
    let api = self.api.clone();
    self
      .cache
      .query(
        QueryKey::LeadStatusesList,
        self.cache.defaults().with_stale(REFERENCE_STALE_TIME),
        move || {
          let api = api.clone();
          async move { api.statuses().await }
        },
      )
      .await
  }

  pub async fn sources(&self) -> Result<Vec<Source>, ApiError> {
    let api = self.api.clone();
    self
      .cache
      .query(
        QueryKey::SourcesList,
        self.cache.defaults().with_stale(REFERENCE_STALE_TIME),
        move || {
          let api = api.clone();
          async move { api.sources().await }
        },
      )
      .await
  }

  pub async fn create(&self, payload: CreateLead) -> Result<Lead, ApiError> {
    self
      .cache
      .mutate(MutationEvent::LeadCreated, messages::LEAD_CREATE, || {
        self.api.create(&payload)
      })
      .await
  }

  pub async fn update(&self, id: u64, payload: UpdateLead) -> Result<Lead, ApiError> {
    self
      .cache
      .mutate(
        MutationEvent::LeadUpdated { id },
        messages::LEAD_UPDATE,
        || self.api.update(id, &payload),
      )
      .await
  }

  pub async fn delete(&self, id: u64) -> Result<(), ApiError> {
    self
      .cache
      .mutate(
        MutationEvent::LeadDeleted { id },
        messages::LEAD_DELETE,
        || self.api.delete(id),
      )
      .await
  }

  pub async fn convert(&self, id: u64) -> Result<(), ApiError> {
    self
      .cache
      .mutate(
        MutationEvent::LeadConverted { id },
        messages::LEAD_CONVERT,
        || self.api.convert(id),
      )
      .await
  }
}

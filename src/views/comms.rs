//! Communication log reads and mutations.

use tokio::time::Duration;

use crate::api::types::{Communication, CreateCommunication, UpdateCommunication};
use crate::api::{CommsApi, CommunicationFilters};
use crate::cache::{CacheClient, MutationEvent, QueryKey};
use crate::error::ApiError;
use crate::messages;

/// Communications are the most recent-activity-sensitive data we show.
const COMMS_STALE_TIME: Duration = Duration::from_secs(60);

#[derive(Clone)]
pub struct CommsView {
  cache: CacheClient,
  api: CommsApi,
}

impl CommsView {
  pub fn new(cache: CacheClient, api: CommsApi) -> Self {
    Self { cache, api }
  }

  /// Communications matching `filters`, newest first.
  pub async fn communications(
    &self,
    filters: CommunicationFilters,
  ) -> Result<Vec<Communication>, ApiError> {
    let api = self.api.clone();
    let key = QueryKey::CommunicationsList(filters.clone());
    let mut comms: Vec<Communication> = self
      .cache
      .query(key, self.cache.defaults().with_stale(COMMS_STALE_TIME), move || {
        let api = api.clone();
        let filters = filters.clone();
        async move { api.list(&filters).await }
      })
      .await?;
    comms.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    Ok(comms)
  }

  pub async fn create(&self, payload: CreateCommunication) -> Result<Communication, ApiError> {
    let lead_id = payload.lead_id;
    self
      .cache
      .mutate(
        MutationEvent::CommunicationCreated { lead_id },
        messages::COMM_CREATE,
        || self.api.create(&payload),
      )
      .await
  }

  pub async fn update(
    &self,
    id: u64,
    lead_id: u64,
    payload: UpdateCommunication,
  ) -> Result<Communication, ApiError> {
    self
      .cache
      .mutate(
        MutationEvent::CommunicationUpdated { id, lead_id },
        messages::COMM_UPDATE,
        || self.api.update(id, &payload),
      )
      .await
  }

  pub async fn delete(&self, id: u64, lead_id: u64) -> Result<(), ApiError> {
    self
      .cache
      .mutate(
        MutationEvent::CommunicationDeleted { lead_id },
        messages::COMM_DELETE,
        || self.api.delete(id),
      )
      .await
  }
}

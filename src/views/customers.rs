//! Customer reads derived from the leads cache.
//!
//! A customer is a converted, still-active lead. Rather than issuing its
//! own fetch, this view reads through the shared leads list entry and
//! filters in memory, so customers and leads can never disagree about the
//! same record.

use crate::api::types::{CreateLead, Lead};
use crate::api::LeadsApi;
use crate::cache::{CacheClient, MutationEvent, QueryKey};
use crate::error::ApiError;
use crate::messages;
use tokio::time::Duration;

const CUSTOMERS_STALE_TIME: Duration = Duration::from_secs(2 * 60);

#[derive(Clone)]
pub struct CustomersView {
  cache: CacheClient,
  api: LeadsApi,
}

impl CustomersView {
  pub fn new(cache: CacheClient, api: LeadsApi) -> Self {
    Self { cache, api }
  }

  pub async fn customers(&self) -> Result<Vec<Lead>, ApiError> {
    let api = self.api.clone();
    let leads: Vec<Lead> = self
      .cache
      .query(
        QueryKey::LeadsList,
        self.cache.defaults().with_stale(CUSTOMERS_STALE_TIME),
        move || {
          let api = api.clone();
          async move { api.list().await }
        },
      )
      .await?;
    Ok(leads.into_iter().filter(Lead::is_customer).collect())
  }

  /// Create a record that lands directly in the customer view.
  pub async fn add_customer(&self, mut payload: CreateLead) -> Result<Lead, ApiError> {
    payload.is_converted = Some(true);
    self
      .cache
      .mutate(MutationEvent::CustomerCreated, messages::CUSTOMER_CREATE, || {
        self.api.create(&payload)
      })
      .await
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn lead(id: u64, converted: bool, active: Option<bool>) -> Lead {
    serde_json::from_value(serde_json::json!({
      "id": id, "name": format!("lead-{id}"), "status_id": 1, "source_id": 1,
      "is_converted": converted, "is_active": active,
      "created_at": "2024-01-01T00:00:00Z", "updated_at": "2024-01-01T00:00:00Z"
    }))
    .unwrap()
  }

  #[test]
  fn test_customer_filter_keeps_converted_active_leads() {
    let leads = vec![
      lead(1, true, None),
      lead(2, true, Some(false)),
      lead(3, false, Some(true)),
      lead(4, true, Some(true)),
    ];
    let ids: Vec<u64> = leads
      .into_iter()
      .filter(Lead::is_customer)
      .map(|l| l.id)
      .collect();
    assert_eq!(ids, vec![1, 4]);
  }
}

//! Work item and task reads and mutations.
//!
//! Task mutations thread the parent work item id into their events so the
//! fan-out can reach the per-work-item task list alongside the flat ones.

use tokio::time::Duration;

use crate::api::types::{
  CreateTask, CreateWorkItem, Task, UpdateTask, UpdateWorkItem, WorkItem, WorkStatus,
};
use crate::api::{TaskFilters, WorkApi, WorkItemFilters};
use crate::cache::{CacheClient, MutationEvent, QueryKey};
use crate::error::ApiError;
use crate::messages;

const WORK_STALE_TIME: Duration = Duration::from_secs(2 * 60);
/// Work statuses are near-static reference data.
const WORK_STATUSES_STALE_TIME: Duration = Duration::from_secs(60 * 60);

#[derive(Clone)]
pub struct WorkView {
  cache: CacheClient,
  api: WorkApi,
}

impl WorkView {
  pub fn new(cache: CacheClient, api: WorkApi) -> Self {
    Self { cache, api }
  }

  pub async fn work_items(&self, filters: WorkItemFilters) -> Result<Vec<WorkItem>, ApiError> {
    let api = self.api.clone();
    let key = QueryKey::WorkItemsList(filters.clone());
    self
      .cache
      .query(key, self.cache.defaults().with_stale(WORK_STALE_TIME), move || {
        let api = api.clone();
        let filters = filters.clone();
        async move { api.list_work_items(&filters).await }
      })
      .await
  }

  pub async fn work_item(&self, id: u64) -> Result<WorkItem, ApiError> {
    let api = self.api.clone();
    self
      .cache
      .query(
        QueryKey::WorkItemDetail(id),
        self.cache.defaults().with_stale(WORK_STALE_TIME),
        move || {
          let api = api.clone();
          async move { api.get_work_item(id).await }
        },
      )
      .await
  }

  pub async fn tasks(&self, filters: TaskFilters) -> Result<Vec<Task>, ApiError> {
    let api = self.api.clone();
    let key = QueryKey::TasksList(filters.clone());
    self
      .cache
      .query(key, self.cache.defaults().with_stale(WORK_STALE_TIME), move || {
        let api = api.clone();
        let filters = filters.clone();
        async move { api.list_tasks(&filters).await }
      })
      .await
  }

  /// The tasks under one work item, cached separately from filtered lists.
  pub async fn tasks_for_work_item(&self, work_item_id: u64) -> Result<Vec<Task>, ApiError> {
    let api = self.api.clone();
    self
      .cache
      .query(
        QueryKey::TasksByWorkItem(work_item_id),
        self.cache.defaults().with_stale(WORK_STALE_TIME),
        move || {
          let api = api.clone();
          let filters = TaskFilters {
            work_item_id: Some(work_item_id),
            ..TaskFilters::default()
          };
          async move { api.list_tasks(&filters).await }
        },
      )
      .await
  }

  pub async fn work_statuses(&self) -> Result<Vec<WorkStatus>, ApiError> {
    let api = self.api.clone();
    self
      .cache
      .query(
        QueryKey::WorkStatusesList,
        self.cache.defaults().with_stale(WORK_STATUSES_STALE_TIME),
        move || {
          let api = api.clone();
          async move { api.work_statuses().await }
        },
      )
      .await
  }

  pub async fn create_work_item(&self, payload: CreateWorkItem) -> Result<WorkItem, ApiError> {
    self
      .cache
      .mutate(
        MutationEvent::WorkItemCreated,
        messages::WORK_ITEM_CREATE,
        || self.api.create_work_item(&payload),
      )
      .await
  }

  pub async fn update_work_item(
    &self,
    id: u64,
    payload: UpdateWorkItem,
  ) -> Result<WorkItem, ApiError> {
    self
      .cache
      .mutate(
        MutationEvent::WorkItemUpdated { id },
        messages::WORK_ITEM_UPDATE,
        || self.api.update_work_item(id, &payload),
      )
      .await
  }

  pub async fn delete_work_item(&self, id: u64) -> Result<(), ApiError> {
    self
      .cache
      .mutate(
        MutationEvent::WorkItemDeleted { id },
        messages::WORK_ITEM_DELETE,
        || self.api.delete_work_item(id),
      )
      .await
  }

  pub async fn create_task(&self, payload: CreateTask) -> Result<Task, ApiError> {
    let work_item_id = payload.work_item_id;
    self
      .cache
      .mutate(
        MutationEvent::TaskCreated {
          work_item_id: Some(work_item_id),
        },
        messages::TASK_CREATE,
        || self.api.create_task(&payload),
      )
      .await
  }

  pub async fn update_task(&self, id: u64, payload: UpdateTask) -> Result<Task, ApiError> {
    let work_item_id = payload.work_item_id;
    self
      .cache
      .mutate(
        MutationEvent::TaskUpdated { id, work_item_id },
        messages::TASK_UPDATE,
        || self.api.update_task(id, &payload),
      )
      .await
  }

  pub async fn delete_task(
    &self,
    id: u64,
    work_item_id: Option<u64>,
  ) -> Result<(), ApiError> {
    self
      .cache
      .mutate(
        MutationEvent::TaskDeleted { id, work_item_id },
        messages::TASK_DELETE,
        || self.api.delete_task(id),
      )
      .await
  }
}

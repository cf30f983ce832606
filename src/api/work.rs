//! Work item and task endpoints.

use serde::Deserialize;

use super::http::HttpClient;
use super::types::{CreateTask, CreateWorkItem, Task, UpdateTask, UpdateWorkItem, WorkItem, WorkStatus};
use crate::error::ApiError;

/// Optional server-side filters for work-item lists.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct WorkItemFilters {
  pub customer_id: Option<u64>,
  pub assigned_to: Option<u64>,
  pub status_id: Option<u64>,
}

/// Optional server-side filters for task lists.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct TaskFilters {
  pub customer_id: Option<u64>,
  pub work_item_id: Option<u64>,
  pub assigned_to: Option<u64>,
  pub status_id: Option<u64>,
}

#[derive(Deserialize)]
struct WorkStatusesPayload {
  statuses: Vec<WorkStatus>,
}

#[derive(Clone)]
pub struct WorkApi {
  http: HttpClient,
}

impl WorkApi {
  pub fn new(http: HttpClient) -> Self {
    Self { http }
  }

  pub async fn list_work_items(&self, filters: &WorkItemFilters) -> Result<Vec<WorkItem>, ApiError> {
    let mut query = Vec::new();
    push_id(&mut query, "customer_id", filters.customer_id);
    push_id(&mut query, "assigned_to", filters.assigned_to);
    push_id(&mut query, "status_id", filters.status_id);
    self.http.get_query("/work-items", &query).await
  }

  pub async fn get_work_item(&self, id: u64) -> Result<WorkItem, ApiError> {
    self.http.get(&format!("/work-items/{}", id)).await
  }

  pub async fn create_work_item(&self, payload: &CreateWorkItem) -> Result<WorkItem, ApiError> {
    self.http.post("/work-items", payload).await
  }

  pub async fn update_work_item(
    &self,
    id: u64,
    payload: &UpdateWorkItem,
  ) -> Result<WorkItem, ApiError> {
    self.http.put(&format!("/work-items/{}", id), payload).await
  }

  pub async fn delete_work_item(&self, id: u64) -> Result<(), ApiError> {
    self.http.delete(&format!("/work-items/{}", id)).await
  }

  pub async fn list_tasks(&self, filters: &TaskFilters) -> Result<Vec<Task>, ApiError> {
    let mut query = Vec::new();
    push_id(&mut query, "customer_id", filters.customer_id);
    push_id(&mut query, "work_item_id", filters.work_item_id);
    push_id(&mut query, "assigned_to", filters.assigned_to);
    push_id(&mut query, "status_id", filters.status_id);
    self.http.get_query("/tasks", &query).await
  }

  pub async fn create_task(&self, payload: &CreateTask) -> Result<Task, ApiError> {
    self.http.post("/tasks", payload).await
  }

  pub async fn update_task(&self, id: u64, payload: &UpdateTask) -> Result<Task, ApiError> {
    self.http.put(&format!("/tasks/{}", id), payload).await
  }

  pub async fn delete_task(&self, id: u64) -> Result<(), ApiError> {
    self.http.delete(&format!("/tasks/{}", id)).await
  }

  pub async fn work_statuses(&self) -> Result<Vec<WorkStatus>, ApiError> {
    let payload: WorkStatusesPayload = self.http.get("/work-statuses").await?;
    Ok(payload.statuses)
  }
}

fn push_id(query: &mut Vec<(&'static str, String)>, name: &'static str, value: Option<u64>) {
  if let Some(v) = value {
    query.push((name, v.to_string()));
  }
}

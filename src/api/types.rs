//! Wire types for the CRM backend.
//!
//! These mirror the backend's JSON records; the client never owns canonical
//! state. Customers are not a distinct record - a Lead with
//! `is_converted = true` that is still active is presented as a customer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Minimal embedded user reference (assignee, creator, updater).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserRef {
  pub id: u64,
  pub name: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub email: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Lead {
  pub id: u64,
  pub name: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub email: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub phone: Option<String>,
  pub status_id: u64,
  pub source_id: u64,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub assigned_to: Option<u64>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub notes: Option<String>,
  #[serde(default)]
  pub is_converted: bool,
  /// Absent means active; only an explicit `false` deactivates the record.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub is_active: Option<bool>,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub status: Option<LeadStatus>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub source: Option<Source>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub assigned_user: Option<UserRef>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub created_user: Option<UserRef>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub updated_user: Option<UserRef>,
}

impl Lead {
  /// The customer view predicate: converted leads that are not explicitly
  /// deactivated. A missing `is_active` counts as active.
  pub fn is_customer(&self) -> bool {
    self.is_converted && self.is_active != Some(false)
  }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LeadStatus {
  pub id: u64,
  pub name: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub description: Option<String>,
  #[serde(default = "default_true")]
  pub is_active: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Source {
  pub id: u64,
  pub name: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub description: Option<String>,
  #[serde(default = "default_true")]
  pub is_active: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Role {
  pub id: u64,
  pub name: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct User {
  pub id: u64,
  pub name: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub email: Option<String>,
  pub role: Role,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WorkStatus {
  pub id: u64,
  pub name: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub description: Option<String>,
  #[serde(default = "default_true")]
  pub is_active: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WorkItem {
  pub id: u64,
  pub title: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub description: Option<String>,
  /// Owning customer - a Lead id.
  pub customer_id: u64,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub assigned_to: Option<u64>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub status_id: Option<u64>,
  #[serde(default = "default_true")]
  pub is_active: bool,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub assigned_user: Option<UserRef>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub status: Option<WorkStatus>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Task {
  pub id: u64,
  pub title: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub description: Option<String>,
  pub work_item_id: u64,
  pub customer_id: u64,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub assigned_to: Option<u64>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub status_id: Option<u64>,
  #[serde(default = "default_true")]
  pub is_active: bool,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub assigned_user: Option<UserRef>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub status: Option<WorkStatus>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Communication {
  pub id: u64,
  pub lead_id: u64,
  pub message: String,
  #[serde(default = "default_true")]
  pub is_active: bool,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub created_user: Option<UserRef>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub updated_user: Option<UserRef>,
}

fn default_true() -> bool {
  true
}

// ============================================================================
// Request payloads
// ============================================================================

/// Create-lead payload as callers build it. The service injects `created_by`
/// from the session before the request goes on the wire.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CreateLead {
  pub name: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub email: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub phone: Option<String>,
  pub status_id: u64,
  pub source_id: u64,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub assigned_to: Option<u64>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub notes: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub is_converted: Option<bool>,
}

/// Update-lead payload; `updated_by` is injected by the service.
#[derive(Debug, Clone, Default, Serialize)]
pub struct UpdateLead {
  #[serde(skip_serializing_if = "Option::is_none")]
  pub name: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub email: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub phone: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub status_id: Option<u64>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub source_id: Option<u64>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub assigned_to: Option<u64>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub notes: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub is_converted: Option<bool>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CreateWorkItem {
  pub title: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub description: Option<String>,
  pub customer_id: u64,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub assigned_to: Option<u64>,
  pub status_id: u64,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct UpdateWorkItem {
  #[serde(skip_serializing_if = "Option::is_none")]
  pub title: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub description: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub customer_id: Option<u64>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub assigned_to: Option<u64>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub status_id: Option<u64>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CreateTask {
  pub title: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub description: Option<String>,
  pub work_item_id: u64,
  pub customer_id: u64,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub assigned_to: Option<u64>,
  pub status_id: u64,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct UpdateTask {
  #[serde(skip_serializing_if = "Option::is_none")]
  pub title: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub description: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub work_item_id: Option<u64>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub customer_id: Option<u64>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub assigned_to: Option<u64>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub status_id: Option<u64>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CreateCommunication {
  pub lead_id: u64,
  pub message: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct UpdateCommunication {
  #[serde(skip_serializing_if = "Option::is_none")]
  pub message: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CreateUser {
  pub name: String,
  pub email: String,
  pub password: String,
  pub role_id: u64,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct UpdateUser {
  #[serde(skip_serializing_if = "Option::is_none")]
  pub name: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub email: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub password: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub role_id: Option<u64>,
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_customer_predicate_default_active() {
    let lead: Lead = serde_json::from_value(serde_json::json!({
      "id": 1, "name": "Alice", "status_id": 1, "source_id": 2,
      "is_converted": true,
      "created_at": "2024-01-01T00:00:00Z", "updated_at": "2024-01-01T00:00:00Z"
    }))
    .unwrap();
    // is_active absent from the payload counts as active
    assert_eq!(lead.is_active, None);
    assert!(lead.is_customer());
  }

  #[test]
  fn test_customer_predicate_rejects_inactive_and_unconverted() {
    let mut lead: Lead = serde_json::from_value(serde_json::json!({
      "id": 1, "name": "Bob", "status_id": 1, "source_id": 2,
      "is_converted": true, "is_active": false,
      "created_at": "2024-01-01T00:00:00Z", "updated_at": "2024-01-01T00:00:00Z"
    }))
    .unwrap();
    assert!(!lead.is_customer());

    lead.is_active = Some(true);
    lead.is_converted = false;
    assert!(!lead.is_customer());
  }

  #[test]
  fn test_update_lead_serializes_only_set_fields() {
    let payload = UpdateLead {
      name: Some("Renamed".into()),
      ..Default::default()
    };
    let v = serde_json::to_value(&payload).unwrap();
    assert_eq!(v, serde_json::json!({ "name": "Renamed" }));
  }
}

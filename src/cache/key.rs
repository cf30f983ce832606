//! Canonical cache keys for every read the client performs.
//!
//! A key is derived only from the resource, the operation, and typed filter
//! parameters, so equal inputs always produce an equal key no matter where or
//! when it is built. That determinism is what lets concurrent reads for the
//! same data coalesce onto one in-flight request.

use crate::api::{CommunicationFilters, TaskFilters, WorkItemFilters};

/// The resource a key reads from. Used for list-wide invalidation matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resource {
  Leads,
  Customers,
  Users,
  Roles,
  LeadStatuses,
  Sources,
  WorkItems,
  WorkStatuses,
  Tasks,
  Communications,
  Auth,
}

/// Canonical identifier for a cached read.
///
/// Filters are typed structs, so "equivalent filter sets" is structural
/// equality - there is no field ordering or undefined-vs-missing distinction
/// to normalize away.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum QueryKey {
  LeadsList,
  LeadDetail(u64),
  LeadsByStatus(u64),
  CustomersList,
  UsersList,
  UserDetail(u64),
  RolesList,
  LeadStatusesList,
  SourcesList,
  WorkItemsList(WorkItemFilters),
  WorkItemDetail(u64),
  WorkStatusesList,
  TasksList(TaskFilters),
  TaskDetail(u64),
  TasksByWorkItem(u64),
  CommunicationsList(CommunicationFilters),
  AuthMe,
}

impl QueryKey {
  pub fn resource(&self) -> Resource {
    match self {
      QueryKey::LeadsList | QueryKey::LeadDetail(_) | QueryKey::LeadsByStatus(_) => Resource::Leads,
      QueryKey::CustomersList => Resource::Customers,
      QueryKey::UsersList | QueryKey::UserDetail(_) => Resource::Users,
      QueryKey::RolesList => Resource::Roles,
      QueryKey::LeadStatusesList => Resource::LeadStatuses,
      QueryKey::SourcesList => Resource::Sources,
      QueryKey::WorkItemsList(_) | QueryKey::WorkItemDetail(_) => Resource::WorkItems,
      QueryKey::WorkStatusesList => Resource::WorkStatuses,
      QueryKey::TasksList(_) | QueryKey::TaskDetail(_) | QueryKey::TasksByWorkItem(_) => {
        Resource::Tasks
      }
      QueryKey::CommunicationsList(_) => Resource::Communications,
      QueryKey::AuthMe => Resource::Auth,
    }
  }

  /// Whether this key is a list-shaped read (any filters) of its resource.
  pub fn is_list(&self) -> bool {
    matches!(
      self,
      QueryKey::LeadsList
        | QueryKey::LeadsByStatus(_)
        | QueryKey::CustomersList
        | QueryKey::UsersList
        | QueryKey::RolesList
        | QueryKey::LeadStatusesList
        | QueryKey::SourcesList
        | QueryKey::WorkItemsList(_)
        | QueryKey::WorkStatusesList
        | QueryKey::TasksList(_)
        | QueryKey::TasksByWorkItem(_)
        | QueryKey::CommunicationsList(_)
    )
  }

  /// Canonical `["resource", "operation", args...]` rendering for logs.
  pub fn segments(&self) -> Vec<String> {
    fn seg(parts: &[&str]) -> Vec<String> {
      parts.iter().map(|s| s.to_string()).collect()
    }

    match self {
      QueryKey::LeadsList => seg(&["leads", "list"]),
      QueryKey::LeadDetail(id) => seg(&["leads", "detail", &id.to_string()]),
      QueryKey::LeadsByStatus(id) => seg(&["leads", "byStatus", &id.to_string()]),
      QueryKey::CustomersList => seg(&["customers", "list"]),
      QueryKey::UsersList => seg(&["users", "list"]),
      QueryKey::UserDetail(id) => seg(&["users", "detail", &id.to_string()]),
      QueryKey::RolesList => seg(&["roles", "list"]),
      QueryKey::LeadStatusesList => seg(&["leadStatuses", "list"]),
      QueryKey::SourcesList => seg(&["sources", "list"]),
      QueryKey::WorkItemsList(f) => {
        let mut s = seg(&["workItems", "list"]);
        push_filter(&mut s, "customer", f.customer_id);
        push_filter(&mut s, "assignee", f.assigned_to);
        push_filter(&mut s, "status", f.status_id);
        s
      }
      QueryKey::WorkItemDetail(id) => seg(&["workItems", "detail", &id.to_string()]),
      QueryKey::WorkStatusesList => seg(&["workStatuses", "list"]),
      QueryKey::TasksList(f) => {
        let mut s = seg(&["tasks", "list"]);
        push_filter(&mut s, "customer", f.customer_id);
        push_filter(&mut s, "workItem", f.work_item_id);
        push_filter(&mut s, "assignee", f.assigned_to);
        push_filter(&mut s, "status", f.status_id);
        s
      }
      QueryKey::TaskDetail(id) => seg(&["tasks", "detail", &id.to_string()]),
      QueryKey::TasksByWorkItem(id) => seg(&["tasks", "byWorkItem", &id.to_string()]),
      QueryKey::CommunicationsList(f) => {
        let mut s = seg(&["communications", "list"]);
        push_filter(&mut s, "lead", f.lead_id);
        push_filter(&mut s, "createdBy", f.created_by);
        s
      }
      QueryKey::AuthMe => seg(&["auth", "me"]),
    }
  }

  /// Dotted form for log lines, e.g. `leads.detail.5`.
  pub fn describe(&self) -> String {
    self.segments().join(".")
  }
}

// Unset filter fields are omitted from the canonical form, so a filter set
// that only names `customer_id` renders the same key whether the other
// fields were defaulted or spelled out as None.
fn push_filter(segments: &mut Vec<String>, name: &str, value: Option<u64>) {
  if let Some(v) = value {
    segments.push(format!("{}={}", name, v));
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::collections::hash_map::DefaultHasher;
  use std::hash::{Hash, Hasher};

  fn hash_of(key: &QueryKey) -> u64 {
    let mut hasher = DefaultHasher::new();
    key.hash(&mut hasher);
    hasher.finish()
  }

  #[test]
  fn test_equal_filters_produce_equal_keys() {
    let a = QueryKey::TasksList(TaskFilters {
      work_item_id: Some(7),
      ..Default::default()
    });
    let b = QueryKey::TasksList(TaskFilters {
      customer_id: None,
      work_item_id: Some(7),
      assigned_to: None,
      status_id: None,
    });
    assert_eq!(a, b);
    assert_eq!(hash_of(&a), hash_of(&b));
    assert_eq!(a.segments(), b.segments());
  }

  #[test]
  fn test_unequal_filters_produce_unequal_keys() {
    let a = QueryKey::TasksList(TaskFilters {
      work_item_id: Some(7),
      ..Default::default()
    });
    let b = QueryKey::TasksList(TaskFilters {
      work_item_id: Some(8),
      ..Default::default()
    });
    assert_ne!(a, b);
    assert_ne!(a.segments(), b.segments());
  }

  #[test]
  fn test_detail_keys_differ_from_list_keys() {
    assert_ne!(QueryKey::LeadsList, QueryKey::LeadDetail(1));
    assert_eq!(QueryKey::LeadDetail(5).describe(), "leads.detail.5");
  }

  #[test]
  fn test_unset_filters_are_omitted_from_segments() {
    let key = QueryKey::WorkItemsList(WorkItemFilters::default());
    assert_eq!(key.segments(), vec!["workItems", "list"]);
  }

  #[test]
  fn test_resource_mapping() {
    assert_eq!(QueryKey::LeadsByStatus(3).resource(), Resource::Leads);
    assert_eq!(QueryKey::TasksByWorkItem(7).resource(), Resource::Tasks);
    assert_eq!(QueryKey::CustomersList.resource(), Resource::Customers);
  }
}

//! Declarative invalidation fan-out.
//!
//! Every mutation maps to the set of cache keys whose contents it can
//! affect, including cross-entity dependents: converting a Lead changes what
//! the customer view shows, task changes alter work-item rollups. The table
//! is a total match over [`MutationEvent`], so a missing resource/event pair
//! is a compile error rather than a silent no-op at runtime.

use super::key::{QueryKey, Resource};

/// A successful mutation, tagged with the ids the fan-out needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MutationEvent {
  LeadCreated,
  LeadUpdated { id: u64 },
  LeadDeleted { id: u64 },
  LeadConverted { id: u64 },
  CustomerCreated,
  UserCreated,
  UserUpdated { id: u64 },
  UserDeleted { id: u64 },
  WorkItemCreated,
  WorkItemUpdated { id: u64 },
  WorkItemDeleted { id: u64 },
  TaskCreated { work_item_id: Option<u64> },
  TaskUpdated { id: u64, work_item_id: Option<u64> },
  TaskDeleted { id: u64, work_item_id: Option<u64> },
  CommunicationCreated { lead_id: u64 },
  CommunicationUpdated { id: u64, lead_id: u64 },
  CommunicationDeleted { lead_id: u64 },
}

/// What a fan-out entry matches against live cache keys.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyPattern {
  /// Exactly this key.
  Exact(QueryKey),
  /// Every list-shaped key of the resource, whatever its filters.
  Lists(Resource),
}

impl KeyPattern {
  pub fn matches(&self, key: &QueryKey) -> bool {
    match self {
      KeyPattern::Exact(k) => k == key,
      KeyPattern::Lists(resource) => key.is_list() && key.resource() == *resource,
    }
  }
}

/// The keys a mutation invalidates.
pub fn invalidation_set(event: &MutationEvent) -> Vec<KeyPattern> {
  use KeyPattern::{Exact, Lists};

  match event {
    MutationEvent::LeadCreated => vec![Lists(Resource::Leads)],
    // A lead update can change data shown in the customer view, so the
    // customers list invalidates alongside the lead's own keys.
    MutationEvent::LeadUpdated { id } | MutationEvent::LeadConverted { id } => vec![
      Lists(Resource::Leads),
      Exact(QueryKey::LeadDetail(*id)),
      Exact(QueryKey::CustomersList),
    ],
    MutationEvent::LeadDeleted { id } => vec![
      Lists(Resource::Leads),
      Exact(QueryKey::LeadDetail(*id)),
      Exact(QueryKey::CustomersList),
    ],
    MutationEvent::CustomerCreated => {
      vec![Exact(QueryKey::CustomersList), Lists(Resource::Leads)]
    }
    MutationEvent::UserCreated => vec![Lists(Resource::Users)],
    MutationEvent::UserUpdated { id } | MutationEvent::UserDeleted { id } => {
      vec![Lists(Resource::Users), Exact(QueryKey::UserDetail(*id))]
    }
    MutationEvent::WorkItemCreated => vec![Lists(Resource::WorkItems), Lists(Resource::Tasks)],
    MutationEvent::WorkItemUpdated { id } | MutationEvent::WorkItemDeleted { id } => vec![
      Lists(Resource::WorkItems),
      Exact(QueryKey::WorkItemDetail(*id)),
      Lists(Resource::Tasks),
    ],
    MutationEvent::TaskCreated { work_item_id } => {
      let mut set = vec![Lists(Resource::Tasks)];
      if let Some(parent) = work_item_id {
        set.push(Exact(QueryKey::TasksByWorkItem(*parent)));
      }
      set.push(Lists(Resource::WorkItems));
      set
    }
    MutationEvent::TaskUpdated { id, work_item_id }
    | MutationEvent::TaskDeleted { id, work_item_id } => {
      let mut set = vec![Lists(Resource::Tasks), Exact(QueryKey::TaskDetail(*id))];
      if let Some(parent) = work_item_id {
        set.push(Exact(QueryKey::TasksByWorkItem(*parent)));
      }
      set.push(Lists(Resource::WorkItems));
      set
    }
    MutationEvent::CommunicationCreated { lead_id }
    | MutationEvent::CommunicationDeleted { lead_id } => {
      vec![Lists(Resource::Communications), Exact(QueryKey::LeadDetail(*lead_id))]
    }
    MutationEvent::CommunicationUpdated { id: _, lead_id } => {
      vec![Lists(Resource::Communications), Exact(QueryKey::LeadDetail(*lead_id))]
    }
  }
}

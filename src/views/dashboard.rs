//! Analytics over the cached entity lists.
//!
//! The stat functions are pure so they can be tested without a backend;
//! [`DashboardView::stats`] assembles their inputs with concurrent cached
//! reads and is what the CLI renders.

use std::collections::BTreeMap;

use crate::api::types::{Lead, Task, WorkItem, WorkStatus};
use crate::api::TaskFilters;
use crate::api::WorkItemFilters;
use crate::error::ApiError;
use crate::views::leads::LeadsView;
use crate::views::work::WorkView;

#[derive(Debug, Clone, PartialEq)]
pub struct StatusCount {
  pub name: String,
  pub count: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConversionPoint {
  /// Day in YYYY-MM-DD form.
  pub date: String,
  pub converted: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DashboardStats {
  pub leads_by_status: Vec<StatusCount>,
  /// Percentage with one decimal, e.g. 33.3.
  pub conversion_ratio: f64,
  pub average_tasks_per_work_item: f64,
  pub conversion_series: Vec<ConversionPoint>,
  pub average_task_turnaround_hours: f64,
  pub turnaround_buckets: Vec<StatusCount>,
  pub tasks_by_status: Vec<StatusCount>,
}

/// Leads per status name. Known statuses appear even at zero; leads whose
/// status is not embedded count under "UNKNOWN".
pub fn lead_counts_by_status(leads: &[Lead], statuses: &[String]) -> Vec<StatusCount> {
  let mut counts: BTreeMap<String, usize> = BTreeMap::new();
  let mut order: Vec<String> = Vec::new();
  for name in statuses {
    counts.insert(name.clone(), 0);
    order.push(name.clone());
  }
  for lead in leads {
    let name = lead
      .status
      .as_ref()
      .map(|s| s.name.clone())
      .unwrap_or_else(|| "UNKNOWN".to_string());
    if !counts.contains_key(&name) {
      order.push(name.clone());
    }
    *counts.entry(name).or_insert(0) += 1;
  }
  order
    .into_iter()
    .map(|name| {
      let count = counts.get(&name).copied().unwrap_or(0);
      StatusCount { name, count }
    })
    .collect()
}

/// Converted share of all leads as a percentage with one decimal.
pub fn conversion_ratio(leads: &[Lead]) -> f64 {
  let total = leads.len().max(1);
  let converted = leads.iter().filter(|l| l.is_converted).count();
  (converted as f64 / total as f64 * 1000.0).round() / 10.0
}

pub fn average_tasks_per_work_item(tasks: &[Task], work_items: &[WorkItem]) -> f64 {
  let count = work_items.len().max(1);
  (tasks.len() as f64 / count as f64 * 10.0).round() / 10.0
}

/// Converted leads grouped by the day of their last update, ascending.
pub fn conversion_series(leads: &[Lead]) -> Vec<ConversionPoint> {
  let mut by_day: BTreeMap<String, usize> = BTreeMap::new();
  for lead in leads.iter().filter(|l| l.is_converted) {
    let day = lead.updated_at.format("%Y-%m-%d").to_string();
    *by_day.entry(day).or_insert(0) += 1;
  }
  by_day
    .into_iter()
    .map(|(date, converted)| ConversionPoint { date, converted })
    .collect()
}

fn turnaround_hours(task: &Task) -> i64 {
  (task.updated_at - task.created_at).num_hours().max(0)
}

/// Mean whole-hours from creation to last update, one decimal. Zero when
/// there are no tasks.
pub fn average_task_turnaround_hours(tasks: &[Task]) -> f64 {
  if tasks.is_empty() {
    return 0.0;
  }
  let total: i64 = tasks.iter().map(turnaround_hours).sum();
  (total as f64 / tasks.len() as f64 * 10.0).round() / 10.0
}

const TURNAROUND_BUCKETS: [(&str, i64, i64); 4] = [
  ("< 24h", 0, 24),
  ("1-3d", 24, 72),
  ("3-7d", 72, 168),
  ("7d+", 168, i64::MAX),
];

pub fn turnaround_buckets(tasks: &[Task]) -> Vec<StatusCount> {
  let mut counts = [0usize; TURNAROUND_BUCKETS.len()];
  for task in tasks {
    let h = turnaround_hours(task);
    for (i, (_, lo, hi)) in TURNAROUND_BUCKETS.iter().enumerate() {
      if h >= *lo && h < *hi {
        counts[i] += 1;
        break;
      }
    }
  }
  TURNAROUND_BUCKETS
    .iter()
    .zip(counts)
    .map(|((name, _, _), count)| StatusCount {
      name: (*name).to_string(),
      count,
    })
    .collect()
}

/// Tasks per work status, in the status list's order. Tasks whose status is
/// not in the list are dropped.
pub fn tasks_by_status(tasks: &[Task], statuses: &[WorkStatus]) -> Vec<StatusCount> {
  let mut counts: BTreeMap<u64, usize> = BTreeMap::new();
  for task in tasks {
    let status_id = task.status_id.or_else(|| task.status.as_ref().map(|s| s.id));
    if let Some(id) = status_id {
      *counts.entry(id).or_insert(0) += 1;
    }
  }
  statuses
    .iter()
    .map(|s| StatusCount {
      name: s.name.clone(),
      count: counts.get(&s.id).copied().unwrap_or(0),
    })
    .collect()
}

#[derive(Clone)]
pub struct DashboardView {
  leads: LeadsView,
  work: WorkView,
}

impl DashboardView {
  pub fn new(leads: LeadsView, work: WorkView) -> Self {
    Self { leads, work }
  }

  /// All dashboard numbers in one shot. The four source lists load
  /// concurrently and each comes through the cache, so a dashboard render
  /// right after browsing leads reuses the entries it just populated.
  pub async fn stats(&self) -> Result<DashboardStats, ApiError> {
    let (leads, statuses, work_items, tasks, work_statuses) = tokio::try_join!(
      self.leads.leads(),
      self.leads.statuses(),
      self.work.work_items(WorkItemFilters::default()),
      self.work.tasks(TaskFilters::default()),
      self.work.work_statuses(),
    )?;

    let status_names: Vec<String> = statuses.iter().map(|s| s.name.clone()).collect();

    Ok(DashboardStats {
      leads_by_status: lead_counts_by_status(&leads, &status_names),
      conversion_ratio: conversion_ratio(&leads),
      average_tasks_per_work_item: average_tasks_per_work_item(&tasks, &work_items),
      conversion_series: conversion_series(&leads),
      average_task_turnaround_hours: average_task_turnaround_hours(&tasks),
      turnaround_buckets: turnaround_buckets(&tasks),
      tasks_by_status: tasks_by_status(&tasks, &work_statuses),
    })
  }
}

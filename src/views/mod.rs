//! Read/write surfaces the CLI renders, one per screen of the app.
//!
//! Each view owns a cache handle and the entity service it fronts; all of
//! its reads go through [`crate::cache::CacheClient::query`] and all of its
//! writes through [`crate::cache::CacheClient::mutate`], so staleness,
//! retry, and invalidation policy live in one place.

pub mod comms;
pub mod customers;
pub mod dashboard;
pub mod leads;
pub mod users;
pub mod work;

pub use comms::CommsView;
pub use customers::CustomersView;
pub use dashboard::{DashboardStats, DashboardView};
pub use leads::LeadsView;
pub use users::UsersView;
pub use work::WorkView;

use crate::error::ApiError;

/// A list read normalized for rendering: items are empty (never absent)
/// while unavailable, and the failure collapses to one user-facing string.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewData<T> {
  pub items: Vec<T>,
  pub error: Option<String>,
}

impl<T> ViewData<T> {
  pub fn from_result(result: Result<Vec<T>, ApiError>) -> Self {
    match result {
      Ok(items) => Self { items, error: None },
      Err(err) => Self {
        items: Vec::new(),
        error: Some(err.user_message()),
      },
    }
  }
}

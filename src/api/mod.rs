//! Entity services for the CRM REST backend.
//!
//! One service per resource; each attaches auth headers through the shared
//! [`HttpClient`] and normalizes the backend's success/error envelopes into
//! typed results.

pub mod auth;
pub mod comms;
pub mod http;
pub mod leads;
pub mod types;
pub mod users;
pub mod work;

pub use auth::{AuthApi, LoginRequest, SignupRequest};
pub use comms::{CommsApi, CommunicationFilters};
pub use http::HttpClient;
pub use leads::LeadsApi;
pub use users::UsersApi;
pub use work::{TaskFilters, WorkApi, WorkItemFilters};

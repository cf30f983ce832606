//! Client-side cache and mutation layer.
//!
//! Every read and write in the application flows through this module:
//! - Typed query keys with a canonical segment form ([`key`])
//! - Mutation events mapped to declarative invalidation sets ([`invalidation`])
//! - The in-memory entry store with de-duplication and gc ([`store`])
//! - The orchestration layer: stale-while-revalidate reads, retried and
//!   tracked writes, notices ([`layer`])

pub mod invalidation;
pub mod key;
pub mod layer;
pub mod store;

pub use invalidation::{invalidation_set, KeyPattern, MutationEvent};
pub use key::{QueryKey, Resource};
pub use layer::{CacheClient, MutationMessages, QueryOptions};

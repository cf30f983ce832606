//! In-memory cache map: entries, staleness, eviction, and in-flight state.
//!
//! The store is the only shared mutable state in the client. It is mutated
//! exclusively through [`super::layer::CacheClient`]; views and presentation
//! code never touch it directly. Values are held as `serde_json::Value` so
//! one map can carry every entity type, the same serialize-through-JSON
//! approach the storage layer would use for a persistent backend.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use serde_json::Value;
use tokio::sync::broadcast;
use tokio::time::{Duration, Instant};

use super::invalidation::KeyPattern;
use super::key::QueryKey;
use crate::error::ApiError;

/// Outcome of a fetch, broadcast to every coalesced waiter.
pub type FetchResult = Result<Value, ApiError>;

/// Per-key staleness and eviction windows.
#[derive(Debug, Clone, Copy)]
pub struct Freshness {
  pub stale_time: Duration,
  pub gc_time: Duration,
}

struct CacheEntry {
  value: Value,
  fetched_at: Instant,
  last_used: Instant,
  freshness: Freshness,
  invalidated: bool,
}

impl CacheEntry {
  fn is_stale(&self, now: Instant) -> bool {
    self.invalidated || now.duration_since(self.fetched_at) >= self.freshness.stale_time
  }

  fn is_expired(&self, now: Instant) -> bool {
    now.duration_since(self.last_used) > self.freshness.gc_time
  }
}

/// What the caller should do after looking up a key.
pub enum ReadPlan {
  /// Entry is fresh: use this value as-is.
  ServeFresh(Value),
  /// Entry is stale: serve the cached value now. `flight` holds the refresh
  /// ownership when this caller must revalidate in the background; `None`
  /// when a refresh is already in progress.
  ServeStale {
    value: Value,
    flight: Option<FlightGuard>,
  },
  /// No entry, another caller is already fetching: await its result.
  Join(broadcast::Receiver<FetchResult>),
  /// No entry, no flight: this caller fetches inline.
  Fetch(FlightGuard),
}

struct Flight {
  id: u64,
  tx: broadcast::Sender<FetchResult>,
}

#[derive(Default)]
struct Inner {
  entries: HashMap<QueryKey, CacheEntry>,
  flights: HashMap<QueryKey, Flight>,
  next_flight_id: u64,
}

/// Shared in-memory cache map plus the in-flight request table.
#[derive(Default)]
pub struct CacheStore {
  inner: Arc<Mutex<Inner>>,
}

/// Ownership of one in-flight fetch. If the owning read is dropped before
/// [`CacheStore::complete`] runs, the guard unregisters the flight so joined
/// readers wake with a closed channel and the key goes cold again instead of
/// waiting on a fetch that will never land.
pub struct FlightGuard {
  inner: Arc<Mutex<Inner>>,
  key: QueryKey,
  id: u64,
}

impl Drop for FlightGuard {
  fn drop(&mut self) {
    // The id check keeps a late guard from tearing down a successor flight
    // registered after this one completed.
    if let Ok(mut inner) = self.inner.lock() {
      let owned = inner
        .flights
        .get(&self.key)
        .is_some_and(|flight| flight.id == self.id);
      if owned {
        inner.flights.remove(&self.key);
      }
    }
  }
}

impl CacheStore {
  pub fn new() -> Self {
    Self::default()
  }

  /// Look up `key` and decide how the read proceeds. Registers a flight when
  /// this caller is responsible for fetching or revalidating.
  pub fn begin_read(&self, key: &QueryKey, freshness: Freshness) -> ReadPlan {
    let now = Instant::now();
    let mut inner = self.lock();
    sweep(&mut inner, now);

    if let Some(entry) = inner.entries.get_mut(key) {
      entry.last_used = now;
      // The caller's windows apply from this read on, so a screen with a
      // shorter stale time is not stuck with whoever fetched first.
      entry.freshness = freshness;
      if !entry.is_stale(now) {
        return ReadPlan::ServeFresh(entry.value.clone());
      }

      let value = entry.value.clone();
      let flight = if inner.flights.contains_key(key) {
        None
      } else {
        Some(register_flight(&mut inner, &self.inner, key))
      };
      return ReadPlan::ServeStale { value, flight };
    }

    if let Some(flight) = inner.flights.get(key) {
      return ReadPlan::Join(flight.tx.subscribe());
    }

    let guard = register_flight(&mut inner, &self.inner, key);
    ReadPlan::Fetch(guard)
  }

  /// Record a fetch outcome: store the value on success, clear the flight,
  /// and wake every coalesced waiter. A failed refresh leaves the previous
  /// entry in place (still stale) rather than dropping data.
  pub fn complete(&self, key: &QueryKey, result: FetchResult, freshness: Freshness) {
    let now = Instant::now();
    let mut inner = self.lock();

    if let Ok(value) = &result {
      inner.entries.insert(
        key.clone(),
        CacheEntry {
          value: value.clone(),
          fetched_at: now,
          last_used: now,
          freshness,
          invalidated: false,
        },
      );
    }

    if let Some(flight) = inner.flights.remove(key) {
      // Ignore send errors - every waiter may have been dropped
      let _ = flight.tx.send(result);
    }
  }

  /// Mark every entry matching one of `patterns` stale. Returns how many
  /// live entries were hit, for logging.
  pub fn invalidate_matching(&self, patterns: &[KeyPattern]) -> usize {
    let mut inner = self.lock();
    let mut hit = 0;
    for (key, entry) in inner.entries.iter_mut() {
      if !entry.invalidated && patterns.iter().any(|p| p.matches(key)) {
        entry.invalidated = true;
        hit += 1;
      }
    }
    hit
  }

  /// Mark exactly one key stale (explicit refetch requests).
  pub fn invalidate(&self, key: &QueryKey) {
    let mut inner = self.lock();
    if let Some(entry) = inner.entries.get_mut(key) {
      entry.invalidated = true;
    }
  }

  #[cfg(test)]
  pub fn contains(&self, key: &QueryKey) -> bool {
    self.lock().entries.contains_key(key)
  }

  fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
    // A poisoned lock means a panic mid-update; propagating the panic is the
    // only sound option for an in-memory map.
    match self.inner.lock() {
      Ok(guard) => guard,
      Err(poisoned) => panic!("cache lock poisoned: {}", poisoned),
    }
  }
}

/// Drop entries idle past their gc window; the next read for such a key
/// performs a full fetch as if cold.
fn sweep(inner: &mut Inner, now: Instant) {
  inner.entries.retain(|_, entry| !entry.is_expired(now));
}

fn register_flight(inner: &mut Inner, shared: &Arc<Mutex<Inner>>, key: &QueryKey) -> FlightGuard {
  let (tx, _) = broadcast::channel(8);
  let id = inner.next_flight_id;
  inner.next_flight_id += 1;
  inner.flights.insert(key.clone(), Flight { id, tx });
  FlightGuard {
    inner: Arc::clone(shared),
    key: key.clone(),
    id,
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::cache::invalidation::KeyPattern;
  use crate::cache::key::Resource;
  use serde_json::json;

  fn freshness(stale_ms: u64, gc_ms: u64) -> Freshness {
    Freshness {
      stale_time: Duration::from_millis(stale_ms),
      gc_time: Duration::from_millis(gc_ms),
    }
  }

  fn own_fetch(plan: ReadPlan) -> FlightGuard {
    match plan {
      ReadPlan::Fetch(guard) => guard,
      _ => panic!("expected cold fetch"),
    }
  }

  #[tokio::test]
  async fn test_fresh_entry_served_without_flight() {
    let store = CacheStore::new();
    let key = QueryKey::LeadsList;
    let f = freshness(60_000, 600_000);

    let guard = own_fetch(store.begin_read(&key, f));
    store.complete(&key, Ok(json!([1])), f);
    drop(guard);

    match store.begin_read(&key, f) {
      ReadPlan::ServeFresh(v) => assert_eq!(v, json!([1])),
      _ => panic!("expected fresh hit"),
    }
  }

  #[tokio::test]
  async fn test_concurrent_cold_readers_join_one_flight() {
    let store = CacheStore::new();
    let key = QueryKey::LeadsList;
    let f = freshness(60_000, 600_000);

    let _guard = own_fetch(store.begin_read(&key, f));
    assert!(matches!(store.begin_read(&key, f), ReadPlan::Join(_)));
    assert!(matches!(store.begin_read(&key, f), ReadPlan::Join(_)));
  }

  #[tokio::test]
  async fn test_dropped_flight_wakes_joiners_and_clears_key() {
    let store = CacheStore::new();
    let key = QueryKey::LeadsList;
    let f = freshness(60_000, 600_000);

    let guard = own_fetch(store.begin_read(&key, f));
    let mut rx = match store.begin_read(&key, f) {
      ReadPlan::Join(rx) => rx,
      _ => panic!("expected join"),
    };

    // The owning read is dropped without completing. Joiners see the
    // channel close and the key is cold again, not stuck joining.
    drop(guard);
    assert!(rx.recv().await.is_err());
    assert!(matches!(store.begin_read(&key, f), ReadPlan::Fetch(_)));
  }

  #[tokio::test]
  async fn test_late_guard_leaves_successor_flight_alone() {
    let store = CacheStore::new();
    let key = QueryKey::LeadsList;
    let f = freshness(60_000, 600_000);

    let first = own_fetch(store.begin_read(&key, f));
    store.complete(&key, Err(ApiError::Network("down".into())), f);

    let _second = own_fetch(store.begin_read(&key, f));
    drop(first);
    assert!(matches!(store.begin_read(&key, f), ReadPlan::Join(_)));
  }

  #[tokio::test]
  async fn test_stale_entry_revalidates_once() {
    let store = CacheStore::new();
    let key = QueryKey::LeadsList;
    let f = freshness(0, 600_000);

    let guard = own_fetch(store.begin_read(&key, f));
    store.complete(&key, Ok(json!([1])), f);
    drop(guard);

    // stale_time zero: immediately stale, first reader owns the refresh
    let owner = match store.begin_read(&key, f) {
      ReadPlan::ServeStale { flight, .. } => flight,
      _ => panic!("expected stale serve"),
    };
    assert!(owner.is_some());
    match store.begin_read(&key, f) {
      ReadPlan::ServeStale { flight, .. } => assert!(flight.is_none()),
      _ => panic!("expected stale serve"),
    }
  }

  #[tokio::test]
  async fn test_read_applies_its_own_staleness_window() {
    let store = CacheStore::new();
    let key = QueryKey::LeadsList;
    let long = freshness(60_000, 600_000);
    let zero = freshness(0, 600_000);

    let guard = own_fetch(store.begin_read(&key, long));
    store.complete(&key, Ok(json!([1])), long);
    drop(guard);

    assert!(matches!(
      store.begin_read(&key, long),
      ReadPlan::ServeFresh(_)
    ));
    assert!(matches!(
      store.begin_read(&key, zero),
      ReadPlan::ServeStale { .. }
    ));
  }

  #[tokio::test(start_paused = true)]
  async fn test_idle_entry_evicted_after_gc_time() {
    let store = CacheStore::new();
    let key = QueryKey::LeadsList;
    let f = freshness(60_000, 10);

    let guard = own_fetch(store.begin_read(&key, f));
    store.complete(&key, Ok(json!([1])), f);
    drop(guard);
    assert!(store.contains(&key));

    tokio::time::sleep(Duration::from_millis(20)).await;

    // Past the gc window the entry is gone and the read is cold again.
    assert!(matches!(store.begin_read(&key, f), ReadPlan::Fetch(_)));
  }

  #[tokio::test]
  async fn test_failed_refresh_keeps_previous_value() {
    let store = CacheStore::new();
    let key = QueryKey::LeadsList;
    let f = freshness(0, 600_000);

    let guard = own_fetch(store.begin_read(&key, f));
    store.complete(&key, Ok(json!([1])), f);
    drop(guard);

    assert!(matches!(
      store.begin_read(&key, f),
      ReadPlan::ServeStale { .. }
    ));
    store.complete(&key, Err(ApiError::Network("down".into())), f);

    match store.begin_read(&key, f) {
      ReadPlan::ServeStale { value, .. } => assert_eq!(value, json!([1])),
      _ => panic!("expected stale serve of retained value"),
    }
  }

  #[tokio::test]
  async fn test_invalidation_marks_matching_entries() {
    let store = CacheStore::new();
    let f = freshness(60_000, 600_000);
    for key in [
      QueryKey::LeadsList,
      QueryKey::LeadDetail(5),
      QueryKey::UsersList,
    ] {
      let guard = own_fetch(store.begin_read(&key, f));
      store.complete(&key, Ok(json!(null)), f);
      drop(guard);
    }

    let hit = store.invalidate_matching(&[
      KeyPattern::Lists(Resource::Leads),
      KeyPattern::Exact(QueryKey::LeadDetail(5)),
    ]);
    assert_eq!(hit, 2);

    assert!(matches!(
      store.begin_read(&QueryKey::LeadsList, f),
      ReadPlan::ServeStale { .. }
    ));
    assert!(matches!(
      store.begin_read(&QueryKey::UsersList, f),
      ReadPlan::ServeFresh(_)
    ));
  }
}

//! The single entry/exit point for all reads and writes against the entity
//! services: cached reads with stale-while-revalidate and request
//! de-duplication, tracked writes with declarative invalidation fan-out.

use std::future::Future;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tokio::time::{sleep, Duration};
use tracing::{debug, warn};

use super::invalidation::{invalidation_set, MutationEvent};
use super::key::QueryKey;
use super::store::{CacheStore, FetchResult, Freshness, ReadPlan};
use crate::error::ApiError;
use crate::notify::Notifier;

/// Reads get the initial attempt plus this many retries.
const READ_RETRIES: u32 = 2;
/// Mutations get at most one retry, and only for server-side failures.
const MUTATION_RETRIES: u32 = 1;

const BACKOFF_BASE_MS: u64 = 1000;
const BACKOFF_CAP_MS: u64 = 30_000;

/// Default windows matching the original query-client configuration.
pub const DEFAULT_STALE_TIME: Duration = Duration::from_secs(5 * 60);
pub const DEFAULT_GC_TIME: Duration = Duration::from_secs(10 * 60);

/// Per-query staleness overrides; gc defaults from the client.
#[derive(Debug, Clone, Copy)]
pub struct QueryOptions {
  pub stale_time: Duration,
  pub gc_time: Duration,
}

impl Default for QueryOptions {
  fn default() -> Self {
    Self {
      stale_time: DEFAULT_STALE_TIME,
      gc_time: DEFAULT_GC_TIME,
    }
  }
}

impl QueryOptions {
  /// Same gc window, different staleness; how views derive per-resource
  /// options from the client defaults.
  pub fn with_stale(self, stale_time: Duration) -> Self {
    Self { stale_time, ..self }
  }
}

/// Messages for the notification surface around one mutation.
#[derive(Debug, Clone, Copy)]
pub struct MutationMessages {
  pub success: &'static str,
  pub failure: &'static str,
}

/// Cache & mutation layer handle.
///
/// Constructed once at startup and passed by clone; the inner store is
/// shared through an `Arc`, so there is no global singleton to reach for.
#[derive(Clone)]
pub struct CacheClient {
  store: Arc<CacheStore>,
  defaults: QueryOptions,
  notifier: Notifier,
}

impl CacheClient {
  pub fn new(defaults: QueryOptions, notifier: Notifier) -> Self {
    Self {
      store: Arc::new(CacheStore::new()),
      defaults,
      notifier,
    }
  }

  pub fn defaults(&self) -> QueryOptions {
    self.defaults
  }

  /// Cached read for `key`.
  ///
  /// A fresh entry is served immediately. A stale entry is served while a
  /// background refetch runs (stale-while-revalidate). A cold key blocks on
  /// the fetch, and concurrent cold readers of the same key coalesce onto a
  /// single service call. Failures retry per the read policy: up to
  /// [`READ_RETRIES`] extra attempts with exponential backoff, never for
  /// auth or other client errors.
  pub async fn query<T, F, Fut>(
    &self,
    key: QueryKey,
    options: QueryOptions,
    fetch: F,
  ) -> Result<T, ApiError>
  where
    T: Serialize + DeserializeOwned + Send,
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T, ApiError>> + Send + 'static,
  {
    let freshness = Freshness {
      stale_time: options.stale_time,
      gc_time: options.gc_time,
    };

    match self.store.begin_read(&key, freshness) {
      ReadPlan::ServeFresh(value) => decode(value),
      ReadPlan::ServeStale { value, flight } => {
        if let Some(flight) = flight {
          debug!(key = %key.describe(), "stale entry, revalidating in background");
          let store = Arc::clone(&self.store);
          let bg_key = key.clone();
          tokio::spawn(async move {
            let result = fetch_with_retry(&fetch, READ_RETRIES).await;
            if let Err(err) = &result {
              warn!(key = %bg_key.describe(), error = %err, "background revalidation failed");
            }
            store.complete(&bg_key, result, freshness);
            drop(flight);
          });
        }
        decode(value)
      }
      ReadPlan::Join(mut rx) => {
        debug!(key = %key.describe(), "joining in-flight request");
        match rx.recv().await {
          Ok(result) => result.and_then(decode),
          // Sender dropped without sending - the owning fetch was cancelled
          Err(_) => Err(ApiError::Network("request cancelled".to_string())),
        }
      }
      ReadPlan::Fetch(flight) => {
        debug!(key = %key.describe(), "cache miss, fetching");
        // Dropping `flight` before `complete` (this future cancelled
        // mid-fetch) releases the key so the next read starts cold.
        let result = fetch_with_retry(&fetch, READ_RETRIES).await;
        self.store.complete(&key, result.clone(), freshness);
        drop(flight);
        result.and_then(decode)
      }
    }
  }

  /// Tracked write.
  ///
  /// Runs the service call with at most one retry (server/transport failures
  /// only), fans invalidation out across the registry-declared key set on
  /// success, and raises exactly one success or error notice either way.
  /// On failure the cache is left untouched.
  pub async fn mutate<T, F, Fut>(
    &self,
    event: MutationEvent,
    messages: MutationMessages,
    op: F,
  ) -> Result<T, ApiError>
  where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T, ApiError>>,
  {
    let mut attempt = 0;
    let result = loop {
      match op().await {
        Ok(data) => break Ok(data),
        Err(err) if err.is_retryable() && attempt < MUTATION_RETRIES => {
          debug!(error = %err, attempt, "mutation failed, retrying");
          sleep(backoff_delay(attempt)).await;
          attempt += 1;
        }
        Err(err) => break Err(err),
      }
    };

    match result {
      Ok(data) => {
        let patterns = invalidation_set(&event);
        let hit = self.store.invalidate_matching(&patterns);
        debug!(?event, hit, "mutation succeeded, invalidated dependent keys");
        self.notifier.success(messages.success);
        Ok(data)
      }
      Err(err) => {
        let mut message = err.user_message();
        if message.is_empty() {
          message = messages.failure.to_string();
        }
        self.notifier.error(message);
        Err(err)
      }
    }
  }

  /// Mark one key stale so the next read refetches (explicit refresh).
  pub fn invalidate(&self, key: &QueryKey) {
    self.store.invalidate(key);
  }
}

fn decode<T: DeserializeOwned>(value: Value) -> Result<T, ApiError> {
  serde_json::from_value(value)
    .map_err(|_| ApiError::Malformed("cached value had an unexpected shape".to_string()))
}

async fn fetch_with_retry<T, F, Fut>(fetch: &F, max_retries: u32) -> FetchResult
where
  T: Serialize,
  F: Fn() -> Fut,
  Fut: Future<Output = Result<T, ApiError>>,
{
  let mut attempt = 0;
  loop {
    match fetch().await {
      Ok(data) => {
        return serde_json::to_value(data).map_err(|e| ApiError::Malformed(e.to_string()))
      }
      Err(err) if err.is_retryable() && attempt < max_retries => {
        debug!(error = %err, attempt, "fetch failed, retrying");
        sleep(backoff_delay(attempt)).await;
        attempt += 1;
      }
      Err(err) => return Err(err),
    }
  }
}

/// Exponential backoff: 1s, 2s, 4s... capped at 30s.
fn backoff_delay(attempt: u32) -> Duration {
  Duration::from_millis((BACKOFF_BASE_MS << attempt).min(BACKOFF_CAP_MS))
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::notify::Notice;
  use std::pin::Pin;
  use std::sync::atomic::{AtomicU32, Ordering};

  type BoxedFetch<T> =
    Box<dyn Fn() -> Pin<Box<dyn Future<Output = Result<T, ApiError>> + Send>> + Send + Sync>;

  fn client() -> (CacheClient, tokio::sync::mpsc::UnboundedReceiver<Notice>) {
    let (notifier, notices) = Notifier::new();
    (CacheClient::new(QueryOptions::default(), notifier), notices)
  }

  fn counted_fetch(calls: Arc<AtomicU32>, value: Vec<u32>) -> BoxedFetch<Vec<u32>> {
    Box::new(move || {
      calls.fetch_add(1, Ordering::SeqCst);
      let value = value.clone();
      Box::pin(async move {
        tokio::time::sleep(Duration::from_millis(5)).await;
        Ok(value)
      })
    })
  }

  /// Fetcher that returns the zero-based call number as its value.
  fn sequence_fetch(calls: Arc<AtomicU32>) -> BoxedFetch<Vec<u32>> {
    Box::new(move || {
      let n = calls.fetch_add(1, Ordering::SeqCst);
      Box::pin(async move { Ok(vec![n]) })
    })
  }

  #[tokio::test(start_paused = true)]
  async fn test_concurrent_reads_deduplicate_to_one_call() {
    let (client, _notices) = client();
    let calls = Arc::new(AtomicU32::new(0));

    let q = || {
      client.query(
        QueryKey::LeadsList,
        QueryOptions::default(),
        counted_fetch(Arc::clone(&calls), vec![1, 2, 3]),
      )
    };

    let (a, b, c) = tokio::join!(q(), q(), q());
    assert_eq!(a.unwrap(), vec![1, 2, 3]);
    assert_eq!(b.unwrap(), vec![1, 2, 3]);
    assert_eq!(c.unwrap(), vec![1, 2, 3]);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
  }

  #[tokio::test(start_paused = true)]
  async fn test_fresh_hit_skips_the_fetcher() {
    let (client, _notices) = client();
    let calls = Arc::new(AtomicU32::new(0));

    for _ in 0..3 {
      let data: Vec<u32> = client
        .query(
          QueryKey::UsersList,
          QueryOptions::default(),
          counted_fetch(Arc::clone(&calls), vec![9]),
        )
        .await
        .unwrap();
      assert_eq!(data, vec![9]);
    }
    assert_eq!(calls.load(Ordering::SeqCst), 1);
  }

  #[tokio::test(start_paused = true)]
  async fn test_stale_read_serves_old_value_and_revalidates() {
    let (client, _notices) = client();
    let calls = Arc::new(AtomicU32::new(0));
    let opts = QueryOptions {
      stale_time: Duration::ZERO,
      gc_time: Duration::from_secs(600),
    };

    // Cold read fetches and caches [0].
    let first: Vec<u32> = client
      .query(QueryKey::LeadsList, opts, sequence_fetch(Arc::clone(&calls)))
      .await
      .unwrap();
    assert_eq!(first, vec![0]);

    // Stale read returns the previous value immediately...
    let second: Vec<u32> = client
      .query(QueryKey::LeadsList, opts, sequence_fetch(Arc::clone(&calls)))
      .await
      .unwrap();
    assert_eq!(second, vec![0]);

    // ...while the background refetch lands the new one.
    tokio::time::sleep(Duration::from_millis(50)).await;
    let third: Vec<u32> = client
      .query(QueryKey::LeadsList, opts, sequence_fetch(Arc::clone(&calls)))
      .await
      .unwrap();
    assert_eq!(third, vec![1]);
    // The third read owns its own background refresh.
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(calls.load(Ordering::SeqCst), 3);
  }

  #[tokio::test(start_paused = true)]
  async fn test_server_errors_retry_up_to_three_attempts() {
    let (client, _notices) = client();
    let calls = Arc::new(AtomicU32::new(0));

    let fetch: BoxedFetch<Vec<u32>> = {
      let calls = Arc::clone(&calls);
      Box::new(move || {
        let n = calls.fetch_add(1, Ordering::SeqCst);
        Box::pin(async move {
          if n < 2 {
            Err(ApiError::Server {
              status: 500,
              message: "boom".into(),
            })
          } else {
            Ok(vec![7u32])
          }
        })
      })
    };

    let data: Vec<u32> = client
      .query(QueryKey::LeadsList, QueryOptions::default(), fetch)
      .await
      .unwrap();
    assert_eq!(data, vec![7]);
    assert_eq!(calls.load(Ordering::SeqCst), 3);
  }

  #[tokio::test(start_paused = true)]
  async fn test_client_errors_never_retry() {
    let (client, _notices) = client();
    let calls = Arc::new(AtomicU32::new(0));

    let fetch: BoxedFetch<Vec<u32>> = {
      let calls = Arc::clone(&calls);
      Box::new(move || {
        calls.fetch_add(1, Ordering::SeqCst);
        Box::pin(async move {
          Err(ApiError::Client {
            status: 422,
            message: "bad input".into(),
          })
        })
      })
    };

    let err = client
      .query::<Vec<u32>, _, _>(QueryKey::LeadsList, QueryOptions::default(), fetch)
      .await
      .unwrap_err();
    assert!(matches!(err, ApiError::Client { .. }));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
  }

  #[tokio::test(start_paused = true)]
  async fn test_auth_errors_never_retry() {
    let (client, _notices) = client();
    let calls = Arc::new(AtomicU32::new(0));

    let fetch: BoxedFetch<Vec<u32>> = {
      let calls = Arc::clone(&calls);
      Box::new(move || {
        calls.fetch_add(1, Ordering::SeqCst);
        Box::pin(async move {
          Err(ApiError::Auth {
            status: 401,
            message: "expired".into(),
          })
        })
      })
    };

    let err = client
      .query::<Vec<u32>, _, _>(QueryKey::LeadsList, QueryOptions::default(), fetch)
      .await
      .unwrap_err();
    assert!(matches!(err, ApiError::Auth { .. }));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
  }

  #[tokio::test(start_paused = true)]
  async fn test_successful_mutation_invalidates_and_notifies_once() {
    let (client, mut notices) = client();
    let calls = Arc::new(AtomicU32::new(0));

    // Prime the leads list.
    let _: Vec<u32> = client
      .query(
        QueryKey::LeadsList,
        QueryOptions::default(),
        sequence_fetch(Arc::clone(&calls)),
      )
      .await
      .unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    client
      .mutate(
        MutationEvent::LeadCreated,
        MutationMessages {
          success: "Lead created successfully!",
          failure: "Failed to create lead",
        },
        || async { Ok::<_, ApiError>(()) },
      )
      .await
      .unwrap();

    assert_eq!(
      notices.try_recv().unwrap(),
      Notice::Success("Lead created successfully!".to_string())
    );
    assert!(notices.try_recv().is_err(), "exactly one notice expected");

    // The invalidated list refetches on next access (served stale, then
    // refreshed in the background).
    let _: Vec<u32> = client
      .query(
        QueryKey::LeadsList,
        QueryOptions::default(),
        sequence_fetch(Arc::clone(&calls)),
      )
      .await
      .unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(calls.load(Ordering::SeqCst), 2);
  }

  #[tokio::test(start_paused = true)]
  async fn test_failed_mutation_notifies_once_and_leaves_cache_alone() {
    let (client, mut notices) = client();
    let calls = Arc::new(AtomicU32::new(0));

    let _: Vec<u32> = client
      .query(
        QueryKey::LeadsList,
        QueryOptions::default(),
        counted_fetch(Arc::clone(&calls), vec![1]),
      )
      .await
      .unwrap();

    let err = client
      .mutate(
        MutationEvent::LeadCreated,
        MutationMessages {
          success: "Lead created successfully!",
          failure: "Failed to create lead",
        },
        || async {
          Err::<(), _>(ApiError::Client {
            status: 400,
            message: "A lead with this email already exists".into(),
          })
        },
      )
      .await
      .unwrap_err();
    assert!(matches!(err, ApiError::Client { .. }));

    assert_eq!(
      notices.try_recv().unwrap(),
      Notice::Error("A lead with this email already exists".to_string())
    );
    assert!(notices.try_recv().is_err(), "exactly one notice expected");

    // The cached list is still fresh: no refetch on next read.
    let _: Vec<u32> = client
      .query(
        QueryKey::LeadsList,
        QueryOptions::default(),
        counted_fetch(Arc::clone(&calls), vec![1]),
      )
      .await
      .unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 1);
  }

  #[tokio::test(start_paused = true)]
  async fn test_mutation_retries_server_errors_once() {
    let (client, _notices) = client();
    let calls = Arc::new(AtomicU32::new(0));

    let op = {
      let calls = Arc::clone(&calls);
      move || {
        let n = calls.fetch_add(1, Ordering::SeqCst);
        async move {
          if n == 0 {
            Err(ApiError::Server {
              status: 503,
              message: "unavailable".into(),
            })
          } else {
            Ok(())
          }
        }
      }
    };

    client
      .mutate(
        MutationEvent::LeadCreated,
        MutationMessages {
          success: "ok",
          failure: "failed",
        },
        op,
      )
      .await
      .unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 2);
  }

  #[tokio::test(start_paused = true)]
  async fn test_mutation_does_not_retry_client_errors() {
    let (client, _notices) = client();
    let calls = Arc::new(AtomicU32::new(0));

    let op = {
      let calls = Arc::clone(&calls);
      move || {
        calls.fetch_add(1, Ordering::SeqCst);
        async move {
          Err::<(), _>(ApiError::Client {
            status: 400,
            message: "nope".into(),
          })
        }
      }
    };

    let _ = client
      .mutate(
        MutationEvent::LeadCreated,
        MutationMessages {
          success: "ok",
          failure: "failed",
        },
        op,
      )
      .await;
    assert_eq!(calls.load(Ordering::SeqCst), 1);
  }

  #[tokio::test(start_paused = true)]
  async fn test_gc_evicts_then_cold_fetch() {
    let (client, _notices) = client();
    let calls = Arc::new(AtomicU32::new(0));
    let opts = QueryOptions {
      stale_time: Duration::from_secs(600),
      gc_time: Duration::from_millis(10),
    };

    let _: Vec<u32> = client
      .query(
        QueryKey::LeadsList,
        opts,
        counted_fetch(Arc::clone(&calls), vec![1]),
      )
      .await
      .unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    tokio::time::sleep(Duration::from_millis(20)).await;

    let data: Vec<u32> = client
      .query(
        QueryKey::LeadsList,
        opts,
        counted_fetch(Arc::clone(&calls), vec![2]),
      )
      .await
      .unwrap();
    // Cold again: full blocking fetch, new value.
    assert_eq!(data, vec![2]);
    assert_eq!(calls.load(Ordering::SeqCst), 2);
  }

  #[tokio::test(start_paused = true)]
  async fn test_cancelled_cold_read_leaves_key_cold() {
    let (client, _notices) = client();
    let calls = Arc::new(AtomicU32::new(0));

    let owner = tokio::spawn({
      let client = client.clone();
      let fetch = counted_fetch(Arc::clone(&calls), vec![1]);
      async move {
        let _: Result<Vec<u32>, _> = client
          .query(QueryKey::LeadsList, QueryOptions::default(), fetch)
          .await;
      }
    });

    // Let the owner register its flight and park in the fetch, then drop it
    // mid-flight.
    tokio::task::yield_now().await;
    owner.abort();
    let _ = owner.await;

    // The key must be cold again, not stuck joining a fetch that will never
    // land.
    let data: Vec<u32> = client
      .query(
        QueryKey::LeadsList,
        QueryOptions::default(),
        counted_fetch(Arc::clone(&calls), vec![2]),
      )
      .await
      .unwrap();
    assert_eq!(data, vec![2]);
    assert_eq!(calls.load(Ordering::SeqCst), 2);
  }

  #[tokio::test(start_paused = true)]
  async fn test_joined_read_errors_when_owner_is_cancelled() {
    let (client, _notices) = client();

    let owner = tokio::spawn({
      let client = client.clone();
      let fetch: BoxedFetch<Vec<u32>> = Box::new(|| {
        Box::pin(async {
          tokio::time::sleep(Duration::from_secs(60)).await;
          Ok(vec![1])
        })
      });
      async move {
        let _: Result<Vec<u32>, _> = client
          .query(QueryKey::LeadsList, QueryOptions::default(), fetch)
          .await;
      }
    });
    tokio::task::yield_now().await;

    let joiner = tokio::spawn({
      let client = client.clone();
      let fetch: BoxedFetch<Vec<u32>> = Box::new(|| Box::pin(async { Ok(vec![2]) }));
      async move {
        client
          .query::<Vec<u32>, _, _>(QueryKey::LeadsList, QueryOptions::default(), fetch)
          .await
      }
    });
    tokio::task::yield_now().await;

    owner.abort();
    let _ = owner.await;

    // Joiners get a network-class error instead of hanging.
    let err = joiner.await.unwrap().unwrap_err();
    assert!(matches!(err, ApiError::Network(_)));
  }
}

//! Request memoization for safe retries.
//!
//! Every side-effecting handshake step runs through [`OpCache`], so a
//! retried `start()` replays only the steps that had not yet succeeded:
//! identical concurrent calls share one in-flight future, resolved results
//! are served until their TTL deadline, and rejections are never cached.

use authgate_core::{AuthGateError, Result};
use futures::future::{BoxFuture, FutureExt, Shared};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Mutex;
use std::time::{Duration, Instant};

type SharedOutcome = std::result::Result<Value, AuthGateError>;
type InFlight = Shared<BoxFuture<'static, SharedOutcome>>;

enum Slot {
    InFlight(InFlight),
    Ready { value: Value, expires_at: Instant },
}

/// Keyed memoization of async results.
///
/// The key is the operation name plus the deep-equal JSON form of its
/// arguments; results round-trip through JSON so one cache serves every
/// response type.
#[derive(Default)]
pub struct OpCache {
    slots: Mutex<HashMap<(String, String), Slot>>,
}

enum Plan {
    Hit(Value),
    Join(InFlight),
    Run(InFlight),
}

impl OpCache {
    /// Create an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `f` at most once per `(op, args)` within `ttl`.
    ///
    /// Concurrent identical calls await the same in-flight future. A
    /// failed call is evicted immediately, so the next attempt re-invokes
    /// `f`.
    pub async fn cached<T, A, F, Fut>(&self, op: &str, args: &A, ttl: Duration, f: F) -> Result<T>
    where
        A: Serialize + ?Sized,
        T: Serialize + DeserializeOwned + Send + 'static,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>> + Send + 'static,
    {
        let args_key = serde_json::to_string(args)
            .map_err(|e| AuthGateError::Internal(format!("unencodable cache arguments: {e}")))?;
        let key = (op.to_string(), args_key);

        let plan = {
            let mut slots = self.lock_slots()?;
            match slots.get(&key) {
                Some(Slot::Ready { value, expires_at }) if *expires_at > Instant::now() => {
                    Plan::Hit(value.clone())
                }
                Some(Slot::InFlight(shared)) => Plan::Join(shared.clone()),
                _ => {
                    let fut = f();
                    let shared: InFlight = async move {
                        match fut.await {
                            Ok(value) => serde_json::to_value(value).map_err(|e| {
                                AuthGateError::Internal(format!("unencodable cache value: {e}"))
                            }),
                            Err(e) => Err(e),
                        }
                    }
                    .boxed()
                    .shared();
                    slots.insert(key.clone(), Slot::InFlight(shared.clone()));
                    Plan::Run(shared)
                }
            }
        };

        match plan {
            Plan::Hit(value) => {
                tracing::debug!(op, "Serving memoized result");
                decode(value)
            }
            Plan::Join(shared) => shared.await.and_then(decode),
            Plan::Run(shared) => {
                let outcome = shared.await;
                // The creating call does the bookkeeping; joiners only read.
                let mut slots = self.lock_slots()?;
                match &outcome {
                    Ok(value) => {
                        slots.insert(
                            key,
                            Slot::Ready {
                                value: value.clone(),
                                expires_at: Instant::now() + ttl,
                            },
                        );
                    }
                    Err(_) => {
                        slots.remove(&key);
                    }
                }
                drop(slots);
                outcome.and_then(decode)
            }
        }
    }

    fn lock_slots(&self) -> Result<std::sync::MutexGuard<'_, HashMap<(String, String), Slot>>> {
        self.slots
            .lock()
            .map_err(|_| AuthGateError::Internal("cache lock poisoned".to_string()))
    }
}

fn decode<T: DeserializeOwned>(value: Value) -> Result<T> {
    serde_json::from_value(value)
        .map_err(|e| AuthGateError::Internal(format!("memoized value mismatch: {e}")))
}

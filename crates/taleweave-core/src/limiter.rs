//! Per-client submission rate limiting on top of [`governor`].
//!
//! The quota admits `limit` lines per `window`: a burst of `limit`, with one
//! line replenished every `window / limit`. With the default budget of one
//! line this is a plain window: after an admitted line the next one is
//! accepted once `window` has passed.
//!
//! Per-key state lives in a governor [`KeyedStateStore`] (by default the
//! in-process [`DashMapStateStore`]), so a deployment running several server
//! processes can supply a shared store instead. The clock is pluggable too.

use std::{fmt, num::NonZeroU32, sync::Arc, time::Duration};

use governor::{
  Quota,
  clock::Clock,
  middleware::{NoOpMiddleware, StateInformationMiddleware},
  state::keyed::{DashMapStateStore, KeyedStateStore, ShrinkableKeyedStateStore},
};
use tokio::task::JoinHandle;

// ─── Clock ───────────────────────────────────────────────────────────────────

/// A governor clock that reads tokio's clock, so a paused test runtime also
/// pauses the limiter.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioClock;

impl Clock for TokioClock {
  type Instant = std::time::Instant;

  fn now(&self) -> Self::Instant { tokio::time::Instant::now().into_std() }
}

// ─── Decision ────────────────────────────────────────────────────────────────

/// The caller's standing after an admitted hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Budget {
  /// Lines admitted per window.
  pub limit:       u32,
  /// Lines still available right now.
  pub remaining:   u32,
  /// Time until the full budget is available again.
  pub reset_after: Duration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
  Allowed(Budget),
  Limited { retry_after: Duration },
}

impl Decision {
  pub fn is_allowed(&self) -> bool { matches!(self, Self::Allowed(_)) }
}

// ─── Limiter ─────────────────────────────────────────────────────────────────

type Keyed<S, C> =
  governor::RateLimiter<String, S, C, StateInformationMiddleware>;

/// Admits at most `limit` hits per key per `window`.
pub struct RateLimiter<S = DashMapStateStore<String>, C = TokioClock>
where
  S: KeyedStateStore<String>,
  C: Clock,
{
  inner:  Arc<Keyed<S, C>>,
  clock:  C,
  window: Duration,
  limit:  u32,
  period: Duration,
}

impl RateLimiter {
  /// Limiter with an in-process store on tokio's clock.
  pub fn new(window: Duration, limit: u32) -> Self {
    Self::with_parts(window, limit, DashMapStateStore::default(), TokioClock)
  }
}

impl<S, C> RateLimiter<S, C>
where
  S: KeyedStateStore<String>,
  C: Clock + Clone,
{
  /// A zero `limit` is raised to one; a zero `window` admits every hit.
  pub fn with_parts(window: Duration, limit: u32, state: S, clock: C) -> Self {
    let burst = NonZeroU32::new(limit).unwrap_or(NonZeroU32::MIN);
    let period = (window / burst.get()).max(Duration::from_nanos(1));
    let quota = Quota::with_period(period)
      .unwrap_or_else(|| Quota::per_second(burst))
      .allow_burst(burst);

    let inner = governor::RateLimiter::<String, S, C, NoOpMiddleware<C::Instant>>::new(quota, state, clock.clone())
      .with_middleware::<StateInformationMiddleware>();

    Self {
      inner: Arc::new(inner),
      clock,
      window,
      limit: burst.get(),
      period,
    }
  }

  pub fn window(&self) -> Duration { self.window }

  pub fn limit(&self) -> u32 { self.limit }

  /// Record a hit for `key` now and decide whether it is admitted.
  pub fn check(&self, key: &str) -> Decision {
    match self.inner.check_key(&key.to_owned()) {
      Ok(snapshot) => {
        let remaining = snapshot.remaining_burst_capacity().min(self.limit);
        Decision::Allowed(Budget {
          limit: self.limit,
          remaining,
          reset_after: self.period * (self.limit - remaining),
        })
      }
      Err(not_until) => Decision::Limited {
        retry_after: not_until.wait_time_from(self.clock.now()),
      },
    }
  }

  /// Human-readable window length for contributor-facing messages.
  pub fn describe_window(&self) -> String {
    match self.window.as_secs() {
      60 => "one minute".to_owned(),
      1 => "one second".to_owned(),
      s if s > 0 && s % 60 == 0 => format!("{} minutes", s / 60),
      s => format!("{s} seconds"),
    }
  }
}

impl<S, C> RateLimiter<S, C>
where
  S: ShrinkableKeyedStateStore<String>,
  C: Clock,
{
  /// Number of keys currently tracked.
  pub fn len(&self) -> usize { self.inner.len() }

  pub fn is_empty(&self) -> bool { self.inner.is_empty() }

  /// Forget keys whose budget has fully replenished; returns how many went.
  pub fn prune(&self) -> usize {
    let before = self.inner.len();
    self.inner.retain_recent();
    self.inner.shrink_to_fit();
    before.saturating_sub(self.inner.len())
  }
}

impl<S, C> RateLimiter<S, C>
where
  S: ShrinkableKeyedStateStore<String> + Send + Sync + 'static,
  C: Clock + Clone + Send + Sync + 'static,
{
  /// Prune replenished keys once per window length, forever.
  pub fn spawn_sweeper(&self) -> JoinHandle<()> {
    let limiter = self.clone();
    let every = self.window.max(Duration::from_secs(1));
    tokio::spawn(async move {
      let mut ticker = tokio::time::interval(every);
      loop {
        ticker.tick().await;
        let pruned = limiter.prune();
        if pruned > 0 {
          tracing::debug!(pruned, "pruned idle rate-limit keys");
        }
      }
    })
  }
}

impl<S, C> Clone for RateLimiter<S, C>
where
  S: KeyedStateStore<String>,
  C: Clock + Clone,
{
  fn clone(&self) -> Self {
    Self {
      inner:  Arc::clone(&self.inner),
      clock:  self.clock.clone(),
      window: self.window,
      limit:  self.limit,
      period: self.period,
    }
  }
}

impl<S, C> fmt::Debug for RateLimiter<S, C>
where
  S: KeyedStateStore<String>,
  C: Clock,
{
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("RateLimiter")
      .field("window", &self.window)
      .field("limit", &self.limit)
      .finish_non_exhaustive()
  }
}

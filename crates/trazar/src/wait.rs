//! Change-detection wait engine.
//!
//! The diagram is re-rendered asynchronously by a remote, non-deterministic
//! pipeline, so observing a mutation safely takes a snapshot/trigger/diff
//! cycle: snapshot the settled elements, run the caller's action, poll
//! until the document reflects the change, snapshot again, and diff.
//!
//! Creation uses a two-phase settle: the raw DOM count can increase before
//! the new element has acquired the attributes needed to pass typed
//! resolution, and treating those as one step causes flaky false
//! negatives. Phase one polls the raw count; phase two re-polls the typed,
//! ghost-filtered view a bounded number of times. Every loop is
//! timeout-bounded and raises a named error; a timeout is never folded
//! into a "zero changes" result.
//!
//! Polling is fixed-interval rather than event-driven: hosting contexts
//! may isolate the document behind a frame boundary where native change
//! observation is unreliable.

use std::future::Future;
use std::time::{Duration, Instant};

use crate::dom;
use crate::metadata::Metadata;
use crate::model::{DiagramElement, Graph};
use crate::result::{TrazarError, TrazarResult};
use crate::selector::Selector;

/// Default timeout for change-detection waits (30 seconds)
pub const DEFAULT_WAIT_TIMEOUT_MS: u64 = 30_000;

/// Default polling interval (50ms)
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 50;

/// Default bound on typed-settle re-polls
pub const DEFAULT_SETTLE_ATTEMPTS: u32 = 10;

/// Default interval between typed-settle re-polls (100ms)
pub const DEFAULT_SETTLE_INTERVAL_MS: u64 = 100;

/// Options for change-detection waits.
///
/// The settle bounds are an empirically-tuned flakiness heuristic, not a
/// timing contract; suites can adjust them freely.
#[derive(Debug, Clone)]
pub struct WaitOptions {
    /// Timeout for the raw count poll, in milliseconds
    pub timeout_ms: u64,
    /// Polling interval, in milliseconds
    pub poll_interval_ms: u64,
    /// Bound on typed-settle re-polls
    pub settle_attempts: u32,
    /// Interval between typed-settle re-polls, in milliseconds
    pub settle_interval_ms: u64,
}

impl Default for WaitOptions {
    fn default() -> Self {
        Self {
            timeout_ms: DEFAULT_WAIT_TIMEOUT_MS,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            settle_attempts: DEFAULT_SETTLE_ATTEMPTS,
            settle_interval_ms: DEFAULT_SETTLE_INTERVAL_MS,
        }
    }
}

impl WaitOptions {
    /// Create options with defaults
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the raw-poll timeout
    #[must_use]
    pub const fn with_timeout(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    /// Set the polling interval
    #[must_use]
    pub const fn with_poll_interval(mut self, poll_interval_ms: u64) -> Self {
        self.poll_interval_ms = poll_interval_ms;
        self
    }

    /// Set the typed-settle attempt bound
    #[must_use]
    pub const fn with_settle_attempts(mut self, attempts: u32) -> Self {
        self.settle_attempts = attempts;
        self
    }

    /// Set the typed-settle interval
    #[must_use]
    pub const fn with_settle_interval(mut self, interval_ms: u64) -> Self {
        self.settle_interval_ms = interval_ms;
        self
    }

    /// Raw-poll timeout as a `Duration`
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Polling interval as a `Duration`
    #[must_use]
    pub const fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Typed-settle interval as a `Duration`
    #[must_use]
    pub const fn settle_interval(&self) -> Duration {
        Duration::from_millis(self.settle_interval_ms)
    }
}

impl Graph {
    /// Run a trigger action and wait for elements of the given wrapper
    /// type to be created.
    ///
    /// Returns a fresh typed wrapper for every element present after the
    /// trigger that was not present before.
    pub async fn wait_for_creation_of_type<T, F, Fut>(
        &self,
        trigger: F,
        options: &WaitOptions,
    ) -> TrazarResult<Vec<T>>
    where
        T: DiagramElement,
        F: FnOnce() -> Fut,
        Fut: Future<Output = TrazarResult<()>>,
    {
        let metadata = Metadata::assert::<T>()?;
        let before = self.settled_ids::<T>().await?;
        tracing::debug!(
            element_type = %metadata.element_type,
            before = before.len(),
            "creation wait: before-snapshot"
        );

        trigger().await?;

        // phase 1: raw DOM count. The markup can exist before the typed
        // view settles, so only a strict count increase is awaited here.
        let raw = self
            .locator()
            .child(Selector::type_attr(metadata.element_type.clone()));
        let start = Instant::now();
        loop {
            if raw.count().await? > before.len() {
                break;
            }
            if start.elapsed() >= options.timeout() {
                return Err(TrazarError::Timeout {
                    waiting_for: format!(
                        "number of `{}` elements to increase",
                        metadata.element_type
                    ),
                    ms: options.timeout_ms,
                });
            }
            tokio::time::sleep(options.poll_interval()).await;
        }

        // phase 2: the typed, ghost-filtered view can lag the raw count;
        // re-poll it a bounded number of times.
        let mut after = self.settled_ids::<T>().await?;
        let mut attempt: u32 = 0;
        while after.len() <= before.len() {
            attempt += 1;
            if attempt >= options.settle_attempts {
                return Err(TrazarError::Timeout {
                    waiting_for: format!(
                        "typed resolution of newly created `{}` elements",
                        metadata.element_type
                    ),
                    ms: u64::from(options.settle_attempts) * options.settle_interval_ms,
                });
            }
            tokio::time::sleep(options.settle_interval()).await;
            after = self.settled_ids::<T>().await?;
        }

        let mut created = Vec::new();
        for id in after.iter().filter(|id| !before.contains(*id)) {
            created.push(self.element_unchecked::<T>(Selector::id(id.as_str())).await?);
        }
        tracing::debug!(created = created.len(), "creation wait: diff resolved");
        Ok(created)
    }

    /// Run a trigger action and wait for the set of selected elements to
    /// change. Returns the ids selected after the trigger that were not
    /// selected before.
    pub async fn wait_for_selection_change<F, Fut>(
        &self,
        trigger: F,
        options: &WaitOptions,
    ) -> TrazarResult<Vec<String>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = TrazarResult<()>>,
    {
        let selected = self
            .locator()
            .child(Selector::has_class(dom::SELECTED_CLASS));
        let before: Vec<String> = selected.ids().await?.into_iter().flatten().collect();

        trigger().await?;

        let start = Instant::now();
        loop {
            let after: Vec<String> = selected.ids().await?.into_iter().flatten().collect();
            if after != before {
                return Ok(after
                    .into_iter()
                    .filter(|id| !before.contains(id))
                    .collect());
            }
            if start.elapsed() >= options.timeout() {
                return Err(TrazarError::Timeout {
                    waiting_for: "the set of selected elements to change".to_string(),
                    ms: options.timeout_ms,
                });
            }
            tokio::time::sleep(options.poll_interval()).await;
        }
    }
}

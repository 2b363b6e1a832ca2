//! Read-through cache for the aggregate token and presale figures.
//!
//! Each slot holds one value together with the instant it was fetched and is
//! guarded by its own async mutex. The lock is held across a refresh, so an
//! on-demand refresh and the background timer never race on the same slot and
//! value and timestamp are always replaced together. The fetch instant is also
//! published through a `watch` channel so it can be read without waiting on a
//! refresh in flight.
//!
//! A single interval governs both paths: reads refresh a slot once it is at
//! least `interval` old, and the background task refreshes every slot
//! unconditionally once per `interval`.
//!
//! When a refresh fails and the slot already holds a value, that stale value
//! is served (and the failure logged). The fetch timestamp is left untouched
//! and the failure instant is recorded instead: reads within `retry_backoff`
//! of a failure serve the stale value without calling the node, so readers
//! queued behind a failed refresh do not each repeat it. With nothing cached
//! the error reaches the caller.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

use crate::{
    constants::CACHE_RETRY_BACKOFF_SECS,
    error::{AppError, Result},
    models::{PresaleStats, TokenStats},
};

use super::contract_facade::ContractFacade;

#[derive(Debug, Clone)]
pub struct CacheEntry<T> {
    pub value: T,
    pub fetched_at: Instant,
    pub failed_at: Option<Instant>,
}

struct Slot<T> {
    label: &'static str,
    entry: Mutex<Option<CacheEntry<T>>>,
    fetched_at: watch::Sender<Option<Instant>>,
}

pub struct RefreshCache {
    facade: Arc<ContractFacade>,
    interval: Duration,
    retry_backoff: Duration,
    token_stats: Slot<TokenStats>,
    presale_stats: Slot<PresaleStats>,
}

impl RefreshCache {
    pub fn new(facade: Arc<ContractFacade>, interval: Duration) -> Self {
        Self {
            facade,
            interval,
            retry_backoff: Duration::from_secs(CACHE_RETRY_BACKOFF_SECS).min(interval),
            token_stats: Slot::new("token stats"),
            presale_stats: Slot::new("presale stats"),
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub async fn token_stats(&self) -> Result<TokenStats> {
        self.token_stats
            .read_through(self.interval, self.retry_backoff, || {
                self.facade.token_stats()
            })
            .await
    }

    pub async fn presale_stats(&self) -> Result<PresaleStats> {
        self.presale_stats
            .read_through(self.interval, self.retry_backoff, || {
                self.facade.presale_stats()
            })
            .await
    }

    pub fn token_stats_fetched_at(&self) -> Option<Instant> {
        self.token_stats.fetched_at()
    }

    pub fn presale_stats_fetched_at(&self) -> Option<Instant> {
        self.presale_stats.fetched_at()
    }

    /// Refreshes every slot regardless of age.
    pub async fn refresh_all(&self) {
        let token = self.token_stats.refresh(self.facade.token_stats()).await;
        log_background_result(self.token_stats.label, token);

        let presale = self.presale_stats.refresh(self.facade.presale_stats()).await;
        log_background_result(self.presale_stats.label, presale);
    }

    /// Drops every cached value, e.g. after contract addresses change.
    pub async fn invalidate(&self) {
        self.token_stats.clear().await;
        self.presale_stats.clear().await;
        tracing::debug!("Refresh cache invalidated");
    }

    /// Starts the periodic refresh. The first tick fires immediately so the
    /// cache is warm shortly after startup.
    pub fn spawn_refresher(self: Arc<Self>) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(self.interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                self.refresh_all().await;
            }
        })
    }
}

impl<T: Clone> Slot<T> {
    fn new(label: &'static str) -> Self {
        Self {
            label,
            entry: Mutex::new(None),
            fetched_at: watch::Sender::new(None),
        }
    }

    fn fetched_at(&self) -> Option<Instant> {
        *self.fetched_at.borrow()
    }

    async fn read_through<F, Fut>(
        &self,
        interval: Duration,
        retry_backoff: Duration,
        fetch: F,
    ) -> Result<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut guard = self.entry.lock().await;
        if let Some(entry) = guard.as_ref() {
            if entry.fetched_at.elapsed() < interval {
                tracing::debug!("Cache hit for {}", self.label);
                return Ok(entry.value.clone());
            }
            if entry
                .failed_at
                .is_some_and(|at| at.elapsed() < retry_backoff)
            {
                tracing::debug!("Serving stale {} until retry backoff elapses", self.label);
                return Ok(entry.value.clone());
            }
        }
        tracing::debug!("Cache miss for {}", self.label);
        self.refresh_locked(&mut guard, fetch()).await
    }

    async fn refresh<Fut>(&self, fetch: Fut) -> Result<T>
    where
        Fut: Future<Output = Result<T>>,
    {
        let mut guard = self.entry.lock().await;
        self.refresh_locked(&mut guard, fetch).await
    }

    async fn refresh_locked<Fut>(&self, entry: &mut Option<CacheEntry<T>>, fetch: Fut) -> Result<T>
    where
        Fut: Future<Output = Result<T>>,
    {
        match fetch.await {
            Ok(value) => {
                let fetched_at = Instant::now();
                *entry = Some(CacheEntry {
                    value: value.clone(),
                    fetched_at,
                    failed_at: None,
                });
                self.fetched_at.send_replace(Some(fetched_at));
                tracing::debug!("Refreshed {}", self.label);
                Ok(value)
            }
            Err(e) => match entry.as_mut() {
                Some(stale) => {
                    tracing::warn!(
                        "Refreshing {} failed, serving stale value: {}",
                        self.label,
                        e
                    );
                    stale.failed_at = Some(Instant::now());
                    Ok(stale.value.clone())
                }
                None => Err(e),
            },
        }
    }

    async fn clear(&self) {
        *self.entry.lock().await = None;
        self.fetched_at.send_replace(None);
    }
}

fn log_background_result<T>(label: &str, result: Result<T>) {
    match result {
        Ok(_) => {}
        Err(AppError::ContractNotConfigured(kind)) => {
            tracing::debug!("Skipping {} refresh: {} contract not configured", label, kind);
        }
        Err(e) => tracing::warn!("Background refresh of {} failed: {}", label, e),
    }
}

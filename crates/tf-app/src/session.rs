use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use tracing::{info, warn};

use crate::client::{BackendClient, ResourceKind};
use crate::error::BackendError;

/// How long a fetched resource listing stays fresh.
pub const RESOURCE_CACHE_TTL: Duration = Duration::from_secs(30);

/// Time source for cache freshness, injectable so tests can advance it
/// manually.
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

#[derive(Debug, Clone)]
struct CachedList {
    values: Vec<String>,
    fetched_at: Instant,
}

/// Explicit cache of backend resource listings, one entry per kind.
#[derive(Default)]
struct ResourceCache {
    entries: HashMap<ResourceKind, CachedList>,
}

impl ResourceCache {
    fn fresh(&self, kind: ResourceKind, now: Instant, ttl: Duration) -> Option<Vec<String>> {
        self.entries
            .get(&kind)
            .filter(|entry| now.duration_since(entry.fetched_at) < ttl)
            .map(|entry| entry.values.clone())
    }

    /// Last known values regardless of age, for falling back when the
    /// backend stops answering.
    fn stale(&self, kind: ResourceKind) -> Option<Vec<String>> {
        self.entries.get(&kind).map(|entry| entry.values.clone())
    }

    fn put(&mut self, kind: ResourceKind, values: Vec<String>, now: Instant) {
        self.entries.insert(
            kind,
            CachedList {
                values,
                fetched_at: now,
            },
        );
    }

    fn clear(&mut self) {
        self.entries.clear();
    }
}

/// Connection state and resource cache wrapped around a
/// [`BackendClient`]. The client stays stateless; everything session-y
/// (connected flag, cached listings) lives here and is dropped
/// explicitly on disconnect.
pub struct BackendSession {
    client: Arc<BackendClient>,
    cache: Mutex<ResourceCache>,
    clock: Arc<dyn Clock>,
    ttl: Duration,
    connected: AtomicBool,
}

impl BackendSession {
    pub fn new(client: Arc<BackendClient>, clock: Arc<dyn Clock>) -> Self {
        Self {
            client,
            cache: Mutex::new(ResourceCache::default()),
            clock,
            ttl: RESOURCE_CACHE_TTL,
            connected: AtomicBool::new(false),
        }
    }

    /// Override the cache TTL (mainly for tests).
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn client(&self) -> &Arc<BackendClient> {
        &self.client
    }

    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Relaxed)
    }

    /// Probe the backend with a cheap listing call and remember the
    /// outcome. The probe's result primes the checkpoint cache.
    pub async fn connect(&self) -> Result<(), BackendError> {
        match self.client.list_resources(ResourceKind::Checkpoints).await {
            Ok(checkpoints) => {
                let now = self.clock.now();
                self.cache
                    .lock()
                    .unwrap()
                    .put(ResourceKind::Checkpoints, checkpoints, now);
                self.connected.store(true, Ordering::Relaxed);
                info!("connected to backend at {}", self.client.base_url());
                Ok(())
            }
            Err(err) => {
                self.connected.store(false, Ordering::Relaxed);
                Err(err)
            }
        }
    }

    /// Drop the connected flag and every cached listing.
    pub fn disconnect(&self) {
        self.connected.store(false, Ordering::Relaxed);
        self.cache.lock().unwrap().clear();
        info!("disconnected from backend");
    }

    /// Resource names of one kind, served from cache while fresh. On a
    /// fetch error the last known listing (if any) is returned instead,
    /// so a flaky backend does not blank out the UI's choices.
    pub async fn resources(&self, kind: ResourceKind) -> Result<Vec<String>, BackendError> {
        let now = self.clock.now();
        if let Some(values) = self.cache.lock().unwrap().fresh(kind, now, self.ttl) {
            return Ok(values);
        }

        match self.client.list_resources(kind).await {
            Ok(values) => {
                self.cache
                    .lock()
                    .unwrap()
                    .put(kind, values.clone(), self.clock.now());
                Ok(values)
            }
            Err(err) => {
                if let Some(stale) = self.cache.lock().unwrap().stale(kind) {
                    warn!("listing {kind:?} failed ({err}); serving stale cache");
                    return Ok(stale);
                }
                Err(err)
            }
        }
    }
}

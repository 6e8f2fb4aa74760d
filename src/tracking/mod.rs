use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, Weak};
use std::time::Duration;

use dashmap::DashMap;
use prometheus::IntGauge;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{info, warn};
use uuid::Uuid;

use crate::models::GeoPoint;
use crate::models::driver::DriverPositionSnapshot;
use crate::observability::metrics::Metrics;
use crate::store::DriverPositionStore;

/// Axis-wise movement below this many degrees (~11 m) is GPS jitter,
/// not a position change worth notifying about.
pub const POSITION_TOLERANCE_DEG: f64 = 0.0001;

pub const DEFAULT_SAMPLE_INTERVAL: Duration = Duration::from_millis(15_000);

type UpdateCallback = Arc<dyn Fn(DriverPositionSnapshot) + Send + Sync>;

fn exceeds_tolerance(previous: &GeoPoint, current: &GeoPoint) -> bool {
    (current.lat - previous.lat).abs() > POSITION_TOLERANCE_DEG
        || (current.lng - previous.lng).abs() > POSITION_TOLERANCE_DEG
}

struct SubscriberRegistry {
    subscribers: DashMap<u64, UpdateCallback>,
    next_id: AtomicU64,
    gauge: IntGauge,
}

/// Opaque unsubscribe token. Dropping it without calling
/// [`Subscription::unsubscribe`] leaves the callback registered.
pub struct Subscription {
    id: u64,
    registry: Weak<SubscriberRegistry>,
}

impl Subscription {
    pub fn unsubscribe(self) {
        if let Some(registry) = self.registry.upgrade() {
            registry.subscribers.remove(&self.id);
            registry.gauge.set(registry.subscribers.len() as i64);
        }
    }
}

/// Maintains an approximately-current view of driver positions by
/// polling the position store and fans genuine movement out to
/// subscribers.
///
/// stopped → [`start`] → running → [`stop`] → stopped. `start` on a
/// running aggregator is a no-op. The snapshot cache is owned here
/// exclusively; subscribers only ever receive clones.
pub struct LiveTrackingAggregator<D> {
    store: Arc<D>,
    cache: Arc<DashMap<Uuid, DriverPositionSnapshot>>,
    registry: Arc<SubscriberRegistry>,
    running: Arc<AtomicBool>,
    task: Mutex<Option<JoinHandle<()>>>,
    metrics: Metrics,
}

struct Sampler<D> {
    store: Arc<D>,
    cache: Arc<DashMap<Uuid, DriverPositionSnapshot>>,
    registry: Arc<SubscriberRegistry>,
    running: Arc<AtomicBool>,
    metrics: Metrics,
}

impl<D: DriverPositionStore + 'static> LiveTrackingAggregator<D> {
    pub fn new(store: Arc<D>, metrics: Metrics) -> Self {
        Self {
            store,
            cache: Arc::new(DashMap::new()),
            registry: Arc::new(SubscriberRegistry {
                subscribers: DashMap::new(),
                next_id: AtomicU64::new(0),
                gauge: metrics.tracking_subscribers.clone(),
            }),
            running: Arc::new(AtomicBool::new(false)),
            task: Mutex::new(None),
            metrics,
        }
    }

    /// Begins sampling: one cycle immediately, then one per interval.
    /// Idempotent while running.
    pub fn start(&self, every: Duration) {
        if self.running.swap(true, Ordering::SeqCst) {
            return;
        }

        info!(interval_ms = every.as_millis() as u64, "driver tracking started");

        let sampler = Sampler {
            store: Arc::clone(&self.store),
            cache: Arc::clone(&self.cache),
            registry: Arc::clone(&self.registry),
            running: Arc::clone(&self.running),
            metrics: self.metrics.clone(),
        };

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                ticker.tick().await;
                if !sampler.running.load(Ordering::SeqCst) {
                    break;
                }
                sampler.run_cycle().await;
            }
        });

        let mut slot = self.task.lock().expect("sampler task slot poisoned");
        if let Some(previous) = slot.replace(handle) {
            previous.abort();
        }
    }

    /// Stops sampling and drops the snapshot cache. No callback runs
    /// after this returns, including for a cycle already in flight.
    pub fn stop(&self) {
        if !self.running.swap(false, Ordering::SeqCst) {
            return;
        }

        let handle = self.task.lock().expect("sampler task slot poisoned").take();
        if let Some(handle) = handle {
            handle.abort();
        }
        self.cache.clear();

        info!("driver tracking stopped");
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Registers a callback invoked once per changed driver per cycle.
    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(DriverPositionSnapshot) + Send + Sync + 'static,
    {
        let id = self.registry.next_id.fetch_add(1, Ordering::Relaxed);
        self.registry.subscribers.insert(id, Arc::new(callback));
        self.registry
            .gauge
            .set(self.registry.subscribers.len() as i64);

        Subscription {
            id,
            registry: Arc::downgrade(&self.registry),
        }
    }

    /// Point lookup straight from the store, bypassing the cache.
    /// Works whether or not the aggregator is running.
    pub async fn driver_location(&self, driver_id: Uuid) -> Option<DriverPositionSnapshot> {
        match self.store.driver_by_id(driver_id).await {
            Ok(found) => found,
            Err(err) => {
                warn!(error = %err, driver_id = %driver_id, "driver lookup failed");
                None
            }
        }
    }
}

impl<D: DriverPositionStore> Sampler<D> {
    async fn run_cycle(&self) {
        let drivers = match self.store.active_drivers_with_position().await {
            Ok(drivers) => drivers,
            Err(err) => {
                warn!(error = %err, "driver position fetch failed; skipping cycle");
                self.metrics
                    .tracking_cycles_total
                    .with_label_values(&["error"])
                    .inc();
                return;
            }
        };

        let mut changed = Vec::new();
        for driver in drivers {
            let Some(position) = driver.position.as_ref() else {
                continue;
            };

            let moved = match self.cache.get(&driver.driver_id) {
                Some(cached) => match cached.value().position.as_ref() {
                    Some(previous) => exceeds_tolerance(previous, position),
                    None => true,
                },
                None => true,
            };

            self.cache.insert(driver.driver_id, driver.clone());
            if moved {
                changed.push(driver);
            }
        }

        self.metrics
            .tracking_cycles_total
            .with_label_values(&["success"])
            .inc();

        // Stopped while this cycle's fetch was in flight: the results
        // are discarded, never delivered.
        if !self.running.load(Ordering::SeqCst) {
            return;
        }
        if changed.is_empty() {
            return;
        }

        // Snapshot the subscriber list so callbacks can unsubscribe
        // without racing this cycle's fan-out.
        let callbacks: Vec<UpdateCallback> = self
            .registry
            .subscribers
            .iter()
            .map(|entry| Arc::clone(entry.value()))
            .collect();

        for driver in changed {
            for callback in &callbacks {
                callback(driver.clone());
            }
            self.metrics.driver_updates_published_total.inc();
        }
    }
}

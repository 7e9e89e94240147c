//! Lock-free tour metrics and periodic reporting
//!
//! Counters are bumped from the tour loop and read by the reporter task.
//! Reporting swaps the periodic counters to zero; lifetime counters are only
//! loaded.
//!
//! NOTE: All atomics use Relaxed ordering. These are statistical counters and
//! must not be used to drive tour logic.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;
use tracing::info;

/// Event handling latency bucket bounds (microseconds)
/// Buckets: ≤50, ≤100, ≤200, ≤400, ≤800, ≤1600, ≤3200, ≤6400, ≤12800, ≤25600, >25600
const BUCKET_BOUNDS: [u64; 10] = [50, 100, 200, 400, 800, 1600, 3200, 6400, 12800, 25600];
const NUM_BUCKETS: usize = 11;

#[inline]
fn bucket_index(latency_us: u64) -> usize {
    BUCKET_BOUNDS.partition_point(|&bound| bound < latency_us)
}

#[inline]
fn update_atomic_max(atomic_max: &AtomicU64, new_value: u64) {
    let mut current_max = atomic_max.load(Ordering::Relaxed);
    while new_value > current_max {
        match atomic_max.compare_exchange_weak(
            current_max,
            new_value,
            Ordering::Relaxed,
            Ordering::Relaxed,
        ) {
            Ok(_) => break,
            Err(actual) => current_max = actual,
        }
    }
}

#[inline]
fn swap_buckets(buckets: &[AtomicU64; NUM_BUCKETS]) -> [u64; NUM_BUCKETS] {
    let mut result = [0u64; NUM_BUCKETS];
    for (i, bucket) in buckets.iter().enumerate() {
        result[i] = bucket.swap(0, Ordering::Relaxed);
    }
    result
}

/// Upper bound of the bucket holding the given percentile
fn percentile_from_buckets(buckets: &[u64; NUM_BUCKETS], percentile: f64) -> u64 {
    let total: u64 = buckets.iter().sum();
    if total == 0 {
        return 0;
    }

    let target = (total as f64 * percentile) as u64;
    let mut cumulative = 0u64;

    // Last bucket reports twice the previous bound
    const BUCKET_UPPER_BOUNDS: [u64; NUM_BUCKETS] =
        [50, 100, 200, 400, 800, 1600, 3200, 6400, 12800, 25600, 51200];

    for (i, &count) in buckets.iter().enumerate() {
        cumulative += count;
        if cumulative >= target {
            return BUCKET_UPPER_BOUNDS[i];
        }
    }
    BUCKET_UPPER_BOUNDS[NUM_BUCKETS - 1]
}

/// Lock-free metrics collector
pub struct Metrics {
    /// Tour events handled (monotonic)
    events_total: AtomicU64,
    /// Events since last report (reset on report)
    events_since_report: AtomicU64,
    latency_sum_us: AtomicU64,
    latency_max_us: AtomicU64,
    latency_buckets: [AtomicU64; NUM_BUCKETS],
    tours_started: AtomicU64,
    tours_exited: AtomicU64,
    /// Starts triggered by the inactivity timer (also counted in tours_started)
    auto_activations: AtomicU64,
    stops_played: AtomicU64,
    stops_arrived: AtomicU64,
    flights_completed: AtomicU64,
    flights_interrupted: AtomicU64,
    /// Motion failures that forced the tour into pause
    flights_failed: AtomicU64,
    /// Timer or motion events that arrived after their target moved on
    stale_events: AtomicU64,
    last_report_time: parking_lot::Mutex<Instant>,
}

impl Metrics {
    pub fn new() -> Self {
        Self {
            events_total: AtomicU64::new(0),
            events_since_report: AtomicU64::new(0),
            latency_sum_us: AtomicU64::new(0),
            latency_max_us: AtomicU64::new(0),
            latency_buckets: std::array::from_fn(|_| AtomicU64::new(0)),
            tours_started: AtomicU64::new(0),
            tours_exited: AtomicU64::new(0),
            auto_activations: AtomicU64::new(0),
            stops_played: AtomicU64::new(0),
            stops_arrived: AtomicU64::new(0),
            flights_completed: AtomicU64::new(0),
            flights_interrupted: AtomicU64::new(0),
            flights_failed: AtomicU64::new(0),
            stale_events: AtomicU64::new(0),
            last_report_time: parking_lot::Mutex::new(Instant::now()),
        }
    }

    /// Record one handled tour event and how long handling took
    #[inline]
    pub fn record_event_handled(&self, latency_us: u64) {
        self.events_total.fetch_add(1, Ordering::Relaxed);
        self.events_since_report.fetch_add(1, Ordering::Relaxed);
        self.latency_sum_us.fetch_add(latency_us, Ordering::Relaxed);
        self.latency_buckets[bucket_index(latency_us)].fetch_add(1, Ordering::Relaxed);
        update_atomic_max(&self.latency_max_us, latency_us);
    }

    #[inline]
    pub fn record_tour_started(&self) {
        self.tours_started.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_tour_exited(&self) {
        self.tours_exited.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_auto_activation(&self) {
        self.auto_activations.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_stop_played(&self) {
        self.stops_played.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_stop_arrived(&self) {
        self.stops_arrived.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_flight_completed(&self) {
        self.flights_completed.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_flight_interrupted(&self) {
        self.flights_interrupted.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_flight_failed(&self) {
        self.flights_failed.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_stale_event(&self) {
        self.stale_events.fetch_add(1, Ordering::Relaxed);
    }

    pub fn events_total(&self) -> u64 {
        self.events_total.load(Ordering::Relaxed)
    }

    pub fn tours_started(&self) -> u64 {
        self.tours_started.load(Ordering::Relaxed)
    }

    pub fn auto_activations(&self) -> u64 {
        self.auto_activations.load(Ordering::Relaxed)
    }

    pub fn stops_arrived(&self) -> u64 {
        self.stops_arrived.load(Ordering::Relaxed)
    }

    pub fn flights_failed(&self) -> u64 {
        self.flights_failed.load(Ordering::Relaxed)
    }

    pub fn stale_events(&self) -> u64 {
        self.stale_events.load(Ordering::Relaxed)
    }

    /// Snapshot and reset the periodic counters
    pub fn report(&self) -> MetricsSummary {
        let events_count = self.events_since_report.swap(0, Ordering::Relaxed);
        let latency_sum = self.latency_sum_us.swap(0, Ordering::Relaxed);
        let max_latency = self.latency_max_us.swap(0, Ordering::Relaxed);
        let lat_buckets = swap_buckets(&self.latency_buckets);

        let elapsed = {
            let mut last = self.last_report_time.lock();
            let elapsed = last.elapsed();
            *last = Instant::now();
            elapsed
        };

        let events_per_sec = if elapsed.as_secs_f64() > 0.0 {
            events_count as f64 / elapsed.as_secs_f64()
        } else {
            0.0
        };
        let avg_latency = if events_count > 0 { latency_sum / events_count } else { 0 };

        MetricsSummary {
            events_total: self.events_total.load(Ordering::Relaxed),
            events_per_sec,
            avg_handle_latency_us: avg_latency,
            max_handle_latency_us: max_latency,
            lat_p50_us: percentile_from_buckets(&lat_buckets, 0.50),
            lat_p99_us: percentile_from_buckets(&lat_buckets, 0.99),
            tours_started: self.tours_started.load(Ordering::Relaxed),
            tours_exited: self.tours_exited.load(Ordering::Relaxed),
            auto_activations: self.auto_activations.load(Ordering::Relaxed),
            stops_played: self.stops_played.load(Ordering::Relaxed),
            stops_arrived: self.stops_arrived.load(Ordering::Relaxed),
            flights_completed: self.flights_completed.load(Ordering::Relaxed),
            flights_interrupted: self.flights_interrupted.load(Ordering::Relaxed),
            flights_failed: self.flights_failed.load(Ordering::Relaxed),
            stale_events: self.stale_events.load(Ordering::Relaxed),
        }
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Point-in-time view produced by [`Metrics::report`]
#[derive(Debug, Clone)]
pub struct MetricsSummary {
    pub events_total: u64,
    pub events_per_sec: f64,
    pub avg_handle_latency_us: u64,
    pub max_handle_latency_us: u64,
    pub lat_p50_us: u64,
    pub lat_p99_us: u64,
    pub tours_started: u64,
    pub tours_exited: u64,
    pub auto_activations: u64,
    pub stops_played: u64,
    pub stops_arrived: u64,
    pub flights_completed: u64,
    pub flights_interrupted: u64,
    pub flights_failed: u64,
    pub stale_events: u64,
}

impl MetricsSummary {
    pub fn log(&self) {
        info!(
            events_total = %self.events_total,
            events_per_sec = format!("{:.1}", self.events_per_sec),
            avg_latency_us = %self.avg_handle_latency_us,
            max_latency_us = %self.max_handle_latency_us,
            p50_us = %self.lat_p50_us,
            p99_us = %self.lat_p99_us,
            tours_started = %self.tours_started,
            tours_exited = %self.tours_exited,
            auto_activations = %self.auto_activations,
            stops_played = %self.stops_played,
            stops_arrived = %self.stops_arrived,
            flights_completed = %self.flights_completed,
            flights_interrupted = %self.flights_interrupted,
            flights_failed = %self.flights_failed,
            stale_events = %self.stale_events,
            "metrics"
        );
    }
}

//! Opt-in timing hooks for the advancing-front loop.
//!
//! Timing is only collected when the `mesh_engine_metrics` feature is enabled
//! and the target is not WASM (`std::time::Instant` is unavailable there).
//! Otherwise every call compiles to a plain closure invocation.
//!
//! # Usage
//!
//! ```ignore
//! use afm_engine::geom::{GeomMetrics, TimingBucket};
//!
//! let mut metrics = GeomMetrics::default();
//! metrics.begin();
//!
//! let near = metrics.time(TimingBucket::NeighborSearch, || {
//!     find_near_nodes(center, front.nodes(), spacing, &[a, b], tol)
//! });
//!
//! if let Some(report) = metrics.end() {
//!     println!("neighbor search: {} ns", report.neighbor_search_ns);
//! }
//! ```

/// Phases of one advancing-front iteration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimingBucket {
    /// Radius scan over the front nodes.
    NeighborSearch,
    /// Constraint derivation and candidate filtering.
    ConstraintFilter,
    /// Removing and appending sides, node list refresh.
    FrontUpdate,
    /// Welding panels into an indexed mesh.
    Welding,
}

/// Cumulative nanoseconds per bucket.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct GeomTimingReport {
    pub neighbor_search_ns: u64,
    pub constraint_filter_ns: u64,
    pub front_update_ns: u64,
    pub welding_ns: u64,
}

impl GeomTimingReport {
    /// Returns the total time across all buckets in nanoseconds.
    #[must_use]
    pub fn total_ns(&self) -> u64 {
        self.neighbor_search_ns
            .saturating_add(self.constraint_filter_ns)
            .saturating_add(self.front_update_ns)
            .saturating_add(self.welding_ns)
    }

    /// Returns the total time in milliseconds (for display purposes).
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn total_ms(&self) -> f64 {
        self.total_ns() as f64 / 1_000_000.0
    }
}

/// Accumulator for timing mesher phases.
///
/// When the `mesh_engine_metrics` feature is disabled (or on WASM), all methods
/// are no-ops and [`end`](Self::end) returns `None`.
#[derive(Debug, Default)]
pub struct GeomMetrics {
    #[cfg(all(feature = "mesh_engine_metrics", not(target_arch = "wasm32")))]
    report: GeomTimingReport,
}

impl GeomMetrics {
    /// Resets all timing counters to zero.
    pub fn begin(&mut self) {
        #[cfg(all(feature = "mesh_engine_metrics", not(target_arch = "wasm32")))]
        {
            self.report = GeomTimingReport::default();
        }
    }

    /// Returns the accumulated timing report, or `None` if metrics are disabled.
    #[must_use]
    pub fn end(&self) -> Option<GeomTimingReport> {
        #[cfg(all(feature = "mesh_engine_metrics", not(target_arch = "wasm32")))]
        {
            Some(self.report.clone())
        }
        #[cfg(not(all(feature = "mesh_engine_metrics", not(target_arch = "wasm32"))))]
        {
            None
        }
    }

    /// Times the execution of `f` and accumulates the elapsed time in `bucket`.
    pub fn time<R>(&mut self, bucket: TimingBucket, f: impl FnOnce() -> R) -> R {
        #[cfg(all(feature = "mesh_engine_metrics", not(target_arch = "wasm32")))]
        {
            let start = std::time::Instant::now();
            let result = f();
            let elapsed = start.elapsed();
            // Cap at u64::MAX to prevent overflow
            let nanos_u64 = u64::try_from(elapsed.as_nanos()).unwrap_or(u64::MAX);
            self.add_to_bucket(bucket, nanos_u64);
            result
        }

        #[cfg(not(all(feature = "mesh_engine_metrics", not(target_arch = "wasm32"))))]
        {
            let _ = bucket;
            f()
        }
    }

    #[cfg(all(feature = "mesh_engine_metrics", not(target_arch = "wasm32")))]
    fn add_to_bucket(&mut self, bucket: TimingBucket, nanos: u64) {
        let slot = match bucket {
            TimingBucket::NeighborSearch => &mut self.report.neighbor_search_ns,
            TimingBucket::ConstraintFilter => &mut self.report.constraint_filter_ns,
            TimingBucket::FrontUpdate => &mut self.report.front_update_ns,
            TimingBucket::Welding => &mut self.report.welding_ns,
        };
        *slot = slot.saturating_add(nanos);
    }
}

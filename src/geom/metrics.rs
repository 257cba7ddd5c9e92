//! Opt-in timing hooks for the tube pipeline stages.
//!
//! Timing is only collected when the `tube_metrics` feature is enabled and the
//! target is not WASM (`std::time::Instant` is unavailable on `wasm32`).
//! Otherwise every call compiles down to running the closure.
//!
//! ```ignore
//! use tube_engine::geom::{GeomMetrics, TimingBucket};
//!
//! let mut metrics = GeomMetrics::default();
//! metrics.begin();
//! let samples = metrics.time(TimingBucket::Sampling, || sample_path(&points, 10, 0.5));
//! if let Some(report) = metrics.end() {
//!     println!("sampling: {} ns", report.sampling_ns);
//! }
//! ```

/// Pipeline stages that accumulate time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimingBucket {
    /// Spline evaluation of the control points.
    Sampling,
    /// Rotation-minimizing frame propagation.
    Frames,
    /// Ring vertices and side triangles.
    Rings,
    /// End cap fans.
    Caps,
    /// Temporal blending in the update controller.
    Smoothing,
}

/// Cumulative per-stage timings in nanoseconds.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct GeomTimingReport {
    pub sampling_ns: u64,
    pub frames_ns: u64,
    pub rings_ns: u64,
    pub caps_ns: u64,
    pub smoothing_ns: u64,
}

impl GeomTimingReport {
    #[must_use]
    pub fn total_ns(&self) -> u64 {
        self.sampling_ns
            .saturating_add(self.frames_ns)
            .saturating_add(self.rings_ns)
            .saturating_add(self.caps_ns)
            .saturating_add(self.smoothing_ns)
    }

    /// Returns the total time in milliseconds (for display purposes).
    #[must_use]
    pub fn total_ms(&self) -> f64 {
        self.total_ns() as f64 / 1_000_000.0
    }

    #[cfg_attr(
        not(all(feature = "tube_metrics", not(target_arch = "wasm32"))),
        allow(dead_code)
    )]
    fn bucket_mut(&mut self, bucket: TimingBucket) -> &mut u64 {
        match bucket {
            TimingBucket::Sampling => &mut self.sampling_ns,
            TimingBucket::Frames => &mut self.frames_ns,
            TimingBucket::Rings => &mut self.rings_ns,
            TimingBucket::Caps => &mut self.caps_ns,
            TimingBucket::Smoothing => &mut self.smoothing_ns,
        }
    }
}

/// Accumulator for timing pipeline stages.
///
/// Call [`begin`](Self::begin) to reset, wrap stages with
/// [`time`](Self::time), and call [`end`](Self::end) for the report.
#[derive(Debug, Default)]
pub struct GeomMetrics {
    #[cfg(all(feature = "tube_metrics", not(target_arch = "wasm32")))]
    report: GeomTimingReport,
}

impl GeomMetrics {
    pub fn begin(&mut self) {
        #[cfg(all(feature = "tube_metrics", not(target_arch = "wasm32")))]
        {
            self.report = GeomTimingReport::default();
        }
    }

    /// Returns the accumulated report, or `None` if metrics are disabled.
    #[must_use]
    pub fn end(&self) -> Option<GeomTimingReport> {
        #[cfg(all(feature = "tube_metrics", not(target_arch = "wasm32")))]
        {
            Some(self.report.clone())
        }
        #[cfg(not(all(feature = "tube_metrics", not(target_arch = "wasm32"))))]
        {
            None
        }
    }

    /// Runs `f`, adding its elapsed time to `bucket` when metrics are enabled.
    pub fn time<R>(&mut self, bucket: TimingBucket, f: impl FnOnce() -> R) -> R {
        #[cfg(all(feature = "tube_metrics", not(target_arch = "wasm32")))]
        {
            let start = std::time::Instant::now();
            let result = f();
            let nanos = start.elapsed().as_nanos().min(u128::from(u64::MAX)) as u64;
            let slot = self.report.bucket_mut(bucket);
            *slot = slot.saturating_add(nanos);
            result
        }

        #[cfg(not(all(feature = "tube_metrics", not(target_arch = "wasm32"))))]
        {
            let _ = bucket;
            f()
        }
    }
}

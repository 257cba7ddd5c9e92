//! Update controller: decides when the tube pipeline runs and what it is fed.
//!
//! In immediate mode each tick rebuilds from the latest snapshot, gated by an
//! accumulated-time throttle. In smoothed mode every tick first blends the
//! persisted positions toward the snapshot and rebuilds from the blend. A
//! manual [`TubeGenerator::rebuild`] always runs, bypassing the throttle.
//!
//! The controller owns the only cross-tick state in the crate. A rebuild that
//! fails leaves all of it (mesh, diagnostics, smoothing positions) untouched.

use std::sync::Arc;

use crate::config::TubeConfig;
use crate::geom::{
    GeomContext, GeomMetrics, GeomTimingReport, Point3, TimingBucket, Transform,
    TubeDiagnostics, TubeError, TubeMesh, TubeOptions, generate_tube_with_context,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateMode {
    Immediate,
    Smoothed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    Rebuilt,
    /// The throttle interval has not elapsed; nothing ran.
    Throttled,
}

/// Persisted control positions for temporal smoothing.
#[derive(Debug, Clone, PartialEq)]
pub struct SmoothingState {
    current: Vec<Point3>,
    factor: f64,
}

impl SmoothingState {
    #[must_use]
    pub fn new(snapshot: &[Point3], factor: f64) -> Self {
        Self {
            current: snapshot.to_vec(),
            factor: factor.clamp(0.0, 1.0),
        }
    }

    #[must_use]
    pub fn positions(&self) -> &[Point3] {
        &self.current
    }

    #[must_use]
    pub fn factor(&self) -> f64 {
        self.factor
    }

    /// Moves every position a `1 - factor` fraction of the way to its target.
    ///
    /// A different point count is a topology change: the positions are
    /// replaced by `targets` without blending. Returns `true` in that case.
    pub fn advance(&mut self, targets: &[Point3]) -> bool {
        if targets.len() != self.current.len() {
            self.current = targets.to_vec();
            return true;
        }
        let t = 1.0 - self.factor;
        for (current, &target) in self.current.iter_mut().zip(targets) {
            *current = current.lerp(target, t);
        }
        false
    }
}

#[derive(Debug)]
pub struct TubeGenerator {
    config: TubeConfig,
    options: TubeOptions,
    input_transform: Option<Transform>,
    smoothing: Option<SmoothingState>,
    accumulator: f64,
    mesh: Option<Arc<TubeMesh>>,
    diagnostics: Option<TubeDiagnostics>,
    ctx: GeomContext,
}

impl TubeGenerator {
    pub fn new(config: TubeConfig) -> Result<Self, TubeError> {
        let config = config.sanitized();
        config.validate()?;
        Ok(Self {
            options: config.to_tube_options(),
            config,
            input_transform: None,
            smoothing: None,
            accumulator: 0.0,
            mesh: None,
            diagnostics: None,
            ctx: GeomContext::new(),
        })
    }

    #[must_use]
    pub fn config(&self) -> &TubeConfig {
        &self.config
    }

    #[must_use]
    pub fn mode(&self) -> UpdateMode {
        if self.config.use_smooth_update {
            UpdateMode::Smoothed
        } else {
            UpdateMode::Immediate
        }
    }

    /// Replaces the configuration. Takes effect on the next tick or rebuild.
    ///
    /// Switching smoothing off discards the persisted positions; a new
    /// smoothing factor is applied to them in place.
    pub fn set_config(&mut self, config: TubeConfig) -> Result<(), TubeError> {
        let config = config.sanitized();
        config.validate()?;

        if config.use_smooth_update {
            if let Some(state) = self.smoothing.as_mut() {
                state.factor = config.smoothing_factor;
            }
        } else {
            self.smoothing = None;
        }
        self.options = config.to_tube_options();
        self.config = config;
        Ok(())
    }

    #[must_use]
    pub fn input_transform(&self) -> Option<Transform> {
        self.input_transform
    }

    /// Transform applied to every control point before sampling.
    pub fn set_input_transform(&mut self, transform: Option<Transform>) {
        self.input_transform = transform;
    }

    /// The last successfully built mesh.
    #[must_use]
    pub fn mesh(&self) -> Option<Arc<TubeMesh>> {
        self.mesh.clone()
    }

    #[must_use]
    pub fn diagnostics(&self) -> Option<&TubeDiagnostics> {
        self.diagnostics.as_ref()
    }

    #[must_use]
    pub fn smoothing(&self) -> Option<&SmoothingState> {
        self.smoothing.as_ref()
    }

    /// Advances the controller by `dt` seconds with the latest snapshot.
    pub fn tick(&mut self, dt: f64, targets: &[Point3]) -> Result<TickOutcome, TubeError> {
        if !dt.is_finite() || dt < 0.0 {
            return Err(TubeError::InvalidGeometryParameters(
                "tick delta must be finite and >= 0".to_string(),
            ));
        }
        let targets = self.apply_input_transform(targets);

        match self.mode() {
            UpdateMode::Immediate => {
                self.accumulator += dt;
                let due = self.mesh.is_none()
                    || self.accumulator >= self.config.update_interval_seconds;
                if !due {
                    log::trace!(
                        "tube tick throttled ({:.4}s of {:.4}s)",
                        self.accumulator,
                        self.config.update_interval_seconds
                    );
                    return Ok(TickOutcome::Throttled);
                }
                self.build(&targets, None)?;
                self.accumulator = 0.0;
            }
            UpdateMode::Smoothed => {
                let mut metrics = GeomMetrics::default();
                metrics.begin();
                let next = metrics.time(TimingBucket::Smoothing, || {
                    self.next_smoothing_state(&targets)
                });
                self.build(next.positions(), metrics.end())?;
                log::trace!("smoothed tick (factor {:.3})", next.factor);
                self.smoothing = Some(next);
            }
        }
        Ok(TickOutcome::Rebuilt)
    }

    /// Runs the full pipeline on `targets` now, ignoring the throttle.
    ///
    /// When smoothing is on, the persisted positions snap to the snapshot.
    pub fn rebuild(&mut self, targets: &[Point3]) -> Result<Arc<TubeMesh>, TubeError> {
        let targets = self.apply_input_transform(targets);
        let mesh = self.build(&targets, None)?;
        self.accumulator = 0.0;
        if self.config.use_smooth_update {
            self.smoothing = Some(SmoothingState::new(&targets, self.config.smoothing_factor));
        }
        Ok(mesh)
    }

    fn apply_input_transform(&self, points: &[Point3]) -> Vec<Point3> {
        match self.input_transform {
            Some(transform) => points.iter().map(|&p| transform.apply_point(p)).collect(),
            None => points.to_vec(),
        }
    }

    fn next_smoothing_state(&self, targets: &[Point3]) -> SmoothingState {
        match &self.smoothing {
            Some(state) => {
                let mut next = state.clone();
                if next.advance(targets) {
                    log::debug!(
                        "control point count changed {} -> {}; smoothing reset",
                        state.current.len(),
                        targets.len()
                    );
                }
                next
            }
            None => SmoothingState::new(targets, self.config.smoothing_factor),
        }
    }

    fn build(
        &mut self,
        points: &[Point3],
        smoothing_timing: Option<GeomTimingReport>,
    ) -> Result<Arc<TubeMesh>, TubeError> {
        let (mesh, mut diagnostics) =
            generate_tube_with_context(points, &self.options, &mut self.ctx).inspect_err(|err| {
                log::warn!("tube rebuild rejected: {err}");
            })?;

        if let (Some(timing), Some(smoothing)) = (diagnostics.timing.as_mut(), smoothing_timing) {
            timing.smoothing_ns = smoothing.smoothing_ns;
        }

        let mesh = Arc::new(mesh);
        self.mesh = Some(Arc::clone(&mesh));
        self.diagnostics = Some(diagnostics);
        Ok(mesh)
    }
}

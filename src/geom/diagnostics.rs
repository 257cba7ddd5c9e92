//! Diagnostics collected while building a tube.
//!
//! Every successful build returns a [`TubeDiagnostics`] next to the mesh. The
//! counts describe the pipeline's intermediate sizes; the
//! `degenerate_direction_count` exposes how often the frame propagator had to
//! recover from a zero-length or NaN direction.
//!
//! ```ignore
//! let (mesh, diagnostics) = generate_tube(&points, &options)?;
//! if diagnostics.degenerate_direction_count > 0 {
//!     log::warn!("{}", diagnostics.summary());
//! }
//! ```

use std::fmt;

use serde::Serialize;

use super::metrics::GeomTimingReport;

#[derive(Debug, Default, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TubeDiagnostics {
    /// Control points handed to the sampler.
    pub control_point_count: usize,

    /// Points on the smoothed path.
    pub sample_count: usize,

    /// Vertex rings emitted; one per sample.
    pub ring_count: usize,

    /// Vertices in the final mesh, caps included.
    pub vertex_count: usize,

    /// Triangles in the final mesh, caps included.
    pub triangle_count: usize,

    /// Cap fans emitted (0, 1 or 2).
    pub cap_count: usize,

    /// Forward vectors or rotation axes that were zero-length or NaN.
    ///
    /// These are recovered locally by carrying the previous frame forward and
    /// never fail the build.
    pub degenerate_direction_count: usize,

    /// Consecutive forward vectors turning by more than ~75°.
    pub sharp_turn_count: usize,

    /// Per-stage timings; only populated with the `tube_metrics` feature on
    /// non-WASM targets.
    #[serde(skip)]
    pub timing: Option<GeomTimingReport>,

    pub warnings: Vec<String>,
}

impl TubeDiagnostics {
    /// `true` when no recoveries happened and nothing was worth a warning.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.degenerate_direction_count == 0
            && self.sharp_turn_count == 0
            && self.warnings.is_empty()
    }

    #[must_use]
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    pub fn add_warning(&mut self, warning: impl Into<String>) {
        self.warnings.push(warning.into());
    }

    /// Short summary for logging.
    ///
    /// Format: `"P:{controls} S:{samples} V:{vertices} T:{triangles} [issues...]"`
    #[must_use]
    pub fn summary(&self) -> String {
        let mut parts = vec![format!(
            "P:{} S:{} V:{} T:{}",
            self.control_point_count, self.sample_count, self.vertex_count, self.triangle_count
        )];

        if self.cap_count > 0 {
            parts.push(format!("caps:{}", self.cap_count));
        }
        if self.degenerate_direction_count > 0 {
            parts.push(format!("degenerate:{}", self.degenerate_direction_count));
        }
        if self.sharp_turn_count > 0 {
            parts.push(format!("sharp:{}", self.sharp_turn_count));
        }

        parts.join(" ")
    }
}

impl fmt::Display for TubeDiagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Tube Diagnostics:")?;
        writeln!(f, "  Control points: {}", self.control_point_count)?;
        writeln!(f, "  Samples: {}", self.sample_count)?;
        writeln!(f, "  Rings: {}", self.ring_count)?;
        writeln!(f, "  Vertices: {}", self.vertex_count)?;
        writeln!(f, "  Triangles: {}", self.triangle_count)?;
        writeln!(f, "  Caps: {}", self.cap_count)?;

        if self.degenerate_direction_count > 0 {
            writeln!(f, "  Degenerate directions: {}", self.degenerate_direction_count)?;
        }
        if self.sharp_turn_count > 0 {
            writeln!(f, "  Sharp turns: {}", self.sharp_turn_count)?;
        }

        if !self.warnings.is_empty() {
            writeln!(f, "  Warnings:")?;
            for warning in &self.warnings {
                writeln!(f, "    - {warning}")?;
            }
        }

        if let Some(ref timing) = self.timing {
            writeln!(f, "  Timing: {} ms total", timing.total_ms())?;
        }

        let status = if self.is_clean() { "CLEAN" } else { "RECOVERED" };
        writeln!(f, "  Status: {status}")?;

        Ok(())
    }
}

//! User-facing tube configuration.
//!
//! `TubeConfig` is what hosts (JS via `serde-wasm-bindgen`, the CLI, tests)
//! hand to the generator. Writing a field never rebuilds anything; the new
//! values take effect on the next tick or manual rebuild.

use serde::{Deserialize, Serialize};

use crate::geom::{FrameOptions, IndexFormat, TexcoordV, TubeCaps, TubeError, TubeOptions, Vec3};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TubeConfig {
    pub radius: f64,
    pub circle_segments: usize,
    pub interpolation_steps: usize,
    /// Spline tension in `[0, 1]`.
    pub smoothness: f64,
    pub cap_ends: bool,
    /// Fraction of the previous position kept per smoothed tick, in `[0, 1]`.
    pub smoothing_factor: f64,
    pub use_smooth_update: bool,
    /// Minimum time between throttled rebuilds. Only read when
    /// `use_smooth_update` is off.
    pub update_interval_seconds: f64,
    pub index_format: IndexFormat,
    pub texcoord_v: TexcoordV,
    pub world_up: [f64; 3],
    pub world_right: [f64; 3],
}

impl Default for TubeConfig {
    fn default() -> Self {
        Self {
            radius: 0.05,
            circle_segments: 12,
            interpolation_steps: 10,
            smoothness: 0.5,
            cap_ends: true,
            smoothing_factor: 0.5,
            use_smooth_update: false,
            update_interval_seconds: 1.0 / 30.0,
            index_format: IndexFormat::U32,
            texcoord_v: TexcoordV::SampleIndex,
            world_up: [0.0, 1.0, 0.0],
            world_right: [1.0, 0.0, 0.0],
        }
    }
}

impl TubeConfig {
    /// Copy with the unit-interval fields clamped. NaN is left for
    /// [`validate`](Self::validate) to reject.
    #[must_use]
    pub fn sanitized(&self) -> Self {
        Self {
            smoothness: self.smoothness.clamp(0.0, 1.0),
            smoothing_factor: self.smoothing_factor.clamp(0.0, 1.0),
            ..self.clone()
        }
    }

    pub fn validate(&self) -> Result<(), TubeError> {
        if !self.smoothing_factor.is_finite() {
            return Err(TubeError::InvalidGeometryParameters(
                "smoothing_factor must be finite".to_string(),
            ));
        }
        if !self.use_smooth_update
            && !(self.update_interval_seconds.is_finite() && self.update_interval_seconds > 0.0)
        {
            return Err(TubeError::InvalidGeometryParameters(
                "update_interval_seconds must be finite and > 0".to_string(),
            ));
        }
        self.to_tube_options().validate()
    }

    #[must_use]
    pub fn caps(&self) -> TubeCaps {
        if self.cap_ends { TubeCaps::BOTH } else { TubeCaps::NONE }
    }

    #[must_use]
    pub fn to_tube_options(&self) -> TubeOptions {
        TubeOptions {
            radius: self.radius,
            circle_segments: self.circle_segments,
            interpolation_steps: self.interpolation_steps,
            smoothness: self.smoothness,
            caps: self.caps(),
            index_format: self.index_format,
            texcoord_v: self.texcoord_v,
            frame: FrameOptions {
                world_up: Vec3::from_array(self.world_up),
                world_right: Vec3::from_array(self.world_right),
                ..FrameOptions::default()
            },
        }
    }
}

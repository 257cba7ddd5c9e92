//! Tube mesh builder and the stateless sampling → frames → rings → caps
//! pipeline.

use serde::{Deserialize, Serialize};

use super::caps::add_caps;
use super::diagnostics::TubeDiagnostics;
use super::frames::{Frame, FrameOptions, propagate_frames_with_options};
use super::mesh::{GeomContext, IndexFormat, TubeMesh};
use super::metrics::TimingBucket;
use super::spline::{sample_count, sample_path};
use super::Point3;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TubeError {
    #[error("tube requires at least 2 control points, got {found}")]
    InsufficientPoints { found: usize },
    #[error("invalid geometry parameters: {0}")]
    InvalidGeometryParameters(String),
    #[error("{vertex_count} vertices exceed the {format} index range")]
    IndexOverflow {
        vertex_count: usize,
        format: IndexFormat,
    },
    #[error("control point {index} has a non-finite coordinate")]
    NonFiniteControlPoint { index: usize },
    #[error("got {frames} frames for {points} points")]
    FrameCountMismatch { points: usize, frames: usize },
}

/// Which tube ends receive a cap fan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TubeCaps {
    pub start: bool,
    pub end: bool,
}

impl TubeCaps {
    pub const NONE: Self = Self { start: false, end: false };
    pub const START: Self = Self { start: true, end: false };
    pub const END: Self = Self { start: false, end: true };
    pub const BOTH: Self = Self { start: true, end: true };

    #[must_use]
    pub fn count(self) -> usize {
        usize::from(self.start) + usize::from(self.end)
    }
}

/// How the along-tube texture coordinate `v` is assigned to rings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TexcoordV {
    /// `i / (rings - 1)`.
    #[default]
    SampleIndex,
    /// Cumulative path length over total length.
    ArcLength,
}

/// Unit-circle table for one cross-section, shared by every ring.
///
/// Depends on the segment count only, so equal counts give bit-identical
/// rings regardless of radius or position.
#[derive(Debug, Clone, PartialEq)]
pub struct AngleTable {
    pub cos: Vec<f64>,
    pub sin: Vec<f64>,
}

impl AngleTable {
    #[must_use]
    pub fn new(segments: usize) -> Self {
        let (cos, sin) = (0..segments)
            .map(|k| {
                let theta = std::f64::consts::TAU * k as f64 / segments as f64;
                (theta.cos(), theta.sin())
            })
            .unzip();
        Self { cos, sin }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.cos.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cos.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TubeOptions {
    pub radius: f64,
    /// Vertices per ring; at least 3.
    pub circle_segments: usize,
    /// Samples contributed by each control-point segment.
    pub interpolation_steps: usize,
    /// Spline tension, used clamped to `[0, 1]`.
    pub smoothness: f64,
    pub caps: TubeCaps,
    pub index_format: IndexFormat,
    pub texcoord_v: TexcoordV,
    pub frame: FrameOptions,
}

impl Default for TubeOptions {
    fn default() -> Self {
        Self {
            radius: 0.05,
            circle_segments: 12,
            interpolation_steps: 10,
            smoothness: 0.5,
            caps: TubeCaps::BOTH,
            index_format: IndexFormat::U32,
            texcoord_v: TexcoordV::SampleIndex,
            frame: FrameOptions::default(),
        }
    }
}

impl TubeOptions {
    pub fn validate(&self) -> Result<(), TubeError> {
        validate_ring_parameters(self.radius, self.circle_segments)?;
        if self.interpolation_steps < 1 {
            return Err(invalid("interpolation_steps must be >= 1"));
        }
        if !self.smoothness.is_finite() {
            return Err(invalid("smoothness must be finite"));
        }
        let up = self.frame.world_up;
        let right = self.frame.world_right;
        if up.normalized().is_none() || right.normalized().is_none() {
            return Err(invalid("world axes must be finite and non-zero"));
        }
        if up.cross(right).normalized().is_none() {
            return Err(invalid("world_up and world_right must not be parallel"));
        }
        Ok(())
    }

    /// Vertices the full pipeline emits for `sample_count` samples, or
    /// `None` on arithmetic overflow.
    #[must_use]
    pub fn expected_vertex_count(&self, sample_count: usize) -> Option<usize> {
        sample_count
            .checked_mul(self.circle_segments)?
            .checked_add(self.caps.count())
    }
}

fn invalid(message: &str) -> TubeError {
    TubeError::InvalidGeometryParameters(message.to_string())
}

fn validate_ring_parameters(radius: f64, circle_segments: usize) -> Result<(), TubeError> {
    if !radius.is_finite() || radius <= 0.0 {
        return Err(invalid("radius must be finite and > 0"));
    }
    if circle_segments < 3 {
        return Err(invalid("circle_segments must be >= 3"));
    }
    Ok(())
}

/// Builds the side surface: one ring per point, quads stitched between
/// consecutive rings. No caps.
pub fn build_tube(
    points: &[Point3],
    frames: &[Frame],
    radius: f64,
    circle_segments: usize,
) -> Result<TubeMesh, TubeError> {
    let options = TubeOptions {
        radius,
        circle_segments,
        ..TubeOptions::default()
    };
    build_tube_with_options(points, frames, &options)
}

pub fn build_tube_with_options(
    points: &[Point3],
    frames: &[Frame],
    options: &TubeOptions,
) -> Result<TubeMesh, TubeError> {
    validate_ring_parameters(options.radius, options.circle_segments)?;
    if points.len() < 2 {
        return Err(TubeError::InsufficientPoints { found: points.len() });
    }
    if frames.len() != points.len() {
        return Err(TubeError::FrameCountMismatch {
            points: points.len(),
            frames: frames.len(),
        });
    }

    let segments = options.circle_segments;
    let vertex_count = points
        .len()
        .checked_mul(segments)
        .unwrap_or(usize::MAX);
    options.index_format.check(vertex_count)?;
    let index_count = (points.len() - 1)
        .checked_mul(segments)
        .and_then(|quads| quads.checked_mul(6))
        .ok_or(TubeError::IndexOverflow {
            vertex_count,
            format: options.index_format,
        })?;

    let table = AngleTable::new(segments);
    let v_coords = ring_v_coords(points, options.texcoord_v);

    let mut mesh = TubeMesh {
        positions: Vec::with_capacity(vertex_count),
        normals: Vec::with_capacity(vertex_count),
        uvs: Vec::with_capacity(vertex_count),
        indices: Vec::with_capacity(index_count),
        index_format: options.index_format,
    };

    for ((&point, frame), &v) in points.iter().zip(frames).zip(&v_coords) {
        for k in 0..segments {
            let radial = frame.radial(table.cos[k], table.sin[k]);
            let normal = radial.normalized().unwrap_or(frame.right);
            let position = point.add_vec(radial.mul_scalar(options.radius));
            let u = k as f64 / segments as f64;
            mesh.push_vertex(position, normal.to_array(), [u, v]);
        }
    }

    for ring in 0..points.len() - 1 {
        let current_base = ring * segments;
        let next_base = current_base + segments;
        for k in 0..segments {
            let k_next = (k + 1) % segments;

            let current = (current_base + k) as u32;
            let current_next = (current_base + k_next) as u32;
            let next = (next_base + k) as u32;
            let next_next = (next_base + k_next) as u32;

            mesh.indices.extend_from_slice(&[current, current_next, next]);
            mesh.indices.extend_from_slice(&[next, current_next, next_next]);
        }
    }

    Ok(mesh)
}

fn ring_v_coords(points: &[Point3], mode: TexcoordV) -> Vec<f64> {
    let last = (points.len() - 1).max(1) as f64;
    let by_index = || -> Vec<f64> { (0..points.len()).map(|i| i as f64 / last).collect() };

    match mode {
        TexcoordV::SampleIndex => by_index(),
        TexcoordV::ArcLength => {
            let mut cumulative = Vec::with_capacity(points.len());
            let mut total = 0.0;
            cumulative.push(total);
            for pair in points.windows(2) {
                total += pair[0].distance_to(pair[1]);
                cumulative.push(total);
            }
            if total > 0.0 && total.is_finite() {
                cumulative.into_iter().map(|d| d / total).collect()
            } else {
                by_index()
            }
        }
    }
}

/// Runs the full pipeline on one control-point snapshot.
pub fn generate_tube(
    control_points: &[Point3],
    options: &TubeOptions,
) -> Result<(TubeMesh, TubeDiagnostics), TubeError> {
    let mut ctx = GeomContext::new();
    generate_tube_with_context(control_points, options, &mut ctx)
}

pub fn generate_tube_with_context(
    control_points: &[Point3],
    options: &TubeOptions,
    ctx: &mut GeomContext,
) -> Result<(TubeMesh, TubeDiagnostics), TubeError> {
    options.validate()?;
    ctx.metrics.begin();

    // Reject before any sample or vertex is allocated.
    let vertex_count = sample_count(control_points.len(), options.interpolation_steps)
        .and_then(|samples| options.expected_vertex_count(samples))
        .unwrap_or(usize::MAX);
    options.index_format.check(vertex_count)?;

    let tension = options.smoothness.clamp(0.0, 1.0);
    let samples = ctx.metrics.time(TimingBucket::Sampling, || {
        sample_path(control_points, options.interpolation_steps, tension)
    })?;

    let frame_options = FrameOptions {
        tolerance: ctx.tolerance,
        ..options.frame
    };
    let (frames, frame_stats) = ctx.metrics.time(TimingBucket::Frames, || {
        propagate_frames_with_options(&samples, frame_options)
    });

    let mesh = ctx.metrics.time(TimingBucket::Rings, || {
        build_tube_with_options(&samples, &frames, options)
    })?;

    let mesh = if options.caps.count() > 0 {
        ctx.metrics.time(TimingBucket::Caps, || {
            add_caps(mesh, &samples, &frames, options.circle_segments, options.caps)
        })?
    } else {
        mesh
    };

    let diagnostics = TubeDiagnostics {
        control_point_count: control_points.len(),
        sample_count: samples.len(),
        ring_count: samples.len(),
        vertex_count: mesh.vertex_count(),
        triangle_count: mesh.triangle_count(),
        cap_count: options.caps.count(),
        degenerate_direction_count: frame_stats.degenerate_direction_count,
        sharp_turn_count: frame_stats.sharp_turn_count,
        timing: ctx.metrics.end(),
        warnings: frame_stats.warnings,
    };
    log::debug!("tube rebuilt: {}", diagnostics.summary());

    Ok((mesh, diagnostics))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_angle_table_quarter_points() {
        let table = AngleTable::new(4);
        assert_eq!(table.len(), 4);
        assert_eq!(table.cos[0], 1.0);
        assert_eq!(table.sin[0], 0.0);
        assert!(table.cos[1].abs() < 1e-15);
        assert!((table.sin[1] - 1.0).abs() < 1e-15);
        assert!((table.cos[2] + 1.0).abs() < 1e-15);
    }

    #[test]
    fn test_angle_table_is_pure() {
        assert_eq!(AngleTable::new(17), AngleTable::new(17));
    }

    #[test]
    fn test_caps_count() {
        assert_eq!(TubeCaps::NONE.count(), 0);
        assert_eq!(TubeCaps::START.count(), 1);
        assert_eq!(TubeCaps::END.count(), 1);
        assert_eq!(TubeCaps::BOTH.count(), 2);
    }

    #[test]
    fn test_options_validate() {
        assert!(TubeOptions::default().validate().is_ok());

        let bad = [
            TubeOptions { radius: 0.0, ..TubeOptions::default() },
            TubeOptions { radius: f64::NAN, ..TubeOptions::default() },
            TubeOptions { circle_segments: 2, ..TubeOptions::default() },
            TubeOptions { interpolation_steps: 0, ..TubeOptions::default() },
            TubeOptions { smoothness: f64::INFINITY, ..TubeOptions::default() },
        ];
        for options in bad {
            assert!(matches!(
                options.validate(),
                Err(TubeError::InvalidGeometryParameters(_))
            ));
        }
    }

    #[test]
    fn test_options_reject_parallel_world_axes() {
        let mut options = TubeOptions::default();
        options.frame.world_right = options.frame.world_up.mul_scalar(2.0);
        assert!(options.validate().is_err());
    }

    #[test]
    fn test_arc_length_v_coords() {
        let points = [
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(4.0, 0.0, 0.0),
        ];
        let v = ring_v_coords(&points, TexcoordV::ArcLength);
        assert_eq!(v, vec![0.0, 0.25, 1.0]);

        let v = ring_v_coords(&points, TexcoordV::SampleIndex);
        assert_eq!(v, vec![0.0, 0.5, 1.0]);
    }

    #[test]
    fn test_huge_step_count_reports_overflow() {
        let controls = [
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(2.0, 0.0, 0.0),
        ];
        for interpolation_steps in [usize::MAX, usize::MAX / 4] {
            let options = TubeOptions {
                interpolation_steps,
                index_format: IndexFormat::U32,
                ..TubeOptions::default()
            };
            assert_eq!(
                generate_tube(&controls, &options).unwrap_err(),
                TubeError::IndexOverflow {
                    vertex_count: usize::MAX,
                    format: IndexFormat::U32,
                }
            );
        }
    }

    #[test]
    fn test_huge_segment_count_reports_overflow() {
        let points = [Point3::new(0.0, 0.0, 0.0), Point3::new(1.0, 0.0, 0.0)];
        let frames = crate::geom::propagate_frames(&points);
        let options = TubeOptions {
            circle_segments: usize::MAX / 2 + 1,
            ..TubeOptions::default()
        };
        assert!(matches!(
            build_tube_with_options(&points, &frames, &options),
            Err(TubeError::IndexOverflow { vertex_count: usize::MAX, .. })
        ));
    }

    #[test]
    fn test_error_display() {
        let err = TubeError::IndexOverflow {
            vertex_count: 70_000,
            format: IndexFormat::U16,
        };
        assert_eq!(err.to_string(), "70000 vertices exceed the 16-bit index range");
    }
}

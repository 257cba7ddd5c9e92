//! Rotation-minimizing frames along a sampled path.
//!
//! Frames are produced by parallel transport: the seed frame is oriented
//! against the world axes and every following frame is the previous one
//! rotated by exactly the turn between consecutive forward vectors. The
//! propagation is a strict left-to-right fold; frame `i` depends on `i - 1`.

use super::{Point3, Tolerance, Vec3};

/// A dot product below this value (~75° turn) between consecutive forward
/// vectors is reported as a sharp turn.
const SHARP_TURN_DOT: f64 = 0.25;

/// Orthonormal, right-handed local basis anchored at a sample point.
///
/// `right × up == forward`, all three unit length.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Frame {
    pub forward: Vec3,
    pub right: Vec3,
    pub up: Vec3,
}

impl Frame {
    /// Offset of a ring vertex at angle `(cos, sin)` around this frame.
    #[must_use]
    pub fn radial(&self, cos: f64, sin: f64) -> Vec3 {
        self.right.mul_scalar(cos).add(self.up.mul_scalar(sin))
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameOptions {
    /// Reference up axis for the seed frame.
    pub world_up: Vec3,
    /// Seed `right` reference when the path starts (near) parallel to `world_up`.
    pub world_right: Vec3,
    /// `|forward · world_up|` above which the path counts as vertical.
    pub vertical_threshold: f64,
    /// Turns smaller than this (radians) carry the previous frame unrotated.
    pub min_turn_angle: f64,
    pub tolerance: Tolerance,
}

impl Default for FrameOptions {
    fn default() -> Self {
        Self {
            world_up: Vec3::Y,
            world_right: Vec3::X,
            vertical_threshold: 0.99,
            min_turn_angle: Tolerance::FRAME_ANGLE.eps,
            tolerance: Tolerance::ZERO_LENGTH,
        }
    }
}

/// Bookkeeping produced alongside the frames.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrameStats {
    /// Forward vectors or rotation axes that were zero-length or NaN and were
    /// recovered by carrying the previous direction/frame.
    pub degenerate_direction_count: usize,
    pub sharp_turn_count: usize,
    pub warnings: Vec<String>,
}

/// Propagates frames with the default world axes (`+Y` up, `+X` right).
#[must_use]
pub fn propagate_frames(points: &[Point3]) -> Vec<Frame> {
    propagate_frames_with_options(points, FrameOptions::default()).0
}

/// Computes one frame per point. `output.len() == points.len()`.
#[must_use]
pub fn propagate_frames_with_options(
    points: &[Point3],
    options: FrameOptions,
) -> (Vec<Frame>, FrameStats) {
    let mut stats = FrameStats::default();
    if points.is_empty() {
        return (Vec::new(), stats);
    }

    let forwards = forward_vectors(points, options, &mut stats);

    let mut frames = Vec::with_capacity(points.len());
    frames.push(seed_frame(forwards[0], options));

    for &forward in &forwards[1..] {
        let prev = frames[frames.len() - 1];
        if prev.forward.dot(forward) < SHARP_TURN_DOT {
            stats.sharp_turn_count += 1;
        }
        let next = transport_frame(&prev, forward, options, &mut stats);
        frames.push(next);
    }

    if stats.sharp_turn_count > 0 {
        stats.warnings.push(format!(
            "path continuity warning: {} sharp turns",
            stats.sharp_turn_count
        ));
    }
    if stats.degenerate_direction_count > 0 {
        log::warn!(
            "frame propagation recovered {} degenerate directions",
            stats.degenerate_direction_count
        );
        stats.warnings.push(format!(
            "recovered {} degenerate directions",
            stats.degenerate_direction_count
        ));
    }

    (frames, stats)
}

/// Central differences inside, one-sided at the ends. Degenerate entries fall
/// back to a one-sided difference, then to the nearest valid neighbour.
fn forward_vectors(points: &[Point3], options: FrameOptions, stats: &mut FrameStats) -> Vec<Vec3> {
    let n = points.len();
    let tol = options.tolerance;
    let direction = |from: usize, to: usize| {
        let d = points[to].sub_point(points[from]);
        if tol.is_zero_vec3(d) { None } else { d.normalized() }
    };

    let mut raw: Vec<Option<Vec3>> = Vec::with_capacity(n);
    for i in 0..n {
        let primary = match i {
            _ if n == 1 => None,
            0 => direction(0, 1),
            _ if i == n - 1 => direction(n - 2, n - 1),
            _ => direction(i - 1, i + 1),
        };
        let dir = primary.or_else(|| {
            stats.degenerate_direction_count += 1;
            if n == 1 {
                return None;
            }
            let ahead = (i + 1 < n).then(|| direction(i, i + 1)).flatten();
            ahead.or_else(|| (i > 0).then(|| direction(i - 1, i)).flatten())
        });
        raw.push(dir);
    }

    let Some(first_valid) = raw.iter().copied().flatten().next() else {
        // Every point coincides; any consistent axis will do.
        let fallback = options
            .world_right
            .cross(options.world_up)
            .normalized()
            .unwrap_or(Vec3::Z);
        return vec![fallback; n];
    };

    let mut carried = first_valid;
    raw.into_iter()
        .map(|dir| {
            if let Some(d) = dir {
                carried = d;
            }
            carried
        })
        .collect()
}

fn seed_frame(forward: Vec3, options: FrameOptions) -> Frame {
    let up_ref = options.world_up.normalized().unwrap_or(Vec3::Y);
    let vertical = forward.dot(up_ref).abs() > options.vertical_threshold;

    let candidate = if vertical {
        options.world_right.reject_from(forward)
    } else {
        up_ref.cross(forward)
    };
    let right = candidate
        .normalized()
        .unwrap_or_else(|| any_perpendicular(forward));
    let up = forward
        .cross(right)
        .normalized()
        .unwrap_or_else(|| any_perpendicular(right));

    Frame { forward, right, up }
}

fn transport_frame(
    prev: &Frame,
    forward: Vec3,
    options: FrameOptions,
    stats: &mut FrameStats,
) -> Frame {
    let angle = prev.forward.dot(forward).clamp(-1.0, 1.0).acos();
    if angle < options.min_turn_angle {
        return carry_frame(prev, forward);
    }

    let axis = prev.forward.cross(forward);
    let axis = if options.tolerance.is_zero_vec3(axis) {
        None
    } else {
        axis.normalized()
    };
    let Some(axis) = axis else {
        stats.degenerate_direction_count += 1;
        return carry_frame(prev, forward);
    };

    let right = rotate_vector(prev.right, axis, angle);
    let up = rotate_vector(prev.up, axis, angle);
    orthonormalize(forward, right, up).unwrap_or_else(|| carry_frame(prev, forward))
}

/// Keeps the previous orientation, only re-projecting it onto the plane
/// perpendicular to the new forward vector.
fn carry_frame(prev: &Frame, forward: Vec3) -> Frame {
    orthonormalize(forward, prev.right, prev.up).unwrap_or_else(|| {
        let right = any_perpendicular(forward);
        Frame { forward, right, up: forward.cross(right) }
    })
}

fn orthonormalize(forward: Vec3, right: Vec3, up: Vec3) -> Option<Frame> {
    let right = right.reject_from(forward).normalized()?;
    let up = up
        .reject_from(forward)
        .reject_from(right)
        .normalized()
        .filter(|u| forward.cross(right).dot(*u) > 0.0)
        .unwrap_or_else(|| forward.cross(right));
    Some(Frame { forward, right, up })
}

/// Rodrigues' rotation of `v` about the unit `axis`.
fn rotate_vector(v: Vec3, axis: Vec3, angle: f64) -> Vec3 {
    let cos_angle = angle.cos();
    let sin_angle = angle.sin();

    let k_cross_v = axis.cross(v);
    let k_dot_v = axis.dot(v);

    v.mul_scalar(cos_angle)
        .add(k_cross_v.mul_scalar(sin_angle))
        .add(axis.mul_scalar(k_dot_v * (1.0 - cos_angle)))
}

fn any_perpendicular(v: Vec3) -> Vec3 {
    let reference = if v.x.abs() < 0.9 { Vec3::X } else { Vec3::Y };
    v.cross(reference).normalized().unwrap_or(Vec3::Z)
}

//! Path sampling: densifies a control polyline with a tension-controlled
//! Catmull-Rom (cubic Hermite) spline.
//!
//! Every segment `p1 -> p2` contributes exactly `steps` points at
//! `t = 1/steps, 2/steps, ..., 1`; the point at `t = 0` is the end of the
//! previous segment, so anchors are never duplicated. The first and last
//! sample are copied from the control points, never evaluated.

use super::mesh::IndexFormat;
use super::tube::TubeError;
use super::{Point3, Vec3};

/// Number of samples [`sample_path`] produces for `control_count` points, or
/// `None` when it does not fit in `usize`.
#[must_use]
pub fn sample_count(control_count: usize, steps: usize) -> Option<usize> {
    if control_count <= 2 || steps <= 1 {
        return Some(control_count);
    }
    control_count
        .checked_sub(1)?
        .checked_mul(steps)?
        .checked_add(1)
}

/// Samples a smooth curve through `control_points`.
///
/// `tension` scales the Catmull-Rom tangents: `0` gives straight segments
/// between the control points, `1` the classic smooth curve. With exactly two
/// control points or `steps <= 1` the control points are returned unchanged.
pub fn sample_path(
    control_points: &[Point3],
    steps: usize,
    tension: f64,
) -> Result<Vec<Point3>, TubeError> {
    if control_points.len() < 2 {
        return Err(TubeError::InsufficientPoints {
            found: control_points.len(),
        });
    }
    if let Some(index) = control_points.iter().position(|p| !p.is_finite()) {
        return Err(TubeError::NonFiniteControlPoint { index });
    }
    if !tension.is_finite() {
        return Err(TubeError::InvalidGeometryParameters(
            "smoothness must be finite".to_string(),
        ));
    }

    if control_points.len() == 2 || steps <= 1 {
        return Ok(control_points.to_vec());
    }

    let n = control_points.len();
    let count = sample_count(n, steps).ok_or(TubeError::IndexOverflow {
        vertex_count: usize::MAX,
        format: IndexFormat::U32,
    })?;
    // No mesh can address more samples than a 32-bit index reaches.
    IndexFormat::U32.check(count)?;
    let mut samples = Vec::new();
    samples
        .try_reserve_exact(count)
        .map_err(|_| TubeError::IndexOverflow {
            vertex_count: count,
            format: IndexFormat::U32,
        })?;
    samples.push(control_points[0]);

    for seg in 0..n - 1 {
        // Duplicate-endpoint boundary: the missing neighbour is the anchor itself.
        let p0 = control_points[seg.saturating_sub(1)];
        let p1 = control_points[seg];
        let p2 = control_points[seg + 1];
        let p3 = control_points[(seg + 2).min(n - 1)];

        let m1 = p2.sub_point(p0).mul_scalar(0.5 * tension);
        let m2 = p3.sub_point(p1).mul_scalar(0.5 * tension);

        for step in 1..steps {
            let t = step as f64 / steps as f64;
            samples.push(hermite_point(p1, m1, p2, m2, t));
        }
        samples.push(p2);
    }

    Ok(samples)
}

/// Cubic Hermite interpolation between `p1` and `p2` with tangents `m1`, `m2`.
fn hermite_point(p1: Point3, m1: Vec3, p2: Point3, m2: Vec3, t: f64) -> Point3 {
    let t2 = t * t;
    let t3 = t2 * t;

    let h00 = 2.0 * t3 - 3.0 * t2 + 1.0;
    let h10 = t3 - 2.0 * t2 + t;
    let h01 = -2.0 * t3 + 3.0 * t2;
    let h11 = t3 - t2;

    let blended = p1
        .to_vec3()
        .mul_scalar(h00)
        .add(m1.mul_scalar(h10))
        .add(p2.to_vec3().mul_scalar(h01))
        .add(m2.mul_scalar(h11));
    Point3::from_vec3(blended)
}

//! End caps: a center vertex plus a triangle fan over the first and/or last
//! ring. The fans reuse the ring vertices, so each cap adds exactly one
//! vertex and `3 * segments` indices.

use super::frames::Frame;
use super::mesh::TubeMesh;
use super::tube::{TubeCaps, TubeError};
use super::Point3;

const CAP_UV: [f64; 2] = [0.5, 0.5];

/// Appends the requested caps to a side mesh produced by
/// [`build_tube`](super::tube::build_tube) for the same `points`/`frames`.
///
/// The start fan is wound against the path direction and the end fan along
/// it, so both face away from the tube.
pub fn add_caps(
    mut mesh: TubeMesh,
    points: &[Point3],
    frames: &[Frame],
    circle_segments: usize,
    caps: TubeCaps,
) -> Result<TubeMesh, TubeError> {
    if frames.len() != points.len() {
        return Err(TubeError::FrameCountMismatch {
            points: points.len(),
            frames: frames.len(),
        });
    }
    let (Some(&first_point), Some(&last_point)) = (points.first(), points.last()) else {
        return Err(TubeError::InsufficientPoints { found: 0 });
    };
    if circle_segments < 3 {
        return Err(TubeError::InvalidGeometryParameters(
            "circle_segments must be >= 3".to_string(),
        ));
    }
    let ring_vertices = points.len() * circle_segments;
    if mesh.vertex_count() != ring_vertices {
        return Err(TubeError::InvalidGeometryParameters(format!(
            "mesh has {} vertices, expected {} rings of {}",
            mesh.vertex_count(),
            points.len(),
            circle_segments
        )));
    }
    mesh.index_format.check(ring_vertices + caps.count())?;

    let segments = circle_segments as u32;

    if caps.start {
        let forward = frames[0].forward;
        let center = mesh.push_vertex(first_point, forward.neg().to_array(), CAP_UV);
        for k in 0..segments {
            let k_next = (k + 1) % segments;
            mesh.indices.extend_from_slice(&[center, k_next, k]);
        }
    }

    if caps.end {
        let last = points.len() - 1;
        let base = (last * circle_segments) as u32;
        let forward = frames[last].forward;
        let center = mesh.push_vertex(last_point, forward.to_array(), CAP_UV);
        for k in 0..segments {
            let k_next = (k + 1) % segments;
            mesh.indices.extend_from_slice(&[center, base + k, base + k_next]);
        }
    }

    Ok(mesh)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geom::{build_tube, propagate_frames};

    fn straight() -> (Vec<Point3>, Vec<Frame>, TubeMesh) {
        let points = vec![Point3::new(0.0, 0.0, 0.0), Point3::new(0.0, 0.0, 5.0)];
        let frames = propagate_frames(&points);
        let mesh = build_tube(&points, &frames, 1.0, 6).unwrap();
        (points, frames, mesh)
    }

    #[test]
    fn test_no_caps_is_identity() {
        let (points, frames, mesh) = straight();
        let capped = add_caps(mesh.clone(), &points, &frames, 6, TubeCaps::NONE).unwrap();
        assert_eq!(capped, mesh);
    }

    #[test]
    fn test_start_only() {
        let (points, frames, mesh) = straight();
        let capped = add_caps(mesh, &points, &frames, 6, TubeCaps::START).unwrap();
        assert_eq!(capped.vertex_count(), 13);
        assert_eq!(capped.indices.len(), 36 + 18);
        assert_eq!(capped.normals[12], [0.0, 0.0, -1.0]);
        assert_eq!(capped.uvs[12], [0.5, 0.5]);
    }

    #[test]
    fn test_rejects_mismatched_mesh() {
        let (points, frames, mesh) = straight();
        let err = add_caps(mesh, &points, &frames, 8, TubeCaps::BOTH).unwrap_err();
        assert!(matches!(err, TubeError::InvalidGeometryParameters(_)));
    }

    #[test]
    fn test_rejects_frame_count_mismatch() {
        let (points, frames, mesh) = straight();
        let err = add_caps(mesh, &points, &frames[..1], 6, TubeCaps::BOTH).unwrap_err();
        assert_eq!(err, TubeError::FrameCountMismatch { points: 2, frames: 1 });
    }
}

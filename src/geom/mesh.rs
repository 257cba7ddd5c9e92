use std::fmt;

use serde::{Deserialize, Serialize};

use super::metrics::GeomMetrics;
use super::tube::TubeError;
use super::{BBox, Point3, Tolerance};

/// Floats per vertex in [`TubeMesh::interleaved`]: position (3), normal (3), texcoord (2).
pub const INTERLEAVED_STRIDE: usize = 8;

/// Index width the rendering backend consumes. The builder refuses to emit a
/// mesh whose vertex count does not fit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IndexFormat {
    U16,
    #[default]
    U32,
}

impl IndexFormat {
    /// Largest vertex count addressable with this index width.
    #[must_use]
    pub const fn max_vertex_count(self) -> usize {
        match self {
            Self::U16 => u16::MAX as usize + 1,
            Self::U32 => u32::MAX as usize,
        }
    }

    pub fn check(self, vertex_count: usize) -> Result<(), TubeError> {
        if vertex_count > self.max_vertex_count() {
            return Err(TubeError::IndexOverflow {
                vertex_count,
                format: self,
            });
        }
        Ok(())
    }
}

impl fmt::Display for IndexFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::U16 => f.write_str("16-bit"),
            Self::U32 => f.write_str("32-bit"),
        }
    }
}

/// Triangulated tube surface: one ring of vertices per sample point, plus an
/// optional center vertex per cap appended after the rings.
///
/// A mesh is an output value. Rebuilds produce a new `TubeMesh`; nothing in
/// the crate mutates one after it has been handed out.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TubeMesh {
    pub positions: Vec<[f64; 3]>,
    pub normals: Vec<[f64; 3]>,
    pub uvs: Vec<[f64; 2]>,
    pub indices: Vec<u32>,
    pub index_format: IndexFormat,
}

impl TubeMesh {
    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    #[must_use]
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Pushes one vertex and returns its index.
    pub(crate) fn push_vertex(&mut self, position: Point3, normal: [f64; 3], uv: [f64; 2]) -> u32 {
        let index = self.positions.len() as u32;
        self.positions.push(position.to_array());
        self.normals.push(normal);
        self.uvs.push(uv);
        index
    }

    #[must_use]
    pub fn bounds(&self) -> Option<BBox> {
        BBox::from_points(self.positions.iter().copied().map(Point3::from_array))
    }

    /// Returns true if any vertex position contains NaN or Inf values.
    #[must_use]
    pub fn has_invalid_vertices(&self) -> bool {
        self.positions
            .iter()
            .any(|p| !p[0].is_finite() || !p[1].is_finite() || !p[2].is_finite())
    }

    #[must_use]
    pub fn has_valid_indices(&self) -> bool {
        let n = self.positions.len();
        self.indices.iter().all(|&i| (i as usize) < n)
    }

    #[must_use]
    pub fn has_valid_attribute_lengths(&self) -> bool {
        let n = self.positions.len();
        self.normals.len() == n && self.uvs.len() == n
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.indices.len() % 3 != 0 {
            return Err("mesh indices are not a triangle list (len % 3 != 0)".to_string());
        }
        if self.has_invalid_vertices() {
            return Err("mesh has invalid vertex coordinates (NaN/Inf)".to_string());
        }
        if !self.has_valid_indices() {
            return Err("mesh has out-of-bounds vertex indices".to_string());
        }
        if !self.has_valid_attribute_lengths() {
            return Err("mesh attribute buffers do not match vertex count".to_string());
        }
        if self.vertex_count() > self.index_format.max_vertex_count() {
            return Err(format!("mesh exceeds the {} index range", self.index_format));
        }
        let bad_normal = self.normals.iter().any(|n| {
            let len = (n[0] * n[0] + n[1] * n[1] + n[2] * n[2]).sqrt();
            !len.is_finite() || (len - 1.0).abs() > 1e-6
        });
        if bad_normal {
            return Err("mesh has non-unit normals".to_string());
        }
        Ok(())
    }

    /// Vertex buffer with interleaved `[px, py, pz, nx, ny, nz, u, v]` records.
    #[must_use]
    pub fn interleaved(&self) -> Vec<f32> {
        let mut out = Vec::with_capacity(self.vertex_count() * INTERLEAVED_STRIDE);
        for ((p, n), uv) in self.positions.iter().zip(&self.normals).zip(&self.uvs) {
            out.extend(p.iter().chain(n).chain(uv).map(|&v| v as f32));
        }
        out
    }

    /// Index buffer narrowed to 16 bits, or `IndexOverflow` if any index
    /// does not fit.
    pub fn indices_u16(&self) -> Result<Vec<u16>, TubeError> {
        IndexFormat::U16.check(self.vertex_count())?;
        self.indices
            .iter()
            .map(|&i| {
                u16::try_from(i).map_err(|_| TubeError::IndexOverflow {
                    vertex_count: self.vertex_count(),
                    format: IndexFormat::U16,
                })
            })
            .collect()
    }
}

/// Per-call state threaded through the pipeline stages.
#[derive(Debug)]
pub struct GeomContext {
    pub tolerance: Tolerance,
    pub metrics: GeomMetrics,
}

impl GeomContext {
    #[must_use]
    pub fn new() -> Self {
        Self {
            tolerance: Tolerance::ZERO_LENGTH,
            metrics: GeomMetrics::default(),
        }
    }
}

impl Default for GeomContext {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn triangle() -> TubeMesh {
        let mut mesh = TubeMesh::default();
        mesh.push_vertex(Point3::new(0.0, 0.0, 0.0), [0.0, 0.0, 1.0], [0.0, 0.0]);
        mesh.push_vertex(Point3::new(1.0, 0.0, 0.0), [0.0, 0.0, 1.0], [1.0, 0.0]);
        mesh.push_vertex(Point3::new(0.0, 1.0, 0.0), [0.0, 0.0, 1.0], [0.0, 1.0]);
        mesh.indices.extend_from_slice(&[0, 1, 2]);
        mesh
    }

    #[test]
    fn test_push_vertex_returns_sequential_indices() {
        let mut mesh = TubeMesh::default();
        assert_eq!(mesh.push_vertex(Point3::ORIGIN, [1.0, 0.0, 0.0], [0.0, 0.0]), 0);
        assert_eq!(mesh.push_vertex(Point3::ORIGIN, [1.0, 0.0, 0.0], [0.0, 0.0]), 1);
    }

    #[test]
    fn test_interleaved_layout() {
        let mesh = triangle();
        let buffer = mesh.interleaved();
        assert_eq!(buffer.len(), 3 * INTERLEAVED_STRIDE);
        assert_eq!(&buffer[8..16], &[1.0, 0.0, 0.0, 0.0, 0.0, 1.0, 1.0, 0.0]);
    }

    #[test]
    fn test_validate_detects_bad_index() {
        let mut mesh = triangle();
        assert!(mesh.validate().is_ok());
        mesh.indices[2] = 7;
        assert!(mesh.validate().is_err());
    }

    #[test]
    fn test_validate_detects_non_unit_normal() {
        let mut mesh = triangle();
        mesh.normals[1] = [0.0, 0.0, 2.0];
        assert!(mesh.validate().is_err());
    }

    #[test]
    fn test_indices_u16() {
        let mesh = triangle();
        assert_eq!(mesh.indices_u16().unwrap(), vec![0, 1, 2]);
    }

    #[test]
    fn test_index_format_limits() {
        assert!(IndexFormat::U16.check(65_536).is_ok());
        assert!(matches!(
            IndexFormat::U16.check(65_537),
            Err(TubeError::IndexOverflow { vertex_count: 65_537, format: IndexFormat::U16 })
        ));
        assert!(IndexFormat::U32.check(1_000_000).is_ok());
    }

    #[test]
    fn test_bounds() {
        let bounds = triangle().bounds().unwrap();
        assert_eq!(bounds.min, Point3::new(0.0, 0.0, 0.0));
        assert_eq!(bounds.max, Point3::new(1.0, 1.0, 0.0));
        assert!(TubeMesh::default().bounds().is_none());
    }
}

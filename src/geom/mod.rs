mod caps;
mod core;
mod diagnostics;
mod frames;
mod metrics;
mod mesh;
mod spline;
mod tube;

pub use caps::add_caps;
pub use core::{BBox, Point3, Tolerance, Transform, Vec3};
pub use diagnostics::TubeDiagnostics;
pub use frames::{Frame, FrameOptions, FrameStats, propagate_frames, propagate_frames_with_options};
pub use mesh::{GeomContext, INTERLEAVED_STRIDE, IndexFormat, TubeMesh};
pub use metrics::{GeomMetrics, GeomTimingReport, TimingBucket};
pub use spline::{sample_count, sample_path};
pub use tube::{
    AngleTable, TexcoordV, TubeCaps, TubeError, TubeOptions, build_tube, build_tube_with_options,
    generate_tube, generate_tube_with_context,
};

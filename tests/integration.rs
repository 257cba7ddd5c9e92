use std::sync::Arc;

use tube_engine::TubeEngine;
use tube_engine::config::TubeConfig;
use tube_engine::generator::{TickOutcome, TubeGenerator, UpdateMode};
use tube_engine::geom::{
    INTERLEAVED_STRIDE, IndexFormat, Point3, Transform, TubeError, Vec3,
};

fn arc(n: usize, lift: f64) -> Vec<Point3> {
    (0..n)
        .map(|i| {
            let a = i as f64 * 0.4;
            Point3::new(3.0 * a.cos(), lift * i as f64, 3.0 * a.sin())
        })
        .collect()
}

#[test]
fn default_config_matches_documented_values() {
    let config = TubeConfig::default();
    assert_eq!(config.circle_segments, 12);
    assert_eq!(config.interpolation_steps, 10);
    assert!(config.cap_ends);
    assert!(!config.use_smooth_update);
    assert!((config.update_interval_seconds - 1.0 / 30.0).abs() < 1e-15);
}

#[test]
fn generator_counts_match_closed_form() {
    let config = TubeConfig {
        circle_segments: 9,
        interpolation_steps: 4,
        ..TubeConfig::default()
    };
    let mut generator = TubeGenerator::new(config).expect("config");
    let mesh = generator.rebuild(&arc(5, 0.2)).expect("rebuild");

    let samples = (5 - 1) * 4 + 1;
    assert_eq!(mesh.vertex_count(), samples * 9 + 2);
    assert_eq!(mesh.indices.len(), 6 * 9 * (samples - 1) + 6 * 9);
    mesh.validate().expect("valid mesh");

    let diag = generator.diagnostics().expect("diagnostics");
    assert_eq!(diag.sample_count, samples);
    assert_eq!(diag.degenerate_direction_count, 0);
}

#[test]
fn insufficient_points_keep_last_mesh() {
    let mut generator = TubeGenerator::new(TubeConfig::default()).expect("config");
    let first = generator.rebuild(&arc(4, 0.0)).expect("rebuild");

    let err = generator.rebuild(&arc(1, 0.0)).unwrap_err();
    assert_eq!(err, TubeError::InsufficientPoints { found: 1 });
    assert!(Arc::ptr_eq(&first, &generator.mesh().expect("mesh kept")));
}

#[test]
fn previous_mesh_survives_rebuild_untouched() {
    let mut generator = TubeGenerator::new(TubeConfig::default()).expect("config");
    let old = generator.rebuild(&arc(4, 0.0)).expect("rebuild");
    let old_positions = old.positions.clone();

    let new = generator.rebuild(&arc(4, 1.0)).expect("rebuild");
    assert_eq!(old.positions, old_positions);
    assert_ne!(old.positions, new.positions);
}

#[test]
fn live_mode_switch_keeps_running() {
    let mut generator = TubeGenerator::new(TubeConfig::default()).expect("config");
    assert_eq!(generator.mode(), UpdateMode::Immediate);
    assert_eq!(generator.tick(0.0, &arc(4, 0.0)).unwrap(), TickOutcome::Rebuilt);

    let smoothed = TubeConfig {
        use_smooth_update: true,
        smoothing_factor: 0.5,
        ..TubeConfig::default()
    };
    generator.set_config(smoothed).expect("config");
    assert_eq!(generator.mode(), UpdateMode::Smoothed);

    assert_eq!(generator.tick(0.001, &arc(4, 0.0)).unwrap(), TickOutcome::Rebuilt);
    assert_eq!(generator.tick(0.001, &arc(4, 2.0)).unwrap(), TickOutcome::Rebuilt);

    let positions = generator.smoothing().expect("state").positions();
    let target = arc(4, 2.0);
    assert!((positions[3].y - 0.5 * target[3].y).abs() < 1e-12);
}

#[test]
fn u16_index_format_rejects_large_meshes() {
    let config = TubeConfig {
        circle_segments: 64,
        interpolation_steps: 20,
        index_format: IndexFormat::U16,
        ..TubeConfig::default()
    };
    let mut generator = TubeGenerator::new(config).expect("config");
    let err = generator.rebuild(&arc(60, 0.1)).unwrap_err();
    assert!(matches!(err, TubeError::IndexOverflow { format: IndexFormat::U16, .. }));
    assert!(generator.mesh().is_none());
}

#[test]
fn input_transform_is_applied_before_sampling() {
    let config = TubeConfig {
        cap_ends: false,
        ..TubeConfig::default()
    };
    let mut plain = TubeGenerator::new(config.clone()).expect("config");
    let mut moved = TubeGenerator::new(config).expect("config");
    moved.set_input_transform(Some(Transform::translate(Vec3::new(5.0, -2.0, 1.0))));

    let a = plain.rebuild(&arc(4, 0.3)).expect("rebuild");
    let b = moved.rebuild(&arc(4, 0.3)).expect("rebuild");

    for (p, q) in a.positions.iter().zip(&b.positions) {
        assert!((q[0] - p[0] - 5.0).abs() < 1e-9);
        assert!((q[1] - p[1] + 2.0).abs() < 1e-9);
        assert!((q[2] - p[2] - 1.0).abs() < 1e-9);
    }
    assert_eq!(a.normals.len(), b.normals.len());
}

#[test]
fn engine_exposes_interleaved_buffers() {
    let mut engine = TubeEngine::with_config(TubeConfig {
        circle_segments: 6,
        ..TubeConfig::default()
    })
    .expect("engine");

    let flat: Vec<f64> = arc(3, 0.5).iter().flat_map(|p| p.to_array()).collect();
    engine.rebuild(&flat).expect("rebuild");

    let vertices = engine.vertex_buffer();
    let indices = engine.index_buffer();
    assert_eq!(vertices.len(), engine.vertex_count() * INTERLEAVED_STRIDE);
    assert_eq!(indices.len(), engine.index_count());
    assert!(indices.iter().all(|&i| (i as usize) < engine.vertex_count()));

    // First vertex sits one radius away from the first control point.
    let p = Vec3::new(f64::from(vertices[0]), f64::from(vertices[1]), f64::from(vertices[2]));
    let start = arc(3, 0.5)[0].to_vec3();
    assert!((p.sub(start).length() - 0.05).abs() < 1e-6);
}

#[test]
fn oversized_step_count_is_rejected_and_keeps_mesh() {
    let mut generator = TubeGenerator::new(TubeConfig::default()).expect("config");
    let first = generator.rebuild(&arc(4, 0.0)).expect("rebuild");

    let huge = TubeConfig {
        interpolation_steps: usize::MAX,
        ..TubeConfig::default()
    };
    generator.set_config(huge).expect("steps are only bounded by the index range");
    let err = generator.rebuild(&arc(4, 0.0)).unwrap_err();
    assert!(matches!(
        err,
        TubeError::IndexOverflow { vertex_count: usize::MAX, format: IndexFormat::U32 }
    ));
    assert!(Arc::ptr_eq(&first, &generator.mesh().expect("mesh kept")));
}

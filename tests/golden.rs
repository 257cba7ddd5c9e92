use std::path::{Path, PathBuf};

use tube_engine::geom::{Point3, TubeCaps, TubeOptions, generate_tube};
use tube_engine::snapshot::{normalize_snapshot_text, tube_snapshot};

fn fixtures_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join("tube")
}

fn assert_or_update_fixture(name: &str, actual: &str) {
    let path = fixtures_dir().join(name);
    let actual = normalize_snapshot_text(actual);

    if std::env::var_os("TUBE_UPDATE_GOLDENS").is_some() {
        std::fs::create_dir_all(fixtures_dir()).expect("create fixtures dir");
        std::fs::write(&path, actual).expect("write golden fixture");
        return;
    }

    let expected = std::fs::read_to_string(&path)
        .unwrap_or_else(|err| panic!("missing fixture `{}`: {err}", path.display()));
    let expected = normalize_snapshot_text(&expected);

    assert_eq!(
        actual, expected,
        "golden mismatch for `{name}` (set TUBE_UPDATE_GOLDENS=1 to update)"
    );
}

fn straight(caps: TubeCaps) -> (Vec<Point3>, TubeOptions) {
    let controls = vec![Point3::new(0.0, 0.0, 0.0), Point3::new(10.0, 0.0, 0.0)];
    let options = TubeOptions {
        radius: 1.0,
        circle_segments: 4,
        caps,
        ..TubeOptions::default()
    };
    (controls, options)
}

#[test]
fn golden_straight_open() {
    let (controls, options) = straight(TubeCaps::NONE);
    let (mesh, diag) = generate_tube(&controls, &options).expect("tube");

    let snap = tube_snapshot("straight_open", &mesh, &diag);
    assert_or_update_fixture("straight_open.snap", &snap);
}

#[test]
fn golden_straight_capped() {
    let (controls, options) = straight(TubeCaps::BOTH);
    let (mesh, diag) = generate_tube(&controls, &options).expect("tube");

    let snap = tube_snapshot("straight_capped", &mesh, &diag);
    assert_or_update_fixture("straight_capped.snap", &snap);
}

#[test]
fn snapshot_is_stable_across_runs() {
    let controls: Vec<Point3> = (0..8)
        .map(|i| {
            let a = f64::from(i) * 0.7;
            Point3::new(a.cos(), 0.3 * f64::from(i), a.sin())
        })
        .collect();
    let options = TubeOptions {
        circle_segments: 7,
        interpolation_steps: 5,
        ..TubeOptions::default()
    };

    let (mesh_a, diag_a) = generate_tube(&controls, &options).expect("tube");
    let (mesh_b, diag_b) = generate_tube(&controls, &options).expect("tube");
    let a = tube_snapshot("helix", &mesh_a, &diag_a);
    let b = tube_snapshot("helix", &mesh_b, &diag_b);

    assert_eq!(a, b);
    assert!(a.contains(&format!("mesh.positions {}", 36 * 7 + 2)));
    assert!(!a.contains("-0.000000"));
    assert!(!a.contains("NaN"));
}

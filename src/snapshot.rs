//! Quantized, line-oriented text dumps of a built tube, used for golden
//! fixtures and by `tube_cli`.
//!
//! Every float is rounded to [`SNAPSHOT_QUANTIZE`] and printed with a fixed
//! number of decimals, with `-0` folded into `0`, so snapshots are stable
//! across platforms.

use std::fmt::Write as _;

use crate::geom::{TubeDiagnostics, TubeMesh};

pub const SNAPSHOT_QUANTIZE: f64 = 1e-6;
const SNAPSHOT_DECIMALS: usize = 6;

#[must_use]
pub fn normalize_snapshot_text(text: &str) -> String {
    let normalized = text.replace("\r\n", "\n");
    if normalized.ends_with('\n') {
        normalized
    } else {
        format!("{normalized}\n")
    }
}

fn quantize_f64(value: f64) -> f64 {
    if !value.is_finite() {
        return value;
    }
    let value = if value == -0.0 { 0.0 } else { value };
    let q = (value / SNAPSHOT_QUANTIZE).round() * SNAPSHOT_QUANTIZE;
    if q == -0.0 { 0.0 } else { q }
}

fn write_f64(out: &mut String, value: f64) {
    let value = quantize_f64(value);
    let _ = write!(out, "{value:.SNAPSHOT_DECIMALS$}");
}

fn write_floats_line(out: &mut String, prefix: &str, values: &[f64]) {
    out.push_str(prefix);
    for &v in values {
        out.push(' ');
        write_f64(out, v);
    }
    out.push('\n');
}

pub fn write_diagnostics(out: &mut String, diag: &TubeDiagnostics) {
    let _ = writeln!(out, "diag.control_point_count {}", diag.control_point_count);
    let _ = writeln!(out, "diag.sample_count {}", diag.sample_count);
    let _ = writeln!(out, "diag.ring_count {}", diag.ring_count);
    let _ = writeln!(out, "diag.vertex_count {}", diag.vertex_count);
    let _ = writeln!(out, "diag.triangle_count {}", diag.triangle_count);
    let _ = writeln!(out, "diag.cap_count {}", diag.cap_count);
    let _ = writeln!(
        out,
        "diag.degenerate_direction_count {}",
        diag.degenerate_direction_count
    );
    let _ = writeln!(out, "diag.sharp_turn_count {}", diag.sharp_turn_count);
    let _ = writeln!(out, "diag.warning_count {}", diag.warnings.len());
    for (idx, warning) in diag.warnings.iter().enumerate() {
        let _ = writeln!(out, "diag.warning.{idx} {warning}");
    }
}

pub fn write_mesh(out: &mut String, mesh: &TubeMesh) {
    let _ = writeln!(out, "mesh.index_format {}", mesh.index_format);

    let _ = writeln!(out, "mesh.positions {}", mesh.positions.len());
    for p in &mesh.positions {
        write_floats_line(out, "v", p);
    }

    let _ = writeln!(out, "mesh.normals {}", mesh.normals.len());
    for n in &mesh.normals {
        write_floats_line(out, "n", n);
    }

    let _ = writeln!(out, "mesh.uvs {}", mesh.uvs.len());
    for uv in &mesh.uvs {
        write_floats_line(out, "uv", uv);
    }

    let _ = writeln!(out, "mesh.indices {}", mesh.indices.len());
    for tri in mesh.indices.chunks(3) {
        out.push_str("tri");
        for i in tri {
            let _ = write!(out, " {i}");
        }
        out.push('\n');
    }
}

/// Full snapshot: header, diagnostics, mesh.
#[must_use]
pub fn tube_snapshot(op: &str, mesh: &TubeMesh, diag: &TubeDiagnostics) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "# tube-engine golden v1");
    let _ = writeln!(out, "op {op}");
    let _ = writeln!(out, "quantize {SNAPSHOT_QUANTIZE:.1e}");
    write_diagnostics(&mut out, diag);
    write_mesh(&mut out, mesh);
    normalize_snapshot_text(&out)
}

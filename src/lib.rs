#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod generator;
pub mod geom;
pub mod snapshot;

use std::fmt;

use config::TubeConfig;
use generator::{TickOutcome, TubeGenerator};
use geom::{Point3, Transform, TubeError};
#[cfg(target_arch = "wasm32")]
use wasm_bindgen::JsError;
use wasm_bindgen::prelude::*;

cfg_if::cfg_if! {
    if #[cfg(all(feature = "console_error_panic_hook", target_arch = "wasm32"))] {
        #[wasm_bindgen(start)]
        pub fn initialize() {
            console_error_panic_hook::set_once();
            init_logger();
        }
    } else {
        #[wasm_bindgen(start)]
        pub fn initialize() {
            // no-op fallback when panic hook is disabled
            init_logger();
        }
    }
}

#[cfg(feature = "debug_logs")]
fn init_logger() {
    use log::LevelFilter;
    use wasm_bindgen_console_logger::DEFAULT_LOGGER;
    if log::set_logger(&DEFAULT_LOGGER).is_ok() {
        log::set_max_level(LevelFilter::Debug);
    }
}

#[cfg(not(feature = "debug_logs"))]
fn init_logger() {
    // no-op fallback when debug logs are disabled
}

#[macro_export]
macro_rules! debug_log {
    ($($t:tt)*) => {{
        #[cfg(feature = "debug_logs")]
        {
            #[cfg(target_arch = "wasm32")]
            {
                ::web_sys::console::log_1(&::wasm_bindgen::JsValue::from_str(&format!($($t)*)));
            }
            #[cfg(not(target_arch = "wasm32"))]
            {
                println!("{}", format!($($t)*));
            }
        }
    }};
}

/// JS-facing tube generator. The host pushes control points as a flat
/// `[x0, y0, z0, x1, ...]` array and uploads the returned buffers.
#[wasm_bindgen]
pub struct TubeEngine {
    generator: TubeGenerator,
}

#[wasm_bindgen]
impl TubeEngine {
    /// `config` is a partial `TubeConfig` object; missing fields take their
    /// defaults. `undefined`/`null` means all defaults.
    #[wasm_bindgen(constructor)]
    pub fn new(config: JsValue) -> Result<TubeEngine, JsValue> {
        let config = config_from_js(config)?;
        Self::with_config(config).map_err(to_js_error)
    }

    #[wasm_bindgen]
    pub fn set_config(&mut self, config: JsValue) -> Result<(), JsValue> {
        let config = config_from_js(config)?;
        self.generator.set_config(config).map_err(to_js_error)
    }

    #[wasm_bindgen]
    pub fn config(&self) -> Result<JsValue, JsValue> {
        serde_wasm_bindgen::to_value(self.generator.config()).map_err(to_js_error)
    }

    /// Sets a 4x4 row-major matrix applied to every control point. An empty
    /// array clears it.
    #[wasm_bindgen]
    pub fn set_input_transform(&mut self, matrix: &[f64]) -> Result<(), JsValue> {
        let transform = transform_from_slice(matrix).map_err(to_js_error)?;
        self.generator.set_input_transform(transform);
        Ok(())
    }

    /// Returns `true` when the mesh was rebuilt, `false` when throttled.
    #[wasm_bindgen]
    pub fn tick(&mut self, dt: f64, points: &[f64]) -> Result<bool, JsValue> {
        let points = points_from_flat(points).map_err(to_js_error)?;
        let outcome = self.generator.tick(dt, &points).map_err(to_js_error)?;
        Ok(outcome == TickOutcome::Rebuilt)
    }

    #[wasm_bindgen]
    pub fn rebuild(&mut self, points: &[f64]) -> Result<(), JsValue> {
        let points = points_from_flat(points).map_err(to_js_error)?;
        self.generator.rebuild(&points).map_err(to_js_error)?;
        Ok(())
    }

    /// Interleaved `[px, py, pz, nx, ny, nz, u, v]` records.
    #[wasm_bindgen]
    pub fn vertex_buffer(&self) -> Vec<f32> {
        self.generator
            .mesh()
            .map(|mesh| mesh.interleaved())
            .unwrap_or_default()
    }

    #[wasm_bindgen]
    pub fn index_buffer(&self) -> Vec<u32> {
        self.generator
            .mesh()
            .map(|mesh| mesh.indices.clone())
            .unwrap_or_default()
    }

    /// Index buffer narrowed to 16 bits, for backends configured with
    /// `indexFormat: "u16"`. Fails if the mesh has more than 65536 vertices.
    #[wasm_bindgen]
    pub fn index_buffer_u16(&self) -> Result<Vec<u16>, JsValue> {
        self.generator
            .mesh()
            .map_or(Ok(Vec::new()), |mesh| mesh.indices_u16().map_err(to_js_error))
    }

    #[wasm_bindgen]
    pub fn vertex_count(&self) -> usize {
        self.generator.mesh().map_or(0, |mesh| mesh.vertex_count())
    }

    #[wasm_bindgen]
    pub fn index_count(&self) -> usize {
        self.generator.mesh().map_or(0, |mesh| mesh.indices.len())
    }

    #[wasm_bindgen]
    pub fn diagnostics(&self) -> Result<JsValue, JsValue> {
        serde_wasm_bindgen::to_value(&self.generator.diagnostics()).map_err(to_js_error)
    }
}

impl TubeEngine {
    pub fn with_config(config: TubeConfig) -> Result<Self, TubeError> {
        let generator = TubeGenerator::new(config)?;
        debug_log!("tube engine created: {:?}", generator.config());
        Ok(Self { generator })
    }

    #[must_use]
    pub fn generator(&self) -> &TubeGenerator {
        &self.generator
    }
}

fn config_from_js(value: JsValue) -> Result<TubeConfig, JsValue> {
    if value.is_undefined() || value.is_null() {
        return Ok(TubeConfig::default());
    }
    serde_wasm_bindgen::from_value(value).map_err(to_js_error)
}

fn points_from_flat(values: &[f64]) -> Result<Vec<Point3>, TubeError> {
    if values.len() % 3 != 0 {
        return Err(TubeError::InvalidGeometryParameters(format!(
            "flat point array length {} is not a multiple of 3",
            values.len()
        )));
    }
    Ok(values
        .chunks_exact(3)
        .map(|c| Point3::new(c[0], c[1], c[2]))
        .collect())
}

fn transform_from_slice(values: &[f64]) -> Result<Option<Transform>, TubeError> {
    if values.is_empty() {
        return Ok(None);
    }
    let matrix: [f64; 16] = values.try_into().map_err(|_| {
        TubeError::InvalidGeometryParameters(format!(
            "input transform needs 16 values, got {}",
            values.len()
        ))
    })?;
    Transform::from_row_major(matrix).map(Some).ok_or_else(|| {
        TubeError::InvalidGeometryParameters("input transform must be finite".to_string())
    })
}

fn to_js_error<E: fmt::Display>(error: E) -> JsValue {
    js_error(&error.to_string())
}

fn js_error(message: &str) -> JsValue {
    #[cfg(target_arch = "wasm32")]
    {
        JsError::new(message).into()
    }
    #[cfg(not(target_arch = "wasm32"))]
    {
        let _ = message;
        JsValue::NULL
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geom::{INTERLEAVED_STRIDE, IndexFormat};

    #[test]
    fn flat_points_are_grouped_in_threes() {
        let points = points_from_flat(&[0.0, 1.0, 2.0, 3.0, 4.0, 5.0]).unwrap();
        assert_eq!(points, vec![Point3::new(0.0, 1.0, 2.0), Point3::new(3.0, 4.0, 5.0)]);

        assert!(matches!(
            points_from_flat(&[0.0, 1.0]),
            Err(TubeError::InvalidGeometryParameters(_))
        ));
    }

    #[test]
    fn transform_slice_must_hold_sixteen_values() {
        assert_eq!(transform_from_slice(&[]).unwrap(), None);
        assert!(transform_from_slice(&[1.0; 9]).is_err());

        let mut identity = [0.0; 16];
        for i in 0..4 {
            identity[i * 5] = 1.0;
        }
        assert_eq!(transform_from_slice(&identity).unwrap(), Some(Transform::identity()));

        identity[3] = f64::NAN;
        assert!(transform_from_slice(&identity).is_err());
    }

    #[test]
    fn engine_buffers_follow_the_mesh() {
        let mut engine = TubeEngine::with_config(TubeConfig {
            circle_segments: 4,
            cap_ends: false,
            ..TubeConfig::default()
        })
        .unwrap();
        assert!(engine.vertex_buffer().is_empty());
        assert_eq!(engine.index_count(), 0);

        engine.rebuild(&[0.0, 0.0, 0.0, 10.0, 0.0, 0.0]).unwrap();
        assert_eq!(engine.vertex_count(), 8);
        assert_eq!(engine.index_count(), 24);
        assert_eq!(engine.vertex_buffer().len(), 8 * INTERLEAVED_STRIDE);
        assert_eq!(engine.index_buffer().len(), 24);
    }

    #[test]
    fn engine_narrows_indices_for_u16_backends() {
        let mut engine = TubeEngine::with_config(TubeConfig {
            circle_segments: 5,
            index_format: IndexFormat::U16,
            ..TubeConfig::default()
        })
        .unwrap();
        assert!(engine.index_buffer_u16().unwrap().is_empty());

        engine.rebuild(&[0.0, 0.0, 0.0, 1.0, 2.0, 0.0, 3.0, 0.0, 1.0]).unwrap();
        let narrow = engine.index_buffer_u16().unwrap();
        let wide = engine.index_buffer();
        assert_eq!(narrow.len(), wide.len());
        assert!(narrow.iter().zip(&wide).all(|(&a, &b)| u32::from(a) == b));
    }

    #[test]
    fn engine_refuses_to_narrow_large_meshes() {
        let mut engine = TubeEngine::with_config(TubeConfig {
            circle_segments: 40_000,
            index_format: IndexFormat::U32,
            ..TubeConfig::default()
        })
        .unwrap();
        engine.rebuild(&[0.0, 0.0, 0.0, 1.0, 0.0, 0.0]).unwrap();
        assert_eq!(engine.vertex_count(), 80_002);
        assert!(engine.index_buffer_u16().is_err());
    }

    #[test]
    fn engine_tick_reports_rebuilds() {
        let mut engine = TubeEngine::with_config(TubeConfig {
            update_interval_seconds: 1.0,
            ..TubeConfig::default()
        })
        .unwrap();
        let points = [0.0, 0.0, 0.0, 1.0, 1.0, 0.0, 2.0, 0.0, 0.0];

        assert!(engine.tick(0.1, &points).unwrap());
        assert!(!engine.tick(0.1, &points).unwrap());
        assert!(engine.tick(0.1, &points[..4]).is_err());
        assert_eq!(engine.generator().diagnostics().unwrap().control_point_count, 3);
    }
}

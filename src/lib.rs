#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

//! Advancing-front triangulation of closed planar boundary loops.
//!
//! The meshing core lives in [`geom`]. This crate root wires up logging and
//! exposes a small wasm surface around [`geom::mesh_boundary_loops`].

pub mod geom;

use std::fmt;

use serde::Serialize;
#[cfg(target_arch = "wasm32")]
use wasm_bindgen::JsError;
use wasm_bindgen::prelude::*;

use geom::{
    BoundaryLoop, FrontSnapshot, MeshError, MeshOptions, Panel, Tolerance, mesh_boundary_loops,
    mesh_from_panels,
};

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
    // a second initialize() keeps the first logger
    if log::set_logger(&DEFAULT_LOGGER).is_ok() {
        log::set_max_level(LevelFilter::Debug);
    }
}

#[cfg(not(feature = "debug_logs"))]
fn init_logger() {
    // no-op fallback when debug logs are disabled
}

#[cfg(all(feature = "parallel", target_arch = "wasm32"))]
#[wasm_bindgen(js_name = initializeParallel)]
pub async fn initialize_parallel(worker_count: Option<u32>) -> Result<(), JsError> {
    let threads = worker_count
        .map(|count| count.max(1) as usize)
        .or_else(|| {
            std::thread::available_parallelism()
                .map(|value| value.get())
                .ok()
        })
        .unwrap_or(1);

    wasm_bindgen_rayon::init_thread_pool(threads)
        .await
        .map_err(|err| JsError::new(&format!("could not start rayon thread pool: {err}")))
}

/// Result handed back to JavaScript callers.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MeshExport {
    pub panels: Vec<Panel>,
    pub vertices: Vec<[f64; 3]>,
    pub indices: Vec<u32>,
    pub normals: Vec<[f64; 3]>,
    pub iterations: usize,
    pub summary: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub snapshots: Vec<FrontSnapshot>,
}

/// Meshes `loops` and welds the panels into an indexed mesh.
pub fn export_mesh(
    loops: &[BoundaryLoop],
    spacing: f64,
    debug: bool,
) -> Result<MeshExport, MeshError> {
    let options = MeshOptions::new(spacing).with_debug(debug);
    let result = mesh_boundary_loops(loops, &options)?;
    let (mesh, mesh_diagnostics) = mesh_from_panels(&result.panels, Tolerance::WELD);

    Ok(MeshExport {
        iterations: result.diagnostics.iterations,
        summary: format!(
            "{} | {}",
            result.diagnostics.summary(),
            mesh_diagnostics.summary()
        ),
        snapshots: result.diagnostics.snapshots,
        panels: result.panels,
        vertices: mesh.positions,
        indices: mesh.indices,
        normals: mesh.normals.unwrap_or_default(),
    })
}

/// Triangulate boundary loops with the given target spacing.
///
/// `loops` is an array of `{ points: [{x, y, z}, ...], orientation, normal }`.
#[wasm_bindgen(js_name = meshBoundaryLoops)]
pub fn mesh_boundary_loops_js(
    loops: JsValue,
    spacing: f64,
    debug: bool,
) -> Result<JsValue, JsValue> {
    let loops: Vec<BoundaryLoop> = serde_wasm_bindgen::from_value(loops).map_err(to_js_error)?;
    let export = export_mesh(&loops, spacing, debug).map_err(to_js_error)?;
    serde_wasm_bindgen::to_value(&export).map_err(to_js_error)
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
    use super::export_mesh;
    use crate::geom::{BoundaryLoop, MeshError, Point3, Vec3};

    fn unit_square() -> BoundaryLoop {
        BoundaryLoop::outer(
            vec![
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(1.0, 0.0, 0.0),
                Point3::new(1.0, 1.0, 0.0),
                Point3::new(0.0, 1.0, 0.0),
                Point3::new(0.0, 0.0, 0.0),
            ],
            Vec3::Z,
        )
    }

    #[test]
    fn export_welds_square() {
        let export = export_mesh(&[unit_square()], 1.0, false).unwrap();
        assert_eq!(export.panels.len(), 2);
        assert_eq!(export.vertices.len(), 4);
        assert_eq!(export.indices.len(), 6);
        assert_eq!(export.normals.len(), 4);
        assert_eq!(export.iterations, 2);
        assert!(export.snapshots.is_empty());
        assert!(export.summary.contains("V:4 T:2"));
    }

    #[test]
    fn export_keeps_snapshots_in_debug() {
        let export = export_mesh(&[unit_square()], 1.0, true).unwrap();
        assert_eq!(export.snapshots.len(), 2);
        assert_eq!(export.snapshots[0].len(), 3);
        assert!(export.snapshots[1].is_empty());
    }

    #[test]
    fn export_reports_bad_spacing() {
        let err = export_mesh(&[unit_square()], -1.0, false).unwrap_err();
        assert!(matches!(err, MeshError::InvalidSpacing { .. }));
    }
}

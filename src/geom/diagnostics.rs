//! Diagnostics for advancing-front runs and the meshes they produce.
//!
//! [`AdvancingFrontDiagnostics`] tracks how the main loop progressed: how many
//! iterations ran, how often each case fired, how large the front grew and,
//! when the `debug` option is set, a snapshot of the front after every
//! iteration.
//!
//! [`GeomMeshDiagnostics`] describes the welded output mesh: vertex and
//! triangle counts, welding statistics and edge topology.
//!
//! # Example
//!
//! ```ignore
//! use afm_engine::geom::{mesh_boundary_loops, mesh_from_panels, MeshOptions, Tolerance};
//!
//! let result = mesh_boundary_loops(&loops, &MeshOptions::new(0.5))?;
//! println!("{}", result.diagnostics.summary());
//!
//! let (mesh, mesh_diag) = mesh_from_panels(&result.panels, Tolerance::WELD);
//! if !mesh_diag.is_manifold() {
//!     eprintln!("mesh has {} non-manifold edges", mesh_diag.non_manifold_edge_count);
//! }
//! ```

use std::fmt;

use super::advancing_front::StepKind;
use super::core::Point3;
use super::front::{FrontSnapshot, SideId};
use super::metrics::GeomTimingReport;

// ─────────────────────────────────────────────────────────────────────────────
// Advancing front
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Default, Clone, PartialEq)]
pub struct AdvancingFrontDiagnostics {
    /// Sides in the front before the first iteration.
    pub initial_side_count: usize,

    /// Iterations executed; equals the number of panels emitted.
    pub iterations: usize,

    /// Iteration budget the run was allowed.
    pub iteration_budget: usize,

    /// Largest live side count observed.
    pub peak_front_size: usize,

    /// Case 1a: apex placed at the ideal point.
    pub ideal_point_count: usize,

    /// Case 1b: apex placed where the ideal point crossed a constraining side.
    pub constraint_crossing_count: usize,

    /// Case 2: apex at an existing node with no side towards the current side.
    pub free_node_count: usize,

    /// Case 3: apex at a node already joined to one end of the current side.
    pub single_neighbor_count: usize,

    /// Case 4: apex closes a triangle with both adjacent sides.
    pub close_triangle_count: usize,

    /// Case 1b splits of an initial boundary side. Each adds one boundary
    /// vertex to the output.
    pub boundary_split_count: usize,

    /// Case 1b splits of a side that already bounds a panel. The old panel
    /// edge is not subdivided, so each leaves a hanging node: a zero-area slit
    /// of three open edges in the welded mesh.
    pub hanging_node_count: usize,

    /// Front after each iteration; only filled when `debug` is set.
    pub snapshots: Vec<FrontSnapshot>,

    /// Per-phase timing, only with the `mesh_engine_metrics` feature on native targets.
    pub timing: Option<GeomTimingReport>,

    pub warnings: Vec<String>,
}

impl AdvancingFrontDiagnostics {
    #[must_use]
    pub fn new(initial_side_count: usize, iteration_budget: usize) -> Self {
        Self {
            initial_side_count,
            iteration_budget,
            peak_front_size: initial_side_count,
            ..Self::default()
        }
    }

    /// Counts one iteration of the given kind.
    pub fn record(&mut self, kind: StepKind, front_size: usize) {
        self.iterations += 1;
        self.peak_front_size = self.peak_front_size.max(front_size);
        match kind {
            StepKind::IdealPoint => self.ideal_point_count += 1,
            StepKind::ConstraintCrossing => self.constraint_crossing_count += 1,
            StepKind::FreeNode => self.free_node_count += 1,
            StepKind::SingleNeighbor => self.single_neighbor_count += 1,
            StepKind::CloseTriangle => self.close_triangle_count += 1,
        }
    }

    /// How many iterations took the given case.
    #[must_use]
    pub fn count(&self, kind: StepKind) -> usize {
        match kind {
            StepKind::IdealPoint => self.ideal_point_count,
            StepKind::ConstraintCrossing => self.constraint_crossing_count,
            StepKind::FreeNode => self.free_node_count,
            StepKind::SingleNeighbor => self.single_neighbor_count,
            StepKind::CloseTriangle => self.close_triangle_count,
        }
    }

    /// Records a case 1b split of `side` at `apex`.
    pub fn record_split(&mut self, side: SideId, apex: Point3, on_boundary: bool) {
        if on_boundary {
            self.boundary_split_count += 1;
        } else {
            self.hanging_node_count += 1;
            self.add_warning(format!("side {side} split at {apex:?} leaves a hanging node"));
        }
    }

    /// Open edges the welded mesh of a converged run should have.
    ///
    /// Assumes no split side is itself the product of an earlier split.
    #[must_use]
    pub fn expected_open_edge_count(&self) -> usize {
        self.initial_side_count + self.boundary_split_count + 3 * self.hanging_node_count
    }

    pub fn add_warning(&mut self, warning: impl Into<String>) {
        self.warnings.push(warning.into());
    }

    /// Returns a short summary string suitable for logging.
    #[must_use]
    pub fn summary(&self) -> String {
        format!(
            "sides:{} iterations:{}/{} peak:{} 1a:{} 1b:{} 2:{} 3:{} 4:{} split:{} hanging:{}",
            self.initial_side_count,
            self.iterations,
            self.iteration_budget,
            self.peak_front_size,
            self.ideal_point_count,
            self.constraint_crossing_count,
            self.free_node_count,
            self.single_neighbor_count,
            self.close_triangle_count,
            self.boundary_split_count,
            self.hanging_node_count,
        )
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Output mesh
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Default, Clone, PartialEq)]
pub struct GeomMeshDiagnostics {
    /// Total number of vertices in the final mesh.
    pub vertex_count: usize,

    /// Total number of triangles in the final mesh.
    pub triangle_count: usize,

    /// Panel corners merged into an existing vertex during welding.
    pub welded_vertex_count: usize,

    /// Triangles rewound so their geometric normal follows the panel normal.
    pub flipped_triangle_count: usize,

    /// Triangles whose welded corners collapsed onto each other.
    pub degenerate_triangle_count: usize,

    /// Edges used by exactly one triangle. For a planar patch these are the
    /// boundary edges.
    pub open_edge_count: usize,

    /// Edges shared by more than two triangles.
    pub non_manifold_edge_count: usize,

    pub timing: Option<GeomTimingReport>,

    pub warnings: Vec<String>,
}

impl GeomMeshDiagnostics {
    /// Returns `true` if no edge is shared by more than two triangles.
    #[must_use]
    pub fn is_manifold(&self) -> bool {
        self.non_manifold_edge_count == 0
    }

    #[must_use]
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    pub fn add_warning(&mut self, warning: impl Into<String>) {
        self.warnings.push(warning.into());
    }

    /// Returns a short summary string suitable for logging.
    ///
    /// Format: `"V:{vertices} T:{triangles} [issues...]"`
    #[must_use]
    pub fn summary(&self) -> String {
        let mut parts = vec![format!("V:{} T:{}", self.vertex_count, self.triangle_count)];

        if self.welded_vertex_count > 0 {
            parts.push(format!("welded:{}", self.welded_vertex_count));
        }
        if self.flipped_triangle_count > 0 {
            parts.push(format!("flipped:{}", self.flipped_triangle_count));
        }
        if self.degenerate_triangle_count > 0 {
            parts.push(format!("degenerate:{}", self.degenerate_triangle_count));
        }
        if self.open_edge_count > 0 {
            parts.push(format!("open:{}", self.open_edge_count));
        }
        if self.non_manifold_edge_count > 0 {
            parts.push(format!("non-manifold:{}", self.non_manifold_edge_count));
        }

        parts.join(" ")
    }
}

impl fmt::Display for GeomMeshDiagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Mesh Diagnostics:")?;
        writeln!(f, "  Vertices: {}", self.vertex_count)?;
        writeln!(f, "  Triangles: {}", self.triangle_count)?;
        writeln!(f, "  Welded vertices: {}", self.welded_vertex_count)?;
        writeln!(f, "  Open edges: {}", self.open_edge_count)?;

        if self.flipped_triangle_count > 0 {
            writeln!(f, "  Flipped triangles: {}", self.flipped_triangle_count)?;
        }
        if self.degenerate_triangle_count > 0 {
            writeln!(f, "  Degenerate triangles: {}", self.degenerate_triangle_count)?;
        }
        if self.non_manifold_edge_count > 0 {
            writeln!(f, "  Non-manifold edges: {}", self.non_manifold_edge_count)?;
        }

        if !self.warnings.is_empty() {
            writeln!(f, "  Warnings:")?;
            for warning in &self.warnings {
                writeln!(f, "    - {warning}")?;
            }
        }

        if let Some(ref timing) = self.timing {
            writeln!(f, "  Timing: {} ms total", timing.total_ms())?;
        }

        Ok(())
    }
}

mod advancing_front;
mod boundary;
mod constraint;
mod core;
mod diagnostics;
mod front;
mod mesh;
mod metrics;
mod search;

pub use advancing_front::{
    AdvancingFront, DEFAULT_ITERATION_FLOOR, DEFAULT_ITERATIONS_PER_SIDE, MeshError, MeshOptions,
    MeshResult, Panel, Step, StepCase, StepKind, apply_step, classify_step, ideal_apex,
    mesh_boundary_loops,
};
pub use boundary::{BoundaryError, BoundaryLoop};
pub use constraint::{
    ANGLE_TOLERANCE_DEG, Constraint, WedgeConstraints, WedgeEnd, filter_candidates,
    find_constraints,
};
pub use core::{GeometryError, Point3, Tolerance, Vec3, angle_between_deg};
pub use diagnostics::{AdvancingFrontDiagnostics, GeomMeshDiagnostics};
pub use front::{Front, FrontSide, FrontSnapshot, SideId, SnapshotSide};
pub use mesh::{GeomMesh, mesh_from_panels};
pub use metrics::{GeomMetrics, GeomTimingReport, TimingBucket};
pub use search::{NearNode, find_connected_sides, find_near_nodes};

#[cfg(test)]
mod tests;

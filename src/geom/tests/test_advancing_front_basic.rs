use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::geom::{
    AdvancingFront, BoundaryLoop, Front, FrontSide, MeshError, MeshOptions, Point3, StepKind,
    Vec3, mesh_boundary_loops,
};

fn p(x: f64, y: f64) -> Point3 {
    Point3::new(x, y, 0.0)
}

fn square(size: f64, spacing: f64) -> BoundaryLoop {
    BoundaryLoop::from_polygon(
        &[p(0.0, 0.0), p(size, 0.0), p(size, size), p(0.0, size)],
        spacing,
        false,
        Vec3::Z,
    )
}

fn kinds(mesher: &mut AdvancingFront) -> Vec<StepKind> {
    let mut out = Vec::new();
    while let Some(step) = mesher.step().unwrap() {
        out.push(step.case.kind());
    }
    out
}

#[test]
fn unit_square_closes_in_two_panels() {
    let mut mesher =
        AdvancingFront::from_loops(&[square(1.0, 1.0)], MeshOptions::new(1.0)).unwrap();
    let kinds = kinds(&mut mesher);

    assert_eq!(kinds, vec![StepKind::SingleNeighbor, StepKind::CloseTriangle]);
    assert!(mesher.is_finished());

    let panels = mesher.panels();
    assert_eq!(panels.len(), 2);
    assert_eq!(panels[0].c, p(0.0, 1.0));
    let area: f64 = panels.iter().map(|panel| panel.area()).sum();
    assert!((area - 1.0).abs() < 1e-12);
    assert!(panels.iter().all(|panel| panel.normal == Vec3::Z));
}

#[test]
fn near_triangle_closes_in_one_iteration() {
    let tri = BoundaryLoop::outer(
        vec![p(0.0, 0.0), p(1.0, 0.0), p(0.5, 0.85), p(0.0, 0.0)],
        Vec3::Z,
    );
    let result = mesh_boundary_loops(&[tri], &MeshOptions::new(1.0)).unwrap();

    assert_eq!(result.panels.len(), 1);
    assert_eq!(result.diagnostics.iterations, 1);
    assert_eq!(result.diagnostics.close_triangle_count, 1);
    assert_eq!(result.panels[0].c, p(0.5, 0.85));
}

#[test]
fn isolated_edges_take_the_ideal_point() {
    let first = FrontSide::new(p(0.0, 0.0), p(1.0, 0.0), false, Vec3::Z).unwrap();
    let second = FrontSide::new(p(0.5, 10.0), p(0.5, 11.5), false, Vec3::Z).unwrap();
    let mut mesher =
        AdvancingFront::new(Front::new(vec![first, second]), MeshOptions::new(1.0)).unwrap();

    let a = mesher.step().unwrap().unwrap();
    let b = mesher.step().unwrap().unwrap();
    assert_eq!(a.case.kind(), StepKind::IdealPoint);
    assert_eq!(b.case.kind(), StepKind::IdealPoint);
    assert_eq!(mesher.panels().len(), 2);

    let apex = a.case.apex();
    assert!((apex.x - 0.5).abs() < 1e-12);
    assert!((apex.y - 0.75_f64.sqrt()).abs() < 1e-12);

    // second side runs along +y, so its ideal point lies towards -x
    let apex = b.case.apex();
    assert!((apex.x - (0.5 - 0.75_f64.sqrt())).abs() < 1e-12);
    assert!((apex.y - 10.75).abs() < 1e-12);
}

#[test]
fn open_chain_reports_not_converged() {
    let first = FrontSide::new(p(0.0, 0.0), p(1.0, 0.0), false, Vec3::Z).unwrap();
    let second = FrontSide::new(p(0.5, 10.0), p(0.5, 11.5), false, Vec3::Z).unwrap();
    let options = MeshOptions::new(1.0).with_max_iterations(10);
    let mesher = AdvancingFront::new(Front::new(vec![first, second]), options).unwrap();

    match mesher.run() {
        Err(MeshError::NotConverged {
            iterations,
            remaining,
            snapshot,
            panels,
        }) => {
            assert_eq!(iterations, 10);
            assert_eq!(panels.len(), 10);
            assert!(remaining > 0);
            assert_eq!(snapshot.len(), remaining);
            assert_eq!(snapshot.iteration, 10);
        }
        other => panic!("expected NotConverged, got {other:?}"),
    }
}

#[test]
fn two_by_two_square() {
    let mut mesher =
        AdvancingFront::from_loops(&[square(2.0, 1.0)], MeshOptions::new(1.0)).unwrap();
    let kinds = kinds(&mut mesher);

    assert_eq!(kinds.len(), 6);
    assert_eq!(kinds.iter().filter(|k| **k == StepKind::SingleNeighbor).count(), 5);
    assert_eq!(kinds.last(), Some(&StepKind::CloseTriangle));
}

#[test]
fn square_with_hole_conserves_area() {
    let hole = BoundaryLoop::from_polygon(
        &[p(1.5, 1.5), p(2.5, 1.5), p(2.5, 2.5), p(1.5, 2.5)],
        1.0,
        true,
        Vec3::Z,
    );
    let outer = square(4.0, 1.0);
    let expected = outer.enclosed_area() - hole.enclosed_area();
    let result = mesh_boundary_loops(&[outer, hole], &MeshOptions::new(1.0)).unwrap();

    assert_eq!(result.panels.len(), 20);
    let area: f64 = result.panels.iter().map(|panel| panel.area()).sum();
    assert!((area - expected).abs() < 1e-9);
    assert!((area - 15.0).abs() < 1e-9);
}

#[test]
fn disc_conserves_area() {
    let count: u32 = 25;
    let corners: Vec<Point3> = (0..count)
        .map(|i| {
            let t = std::f64::consts::TAU * f64::from(i) / f64::from(count);
            p(2.0 * t.cos(), 2.0 * t.sin())
        })
        .collect();
    let disc = BoundaryLoop::from_polygon(&corners, 0.5, false, Vec3::Z);
    let result = mesh_boundary_loops(&[disc.clone()], &MeshOptions::new(0.5)).unwrap();

    assert_eq!(result.panels.len(), 85);
    let area: f64 = result.panels.iter().map(|panel| panel.area()).sum();
    assert!((area - disc.enclosed_area()).abs() < 1e-9);
    assert!(result.diagnostics.ideal_point_count > 0);
}

#[test]
fn vertical_plane_is_meshed_in_its_own_frame() {
    let normal = Vec3::new(0.0, -1.0, 0.0);
    let xz = BoundaryLoop::outer(
        vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 1.0),
            Point3::new(0.0, 0.0, 1.0),
            Point3::new(0.0, 0.0, 0.0),
        ],
        normal,
    );
    let result = mesh_boundary_loops(&[xz], &MeshOptions::new(1.0)).unwrap();

    assert_eq!(result.panels.len(), 2);
    assert!(result.panels.iter().all(|panel| panel.normal == normal));
    assert!(result.panels.iter().flat_map(|panel| panel.vertices()).all(|v| v.y == 0.0));
    let area: f64 = result.panels.iter().map(|panel| panel.area()).sum();
    assert!((area - 1.0).abs() < 1e-12);
}

#[test]
fn repeated_runs_are_identical() {
    let mut rng = StdRng::seed_from_u64(7);
    let mut loop_points = square(3.0, 0.5).points;
    let last = loop_points.len() - 1;
    for point in &mut loop_points[1..last] {
        point.x += rng.random_range(-0.05..0.05);
        point.y += rng.random_range(-0.05..0.05);
    }
    let jittered = BoundaryLoop::outer(loop_points, Vec3::Z);
    let options = MeshOptions::new(0.5);

    let first = mesh_boundary_loops(std::slice::from_ref(&jittered), &options);
    let second = mesh_boundary_loops(std::slice::from_ref(&jittered), &options);
    match (first, second) {
        (Ok(a), Ok(b)) => {
            assert_eq!(a.panels, b.panels);
            assert_eq!(a.diagnostics.summary(), b.diagnostics.summary());
        }
        (Err(a), Err(b)) => assert_eq!(a, b),
        (a, b) => panic!("runs diverged: {a:?} vs {b:?}"),
    }
}

#[test]
fn debug_records_a_snapshot_per_iteration() {
    let options = MeshOptions::new(1.0).with_debug(true);
    let result = mesh_boundary_loops(&[square(2.0, 1.0)], &options).unwrap();

    let snaps = &result.diagnostics.snapshots;
    assert_eq!(snaps.len(), result.panels.len());
    assert_eq!(snaps[0].iteration, 1);
    assert!(snaps.last().is_some_and(|s| s.is_empty()));
    assert!(result.diagnostics.peak_front_size >= 8);

    let quiet = mesh_boundary_loops(&[square(2.0, 1.0)], &MeshOptions::new(1.0)).unwrap();
    assert!(quiet.diagnostics.snapshots.is_empty());
    assert_eq!(quiet.panels, result.panels);
}

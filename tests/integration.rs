use afm_engine::export_mesh;
use afm_engine::geom::{
    AdvancingFront, BoundaryError, BoundaryLoop, MeshError, MeshOptions, Point3, StepKind,
    Tolerance, Vec3, mesh_boundary_loops, mesh_from_panels,
};

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
fn unit_square_yields_two_panels() {
    let result =
        mesh_boundary_loops(&[unit_square()], &MeshOptions::new(1.0)).expect("mesh square");

    assert_eq!(result.panels.len(), 2);
    assert_eq!(result.diagnostics.iterations, 2);
    assert_eq!(result.diagnostics.count(StepKind::SingleNeighbor), 1);
    assert_eq!(result.diagnostics.count(StepKind::CloseTriangle), 1);

    let (mesh, diag) = mesh_from_panels(&result.panels, Tolerance::WELD);
    assert_eq!(mesh.vertex_count(), 4);
    assert_eq!(diag.open_edge_count, 4);
    assert!((mesh.area() - 1.0).abs() < 1e-12);
}

#[test]
fn first_ideal_point_sits_above_the_side() {
    let options = MeshOptions::new(1.0);
    let mesher = AdvancingFront::from_loops(&[unit_square()], options).expect("front");
    let first = mesher.front().first().expect("first side");
    let c = afm_engine::geom::ideal_apex(mesher.front().side(first), &options);

    assert!((c.x - 0.5).abs() < 1e-12);
    assert!((c.y - 0.866_025_403_784_438_6).abs() < 1e-12);
    assert!(c.z.abs() < 1e-12);
}

#[test]
fn invalid_input_is_rejected_up_front() {
    let err = mesh_boundary_loops(&[unit_square()], &MeshOptions::new(0.0)).unwrap_err();
    assert!(matches!(err, MeshError::InvalidSpacing { .. }));

    let short = BoundaryLoop::outer(
        vec![Point3::new(0.0, 0.0, 0.0), Point3::new(1.0, 0.0, 0.0), Point3::new(0.0, 0.0, 0.0)],
        Vec3::Z,
    );
    let err = mesh_boundary_loops(&[short], &MeshOptions::new(1.0)).unwrap_err();
    assert_eq!(
        err,
        MeshError::MalformedBoundary {
            loop_index: 0,
            source: BoundaryError::TooFewPoints { count: 2 },
        }
    );
    assert!(err.to_string().contains("boundary loop 0"));
}

#[test]
fn export_round_trips_through_serde() {
    let json = r#"[{
        "points": [
            {"x": 0.0, "y": 0.0, "z": 0.0},
            {"x": 1.0, "y": 0.0, "z": 0.0},
            {"x": 0.5, "y": 0.85, "z": 0.0},
            {"x": 0.0, "y": 0.0, "z": 0.0}
        ],
        "orientation": false,
        "normal": {"x": 0.0, "y": 0.0, "z": 1.0}
    }]"#;
    let loops: Vec<BoundaryLoop> = serde_json::from_str(json).expect("parse loops");

    let export = export_mesh(&loops, 1.0, false).expect("export");
    assert_eq!(export.panels.len(), 1);
    assert_eq!(export.vertices.len(), 3);
    assert_eq!(export.indices, vec![0, 1, 2]);
}

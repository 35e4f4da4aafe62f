use std::collections::HashMap;

use super::advancing_front::Panel;
use super::diagnostics::GeomMeshDiagnostics;
use super::metrics::{GeomMetrics, TimingBucket};
use super::{Point3, Tolerance, Vec3};

/// Indexed triangle mesh built from welded panels.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct GeomMesh {
    pub positions: Vec<[f64; 3]>,
    pub indices: Vec<u32>,
    /// Per-vertex unit normals, averaged from the panels that share the vertex.
    pub normals: Option<Vec<[f64; 3]>>,
}

impl GeomMesh {
    #[must_use]
    pub fn new(positions: Vec<[f64; 3]>, indices: Vec<u32>) -> Self {
        Self {
            positions,
            indices,
            normals: None,
        }
    }

    #[must_use]
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    /// Returns true if any vertex position contains NaN or Inf values.
    #[must_use]
    pub fn has_invalid_vertices(&self) -> bool {
        self.positions
            .iter()
            .any(|p| !p[0].is_finite() || !p[1].is_finite() || !p[2].is_finite())
    }

    /// Returns true if all vertex indices are within bounds.
    #[must_use]
    pub fn has_valid_indices(&self) -> bool {
        let n = self.positions.len();
        self.indices.iter().all(|&i| (i as usize) < n)
    }

    #[must_use]
    pub fn has_triangle_indices(&self) -> bool {
        self.indices.len() % 3 == 0
    }

    pub fn validate(&self) -> Result<(), String> {
        if !self.has_triangle_indices() {
            return Err("mesh indices are not a triangle list (len % 3 != 0)".to_string());
        }
        if self.has_invalid_vertices() {
            return Err("mesh has invalid vertex coordinates (NaN/Inf)".to_string());
        }
        if !self.has_valid_indices() {
            return Err("mesh has out-of-bounds vertex indices".to_string());
        }
        if self
            .normals
            .as_ref()
            .is_some_and(|normals| normals.len() != self.positions.len())
        {
            return Err("mesh normal buffer does not match vertex count".to_string());
        }
        Ok(())
    }

    /// Sum of triangle areas.
    #[must_use]
    pub fn area(&self) -> f64 {
        self.indices
            .chunks_exact(3)
            .filter_map(|tri| {
                let a = Point3::from_array(*self.positions.get(tri[0] as usize)?);
                let b = Point3::from_array(*self.positions.get(tri[1] as usize)?);
                let c = Point3::from_array(*self.positions.get(tri[2] as usize)?);
                Some(0.5 * (b - a).cross(c - a).length())
            })
            .sum()
    }
}

/// Welds coincident panel corners into an indexed mesh.
///
/// Each triangle is wound so its geometric normal agrees with the panel
/// normal. Edge topology is reported in the returned diagnostics; for a
/// converged run the open edges are exactly the boundary edges.
#[must_use]
pub fn mesh_from_panels(panels: &[Panel], tol: Tolerance) -> (GeomMesh, GeomMeshDiagnostics) {
    let mut metrics = GeomMetrics::default();
    metrics.begin();

    let (mesh, mut diagnostics) = metrics.time(TimingBucket::Welding, || {
        let mut points = Vec::with_capacity(panels.len() * 3);
        let mut panel_normals = Vec::with_capacity(panels.len());
        let mut flipped_triangle_count = 0usize;

        for panel in panels {
            let geometric = (panel.b - panel.a).cross(panel.c - panel.a);
            if geometric.dot(panel.normal) < 0.0 {
                points.extend_from_slice(&[panel.a, panel.c, panel.b]);
                flipped_triangle_count += 1;
            } else {
                points.extend_from_slice(&[panel.a, panel.b, panel.c]);
            }
            panel_normals.push(panel.normal);
        }

        #[allow(clippy::cast_possible_truncation)]
        let indices: Vec<u32> = (0..points.len() as u32).collect();
        let (points, indices, welded_vertex_count) = weld_vertices(points, indices, tol);
        let (indices, panel_normals, degenerate_triangle_count) =
            cull_degenerate_triangles(&points, &indices, &panel_normals, tol);
        let (open_edge_count, non_manifold_edge_count) = count_edge_topology(&indices);
        let normals = average_vertex_normals(points.len(), &indices, &panel_normals);

        let mut warnings = Vec::new();
        if degenerate_triangle_count > 0 {
            warnings.push("degenerate panels removed during welding".to_string());
        }
        if non_manifold_edge_count > 0 {
            warnings.push("mesh has non-manifold edges".to_string());
        }

        let mesh = GeomMesh {
            positions: points.into_iter().map(Point3::to_array).collect(),
            indices,
            normals: Some(normals),
        };
        let diagnostics = GeomMeshDiagnostics {
            vertex_count: mesh.vertex_count(),
            triangle_count: mesh.triangle_count(),
            welded_vertex_count,
            flipped_triangle_count,
            degenerate_triangle_count,
            open_edge_count,
            non_manifold_edge_count,
            timing: None,
            warnings,
        };
        (mesh, diagnostics)
    });

    if let Err(message) = mesh.validate() {
        diagnostics.add_warning(message);
    }
    diagnostics.timing = metrics.end();
    (mesh, diagnostics)
}

/// Merges points closer than `tol` using a hash grid with cell size `tol.eps`.
fn weld_vertices(
    points: Vec<Point3>,
    indices: Vec<u32>,
    tol: Tolerance,
) -> (Vec<Point3>, Vec<u32>, usize) {
    if !tol.eps.is_finite() || tol.eps <= 0.0 {
        return (points, indices, 0);
    }

    let inv = 1.0 / tol.eps;

    /// Returns None for non-finite values so they never weld.
    #[allow(clippy::cast_possible_truncation)]
    fn quantize(value: f64, inv: f64) -> Option<i64> {
        if !value.is_finite() {
            return None;
        }
        let q = (value * inv).floor();
        Some(q.clamp(i64::MIN as f64, i64::MAX as f64) as i64)
    }

    let mut buckets: HashMap<(i64, i64, i64), Vec<u32>> = HashMap::new();
    let mut remap: Vec<u32> = Vec::with_capacity(points.len());
    let mut out_points: Vec<Point3> = Vec::with_capacity(points.len());

    for p in points.iter().copied() {
        let key = match (quantize(p.x, inv), quantize(p.y, inv), quantize(p.z, inv)) {
            (Some(kx), Some(ky), Some(kz)) => Some((kx, ky, kz)),
            _ => None,
        };

        let found = key.and_then(|(kx, ky, kz)| {
            (-1i64..=1)
                .flat_map(|dx| {
                    (-1i64..=1).flat_map(move |dy| (-1i64..=1).map(move |dz| (dx, dy, dz)))
                })
                .filter_map(|(dx, dy, dz)| buckets.get(&(kx + dx, ky + dy, kz + dz)))
                .flatten()
                .copied()
                .find(|&cand| tol.approx_eq_point3(out_points[cand as usize], p))
        });

        let out_idx = if let Some(existing) = found {
            existing
        } else {
            #[allow(clippy::cast_possible_truncation)]
            let new_idx = out_points.len() as u32;
            out_points.push(p);
            if let Some(key) = key {
                buckets.entry(key).or_default().push(new_idx);
            }
            new_idx
        };
        remap.push(out_idx);
    }

    let out_indices = indices
        .into_iter()
        .map(|idx| remap.get(idx as usize).copied().unwrap_or(idx))
        .collect();

    let welded = points.len().saturating_sub(out_points.len());
    (out_points, out_indices, welded)
}

fn cull_degenerate_triangles(
    points: &[Point3],
    indices: &[u32],
    normals: &[Vec3],
    tol: Tolerance,
) -> (Vec<u32>, Vec<Vec3>, usize) {
    let mut out = Vec::with_capacity(indices.len());
    let mut kept_normals = Vec::with_capacity(normals.len());
    let mut removed = 0usize;

    for (tri, normal) in indices.chunks_exact(3).zip(normals) {
        let (i0, i1, i2) = (tri[0], tri[1], tri[2]);
        if i0 == i1 || i1 == i2 || i0 == i2 {
            removed += 1;
            continue;
        }

        let corners = (
            points.get(i0 as usize),
            points.get(i1 as usize),
            points.get(i2 as usize),
        );
        let (Some(&a), Some(&b), Some(&c)) = corners else {
            removed += 1;
            continue;
        };

        let area2 = (b - a).cross(c - a).length_squared();
        if !area2.is_finite() || area2 <= tol.eps_squared() * tol.eps_squared() {
            removed += 1;
            continue;
        }

        out.extend_from_slice(&[i0, i1, i2]);
        kept_normals.push(*normal);
    }

    (out, kept_normals, removed)
}

fn count_edge_topology(indices: &[u32]) -> (usize, usize) {
    let mut edge_counts: HashMap<(u32, u32), u32> = HashMap::new();

    for tri in indices.chunks_exact(3) {
        for (ea, eb) in [(tri[0], tri[1]), (tri[1], tri[2]), (tri[2], tri[0])] {
            let key = if ea <= eb { (ea, eb) } else { (eb, ea) };
            *edge_counts.entry(key).or_insert(0) += 1;
        }
    }

    let mut open_edge_count = 0usize;
    let mut non_manifold_edge_count = 0usize;
    for count in edge_counts.into_values() {
        if count == 1 {
            open_edge_count += 1;
        } else if count > 2 {
            non_manifold_edge_count += 1;
        }
    }

    (open_edge_count, non_manifold_edge_count)
}

fn average_vertex_normals(vertex_count: usize, indices: &[u32], normals: &[Vec3]) -> Vec<[f64; 3]> {
    let mut sums = vec![Vec3::ZERO; vertex_count];
    for (tri, normal) in indices.chunks_exact(3).zip(normals) {
        for &i in tri {
            if let Some(sum) = sums.get_mut(i as usize) {
                *sum = *sum + *normal;
            }
        }
    }
    sums.into_iter()
        .map(|sum| sum.normalized().unwrap_or(Vec3::ZERO).to_array())
        .collect()
}

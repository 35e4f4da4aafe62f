//! Neighbor queries over the current front.
//!
//! Both queries are linear scans against a frozen front. With the `parallel`
//! feature the node scan runs on rayon; results are sorted afterwards so the
//! outcome never depends on scan order.

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use super::core::{Point3, Tolerance};
use super::front::{Front, SideId};

/// A front node found within the search radius.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NearNode {
    pub point: Point3,
    pub distance: f64,
}

/// Nodes within `radius` (inclusive) of `center`, skipping any node that
/// coincides with a point in `exclude`.
///
/// The result is ordered by distance, ties broken by lexicographic `(x, y, z)`.
/// Duplicate nodes are kept.
#[must_use]
pub fn find_near_nodes(
    center: Point3,
    nodes: &[Point3],
    radius: f64,
    exclude: &[Point3],
    tol: Tolerance,
) -> Vec<NearNode> {
    let probe = |node: &Point3| -> Option<NearNode> {
        if exclude.iter().any(|&e| tol.approx_eq_point3(e, *node)) {
            return None;
        }
        let distance = node.distance_to(center);
        (distance <= radius).then_some(NearNode {
            point: *node,
            distance,
        })
    };

    #[cfg(feature = "parallel")]
    let mut near: Vec<NearNode> = nodes.par_iter().filter_map(probe).collect();
    #[cfg(not(feature = "parallel"))]
    let mut near: Vec<NearNode> = nodes.iter().filter_map(probe).collect();

    near.sort_by(|l, r| {
        l.distance
            .total_cmp(&r.distance)
            .then_with(|| l.point.lexicographic_cmp(&r.point))
    });
    near
}

/// Live sides with an endpoint at `node`, matched by position, in front order.
#[must_use]
pub fn find_connected_sides(node: Point3, front: &Front, tol: Tolerance) -> Vec<SideId> {
    front
        .live_sides()
        .filter(|(_, side)| side.touches(node, tol))
        .map(|(id, _)| id)
        .collect()
}

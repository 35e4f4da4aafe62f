//! The advancing front: live directed boundary edges awaiting a panel.
//!
//! Sides live in an arena and are addressed by [`SideId`]. Two sides with the
//! same endpoints are still distinct entities, so removal is always by id and a
//! re-created edge never collides with a stale one. The live front is an
//! ordered queue of ids; processing always takes the first live side.

use std::collections::VecDeque;
use std::fmt;

use serde::Serialize;

use super::advancing_front::MeshError;
use super::boundary::BoundaryLoop;
use super::core::{GeometryError, Point3, Tolerance, Vec3};

/// Stable identity of a front side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct SideId(usize);

impl SideId {
    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for SideId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// FrontSide
// ─────────────────────────────────────────────────────────────────────────────

/// A directed front edge `a -> b` with its local frame.
///
/// `x` is the unit tangent and `y` the unit in-plane normal pointing to the
/// side where new panels are generated.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrontSide {
    a: Point3,
    b: Point3,
    orientation: bool,
    out_of_plane: Vec3,
    vector: Vec3,
    length: f64,
    x: Vec3,
    y: Vec3,
}

impl FrontSide {
    /// Builds a side and its frame. `out_of_plane` is expected to be a unit
    /// normal of the meshing plane.
    pub fn new(
        a: Point3,
        b: Point3,
        orientation: bool,
        out_of_plane: Vec3,
    ) -> Result<Self, GeometryError> {
        let vector = b - a;
        if !vector.is_finite() {
            return Err(GeometryError::NonFinite(vector));
        }
        let length = vector.length();
        if Tolerance::ZERO_LENGTH.is_zero_length(length) {
            return Err(GeometryError::ZeroLengthVector {
                u: vector,
                v: out_of_plane,
            });
        }

        let x = vector / length;
        let mut y = x.cross(out_of_plane);
        if Tolerance::ZERO_LENGTH.is_zero_vec3(y) {
            // Edge parallel to the normal: no in-plane frame exists.
            return Err(GeometryError::ZeroLengthVector {
                u: vector,
                v: out_of_plane,
            });
        }
        if !orientation {
            y = -y;
        }

        Ok(Self {
            a,
            b,
            orientation,
            out_of_plane,
            vector,
            length,
            x,
            y,
        })
    }

    #[must_use]
    pub const fn a(&self) -> Point3 {
        self.a
    }

    #[must_use]
    pub const fn b(&self) -> Point3 {
        self.b
    }

    #[must_use]
    pub const fn orientation(&self) -> bool {
        self.orientation
    }

    #[must_use]
    pub const fn out_of_plane(&self) -> Vec3 {
        self.out_of_plane
    }

    #[must_use]
    pub const fn vector(&self) -> Vec3 {
        self.vector
    }

    #[must_use]
    pub const fn length(&self) -> f64 {
        self.length
    }

    #[must_use]
    pub const fn x(&self) -> Vec3 {
        self.x
    }

    #[must_use]
    pub const fn y(&self) -> Vec3 {
        self.y
    }

    /// Signed area of the parallelogram spanned by `p - a` and `b - a`,
    /// measured about the plane normal. In the XY plane with a `+Z` normal this
    /// is `(px-ax)(by-ay) - (py-ay)(bx-ax)`.
    #[must_use]
    pub fn signed_area(&self, p: Point3) -> f64 {
        (p - self.a).cross(self.vector).dot(self.out_of_plane)
    }

    /// Whether `p` lies strictly on the panel-generating side of this edge.
    ///
    /// The reference sign comes from the same formula evaluated one unit step
    /// along `y`, so no separate orientation bookkeeping is needed.
    #[must_use]
    pub fn is_interior(&self, p: Point3, tol: Tolerance) -> bool {
        let d_in = self.signed_area(self.a + self.y);
        self.signed_area(p) * d_in.signum() > tol.eps
    }

    /// Whether either endpoint coincides with `p`.
    #[must_use]
    pub fn touches(&self, p: Point3, tol: Tolerance) -> bool {
        tol.approx_eq_point3(self.a, p) || tol.approx_eq_point3(self.b, p)
    }

    /// The endpoint opposite `p`, if `p` is one of the endpoints.
    #[must_use]
    pub fn other_end(&self, p: Point3, tol: Tolerance) -> Option<Point3> {
        if tol.approx_eq_point3(self.a, p) {
            Some(self.b)
        } else if tol.approx_eq_point3(self.b, p) {
            Some(self.a)
        } else {
            None
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Snapshot
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SnapshotSide {
    pub id: SideId,
    pub a: Point3,
    pub b: Point3,
}

/// Frozen copy of the live sides, in processing order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FrontSnapshot {
    pub iteration: usize,
    pub sides: Vec<SnapshotSide>,
}

impl FrontSnapshot {
    #[must_use]
    pub fn len(&self) -> usize {
        self.sides.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sides.is_empty()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Front
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default)]
pub struct Front {
    arena: Vec<FrontSide>,
    alive: Vec<bool>,
    order: VecDeque<SideId>,
    live_count: usize,
    boundary_count: usize,
    nodes: Vec<Point3>,
}

impl Front {
    /// Builds a front whose processing order follows `sides`.
    #[must_use]
    pub fn new(sides: Vec<FrontSide>) -> Self {
        let mut front = Self::default();
        for side in sides {
            front.push(side);
        }
        front.boundary_count = front.arena.len();
        front.refresh_nodes();
        front
    }

    /// Validates each loop and turns consecutive point pairs into sides.
    pub fn from_loops(loops: &[BoundaryLoop], tol: Tolerance) -> Result<Self, MeshError> {
        if loops.is_empty() {
            return Err(MeshError::EmptyBoundary);
        }

        let mut sides = Vec::with_capacity(loops.iter().map(BoundaryLoop::edge_count).sum());
        for (loop_index, boundary) in loops.iter().enumerate() {
            boundary
                .validate(tol)
                .map_err(|source| MeshError::MalformedBoundary { loop_index, source })?;

            // validate() guarantees a usable normal
            let normal = boundary.unit_normal().unwrap_or(boundary.normal);
            for (a, b) in boundary.edges() {
                let side = FrontSide::new(a, b, boundary.orientation, normal).map_err(|source| {
                    MeshError::DegenerateGeometry {
                        side: None,
                        a,
                        b,
                        source,
                    }
                })?;
                sides.push(side);
            }
        }

        Ok(Self::new(sides))
    }

    fn push(&mut self, side: FrontSide) -> SideId {
        let id = SideId(self.arena.len());
        self.arena.push(side);
        self.alive.push(true);
        self.order.push_back(id);
        self.live_count += 1;
        id
    }

    /// Number of live sides.
    #[must_use]
    pub fn len(&self) -> usize {
        self.live_count
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.live_count == 0
    }

    /// Whether `id` is one of the sides the front was built with.
    #[must_use]
    pub fn is_boundary(&self, id: SideId) -> bool {
        id.0 < self.boundary_count
    }

    /// The side to process next.
    #[must_use]
    pub fn first(&self) -> Option<SideId> {
        self.order.iter().copied().find(|id| self.alive[id.0])
    }

    /// Looks up a side by id. Removed sides stay addressable.
    ///
    /// # Panics
    ///
    /// Panics if `id` was not issued by this front.
    #[must_use]
    pub fn side(&self, id: SideId) -> &FrontSide {
        &self.arena[id.0]
    }

    #[must_use]
    pub fn is_live(&self, id: SideId) -> bool {
        self.alive.get(id.0).copied().unwrap_or(false)
    }

    /// Live sides in processing order.
    pub fn live_sides(&self) -> impl Iterator<Item = (SideId, &FrontSide)> + '_ {
        self.order
            .iter()
            .copied()
            .filter(|id| self.alive[id.0])
            .map(|id| (id, &self.arena[id.0]))
    }

    /// Endpoints of every live side, `a` then `b`, duplicates kept.
    #[must_use]
    pub fn nodes(&self) -> &[Point3] {
        &self.nodes
    }

    /// Removes `remove` (by identity) and appends `add`, then refreshes the
    /// node list. Returns the ids of the added sides.
    ///
    /// # Panics
    ///
    /// Panics if any id in `remove` is not live; removing a side twice or a
    /// side from another front is a contract violation.
    pub fn update(&mut self, add: Vec<FrontSide>, remove: &[SideId]) -> Vec<SideId> {
        for &id in remove {
            assert!(
                self.is_live(id),
                "front update removes side {id} which is not live"
            );
            self.alive[id.0] = false;
            self.live_count -= 1;
        }

        let added = add.into_iter().map(|side| self.push(side)).collect();

        while let Some(id) = self.order.front().copied() {
            if self.alive[id.0] {
                break;
            }
            self.order.pop_front();
        }
        if self.order.len() > 2 * self.live_count.max(8) {
            let alive = &self.alive;
            self.order.retain(|id| alive[id.0]);
        }

        self.refresh_nodes();
        added
    }

    fn refresh_nodes(&mut self) {
        let mut nodes = Vec::with_capacity(2 * self.live_count);
        for (_, side) in self.live_sides() {
            nodes.push(side.a);
            nodes.push(side.b);
        }
        self.nodes = nodes;
    }

    #[must_use]
    pub fn snapshot(&self, iteration: usize) -> FrontSnapshot {
        FrontSnapshot {
            iteration,
            sides: self
                .live_sides()
                .map(|(id, side)| SnapshotSide {
                    id,
                    a: side.a,
                    b: side.b,
                })
                .collect(),
        }
    }
}

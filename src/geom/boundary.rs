//! Closed boundary loops: the input contract of the mesher.
//!
//! A [`BoundaryLoop`] is an ordered, closed sequence of 3D points (first and
//! last coincide) lying in the plane whose normal the loop carries. Consecutive
//! point pairs become the initial front sides.
//!
//! # Orientation
//!
//! The `orientation` flag fixes on which side of each edge new panels are
//! generated. For a loop wound counter-clockwise about its normal:
//! - `orientation == false` fills the area enclosed by the loop (outer boundary)
//! - `orientation == true` fills the area outside the loop (hole)
//!
//! # Example
//! ```ignore
//! use afm_engine::geom::{BoundaryLoop, Point3, Tolerance, Vec3};
//!
//! let outer = BoundaryLoop::outer(
//!     vec![
//!         Point3::new(0.0, 0.0, 0.0),
//!         Point3::new(1.0, 0.0, 0.0),
//!         Point3::new(1.0, 1.0, 0.0),
//!         Point3::new(0.0, 1.0, 0.0),
//!         Point3::new(0.0, 0.0, 0.0),
//!     ],
//!     Vec3::Z,
//! );
//! outer.validate(Tolerance::DEFAULT)?;
//! ```

use serde::{Deserialize, Serialize};

use super::core::{Point3, Tolerance, Vec3};

/// Defects that make a boundary loop unusable as an initial front.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum BoundaryError {
    #[error("boundary loop requires at least 3 distinct points, got {count}")]
    TooFewPoints { count: usize },
    #[error("boundary loop is not closed: first point {first:?} differs from last point {last:?}")]
    NotClosed { first: Point3, last: Point3 },
    #[error("boundary loop point {index} is not finite")]
    NonFinitePoint { index: usize },
    #[error("boundary loop edge {index} has zero length")]
    ZeroLengthEdge { index: usize },
    #[error("boundary loop normal {normal:?} is zero or not finite")]
    DegenerateNormal { normal: Vec3 },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoundaryLoop {
    /// Ordered loop points; the last point repeats the first.
    pub points: Vec<Point3>,
    /// `false` for an outer boundary, `true` for a hole (see module docs).
    pub orientation: bool,
    /// Face normal of the plane the loop lies in.
    pub normal: Vec3,
}

impl BoundaryLoop {
    #[must_use]
    pub fn new(points: Vec<Point3>, orientation: bool, normal: Vec3) -> Self {
        Self {
            points,
            orientation,
            normal,
        }
    }

    /// Outer boundary wound counter-clockwise about `normal`.
    #[must_use]
    pub fn outer(points: Vec<Point3>, normal: Vec3) -> Self {
        Self::new(points, false, normal)
    }

    /// Closed loop through `corners`, each polygon edge split into
    /// `round(len / spacing)` equal segments (at least one).
    ///
    /// `corners` lists each corner once; the loop is closed automatically.
    #[must_use]
    pub fn from_polygon(corners: &[Point3], spacing: f64, orientation: bool, normal: Vec3) -> Self {
        let mut points = Vec::new();
        for (i, &a) in corners.iter().enumerate() {
            let b = corners[(i + 1) % corners.len()];
            let edge = b - a;
            let ratio = edge.length() / spacing;
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            let segments = if ratio.is_finite() { ratio.round().max(1.0) as usize } else { 1 };
            for j in 0..segments {
                #[allow(clippy::cast_precision_loss)]
                let t = j as f64 / segments as f64;
                points.push(a + edge * t);
            }
        }
        if let Some(&first) = points.first() {
            points.push(first);
        }
        Self::new(points, orientation, normal)
    }

    /// Unsigned area enclosed by the loop, measured in its plane.
    #[must_use]
    pub fn enclosed_area(&self) -> f64 {
        let Some(normal) = self.unit_normal() else {
            return 0.0;
        };
        let Some(&origin) = self.points.first() else {
            return 0.0;
        };
        let twice: f64 = self
            .edges()
            .map(|(a, b)| (a - origin).cross(b - origin).dot(normal))
            .sum();
        0.5 * twice.abs()
    }

    /// Number of edges the loop contributes to the initial front.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.points.len().saturating_sub(1)
    }

    /// Consecutive point pairs in loop order.
    pub fn edges(&self) -> impl Iterator<Item = (Point3, Point3)> + '_ {
        self.points.windows(2).map(|pair| (pair[0], pair[1]))
    }

    /// Unit normal, or `None` when the stored normal is degenerate.
    #[must_use]
    pub fn unit_normal(&self) -> Option<Vec3> {
        if self.normal.is_finite() {
            self.normal.normalized()
        } else {
            None
        }
    }

    /// Checks the loop is closed, finite, has at least three distinct points
    /// and no zero-length edges.
    pub fn validate(&self, tol: Tolerance) -> Result<(), BoundaryError> {
        if self.unit_normal().is_none() {
            return Err(BoundaryError::DegenerateNormal {
                normal: self.normal,
            });
        }

        if let Some(index) = self.points.iter().position(|p| !p.is_finite()) {
            return Err(BoundaryError::NonFinitePoint { index });
        }

        let distinct = self.edge_count();
        if distinct < 3 {
            return Err(BoundaryError::TooFewPoints { count: distinct });
        }

        let first = self.points[0];
        let last = self.points[self.points.len() - 1];
        if !tol.approx_eq_point3(first, last) {
            return Err(BoundaryError::NotClosed { first, last });
        }

        if let Some(index) = self
            .edges()
            .position(|(a, b)| tol.approx_eq_point3(a, b))
        {
            return Err(BoundaryError::ZeroLengthEdge { index });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_square() -> Vec<Point3> {
        vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
            Point3::new(0.0, 0.0, 0.0),
        ]
    }

    #[test]
    fn valid_square_passes() {
        let lp = BoundaryLoop::outer(unit_square(), Vec3::Z);
        assert!(lp.validate(Tolerance::DEFAULT).is_ok());
        assert_eq!(lp.edge_count(), 4);
        assert_eq!(lp.edges().count(), 4);
    }

    #[test]
    fn polygon_edges_are_subdivided_at_spacing() {
        let corners = [
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(2.0, 0.0, 0.0),
            Point3::new(2.0, 1.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        ];
        let lp = BoundaryLoop::from_polygon(&corners, 0.5, false, Vec3::Z);
        assert_eq!(lp.edge_count(), 12);
        assert_eq!(lp.points[1], Point3::new(0.5, 0.0, 0.0));
        assert_eq!(lp.points.first(), lp.points.last());
        assert!(lp.validate(Tolerance::DEFAULT).is_ok());
        assert!((lp.enclosed_area() - 2.0).abs() < 1e-12);
    }

    #[test]
    fn open_loop_is_rejected() {
        let mut points = unit_square();
        points.pop();
        let lp = BoundaryLoop::outer(points, Vec3::Z);
        assert!(matches!(
            lp.validate(Tolerance::DEFAULT),
            Err(BoundaryError::NotClosed { .. })
        ));
    }

    #[test]
    fn two_point_loop_is_rejected() {
        let lp = BoundaryLoop::outer(
            vec![
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(1.0, 0.0, 0.0),
                Point3::new(0.0, 0.0, 0.0),
            ],
            Vec3::Z,
        );
        assert_eq!(
            lp.validate(Tolerance::DEFAULT),
            Err(BoundaryError::TooFewPoints { count: 2 })
        );
    }

    #[test]
    fn repeated_point_is_zero_length_edge() {
        let mut points = unit_square();
        points.insert(2, Point3::new(1.0, 0.0, 0.0));
        let lp = BoundaryLoop::outer(points, Vec3::Z);
        assert_eq!(
            lp.validate(Tolerance::DEFAULT),
            Err(BoundaryError::ZeroLengthEdge { index: 1 })
        );
    }

    #[test]
    fn degenerate_normal_and_nan_are_rejected() {
        let lp = BoundaryLoop::outer(unit_square(), Vec3::ZERO);
        assert!(matches!(
            lp.validate(Tolerance::DEFAULT),
            Err(BoundaryError::DegenerateNormal { .. })
        ));

        let mut points = unit_square();
        points[2] = Point3::new(f64::NAN, 1.0, 0.0);
        let lp = BoundaryLoop::outer(points, Vec3::Z);
        assert_eq!(
            lp.validate(Tolerance::DEFAULT),
            Err(BoundaryError::NonFinitePoint { index: 2 })
        );
    }
}

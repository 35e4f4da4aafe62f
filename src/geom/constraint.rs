//! Angular wedge in which a new panel apex may legally lie.
//!
//! For the current side `S = (A, B)` every other live side touching `A` or `B`
//! is examined. Sides whose far endpoint is not interior to `S` fold backwards
//! and are ignored. Of the rest, the side touching `A` whose direction makes the
//! largest angle with `S` becomes the left constraint; likewise at `B` for the
//! right constraint.
//!
//! Angles are measured with both vectors oriented along the loop: at `A` the
//! constraint direction is `A - far`, at `B` it is `far - B`. A candidate `P`
//! is admitted when `angle(A - P, x) >= left` and `angle(P - B, x) >= right`
//! and `P` is interior to `S`.

use super::core::{GeometryError, Point3, Tolerance, angle_between_deg};
use super::front::{Front, FrontSide, SideId};
use super::search::NearNode;

/// Slack for wedge comparisons, in degrees. A candidate lying exactly on a
/// constraining side is admitted.
pub const ANGLE_TOLERANCE_DEG: f64 = 1e-6;

/// Which end of the current side a constraint (or shared side) sits at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WedgeEnd {
    /// Touches `A`.
    Left,
    /// Touches `B`.
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Constraint {
    pub side: SideId,
    /// Endpoint of the constraining side away from the current side.
    pub far: Point3,
    pub angle_deg: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct WedgeConstraints {
    pub left: Option<Constraint>,
    pub right: Option<Constraint>,
}

impl WedgeConstraints {
    /// Left bound in degrees, `0` when unconstrained.
    #[must_use]
    pub fn left_angle(&self) -> f64 {
        self.left.map_or(0.0, |c| c.angle_deg)
    }

    /// Right bound in degrees, `0` when unconstrained.
    #[must_use]
    pub fn right_angle(&self) -> f64 {
        self.right.map_or(0.0, |c| c.angle_deg)
    }

    /// First wedge bound `p` falls outside of, checking the left bound first.
    pub fn violation(
        &self,
        side: &FrontSide,
        p: Point3,
    ) -> Result<Option<WedgeEnd>, GeometryError> {
        if self.left.is_some() {
            let angle = angle_between_deg(side.a() - p, side.x())?;
            if angle < self.left_angle() - ANGLE_TOLERANCE_DEG {
                return Ok(Some(WedgeEnd::Left));
            }
        }
        if self.right.is_some() {
            let angle = angle_between_deg(p - side.b(), side.x())?;
            if angle < self.right_angle() - ANGLE_TOLERANCE_DEG {
                return Ok(Some(WedgeEnd::Right));
            }
        }
        Ok(None)
    }

    /// Whether `p` lies inside the wedge and on the interior side of `side`.
    pub fn admits(
        &self,
        side: &FrontSide,
        p: Point3,
        tol: Tolerance,
    ) -> Result<bool, GeometryError> {
        if !side.is_interior(p, tol) {
            return Ok(false);
        }
        Ok(self.violation(side, p)?.is_none())
    }
}

/// Derives the left and right constraints of `side_id` from the live front.
///
/// On equal angles the side met first in front order wins.
pub fn find_constraints(
    front: &Front,
    side_id: SideId,
    tol: Tolerance,
) -> Result<WedgeConstraints, GeometryError> {
    let current = front.side(side_id);
    let (a, b) = (current.a(), current.b());
    let mut constraints = WedgeConstraints::default();

    for (id, side) in front.live_sides() {
        if id == side_id {
            continue;
        }

        if let Some(far) = side.other_end(a, tol) {
            if current.is_interior(far, tol) {
                let angle_deg = angle_between_deg(a - far, current.x())?;
                if angle_deg > constraints.left_angle() {
                    constraints.left = Some(Constraint {
                        side: id,
                        far,
                        angle_deg,
                    });
                }
            }
        }

        if let Some(far) = side.other_end(b, tol) {
            if current.is_interior(far, tol) {
                let angle_deg = angle_between_deg(far - b, current.x())?;
                if angle_deg > constraints.right_angle() {
                    constraints.right = Some(Constraint {
                        side: id,
                        far,
                        angle_deg,
                    });
                }
            }
        }
    }

    Ok(constraints)
}

/// Keeps the candidates admitted by `constraints`, preserving their order.
pub fn filter_candidates(
    side: &FrontSide,
    constraints: &WedgeConstraints,
    candidates: &[NearNode],
    tol: Tolerance,
) -> Result<Vec<NearNode>, GeometryError> {
    let mut admitted = Vec::with_capacity(candidates.len());
    for candidate in candidates {
        if constraints.admits(side, candidate.point, tol)? {
            admitted.push(*candidate);
        }
    }
    Ok(admitted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geom::core::Vec3;

    fn side(a: [f64; 3], b: [f64; 3]) -> FrontSide {
        FrontSide::new(a.into(), b.into(), false, Vec3::Z).unwrap()
    }

    fn unit_square_front() -> Front {
        Front::new(vec![
            side([0.0, 0.0, 0.0], [1.0, 0.0, 0.0]),
            side([1.0, 0.0, 0.0], [1.0, 1.0, 0.0]),
            side([1.0, 1.0, 0.0], [0.0, 1.0, 0.0]),
            side([0.0, 1.0, 0.0], [0.0, 0.0, 0.0]),
        ])
    }

    #[test]
    fn square_corners_constrain_at_right_angles() {
        let front = unit_square_front();
        let first = front.first().unwrap();
        let c = find_constraints(&front, first, Tolerance::DEFAULT).unwrap();

        let left = c.left.unwrap();
        let right = c.right.unwrap();
        assert_eq!(left.side.index(), 3);
        assert_eq!(right.side.index(), 1);
        assert_eq!(left.far, Point3::new(0.0, 1.0, 0.0));
        assert_eq!(right.far, Point3::new(1.0, 1.0, 0.0));
        assert!((left.angle_deg - 90.0).abs() < 1e-9);
        assert!((right.angle_deg - 90.0).abs() < 1e-9);
    }

    #[test]
    fn sides_folding_backwards_do_not_constrain() {
        // Reflex corner at A: the incoming side arrives from below.
        let front = Front::new(vec![
            side([0.0, 0.0, 0.0], [1.0, 0.0, 0.0]),
            side([-1.0, -1.0, 0.0], [0.0, 0.0, 0.0]),
        ]);
        let first = front.first().unwrap();
        let c = find_constraints(&front, first, Tolerance::DEFAULT).unwrap();
        assert!(c.left.is_none());
        assert!(c.right.is_none());
        assert_eq!(c.left_angle(), 0.0);
    }

    #[test]
    fn candidates_outside_the_wedge_are_rejected() {
        let front = unit_square_front();
        let first = front.first().unwrap();
        let s = *front.side(first);
        let c = find_constraints(&front, first, Tolerance::DEFAULT).unwrap();
        let tol = Tolerance::DEFAULT;

        // inside the square, and exactly on both constraining corners
        assert!(c.admits(&s, Point3::new(0.5, 0.5, 0.0), tol).unwrap());
        assert!(c.admits(&s, Point3::new(0.0, 1.0, 0.0), tol).unwrap());
        assert!(c.admits(&s, Point3::new(1.0, 1.0, 0.0), tol).unwrap());

        // beyond the left and right sides
        assert_eq!(
            c.violation(&s, Point3::new(-0.5, 0.5, 0.0)).unwrap(),
            Some(WedgeEnd::Left)
        );
        assert_eq!(
            c.violation(&s, Point3::new(1.5, 0.5, 0.0)).unwrap(),
            Some(WedgeEnd::Right)
        );

        // below the current side
        assert!(!c.admits(&s, Point3::new(0.5, -0.5, 0.0), tol).unwrap());
    }

    #[test]
    fn filter_keeps_order_of_admitted_candidates() {
        let front = unit_square_front();
        let first = front.first().unwrap();
        let s = *front.side(first);
        let c = find_constraints(&front, first, Tolerance::DEFAULT).unwrap();

        let near = |x: f64, y: f64, distance: f64| NearNode {
            point: Point3::new(x, y, 0.0),
            distance,
        };
        let candidates = [near(-0.2, 0.8, 0.1), near(0.0, 1.0, 0.2), near(1.0, 1.0, 0.3)];
        let kept = filter_candidates(&s, &c, &candidates, Tolerance::DEFAULT).unwrap();
        assert_eq!(kept.len(), 2);
        assert_eq!(kept[0].point, Point3::new(0.0, 1.0, 0.0));
    }
}

//! Advancing-front triangulation of planar boundary loops.
//!
//! Each iteration takes the first live side `S = (A, B)` of the front, places
//! an apex `C` and emits the panel `(A, B, C)`. Where `C` comes from and how
//! the front changes is decided by [`classify_step`], which only reads the
//! front; [`apply_step`] then performs the mutation. The five outcomes are
//! described by [`StepCase`].
//!
//! The loop ends when the front is empty. Runs are bounded by an iteration
//! budget and report [`MeshError::NotConverged`] instead of spinning forever
//! on boundaries that never close.

use log::{debug, trace, warn};
use serde::{Deserialize, Serialize};

use super::boundary::{BoundaryError, BoundaryLoop};
use super::constraint::{WedgeConstraints, WedgeEnd, filter_candidates, find_constraints};
use super::core::{GeometryError, Point3, Tolerance, Vec3};
use super::diagnostics::AdvancingFrontDiagnostics;
use super::front::{Front, FrontSide, FrontSnapshot, SideId};
use super::metrics::{GeomMetrics, TimingBucket};
use super::search::{find_connected_sides, find_near_nodes};

/// Iterations every run is allowed regardless of boundary size.
pub const DEFAULT_ITERATION_FLOOR: usize = 1024;

/// Additional iterations granted per initial front side.
pub const DEFAULT_ITERATIONS_PER_SIDE: usize = 64;

// ─────────────────────────────────────────────────────────────────────────────
// Errors
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum MeshError {
    #[error("spacing must be finite and positive, got {spacing}")]
    InvalidSpacing { spacing: f64 },

    #[error("tolerance must be finite and positive, got {eps}")]
    InvalidTolerance { eps: f64 },

    #[error("no boundary loops to mesh")]
    EmptyBoundary,

    #[error("boundary loop {loop_index} is malformed")]
    MalformedBoundary {
        loop_index: usize,
        #[source]
        source: BoundaryError,
    },

    #[error("degenerate geometry at side {} ({:?} -> {:?})", describe_side(.side), .a, .b)]
    DegenerateGeometry {
        side: Option<SideId>,
        a: Point3,
        b: Point3,
        #[source]
        source: GeometryError,
    },

    #[error("front did not close after {iterations} iterations ({remaining} sides remain)")]
    NotConverged {
        iterations: usize,
        remaining: usize,
        snapshot: FrontSnapshot,
        panels: Vec<Panel>,
    },
}

fn describe_side(side: &Option<SideId>) -> String {
    side.map_or_else(|| "<new>".to_string(), |id| id.to_string())
}

// ─────────────────────────────────────────────────────────────────────────────
// Options
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeshOptions {
    /// Target edge length of generated panels.
    pub spacing: f64,
    /// Record a front snapshot after every iteration.
    pub debug: bool,
    /// Hard iteration ceiling; `None` derives one from the boundary size.
    pub max_iterations: Option<usize>,
    pub tolerance: Tolerance,
}

impl MeshOptions {
    #[must_use]
    pub fn new(spacing: f64) -> Self {
        Self {
            spacing,
            debug: false,
            max_iterations: None,
            tolerance: Tolerance::DEFAULT,
        }
    }

    #[must_use]
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    #[must_use]
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = Some(max_iterations);
        self
    }

    #[must_use]
    pub fn with_tolerance(mut self, tolerance: Tolerance) -> Self {
        self.tolerance = tolerance;
        self
    }

    pub fn validate(&self) -> Result<(), MeshError> {
        if !self.spacing.is_finite() || self.spacing <= 0.0 {
            return Err(MeshError::InvalidSpacing {
                spacing: self.spacing,
            });
        }
        if !self.tolerance.is_valid() {
            return Err(MeshError::InvalidTolerance {
                eps: self.tolerance.eps,
            });
        }
        Ok(())
    }

    /// Height of the isosceles triangle whose legs equal `spacing`.
    #[must_use]
    pub fn ideal_height(&self) -> f64 {
        let half = self.spacing / 2.0;
        (self.spacing * self.spacing - half * half).sqrt()
    }

    #[must_use]
    pub fn iteration_budget(&self, initial_sides: usize) -> usize {
        self.max_iterations.unwrap_or_else(|| {
            DEFAULT_ITERATION_FLOOR
                .saturating_add(DEFAULT_ITERATIONS_PER_SIDE.saturating_mul(initial_sides))
        })
    }
}

impl Default for MeshOptions {
    fn default() -> Self {
        Self::new(1.0)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Panels and steps
// ─────────────────────────────────────────────────────────────────────────────

/// One output triangle. Vertices follow the side it was built on: `a -> b`
/// is the consumed front side and `c` the apex.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Panel {
    pub a: Point3,
    pub b: Point3,
    pub c: Point3,
    pub normal: Vec3,
}

impl Panel {
    #[must_use]
    pub const fn vertices(&self) -> [Point3; 3] {
        [self.a, self.b, self.c]
    }

    #[must_use]
    pub fn area(&self) -> f64 {
        0.5 * (self.b - self.a).cross(self.c - self.a).length()
    }
}

/// Fieldless tag of a [`StepCase`], used for counting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum StepKind {
    IdealPoint,
    ConstraintCrossing,
    FreeNode,
    SingleNeighbor,
    CloseTriangle,
}

/// How the apex of one panel was chosen and what it does to the front.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StepCase {
    /// No existing node qualifies and the ideal point lies inside the wedge.
    /// `S` is replaced by `(C, B)` and `(A, C)`.
    IdealPoint { apex: Point3 },

    /// No existing node qualifies and the ideal point crosses the constraint
    /// at `end`. The apex is pulled onto the constraint's angle; `S` and the
    /// constraining side are replaced by `far`-`C` and the side closing the
    /// opposite end.
    ConstraintCrossing {
        apex: Point3,
        end: WedgeEnd,
        constraint: SideId,
        far: Point3,
    },

    /// The apex is an existing node without a side towards `A` or `B`.
    FreeNode { apex: Point3 },

    /// The apex already connects to one end of `S` through `shared`.
    SingleNeighbor {
        apex: Point3,
        end: WedgeEnd,
        shared: SideId,
    },

    /// The apex connects to both ends; the triangle closes.
    CloseTriangle {
        apex: Point3,
        left: SideId,
        right: SideId,
    },
}

impl StepCase {
    #[must_use]
    pub const fn apex(&self) -> Point3 {
        match *self {
            Self::IdealPoint { apex }
            | Self::ConstraintCrossing { apex, .. }
            | Self::FreeNode { apex }
            | Self::SingleNeighbor { apex, .. }
            | Self::CloseTriangle { apex, .. } => apex,
        }
    }

    #[must_use]
    pub const fn kind(&self) -> StepKind {
        match self {
            Self::IdealPoint { .. } => StepKind::IdealPoint,
            Self::ConstraintCrossing { .. } => StepKind::ConstraintCrossing,
            Self::FreeNode { .. } => StepKind::FreeNode,
            Self::SingleNeighbor { .. } => StepKind::SingleNeighbor,
            Self::CloseTriangle { .. } => StepKind::CloseTriangle,
        }
    }
}

/// A classified iteration: the side consumed and the chosen case.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Step {
    pub side: SideId,
    pub a: Point3,
    pub b: Point3,
    pub case: StepCase,
}

// ─────────────────────────────────────────────────────────────────────────────
// Classification
// ─────────────────────────────────────────────────────────────────────────────

/// `A + x·dx/2 + y·dy` for the side's own frame.
#[must_use]
pub fn ideal_apex(side: &FrontSide, options: &MeshOptions) -> Point3 {
    side.a() + side.x() * (side.length() / 2.0) + side.y() * options.ideal_height()
}

/// Decides the next step for `side_id` without touching the front.
pub fn classify_step(
    front: &Front,
    side_id: SideId,
    options: &MeshOptions,
) -> Result<Step, MeshError> {
    classify_step_timed(front, side_id, options, &mut GeomMetrics::default())
}

fn classify_step_timed(
    front: &Front,
    side_id: SideId,
    options: &MeshOptions,
    metrics: &mut GeomMetrics,
) -> Result<Step, MeshError> {
    let tol = options.tolerance;
    let side = *front.side(side_id);
    let (a, b) = (side.a(), side.b());
    let degenerate = |source| MeshError::DegenerateGeometry {
        side: Some(side_id),
        a,
        b,
        source,
    };

    let ideal = ideal_apex(&side, options);
    let near = metrics.time(TimingBucket::NeighborSearch, || {
        find_near_nodes(ideal, front.nodes(), options.spacing, &[a, b], tol)
    });

    let (constraints, admitted) = metrics.time(TimingBucket::ConstraintFilter, || {
        let constraints = find_constraints(front, side_id, tol)?;
        let admitted = filter_candidates(&side, &constraints, &near, tol)?;
        Ok::<_, GeometryError>((constraints, admitted))
    })
    .map_err(degenerate)?;

    let case = match admitted.first() {
        None => match constraints.violation(&side, ideal).map_err(degenerate)? {
            None => StepCase::IdealPoint { apex: ideal },
            Some(end) => constraint_crossing(&side, &constraints, end, options)
                .ok_or_else(|| degenerate(GeometryError::NonFinite(ideal - a)))?,
        },
        Some(nearest) => {
            let apex = nearest.point;
            let mut left = None;
            let mut right = None;
            for id in find_connected_sides(apex, front, tol) {
                if id == side_id {
                    continue;
                }
                let candidate = front.side(id);
                if left.is_none() && candidate.touches(a, tol) {
                    left = Some(id);
                }
                if right.is_none() && candidate.touches(b, tol) {
                    right = Some(id);
                }
            }

            match (left, right) {
                (None, None) => StepCase::FreeNode { apex },
                (Some(shared), None) => StepCase::SingleNeighbor {
                    apex,
                    end: WedgeEnd::Left,
                    shared,
                },
                (None, Some(shared)) => StepCase::SingleNeighbor {
                    apex,
                    end: WedgeEnd::Right,
                    shared,
                },
                (Some(left), Some(right)) => StepCase::CloseTriangle { apex, left, right },
            }
        }
    };

    Ok(Step {
        side: side_id,
        a,
        b,
        case,
    })
}

/// Rotates the ideal leg onto the violated constraint.
fn constraint_crossing(
    side: &FrontSide,
    constraints: &WedgeConstraints,
    end: WedgeEnd,
    options: &MeshOptions,
) -> Option<StepCase> {
    let half = side.length() / 2.0;
    let dy = options.ideal_height();
    let h = (half * half + dy * dy).sqrt();

    let (constraint, apex) = match end {
        WedgeEnd::Left => {
            let c = constraints.left?;
            let phi = (180.0 - c.angle_deg).to_radians();
            (c, side.a() + side.x() * (h * phi.cos()) + side.y() * (h * phi.sin()))
        }
        WedgeEnd::Right => {
            let c = constraints.right?;
            let phi = (180.0 - c.angle_deg).to_radians();
            (c, side.b() + side.x() * (-h * phi.cos()) + side.y() * (h * phi.sin()))
        }
    };

    apex.is_finite().then_some(StepCase::ConstraintCrossing {
        apex,
        end,
        constraint: constraint.side,
        far: constraint.far,
    })
}

// ─────────────────────────────────────────────────────────────────────────────
// Mutation
// ─────────────────────────────────────────────────────────────────────────────

/// Applies a classified step to the front and returns its panel.
///
/// # Panics
///
/// Panics if the step refers to sides that are no longer live, i.e. it was
/// classified against a different front state.
pub fn apply_step(front: &mut Front, step: &Step) -> Result<Panel, MeshError> {
    let current = *front.side(step.side);
    let (a, b) = (step.a, step.b);
    let make = |p: Point3, q: Point3| {
        FrontSide::new(p, q, current.orientation(), current.out_of_plane()).map_err(|source| {
            MeshError::DegenerateGeometry {
                side: None,
                a: p,
                b: q,
                source,
            }
        })
    };

    let (add, remove) = match step.case {
        StepCase::IdealPoint { apex: c } | StepCase::FreeNode { apex: c } => {
            (vec![make(c, b)?, make(a, c)?], vec![step.side])
        }
        StepCase::ConstraintCrossing {
            apex: c,
            end,
            constraint,
            far,
        } => {
            let constraining = *front.side(constraint);
            // the split side keeps the constraining side's direction
            let ends_at = |p: Point3| {
                constraining.b().distance_squared_to(p) < constraining.a().distance_squared_to(p)
            };
            let add = match end {
                WedgeEnd::Left => {
                    let split = if ends_at(a) { make(far, c)? } else { make(c, far)? };
                    vec![split, make(c, b)?]
                }
                WedgeEnd::Right => {
                    let split = if ends_at(b) { make(far, c)? } else { make(c, far)? };
                    vec![make(a, c)?, split]
                }
            };
            (add, vec![step.side, constraint])
        }
        StepCase::SingleNeighbor {
            apex: c,
            end,
            shared,
        } => {
            let add = match end {
                WedgeEnd::Left => make(c, b)?,
                WedgeEnd::Right => make(a, c)?,
            };
            (vec![add], vec![step.side, shared])
        }
        StepCase::CloseTriangle { left, right, .. } => {
            (Vec::new(), vec![step.side, left, right])
        }
    };

    front.update(add, &remove);

    Ok(Panel {
        a,
        b,
        c: step.case.apex(),
        normal: current.out_of_plane(),
    })
}

// ─────────────────────────────────────────────────────────────────────────────
// Driver
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct MeshResult {
    pub panels: Vec<Panel>,
    pub diagnostics: AdvancingFrontDiagnostics,
}

/// Owns the front for the duration of a run.
#[derive(Debug)]
pub struct AdvancingFront {
    front: Front,
    options: MeshOptions,
    panels: Vec<Panel>,
    diagnostics: AdvancingFrontDiagnostics,
    metrics: GeomMetrics,
}

impl AdvancingFront {
    pub fn new(front: Front, options: MeshOptions) -> Result<Self, MeshError> {
        options.validate()?;
        let initial = front.len();
        let mut metrics = GeomMetrics::default();
        metrics.begin();
        Ok(Self {
            front,
            options,
            panels: Vec::new(),
            diagnostics: AdvancingFrontDiagnostics::new(initial, options.iteration_budget(initial)),
            metrics,
        })
    }

    pub fn from_loops(loops: &[BoundaryLoop], options: MeshOptions) -> Result<Self, MeshError> {
        options.validate()?;
        let front = Front::from_loops(loops, options.tolerance)?;
        Self::new(front, options)
    }

    #[must_use]
    pub fn front(&self) -> &Front {
        &self.front
    }

    #[must_use]
    pub fn options(&self) -> &MeshOptions {
        &self.options
    }

    #[must_use]
    pub fn panels(&self) -> &[Panel] {
        &self.panels
    }

    #[must_use]
    pub fn diagnostics(&self) -> &AdvancingFrontDiagnostics {
        &self.diagnostics
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.front.is_empty()
    }

    /// Runs one iteration. Returns `None` once the front is empty.
    pub fn step(&mut self) -> Result<Option<Step>, MeshError> {
        let Some(side_id) = self.front.first() else {
            return Ok(None);
        };

        let step = classify_step_timed(&self.front, side_id, &self.options, &mut self.metrics)?;
        let front = &mut self.front;
        let panel = self
            .metrics
            .time(TimingBucket::FrontUpdate, || apply_step(front, &step))?;

        self.panels.push(panel);
        self.diagnostics.record(step.case.kind(), self.front.len());
        if let StepCase::ConstraintCrossing { apex, constraint, .. } = step.case {
            let on_boundary = self.front.is_boundary(constraint);
            self.diagnostics.record_split(constraint, apex, on_boundary);
        }
        let iteration = self.diagnostics.iterations;
        trace!(
            "iteration {iteration}: side {} {:?} apex {:?}, {} sides left",
            step.side,
            step.case.kind(),
            panel.c,
            self.front.len()
        );

        if self.options.debug {
            self.diagnostics.snapshots.push(self.front.snapshot(iteration));
        }

        Ok(Some(step))
    }

    /// Steps until the front is empty or the iteration budget is spent.
    pub fn run(mut self) -> Result<MeshResult, MeshError> {
        let budget = self.diagnostics.iteration_budget;
        debug!(
            "advancing front: {} sides, spacing {}, budget {budget}",
            self.front.len(),
            self.options.spacing
        );

        while !self.front.is_empty() {
            if self.diagnostics.iterations >= budget {
                warn!(
                    "advancing front stopped after {budget} iterations with {} sides left",
                    self.front.len()
                );
                return Err(MeshError::NotConverged {
                    iterations: self.diagnostics.iterations,
                    remaining: self.front.len(),
                    snapshot: self.front.snapshot(self.diagnostics.iterations),
                    panels: self.panels,
                });
            }
            self.step()?;
        }

        self.diagnostics.timing = self.metrics.end();
        debug!("advancing front done: {}", self.diagnostics.summary());

        Ok(MeshResult {
            panels: self.panels,
            diagnostics: self.diagnostics,
        })
    }
}

/// Meshes `loops` into panels.
pub fn mesh_boundary_loops(
    loops: &[BoundaryLoop],
    options: &MeshOptions,
) -> Result<MeshResult, MeshError> {
    AdvancingFront::from_loops(loops, *options)?.run()
}

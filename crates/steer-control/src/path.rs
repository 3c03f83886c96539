//! Reference path generation.
//!
//! Paths are ordered point sequences that are never mutated after generation.
//! Closed paths (circle, square) repeat their first point at the end; the
//! random walk is open.

use std::f64::consts::{FRAC_PI_4, TAU};

use rand::Rng;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::ControlError;

/// Largest heading change between consecutive random-walk segments (rad).
pub const RANDOM_HEADING_JITTER: f64 = FRAC_PI_4;

/// A 2-D point on a reference path.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PathPoint {
    /// World-frame x coordinate.
    pub x: f64,
    /// World-frame y coordinate.
    pub y: f64,
}

impl PathPoint {
    /// Construct a point.
    pub const fn new(x: f64, y: f64) -> Self {
        PathPoint { x, y }
    }

    /// Euclidean distance to `other`.
    pub fn distance_to(&self, other: &PathPoint) -> f64 {
        (other.x - self.x).hypot(other.y - self.y)
    }
}

impl std::fmt::Display for PathPoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({:.2}, {:.2})", self.x, self.y)
    }
}

/// Whether a generated loop repeats its first point at the end.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PathClosure {
    /// Last point equals the first.
    #[default]
    Closed,
    /// Points only, no repeated start.
    Open,
}

/// Immutable ordered sequence of path points.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Path {
    points: Vec<PathPoint>,
    closed: bool,
}

impl Path {
    /// Wrap an arbitrary point sequence. `closed` marks it as a loop; the caller
    /// is responsible for repeating the first point.
    pub fn from_points(points: Vec<PathPoint>, closed: bool) -> Self {
        Path { points, closed }
    }

    /// The points in order.
    pub fn points(&self) -> &[PathPoint] {
        &self.points
    }

    /// Number of points.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// True if the path has no points.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// True if the path is a closed loop.
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Total polyline length.
    pub fn length(&self) -> f64 {
        self.points
            .windows(2)
            .map(|pair| pair[0].distance_to(&pair[1]))
            .sum()
    }

    /// Iterate over the points.
    pub fn iter(&self) -> std::slice::Iter<'_, PathPoint> {
        self.points.iter()
    }
}

impl<'a> IntoIterator for &'a Path {
    type Item = &'a PathPoint;
    type IntoIter = std::slice::Iter<'a, PathPoint>;

    fn into_iter(self) -> Self::IntoIter {
        self.points.iter()
    }
}

/// Generates `point_count` equally angle-spaced points on a circle, starting at
/// angle zero and running counter-clockwise.
///
/// # Arguments
/// * `center` - Circle centre
/// * `radius` - Circle radius; zero collapses every point onto the centre
/// * `point_count` - Number of distinct points, at least 1
/// * `closure` - Whether to append the first point again
///
/// # Returns
/// * `Result<Path, ControlError>` - `point_count` points, plus one when closed
pub fn generate_circle_path(
    center: PathPoint,
    radius: f64,
    point_count: usize,
    closure: PathClosure,
) -> Result<Path, ControlError> {
    if point_count == 0 {
        return Err(ControlError::InvalidPointCount("must be at least 1"));
    }
    if !(radius >= 0.0 && radius.is_finite()) {
        return Err(ControlError::InvalidRadius("must be non-negative"));
    }

    let mut points: Vec<PathPoint> = (0..point_count)
        .map(|i| {
            let angle = TAU * i as f64 / point_count as f64;
            PathPoint::new(
                center.x + radius * angle.cos(),
                center.y + radius * angle.sin(),
            )
        })
        .collect();

    let closed = closure == PathClosure::Closed;
    if closed {
        points.push(points[0]);
    }
    Ok(Path::from_points(points, closed))
}

/// Generates the closed, axis-aligned square around `center`: four corners
/// counter-clockwise from the lower-left one, then the lower-left corner again.
pub fn generate_square_path(center: PathPoint, side_length: f64) -> Result<Path, ControlError> {
    if !(side_length >= 0.0 && side_length.is_finite()) {
        return Err(ControlError::InvalidSideLength("must be non-negative"));
    }
    let h = side_length / 2.0;
    let points = vec![
        PathPoint::new(center.x - h, center.y - h),
        PathPoint::new(center.x + h, center.y - h),
        PathPoint::new(center.x + h, center.y + h),
        PathPoint::new(center.x - h, center.y + h),
        PathPoint::new(center.x - h, center.y - h),
    ];
    Ok(Path::from_points(points, true))
}

/// Generates an open random walk of `segment_count` segments from `start`.
///
/// The initial heading is uniform in `[0, 2PI)`. Before each segment the heading
/// is perturbed by a uniform delta in `[-PI/4, PI/4]`, then a point is placed
/// `segment_length` further along it. The result has `segment_count + 1` points
/// and is only reproducible with a seeded `rng`.
pub fn generate_random_path<R: Rng + ?Sized>(
    start: PathPoint,
    segment_count: usize,
    segment_length: f64,
    rng: &mut R,
) -> Result<Path, ControlError> {
    if segment_count == 0 {
        return Err(ControlError::InvalidSegmentCount("must be at least 1"));
    }
    if !(segment_length > 0.0 && segment_length.is_finite()) {
        return Err(ControlError::InvalidSegmentLength("must be positive"));
    }

    let mut points = Vec::with_capacity(segment_count + 1);
    points.push(start);
    let mut heading: f64 = rng.random_range(0.0..TAU);
    let mut last = start;
    for _ in 0..segment_count {
        heading += rng.random_range(-RANDOM_HEADING_JITTER..=RANDOM_HEADING_JITTER);
        last = PathPoint::new(
            last.x + heading.cos() * segment_length,
            last.y + heading.sin() * segment_length,
        );
        points.push(last);
    }
    Ok(Path::from_points(points, false))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use std::f64::consts::FRAC_PI_2;
    const EPSILON: f64 = 1e-9;

    #[test]
    fn test_circle_points_on_radius_and_spacing() {
        let path =
            generate_circle_path(PathPoint::new(0.0, 0.0), 10.0, 4, PathClosure::Closed).unwrap();
        assert_eq!(path.len(), 5);
        assert!(path.is_closed());
        assert_eq!(path.points()[0], path.points()[4]);
        for p in path.iter() {
            assert!((p.x.hypot(p.y) - 10.0).abs() < EPSILON);
        }
        for pair in path.points()[..4].windows(2) {
            let a0 = pair[0].y.atan2(pair[0].x);
            let a1 = pair[1].y.atan2(pair[1].x);
            let gap = steer_kinematics::wrap_angle(a1 - a0);
            assert!((gap - FRAC_PI_2).abs() < EPSILON);
        }
    }

    #[test]
    fn test_open_circle() {
        let path =
            generate_circle_path(PathPoint::new(1.0, 2.0), 3.0, 100, PathClosure::Open).unwrap();
        assert_eq!(path.len(), 100);
        assert!(!path.is_closed());
    }

    #[test]
    fn test_circle_single_point_and_zero_radius() {
        let single =
            generate_circle_path(PathPoint::new(0.0, 0.0), 5.0, 1, PathClosure::Closed).unwrap();
        assert_eq!(single.points(), &[PathPoint::new(5.0, 0.0), PathPoint::new(5.0, 0.0)]);

        let center = PathPoint::new(3.0, -4.0);
        let collapsed = generate_circle_path(center, 0.0, 8, PathClosure::Closed).unwrap();
        assert!(collapsed.iter().all(|p| p.distance_to(&center) < EPSILON));
    }

    #[test]
    fn test_circle_invalid_inputs() {
        let origin = PathPoint::default();
        assert!(matches!(
            generate_circle_path(origin, 1.0, 0, PathClosure::Closed),
            Err(ControlError::InvalidPointCount(_))
        ));
        assert!(matches!(
            generate_circle_path(origin, -1.0, 4, PathClosure::Closed),
            Err(ControlError::InvalidRadius(_))
        ));
    }

    #[test]
    fn test_square_is_closed_with_five_corners() {
        let path = generate_square_path(PathPoint::new(10.0, 10.0), 4.0).unwrap();
        assert_eq!(path.len(), 5);
        assert!(path.is_closed());
        assert_eq!(path.points()[0], PathPoint::new(8.0, 8.0));
        assert_eq!(path.points()[2], PathPoint::new(12.0, 12.0));
        assert_eq!(path.points()[0], path.points()[4]);
        assert!((path.length() - 16.0).abs() < EPSILON);
        assert!(generate_square_path(PathPoint::default(), -1.0).is_err());
    }

    #[test]
    fn test_random_path_shape() {
        let mut rng = StdRng::seed_from_u64(7);
        let start = PathPoint::new(400.0, 300.0);
        let path = generate_random_path(start, 10, 50.0, &mut rng).unwrap();
        assert_eq!(path.len(), 11);
        assert!(!path.is_closed());
        assert_eq!(path.points()[0], start);
        for pair in path.points().windows(2) {
            assert!((pair[0].distance_to(&pair[1]) - 50.0).abs() < EPSILON);
        }
        assert!((path.length() - 500.0).abs() < 1e-6);
    }

    #[test]
    fn test_random_path_heading_changes_are_bounded() {
        let mut rng = StdRng::seed_from_u64(42);
        let path = generate_random_path(PathPoint::default(), 50, 1.0, &mut rng).unwrap();
        let headings: Vec<f64> = path
            .points()
            .windows(2)
            .map(|pair| (pair[1].y - pair[0].y).atan2(pair[1].x - pair[0].x))
            .collect();
        for pair in headings.windows(2) {
            let turn = steer_kinematics::wrap_angle(pair[1] - pair[0]);
            assert!(turn.abs() <= RANDOM_HEADING_JITTER + EPSILON);
        }
    }

    #[test]
    fn test_random_path_seeded_is_reproducible() {
        let generate = || {
            generate_random_path(PathPoint::default(), 5, 2.0, &mut StdRng::seed_from_u64(1))
                .unwrap()
        };
        let (a, b) = (generate(), generate());
        assert_eq!(a, b);
    }

    #[test]
    fn test_random_path_invalid_inputs() {
        let mut rng = StdRng::seed_from_u64(0);
        assert!(matches!(
            generate_random_path(PathPoint::default(), 0, 1.0, &mut rng),
            Err(ControlError::InvalidSegmentCount(_))
        ));
        assert!(matches!(
            generate_random_path(PathPoint::default(), 3, 0.0, &mut rng),
            Err(ControlError::InvalidSegmentLength(_))
        ));
    }
}

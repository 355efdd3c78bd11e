use std::fmt;

use serde::{Deserialize, Serialize};

use crate::geometry::Point;

/// Samples per cubic segment when approximating a path by a polyline.
const FLATTEN_STEPS: usize = 16;
const SPAN_EPSILON: f32 = 1e-3;

/// Interpolation used between consecutive curve knots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CurveType {
    /// Cubic through each knot with horizontal tangents, control points at the
    /// horizontal midpoint of every segment.
    #[default]
    BumpX,
    Linear,
    /// Monotone cubic: never overshoots between two knots.
    MonotoneX,
    StepAfter,
}

impl CurveType {
    pub const ALL: [CurveType; 4] = [
        CurveType::BumpX,
        CurveType::Linear,
        CurveType::MonotoneX,
        CurveType::StepAfter,
    ];
}

impl fmt::Display for CurveType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CurveType::BumpX => write!(f, "Bump"),
            CurveType::Linear => write!(f, "Linear"),
            CurveType::MonotoneX => write!(f, "Monotone"),
            CurveType::StepAfter => write!(f, "Step"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PathCommand {
    MoveTo(Point),
    LineTo(Point),
    CubicTo {
        ctrl1: Point,
        ctrl2: Point,
        to: Point,
    },
    Close,
}

/// Toolkit-agnostic path description of the bidding curve.
///
/// A pure function of its input points: building twice from the same points
/// yields equal commands and an identical `Display` string.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CurvePath {
    commands: Vec<PathCommand>,
}

impl CurvePath {
    pub fn build(points: &[Point], curve: CurveType) -> Self {
        let mut commands = Vec::with_capacity(points.len() * 2 + 1);

        match points {
            [] => {}
            [only] => {
                commands.push(PathCommand::MoveTo(*only));
                commands.push(PathCommand::Close);
            }
            [first, rest @ ..] => {
                commands.push(PathCommand::MoveTo(*first));

                match curve {
                    CurveType::Linear => {
                        commands.extend(rest.iter().map(|p| PathCommand::LineTo(*p)));
                    }
                    CurveType::BumpX => {
                        for w in points.windows(2) {
                            let (a, b) = (w[0], w[1]);
                            let mid_x = (a.x + b.x) / 2.0;
                            commands.push(PathCommand::CubicTo {
                                ctrl1: Point::new(mid_x, a.y),
                                ctrl2: Point::new(mid_x, b.y),
                                to: b,
                            });
                        }
                    }
                    CurveType::StepAfter => {
                        for w in points.windows(2) {
                            let (a, b) = (w[0], w[1]);
                            commands.push(PathCommand::LineTo(Point::new(b.x, a.y)));
                            commands.push(PathCommand::LineTo(b));
                        }
                    }
                    CurveType::MonotoneX => monotone_x(points, &mut commands),
                }
            }
        }

        Self { commands }
    }

    pub fn commands(&self) -> &[PathCommand] {
        &self.commands
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// A single knot renders as a point, not a line.
    pub fn is_degenerate(&self) -> bool {
        !self
            .commands
            .iter()
            .any(|cmd| matches!(cmd, PathCommand::LineTo(_) | PathCommand::CubicTo { .. }))
    }

    pub fn start_point(&self) -> Point {
        match self.commands.first() {
            Some(PathCommand::MoveTo(p)) => *p,
            _ => Point::ORIGIN,
        }
    }

    /// Last point reached by the path, or the origin for an empty path.
    pub fn end_point(&self) -> Point {
        self.commands
            .iter()
            .rev()
            .find_map(|cmd| match cmd {
                PathCommand::MoveTo(p) | PathCommand::LineTo(p) => Some(*p),
                PathCommand::CubicTo { to, .. } => Some(*to),
                PathCommand::Close => None,
            })
            .unwrap_or(Point::ORIGIN)
    }

    /// Horizontal span covered by the on-curve points.
    pub fn x_extent(&self) -> Option<(f32, f32)> {
        self.commands
            .iter()
            .filter_map(|cmd| match cmd {
                PathCommand::MoveTo(p) | PathCommand::LineTo(p) => Some(p.x),
                PathCommand::CubicTo { to, .. } => Some(to.x),
                PathCommand::Close => None,
            })
            .fold(None, |acc, x| match acc {
                None => Some((x, x)),
                Some((lo, hi)) => Some((lo.min(x), hi.max(x))),
            })
    }

    /// Polyline approximation, cubic segments sampled uniformly in `t`.
    pub fn flatten(&self) -> Vec<Point> {
        let mut out = Vec::with_capacity(self.commands.len() * FLATTEN_STEPS);
        let mut current = Point::ORIGIN;

        for cmd in &self.commands {
            match *cmd {
                PathCommand::MoveTo(p) | PathCommand::LineTo(p) => {
                    out.push(p);
                    current = p;
                }
                PathCommand::CubicTo { ctrl1, ctrl2, to } => {
                    for step in 1..=FLATTEN_STEPS {
                        let t = step as f32 / FLATTEN_STEPS as f32;
                        out.push(cubic_point(current, ctrl1, ctrl2, to, t));
                    }
                    current = to;
                }
                PathCommand::Close => {}
            }
        }

        out
    }

    pub fn length(&self) -> f32 {
        self.flatten()
            .windows(2)
            .map(|w| w[0].distance(w[1]))
            .sum()
    }
}

impl fmt::Display for CurvePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for cmd in &self.commands {
            match cmd {
                PathCommand::MoveTo(p) => write!(f, "M{},{}", p.x, p.y)?,
                PathCommand::LineTo(p) => write!(f, "L{},{}", p.x, p.y)?,
                PathCommand::CubicTo { ctrl1, ctrl2, to } => write!(
                    f,
                    "C{},{},{},{},{},{}",
                    ctrl1.x, ctrl1.y, ctrl2.x, ctrl2.y, to.x, to.y
                )?,
                PathCommand::Close => write!(f, "Z")?,
            }
        }
        Ok(())
    }
}

/// Filled region between the curve and a horizontal `top` edge.
///
/// Clips the floor line: at a given height the area covers exactly the x
/// ranges where the curve lies at or below that height on screen.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AreaPath {
    edge: CurvePath,
    top: f32,
}

impl AreaPath {
    pub fn build(points: &[Point], curve: CurveType, top: f32) -> Self {
        Self {
            edge: CurvePath::build(points, curve),
            top,
        }
    }

    /// Closed outline: the curve, then back along the top edge.
    pub fn commands(&self) -> Vec<PathCommand> {
        if self.edge.is_empty() {
            return Vec::new();
        }

        let start = self.edge.start_point();
        let end = self.edge.end_point();

        let mut commands: Vec<PathCommand> = self
            .edge
            .commands()
            .iter()
            .copied()
            .filter(|cmd| !matches!(cmd, PathCommand::Close))
            .collect();
        commands.push(PathCommand::LineTo(Point::new(end.x, self.top)));
        commands.push(PathCommand::LineTo(Point::new(start.x, self.top)));
        commands.push(PathCommand::Close);
        commands
    }

    /// Sorted, merged x intervals covered by the area at height `y`.
    pub fn spans_at(&self, y: f32) -> Vec<(f32, f32)> {
        if y < self.top {
            return Vec::new();
        }

        let mut spans: Vec<(f32, f32)> = self
            .edge
            .flatten()
            .windows(2)
            .filter_map(|w| covered_part(w[0], w[1], y))
            .collect();

        spans.sort_by(|a, b| a.0.total_cmp(&b.0));

        let mut merged: Vec<(f32, f32)> = Vec::with_capacity(spans.len());
        for (start, end) in spans {
            match merged.last_mut() {
                Some(last) if start <= last.1 + SPAN_EPSILON => last.1 = last.1.max(end),
                _ => merged.push((start, end)),
            }
        }

        merged.retain(|(start, end)| end - start > SPAN_EPSILON);
        merged
    }
}

/// Part of the segment `a -> b` lying at or below height `y` (screen space).
fn covered_part(a: Point, b: Point, y: f32) -> Option<(f32, f32)> {
    let (a_in, b_in) = (a.y >= y, b.y >= y);

    let (start, end) = match (a_in, b_in) {
        (true, true) => (a.x, b.x),
        (false, false) => return None,
        _ => {
            let t = (y - a.y) / (b.y - a.y);
            let cross = a.x + t * (b.x - a.x);
            if a_in { (a.x, cross) } else { (cross, b.x) }
        }
    };

    Some((start.min(end), start.max(end)))
}

fn cubic_point(p0: Point, p1: Point, p2: Point, p3: Point, t: f32) -> Point {
    let mt = 1.0 - t;
    let a = mt * mt * mt;
    let b = 3.0 * mt * mt * t;
    let c = 3.0 * mt * t * t;
    let d = t * t * t;

    Point::new(
        a * p0.x + b * p1.x + c * p2.x + d * p3.x,
        a * p0.y + b * p1.y + c * p2.y + d * p3.y,
    )
}

fn monotone_x(points: &[Point], commands: &mut Vec<PathCommand>) {
    let n = points.len();
    if n < 3 {
        commands.extend(points[1..].iter().map(|p| PathCommand::LineTo(*p)));
        return;
    }

    let mut tangents = vec![0.0f32; n];
    for i in 1..n - 1 {
        tangents[i] = interior_slope(points[i - 1], points[i], points[i + 1]);
    }
    tangents[0] = endpoint_slope(points[0], points[1], tangents[1]);
    tangents[n - 1] = endpoint_slope(points[n - 2], points[n - 1], tangents[n - 2]);

    for i in 0..n - 1 {
        let (a, b) = (points[i], points[i + 1]);
        let dx = (b.x - a.x) / 3.0;

        commands.push(PathCommand::CubicTo {
            ctrl1: Point::new(a.x + dx, a.y + dx * tangents[i]),
            ctrl2: Point::new(b.x - dx, b.y - dx * tangents[i + 1]),
            to: b,
        });
    }
}

fn interior_slope(p0: Point, p1: Point, p2: Point) -> f32 {
    let h0 = p1.x - p0.x;
    let h1 = p2.x - p1.x;
    if h0 + h1 == 0.0 {
        return 0.0;
    }

    let s0 = if h0 != 0.0 { (p1.y - p0.y) / h0 } else { 0.0 };
    let s1 = if h1 != 0.0 { (p2.y - p1.y) / h1 } else { 0.0 };
    let p = (s0 * h1 + s1 * h0) / (h0 + h1);

    let slope = (sign(s0) + sign(s1)) * s0.abs().min(s1.abs()).min(0.5 * p.abs());
    if slope.is_finite() { slope } else { 0.0 }
}

fn endpoint_slope(a: Point, b: Point, tangent: f32) -> f32 {
    let h = b.x - a.x;
    if h != 0.0 {
        (3.0 * (b.y - a.y) / h - tangent) / 2.0
    } else {
        tangent
    }
}

fn sign(v: f32) -> f32 {
    if v < 0.0 { -1.0 } else { 1.0 }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn knots() -> Vec<Point> {
        vec![
            Point::new(0.0, 395.0),
            Point::new(34.4, 310.0),
            Point::new(68.9, 240.0),
            Point::new(103.3, 200.0),
            Point::new(137.8, 190.0),
            Point::new(172.2, 120.0),
        ]
    }

    #[test]
    fn empty_input_yields_sentinel_path() {
        let path = CurvePath::build(&[], CurveType::BumpX);
        assert!(path.is_empty());
        assert_eq!(path.end_point(), Point::ORIGIN);
        assert_eq!(path.x_extent(), None);
        assert_eq!(path.to_string(), "");
    }

    #[test]
    fn single_point_is_degenerate() {
        for curve in CurveType::ALL {
            let path = CurvePath::build(&[Point::new(10.0, 20.0)], curve);
            assert!(path.is_degenerate());
            assert_eq!(path.to_string(), "M10,20Z");
            assert_eq!(path.end_point(), Point::new(10.0, 20.0));
            assert_eq!(path.length(), 0.0);
        }
    }

    #[test]
    fn bump_segment_uses_midpoint_controls() {
        let path = CurvePath::build(
            &[Point::new(0.0, 100.0), Point::new(100.0, 0.0)],
            CurveType::BumpX,
        );
        assert_eq!(path.to_string(), "M0,100C50,100,50,0,100,0");
    }

    #[test]
    fn step_after_goes_horizontal_first() {
        let path = CurvePath::build(
            &[Point::new(0.0, 100.0), Point::new(50.0, 40.0)],
            CurveType::StepAfter,
        );
        assert_eq!(path.to_string(), "M0,100L50,100L50,40");
    }

    #[test]
    fn identical_input_is_byte_identical() {
        for curve in CurveType::ALL {
            let a = CurvePath::build(&knots(), curve).to_string();
            let b = CurvePath::build(&knots(), curve).to_string();
            assert_eq!(a, b);
        }
    }

    #[test]
    fn x_extent_grows_as_points_are_appended() {
        let points = knots();
        for curve in CurveType::ALL {
            let mut last_extent = 0.0;
            for n in 1..=points.len() {
                let path = CurvePath::build(&points[..n], curve);
                let (lo, hi) = path.x_extent().expect("non-empty path");
                assert_eq!(lo, 0.0);
                assert!(hi >= last_extent);
                last_extent = hi;
            }
            assert_eq!(last_extent, 172.2);
        }
    }

    #[test]
    fn curve_passes_through_every_knot() {
        let points = knots();
        for curve in CurveType::ALL {
            let path = CurvePath::build(&points, curve);
            let flat = path.flatten();
            for knot in &points {
                assert!(
                    flat.iter().any(|p| p.distance(*knot) < 1e-3),
                    "{curve} misses {knot:?}"
                );
            }
        }
    }

    #[test]
    fn monotone_never_overshoots() {
        let points = vec![
            Point::new(0.0, 300.0),
            Point::new(10.0, 100.0),
            Point::new(200.0, 95.0),
            Point::new(210.0, 20.0),
        ];
        let path = CurvePath::build(&points, CurveType::MonotoneX);

        for w in path.flatten().windows(2) {
            assert!(w[1].y <= w[0].y + 1e-3, "curve rises between {:?}", w);
        }
    }

    #[test]
    fn area_is_closed_along_top_edge() {
        let area = AreaPath::build(
            &[Point::new(0.0, 100.0), Point::new(100.0, 0.0)],
            CurveType::Linear,
            0.0,
        );
        let commands = area.commands();

        assert_eq!(commands.first(), Some(&PathCommand::MoveTo(Point::new(0.0, 100.0))));
        assert_eq!(commands[commands.len() - 3], PathCommand::LineTo(Point::new(100.0, 0.0)));
        assert_eq!(commands[commands.len() - 2], PathCommand::LineTo(Point::new(0.0, 0.0)));
        assert_eq!(commands.last(), Some(&PathCommand::Close));
        assert!(AreaPath::build(&[], CurveType::Linear, 0.0).commands().is_empty());
    }

    #[test]
    fn spans_cover_the_curve_below_a_height() {
        let area = AreaPath::build(
            &[Point::new(0.0, 100.0), Point::new(100.0, 0.0)],
            CurveType::Linear,
            0.0,
        );

        let spans = area.spans_at(50.0);
        assert_eq!(spans.len(), 1);
        assert!((spans[0].0 - 0.0).abs() < 1e-3);
        assert!((spans[0].1 - 50.0).abs() < 1e-3);

        assert!(area.spans_at(150.0).is_empty());
        assert!(area.spans_at(-1.0).is_empty());
    }

    #[test]
    fn spans_split_when_curve_crosses_twice() {
        let area = AreaPath::build(
            &[
                Point::new(0.0, 100.0),
                Point::new(50.0, 0.0),
                Point::new(100.0, 100.0),
            ],
            CurveType::Linear,
            0.0,
        );

        let spans = area.spans_at(50.0);
        assert_eq!(spans.len(), 2);
        assert!((spans[0].1 - 25.0).abs() < 1e-3);
        assert!((spans[1].0 - 75.0).abs() < 1e-3);
    }
}

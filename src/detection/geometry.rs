use imageproc::geometry::{approximate_polygon_dp, arc_length, convex_hull};
use imageproc::point::Point;

use crate::detection::contours::contour_area;
use crate::models::FingerCount;

/// Simplification tolerance as a fraction of the contour perimeter.
const SIMPLIFY_PERIMETER_FACTOR: f64 = 0.0005;

/// A concave notch between two consecutive hull vertices. All indices point
/// into the simplified contour; `far` is the deepest contour point between
/// `start` and `end`, `depth` its distance from the hull chord.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConvexityDefect {
    pub start: usize,
    pub end: usize,
    pub far: usize,
    pub depth: f64,
}

/// Turn a hand contour into a finger count.
///
/// The contour is simplified, its convex hull and convexity defects are
/// derived, and every defect whose valley angle (law of cosines at the
/// deepest point) is at most `valley_angle_max` radians counts as a gap
/// between two extended fingers. When no valley qualifies the
/// hull-to-contour area excess decides between a closed fist (below
/// `ratio_threshold` percent) and a single extended finger.
///
/// Returns `None` when the simplified contour has fewer than four vertices,
/// which is too degenerate for hull/defect geometry.
pub fn analyze(
    contour: &[Point<i32>],
    ratio_threshold: f64,
    valley_angle_max: f64,
) -> Option<FingerCount> {
    let perimeter = arc_length(contour, true);
    let simplified = approximate_polygon_dp(contour, SIMPLIFY_PERIMETER_FACTOR * perimeter, true);
    if simplified.len() < 4 {
        return None;
    }

    let hull_points = convex_hull(&simplified[..]);
    let hull_area = contour_area(&hull_points);
    let enclosed = contour_area(&simplified);
    // Undefined when the contour encloses nothing; treated as no excess so
    // the fallback below reports a closed hand.
    let hull_excess_ratio = if enclosed > 0.0 {
        (hull_area - enclosed) / enclosed * 100.0
    } else {
        0.0
    };

    let hull = convex_hull_indices(&simplified);
    let defects = convexity_defects(&simplified, &hull);

    // Baseline: one dominant mass. Each qualifying valley separates two
    // adjacent extended fingers.
    let mut fingers = 1u32;
    for defect in &defects {
        let angle = match valley_angle(
            simplified[defect.start],
            simplified[defect.end],
            simplified[defect.far],
        ) {
            Some(angle) => angle,
            None => continue,
        };
        if angle <= valley_angle_max {
            fingers += 1;
        }
    }
    if fingers == 1 && hull_excess_ratio < ratio_threshold {
        fingers = 0;
    }

    log::debug!(
        "{} simplified vertices, {} hull vertices, {} defects, excess {:.1}% -> {} fingers",
        simplified.len(),
        hull.len(),
        defects.len(),
        hull_excess_ratio,
        fingers
    );
    Some(FingerCount {
        fingers,
        hull_excess_ratio,
    })
}

/// Convex hull of the polygon as indices into `points`, in contour order.
///
/// Monotone chain with strict turns, so collinear boundary points are not
/// hull vertices. Indexing (rather than returning coordinates) lets defect
/// extraction walk the contour between consecutive hull vertices.
pub fn convex_hull_indices(points: &[Point<i32>]) -> Vec<usize> {
    if points.len() < 3 {
        return (0..points.len()).collect();
    }
    let mut order: Vec<usize> = (0..points.len()).collect();
    order.sort_by_key(|&i| (points[i].x, points[i].y));
    order.dedup_by(|a, b| points[*a] == points[*b]);

    let cross = |o: usize, a: usize, b: usize| -> i64 {
        let (po, pa, pb) = (points[o], points[a], points[b]);
        i64::from(pa.x - po.x) * i64::from(pb.y - po.y)
            - i64::from(pa.y - po.y) * i64::from(pb.x - po.x)
    };

    let mut lower: Vec<usize> = Vec::new();
    for &i in &order {
        while lower.len() >= 2 && cross(lower[lower.len() - 2], lower[lower.len() - 1], i) <= 0 {
            lower.pop();
        }
        lower.push(i);
    }
    let mut upper: Vec<usize> = Vec::new();
    for &i in order.iter().rev() {
        while upper.len() >= 2 && cross(upper[upper.len() - 2], upper[upper.len() - 1], i) <= 0 {
            upper.pop();
        }
        upper.push(i);
    }
    lower.pop();
    upper.pop();
    lower.extend(upper);
    lower.sort_unstable();
    lower.dedup();
    lower
}

/// Derive the convexity defects of `points` given its hull indices.
///
/// For each pair of consecutive hull vertices, the contour points strictly
/// between them are scanned for the one farthest from the hull chord. Hull
/// edges with no interior contour point, or whose interior points all sit on
/// the chord, produce no defect.
pub fn convexity_defects(points: &[Point<i32>], hull: &[usize]) -> Vec<ConvexityDefect> {
    let mut defects = Vec::new();
    if points.is_empty() || hull.len() < 2 {
        return defects;
    }
    for (k, &start) in hull.iter().enumerate() {
        let end = hull[(k + 1) % hull.len()];
        let mut far = None;
        let mut depth = 0.0;
        let mut i = (start + 1) % points.len();
        while i != end {
            let d = chord_distance(points[i], points[start], points[end]);
            if d > depth {
                depth = d;
                far = Some(i);
            }
            i = (i + 1) % points.len();
        }
        if let Some(far) = far {
            defects.push(ConvexityDefect {
                start,
                end,
                far,
                depth,
            });
        }
    }
    defects
}

/// Interior angle at the defect's deepest point, via the law of cosines.
/// `None` when either edge touching the deepest point has zero length; the
/// cosine is clamped to [-1, 1] against floating-point overshoot.
pub fn valley_angle(start: Point<i32>, end: Point<i32>, far: Point<i32>) -> Option<f64> {
    let s1 = distance(start, end);
    let s2 = distance(start, far);
    let s3 = distance(end, far);
    if s2 == 0.0 || s3 == 0.0 {
        return None;
    }
    let cos = ((s2 * s2 + s3 * s3 - s1 * s1) / (2.0 * s2 * s3)).clamp(-1.0, 1.0);
    Some(cos.acos())
}

fn distance(a: Point<i32>, b: Point<i32>) -> f64 {
    let dx = f64::from(a.x - b.x);
    let dy = f64::from(a.y - b.y);
    (dx * dx + dy * dy).sqrt()
}

/// Distance from `p` to the line through `a` and `b` (to `a` when the chord
/// is degenerate).
fn chord_distance(p: Point<i32>, a: Point<i32>, b: Point<i32>) -> f64 {
    let len = distance(a, b);
    if len == 0.0 {
        return distance(p, a);
    }
    let cross = i64::from(b.x - a.x) * i64::from(p.y - a.y)
        - i64::from(b.y - a.y) * i64::from(p.x - a.x);
    cross.abs() as f64 / len
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::FRAC_PI_2;

    /// Palm with an arched row of finger tips. `valleys` deep notches sit
    /// between `valleys + 1` tips, each valley angle well under 90 degrees.
    fn spread_hand(valleys: usize) -> Vec<Point<i32>> {
        let tips = valleys + 1;
        let span = 200;
        let step = span / valleys as i32;
        let mut points = Vec::new();
        for t in 0..tips {
            let x = t as i32 * step;
            // convex arch so every tip is a strict hull vertex
            let center = span / 2;
            let y = (x - center) * (x - center) / 250;
            points.push(Point::new(x, y));
            if t + 1 < tips {
                points.push(Point::new(x + step / 2, 140));
            }
        }
        points.push(Point::new(span, 240));
        points.push(Point::new(0, 240));
        points
    }

    fn fist() -> Vec<Point<i32>> {
        vec![
            Point::new(0, 0),
            Point::new(200, 0),
            Point::new(200, 200),
            Point::new(0, 200),
        ]
    }

    /// Square palm with a single narrow spike; its two valley angles are
    /// obtuse, so only the area ratio separates it from a fist.
    fn pointing_hand() -> Vec<Point<i32>> {
        vec![
            Point::new(0, 100),
            Point::new(90, 100),
            Point::new(100, 0),
            Point::new(110, 100),
            Point::new(200, 100),
            Point::new(200, 300),
            Point::new(0, 300),
        ]
    }

    #[test]
    fn four_valleys_count_five_fingers() {
        let count = analyze(&spread_hand(4), 16.0, FRAC_PI_2).unwrap();
        assert_eq!(count.fingers, 5);
    }

    #[test]
    fn two_valleys_count_three_fingers() {
        let count = analyze(&spread_hand(2), 16.0, FRAC_PI_2).unwrap();
        assert_eq!(count.fingers, 3);
    }

    #[test]
    fn fist_counts_zero() {
        let count = analyze(&fist(), 16.0, FRAC_PI_2).unwrap();
        assert_eq!(count.fingers, 0);
        assert!(count.hull_excess_ratio < 16.0);
    }

    #[test]
    fn single_finger_resolved_by_area_ratio() {
        let count = analyze(&pointing_hand(), 16.0, FRAC_PI_2).unwrap();
        assert_eq!(count.fingers, 1);
        assert!(count.hull_excess_ratio >= 16.0);
    }

    #[test]
    fn ratio_threshold_is_configurable() {
        // raising the threshold above the pointing hand's excess flips it
        // back to a closed-hand call
        let count = analyze(&pointing_hand(), 30.0, FRAC_PI_2).unwrap();
        assert_eq!(count.fingers, 0);
    }

    #[test]
    fn too_few_vertices_is_no_detection() {
        let sliver = vec![Point::new(0, 0), Point::new(10, 0), Point::new(5, 1)];
        assert!(analyze(&sliver, 16.0, FRAC_PI_2).is_none());
    }

    #[test]
    fn hull_indices_skip_concave_and_collinear_points() {
        let hull = convex_hull_indices(&pointing_hand());
        assert_eq!(hull, vec![0, 2, 4, 5, 6]);
    }

    #[test]
    fn defect_found_between_hull_neighbours() {
        let points = pointing_hand();
        let hull = convex_hull_indices(&points);
        let defects = convexity_defects(&points, &hull);
        assert!(defects
            .iter()
            .any(|d| d.start == 0 && d.end == 2 && d.far == 1 && d.depth > 50.0));
    }

    #[test]
    fn square_has_no_defects() {
        let points = fist();
        let hull = convex_hull_indices(&points);
        assert_eq!(hull.len(), 4);
        assert!(convexity_defects(&points, &hull).is_empty());
    }

    #[test]
    fn valley_angle_right_triangle() {
        let angle = valley_angle(Point::new(0, 0), Point::new(10, 0), Point::new(0, 10)).unwrap();
        assert!((angle - FRAC_PI_2).abs() < 1e-9);
    }

    #[test]
    fn zero_length_edge_yields_no_angle() {
        assert!(valley_angle(Point::new(3, 3), Point::new(7, 7), Point::new(3, 3)).is_none());
        assert!(valley_angle(Point::new(3, 3), Point::new(7, 7), Point::new(7, 7)).is_none());
    }

    #[test]
    fn duplicate_contour_points_are_tolerated() {
        // index 3 repeats index 0; the hull keeps one copy and analysis
        // still runs to completion
        let points = vec![
            Point::new(0, 0),
            Point::new(200, 0),
            Point::new(200, 200),
            Point::new(0, 0),
            Point::new(0, 200),
        ];
        let count = analyze(&points, 16.0, FRAC_PI_2);
        assert!(count.is_some());
    }

    #[test]
    fn points_on_hull_edge_produce_no_defect() {
        let points = vec![
            Point::new(0, 0),
            Point::new(200, 0),
            Point::new(200, 200),
            Point::new(100, 200),
            Point::new(0, 200),
        ];
        let hull = convex_hull_indices(&points);
        assert_eq!(hull, vec![0, 1, 2, 4]);
        assert!(convexity_defects(&points, &hull).is_empty());
    }
}

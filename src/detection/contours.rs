use image::GrayImage;
use imageproc::contours::{find_contours, Contour};
use imageproc::point::Point;

/// Find the closed boundaries of all connected foreground regions in a
/// binary mask. Any non-zero pixel counts as foreground.
pub fn extract_contours(mask: &GrayImage) -> Vec<Contour<i32>> {
    find_contours::<i32>(mask)
}

/// Pick the contour most likely to be the hand: the one enclosing the
/// largest area. Ties keep the earliest contour, so selection is stable
/// within a call. `None` when no contours were found.
pub fn select_hand_contour<'a>(contours: &'a [Contour<i32>]) -> Option<&'a Contour<i32>> {
    let mut best: Option<(&Contour<i32>, f64)> = None;
    for contour in contours {
        let area = contour_area(&contour.points);
        if best.map_or(true, |(_, best_area)| area > best_area) {
            best = Some((contour, area));
        }
    }
    best.map(|(contour, _)| contour)
}

/// Enclosed area of a closed polygon via the shoelace formula.
/// Polygons with fewer than three vertices enclose nothing.
pub fn contour_area(points: &[Point<i32>]) -> f64 {
    if points.len() < 3 {
        return 0.0;
    }
    let mut twice_area = 0i64;
    for (i, p) in points.iter().enumerate() {
        let q = points[(i + 1) % points.len()];
        twice_area += i64::from(p.x) * i64::from(q.y) - i64::from(q.x) * i64::from(p.y);
    }
    twice_area.abs() as f64 / 2.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    fn mask_with_block(x0: u32, y0: u32, side: u32) -> GrayImage {
        let mut mask = GrayImage::from_pixel(32, 32, Luma([0]));
        for y in y0..y0 + side {
            for x in x0..x0 + side {
                mask.put_pixel(x, y, Luma([255]));
            }
        }
        mask
    }

    #[test]
    fn empty_mask_has_no_contours() {
        let contours = extract_contours(&GrayImage::from_pixel(16, 16, Luma([0])));
        assert!(select_hand_contour(&contours).is_none());
    }

    #[test]
    fn largest_region_wins() {
        let mut mask = mask_with_block(2, 2, 4);
        for y in 12..28 {
            for x in 12..28 {
                mask.put_pixel(x, y, Luma([255]));
            }
        }
        let contours = extract_contours(&mask);
        let hand = select_hand_contour(&contours).unwrap();
        // the 16x16 block, not the 4x4 one
        assert!(hand.points.iter().any(|p| p.x >= 12));
        assert!(contour_area(&hand.points) > 100.0);
    }

    #[test]
    fn shoelace_of_a_square() {
        let square = vec![
            Point::new(0, 0),
            Point::new(10, 0),
            Point::new(10, 10),
            Point::new(0, 10),
        ];
        assert_eq!(contour_area(&square), 100.0);
    }

    #[test]
    fn degenerate_polygons_have_zero_area() {
        assert_eq!(contour_area(&[]), 0.0);
        assert_eq!(contour_area(&[Point::new(1, 1), Point::new(5, 5)]), 0.0);
    }
}

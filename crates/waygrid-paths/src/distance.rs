use waygrid_core::Point;

/// Cost of one orthogonal step.
pub const ORTHOGONAL_COST: i32 = 10;

/// Cost of one diagonal step (≈ 10·√2).
pub const DIAGONAL_COST: i32 = 14;

/// Octile distance between two cells, scaled to integers.
///
/// Takes as many diagonal steps as the shorter axis allows and covers the
/// remainder orthogonally: `14·min(dx, dy) + 10·(max(dx, dy) − min(dx, dy))`.
#[inline]
pub fn octile(a: Point, b: Point) -> i32 {
    let d = a.abs_diff(b);
    let (lo, hi) = if d.x < d.y { (d.x, d.y) } else { (d.y, d.x) };
    DIAGONAL_COST * lo + ORTHOGONAL_COST * (hi - lo)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn octile_steps() {
        let o = Point::ZERO;
        assert_eq!(octile(o, o), 0);
        assert_eq!(octile(o, Point::new(1, 0)), 10);
        assert_eq!(octile(o, Point::new(0, -1)), 10);
        assert_eq!(octile(o, Point::new(1, 1)), 14);
        assert_eq!(octile(o, Point::new(4, 4)), 56);
        assert_eq!(octile(o, Point::new(5, 2)), 14 * 2 + 10 * 3);
    }

    #[test]
    fn octile_is_symmetric() {
        let a = Point::new(-3, 7);
        let b = Point::new(6, 1);
        assert_eq!(octile(a, b), octile(b, a));
    }
}

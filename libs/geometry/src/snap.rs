//! Snapping utilities (eg. snap to a grid).

/// Snaps `pos` to the nearest multiple of `grid`.
///
/// Ties round down.
pub const fn snap_to_grid(pos: i64, grid: i64) -> i64 {
    assert!(grid > 0);

    let rem = pos.rem_euclid(grid);
    if rem <= grid / 2 {
        pos - rem
    } else {
        pos + grid - rem
    }
}

/// Snaps `pos` to the largest multiple of `grid` that is less than or equal to `pos`.
pub const fn snap_down(pos: i64, grid: i64) -> i64 {
    assert!(grid > 0);
    pos - pos.rem_euclid(grid)
}

/// Snaps `pos` to the smallest multiple of `grid` that is greater than or equal to `pos`.
pub const fn snap_up(pos: i64, grid: i64) -> i64 {
    assert!(grid > 0);
    let rem = pos.rem_euclid(grid);
    if rem == 0 {
        pos
    } else {
        pos + grid - rem
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapping_handles_negative_coordinates() {
        assert_eq!(snap_to_grid(-7, 5), -5);
        assert_eq!(snap_to_grid(-8, 5), -10);
        assert_eq!(snap_down(-7, 5), -10);
        assert_eq!(snap_up(-7, 5), -5);
        assert_eq!(snap_up(10, 5), 10);
    }
}

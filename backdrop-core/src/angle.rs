use core::f32::consts::{PI, TAU};

/// Fold an angle into `[0, 2π)`.
pub fn normalize_angle(angle: f32) -> f32 {
    let folded = angle.rem_euclid(TAU);
    // rem_euclid rounds tiny negative inputs up to exactly TAU
    if folded >= TAU {
        0.0
    } else {
        folded
    }
}

/// Signed smallest rotation taking `current` onto `target`, in `(-π, π]`.
pub fn angle_difference(current: f32, target: f32) -> f32 {
    let diff = normalize_angle(target - current);
    if diff > PI {
        diff - TAU
    } else {
        diff
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, Rng, SeedableRng};

    fn same_direction(a: f32, b: f32) -> bool {
        let d = normalize_angle(a - b);
        d < 1e-3 || TAU - d < 1e-3
    }

    #[test]
    fn test_normalize_angle_range() {
        let mut rng = StdRng::seed_from_u64(11);
        for _ in 0..1000 {
            let a = rng.gen_range(-100.0..100.0);
            let n = normalize_angle(a);
            assert!((0.0..TAU).contains(&n), "{a} -> {n}");
            assert_eq!(normalize_angle(n), n);
        }
        assert_eq!(normalize_angle(-1e-9), 0.0);
        assert_eq!(normalize_angle(TAU), 0.0);
    }

    #[test]
    fn test_angle_difference_is_shortest() {
        let mut rng = StdRng::seed_from_u64(12);
        for _ in 0..1000 {
            let current = rng.gen_range(0.0..TAU);
            let target = rng.gen_range(0.0..TAU);
            let diff = angle_difference(current, target);

            assert!(diff.abs() <= PI + 1e-6);
            assert!(same_direction(current + diff, target));
        }
    }

    #[test]
    fn test_angle_difference_across_zero() {
        let diff = angle_difference(TAU - 0.1, 0.1);
        assert!((diff - 0.2).abs() < 1e-5);

        let diff = angle_difference(0.1, TAU - 0.1);
        assert!((diff + 0.2).abs() < 1e-5);
    }
}

//! Bin search over sorted threshold ladders.
//!
//! Two lookups are provided:
//!
//! - [`nearest`] snaps a continuous value to the closest bin. It is used to map
//!   continuous steering commands onto the legal action menu.
//! - [`ceiling`] returns the first bin that is greater than or equal to the
//!   value. It assigns angles and lateral offsets to a fixed-width ladder.
//!
//! Both assume `bins` is sorted ascending. Neither ever produces NaN; an
//! out-of-range or NaN input lands on the nearest valid bin (or, for
//! [`ceiling`], the `None` sentinel).

use crate::{Error, Result};

/// Index of the first element of `bins` that is not less than `value`.
///
/// NaN compares false against everything, so it resolves to index 0.
fn lower_bound(bins: &[f64], value: f64) -> usize {
    bins.partition_point(|&bin| bin < value)
}

/// Index of the bin closest to `value`.
///
/// Values below the first bin map to index 0 and values above the last bin map
/// to the last index. When `value` sits exactly halfway between two bins the
/// upper bin wins.
///
/// Returns `None` only when `bins` is empty.
///
/// # Examples
///
/// ```
/// use pomdrive::discretizer::nearest_index;
///
/// let menu = [-1.0, -0.5, 0.0, 0.5, 1.0];
/// assert_eq!(nearest_index(&menu, 0.2), Some(2));
/// assert_eq!(nearest_index(&menu, 0.3), Some(3));
/// assert_eq!(nearest_index(&menu, -7.0), Some(0));
/// assert_eq!(nearest_index(&menu, 7.0), Some(4));
/// ```
pub fn nearest_index(bins: &[f64], value: f64) -> Option<usize> {
    if bins.is_empty() {
        return None;
    }
    let upper = lower_bound(bins, value);
    if upper == 0 {
        return Some(0);
    }
    if upper == bins.len() {
        return Some(bins.len() - 1);
    }
    let below = bins[upper - 1];
    let above = bins[upper];
    if (value - below).abs() < (value - above).abs() {
        Some(upper - 1)
    } else {
        Some(upper)
    }
}

/// Value of the bin closest to `value`. See [`nearest_index`].
pub fn nearest(bins: &[f64], value: f64) -> Option<f64> {
    nearest_index(bins, value).map(|idx| bins[idx])
}

/// Index of the smallest bin that is `>= value`, or `None` when every bin is
/// smaller than `value`.
///
/// Monotonic: `a <= b` implies `ceiling(bins, a) <= ceiling(bins, b)` with
/// `None` ordered after every index.
///
/// # Examples
///
/// ```
/// use pomdrive::discretizer::ceiling;
///
/// let ladder = [-1.0, 0.0, 1.0];
/// assert_eq!(ceiling(&ladder, -3.0), Some(0));
/// assert_eq!(ceiling(&ladder, 0.0), Some(1));
/// assert_eq!(ceiling(&ladder, 0.2), Some(2));
/// assert_eq!(ceiling(&ladder, 1.5), None);
/// ```
pub fn ceiling(bins: &[f64], value: f64) -> Option<usize> {
    let idx = lower_bound(bins, value);
    (idx < bins.len()).then_some(idx)
}

/// Value of the ceiling bin. See [`ceiling`].
pub fn ceiling_value(bins: &[f64], value: f64) -> Option<f64> {
    ceiling(bins, value).map(|idx| bins[idx])
}

/// Check that a bin ladder or action menu is usable.
///
/// # Errors
///
/// Returns [`Error::EmptyMenu`] if `bins` is empty, or
/// [`Error::UnsortedMenu`] if it is not strictly ascending or contains a
/// non-finite value.
pub fn validate_sorted(what: &str, bins: &[f64]) -> Result<()> {
    if bins.is_empty() {
        return Err(Error::EmptyMenu {
            what: what.to_string(),
        });
    }
    if let Some(index) = bins.iter().position(|bin| !bin.is_finite()) {
        return Err(Error::UnsortedMenu {
            what: what.to_string(),
            index,
        });
    }
    if let Some(index) = bins.windows(2).position(|pair| pair[0] >= pair[1]) {
        return Err(Error::UnsortedMenu {
            what: what.to_string(),
            index: index + 1,
        });
    }
    Ok(())
}

/// Evenly spaced heading-angle ladder spanning `[-π, π]`.
///
/// `count / 2` bins sit on each side of zero, so an odd `count` yields a
/// ladder symmetric around zero that ends exactly at `π`.
pub fn angle_ladder(count: usize) -> Vec<f64> {
    let half = (count / 2).max(1) as f64;
    let start = -((count / 2) as i64);
    (0..count as i64)
        .map(|i| (start + i) as f64 * (std::f64::consts::PI / half))
        .collect()
}

/// Lateral-offset ladder in lane-half-width units.
///
/// The first and last bins sit just outside `[-1, 1]` and catch the
/// out-of-lane region on either side; the `count - 2` remaining bins divide the
/// lane evenly.
pub fn offset_ladder(count: usize) -> Vec<f64> {
    let in_lane = count.saturating_sub(2);
    let half = (in_lane / 2).max(1) as f64;
    let start = -((in_lane / 2) as i64);
    let mut bins = Vec::with_capacity(count.max(2));
    bins.push(next_down(-1.0));
    bins.extend((0..in_lane as i64).map(|i| (start + i) as f64 / half));
    bins.push(next_up(1.0));
    bins.dedup();
    bins
}

fn next_up(value: f64) -> f64 {
    let bits = value.to_bits();
    if value >= 0.0 {
        f64::from_bits(bits + 1)
    } else {
        f64::from_bits(bits - 1)
    }
}

fn next_down(value: f64) -> f64 {
    -next_up(-value)
}

#[cfg(test)]
mod tests {
    use super::*;

    const MENU: [f64; 9] = [-1.0, -0.5, -0.25, -0.1, 0.0, 0.1, 0.25, 0.5, 1.0];

    #[test]
    fn nearest_returns_member_minimising_distance() {
        let mut value = -1.5;
        while value <= 1.5 {
            let bin = nearest(&MENU, value).unwrap();
            assert!(MENU.contains(&bin));
            let best = MENU
                .iter()
                .map(|b| (value - b).abs())
                .fold(f64::INFINITY, f64::min);
            assert!(((value - bin).abs() - best).abs() < 1e-12, "value {value}");
            value += 0.013;
        }
    }

    #[test]
    fn nearest_prefers_upper_bin_on_exact_tie() {
        assert_eq!(nearest(&[0.0, 1.0], 0.5), Some(1.0));
    }

    #[test]
    fn nearest_handles_nan_and_empty() {
        assert_eq!(nearest(&MENU, f64::NAN), Some(-1.0));
        assert_eq!(nearest(&[], 0.3), None);
    }

    #[test]
    fn ceiling_is_smallest_bin_not_below_value() {
        let mut value = -1.5;
        while value <= 1.5 {
            let expected = MENU.iter().position(|&b| b >= value);
            assert_eq!(ceiling(&MENU, value), expected, "value {value}");
            value += 0.017;
        }
    }

    #[test]
    fn lookups_are_monotonic() {
        let ladder = angle_ladder(11);
        let mut previous_nearest = 0;
        let mut previous_ceiling = Some(0);
        let mut value = -4.0;
        while value <= 4.0 {
            let n = nearest_index(&ladder, value).unwrap();
            assert!(n >= previous_nearest);
            previous_nearest = n;

            let c = ceiling(&ladder, value);
            match (previous_ceiling, c) {
                (Some(p), Some(c)) => assert!(c >= p),
                (None, Some(_)) => panic!("ceiling went back in range at {value}"),
                _ => {}
            }
            previous_ceiling = c;
            value += 0.01;
        }
    }

    #[test]
    fn angle_ladder_spans_pi() {
        let ladder = angle_ladder(101);
        assert_eq!(ladder.len(), 101);
        assert!((ladder[0] + std::f64::consts::PI).abs() < 1e-12);
        assert!((ladder[100] - std::f64::consts::PI).abs() < 1e-12);
        assert!(ladder[50].abs() < 1e-12);
        validate_sorted("angle ladder", &ladder).unwrap();
    }

    #[test]
    fn offset_ladder_brackets_the_lane() {
        let ladder = offset_ladder(13);
        assert_eq!(ladder.len(), 13);
        assert!(ladder[0] < -1.0);
        assert!(ladder[12] > 1.0);
        assert_eq!(ceiling(&ladder, 0.0), Some(6));
        assert_eq!(ceiling(&ladder, 1.2), None);
        validate_sorted("offset ladder", &ladder).unwrap();
    }

    #[test]
    fn validate_rejects_unsorted_and_empty() {
        assert!(matches!(
            validate_sorted("menu", &[]),
            Err(Error::EmptyMenu { .. })
        ));
        assert!(matches!(
            validate_sorted("menu", &[0.0, 1.0, 0.5]),
            Err(Error::UnsortedMenu { index: 2, .. })
        ));
        assert!(validate_sorted("menu", &MENU).is_ok());
    }
}

//! The approximate match predicate (spec §4.4): decides whether a probe
//! "covers" an aligned window of target sequence, and if so, which
//! sub-interval of that window it covers.

use crate::interval::Interval;

/// Given a candidate window (already aligned 1:1 against a probe slice of
/// the same length) and a mismatch budget, find the longest contiguous
/// stretch with at most `mismatches` mismatches, and judge it a cover if
/// that stretch is at least `lcf_thres` bases long (spec §4.4).
///
/// `window` and `probe_slice` must have equal length — both are already
/// the clipped, aligned region in [`crate::scanner::find_probe_covers_in_sequence`].
///
/// Returns the maximal covering stretch as an interval in `window`'s own
/// coordinates (`[0, window.len())`), or `None` if no stretch reaches
/// `lcf_thres`. A pure function of its inputs (spec §4.4, "Determinism").
pub fn longest_common_factor_cover(
    window: &[u8],
    probe_slice: &[u8],
    mismatches: usize,
    lcf_thres: usize,
) -> Option<Interval> {
    debug_assert_eq!(window.len(), probe_slice.len());
    let n = window.len();
    if n == 0 || lcf_thres == 0 {
        return None;
    }

    // Classic "longest subarray with at most K bad elements" two-pointer
    // sweep: expand `right`, and whenever the mismatch budget inside
    // [left, right) is exceeded, shrink from `left`. Track the longest
    // window seen; ties keep the leftmost (first found) of that length,
    // which makes the result a pure, deterministic function of the inputs.
    let mut left = 0usize;
    let mut mismatch_count = 0usize;
    let mut best_start = 0usize;
    let mut best_len = 0usize;

    for right in 0..n {
        if window[right] != probe_slice[right] {
            mismatch_count += 1;
        }
        while mismatch_count > mismatches {
            if window[left] != probe_slice[left] {
                mismatch_count -= 1;
            }
            left += 1;
        }
        let len = right + 1 - left;
        if len > best_len {
            best_len = len;
            best_start = left;
        }
    }

    if best_len >= lcf_thres {
        Some(Interval::new(best_start as u64, (best_start + best_len) as u64))
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_match_covers() {
        let cover = longest_common_factor_cover(b"ACGTACGT", b"ACGTACGT", 0, 6);
        assert_eq!(cover, Some(Interval::new(0, 8)));
    }

    #[test]
    fn test_too_short_for_threshold() {
        // whole window matches, but it's only 5bp and threshold is 6
        let cover = longest_common_factor_cover(b"ACGTA", b"ACGTA", 0, 6);
        assert_eq!(cover, None);
    }

    #[test]
    fn test_mismatches_within_budget() {
        // ACGTACGT vs ACGAACGT differs at position 3 only
        let cover = longest_common_factor_cover(b"ACGTACGT", b"ACGAACGT", 1, 8);
        assert_eq!(cover, Some(Interval::new(0, 8)));
    }

    #[test]
    fn test_too_many_mismatches_shrinks_window() {
        // Two mismatches (index 2 and index 5) are too far apart for any
        // <=1-mismatch window to span both; the longest valid window is
        // [3, 10), which contains only the mismatch at index 5.
        let window = b"AAAAAAAAAA";
        let probe = b"AACAACAAAA";
        let cover = longest_common_factor_cover(window, probe, 1, 4).unwrap();
        assert_eq!(cover, Interval::new(3, 10));
    }

    #[test]
    fn test_no_window_fits_budget() {
        // A mismatch on every other base: no stretch of 4 fits a 1-mismatch
        // budget.
        let window = b"ACACACAC";
        let probe = b"AGAGAGAG";
        assert_eq!(longest_common_factor_cover(window, probe, 1, 4), None);
    }

    #[test]
    fn test_zero_length_window() {
        assert_eq!(longest_common_factor_cover(b"", b"", 0, 1), None);
    }

    #[test]
    fn test_deterministic_for_fixed_inputs() {
        let a = longest_common_factor_cover(b"ACGTTTGG", b"ACGTAAGG", 1, 4);
        let b = longest_common_factor_cover(b"ACGTTTGG", b"ACGTAAGG", 1, 4);
        assert_eq!(a, b);
    }
}

//! The coverage scanner (spec §4.5): slides the k-mer map over a target
//! sequence, applies the approximate-match predicate at each candidate
//! alignment, and collects the resulting intervals per probe.

use std::sync::Arc;

use rustc_hash::FxHashMap;

use crate::config::AnalysisParams;
use crate::error::CoreError;
use crate::interval::{merge_overlapping, Interval};
use crate::kmer_map::KmerProbeMap;
use crate::predicate::longest_common_factor_cover;
use crate::probe::Probe;

/// Scan `sequence` against `kmer_map`, returning every probe's cover
/// intervals in `sequence`'s own coordinates.
///
/// Algorithm (spec §4.5):
/// 1. Walk `i` over `0 ..= len(sequence) - k`; look up `sequence[i..i+k]` in
///    `kmer_map`.
/// 2. For each candidate `(probe, offset)`, the implied alignment start is
///    `a = i - offset` (as a signed quantity — `offset` may exceed `i`).
///    Clip the aligned window to `[max(0, a), min(len(sequence), a +
///    len(probe)))` and run the predicate over it.
/// 3. A predicate hit is translated back into sequence coordinates by
///    adding the *clipped window's own start*, not the possibly-negative
///    `a` — when the alignment runs off the left edge of the sequence
///    (`a < 0`), the predicate's interval is already relative to the
///    clipped window, whose first base is `sequence[0]`, not
///    `sequence[a]`.
/// 4. If `merge_overlapping_intervals` is set, each probe's interval list
///    is canonicalized; otherwise duplicates and overlaps are preserved
///    (needed for depth calculations — spec §4.6).
///
/// If `sequence` is shorter than `k`, no positions are walked and every
/// probe maps to an empty interval list; this is logged at debug level
/// rather than treated as an error, since an analyzer run over many short
/// contigs is a normal occurrence.
///
/// Returns [`CoreError::InconsistentInput`] if `kmer_map` was built for a
/// different `k` than `params.k` (spec §7: "a k-mer map built for a
/// different `k` than the scanner uses ... raised eagerly"). Every caller
/// in this crate builds the map and the params together from the same
/// `k`, so this only fires when a caller hand-assembles a mismatched pair.
pub fn find_probe_covers_in_sequence(
    sequence: &[u8],
    kmer_map: &KmerProbeMap,
    params: &AnalysisParams,
    merge_overlapping_intervals: bool,
) -> Result<FxHashMap<Arc<Probe>, Vec<Interval>>, CoreError> {
    let k = params.k;
    if kmer_map.k() != k {
        return Err(CoreError::InconsistentInput(format!(
            "k-mer map was built for k={}, but params.k={k}",
            kmer_map.k()
        )));
    }

    let mut hits: FxHashMap<Arc<Probe>, Vec<Interval>> = FxHashMap::default();

    if sequence.len() < k {
        log::debug!(
            "sequence length {} is shorter than k={k}; no positions to scan",
            sequence.len()
        );
        return Ok(hits);
    }

    let seq_len = sequence.len();
    for i in 0..=(seq_len - k) {
        let window_kmer = &sequence[i..i + k];
        for candidate in kmer_map.candidates(window_kmer) {
            let probe = &candidate.probe;
            let Some((clipped_start, clipped_end, probe_start_in_window)) =
                clip_alignment(seq_len, probe.len(), i, candidate.offset)
            else {
                continue;
            };

            let seq_window = &sequence[clipped_start..clipped_end];
            let probe_slice = match probe
                .as_bytes()
                .get(probe_start_in_window..probe_start_in_window + seq_window.len())
            {
                Some(slice) => slice,
                None => continue,
            };

            if let Some(cover) =
                longest_common_factor_cover(seq_window, probe_slice, params.mismatches, params.lcf_thres)
            {
                let translated =
                    Interval::new(clipped_start as u64 + cover.start, clipped_start as u64 + cover.end);
                hits.entry(Arc::clone(probe)).or_default().push(translated);
            }
        }
    }

    if merge_overlapping_intervals {
        for intervals in hits.values_mut() {
            *intervals = merge_overlapping(std::mem::take(intervals));
        }
    }

    Ok(hits)
}

/// Given a candidate alignment (the k-mer match at sequence position `i`
/// came from `offset` inside the probe), compute the clipped window's
/// `(start, end)` in sequence coordinates and the probe's own start index
/// within that window. Returns `None` if the clipped window is empty.
///
/// The implied alignment start `a = i - offset` is signed: `offset` can
/// exceed `i` when the probe would start before the sequence begins. The
/// window is clipped to `[max(0, a), min(seq_len, a + probe_len))`, and
/// the probe's own start within that window is `clipped_start - a`, which
/// is `0` exactly when `a >= 0` and positive otherwise.
fn clip_alignment(seq_len: usize, probe_len: usize, i: usize, offset: usize) -> Option<(usize, usize, usize)> {
    let a = i as i64 - offset as i64;
    let clipped_start = a.max(0) as usize;
    let clipped_end = ((a + probe_len as i64).max(0) as usize).min(seq_len);
    if clipped_start >= clipped_end {
        return None;
    }
    let probe_start_in_window = (clipped_start as i64 - a) as usize;
    Some((clipped_start, clipped_end, probe_start_in_window))
}

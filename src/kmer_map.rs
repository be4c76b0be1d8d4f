//! The randomized k-mer probe map (spec §4.3): a probabilistic candidate
//! filter mapping short k-mers to the `(probe, offset)` pairs they appear
//! in, built by sampling offsets within each probe with a seeded RNG so
//! the result is reproducible (spec §4.3, "The randomization source must
//! be deterministic given an explicit seed").

use std::collections::HashMap;
use std::sync::Arc;

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use rustc_hash::FxHashMap;

use crate::error::CoreError;
use crate::probe::Probe;

/// A `(probe, offset)` pair: the k-mer at this offset inside this probe
/// matched exactly (spec §3: "for every entry `(km, (p, off))`,
/// `p[off:off+k] == km`").
#[derive(Debug, Clone)]
pub struct ProbeHit {
    pub probe: Arc<Probe>,
    pub offset: usize,
}

/// Maps a k-mer (as raw bytes) to the probes it was sampled from.
///
/// Keyed with `rustc_hash::FxHashMap`, matching the teacher's choice of
/// `rustc-hash` for hot-path hash maps over byte keys (`src/parallel.rs`,
/// `src/index.rs` use the std `HashMap`, but the crate already depends on
/// `rustc-hash`; this is the one genuinely hot lookup path in the core, so
/// it gets the faster hasher).
pub struct KmerProbeMap {
    k: usize,
    buckets: FxHashMap<Box<[u8]>, Vec<ProbeHit>>,
}

impl KmerProbeMap {
    /// All candidate hits for a given k-mer, or an empty slice if the
    /// k-mer was never sampled from any probe.
    #[inline]
    pub fn candidates(&self, kmer: &[u8]) -> &[ProbeHit] {
        self.buckets.get(kmer).map(Vec::as_slice).unwrap_or(&[])
    }

    /// The k-mer length this map was built for.
    #[inline]
    pub fn k(&self) -> usize {
        self.k
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    pub fn num_kmers(&self) -> usize {
        self.buckets.len()
    }
}

/// First-seen-order deduplication of a probe list (spec §8 scenario S1):
/// a literal duplicate probe string is dropped, keeping only its first
/// occurrence, with every other probe's relative order preserved.
///
/// Input `[ATCGTCGCGG, ATCGTAGCGG, ATCGTCACGG, ATCGTAGCGG, ATTGTCGCGG,
/// ATCGTCGCGG]` becomes `[ATCGTCGCGG, ATCGTAGCGG, ATCGTCACGG,
/// ATTGTCGCGG]`. Ported from `catch`'s `DuplicateFilter`
/// (`catch/filter/tests/test_duplicate_filter.py`), which the original
/// pipeline runs as an input-normalization step before a probe set is
/// ever indexed — applied here at the start of [`build_kmer_map`] so a
/// probe list containing verbatim duplicates isn't sampled, and thereby
/// over-weighted, more than once.
pub fn dedup_probes_preserving_order(probes: &[Probe]) -> Vec<Probe> {
    let mut seen: std::collections::HashSet<&Probe> = std::collections::HashSet::with_capacity(probes.len());
    let mut out = Vec::with_capacity(probes.len());
    for probe in probes {
        if seen.insert(probe) {
            out.push(probe.clone());
        }
    }
    out
}

/// Build a [`KmerProbeMap`] over `probes` (spec §4.3).
///
/// `probes` is first deduplicated in first-seen order
/// ([`dedup_probes_preserving_order`], spec §8 scenario S1). For each
/// remaining probe of length `L`: if `L <= k`, the whole probe is
/// inserted as its own single k-mer at offset 0. Otherwise,
/// `num_kmers_per_probe` offsets in `[0, L-k]` are drawn uniformly at
/// random *with replacement* using a `SmallRng` seeded from `seed`, so
/// two calls with the same `(probes, k, num_kmers_per_probe, seed)`
/// produce byte-identical maps (spec's testable property 8).
///
/// Duplicate `(probe, offset)` pairs sampled for the same k-mer are
/// deduplicated (spec §4.3: "the underlying container must deduplicate
/// pairs").
pub fn build_kmer_map(
    probes: &[Probe],
    k: usize,
    num_kmers_per_probe: usize,
    seed: u64,
) -> Result<KmerProbeMap, CoreError> {
    if k == 0 {
        return Err(CoreError::InvalidParameter {
            name: "k".to_string(),
            value: "0".to_string(),
            reason: "k-mer length must be at least 1".to_string(),
        });
    }
    if num_kmers_per_probe == 0 {
        return Err(CoreError::InvalidParameter {
            name: "num_kmers_per_probe".to_string(),
            value: "0".to_string(),
            reason: "at least one k-mer must be sampled per probe".to_string(),
        });
    }

    let probes = dedup_probes_preserving_order(probes);
    let probes = probes.as_slice();

    let mut rng = SmallRng::seed_from_u64(seed);
    // (kmer bytes, probe index, offset) triples, deduplicated per-kmer at
    // the end; probes are referenced by index into `probes` until the
    // final pass so we only ever clone the `Arc<Probe>` handle once per
    // probe, not once per sampled offset.
    let mut raw: HashMap<Box<[u8]>, Vec<(usize, usize)>> = HashMap::new();

    for (probe_idx, probe) in probes.iter().enumerate() {
        let len = probe.len();
        if len == 0 {
            continue;
        }
        if len <= k {
            if let Some(kmer) = probe.kmer_at(0, len) {
                raw.entry(kmer.into()).or_default().push((probe_idx, 0));
            }
            continue;
        }

        let max_offset = len - k; // inclusive upper bound
        for _ in 0..num_kmers_per_probe {
            let offset = rng.gen_range(0..=max_offset);
            if let Some(kmer) = probe.kmer_at(offset, k) {
                raw.entry(kmer.into()).or_default().push((probe_idx, offset));
            }
        }
    }

    let probe_handles: Vec<Arc<Probe>> = probes.iter().cloned().map(Arc::new).collect();

    let mut buckets: FxHashMap<Box<[u8]>, Vec<ProbeHit>> = FxHashMap::default();
    buckets.reserve(raw.len());
    for (kmer, mut pairs) in raw {
        pairs.sort_unstable();
        pairs.dedup();
        let hits = pairs
            .into_iter()
            .map(|(probe_idx, offset)| ProbeHit {
                probe: Arc::clone(&probe_handles[probe_idx]),
                offset,
            })
            .collect();
        buckets.insert(kmer, hits);
    }

    Ok(KmerProbeMap { k, buckets })
}

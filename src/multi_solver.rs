//! Rank-stratified multi-universe greedy set cover (spec §4.8), ported from
//! the original `set_cover.py::approx_multiuniverse`.

use std::collections::BTreeMap;
use std::fmt::Debug;
use std::hash::Hash;

use rayon::prelude::*;
use rustc_hash::FxHashSet;

use crate::config::{validate_cost, validate_fraction};
use crate::error::CoreError;

/// A single set's membership across every universe it touches:
/// `universe_id → elements of that universe this set contains`.
pub type MultiUniverseSets<SetId, UniverseId, Elem> = BTreeMap<SetId, BTreeMap<UniverseId, FxHashSet<Elem>>>;

/// Greedily choose a subset of `sets` that meets every universe's
/// coverage target, considering sets in ascending rank order and
/// advancing to the next rank only once the current rank can no longer
/// reduce any universe's deficit (spec §4.8).
///
/// When `costs`/`universe_p`/`ranks` is `None` entirely, every set/universe
/// gets the default (`1.0` cost, `1.0` coverage fraction, rank `0`). When
/// one is `Some`, it must instead cover every set/universe id exactly —
/// a `Some` map missing an entry is an [`CoreError::InvalidParameter`],
/// not a silent per-entry default (spec §7).
pub fn approx_cover_multi<SetId, UniverseId, Elem>(
    sets: &MultiUniverseSets<SetId, UniverseId, Elem>,
    costs: Option<&BTreeMap<SetId, f64>>,
    universe_p: Option<&BTreeMap<UniverseId, f64>>,
    ranks: Option<&BTreeMap<SetId, i64>>,
) -> Result<Vec<SetId>, CoreError>
where
    SetId: Ord + Clone + Hash + Eq + Send + Sync + Debug,
    UniverseId: Ord + Clone + Hash + Eq + Send + Sync + Debug,
    Elem: Hash + Eq + Clone + Send + Sync,
{
    // Build every universe id up front: `universe_p`'s missing-entry check
    // below needs the full set of universe ids, not just `sets.keys()`.
    let mut universe_ids: Vec<UniverseId> = Vec::new();
    for memberships in sets.values() {
        for u in memberships.keys() {
            if !universe_ids.contains(u) {
                universe_ids.push(u.clone());
            }
        }
    }
    universe_ids.sort();

    // Every missing-entry check below matches the original
    // `approx_multiuniverse`'s eager validation (spec §7: "missing entry
    // in costs/universe_p/ranks ... raised at call boundary before work
    // begins") — a partial map silently defaulting any set/universe not
    // in it would let (for example) a set absent from `ranks` default to
    // rank 0 even when the smallest rank actually present is higher,
    // making that set permanently unreachable once `current_rank` starts
    // above 0.
    if let Some(costs) = costs {
        for (id, &c) in costs.iter() {
            validate_cost(&format!("costs[{id:?}]"), c)?;
        }
        for id in sets.keys() {
            if !costs.contains_key(id) {
                return Err(CoreError::InvalidParameter {
                    name: "costs".to_string(),
                    value: format!("{id:?}"),
                    reason: "costs is missing a value for this set".to_string(),
                });
            }
        }
    }
    if let Some(up) = universe_p {
        for (u, &p) in up.iter() {
            validate_fraction(&format!("universe_p[{u:?}]"), p)?;
        }
        for u in &universe_ids {
            if !up.contains_key(u) {
                return Err(CoreError::InvalidParameter {
                    name: "universe_p".to_string(),
                    value: format!("{u:?}"),
                    reason: "universe_p is missing a value for this universe".to_string(),
                });
            }
        }
    }
    if let Some(r) = ranks {
        for id in sets.keys() {
            if !r.contains_key(id) {
                return Err(CoreError::InvalidParameter {
                    name: "ranks".to_string(),
                    value: format!("{id:?}"),
                    reason: "ranks is missing a value for this set".to_string(),
                });
            }
        }
    }

    let cost_of = |id: &SetId| costs.and_then(|c| c.get(id)).copied().unwrap_or(1.0);
    let rank_of = |id: &SetId| ranks.and_then(|r| r.get(id)).copied().unwrap_or(0);
    let p_of = |u: &UniverseId| universe_p.and_then(|up| up.get(u)).copied().unwrap_or(1.0);

    let mut universes: BTreeMap<UniverseId, FxHashSet<Elem>> = BTreeMap::new();
    for u in &universe_ids {
        let mut elems: FxHashSet<Elem> = FxHashSet::default();
        for memberships in sets.values() {
            if let Some(s) = memberships.get(u) {
                elems.extend(s.iter().cloned());
            }
        }
        universes.insert(u.clone(), elems);
    }

    // Per-universe coverage target: ceil(p_u * |U_u|), computed via the
    // same floor-of-difference discipline as the single-universe solver
    // (spec §9): `ceil(x) == n - floor(n - x)` avoids a separate rounding
    // rule for the ceiling case.
    let mut deficit: BTreeMap<UniverseId, u64> = BTreeMap::new();
    for (u, elems) in &universes {
        let n = elems.len() as f64;
        let p = p_of(u);
        let target = n - (n - p * n).floor();
        deficit.insert(u.clone(), target.max(0.0) as u64);
    }

    // A memoized per-universe intersection cache: `cache[u][set_id] =
    // |sets[set_id][u] ∩ universes[u]|`. Invalidated wholesale for a
    // universe whenever that universe shrinks (spec §9, "Memoization
    // invalidation" — partial invalidation is unsound unless each entry
    // tracks a version).
    let mut cache: BTreeMap<UniverseId, BTreeMap<SetId, u64>> = BTreeMap::new();

    let mut chosen: Vec<SetId> = Vec::new();
    let mut unchosen: Vec<SetId> = sets.keys().cloned().collect();
    let mut current_rank = ranks.and_then(|r| r.values().min().copied()).unwrap_or(0);

    loop {
        if deficit.values().all(|&d| d == 0) {
            break;
        }

        let rank_candidates: Vec<&SetId> =
            unchosen.iter().filter(|id| rank_of(id) == current_rank).collect();

        if rank_candidates.is_empty() {
            let next_rank = unchosen
                .iter()
                .map(rank_of)
                .filter(|&r| r > current_rank)
                .min();
            match next_rank {
                Some(r) => {
                    current_rank = r;
                    continue;
                }
                None => {
                    let offending = deficit.iter().find(|(_, &d)| d > 0);
                    if let Some((u, &needed)) = offending {
                        return Err(CoreError::CoverageInfeasible {
                            universe: format!("{u:?}"),
                            needed,
                        });
                    }
                    break;
                }
            }
        }

        // Each entry: (set_id, needed, ratio, freshly-computed intersections
        // to merge into the cache once the scan is done). `cache` is only
        // read here, never written, so the parallel scan never races with
        // the cache mutation that happens after it (spec §5).
        let scored: Vec<(SetId, u64, f64, Vec<(UniverseId, u64)>)> = rank_candidates
            .par_iter()
            .filter_map(|&id| {
                let memberships = &sets[id];
                let mut needed = 0u64;
                let mut fresh = Vec::new();
                for (u, elems) in memberships {
                    let universe_elems = match universes.get(u) {
                        Some(e) => e,
                        None => continue,
                    };
                    let d = *deficit.get(u).unwrap_or(&0);
                    if d == 0 {
                        continue;
                    }
                    let intersection = match cache.get(u).and_then(|c| c.get(id)) {
                        Some(&cached) => cached,
                        None => {
                            let count = elems.intersection(universe_elems).count() as u64;
                            fresh.push((u.clone(), count));
                            count
                        }
                    };
                    needed += d.min(intersection);
                }
                if needed == 0 {
                    None
                } else {
                    Some((id.clone(), needed, cost_of(id) / needed as f64, fresh))
                }
            })
            .collect();

        for (id, _, _, fresh) in &scored {
            for (u, count) in fresh {
                cache.entry(u.clone()).or_default().insert(id.clone(), *count);
            }
        }

        if scored.is_empty() {
            let next_rank = unchosen
                .iter()
                .map(rank_of)
                .filter(|&r| r > current_rank)
                .min();
            match next_rank {
                Some(r) => {
                    current_rank = r;
                    continue;
                }
                None => {
                    let offending = deficit.iter().find(|(_, &d)| d > 0);
                    if let Some((u, &needed)) = offending {
                        return Err(CoreError::CoverageInfeasible {
                            universe: format!("{u:?}"),
                            needed,
                        });
                    }
                    break;
                }
            }
        }

        // `rank_candidates` iterates `unchosen` in its existing order,
        // which is always kept sorted by `SetId` (see the removal below),
        // so `min_by` ties break by set id, matching the single-universe
        // solver's deterministic tie-break (spec §5).
        let (winner_id, ..) = scored
            .into_iter()
            .min_by(|a, b| a.2.partial_cmp(&b.2).expect("ratios are never NaN"))
            .expect("scored is non-empty");

        let memberships = sets[&winner_id].clone();
        let mut shrunk_universes: Vec<UniverseId> = Vec::new();
        for (u, winner_elems) in &memberships {
            let Some(universe_elems) = universes.get_mut(u) else { continue };
            let before = universe_elems.len();
            universe_elems.retain(|e| !winner_elems.contains(e));
            if universe_elems.len() != before {
                shrunk_universes.push(u.clone());
            }
            let d = deficit.entry(u.clone()).or_insert(0);
            let covered = before - universe_elems.len();
            *d = d.saturating_sub(covered as u64);
        }
        for u in &shrunk_universes {
            cache.remove(u);
        }

        chosen.push(winner_id.clone());
        unchosen.retain(|id| id != &winner_id);
        unchosen.sort();

        log::info!("multi-universe solver: {} set(s) chosen so far", chosen.len());
    }

    Ok(chosen)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(elems: &[i32]) -> FxHashSet<i32> {
        elems.iter().copied().collect()
    }

    // Scenario S6: ranks force A (rank 0, covers {1,2}) before B (rank 1,
    // covers {1,2,3,4,5}), even though B alone covers more cheaply.
    #[test]
    fn test_s6_ranks_exhaust_lower_rank_first() {
        let mut sets: MultiUniverseSets<&str, &str, i32> = BTreeMap::new();
        let mut a = BTreeMap::new();
        a.insert("U", set(&[1, 2]));
        sets.insert("A", a);
        let mut b = BTreeMap::new();
        b.insert("U", set(&[1, 2, 3, 4, 5]));
        sets.insert("B", b);

        let mut ranks = BTreeMap::new();
        ranks.insert("A", 0);
        ranks.insert("B", 1);

        let chosen = approx_cover_multi(&sets, None, None, Some(&ranks)).unwrap();
        assert_eq!(chosen, vec!["A", "B"]);
    }

    #[test]
    fn test_single_universe_full_cover_matches_single_solver_shape() {
        let mut sets: MultiUniverseSets<&str, &str, i32> = BTreeMap::new();
        let mut ua = BTreeMap::new();
        ua.insert("U", set(&[1, 2, 3]));
        sets.insert("A", ua);
        let mut ub = BTreeMap::new();
        ub.insert("U", set(&[3, 4, 5]));
        sets.insert("B", ub);

        let chosen = approx_cover_multi(&sets, None, None, None).unwrap();
        assert_eq!(chosen.len(), 2);
    }

    // A universe's target is always computed from the union of the sets
    // that mention it, so well-formed input is always feasible; the
    // `CoverageInfeasible` branch only guards against rank exhaustion
    // (replacing what the source left as an unguarded index error).
    #[test]
    fn test_universe_with_no_contributing_sets_is_vacuous() {
        let mut sets: MultiUniverseSets<&str, &str, i32> = BTreeMap::new();
        let mut a = BTreeMap::new();
        a.insert("U", set(&[1, 2]));
        sets.insert("A", a);

        let mut universe_p = BTreeMap::new();
        universe_p.insert("U", 1.0);

        let chosen = approx_cover_multi(&sets, None, Some(&universe_p), None).unwrap();
        assert_eq!(chosen, vec!["A"]);
    }

    #[test]
    fn test_deterministic_across_runs() {
        let mut sets: MultiUniverseSets<&str, &str, i32> = BTreeMap::new();
        let mut ua = BTreeMap::new();
        ua.insert("U", set(&[1, 2, 3]));
        sets.insert("A", ua);
        let mut ub = BTreeMap::new();
        ub.insert("U", set(&[3, 4, 5]));
        sets.insert("B", ub);
        let mut uc = BTreeMap::new();
        uc.insert("U", set(&[5, 6, 7]));
        sets.insert("C", uc);

        let first = approx_cover_multi(&sets, None, None, None).unwrap();
        let second = approx_cover_multi(&sets, None, None, None).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_rejects_costs_missing_an_entry() {
        let mut sets: MultiUniverseSets<&str, &str, i32> = BTreeMap::new();
        sets.insert("A", BTreeMap::from([("U", set(&[1, 2]))]));
        sets.insert("B", BTreeMap::from([("U", set(&[3, 4]))]));

        let mut costs = BTreeMap::new();
        costs.insert("A", 1.0); // "B" has no entry

        let err = approx_cover_multi(&sets, Some(&costs), None, None).unwrap_err();
        assert!(matches!(err, CoreError::InvalidParameter { .. }));
    }

    #[test]
    fn test_rejects_universe_p_missing_an_entry() {
        let mut sets: MultiUniverseSets<&str, &str, i32> = BTreeMap::new();
        sets.insert("A", BTreeMap::from([("U1", set(&[1, 2])), ("U2", set(&[3, 4]))]));

        let mut universe_p = BTreeMap::new();
        universe_p.insert("U1", 1.0); // "U2" has no entry

        let err = approx_cover_multi(&sets, None, Some(&universe_p), None).unwrap_err();
        assert!(matches!(err, CoreError::InvalidParameter { .. }));
    }

    #[test]
    fn test_rejects_ranks_missing_an_entry() {
        let mut sets: MultiUniverseSets<&str, &str, i32> = BTreeMap::new();
        sets.insert("A", BTreeMap::from([("U", set(&[1, 2]))]));
        sets.insert("B", BTreeMap::from([("U", set(&[3, 4]))]));

        let mut ranks = BTreeMap::new();
        ranks.insert("A", 0); // "B" has no entry

        let err = approx_cover_multi(&sets, None, None, Some(&ranks)).unwrap_err();
        assert!(matches!(err, CoreError::InvalidParameter { .. }));
    }

    // A partial `ranks` map that omits a low-priority set would otherwise
    // let that set silently default to rank 0 while `current_rank` starts
    // above 0 (since it's seeded from the ranks actually present),
    // permanently hiding the set from consideration; this is exactly the
    // bug the missing-entry check above prevents.
    #[test]
    fn test_partial_ranks_would_have_stranded_a_defaulted_set() {
        let mut sets: MultiUniverseSets<&str, &str, i32> = BTreeMap::new();
        sets.insert("A", BTreeMap::from([("U", set(&[1, 2, 3]))]));
        sets.insert("B", BTreeMap::from([("U", set(&[1, 2, 3, 4, 5]))]));

        let mut ranks = BTreeMap::new();
        ranks.insert("B", 1); // "A" has no entry; would default to rank 0

        assert!(approx_cover_multi(&sets, None, None, Some(&ranks)).is_err());
    }
}

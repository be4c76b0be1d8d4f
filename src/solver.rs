//! Greedy weighted partial set cover over a single universe (spec §4.7),
//! ported from the original `set_cover.py::approx`.

use std::collections::BTreeMap;
use std::fmt::Debug;
use std::hash::Hash;

use rayon::prelude::*;
use rustc_hash::FxHashSet;

use crate::config::{validate_cost, validate_fraction};
use crate::error::CoreError;

/// Greedily choose a subset of `sets` whose union covers at least `⌈p·|U|⌉`
/// elements of `U = ⋃ sets.values()`, minimizing (approximately) the total
/// cost of the chosen sets.
///
/// `sets` is a `BTreeMap` rather than a hash map deliberately: `SetId` is
/// required to implement `Ord`, and iteration proceeds in that sorted
/// order so that ratio ties are broken the same way regardless of
/// insertion order or thread scheduling (spec §5, §9 "Bug candidate").
///
/// `costs` defaults every set's cost to `1.0` when absent or when a
/// particular id has no entry. `p` defaults to `1.0`.
pub fn approx_cover<SetId, Elem>(
    sets: &BTreeMap<SetId, FxHashSet<Elem>>,
    costs: Option<&BTreeMap<SetId, f64>>,
    p: f64,
) -> Result<Vec<SetId>, CoreError>
where
    SetId: Ord + Clone + Hash + Eq + Send + Sync + Debug,
    Elem: Hash + Eq + Clone + Send + Sync,
{
    validate_fraction("p", p)?;
    if let Some(costs) = costs {
        for (id, &cost) in costs.iter() {
            validate_cost(&format!("costs[{id:?}]"), cost)?;
        }
        // When a partial costs map is supplied, every set must have an
        // entry (spec §7: "missing entry in costs ... raised at call
        // boundary before work begins"); a silent default would let a
        // typo'd or stale costs map quietly change which sets are cheap.
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

    let cost_of = |id: &SetId| -> f64 { costs.and_then(|c| c.get(id)).copied().unwrap_or(1.0) };

    let mut universe: FxHashSet<Elem> = FxHashSet::default();
    for elems in sets.values() {
        universe.extend(elems.iter().cloned());
    }
    let universe_size = universe.len() as f64;

    // Floor is taken on the expression `|U| - p*|U|`, never on `(1-p)*|U|`
    // (spec §9, "Floor-of-near-integer"): the latter can round to one more
    // or less than intended when `|U|*(1-p)` lands representably just
    // below an integer.
    let max_uncovered = (universe_size - p * universe_size).floor() as i64;
    let max_uncovered = max_uncovered.max(0) as u64;

    let mut chosen = Vec::new();
    let mut remaining = universe.len() as u64 - max_uncovered.min(universe.len() as u64);
    let mut unchosen: Vec<&SetId> = sets.keys().collect();

    while remaining > 0 {
        let candidates: Vec<(usize, u64, f64)> = unchosen
            .par_iter()
            .enumerate()
            .filter_map(|(idx, id)| {
                let elems = &sets[*id];
                let covered = elems.intersection(&universe).count() as u64;
                let needed = remaining.min(covered);
                if needed == 0 {
                    return None;
                }
                let ratio = cost_of(id) / needed as f64;
                Some((idx, needed, ratio))
            })
            .collect();

        if candidates.is_empty() {
            // Every remaining universe element is only removed from
            // `universe` when its owning set is chosen, so an unchosen set
            // containing it must still exist whenever `remaining > 0`.
            // Reaching here means that invariant broke, not that coverage
            // is genuinely infeasible (a single, fixed universe is always
            // coverable by its own constituent sets).
            return Err(CoreError::InvariantViolation(
                "set cover: remaining > 0 but no unchosen set intersects the universe".to_string(),
            ));
        }

        // `unchosen` is index-parallel with the filter above and was built
        // by iterating the BTreeMap's sorted key order, so `min_by`
        // (which returns the first minimal element) breaks ties
        // deterministically by `SetId` order, satisfying spec §5's
        // "sorting candidates by set_id before the min-reduction".
        let winner = candidates
            .into_iter()
            .min_by(|a, b| a.2.partial_cmp(&b.2).expect("ratios are never NaN"))
            .expect("candidates is non-empty");

        let winner_idx = winner.0;
        let winner_id = unchosen[winner_idx].clone();
        let winner_elems = &sets[&winner_id];

        universe.retain(|e| !winner_elems.contains(e));
        chosen.push(winner_id);
        unchosen.remove(winner_idx);

        remaining = (universe.len() as u64).saturating_sub(max_uncovered.min(universe.len() as u64));
    }

    Ok(chosen)
}

//! k-nearest entity selection.
//!
//! Entities are ranked by an effective distance: the planar distance
//! when valid, `+inf` otherwise. Ties keep the lower original index.
//! A [`Selection`] always has exactly `k` slots; a slot is `None` only
//! when the candidate set holds fewer than `k` entities.

use vmax_core::ExtractError;

/// Ordered selection slots.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Selection {
    slots: Vec<Option<usize>>,
}

impl Selection {
    /// Wrap precomputed slots.
    pub fn from_slots(slots: Vec<Option<usize>>) -> Self {
        Self { slots }
    }

    /// Slots in output order.
    pub fn slots(&self) -> &[Option<usize>] {
        &self.slots
    }

    /// Number of slots.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Whether there are no slots.
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Number of padding slots.
    pub fn padding(&self) -> usize {
        self.slots.iter().filter(|s| s.is_none()).count()
    }
}

/// Distance used for ranking.
pub fn effective_distance(distance: f32, valid: bool) -> f32 {
    if valid {
        distance
    } else {
        f32::INFINITY
    }
}

/// Rank `candidates` by effective distance and keep the first `k`.
fn rank(candidates: impl Iterator<Item = usize>, distances: &[f32], valid: &[bool], k: usize) -> Vec<Option<usize>> {
    let mut order: Vec<usize> = candidates.collect();
    // Stable: equal distances keep index order.
    order.sort_by(|&a, &b| {
        effective_distance(distances[a], valid[a]).total_cmp(&effective_distance(distances[b], valid[b]))
    });
    let mut slots: Vec<Option<usize>> = order.into_iter().take(k).map(Some).collect();
    slots.resize(k, None);
    slots
}

fn check_lengths(distances: &[f32], valid: &[bool]) -> Result<(), ExtractError> {
    if distances.len() != valid.len() {
        return Err(ExtractError::ShapeMismatch {
            reason: format!(
                "{} distances but {} validity bits",
                distances.len(),
                valid.len()
            ),
        });
    }
    Ok(())
}

/// Select the `k` nearest entities.
pub fn select(distances: &[f32], valid: &[bool], k: usize) -> Result<Selection, ExtractError> {
    check_lengths(distances, valid)?;
    Ok(Selection::from_slots(rank(0..distances.len(), distances, valid, k)))
}

/// Select among an explicit candidate subset, in the same ranking.
pub fn select_among(
    candidates: &[usize],
    distances: &[f32],
    valid: &[bool],
    k: usize,
) -> Result<Selection, ExtractError> {
    check_lengths(distances, valid)?;
    if let Some(&bad) = candidates.iter().find(|&&c| c >= distances.len()) {
        return Err(ExtractError::ShapeMismatch {
            reason: format!("candidate {bad} out of range for {} entities", distances.len()),
        });
    }
    Ok(Selection::from_slots(rank(candidates.iter().copied(), distances, valid, k)))
}

/// Select `anchor` into slot 0, then the `k` nearest other entities.
///
/// The result has `k + 1` slots.
pub fn select_anchored(
    distances: &[f32],
    valid: &[bool],
    k: usize,
    anchor: usize,
) -> Result<Selection, ExtractError> {
    check_lengths(distances, valid)?;
    if anchor >= distances.len() {
        return Err(ExtractError::InvalidState {
            reason: format!("anchor {anchor} out of range for {} entities", distances.len()),
        });
    }
    let others = (0..distances.len()).filter(|&i| i != anchor);
    let mut slots = Vec::with_capacity(k + 1);
    slots.push(Some(anchor));
    slots.extend(rank(others, distances, valid, k));
    Ok(Selection::from_slots(slots))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nearest_valid_first() {
        let d = [5.0, 1.0, 3.0, 0.5];
        let v = [true, true, true, false];
        let s = select(&d, &v, 3).unwrap();
        assert_eq!(s.slots(), &[Some(1), Some(2), Some(0)]);
    }

    #[test]
    fn invalid_entities_fill_remaining_slots() {
        let d = [1.0, 2.0, 3.0];
        let v = [false, true, false];
        let s = select(&d, &v, 3).unwrap();
        assert_eq!(s.slots(), &[Some(1), Some(0), Some(2)]);
        assert_eq!(s.padding(), 0);
    }

    #[test]
    fn ties_keep_lower_index() {
        let d = [2.0, 1.0, 1.0, 1.0];
        let v = [true; 4];
        let s = select(&d, &v, 2).unwrap();
        assert_eq!(s.slots(), &[Some(1), Some(2)]);
    }

    #[test]
    fn short_candidate_set_is_padded() {
        let s = select(&[1.0], &[true], 3).unwrap();
        assert_eq!(s.slots(), &[Some(0), None, None]);
        assert_eq!(s.padding(), 2);
    }

    #[test]
    fn anchor_takes_slot_zero_even_when_far() {
        let d = [100.0, 1.0, 2.0];
        let v = [true, true, true];
        let s = select_anchored(&d, &v, 2, 0).unwrap();
        assert_eq!(s.slots(), &[Some(0), Some(1), Some(2)]);
    }

    #[test]
    fn anchor_is_never_repeated() {
        let d = [3.0, 0.0, 2.0];
        let v = [true, true, true];
        let s = select_anchored(&d, &v, 2, 1).unwrap();
        assert_eq!(s.slots(), &[Some(1), Some(2), Some(0)]);
    }

    #[test]
    fn anchor_out_of_range_is_error() {
        assert!(select_anchored(&[1.0], &[true], 1, 1).is_err());
    }

    #[test]
    fn length_mismatch_is_error() {
        assert!(select(&[1.0, 2.0], &[true], 1).is_err());
    }

    #[test]
    fn select_among_ignores_non_candidates() {
        let d = [0.0, 1.0, 2.0, 3.0];
        let v = [true; 4];
        let s = select_among(&[2, 3], &d, &v, 3).unwrap();
        assert_eq!(s.slots(), &[Some(2), Some(3), None]);
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        fn entities() -> impl Strategy<Value = (Vec<f32>, Vec<bool>)> {
            (0usize..24).prop_flat_map(|n| {
                (
                    proptest::collection::vec(0.0f32..200.0, n),
                    proptest::collection::vec(any::<bool>(), n),
                )
            })
        }

        proptest! {
            #[test]
            fn selection_is_distinct_sorted_and_counts_valid(
                (d, v) in entities(),
                k in 0usize..30,
            ) {
                let s = select(&d, &v, k).unwrap();
                prop_assert_eq!(s.len(), k);

                let chosen: Vec<usize> = s.slots().iter().flatten().copied().collect();
                let mut unique = chosen.clone();
                unique.sort_unstable();
                unique.dedup();
                prop_assert_eq!(unique.len(), chosen.len());
                prop_assert_eq!(chosen.len(), k.min(d.len()));

                let eff: Vec<f32> = chosen.iter().map(|&i| effective_distance(d[i], v[i])).collect();
                prop_assert!(eff.windows(2).all(|w| w[0] <= w[1]));

                let valid_total = v.iter().filter(|&&b| b).count();
                let valid_chosen = chosen.iter().filter(|&&i| v[i]).count();
                prop_assert_eq!(valid_chosen, k.min(valid_total));
            }

            #[test]
            fn anchored_selection_never_duplicates_anchor(
                (d, v) in entities(),
                k in 0usize..30,
                seed in any::<usize>(),
            ) {
                prop_assume!(!d.is_empty());
                let anchor = seed % d.len();
                let s = select_anchored(&d, &v, k, anchor).unwrap();
                prop_assert_eq!(s.len(), k + 1);
                prop_assert_eq!(s.slots()[0], Some(anchor));
                prop_assert!(s.slots()[1..].iter().all(|slot| *slot != Some(anchor)));
            }
        }
    }
}

//! Minimal reordering of position-ordered collections
//!
//! The LMS places a resource whose `position` is set to `p` at index
//! `p - 1`, shifting the others. The planner keeps the longest run of
//! resources that are already in desired relative order where they are and
//! moves each remaining one directly behind its desired predecessor, so an
//! ordered collection needs no writes and a single displaced resource needs
//! exactly one.

/// One position write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Move {
    pub id: String,
    /// 1-based target position.
    pub position: usize,
}

/// Plan the position writes that turn `current` (ids in position order)
/// into `desired` order.
///
/// Ids in `desired` that are not in `current` are ignored. Ids only in
/// `current` keep their place relative to the resources that do not move.
pub fn plan_moves(current: &[String], desired: &[String]) -> Vec<Move> {
    let mut wanted: Vec<&String> = Vec::with_capacity(desired.len());
    for id in desired {
        if current.contains(id) && !wanted.contains(&id) {
            wanted.push(id);
        }
    }

    let indices: Vec<usize> = wanted
        .iter()
        .filter_map(|id| current.iter().position(|c| c == *id))
        .collect();
    let keep = longest_increasing(&indices);

    let mut order: Vec<&String> = current.iter().collect();
    let mut moves = Vec::new();
    for (k, id) in wanted.iter().enumerate() {
        if keep[k] {
            continue;
        }
        let Some(from) = order.iter().position(|o| o == id) else {
            continue;
        };
        order.remove(from);
        let to = match k.checked_sub(1) {
            Some(prev) => order
                .iter()
                .position(|o| *o == wanted[prev])
                .map_or(0, |i| i + 1),
            None => 0,
        };
        order.insert(to, *id);
        if to != from {
            moves.push(Move {
                id: (*id).clone(),
                position: to + 1,
            });
        }
    }
    moves
}

/// Mark the members of one longest strictly increasing subsequence.
fn longest_increasing(values: &[usize]) -> Vec<bool> {
    // tails[len] = index into `values` of the smallest tail of a run of len+1
    let mut tails: Vec<usize> = Vec::new();
    let mut previous: Vec<Option<usize>> = vec![None; values.len()];
    for (i, &value) in values.iter().enumerate() {
        let slot = tails.partition_point(|&t| values[t] < value);
        previous[i] = slot.checked_sub(1).map(|s| tails[s]);
        if slot == tails.len() {
            tails.push(i);
        } else {
            tails[slot] = i;
        }
    }

    let mut keep = vec![false; values.len()];
    let mut cursor = tails.last().copied();
    while let Some(i) = cursor {
        keep[i] = true;
        cursor = previous[i];
    }
    keep
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    fn ids(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    /// Apply moves the way the LMS does.
    fn apply(current: &[String], moves: &[Move]) -> Vec<String> {
        let mut order = current.to_vec();
        for m in moves {
            let from = order.iter().position(|o| *o == m.id).unwrap();
            let item = order.remove(from);
            order.insert((m.position - 1).min(order.len()), item);
        }
        order
    }

    #[test]
    fn ordered_needs_no_moves() {
        let current = ids(&["a", "b", "c"]);
        assert!(plan_moves(&current, &current).is_empty());
    }

    #[test]
    fn first_to_last_is_one_move() {
        let moves = plan_moves(&ids(&["a", "b", "c"]), &ids(&["b", "c", "a"]));
        assert_eq!(moves, vec![Move { id: "a".into(), position: 3 }]);
    }

    #[test]
    fn last_to_first_is_one_move() {
        let moves = plan_moves(&ids(&["a", "b", "c"]), &ids(&["c", "a", "b"]));
        assert_eq!(moves, vec![Move { id: "c".into(), position: 1 }]);
    }

    #[test]
    fn unknown_ids_are_ignored() {
        let moves = plan_moves(&ids(&["a", "b"]), &ids(&["x", "b", "a"]));
        assert_eq!(apply(&ids(&["a", "b"]), &moves), ids(&["b", "a"]));
        assert_eq!(moves.len(), 1);
    }

    #[test]
    fn extras_keep_their_place() {
        let current = ids(&["a", "extra", "b", "c"]);
        let moves = plan_moves(&current, &ids(&["a", "c", "b"]));
        let result = apply(&current, &moves);
        let relative: Vec<_> = result.iter().filter(|i| *i != "extra").cloned().collect();
        assert_eq!(relative, ids(&["a", "c", "b"]));
        assert_eq!(moves.len(), 1);
    }

    proptest! {
        #[test]
        fn moves_reach_desired_order(perm in Just((0..8usize).collect::<Vec<_>>()).prop_shuffle()) {
            let current: Vec<String> = (0..8).map(|i| format!("m{i}")).collect();
            let desired: Vec<String> = perm.iter().map(|i| format!("m{i}")).collect();

            let moves = plan_moves(&current, &desired);

            prop_assert_eq!(apply(&current, &moves), desired);
            prop_assert!(moves.len() < current.len());
        }
    }
}

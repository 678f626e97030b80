//! Pareto dominance utilities for multi-objective optimization.
//!
//! Provides fast non-dominated sorting (Deb et al., 2002), used by
//! [`Study::best_trials`](crate::Study::best_trials), and the
//! epsilon-nondominated archive behind the
//! [`ParetoSelector`](crate::ParetoSelector) tie-break.

use crate::types::Direction;

/// Returns `true` if solution `a` Pareto-dominates solution `b`.
///
/// A solution dominates another if it is at least as good in all objectives
/// and strictly better in at least one, respecting the given directions.
#[allow(clippy::module_name_repetitions)]
pub(crate) fn dominates(a: &[f64], b: &[f64], directions: &[Direction]) -> bool {
    debug_assert_eq!(a.len(), b.len());
    debug_assert_eq!(a.len(), directions.len());

    let mut strictly_better = false;
    for ((&av, &bv), dir) in a.iter().zip(b.iter()).zip(directions.iter()) {
        let better = match dir {
            Direction::Minimize => av < bv,
            Direction::Maximize => av > bv,
        };
        let worse = match dir {
            Direction::Minimize => av > bv,
            Direction::Maximize => av < bv,
        };
        if worse {
            return false;
        }
        if better {
            strictly_better = true;
        }
    }
    strictly_better
}

/// Fast non-dominated sorting (Deb et al., 2002).
///
/// Returns `Vec<Vec<usize>>` where `fronts[0]` is the Pareto front,
/// each inner vec contains indices into `values`.
///
/// Complexity: O(M * N^2) where M = objectives, N = solutions.
pub(crate) fn fast_non_dominated_sort(
    values: &[Vec<f64>],
    directions: &[Direction],
) -> Vec<Vec<usize>> {
    let n = values.len();
    if n == 0 {
        return Vec::new();
    }

    // S_p: set of solutions dominated by p
    let mut dominated_by: Vec<Vec<usize>> = vec![Vec::new(); n];
    // n_p: domination count for p
    let mut domination_count: Vec<usize> = vec![0; n];

    for i in 0..n {
        for j in (i + 1)..n {
            if dominates(&values[i], &values[j], directions) {
                dominated_by[i].push(j);
                domination_count[j] += 1;
            } else if dominates(&values[j], &values[i], directions) {
                dominated_by[j].push(i);
                domination_count[i] += 1;
            }
        }
    }

    let mut fronts: Vec<Vec<usize>> = Vec::new();
    let mut current_front: Vec<usize> = (0..n).filter(|&i| domination_count[i] == 0).collect();

    while !current_front.is_empty() {
        let mut next_front: Vec<usize> = Vec::new();
        for &p in &current_front {
            for &q in &dominated_by[p] {
                domination_count[q] -= 1;
                if domination_count[q] == 0 {
                    next_front.push(q);
                }
            }
        }
        fronts.push(current_front);
        current_front = next_front;
    }

    fronts
}

/// Epsilon-nondominated archive (Laumanns et al., 2002).
///
/// Each point is mapped onto a grid of epsilon boxes, `floor(v / eps)` per
/// objective after turning maximized objectives into minimized ones. Points
/// are inserted in order:
///
/// - a point whose box is dominated by an archived box is discarded;
/// - archived points whose boxes are dominated by the new box are evicted;
/// - within a shared box the point nearer the box's lower corner is kept,
///   the newcomer winning exact ties.
///
/// An epsilon of zero (or less) disables boxing on that axis, which falls
/// back to plain dominance there. Returns the surviving indices in archive
/// order.
pub(crate) fn epsilon_nondominated(
    points: &[Vec<f64>],
    epsilons: &[f64],
    directions: &[Direction],
) -> Vec<usize> {
    debug_assert_eq!(epsilons.len(), directions.len());

    let oriented = |v: &[f64]| -> Vec<f64> {
        v.iter()
            .zip(directions)
            .map(|(&x, dir)| match dir {
                Direction::Minimize => x,
                Direction::Maximize => -x,
            })
            .collect()
    };
    let boxed = |v: &[f64]| -> Vec<f64> {
        v.iter()
            .zip(epsilons)
            .map(|(&x, &eps)| if eps > 0.0 { (x / eps).floor() } else { x })
            .collect()
    };
    let corner_distance = |v: &[f64], b: &[f64]| -> f64 {
        v.iter()
            .zip(b)
            .zip(epsilons)
            .map(|((&x, &bx), &eps)| {
                let corner = if eps > 0.0 { bx * eps } else { x };
                (x - corner).powi(2)
            })
            .sum()
    };

    // (index, oriented objectives, box)
    let mut archive: Vec<(usize, Vec<f64>, Vec<f64>)> = Vec::new();

    'points: for (idx, point) in points.iter().enumerate() {
        let objectives = oriented(point);
        let ebox = boxed(&objectives);

        let mut ai = 0;
        while ai < archive.len() {
            let abox = &archive[ai].2;
            let mut archived_better = false;
            let mut new_better = false;
            for (a, s) in abox.iter().zip(&ebox) {
                if a < s {
                    archived_better = true;
                } else if a > s {
                    new_better = true;
                }
            }

            match (archived_better, new_better) {
                // Mutually non-dominated boxes.
                (true, true) => ai += 1,
                (true, false) => continue 'points,
                (false, true) => {
                    archive.remove(ai);
                }
                (false, false) => {
                    let archived_dist = corner_distance(&archive[ai].1, &ebox);
                    let new_dist = corner_distance(&objectives, &ebox);
                    if archived_dist < new_dist {
                        continue 'points;
                    }
                    archive.remove(ai);
                }
            }
        }

        archive.push((idx, objectives, ebox));
    }

    archive.into_iter().map(|(idx, _, _)| idx).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dominates_basic() {
        let dirs = [Direction::Minimize, Direction::Minimize];
        assert!(dominates(&[1.0, 1.0], &[2.0, 2.0], &dirs));
        assert!(!dominates(&[2.0, 2.0], &[1.0, 1.0], &dirs));
        // Equal does not dominate
        assert!(!dominates(&[1.0, 1.0], &[1.0, 1.0], &dirs));
    }

    #[test]
    fn test_dominates_incomparable() {
        let dirs = [Direction::Minimize, Direction::Minimize];
        assert!(!dominates(&[1.0, 3.0], &[3.0, 1.0], &dirs));
        assert!(!dominates(&[3.0, 1.0], &[1.0, 3.0], &dirs));
    }

    #[test]
    fn test_dominates_maximize() {
        let dirs = [Direction::Maximize, Direction::Minimize];
        // a = (5, 1) vs b = (3, 2): a is better in both
        assert!(dominates(&[5.0, 1.0], &[3.0, 2.0], &dirs));
        assert!(!dominates(&[3.0, 2.0], &[5.0, 1.0], &dirs));
    }

    #[test]
    fn test_nds_known() {
        let values = vec![
            vec![1.0, 5.0], // front 0
            vec![5.0, 1.0], // front 0
            vec![3.0, 3.0], // front 0 (non-dominated)
            vec![4.0, 4.0], // front 1 (dominated by #2)
            vec![6.0, 6.0], // front 2
        ];
        let dirs = [Direction::Minimize, Direction::Minimize];
        let fronts = fast_non_dominated_sort(&values, &dirs);

        assert_eq!(fronts.len(), 3);
        let mut f0 = fronts[0].clone();
        f0.sort_unstable();
        assert_eq!(f0, vec![0, 1, 2]);
        assert_eq!(fronts[1], vec![3]);
        assert_eq!(fronts[2], vec![4]);
    }

    #[test]
    fn test_eps_keeps_distinct_boxes() {
        let points = vec![vec![0.9, 0.3], vec![0.5, 0.1]];
        let dirs = [Direction::Maximize, Direction::Minimize];
        // Boxes far apart and mutually non-dominated: both survive.
        let kept = epsilon_nondominated(&points, &[0.1, 0.1], &dirs);
        assert_eq!(kept, vec![0, 1]);
    }

    #[test]
    fn test_eps_box_dominance_discards() {
        // Second point is better on both axes once boxed.
        let points = vec![vec![0.5, 0.5], vec![0.9, 0.1]];
        let dirs = [Direction::Maximize, Direction::Minimize];
        let kept = epsilon_nondominated(&points, &[0.1, 0.1], &dirs);
        assert_eq!(kept, vec![1]);
    }

    #[test]
    fn test_eps_same_box_keeps_closer_to_corner() {
        // Both land in the same box with a coarse grid.
        let points = vec![vec![0.52, 0.12], vec![0.58, 0.11]];
        let dirs = [Direction::Maximize, Direction::Minimize];
        let kept = epsilon_nondominated(&points, &[1.0, 1.0], &dirs);
        assert_eq!(kept.len(), 1);
        // Minimized coordinates: (-0.52, 0.12) vs (-0.58, 0.11), box corner
        // (-1, 0); the second point is nearer.
        assert_eq!(kept, vec![1]);
    }

    #[test]
    fn test_eps_zero_epsilon_is_plain_dominance() {
        let points = vec![vec![0.5, 0.2], vec![0.6, 0.3], vec![0.4, 0.1]];
        let dirs = [Direction::Maximize, Direction::Minimize];
        let kept = epsilon_nondominated(&points, &[0.0, 0.0], &dirs);
        assert_eq!(kept, vec![0, 1, 2]);
    }
}

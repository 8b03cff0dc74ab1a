//! Random row sampling
//!
//! Seeded draws use `rand`'s `StdRng` and, without replacement, a full
//! Fisher-Yates shuffle (`SliceRandom::shuffle`) of the row indices followed
//! by truncation. The shuffle always runs, so asking for every row still
//! returns them in random order.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

use crate::table::Table;

/// Largest sample a single call may return
pub const MAX_SAMPLE: usize = 1000;

/// Draw `n` rows (clamped to `[1, MAX_SAMPLE]`).
///
/// Without replacement the result holds at most `n_rows` distinct rows.
pub fn sample_rows(table: &Table, n: usize, seed: Option<u64>, replace: bool) -> Table {
    let n = n.clamp(1, MAX_SAMPLE);
    let total = table.n_rows();
    if total == 0 {
        return table.head(0);
    }
    let mut rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let indices: Vec<usize> = if replace {
        (0..n).map(|_| rng.gen_range(0..total)).collect()
    } else {
        let mut all: Vec<usize> = (0..total).collect();
        all.shuffle(&mut rng);
        all.truncate(n.min(total));
        all
    };
    table.take_rows(&indices)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;
    use std::collections::HashSet;

    fn table() -> Table {
        Table::from_csv_bytes(b"id,x,y,z\n1,0,0,0\n2,1,1,1\n3,2,2,2\n4,3,3,3\n5,4,4,4\n").unwrap()
    }

    fn ids(t: &Table) -> Vec<Value> {
        t.rows().iter().map(|r| r[0].clone()).collect()
    }

    #[test]
    fn test_seed_is_reproducible() {
        let t = table();
        let a = sample_rows(&t, 5, Some(7), false);
        let b = sample_rows(&t, 5, Some(7), false);
        assert_eq!(ids(&a), ids(&b));
        assert_eq!(a.n_rows(), 5);
    }

    #[test]
    fn test_without_replacement_is_unique() {
        let t = table();
        let s = sample_rows(&t, 50, None, false);
        assert_eq!(s.n_rows(), 5);
        let unique: HashSet<String> = ids(&s).iter().map(|v| v.to_string()).collect();
        assert_eq!(unique.len(), 5);
    }

    #[test]
    fn test_full_sample_is_shuffled() {
        let t = table();
        // Across a handful of seeds at least one full draw must differ from
        // input order.
        let original = ids(&t);
        let shuffled = (0..8u64).any(|seed| ids(&sample_rows(&t, 5, Some(seed), false)) != original);
        assert!(shuffled);
    }

    #[test]
    fn test_with_replacement_and_clamp() {
        let t = table();
        let s = sample_rows(&t, 12, Some(1), true);
        assert_eq!(s.n_rows(), 12);
        let zero = sample_rows(&t, 0, Some(1), false);
        assert_eq!(zero.n_rows(), 1);
    }

    #[test]
    fn test_unseeded_draws_are_valid_and_vary() {
        let mut csv = String::from("id,x\n");
        for i in 0..50 {
            csv.push_str(&format!("{},{}\n", i, i * 2));
        }
        let t = Table::from_csv_bytes(csv.as_bytes()).unwrap();
        let population: HashSet<String> = ids(&t).iter().map(|v| v.to_string()).collect();

        let draws: Vec<Vec<Value>> = (0..10).map(|_| ids(&sample_rows(&t, 5, None, false))).collect();
        for draw in &draws {
            assert_eq!(draw.len(), 5);
            let unique: HashSet<String> = draw.iter().map(|v| v.to_string()).collect();
            assert_eq!(unique.len(), 5);
            assert!(unique.is_subset(&population));
        }
        // Ten identical 5-of-50 draws would mean the entropy source is pinned
        assert!(draws.iter().any(|d| d != &draws[0]));

        let with_replacement = sample_rows(&t, 20, None, true);
        assert_eq!(with_replacement.n_rows(), 20);
        assert!(ids(&with_replacement)
            .iter()
            .all(|v| population.contains(&v.to_string())));
    }
}

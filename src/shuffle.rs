//! Card number generation and unique-set building.
//!
//! The RNG is injected so callers can run seeded (reproducible exports,
//! deterministic tests) or against the process RNG. Same seed, same cards.

use crate::grid::{Card, CardSet, GridSize};
use rand::Rng;
use std::collections::HashSet;

/// Produce one card: a uniformly random permutation of `1..=grid.cells()`.
///
/// Uses the downward Fisher-Yates shuffle, picking a uniform `j in [0, i]`
/// for each `i` from the last index to 1. Every permutation is equally
/// likely; uniformity is a correctness requirement here, not a nicety.
pub fn generate_card<R: Rng>(grid: GridSize, rng: &mut R) -> Card {
    let mut cells: Vec<u8> = (1..=grid.cells() as u8).collect();
    for i in (1..cells.len()).rev() {
        let j = rng.gen_range(0..=i);
        cells.swap(i, j);
    }
    Card::from_cells(cells)
}

/// Build exactly `count` pairwise-distinct cards.
///
/// Candidates are drawn from [`generate_card`] and deduplicated against the
/// ordered cell sequences seen so far; duplicates are discarded and redrawn.
/// Requires `count >= 1`; bounds normalization is the caller's job.
///
/// The retry loop has no iteration cap. For the supported grids the space of
/// permutations (>= 16!) dwarfs the maximum request of 100 cards, so
/// collisions are vanishingly rare, but this function must not be used with
/// `count` anywhere near `cells()!`.
pub fn build_unique_set<R: Rng>(grid: GridSize, count: usize, rng: &mut R) -> CardSet {
    debug_assert!(count >= 1, "caller must normalize count to at least 1");

    let mut seen: HashSet<Vec<u8>> = HashSet::with_capacity(count);
    let mut cards = Vec::with_capacity(count);
    while cards.len() < count {
        let card = generate_card(grid, rng);
        if seen.insert(card.cells().to_vec()) {
            cards.push(card);
        }
    }
    CardSet::new(grid, cards)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn assert_permutation(card: &Card, grid: GridSize) {
        assert_eq!(card.cells().len(), grid.cells());
        let mut sorted: Vec<u8> = card.cells().to_vec();
        sorted.sort_unstable();
        let expected: Vec<u8> = (1..=grid.cells() as u8).collect();
        assert_eq!(sorted, expected);
    }

    #[test]
    fn generated_card_is_a_permutation_for_every_grid() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        for grid in GridSize::ALL {
            let card = generate_card(grid, &mut rng);
            assert_permutation(&card, grid);
        }
    }

    #[test]
    fn same_seed_reproduces_the_same_card() {
        let mut a = ChaCha8Rng::seed_from_u64(42);
        let mut b = ChaCha8Rng::seed_from_u64(42);
        assert_eq!(
            generate_card(GridSize::Five, &mut a),
            generate_card(GridSize::Five, &mut b)
        );
    }

    #[test]
    fn consecutive_draws_share_values_not_order() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let first = generate_card(GridSize::Six, &mut rng);
        let second = generate_card(GridSize::Six, &mut rng);
        assert_permutation(&first, GridSize::Six);
        assert_permutation(&second, GridSize::Six);
        // 36! permutations; two consecutive identical draws would indicate
        // the RNG was not advanced at all.
        assert_ne!(first, second);
    }

    #[test]
    fn unique_set_returns_exactly_n_distinct_cards() {
        let mut rng = ChaCha8Rng::seed_from_u64(99);
        let set = build_unique_set(GridSize::Five, 20, &mut rng);
        assert_eq!(set.len(), 20);

        let mut seen = HashSet::new();
        for card in &set {
            assert_permutation(card, GridSize::Five);
            assert!(seen.insert(card.cells().to_vec()), "duplicate card in set");
        }
    }

    #[test]
    fn unique_set_handles_boundary_counts() {
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        assert_eq!(build_unique_set(GridSize::Six, 1, &mut rng).len(), 1);

        // 16! >> 100, so the smallest grid still terminates at the cap.
        let set = build_unique_set(GridSize::Four, 100, &mut rng);
        assert_eq!(set.len(), 100);
        let distinct: HashSet<Vec<u8>> =
            set.iter().map(|card| card.cells().to_vec()).collect();
        assert_eq!(distinct.len(), 100);
    }

    #[test]
    fn shuffle_spreads_values_across_positions() {
        // Loose uniformity check: over many seeded shuffles of a 4x4 card,
        // each value should land in each position roughly 1/16 of the time.
        const RUNS: usize = 3200;
        let mut rng = ChaCha8Rng::seed_from_u64(1234);
        let cells = GridSize::Four.cells();
        let mut counts = vec![vec![0usize; cells]; cells];
        for _ in 0..RUNS {
            let card = generate_card(GridSize::Four, &mut rng);
            for (pos, value) in card.cells().iter().enumerate() {
                counts[pos][(*value - 1) as usize] += 1;
            }
        }
        let expected = RUNS / cells; // 200
        for pos in 0..cells {
            for value in 0..cells {
                let n = counts[pos][value];
                assert!(
                    n > expected / 2 && n < expected * 2,
                    "value {} at position {} occurred {} times (expected ~{})",
                    value + 1,
                    pos,
                    n,
                    expected
                );
            }
        }
    }
}

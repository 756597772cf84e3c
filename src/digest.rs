//! Deterministic state fingerprinting.
//!
//! The fingerprint is a 64-bit XOR fold of per-entity pseudo-random
//! values derived once, at game construction, from a fixed digest seed.
//! XOR is commutative, so the fold is insensitive to iteration order —
//! required because cloned replicas may enumerate collections
//! differently.
//!
//! Entities with a bounded population (cells, players) get their base
//! values from precomputed tables; open-ended values (stack depths,
//! counter magnitudes, token codes) are folded in through a fixed
//! bijective mixer keyed by the same seed.

use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::board::CellId;
use crate::core::PlayerId;

/// Seed for the table stream. Fixed across games so that digests of
/// identical positions are comparable between sessions.
const TABLE_SEED: u64 = 64_000;

fn splitmix64(mut z: u64) -> u64 {
    z = z.wrapping_add(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

/// Precomputed per-entity digest values.
#[derive(Clone, Debug)]
pub struct DigestTables {
    cell_keys: Vec<u64>,
    player_keys: Vec<u64>,
    salt: u64,
}

impl DigestTables {
    /// Build tables for a board of `cell_count` cells and
    /// `player_count` players.
    #[must_use]
    pub fn new(cell_count: usize, player_count: usize) -> Self {
        let mut rng = ChaCha8Rng::seed_from_u64(TABLE_SEED);
        let cell_keys = (0..cell_count).map(|_| rng.next_u64()).collect();
        let player_keys = (0..player_count).map(|_| rng.next_u64()).collect();
        let salt = rng.next_u64();
        Self {
            cell_keys,
            player_keys,
            salt,
        }
    }

    /// Base value of a cell.
    #[must_use]
    pub fn cell_key(&self, cell: CellId) -> u64 {
        self.cell_keys[cell.index()]
    }

    /// Base value of a player.
    #[must_use]
    pub fn player_key(&self, player: PlayerId) -> u64 {
        self.player_keys[player.index()]
    }

    /// Fold an ordered tuple of values into one digest contribution.
    ///
    /// The fold chains the mixer, so `mix(&[a, b])` and `mix(&[b, a])`
    /// differ — order *within* one contribution matters (a stack is not
    /// a set), while contributions themselves combine by XOR and stay
    /// order-independent.
    #[must_use]
    pub fn mix(&self, parts: &[u64]) -> u64 {
        let mut acc = self.salt;
        for &p in parts {
            acc = splitmix64(acc ^ p);
        }
        acc
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tables_deterministic() {
        let a = DigestTables::new(10, 4);
        let b = DigestTables::new(10, 4);
        for i in 0..10 {
            assert_eq!(a.cell_key(CellId(i)), b.cell_key(CellId(i)));
        }
        for p in 0..4 {
            assert_eq!(
                a.player_key(PlayerId::new(p)),
                b.player_key(PlayerId::new(p))
            );
        }
        assert_eq!(a.mix(&[1, 2, 3]), b.mix(&[1, 2, 3]));
    }

    #[test]
    fn test_keys_distinct() {
        let t = DigestTables::new(64, 8);
        let mut seen = std::collections::HashSet::new();
        for i in 0..64 {
            assert!(seen.insert(t.cell_key(CellId(i))));
        }
        for p in 0..8 {
            assert!(seen.insert(t.player_key(PlayerId::new(p))));
        }
    }

    #[test]
    fn test_mix_is_order_sensitive() {
        let t = DigestTables::new(1, 1);
        assert_ne!(t.mix(&[1, 2]), t.mix(&[2, 1]));
        assert_ne!(t.mix(&[0]), t.mix(&[0, 0]));
    }

    #[test]
    fn test_xor_fold_is_order_independent() {
        let t = DigestTables::new(4, 2);
        let contributions = [t.mix(&[1]), t.mix(&[2]), t.mix(&[3])];
        let forward = contributions.iter().fold(0u64, |acc, c| acc ^ c);
        let reverse = contributions.iter().rev().fold(0u64, |acc, c| acc ^ c);
        assert_eq!(forward, reverse);
    }
}

//! Privilege-based conflict resolution.
//!
//! In simultaneous phases each replica provisionally accepts local
//! moves before confirmation propagates, so two players can pick up or
//! drop onto the same exclusive resource inside a short real-time
//! window. Resolution must converge identically on every replica
//! without a central arbiter and without message-ordering guarantees.
//!
//! The tie-breaker is the *privilege rank*: a total order over players
//! recomputed at fixed checkpoints (the start of each play sub-phase),
//! which is ordinary replicated state — never arrival order. Given the
//! same two conflicting submissions, every replica computes the same
//! winner no matter which arrived first.
//!
//! A secondary time-window check refuses to resolve "conflicts" whose
//! timestamps are too far apart to be the same race; those are stale,
//! unrelated actions. The window is a tunable, not a protocol
//! guarantee.

use serde::{Deserialize, Serialize};

use crate::core::PlayerId;

/// Outcome of resolving one conflict.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Resolution {
    /// The incoming actor outranks the holder: the holder's in-flight
    /// action is forcibly rolled back and the incoming action proceeds.
    Override,
    /// The incoming actor is outranked (or the conflict is stale): the
    /// incoming action is silently abandoned with no board mutation.
    Ignore,
    /// Neither side's rank could be determined — an internal invariant
    /// violation. The action is abandoned and the event logged.
    Error,
}

/// The privilege order: index is rank, rank 0 is highest priority.
///
/// Wraps a plain `Vec<PlayerId>` so rank queries read as intent.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrivilegeOrder {
    order: Vec<PlayerId>,
}

impl PrivilegeOrder {
    /// Build from an explicit order (setup shuffles this).
    #[must_use]
    pub fn new(order: Vec<PlayerId>) -> Self {
        Self { order }
    }

    /// The player holding a given rank.
    #[must_use]
    pub fn at_rank(&self, rank: usize) -> PlayerId {
        self.order[rank]
    }

    /// The rank a player holds, or `None` for an unknown player —
    /// which callers must treat as [`Resolution::Error`].
    #[must_use]
    pub fn rank_of(&self, player: PlayerId) -> Option<usize> {
        self.order.iter().position(|&p| p == player)
    }

    /// Number of ranked players.
    #[must_use]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// The player ranked immediately after `player`, wrapping to rank 0.
    #[must_use]
    pub fn next_after(&self, player: PlayerId) -> Option<PlayerId> {
        let rank = self.rank_of(player)?;
        Some(self.order[(rank + 1) % self.order.len()])
    }

    /// Iterate players in rank order.
    pub fn iter(&self) -> impl Iterator<Item = PlayerId> + '_ {
        self.order.iter().copied()
    }

    /// Recompute the order at a checkpoint.
    ///
    /// Players sort descending by their standing value (the variant's
    /// ranking resource); the previous rank breaks ties, so recomputing
    /// is deterministic on every replica.
    pub fn recompute(&mut self, standing: impl Fn(PlayerId) -> u32) {
        let prev = self.order.clone();
        self.order.sort_by(|&a, &b| {
            standing(b).cmp(&standing(a)).then_with(|| {
                let ra = prev.iter().position(|&p| p == a);
                let rb = prev.iter().position(|&p| p == b);
                ra.cmp(&rb)
            })
        });
    }
}

/// Decide a conflict between an incoming action and the holder of an
/// in-flight claim.
///
/// Pure: depends only on the privilege order and the two submission
/// timestamps, all of which are replica-visible state.
#[must_use]
pub fn resolve(
    order: &PrivilegeOrder,
    incoming: PlayerId,
    holder: PlayerId,
    incoming_at_ms: u64,
    holder_at_ms: u64,
    window_ms: u64,
) -> Resolution {
    let (Some(incoming_rank), Some(holder_rank)) =
        (order.rank_of(incoming), order.rank_of(holder))
    else {
        return Resolution::Error;
    };

    // Live timestamps further apart than the window are not the same
    // race; refuse to resolve rather than roll back settled state.
    if incoming_at_ms != 0
        && holder_at_ms != 0
        && incoming_at_ms.abs_diff(holder_at_ms) > window_ms
    {
        return Resolution::Ignore;
    }

    if incoming_rank < holder_rank {
        Resolution::Override
    } else {
        Resolution::Ignore
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn order3() -> PrivilegeOrder {
        PrivilegeOrder::new(vec![PlayerId(2), PlayerId(0), PlayerId(1)])
    }

    #[test]
    fn test_rank_queries() {
        let o = order3();
        assert_eq!(o.rank_of(PlayerId(2)), Some(0));
        assert_eq!(o.rank_of(PlayerId(1)), Some(2));
        assert_eq!(o.rank_of(PlayerId(9)), None);
        assert_eq!(o.at_rank(0), PlayerId(2));
        assert_eq!(o.next_after(PlayerId(1)), Some(PlayerId(2)));
        assert_eq!(o.next_after(PlayerId(2)), Some(PlayerId(0)));
    }

    #[test]
    fn test_higher_rank_overrides() {
        let o = order3();
        // Player 2 holds rank 0 and beats player 0 (rank 1).
        assert_eq!(
            resolve(&o, PlayerId(2), PlayerId(0), 100, 200, 1000),
            Resolution::Override
        );
        // The mirror case loses.
        assert_eq!(
            resolve(&o, PlayerId(0), PlayerId(2), 200, 100, 1000),
            Resolution::Ignore
        );
    }

    #[test]
    fn test_resolution_is_symmetric_across_replicas() {
        let o = order3();
        // Replica A sees player 0's claim first, replica B sees player
        // 1's claim first. Both must agree player 0 (better rank) wins.
        let a = resolve(&o, PlayerId(1), PlayerId(0), 150, 100, 1000);
        let b = resolve(&o, PlayerId(0), PlayerId(1), 100, 150, 1000);
        assert_eq!(a, Resolution::Ignore);
        assert_eq!(b, Resolution::Override);
    }

    #[test]
    fn test_stale_conflicts_refused() {
        let o = order3();
        assert_eq!(
            resolve(&o, PlayerId(2), PlayerId(0), 5000, 100, 1000),
            Resolution::Ignore
        );
        // Replayed moves carry zero timestamps; the window never
        // applies to them.
        assert_eq!(
            resolve(&o, PlayerId(2), PlayerId(0), 0, 0, 1000),
            Resolution::Override
        );
    }

    #[test]
    fn test_unknown_player_is_error() {
        let o = order3();
        assert_eq!(
            resolve(&o, PlayerId(9), PlayerId(0), 100, 100, 1000),
            Resolution::Error
        );
    }

    #[test]
    fn test_recompute_sorts_by_standing_with_prior_tiebreak() {
        let mut o = order3(); // ranks: 2, 0, 1
        // Standings: player 1 highest, players 2 and 0 tied.
        o.recompute(|p| match p.0 {
            1 => 10,
            _ => 5,
        });
        // Player 1 jumps to rank 0; 2 keeps its edge over 0 from the
        // previous order.
        assert_eq!(o.at_rank(0), PlayerId(1));
        assert_eq!(o.at_rank(1), PlayerId(2));
        assert_eq!(o.at_rank(2), PlayerId(0));
    }
}

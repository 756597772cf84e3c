//! Per-player ledgers: resource pools, victory tracks, UI sub-state.
//!
//! Resources are counters, split into an *active pool* (spendable) and
//! a *reserve pool* (the player's supply). Payments move counts from
//! pool to reserve; benefits move them back. The reserve is finite, so
//! benefits silently collect only what is available.
//!
//! Victory tracks clamp silently to `[0, track_max]` — hitting a bound
//! is a normal consequence of play, not an error.

use serde::{Deserialize, Serialize};

use crate::core::{PlayerId, Token};
use crate::economy::ChoiceKind;

use super::cell::CellId;

/// Index of a resource kind within the variant's resource table.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResourceKind(pub u8);

impl ResourceKind {
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// Index of a victory track within the variant's track table.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TrackId(pub u8);

impl TrackId {
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// Transient per-player sub-state gating which moves the generator
/// offers next.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UiState {
    /// Free to place workers and take actions.
    #[default]
    Normal,
    /// Must submit `remaining` more select moves of the given kind
    /// before the current interaction is complete.
    AwaitingChoice { kind: ChoiceKind, remaining: u8 },
    /// Out of actions for this sub-phase; may only wait.
    Resting,
    /// Committed for this checkpoint; waiting on the other players.
    Ready,
}

impl UiState {
    /// True when the player owes no further choices.
    #[must_use]
    pub fn is_quiet(self) -> bool {
        !matches!(self, UiState::AwaitingChoice { .. })
    }
}

/// An uncommitted pick: a token lifted from a cell, not yet dropped.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pick {
    pub from: CellId,
    /// Stack index the token was lifted from, for exact restoration.
    pub index: usize,
    pub token: Token,
    pub at_ms: u64,
    pub move_number: u32,
}

/// A completed but still undoable drop.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dropped {
    pub dest: CellId,
    pub token: Token,
    /// Where the matching pick lifted the token from.
    pub source: CellId,
    /// Stack index in the source cell, for exact restoration.
    pub source_index: usize,
    /// Sub-state to restore if the drop is taken back.
    pub prior_ui: UiState,
    pub at_ms: u64,
}

/// Everything the engine tracks per player.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerLedger {
    pub player: PlayerId,
    pool: Vec<u32>,
    reserve: Vec<u32>,
    tracks: Vec<u8>,
    track_max: u8,
    pub ui: UiState,
    /// In-flight pick with no matching drop yet.
    pub picked: Option<Pick>,
    /// Last drop, if still undoable.
    pub dropped: Option<Dropped>,
    /// Workers recruited beyond the starting pair.
    pub recruits: u8,
}

impl PlayerLedger {
    /// Create a ledger with the given reserve supplies and empty pools.
    #[must_use]
    pub fn new(player: PlayerId, reserves: &[u32], track_count: u8, track_max: u8) -> Self {
        Self {
            player,
            pool: vec![0; reserves.len()],
            reserve: reserves.to_vec(),
            tracks: vec![0; track_count as usize],
            track_max,
            ui: UiState::Normal,
            picked: None,
            dropped: None,
            recruits: 0,
        }
    }

    /// Active-pool count for a resource.
    #[must_use]
    pub fn resource(&self, kind: ResourceKind) -> u32 {
        self.pool[kind.index()]
    }

    /// Reserve-pool count for a resource.
    #[must_use]
    pub fn reserve(&self, kind: ResourceKind) -> u32 {
        self.reserve[kind.index()]
    }

    /// Sum across the active pool.
    #[must_use]
    pub fn total_resources(&self) -> u32 {
        self.pool.iter().sum()
    }

    /// Number of resource kinds in this ledger.
    #[must_use]
    pub fn resource_count(&self) -> usize {
        self.pool.len()
    }

    /// Current value of a victory track.
    #[must_use]
    pub fn track(&self, track: TrackId) -> u8 {
        self.tracks[track.index()]
    }

    /// Number of victory tracks.
    #[must_use]
    pub fn track_count(&self) -> usize {
        self.tracks.len()
    }

    /// Upper clamp bound shared by all tracks.
    #[must_use]
    pub fn track_limit(&self) -> u8 {
        self.track_max
    }

    /// Sum across all tracks — the player's score.
    #[must_use]
    pub fn score(&self) -> u32 {
        self.tracks.iter().map(|&v| u32::from(v)).sum()
    }

    /// Move a track by a signed delta, clamping silently to
    /// `[0, track_max]`.
    pub fn bump_track(&mut self, track: TrackId, delta: i16) {
        let cur = i16::from(self.tracks[track.index()]);
        let next = (cur + delta).clamp(0, i16::from(self.track_max));
        self.tracks[track.index()] = next as u8;
    }

    /// Pay `amount` of a resource from the active pool into the reserve.
    ///
    /// Affordability must already be verified; paying more than the
    /// pool holds is an upstream invariant breach.
    pub fn pay(&mut self, kind: ResourceKind, amount: u32) {
        let pool = &mut self.pool[kind.index()];
        assert!(*pool >= amount, "not enough to transfer");
        *pool -= amount;
        self.reserve[kind.index()] += amount;
    }

    /// Collect up to `amount` of a resource from the reserve into the
    /// active pool. Returns how much actually moved; a short reserve is
    /// a silent partial collection.
    pub fn gain_available(&mut self, kind: ResourceKind, amount: u32) -> u32 {
        let moved = amount.min(self.reserve[kind.index()]);
        self.reserve[kind.index()] -= moved;
        self.pool[kind.index()] += moved;
        moved
    }

    /// Symmetric transfer between pool and reserve: positive amounts
    /// pay (pool to reserve), negative amounts collect.
    pub fn transfer(&mut self, kind: ResourceKind, amount: i64) {
        if amount >= 0 {
            self.pay(kind, amount as u32);
        } else {
            self.gain_available(kind, (-amount) as u32);
        }
    }

    /// Total count still available in the reserve.
    #[must_use]
    pub fn total_reserve(&self) -> u32 {
        self.reserve.iter().sum()
    }

    /// Finalize the in-flight interaction: the pick/drop pair can no
    /// longer be undone.
    pub fn accept_placement(&mut self) {
        self.picked = None;
        self.dropped = None;
    }

    /// True when nothing is in flight and no choice is owed.
    #[must_use]
    pub fn is_quiet(&self) -> bool {
        self.picked.is_none() && self.dropped.is_none() && self.ui.is_quiet()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ledger() -> PlayerLedger {
        PlayerLedger::new(PlayerId::new(0), &[10, 10, 10, 20], 3, 21)
    }

    #[test]
    fn test_pay_and_gain() {
        let mut l = ledger();
        let r = ResourceKind(0);

        assert_eq!(l.gain_available(r, 4), 4);
        assert_eq!(l.resource(r), 4);
        assert_eq!(l.reserve(r), 6);

        l.pay(r, 3);
        assert_eq!(l.resource(r), 1);
        assert_eq!(l.reserve(r), 9);
    }

    #[test]
    fn test_gain_clamps_to_reserve() {
        let mut l = ledger();
        let r = ResourceKind(1);
        assert_eq!(l.gain_available(r, 25), 10);
        assert_eq!(l.resource(r), 10);
        assert_eq!(l.reserve(r), 0);
        // Reserve empty: further gains are silent no-ops.
        assert_eq!(l.gain_available(r, 1), 0);
    }

    #[test]
    #[should_panic(expected = "not enough to transfer")]
    fn test_pay_overdraft_panics() {
        let mut l = ledger();
        l.pay(ResourceKind(0), 1);
    }

    #[test]
    fn test_symmetric_transfer() {
        let mut l = ledger();
        let r = ResourceKind(2);
        l.transfer(r, -5);
        assert_eq!(l.resource(r), 5);
        l.transfer(r, 2);
        assert_eq!(l.resource(r), 3);
        assert_eq!(l.reserve(r), 7);
    }

    #[test]
    fn test_track_clamping() {
        let mut l = ledger();
        let t = TrackId(0);

        l.bump_track(t, 5);
        assert_eq!(l.track(t), 5);
        l.bump_track(t, 100);
        assert_eq!(l.track(t), 21);
        l.bump_track(t, -100);
        assert_eq!(l.track(t), 0);
    }

    #[test]
    fn test_score_sums_tracks() {
        let mut l = ledger();
        l.bump_track(TrackId(0), 3);
        l.bump_track(TrackId(1), 4);
        l.bump_track(TrackId(2), 5);
        assert_eq!(l.score(), 12);
    }

    #[test]
    fn test_quiet() {
        let mut l = ledger();
        assert!(l.is_quiet());
        l.ui = UiState::AwaitingChoice {
            kind: ChoiceKind::GainResource,
            remaining: 2,
        };
        assert!(!l.is_quiet());
        l.ui = UiState::Resting;
        assert!(l.is_quiet());
    }
}

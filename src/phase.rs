//! The phase machine.
//!
//! Phases are opaque tags carrying three flags: whether a turn can be
//! finalized from here (`is_done_state`), whether this phase's digest
//! participates in repetition detection (`is_digestible`; transient
//! phases are excluded), and whether more than one player may submit
//! moves before any turn change (`simultaneous_turns`).
//!
//! Transitions are driven exclusively by completed moves. The game
//! aggregate owns the transition logic; this module only classifies.

use serde::{Deserialize, Serialize};

/// One phase of play.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Phase {
    /// Before the start move; nothing on the board is live.
    Setup,
    /// Turn-ordered play for variants without real-time clocks.
    NormalPlay,
    /// Turn-ordered initial worker drops, in privilege order.
    /// `round` 0 places chiefs, `round` 1 places regular workers.
    ForcedPlacement { round: u8 },
    /// Any eligible player may act; paced by the timers.
    SimultaneousPlay,
    /// Council selections, in privilege order.
    CouncilPlay,
    /// Rank rewards are distributed.
    CouncilRewards,
    /// Council display trimmed and redealt; privilege recomputed.
    CouncilTrim,
    /// Transitional: control passing to the next player.
    PendingAdvance,
    /// Transitional: an expired timer forces its flip before play resumes.
    TimerFlip,
    /// Transitional: a new sub-phase is about to begin.
    StartPhase,
    /// A completed placement awaits its confirming done move.
    Confirm,
    /// A resignation awaits confirmation.
    Resign,
    /// Scores compared; winner recorded unless tied.
    GameOver,
    /// A detected repetition awaits draw confirmation.
    DrawPending,
}

impl Phase {
    /// True if a turn can be finalized (a done move accepted) here.
    #[must_use]
    pub fn is_done_state(self) -> bool {
        matches!(
            self,
            Phase::Confirm | Phase::Resign | Phase::DrawPending
        )
    }

    /// True if this phase's fingerprint participates in repetition
    /// detection. Transient and confirmation states are excluded.
    #[must_use]
    pub fn is_digestible(self) -> bool {
        !matches!(
            self,
            Phase::PendingAdvance
                | Phase::TimerFlip
                | Phase::StartPhase
                | Phase::Confirm
        )
    }

    /// True if more than one player may submit moves before any turn
    /// change occurs.
    #[must_use]
    pub fn simultaneous_turns(self) -> bool {
        matches!(self, Phase::SimultaneousPlay)
    }

    /// True once the game has ended.
    #[must_use]
    pub fn is_game_over(self) -> bool {
        matches!(self, Phase::GameOver)
    }

    /// True for the transitional phases the game auto-resolves at the
    /// end of each submit.
    #[must_use]
    pub fn is_transitional(self) -> bool {
        matches!(
            self,
            Phase::PendingAdvance | Phase::StartPhase
        )
    }

    /// Stable numeric tag for digesting.
    #[must_use]
    pub fn tag(self) -> u64 {
        match self {
            Phase::Setup => 0,
            Phase::NormalPlay => 1,
            Phase::ForcedPlacement { round } => 2 + u64::from(round),
            Phase::SimultaneousPlay => 8,
            Phase::CouncilPlay => 9,
            Phase::CouncilRewards => 10,
            Phase::CouncilTrim => 11,
            Phase::PendingAdvance => 12,
            Phase::TimerFlip => 13,
            Phase::StartPhase => 14,
            Phase::Confirm => 15,
            Phase::Resign => 16,
            Phase::GameOver => 17,
            Phase::DrawPending => 18,
        }
    }
}

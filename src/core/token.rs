//! Tokens: the pieces that move between cells.
//!
//! A token is identity only — a kind plus an owning color. It is created
//! once during setup, moved between cells for the rest of the session,
//! and never duplicated. Resource quantities are *not* tokens; they are
//! counters in the player ledgers.

use serde::{Deserialize, Serialize};

use super::PlayerId;

/// What a token is.
///
/// `Card` kinds are opaque to the engine: the variant configuration maps
/// each card id to its cost/benefit pair.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TokenKind {
    /// A regular worker. Needs an empty slot to be placed on-board.
    Worker,
    /// A large worker. May stack onto an occupied slot.
    Chief,
    /// A sand-timer marker occupying one timer slot per bank.
    Hourglass,
    /// A card drawn from a variant-configured deck.
    Card(u16),
    /// A neutral marker (timer-track pawn, territory seal, ...).
    Marker,
}

/// Who a token belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Owner {
    /// Board material not owned by any player.
    Neutral,
    /// Owned by one player; only that player may normally move it.
    Player(PlayerId),
}

impl Owner {
    /// The owning player, if any.
    #[must_use]
    pub fn player(self) -> Option<PlayerId> {
        match self {
            Owner::Neutral => None,
            Owner::Player(p) => Some(p),
        }
    }
}

/// An immutable game piece.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Token {
    pub kind: TokenKind,
    pub owner: Owner,
}

impl Token {
    /// Create a player-owned token.
    #[must_use]
    pub const fn owned(kind: TokenKind, player: PlayerId) -> Self {
        Self {
            kind,
            owner: Owner::Player(player),
        }
    }

    /// Create a neutral token.
    #[must_use]
    pub const fn neutral(kind: TokenKind) -> Self {
        Self {
            kind,
            owner: Owner::Neutral,
        }
    }

    /// True if `player` owns this token.
    #[must_use]
    pub fn is_owned_by(self, player: PlayerId) -> bool {
        self.owner == Owner::Player(player)
    }

    /// True for `Worker` or `Chief` kinds.
    #[must_use]
    pub fn is_worker(self) -> bool {
        matches!(self.kind, TokenKind::Worker | TokenKind::Chief)
    }

    /// Stable numeric code for digesting.
    ///
    /// Distinct (kind, owner) pairs map to distinct codes.
    #[must_use]
    pub fn code(self) -> u64 {
        let kind = match self.kind {
            TokenKind::Worker => 0u64,
            TokenKind::Chief => 1,
            TokenKind::Hourglass => 2,
            TokenKind::Marker => 3,
            TokenKind::Card(id) => 4 + u64::from(id),
        };
        let owner = match self.owner {
            Owner::Neutral => 0u64,
            Owner::Player(p) => 1 + p.0 as u64,
        };
        kind << 8 | owner
    }
}

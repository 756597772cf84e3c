//! Replay records.
//!
//! An ordered move log plus the variant descriptor and seed is
//! sufficient to reconstruct any reachable state deterministically —
//! including conflict outcomes, because privilege resolution is a
//! function of replicated state, never of arrival order.
//!
//! Records round-trip through bincode for storage and transmission.

use serde::{Deserialize, Serialize};

use crate::game::Game;
use crate::moves::Move;
use crate::variant::VariantConfig;

/// Everything needed to rebuild a game.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GameRecord {
    pub variant: VariantConfig,
    pub players: usize,
    pub seed: u64,
    pub moves: Vec<Move>,
}

impl GameRecord {
    /// An empty record for a fresh game.
    #[must_use]
    pub fn new(variant: VariantConfig, players: usize, seed: u64) -> Self {
        Self {
            variant,
            players,
            seed,
            moves: Vec::new(),
        }
    }

    /// Capture a live game's full history.
    #[must_use]
    pub fn from_game(game: &Game) -> Self {
        Self {
            variant: game.variant().clone(),
            players: game.player_count(),
            seed: game.seed(),
            moves: game.history().iter().copied().collect(),
        }
    }

    /// Append a committed move.
    pub fn record(&mut self, mv: Move) {
        self.moves.push(mv);
    }

    /// Rebuild the game by replaying the log from the initial seed.
    ///
    /// Moves are applied with zeroed timestamps — replays are not live
    /// submissions, and the conflict window never applies to them.
    /// Moves that fail to apply are logged and dropped, tolerating
    /// damaged historical logs the way the error taxonomy prescribes.
    #[must_use]
    pub fn replay(&self) -> Game {
        let mut game = Game::new(self.variant.clone(), self.players, self.seed);
        for mv in &self.moves {
            if let Err(err) = game.submit(mv.at(0)) {
                log::warn!("replay dropped {}: {err}", mv.to_wire());
            }
        }
        game
    }

    /// Serialize for storage.
    pub fn to_bytes(&self) -> Result<Vec<u8>, bincode::Error> {
        bincode::serialize(self)
    }

    /// Deserialize from storage.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, bincode::Error> {
        bincode::deserialize(bytes)
    }
}

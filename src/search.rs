//! The search-driver adapter.
//!
//! An external Monte-Carlo tree search treats this as a black-box
//! oracle: clone the live game, enumerate legal moves, make moves on
//! the clone, and read a bounded static evaluation. There is no
//! unmake — the adapter records the pre-move phase tags and search
//! backtracking simply discards the clone and re-clones from the last
//! checkpoint, because cloning is cheap relative to search depth.
//!
//! The contract this adapter guarantees: idempotent cloning (verified
//! by digest), deterministic digesting, and legal-move enumeration
//! identical to the live game's. A move that cannot legally apply
//! during search is simply absent from `legal_moves`; nothing here
//! throws across the boundary.

use crate::core::PlayerId;
use crate::error::EngineError;
use crate::game::Game;
use crate::moves::Move;
use crate::phase::Phase;

/// A private, search-owned copy of the game.
pub struct SearchContext {
    game: Game,
    /// Pre-move phase tags, newest last.
    checkpoints: Vec<Phase>,
}

impl SearchContext {
    /// Clone the live game for search. The copy is verified against
    /// the original's fingerprint in debug builds.
    #[must_use]
    pub fn new(live: &Game) -> Self {
        Self {
            game: live.clone_game(),
            checkpoints: Vec::new(),
        }
    }

    /// The adapter's private clone.
    #[must_use]
    pub fn game(&self) -> &Game {
        &self.game
    }

    /// Same generator the live game uses; search and live contexts can
    /// never disagree about legality.
    #[must_use]
    pub fn legal_moves(&self, player: PlayerId) -> Vec<Move> {
        self.game.legal_moves(player)
    }

    /// Apply a move on the clone, auto-accepting the placement the way
    /// a search line always would (search never self-undoes).
    ///
    /// Moves are applied with a zeroed timestamp: search lines are
    /// replays, not live submissions.
    pub fn make_move(&mut self, mv: Move) -> Result<(), EngineError> {
        self.checkpoints.push(self.game.phase());
        let result = self.game.submit(mv.at(0));
        if result.is_ok() {
            self.game.accept_all_placements();
        } else {
            self.checkpoints.pop();
        }
        result
    }

    /// Depth of the checkpoint stack (moves made on this clone).
    #[must_use]
    pub fn depth(&self) -> usize {
        self.checkpoints.len()
    }

    /// The phase tag recorded before the most recent move.
    #[must_use]
    pub fn last_checkpoint(&self) -> Option<Phase> {
        self.checkpoints.last().copied()
    }

    /// Throw this line away and start over from the live game.
    pub fn reset_from(&mut self, live: &Game) {
        self.game = live.clone_game();
        self.checkpoints.clear();
    }

    /// Bounded static evaluation of the position for one player.
    ///
    /// 1.0 is a won game, 0.0 a lost one; unfinished positions map
    /// into (0, 1) from track progress plus a small resource term.
    #[must_use]
    pub fn evaluate(&self, player: PlayerId) -> f64 {
        if self.game.phase().is_game_over() {
            return match self.game.winner() {
                Some(w) if w == player => 1.0,
                Some(_) => 0.0,
                None => 0.5,
            };
        }
        let threshold = f64::from(self.game.variant().victory_threshold);
        let score = f64::from(self.game.score(player));
        let resources = f64::from(self.game.ledger(player).total_resources());
        ((score + resources * 0.05) / (threshold * 2.0)).clamp(0.0, 0.99)
    }
}

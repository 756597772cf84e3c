//! Single-writer host for the live game.
//!
//! Exactly one thread owns the live `Game`; every mutation and query
//! is a message serialized through a channel. Callers on any thread
//! share a cheap handle. This replaces the busy-wait-and-retry lock
//! the problem traditionally gets: there is nothing to contend, so
//! there is nothing to retry.
//!
//! Search clones are taken through `snapshot` and are never shared
//! once handed out; each search worker owns its clone exclusively.

use std::sync::mpsc::{channel, Sender};
use std::thread::JoinHandle;

use rustc_hash::FxHashMap;

use crate::board::CellId;
use crate::core::PlayerId;
use crate::error::EngineError;
use crate::game::Game;
use crate::moves::Move;

enum Request {
    Submit(Move, Sender<Result<(), EngineError>>),
    LegalMoves(PlayerId, Sender<Vec<Move>>),
    Targets(PlayerId, Sender<FxHashMap<CellId, Move>>),
    Digest(Sender<u64>),
    AdvanceTimers(u64),
    Snapshot(Sender<Game>),
    Shutdown,
}

/// Handle to the thread owning the live game.
pub struct GameSession {
    tx: Sender<Request>,
    handle: Option<JoinHandle<()>>,
}

impl GameSession {
    /// Move the game onto its own thread and start serving requests.
    #[must_use]
    pub fn spawn(mut game: Game) -> Self {
        let (tx, rx) = channel::<Request>();
        let handle = std::thread::spawn(move || {
            while let Ok(request) = rx.recv() {
                match request {
                    Request::Submit(mv, reply) => {
                        let result = game.submit(mv);
                        if let Err(err) = &result {
                            log::debug!("submit {}: {err}", mv.to_wire());
                        }
                        let _ = reply.send(result);
                    }
                    Request::LegalMoves(player, reply) => {
                        let _ = reply.send(game.legal_moves(player));
                    }
                    Request::Targets(player, reply) => {
                        let _ = reply.send(game.generate_targets(player));
                    }
                    Request::Digest(reply) => {
                        let _ = reply.send(game.digest());
                    }
                    Request::AdvanceTimers(delta_ms) => {
                        game.advance_timers(delta_ms);
                    }
                    Request::Snapshot(reply) => {
                        let _ = reply.send(game.clone_game());
                    }
                    Request::Shutdown => break,
                }
            }
        });
        Self {
            tx,
            handle: Some(handle),
        }
    }

    fn request<T>(&self, build: impl FnOnce(Sender<T>) -> Request) -> Result<T, EngineError> {
        let (reply_tx, reply_rx) = channel();
        self.tx
            .send(build(reply_tx))
            .map_err(|_| EngineError::SessionClosed)?;
        reply_rx.recv().map_err(|_| EngineError::SessionClosed)
    }

    /// Submit a move — local and remote moves come through identically.
    pub fn submit(&self, mv: Move) -> Result<(), EngineError> {
        self.request(|reply| Request::Submit(mv, reply))?
    }

    /// The live game's legal moves for a player.
    pub fn legal_moves(&self, player: PlayerId) -> Result<Vec<Move>, EngineError> {
        self.request(|reply| Request::LegalMoves(player, reply))
    }

    /// Cell-to-move map for interactive highlighting.
    pub fn generate_targets(
        &self,
        player: PlayerId,
    ) -> Result<FxHashMap<CellId, Move>, EngineError> {
        self.request(|reply| Request::Targets(player, reply))
    }

    /// Current state fingerprint.
    pub fn digest(&self) -> Result<u64, EngineError> {
        self.request(Request::Digest)
    }

    /// Feed elapsed wall-clock time from the host run loop.
    /// Fire-and-forget: the run loop never blocks on the game.
    pub fn advance_timers(&self, delta_ms: u64) -> Result<(), EngineError> {
        self.tx
            .send(Request::AdvanceTimers(delta_ms))
            .map_err(|_| EngineError::SessionClosed)
    }

    /// Deep copy of the live game for a search worker.
    pub fn snapshot(&self) -> Result<Game, EngineError> {
        self.request(Request::Snapshot)
    }
}

impl Drop for GameSession {
    fn drop(&mut self) {
        let _ = self.tx.send(Request::Shutdown);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::variant::VariantConfig;

    #[test]
    fn test_session_serializes_mutation() {
        let game = Game::new(VariantConfig::standard(), 2, 3);
        let first = game.privilege().at_rank(0);
        let session = GameSession::spawn(game);

        session.submit(Move::start(first)).unwrap();
        let moves = session.legal_moves(first).unwrap();
        assert!(!moves.is_empty());

        session.submit(moves[0]).unwrap();
        let digest = session.digest().unwrap();
        assert_ne!(digest, 0);
    }

    #[test]
    fn test_snapshot_matches_live() {
        let game = Game::new(VariantConfig::standard(), 3, 9);
        let session = GameSession::spawn(game);
        let snapshot = session.snapshot().unwrap();
        assert_eq!(snapshot.digest(), session.digest().unwrap());
    }

    #[test]
    fn test_targets_and_timers() {
        let game = Game::new(VariantConfig::standard(), 2, 5);
        let first = game.privilege().at_rank(0);
        let session = GameSession::spawn(game);
        session.submit(Move::start(first)).unwrap();

        let targets = session.generate_targets(first).unwrap();
        assert!(!targets.is_empty());

        session.advance_timers(1000).unwrap();
        // The session is still serving after a fire-and-forget.
        assert!(session.digest().is_ok());
    }
}

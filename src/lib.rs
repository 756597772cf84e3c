//! # clepsydra
//!
//! A simultaneous-turn board game engine.
//!
//! The engine models a class of worker-placement games in which several
//! players may act at the same time, paced by real-time sand timers rather
//! than a strict turn order. It provides:
//!
//! 1. **Entity model**: cells (ordered token stacks with typed rack
//!    locations), tokens, per-player ledgers, and countdown timers.
//!
//! 2. **Phase machine**: enumerated game phases with explicit flags for
//!    "turn can be finalized here", "state participates in repetition
//!    detection", and "more than one player may act".
//!
//! 3. **Move generation**: per-phase, per-player enumeration of legal
//!    actions, the same algorithm backing both search and interactive
//!    target highlighting.
//!
//! 4. **Economy**: cost payment and benefit collection with clamped
//!    victory tracks and follow-on choice sub-states.
//!
//! 5. **Privilege resolution**: deterministic arbitration of conflicting
//!    concurrent actions, computed from replica-visible state (privilege
//!    rank) so every replica converges regardless of arrival order.
//!
//! 6. **Digest**: an order-independent 64-bit fingerprint of complete
//!    game state for clone verification, repetition detection and search
//!    bookkeeping.
//!
//! 7. **Search adapter**: cheap cloning, make-move and bounded static
//!    evaluation for an external Monte-Carlo tree search driver.
//!
//! ## Modules
//!
//! - `core`: player ids, deterministic RNG, tokens
//! - `board`: cells, rack locations, ledgers, timers
//! - `variant`: game-variant configuration
//! - `phase`: the phase machine
//! - `moves`: move descriptors and the textual wire form
//! - `economy`: cost/benefit rules
//! - `privilege`: conflict-resolution types and rank logic
//! - `digest`: state fingerprinting
//! - `game`: the root aggregate and move execution
//! - `search`: the search-driver adapter
//! - `session`: single-writer host for the live game
//! - `replay`: move-log records and deterministic reconstruction

pub mod core;
pub mod board;
pub mod variant;
pub mod phase;
pub mod moves;
pub mod economy;
pub mod privilege;
pub mod digest;
pub mod game;
pub mod search;
pub mod session;
pub mod replay;
pub mod error;

// Re-export commonly used types
pub use crate::core::{GameRng, GameRngState, Owner, PlayerId, PlayerMap, Token, TokenKind};

pub use crate::board::{
    Cell, CellId, CellRef, Claim, Coord, PlayerLedger, RackKind, RackLocation, ResourceKind,
    Timer, TrackId, UiState,
};

pub use crate::variant::{BankConfig, CardSpec, SlotConfig, VariantConfig};

pub use crate::phase::Phase;

pub use crate::moves::{Move, MoveOp};

pub use crate::economy::{Benefit, ChoiceKind, Cost};

pub use crate::privilege::Resolution;

pub use crate::digest::DigestTables;

pub use crate::game::Game;

pub use crate::search::SearchContext;

pub use crate::session::GameSession;

pub use crate::replay::GameRecord;

pub use crate::error::EngineError;

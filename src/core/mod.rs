//! Core identity and determinism primitives.
//!
//! Everything in this module is game-agnostic: player identifiers,
//! per-player storage, the deterministic RNG used for shuffles and
//! digest-table derivation, and the token value type.

mod player;
mod rng;
mod token;

pub use player::{PlayerId, PlayerMap};
pub use rng::{GameRng, GameRngState};
pub use token::{Owner, Token, TokenKind};

//! Cells: ordered, LIFO-addressable token containers.
//!
//! Every cell carries its rack address, its cost/benefit pair, and an
//! optional claim recording the uncommitted action currently touching
//! it. Cells never reference other cells or players directly; the game
//! aggregate owns the arena and hands out `CellId` indices.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::core::{PlayerId, Token};
use crate::economy::{Benefit, Cost};

use super::rack::{CellRef, Coord, RackLocation};

/// Index of a cell in the game's arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellId(pub u32);

impl CellId {
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// Bookkeeping for an uncommitted action touching a cell.
///
/// Set when a token is picked from or dropped onto the cell and the
/// move is still undoable; cleared when the placement is accepted.
/// The timestamp is the real-world submission time of the move, zero
/// for replayed moves.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claim {
    pub player: PlayerId,
    pub move_number: u32,
    pub at_ms: u64,
}

/// An ordered stack of tokens at a rack location.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cell {
    pub id: CellId,
    pub location: RackLocation,
    pub coord: Coord,
    pub cost: Cost,
    pub benefit: Benefit,
    /// Shared cells are visible to and contended by all replicas.
    pub on_board: bool,
    pub claim: Option<Claim>,
    stack: SmallVec<[Token; 4]>,
}

impl Cell {
    /// Create an empty cell.
    #[must_use]
    pub fn new(id: CellId, location: RackLocation, coord: Coord) -> Self {
        Self {
            id,
            location,
            coord,
            cost: Cost::Free,
            benefit: Benefit::None,
            on_board: location.owner.is_none(),
            claim: None,
            stack: SmallVec::new(),
        }
    }

    /// Attach a cost/benefit pair.
    #[must_use]
    pub fn with_rules(mut self, cost: Cost, benefit: Benefit) -> Self {
        self.cost = cost;
        self.benefit = benefit;
        self
    }

    /// The full address of this cell.
    #[must_use]
    pub fn cell_ref(&self) -> CellRef {
        CellRef::new(self.location, self.coord)
    }

    /// Number of tokens in the stack.
    #[must_use]
    pub fn height(&self) -> usize {
        self.stack.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.stack.is_empty()
    }

    /// The token on top, if any.
    #[must_use]
    pub fn top(&self) -> Option<Token> {
        self.stack.last().copied()
    }

    /// Token at a stack index (0 = bottom).
    #[must_use]
    pub fn at(&self, index: usize) -> Option<Token> {
        self.stack.get(index).copied()
    }

    /// Push a token on top.
    pub fn push(&mut self, token: Token) {
        self.stack.push(token);
    }

    /// Remove and return the top token.
    pub fn pop(&mut self) -> Option<Token> {
        self.stack.pop()
    }

    /// Find the stack index of a token, top-down.
    #[must_use]
    pub fn find(&self, token: Token) -> Option<usize> {
        self.stack.iter().rposition(|&t| t == token)
    }

    /// Remove the token at a stack index.
    ///
    /// Panics if the index is out of range; callers locate tokens with
    /// [`Cell::find`] first.
    pub fn remove_at(&mut self, index: usize) -> Token {
        self.stack.remove(index)
    }

    /// Re-insert a token at a stack index, clamped to the current height.
    pub fn insert_at(&mut self, index: usize, token: Token) {
        let idx = index.min(self.stack.len());
        self.stack.insert(idx, token);
    }

    /// Iterate tokens bottom-up.
    pub fn tokens(
        &self,
    ) -> impl ExactSizeIterator<Item = Token> + DoubleEndedIterator + '_ {
        self.stack.iter().copied()
    }

    /// True if any token in the stack belongs to `player`.
    #[must_use]
    pub fn holds_token_of(&self, player: PlayerId) -> bool {
        self.stack.iter().any(|t| t.is_owned_by(player))
    }

    /// Clear contents and claim (re-initialization).
    pub fn clear(&mut self) {
        self.stack.clear();
        self.claim = None;
    }
}

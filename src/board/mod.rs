//! The entity model: rack locations, cells, player ledgers and timers.
//!
//! Cells and ledgers live in flat arenas inside the game aggregate;
//! every cross-reference is an index (`CellId`, `PlayerId`), never an
//! owning pointer, so the aggregate clones without cycles.

mod cell;
mod ledger;
mod rack;
mod timer;

pub use cell::{Cell, CellId, Claim};
pub use ledger::{Dropped, Pick, PlayerLedger, ResourceKind, TrackId, UiState};
pub use rack::{CellRef, Coord, RackKind, RackLocation};
pub use timer::Timer;

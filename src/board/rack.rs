//! Rack locations: stable, typed addresses for cells.
//!
//! The rack kind is a closed enum so that dispatch over cell roles is
//! exhaustive at compile time. A full cell address is the kind, the
//! owning player for private racks, and a coordinate triple
//! (bank, row, slot). On-board racks use `owner: None`.

use serde::{Deserialize, Serialize};

use crate::core::PlayerId;

/// The role a cell plays on a rack.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RackKind {
    /// Board slot a worker is placed on to queue for an action.
    WorkerSlot,
    /// Board slot a worker moves onto when its action is taken.
    ActionSlot,
    /// One position of a bank's sand timer.
    TimerSlot,
    /// Face-up council reward display.
    CouncilSeat,
    /// Face-down council reward deck.
    CouncilDeck,
    /// Face-down territory deck.
    TerritoryDeck,
    /// Face-up conquerable territory display.
    Territory,
    /// A player's unplaced regular workers.
    WorkerReserve,
    /// A player's unplaced chiefs.
    ChiefReserve,
    /// A player's collected cards.
    CardRack,
}

impl RackKind {
    /// Wire name, also used in log lines.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            RackKind::WorkerSlot => "worker-slot",
            RackKind::ActionSlot => "action-slot",
            RackKind::TimerSlot => "timer-slot",
            RackKind::CouncilSeat => "council-seat",
            RackKind::CouncilDeck => "council-deck",
            RackKind::TerritoryDeck => "territory-deck",
            RackKind::Territory => "territory",
            RackKind::WorkerReserve => "worker-reserve",
            RackKind::ChiefReserve => "chief-reserve",
            RackKind::CardRack => "card-rack",
        }
    }

    /// Inverse of [`RackKind::name`].
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "worker-slot" => RackKind::WorkerSlot,
            "action-slot" => RackKind::ActionSlot,
            "timer-slot" => RackKind::TimerSlot,
            "council-seat" => RackKind::CouncilSeat,
            "council-deck" => RackKind::CouncilDeck,
            "territory-deck" => RackKind::TerritoryDeck,
            "territory" => RackKind::Territory,
            "worker-reserve" => RackKind::WorkerReserve,
            "chief-reserve" => RackKind::ChiefReserve,
            "card-rack" => RackKind::CardRack,
            _ => return None,
        })
    }

    /// True for racks that belong to one player's private board.
    #[must_use]
    pub fn is_private(self) -> bool {
        matches!(
            self,
            RackKind::WorkerReserve | RackKind::ChiefReserve | RackKind::CardRack
        )
    }
}

/// A rack kind plus its owner for private racks.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RackLocation {
    pub kind: RackKind,
    pub owner: Option<PlayerId>,
}

impl RackLocation {
    /// A shared, globally addressable rack.
    #[must_use]
    pub const fn on_board(kind: RackKind) -> Self {
        Self { kind, owner: None }
    }

    /// A rack on one player's private board.
    #[must_use]
    pub const fn owned(kind: RackKind, player: PlayerId) -> Self {
        Self {
            kind,
            owner: Some(player),
        }
    }
}

/// Coordinate of a cell within its rack: bank, row, slot.
///
/// Racks that are not laid out in bank/row grids (decks, reserves) use
/// zeros for the unused components.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Coord {
    pub bank: u8,
    pub row: u8,
    pub slot: u8,
}

impl Coord {
    #[must_use]
    pub const fn new(bank: u8, row: u8, slot: u8) -> Self {
        Self { bank, row, slot }
    }

    /// Shorthand for single-cell racks.
    #[must_use]
    pub const fn zero() -> Self {
        Self {
            bank: 0,
            row: 0,
            slot: 0,
        }
    }
}

/// A complete cell address: location plus coordinate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CellRef {
    pub loc: RackLocation,
    pub coord: Coord,
}

impl CellRef {
    #[must_use]
    pub const fn new(loc: RackLocation, coord: Coord) -> Self {
        Self { loc, coord }
    }
}

impl std::fmt::Display for CellRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let owner = match self.loc.owner {
            None => "@".to_string(),
            Some(p) => format!("{}", p.0),
        };
        write!(
            f,
            "{} {} {} {} {}",
            self.loc.kind.name(),
            owner,
            self.coord.bank,
            self.coord.row,
            self.coord.slot
        )
    }
}

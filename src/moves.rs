//! Move descriptors and the textual wire form.
//!
//! A move is an opcode, the acting player, optional source/destination
//! cell addresses, an optional small choice index (resource, track or
//! bank number), and the real-world submission timestamp (non-zero only
//! for moves accepted live; zero when replayed).
//!
//! The wire form is a whitespace-separated token sequence parsed as
//! pure syntax, independent of any game state. The engine never trusts
//! legality implied by message structure — every parsed move is
//! re-validated against the live state before it is applied.

use serde::{Deserialize, Serialize};

use crate::board::{CellRef, Coord, RackKind, RackLocation};
use crate::core::PlayerId;
use crate::error::EngineError;

/// Move opcodes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MoveOp {
    /// Begin play from `Setup`.
    Start,
    /// Lift a token from a cell.
    Pick,
    /// Drop the lifted token onto a cell.
    Drop,
    /// Pick and drop as one atomic move (search and relays).
    FromTo,
    /// Answer a pending choice sub-state.
    Select,
    /// Flip an expired timer bank.
    Flip,
    /// Let time pass without acting.
    Wait,
    /// Declare the acting player in a simultaneous phase.
    SetActive,
    /// Finalize the current turn.
    Done,
    /// Offer resignation (toggles back if repeated before done).
    Resign,
}

impl MoveOp {
    /// Wire keyword.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            MoveOp::Start => "start",
            MoveOp::Pick => "pick",
            MoveOp::Drop => "drop",
            MoveOp::FromTo => "fromto",
            MoveOp::Select => "select",
            MoveOp::Flip => "flip",
            MoveOp::Wait => "wait",
            MoveOp::SetActive => "setactive",
            MoveOp::Done => "done",
            MoveOp::Resign => "resign",
        }
    }
}

/// One externally observable mutation of the game.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Move {
    pub op: MoveOp,
    pub player: PlayerId,
    pub from: Option<CellRef>,
    pub to: Option<CellRef>,
    /// Small index operand: selected resource/track, or flipped bank.
    pub choice: Option<u8>,
    /// Real-world submission time in milliseconds. Zero when replayed.
    pub at_ms: u64,
}

impl Move {
    fn bare(op: MoveOp, player: PlayerId) -> Self {
        Self {
            op,
            player,
            from: None,
            to: None,
            choice: None,
            at_ms: 0,
        }
    }

    #[must_use]
    pub fn start(player: PlayerId) -> Self {
        Self::bare(MoveOp::Start, player)
    }

    #[must_use]
    pub fn pick(player: PlayerId, from: CellRef) -> Self {
        Self {
            from: Some(from),
            ..Self::bare(MoveOp::Pick, player)
        }
    }

    #[must_use]
    pub fn drop_on(player: PlayerId, to: CellRef) -> Self {
        Self {
            to: Some(to),
            ..Self::bare(MoveOp::Drop, player)
        }
    }

    #[must_use]
    pub fn from_to(player: PlayerId, from: CellRef, to: CellRef) -> Self {
        Self {
            from: Some(from),
            to: Some(to),
            ..Self::bare(MoveOp::FromTo, player)
        }
    }

    /// Select by small index (resource or track).
    #[must_use]
    pub fn select_index(player: PlayerId, choice: u8) -> Self {
        Self {
            choice: Some(choice),
            ..Self::bare(MoveOp::Select, player)
        }
    }

    /// Select a cell (council seat, territory).
    #[must_use]
    pub fn select_cell(player: PlayerId, to: CellRef) -> Self {
        Self {
            to: Some(to),
            ..Self::bare(MoveOp::Select, player)
        }
    }

    #[must_use]
    pub fn flip(player: PlayerId, bank: u8) -> Self {
        Self {
            choice: Some(bank),
            ..Self::bare(MoveOp::Flip, player)
        }
    }

    #[must_use]
    pub fn wait(player: PlayerId) -> Self {
        Self::bare(MoveOp::Wait, player)
    }

    #[must_use]
    pub fn set_active(player: PlayerId) -> Self {
        Self::bare(MoveOp::SetActive, player)
    }

    #[must_use]
    pub fn done(player: PlayerId) -> Self {
        Self::bare(MoveOp::Done, player)
    }

    #[must_use]
    pub fn resign(player: PlayerId) -> Self {
        Self::bare(MoveOp::Resign, player)
    }

    /// Stamp a live submission time.
    #[must_use]
    pub fn at(mut self, at_ms: u64) -> Self {
        self.at_ms = at_ms;
        self
    }

    /// True if two moves describe the same action, ignoring submission
    /// time. Generator membership checks use this.
    #[must_use]
    pub fn same_action(&self, other: &Move) -> bool {
        self.op == other.op
            && self.player == other.player
            && self.from == other.from
            && self.to == other.to
            && self.choice == other.choice
    }

    /// Emit the wire form.
    #[must_use]
    pub fn to_wire(&self) -> String {
        let mut out = format!("{} {}", self.op.name(), self.player.0);
        if let Some(from) = &self.from {
            out.push_str(&format!(" from {from}"));
        }
        if let Some(to) = &self.to {
            out.push_str(&format!(" to {to}"));
        }
        if let Some(choice) = self.choice {
            out.push_str(&format!(" idx {choice}"));
        }
        if self.at_ms != 0 {
            out.push_str(&format!(" at {}", self.at_ms));
        }
        out
    }

    /// Parse the wire form. Pure syntax; no state consulted.
    pub fn from_wire(text: &str) -> Result<Self, EngineError> {
        let mut tok = text.split_whitespace();
        let bad = |what: &str| EngineError::ParseMove {
            text: text.to_string(),
            what: what.to_string(),
        };

        let op = match tok.next().ok_or_else(|| bad("missing opcode"))? {
            "start" => MoveOp::Start,
            "pick" => MoveOp::Pick,
            "drop" => MoveOp::Drop,
            "fromto" => MoveOp::FromTo,
            "select" => MoveOp::Select,
            "flip" => MoveOp::Flip,
            "wait" => MoveOp::Wait,
            "setactive" => MoveOp::SetActive,
            "done" => MoveOp::Done,
            "resign" => MoveOp::Resign,
            other => {
                return Err(bad(&format!("unknown opcode {other}")));
            }
        };

        let player = tok
            .next()
            .and_then(|t| t.parse::<u8>().ok())
            .map(PlayerId::new)
            .ok_or_else(|| bad("missing player"))?;

        let mut mv = Move::bare(op, player);

        while let Some(field) = tok.next() {
            match field {
                "from" => mv.from = Some(parse_cell_ref(&mut tok).ok_or_else(|| bad("from"))?),
                "to" => mv.to = Some(parse_cell_ref(&mut tok).ok_or_else(|| bad("to"))?),
                "idx" => {
                    mv.choice = Some(
                        tok.next()
                            .and_then(|t| t.parse().ok())
                            .ok_or_else(|| bad("idx"))?,
                    );
                }
                "at" => {
                    mv.at_ms = tok
                        .next()
                        .and_then(|t| t.parse().ok())
                        .ok_or_else(|| bad("at"))?;
                }
                other => return Err(bad(&format!("unknown field {other}"))),
            }
        }

        Ok(mv)
    }
}

fn parse_cell_ref<'a>(tok: &mut impl Iterator<Item = &'a str>) -> Option<CellRef> {
    let kind = RackKind::from_name(tok.next()?)?;
    let owner = match tok.next()? {
        "@" => None,
        n => Some(PlayerId::new(n.parse().ok()?)),
    };
    let bank = tok.next()?.parse().ok()?;
    let row = tok.next()?.parse().ok()?;
    let slot = tok.next()?.parse().ok()?;
    Some(CellRef::new(
        RackLocation { kind, owner },
        Coord::new(bank, row, slot),
    ))
}

impl std::fmt::Display for Move {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_wire())
    }
}

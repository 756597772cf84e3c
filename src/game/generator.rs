//! Legal-move enumeration.
//!
//! One algorithm serves both callers: `legal_moves` feeds search and
//! validation, `generate_targets` filters the same list into a
//! cell-to-move map for interactive highlighting. Nothing is
//! duplicated, so the two can never disagree.
//!
//! Moves appear only when their preconditions hold right now:
//! affordability, a non-empty source, destination capacity and
//! ownership. An in-flight pick synthesizes its undo move first so a
//! caller always sees a way back out.

use rustc_hash::FxHashMap;

use crate::board::{CellId, RackKind, UiState};
use crate::core::{PlayerId, TokenKind};
use crate::economy::{can_pay, ChoiceKind};
use crate::moves::{Move, MoveOp};
use crate::phase::Phase;

use super::Game;

impl Game {
    /// Enumerate every move `player` may legally submit right now.
    #[must_use]
    pub fn legal_moves(&self, player: PlayerId) -> Vec<Move> {
        let mut all = Vec::new();

        match self.phase() {
            Phase::Setup => {
                all.push(Move::start(player));
            }
            Phase::ForcedPlacement { round } => {
                if player == self.active_player() {
                    self.undo_moves(player, &mut all);
                    if self.ledgers[player].dropped.is_none() {
                        self.forced_placement_moves(player, round, &mut all);
                    }
                }
            }
            Phase::SimultaneousPlay => {
                self.play_moves(player, true, &mut all);
            }
            Phase::NormalPlay => {
                if player == self.active_player() {
                    self.play_moves(player, false, &mut all);
                }
            }
            Phase::CouncilPlay => {
                if player == self.active_player() {
                    self.choice_moves(player, &mut all);
                }
            }
            Phase::CouncilRewards | Phase::CouncilTrim => {
                if player == self.privilege.at_rank(0) {
                    all.push(Move::done(player));
                }
            }
            Phase::Confirm => {
                if player == self.active_player() {
                    self.undo_moves(player, &mut all);
                    all.push(Move::done(player));
                }
            }
            Phase::Resign | Phase::DrawPending => {
                if player == self.active_player() {
                    all.push(Move::done(player));
                }
            }
            Phase::TimerFlip => {
                self.flip_moves(player, &mut all);
            }
            Phase::PendingAdvance | Phase::StartPhase | Phase::GameOver => {}
        }

        // Stacked tokens can propose the same cell-to-cell move twice.
        let mut seen = rustc_hash::FxHashSet::default();
        all.retain(|mv| seen.insert(*mv));
        all
    }

    /// The cells a player can usefully touch right now, mapped to the
    /// move touching them. Same enumeration as [`Game::legal_moves`],
    /// filtered for cells.
    #[must_use]
    pub fn generate_targets(&self, player: PlayerId) -> FxHashMap<CellId, Move> {
        let mut targets = FxHashMap::default();
        let picked = self.ledgers[player].picked.is_some();

        for mv in self.legal_moves(player) {
            match mv.op {
                MoveOp::Pick => {
                    if let Some(from) = mv.from {
                        targets.insert(self.cell_id(from), mv);
                    }
                }
                MoveOp::Drop => {
                    if let Some(to) = mv.to {
                        targets.insert(self.cell_id(to), mv);
                    }
                }
                MoveOp::FromTo => {
                    // Before the pick the source is the target; once
                    // something is in hand the destination is.
                    let key = if picked { mv.to } else { mv.from };
                    if let Some(cell_ref) = key {
                        targets.insert(self.cell_id(cell_ref), mv);
                    }
                }
                MoveOp::Flip => {
                    if let Some(bank) = mv.choice {
                        let slot = self.glass_slot(bank as usize);
                        let id = self.cell_id(crate::board::CellRef::new(
                            crate::board::RackLocation::on_board(RackKind::TimerSlot),
                            crate::board::Coord::new(bank, 0, slot),
                        ));
                        targets.insert(id, mv);
                    }
                }
                _ => {}
            }
        }

        targets
    }

    /// Undo moves for the player's in-flight interaction, first in the
    /// candidate list. Legality of these is governed by the claim
    /// checks in the resolver, not by generic affordability.
    fn undo_moves(&self, player: PlayerId, all: &mut Vec<Move>) {
        let ledger = &self.ledgers[player];
        if let Some(pick) = &ledger.picked {
            all.push(Move::drop_on(player, self.cell(pick.from).cell_ref()));
        }
        if let Some(dropped) = &ledger.dropped {
            all.push(Move::pick(player, self.cell(dropped.dest).cell_ref()));
        }
    }

    /// Initial forced drops: chiefs in round 0, workers in round 1.
    fn forced_placement_moves(&self, player: PlayerId, round: u8, all: &mut Vec<Move>) {
        let (reserve_kind, token_kind) = if round == 0 {
            (RackKind::ChiefReserve, TokenKind::Chief)
        } else {
            (RackKind::WorkerReserve, TokenKind::Worker)
        };
        let ledger = &self.ledgers[player];
        let from = if let Some(pick) = &ledger.picked {
            // Mid-pick the only legal sources collapse to the pick.
            if self.cell(pick.from).location.kind != reserve_kind {
                return;
            }
            self.cell(pick.from).cell_ref()
        } else {
            let reserve = self.owned_cell(player, reserve_kind);
            if self.cell(reserve).is_empty() {
                return;
            }
            self.cell(reserve).cell_ref()
        };

        for dest in self.placement_slots(token_kind) {
            all.push(Move::from_to(player, from, self.cell(dest).cell_ref()));
        }
    }

    /// Everything a player can do in open play.
    fn play_moves(&self, player: PlayerId, realtime: bool, all: &mut Vec<Move>) {
        self.undo_moves(player, all);

        let ledger = &self.ledgers[player];
        match ledger.ui {
            UiState::Normal => {
                // A pending free drop does not block further play; the
                // next pick locks it in.
                self.placement_and_action_moves(player, all);
                if realtime {
                    self.flip_moves(player, all);
                }
            }
            UiState::AwaitingChoice { .. } => {
                self.choice_moves(player, all);
            }
            UiState::Resting | UiState::Ready => {}
        }

        // An external scheduler must always have some legal move to
        // make time pass, so lookahead never stalls.
        if all.is_empty() {
            all.push(Move::wait(player));
        }
    }

    fn placement_and_action_moves(&self, player: PlayerId, all: &mut Vec<Move>) {
        let ledger = &self.ledgers[player];

        // Sources: the picked cell if something is in hand, otherwise
        // reserves and own placed workers.
        if let Some(pick) = &ledger.picked {
            let from = self.cell(pick.from).cell_ref();
            self.worker_dests(player, pick.token.kind, pick.from, from, all);
            return;
        }

        for (reserve_kind, token_kind) in [
            (RackKind::WorkerReserve, TokenKind::Worker),
            (RackKind::ChiefReserve, TokenKind::Chief),
        ] {
            let reserve = self.owned_cell(player, reserve_kind);
            if !self.cell(reserve).is_empty() {
                let from = self.cell(reserve).cell_ref();
                self.worker_dests(player, token_kind, reserve, from, all);
            }
        }

        // Repositioning already placed workers within the open rows.
        for (bank, _) in self.variant.banks.iter().enumerate() {
            let row = self.placement_row(bank);
            for col in 0..self.variant.banks[bank].columns.len() as u8 {
                let slot = self.worker_slot(bank as u8, row, col);
                for token in self.cell(slot).tokens().filter(|t| t.is_owned_by(player)) {
                    let from = self.cell(slot).cell_ref();
                    self.worker_dests(player, token.kind, slot, from, all);
                }
            }
        }

        // Taking actions on the timed rows.
        for (bank, config) in self.variant.banks.iter().enumerate() {
            let row = self.timed_row(bank);
            for col in 0..config.columns.len() as u8 {
                let slot = self.worker_slot(bank as u8, row, col);
                let action = self.action_slot(bank as u8, row, col);
                if let Some(token) = self
                    .cell(slot)
                    .tokens()
                    .rev()
                    .find(|t| t.is_owned_by(player))
                {
                    let cost = self.resolve_cost(self.cell(action), token);
                    if can_pay(&self.ledgers[player], &cost) {
                        all.push(Move::from_to(
                            player,
                            self.cell(slot).cell_ref(),
                            self.cell(action).cell_ref(),
                        ));
                    }
                }
            }
        }
    }

    /// Destinations for placing or moving a worker token: the open
    /// rows of every bank. Chiefs may stack; plain workers need an
    /// empty slot.
    fn worker_dests(
        &self,
        player: PlayerId,
        kind: TokenKind,
        from_id: CellId,
        from: crate::board::CellRef,
        all: &mut Vec<Move>,
    ) {
        for dest in self.placement_slots(kind) {
            if dest != from_id {
                all.push(Move::from_to(player, from, self.cell(dest).cell_ref()));
            }
        }
    }

    fn placement_slots(&self, kind: TokenKind) -> Vec<CellId> {
        let mut out = Vec::new();
        for (bank, config) in self.variant.banks.iter().enumerate() {
            let row = self.placement_row(bank);
            for col in 0..config.columns.len() as u8 {
                let slot = self.worker_slot(bank as u8, row, col);
                let open = match kind {
                    TokenKind::Chief => true,
                    _ => self.cell(slot).is_empty(),
                };
                if open {
                    out.push(slot);
                }
            }
        }
        out
    }

    /// Select moves answering the player's pending choice.
    pub(super) fn choice_moves(&self, player: PlayerId, all: &mut Vec<Move>) {
        let ledger = &self.ledgers[player];
        let UiState::AwaitingChoice { kind, .. } = ledger.ui else {
            return;
        };

        match kind {
            ChoiceKind::GainResource => {
                for r in 0..ledger.resource_count() as u8 {
                    if ledger.reserve(crate::board::ResourceKind(r)) > 0 {
                        all.push(Move::select_index(player, r));
                    }
                }
            }
            ChoiceKind::PayResource => {
                for r in 0..ledger.resource_count() as u8 {
                    if ledger.resource(crate::board::ResourceKind(r)) > 0 {
                        all.push(Move::select_index(player, r));
                    }
                }
            }
            ChoiceKind::AdvanceTrack => {
                for t in 0..ledger.track_count() as u8 {
                    if ledger.track(crate::board::TrackId(t)) < ledger.track_limit() {
                        all.push(Move::select_index(player, t));
                    }
                }
            }
            ChoiceKind::Conquer => {
                let rack = self.owned_cell(player, RackKind::CardRack);
                self.card_take_moves(player, RackKind::Territory, rack, all);
            }
            ChoiceKind::CouncilCard => {
                let rack = self.owned_cell(player, RackKind::CardRack);
                self.card_take_moves(player, RackKind::CouncilSeat, rack, all);
            }
            ChoiceKind::Retrieve => {
                self.retrieve_moves(player, all);
            }
        }

        // A choice with no remaining option must not stall the game.
        if all.is_empty() {
            all.push(Move::wait(player));
        }
    }

    fn card_take_moves(
        &self,
        player: PlayerId,
        display: RackKind,
        rack: CellId,
        all: &mut Vec<Move>,
    ) {
        let picked = self.ledgers[player].picked;
        for id in self.cell_ids() {
            let cell = self.cell(id);
            if cell.location.kind != display {
                continue;
            }
            let viable = match &picked {
                // Mid-pick, the only continuation is dropping the card.
                Some(pick) => pick.from == id,
                None => !cell.is_empty(),
            };
            if viable {
                all.push(Move::from_to(
                    player,
                    cell.cell_ref(),
                    self.cell(rack).cell_ref(),
                ));
            }
        }
    }

    /// Pull one of your placed workers back off the timed rows.
    pub(super) fn retrieve_moves(&self, player: PlayerId, all: &mut Vec<Move>) {
        for (bank, config) in self.variant.banks.iter().enumerate() {
            let row = self.timed_row(bank);
            for col in 0..config.columns.len() as u8 {
                for slot in [
                    self.worker_slot(bank as u8, row, col),
                    self.action_slot(bank as u8, row, col),
                ] {
                    for token in self.cell(slot).tokens().filter(|t| t.is_owned_by(player)) {
                        let reserve_kind = if token.kind == TokenKind::Chief {
                            RackKind::ChiefReserve
                        } else {
                            RackKind::WorkerReserve
                        };
                        let reserve = self.owned_cell(player, reserve_kind);
                        all.push(Move::from_to(
                            player,
                            self.cell(slot).cell_ref(),
                            self.cell(reserve).cell_ref(),
                        ));
                    }
                }
            }
        }
    }

    /// One flip move per expired bank.
    fn flip_moves(&self, player: PlayerId, all: &mut Vec<Move>) {
        for bank in self.expired_banks() {
            all.push(Move::flip(player, bank as u8));
        }
    }

    pub(crate) fn owned_cell(&self, player: PlayerId, kind: RackKind) -> CellId {
        self.cell_id(crate::board::CellRef::new(
            crate::board::RackLocation::owned(kind, player),
            crate::board::Coord::zero(),
        ))
    }
}

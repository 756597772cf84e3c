//! Move execution.
//!
//! `submit` is the only mutation entry point. It re-validates the move
//! against the generator (never trusting wire structure), routes
//! contended picks and drops through the privilege resolver, applies
//! the economy, and advances the phase machine when a move completes a
//! phase.

use crate::board::{CellId, Claim, Dropped, Pick, RackKind, ResourceKind, TrackId, UiState};
use crate::core::{PlayerId, Token, TokenKind};
use crate::economy::{
    apply_benefit, apply_cost, can_pay, Benefit, BenefitOutcome, ChoiceKind, CostOutcome,
};
use crate::error::EngineError;
use crate::moves::{Move, MoveOp};
use crate::phase::Phase;
use crate::privilege::{resolve, Resolution};

use super::Game;

impl Game {
    /// Validate and apply one move.
    ///
    /// Illegal moves are rejected (`debug_assert` in debug builds — an
    /// invariant breach upstream; logged and dropped in production
    /// replay of possibly damaged logs). Conflicting moves resolve
    /// through privilege and may come back as `Conflict`, which is an
    /// expected outcome, not a failure.
    pub fn submit(&mut self, mv: Move) -> Result<(), EngineError> {
        if !self.is_acceptable(&mv) {
            debug_assert!(
                false,
                "move not offered by the generator: {}",
                mv.to_wire()
            );
            log::warn!("dropping illegal move {}", mv.to_wire());
            return Err(EngineError::IllegalMove { wire: mv.to_wire() });
        }

        // A self-undo is a cancellation, not an opposing action; it
        // must not lock anyone else's placement.
        let self_undo = mv.op == MoveOp::Drop
            && mv.to.is_some()
            && self.ledgers[mv.player]
                .picked
                .map(|p| self.cell(p.from).cell_ref())
                == mv.to;

        let result = self.execute(mv);
        if result.is_ok() {
            if !self_undo {
                self.lock_bystanders(mv.player, &mv);
            }
            self.push_history(mv);
            self.bump_move_number();
            self.auto_advance();
        }
        result
    }

    /// Membership check against the generator, with two carve-outs:
    /// granular pick/drop forms of an offered pick-and-drop pair, and
    /// contended picks that only the resolver can judge.
    fn is_acceptable(&self, mv: &Move) -> bool {
        if self.phase().is_game_over() {
            return false;
        }
        let offered = self.legal_moves(mv.player);
        if offered.iter().any(|m| m.same_action(mv)) {
            return true;
        }

        match mv.op {
            MoveOp::Pick => mv.from.is_some_and(|from| {
                offered
                    .iter()
                    .any(|m| m.op == MoveOp::FromTo && m.from == Some(from))
                    || self.has_foreign_claim(mv.player, from)
            }),
            MoveOp::Drop => {
                let Some(pick) = &self.ledgers[mv.player].picked else {
                    // The remnant of an overridden pick; executed as a
                    // silent abandonment, never an error.
                    return true;
                };
                let source = self.cell(pick.from).cell_ref();
                mv.to.is_some_and(|to| {
                    to == source
                        || offered.iter().any(|m| {
                            m.op == MoveOp::FromTo
                                && m.from == Some(source)
                                && m.to == Some(to)
                        })
                        || self.has_foreign_claim(mv.player, to)
                })
            }
            // A race on either end is the resolver's to judge, not the
            // generator's.
            MoveOp::FromTo => {
                mv.from
                    .is_some_and(|from| self.has_foreign_claim(mv.player, from))
                    || mv.to.is_some_and(|to| self.has_foreign_claim(mv.player, to))
            }
            // Relay declarations and resignations come from the UI, not
            // the generator.
            MoveOp::SetActive => self.phase().simultaneous_turns(),
            MoveOp::Resign => matches!(
                self.phase(),
                Phase::NormalPlay
                    | Phase::SimultaneousPlay
                    | Phase::ForcedPlacement { .. }
                    | Phase::Confirm
                    | Phase::Resign
            ),
            _ => false,
        }
    }

    /// True when a cell this player would touch carries another
    /// player's live claim — the case the generator cannot see and the
    /// privilege resolver must decide.
    fn has_foreign_claim(&self, player: PlayerId, cell_ref: crate::board::CellRef) -> bool {
        let Some(id) = self.find_cell(cell_ref) else {
            return false;
        };
        matches!(self.cell(id).claim, Some(claim) if claim.player != player)
    }

    fn execute(&mut self, mv: Move) -> Result<(), EngineError> {
        match mv.op {
            MoveOp::Start => {
                let first = self.privilege().at_rank(0);
                self.set_active(first);
                self.set_phase(Phase::ForcedPlacement { round: 0 });
                self.set_reset_phase(Phase::ForcedPlacement { round: 0 });
                self.log_event(format!("game started, {first} holds privilege"));
                Ok(())
            }
            MoveOp::SetActive => {
                assert!(
                    self.phase().simultaneous_turns(),
                    "setactive outside simultaneous play"
                );
                self.set_active(mv.player);
                Ok(())
            }
            MoveOp::Wait => {
                self.do_wait(mv.player);
                Ok(())
            }
            MoveOp::Resign => {
                self.do_resign(mv.player);
                Ok(())
            }
            MoveOp::Done => {
                self.do_done(mv.player);
                Ok(())
            }
            MoveOp::Flip => {
                self.do_flip(mv.choice.unwrap_or(0) as usize);
                Ok(())
            }
            MoveOp::Select => {
                self.do_select(mv.player, mv.choice.unwrap_or(0));
                Ok(())
            }
            MoveOp::Pick => {
                let from = self.cell_id(mv.from.expect("pick carries a source"));
                self.do_pick(mv.player, from, &mv).map(|_| ())
            }
            MoveOp::Drop => {
                if self.ledgers[mv.player].picked.is_none() {
                    // The pick this drop belonged to lost a conflict on
                    // this replica; the pair dies quietly.
                    log::debug!("ignoring remnant drop {}", mv.to_wire());
                    return Err(EngineError::Conflict(Resolution::Ignore));
                }
                let to = self.cell_id(mv.to.expect("drop carries a destination"));
                self.do_drop(mv.player, to, &mv)
            }
            MoveOp::FromTo => {
                let from = self.cell_id(mv.from.expect("fromto carries a source"));
                let to = self.cell_id(mv.to.expect("fromto carries a destination"));
                self.do_pick(mv.player, from, &mv)?;
                self.do_drop(mv.player, to, &mv)
            }
        }
    }

    // === Picks ===

    /// Lift a token. A missing token with a live foreign claim routes
    /// through the privilege resolver; losing is a silent abandonment.
    fn do_pick(&mut self, player: PlayerId, from: CellId, mv: &Move) -> Result<(), EngineError> {
        // Taking back a pending drop is a pick on its destination.
        if let Some(dropped) = self.ledgers[player].dropped {
            if dropped.dest == from {
                return self.undo_drop(player);
            }
            // A new interaction locks the previous one in.
            self.lock_player(player);
        }

        let mut index = self.find_pickable(player, from);
        if index.is_none() {
            // Another replica's in-flight action beat us to it.
            if let Some(claim) = self.cell(from).claim.filter(|c| c.player != player) {
                let outcome = resolve(
                    self.privilege(),
                    player,
                    claim.player,
                    mv.at_ms,
                    claim.at_ms,
                    self.variant().conflict_window_ms,
                );
                self.note_conflict(format!(
                    "conflict at {}: {player} vs {holder}, resolved {outcome:?}",
                    self.cell(from).cell_ref(),
                    holder = claim.player,
                ));
                match outcome {
                    Resolution::Override => {
                        self.rollback_in_flight(claim.player);
                        index = self.find_pickable(player, from);
                    }
                    Resolution::Ignore => return Err(EngineError::Conflict(Resolution::Ignore)),
                    Resolution::Error => {
                        log::error!("unresolvable conflict at {}", self.cell(from).cell_ref());
                        return Err(EngineError::Conflict(Resolution::Error));
                    }
                }
            }
        }

        let Some(index) = index else {
            // Simultaneous access attempted but nothing to resolve.
            return Err(EngineError::IllegalMove { wire: mv.to_wire() });
        };

        let move_number = self.move_number();
        let token = self.cell_mut(from).remove_at(index);
        let ledger = self.ledger_mut(player);
        ledger.picked = Some(Pick {
            from,
            index,
            token,
            at_ms: mv.at_ms,
            move_number,
        });
        ledger.dropped = None;
        if self.cell(from).on_board {
            self.cell_mut(from).claim = Some(Claim {
                player,
                move_number,
                at_ms: mv.at_ms,
            });
        }
        Ok(())
    }

    /// Stack index of the token this player would lift from a cell.
    fn find_pickable(&self, player: PlayerId, from: CellId) -> Option<usize> {
        let cell = self.cell(from);
        match cell.location.kind {
            // Card displays give up their top card to anyone eligible.
            RackKind::CouncilSeat | RackKind::Territory => {
                cell.height().checked_sub(1)
            }
            _ => cell
                .tokens()
                .enumerate()
                .rev()
                .find(|(_, t)| t.is_owned_by(player))
                .map(|(i, _)| i),
        }
    }

    /// Cancel this player's pending pick, restoring the token.
    fn unpick(&mut self, player: PlayerId) {
        if let Some(pick) = self.ledger_mut(player).picked.take() {
            self.cell_mut(pick.from).insert_at(pick.index, pick.token);
            if self.cell(pick.from).claim.map(|c| c.player) == Some(player) {
                self.cell_mut(pick.from).claim = None;
            }
        }
    }

    /// Take back a pending drop: the token returns to hand and the
    /// interrupted sub-state is restored.
    fn undo_drop(&mut self, player: PlayerId) -> Result<(), EngineError> {
        let dropped = self
            .ledger_mut(player)
            .dropped
            .take()
            .expect("undo without a pending drop");
        let index = self
            .cell(dropped.dest)
            .find(dropped.token)
            .expect("dropped token still present");
        self.cell_mut(dropped.dest).remove_at(index);
        if self.cell(dropped.dest).claim.map(|c| c.player) == Some(player) {
            self.cell_mut(dropped.dest).claim = None;
        }
        let move_number = self.move_number();
        let ledger = self.ledger_mut(player);
        ledger.ui = dropped.prior_ui;
        ledger.picked = Some(Pick {
            from: dropped.source,
            index: dropped.source_index,
            token: dropped.token,
            at_ms: dropped.at_ms,
            move_number,
        });
        // Leaving Confirm: the placement is live again.
        if self.phase() == Phase::Confirm {
            let back = self.reset_phase_tag();
            self.set_phase(back);
        }
        Ok(())
    }

    /// Forcibly cancel another player's in-flight pick or drop
    /// (privilege override).
    fn rollback_in_flight(&mut self, player: PlayerId) {
        if self.ledgers[player].picked.is_some() {
            self.unpick(player);
        } else if self.ledgers[player].dropped.is_some() {
            let _ = self.undo_drop(player);
            self.unpick(player);
        }
        self.log_event(format!("{player}'s in-flight action rolled back"));
    }

    // === Drops ===

    fn do_drop(&mut self, player: PlayerId, to: CellId, mv: &Move) -> Result<(), EngineError> {
        let pick = self.ledgers[player]
            .picked
            .expect("drop without a pick in flight");

        // Dropping back on the source is the self-undo.
        if to == pick.from {
            self.unpick(player);
            return Ok(());
        }

        // Exclusive destination: a plain worker needs the slot empty.
        // An occupied slot with a live foreign claim is a race the
        // resolver decides; occupied without one is simply settled.
        if self.cell(to).location.kind == RackKind::WorkerSlot
            && pick.token.kind == TokenKind::Worker
            && !self.cell(to).is_empty()
        {
            let Some(claim) = self.cell(to).claim.filter(|c| c.player != player) else {
                return Err(EngineError::IllegalMove { wire: mv.to_wire() });
            };
            let outcome = resolve(
                self.privilege(),
                player,
                claim.player,
                mv.at_ms,
                claim.at_ms,
                self.variant().conflict_window_ms,
            );
            self.note_conflict(format!(
                "conflict at {}: {player} vs {holder}, resolved {outcome:?}",
                self.cell(to).cell_ref(),
                holder = claim.player,
            ));
            match outcome {
                Resolution::Override => self.rollback_in_flight(claim.player),
                Resolution::Ignore => return Err(EngineError::Conflict(Resolution::Ignore)),
                Resolution::Error => {
                    log::error!("unresolvable conflict at {}", self.cell(to).cell_ref());
                    return Err(EngineError::Conflict(Resolution::Error));
                }
            }
        }

        self.complete_drop(player, to, mv)
    }

    /// Land the token and run the destination's economy.
    fn complete_drop(&mut self, player: PlayerId, to: CellId, mv: &Move) -> Result<(), EngineError> {
        let pick = self.ledger_mut(player).picked.take().expect("pick in flight");
        let prior_ui = self.ledgers[player].ui;
        let move_number = self.move_number();

        self.cell_mut(to).push(pick.token);
        if self.cell(pick.from).claim.map(|c| c.player) == Some(player) {
            self.cell_mut(pick.from).claim = None;
        }
        if self.cell(to).on_board {
            self.cell_mut(to).claim = Some(Claim {
                player,
                move_number,
                at_ms: mv.at_ms,
            });
        }
        self.ledger_mut(player).dropped = Some(Dropped {
            dest: to,
            token: pick.token,
            source: pick.from,
            source_index: pick.index,
            prior_ui,
            at_ms: mv.at_ms,
        });

        // A drop that answers a pending cell choice consumes it first;
        // the card's own rules may then open a fresh one.
        let consumed_choice = self.consume_cell_choice(player, to);

        let cost = self.resolve_cost(self.cell(to), pick.token);
        let benefit = self.resolve_benefit(self.cell(to), pick.token);
        debug_assert!(
            can_pay(&self.ledgers[player], &cost),
            "generator offered an unaffordable drop"
        );

        // Only a drop with no direct cost and no direct benefit stays
        // eligible for instantaneous self-undo.
        let mut locked = consumed_choice || !matches!(benefit, Benefit::None);
        match apply_cost(self.ledger_mut(player), &cost) {
            CostOutcome::FreeUndoable => {}
            CostOutcome::Paid => locked = true,
            CostOutcome::Choice(n) => {
                locked = true;
                self.ledger_mut(player).ui = UiState::AwaitingChoice {
                    kind: ChoiceKind::PayResource,
                    remaining: n,
                };
            }
        }

        match self.guarded_benefit(player, &benefit) {
            BenefitOutcome::Done => {}
            BenefitOutcome::Choice(kind, n) => {
                locked = true;
                self.ledger_mut(player).ui = UiState::AwaitingChoice { kind, remaining: n };
            }
        }

        if locked {
            self.lock_player(player);
            self.record_position();
        }

        self.after_drop(player, to);
        Ok(())
    }

    /// Apply a benefit, downgrading board-dependent choices that have
    /// no target left (a race, not an error).
    fn guarded_benefit(&mut self, player: PlayerId, benefit: &Benefit) -> BenefitOutcome {
        match benefit {
            Benefit::Conquer => {
                let any = self
                    .cell_ids()
                    .any(|id| {
                        let c = self.cell(id);
                        c.location.kind == RackKind::Territory && !c.is_empty()
                    });
                if any {
                    BenefitOutcome::Choice(ChoiceKind::Conquer, 1)
                } else {
                    BenefitOutcome::Done
                }
            }
            Benefit::Retrieve => {
                let mut probe = Vec::new();
                self.retrieve_moves(player, &mut probe);
                if probe.is_empty() {
                    BenefitOutcome::Done
                } else {
                    BenefitOutcome::Choice(ChoiceKind::Retrieve, 1)
                }
            }
            Benefit::Recruit => {
                // Clamped to the recruit cap; exceeding it is a silent
                // no-op, the same policy as a dry reserve.
                if self.ledgers[player].recruits < self.variant().max_recruits {
                    let reserve = self.owned_cell(player, RackKind::WorkerReserve);
                    self.cell_mut(reserve)
                        .push(Token::owned(TokenKind::Worker, player));
                    self.ledger_mut(player).recruits += 1;
                }
                BenefitOutcome::Done
            }
            other => apply_benefit(self.ledger_mut(player), other),
        }
    }

    /// If the destination answers the player's pending cell choice
    /// (conquest, council selection, retrieval), consume one unit.
    fn consume_cell_choice(&mut self, player: PlayerId, to: CellId) -> bool {
        let UiState::AwaitingChoice { kind, remaining } = self.ledgers[player].ui else {
            return false;
        };
        let answered = match kind {
            ChoiceKind::Conquer | ChoiceKind::CouncilCard => {
                self.cell(to).location.kind == RackKind::CardRack
            }
            ChoiceKind::Retrieve => matches!(
                self.cell(to).location.kind,
                RackKind::WorkerReserve | RackKind::ChiefReserve
            ),
            _ => false,
        };
        if !answered {
            return false;
        }
        self.ledger_mut(player).ui = if remaining > 1 {
            UiState::AwaitingChoice {
                kind,
                remaining: remaining - 1,
            }
        } else {
            UiState::Normal
        };
        // Conquered territories are replaced from the deck.
        if kind == ChoiceKind::Conquer {
            self.refill_territories();
        }
        true
    }

    fn refill_territories(&mut self) {
        for id in self.cell_ids().collect::<Vec<_>>() {
            if self.cell(id).location.kind == RackKind::Territory && self.cell(id).is_empty() {
                self.deal_top(RackKind::TerritoryDeck, id);
            }
        }
    }

    /// Phase consequences of a completed drop.
    fn after_drop(&mut self, player: PlayerId, _to: CellId) {
        match self.phase() {
            Phase::ForcedPlacement { round } => {
                self.set_reset_phase(Phase::ForcedPlacement { round });
                self.set_phase(Phase::Confirm);
            }
            Phase::NormalPlay => {
                if self.ledgers[player].ui.is_quiet() {
                    self.set_reset_phase(Phase::NormalPlay);
                    self.set_phase(Phase::Confirm);
                }
            }
            Phase::CouncilPlay => self.maybe_advance_council(),
            _ => {}
        }
    }

    // === Selects ===

    fn do_select(&mut self, player: PlayerId, choice: u8) {
        let UiState::AwaitingChoice { kind, remaining } = self.ledgers[player].ui else {
            panic!("select without a pending choice");
        };

        match kind {
            ChoiceKind::GainResource => {
                self.ledger_mut(player).gain_available(ResourceKind(choice), 1);
            }
            ChoiceKind::PayResource => {
                self.ledger_mut(player).pay(ResourceKind(choice), 1);
            }
            ChoiceKind::AdvanceTrack => {
                self.ledger_mut(player).bump_track(TrackId(choice), 1);
            }
            other => panic!("select cannot answer {other:?}"),
        }

        let ledger = self.ledger_mut(player);
        ledger.ui = if remaining > 1 {
            UiState::AwaitingChoice {
                kind,
                remaining: remaining - 1,
            }
        } else {
            UiState::Normal
        };

        // Degrade a gain whose reserve just ran dry.
        if let UiState::AwaitingChoice {
            kind: ChoiceKind::GainResource,
            ..
        } = self.ledgers[player].ui
        {
            if self.ledgers[player].total_reserve() == 0 {
                self.ledger_mut(player).ui = UiState::Normal;
            }
        }

        self.after_choice(player);
    }

    /// Phase consequences of finishing (part of) a choice.
    fn after_choice(&mut self, player: PlayerId) {
        if !self.ledgers[player].ui.is_quiet() {
            return;
        }
        match self.phase() {
            Phase::NormalPlay => {
                self.set_reset_phase(Phase::NormalPlay);
                self.set_phase(Phase::Confirm);
            }
            Phase::CouncilPlay => self.maybe_advance_council(),
            _ => {}
        }
    }

    // === Waits, flips ===

    fn do_wait(&mut self, player: PlayerId) {
        // Waiting with an impossible obligation clears it: the board
        // changed under the choice and nothing answers it anymore.
        if let UiState::AwaitingChoice { .. } = self.ledgers[player].ui {
            let mut probe = Vec::new();
            self.choice_moves(player, &mut probe);
            if probe.iter().all(|m| m.op == MoveOp::Wait) {
                self.ledger_mut(player).ui = UiState::Normal;
                self.after_choice(player);
            }
        }
    }

    fn do_flip(&mut self, bank: usize) {
        self.flip_bank(bank);
        self.log_event(format!("bank {bank} timer flipped"));

        let council = self.variant().council_bank();
        if bank == council {
            let cycle = self.variant().banks[council].timer_slots;
            if self.bump_council_phase() >= cycle {
                self.convene_council();
                return;
            }
        }
        if self.phase() == Phase::TimerFlip && !self.timers[council].expired() {
            // Resumes to the interrupted phase via the transitional
            // tag, resolved before this submit returns.
            self.set_phase(Phase::PendingAdvance);
        }
    }

    // === Council ===

    fn convene_council(&mut self) {
        self.stop_all_timers();
        self.accept_all_placements();
        self.set_council_progress(0);
        let first = self.privilege().at_rank(0);
        for p in PlayerId::all(self.player_count()) {
            self.ledger_mut(p).ui = if p == first {
                UiState::AwaitingChoice {
                    kind: ChoiceKind::CouncilCard,
                    remaining: 1,
                }
            } else {
                UiState::Ready
            };
        }
        self.set_active(first);
        self.set_reset_phase(Phase::CouncilPlay);
        self.set_phase(Phase::CouncilPlay);
        self.log_event("council convened".to_string());
        self.record_position();
    }

    /// Pass the council seat on once the active player is quiet.
    fn maybe_advance_council(&mut self) {
        if self.phase() != Phase::CouncilPlay {
            return;
        }
        let active = self.active_player();
        if !self.ledgers[active].is_quiet() {
            return;
        }
        self.ledger_mut(active).ui = UiState::Ready;
        let progress = self.council_progress() + 1;
        self.set_council_progress(progress);

        if usize::from(progress) >= self.player_count() {
            let first = self.privilege().at_rank(0);
            self.set_active(first);
            self.set_phase(Phase::CouncilRewards);
        } else {
            let next = self.privilege().at_rank(usize::from(progress));
            self.ledger_mut(next).ui = UiState::AwaitingChoice {
                kind: ChoiceKind::CouncilCard,
                remaining: 1,
            };
            self.set_active(next);
        }
    }

    // === Done, resign ===

    fn do_done(&mut self, player: PlayerId) {
        match self.phase() {
            Phase::Confirm => {
                self.accept_all_placements();
                if self.evaluate_game_over() {
                    return;
                }
                self.advance_after_confirm(player);
                self.record_position();
            }
            Phase::Resign => {
                let winner = self.best_opponent(player);
                self.set_winner(Some(winner));
                self.set_phase(Phase::GameOver);
                self.log_event(format!("{player} resigned, {winner} wins"));
            }
            Phase::DrawPending => {
                self.set_winner(None);
                self.set_phase(Phase::GameOver);
                self.log_event("drawn by repetition".to_string());
            }
            Phase::CouncilRewards => {
                self.apply_council_rewards();
                if !self.evaluate_game_over() {
                    self.set_phase(Phase::CouncilTrim);
                }
                self.record_position();
            }
            Phase::CouncilTrim => {
                self.trim_council();
            }
            other => panic!("done not expected in {other:?}"),
        }
    }

    fn advance_after_confirm(&mut self, player: PlayerId) {
        match self.reset_phase_tag() {
            Phase::ForcedPlacement { round } => {
                let next = self
                    .privilege()
                    .next_after(player)
                    .expect("player is ranked");
                self.set_active(next);
                if self.privilege().rank_of(next) == Some(0) {
                    // The table wrapped: this placement round is over.
                    if round == 0 {
                        self.set_phase(Phase::ForcedPlacement { round: 1 });
                        self.set_reset_phase(Phase::ForcedPlacement { round: 1 });
                    } else {
                        self.set_phase(Phase::StartPhase);
                    }
                } else {
                    self.set_phase(Phase::ForcedPlacement { round });
                }
            }
            Phase::NormalPlay => {
                let next = self
                    .privilege()
                    .next_after(player)
                    .expect("player is ranked");
                self.set_active(next);
                if self.privilege().rank_of(next) == Some(0) {
                    // A full privilege cycle stands in for one timer
                    // run in the turn-based variant.
                    self.bump_round();
                    self.flip_all_timers();
                    self.stop_all_timers();
                    let cycle = self.variant().banks[self.variant().council_bank()].timer_slots;
                    if self.bump_council_phase() >= cycle {
                        self.convene_council();
                        return;
                    }
                }
                self.set_phase(Phase::NormalPlay);
            }
            other => {
                self.set_phase(other);
            }
        }
    }

    fn apply_council_rewards(&mut self) {
        let rewards = self.variant().council_rewards.clone();
        for (rank, deltas) in rewards.iter().enumerate().take(self.player_count()) {
            let p = self.privilege().at_rank(rank);
            for &(track, delta) in deltas {
                self.ledger_mut(p).bump_track(track, delta);
            }
        }
        self.log_event("council rewards distributed".to_string());
    }

    fn trim_council(&mut self) {
        // Remaining display cards go under the deck; the display is
        // redealt fresh for the next sitting.
        let deck = self.cell_id(crate::board::CellRef::new(
            crate::board::RackLocation::on_board(RackKind::CouncilDeck),
            crate::board::Coord::zero(),
        ));
        for id in self.cell_ids().collect::<Vec<_>>() {
            if self.cell(id).location.kind == RackKind::CouncilSeat {
                while let Some(card) = self.cell_mut(id).pop() {
                    self.cell_mut(deck).insert_at(0, card);
                }
            }
        }
        self.deal_council_seats();

        self.recompute_privilege();
        self.reset_council_phase();
        self.bump_round();
        for p in PlayerId::all(self.player_count()) {
            self.ledger_mut(p).ui = UiState::Normal;
        }
        self.set_phase(Phase::StartPhase);
    }

    fn do_resign(&mut self, player: PlayerId) {
        if self.phase() == Phase::Resign && self.active_player() == player {
            // Second thoughts: unwind to where we were.
            let back = self.reset_phase_tag();
            self.set_phase(back);
            return;
        }
        self.set_reset_phase(self.phase());
        self.set_active(player);
        self.set_phase(Phase::Resign);
    }

    /// The opponent a resignation hands the win to: best score, ties
    /// broken by privilege rank — deterministic on every replica.
    fn best_opponent(&self, resigner: PlayerId) -> PlayerId {
        self.privilege()
            .iter()
            .filter(|&p| p != resigner)
            .max_by_key(|&p| (self.score(p), std::cmp::Reverse(self.privilege().rank_of(p))))
            .expect("another player exists")
    }

    // === Locking ===

    /// A committed action by one player locks every other player's
    /// free placements: their window for an instantaneous self-undo is
    /// over.
    fn lock_bystanders(&mut self, actor: PlayerId, mv: &Move) {
        if matches!(mv.op, MoveOp::Wait | MoveOp::SetActive | MoveOp::Pick) {
            return;
        }
        for p in PlayerId::all(self.player_count()) {
            if p != actor && self.ledgers[p].dropped.is_some() && self.ledgers[p].picked.is_none()
            {
                self.lock_player(p);
            }
        }
    }

    /// Lock one player's pending interaction in.
    pub(crate) fn lock_player(&mut self, player: PlayerId) {
        let claims: Vec<CellId> = self
            .cell_ids()
            .filter(|&id| self.cell(id).claim.map(|c| c.player) == Some(player))
            .collect();
        for id in claims {
            self.cell_mut(id).claim = None;
        }
        self.ledger_mut(player).accept_placement();
    }

    // === Transitional phases ===

    /// Resolve auto-advancing phases at the end of a submit, so they
    /// are never externally observable between moves.
    fn auto_advance(&mut self) {
        loop {
            match self.phase() {
                Phase::StartPhase => {
                    if self.variant().realtime {
                        self.flip_all_timers();
                        self.set_reset_phase(Phase::SimultaneousPlay);
                        self.set_phase(Phase::SimultaneousPlay);
                        self.log_event("timers running, open play".to_string());
                    } else {
                        // Turn-based pacing walks the hourglasses too,
                        // so rows alternate, but no clock runs.
                        self.flip_all_timers();
                        self.stop_all_timers();
                        let first = self.privilege().at_rank(0);
                        self.set_active(first);
                        self.set_reset_phase(Phase::NormalPlay);
                        self.set_phase(Phase::NormalPlay);
                    }
                }
                Phase::PendingAdvance => {
                    let back = self.reset_phase_tag();
                    self.set_phase(back);
                }
                _ => return,
            }
        }
    }
}

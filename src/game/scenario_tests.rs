//! Conflict and economy scenarios that need a staged board.
//!
//! These tests drive the engine through the public submit path but
//! stage preconditions (sub-states, placed workers) directly, which is
//! why they live next to the aggregate instead of in `tests/`.

use crate::board::{CellRef, Coord, RackKind, RackLocation, ResourceKind, UiState};
use crate::core::{PlayerId, Token, TokenKind};
use crate::economy::ChoiceKind;
use crate::error::EngineError;
use crate::moves::{Move, MoveOp};
use crate::phase::Phase;
use crate::privilege::Resolution;
use crate::variant::VariantConfig;

use super::Game;

fn open_play_game(seed: u64) -> Game {
    let mut g = Game::new(VariantConfig::standard(), 2, seed);
    g.submit(Move::start(g.privilege().at_rank(0))).unwrap();
    while matches!(g.phase(), Phase::ForcedPlacement { .. } | Phase::Confirm) {
        let player = g.active_player();
        if g.phase() == Phase::Confirm {
            g.submit(Move::done(player)).unwrap();
        } else {
            let mv = *g
                .legal_moves(player)
                .iter()
                .find(|m| m.op == MoveOp::FromTo)
                .unwrap();
            g.submit(mv).unwrap();
        }
    }
    assert_eq!(g.phase(), Phase::SimultaneousPlay);
    g
}

fn territory_ref() -> CellRef {
    CellRef::new(RackLocation::on_board(RackKind::Territory), Coord::zero())
}

fn rack_ref(player: PlayerId) -> CellRef {
    CellRef::new(
        RackLocation::owned(RackKind::CardRack, player),
        Coord::zero(),
    )
}

/// Put both players in a conquest choice so they can race for the
/// same face-up territory card.
fn stage_conquest_race(g: &mut Game) -> (PlayerId, PlayerId) {
    let first = g.privilege().at_rank(0);
    let second = g.privilege().at_rank(1);
    for p in [first, second] {
        g.ledger_mut(p).ui = UiState::AwaitingChoice {
            kind: ChoiceKind::Conquer,
            remaining: 1,
        };
    }
    (first, second)
}

#[test]
fn scenario_same_token_race_resolves_by_privilege() {
    let mut g = open_play_game(42);
    let (first, second) = stage_conquest_race(&mut g);
    let contested = g.cell(g.cell_id(territory_ref())).top().unwrap();

    // The lower-privilege player gets there first; the pick is
    // provisionally accepted and the card leaves the display.
    g.submit(Move::pick(second, territory_ref()).at(1000)).unwrap();
    assert!(g.ledger(second).picked.is_some());

    // Inside the window, the higher-privilege player grabs the same
    // card: the earlier pick is forcibly rolled back.
    g.submit(Move::pick(first, territory_ref()).at(1400)).unwrap();
    assert_eq!(g.conflicts(), 1);
    assert!(g.ledger(second).picked.is_none());
    assert_eq!(g.ledger(first).picked.unwrap().token, contested);

    // The winner's drop completes the conquest.
    g.submit(Move::drop_on(first, rack_ref(first)).at(1500)).unwrap();
    let rack = g.cell_id(rack_ref(first));
    assert_eq!(g.cell(rack).top(), Some(contested));
    assert_eq!(g.ledger(first).ui, UiState::Normal);

    // The loser's matching drop arrives as a remnant and dies quietly.
    let err = g.submit(Move::drop_on(second, rack_ref(second)).at(1600));
    assert_eq!(err, Err(EngineError::Conflict(Resolution::Ignore)));
    assert!(g.cell(g.cell_id(rack_ref(second))).is_empty());
}

#[test]
fn scenario_conflict_outcome_is_arrival_order_independent() {
    // Two replicas see the same two conflicting picks in opposite
    // orders; both must converge on the same final state.
    let run = |first_arrives_first: bool| {
        let mut g = open_play_game(42);
        let (first, second) = stage_conquest_race(&mut g);
        let a = Move::pick(first, territory_ref()).at(1400);
        let b = Move::pick(second, territory_ref()).at(1000);

        let (x, y) = if first_arrives_first { (a, b) } else { (b, a) };
        let _ = g.submit(x);
        let _ = g.submit(y);

        // Whoever holds the card drops it; the other side's remnant
        // drop (if any) is ignored.
        for p in [first, second] {
            if g.ledger(p).picked.is_some() {
                g.submit(Move::drop_on(p, rack_ref(p)).at(1700)).unwrap();
            }
        }
        (g.digest(), g.conflicts())
    };

    let (digest_ab, conflicts_ab) = run(true);
    let (digest_ba, conflicts_ba) = run(false);
    assert_eq!(digest_ab, digest_ba);
    assert_eq!(conflicts_ab, 1);
    assert_eq!(conflicts_ba, 1);
}

#[test]
fn scenario_stale_conflict_is_not_resolved() {
    let mut g = open_play_game(42);
    let (first, second) = stage_conquest_race(&mut g);

    g.submit(Move::pick(second, territory_ref()).at(1000)).unwrap();

    // Far outside the window: the incoming action is abandoned even
    // though its privilege is higher.
    let err = g.submit(Move::pick(first, territory_ref()).at(5000));
    assert_eq!(err, Err(EngineError::Conflict(Resolution::Ignore)));
    assert!(g.ledger(second).picked.is_some());
    assert_eq!(g.conflicts(), 1);
}

#[test]
fn scenario_exact_payment_then_exclusion() {
    let mut g = open_play_game(42);
    let player = g.privilege().at_rank(0);
    let coin = ResourceKind(2);

    // Drain the pool down to exactly one payment's worth.
    let excess = g.ledger(player).resource(coin).saturating_sub(2);
    g.ledger_mut(player).pay(coin, excess);
    assert_eq!(g.ledger(player).resource(coin), 2);

    // A worker on the timed row of bank 1, whose actions cost 2 coin.
    let bank = 1u8;
    let row = g.timed_row(bank as usize);
    let slot = g.worker_slot(bank, row, 0);
    g.cell_mut(slot).push(Token::owned(TokenKind::Worker, player));

    let action_ref = g.cell(g.action_slot(bank, row, 0)).cell_ref();
    let slot_ref = g.cell(slot).cell_ref();
    g.submit(Move::from_to(player, slot_ref, action_ref)).unwrap();

    // Paid down to exactly zero.
    assert_eq!(g.ledger(player).resource(coin), 0);

    // A second worker cannot afford the same action: it is absent
    // from the target map entirely.
    let slot2 = g.worker_slot(bank, row, 1);
    g.cell_mut(slot2).push(Token::owned(TokenKind::Worker, player));
    let targets = g.generate_targets(player);
    let action2 = g.action_slot(bank, row, 1);
    assert!(!targets.contains_key(&action2));
    assert!(!g
        .legal_moves(player)
        .iter()
        .any(|m| m.to == Some(g.cell(action2).cell_ref())));
}

#[test]
fn scenario_expired_timer_offers_one_flip_per_bank() {
    let mut g = open_play_game(42);
    let player = g.privilege().at_rank(0);

    // Only bank 0 (45 s) runs out.
    g.advance_timers(46_000);
    assert!(g.timer(0).expired());
    assert!(!g.timer(1).expired());

    let flips: Vec<_> = g
        .legal_moves(player)
        .into_iter()
        .filter(|m| m.op == MoveOp::Flip)
        .collect();
    assert_eq!(flips.len(), 1);
    assert_eq!(flips[0].choice, Some(0));

    g.submit(flips[0]).unwrap();
    assert!(g.timer(0).running);
    assert!(!g.timer(0).expired());
    assert_eq!(g.timer(0).remaining_ms, 45_000);
    assert_eq!(g.timer(0).flips, 2);
}

#[test]
fn scenario_council_timer_forces_flip_phase() {
    let mut g = open_play_game(42);
    let player = g.privilege().at_rank(0);
    let council = g.variant().council_bank() as u8;

    // The council bank running out pauses open play entirely.
    g.advance_timers(181_000);
    assert_eq!(g.phase(), Phase::TimerFlip);

    // Only flips are on offer now.
    assert!(g
        .legal_moves(player)
        .iter()
        .all(|m| m.op == MoveOp::Flip));

    g.submit(Move::flip(player, council)).unwrap();
    assert_eq!(g.council_phase(), 1);
    assert_eq!(g.phase(), Phase::SimultaneousPlay);
}

#[test]
fn scenario_full_council_cycle_reorders_privilege() {
    let mut g = open_play_game(42);
    let council = g.variant().council_bank() as u8;

    // Give the lower-ranked player a commanding standing in the
    // ranking resource before the council convenes.
    let trailing = g.privilege().at_rank(1);
    let votes = g.variant().rank_resource;
    g.ledger_mut(trailing).gain_available(votes, 20);

    // Complete the council bank's four-slot cycle.
    for _ in 0..4 {
        g.advance_timers(181_000);
        assert_eq!(g.phase(), Phase::TimerFlip);
        let player = g.active_player();
        g.submit(Move::flip(player, council)).unwrap();
    }
    assert_eq!(g.phase(), Phase::CouncilPlay);

    // Selections run in privilege order; each player takes one card.
    for _ in 0..g.player_count() {
        let player = g.active_player();
        assert!(matches!(
            g.ledger(player).ui,
            UiState::AwaitingChoice {
                kind: ChoiceKind::CouncilCard,
                ..
            }
        ));
        let take = *g
            .legal_moves(player)
            .iter()
            .find(|m| m.op == MoveOp::FromTo)
            .expect("a seat is on offer");
        g.submit(take).unwrap();
        // Clear any follow-on choice the card opened.
        while !g.ledger(player).ui.is_quiet() {
            let mv = g.legal_moves(player)[0];
            g.submit(mv).unwrap();
        }
    }
    assert_eq!(g.phase(), Phase::CouncilRewards);

    let leader = g.privilege().at_rank(0);
    g.submit(Move::done(leader)).unwrap();
    assert_eq!(g.phase(), Phase::CouncilTrim);
    g.submit(Move::done(leader)).unwrap();

    // Trim redealt the display, recomputed privilege and restarted
    // the timers.
    assert_eq!(g.phase(), Phase::SimultaneousPlay);
    assert_eq!(g.privilege().at_rank(0), trailing);
    assert_eq!(g.round(), 1);
    assert_eq!(g.council_phase(), 0);
    for bank in 0..g.variant().banks.len() {
        assert!(g.timer(bank).running);
    }
    for slot in 0..g.variant().council_seats {
        let seat = g.cell_id(CellRef::new(
            RackLocation::on_board(RackKind::CouncilSeat),
            Coord::new(0, 0, slot),
        ));
        assert_eq!(g.cell(seat).height(), 1);
    }
}

#[test]
fn scenario_free_placement_locks_on_opposing_action() {
    let mut g = open_play_game(42);
    let (first, second) = (g.privilege().at_rank(0), g.privilege().at_rank(1));

    // First player makes a free placement; it is still undoable.
    let placement = *g
        .legal_moves(first)
        .iter()
        .find(|m| {
            m.op == MoveOp::FromTo
                && m.to
                    .is_some_and(|t| t.loc.kind == RackKind::WorkerSlot)
        })
        .unwrap();
    g.submit(placement).unwrap();
    assert!(g.ledger(first).dropped.is_some());

    // An opposing committed action ends the undo window.
    let other = *g
        .legal_moves(second)
        .iter()
        .find(|m| m.op == MoveOp::FromTo)
        .unwrap();
    g.submit(other).unwrap();
    assert!(g.ledger(first).dropped.is_none());

    // The undo pick is no longer offered.
    assert!(!g
        .legal_moves(first)
        .iter()
        .any(|m| m.op == MoveOp::Pick));
}

#[test]
fn scenario_recruiting_clamps_at_the_cap() {
    let mut variant = VariantConfig::standard();
    variant.banks[0].columns[0] = crate::variant::SlotConfig::new(
        crate::economy::Cost::Free,
        crate::economy::Benefit::Recruit,
    );
    let mut g = Game::new(variant, 2, 17);
    g.submit(Move::start(g.privilege().at_rank(0))).unwrap();
    while matches!(g.phase(), Phase::ForcedPlacement { .. } | Phase::Confirm) {
        let player = g.active_player();
        if g.phase() == Phase::Confirm {
            g.submit(Move::done(player)).unwrap();
        } else {
            let mv = *g
                .legal_moves(player)
                .iter()
                .find(|m| m.op == MoveOp::FromTo)
                .unwrap();
            g.submit(mv).unwrap();
        }
    }

    let player = g.privilege().at_rank(0);
    let cap = g.variant().max_recruits;
    let row = g.timed_row(0);
    let slot = g.worker_slot(0, row, 0);
    let slot_ref = g.cell(slot).cell_ref();
    let action_ref = g.cell(g.action_slot(0, row, 0)).cell_ref();
    let reserve = g.owned_cell(player, RackKind::WorkerReserve);
    let before = g.cell(reserve).height();

    // Take the recruiting action one more time than the cap allows.
    for _ in 0..=cap {
        g.cell_mut(slot).push(Token::owned(TokenKind::Worker, player));
        g.submit(Move::from_to(player, slot_ref, action_ref)).unwrap();
    }

    assert_eq!(g.ledger(player).recruits, cap);
    assert_eq!(g.cell(reserve).height(), before + cap as usize);
}

#[test]
fn scenario_retrieve_pulls_a_worker_home() {
    let mut g = open_play_game(42);
    let player = g.privilege().at_rank(0);

    // Bank 0's last column grants a retrieval for free.
    let row = g.timed_row(0);
    let col = (g.variant().banks[0].columns.len() - 1) as u8;
    let slot = g.worker_slot(0, row, col);
    g.cell_mut(slot).push(Token::owned(TokenKind::Worker, player));
    let slot_ref = g.cell(slot).cell_ref();
    let action_ref = g.cell(g.action_slot(0, row, col)).cell_ref();

    g.submit(Move::from_to(player, slot_ref, action_ref)).unwrap();
    assert_eq!(
        g.ledger(player).ui,
        UiState::AwaitingChoice {
            kind: ChoiceKind::Retrieve,
            remaining: 1
        }
    );

    // Every offered answer brings a worker back to a reserve.
    let retrieve = *g
        .legal_moves(player)
        .iter()
        .find(|m| {
            m.op == MoveOp::FromTo
                && m.to.is_some_and(|t| {
                    matches!(
                        t.loc.kind,
                        RackKind::WorkerReserve | RackKind::ChiefReserve
                    )
                })
        })
        .expect("a retrieval is offered");
    let reserve = g.cell_id(retrieve.to.unwrap());
    let before = g.cell(reserve).height();
    g.submit(retrieve).unwrap();

    assert_eq!(g.ledger(player).ui, UiState::Normal);
    assert_eq!(g.cell(reserve).height(), before + 1);
}

#[test]
fn scenario_worker_slot_drop_race() {
    let mut g = open_play_game(42);
    let (first, second) = (g.privilege().at_rank(0), g.privilege().at_rank(1));

    // Both players aim a worker at the same empty slot. The second
    // player's drop lands first and is still in flight.
    let bank = 0u8;
    let row = g.placement_row(bank as usize);
    let target = g.worker_slot(bank, row, 0);
    if !g.cell(target).is_empty() {
        // Forced placement happened to use this slot; free it.
        g.cell_mut(target).clear();
    }
    let target_ref = g.cell(target).cell_ref();

    let reserve_of = |g: &Game, p: PlayerId| {
        g.cell(g.owned_cell(p, RackKind::WorkerReserve)).cell_ref()
    };

    let from_second = reserve_of(&g, second);
    g.submit(Move::from_to(second, from_second, target_ref).at(2000))
        .unwrap();
    assert!(g.cell(target).holds_token_of(second));

    // The first player's conflicting drop overrides it.
    let from_first = reserve_of(&g, first);
    g.submit(Move::from_to(first, from_first, target_ref).at(2300))
        .unwrap();
    assert_eq!(g.conflicts(), 1);
    assert!(g.cell(target).holds_token_of(first));
    assert!(!g.cell(target).holds_token_of(second));

    // The loser's worker went home.
    let home = g.cell_id(from_second);
    assert_eq!(g.cell(home).height(), 1);
}

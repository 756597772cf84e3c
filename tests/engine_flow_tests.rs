//! End-to-end flows through the public API.

use clepsydra::{
    Game, GameRecord, GameSession, Move, MoveOp, Phase, RackKind, SearchContext, VariantConfig,
};

fn started(players: usize, seed: u64) -> Game {
    let mut g = Game::new(VariantConfig::standard(), players, seed);
    g.submit(Move::start(g.privilege().at_rank(0))).unwrap();
    g
}

/// Drive forced placement to completion by taking the first placement
/// and confirming each one.
fn into_open_play(g: &mut Game) {
    while matches!(g.phase(), Phase::ForcedPlacement { .. } | Phase::Confirm) {
        let player = g.active_player();
        if g.phase() == Phase::Confirm {
            g.submit(Move::done(player)).unwrap();
        } else {
            let mv = *g
                .legal_moves(player)
                .iter()
                .find(|m| m.op == MoveOp::FromTo)
                .expect("placement offered");
            g.submit(mv).unwrap();
        }
    }
}

#[test]
fn generator_soundness_along_a_full_opening() {
    // Every move the target map offers must apply cleanly against the
    // same state it was generated from.
    let mut g = started(3, 1234);
    for _ in 0..60 {
        if g.phase().is_game_over() {
            break;
        }
        let player = g.active_player();

        for (_, &mv) in g.generate_targets(player).iter() {
            let mut probe = g.clone_game();
            probe
                .submit(mv)
                .unwrap_or_else(|e| panic!("target move {} rejected: {e}", mv.to_wire()));
        }
        for &mv in g.legal_moves(player).iter() {
            let mut probe = g.clone_game();
            probe
                .submit(mv)
                .unwrap_or_else(|e| panic!("legal move {} rejected: {e}", mv.to_wire()));
        }

        // Advance with a non-undo move so the walk makes progress.
        let mv = if g.phase() == Phase::Confirm {
            Move::done(player)
        } else {
            *g.legal_moves(player)
                .iter()
                .find(|m| m.op != MoveOp::Pick)
                .expect("some move exists")
        };
        g.submit(mv).unwrap();
    }
}

#[test]
fn clone_fidelity_at_every_step() {
    let mut g = started(2, 99);
    for _ in 0..40 {
        assert_eq!(g.clone_game().digest(), g.digest());
        if g.phase().is_game_over() {
            break;
        }
        let player = g.active_player();
        let mv = if g.phase() == Phase::Confirm {
            Move::done(player)
        } else {
            *g.legal_moves(player)
                .iter()
                .find(|m| m.op != MoveOp::Pick)
                .unwrap()
        };
        g.submit(mv).unwrap();
    }
}

#[test]
fn free_move_reversibility_by_digest() {
    let mut g = started(2, 5);
    into_open_play(&mut g);

    let player = g.active_player();
    let before = g.digest();

    // A free placement: pick and drop, then take both back.
    let placement = *g
        .legal_moves(player)
        .iter()
        .find(|m| {
            m.op == MoveOp::FromTo && m.to.is_some_and(|t| t.loc.kind == RackKind::WorkerSlot)
        })
        .expect("a free placement exists");
    g.submit(placement).unwrap();
    assert_ne!(g.digest(), before);

    g.submit(Move::pick(player, placement.to.unwrap())).unwrap();
    g.submit(Move::drop_on(player, placement.from.unwrap()))
        .unwrap();
    assert_eq!(g.digest(), before);
}

#[test]
fn wire_round_trip_through_submit() {
    let mut g = started(2, 7);
    let player = g.active_player();
    let mv = *g
        .legal_moves(player)
        .iter()
        .find(|m| m.op == MoveOp::FromTo)
        .unwrap();

    // Serialize, reparse, submit the parsed form.
    let parsed = Move::from_wire(&mv.to_wire()).unwrap();
    assert_eq!(parsed, mv);
    g.submit(parsed).unwrap();
    assert_eq!(g.phase(), Phase::Confirm);
}

#[test]
fn replay_round_trip_with_record() {
    let variant = VariantConfig::standard();
    let mut g = Game::new(variant.clone(), 2, 31);
    let mut record = GameRecord::new(variant, 2, 31);

    let start = Move::start(g.privilege().at_rank(0));
    g.submit(start).unwrap();
    record.record(start);

    for _ in 0..25 {
        if g.phase().is_game_over() {
            break;
        }
        let player = g.active_player();
        let mv = if g.phase() == Phase::Confirm {
            Move::done(player)
        } else {
            *g.legal_moves(player)
                .iter()
                .find(|m| m.op != MoveOp::Pick)
                .unwrap()
        };
        g.submit(mv).unwrap();
        record.record(mv);
    }

    let bytes = record.to_bytes().unwrap();
    let rebuilt = GameRecord::from_bytes(&bytes).unwrap().replay();
    assert_eq!(rebuilt.digest(), g.digest());
}

#[test]
fn search_adapter_full_contract() {
    let mut live = started(2, 55);
    into_open_play(&mut live);

    let mut ctx = SearchContext::new(&live);
    let baseline = live.digest();

    // A short search line: legal moves, make, evaluate.
    for _ in 0..10 {
        if ctx.game().phase().is_game_over() {
            break;
        }
        let player = ctx.game().active_player();
        let moves = ctx.legal_moves(player);
        assert!(!moves.is_empty());
        ctx.make_move(moves[0]).unwrap();
        let value = ctx.evaluate(player);
        assert!((0.0..=1.0).contains(&value));
    }

    // The live replica never moved; backtracking re-clones.
    assert_eq!(live.digest(), baseline);
    ctx.reset_from(&live);
    assert_eq!(ctx.game().digest(), baseline);
}

#[test]
fn session_hosts_a_live_game() {
    let mut g = Game::new(VariantConfig::standard(), 2, 21);
    let first = g.privilege().at_rank(0);
    g.submit(Move::start(first)).unwrap();
    let expected_phase = g.phase();

    let session = GameSession::spawn(g);
    let targets = session.generate_targets(first).unwrap();
    assert!(!targets.is_empty());

    // Submit through the session, watch the digest move.
    let before = session.digest().unwrap();
    let mv = *targets.values().next().unwrap();
    session.submit(mv).unwrap();
    assert_ne!(session.digest().unwrap(), before);

    // Timers tick without blocking the caller.
    session.advance_timers(500).unwrap();

    let snapshot = session.snapshot().unwrap();
    assert_ne!(snapshot.phase(), expected_phase);
}

#[test]
fn turn_based_variant_uses_confirm_cycle() {
    let variant = VariantConfig::standard().turn_based();
    let mut g = Game::new(variant, 2, 77);
    g.submit(Move::start(g.privilege().at_rank(0))).unwrap();
    into_open_play(&mut g);
    assert_eq!(g.phase(), Phase::NormalPlay);

    // One action, one confirm, and the turn passes on.
    let player = g.active_player();
    let mv = *g
        .legal_moves(player)
        .iter()
        .find(|m| m.op == MoveOp::FromTo)
        .unwrap();
    g.submit(mv).unwrap();
    assert_eq!(g.phase(), Phase::Confirm);
    g.submit(Move::done(player)).unwrap();
    assert_eq!(g.phase(), Phase::NormalPlay);
    assert_ne!(g.active_player(), player);

    // No timers run in the turn-based variant.
    for bank in 0..g.variant().banks.len() {
        assert!(!g.timer(bank).running);
    }
}

#[test]
fn events_record_the_audit_trail() {
    let mut g = started(2, 3);
    assert!(g
        .events()
        .iter()
        .any(|line| line.contains("game started")));
    into_open_play(&mut g);
    assert!(g.events().iter().any(|line| line.contains("open play")));
}

//! The root aggregate.
//!
//! A `Game` owns the phase machine, the cell arena, the player ledgers,
//! the timers, the privilege order and all bookkeeping counters. It is
//! the unit cloned for search and the unit fingerprinted by the digest
//! engine. Moves are the sole externally observable mutation path.
//!
//! The state of the game is represented by the contents of the cells,
//! the ledgers, the active player and an explicit phase tag. All
//! transitions specified by moves are mediated by the phase. The
//! philosophy is to be extremely restrictive about what each phase
//! allows and to keep tripwires for unexpected transitions: we expect
//! to be fed only legal moves, but mistakes happen and it is good to
//! catch the unexpected early.

mod apply;
mod generator;
#[cfg(test)]
mod scenario_tests;

use im::Vector;
use rustc_hash::FxHashMap;

use crate::board::{
    Cell, CellId, CellRef, Coord, PlayerLedger, RackKind, RackLocation, ResourceKind, Timer,
    UiState,
};
use crate::core::{GameRng, PlayerId, PlayerMap, Token, TokenKind};
use crate::digest::DigestTables;
use crate::economy::{Benefit, ChoiceKind, Cost};
use crate::moves::Move;
use crate::phase::Phase;
use crate::privilege::PrivilegeOrder;
use crate::variant::VariantConfig;

/// How many times a digestible position may recur before the engine
/// offers a draw.
const REPETITION_LIMIT: u8 = 3;

/// The complete state of one play session.
#[derive(Clone, Debug)]
pub struct Game {
    variant: VariantConfig,
    players: usize,
    seed: u64,

    phase: Phase,
    /// Phase to restore when a confirmation or resignation unwinds.
    reset_phase: Phase,
    active_player: PlayerId,

    cells: Vec<Cell>,
    lookup: FxHashMap<CellRef, CellId>,
    ledgers: PlayerMap<PlayerLedger>,
    timers: Vec<Timer>,
    privilege: PrivilegeOrder,

    council_phase: u8,
    /// Players who have taken their council selection this sitting.
    council_progress: u8,
    round: u32,
    move_number: u32,
    conflicts: u64,
    repetition: bool,
    winner: Option<PlayerId>,

    seen: FxHashMap<u64, u8>,
    events: Vector<String>,
    history: Vector<Move>,

    tables: DigestTables,
    rng: GameRng,
}

impl Game {
    /// Construct a game from a variant, a seating count and a seed.
    ///
    /// The seed drives deck shuffles and the initial privilege order;
    /// the same inputs always build the identical starting position.
    #[must_use]
    pub fn new(variant: VariantConfig, players: usize, seed: u64) -> Self {
        variant.validate();
        assert!(players >= 2, "need at least 2 players");
        assert!(
            players <= variant.council_rewards.len(),
            "variant supports at most {} players",
            variant.council_rewards.len()
        );

        let mut rng = GameRng::new(seed);
        let (cells, lookup) = build_arena(&variant, players);
        let tables = DigestTables::new(cells.len(), players);

        let ledgers = PlayerMap::new(players, |p| {
            let mut ledger = PlayerLedger::new(
                p,
                &variant.reserves,
                variant.track_count,
                variant.track_max,
            );
            for (i, &amount) in variant.starting_resources.iter().enumerate() {
                ledger.gain_available(ResourceKind(i as u8), amount);
            }
            for (i, &value) in variant.starting_tracks.iter().enumerate() {
                ledger.bump_track(crate::board::TrackId(i as u8), i16::from(value));
            }
            ledger
        });

        let timers = variant
            .banks
            .iter()
            .map(|b| Timer::new(b.duration_ms))
            .collect();

        // Randomize the initial privilege order.
        let mut order: Vec<PlayerId> = PlayerId::all(players).collect();
        rng.shuffle(&mut order);

        let mut game = Self {
            variant,
            players,
            seed,
            phase: Phase::Setup,
            reset_phase: Phase::Setup,
            active_player: order[0],
            cells,
            lookup,
            ledgers,
            timers,
            privilege: PrivilegeOrder::new(order),
            council_phase: 0,
            council_progress: 0,
            round: 0,
            move_number: 1,
            conflicts: 0,
            repetition: false,
            winner: None,
            seen: FxHashMap::default(),
            events: Vector::new(),
            history: Vector::new(),
            tables,
            rng,
        };
        game.setup_material();
        game
    }

    /// Deal decks, seed reserves, place hourglasses.
    fn setup_material(&mut self) {
        // Worker material into the player reserves.
        for p in PlayerId::all(self.players) {
            let worker_reserve = self.cell_id(CellRef::new(
                RackLocation::owned(RackKind::WorkerReserve, p),
                Coord::zero(),
            ));
            for _ in 0..self.variant.workers_per_player {
                self.cells[worker_reserve.index()].push(Token::owned(TokenKind::Worker, p));
            }
            let chief_reserve = self.cell_id(CellRef::new(
                RackLocation::owned(RackKind::ChiefReserve, p),
                Coord::zero(),
            ));
            for _ in 0..self.variant.chiefs_per_player {
                self.cells[chief_reserve.index()].push(Token::owned(TokenKind::Chief, p));
            }
        }

        // Hourglasses onto the first timer slot of each bank.
        for (bank, _) in self.variant.banks.iter().enumerate() {
            let slot = self.cell_id(CellRef::new(
                RackLocation::on_board(RackKind::TimerSlot),
                Coord::new(bank as u8, 0, 0),
            ));
            self.cells[slot.index()].push(Token::neutral(TokenKind::Hourglass));
        }

        // Shuffle and stack the council deck, then deal the display.
        let mut council: Vec<u16> = self.variant.council_deck.iter().map(|c| c.id).collect();
        self.rng.shuffle(&mut council);
        let deck = self.single_cell(RackKind::CouncilDeck);
        for id in council {
            self.cells[deck.index()].push(Token::neutral(TokenKind::Card(id)));
        }
        self.deal_council_seats();

        // Same for territories.
        let mut territories: Vec<u16> =
            self.variant.territory_deck.iter().map(|c| c.id).collect();
        self.rng.shuffle(&mut territories);
        let deck = self.single_cell(RackKind::TerritoryDeck);
        for id in territories {
            self.cells[deck.index()].push(Token::neutral(TokenKind::Card(id)));
        }
        for slot in 0..self.variant.territory_display {
            let display = self.cell_id(CellRef::new(
                RackLocation::on_board(RackKind::Territory),
                Coord::new(0, 0, slot),
            ));
            self.deal_top(RackKind::TerritoryDeck, display);
        }
    }

    /// Refill the council display from the deck.
    pub(crate) fn deal_council_seats(&mut self) {
        for slot in 0..self.variant.council_seats {
            let seat = self.cell_id(CellRef::new(
                RackLocation::on_board(RackKind::CouncilSeat),
                Coord::new(0, 0, slot),
            ));
            if self.cells[seat.index()].is_empty() {
                self.deal_top(RackKind::CouncilDeck, seat);
            }
        }
    }

    pub(crate) fn deal_top(&mut self, deck: RackKind, to: CellId) {
        let deck_id = self.single_cell(deck);
        if let Some(card) = self.cells[deck_id.index()].pop() {
            self.cells[to.index()].push(card);
        }
    }

    // === Addressing ===

    fn single_cell(&self, kind: RackKind) -> CellId {
        self.cell_id(CellRef::new(RackLocation::on_board(kind), Coord::zero()))
    }

    /// Resolve an address to its arena id. Panics on a dangling
    /// address: addresses come from the generator or from validated
    /// moves.
    #[must_use]
    pub fn cell_id(&self, cell_ref: CellRef) -> CellId {
        *self
            .lookup
            .get(&cell_ref)
            .unwrap_or_else(|| panic!("no cell at {cell_ref}"))
    }

    /// Address lookup that tolerates unknown addresses (wire input).
    #[must_use]
    pub fn find_cell(&self, cell_ref: CellRef) -> Option<CellId> {
        self.lookup.get(&cell_ref).copied()
    }

    #[must_use]
    pub fn cell(&self, id: CellId) -> &Cell {
        &self.cells[id.index()]
    }

    pub(crate) fn cell_mut(&mut self, id: CellId) -> &mut Cell {
        &mut self.cells[id.index()]
    }

    // === Accessors ===

    #[must_use]
    pub fn variant(&self) -> &VariantConfig {
        &self.variant
    }

    #[must_use]
    pub fn player_count(&self) -> usize {
        self.players
    }

    #[must_use]
    pub fn seed(&self) -> u64 {
        self.seed
    }

    #[must_use]
    pub fn phase(&self) -> Phase {
        self.phase
    }

    #[must_use]
    pub fn active_player(&self) -> PlayerId {
        self.active_player
    }

    #[must_use]
    pub fn ledger(&self, player: PlayerId) -> &PlayerLedger {
        &self.ledgers[player]
    }

    pub(crate) fn ledger_mut(&mut self, player: PlayerId) -> &mut PlayerLedger {
        &mut self.ledgers[player]
    }

    #[must_use]
    pub fn privilege(&self) -> &PrivilegeOrder {
        &self.privilege
    }

    #[must_use]
    pub fn timer(&self, bank: usize) -> &Timer {
        &self.timers[bank]
    }

    #[must_use]
    pub fn move_number(&self) -> u32 {
        self.move_number
    }

    #[must_use]
    pub fn round(&self) -> u32 {
        self.round
    }

    #[must_use]
    pub fn council_phase(&self) -> u8 {
        self.council_phase
    }

    /// Total conflicts resolved so far. Part of deterministic state.
    #[must_use]
    pub fn conflicts(&self) -> u64 {
        self.conflicts
    }

    #[must_use]
    pub fn winner(&self) -> Option<PlayerId> {
        self.winner
    }

    /// True once a digestible position has recurred to the limit.
    #[must_use]
    pub fn repetition(&self) -> bool {
        self.repetition
    }

    /// Human-readable audit log of notable events.
    #[must_use]
    pub fn events(&self) -> &Vector<String> {
        &self.events
    }

    /// Every move applied so far, in order.
    #[must_use]
    pub fn history(&self) -> &Vector<Move> {
        &self.history
    }

    /// True when no player has an uncommitted interaction.
    #[must_use]
    pub fn all_quiet(&self) -> bool {
        self.ledgers.iter().all(|(_, l)| l.is_quiet())
    }

    pub(crate) fn log_event(&mut self, event: String) {
        log::debug!("{event}");
        self.events.push_back(event);
    }

    pub(crate) fn note_conflict(&mut self, event: String) {
        self.conflicts += 1;
        self.log_event(event);
    }

    // === Rows and banks ===

    /// Timer slot currently holding a bank's hourglass.
    #[must_use]
    pub fn glass_slot(&self, bank: usize) -> u8 {
        let slots = self.variant.banks[bank].timer_slots;
        for slot in 0..slots {
            let id = self.cell_id(CellRef::new(
                RackLocation::on_board(RackKind::TimerSlot),
                Coord::new(bank as u8, 0, slot),
            ));
            if self
                .cell(id)
                .tokens()
                .any(|t| t.kind == TokenKind::Hourglass)
            {
                return slot;
            }
        }
        panic!("bank {bank} lost its hourglass");
    }

    /// The row currently being timed (actions resolve here).
    #[must_use]
    pub fn timed_row(&self, bank: usize) -> u8 {
        let slots = self.variant.banks[bank].timer_slots;
        u8::from(self.glass_slot(bank) >= slots / 2)
    }

    /// The row open for placement and movement.
    #[must_use]
    pub fn placement_row(&self, bank: usize) -> u8 {
        1 - self.timed_row(bank)
    }

    #[must_use]
    pub(crate) fn worker_slot(&self, bank: u8, row: u8, col: u8) -> CellId {
        self.cell_id(CellRef::new(
            RackLocation::on_board(RackKind::WorkerSlot),
            Coord::new(bank, row, col),
        ))
    }

    #[must_use]
    pub(crate) fn action_slot(&self, bank: u8, row: u8, col: u8) -> CellId {
        self.cell_id(CellRef::new(
            RackLocation::on_board(RackKind::ActionSlot),
            Coord::new(bank, row, col),
        ))
    }

    // === Rule resolution ===

    /// Concrete cost of dropping `token` on a cell (`PerToken`
    /// resolved through the variant's card tables).
    #[must_use]
    pub fn resolve_cost(&self, cell: &Cell, token: Token) -> Cost {
        match (&cell.cost, token.kind) {
            (Cost::PerToken, TokenKind::Card(id)) => self.variant.card(id).cost.clone(),
            (Cost::PerToken, _) => Cost::Free,
            (cost, _) => cost.clone(),
        }
    }

    /// Concrete benefit of dropping `token` on a cell.
    #[must_use]
    pub fn resolve_benefit(&self, cell: &Cell, token: Token) -> Benefit {
        match (&cell.benefit, token.kind) {
            (Benefit::PerToken, TokenKind::Card(id)) => self.variant.card(id).benefit.clone(),
            (Benefit::PerToken, _) => Benefit::None,
            (benefit, _) => benefit.clone(),
        }
    }

    // === Timers ===

    /// Consume elapsed wall-clock time on every running timer.
    ///
    /// If the council bank runs out, play is forced into `TimerFlip`
    /// until the flip move arrives — a phase transition triggered with
    /// no player move involved.
    pub fn advance_timers(&mut self, delta_ms: u64) {
        for timer in &mut self.timers {
            timer.advance(delta_ms);
        }
        let council = self.variant.council_bank();
        if self.phase == Phase::SimultaneousPlay && self.timers[council].expired() {
            self.reset_phase = self.phase;
            self.phase = Phase::TimerFlip;
        }
    }

    /// Banks whose timers have run out and await their flip.
    #[must_use]
    pub fn expired_banks(&self) -> Vec<usize> {
        self.timers
            .iter()
            .enumerate()
            .filter(|(_, t)| t.expired())
            .map(|(i, _)| i)
            .collect()
    }

    pub(crate) fn flip_all_timers(&mut self) {
        for bank in 0..self.timers.len() {
            self.flip_bank(bank);
        }
    }

    pub(crate) fn stop_all_timers(&mut self) {
        for timer in &mut self.timers {
            timer.stop();
        }
    }

    /// Flip one bank: restart its countdown and walk the hourglass to
    /// the next slot of its cycle.
    pub(crate) fn flip_bank(&mut self, bank: usize) {
        let slots = self.variant.banks[bank].timer_slots;
        let from_slot = self.glass_slot(bank);
        let to_slot = match slots {
            2 => 1 - from_slot,
            // Four-slot cycle alternates sides: 0 -> 2 -> 1 -> 3 -> 0.
            4 => [2, 3, 1, 0][from_slot as usize],
            _ => (from_slot + 1) % slots,
        };
        let from = self.cell_id(CellRef::new(
            RackLocation::on_board(RackKind::TimerSlot),
            Coord::new(bank as u8, 0, from_slot),
        ));
        let to = self.cell_id(CellRef::new(
            RackLocation::on_board(RackKind::TimerSlot),
            Coord::new(bank as u8, 0, to_slot),
        ));
        let glass = self.cells[from.index()].pop().expect("hourglass present");
        self.cells[to.index()].push(glass);
        self.timers[bank].flip();
    }

    // === Scores and termination ===

    /// A player's score: the sum of their victory tracks.
    #[must_use]
    pub fn score(&self, player: PlayerId) -> u32 {
        self.ledgers[player].score()
    }

    /// Compare scores against the victory threshold.
    ///
    /// Enters `GameOver` exactly when some score strictly exceeds the
    /// threshold; the winner is recorded only when the best score is
    /// unique. Idempotent on terminal states: re-evaluating changes
    /// nothing.
    pub fn evaluate_game_over(&mut self) -> bool {
        if self.phase.is_game_over() {
            return true;
        }
        let best = PlayerId::all(self.players)
            .map(|p| self.score(p))
            .max()
            .unwrap_or(0);
        if best <= self.variant.victory_threshold {
            return false;
        }
        let leaders: Vec<PlayerId> = PlayerId::all(self.players)
            .filter(|&p| self.score(p) == best)
            .collect();
        self.phase = Phase::GameOver;
        if leaders.len() == 1 {
            self.winner = Some(leaders[0]);
            self.log_event(format!("game over: {} wins with {best}", leaders[0]));
        } else {
            self.log_event(format!("game over: tie at {best}, no winner"));
        }
        true
    }

    // === Digest ===

    /// Order-independent 64-bit fingerprint of the complete state.
    ///
    /// Covers every occupied cell slot, every ledger counter and
    /// track, the UI sub-states, the privilege order, the phase tag,
    /// the active player, the round/council counters and each timer's
    /// `running` flag and flip count. Wall-clock remainders are
    /// excluded — replicas advance their clocks independently — as are
    /// the move number and conflict counter, so that a revisited
    /// position fingerprints identically for repetition detection.
    #[must_use]
    pub fn digest(&self) -> u64 {
        let t = &self.tables;
        let mut v = 0u64;

        for cell in &self.cells {
            for (i, token) in cell.tokens().enumerate() {
                v ^= t.mix(&[t.cell_key(cell.id), i as u64, token.code()]);
            }
        }

        for (p, ledger) in self.ledgers.iter() {
            let key = t.player_key(p);
            for r in 0..ledger.resource_count() {
                let kind = ResourceKind(r as u8);
                v ^= t.mix(&[key, 1, r as u64, u64::from(ledger.resource(kind))]);
                v ^= t.mix(&[key, 2, r as u64, u64::from(ledger.reserve(kind))]);
            }
            for tr in 0..ledger.track_count() {
                let track = crate::board::TrackId(tr as u8);
                v ^= t.mix(&[key, 3, tr as u64, u64::from(ledger.track(track))]);
            }
            v ^= t.mix(&[key, 4, ui_code(ledger.ui)]);
            v ^= t.mix(&[key, 5, u64::from(ledger.recruits)]);
        }

        for (rank, p) in self.privilege.iter().enumerate() {
            v ^= t.mix(&[6, rank as u64, t.player_key(p)]);
        }

        for (bank, timer) in self.timers.iter().enumerate() {
            v ^= t.mix(&[7, bank as u64, u64::from(timer.running), u64::from(timer.flips)]);
        }

        v ^= t.mix(&[8, self.phase.tag()]);
        v ^= t.mix(&[9, t.player_key(self.active_player)]);
        v ^= t.mix(&[10, u64::from(self.round), u64::from(self.council_phase)]);

        v
    }

    /// Record the current digest for repetition detection. Called on
    /// committed positions only (locks and done moves), never on
    /// undoable dithering.
    pub(crate) fn record_position(&mut self) {
        if !self.phase.is_digestible() {
            return;
        }
        let digest = self.digest();
        let count = self.seen.entry(digest).or_insert(0);
        *count += 1;
        if *count >= REPETITION_LIMIT && !self.phase.is_game_over() {
            self.repetition = true;
            self.reset_phase = self.phase;
            self.phase = Phase::DrawPending;
            self.log_event(format!("repetition detected at {digest:#018x}"));
        }
    }

    // === Cloning ===

    /// Compare fingerprints against a copy.
    ///
    /// A mismatch is a copy-symmetry bug in the engine, not a playable
    /// condition; it is checked in debug verification paths only.
    pub fn verify_copy(&self, copy: &Game) -> Result<(), crate::error::EngineError> {
        let expected = self.digest();
        let actual = copy.digest();
        if expected == actual {
            Ok(())
        } else {
            Err(crate::error::EngineError::DigestMismatch { expected, actual })
        }
    }

    /// Deep, independent copy for search.
    ///
    /// Debug builds verify the copy against the original fingerprint
    /// immediately.
    #[must_use]
    pub fn clone_game(&self) -> Game {
        let copy = self.clone();
        debug_assert!(
            self.verify_copy(&copy).is_ok(),
            "clone produced a digest mismatch"
        );
        copy
    }

    // === Shared bookkeeping used by apply/generator ===

    pub(crate) fn set_phase(&mut self, phase: Phase) {
        self.phase = phase;
    }

    pub(crate) fn set_reset_phase(&mut self, phase: Phase) {
        self.reset_phase = phase;
    }

    pub(crate) fn set_active(&mut self, player: PlayerId) {
        self.active_player = player;
    }

    /// Lock in every player's pending interaction.
    pub(crate) fn accept_all_placements(&mut self) {
        for (_, ledger) in self.ledgers.iter_mut() {
            ledger.accept_placement();
        }
        for cell in &mut self.cells {
            cell.claim = None;
        }
    }

    pub(crate) fn bump_move_number(&mut self) {
        self.move_number += 1;
    }

    pub(crate) fn push_history(&mut self, mv: Move) {
        self.history.push_back(mv);
    }

    pub(crate) fn recompute_privilege(&mut self) {
        let standings: Vec<u32> = PlayerId::all(self.players)
            .map(|p| self.ledgers[p].resource(self.variant.rank_resource))
            .collect();
        self.privilege.recompute(|p| standings[p.index()]);
        let order: Vec<String> = self.privilege.iter().map(|p| p.to_string()).collect();
        self.log_event(format!("privilege recomputed: {}", order.join(" > ")));
    }

    pub(crate) fn council_progress(&self) -> u8 {
        self.council_progress
    }

    pub(crate) fn set_council_progress(&mut self, n: u8) {
        self.council_progress = n;
    }

    pub(crate) fn bump_council_phase(&mut self) -> u8 {
        self.council_phase += 1;
        self.council_phase
    }

    pub(crate) fn reset_council_phase(&mut self) {
        self.council_phase = 0;
    }

    pub(crate) fn bump_round(&mut self) {
        self.round += 1;
    }

    pub(crate) fn reset_phase_tag(&self) -> Phase {
        self.reset_phase
    }

    pub(crate) fn set_winner(&mut self, winner: Option<PlayerId>) {
        self.winner = winner;
    }

    pub(crate) fn cell_ids(&self) -> impl Iterator<Item = CellId> {
        (0..self.cells.len() as u32).map(CellId)
    }
}

fn ui_code(ui: UiState) -> u64 {
    match ui {
        UiState::Normal => 0,
        UiState::Resting => 1,
        UiState::Ready => 2,
        UiState::AwaitingChoice { kind, remaining } => {
            let kind = match kind {
                ChoiceKind::GainResource => 0u64,
                ChoiceKind::PayResource => 1,
                ChoiceKind::AdvanceTrack => 2,
                ChoiceKind::Conquer => 3,
                ChoiceKind::Retrieve => 4,
                ChoiceKind::CouncilCard => 5,
            };
            3 + kind * 32 + u64::from(remaining)
        }
    }
}

/// Lay out the arena for a variant: banks with mirrored worker/action
/// rows, timer slots, decks and displays, and the per-player racks.
fn build_arena(
    variant: &VariantConfig,
    players: usize,
) -> (Vec<Cell>, FxHashMap<CellRef, CellId>) {
    let mut cells = Vec::new();
    let mut lookup = FxHashMap::default();

    let mut add = |cells: &mut Vec<Cell>,
                   lookup: &mut FxHashMap<CellRef, CellId>,
                   location: RackLocation,
                   coord: Coord,
                   cost: Cost,
                   benefit: Benefit| {
        let id = CellId(cells.len() as u32);
        let cell = Cell::new(id, location, coord).with_rules(cost, benefit);
        lookup.insert(cell.cell_ref(), id);
        cells.push(cell);
        id
    };

    for (bank_idx, bank) in variant.banks.iter().enumerate() {
        let bank_idx = bank_idx as u8;
        for row in 0..2u8 {
            for (col, slot) in bank.columns.iter().enumerate() {
                add(
                    &mut cells,
                    &mut lookup,
                    RackLocation::on_board(RackKind::WorkerSlot),
                    Coord::new(bank_idx, row, col as u8),
                    Cost::Free,
                    Benefit::None,
                );
                add(
                    &mut cells,
                    &mut lookup,
                    RackLocation::on_board(RackKind::ActionSlot),
                    Coord::new(bank_idx, row, col as u8),
                    slot.cost.clone(),
                    slot.benefit.clone(),
                );
            }
        }
        for slot in 0..bank.timer_slots {
            add(
                &mut cells,
                &mut lookup,
                RackLocation::on_board(RackKind::TimerSlot),
                Coord::new(bank_idx, 0, slot),
                Cost::Free,
                Benefit::None,
            );
        }
    }

    add(
        &mut cells,
        &mut lookup,
        RackLocation::on_board(RackKind::CouncilDeck),
        Coord::zero(),
        Cost::Free,
        Benefit::None,
    );
    for slot in 0..variant.council_seats {
        add(
            &mut cells,
            &mut lookup,
            RackLocation::on_board(RackKind::CouncilSeat),
            Coord::new(0, 0, slot),
            Cost::Free,
            Benefit::None,
        );
    }
    add(
        &mut cells,
        &mut lookup,
        RackLocation::on_board(RackKind::TerritoryDeck),
        Coord::zero(),
        Cost::Free,
        Benefit::None,
    );
    for slot in 0..variant.territory_display {
        add(
            &mut cells,
            &mut lookup,
            RackLocation::on_board(RackKind::Territory),
            Coord::new(0, 0, slot),
            Cost::Free,
            Benefit::None,
        );
    }

    for p in PlayerId::all(players) {
        add(
            &mut cells,
            &mut lookup,
            RackLocation::owned(RackKind::WorkerReserve, p),
            Coord::zero(),
            Cost::Free,
            Benefit::None,
        );
        add(
            &mut cells,
            &mut lookup,
            RackLocation::owned(RackKind::ChiefReserve, p),
            Coord::zero(),
            Cost::Free,
            Benefit::None,
        );
        // Cards land here; their printed rules apply on arrival.
        add(
            &mut cells,
            &mut lookup,
            RackLocation::owned(RackKind::CardRack, p),
            Coord::zero(),
            Cost::Free,
            Benefit::PerToken,
        );
    }

    (cells, lookup)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn game() -> Game {
        Game::new(VariantConfig::standard(), 3, 42)
    }

    #[test]
    fn test_construction_is_deterministic() {
        let a = game();
        let b = game();
        assert_eq!(a.digest(), b.digest());

        let c = Game::new(VariantConfig::standard(), 3, 43);
        assert_ne!(a.digest(), c.digest());
    }

    #[test]
    fn test_setup_material() {
        let g = game();
        for p in PlayerId::all(3) {
            let reserve = g.cell_id(CellRef::new(
                RackLocation::owned(RackKind::WorkerReserve, p),
                Coord::zero(),
            ));
            assert_eq!(g.cell(reserve).height(), 2);
            let chiefs = g.cell_id(CellRef::new(
                RackLocation::owned(RackKind::ChiefReserve, p),
                Coord::zero(),
            ));
            assert_eq!(g.cell(chiefs).height(), 1);
            assert_eq!(g.ledger(p).resource(ResourceKind(2)), 4);
        }
        // Council display is full, territories dealt.
        for slot in 0..g.variant().council_seats {
            let seat = g.cell_id(CellRef::new(
                RackLocation::on_board(RackKind::CouncilSeat),
                Coord::new(0, 0, slot),
            ));
            assert_eq!(g.cell(seat).height(), 1);
        }
    }

    #[test]
    fn test_glass_rows_at_start() {
        let g = game();
        for bank in 0..g.variant().banks.len() {
            assert_eq!(g.glass_slot(bank), 0);
            assert_eq!(g.timed_row(bank), 0);
            assert_eq!(g.placement_row(bank), 1);
        }
    }

    #[test]
    fn test_flip_walks_two_slot_bank() {
        let mut g = game();
        g.flip_bank(0);
        assert_eq!(g.glass_slot(0), 1);
        assert_eq!(g.timed_row(0), 1);
        g.flip_bank(0);
        assert_eq!(g.glass_slot(0), 0);
        assert_eq!(g.timer(0).flips, 2);
    }

    #[test]
    fn test_flip_cycles_council_bank_alternating_rows() {
        let mut g = game();
        let council = g.variant().council_bank();
        let mut rows = Vec::new();
        for _ in 0..4 {
            g.flip_bank(council);
            rows.push(g.timed_row(council));
        }
        assert_eq!(rows, vec![1, 0, 1, 0]);
        assert_eq!(g.glass_slot(council), 0);
    }

    #[test]
    fn test_clone_fidelity() {
        let g = game();
        let copy = g.clone_game();
        assert_eq!(copy.digest(), g.digest());
        assert!(g.verify_copy(&copy).is_ok());
    }

    #[test]
    fn test_verify_copy_catches_divergence() {
        let g = game();
        let mut copy = g.clone_game();
        copy.ledger_mut(PlayerId::new(0))
            .bump_track(crate::board::TrackId(0), 1);
        assert!(matches!(
            g.verify_copy(&copy),
            Err(crate::error::EngineError::DigestMismatch { .. })
        ));
    }

    #[test]
    fn test_digest_ignores_wall_clock() {
        let mut g = game();
        let before = g.digest();
        // Timers are stopped at setup; start one so time matters.
        g.flip_bank(0);
        let flipped = g.digest();
        assert_ne!(before, flipped);
        g.advance_timers(10_000);
        assert_eq!(g.digest(), flipped);
    }

    #[test]
    fn test_game_over_requires_strict_excess_and_unique_leader() {
        let mut g = game();
        let threshold = g.variant().victory_threshold;

        // At the threshold: not over.
        for _ in 0..threshold {
            g.ledger_mut(PlayerId::new(0))
                .bump_track(crate::board::TrackId(0), 1);
        }
        assert!(!g.evaluate_game_over());

        // One past it, unique leader: over with a winner.
        g.ledger_mut(PlayerId::new(0))
            .bump_track(crate::board::TrackId(0), 1);
        assert!(g.evaluate_game_over());
        assert_eq!(g.winner(), Some(PlayerId::new(0)));
        assert!(g.phase().is_game_over());

        // Idempotent on the terminal state.
        let digest = g.digest();
        assert!(g.evaluate_game_over());
        assert_eq!(g.digest(), digest);
        assert_eq!(g.winner(), Some(PlayerId::new(0)));
    }

    #[test]
    fn test_repetition_detection_offers_draw() {
        let mut g = game();
        g.record_position();
        g.record_position();
        assert!(!g.repetition());

        g.record_position();
        assert!(g.repetition());
        assert_eq!(g.phase(), Phase::DrawPending);

        // The draw state is a pass-through acceptance state.
        g.submit(Move::done(g.active_player())).unwrap();
        assert!(g.phase().is_game_over());
        assert_eq!(g.winner(), None);
    }

    #[test]
    fn test_game_over_tie_has_no_winner() {
        let mut g = game();
        let past = (g.variant().victory_threshold + 1) as i16;
        g.ledger_mut(PlayerId::new(0))
            .bump_track(crate::board::TrackId(0), past);
        g.ledger_mut(PlayerId::new(1))
            .bump_track(crate::board::TrackId(0), past);
        assert!(g.evaluate_game_over());
        assert_eq!(g.winner(), None);
    }
}

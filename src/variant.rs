//! Game-variant configuration.
//!
//! A variant describes everything rule-shaped that is not mechanism:
//! how many resource kinds and victory tracks exist, the timer banks
//! with their action-slot cost/benefit tables, the card decks, the
//! council cadence and rewards, and the tunable conflict window.
//!
//! The engine interprets none of this at compile time; a `Game` is
//! constructed from a `VariantConfig`, a player count and a seed.

use serde::{Deserialize, Serialize};
use smallvec::smallvec;

use crate::board::{ResourceKind, TrackId};
use crate::economy::{Benefit, Cost, TrackDeltas};

/// Cost/benefit pair of one action column.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotConfig {
    pub cost: Cost,
    pub benefit: Benefit,
}

impl SlotConfig {
    #[must_use]
    pub fn new(cost: Cost, benefit: Benefit) -> Self {
        Self { cost, benefit }
    }
}

/// One timer bank: a sand timer pacing two mirrored rows of action
/// columns.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BankConfig {
    /// Timer run length.
    pub duration_ms: u64,
    /// Number of timer slots the hourglass cycles through (2 for plain
    /// banks, 4 for the council bank).
    pub timer_slots: u8,
    /// Action columns; rows A and B share the same tables.
    pub columns: Vec<SlotConfig>,
    /// True for the bank whose completed cycle convenes the council.
    pub council: bool,
}

/// A card in a variant deck: id plus its cost/benefit rules, consulted
/// when a `PerToken` cell resolves against the card being played.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardSpec {
    pub id: u16,
    pub cost: Cost,
    pub benefit: Benefit,
}

/// Complete description of one game variant.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariantConfig {
    pub name: String,

    // Resources and tracks
    pub resource_count: u8,
    /// The resource whose standing recomputes privilege at checkpoints.
    pub rank_resource: ResourceKind,
    /// Finite reserve supply per resource kind.
    pub reserves: Vec<u32>,
    /// Amounts moved from reserve to active pool at setup.
    pub starting_resources: Vec<u32>,
    pub track_count: u8,
    pub track_max: u8,
    pub starting_tracks: Vec<u8>,
    /// Strictly exceeding this score wins (ties yield no winner).
    pub victory_threshold: u32,

    // Workers
    pub workers_per_player: u8,
    pub chiefs_per_player: u8,
    pub max_recruits: u8,

    // Pacing
    /// Real-time clocks on (`SimultaneousPlay`) or off (`NormalPlay`).
    pub realtime: bool,
    /// Conflict-resolution window. A tunable guard against resolving
    /// stale conflicts, not a protocol guarantee.
    pub conflict_window_ms: u64,

    // Board
    pub banks: Vec<BankConfig>,
    pub council_seats: u8,
    pub council_deck: Vec<CardSpec>,
    /// Per-rank track rewards distributed at `CouncilRewards`.
    pub council_rewards: Vec<TrackDeltas>,
    pub territory_deck: Vec<CardSpec>,
    pub territory_display: u8,
}

impl VariantConfig {
    /// The standard three-bank variant.
    ///
    /// Four resource kinds (0..3, kind 3 is the ranking resource),
    /// three victory tracks to 21, a 45 s bank, a 120 s bank and a
    /// 180 s council bank with four timer slots.
    #[must_use]
    pub fn standard() -> Self {
        let r0 = ResourceKind(0);
        let r1 = ResourceKind(1);
        let r2 = ResourceKind(2);
        let r3 = ResourceKind(3);
        let t0 = TrackId(0);
        let t1 = TrackId(1);
        let t2 = TrackId(2);

        let pay2 = || Cost::Fixed(smallvec![(r2, 2)]);

        let banks = vec![
            BankConfig {
                duration_ms: 45_000,
                timer_slots: 2,
                columns: vec![
                    SlotConfig::new(Cost::Free, Benefit::Gain(smallvec![(r3, 1)])),
                    SlotConfig::new(Cost::Free, Benefit::ChooseResource(1)),
                    SlotConfig::new(Cost::Fixed(smallvec![(r0, 4)]), Benefit::Conquer),
                    SlotConfig::new(Cost::Free, Benefit::Retrieve),
                ],
                council: false,
            },
            BankConfig {
                duration_ms: 120_000,
                timer_slots: 2,
                columns: vec![
                    SlotConfig::new(pay2(), Benefit::Tracks(smallvec![(t1, 1)])),
                    SlotConfig::new(pay2(), Benefit::Gain(smallvec![(r1, 2)])),
                    SlotConfig::new(pay2(), Benefit::Gain(smallvec![(r0, 1), (r3, 2)])),
                ],
                council: false,
            },
            BankConfig {
                duration_ms: 180_000,
                timer_slots: 4,
                columns: vec![
                    SlotConfig::new(pay2(), Benefit::ChooseTrack(1)),
                    SlotConfig::new(
                        pay2(),
                        Benefit::Tracks(smallvec![(t1, 1), (t2, 1)]),
                    ),
                    SlotConfig::new(pay2(), Benefit::ChooseResource(3)),
                ],
                council: true,
            },
        ];

        let council_deck = (0..15)
            .map(|id| CardSpec {
                id,
                cost: Cost::Free,
                benefit: match id % 5 {
                    0 => Benefit::Gain(smallvec![(r0, 3)]),
                    1 => Benefit::Tracks(smallvec![(t0, 2)]),
                    2 => Benefit::ChooseTrack(2),
                    3 => Benefit::ChooseResource(2),
                    _ => Benefit::Recruit,
                },
            })
            .collect();

        let territory_deck = (100..112)
            .map(|id| CardSpec {
                id,
                cost: Cost::Free,
                benefit: match id % 3 {
                    0 => Benefit::Tracks(smallvec![(t0, 1)]),
                    1 => Benefit::Tracks(smallvec![(t2, 1)]),
                    _ => Benefit::Gain(smallvec![(r1, 2)]),
                },
            })
            .collect();

        Self {
            name: "standard".to_string(),
            resource_count: 4,
            rank_resource: r3,
            reserves: vec![15, 15, 15, 25],
            starting_resources: vec![2, 2, 4, 3],
            track_count: 3,
            track_max: 21,
            starting_tracks: vec![0, 0, 0],
            victory_threshold: 12,
            workers_per_player: 2,
            chiefs_per_player: 1,
            max_recruits: 4,
            realtime: true,
            conflict_window_ms: 1000,
            banks,
            council_seats: 5,
            council_deck,
            council_rewards: vec![
                smallvec![(t0, 2)],
                smallvec![(t0, 1)],
                smallvec![(t1, 1)],
                smallvec![(t2, 1)],
                smallvec![],
            ],
            territory_deck,
            territory_display: 4,
        }
    }

    /// Turn real-time pacing off; play becomes turn-ordered.
    #[must_use]
    pub fn turn_based(mut self) -> Self {
        self.realtime = false;
        self
    }

    #[must_use]
    pub fn with_victory_threshold(mut self, threshold: u32) -> Self {
        self.victory_threshold = threshold;
        self
    }

    #[must_use]
    pub fn with_conflict_window_ms(mut self, window_ms: u64) -> Self {
        self.conflict_window_ms = window_ms;
        self
    }

    /// Rules of a card, by id. Panics on an unknown id: card ids come
    /// from tokens the engine itself dealt.
    #[must_use]
    pub fn card(&self, id: u16) -> &CardSpec {
        self.council_deck
            .iter()
            .chain(self.territory_deck.iter())
            .find(|c| c.id == id)
            .unwrap_or_else(|| panic!("unknown card id {id}"))
    }

    /// Index of the council bank.
    #[must_use]
    pub fn council_bank(&self) -> usize {
        self.banks
            .iter()
            .position(|b| b.council)
            .expect("variant has no council bank")
    }

    /// Internal consistency checks, run at game construction.
    pub fn validate(&self) {
        assert_eq!(self.reserves.len(), self.resource_count as usize);
        assert_eq!(self.starting_resources.len(), self.resource_count as usize);
        assert_eq!(self.starting_tracks.len(), self.track_count as usize);
        assert!(self.rank_resource.index() < self.resource_count as usize);
        assert!(!self.banks.is_empty(), "variant needs at least one bank");
        assert_eq!(
            self.banks.iter().filter(|b| b.council).count(),
            1,
            "variant needs exactly one council bank"
        );
        for bank in &self.banks {
            assert!(bank.timer_slots >= 2);
            assert!(!bank.columns.is_empty());
        }
        assert!(
            self.council_deck.len() >= self.council_seats as usize,
            "council deck too small for the display"
        );
        assert!(
            self.territory_deck.len() >= self.territory_display as usize,
            "territory deck too small for the display"
        );
    }
}

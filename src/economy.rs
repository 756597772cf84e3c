//! The economy engine: cost payment and benefit collection.
//!
//! Every cell declares a cost and a benefit. Costs verify affordability
//! with the same predicate the move generator uses, then transfer
//! resources from a player's active pool into the reserve. Benefits
//! transfer the other way, bump victory tracks, or open a *choice
//! sub-state* requiring the player to submit more select moves before
//! the interaction completes.
//!
//! `PerToken` costs and benefits are placeholders resolved by the game
//! aggregate through the variant's card tables before anything here
//! runs; the functions in this module only ever see concrete rules.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::board::{PlayerLedger, ResourceKind, TrackId};

/// Fixed resource amounts, e.g. "2 coin + 1 grain".
pub type ResourceAmounts = SmallVec<[(ResourceKind, u32); 2]>;

/// Signed victory-track deltas.
pub type TrackDeltas = SmallVec<[(TrackId, i16); 2]>;

/// What dropping a token on a cell costs.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Cost {
    /// No cost; the drop stays self-undoable until locked.
    Free,
    /// Fixed amounts of specific resources.
    Fixed(ResourceAmounts),
    /// Pay `n` resources of any mix — opens a payment choice.
    AnyResources(u32),
    /// Give up victory-track progress.
    Track { track: TrackId, amount: u8 },
    /// Read the cost off the token being played.
    PerToken,
}

/// What dropping a token on a cell yields.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Benefit {
    None,
    /// Collect fixed resources (silently clamped to the reserve).
    Gain(ResourceAmounts),
    /// Bump victory tracks (silently clamped to their bounds).
    Tracks(TrackDeltas),
    /// Choose `n` resources to collect, one select move each.
    ChooseResource(u8),
    /// Choose a victory track to advance, `n` steps.
    ChooseTrack(u8),
    /// Choose a face-up territory to conquer.
    Conquer,
    /// Pull one of your placed workers back.
    Retrieve,
    /// Add a worker to the reserve, up to the variant's recruit cap.
    Recruit,
    /// Read the benefit off the token being played.
    PerToken,
}

/// The kinds of pending choice a player can owe.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChoiceKind {
    /// Pick a resource to collect.
    GainResource,
    /// Pick a resource to pay.
    PayResource,
    /// Pick a victory track to advance.
    AdvanceTrack,
    /// Pick a territory to conquer.
    Conquer,
    /// Pick a placed worker to retrieve.
    Retrieve,
    /// Pick a council reward.
    CouncilCard,
}

/// Result of paying a cost.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CostOutcome {
    /// Nothing was paid; the placement stays undoable.
    FreeUndoable,
    /// Resources moved; the placement is locked in.
    Paid,
    /// The player owes `0` more payment selects of any resource.
    Choice(u8),
}

/// Result of collecting a benefit.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BenefitOutcome {
    /// Fully applied.
    Done,
    /// The player owes follow-on select moves.
    Choice(ChoiceKind, u8),
}

/// Affordability predicate, shared verbatim between the move generator
/// and cost application.
///
/// Panics on `PerToken`: the caller resolves card rules first.
#[must_use]
pub fn can_pay(ledger: &PlayerLedger, cost: &Cost) -> bool {
    match cost {
        Cost::Free => true,
        Cost::Fixed(amounts) => amounts
            .iter()
            .all(|&(kind, amount)| ledger.resource(kind) >= amount),
        Cost::AnyResources(n) => ledger.total_resources() >= *n,
        Cost::Track { track, amount } => ledger.track(*track) >= *amount,
        Cost::PerToken => panic!("unresolved PerToken cost"),
    }
}

/// Deduct a cost from the ledger.
///
/// Affordability must have been verified with [`can_pay`] first;
/// transfers assert on shortfall.
pub fn apply_cost(ledger: &mut PlayerLedger, cost: &Cost) -> CostOutcome {
    match cost {
        Cost::Free => CostOutcome::FreeUndoable,
        Cost::Fixed(amounts) => {
            for &(kind, amount) in amounts {
                ledger.pay(kind, amount);
            }
            CostOutcome::Paid
        }
        Cost::AnyResources(n) => CostOutcome::Choice(*n as u8),
        Cost::Track { track, amount } => {
            ledger.bump_track(*track, -i16::from(*amount));
            CostOutcome::Paid
        }
        Cost::PerToken => panic!("unresolved PerToken cost"),
    }
}

/// Collect a benefit into the ledger.
///
/// Benefits never fail: short reserves collect partially, maxed tracks
/// clamp, and impossible choices degrade to `Done` (a choice of zero
/// options is not owed).
pub fn apply_benefit(ledger: &mut PlayerLedger, benefit: &Benefit) -> BenefitOutcome {
    match benefit {
        Benefit::None => BenefitOutcome::Done,
        Benefit::Gain(amounts) => {
            for &(kind, amount) in amounts {
                ledger.gain_available(kind, amount);
            }
            BenefitOutcome::Done
        }
        Benefit::Tracks(deltas) => {
            for &(track, delta) in deltas {
                ledger.bump_track(track, delta);
            }
            BenefitOutcome::Done
        }
        Benefit::ChooseResource(n) => {
            let n = u32::from(*n).min(ledger.total_reserve()) as u8;
            if n == 0 {
                BenefitOutcome::Done
            } else {
                BenefitOutcome::Choice(ChoiceKind::GainResource, n)
            }
        }
        Benefit::ChooseTrack(steps) => {
            let maxed =
                (0..ledger.track_count()).all(|t| track_maxed(ledger, TrackId(t as u8)));
            if maxed || *steps == 0 {
                BenefitOutcome::Done
            } else {
                BenefitOutcome::Choice(ChoiceKind::AdvanceTrack, *steps)
            }
        }
        // Board-dependent choices; the game aggregate verifies a target
        // exists before honoring the sub-state.
        Benefit::Conquer => BenefitOutcome::Choice(ChoiceKind::Conquer, 1),
        Benefit::Retrieve => BenefitOutcome::Choice(ChoiceKind::Retrieve, 1),
        // The worker token is board material; the aggregate grants it.
        // Ledger-side this is a no-op.
        Benefit::Recruit => BenefitOutcome::Done,
        Benefit::PerToken => panic!("unresolved PerToken benefit"),
    }
}

fn track_maxed(ledger: &PlayerLedger, track: TrackId) -> bool {
    ledger.track(track) >= ledger.track_limit()
}

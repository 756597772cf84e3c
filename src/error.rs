//! The boundary error taxonomy.
//!
//! These errors exist at the seam between the engine and its callers.
//! Internally the engine treats invariant breaches as bugs and panics;
//! externally a submitted move either applies or comes back as one of
//! these.

use thiserror::Error;

use crate::privilege::Resolution;

/// Errors surfaced across the engine boundary.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum EngineError {
    /// The generator did not offer this move. An invariant breach when
    /// it happens live; expected occasionally when replaying damaged
    /// historical logs, where the caller drops the move and continues.
    #[error("illegal move: {wire}")]
    IllegalMove { wire: String },

    /// A concurrent action lost conflict resolution. Expected and
    /// frequent during simultaneous play; never a user-facing failure
    /// beyond the losing action not committing.
    #[error("conflicting action resolved as {0:?}")]
    Conflict(Resolution),

    /// A clone or checkpoint failed fingerprint verification. Indicates
    /// a copy-symmetry bug; checked only in debug verification paths.
    #[error("digest mismatch: expected {expected:#018x}, got {actual:#018x}")]
    DigestMismatch { expected: u64, actual: u64 },

    /// The single-writer session is gone; the request cannot be
    /// serialized to the live game.
    #[error("game session closed")]
    SessionClosed,

    /// The wire text is not a syntactically valid move.
    #[error("cannot parse move {text:?}: {what}")]
    ParseMove { text: String, what: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_formats() {
        let e = EngineError::DigestMismatch {
            expected: 0xABCD,
            actual: 0x1234,
        };
        let msg = format!("{e}");
        assert!(msg.contains("0x000000000000abcd"));
        assert!(msg.contains("0x0000000000001234"));

        let e = EngineError::IllegalMove {
            wire: "done 0".into(),
        };
        assert_eq!(format!("{e}"), "illegal move: done 0");
    }
}

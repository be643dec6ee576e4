/*
 * tablebase-gen, an endgame tablebase generator
 * Copyright (C) 2024 The tablebase-gen contributors
 *
 * tablebase-gen is free software: you can redistribute it and/or modify it
 * under the terms of the GNU General Public License as published by the
 * Free Software Foundation, either version 3 of the License, or (at your
 * option) any later version.
 *
 * tablebase-gen is distributed in the hope that it will be useful, but
 * WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the GNU General
 * Public License for more details.
 *
 * You should have received a copy of the GNU General Public License along
 * with tablebase-gen. If not, see <https://www.gnu.org/licenses/>.
 */

//! The packed 4-byte per-index record and the state machine that mutates
//! it. `movecount` is a tagged byte multiplexing both a plain count of
//! unresolved forward moves and four terminal outcomes; see [`Outcome`].

use std::fmt;

/// `movecount` value meaning the index decodes to no legal position.
pub const ILLEGAL: u8 = 255;
/// `movecount` value meaning the player to move has a won, fully
/// propagated position.
pub const PTM_WINS_DONE: u8 = 254;
/// `movecount` value meaning the player not to move has a won, fully
/// propagated position.
pub const PNTM_WINS_DONE: u8 = 253;
/// `movecount` value meaning the player to move has a won position still
/// awaiting propagation to its predecessors.
pub const PTM_WINS_PENDING: u8 = 252;
/// `movecount` value meaning the player not to move has a won position
/// still awaiting propagation to its predecessors.
pub const PNTM_WINS_PENDING: u8 = 0;
/// `movecount` sentinel assigned directly by the initializer to a
/// stalemate, and written by [`Entry::finalize_draw`] to every index that
/// never resolves to a win.
pub const DRAW: u8 = 251;
/// `mate_ply`/`conv_ply` value meaning the distance is not yet known.
pub const UNKNOWN_PLY: u8 = 255;

/// A decoded view of an [`Entry`]'s `movecount` byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The index does not decode to a legal position.
    Illegal,
    /// The player to move wins; predecessors not yet notified.
    PtmWinsPending,
    /// The player to move wins; predecessors already notified.
    PtmWinsDone,
    /// The player not to move wins; predecessors not yet notified.
    PntmWinsPending,
    /// The player not to move wins; predecessors already notified.
    PntmWinsDone,
    /// Drawn (includes stalemate and "never resolved to a win").
    Draw,
    /// Still has `n` forward moves not yet shown to lose for the player to
    /// move, `1..=250`.
    Pending(u8),
}

impl Outcome {
    /// True for [`Self::PtmWinsPending`] and [`Self::PntmWinsPending`]: an
    /// outcome that still needs to notify its predecessors.
    #[must_use]
    pub const fn is_pending_propagation(self) -> bool {
        matches!(self, Self::PtmWinsPending | Self::PntmWinsPending)
    }
}

/// A mutator was called on an entry in a state that makes the call
/// meaningless; the build logs this and continues rather than aborting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvariantViolation {
    /// A win was recorded for the side that is already shown to lose here.
    OpposingOutcomeAlreadyRecorded,
    /// A loss-option decrement was applied to an entry that is not a plain
    /// pending movecount.
    DecrementOnNonPendingEntry,
    /// `mark_propagated` was called on an entry that is not
    /// `*-wins-pending`.
    MarkPropagatedOnNonPending,
    /// A mutator tried to increase `mate_ply` on an already-set outcome.
    MateDistanceIncreased,
}

impl fmt::Display for InvariantViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::OpposingOutcomeAlreadyRecorded => {
                "win recorded for a side already shown to lose this entry"
            }
            Self::DecrementOnNonPendingEntry => {
                "loss-option decrement applied to a non-pending entry"
            }
            Self::MarkPropagatedOnNonPending => {
                "mark_propagated called on an entry that is not wins-pending"
            }
            Self::MateDistanceIncreased => "mutator attempted to increase mate_ply",
        })
    }
}

impl std::error::Error for InvariantViolation {}

/// One per-index record: 4 bytes, laid out as `(movecount, mate_ply,
/// conv_ply, reserved)` with no implicit padding (all fields are `u8`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(C)]
pub struct Entry {
    movecount: u8,
    mate_ply: u8,
    conv_ply: u8,
    reserved: u8,
}

impl Entry {
    /// A fresh entry for an index with `forward_moves` legal moves for the
    /// player to move, none yet resolved.
    ///
    /// # Panics
    ///
    /// Panics if `forward_moves` is 0 or would collide with a terminal tag
    /// (`>= 251`); zero-move positions are [`Self::stalemate`] or a mate,
    /// decided by the caller before this is reached.
    #[must_use]
    pub fn pending(forward_moves: u8) -> Self {
        assert!(
            (1..DRAW).contains(&forward_moves),
            "forward_moves must be in 1..251, got {forward_moves}"
        );
        Self {
            movecount: forward_moves,
            mate_ply: UNKNOWN_PLY,
            conv_ply: UNKNOWN_PLY,
            reserved: 0,
        }
    }

    /// An index that does not decode to a legal position.
    #[must_use]
    pub const fn illegal() -> Self {
        Self {
            movecount: ILLEGAL,
            mate_ply: UNKNOWN_PLY,
            conv_ply: UNKNOWN_PLY,
            reserved: 0,
        }
    }

    /// A stalemate: drawn from the moment the initializer sees it.
    #[must_use]
    pub const fn stalemate() -> Self {
        Self {
            movecount: DRAW,
            mate_ply: UNKNOWN_PLY,
            conv_ply: UNKNOWN_PLY,
            reserved: 0,
        }
    }

    /// Checkmate found directly at initialization: the player not to move
    /// has already won with `mate_ply = 0`.
    #[must_use]
    pub const fn checkmate() -> Self {
        Self {
            movecount: PNTM_WINS_PENDING,
            mate_ply: 0,
            conv_ply: 0,
            reserved: 0,
        }
    }

    /// Decodes this entry's `movecount` byte.
    #[must_use]
    pub const fn outcome(&self) -> Outcome {
        match self.movecount {
            ILLEGAL => Outcome::Illegal,
            PTM_WINS_DONE => Outcome::PtmWinsDone,
            PNTM_WINS_DONE => Outcome::PntmWinsDone,
            PTM_WINS_PENDING => Outcome::PtmWinsPending,
            PNTM_WINS_PENDING => Outcome::PntmWinsPending,
            DRAW => Outcome::Draw,
            n => Outcome::Pending(n),
        }
    }

    /// Half-moves to mate, or `None` if unknown/not applicable.
    #[must_use]
    pub const fn mate_ply(&self) -> Option<u8> {
        if self.mate_ply == UNKNOWN_PLY {
            None
        } else {
            Some(self.mate_ply)
        }
    }

    /// Half-moves since the last capture or pawn move, or `None` if
    /// unknown/not applicable.
    #[must_use]
    pub const fn conv_ply(&self) -> Option<u8> {
        if self.conv_ply == UNKNOWN_PLY {
            None
        } else {
            Some(self.conv_ply)
        }
    }

    /// The raw 4 bytes, little-endian field order `(movecount, mate_ply,
    /// conv_ply, reserved)`, as written to a tablebase file.
    #[must_use]
    pub const fn to_bytes(self) -> [u8; 4] {
        [self.movecount, self.mate_ply, self.conv_ply, self.reserved]
    }

    /// Reconstructs an entry from its on-disk bytes.
    #[must_use]
    pub const fn from_bytes(bytes: [u8; 4]) -> Self {
        Self {
            movecount: bytes[0],
            mate_ply: bytes[1],
            conv_ply: bytes[2],
            reserved: bytes[3],
        }
    }

    /// Records that the player to move at this index has a direct win
    /// (`white_wins`/`black_wins` in the algorithm's own vocabulary, with
    /// the PTM/PNTM distinction already resolved by the caller).
    ///
    /// # Errors
    ///
    /// Returns [`InvariantViolation::OpposingOutcomeAlreadyRecorded`] if
    /// this entry already shows the other side winning, or
    /// [`InvariantViolation::MateDistanceIncreased`] if `mate_ply` would
    /// increase on an already-recorded win of the same side.
    pub fn record_win(
        &mut self,
        ptm_wins: bool,
        mate_ply: u8,
        conv_ply: u8,
    ) -> Result<(), InvariantViolation> {
        let target = if ptm_wins {
            PTM_WINS_PENDING
        } else {
            PNTM_WINS_PENDING
        };

        match self.outcome() {
            Outcome::Pending(_) => {
                self.movecount = target;
                self.mate_ply = mate_ply;
                self.conv_ply = conv_ply;
                Ok(())
            }
            Outcome::PtmWinsPending | Outcome::PtmWinsDone if ptm_wins => {
                self.lower_mate_ply(mate_ply, conv_ply)
            }
            Outcome::PntmWinsPending | Outcome::PntmWinsDone if !ptm_wins => {
                self.lower_mate_ply(mate_ply, conv_ply)
            }
            Outcome::PtmWinsPending
            | Outcome::PtmWinsDone
            | Outcome::PntmWinsPending
            | Outcome::PntmWinsDone => Err(InvariantViolation::OpposingOutcomeAlreadyRecorded),
            Outcome::Illegal | Outcome::Draw => {
                Err(InvariantViolation::OpposingOutcomeAlreadyRecorded)
            }
        }
    }

    fn lower_mate_ply(&mut self, mate_ply: u8, conv_ply: u8) -> Result<(), InvariantViolation> {
        if mate_ply > self.mate_ply {
            return Err(InvariantViolation::MateDistanceIncreased);
        }
        self.mate_ply = mate_ply;
        self.conv_ply = self.conv_ply.min(conv_ply);
        Ok(())
    }

    /// Records that one more of the player-to-move's options at this
    /// index has been shown to hand the win to the opponent
    /// (`add_one_to_<side>_wins` in the algorithm's vocabulary). Returns
    /// `true` if this decrement just resolved the entry to
    /// `PNTM-wins-pending` (all options exhausted).
    ///
    /// # Errors
    ///
    /// Returns [`InvariantViolation::DecrementOnNonPendingEntry`] if the
    /// entry is not a plain pending movecount.
    pub fn record_losing_option(
        &mut self,
        mate_ply: u8,
        conv_ply: u8,
    ) -> Result<bool, InvariantViolation> {
        let Outcome::Pending(n) = self.outcome() else {
            return Err(InvariantViolation::DecrementOnNonPendingEntry);
        };

        let new_count = n - 1;
        self.movecount = new_count;
        self.mate_ply = if self.mate_ply == UNKNOWN_PLY {
            mate_ply
        } else {
            self.mate_ply.min(mate_ply)
        };
        self.conv_ply = if self.conv_ply == UNKNOWN_PLY {
            conv_ply
        } else {
            self.conv_ply.min(conv_ply)
        };

        Ok(new_count == PNTM_WINS_PENDING)
    }

    /// Transitions a `*-wins-pending` entry to its `*-done` counterpart.
    ///
    /// # Errors
    ///
    /// Returns [`InvariantViolation::MarkPropagatedOnNonPending`] if the
    /// entry is not currently `*-wins-pending`.
    pub fn mark_propagated(&mut self) -> Result<(), InvariantViolation> {
        self.movecount = match self.movecount {
            PTM_WINS_PENDING => PTM_WINS_DONE,
            PNTM_WINS_PENDING => PNTM_WINS_DONE,
            _ => return Err(InvariantViolation::MarkPropagatedOnNonPending),
        };
        Ok(())
    }

    /// Rewrites a still-pending movecount to the canonical [`DRAW`] marker.
    /// A no-op on any entry that already has a terminal outcome.
    pub fn finalize_draw(&mut self) {
        if matches!(self.outcome(), Outcome::Pending(_)) {
            self.movecount = DRAW;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Entry, Outcome};

    #[test]
    fn pending_decrements_to_pntm_wins() {
        let mut entry = Entry::pending(1);
        let resolved = entry.record_losing_option(5, 3).unwrap();
        assert!(resolved);
        assert_eq!(entry.outcome(), Outcome::PntmWinsPending);
        assert_eq!(entry.mate_ply(), Some(5));
    }

    #[test]
    fn record_win_sets_ptm_wins_pending() {
        let mut entry = Entry::pending(3);
        entry.record_win(true, 4, 2).unwrap();
        assert_eq!(entry.outcome(), Outcome::PtmWinsPending);
        assert_eq!(entry.mate_ply(), Some(4));
    }

    #[test]
    fn record_win_lowers_existing_mate_ply() {
        let mut entry = Entry::pending(3);
        entry.record_win(true, 10, 6).unwrap();
        entry.record_win(true, 4, 2).unwrap();
        assert_eq!(entry.mate_ply(), Some(4));
        assert_eq!(entry.conv_ply(), Some(2));
    }

    #[test]
    fn record_win_rejects_opposing_outcome() {
        let mut entry = Entry::pending(3);
        entry.record_win(true, 4, 2).unwrap();
        assert!(entry.record_win(false, 1, 1).is_err());
    }

    #[test]
    fn mark_propagated_moves_pending_to_done() {
        let mut entry = Entry::pending(1);
        entry.record_losing_option(5, 3).unwrap();
        entry.mark_propagated().unwrap();
        assert_eq!(entry.outcome(), Outcome::PntmWinsDone);
        assert!(entry.mark_propagated().is_err());
    }

    #[test]
    fn finalize_draw_only_touches_pending() {
        let mut still_pending = Entry::pending(4);
        still_pending.finalize_draw();
        assert_eq!(still_pending.outcome(), Outcome::Draw);

        let mut already_won = Entry::pending(4);
        already_won.record_win(true, 1, 0).unwrap();
        already_won.finalize_draw();
        assert_eq!(already_won.outcome(), Outcome::PtmWinsPending);
    }

    #[test]
    fn bytes_round_trip() {
        let entry = Entry::checkmate();
        assert_eq!(Entry::from_bytes(entry.to_bytes()), entry);
    }
}

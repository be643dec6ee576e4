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

//! The material configuration a tablebase is built for: mobile pieces,
//! frozen pieces, futurebase references, prune rules, and the
//! colour-normalization / filename rules used to name and locate a
//! configuration's dependency tablebases.

use crate::{
    defs::{Kind, Piece, Side, Square},
    error::ConfigError,
};

/// A piece whose square varies across positions of the configuration, in
/// the declared order used by the index encoding.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct MobilePiece {
    /// The piece's colour and kind.
    pub piece: Piece,
}

/// A piece fixed at a specific square in every position of the
/// configuration. Excluded from state enumeration but still participates
/// in blocking and capture.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct FrozenPiece {
    /// The piece's colour and kind.
    pub piece: Piece,
    /// The square it is permanently fixed to.
    pub square: Square,
}

/// Which side of a `prune-*-move` declaration a rule applies to.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum PruneSide {
    /// `prune-our-move`: drop this move from our own enumeration.
    Our,
    /// `prune-his-move`: replace the opponent's move with an exhaustive
    /// search of our replies.
    His,
}

/// A `prune-our-move`/`prune-his-move` declaration from the control file.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct PruneRule {
    /// Which side's move this prunes.
    pub side: PruneSide,
    /// The move's origin square.
    pub from: Square,
    /// The move's destination square.
    pub to: Square,
}

/// A reference to a previously built tablebase this configuration can
/// transition into via a single irreversible event (capture, promotion, or
/// en-passant capture).
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct FutureRef {
    /// The futurebase's name (used to resolve a file on disk).
    pub name: String,
    /// Whether the stored configuration has swapped colours and must be
    /// probed with side-to-move and piece colours flipped.
    pub invert_colors: bool,
}

/// A full material configuration: everything needed to enumerate and label
/// every legal position of it.
#[derive(Clone, PartialEq, Debug)]
pub struct Configuration {
    /// The tablebase's output name.
    pub name: String,
    /// Mobile pieces, in index-encoding order.
    pub mobile: Vec<MobilePiece>,
    /// Frozen pieces.
    pub frozen: Vec<FrozenPiece>,
    /// Futurebases this configuration can transition into.
    pub futurebases: Vec<FutureRef>,
    /// Move-pruning declarations.
    pub prunes: Vec<PruneRule>,
    /// Whether to track distance-to-mate (as opposed to only win/loss/draw).
    pub dtm: bool,
}

impl Configuration {
    /// The number of mobile pieces, `k` in the `[0, 2*64^k)` index range.
    #[must_use]
    pub fn mobile_count(&self) -> usize {
        self.mobile.len()
    }

    /// The number of indices in `[0, index_range)`, `2 * 64^k`.
    #[must_use]
    pub fn index_range(&self) -> u64 {
        2 * 64u64.pow(self.mobile_count() as u32)
    }

    /// Validates the static shape invariants that do not require decoding
    /// any particular position: exactly one king per side, at most 8
    /// mobile pieces, and no two frozen pieces sharing a square.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::WrongKingCount`], [`ConfigError::TooManyMobilePieces`]
    /// or [`ConfigError::DuplicateSquare`] as appropriate.
    pub fn validate_shape(&self) -> Result<(), ConfigError> {
        if self.mobile.len() > 8 {
            return Err(ConfigError::TooManyMobilePieces(self.mobile.len()));
        }

        for side in [Side::WHITE, Side::BLACK] {
            let count = self
                .mobile
                .iter()
                .filter(|p| p.piece.side == side && p.piece.kind == Kind::King)
                .count();
            if count != 1 {
                return Err(ConfigError::WrongKingCount { side, count });
            }
        }

        let mut seen = Vec::with_capacity(self.frozen.len());
        for frozen in &self.frozen {
            if seen.contains(&frozen.square) {
                return Err(ConfigError::DuplicateSquare(frozen.square));
            }
            seen.push(frozen.square);
        }

        Ok(())
    }
}

/// The canonical filename-letter order: `q r b n p`.
pub const CANONICAL_LETTERS: [char; 5] = ['q', 'r', 'b', 'n', 'p'];

/// Builds the piece-letter portion of a dependency filename (e.g. `qrrp`)
/// from a side's kinds, ordered per [`CANONICAL_LETTERS`]. `PawnEp` counts
/// as a pawn for filename purposes.
#[must_use]
pub fn filename_piece_letters(kinds: &[Kind]) -> String {
    let mut out = String::new();
    for letter in CANONICAL_LETTERS {
        let count = kinds
            .iter()
            .filter(|k| k.filename_letter() == Some(letter))
            .count();
        for _ in 0..count {
            out.push(letter);
        }
    }
    out
}

/// The total point value of a side's non-king pieces, used to break ties
/// when two sides have the same piece count during colour normalization.
#[must_use]
pub fn side_value(kinds: &[Kind]) -> f32 {
    kinds.iter().map(|k| k.value()).sum()
}

/// Colour-normalizes a pair of (white, black) non-king kind lists: the side
/// with more pieces (tiebreak: greater point value) is written first,
/// i.e. returned as the "white" half. Returns the normalized
/// `(heavier, lighter)` pair and whether the input was swapped to get
/// there.
#[must_use]
pub fn normalize_colors(white: &[Kind], black: &[Kind]) -> (Vec<Kind>, Vec<Kind>, bool) {
    let swap = match white.len().cmp(&black.len()) {
        std::cmp::Ordering::Less => true,
        std::cmp::Ordering::Greater => false,
        std::cmp::Ordering::Equal => side_value(white) < side_value(black),
    };

    if swap {
        (black.to_vec(), white.to_vec(), true)
    } else {
        (white.to_vec(), black.to_vec(), false)
    }
}

/// The dependency filename `k<white>k<black>` for an already
/// colour-normalized pair of kind lists.
#[must_use]
pub fn dependency_filename(white: &[Kind], black: &[Kind]) -> String {
    format!(
        "k{}k{}",
        filename_piece_letters(white),
        filename_piece_letters(black)
    )
}

/// The promotion kinds a pawn can become.
pub const PROMOTION_KINDS: [Kind; 4] = [Kind::Queen, Kind::Rook, Kind::Bishop, Kind::Knight];

/// Enumerates the direct dependency filenames of `k<white>k<black>`
/// (already colour-normalized):
///
/// - for each single-piece removal from white or black, the reduced
///   configuration (re-normalized);
/// - for each pawn in white, for each promotion kind, the configuration
///   with that pawn replaced by the promoted piece, and optionally with
///   any single non-pawn black piece additionally captured
///   (promotion-with-capture); symmetrically for black pawns.
#[must_use]
pub fn dependencies(white: &[Kind], black: &[Kind]) -> Vec<String> {
    let mut out = Vec::new();

    let mut push_normalized = |w: &[Kind], b: &[Kind]| {
        let (nw, nb, _) = normalize_colors(w, b);
        out.push(dependency_filename(&nw, &nb));
    };

    for i in 0..white.len() {
        let mut reduced = white.to_vec();
        reduced.remove(i);
        push_normalized(&reduced, black);
    }
    for i in 0..black.len() {
        let mut reduced = black.to_vec();
        reduced.remove(i);
        push_normalized(white, &reduced);
    }

    push_promotions(white, black, &mut push_normalized);
    push_promotions(black, white, &mut |promoter, other| {
        push_normalized(other, promoter);
    });

    out
}

/// Shared helper for the white-pawn and black-pawn halves of
/// [`dependencies`]: for each pawn belonging to `promoter`, for each
/// promotion kind, emit the configuration with that pawn promoted, plus
/// one emission per possible single-piece capture of `other`.
fn push_promotions(promoter: &[Kind], other: &[Kind], emit: &mut dyn FnMut(&[Kind], &[Kind])) {
    for (i, kind) in promoter.iter().enumerate() {
        if *kind != Kind::Pawn {
            continue;
        }
        for promotion in PROMOTION_KINDS {
            let mut promoted = promoter.to_vec();
            promoted[i] = promotion;
            emit(&promoted, other);

            for j in 0..other.len() {
                let mut captured = other.to_vec();
                captured.remove(j);
                emit(&promoted, &captured);
            }
        }
    }
}

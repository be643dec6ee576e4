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

//! Board primitives: squares, files, ranks, sides, directions and piece
//! kinds. These are deliberately the same shape as a regular chess engine's
//! board representation, because a tablebase generator is, underneath, a
//! specialised move generator.

use std::{
    fmt::{self, Display, Formatter},
    ops::{Add, Sub},
    str::FromStr,
};

use crate::error::ParseError;

/// A cardinal or diagonal direction, as a signed offset on a little-endian
/// rank-file-mapped square index.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Direction(pub i8);

/// A file: file A = 0 to file H = 7.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct File(pub u8);

/// A rank: rank 1 = 0 to rank 8 = 7.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Rank(pub u8);

/// A side: White or Black.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash)]
pub struct Side(pub u8);

/// A square, little-endian rank-file mapping: a1 = 0, b1 = 1, ..., h8 = 63.
/// `NONE` (64) is used as the ray-table sentinel destination.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct Square(pub u8);

/// The kind of a mobile or frozen piece.
///
/// `PawnEp` is a pawn that has just advanced two squares and is therefore
/// capturable en passant. It moves exactly like `Pawn` going forward, but
/// has a narrower predecessor set in retrograde generation (see
/// `movegen::generate_predecessors`), which is why the position encoding
/// distinguishes it from a plain `Pawn`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Kind {
    /// King.
    King,
    /// Queen.
    Queen,
    /// Rook.
    Rook,
    /// Bishop.
    Bishop,
    /// Knight.
    Knight,
    /// Pawn.
    Pawn,
    /// A pawn that just advanced two squares, capturable en passant.
    PawnEp,
}

/// A piece: a [`Kind`] belonging to a [`Side`].
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct Piece {
    /// The side the piece belongs to.
    pub side: Side,
    /// The kind of piece.
    pub kind: Kind,
}

impl Direction {
    pub const N: Self = Self(8);
    pub const NE: Self = Self(9);
    pub const E: Self = Self(1);
    pub const SE: Self = Self(-7);
    pub const S: Self = Self(-8);
    pub const SW: Self = Self(-9);
    pub const W: Self = Self(-1);
    pub const NW: Self = Self(7);
}

impl File {
    pub const FILE_A: Self = Self(0);
    pub const FILE_H: Self = Self(7);
    pub const TOTAL: usize = 8;
}

impl Rank {
    pub const RANK1: Self = Self(0);
    pub const RANK2: Self = Self(1);
    pub const RANK4: Self = Self(3);
    pub const RANK5: Self = Self(4);
    pub const RANK7: Self = Self(6);
    pub const RANK8: Self = Self(7);
    pub const TOTAL: usize = 8;
}

impl Side {
    pub const BLACK: Self = Self(0);
    pub const WHITE: Self = Self(1);
    pub const TOTAL: usize = 2;

    /// Flips White to Black and vice versa.
    #[must_use]
    pub const fn flip(self) -> Self {
        Self(self.0 ^ 1)
    }

    /// Converts the side to a usize for array indexing.
    #[must_use]
    pub const fn to_index(self) -> usize {
        self.0 as usize
    }
}

#[allow(missing_docs, clippy::missing_docs_in_private_items)]
impl Square {
    pub const A1: Self = Self(0);
    pub const B1: Self = Self(1);
    pub const C1: Self = Self(2);
    pub const D1: Self = Self(3);
    pub const E1: Self = Self(4);
    pub const F1: Self = Self(5);
    pub const G1: Self = Self(6);
    pub const H1: Self = Self(7);
    pub const A2: Self = Self(8);
    pub const B2: Self = Self(9);
    pub const C2: Self = Self(10);
    pub const D2: Self = Self(11);
    pub const E2: Self = Self(12);
    pub const F2: Self = Self(13);
    pub const G2: Self = Self(14);
    pub const H2: Self = Self(15);
    pub const A3: Self = Self(16);
    pub const B3: Self = Self(17);
    pub const C3: Self = Self(18);
    pub const D3: Self = Self(19);
    pub const E3: Self = Self(20);
    pub const F3: Self = Self(21);
    pub const G3: Self = Self(22);
    pub const H3: Self = Self(23);
    pub const A4: Self = Self(24);
    pub const B4: Self = Self(25);
    pub const C4: Self = Self(26);
    pub const D4: Self = Self(27);
    pub const E4: Self = Self(28);
    pub const F4: Self = Self(29);
    pub const G4: Self = Self(30);
    pub const H4: Self = Self(31);
    pub const A5: Self = Self(32);
    pub const B5: Self = Self(33);
    pub const C5: Self = Self(34);
    pub const D5: Self = Self(35);
    pub const E5: Self = Self(36);
    pub const F5: Self = Self(37);
    pub const G5: Self = Self(38);
    pub const H5: Self = Self(39);
    pub const A6: Self = Self(40);
    pub const B6: Self = Self(41);
    pub const C6: Self = Self(42);
    pub const D6: Self = Self(43);
    pub const E6: Self = Self(44);
    pub const F6: Self = Self(45);
    pub const G6: Self = Self(46);
    pub const H6: Self = Self(47);
    pub const A7: Self = Self(48);
    pub const B7: Self = Self(49);
    pub const C7: Self = Self(50);
    pub const D7: Self = Self(51);
    pub const E7: Self = Self(52);
    pub const F7: Self = Self(53);
    pub const G7: Self = Self(54);
    pub const H7: Self = Self(55);
    pub const A8: Self = Self(56);
    pub const B8: Self = Self(57);
    pub const C8: Self = Self(58);
    pub const D8: Self = Self(59);
    pub const E8: Self = Self(60);
    pub const F8: Self = Self(61);
    pub const G8: Self = Self(62);
    pub const H8: Self = Self(63);
    pub const TOTAL: usize = 64;
    pub const NONE: Self = Self(64);

    /// Builds a square from a rank and file.
    #[must_use]
    pub const fn from_pos(rank: Rank, file: File) -> Self {
        Self(rank.0 * 8 + file.0)
    }

    /// Converts the square to a usize for array indexing.
    #[must_use]
    pub const fn to_index(self) -> usize {
        self.0 as usize
    }

    /// The file this square is on.
    #[must_use]
    pub const fn file(self) -> File {
        File(self.0 & 7)
    }

    /// The rank this square is on.
    #[must_use]
    pub const fn rank(self) -> Rank {
        Rank(self.0 >> 3)
    }

    /// Returns the destination of a single step in `direction`, or `None`
    /// if that step would leave the board (including wrapping around a
    /// side, which a naive offset add would not catch).
    #[must_use]
    pub fn step(self, direction: Direction) -> Option<Self> {
        let dest = i16::from(self.0) + i16::from(direction.0);
        if !(0..64).contains(&dest) {
            return None;
        }
        let dest = Self(dest as u8);
        // A step wraps around a side iff the file changes by more than one.
        if self.file().0.abs_diff(dest.file().0) > 1 {
            return None;
        }
        Some(dest)
    }
}

impl Kind {
    /// All seven kinds, in the order used for round-robin iteration.
    pub const ALL: [Self; 7] = [
        Self::King,
        Self::Queen,
        Self::Rook,
        Self::Bishop,
        Self::Knight,
        Self::Pawn,
        Self::PawnEp,
    ];

    /// True for `Pawn` and `PawnEp`: both occupy the board and generate
    /// moves identically going forward.
    #[must_use]
    pub const fn is_pawn_like(self) -> bool {
        matches!(self, Self::Pawn | Self::PawnEp)
    }

    /// True for sliding pieces whose move rays have more than one square:
    /// queen, rook, bishop.
    #[must_use]
    pub const fn is_sliding(self) -> bool {
        matches!(self, Self::Queen | Self::Rook | Self::Bishop)
    }

    /// The canonical filename letter used by the dependency-naming rules
    /// (`q r b n p`, in that order; kings are never written because every
    /// configuration has exactly one per side).
    #[must_use]
    pub const fn filename_letter(self) -> Option<char> {
        match self {
            Self::King => None,
            Self::Queen => Some('q'),
            Self::Rook => Some('r'),
            Self::Bishop => Some('b'),
            Self::Knight => Some('n'),
            Self::Pawn | Self::PawnEp => Some('p'),
        }
    }

    /// The point value used by the colour-normalization tiebreak:
    /// Q=9, R=5, B=3.1, N=3, P=1. The 0.1 boost to bishop over knight
    /// exists solely so that KBK-vs-KN prefers to be stored as KBKN rather
    /// than KNKB.
    #[must_use]
    pub const fn value(self) -> f32 {
        match self {
            Self::King => 0.0,
            Self::Queen => 9.0,
            Self::Rook => 5.0,
            Self::Bishop => 3.1,
            Self::Knight => 3.0,
            Self::Pawn | Self::PawnEp => 1.0,
        }
    }
}

impl Piece {
    /// Builds a piece from a side and kind.
    #[must_use]
    pub const fn new(side: Side, kind: Kind) -> Self {
        Self { side, kind }
    }
}

impl From<File> for char {
    fn from(file: File) -> Self {
        (b'a' + file.0) as Self
    }
}

impl From<Rank> for char {
    fn from(rank: Rank) -> Self {
        (b'1' + rank.0) as Self
    }
}

impl From<Side> for char {
    /// 'w' for White, 'b' for Black.
    fn from(side: Side) -> Self {
        if side == Side::WHITE {
            'w'
        } else {
            'b'
        }
    }
}

impl TryFrom<char> for Kind {
    type Error = ParseError;

    fn try_from(kind: char) -> Result<Self, Self::Error> {
        Ok(match kind.to_ascii_lowercase() {
            'k' => Self::King,
            'q' => Self::Queen,
            'r' => Self::Rook,
            'b' => Self::Bishop,
            'n' => Self::Knight,
            'p' => Self::Pawn,
            'e' => Self::PawnEp,
            _ => return Err(ParseError::InvalidToken),
        })
    }
}

impl Display for Square {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> fmt::Result {
        if *self == Self::NONE {
            fmt.write_str("-")
        } else {
            write!(fmt, "{}{}", char::from(self.file()), char::from(self.rank()))
        }
    }
}

impl FromStr for Square {
    type Err = ParseError;

    /// Parses e.g. "e4". Returns `Ok(Self::NONE)` for "-".
    fn from_str(string: &str) -> Result<Self, Self::Err> {
        if string == "-" {
            return Ok(Self::NONE);
        }

        let bytes = string.as_bytes();
        if bytes.len() != 2 {
            return Err(ParseError::ErroneousToken);
        }

        let file = bytes[0];
        if !(b'a'..=b'h').contains(&file) {
            return Err(ParseError::ErroneousToken);
        }
        let rank = bytes[1];
        if !(b'1'..=b'8').contains(&rank) {
            return Err(ParseError::ErroneousToken);
        }

        Ok(Self((rank - b'1') * 8 + (file - b'a')))
    }
}

impl Add<Direction> for Square {
    type Output = Self;

    fn add(self, rhs: Direction) -> Self::Output {
        Self(self.0.wrapping_add_signed(rhs.0))
    }
}

impl Sub<Direction> for Square {
    type Output = Self;

    fn sub(self, rhs: Direction) -> Self::Output {
        Self(self.0.wrapping_add_signed(-rhs.0))
    }
}

#[cfg(test)]
mod tests {
    use super::{Direction, Square};

    #[test]
    fn step_off_board_is_none() {
        assert_eq!(Square::A1.step(Direction::S), None);
        assert_eq!(Square::H1.step(Direction::E), None);
        assert_eq!(Square::A8.step(Direction::N), None);
    }

    #[test]
    fn step_on_board() {
        assert_eq!(Square::E4.step(Direction::N), Some(Square::E5));
        assert_eq!(Square::E4.step(Direction::NE), Some(Square::F5));
    }

    #[test]
    fn square_roundtrip_through_string() {
        for s in 0..64u8 {
            let sq = Square(s);
            let parsed: Square = sq.to_string().parse().unwrap();
            assert_eq!(sq, parsed);
        }
    }
}

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

//! The position↔index codec: a pure bit-packing, injective but not
//! surjective onto legal positions. Illegal indices are filtered later, by
//! [`crate::initializer`]; this module only catches the cheap case of two
//! mobile pieces decoding onto the same square.

use crate::{
    bitboard::Bitboard,
    config::Configuration,
    defs::{Side, Square},
};

/// A compact integer identifying one (side-to-move, mobile-piece-squares)
/// tuple of a configuration, in `[0, config.index_range())`.
pub type Index = u64;

/// A fully decoded position: side to move plus one square per mobile
/// piece, in the configuration's declared order. Frozen pieces are not
/// repeated here; read them from the [`Configuration`] alongside.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Position {
    /// The side to move.
    pub side_to_move: Side,
    /// One square per mobile piece, same order as `Configuration::mobile`.
    pub squares: Vec<Square>,
}

/// The only failure mode of [`index_to_position`]: two decoded squares
/// landed on the same square, which can never be a legal position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CollisionError;

impl Position {
    /// The union of every mobile and frozen piece's square.
    #[must_use]
    pub fn occupancy(&self, config: &Configuration) -> Bitboard {
        let mut occ = Bitboard::EMPTY;
        for &square in &self.squares {
            occ.set(square);
        }
        for frozen in &config.frozen {
            occ.set(frozen.square);
        }
        occ
    }

    /// The squares occupied by `side`'s pieces, mobile and frozen.
    #[must_use]
    pub fn side_occupancy(&self, config: &Configuration, side: Side) -> Bitboard {
        let mut occ = Bitboard::EMPTY;
        for (mobile, &square) in config.mobile.iter().zip(&self.squares) {
            if mobile.piece.side == side {
                occ.set(square);
            }
        }
        for frozen in &config.frozen {
            if frozen.piece.side == side {
                occ.set(frozen.square);
            }
        }
        occ
    }

    /// The square of `side`'s king.
    ///
    /// # Panics
    ///
    /// Panics if `config` has no king for `side`; [`Configuration::validate_shape`]
    /// rejects any configuration this could happen with.
    #[must_use]
    pub fn king_square(&self, config: &Configuration, side: Side) -> Square {
        config
            .mobile
            .iter()
            .zip(&self.squares)
            .find(|(mobile, _)| mobile.piece.side == side && mobile.piece.kind == crate::defs::Kind::King)
            .map(|(_, &square)| square)
            .expect("every validated configuration has exactly one king per side")
    }
}

/// Packs `position` into its index: one bit for side to move, then six
/// bits per mobile-piece square in declared order.
#[must_use]
pub fn position_to_index(position: &Position) -> Index {
    let mut index = Index::from(position.side_to_move.0);
    for (i, square) in position.squares.iter().enumerate() {
        index |= Index::from(square.0) << (1 + 6 * i);
    }
    index
}

/// Unpacks `index` into a position under `config`, failing fast if two
/// mobile pieces (or a mobile and a frozen piece) decode onto the same
/// square.
///
/// # Errors
///
/// Returns [`CollisionError`] on any square collision. This is the only
/// check performed here; see the module docs for what is deferred.
pub fn index_to_position(config: &Configuration, index: Index) -> Result<Position, CollisionError> {
    let side_to_move = Side((index & 1) as u8);

    let mut occupied = Bitboard::EMPTY;
    for frozen in &config.frozen {
        occupied.set(frozen.square);
    }

    let mut squares = Vec::with_capacity(config.mobile.len());
    for i in 0..config.mobile.len() {
        let raw = (index >> (1 + 6 * i)) & 0x3f;
        let square = Square(raw as u8);
        if occupied.contains(square) {
            return Err(CollisionError);
        }
        occupied.set(square);
        squares.push(square);
    }

    Ok(Position {
        side_to_move,
        squares,
    })
}

#[cfg(test)]
mod tests {
    use super::{index_to_position, position_to_index, Position};
    use crate::{
        config::{Configuration, MobilePiece},
        defs::{Kind, Piece, Side, Square},
    };

    fn kk() -> Configuration {
        Configuration {
            name: "kk".to_string(),
            mobile: vec![
                MobilePiece {
                    piece: Piece {
                        side: Side::WHITE,
                        kind: Kind::King,
                    },
                },
                MobilePiece {
                    piece: Piece {
                        side: Side::BLACK,
                        kind: Kind::King,
                    },
                },
            ],
            frozen: Vec::new(),
            futurebases: Vec::new(),
            prunes: Vec::new(),
            dtm: true,
        }
    }

    #[test]
    fn round_trips_through_index() {
        let position = Position {
            side_to_move: Side::WHITE,
            squares: vec![Square::E1, Square::E8],
        };
        let index = position_to_index(&position);
        let decoded = index_to_position(&kk(), index).unwrap();
        assert_eq!(decoded, position);
    }

    #[test]
    fn collision_is_detected() {
        let position = Position {
            side_to_move: Side::WHITE,
            squares: vec![Square::E1, Square::E1],
        };
        let index = position_to_index(&position);
        assert!(index_to_position(&kk(), index).is_err());
    }
}

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

//! The first build pass: classify every index as illegal, mated,
//! stalemated, or "has N forward moves", before any futurebase or
//! intra-table propagation runs.

use crate::{
    config::Configuration,
    defs::Kind,
    entry::Entry,
    movegen::{generate_moves, is_in_check},
    position::index_to_position,
    rays::RayTable,
    tablebase::EntryStore,
};

/// Runs over every index of `store`, classifying it per the rules below.
///
/// 1. Decode the index; a collision makes it `Illegal`.
/// 2. If the side not to move is in check, the predecessor that produced
///    this position would have been illegal, so this index is `Illegal`
///    too (not a mate: capturing the enemy king is not a real move).
/// 3. If a mobile pawn sits on rank 1 or 8, or a `PawnEp` piece is not on
///    its en-passant rank for the side to move that could capture it,
///    the position is `Illegal`.
/// 4. Otherwise enumerate every forward pseudo-legal move. Zero moves
///    means mate (if the side to move is in check) or stalemate
///    (otherwise). Any other count becomes a pending movecount.
pub fn initialize(config: &Configuration, rays: &RayTable, store: &mut EntryStore) {
    for index in 0..store.len() as u64 {
        let entry = classify(config, rays, index);
        store.set(index, entry);
    }
}

fn classify(config: &Configuration, rays: &RayTable, index: u64) -> Entry {
    let Ok(position) = index_to_position(config, index) else {
        return Entry::illegal();
    };

    if !legal_shape(config, &position) {
        return Entry::illegal();
    }

    let mover = position.side_to_move;
    if is_in_check(config, rays, &position, mover.flip()) {
        return Entry::illegal();
    }

    let moves = generate_moves(config, rays, &position, mover);
    if moves.is_empty() {
        return if is_in_check(config, rays, &position, mover) {
            Entry::checkmate()
        } else {
            Entry::stalemate()
        };
    }

    let count = u8::try_from(moves.len()).unwrap_or(u8::MAX - 1).min(crate::entry::DRAW - 1);
    Entry::pending(count)
}

fn legal_shape(config: &Configuration, position: &crate::position::Position) -> bool {
    for (mobile, &square) in config.mobile.iter().zip(&position.squares) {
        let on_back_rank = square.rank() == crate::defs::Rank::RANK1 || square.rank() == crate::defs::Rank::RANK8;
        if mobile.piece.kind.is_pawn_like() && on_back_rank {
            return false;
        }

        if mobile.piece.kind == Kind::PawnEp {
            let ep_rank = if mobile.piece.side == crate::defs::Side::WHITE {
                crate::defs::Rank::RANK4
            } else {
                crate::defs::Rank::RANK5
            };
            if square.rank() != ep_rank {
                return false;
            }
            // The side to move must be the one that could capture this
            // pawn en passant, i.e. the opponent of the pawn's own side.
            if position.side_to_move == mobile.piece.side {
                return false;
            }
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::initialize;
    use crate::{
        config::{Configuration, MobilePiece},
        defs::{Kind, Piece, Side, Square},
        entry::Outcome,
        position::{position_to_index, Position},
        rays::RayTable,
        tablebase::EntryStore,
    };

    fn kqk() -> Configuration {
        Configuration {
            name: "kqk".to_string(),
            mobile: vec![
                MobilePiece { piece: Piece { side: Side::WHITE, kind: Kind::King } },
                MobilePiece { piece: Piece { side: Side::WHITE, kind: Kind::Queen } },
                MobilePiece { piece: Piece { side: Side::BLACK, kind: Kind::King } },
            ],
            frozen: Vec::new(),
            futurebases: Vec::new(),
            prunes: Vec::new(),
            dtm: true,
        }
    }

    #[test]
    fn adjacent_kings_are_illegal() {
        let config = kqk();
        let rays = RayTable::build();
        let mut store = EntryStore::allocate(&config).unwrap();
        initialize(&config, &rays, &mut store);

        let position = Position { side_to_move: Side::WHITE, squares: vec![Square::E4, Square::A1, Square::E5] };
        let index = position_to_index(&position);
        assert_eq!(store.get(index).outcome(), Outcome::Illegal);
    }

    #[test]
    fn back_rank_stalemate_seed_is_drawn() {
        let config = Configuration {
            name: "kqk".to_string(),
            mobile: vec![
                MobilePiece { piece: Piece { side: Side::WHITE, kind: Kind::King } },
                MobilePiece { piece: Piece { side: Side::BLACK, kind: Kind::King } },
                MobilePiece { piece: Piece { side: Side::WHITE, kind: Kind::Queen } },
            ],
            frozen: Vec::new(),
            futurebases: Vec::new(),
            prunes: Vec::new(),
            dtm: true,
        };
        let rays = RayTable::build();
        let mut store = EntryStore::allocate(&config).unwrap();
        initialize(&config, &rays, &mut store);

        let position = Position { side_to_move: Side::BLACK, squares: vec![Square::F6, Square::H8, Square::G6] };
        let index = position_to_index(&position);
        assert_eq!(store.get(index).outcome(), Outcome::Draw);
    }
}

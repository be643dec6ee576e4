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

//! The intra-table retrograde propagator: repeated sweeps by non-decreasing
//! `mate_ply` that push a resolved outcome back to every quiet predecessor,
//! until a sweep makes no progress.

use crate::{
    config::Configuration,
    diagnostics::Diagnostics,
    entry::Outcome,
    movegen::{generate_predecessors, is_in_check},
    position::{index_to_position, position_to_index},
    rays::RayTable,
    tablebase::EntryStore,
};

/// The conversion-counter horizon past which a position is drawn by the
/// 50-move rule and is not propagated further.
pub const CONVERSION_HORIZON: u8 = 100;

/// Runs one sweep at `ply`: for every entry that is pending and whose
/// `mate_ply` equals `ply`, generates its quiet predecessors and folds this
/// entry's outcome back into each of them. Returns the number of entries
/// propagated this sweep.
pub fn sweep(config: &Configuration, rays: &RayTable, store: &mut EntryStore, ply: u8, diagnostics: &mut Diagnostics) -> usize {
    let mut progressed = 0;

    for index in 0..store.len() as u64 {
        let entry = store.get(index);
        if !entry.outcome().is_pending_propagation() {
            continue;
        }
        let Some(mate_ply) = entry.mate_ply() else {
            continue;
        };
        if mate_ply != ply {
            continue;
        }
        let Some(conv_ply) = entry.conv_ply() else {
            continue;
        };
        if conv_ply >= CONVERSION_HORIZON {
            store.mark_propagated(index, diagnostics);
            continue;
        }

        let Ok(position) = index_to_position(config, index) else {
            continue;
        };

        let ptm_wins = matches!(entry.outcome(), Outcome::PtmWinsPending);
        let winner = if ptm_wins { position.side_to_move } else { position.side_to_move.flip() };

        for (piece, mobile) in config.mobile.iter().enumerate() {
            if mobile.piece.side != position.side_to_move.flip() {
                continue;
            }
            for predecessor_move in generate_predecessors(config, rays, &position, piece) {
                let mut predecessor = position.clone();
                predecessor.squares[piece] = predecessor_move.from;
                predecessor.side_to_move = position.side_to_move.flip();

                // Retracting a piece can surface a predecessor no legal
                // move could have reached: its own opponent already in
                // check, including a king retracted back adjacent to the
                // other king. Only a predecessor reached by a single legal
                // move counts, so these are skipped rather than mutated.
                if is_in_check(config, rays, &predecessor, predecessor.side_to_move.flip()) {
                    continue;
                }

                let predecessor_index = position_to_index(&predecessor);

                if ptm_wins {
                    // The predecessor's mover played a move into a position
                    // where the opponent (now to move) wins: one more of the
                    // predecessor's options is shown to lose.
                    let _ = store.record_losing_option(predecessor_index, mate_ply + 1, conv_ply + 1, diagnostics);
                } else {
                    // The predecessor's mover played directly into a won
                    // position: the predecessor itself is a win.
                    store.record_win(predecessor_index, winner, mate_ply + 1, conv_ply + 1, diagnostics);
                }
            }
        }

        store.mark_propagated(index, diagnostics);
        progressed += 1;
    }

    progressed
}

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

//! Forward pseudo-legal move generation, attack detection, and retrograde
//! predecessor generation, all built on top of [`crate::rays`]. Forward
//! generation feeds the initializer and the futurebase importer; predecessor
//! generation feeds the intra-table propagator and only ever produces
//! quiet, reversible moves (a capturing or promoting predecessor belongs to
//! a different, larger configuration, already accounted for when that
//! configuration's own futurebase pass ran).

use crate::{
    bitboard::Bitboard,
    config::{Configuration, PROMOTION_KINDS},
    defs::{Direction, Kind, Side, Square},
    position::Position,
    rays::RayTable,
};

/// Which piece a capture removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Victim {
    /// A mobile piece, by its index into `Configuration::mobile`.
    Mobile(usize),
    /// A frozen piece, by its index into `Configuration::frozen`.
    Frozen(usize),
}

/// What kind of event a [`Move`] is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveKind {
    /// A non-capturing move that stays within the current configuration.
    Quiet,
    /// A pawn advancing two squares from its home rank, tagging it
    /// `PawnEp` in the sibling configuration it transitions into.
    DoublePush,
    /// A capture of `victim`.
    Capture {
        /// The captured piece.
        victim: Victim,
    },
    /// A pawn reaching the back rank, becoming `to`, optionally capturing.
    Promotion {
        /// The piece kind the pawn becomes.
        to: Kind,
        /// The captured piece, if this promotion is also a capture.
        capture: Option<Victim>,
    },
    /// An en-passant capture of a `PawnEp` mobile piece.
    EnPassantCapture {
        /// The captured `PawnEp` piece's mobile index.
        victim: usize,
    },
}

/// A single pseudo-legal move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Move {
    /// The moving piece's index into `Configuration::mobile`.
    pub piece: usize,
    /// The square moved from.
    pub from: Square,
    /// The square moved to.
    pub to: Square,
    /// What kind of event this move is.
    pub kind: MoveKind,
}

impl Move {
    /// True for every [`MoveKind`] other than [`MoveKind::Quiet`]: a move
    /// that leaves the current configuration for a dependency table.
    #[must_use]
    pub const fn leaves_configuration(&self) -> bool {
        !matches!(self.kind, MoveKind::Quiet)
    }
}

fn forward_direction(side: Side) -> Direction {
    if side == Side::WHITE {
        Direction::N
    } else {
        Direction::S
    }
}

fn capture_directions(side: Side) -> [Direction; 2] {
    if side == Side::WHITE {
        [Direction::NE, Direction::NW]
    } else {
        [Direction::SE, Direction::SW]
    }
}

fn home_rank(side: Side) -> crate::defs::Rank {
    if side == Side::WHITE {
        crate::defs::Rank::RANK2
    } else {
        crate::defs::Rank::RANK7
    }
}

fn promotion_rank(side: Side) -> crate::defs::Rank {
    if side == Side::WHITE {
        crate::defs::Rank::RANK8
    } else {
        crate::defs::Rank::RANK1
    }
}

fn find_victim(config: &Configuration, position: &Position, square: Square) -> Victim {
    if let Some(i) = config
        .mobile
        .iter()
        .zip(&position.squares)
        .position(|(_, &sq)| sq == square)
    {
        return Victim::Mobile(i);
    }
    let i = config
        .frozen
        .iter()
        .position(|f| f.square == square)
        .expect("a square flagged as an enemy occupant must hold some piece");
    Victim::Frozen(i)
}

fn en_passant_victim(config: &Configuration, position: &Position, from: Square, to: Square, side: Side) -> Option<usize> {
    let passed_square = Square::from_pos(from.rank(), to.file());
    config
        .mobile
        .iter()
        .zip(&position.squares)
        .position(|(m, &sq)| sq == passed_square && m.piece.side != side && m.piece.kind == Kind::PawnEp)
}

fn generate_pawn_moves(
    config: &Configuration,
    position: &Position,
    piece: usize,
    from: Square,
    side: Side,
    occupancy: Bitboard,
    enemy_occupancy: Bitboard,
    moves: &mut Vec<Move>,
) {
    let forward = forward_direction(side);
    let promo_rank = promotion_rank(side);

    if let Some(one) = from.step(forward) {
        if !occupancy.contains(one) {
            if one.rank() == promo_rank {
                for &to in &PROMOTION_KINDS {
                    moves.push(Move { piece, from, to: one, kind: MoveKind::Promotion { to, capture: None } });
                }
            } else {
                moves.push(Move { piece, from, to: one, kind: MoveKind::Quiet });
                if from.rank() == home_rank(side) {
                    if let Some(two) = one.step(forward) {
                        if !occupancy.contains(two) {
                            moves.push(Move { piece, from, to: two, kind: MoveKind::DoublePush });
                        }
                    }
                }
            }
        }
    }

    for direction in capture_directions(side) {
        let Some(to) = from.step(direction) else {
            continue;
        };
        if enemy_occupancy.contains(to) {
            let victim = find_victim(config, position, to);
            if to.rank() == promo_rank {
                for &promoted in &PROMOTION_KINDS {
                    moves.push(Move {
                        piece,
                        from,
                        to,
                        kind: MoveKind::Promotion { to: promoted, capture: Some(victim) },
                    });
                }
            } else {
                moves.push(Move { piece, from, to, kind: MoveKind::Capture { victim } });
            }
        } else if !occupancy.contains(to) {
            if let Some(victim) = en_passant_victim(config, position, from, to, side) {
                moves.push(Move { piece, from, to, kind: MoveKind::EnPassantCapture { victim } });
            }
        }
    }
}

/// Generates every fully legal move for `side` in `position`: obeys piece
/// movement and blocking rules, and excludes any move that would leave
/// `side`'s own king attacked afterward (an ordinary king-safety check, not
/// the deeper "could this predecessor exist" legality that
/// [`crate::initializer`] applies to the position itself).
///
/// # Panics
///
/// Panics if `position` was decoded from an index where the side not to
/// move is in check (an illegal predecessor); callers must filter those
/// out before reaching this function. See [`is_in_check`].
#[must_use]
pub fn generate_moves(config: &Configuration, rays: &RayTable, position: &Position, side: Side) -> Vec<Move> {
    let occupancy = position.occupancy(config);
    let own_occupancy = position.side_occupancy(config, side);
    let enemy_occupancy = position.side_occupancy(config, side.flip());
    let mut moves = Vec::new();

    for (i, mobile) in config.mobile.iter().enumerate() {
        if mobile.piece.side != side {
            continue;
        }
        let from = position.squares[i];

        if mobile.piece.kind.is_pawn_like() {
            generate_pawn_moves(config, position, i, from, side, occupancy, enemy_occupancy, &mut moves);
            continue;
        }

        for ray in rays.rays_from(mobile.piece.kind, from) {
            for stop in ray {
                if stop.square == Square::NONE {
                    break;
                }
                if own_occupancy.contains(stop.square) {
                    break;
                }
                if enemy_occupancy.contains(stop.square) {
                    let victim = find_victim(config, position, stop.square);
                    assert!(
                        !matches!(victim, Victim::Mobile(v) if config.mobile[v].piece.kind == Kind::King),
                        "generate_moves called on a position with the opponent already in check"
                    );
                    moves.push(Move { piece: i, from, to: stop.square, kind: MoveKind::Capture { victim } });
                    break;
                }
                moves.push(Move { piece: i, from, to: stop.square, kind: MoveKind::Quiet });
            }
        }
    }

    moves.retain(|mv| leaves_own_king_safe(config, rays, position, *mv, side));
    moves
}

/// True iff, after playing `mv` for `mover`, `mover`'s own king is not
/// attacked. Used to drop the one class of move `generate_moves`'s
/// per-piece scan cannot rule out on its own: a king stepping into an
/// attacked square, or a pinned piece moving off the line it was blocking.
fn leaves_own_king_safe(config: &Configuration, rays: &RayTable, position: &Position, mv: Move, mover: Side) -> bool {
    let captured_mobile = match mv.kind {
        MoveKind::Capture { victim: Victim::Mobile(i) } | MoveKind::Promotion { capture: Some(Victim::Mobile(i)), .. } => Some(i),
        MoveKind::EnPassantCapture { victim } => Some(victim),
        _ => None,
    };

    let king_square = if config.mobile[mv.piece].piece.kind == Kind::King {
        mv.to
    } else {
        position.king_square(config, mover)
    };

    let mut occupancy = position.occupancy(config);
    occupancy &= !Bitboard::from(mv.from);
    occupancy.set(mv.to);
    if let MoveKind::EnPassantCapture { victim } = mv.kind {
        occupancy &= !Bitboard::from(position.squares[victim]);
    }

    for (i, enemy) in config.mobile.iter().enumerate() {
        if Some(i) == captured_mobile || enemy.piece.side != mover.flip() {
            continue;
        }
        if piece_attacks(rays, enemy.piece.kind, position.squares[i], king_square, enemy.piece.side, occupancy) {
            return false;
        }
    }
    for frozen in &config.frozen {
        if frozen.piece.side != mover.flip() {
            continue;
        }
        if piece_attacks(rays, frozen.piece.kind, frozen.square, king_square, frozen.piece.side, occupancy) {
            return false;
        }
    }

    true
}

fn pawn_attacks(square: Square, side: Side) -> Bitboard {
    let mut bb = Bitboard::EMPTY;
    for direction in capture_directions(side) {
        if let Some(to) = square.step(direction) {
            bb.set(to);
        }
    }
    bb
}

fn piece_attacks(rays: &RayTable, kind: Kind, from: Square, target: Square, side: Side, occupancy: Bitboard) -> bool {
    if kind.is_pawn_like() {
        return pawn_attacks(from, side).contains(target);
    }
    for ray in rays.rays_from(kind, from) {
        for stop in ray {
            if stop.square == Square::NONE {
                break;
            }
            if stop.square == target {
                return true;
            }
            if occupancy.contains(stop.square) {
                break;
            }
        }
    }
    false
}

/// True iff any of `by_side`'s pieces (mobile or frozen) attacks `square`.
#[must_use]
pub fn is_square_attacked(config: &Configuration, rays: &RayTable, position: &Position, square: Square, by_side: Side) -> bool {
    let occupancy = position.occupancy(config);

    for (mobile, &from) in config.mobile.iter().zip(&position.squares) {
        if mobile.piece.side == by_side && piece_attacks(rays, mobile.piece.kind, from, square, by_side, occupancy) {
            return true;
        }
    }
    for frozen in &config.frozen {
        if frozen.piece.side == by_side
            && piece_attacks(rays, frozen.piece.kind, frozen.square, square, by_side, occupancy)
        {
            return true;
        }
    }
    false
}

/// True iff `side`'s king is attacked by the opponent in `position`.
#[must_use]
pub fn is_in_check(config: &Configuration, rays: &RayTable, position: &Position, side: Side) -> bool {
    let king_square = position.king_square(config, side);
    is_square_attacked(config, rays, position, king_square, side.flip())
}

fn generate_non_pawn_predecessors(rays: &RayTable, kind: Kind, piece: usize, cur: Square, occupancy_without_piece: Bitboard, out: &mut Vec<Move>) {
    for ray in rays.rays_from(kind, cur) {
        for stop in ray {
            if stop.square == Square::NONE {
                break;
            }
            if occupancy_without_piece.contains(stop.square) {
                break;
            }
            out.push(Move { piece, from: stop.square, to: cur, kind: MoveKind::Quiet });
        }
    }
}

/// Generates every quiet, reversible move that could have led to `piece`
/// (at its current square in `position`) having just arrived there, i.e.
/// predecessor origins for the intra-table retrograde sweep. Capturing,
/// promoting, or en-passant predecessors are not generated here: they
/// belong to a smaller configuration whose futurebase pass already folded
/// its outcomes into this table.
///
/// `PawnEp` pieces have exactly one predecessor origin: the home-rank
/// square two ranks behind, since a `PawnEp` tag is only ever produced by
/// a double push.
#[must_use]
pub fn generate_predecessors(config: &Configuration, rays: &RayTable, position: &Position, piece: usize) -> Vec<Move> {
    let mobile = &config.mobile[piece];
    let cur = position.squares[piece];
    let full_occupancy = position.occupancy(config);
    let occupancy_without_piece = {
        let mut occ = full_occupancy;
        occ &= !Bitboard::from(cur);
        occ
    };

    let mut predecessors = Vec::new();

    match mobile.piece.kind {
        Kind::PawnEp => {
            let backward = forward_direction(mobile.piece.side.flip());
            if let Some(mid) = cur.step(backward) {
                if !occupancy_without_piece.contains(mid) {
                    if let Some(origin) = mid.step(backward) {
                        if !occupancy_without_piece.contains(origin) {
                            predecessors.push(Move { piece, from: origin, to: cur, kind: MoveKind::Quiet });
                        }
                    }
                }
            }
        }
        Kind::Pawn => {
            let backward = forward_direction(mobile.piece.side.flip());
            if let Some(origin) = cur.step(backward) {
                if !occupancy_without_piece.contains(origin) {
                    predecessors.push(Move { piece, from: origin, to: cur, kind: MoveKind::Quiet });
                }
            }
        }
        kind => generate_non_pawn_predecessors(rays, kind, piece, cur, occupancy_without_piece, &mut predecessors),
    }

    predecessors
}

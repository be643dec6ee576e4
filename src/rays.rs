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

//! Precomputed move-ray tables: for each (kind, origin square, direction),
//! the ordered sequence of destination squares and cumulative occupancy
//! masks a scan along that direction passes through, terminated by a
//! sentinel. This is the sole mechanism for move enumeration: no ad-hoc
//! direction arithmetic appears in [`crate::movegen`].
//!
//! Pawns are deliberately not part of [`RayTable`]: they are handled by
//! dedicated forward/capture/predecessor functions instead of being forced
//! into the ray abstraction, because a pawn's non-capturing and capturing
//! destinations use different squares (unlike every other piece).

use crate::{
    bitboard::Bitboard,
    defs::{Direction, Kind, Square},
};

/// One stop along a ray: a destination square plus the bitboard of every
/// square visited by the scan up to and including this one (used to stop a
/// scan as soon as it intersects an occupancy mask).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RayStop {
    /// The destination square, or [`Square::NONE`] for the sentinel.
    pub square: Square,
    /// The squares visited so far along this ray, inclusive of `square`.
    /// The sentinel carries [`Bitboard::ALL`] so that intersecting it with
    /// any occupancy mask is guaranteed non-empty, terminating scan loops.
    pub mask: Bitboard,
}

/// A ray: an ordered list of [`RayStop`]s, always ending with the sentinel
/// (`square: Square::NONE, mask: Bitboard::ALL`).
pub type Ray = Vec<RayStop>;

/// The eight directions used by kings and queens.
pub const QUEEN_DIRECTIONS: [Direction; 8] = [
    Direction::N,
    Direction::NE,
    Direction::E,
    Direction::SE,
    Direction::S,
    Direction::SW,
    Direction::W,
    Direction::NW,
];

/// The four orthogonal directions used by rooks.
pub const ROOK_DIRECTIONS: [Direction; 4] =
    [Direction::N, Direction::E, Direction::S, Direction::W];

/// The four diagonal directions used by bishops.
pub const BISHOP_DIRECTIONS: [Direction; 4] =
    [Direction::NE, Direction::SE, Direction::SW, Direction::NW];

/// The eight "directions" of a knight, each a length-1 ray.
pub const KNIGHT_OFFSETS: [(Direction, Direction); 8] = [
    (Direction::N, Direction::NE),
    (Direction::N, Direction::NW),
    (Direction::S, Direction::SE),
    (Direction::S, Direction::SW),
    (Direction::E, Direction::NE),
    (Direction::E, Direction::SE),
    (Direction::W, Direction::NW),
    (Direction::W, Direction::SW),
];

/// The sentinel [`RayStop`] that terminates every ray.
#[must_use]
pub const fn sentinel() -> RayStop {
    RayStop {
        square: Square::NONE,
        mask: Bitboard::ALL,
    }
}

/// Precomputed rays for the non-pawn piece kinds, built once by
/// [`RayTable::build`] and shared (by reference) through the rest of the
/// build.
pub struct RayTable {
    /// `rays[kind][square][direction]`, keyed by the position of `kind` in
    /// [`NON_PAWN_KINDS`] and direction index within that kind's own
    /// direction list.
    rays: Vec<Vec<Vec<Ray>>>,
}

/// The five kinds with entries in [`RayTable`] (pawns are handled
/// separately).
pub const NON_PAWN_KINDS: [Kind; 5] = [Kind::King, Kind::Queen, Kind::Rook, Kind::Bishop, Kind::Knight];

fn kind_slot(kind: Kind) -> usize {
    NON_PAWN_KINDS
        .iter()
        .position(|k| *k == kind)
        .expect("rays are only stored for non-pawn kinds")
}

/// Whether `kind`'s rays are built by sliding until blocked (true for
/// queen/rook/bishop) or stop after one step (king, knight).
fn is_sliding(kind: Kind) -> bool {
    kind.is_sliding()
}

fn directions_for(kind: Kind) -> Vec<Direction> {
    match kind {
        Kind::King | Kind::Queen => QUEEN_DIRECTIONS.to_vec(),
        Kind::Rook => ROOK_DIRECTIONS.to_vec(),
        Kind::Bishop => BISHOP_DIRECTIONS.to_vec(),
        Kind::Knight => KNIGHT_OFFSETS.iter().map(|_| Direction::N).collect(),
        Kind::Pawn | Kind::PawnEp => Vec::new(),
    }
}

/// Builds the ray starting at `square` stepping by `direction`, sliding
/// until it falls off the board if `sliding` is true, stopping after one
/// step otherwise.
fn build_ray(square: Square, direction: Direction, sliding: bool) -> Ray {
    let mut ray = Vec::new();
    let mut mask = Bitboard::EMPTY;
    let mut current = square;

    loop {
        let Some(next) = current.step(direction) else {
            break;
        };
        mask.set(next);
        ray.push(RayStop { square: next, mask });
        current = next;
        if !sliding {
            break;
        }
    }

    ray.push(sentinel());
    ray
}

/// Builds the knight ray landing on the one square reached by `first` then
/// `second` (used because a knight move is not a single compass step).
fn build_knight_ray(square: Square, first: Direction, second: Direction) -> Ray {
    let mut ray = Vec::new();
    if let Some(mid) = square.step(first) {
        if let Some(dest) = mid.step(second) {
            // A valid knight move changes file by exactly 1 and rank by
            // exactly 2, or vice versa; `step` alone cannot distinguish a
            // wrap from a real knight move across two compass steps, so
            // check the file distance explicitly.
            if dest.file().0.abs_diff(square.file().0) <= 2 {
                ray.push(RayStop {
                    square: dest,
                    mask: Bitboard::from(dest),
                });
            }
        }
    }
    ray.push(sentinel());
    ray
}

impl RayTable {
    /// Builds every non-pawn ray for every square, once, as the first step
    /// of a build.
    #[must_use]
    pub fn build() -> Self {
        let mut rays = vec![Vec::new(); NON_PAWN_KINDS.len()];

        for (slot, &kind) in NON_PAWN_KINDS.iter().enumerate() {
            let mut per_square = Vec::with_capacity(Square::TOTAL);
            for sq in 0..Square::TOTAL as u8 {
                let square = Square(sq);
                let per_direction = if kind == Kind::Knight {
                    KNIGHT_OFFSETS
                        .iter()
                        .map(|&(a, b)| build_knight_ray(square, a, b))
                        .collect()
                } else {
                    directions_for(kind)
                        .iter()
                        .map(|&d| build_ray(square, d, is_sliding(kind)))
                        .collect()
                };
                per_square.push(per_direction);
            }
            rays[slot] = per_square;
        }

        Self { rays }
    }

    /// The rays for `kind` from `square`, one per direction (or knight
    /// offset), each sentinel-terminated.
    ///
    /// # Panics
    ///
    /// Panics if `kind` is `Pawn` or `PawnEp`; see the module docs for why
    /// pawns are not part of this table.
    #[must_use]
    pub fn rays_from(&self, kind: Kind, square: Square) -> &[Ray] {
        assert!(
            !kind.is_pawn_like(),
            "pawn moves are not stored in RayTable; see crate::movegen"
        );
        &self.rays[kind_slot(kind)][square.to_index()]
    }
}

/// A single violation found by [`verify`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RayViolation {
    /// A ray never reached the sentinel.
    MissingSentinel { kind: Kind, square: Square },
    /// A non-sentinel destination was outside `[0, 63]` — structurally
    /// impossible given `Square`'s representation, checked anyway as a
    /// defence against a future refactor.
    OutOfRange { kind: Kind, square: Square },
    /// `a` can reach `b` but `b` cannot reach `a`.
    AsymmetricReachability {
        kind: Kind,
        a: Square,
        b: Square,
    },
    /// More than one direction from `a` reaches `b`.
    AmbiguousDirection { kind: Kind, a: Square, b: Square },
}

/// Runs the development/test-time verification pass against every
/// non-pawn kind: ray symmetry, unique direction, sentinel termination,
/// and destination range. Returns every violation found (empty on
/// success).
#[must_use]
pub fn verify(table: &RayTable) -> Vec<RayViolation> {
    let mut violations = Vec::new();

    for &kind in &NON_PAWN_KINDS {
        for sq in 0..Square::TOTAL as u8 {
            let square = Square(sq);
            for ray in table.rays_from(kind, square) {
                let Some((&last, rest)) = ray.split_last() else {
                    continue;
                };
                if last.square != Square::NONE || last.mask != Bitboard::ALL {
                    violations.push(RayViolation::MissingSentinel { kind, square });
                }
                for stop in rest {
                    if stop.square.to_index() >= Square::TOTAL {
                        violations.push(RayViolation::OutOfRange { kind, square });
                    }
                }
            }
        }

        for a in 0..Square::TOTAL as u8 {
            let a = Square(a);
            let mut reaches_from_a = Vec::new();
            for (dir_idx, ray) in table.rays_from(kind, a).iter().enumerate() {
                for stop in ray {
                    if stop.square == Square::NONE {
                        break;
                    }
                    reaches_from_a.push((stop.square, dir_idx));
                }
            }

            let mut seen_destinations = std::collections::HashSet::new();
            for (b, _) in &reaches_from_a {
                if !seen_destinations.insert(*b) {
                    violations.push(RayViolation::AmbiguousDirection { kind, a, b: *b });
                }
            }

            for (b, _) in reaches_from_a {
                let b_reaches_a = table
                    .rays_from(kind, b)
                    .iter()
                    .flatten()
                    .any(|stop| stop.square == a);
                if !b_reaches_a {
                    violations.push(RayViolation::AsymmetricReachability { kind, a, b });
                }
            }
        }
    }

    violations
}

#[cfg(test)]
mod tests {
    use super::{verify, RayTable};
    use crate::defs::{Kind, Square};

    #[test]
    fn verification_pass_is_clean() {
        let table = RayTable::build();
        let violations = verify(&table);
        assert!(violations.is_empty(), "{violations:?}");
    }

    #[test]
    fn rook_from_a1_reaches_a8_and_h1() {
        let table = RayTable::build();
        let rays = table.rays_from(Kind::Rook, Square::A1);
        let destinations: Vec<Square> = rays
            .iter()
            .flatten()
            .map(|stop| stop.square)
            .filter(|&sq| sq != Square::NONE)
            .collect();
        assert!(destinations.contains(&Square::A8));
        assert!(destinations.contains(&Square::H1));
        assert!(!destinations.contains(&Square::B2));
    }

    #[test]
    fn knight_from_a1_reaches_b3_and_c2_only() {
        let table = RayTable::build();
        let destinations: Vec<Square> = table
            .rays_from(Kind::Knight, Square::A1)
            .iter()
            .flatten()
            .map(|stop| stop.square)
            .filter(|&sq| sq != Square::NONE)
            .collect();
        assert_eq!(destinations.len(), 2);
        assert!(destinations.contains(&Square::B3));
        assert!(destinations.contains(&Square::C2));
    }
}

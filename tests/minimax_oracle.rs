//! P2: `mate_ply` on the built table matches an independent minimax that
//! walks the position graph itself, with no reference to [`entry::Entry`]'s
//! bookkeeping beyond reading the final built table for comparison.

use std::collections::{HashMap, HashSet};

use tablebase_core::{
    config::{Configuration, MobilePiece},
    defs::{Kind, Piece, Side, Square},
    driver,
    entry::Outcome,
    movegen::{generate_moves, is_in_check, Move, MoveKind},
    position::{position_to_index, Index, Position},
    rays::RayTable,
};

fn krk() -> Configuration {
    Configuration {
        name: "krk".to_string(),
        mobile: vec![
            MobilePiece { piece: Piece { side: Side::WHITE, kind: Kind::King } },
            MobilePiece { piece: Piece { side: Side::WHITE, kind: Kind::Rook } },
            MobilePiece { piece: Piece { side: Side::BLACK, kind: Kind::King } },
        ],
        frozen: Vec::new(),
        futurebases: Vec::new(),
        prunes: Vec::new(),
        dtm: true,
    }
}

/// The minimax value of a position from the side to move's perspective.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum GameValue {
    /// The side to move forces mate in this many plies.
    WinIn(u8),
    /// The side to move is forced into mate in this many plies.
    LossIn(u8),
    /// Neither side can force a decision; includes any repeated position.
    Draw,
}

fn apply_quiet_move(position: &Position, mv: &Move) -> Position {
    let mut squares = position.squares.clone();
    squares[mv.piece] = mv.to;
    Position { side_to_move: position.side_to_move.flip(), squares }
}

fn better_for_mover(a: GameValue, b: GameValue) -> GameValue {
    match (a, b) {
        (GameValue::WinIn(x), GameValue::WinIn(y)) => GameValue::WinIn(x.min(y)),
        (GameValue::WinIn(_), GameValue::Draw | GameValue::LossIn(_)) => a,
        (GameValue::Draw | GameValue::LossIn(_), GameValue::WinIn(_)) => b,
        (GameValue::Draw, GameValue::Draw) => GameValue::Draw,
        (GameValue::Draw, GameValue::LossIn(_)) => a,
        (GameValue::LossIn(_), GameValue::Draw) => b,
        (GameValue::LossIn(x), GameValue::LossIn(y)) => GameValue::LossIn(x.max(y)),
    }
}

/// Solves `position`'s minimax value by exploring only the subtree
/// reachable from it, independently of the built table. A position
/// revisited on the current search path is a real repetition and is
/// scored as a draw rather than explored again.
fn solve(
    config: &Configuration,
    rays: &RayTable,
    position: &Position,
    visiting: &mut HashSet<Index>,
    memo: &mut HashMap<Index, GameValue>,
) -> GameValue {
    let index = position_to_index(position);
    if let Some(&value) = memo.get(&index) {
        return value;
    }
    if visiting.contains(&index) {
        return GameValue::Draw;
    }

    visiting.insert(index);
    let moves = generate_moves(config, rays, position, position.side_to_move);
    let value = if moves.is_empty() {
        if is_in_check(config, rays, position, position.side_to_move) {
            GameValue::LossIn(0)
        } else {
            GameValue::Draw
        }
    } else {
        let mut best = None;
        for mv in &moves {
            assert_eq!(mv.kind, MoveKind::Quiet, "krk has no moves that leave the configuration");
            let child = apply_quiet_move(position, mv);
            let child_value = solve(config, rays, &child, visiting, memo);
            let translated = match child_value {
                GameValue::WinIn(n) => GameValue::LossIn(n.saturating_add(1)),
                GameValue::LossIn(n) => GameValue::WinIn(n.saturating_add(1)),
                GameValue::Draw => GameValue::Draw,
            };
            best = Some(best.map_or(translated, |current| better_for_mover(current, translated)));
        }
        best.expect("moves is non-empty")
    };
    visiting.remove(&index);
    memo.insert(index, value);
    value
}

#[test]
fn krk_mate_ply_matches_independent_minimax() {
    let config = krk();
    let rays = RayTable::build();
    let output = driver::build(&config, &HashMap::new(), true).unwrap();
    assert!(!output.diagnostics.is_suspect());

    let start = Position { side_to_move: Side::WHITE, squares: vec![Square::A1, Square::A8, Square::H8] };
    let mut visiting = HashSet::new();
    let mut memo = HashMap::new();
    let value = solve(&config, &rays, &start, &mut visiting, &mut memo);

    let entry = output.store.get(position_to_index(&start));
    match value {
        GameValue::WinIn(n) => {
            assert_eq!(entry.outcome(), Outcome::PtmWinsDone);
            assert_eq!(entry.mate_ply(), Some(n));
        }
        GameValue::LossIn(n) => {
            assert_eq!(entry.outcome(), Outcome::PntmWinsDone);
            assert_eq!(entry.mate_ply(), Some(n));
        }
        GameValue::Draw => assert_eq!(entry.outcome(), Outcome::Draw),
    }
}

#[test]
fn krk_losing_side_to_move_mate_ply_also_matches() {
    let config = krk();
    let rays = RayTable::build();
    let output = driver::build(&config, &HashMap::new(), true).unwrap();

    // Same material, Black to move: the king is driven to the edge and
    // mated, so the minimax value here is a loss for the side to move.
    let start = Position { side_to_move: Side::BLACK, squares: vec![Square::A6, Square::H1, Square::A8] };
    let mut visiting = HashSet::new();
    let mut memo = HashMap::new();
    let value = solve(&config, &rays, &start, &mut visiting, &mut memo);

    let entry = output.store.get(position_to_index(&start));
    match value {
        GameValue::WinIn(n) => {
            assert_eq!(entry.outcome(), Outcome::PtmWinsDone);
            assert_eq!(entry.mate_ply(), Some(n));
        }
        GameValue::LossIn(n) => {
            assert_eq!(entry.outcome(), Outcome::PntmWinsDone);
            assert_eq!(entry.mate_ply(), Some(n));
        }
        GameValue::Draw => assert_eq!(entry.outcome(), Outcome::Draw),
    }
}

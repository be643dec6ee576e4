//! The concrete end-to-end scenarios: build a real (tiny) configuration
//! through the full driver and check the resulting entries.

use std::collections::HashMap;

use tablebase_core::{
    config::{Configuration, MobilePiece},
    defs::{Kind, Piece, Side, Square},
    driver,
    entry::Outcome,
    position::{position_to_index, Position},
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

fn kk() -> Configuration {
    Configuration {
        name: "kk".to_string(),
        mobile: vec![
            MobilePiece { piece: Piece { side: Side::WHITE, kind: Kind::King } },
            MobilePiece { piece: Piece { side: Side::BLACK, kind: Kind::King } },
        ],
        frozen: Vec::new(),
        futurebases: Vec::new(),
        prunes: Vec::new(),
        dtm: true,
    }
}

#[test]
fn kqk_white_to_move_is_a_win_for_white() {
    let output = driver::build(&kqk(), &HashMap::new(), true).unwrap();
    assert!(!output.diagnostics.is_suspect());

    let position = Position { side_to_move: Side::WHITE, squares: vec![Square::E1, Square::D1, Square::E8] };
    let entry = output.store.get(position_to_index(&position));
    assert_eq!(entry.outcome(), Outcome::PtmWinsDone);
    // KQK is always won within a handful of moves; a generous bound avoids
    // coupling this test to the exact optimal-play distance.
    assert!(entry.mate_ply().unwrap() <= 20);
}

#[test]
fn kqk_black_to_move_is_still_a_win_for_white() {
    let output = driver::build(&kqk(), &HashMap::new(), true).unwrap();
    assert!(!output.diagnostics.is_suspect());

    let position = Position { side_to_move: Side::BLACK, squares: vec![Square::E1, Square::E4, Square::E8] };
    let entry = output.store.get(position_to_index(&position));
    // Black to move, White (not the player to move) wins.
    assert_eq!(entry.outcome(), Outcome::PntmWinsDone);
    assert!(entry.mate_ply().unwrap() <= 21);
}

#[test]
fn krk_white_to_move_is_won_within_the_classical_bound() {
    let output = driver::build(&krk(), &HashMap::new(), true).unwrap();
    assert!(!output.diagnostics.is_suspect());

    let position = Position { side_to_move: Side::WHITE, squares: vec![Square::A1, Square::A8, Square::H8] };
    let entry = output.store.get(position_to_index(&position));
    assert_eq!(entry.outcome(), Outcome::PtmWinsDone);
    // KRK is solvable within 16 full moves from any legal position.
    assert!(entry.mate_ply().unwrap() <= 32);
}

#[test]
fn kk_has_no_wins_anywhere() {
    let output = driver::build(&kk(), &HashMap::new(), true).unwrap();
    assert!(!output.diagnostics.is_suspect());
    for (_, entry) in output.store.iter() {
        assert!(matches!(entry.outcome(), Outcome::Illegal | Outcome::Draw));
    }
}

#[test]
fn stalemate_seed_is_drawn() {
    let output = driver::build(&kqk(), &HashMap::new(), true).unwrap();
    let position = Position { side_to_move: Side::BLACK, squares: vec![Square::F6, Square::G6, Square::H8] };
    let entry = output.store.get(position_to_index(&position));
    assert_eq!(entry.outcome(), Outcome::Draw);
}

#[test]
fn adjacent_kings_seed_is_illegal() {
    let output = driver::build(&kk(), &HashMap::new(), true).unwrap();
    let position = Position { side_to_move: Side::WHITE, squares: vec![Square::E4, Square::E5] };
    let entry = output.store.get(position_to_index(&position));
    assert_eq!(entry.outcome(), Outcome::Illegal);
}

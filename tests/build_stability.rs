//! P4: running the full build twice on the same configuration produces
//! byte-identical output, including through a futurebase dependency.

use std::collections::HashMap;

use tablebase_core::{
    config::{Configuration, FutureRef, MobilePiece},
    defs::{Kind, Piece, Side},
    driver,
    futurebase::FutureBase,
};

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

fn krk() -> Configuration {
    Configuration {
        name: "krk".to_string(),
        mobile: vec![
            MobilePiece { piece: Piece { side: Side::WHITE, kind: Kind::King } },
            MobilePiece { piece: Piece { side: Side::WHITE, kind: Kind::Rook } },
            MobilePiece { piece: Piece { side: Side::BLACK, kind: Kind::King } },
        ],
        frozen: Vec::new(),
        futurebases: vec![FutureRef { name: "kk".to_string(), invert_colors: false }],
        prunes: Vec::new(),
        dtm: true,
    }
}

#[test]
fn krk_build_is_byte_identical_across_runs() {
    let kk_output = driver::build(&kk(), &HashMap::new(), true).unwrap();
    assert!(!kk_output.diagnostics.is_suspect());
    let kk_future = FutureBase { config: kk(), store: kk_output.store };

    let mut loaded = HashMap::new();
    loaded.insert("kk".to_string(), kk_future);

    let first = driver::build(&krk(), &loaded, true).unwrap();
    let second = driver::build(&krk(), &loaded, true).unwrap();

    assert!(!first.diagnostics.is_suspect());
    assert!(!second.diagnostics.is_suspect());
    assert_eq!(first.store.to_bytes(), second.store.to_bytes());
}

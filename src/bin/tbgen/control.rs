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

//! Parses the XML control file into a [`Configuration`]: the output name,
//! mobile pieces, frozen pieces, futurebase references, prune rules, and
//! the `dtm` flag. Everything upstream of this module treats the control
//! file as someone else's format; this is the one place that's true.
//!
//! ```xml
//! <tablebase name="krk" dtm="true">
//!   <mobile color="white" kind="king"/>
//!   <mobile color="white" kind="rook"/>
//!   <mobile color="black" kind="king"/>
//!   <futurebase name="kk"/>
//!   <prune-our-move from="a1" to="a2"/>
//! </tablebase>
//! ```

use std::str;

use quick_xml::{
    events::{BytesStart, Event},
    Reader,
};
use tablebase_core::{
    config::{Configuration, FrozenPiece, FutureRef, MobilePiece, PruneRule, PruneSide},
    defs::{Kind, Piece, Side, Square},
    error::ConfigError,
};

/// Parses a control file's XML text into a [`Configuration`].
///
/// # Errors
///
/// Returns [`ConfigError::InvalidControlFile`] for any markup this parser
/// doesn't recognise: an unknown element, a missing required attribute, or
/// an attribute value that doesn't parse as the piece/square/color it
/// names.
pub fn parse(xml: &str) -> Result<Configuration, ConfigError> {
    let mut reader = Reader::from_str(xml);

    let mut name = None;
    let mut dtm = false;
    let mut mobile = Vec::new();
    let mut frozen = Vec::new();
    let mut futurebases = Vec::new();
    let mut prunes = Vec::new();

    let mut buf = Vec::new();
    loop {
        let event = reader.read_event_into(&mut buf).map_err(|e| invalid(&e.to_string()))?;
        match event {
            Event::Eof => break,
            Event::Empty(tag) | Event::Start(tag) => {
                let attrs = read_attrs(&tag)?;
                match local_name(&tag)?.as_str() {
                    "tablebase" => {
                        name = Some(attr(&attrs, "name")?.to_string());
                        dtm = attrs.iter().any(|(k, v)| k == "dtm" && v == "true");
                    }
                    "mobile" => mobile.push(MobilePiece { piece: parse_piece(&attrs)? }),
                    "frozen" => {
                        let piece = parse_piece(&attrs)?;
                        let square = parse_square(attr(&attrs, "square")?)?;
                        frozen.push(FrozenPiece { piece, square });
                    }
                    "futurebase" => {
                        let ref_name = attr(&attrs, "name")?.to_string();
                        let invert_colors = attrs.iter().any(|(k, v)| k == "colors" && v == "invert");
                        futurebases.push(FutureRef { name: ref_name, invert_colors });
                    }
                    "prune-our-move" | "prune-his-move" => {
                        let side = if local_name(&tag)? == "prune-our-move" { PruneSide::Our } else { PruneSide::His };
                        let from = parse_square(attr(&attrs, "from")?)?;
                        let to = parse_square(attr(&attrs, "to")?)?;
                        prunes.push(PruneRule { side, from, to });
                    }
                    other => return Err(invalid(&format!("unrecognised element <{other}>"))),
                }
            }
            _ => {}
        }
        buf.clear();
    }

    Ok(Configuration {
        name: name.ok_or_else(|| invalid("missing <tablebase name=\"...\"> root element"))?,
        mobile,
        frozen,
        futurebases,
        prunes,
        dtm,
    })
}

fn local_name(tag: &BytesStart<'_>) -> Result<String, ConfigError> {
    str::from_utf8(tag.local_name().as_ref())
        .map(str::to_string)
        .map_err(|e| invalid(&e.to_string()))
}

fn read_attrs(tag: &BytesStart<'_>) -> Result<Vec<(String, String)>, ConfigError> {
    let mut out = Vec::new();
    for attr in tag.attributes() {
        let attr = attr.map_err(|e| invalid(&e.to_string()))?;
        let key = str::from_utf8(attr.key.as_ref()).map_err(|e| invalid(&e.to_string()))?.to_string();
        let value = attr.unescape_value().map_err(|e| invalid(&e.to_string()))?.into_owned();
        out.push((key, value));
    }
    Ok(out)
}

fn attr<'a>(attrs: &'a [(String, String)], key: &str) -> Result<&'a str, ConfigError> {
    attrs
        .iter()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.as_str())
        .ok_or_else(|| invalid(&format!("missing required attribute '{key}'")))
}

fn parse_piece(attrs: &[(String, String)]) -> Result<Piece, ConfigError> {
    Ok(Piece { side: parse_side(attr(attrs, "color")?)?, kind: parse_kind(attr(attrs, "kind")?)? })
}

fn parse_side(text: &str) -> Result<Side, ConfigError> {
    match text {
        "white" => Ok(Side::WHITE),
        "black" => Ok(Side::BLACK),
        _ => Err(invalid(&format!("unrecognised color '{text}', expected 'white' or 'black'"))),
    }
}

fn parse_kind(text: &str) -> Result<Kind, ConfigError> {
    match text {
        "king" => Ok(Kind::King),
        "queen" => Ok(Kind::Queen),
        "rook" => Ok(Kind::Rook),
        "bishop" => Ok(Kind::Bishop),
        "knight" => Ok(Kind::Knight),
        "pawn" => Ok(Kind::Pawn),
        "pawn-ep" => Ok(Kind::PawnEp),
        _ => Err(invalid(&format!("unrecognised piece kind '{text}'"))),
    }
}

fn parse_square(text: &str) -> Result<Square, ConfigError> {
    text.parse().map_err(|_| invalid(&format!("'{text}' is not a square")))
}

fn invalid(message: &str) -> ConfigError {
    ConfigError::InvalidControlFile(message.to_string())
}

#[cfg(test)]
mod tests {
    use super::parse;
    use tablebase_core::{
        config::PruneSide,
        defs::{Kind, Side, Square},
    };

    #[test]
    fn parses_krk_with_a_futurebase_and_a_prune() {
        let xml = r#"
            <tablebase name="krk" dtm="true">
                <mobile color="white" kind="king"/>
                <mobile color="white" kind="rook"/>
                <mobile color="black" kind="king"/>
                <futurebase name="kk" colors="invert"/>
                <prune-our-move from="a1" to="a2"/>
            </tablebase>
        "#;
        let config = parse(xml).unwrap();
        assert_eq!(config.name, "krk");
        assert!(config.dtm);
        assert_eq!(config.mobile.len(), 3);
        assert_eq!(config.mobile[1].piece.kind, Kind::Rook);
        assert_eq!(config.futurebases.len(), 1);
        assert!(config.futurebases[0].invert_colors);
        assert_eq!(config.prunes.len(), 1);
        assert_eq!(config.prunes[0].side, PruneSide::Our);
        assert_eq!(config.prunes[0].from, Square::A1);
    }

    #[test]
    fn parses_frozen_pieces() {
        let xml = r#"
            <tablebase name="kpk" dtm="false">
                <mobile color="white" kind="king"/>
                <mobile color="black" kind="king"/>
                <frozen color="white" kind="pawn" square="e4"/>
            </tablebase>
        "#;
        let config = parse(xml).unwrap();
        assert!(!config.dtm);
        assert_eq!(config.frozen.len(), 1);
        assert_eq!(config.frozen[0].piece.side, Side::WHITE);
        assert_eq!(config.frozen[0].square, Square::E4);
    }

    #[test]
    fn missing_root_name_is_an_error() {
        let xml = r#"<tablebase dtm="true"></tablebase>"#;
        assert!(parse(xml).is_err());
    }

    #[test]
    fn unrecognised_element_is_an_error() {
        let xml = r#"<tablebase name="kk"><nonsense/></tablebase>"#;
        assert!(parse(xml).is_err());
    }
}

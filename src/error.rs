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

//! Error types: minimal, hand-rolled enums rather than a derive-macro
//! error crate. Every variant here is something a caller branches on, not
//! free text.

use std::{fmt, io};

/// An error parsing a short textual token (squares, piece letters, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseError {
    /// A token was outside an expected range.
    ErroneousToken,
    /// Expected a token but found nothing.
    ExpectedToken,
    /// Expected a different token.
    InvalidToken,
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::ErroneousToken => "token out of range",
            Self::ExpectedToken => "expected a token but found nothing",
            Self::InvalidToken => "unrecognised token",
        })
    }
}

impl std::error::Error for ParseError {}

/// A problem with a [`crate::config::Configuration`] or its futurebase
/// dependencies, detected before any build work starts and always fatal.
#[derive(Debug)]
pub enum ConfigError {
    /// The control file did not parse as valid input.
    InvalidControlFile(String),
    /// A configuration has zero or more than one king for a side.
    WrongKingCount {
        /// The side with the wrong number of kings.
        side: crate::defs::Side,
        /// How many kings it has.
        count: usize,
    },
    /// A configuration names more than 8 mobile pieces.
    TooManyMobilePieces(usize),
    /// A frozen piece and a mobile piece (or two frozen pieces) share a
    /// square.
    DuplicateSquare(crate::defs::Square),
    /// A move out of the current configuration (capture, promotion, or
    /// en-passant capture) has no matching futurebase and no pruning
    /// declaration: the build cannot be sound.
    UnresolvedFutureMove {
        /// The square the moving piece started from.
        from: crate::defs::Square,
        /// The square the moving piece ended on.
        to: crate::defs::Square,
    },
    /// A futurebase file's header does not match what its reference in the
    /// control file claims (wrong piece list, or `invert` declared but the
    /// colours don't actually swap to a valid configuration).
    FutureBaseMismatch {
        /// The futurebase's declared name.
        name: String,
        /// What was wrong.
        reason: String,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidControlFile(reason) => write!(f, "invalid control file: {reason}"),
            Self::WrongKingCount { side, count } => {
                write!(f, "side {side:?} has {count} kings, expected exactly 1")
            }
            Self::TooManyMobilePieces(n) => {
                write!(f, "{n} mobile pieces declared, maximum is 8")
            }
            Self::DuplicateSquare(square) => {
                write!(f, "square {square} is occupied by more than one piece")
            }
            Self::UnresolvedFutureMove { from, to } => write!(
                f,
                "move {from}{to} leaves the configuration with no matching futurebase \
                 and no pruning declaration"
            ),
            Self::FutureBaseMismatch { name, reason } => {
                write!(f, "futurebase '{name}' does not match its declaration: {reason}")
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// A fatal build error: configuration, I/O, or resource exhaustion.
/// Invariant violations are deliberately *not* part of this type: the
/// build continues and collects them in [`crate::diagnostics::Diagnostics`]
/// instead.
#[derive(Debug)]
pub enum BuildError {
    /// A configuration error, see [`ConfigError`].
    Config(ConfigError),
    /// An I/O failure reading or writing a tablebase/futurebase file.
    Io(io::Error),
    /// The entry store could not be allocated.
    ResourceExhausted {
        /// The number of bytes that allocation needed.
        needed_bytes: u64,
    },
}

impl fmt::Display for BuildError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(e) => write!(f, "{e}"),
            Self::Io(e) => write!(f, "I/O error: {e}"),
            Self::ResourceExhausted { needed_bytes } => {
                write!(f, "could not allocate {needed_bytes} bytes for the entry store")
            }
        }
    }
}

impl std::error::Error for BuildError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Config(e) => Some(e),
            Self::Io(e) => Some(e),
            Self::ResourceExhausted { .. } => None,
        }
    }
}

impl From<ConfigError> for BuildError {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

impl From<io::Error> for BuildError {
    fn from(e: io::Error) -> Self {
        Self::Io(e)
    }
}

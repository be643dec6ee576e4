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

//! The dense entry array, one [`Entry`] per index, plus the side-aware
//! wrappers around its mutators: the algorithm's `white_wins`/`black_wins`
//! and `add_one_to_<side>_wins` only make sense once an absolute side is
//! resolved against the index's own side-to-move bit, which happens here
//! rather than in [`crate::entry`] itself.

use crate::{
    config::Configuration,
    defs::Side,
    diagnostics::Diagnostics,
    entry::Entry,
    error::BuildError,
    position::Index,
};

/// The entry array for one configuration, indexed directly by [`Index`].
pub struct EntryStore {
    entries: Vec<Entry>,
}

impl EntryStore {
    /// Allocates a zeroed-equivalent entry store sized to `config`'s index
    /// range.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError::ResourceExhausted`] if the allocation fails.
    pub fn allocate(config: &Configuration) -> Result<Self, BuildError> {
        let len = usize::try_from(config.index_range()).map_err(|_| BuildError::ResourceExhausted {
            needed_bytes: config.index_range() * 4,
        })?;

        let mut entries = Vec::new();
        entries
            .try_reserve_exact(len)
            .map_err(|_| BuildError::ResourceExhausted { needed_bytes: config.index_range() * 4 })?;
        entries.resize(len, Entry::default());

        Ok(Self { entries })
    }

    /// The number of indices in this store.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True iff this store holds no indices (never true for a validated
    /// configuration, kept for API completeness).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The entry at `index`.
    #[must_use]
    pub fn get(&self, index: Index) -> Entry {
        self.entries[index as usize]
    }

    /// Overwrites the entry at `index`.
    pub fn set(&mut self, index: Index, entry: Entry) {
        self.entries[index as usize] = entry;
    }

    fn side_to_move(index: Index) -> Side {
        Side((index & 1) as u8)
    }

    /// `white_wins`/`black_wins`: records that `winner` has a direct win at
    /// `index`, resolving whether that makes `index`'s entry PTM-wins or
    /// PNTM-wins from its own side-to-move bit. Violations are logged to
    /// `diagnostics`, not returned, per the algorithm's "run to completion"
    /// error policy.
    pub fn record_win(&mut self, index: Index, winner: Side, mate_ply: u8, conv_ply: u8, diagnostics: &mut Diagnostics) {
        let ptm_wins = winner == Self::side_to_move(index);
        let mut entry = self.get(index);
        if let Err(violation) = entry.record_win(ptm_wins, mate_ply, conv_ply) {
            diagnostics.record(index, violation);
            return;
        }
        self.set(index, entry);
    }

    /// `add_one_to_<side>_wins`: records that one more of `index`'s
    /// player-to-move options has been shown to hand the win to the
    /// opponent. Returns `true` if this just resolved the entry to
    /// PNTM-wins-pending.
    #[must_use]
    pub fn record_losing_option(&mut self, index: Index, mate_ply: u8, conv_ply: u8, diagnostics: &mut Diagnostics) -> bool {
        let mut entry = self.get(index);
        match entry.record_losing_option(mate_ply, conv_ply) {
            Ok(resolved) => {
                self.set(index, entry);
                resolved
            }
            Err(violation) => {
                diagnostics.record(index, violation);
                false
            }
        }
    }

    /// Transitions `index` from `*-wins-pending` to `*-wins-done`.
    pub fn mark_propagated(&mut self, index: Index, diagnostics: &mut Diagnostics) {
        let mut entry = self.get(index);
        if let Err(violation) = entry.mark_propagated() {
            diagnostics.record(index, violation);
            return;
        }
        self.set(index, entry);
    }

    /// Rewrites every still-pending entry to the canonical draw marker.
    pub fn finalize_draws(&mut self) {
        for entry in &mut self.entries {
            entry.finalize_draw();
        }
    }

    /// Iterates every `(index, entry)` pair in index order.
    pub fn iter(&self) -> impl Iterator<Item = (Index, Entry)> + '_ {
        self.entries.iter().enumerate().map(|(i, &e)| (i as Index, e))
    }

    /// The raw bytes of every entry, in index order, as written to a
    /// tablebase file.
    #[must_use]
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.entries.len() * 4);
        for entry in &self.entries {
            out.extend_from_slice(&entry.to_bytes());
        }
        out
    }

    /// Reconstructs a store from its raw bytes, used when reading a
    /// futurebase file.
    #[must_use]
    pub fn from_bytes(bytes: &[u8]) -> Self {
        let entries = bytes
            .chunks_exact(4)
            .map(|chunk| Entry::from_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
            .collect();
        Self { entries }
    }
}

#[cfg(test)]
mod tests {
    use super::EntryStore;
    use crate::{
        config::{Configuration, MobilePiece},
        defs::{Kind, Piece, Side},
        diagnostics::Diagnostics,
        entry::{Entry, Outcome},
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

    #[test]
    fn allocates_sized_to_index_range() {
        let store = EntryStore::allocate(&kk()).unwrap();
        assert_eq!(store.len() as u64, kk().index_range());
    }

    #[test]
    fn record_win_resolves_to_correct_side() {
        let mut store = EntryStore::allocate(&kk()).unwrap();
        let mut diagnostics = Diagnostics::new();
        // index 0: side_to_move = Black (bit 0). White wins here means PNTM wins.
        store.set(0, Entry::pending(3));
        store.record_win(0, Side::WHITE, 4, 2, &mut diagnostics);
        assert!(!diagnostics.is_suspect());
        assert_eq!(store.get(0).outcome(), Outcome::PntmWinsPending);
    }

    #[test]
    fn bytes_round_trip() {
        let mut store = EntryStore::allocate(&kk()).unwrap();
        store.set(1, Entry::checkmate());
        let bytes = store.to_bytes();
        let restored = EntryStore::from_bytes(&bytes);
        assert_eq!(restored.get(1), store.get(1));
    }
}

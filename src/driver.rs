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

//! Sequences the three labeling phases over one [`Configuration`] and
//! finalizes whatever is left over as drawn.

use std::collections::HashMap;

use crate::{
    config::Configuration,
    diagnostics::Diagnostics,
    error::BuildError,
    futurebase::{self, FutureBase},
    initializer,
    propagate,
    rays::{self, RayTable},
    tablebase::EntryStore,
};

/// The maximum number of propagation sweeps run before giving up on
/// reaching a fixpoint; guards against an invariant violation silently
/// turning into an infinite loop.
const MAX_SWEEPS: u32 = 512;

/// The result of a completed build: the labelled entry store and whatever
/// invariant violations were observed along the way.
pub struct BuildOutput {
    /// The fully labelled entry store.
    pub store: EntryStore,
    /// Invariant violations observed during the build; non-empty marks the
    /// output suspect.
    pub diagnostics: Diagnostics,
}

/// Runs the full build for `config`: move-ray construction, initial
/// labeling, futurebase import, intra-table propagation to a fixpoint, and
/// final draw resolution.
///
/// `verify_rays` controls whether the move-ray table's self-checks
/// ([`rays::verify`]) run before the build starts; skipping them only saves
/// a little time; it never changes the result.
///
/// # Errors
///
/// Returns [`BuildError`] on a configuration problem (bad shape, an
/// unresolved futuremove), an allocation failure, or an I/O failure reading
/// a futurebase.
pub fn build(
    config: &Configuration,
    futurebases: &HashMap<String, FutureBase>,
    verify_rays: bool,
) -> Result<BuildOutput, BuildError> {
    config.validate_shape()?;

    let ray_table = RayTable::build();
    if verify_rays {
        let violations = rays::verify(&ray_table);
        assert!(violations.is_empty(), "move-ray table failed verification: {violations:?}");
    }

    let mut store = EntryStore::allocate(config)?;
    let mut diagnostics = Diagnostics::new();

    println!("tablebase-gen: initializing {} ({} indices)", config.name, store.len());
    initializer::initialize(config, &ray_table, &mut store);

    println!("tablebase-gen: importing {} futurebase(s)", config.futurebases.len());
    let max_ply = futurebase::import(config, &ray_table, &mut store, futurebases, &mut diagnostics)?;
    println!("tablebase-gen: deepest futurebase seed at mate_ply={max_ply}");

    // A sweep can find nothing to propagate at a given `ply` yet still have
    // a futurebase-seeded entry waiting deeper than that `ply`, so an empty
    // sweep only ends the build once `ply` has reached `max_ply` too.
    let mut ply: u8 = 0;
    for sweeps in 0..MAX_SWEEPS {
        let progressed = propagate::sweep(config, &ray_table, &mut store, ply, &mut diagnostics);
        println!("tablebase-gen: sweep ply={ply} propagated={progressed}");

        if progressed == 0 && ply >= max_ply {
            break;
        }
        if sweeps + 1 >= MAX_SWEEPS {
            println!("tablebase-gen: stopping after {MAX_SWEEPS} sweeps without reaching quiescence");
        }
        ply = ply.saturating_add(1);
    }

    store.finalize_draws();

    if diagnostics.is_suspect() {
        diagnostics.report();
    }

    Ok(BuildOutput { store, diagnostics })
}

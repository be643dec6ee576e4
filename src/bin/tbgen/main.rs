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

//! `tbgen`: builds one endgame tablebase from a control file and whatever
//! futurebases it depends on.
//!
//! ```text
//! tbgen <control-file> [futurebase-dir]... [-o <output>] [--no-verify-rays]
//! ```
//!
//! Futurebases named in the control file are looked up as `<name>.tbfb` in
//! the control file's own directory and in every `futurebase-dir` given.

use std::{collections::HashMap, fs, path::PathBuf, process::ExitCode};

use clap::Parser;
use tablebase_core::{config::Configuration, driver, error::ConfigError, futurebase::FutureBase};

mod control;

/// Builds one endgame tablebase via retrograde analysis.
#[derive(Parser)]
#[command(name = "tbgen", version, about)]
struct Cli {
    /// Path to the XML control file describing the configuration to build.
    control_file: PathBuf,

    /// Extra directories to search for this configuration's futurebase
    /// dependencies, beyond the control file's own directory.
    futurebase_dirs: Vec<PathBuf>,

    /// Skips the move-ray table's self-verification pass.
    #[arg(long)]
    no_verify_rays: bool,

    /// Where to write the built tablebase. Defaults to `<name>.tbfb` next
    /// to the control file.
    #[arg(short, long)]
    output: Option<PathBuf>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("tbgen: {message}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<(), String> {
    let xml = fs::read_to_string(&cli.control_file).map_err(|e| format!("reading {}: {e}", cli.control_file.display()))?;
    let config = control::parse(&xml).map_err(|e| e.to_string())?;

    let mut search_dirs = cli.futurebase_dirs.clone();
    if let Some(parent) = cli.control_file.parent() {
        search_dirs.push(parent.to_path_buf());
    }

    let futurebases = load_futurebases(&config, &search_dirs)?;

    let output = driver::build(&config, &futurebases, !cli.no_verify_rays).map_err(|e| e.to_string())?;

    let output_path = cli.output.clone().unwrap_or_else(|| PathBuf::from(format!("{}.tbfb", config.name)));
    fs::write(&output_path, output.store.to_bytes()).map_err(|e| format!("writing {}: {e}", output_path.display()))?;

    println!("tbgen: wrote {} ({} indices)", output_path.display(), output.store.len());
    if output.diagnostics.is_suspect() {
        eprintln!("tbgen: output is suspect, see invariant violations reported above");
    }
    Ok(())
}

fn load_futurebases(config: &Configuration, search_dirs: &[PathBuf]) -> Result<HashMap<String, FutureBase>, String> {
    let mut loaded = HashMap::new();
    for future in &config.futurebases {
        let path = find_futurebase(&future.name, search_dirs).ok_or_else(|| {
            ConfigError::FutureBaseMismatch {
                name: future.name.clone(),
                reason: "no matching file in any search directory".to_string(),
            }
            .to_string()
        })?;
        let bytes = fs::read(&path).map_err(|e| format!("reading {}: {e}", path.display()))?;
        let future_base = FutureBase::from_bytes(&bytes).map_err(|e| e.to_string())?;
        loaded.insert(future.name.clone(), future_base);
    }
    Ok(loaded)
}

fn find_futurebase(name: &str, search_dirs: &[PathBuf]) -> Option<PathBuf> {
    search_dirs.iter().map(|dir| dir.join(format!("{name}.tbfb"))).find(|path| path.exists())
}

//! # emlite Module Runner (emld)
//!
//! Loads an emlite-built WebAssembly module, links it against the emlite
//! host import table and runs its entry point.
//!
//! ## Usage
//!
//! ```bash
//! emld <wasm-file> [--call <function>] [--fuel <amount>] [--base-dir <dir>]
//!      [--console stdio|tracing] [--stats] [--list-exports]
//! ```
//!
//! `<wasm-file>` is a path or a `file://` URL; relative paths resolve
//! against `--base-dir` when given. The entry point defaults to `main`.
//!
//! The `--fuel` option bounds every guest call; a module that runs out of
//! fuel fails with a runtime trap.
//!
//! Module `console` output goes to stdout/stderr like a JavaScript console,
//! or through `tracing` with `--console tracing`. Diagnostics are written
//! to stderr; set `RUST_LOG` to filter them and `RUST_LOG_FORMAT` to
//! `pretty`, `compact` or `json` to pick their format.
//!
//! The process exits with status 1 when any stage of the pipeline fails.

// Copyright (c) 2025 Ralf Anton Beier
// Licensed under the MIT license.
// SPDX-License-Identifier: MIT

#![warn(missing_docs)]

use std::env;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use eml_runtime::{Emlite, Error as EmlError, Loader, LoaderConfig, ModuleInstance};
use eml_logging::tracing_handler;
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

/// Where module console output goes
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
enum ConsoleMode {
    /// stdout, with warnings and errors on stderr
    #[default]
    Stdio,
    /// `tracing` events under the `eml::console` target
    Tracing,
}

/// emlite module runner CLI arguments
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Path or file:// URL of the WebAssembly module to run
    wasm_file: String,

    /// Entry point export to call
    #[arg(short, long, default_value = "main")]
    call: String,

    /// Optional fuel limit for bounded execution
    #[arg(short, long, help = "Limit every guest call to the specified amount of fuel")]
    fuel: Option<u64>,

    /// Directory relative module paths resolve against
    #[arg(long)]
    base_dir: Option<PathBuf>,

    /// Destination of module console output
    #[arg(long, value_enum, default_value_t = ConsoleMode::Stdio)]
    console: ConsoleMode,

    /// Show loader statistics after running
    #[arg(short, long, help = "Show loader statistics")]
    stats: bool,

    /// Print the instance's exports after running
    #[arg(long)]
    list_exports: bool,
}

fn main() -> ExitCode {
    initialize_tracing();
    let args = Args::parse();

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            let category = err.downcast_ref::<EmlError>().map_or("internal", |e| e.category.as_str());
            error!("Run failed: {:#}", err);
            eprintln!("emld: {category} error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

/// Initialize the tracing system for diagnostics
fn initialize_tracing() {
    let format = env::var("RUST_LOG_FORMAT").unwrap_or_else(|_| "pretty".to_string());
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true);

    match format.as_str() {
        "json" => subscriber.json().init(),
        "compact" => subscriber.compact().init(),
        _ => subscriber.pretty().init(),
    }
}

/// Build the loader configuration from the command line
fn loader_config(args: &Args) -> LoaderConfig {
    let mut config = LoaderConfig::default().with_entry_point(args.call.clone());
    if let Some(fuel) = args.fuel {
        info!("Setting fuel limit to {} units", fuel);
        config = config.with_fuel(fuel);
    }
    if let Some(dir) = &args.base_dir {
        config = config.with_base_dir(dir.clone());
    }
    config
}

/// Build the host import table
fn create_imports(console: ConsoleMode) -> Emlite {
    match console {
        ConsoleMode::Stdio => Emlite::new(),
        ConsoleMode::Tracing => Emlite::new().with_log_handler(tracing_handler()),
    }
}

fn run(args: &Args) -> Result<()> {
    let start = Instant::now();
    let mut loader = Loader::new(loader_config(args)).context("Failed to create the module loader")?;
    let imports = create_imports(args.console).imports();
    debug!("Host provides {} import modules", imports.get_registered_modules().len());

    let result = loader.run(&args.wasm_file, &imports);
    if args.stats {
        display_loader_stats(&loader);
    }
    let mut instance = result.with_context(|| format!("Failed to run {}", args.wasm_file))?;
    info!("Finished {} in {:?}", instance.name(), start.elapsed());

    if args.list_exports {
        list_exports(&mut instance);
    }
    Ok(())
}

/// Print the export names, one per line
fn list_exports(instance: &mut ModuleInstance) {
    println!("Exports of {}:", instance.name());
    for name in instance.exports() {
        println!("  - {name}");
    }
}

/// Print loader statistics
fn display_loader_stats(loader: &Loader) {
    println!("{}", loader.stats());
}

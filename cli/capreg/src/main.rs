//! capreg CLI — answers one registry query per invocation.
//!
//! Output is a single line on stdout; diagnostics go to stderr.

mod commands;
mod logging;

use std::path::PathBuf;
use std::process;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};

use commands::Format;

#[derive(Parser)]
#[command(name = "capreg", version, about = "Architecture and machine capability registry")]
struct Cli {
    /// Query to run
    #[arg(long, value_enum)]
    mode: Mode,
    /// Compiler identifier (e.g., gnu, clang, msvc); case-insensitive
    #[arg(long)]
    compiler: Option<String>,
    /// Available architectures, ';'-separated (for --mode machines)
    #[arg(long)]
    archs: Option<String>,
    /// Machine name (for --mode machine_flags)
    #[arg(long)]
    machine: Option<String>,
    /// Definitions file (default: capreg.toml searched upward, else built-in)
    #[arg(long, env = "CAPREG_DEFS")]
    defs: Option<PathBuf>,
    /// Output format
    #[arg(long, value_enum, default_value_t = Format::Text)]
    format: Format,
    /// Log registry construction to stderr
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Mode {
    /// List supported architectures with their flags
    #[value(name = "arch_flags", alias = "arch-flags")]
    ArchFlags,
    /// List machines buildable from the given architectures
    #[value(name = "machines")]
    Machines,
    /// Print the flags a machine needs
    #[value(name = "machine_flags", alias = "machine-flags")]
    MachineFlags,
}

fn main() {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    match run(cli) {
        Ok(output) => println!("{output}"),
        Err(e) => {
            eprintln!("error: {e:#}");
            process::exit(1);
        }
    }
}

fn run(cli: Cli) -> Result<String> {
    let cwd = std::env::current_dir()?;
    let registry = commands::load_registry(cli.defs.as_deref(), &cwd)?;

    match cli.mode {
        Mode::ArchFlags => {
            let compiler = cli
                .compiler
                .context("--compiler is required for mode arch_flags")?;
            commands::query::arch_flags(&registry, &compiler, cli.format)
        }
        Mode::Machines => {
            let archs = cli.archs.context("--archs is required for mode machines")?;
            commands::query::machines(&registry, &archs, cli.format)
        }
        Mode::MachineFlags => {
            let compiler = cli
                .compiler
                .context("--compiler is required for mode machine_flags")?;
            let machine = cli
                .machine
                .context("--machine is required for mode machine_flags")?;
            commands::query::machine_flags(&registry, &compiler, &machine, cli.format)
        }
    }
}

//! Renders the `fleetprov` man pages into `OUT_DIR`.
//!
//! Besides `fleetprov.1`, each subcommand gets its own page
//! (`fleetprov-check.1`, `fleetprov-run.1`, `fleetprov-provision.1`).

use std::env;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use clap::{Command, CommandFactory};
use clap_mangen::Man;

#[path = "src/cli/mod.rs"]
mod cli;

const BIN: &str = "fleetprov";

fn render(command: Command, out_dir: &Path, page: &str) -> io::Result<()> {
    let mut buffer = Vec::new();
    Man::new(command).title(page).render(&mut buffer)?;
    fs::write(out_dir.join(format!("{page}.1")), buffer)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut stdout = io::stdout();
    writeln!(stdout, "cargo:rerun-if-changed=build.rs")?;
    writeln!(stdout, "cargo:rerun-if-changed=src/cli/mod.rs")?;

    let out_dir = env::var_os("OUT_DIR")
        .map(PathBuf::from)
        .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "OUT_DIR was not set"))?;

    let command = cli::Cli::command().name(BIN);
    for sub in command.get_subcommands() {
        let page = format!("{BIN}-{}", sub.get_name());
        render(sub.clone(), &out_dir, &page)?;
    }
    render(command, &out_dir, BIN)?;

    Ok(())
}

//! Entry point: parses the CLI, initialises tracing, locates the scene
//! assets, and hands a fully resolved configuration to the renderer.

mod cli;
mod run;

use anyhow::Result;

fn main() -> Result<()> {
    let cli = cli::parse();
    run::initialise_tracing();
    run::run(cli)
}

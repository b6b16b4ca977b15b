use anyhow::Context;
use clap::Parser;
use kma_daycompare::cli::{run, Cli};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    run(cli).context("kma-daycompare failed")
}

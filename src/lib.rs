pub mod app;
pub mod artists;
pub mod catalog;
pub mod cli;
pub mod config;
pub mod engine;
pub mod errors;
pub mod genai;
pub mod library;
pub mod lyrics;
pub mod metadata;
pub mod models;
pub mod player;
pub mod playlist;
pub mod queue;
pub mod search;
pub mod storage;

use clap::Parser;

pub fn run() -> anyhow::Result<()> {
    let args = cli::Cli::parse();

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    runtime.block_on(cli::execute(args))
}

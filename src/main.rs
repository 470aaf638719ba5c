use clap::Parser;

use artdraw_lib::cli::Cli;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    artdraw_lib::init_logging();
    artdraw_lib::run(Cli::parse()).await
}

use anyhow::Result;
use chitbook::cli::Cli;
use clap::Parser;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    chitbook::logging::init_logging(chitbook::logging::default_level(cli.verbose));
    cli.run().await
}

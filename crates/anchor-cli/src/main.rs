use clap::Parser;

mod cli;
mod runner;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();
    let args = cli::Args::parse();
    runner::run(args).await
}

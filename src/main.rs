use clap::Parser;
use fiber_assign::cli::Cli;

fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file if it exists
    dotenvy::dotenv().ok();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    print!("{}", cli.run()?);

    Ok(())
}

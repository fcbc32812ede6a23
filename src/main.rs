use clap::Parser;
use tracing_subscriber::EnvFilter;

use modelc::cli::Args;
use modelc::config::ConfigFile;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("modelc=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let config = ConfigFile::load(args.config.as_deref())?;
    let output = args.command.run(&config, args.format)?;
    println!("{}", output);
    Ok(())
}

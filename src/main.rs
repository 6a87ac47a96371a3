use clap::Parser;
use colored::Colorize;

use shortmint::cli::{Cli, Commands};
use shortmint::config::{get_config, init_config};
use shortmint::errors::ShortmintError;
use shortmint::runtime::modes;
use shortmint::system::init_logging;

#[actix_web::main]
async fn main() {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let result = match cli.command {
        Some(Commands::Config { action }) => modes::run_config_command(action),
        Some(Commands::Serve) | None => serve(&cli.config).await,
    };

    if let Err(e) = result {
        match e.downcast_ref::<ShortmintError>() {
            Some(err) => eprintln!("{}", err.format_colored()),
            None => eprintln!("{} {:#}", "Error:".red().bold(), e),
        }
        std::process::exit(1);
    }
}

async fn serve(config_path: &str) -> anyhow::Result<()> {
    init_config(config_path);
    let _guard = init_logging(&get_config().logging)?;
    modes::run_server().await
}

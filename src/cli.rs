//! Command-line interface definitions using clap

use clap::{Parser, Subcommand};

/// shortmint - a URL shortener service
#[derive(Parser, Debug)]
#[command(name = "shortmint")]
#[command(version)]
#[command(about = "A URL shortener service", long_about = None)]
pub struct Cli {
    /// Path to the TOML configuration file
    #[arg(long, short = 'c', global = true, default_value = crate::config::DEFAULT_CONFIG_PATH)]
    pub config: String,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the HTTP server (default)
    Serve,

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigCommands,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Generate example configuration file
    Generate {
        /// Output path (default: config.example.toml)
        output_path: Option<String>,

        /// Force overwrite without confirmation
        #[arg(long)]
        force: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_subcommand_means_serve() {
        let cli = Cli::try_parse_from(["shortmint"]).unwrap();
        assert!(cli.command.is_none());
        assert_eq!(cli.config, crate::config::DEFAULT_CONFIG_PATH);
    }

    #[test]
    fn test_config_generate_with_path() {
        let cli =
            Cli::try_parse_from(["shortmint", "-c", "alt.toml", "config", "generate", "out.toml"])
                .unwrap();
        assert_eq!(cli.config, "alt.toml");
        match cli.command {
            Some(Commands::Config {
                action: ConfigCommands::Generate { output_path, force },
            }) => {
                assert_eq!(output_path.as_deref(), Some("out.toml"));
                assert!(!force);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_verify_cli() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}

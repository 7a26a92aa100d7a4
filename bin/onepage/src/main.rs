//! onepage CLI
//!
//! Renders a single page from YAML content and an HTML template, and serves
//! it with automatic rebuilds during development.
//!
//! This is the binary entry point. The library functionality is in `lib.rs`.

use clap::Parser;
use color_eyre::eyre::Result;

/// Command-line interface for onepage.
#[derive(Parser)]
#[command(
    name = "onepage",
    version,
    about = "Render a one-page site from YAML content and a template"
)]
struct Cli {
    /// Project root containing the content and template
    #[arg(short, long, default_value = ".")]
    root: std::path::PathBuf,

    /// Path to configuration file, relative to the project root
    #[arg(short, long, default_value = "onepage.toml")]
    config: std::path::PathBuf,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

/// Available CLI commands.
#[derive(clap::Subcommand)]
enum Commands {
    /// Build the site once
    Build {
        /// Output directory
        #[arg(short, long)]
        output: Option<std::path::PathBuf>,
    },
    /// Serve the site and rebuild when sources change
    #[command(alias = "serve")]
    Dev {
        /// Interface to listen on
        #[arg(long)]
        host: Option<String>,
        /// Port to listen on
        #[arg(short, long)]
        port: Option<u16>,
        /// Open browser automatically
        #[arg(long)]
        open: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();
    onepage::init_tracing(cli.verbose);

    let config_path = cli.root.join(&cli.config);

    match cli.command {
        Commands::Build { output } => {
            onepage::cmd::build::run(&cli.root, &config_path, output.as_deref())?;
        }
        Commands::Dev { host, port, open } => {
            onepage::cmd::dev::run(&cli.root, &config_path, host.as_deref(), port, open).await?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::*;

    #[test]
    fn test_cli_build_command_parsing() {
        let args = ["onepage", "build", "--output", "public"];
        let cli = Cli::parse_from(args);

        assert_eq!(cli.root, std::path::PathBuf::from("."));
        assert_eq!(cli.config, std::path::PathBuf::from("onepage.toml"));
        assert_eq!(cli.verbose, 0);

        match cli.command {
            Commands::Build { output } => {
                assert_eq!(output, Some(std::path::PathBuf::from("public")));
            }
            _ => panic!("Expected Build command"),
        }
    }

    #[test]
    fn test_cli_build_default_output() {
        let cli = Cli::parse_from(["onepage", "build"]);

        match cli.command {
            Commands::Build { output } => assert!(output.is_none()),
            _ => panic!("Expected Build command"),
        }
    }

    #[test]
    fn test_cli_dev_command_parsing() {
        let args = ["onepage", "dev", "--port", "8080", "--host", "0.0.0.0", "--open"];
        let cli = Cli::parse_from(args);

        match cli.command {
            Commands::Dev { host, port, open } => {
                assert_eq!(host.as_deref(), Some("0.0.0.0"));
                assert_eq!(port, Some(8080));
                assert!(open);
            }
            _ => panic!("Expected Dev command"),
        }
    }

    #[test]
    fn test_cli_serve_alias() {
        let cli = Cli::parse_from(["onepage", "serve"]);

        match cli.command {
            Commands::Dev { host, port, open } => {
                assert!(host.is_none());
                assert!(port.is_none());
                assert!(!open);
            }
            _ => panic!("Expected Dev command"),
        }
    }

    #[test]
    fn test_cli_verbosity_flags() {
        let cli = Cli::parse_from(["onepage", "-vvv", "build"]);
        assert_eq!(cli.verbose, 3);
    }

    #[test]
    fn test_cli_custom_root_and_config() {
        let cli = Cli::parse_from(["onepage", "--root", "site", "--config", "dev.toml", "dev"]);
        assert_eq!(cli.root, std::path::PathBuf::from("site"));
        assert_eq!(cli.root.join(&cli.config), std::path::PathBuf::from("site/dev.toml"));
    }
}

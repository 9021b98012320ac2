// Entrypoint for the CLI application.
// - Keeps `main` small: parse arguments, load configuration, hand off to `ui`.
// - Configuration errors abort before any subcommand runs, `health` included.

use anyhow::Context;
use clap::{Parser, Subcommand};
use wp_media_upload::{logging, ui, MediaClient, ServerConfig, UploadMode};

/// Upload an image to a WordPress media library.
#[derive(Debug, Parser)]
#[command(name = "wp-media-upload", version)]
#[command(about = "Upload a local or remote image to a WordPress media library", long_about = None)]
struct Cli {
    /// Log request details.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Upload a local file or an http(s) URL.
    Upload {
        /// Local path or remote URL of the image.
        source: String,

        /// Override WP_UPLOAD_MODE for this upload.
        #[arg(long, value_enum)]
        mode: Option<UploadMode>,

        /// Print the result as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Check that the configured credentials authenticate.
    Whoami {
        /// Print the full profile as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Print a fixed liveness payload once configuration has loaded.
    Health,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::init_logging(cli.verbose);

    let config = ServerConfig::from_env().context("Invalid configuration")?;
    let client = MediaClient::new(config).context("Failed to build HTTP client")?;

    match cli.command {
        Command::Upload { source, mode, json } => ui::run_upload(&client, &source, mode, json),
        Command::Whoami { json } => ui::run_whoami(&client, json),
        Command::Health => ui::print_health(),
    }
}

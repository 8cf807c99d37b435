//! CLI entry point for articulate

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "articulate")]
#[command(version)]
#[command(about = "The ArticulatePost magazine: live server, static export and queries", long_about = None)]
struct Cli {
    /// Site directory holding _config.yml (defaults to current directory)
    #[arg(short, long, global = true)]
    cwd: Option<PathBuf>,

    /// Enable debug output
    #[arg(short, long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the site with live forms and theme switching
    #[command(alias = "s")]
    Server {
        /// Port to listen on
        #[arg(short, long, default_value = "4000")]
        port: u16,

        /// IP address to bind to
        #[arg(short, long, default_value = "localhost")]
        ip: String,

        /// Open browser automatically
        #[arg(short, long)]
        open: bool,
    },

    /// Generate static files
    #[command(alias = "g")]
    Generate,

    /// Clean the public folder
    Clean,

    /// List site content
    List {
        /// Type of content to list (post, category, tag, popular, recent)
        #[arg(default_value = "post")]
        r#type: String,

        /// How many entries to show; negative values show none
        #[arg(short, long, allow_negative_numbers = true)]
        limit: Option<i64>,
    },

    /// Search posts by keyword
    Search {
        /// Matched case-insensitively against title, excerpt, body and tags
        keyword: String,
    },

    /// Show or toggle the light/dark preference
    Theme {
        /// show or toggle
        #[arg(default_value = "show")]
        action: String,
    },

    /// Display version information
    Version,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.debug {
        "articulate=debug,info"
    } else {
        "articulate=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Determine base directory
    let base_dir = match cli.cwd {
        Some(dir) => dir,
        None => std::env::current_dir()?,
    };

    match cli.command {
        Commands::Server { port, ip, open } => {
            let site = articulate::Articulate::new(&base_dir)?;
            tracing::info!("Starting server at http://{}:{}", ip, port);
            articulate::server::start(&site, &ip, port, open).await?;
        }

        Commands::Generate => {
            let site = articulate::Articulate::new(&base_dir)?;
            tracing::info!("Generating static files...");
            site.generate()?;
            println!("Generated successfully!");
        }

        Commands::Clean => {
            let site = articulate::Articulate::new(&base_dir)?;
            tracing::info!("Cleaning public folder...");
            site.clean()?;
            println!("Cleaned successfully!");
        }

        Commands::List { r#type, limit } => {
            let site = articulate::Articulate::new(&base_dir)?;
            articulate::commands::list::run(&site, &r#type, limit)?;
        }

        Commands::Search { keyword } => {
            let site = articulate::Articulate::new(&base_dir)?;
            articulate::commands::search::run(&site, &keyword)?;
        }

        Commands::Theme { action } => {
            let site = articulate::Articulate::new(&base_dir)?;
            articulate::commands::theme::run(&site, &action)?;
        }

        Commands::Version => {
            println!("articulate version {}", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}

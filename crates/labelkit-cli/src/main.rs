mod page;
mod run;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "labelkit")]
#[command(about = "Apply storefront product labels to a page from the command line")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Where the page and its labels come from.
#[derive(Debug, Args)]
struct PageArgs {
    /// Storefront page URL (also the base for relative label endpoints)
    url: String,
    /// Read the page markup from a file instead of fetching the URL
    #[arg(long)]
    html: Option<PathBuf>,
    /// Label endpoint to try, in order (defaults to `LABELKIT_LABEL_ENDPOINTS`)
    #[arg(long = "endpoint")]
    endpoints: Vec<String>,
    /// Read labels from a JSON file instead of the endpoints
    #[arg(long, conflicts_with = "endpoints")]
    labels: Option<PathBuf>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Run one labeling pass and write the decorated HTML
    Render {
        #[command(flatten)]
        page: PageArgs,
        /// Write to this file instead of stdout
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Print one line per (product, label) decision
    Evaluate {
        #[command(flatten)]
        page: PageArgs,
    },
    /// Fetch the label set and print it as JSON
    Labels {
        /// Page whose origin relative endpoints resolve against
        #[arg(long)]
        page: Option<String>,
        /// Label endpoint to try, in order (defaults to `LABELKIT_LABEL_ENDPOINTS`)
        #[arg(long = "endpoint")]
        endpoints: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = labelkit_core::load_app_config_from_env()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Render { page, out } => run::run_render(&config, &page, out.as_deref()).await,
        Commands::Evaluate { page } => run::run_evaluate(&config, &page).await,
        Commands::Labels { page, endpoints } => {
            run::run_labels(&config, page.as_deref(), endpoints).await
        }
    }
}

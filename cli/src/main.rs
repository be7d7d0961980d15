use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use manticore_client::{prepare_search_body, ApiClient, ClientConfig, SearchApi};
use serde::Serialize;
use std::path::PathBuf;
use tracing::{debug, info};

mod input;

#[derive(Parser)]
#[command(name = "msearch", version)]
#[command(about = "Query a Manticore Search server over its JSON API", long_about = None)]
struct Cli {
    /// Path to configuration file (MANTICORE_URL / MANTICORE_TIMEOUT_SECONDS when omitted)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Server URL, overrides the configuration
    #[arg(long, global = true)]
    url: Option<String>,

    /// Enable debug logging
    #[arg(short, long, global = true, default_value = "false")]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a search. The body may use fulltext_filter, attr_filter and labeled sort/aggs entries
    Search {
        /// JSON request body file, `-` for stdin
        #[arg(long, default_value = "-")]
        body: String,

        /// Print the normalized body instead of sending it
        #[arg(long, default_value = "false")]
        dry_run: bool,
    },
    /// Match documents against the stored queries of a percolate index
    Percolate {
        /// Name of the percolate index
        #[arg(long)]
        index: String,

        /// JSON request body file, `-` for stdin
        #[arg(long, default_value = "-")]
        body: String,
    },
    /// Print the normalized form of a search body without contacting the server
    Normalize {
        /// JSON request body file, `-` for stdin
        #[arg(long, default_value = "-")]
        body: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match &cli.command {
        Commands::Normalize { body } => {
            let request = input::read_json(body)?;
            print_json(&prepare_search_body(&request)?)
        }
        Commands::Search { body, dry_run } => {
            let request = input::read_json(body)?;
            if *dry_run {
                return print_json(&prepare_search_body(&request)?);
            }
            let api = build_api(&cli)?;
            let response = api.search(&request).await.context("Search failed")?;
            info!(
                took = ?response.took,
                total = ?response.hits.total,
                "Search completed"
            );
            print_json(&response)
        }
        Commands::Percolate { index, body } => {
            let request = input::read_json(body)?;
            let api = build_api(&cli)?;
            let response = api
                .percolate(index, &request)
                .await
                .with_context(|| format!("Percolate on index '{}' failed", index))?;
            info!(total = ?response.hits.total, "Percolate completed");
            print_json(&response)
        }
    }
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .init();
}

fn load_config(cli: &Cli) -> Result<ClientConfig> {
    let config = match &cli.config {
        Some(path) => ClientConfig::load(path)?,
        None => ClientConfig::from_env()?,
    };
    Ok(match &cli.url {
        Some(url) => config.with_base_url(url.clone()),
        None => config,
    })
}

fn build_api(cli: &Cli) -> Result<SearchApi> {
    let config = load_config(cli)?;
    debug!(base_url = %config.base_url, timeout = config.timeout_seconds, "Using server");
    let client = ApiClient::new(&config).context("Failed to create API client")?;
    Ok(SearchApi::new(client))
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let out = serde_json::to_string_pretty(value).context("Failed to format output")?;
    println!("{}", out);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_search_dry_run() {
        let cli = Cli::parse_from(["msearch", "search", "--body", "req.json", "--dry-run"]);
        match cli.command {
            Commands::Search { body, dry_run } => {
                assert_eq!(body, "req.json");
                assert!(dry_run);
            }
            _ => panic!("Expected search command"),
        }
    }

    #[test]
    fn test_parse_percolate_requires_index() {
        assert!(Cli::try_parse_from(["msearch", "percolate"]).is_err());
        let cli = Cli::try_parse_from(["msearch", "percolate", "--index", "pq"]).unwrap();
        match cli.command {
            Commands::Percolate { index, body } => {
                assert_eq!(index, "pq");
                assert_eq!(body, "-");
            }
            _ => panic!("Expected percolate command"),
        }
    }

    #[test]
    fn test_url_overrides_config() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let config_path = temp_dir.path().join("manticore.toml");
        std::fs::write(
            &config_path,
            "base_url = \"http://127.0.0.1:9308\"\ntimeout_seconds = 7\n",
        )
        .unwrap();

        let cli = Cli::parse_from([
            "msearch",
            "normalize",
            "--config",
            config_path.to_str().unwrap(),
            "--url",
            "http://search.internal:9308",
        ]);
        let config = load_config(&cli).unwrap();
        assert_eq!(config.base_url, "http://search.internal:9308");
        assert_eq!(config.timeout_seconds, 7);
    }
}

use anyhow::{anyhow, bail, Context};
use clap::{Parser, Subcommand};
use serde_json::Value;
use std::env;
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use tracing::info;

use crate::completion::{build_provider, CompletionProvider};
use crate::config::Settings;
use crate::graph::{normalize_with, HandlerScope};
use crate::pipeline::{generate_backend, graph_payload, parse_graph_input};
use crate::publish::{git_available, PublishConfig, Publisher};
use crate::scaffold::validate_project_name;
use crate::server::{AppService, HttpServer, DEFAULT_DEPLOY_PROJECT};

/// Command-line interface for skelgen
#[derive(Debug, Parser)]
#[command(name = "skelgen")]
#[command(about = "Generate, document and deploy Express backends from a graph description", long_about = None)]
pub struct Cli {
    /// YAML settings file
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Run the whole pipeline and print the generation summary
    Generate {
        /// Graph JSON file, or `-` for stdin
        #[arg(short, long)]
        graph: PathBuf,

        /// Directory generated projects are created under
        #[arg(long)]
        projects_dir: Option<PathBuf>,

        /// Controller and route handling: user-slice or extended
        #[arg(long)]
        scope: Option<HandlerScope>,

        /// Completion provider: fixture or http
        #[arg(long)]
        completion: Option<CompletionProvider>,
    },
    /// Print the normalized graph
    Normalize {
        /// Graph JSON file, or `-` for stdin
        #[arg(short, long)]
        graph: PathBuf,

        /// Controller and route handling: user-slice or extended
        #[arg(long)]
        scope: Option<HandlerScope>,
    },
    /// Push a generated project and request a Render deployment
    Deploy {
        /// Project directory name under the projects dir (default: $PROJECT_NAME or generated-api)
        #[arg(short = 'n', long)]
        project_name: Option<String>,

        /// Directory generated projects are created under
        #[arg(long)]
        projects_dir: Option<PathBuf>,
    },
    /// Run the HTTP front door
    Serve {
        /// Listen address, e.g. 127.0.0.1:5000
        #[arg(long)]
        addr: Option<String>,
    },
}

/// Read a graph document from a file or stdin (`-`).
///
/// The document may wrap the graph in `graphState` and may be a JSON string.
///
/// # Errors
///
/// Returns an error if the input cannot be read or is not JSON.
pub fn read_graph(path: &Path) -> anyhow::Result<Value> {
    let text = if path.as_os_str() == "-" {
        let mut buf = String::new();
        io::stdin()
            .read_to_string(&mut buf)
            .context("Failed to read graph from stdin")?;
        buf
    } else {
        fs::read_to_string(path)
            .with_context(|| format!("Failed to read graph file {}", path.display()))?
    };
    let doc: Value = serde_json::from_str(&text).context("Graph input is not valid JSON")?;
    Ok(graph_payload(&doc).clone())
}

fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Execute a parsed command line.
///
/// # Errors
///
/// Returns the first failure of the selected command.
pub fn run_cli(cli: Cli) -> anyhow::Result<()> {
    let mut settings = Settings::load(cli.config.as_deref())?;
    match cli.command {
        Commands::Generate {
            graph,
            projects_dir,
            scope,
            completion,
        } => {
            if let Some(dir) = projects_dir {
                settings.projects_dir = dir;
            }
            if let Some(scope) = scope {
                settings.handler_scope = scope;
            }
            if let Some(provider) = completion {
                settings.completion = provider;
            }
            let raw = read_graph(&graph)?;
            let provider = build_provider(settings.completion, &settings.llm)?;
            let generation = generate_backend(&raw, &settings, provider.as_ref())?;
            print_json(&generation.summary)
        }
        Commands::Normalize { graph, scope } => {
            let raw = read_graph(&graph)?;
            let input = parse_graph_input(&raw)?;
            let normalized = normalize_with(&input, scope.unwrap_or(settings.handler_scope));
            print_json(&normalized)
        }
        Commands::Deploy {
            project_name,
            projects_dir,
        } => {
            if let Some(dir) = projects_dir {
                settings.projects_dir = dir;
            }
            let name = project_name
                .or_else(|| env::var("PROJECT_NAME").ok())
                .filter(|s| !s.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_DEPLOY_PROJECT.to_string());
            validate_project_name(&name)?;
            let config = PublishConfig::from_env(&name)?;
            if !git_available(&config.git_bin) {
                bail!("git executable '{}' is not available", config.git_bin);
            }
            let outcome =
                Publisher::new(config).publish(&settings.projects_dir.join(&name), &name)?;
            print_json(&outcome)
        }
        Commands::Serve { addr } => {
            if let Some(addr) = addr {
                settings.addr = addr;
            }
            let provider = build_provider(settings.completion, &settings.llm)?;
            let addr = settings.addr.clone();
            info!(
                %addr,
                projects_dir = %settings.projects_dir.display(),
                completion = %settings.completion,
                "starting server"
            );
            let handle = HttpServer(AppService::new(settings, provider))
                .start(addr.as_str())
                .with_context(|| format!("Failed to bind {addr}"))?;
            handle.join().map_err(|_| anyhow!("server thread panicked"))
        }
    }
}

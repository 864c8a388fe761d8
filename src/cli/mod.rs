//! # CLI Module
//!
//! Command-line entry points for the generator, the publisher and the HTTP
//! front door.
//!
//! ## Commands
//!
//! ```bash
//! # Generate a project and print { message, projectPath, projectName }
//! skelgen generate --graph graph.json --projects-dir projects --scope extended
//!
//! # Show what the normalizer makes of a graph
//! cat graph.json | skelgen normalize --graph -
//!
//! # Push projects/shop and ask Render to deploy it
//! GITHUB_OWNER=acme GITHUB_TOKEN=... RENDER_API_KEY=... skelgen deploy --project-name shop
//!
//! # Serve POST /api/generate and POST /api/deploy/render
//! skelgen serve --addr 127.0.0.1:5000
//! ```
//!
//! Every command accepts `--config <file>`; flags override settings from the
//! file and the environment.

mod commands;

#[cfg(test)]
mod tests;

pub use commands::{read_graph, run_cli, Cli, Commands};

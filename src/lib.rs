//! # skelgen
//!
//! **skelgen** turns a declarative API graph (schemas, controllers, routes) into a
//! runnable Express + Mongoose backend, documents it, and can publish it to a git
//! repository and Render.
//!
//! ## Architecture
//!
//! - **[`graph`]** - Graph types and the normalizer that repairs arbitrary input
//! - **[`scaffold`]** - Project layout and static boilerplate, replaced atomically
//! - **[`completion`]** - Text-completion seam with fixture and HTTP providers
//! - **[`extract`]** - Pulls code out of fenced completion output
//! - **[`generator`]** - Models, controllers and routers from prompts; route wiring
//! - **[`docs`]** - Project `README.md`
//! - **[`pipeline`]** - The end-to-end generation run
//! - **[`publish`]** - git push and Render deployment as a resumable stage sequence
//! - **[`server`]** - HTTP front door on `tiny_http`
//! - **[`config`]**, **[`logging`]**, **[`cli`]** - Settings, tracing setup, command line
//!
//! ### Generation Flow
//!
//! ```mermaid
//! sequenceDiagram
//!     participant Client
//!     participant Server as server::AppService
//!     participant Pipeline as pipeline::generate_backend
//!     participant Graph as graph::normalize_with
//!     participant Scaffold as scaffold::Scaffolder
//!     participant Gen as generator::LogicGenerator
//!     participant LLM as TextCompletion
//!     participant Docs as docs::document
//!
//!     Client->>Server: POST /api/generate { graphState }
//!     Server->>Pipeline: graph payload
//!     Pipeline->>Graph: raw JSON
//!     Graph-->>Pipeline: Graph (canonical user slice, hooks, types)
//!     Pipeline->>Scaffold: scaffold(&graph)
//!     Scaffold-->>Pipeline: project path
//!     loop schemas, controllers, route groups
//!         Gen->>LLM: rendered prompt
//!         LLM-->>Gen: fenced code
//!     end
//!     Gen->>Gen: splice routers into src/app.js
//!     Pipeline->>Docs: README.md
//!     Pipeline-->>Server: { message, projectPath, projectName }
//!     Server-->>Client: 200 JSON
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use serde_json::json;
//! use skelgen::completion::FixtureCompletion;
//! use skelgen::config::Settings;
//! use skelgen::pipeline::generate_backend;
//!
//! let graph = json!({
//!     "projectName": "shop",
//!     "schemas": [{ "name": "Product", "fields": { "price": { "type": "Number" } } }]
//! });
//! let generation = generate_backend(&graph, &Settings::default(), &FixtureCompletion::default())?;
//! println!("{}", generation.summary.project_path.display());
//! # Ok::<(), anyhow::Error>(())
//! ```

pub mod cli;
pub mod completion;
pub mod config;
pub mod docs;
pub mod extract;
pub mod generator;
pub mod graph;
pub mod logging;
pub mod pipeline;
pub mod publish;
pub mod scaffold;
pub mod server;

pub use completion::TextCompletion;
pub use graph::{normalize, normalize_with, Graph, HandlerScope};
pub use pipeline::{generate_backend, GenerateSummary};

//! Unit tests for CLI commands
#![allow(clippy::unwrap_used, clippy::panic)]

use crate::cli::{read_graph, Cli, Commands};
use crate::completion::CompletionProvider;
use crate::graph::HandlerScope;
use clap::Parser;
use serde_json::json;
use std::fs;
use std::path::PathBuf;

#[test]
fn test_generate_command_with_flags() {
    let cli = Cli::try_parse_from([
        "skelgen",
        "generate",
        "--graph",
        "graph.json",
        "--projects-dir",
        "out",
        "--scope",
        "extended",
        "--completion",
        "http",
    ])
    .unwrap();

    match cli.command {
        Commands::Generate {
            graph,
            projects_dir,
            scope,
            completion,
        } => {
            assert_eq!(graph, PathBuf::from("graph.json"));
            assert_eq!(projects_dir, Some(PathBuf::from("out")));
            assert_eq!(scope, Some(HandlerScope::Extended));
            assert_eq!(completion, Some(CompletionProvider::Http));
        }
        _ => panic!("Expected Generate command"),
    }
}

#[test]
fn test_global_config_after_subcommand() {
    let cli = Cli::try_parse_from(["skelgen", "serve", "--config", "skelgen.yaml"]).unwrap();
    assert_eq!(cli.config, Some(PathBuf::from("skelgen.yaml")));
    match cli.command {
        Commands::Serve { addr } => assert!(addr.is_none()),
        _ => panic!("Expected Serve command"),
    }
}

#[test]
fn test_deploy_short_name_flag() {
    let cli = Cli::try_parse_from(["skelgen", "deploy", "-n", "shop"]).unwrap();
    match cli.command {
        Commands::Deploy { project_name, .. } => assert_eq!(project_name.as_deref(), Some("shop")),
        _ => panic!("Expected Deploy command"),
    }
}

#[test]
fn test_unknown_scope_is_rejected() {
    let result = Cli::try_parse_from(["skelgen", "normalize", "--graph", "g.json", "--scope", "all"]);
    assert!(result.is_err());
}

#[test]
fn test_read_graph_unwraps_envelope() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("graph.json");
    fs::write(&path, r#"{"graphState": {"projectName": "shop"}}"#).unwrap();
    assert_eq!(read_graph(&path).unwrap(), json!({"projectName": "shop"}));

    fs::write(&path, "not json").unwrap();
    assert!(read_graph(&path).is_err());
}

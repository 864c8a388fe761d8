#![allow(clippy::unwrap_used, clippy::expect_used)]

use super::*;
use crate::completion::FixtureCompletion;
use crate::graph::{normalize, normalize_with, HandlerScope};
use crate::scaffold::{Scaffolder, ROUTES_MARKER};
use serde_json::json;
use std::cell::RefCell;

/// Records every prompt and answers with a numbered block.
struct Recorder {
    prompts: RefCell<Vec<String>>,
}

impl Recorder {
    fn new() -> Self {
        Self {
            prompts: RefCell::new(Vec::new()),
        }
    }
}

impl TextCompletion for Recorder {
    fn complete(&self, prompt: &str) -> anyhow::Result<String> {
        let mut prompts = self.prompts.borrow_mut();
        prompts.push(prompt.to_string());
        Ok(format!("```javascript\n// answer {}\n```", prompts.len()))
    }
}

struct Failing;

impl TextCompletion for Failing {
    fn complete(&self, _prompt: &str) -> anyhow::Result<String> {
        anyhow::bail!("provider unavailable")
    }
}

fn scaffolded(graph: &Graph) -> (tempfile::TempDir, PathBuf) {
    let root = tempfile::tempdir().unwrap();
    let path = Scaffolder::new(root.path()).scaffold(graph).unwrap();
    (root, path)
}

#[test]
fn test_generate_user_slice_with_fixture() {
    let graph = normalize(&json!({
        "schemas": [{"name": "User", "fields": {
            "username": {"type": "String", "unique": true},
            "email": {"type": "String", "unique": true},
            "password": {"type": "String"}
        }}]
    }));
    let (_root, path) = scaffolded(&graph);

    let report = LogicGenerator::new(FixtureCompletion::default())
        .generate(&graph, &path)
        .unwrap();

    assert_eq!(report.models, vec![path.join("src/models/user.model.js")]);
    assert_eq!(
        report.controllers,
        vec![path.join("src/controllers/user.controller.js")]
    );
    assert_eq!(report.routes, vec![path.join("src/routes/users.routes.js")]);
    assert_eq!(report.mounted, vec!["users"]);

    let model = fs::read_to_string(path.join("src/models/user.model.js")).unwrap();
    assert!(model.starts_with("const mongoose = require('mongoose');"));
    assert!(!model.contains("```"));

    let controller = fs::read_to_string(path.join("src/controllers/user.controller.js")).unwrap();
    assert!(controller.starts_with("const User = require('../models/user.model');\n\n"));
    let create = controller.find("exports.createUserController").unwrap();
    let all = controller.find("exports.getAllUsersController").unwrap();
    let by_id = controller.find("exports.getUserByIdController").unwrap();
    assert!(create < all && all < by_id);

    let app = fs::read_to_string(path.join("src/app.js")).unwrap();
    assert!(!app.contains(ROUTES_MARKER));
    assert!(app.contains("const usersRoutes = require('./routes/users.routes');"));
    assert!(app.contains("app.use('/api/users', usersRoutes);"));
}

#[test]
fn test_controller_file_joins_functions_with_newline() {
    let graph = normalize(&json!({}));
    let (_root, path) = scaffolded(&graph);
    let recorder = Recorder::new();

    LogicGenerator::new(&recorder).generate(&graph, &path).unwrap();

    // no schemas: 3 controllers + 1 router
    let prompts = recorder.prompts.borrow();
    assert_eq!(prompts.len(), 4);
    assert!(prompts[0].contains("`createUserController`"));
    assert!(prompts[3].contains("Express router file for the 'users' routes"));

    let controller = fs::read_to_string(path.join("src/controllers/user.controller.js")).unwrap();
    assert_eq!(
        controller,
        "const User = require('../models/user.model');\n\n// answer 1\n// answer 2\n// answer 3"
    );
    assert!(fs::read_dir(path.join("src/models")).unwrap().next().is_none());
}

#[test]
fn test_extended_scope_writes_one_router_per_group() {
    let graph = normalize_with(
        &json!({
            "schemas": [{"name": "Product", "fields": {"name": {}}}],
            "controllers": [{"name": "listProducts", "schema": "Product", "logic": "List."}],
            "routes": [{"path": "/api/products", "method": "get", "controller": "listProducts"}]
        }),
        HandlerScope::Extended,
    );
    let (_root, path) = scaffolded(&graph);

    let report = LogicGenerator::new(FixtureCompletion::default())
        .generate(&graph, &path)
        .unwrap();

    assert_eq!(report.mounted, vec!["products", "users"]);
    assert!(path.join("src/controllers/product.controller.js").is_file());
    let routes = fs::read_to_string(path.join("src/routes/products.routes.js")).unwrap();
    assert_eq!(routes, "// Placeholder for product routes");

    let app = fs::read_to_string(path.join("src/app.js")).unwrap();
    let products = app.find("app.use('/api/products'").unwrap();
    let users = app.find("app.use('/api/users'").unwrap();
    assert!(products < users);
}

#[test]
fn test_not_scaffolded_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let err = LogicGenerator::new(FixtureCompletion::default())
        .generate(&normalize(&json!({})), dir.path())
        .unwrap_err();
    assert!(matches!(
        err.downcast_ref::<GenerateError>(),
        Some(GenerateError::NotScaffolded(_))
    ));
}

#[test]
fn test_completion_failure_aborts() {
    let graph = normalize(&json!({"schemas": [{"name": "User", "fields": {}}]}));
    let (_root, path) = scaffolded(&graph);

    let err = LogicGenerator::new(Failing)
        .generate(&graph, &path)
        .unwrap_err();
    assert!(format!("{err:#}").contains("provider unavailable"));
    assert!(!path.join("src/models/user.model.js").exists());

    // marker untouched when generation stops early
    let app = fs::read_to_string(path.join("src/app.js")).unwrap();
    assert!(app.contains(ROUTES_MARKER));
}

#[test]
fn test_unsafe_schema_name_never_leaves_the_project() {
    let graph = normalize(&json!({"projectName": "shop", "schemas": []}));
    let (root, path) = scaffolded(&graph);

    for name in ["../../../escaped", "a/b", ".."] {
        let mut hostile = graph.clone();
        hostile.schemas.push(crate::graph::Schema {
            name: name.to_string(),
            fields: Default::default(),
            hooks: Default::default(),
        });
        let err = LogicGenerator::new(FixtureCompletion::default())
            .generate(&hostile, &path)
            .unwrap_err();
        assert!(
            matches!(
                err.downcast_ref::<GenerateError>(),
                Some(GenerateError::UnsafeFileName(stem)) if stem == name
            ),
            "{name}: {err:#}"
        );
    }
    assert!(!root.path().join("escaped.model.js").exists());
    assert!(!path.join("src/escaped.model.js").exists());
}

#[test]
fn test_repaired_schema_name_is_written_inside_models() {
    let graph = normalize(&json!({
        "projectName": "shop",
        "schemas": [{"name": "../../../escaped", "fields": {}}]
    }));
    let (root, path) = scaffolded(&graph);

    let report = LogicGenerator::new(FixtureCompletion::default())
        .generate(&graph, &path)
        .unwrap();
    assert_eq!(report.models, vec![path.join("src/models/escaped.model.js")]);
    assert!(report.models[0].is_file());
    assert!(!root.path().join("escaped.model.js").exists());
}

/// Counts calls and always fails.
struct CountingFailure {
    calls: RefCell<usize>,
}

impl TextCompletion for CountingFailure {
    fn complete(&self, _prompt: &str) -> anyhow::Result<String> {
        *self.calls.borrow_mut() += 1;
        anyhow::bail!("provider unavailable")
    }
}

#[test]
fn test_completion_failure_is_not_retried() {
    let graph = normalize(&json!({"schemas": [{"name": "User", "fields": {}}]}));
    let (_root, path) = scaffolded(&graph);
    let provider = CountingFailure {
        calls: RefCell::new(0),
    };

    assert!(LogicGenerator::new(&provider).generate(&graph, &path).is_err());
    assert_eq!(*provider.calls.borrow(), 1);
}

#![allow(clippy::unwrap_used)]

mod common;

use common::product_graph;
use serde_json::json;
use skelgen::completion::{FixtureCompletion, TextCompletion};
use skelgen::config::Settings;
use skelgen::graph::{normalize, normalize_with, FieldType, HandlerScope};
use skelgen::pipeline::generate_backend;
use skelgen::scaffold::ROUTES_MARKER;
use std::fs;
use std::path::Path;

fn settings(root: &Path) -> Settings {
    Settings {
        projects_dir: root.to_path_buf(),
        ..Settings::default()
    }
}

fn sorted_entries(dir: &Path) -> Vec<String> {
    let mut names: Vec<_> = fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

#[test]
fn test_product_example_end_to_end() {
    let root = tempfile::tempdir().unwrap();
    let generation = generate_backend(
        &product_graph(),
        &settings(root.path()),
        &FixtureCompletion::default(),
    )
    .unwrap();

    let summary = &generation.summary;
    assert_eq!(summary.message, "Multi-agent backend generation complete");
    assert_eq!(summary.project_name.as_deref(), Some("shop-api"));
    let project = &summary.project_path;
    assert!(project.is_absolute());
    assert!(project.ends_with("shop-api"));

    for dir in ["routes", "controllers", "models", "middleware", "config"] {
        assert!(project.join("src").join(dir).is_dir(), "missing src/{dir}");
    }
    assert_eq!(
        sorted_entries(&project.join("src/models")),
        vec!["product.model.js", "user.model.js"]
    );
    assert_eq!(
        sorted_entries(&project.join("src/controllers")),
        vec!["user.controller.js"]
    );
    assert_eq!(
        sorted_entries(&project.join("src/routes")),
        vec!["users.routes.js"]
    );

    let product = fs::read_to_string(project.join("src/models/product.model.js")).unwrap();
    assert!(product.contains("mongoose.model('Product', ProductSchema)"));

    let graph = &generation.graph;
    let product_schema = graph.schema("Product").unwrap();
    assert_eq!(product_schema.fields.get("price").unwrap().ty, FieldType::Number);
    assert!(!product_schema.fields.get("description").unwrap().required);
    let user = graph.schema("User").unwrap();
    assert_eq!(user.fields.get("email").unwrap().ty, FieldType::String);
    assert!(user.pre_save_hook().is_some());

    let readme = fs::read_to_string(&generation.readme).unwrap();
    assert!(readme.starts_with("# shop-api\n"));
    assert!(readme.contains("### Product Schema"));
    assert!(readme.contains("| `price` | `Number` | required |"));
    assert!(readme.contains("| `username` | `String` | required, unique |"));
}

#[test]
fn test_route_wiring_mounts_each_router_once() {
    let root = tempfile::tempdir().unwrap();
    let generation = generate_backend(
        &product_graph(),
        &settings(root.path()),
        &FixtureCompletion::default(),
    )
    .unwrap();

    let app = fs::read_to_string(generation.summary.project_path.join("src/app.js")).unwrap();
    assert!(!app.contains(ROUTES_MARKER));
    let route_files = sorted_entries(&generation.summary.project_path.join("src/routes"));
    assert_eq!(app.matches("app.use('/api/").count(), route_files.len());
    assert!(app.contains("const usersRoutes = require('./routes/users.routes');"));
    assert_eq!(generation.report.mounted, vec!["users"]);
}

#[test]
fn test_regeneration_starts_from_scratch() {
    let root = tempfile::tempdir().unwrap();
    let settings = settings(root.path());
    let fixture = FixtureCompletion::default();

    let first = generate_backend(&product_graph(), &settings, &fixture).unwrap();
    let project = first.summary.project_path.clone();
    fs::write(project.join("src/routes/orders.routes.js"), "// stale").unwrap();

    // Same name, Product schema removed.
    let smaller = json!({
        "projectName": "shop-api",
        "schemas": [{"name": "User", "fields": {"email": {"type": "String"}}}]
    });
    let second = generate_backend(&smaller, &settings, &fixture).unwrap();
    assert_eq!(second.summary.project_path, project);

    assert_eq!(sorted_entries(&project.join("src/models")), vec!["user.model.js"]);
    assert_eq!(sorted_entries(&project.join("src/routes")), vec!["users.routes.js"]);
    let app = fs::read_to_string(project.join("src/app.js")).unwrap();
    assert_eq!(app.matches("app.use('/api/users', usersRoutes);").count(), 1);
    assert!(!app.contains("orders"));
    assert_eq!(sorted_entries(root.path()), vec!["shop-api"]);
}

#[test]
fn test_extended_scope_end_to_end() {
    let root = tempfile::tempdir().unwrap();
    let settings = Settings {
        handler_scope: HandlerScope::Extended,
        ..settings(root.path())
    };
    let graph = json!({
        "projectName": "shop-api",
        "schemas": [{"name": "Product", "fields": {"name": {"type": "String"}}}],
        "controllers": [
            {"name": "listProductsController", "schema": "Product", "logic": "Return every product."}
        ],
        "routes": [
            {"path": "/api/products", "method": "get", "controller": "listProductsController",
             "description": "List products."}
        ]
    });
    let fixture = FixtureCompletion::default().with_response(
        "controller function named `listProductsController`",
        "```javascript\nexports.listProductsController = async (req, res) => res.json(await Product.find());\n```",
    );

    let generation = generate_backend(&graph, &settings, &fixture).unwrap();
    let project = &generation.summary.project_path;

    let controller = fs::read_to_string(project.join("src/controllers/product.controller.js")).unwrap();
    assert!(controller.starts_with("const Product = require('../models/product.model');\n\n"));
    assert!(controller.contains("exports.listProductsController"));

    assert_eq!(
        sorted_entries(&project.join("src/routes")),
        vec!["products.routes.js", "users.routes.js"]
    );
    let app = fs::read_to_string(project.join("src/app.js")).unwrap();
    assert!(app.contains("app.use('/api/products', productsRoutes);"));
    assert!(app.contains("app.use('/api/users', usersRoutes);"));

    let readme = fs::read_to_string(&generation.readme).unwrap();
    assert!(readme.contains("| `GET` | `/api/products` | List products. |"));
}

#[test]
fn test_json_string_graph_is_accepted() {
    let root = tempfile::tempdir().unwrap();
    let raw = json!(product_graph().to_string());
    let generation =
        generate_backend(&raw, &settings(root.path()), &FixtureCompletion::default()).unwrap();
    assert_eq!(generation.summary.project_name.as_deref(), Some("shop-api"));
}

#[test]
fn test_normalization_is_idempotent_on_example() {
    for scope in [HandlerScope::UserSlice, HandlerScope::Extended] {
        let once = normalize_with(&product_graph(), scope);
        let twice = normalize_with(&serde_json::to_value(&once).unwrap(), scope);
        assert_eq!(once, twice, "{scope}");
    }
    assert_eq!(normalize(&product_graph()).routes.len(), 3);
}

struct Unavailable;

impl TextCompletion for Unavailable {
    fn complete(&self, _prompt: &str) -> anyhow::Result<String> {
        anyhow::bail!("upstream returned 503")
    }
}

#[test]
fn test_completion_failure_surfaces_cause() {
    let root = tempfile::tempdir().unwrap();
    let err = generate_backend(&product_graph(), &settings(root.path()), &Unavailable).unwrap_err();
    let rendered = format!("{err:#}");
    assert!(rendered.contains("model generation failed for schema User"));
    assert!(rendered.contains("upstream returned 503"));
}

#[test]
fn test_hostile_schema_names_stay_inside_the_project() {
    let root = tempfile::tempdir().unwrap();
    let projects = root.path().join("projects");
    let settings = settings(&projects);
    let graph = json!({
        "projectName": "shop",
        "schemas": [
            {"name": "../../../escaped", "fields": {"a": {"type": "String"}}},
            {"name": "a/b", "fields": {}}
        ]
    });

    let generation = generate_backend(&graph, &settings, &FixtureCompletion::default()).unwrap();
    let project = &generation.summary.project_path;
    assert_eq!(
        sorted_entries(&project.join("src/models")),
        vec!["ab.model.js", "escaped.model.js", "user.model.js"]
    );
    assert_eq!(sorted_entries(&projects), vec!["shop"]);
    assert!(!root.path().join("escaped.model.js").exists());
}

#[test]
fn test_hyphenated_group_is_wired_with_valid_identifier() {
    let root = tempfile::tempdir().unwrap();
    let settings = Settings {
        handler_scope: HandlerScope::Extended,
        ..settings(root.path())
    };
    let graph = json!({
        "projectName": "shop",
        "schemas": [{"name": "OrderItem", "fields": {}}],
        "controllers": [{"name": "listOrderItems", "schema": "OrderItem"}],
        "routes": [
            {"path": "/api/order-items", "method": "GET", "controller": "listOrderItems"},
            {"path": "/api/../admin", "method": "GET", "controller": "listOrderItems"}
        ]
    });

    let generation = generate_backend(&graph, &settings, &FixtureCompletion::default()).unwrap();
    let project = &generation.summary.project_path;
    assert_eq!(
        sorted_entries(&project.join("src/routes")),
        vec!["order-items.routes.js", "users.routes.js"]
    );
    let app = fs::read_to_string(project.join("src/app.js")).unwrap();
    assert!(app.contains("const orderItemsRoutes = require('./routes/order-items.routes');"));
    assert!(app.contains("app.use('/api/order-items', orderItemsRoutes);"));
    assert!(!app.contains("order-itemsRoutes"));
}

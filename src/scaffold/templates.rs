use anyhow::Context;
use askama::Template;
use serde_json::json;
use std::fs;
use std::path::Path;
use tracing::debug;

/// Comment in `src/app.js` that route registration replaces.
pub const ROUTES_MARKER: &str = "// ROUTES WILL BE ADDED HERE BY THE CODER AGENT";

/// Port written to the generated `.env`.
pub const ENV_PORT: u16 = 3001;

/// Port the generated entrypoint falls back to when `PORT` is unset.
pub const FALLBACK_PORT: u16 = 3000;

/// Template for `.env`
#[derive(Template)]
#[template(path = "project/env.txt", escape = "none")]
pub struct EnvTemplate<'a> {
    /// Project name, also used as the database name
    pub name: &'a str,
    pub port: u16,
}

/// Template for `.gitignore`
#[derive(Template)]
#[template(path = "project/gitignore.txt", escape = "none")]
pub struct GitignoreTemplate;

/// Template for `src/index.js`
#[derive(Template)]
#[template(path = "project/index.js.txt", escape = "none")]
pub struct IndexJsTemplate {
    pub default_port: u16,
}

/// Template for `src/app.js`
///
/// Route registration is spliced in later at the marker line.
#[derive(Template)]
#[template(path = "project/app.js.txt", escape = "none")]
pub struct AppJsTemplate<'a> {
    pub marker: &'a str,
}

/// Template for `src/config/database.js`
#[derive(Template)]
#[template(path = "project/database.js.txt", escape = "none")]
pub struct DatabaseJsTemplate;

fn write_file(path: &Path, contents: &str) -> anyhow::Result<()> {
    fs::write(path, contents).with_context(|| format!("Failed to write {}", path.display()))?;
    debug!(path = %path.display(), "wrote file");
    Ok(())
}

/// Write `package.json` with the project name and the fixed runtime dependencies.
pub fn write_package_json(base: &Path, name: &str) -> anyhow::Result<()> {
    let manifest = json!({
        "name": name,
        "version": "1.0.0",
        "description": "Generated Express + Mongoose backend",
        "main": "src/index.js",
        "scripts": {
            "start": "node src/index.js",
            "dev": "nodemon src/index.js"
        },
        "dependencies": {
            "express": "^4.18.2",
            "mongoose": "^7.5.0",
            "dotenv": "^16.3.1",
            "cors": "^2.8.5",
            "bcryptjs": "^2.4.3"
        },
        "devDependencies": {
            "nodemon": "^3.0.1"
        }
    });
    let rendered = serde_json::to_string_pretty(&manifest)?;
    write_file(&base.join("package.json"), &rendered)
}

/// Write `.env` and `.gitignore` at the project root.
pub fn write_env_files(base: &Path, name: &str) -> anyhow::Result<()> {
    let env = EnvTemplate {
        name,
        port: ENV_PORT,
    }
    .render()?;
    write_file(&base.join(".env"), &env)?;
    write_file(&base.join(".gitignore"), &GitignoreTemplate.render()?)
}

/// Write the entrypoint `src/index.js`.
pub fn write_index_js(src: &Path) -> anyhow::Result<()> {
    let rendered = IndexJsTemplate {
        default_port: FALLBACK_PORT,
    }
    .render()?;
    write_file(&src.join("index.js"), &rendered)
}

/// Write the application assembly `src/app.js` containing [`ROUTES_MARKER`].
pub fn write_app_js(src: &Path) -> anyhow::Result<()> {
    let rendered = AppJsTemplate {
        marker: ROUTES_MARKER,
    }
    .render()?;
    write_file(&src.join("app.js"), &rendered)
}

/// Write the database bootstrap `src/config/database.js`.
pub fn write_database_js(config_dir: &Path) -> anyhow::Result<()> {
    write_file(
        &config_dir.join("database.js"),
        &DatabaseJsTemplate.render()?,
    )
}

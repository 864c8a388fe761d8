use anyhow::Context;
use std::fs;
use std::path::Path;
use tracing::info;

use super::GenerateError;
use crate::scaffold::ROUTES_MARKER;

/// Registration block for the given mount names: all imports, a blank line, all mounts.
pub fn route_registration(mounts: &[String]) -> String {
    let imports: String = mounts
        .iter()
        .map(|m| {
            format!(
                "const {} = require('./routes/{m}.routes');\n",
                router_identifier(m)
            )
        })
        .collect();
    let uses: String = mounts
        .iter()
        .map(|m| format!("app.use('/api/{m}', {});\n", router_identifier(m)))
        .collect();
    format!("{imports}\n{uses}")
}

/// JS variable holding the router for `mount`: `order-items` becomes `orderItemsRoutes`.
pub fn router_identifier(mount: &str) -> String {
    let mut ident = String::with_capacity(mount.len() + 6);
    let mut upper_next = false;
    for c in mount.chars() {
        if c.is_ascii_alphanumeric() || c == '_' || c == '$' {
            if ident.is_empty() && c.is_ascii_digit() {
                ident.push('_');
            }
            if upper_next {
                ident.push(c.to_ascii_uppercase());
            } else {
                ident.push(c);
            }
            upper_next = false;
        } else {
            upper_next = !ident.is_empty();
        }
    }
    ident.push_str("Routes");
    ident
}

/// Mount every router in `src/routes` by replacing the marker in `src/app.js`.
///
/// Mount names are the file names up to the first `.`, in sorted order.
/// Returns the mounted names.
///
/// # Errors
///
/// Returns an error if the routes directory or `app.js` cannot be read or
/// written, or if `app.js` no longer contains the marker.
pub fn link_routes(src: &Path) -> anyhow::Result<Vec<String>> {
    let app_path = src.join("app.js");
    let routes_dir = src.join("routes");

    let mut files: Vec<String> = fs::read_dir(&routes_dir)
        .with_context(|| format!("Failed to list {}", routes_dir.display()))?
        .filter_map(Result::ok)
        .filter(|entry| entry.path().is_file())
        .map(|entry| entry.file_name().to_string_lossy().into_owned())
        .filter(|name| name.ends_with(".js"))
        .collect();
    files.sort();

    let mut mounts: Vec<String> = Vec::with_capacity(files.len());
    for file in &files {
        let mount = file.split('.').next().unwrap_or_default().to_string();
        if !mount.is_empty() && !mounts.contains(&mount) {
            mounts.push(mount);
        }
    }

    let content = fs::read_to_string(&app_path)
        .with_context(|| format!("Failed to read {}", app_path.display()))?;
    if !content.contains(ROUTES_MARKER) {
        return Err(GenerateError::MissingMarker(app_path).into());
    }
    let wired = content.replacen(ROUTES_MARKER, &route_registration(&mounts), 1);
    fs::write(&app_path, wired).with_context(|| format!("Failed to write {}", app_path.display()))?;

    info!(mounts = ?mounts, "linked routes into app.js");
    Ok(mounts)
}

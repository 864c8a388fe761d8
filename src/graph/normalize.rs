use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;
use tracing::debug;

use super::types::{
    mount_group, Field, FieldMap, FieldType, Graph, Handler, HookMap, HttpMethod, Route, Schema,
};

/// Name given to graphs that carry user routes but no project name.
pub const USERS_PROJECT_NAME: &str = "user-management-api";

/// Fallback schema name for entries without one.
pub const DEFAULT_SCHEMA_NAME: &str = "Model";

/// Instruction forced onto the `pre-save` hook of every `User` schema.
pub const USER_PRE_SAVE_HOOK: &str = "Hash the password using bcrypt before saving the user.";

const USER_SCHEMA: &str = "User";

/// Canonical user-management handlers, in output order.
pub const CANONICAL_HANDLERS: [(&str, &str); 3] = [
    (
        "createUserController",
        "Create a new User from req.body. If the email or username already exists, respond with a status code of 409 and a JSON message: { 'message': 'User already exists.' }. On successful creation, respond with a status of 201 and the new user object, but exclude the password field from the response.",
    ),
    (
        "getAllUsersController",
        "Retrieve all users from the database. Exclude the password field from the response for all users.",
    ),
    (
        "getUserByIdController",
        "Retrieve a single user by their ID from req.params.id. If not found, return a 404 error. Exclude the password field from the response.",
    ),
];

/// Canonical user-management routes: (method, path, controller, description).
pub const CANONICAL_ROUTES: [(HttpMethod, &str, &str, &str); 3] = [
    (
        HttpMethod::Post,
        "/api/users",
        "createUserController",
        "Create a new user.",
    ),
    (
        HttpMethod::Get,
        "/api/users",
        "getAllUsersController",
        "Get a list of all users.",
    ),
    (
        HttpMethod::Get,
        "/api/users/:id",
        "getUserByIdController",
        "Get a single user by their ID.",
    ),
];

/// Which caller-supplied controllers and routes survive normalization.
///
/// Both scopes always produce the canonical user slice first.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum HandlerScope {
    /// Only the canonical user controllers and routes; everything else is dropped.
    #[default]
    UserSlice,
    /// Canonical user slice, then the caller's other controllers and `/api/` routes.
    Extended,
}

impl FromStr for HandlerScope {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "user-slice" | "user_slice" | "users" => Ok(HandlerScope::UserSlice),
            "extended" => Ok(HandlerScope::Extended),
            other => Err(format!(
                "unknown handler scope '{other}' (expected user-slice or extended)"
            )),
        }
    }
}

impl fmt::Display for HandlerScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HandlerScope::UserSlice => f.write_str("user-slice"),
            HandlerScope::Extended => f.write_str("extended"),
        }
    }
}

/// Normalize an arbitrary graph description with the default [`HandlerScope`].
///
/// Never fails: unknown keys are dropped, malformed entries discarded and
/// missing values defaulted.
pub fn normalize(raw: &Value) -> Graph {
    normalize_with(raw, HandlerScope::default())
}

/// Normalize with an explicit handler scope.
pub fn normalize_with(raw: &Value, scope: HandlerScope) -> Graph {
    let empty = Map::new();
    let obj = raw.as_object().unwrap_or(&empty);

    let schemas = normalize_schemas(obj.get("schemas"));

    let mut controllers = canonical_handlers(obj.get("controllers"));
    let mut routes = canonical_routes();
    if scope == HandlerScope::Extended {
        extend_handlers(&mut controllers, obj.get("controllers"), &schemas);
        extend_routes(&mut routes, obj.get("routes"), &controllers, &schemas);
    }

    // Evaluated against the final route list so a normalized graph normalizes to itself.
    let project_name = normalize_project_name(obj.get("projectName"), &routes);

    debug!(
        project = ?project_name,
        schemas = schemas.len(),
        controllers = controllers.len(),
        routes = routes.len(),
        %scope,
        "normalized graph"
    );

    Graph {
        project_name,
        schemas,
        controllers,
        routes,
    }
}

fn entries(value: Option<&Value>) -> &[Value] {
    value.and_then(Value::as_array).map_or(&[], Vec::as_slice)
}

fn non_empty_str(value: Option<&Value>) -> Option<&str> {
    value.and_then(Value::as_str).filter(|s| !s.is_empty())
}

/// JSON truthiness: `null`, `false`, `0`, `""`, `[]` and `{}` are false.
fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

fn normalize_project_name(raw: Option<&Value>, routes: &[Route]) -> Option<String> {
    if let Some(name) = non_empty_str(raw) {
        return Some(name.to_string());
    }
    routes
        .iter()
        .any(|r| r.path.starts_with("/api/users"))
        .then(|| USERS_PROJECT_NAME.to_string())
}

/// Repair a schema name into a JS identifier that is also a safe file-name segment.
///
/// Characters other than ASCII letters, digits, `_` and `$` are dropped, as are
/// leading digits. `None` when nothing usable remains.
fn schema_identifier(raw: &str) -> Option<String> {
    let kept: String = raw
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_' || *c == '$')
        .skip_while(char::is_ascii_digit)
        .collect();
    (!kept.is_empty()).then_some(kept)
}

/// Mount groups become file names and URL prefixes: letters, digits, `_` and `-` only.
fn is_safe_group(group: &str) -> bool {
    group
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

fn normalize_schemas(raw: Option<&Value>) -> Vec<Schema> {
    entries(raw)
        .iter()
        .filter_map(Value::as_object)
        .map(normalize_schema)
        .collect()
}

fn normalize_schema(obj: &Map<String, Value>) -> Schema {
    let name = non_empty_str(obj.get("name"))
        .and_then(schema_identifier)
        .unwrap_or_else(|| DEFAULT_SCHEMA_NAME.to_string());

    let fields: FieldMap = obj
        .get("fields")
        .and_then(Value::as_object)
        .map(|fields| {
            fields
                .iter()
                .filter_map(|(fname, fdef)| {
                    fdef.as_object().map(|def| (fname.clone(), normalize_field(def)))
                })
                .collect()
        })
        .unwrap_or_default();

    let mut hooks: HookMap = obj
        .get("hooks")
        .and_then(Value::as_object)
        .map(|hooks| {
            hooks
                .iter()
                .filter_map(|(k, v)| v.as_str().map(|text| (k.clone(), text.to_string())))
                .collect()
        })
        .unwrap_or_default();

    if name == USER_SCHEMA {
        hooks.insert(Schema::PRE_SAVE, USER_PRE_SAVE_HOOK.to_string());
    }

    Schema {
        name,
        fields,
        hooks,
    }
}

fn normalize_field(def: &Map<String, Value>) -> Field {
    let ty = match def.get("type") {
        None | Some(Value::Null) => FieldType::String,
        Some(Value::String(raw)) => FieldType::classify(raw),
        Some(other) => FieldType::classify(&other.to_string()),
    };
    let required = def.get("required").map_or(true, truthy);
    let unique = matches!(def.get("unique"), Some(Value::Bool(true)));
    Field {
        ty,
        required,
        unique,
    }
}

fn canonical_handlers(raw: Option<&Value>) -> Vec<Handler> {
    let supplied: Vec<&str> = entries(raw)
        .iter()
        .filter_map(|c| non_empty_str(c.get("name")))
        .collect();
    CANONICAL_HANDLERS
        .iter()
        .map(|(name, logic)| {
            if supplied.contains(name) {
                debug!(handler = *name, "overriding caller-supplied canonical handler");
            }
            Handler {
                name: (*name).to_string(),
                schema: USER_SCHEMA.to_string(),
                logic: (*logic).to_string(),
            }
        })
        .collect()
}

fn canonical_routes() -> Vec<Route> {
    CANONICAL_ROUTES
        .iter()
        .map(|(method, path, controller, description)| Route {
            path: (*path).to_string(),
            method: *method,
            schema: USER_SCHEMA.to_string(),
            controller: (*controller).to_string(),
            description: (*description).to_string(),
        })
        .collect()
}

fn fallback_schema(schemas: &[Schema]) -> String {
    schemas
        .first()
        .map_or(DEFAULT_SCHEMA_NAME, |s| s.name.as_str())
        .to_string()
}

fn extend_handlers(handlers: &mut Vec<Handler>, raw: Option<&Value>, schemas: &[Schema]) {
    for obj in entries(raw).iter().filter_map(Value::as_object) {
        let Some(name) = non_empty_str(obj.get("name")) else {
            continue;
        };
        if handlers.iter().any(|h| h.name == name) {
            continue;
        }
        let schema = non_empty_str(obj.get("schema"))
            .and_then(schema_identifier)
            .unwrap_or_else(|| fallback_schema(schemas));
        let logic = non_empty_str(obj.get("logic"))
            .map(str::to_string)
            .unwrap_or_else(|| format!("Implement {name} using {schema} model."));
        handlers.push(Handler {
            name: name.to_string(),
            schema,
            logic,
        });
    }
}

fn extend_routes(
    routes: &mut Vec<Route>,
    raw: Option<&Value>,
    handlers: &[Handler],
    schemas: &[Schema],
) {
    for obj in entries(raw).iter().filter_map(Value::as_object) {
        let Some(path) = non_empty_str(obj.get("path")) else {
            continue;
        };
        if !mount_group(path).is_some_and(is_safe_group) {
            continue;
        }
        let Some(method) = obj
            .get("method")
            .and_then(Value::as_str)
            .and_then(|m| m.parse::<HttpMethod>().ok())
        else {
            continue;
        };
        let Some(controller) = non_empty_str(obj.get("controller")) else {
            continue;
        };
        if routes.iter().any(|r| r.method == method && r.path == path) {
            continue;
        }
        let schema = non_empty_str(obj.get("schema"))
            .and_then(schema_identifier)
            .or_else(|| {
                handlers
                    .iter()
                    .find(|h| h.name == controller)
                    .map(|h| h.schema.clone())
            })
            .unwrap_or_else(|| fallback_schema(schemas));
        let description = non_empty_str(obj.get("description"))
            .map(str::to_string)
            .unwrap_or_else(|| format!("{method} {path}"));
        routes.push(Route {
            path: path.to_string(),
            method,
            schema,
            controller: controller.to_string(),
            description,
        });
    }
}

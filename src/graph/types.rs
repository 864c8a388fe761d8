use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::ordered::OrderedMap;

/// Project name used by the scaffolder and documenter when the graph has none.
pub const DEFAULT_PROJECT_NAME: &str = "my-express-app";

/// Ordered field name → field definition mapping of a schema.
pub type FieldMap = OrderedMap<Field>;

/// Ordered hook name → natural-language instruction mapping of a schema.
pub type HookMap = OrderedMap<String>;

/// Primitive tag of a schema field.
///
/// The three canonical tags map onto Mongoose types; anything else is carried
/// through verbatim as [`FieldType::Custom`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum FieldType {
    String,
    Number,
    Boolean,
    Custom(String),
}

impl FieldType {
    /// Classify a raw type string.
    ///
    /// Only the first whitespace-separated token is considered, so upstream
    /// corruption such as `"String email"` still yields [`FieldType::String`].
    /// Matching of the canonical tags is case-insensitive; an empty token falls
    /// back to `String`.
    pub fn classify(raw: &str) -> Self {
        let token = raw.split_whitespace().next().unwrap_or("").trim();
        match token.to_ascii_lowercase().as_str() {
            "" | "string" => FieldType::String,
            "number" => FieldType::Number,
            "boolean" => FieldType::Boolean,
            _ => FieldType::Custom(token.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            FieldType::String => "String",
            FieldType::Number => "Number",
            FieldType::Boolean => "Boolean",
            FieldType::Custom(tag) => tag,
        }
    }
}

impl From<String> for FieldType {
    fn from(raw: String) -> Self {
        FieldType::classify(&raw)
    }
}

impl From<FieldType> for String {
    fn from(ty: FieldType) -> Self {
        ty.as_str().to_string()
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn default_true() -> bool {
    true
}

/// A single field of a [`Schema`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field {
    #[serde(rename = "type")]
    pub ty: FieldType,
    #[serde(default = "default_true")]
    pub required: bool,
    /// Serialized only when `true`.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub unique: bool,
}

impl Field {
    pub fn new(ty: FieldType) -> Self {
        Self {
            ty,
            required: true,
            unique: false,
        }
    }

    /// Names of the truthy non-type attributes, in declaration order.
    pub fn constraints(&self) -> Vec<&'static str> {
        let mut out = Vec::new();
        if self.required {
            out.push("required");
        }
        if self.unique {
            out.push("unique");
        }
        out
    }
}

/// A data-model definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schema {
    pub name: String,
    #[serde(default)]
    pub fields: FieldMap,
    #[serde(default, skip_serializing_if = "OrderedMap::is_empty")]
    pub hooks: HookMap,
}

impl Schema {
    /// Hook key used for the password-hashing instruction on `User`.
    pub const PRE_SAVE: &'static str = "pre-save";

    pub fn pre_save_hook(&self) -> Option<&str> {
        self.hooks.get(Self::PRE_SAVE).map(String::as_str)
    }

    /// Lower-cased name used for generated file names and import paths.
    pub fn file_stem(&self) -> String {
        self.name.to_lowercase()
    }
}

/// A request-handling unit bound to a schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Handler {
    pub name: String,
    pub schema: String,
    pub logic: String,
}

/// HTTP method of a [`Route`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
        }
    }
}

impl FromStr for HttpMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "GET" => Ok(HttpMethod::Get),
            "POST" => Ok(HttpMethod::Post),
            "PUT" => Ok(HttpMethod::Put),
            "PATCH" => Ok(HttpMethod::Patch),
            "DELETE" => Ok(HttpMethod::Delete),
            other => Err(format!("unsupported HTTP method: {other}")),
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An HTTP endpoint bound to a handler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Route {
    pub path: String,
    pub method: HttpMethod,
    pub schema: String,
    pub controller: String,
    pub description: String,
}

impl Route {
    /// Mount group: the path segment right after `/api/`.
    ///
    /// `/api/users/:id` groups under `users`. Paths outside `/api/` have no group.
    pub fn group(&self) -> Option<&str> {
        mount_group(&self.path)
    }
}

pub(crate) fn mount_group(path: &str) -> Option<&str> {
    path.strip_prefix("/api/")
        .and_then(|rest| rest.split('/').next())
        .filter(|segment| !segment.is_empty())
}

/// The intermediate representation shared by every generation stage.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Graph {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_name: Option<String>,
    #[serde(default)]
    pub schemas: Vec<Schema>,
    #[serde(default)]
    pub controllers: Vec<Handler>,
    #[serde(default)]
    pub routes: Vec<Route>,
}

impl Graph {
    /// Project name, falling back to [`DEFAULT_PROJECT_NAME`].
    pub fn project_name_or_default(&self) -> &str {
        self.project_name
            .as_deref()
            .filter(|name| !name.is_empty())
            .unwrap_or(DEFAULT_PROJECT_NAME)
    }

    pub fn schema(&self, name: &str) -> Option<&Schema> {
        self.schemas.iter().find(|s| s.name == name)
    }

    pub fn handler(&self, name: &str) -> Option<&Handler> {
        self.controllers.iter().find(|h| h.name == name)
    }

    /// Handlers grouped by their `schema`, groups in order of first appearance.
    pub fn handlers_by_schema(&self) -> Vec<(&str, Vec<&Handler>)> {
        let mut groups: Vec<(&str, Vec<&Handler>)> = Vec::new();
        for handler in &self.controllers {
            match groups.iter_mut().find(|(s, _)| *s == handler.schema) {
                Some((_, members)) => members.push(handler),
                None => groups.push((handler.schema.as_str(), vec![handler])),
            }
        }
        groups
    }

    /// Routes grouped by mount group, groups in order of first appearance.
    ///
    /// Routes without a mount group are skipped.
    pub fn routes_by_group(&self) -> Vec<(&str, Vec<&Route>)> {
        let mut groups: Vec<(&str, Vec<&Route>)> = Vec::new();
        for route in &self.routes {
            let Some(group) = route.group() else {
                continue;
            };
            match groups.iter_mut().find(|(g, _)| *g == group) {
                Some((_, members)) => members.push(route),
                None => groups.push((group, vec![route])),
            }
        }
        groups
    }
}

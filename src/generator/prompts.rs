use askama::Template;

use crate::graph::{Handler, Route, Schema};

/// One field line of a model prompt.
#[derive(Debug, Clone)]
pub struct PromptField {
    pub name: String,
    pub ty: String,
    pub required: bool,
    pub unique: bool,
}

/// Prompt asking for a Mongoose schema and model file.
#[derive(Template)]
#[template(path = "prompts/model.txt", escape = "none")]
pub struct ModelPrompt {
    pub name: String,
    pub fields: Vec<PromptField>,
    /// `pre-save` hook instruction; empty when the schema has none
    pub pre_save: String,
}

impl ModelPrompt {
    pub fn for_schema(schema: &Schema) -> Self {
        Self {
            name: schema.name.clone(),
            fields: schema
                .fields
                .iter()
                .map(|(name, field)| PromptField {
                    name: name.to_string(),
                    ty: field.ty.to_string(),
                    required: field.required,
                    unique: field.unique,
                })
                .collect(),
            pre_save: schema.pre_save_hook().unwrap_or_default().to_string(),
        }
    }
}

/// Prompt asking for a single controller function.
#[derive(Template)]
#[template(path = "prompts/controller.txt", escape = "none")]
pub struct ControllerPrompt<'a> {
    pub name: &'a str,
    pub schema: &'a str,
    pub logic: &'a str,
}

impl<'a> ControllerPrompt<'a> {
    pub fn for_handler(handler: &'a Handler) -> Self {
        Self {
            name: &handler.name,
            schema: &handler.schema,
            logic: &handler.logic,
        }
    }
}

/// One route line of a router prompt.
#[derive(Debug, Clone)]
pub struct PromptRoute {
    pub method: String,
    pub path: String,
    pub controller: String,
    pub description: String,
}

/// Prompt asking for an Express router covering one mount group.
#[derive(Template)]
#[template(path = "prompts/router.txt", escape = "none")]
pub struct RouterPrompt {
    pub group: String,
    /// Distinct controller names in order of first use
    pub controllers: Vec<String>,
    /// Lower-cased schema name of the group's first route
    pub schema_stem: String,
    pub routes: Vec<PromptRoute>,
}

impl RouterPrompt {
    pub fn for_group(group: &str, routes: &[&Route]) -> Self {
        let mut controllers: Vec<String> = Vec::new();
        for route in routes {
            if !controllers.contains(&route.controller) {
                controllers.push(route.controller.clone());
            }
        }
        Self {
            group: group.to_string(),
            controllers,
            schema_stem: routes
                .first()
                .map(|r| r.schema.to_lowercase())
                .unwrap_or_default(),
            routes: routes
                .iter()
                .map(|r| PromptRoute {
                    method: r.method.to_string(),
                    path: r.path.clone(),
                    controller: r.controller.clone(),
                    description: r.description.clone(),
                })
                .collect(),
        }
    }
}
